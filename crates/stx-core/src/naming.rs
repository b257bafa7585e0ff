//! Naming schemes mapping FOV and plane indices to on-disk file names.
//!
//! A scheme is a pure function of its inputs. FOV components are
//! zero-padded to three digits so lexicographic order matches numeric
//! order; z/t/c components are unpadded.

use std::sync::Arc;

use crate::errors::UsageError;

/// Deterministic mapping from FOV and plane indices to file names.
pub trait NamingScheme: Send + Sync + std::fmt::Debug {
    /// Base name shared by every file of the fileset.
    fn root(&self) -> &str;

    /// Tile file name for one `(fov, z, t, c)` combination.
    fn tiff_filename(&self, fov: usize, z: usize, t: usize, c: usize) -> String;

    /// Tile pattern with `%z`/`%t`/`%c` placeholders for batch conversion.
    fn tiff_pattern(&self, fov: usize) -> String;

    /// Companion metadata file name for one FOV.
    fn companion_filename(&self, fov: usize) -> String;

    /// Per-FOV JSON manifest file name.
    fn json_filename(&self, fov: usize) -> String;

    /// Dataset manifest file name.
    fn manifest_filename(&self) -> String;

    /// Human-readable key identifying one FOV inside the manifest.
    fn fov_key(&self, fov: usize) -> String;
}

/// The standard SpaceTx naming scheme (root `primary_image-fov`).
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardNaming;

impl StandardNaming {
    const ROOT: &'static str = "primary_image-fov";
}

impl NamingScheme for StandardNaming {
    fn root(&self) -> &str {
        Self::ROOT
    }

    fn tiff_filename(&self, fov: usize, z: usize, t: usize, c: usize) -> String {
        format!("{}_{:03}_Z{}_T{}_C{}.ome.tiff", Self::ROOT, fov, z, t, c)
    }

    fn tiff_pattern(&self, fov: usize) -> String {
        format!("{}_{:03}_Z%z_T%t_C%c.ome.tiff", Self::ROOT, fov)
    }

    fn companion_filename(&self, fov: usize) -> String {
        format!("{}_{:03}.companion.ome", Self::ROOT, fov)
    }

    fn json_filename(&self, fov: usize) -> String {
        format!("{}_{:03}.json", Self::ROOT, fov)
    }

    fn manifest_filename(&self) -> String {
        format!("{}.json", Self::ROOT)
    }

    fn fov_key(&self, fov: usize) -> String {
        format!("fov_{:03}", fov)
    }
}

/// Resolves a scheme identifier to its implementation.
pub fn resolve_naming(id: &str) -> Result<Arc<dyn NamingScheme>, UsageError> {
    match id {
        "standard" => Ok(Arc::new(StandardNaming)),
        other => Err(UsageError::Invalid(format!(
            "unknown naming scheme: {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_names_are_zero_padded() {
        let naming = StandardNaming;
        assert_eq!(
            naming.tiff_filename(1, 0, 0, 0),
            "primary_image-fov_001_Z0_T0_C0.ome.tiff"
        );
        assert_eq!(naming.json_filename(12), "primary_image-fov_012.json");
        assert_eq!(naming.fov_key(3), "fov_003");
        assert_eq!(naming.manifest_filename(), "primary_image-fov.json");
    }

    #[test]
    fn pattern_and_filename_agree() {
        let naming = StandardNaming;
        let pattern = naming.tiff_pattern(7);
        let expanded = pattern
            .replace("%z", "4")
            .replace("%t", "3")
            .replace("%c", "2");
        assert_eq!(expanded, naming.tiff_filename(7, 4, 3, 2));
    }

    #[test]
    fn unknown_scheme_is_rejected() {
        assert!(resolve_naming("fancy").is_err());
        assert!(resolve_naming("standard").is_ok());
    }
}
