//! Format registry: forced-name resolution and extension auto-detection.

use std::path::Path;

use stx_core::errors::{StxError, UsageError};
use stx_core::reader::FormatReader;

use crate::fake::FakeReader;
use crate::pattern::PatternReader;

/// Identifiers accepted by `--format`.
pub const FORMAT_NAMES: &[&str] = &["fake", "pattern"];

/// Detects a format implementation from the file extension.
pub fn detect_format(path: &Path) -> Option<&'static str> {
    let name = path.file_name()?.to_str()?;
    if name.ends_with(".fake") || name.ends_with(".fake.ini") {
        Some("fake")
    } else if name.ends_with(".pattern") {
        Some("pattern")
    } else {
        None
    }
}

/// Opens a reader for the given input, honoring a forced format name.
///
/// An unknown forced name, or a file no implementation claims, is the
/// unknown-format usage error (exit code 11).
pub fn open_reader(
    path: &Path,
    format: Option<&str>,
) -> Result<Box<dyn FormatReader>, StxError> {
    let name = match format {
        Some(forced) => {
            if !FORMAT_NAMES.contains(&forced) {
                return Err(UsageError::UnknownFormat(forced.to_string()).into());
            }
            forced
        }
        None => detect_format(path)
            .ok_or_else(|| UsageError::UnknownFormat(path.display().to_string()))?,
    };
    match name {
        "fake" => Ok(Box::new(FakeReader::open(path)?)),
        "pattern" => Ok(Box::new(PatternReader::open(path)?)),
        _ => unreachable!("validated against FORMAT_NAMES"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detection_is_by_extension() {
        assert_eq!(detect_format(Path::new("a/image.fake")), Some("fake"));
        assert_eq!(detect_format(Path::new("image&x=1&.fake.ini")), Some("fake"));
        assert_eq!(detect_format(Path::new("group.pattern")), Some("pattern"));
        assert_eq!(detect_format(Path::new("image.tiff")), None);
    }

    #[test]
    fn unknown_forced_format_is_code_11() {
        let err = open_reader(Path::new("image.fake"), Some("czi")).unwrap_err();
        assert_eq!(err.exit_code(), 11);
    }

    #[test]
    fn undetectable_extension_is_code_11() {
        let err = open_reader(Path::new("image.tiff"), None).unwrap_err();
        assert_eq!(err.exit_code(), 11);
    }
}
