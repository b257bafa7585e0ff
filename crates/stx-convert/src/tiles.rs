//! The tile manifest builder.
//!
//! For one resolved FOV this enumerates the (z,t,c) tile space — z
//! outermost, then t, then c — and produces one descriptor per
//! combination with physical coordinates and a content hash. The builder
//! only reads backend metadata and already-written tile files, so it can
//! be re-run for a FOV after its tiles exist.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use stx_core::errors::StxError;
use stx_core::naming::NamingScheme;
use stx_core::reader::FormatReader;

/// Hash recorded for a tile whose file was never written (no-tiles mode).
pub const MISSING_TILE_HASH: &str = "does-not-exist";

const MANIFEST_VERSION: &str = "1.0.0";
const TILE_FORMAT: &str = "TIFF";

/// Tile position within the FOV's index space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileIndices {
    /// Channel index.
    pub c: usize,
    /// Round index (the timepoint).
    pub r: usize,
    /// Focal plane index.
    pub z: usize,
}

/// Physical coordinates of one tile.
///
/// Each axis is a two-element `[low, high]` bounds array; the writer
/// duplicates the single reported value into both slots. An axis the
/// backend cannot report in micrometers is recorded as the zero-valued
/// sentinel rather than null, preserving downstream schema compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TileCoordinates {
    /// X bounds in micrometers.
    pub xc: [f64; 2],
    /// Y bounds in micrometers.
    pub yc: [f64; 2],
    /// Z bounds in micrometers.
    pub zc: [f64; 2],
}

/// One entry of the per-FOV manifest's tile list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileDescriptor {
    /// Physical coordinates of the tile.
    pub coordinates: TileCoordinates,
    /// Tile file name, derived from the naming scheme.
    pub file: String,
    /// Index triple the file name encodes.
    pub indices: TileIndices,
    /// SHA-256 of the tile file bytes, or [`MISSING_TILE_HASH`].
    pub sha256: String,
    /// Encoding of the tile file.
    pub tile_format: String,
    /// Pixel dimensions `[x, y]` of the tile.
    pub tile_shape: [usize; 2],
}

/// Extras block of the per-FOV manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FovExtras {
    /// Companion metadata file accompanying the tile set.
    #[serde(rename = "OME")]
    pub ome: String,
}

/// Index-space extents of the FOV.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FovShape {
    /// Channel count.
    pub c: usize,
    /// Round count.
    pub r: usize,
    /// Focal plane count.
    pub z: usize,
}

/// The per-FOV JSON manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FovManifest {
    /// Encoding shared by every tile.
    pub default_tile_format: String,
    /// Dimension labels of the tile index/coordinate space.
    pub dimensions: Vec<String>,
    /// Sidecar files attached to the FOV.
    pub extras: FovExtras,
    /// Index-space extents.
    pub shape: FovShape,
    /// One descriptor per (z,t,c) combination, enumeration order.
    pub tiles: Vec<TileDescriptor>,
    /// Manifest schema version.
    pub version: String,
}

/// Builds the manifest for one FOV of the reader's active series.
///
/// `out` is consulted for already-written tile files to hash; a missing
/// file records the sentinel hash instead.
pub fn build_fov_manifest(
    reader: &dyn FormatReader,
    naming: &dyn NamingScheme,
    fov: usize,
    out: &Path,
) -> Result<FovManifest, StxError> {
    let shape = reader.shape();
    let mut tiles = Vec::with_capacity(shape.size_z * shape.size_t * shape.size_c);
    for z in 0..shape.size_z {
        for t in 0..shape.size_t {
            for c in 0..shape.size_c {
                let position = reader.plane_position(reader.plane_index(z, c, t));
                let file = naming.tiff_filename(fov, z, t, c);
                let sha256 = hash_tile(&out.join(&file))?;
                tiles.push(TileDescriptor {
                    coordinates: TileCoordinates {
                        xc: bounds(position.x),
                        yc: bounds(position.y),
                        zc: bounds(position.z),
                    },
                    file,
                    indices: TileIndices { c, r: t, z },
                    sha256,
                    tile_format: TILE_FORMAT.to_string(),
                    tile_shape: [shape.size_x, shape.size_y],
                });
            }
        }
    }
    Ok(FovManifest {
        default_tile_format: TILE_FORMAT.to_string(),
        dimensions: ["r", "x", "y", "c", "z", "xc", "yc", "zc"]
            .iter()
            .map(|dim| dim.to_string())
            .collect(),
        extras: FovExtras {
            ome: naming.companion_filename(fov),
        },
        shape: FovShape {
            c: shape.size_c,
            r: shape.size_t,
            z: shape.size_z,
        },
        tiles,
        version: MANIFEST_VERSION.to_string(),
    })
}

/// Serializes a built manifest to its fixed name under the output directory.
pub fn write_fov_manifest(
    manifest: &FovManifest,
    naming: &dyn NamingScheme,
    fov: usize,
    out: &Path,
) -> Result<(), StxError> {
    let path = out.join(naming.json_filename(fov));
    let json = serde_json::to_string_pretty(manifest)
        .map_err(|err| StxError::Serde(err.to_string()))?;
    fs::write(&path, json).map_err(|err| StxError::io(path, err))
}

fn bounds(value: Option<f64>) -> [f64; 2] {
    let value = value.unwrap_or(0.0);
    [value, value]
}

fn hash_tile(path: &Path) -> Result<String, StxError> {
    if !path.is_file() {
        return Ok(MISSING_TILE_HASH.to_string());
    }
    let bytes = fs::read(path).map_err(|err| StxError::io(path, err))?;
    Ok(format!("{:x}", Sha256::digest(&bytes)))
}
