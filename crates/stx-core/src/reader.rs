//! The imaging backend seam.
//!
//! Everything the writer needs from an image format is expressed through
//! [`FormatReader`]: hierarchy counts, per-series pixel dimensions,
//! per-plane physical positions and raw plane pixels. A reader handle is
//! owned by exactly one worker at a time; implementations are not required
//! to be reentrant.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::StxError;

/// Pixel dimensions of one series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesShape {
    /// Tile width in pixels.
    pub size_x: usize,
    /// Tile height in pixels.
    pub size_y: usize,
    /// Number of focal planes.
    pub size_z: usize,
    /// Number of channels.
    pub size_c: usize,
    /// Number of timepoints.
    pub size_t: usize,
}

impl SeriesShape {
    /// Total number of planes in the series.
    pub fn plane_count(&self) -> usize {
        self.size_z * self.size_c * self.size_t
    }
}

/// Physical position of one plane, in micrometers.
///
/// An axis is `None` when the backend reports no position or the reported
/// unit is not convertible to micrometers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanePosition {
    /// Stage position along X.
    pub x: Option<f64>,
    /// Stage position along Y.
    pub y: Option<f64>,
    /// Stage position along Z.
    pub z: Option<f64>,
}

/// Read access to one opened image source.
pub trait FormatReader: Send + std::fmt::Debug {
    /// Path this reader was opened against.
    fn path(&self) -> &Path;

    /// Short identifier of the backing format implementation.
    fn format_name(&self) -> &'static str;

    /// Number of plates reported by the source; zero for non-screening data.
    fn plate_count(&self) -> usize;

    /// Number of wells in the given plate.
    fn well_count(&self, plate: usize) -> usize;

    /// Number of series (images) in the source.
    fn series_count(&self) -> usize;

    /// Selects the active series for subsequent metadata and pixel calls.
    fn set_series(&mut self, series: usize) -> Result<(), StxError>;

    /// Currently active series.
    fn series(&self) -> usize;

    /// Pixel dimensions of the active series.
    fn shape(&self) -> SeriesShape;

    /// Linear plane index for `(z, c, t)` within the active series.
    ///
    /// Planes are numbered in `XYZCT` order: z varies fastest, then c,
    /// then t. The same numbering is used by [`Self::plane_position`].
    fn plane_index(&self, z: usize, c: usize, t: usize) -> usize {
        let shape = self.shape();
        z + shape.size_z * (c + shape.size_c * t)
    }

    /// Physical position of the given plane of the active series.
    fn plane_position(&self, plane: usize) -> PlanePosition;

    /// Raw 16-bit grayscale pixels for one plane of the active series.
    fn read_plane(&mut self, z: usize, c: usize, t: usize) -> Result<Vec<u16>, StxError>;
}
