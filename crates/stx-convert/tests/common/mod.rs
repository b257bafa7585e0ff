use std::path::{Path, PathBuf};

use stx_core::errors::StxError;
use stx_core::reader::{FormatReader, PlanePosition, SeriesShape};

/// In-memory reader exposing a configurable hierarchy, for resolver tests.
#[derive(Debug)]
pub struct StubReader {
    pub path: PathBuf,
    pub plates: usize,
    pub wells: usize,
    pub series_count: usize,
    pub series: usize,
}

impl StubReader {
    pub fn new(plates: usize, wells: usize, series_count: usize) -> Self {
        Self {
            path: PathBuf::from("stub.fake"),
            plates,
            wells,
            series_count,
            series: 0,
        }
    }
}

impl FormatReader for StubReader {
    fn path(&self) -> &Path {
        &self.path
    }

    fn format_name(&self) -> &'static str {
        "stub"
    }

    fn plate_count(&self) -> usize {
        self.plates
    }

    fn well_count(&self, _plate: usize) -> usize {
        self.wells
    }

    fn series_count(&self) -> usize {
        self.series_count
    }

    fn set_series(&mut self, series: usize) -> Result<(), StxError> {
        if series >= self.series_count {
            return Err(StxError::Format("series out of range".into()));
        }
        self.series = series;
        Ok(())
    }

    fn series(&self) -> usize {
        self.series
    }

    fn shape(&self) -> SeriesShape {
        SeriesShape {
            size_x: 4,
            size_y: 4,
            size_z: 1,
            size_c: 1,
            size_t: 1,
        }
    }

    fn plane_position(&self, _plane: usize) -> PlanePosition {
        PlanePosition::default()
    }

    fn read_plane(&mut self, _z: usize, _c: usize, _t: usize) -> Result<Vec<u16>, StxError> {
        Ok(vec![0; 16])
    }
}
