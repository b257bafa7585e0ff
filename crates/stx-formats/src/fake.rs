//! The synthetic "fake" image format.
//!
//! A fake file carries its metadata in the file name as `&key=value`
//! pairs (`image&sizeZ=5&sizeT=4&.fake`); pixel data is a deterministic
//! gradient keyed by the plane and series indices. The `.fake.ini`
//! variant additionally carries `[series_N]` sections in the file body
//! with per-plane `PositionX_P`/`PositionY_P`/`PositionZ_P` entries and
//! optional `Position{X,Y,Z}Unit_P` overrides (micrometers by default).

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use stx_core::errors::StxError;
use stx_core::reader::{FormatReader, PlanePosition, SeriesShape};
use tracing::debug;

use crate::units::to_micrometers;

/// Metadata keys recognized in a fake file name, with their defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FakeOptions {
    pub size_x: usize,
    pub size_y: usize,
    pub size_z: usize,
    pub size_c: usize,
    pub size_t: usize,
    pub series: usize,
    pub plates: usize,
    pub plate_rows: usize,
    pub plate_cols: usize,
    pub fields: usize,
}

impl Default for FakeOptions {
    fn default() -> Self {
        Self {
            size_x: 512,
            size_y: 512,
            size_z: 1,
            size_c: 1,
            size_t: 1,
            series: 1,
            plates: 0,
            plate_rows: 1,
            plate_cols: 1,
            fields: 1,
        }
    }
}

impl FakeOptions {
    /// Parses `&key=value` pairs out of a fake file name.
    pub(crate) fn parse(name: &str) -> Result<Self, StxError> {
        let mut options = FakeOptions::default();
        for pair in name.split('&').skip(1) {
            if pair.is_empty() {
                continue;
            }
            let Some((key, value)) = pair.split_once('=') else {
                continue;
            };
            // Only recognized keys constrain the value; anything else may
            // carry arbitrary text and is skipped.
            match key {
                "sizeX" => options.size_x = numeric_option(key, value)?,
                "sizeY" => options.size_y = numeric_option(key, value)?,
                "sizeZ" => options.size_z = numeric_option(key, value)?,
                "sizeC" => options.size_c = numeric_option(key, value)?,
                "sizeT" => options.size_t = numeric_option(key, value)?,
                "series" => options.series = numeric_option(key, value)?,
                "plates" | "plate" => options.plates = numeric_option(key, value)?,
                "plateRows" => options.plate_rows = numeric_option(key, value)?,
                "plateCols" => options.plate_cols = numeric_option(key, value)?,
                "fields" => options.fields = numeric_option(key, value)?,
                other => debug!(key = other, "ignoring unrecognized fake option"),
            }
        }
        Ok(options)
    }

    /// Number of series the file reports, accounting for plate layout.
    pub(crate) fn series_count(&self) -> usize {
        if self.plates > 0 {
            self.plate_rows * self.plate_cols * self.fields
        } else {
            self.series
        }
    }
}

fn numeric_option(key: &str, value: &str) -> Result<usize, StxError> {
    value
        .parse()
        .map_err(|_| StxError::Format(format!("invalid fake option {key}={value}")))
}

/// One raw position entry from an ini section: value plus optional unit.
type RawPosition = (f64, Option<String>);

/// Positions keyed by `(series, plane, axis)`; axis is 0=X, 1=Y, 2=Z.
type PositionTable = HashMap<(usize, usize, usize), RawPosition>;

/// Reader for the fake format.
#[derive(Debug)]
pub struct FakeReader {
    path: PathBuf,
    options: FakeOptions,
    positions: PositionTable,
    series: usize,
}

impl FakeReader {
    /// Opens a `.fake` or `.fake.ini` file.
    pub fn open(path: &Path) -> Result<Self, StxError> {
        if !path.is_file() {
            return Err(StxError::Format(format!(
                "fake file not readable: {}",
                path.display()
            )));
        }
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| StxError::Format(format!("non-utf8 path: {}", path.display())))?;

        let (stem, ini_path) = if let Some(stem) = name.strip_suffix(".fake.ini") {
            (stem, Some(path.to_path_buf()))
        } else if let Some(stem) = name.strip_suffix(".fake") {
            // A sibling ini may carry positions for a plain .fake input.
            let sibling = path.with_file_name(format!("{name}.ini"));
            (stem, sibling.is_file().then_some(sibling))
        } else {
            return Err(StxError::Format(format!(
                "not a fake file: {}",
                path.display()
            )));
        };

        let options = FakeOptions::parse(stem)?;
        let positions = match ini_path {
            Some(ini) => parse_ini_positions(&ini)?,
            None => PositionTable::new(),
        };
        debug!(
            path = %path.display(),
            series = options.series_count(),
            plates = options.plates,
            "opened fake reader"
        );
        Ok(Self {
            path: path.to_path_buf(),
            options,
            positions,
            series: 0,
        })
    }
}

impl FormatReader for FakeReader {
    fn path(&self) -> &Path {
        &self.path
    }

    fn format_name(&self) -> &'static str {
        "fake"
    }

    fn plate_count(&self) -> usize {
        self.options.plates
    }

    fn well_count(&self, plate: usize) -> usize {
        if plate < self.options.plates {
            self.options.plate_rows * self.options.plate_cols
        } else {
            0
        }
    }

    fn series_count(&self) -> usize {
        self.options.series_count()
    }

    fn set_series(&mut self, series: usize) -> Result<(), StxError> {
        if series >= self.series_count() {
            return Err(StxError::Format(format!(
                "series {series} out of range (count={})",
                self.series_count()
            )));
        }
        self.series = series;
        Ok(())
    }

    fn series(&self) -> usize {
        self.series
    }

    fn shape(&self) -> SeriesShape {
        SeriesShape {
            size_x: self.options.size_x,
            size_y: self.options.size_y,
            size_z: self.options.size_z,
            size_c: self.options.size_c,
            size_t: self.options.size_t,
        }
    }

    fn plane_position(&self, plane: usize) -> PlanePosition {
        let axis = |index: usize| -> Option<f64> {
            let (value, unit) = self.positions.get(&(self.series, plane, index))?;
            match unit {
                Some(unit) => to_micrometers(*value, unit),
                None => Some(*value),
            }
        };
        PlanePosition {
            x: axis(0),
            y: axis(1),
            z: axis(2),
        }
    }

    fn read_plane(&mut self, z: usize, c: usize, t: usize) -> Result<Vec<u16>, StxError> {
        let shape = self.shape();
        if z >= shape.size_z || c >= shape.size_c || t >= shape.size_t {
            return Err(StxError::Format(format!(
                "plane ({z},{c},{t}) out of range for shape {shape:?}"
            )));
        }
        let plane = self.plane_index(z, c, t);
        let mut pixels = Vec::with_capacity(shape.size_x * shape.size_y);
        for y in 0..shape.size_y {
            for x in 0..shape.size_x {
                let value = (x + y + plane * 7 + self.series * 13) & 0xFFFF;
                pixels.push(value as u16);
            }
        }
        Ok(pixels)
    }
}

/// Parses `[series_N]` sections with `Position{X,Y,Z}_P` entries.
fn parse_ini_positions(path: &Path) -> Result<PositionTable, StxError> {
    let body = fs::read_to_string(path).map_err(|err| StxError::io(path, err))?;
    let mut table = PositionTable::new();
    let mut units: HashMap<(usize, usize, usize), String> = HashMap::new();
    let mut series: Option<usize> = None;
    for line in body.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if let Some(section) = line.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
            series = section
                .strip_prefix("series_")
                .and_then(|idx| idx.parse().ok());
            continue;
        }
        let Some(current) = series else { continue };
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let (key, value) = (key.trim(), value.trim());
        let Some(rest) = key.strip_prefix("Position") else {
            continue;
        };
        let (axis_name, plane_part) = match rest.split_once('_') {
            Some(parts) => parts,
            None => continue,
        };
        let Ok(plane) = plane_part.parse::<usize>() else {
            continue;
        };
        let (axis_name, is_unit) = match axis_name.strip_suffix("Unit") {
            Some(axis) => (axis, true),
            None => (axis_name, false),
        };
        let axis = match axis_name {
            "X" => 0,
            "Y" => 1,
            "Z" => 2,
            _ => continue,
        };
        if is_unit {
            units.insert((current, plane, axis), value.to_string());
        } else if let Ok(parsed) = value.parse::<f64>() {
            table.insert((current, plane, axis), (parsed, None));
        }
    }
    for (key, unit) in units {
        if let Some(entry) = table.get_mut(&key) {
            entry.1 = Some(unit);
        }
    }
    Ok(table)
}
