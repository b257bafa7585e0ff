//! The pattern format: a single-line grouping pattern over fake members.
//!
//! Numeric blocks `<a-b>` are expanded along the axis named by the letter
//! immediately preceding the block (`z`, `t`, `c` or `s` for series; `t`
//! when no letter matches). Every member file named by the expansion must
//! exist and agree on base dimensions; each block multiplies the extent
//! of its axis.

use std::fs;
use std::path::{Path, PathBuf};

use stx_core::errors::StxError;
use stx_core::reader::{FormatReader, PlanePosition, SeriesShape};
use tracing::debug;

use crate::fake::FakeReader;

/// Axis a pattern block expands along.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Z,
    T,
    C,
    Series,
}

/// One `<a-b>` block parsed out of the pattern text.
#[derive(Debug, Clone)]
struct Block {
    axis: Axis,
    start: u64,
    end: u64,
    /// Zero-pad width, or 0 when endpoints are written unpadded.
    width: usize,
    /// Byte range of the block (including brackets) in the pattern text.
    span: (usize, usize),
}

impl Block {
    fn count(&self) -> usize {
        (self.end - self.start + 1) as usize
    }

    fn render(&self, value: u64) -> String {
        if self.width > 0 {
            format!("{value:0width$}", width = self.width)
        } else {
            value.to_string()
        }
    }
}

/// Reader over a `.pattern` grouping file.
#[derive(Debug)]
pub struct PatternReader {
    path: PathBuf,
    base: FakeReader,
    shape: SeriesShape,
    series_count: usize,
    series: usize,
}

impl PatternReader {
    /// Opens a pattern file, validating every member it names.
    pub fn open(path: &Path) -> Result<Self, StxError> {
        let body = fs::read_to_string(path).map_err(|err| StxError::io(path, err))?;
        let line = body
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .ok_or_else(|| StxError::Format(format!("empty pattern file: {}", path.display())))?;

        let blocks = parse_blocks(line)?;
        let dir = path.parent().unwrap_or_else(|| Path::new("."));

        let members = expand_members(line, &blocks, dir);
        let first = members.first().ok_or_else(|| {
            StxError::Format(format!("pattern names no members: {}", path.display()))
        })?;
        for member in &members {
            if !member.is_file() {
                return Err(StxError::Format(format!(
                    "pattern member missing: {}",
                    member.display()
                )));
            }
        }

        let base = FakeReader::open(first)?;
        let mut shape = base.shape();
        let mut series_count = base.series_count();
        for block in &blocks {
            match block.axis {
                Axis::Z => shape.size_z *= block.count(),
                Axis::T => shape.size_t *= block.count(),
                Axis::C => shape.size_c *= block.count(),
                Axis::Series => series_count *= block.count(),
            }
        }
        debug!(
            path = %path.display(),
            members = members.len(),
            "opened pattern reader"
        );
        Ok(Self {
            path: path.to_path_buf(),
            base,
            shape,
            series_count,
            series: 0,
        })
    }
}

impl FormatReader for PatternReader {
    fn path(&self) -> &Path {
        &self.path
    }

    fn format_name(&self) -> &'static str {
        "pattern"
    }

    fn plate_count(&self) -> usize {
        0
    }

    fn well_count(&self, _plate: usize) -> usize {
        0
    }

    fn series_count(&self) -> usize {
        self.series_count
    }

    fn set_series(&mut self, series: usize) -> Result<(), StxError> {
        if series >= self.series_count {
            return Err(StxError::Format(format!(
                "series {series} out of range (count={})",
                self.series_count
            )));
        }
        self.series = series;
        let base_series = series % self.base.series_count();
        self.base.set_series(base_series)?;
        Ok(())
    }

    fn series(&self) -> usize {
        self.series
    }

    fn shape(&self) -> SeriesShape {
        self.shape
    }

    fn plane_position(&self, plane: usize) -> PlanePosition {
        let base_planes = self.base.shape().plane_count();
        self.base.plane_position(plane % base_planes)
    }

    fn read_plane(&mut self, z: usize, c: usize, t: usize) -> Result<Vec<u16>, StxError> {
        let base_shape = self.base.shape();
        self.base.read_plane(
            z % base_shape.size_z,
            c % base_shape.size_c,
            t % base_shape.size_t,
        )
    }
}

/// Parses every `<a-b>` block in the pattern line.
fn parse_blocks(line: &str) -> Result<Vec<Block>, StxError> {
    let bytes = line.as_bytes();
    let mut blocks = Vec::new();
    let mut cursor = 0;
    while let Some(open) = line[cursor..].find('<').map(|at| cursor + at) {
        let close = line[open..]
            .find('>')
            .map(|at| open + at)
            .ok_or_else(|| StxError::Format(format!("unclosed block in pattern: {line}")))?;
        let inner = &line[open + 1..close];
        let (start_text, end_text) = inner
            .split_once('-')
            .ok_or_else(|| StxError::Format(format!("malformed block <{inner}>")))?;
        let start: u64 = start_text
            .parse()
            .map_err(|_| StxError::Format(format!("malformed block <{inner}>")))?;
        let end: u64 = end_text
            .parse()
            .map_err(|_| StxError::Format(format!("malformed block <{inner}>")))?;
        if end < start {
            return Err(StxError::Format(format!("descending block <{inner}>")));
        }
        let axis = match open.checked_sub(1).map(|at| bytes[at].to_ascii_lowercase()) {
            Some(b'z') => Axis::Z,
            Some(b'c') => Axis::C,
            Some(b's') => Axis::Series,
            _ => Axis::T,
        };
        let width = if start_text.starts_with('0') && start_text.len() == end_text.len() {
            start_text.len()
        } else {
            0
        };
        blocks.push(Block {
            axis,
            start,
            end,
            width,
            span: (open, close + 1),
        });
        cursor = close + 1;
    }
    Ok(blocks)
}

/// Expands the full cartesian member list named by the pattern.
fn expand_members(line: &str, blocks: &[Block], dir: &Path) -> Vec<PathBuf> {
    let mut values: Vec<u64> = blocks.iter().map(|block| block.start).collect();
    let mut members = Vec::new();
    loop {
        let mut rendered = String::new();
        let mut last = 0;
        for (block, value) in blocks.iter().zip(&values) {
            rendered.push_str(&line[last..block.span.0]);
            rendered.push_str(&block.render(*value));
            last = block.span.1;
        }
        rendered.push_str(&line[last..]);
        members.push(dir.join(rendered));

        // Odometer increment over the block ranges.
        let mut carry = true;
        for (block, value) in blocks.iter().zip(values.iter_mut()).rev() {
            if !carry {
                break;
            }
            if *value < block.end {
                *value += 1;
                carry = false;
            } else {
                *value = block.start;
            }
        }
        if carry {
            break;
        }
    }
    members
}
