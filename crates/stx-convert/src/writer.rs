//! Tile and companion writing.
//!
//! This is the conversion routine proper: for one FOV it encodes one
//! grayscale 16-bit TIFF per (z,t,c) combination plus an OME companion
//! XML carrying pixel dimensions, per-plane indices and positions, and
//! per-plane file references. Progress instrumentation is a hook value
//! invoked after each tile write, not shared mutable counters.

use std::fs;
use std::path::Path;
use std::time::Instant;

use image::{ImageBuffer, ImageFormat, Luma};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::Writer;
use stx_core::errors::StxError;
use stx_core::naming::NamingScheme;
use stx_core::reader::FormatReader;
use tracing::debug;

const OME_XMLNS: &str = "http://www.openmicroscopy.org/Schemas/OME/2016-06";

/// Throughput accounting for one conversion unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConversionStats {
    /// Tiles written.
    pub tiles: usize,
    /// Total tile bytes written.
    pub bytes: u64,
    /// Wall time spent encoding and writing, in milliseconds.
    pub elapsed_ms: u128,
}

impl ConversionStats {
    /// Folds another unit's stats into this one.
    pub fn merge(&mut self, other: &ConversionStats) {
        self.tiles += other.tiles;
        self.bytes += other.bytes;
        self.elapsed_ms += other.elapsed_ms;
    }
}

/// One completed tile write, as seen by the instrumentation hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileWrite {
    /// Tile file name.
    pub file: String,
    /// Encoded size in bytes.
    pub bytes: u64,
    /// Encode-and-write wall time in milliseconds.
    pub elapsed_ms: u128,
}

/// Hook invoked after every tile write.
pub type WriteHook<'a> = &'a mut dyn FnMut(&TileWrite);

/// Writes all tiles and the companion file for the reader's active series.
pub fn convert_series(
    reader: &mut dyn FormatReader,
    naming: &dyn NamingScheme,
    fov: usize,
    out: &Path,
    mut hook: Option<WriteHook<'_>>,
) -> Result<ConversionStats, StxError> {
    let shape = reader.shape();
    let mut stats = ConversionStats::default();
    for z in 0..shape.size_z {
        for t in 0..shape.size_t {
            for c in 0..shape.size_c {
                let file = naming.tiff_filename(fov, z, t, c);
                let path = out.join(&file);
                let started = Instant::now();
                let pixels = reader.read_plane(z, c, t)?;
                write_tile(&path, shape.size_x, shape.size_y, pixels)?;
                let elapsed_ms = started.elapsed().as_millis();
                let bytes = fs::metadata(&path)
                    .map_err(|err| StxError::io(&path, err))?
                    .len();
                debug!(file = %file, bytes, elapsed_ms, "wrote tile");
                let write = TileWrite {
                    file,
                    bytes,
                    elapsed_ms,
                };
                if let Some(hook) = hook.as_deref_mut() {
                    hook(&write);
                }
                stats.tiles += 1;
                stats.bytes += bytes;
                stats.elapsed_ms += elapsed_ms;
            }
        }
    }
    write_companion(reader, naming, fov, out)?;
    Ok(stats)
}

fn write_tile(path: &Path, width: usize, height: usize, pixels: Vec<u16>) -> Result<(), StxError> {
    let buffer: ImageBuffer<Luma<u16>, Vec<u16>> =
        ImageBuffer::from_raw(width as u32, height as u32, pixels).ok_or_else(|| {
            StxError::Conversion(format!("plane size mismatch for {}", path.display()))
        })?;
    buffer
        .save_with_format(path, ImageFormat::Tiff)
        .map_err(|err| StxError::Conversion(format!("{}: {err}", path.display())))
}

/// Writes the OME companion document for one FOV.
pub fn write_companion(
    reader: &dyn FormatReader,
    naming: &dyn NamingScheme,
    fov: usize,
    out: &Path,
) -> Result<(), StxError> {
    let shape = reader.shape();
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    let xml = |err| StxError::Conversion(format!("{err}"));

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(xml)?;
    let mut ome = BytesStart::new("OME");
    ome.push_attribute(("xmlns", OME_XMLNS));
    writer.write_event(Event::Start(ome)).map_err(xml)?;

    let mut img = BytesStart::new("Image");
    img.push_attribute(("ID", "Image:0"));
    img.push_attribute(("Name", format!("{}_{:03}", naming.root(), fov).as_str()));
    writer.write_event(Event::Start(img)).map_err(xml)?;

    let mut pixels = BytesStart::new("Pixels");
    pixels.push_attribute(("ID", "Pixels:0"));
    pixels.push_attribute(("DimensionOrder", "XYZCT"));
    pixels.push_attribute(("Type", "uint16"));
    pixels.push_attribute(("SizeX", shape.size_x.to_string().as_str()));
    pixels.push_attribute(("SizeY", shape.size_y.to_string().as_str()));
    pixels.push_attribute(("SizeZ", shape.size_z.to_string().as_str()));
    pixels.push_attribute(("SizeC", shape.size_c.to_string().as_str()));
    pixels.push_attribute(("SizeT", shape.size_t.to_string().as_str()));
    writer.write_event(Event::Start(pixels)).map_err(xml)?;

    let mut planes = 0usize;
    for z in 0..shape.size_z {
        for t in 0..shape.size_t {
            for c in 0..shape.size_c {
                let position = reader.plane_position(reader.plane_index(z, c, t));
                let mut plane = BytesStart::new("Plane");
                plane.push_attribute(("TheZ", z.to_string().as_str()));
                plane.push_attribute(("TheT", t.to_string().as_str()));
                plane.push_attribute(("TheC", c.to_string().as_str()));
                if let Some(x) = position.x {
                    plane.push_attribute(("PositionX", format_position(x).as_str()));
                    plane.push_attribute(("PositionXUnit", "µm"));
                }
                if let Some(y) = position.y {
                    plane.push_attribute(("PositionY", format_position(y).as_str()));
                    plane.push_attribute(("PositionYUnit", "µm"));
                }
                if let Some(zc) = position.z {
                    plane.push_attribute(("PositionZ", format_position(zc).as_str()));
                    plane.push_attribute(("PositionZUnit", "µm"));
                }
                writer.write_event(Event::Empty(plane)).map_err(xml)?;

                let mut tiff_data = BytesStart::new("TiffData");
                tiff_data.push_attribute(("FirstZ", z.to_string().as_str()));
                tiff_data.push_attribute(("FirstT", t.to_string().as_str()));
                tiff_data.push_attribute(("FirstC", c.to_string().as_str()));
                tiff_data.push_attribute(("IFD", "0"));
                tiff_data.push_attribute(("PlaneCount", "1"));
                writer.write_event(Event::Start(tiff_data)).map_err(xml)?;
                let mut uuid = BytesStart::new("UUID");
                uuid.push_attribute(("FileName", naming.tiff_filename(fov, z, t, c).as_str()));
                writer.write_event(Event::Empty(uuid)).map_err(xml)?;
                writer
                    .write_event(Event::End(BytesEnd::new("TiffData")))
                    .map_err(xml)?;
                planes += 1;
            }
        }
    }
    debug!(fov, planes, "wrote companion plane list");

    writer
        .write_event(Event::End(BytesEnd::new("Pixels")))
        .map_err(xml)?;
    writer
        .write_event(Event::End(BytesEnd::new("Image")))
        .map_err(xml)?;
    writer
        .write_event(Event::End(BytesEnd::new("OME")))
        .map_err(xml)?;

    let path = out.join(naming.companion_filename(fov));
    fs::write(&path, writer.into_inner()).map_err(|err| StxError::io(path, err))
}

/// Formats a position the way OME-XML prints lengths: whole values keep
/// one decimal digit (`444.0`), fractional values print exactly.
fn format_position(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_positions_keep_one_decimal() {
        assert_eq!(format_position(444.0), "444.0");
        assert_eq!(format_position(0.0), "0.0");
        assert_eq!(format_position(1.25), "1.25");
    }
}
