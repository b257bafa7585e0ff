//! Dataset metadata reporting for `--info`.

use serde_json::{json, Value};
use stx_core::errors::StxError;
use stx_core::reader::FormatReader;

/// Summarizes one opened input as a JSON document.
pub fn dataset_info(reader: &mut dyn FormatReader) -> Result<Value, StxError> {
    let mut series = Vec::with_capacity(reader.series_count());
    for index in 0..reader.series_count() {
        reader.set_series(index)?;
        let shape = reader.shape();
        series.push(json!({
            "index": index,
            "size_x": shape.size_x,
            "size_y": shape.size_y,
            "size_z": shape.size_z,
            "size_c": shape.size_c,
            "size_t": shape.size_t,
        }));
    }
    let wells = if reader.plate_count() > 0 {
        Value::from(reader.well_count(0))
    } else {
        Value::Null
    };
    Ok(json!({
        "input": reader.path().display().to_string(),
        "format": reader.format_name(),
        "plates": reader.plate_count(),
        "wells": wells,
        "series": series,
    }))
}
