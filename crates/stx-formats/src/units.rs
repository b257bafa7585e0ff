//! Length unit conversion for plane positions.

/// Converts a length to micrometers, or `None` when the unit is not a
/// convertible length (e.g. `reference frame`).
pub(crate) fn to_micrometers(value: f64, unit: &str) -> Option<f64> {
    let factor = match unit.trim() {
        "µm" | "um" | "micrometer" | "micrometre" => 1.0,
        "nm" | "nanometer" | "nanometre" => 1e-3,
        "mm" | "millimeter" | "millimetre" => 1e3,
        "cm" | "centimeter" | "centimetre" => 1e4,
        "m" | "meter" | "metre" => 1e6,
        _ => return None,
    };
    Some(value * factor)
}
