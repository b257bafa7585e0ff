//! The FOV resolver: maps backend-reported shape plus user selectors to
//! output FOV bindings.

use std::path::PathBuf;

use stx_core::errors::UsageError;
use stx_core::reader::FormatReader;

/// User-supplied selectors steering FOV resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selectors {
    /// Explicit series choice for a non-plate, single-input run.
    pub explicit_series: Option<usize>,
    /// Base offset added to every output FOV index.
    pub fov_offset: usize,
    /// Total number of inputs in the run.
    pub input_count: usize,
}

/// One unit of conversion work: `(source, series) → output FOV`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FovAssignment {
    /// Input path the unit opens its own reader against.
    pub input: PathBuf,
    /// Series within the input to convert.
    pub series: usize,
    /// Output FOV index; unique within a run.
    pub fov: usize,
}

/// Resolves one source into its ordered FOV assignments.
///
/// `position` is the source's 0-based place among the run's inputs; for
/// multiple non-plate sources it decides the output index regardless of
/// scheduling, so callers pre-sort inputs when cross-run determinism
/// matters.
///
/// Plate-bearing (screening) sources take precedence: they are only
/// accepted alone in a run, with exactly one plate holding exactly one
/// well, and then produce one assignment per series. Non-plate sources
/// with several series require an explicit selection and always produce
/// exactly one assignment.
pub fn resolve_source(
    reader: &dyn FormatReader,
    position: usize,
    selectors: &Selectors,
) -> Result<Vec<FovAssignment>, UsageError> {
    let input = reader.path().to_path_buf();
    let plate_count = reader.plate_count();
    let series_count = reader.series_count();

    if plate_count > 0 {
        if selectors.input_count > 1 {
            return Err(UsageError::SingleScreening);
        }
        if plate_count > 1 {
            return Err(UsageError::TooManyPlates(plate_count));
        }
        let well_count = reader.well_count(0);
        if well_count != 1 {
            return Err(UsageError::TooManyWells(well_count));
        }
        return Ok((0..series_count)
            .map(|series| FovAssignment {
                input: input.clone(),
                series,
                fov: series + selectors.fov_offset,
            })
            .collect());
    }

    let series = match selectors.explicit_series {
        Some(series) => series,
        None if series_count > 1 => {
            return Err(UsageError::MultipleImages {
                input: input.display().to_string(),
                count: series_count,
            });
        }
        None => 0,
    };
    Ok(vec![FovAssignment {
        input,
        series,
        fov: position + selectors.fov_offset,
    }])
}
