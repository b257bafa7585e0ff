//! The conversion orchestrator.
//!
//! One discovery task per input runs on a fixed-size worker pool; a
//! plate-bearing discovery fans out one conversion subtask per series on
//! the same pool. Every unit opens its own backend handle, converts its
//! series, builds the tile manifest and registers the FOV with the shared
//! experiment assembler. Usage errors detected during validation abort
//! the run before submission; usage errors inside a unit fail only that
//! unit while siblings run to completion.

use std::path::PathBuf;
use std::sync::Arc;

use rayon::prelude::*;
use stx_core::errors::{StxError, UsageError};
use stx_core::naming::NamingScheme;
use stx_formats::registry::open_reader;
use tracing::{error, info};

use crate::experiment::ExperimentWriter;
use crate::resolve::{resolve_source, FovAssignment, Selectors};
use crate::tiles::{build_fov_manifest, write_fov_manifest};
use crate::writer::{convert_series, ConversionStats};

/// Options governing one conversion run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Dataset entry files, in caller order.
    pub inputs: Vec<PathBuf>,
    /// Output directory; must not pre-exist.
    pub out: PathBuf,
    /// Base FOV index offset.
    pub fov_offset: usize,
    /// Explicit series selector for non-plate, single-input runs.
    pub series: Option<usize>,
    /// Worker pool size; 1 is fully sequential.
    pub jobs: usize,
    /// Naming scheme for every file of the fileset.
    pub naming: Arc<dyn NamingScheme>,
    /// Codebook file to copy into the fileset.
    pub codebook: Option<PathBuf>,
    /// Skip tile and companion writing, emitting JSON only.
    pub no_tiles: bool,
    /// Forced backend format name.
    pub format: Option<String>,
}

/// Outcome of one unit or one input group.
struct UnitOutcome {
    code: i32,
    stats: ConversionStats,
}

/// Runs a full conversion and returns the process exit code.
///
/// The exit code is the first usage error's code in submission order if
/// any unit carries one, otherwise the sum of per-unit codes (each
/// conversion failure contributing 1).
pub fn run_conversion(opts: &RunOptions) -> Result<i32, StxError> {
    if opts.out.exists() {
        return Err(UsageError::OutputExists(opts.out.clone()).into());
    }
    if let Some(codebook) = &opts.codebook {
        if !codebook.is_file() {
            return Err(UsageError::Invalid(format!(
                "codebook does not exist ({})",
                codebook.display()
            ))
            .into());
        }
    }
    std::fs::create_dir_all(&opts.out).map_err(|err| StxError::io(&opts.out, err))?;

    let assembler = Arc::new(ExperimentWriter::new(
        opts.naming.clone(),
        &opts.out,
        opts.codebook.clone(),
    ));
    let selectors = Selectors {
        explicit_series: opts.series,
        fov_offset: opts.fov_offset,
        input_count: opts.inputs.len(),
    };
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(opts.jobs.max(1))
        .build()
        .map_err(|err| StxError::Format(err.to_string()))?;

    let outcomes: Vec<UnitOutcome> = pool.install(|| {
        opts.inputs
            .par_iter()
            .enumerate()
            .map(|(position, input)| process_input(input, position, &selectors, opts, &assembler))
            .collect()
    });

    // Aggregate documents exist even when no unit completed.
    assembler.flush()?;

    let mut total = ConversionStats::default();
    let mut sum = 0;
    let mut fatal = None;
    for outcome in &outcomes {
        total.merge(&outcome.stats);
        if outcome.code >= 2 && fatal.is_none() {
            fatal = Some(outcome.code);
        }
        sum += outcome.code;
    }
    info!(
        tiles = total.tiles,
        bytes = total.bytes,
        elapsed_ms = total.elapsed_ms,
        "conversion run complete"
    );
    Ok(fatal.unwrap_or(sum))
}

/// Discovers one input's FOV assignments and converts them.
fn process_input(
    input: &PathBuf,
    position: usize,
    selectors: &Selectors,
    opts: &RunOptions,
    assembler: &ExperimentWriter,
) -> UnitOutcome {
    let assignments = match discover(input, position, selectors, opts) {
        Ok(assignments) => assignments,
        Err(err) => {
            error!(input = %input.display(), error = %err, "discovery failed");
            return UnitOutcome {
                code: err.exit_code(),
                stats: ConversionStats::default(),
            };
        }
    };

    let units: Vec<UnitOutcome> = if assignments.len() > 1 {
        // Plate fan-out: one conversion subtask per series on the pool.
        assignments
            .par_iter()
            .map(|assignment| run_unit(assignment, opts, assembler))
            .collect()
    } else {
        assignments
            .iter()
            .map(|assignment| run_unit(assignment, opts, assembler))
            .collect()
    };

    let mut stats = ConversionStats::default();
    let mut sum = 0;
    let mut fatal = None;
    for unit in &units {
        stats.merge(&unit.stats);
        if unit.code >= 2 && fatal.is_none() {
            fatal = Some(unit.code);
        }
        sum += unit.code;
    }
    UnitOutcome {
        code: fatal.unwrap_or(sum),
        stats,
    }
}

fn discover(
    input: &PathBuf,
    position: usize,
    selectors: &Selectors,
    opts: &RunOptions,
) -> Result<Vec<FovAssignment>, StxError> {
    let reader = open_reader(input, opts.format.as_deref())?;
    let assignments = resolve_source(reader.as_ref(), position, selectors)?;
    Ok(assignments)
}

/// Converts one resolved assignment with its own backend handle.
fn run_unit(assignment: &FovAssignment, opts: &RunOptions, assembler: &ExperimentWriter) -> UnitOutcome {
    match convert_assignment(assignment, opts, assembler) {
        Ok(stats) => UnitOutcome { code: 0, stats },
        Err(err) => {
            error!(
                input = %assignment.input.display(),
                fov = assignment.fov,
                error = %err,
                "conversion unit failed"
            );
            UnitOutcome {
                code: err.exit_code(),
                stats: ConversionStats::default(),
            }
        }
    }
}

fn convert_assignment(
    assignment: &FovAssignment,
    opts: &RunOptions,
    assembler: &ExperimentWriter,
) -> Result<ConversionStats, StxError> {
    let mut reader = open_reader(&assignment.input, opts.format.as_deref())?;
    reader.set_series(assignment.series)?;

    let stats = if opts.no_tiles {
        ConversionStats::default()
    } else {
        convert_series(
            reader.as_mut(),
            opts.naming.as_ref(),
            assignment.fov,
            &opts.out,
            None,
        )?
    };

    let manifest = build_fov_manifest(
        reader.as_ref(),
        opts.naming.as_ref(),
        assignment.fov,
        &opts.out,
    )?;
    write_fov_manifest(&manifest, opts.naming.as_ref(), assignment.fov, &opts.out)?;
    assembler.add_fov(assignment.fov)?;
    Ok(stats)
}
