//! Structured error types shared across the SpaceTx writer crates.
//!
//! Failures are split into two tiers: [`UsageError`] is the closed set of
//! caller mistakes, each variant carrying the stable process exit code
//! promised to scripts driving the CLI; [`StxError`] is the canonical
//! error type wrapping usage errors together with I/O, format and
//! serialization causes.

use std::path::PathBuf;

use thiserror::Error;

/// Closed set of caller-facing failure conditions with fixed exit codes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsageError {
    /// An input path does not point at an existing file.
    #[error("input does not exist ({0})")]
    InputDoesNotExist(String),
    /// Catch-all for invalid argument combinations.
    #[error("{0}")]
    Invalid(String),
    /// The output location is already present on disk.
    #[error("output location already exists! ({})", .0.display())]
    OutputExists(PathBuf),
    /// A non-plate input reports several series and none was selected.
    #[error("{input} contains multiple images (count={count}). Please choose one.")]
    MultipleImages {
        /// Offending input path.
        input: String,
        /// Number of series the input reports.
        count: usize,
    },
    /// The requested FOV offset is below zero.
    #[error("FOV must be greater than or equal to 0 ({0})")]
    NegativeFov(i64),
    /// A screening input reports more than one plate.
    #[error("too many plates found (count={0})")]
    TooManyPlates(usize),
    /// The single plate of a screening input holds more than one well.
    #[error("too many wells found (count={0})")]
    TooManyWells(usize),
    /// A screening input was combined with other inputs in one run.
    #[error("only a single screening fileset is supported")]
    SingleScreening,
    /// The pattern output path does not carry the `.pattern` suffix.
    #[error("pattern files must end in '.pattern'")]
    PatternSuffix,
    /// None of `-o`, `--info`, `--guess` was given.
    #[error("one of --output, --info, --guess required")]
    NeedAction,
    /// The forced or detected backend format is not known.
    #[error("unknown format: {0}")]
    UnknownFormat(String),
}

impl UsageError {
    /// Returns the stable process exit code for this condition.
    pub fn code(&self) -> i32 {
        match self {
            UsageError::InputDoesNotExist(_) => 1,
            UsageError::Invalid(_) => 2,
            UsageError::OutputExists(_) => 3,
            UsageError::MultipleImages { .. } => 4,
            UsageError::NegativeFov(_) => 5,
            UsageError::TooManyPlates(_) => 6,
            UsageError::TooManyWells(_) => 7,
            UsageError::SingleScreening => 8,
            UsageError::PatternSuffix => 9,
            UsageError::NeedAction => 10,
            UsageError::UnknownFormat(_) => 11,
        }
    }
}

/// Canonical error type for the SpaceTx writer.
#[derive(Debug, Error)]
pub enum StxError {
    /// A caller mistake with a fixed exit code.
    #[error(transparent)]
    Usage(#[from] UsageError),
    /// An I/O failure tagged with the path it occurred on.
    #[error("i/o failure on {}: {source}", .path.display())]
    Io {
        /// Path the operation was addressing.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// A backend failed to decode or encode image data.
    #[error("format error: {0}")]
    Format(String),
    /// The backend reported a failed tile or companion write.
    #[error("conversion failed: {0}")]
    Conversion(String),
    /// A JSON document could not be serialized or parsed.
    #[error("serialization error: {0}")]
    Serde(String),
}

impl StxError {
    /// Tags an I/O error with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StxError::Io {
            path: path.into(),
            source,
        }
    }

    /// Maps the error onto the process exit code surface.
    ///
    /// Usage errors keep their fixed codes, conversion failures contribute
    /// `1`, and everything unclassified falls back to the generic usage
    /// failure code `2`.
    pub fn exit_code(&self) -> i32 {
        match self {
            StxError::Usage(usage) => usage.code(),
            StxError::Conversion(_) => 1,
            _ => 2,
        }
    }
}
