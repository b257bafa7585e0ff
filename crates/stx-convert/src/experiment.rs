//! The experiment assembler: dataset manifest, experiment descriptor and
//! codebook.
//!
//! The assembler is the only state shared across concurrent conversion
//! units. `add_fov` appends one key→filename entry and rewrites all three
//! aggregate documents as a single atomic step behind a mutex, so
//! concurrent completions never interleave partial writes.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use serde_json::json;
use stx_core::errors::StxError;
use stx_core::naming::NamingScheme;
use tracing::debug;

const MANIFEST_VERSION: &str = "0.0.0";
const EXPERIMENT_VERSION: &str = "5.0.0";

/// Dataset manifest document (`{root}.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetManifest {
    /// FOV key → per-FOV JSON file, ascending FOV order.
    pub contents: BTreeMap<String, String>,
    /// Always null; reserved by the schema.
    pub extras: serde_json::Value,
    /// Manifest schema version.
    pub version: String,
}

/// Experiment descriptor document (`experiment.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentDoc {
    /// Experiment schema version.
    pub version: String,
    /// Image group name → manifest file.
    pub images: BTreeMap<String, String>,
    /// Always an empty object; reserved by the schema.
    pub extras: serde_json::Value,
    /// Codebook file name.
    pub codebook: String,
}

/// Accumulates completed FOVs and re-serializes the aggregate documents.
pub struct ExperimentWriter {
    naming: Arc<dyn NamingScheme>,
    out: PathBuf,
    codebook: Option<PathBuf>,
    fovs: Mutex<BTreeSet<usize>>,
}

impl ExperimentWriter {
    /// Creates an assembler writing under `out`.
    ///
    /// When `codebook` is given, the file is copied into the fileset as
    /// `codebook.json` on every flush; otherwise the placeholder stub is
    /// emitted.
    pub fn new(naming: Arc<dyn NamingScheme>, out: &Path, codebook: Option<PathBuf>) -> Self {
        Self {
            naming,
            out: out.to_path_buf(),
            codebook,
            fovs: Mutex::new(BTreeSet::new()),
        }
    }

    /// Registers a completed FOV and rewrites the aggregate documents.
    pub fn add_fov(&self, fov: usize) -> Result<(), StxError> {
        // The document rewrite is idempotent over the FOV set, so a lock
        // poisoned by a panicking sibling is still safe to reuse.
        let mut fovs = self
            .fovs
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        fovs.insert(fov);
        debug!(fov, "registered completed FOV");
        self.write_documents(&fovs)
    }

    /// Rewrites the aggregate documents for the FOVs seen so far.
    pub fn flush(&self) -> Result<(), StxError> {
        let fovs = self
            .fovs
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        self.write_documents(&fovs)
    }

    fn write_documents(&self, fovs: &BTreeSet<usize>) -> Result<(), StxError> {
        let manifest = DatasetManifest {
            contents: fovs
                .iter()
                .map(|&fov| (self.naming.fov_key(fov), self.naming.json_filename(fov)))
                .collect(),
            extras: serde_json::Value::Null,
            version: MANIFEST_VERSION.to_string(),
        };
        write_json(&self.out.join(self.naming.manifest_filename()), &manifest)?;

        let mut images = BTreeMap::new();
        images.insert("primary".to_string(), self.naming.manifest_filename());
        let experiment = ExperimentDoc {
            version: EXPERIMENT_VERSION.to_string(),
            images,
            extras: json!({}),
            codebook: "codebook.json".to_string(),
        };
        write_json(&self.out.join("experiment.json"), &experiment)?;

        let codebook_path = self.out.join("codebook.json");
        match &self.codebook {
            Some(source) => {
                fs::copy(source, &codebook_path)
                    .map_err(|err| StxError::io(source.clone(), err))?;
            }
            None => write_json(&codebook_path, &stub_codebook())?,
        }
        Ok(())
    }
}

/// The placeholder single-entry codebook emitted when none is attached.
pub fn stub_codebook() -> serde_json::Value {
    json!([
        {
            "codeword": [ { "r": 0, "c": 0, "v": 1 } ],
            "target": "PLEASE_REPLACE_ME"
        }
    ])
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StxError> {
    let json =
        serde_json::to_string_pretty(value).map_err(|err| StxError::Serde(err.to_string()))?;
    fs::write(path, json).map_err(|err| StxError::io(path, err))
}
