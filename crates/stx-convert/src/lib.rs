//! FOV resolution, manifest assembly and conversion orchestration for the
//! SpaceTx writer.
//!
//! The pipeline turns one or more opened image sources into a
//! field-of-view indexed fileset: the resolver maps backend-reported
//! shape to output FOV bindings, the tile builder enumerates the (z,t,c)
//! tile space into per-FOV manifests, the experiment writer accumulates
//! the aggregate documents, and the orchestrator runs one unit per
//! binding on a bounded worker pool.

pub mod experiment;
pub mod guess;
pub mod info;
pub mod orchestrate;
pub mod resolve;
pub mod tiles;
pub mod writer;

pub use experiment::ExperimentWriter;
pub use orchestrate::{run_conversion, RunOptions};
pub use resolve::{resolve_source, FovAssignment, Selectors};
pub use tiles::{build_fov_manifest, FovManifest, TileDescriptor};
pub use writer::{convert_series, ConversionStats};
