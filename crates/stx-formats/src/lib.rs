//! Reference imaging backends for the SpaceTx FOV writer.
//!
//! Two [`stx_core::FormatReader`] implementations ship with the writer:
//! the synthetic fake format used for testing and development, and the
//! pattern format grouping fake members along a named axis. The registry
//! resolves forced format names and auto-detects by extension.

pub mod fake;
pub mod pattern;
pub mod registry;
mod units;

pub use fake::FakeReader;
pub use pattern::PatternReader;
pub use registry::{detect_format, open_reader};
