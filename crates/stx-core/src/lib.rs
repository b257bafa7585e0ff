#![deny(missing_docs)]
#![doc = "Core traits and data types for the SpaceTx FOV writer: the error taxonomy, the naming scheme seam and the imaging backend seam."]

pub mod errors;
pub mod naming;
pub mod reader;

pub use errors::{StxError, UsageError};
pub use naming::{resolve_naming, NamingScheme, StandardNaming};
pub use reader::{FormatReader, PlanePosition, SeriesShape};
