//! Input/output helpers.
//!
//! - CSV ingest + validation (`ingest`)
//! - statistics CSV and fits JSON exports (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
