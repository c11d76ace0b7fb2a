//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - catalog entries and metadata (`Element`, `ElementMeta`)
//! - occurrence-graph query payloads (`OccurrenceEdge`, `LocalityRecord`, `QueryResult`)
//! - derived statistics (`ElementNetworkRecord`, `ElementStats`)
//! - fit inputs and outputs (`FitSpec`, `Transform`, `ModelFit`)

pub mod types;

pub use types::*;
