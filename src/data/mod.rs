//! Occurrence-graph backends.
//!
//! - `graph`: the `OccurrenceGraph` contract + an in-memory implementation
//! - `remote`: an HTTP/JSON implementation
//! - `synthetic`: seeded synthetic datasets for demos and tests

pub mod graph;
pub mod remote;
pub mod synthetic;

pub use graph::*;
pub use remote::HttpGraph;
pub use synthetic::{SyntheticDataset, SyntheticSpec, generate_dataset};
