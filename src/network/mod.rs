//! Network statistic extraction.
//!
//! Responsibilities:
//!
//! - restrict the element catalog to the study's temporal scope
//! - derive per-element counts from occurrence-graph queries
//! - aggregate the counts into a table joined with catalog metadata

pub mod aggregate;
pub mod catalog;
pub mod extractor;

pub use aggregate::*;
pub use catalog::*;
pub use extractor::*;
