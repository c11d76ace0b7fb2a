//! Reporting: equation strings and terminal output.

pub mod format;
pub mod formula;

pub use format::*;
pub use formula::*;
