//! `element-networks` library crate.
//!
//! The binary (`enet`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the extraction and fitting stages can be driven from other front-ends
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod logging;
pub mod math;
pub mod network;
pub mod report;
