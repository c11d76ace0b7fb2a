//! Model fitting.
//!
//! Responsibilities:
//!
//! - transform table columns and fit one candidate form by OLS (`fitter`)
//! - run the analyst's fixed candidate list, isolating failures (`candidates`)
//! - expose residual Q-Q diagnostics for manual comparison (`diagnostics`)

pub mod candidates;
pub mod diagnostics;
pub mod fitter;

pub use candidates::*;
pub use diagnostics::*;
pub use fitter::*;
