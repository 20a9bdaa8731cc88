//! Reporting: run summaries, plans and verification results.

pub mod format;

pub use format::*;
