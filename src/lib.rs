//! `respimg` library crate.
//!
//! The binary (`respimg`) is a thin wrapper around this library so that:
//!
//! - the pipeline is testable without spawning processes
//! - the codec and catalog seams can be swapped (other backends, manifests)
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod catalog;
pub mod cli;
pub mod codec;
pub mod derive;
pub mod domain;
pub mod error;
pub mod io;
pub mod report;
pub mod verify;
