//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - formats, breakpoints and encoding profiles (`TargetFormat`, `BREAKPOINTS`, `EncodingProfiles`)
//! - sources and what gets derived from them (`SourceImage`, `VariantSpec`, `DerivedArtifact`)
//! - the output naming convention (`naming`)

pub mod naming;
pub mod types;

pub use types::*;
