//! Export a run manifest to JSON.
//!
//! The manifest lists what a `respimg run` wrote, what it skipped and what
//! failed, so deploy scripts can diff runs without re-scanning the asset tree.

use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::app::pipeline::RunOutput;
use crate::domain::{ConversionFailure, DerivedArtifact, MissingSource};
use crate::error::{AppError, EXIT_INPUT};

#[derive(Debug, Serialize)]
pub struct RunManifest<'a> {
    pub tool: &'static str,
    pub generated_at: DateTime<Utc>,
    pub asset_dir: &'a Path,
    pub artifacts: &'a [DerivedArtifact],
    pub missing: &'a [MissingSource],
    pub failures: &'a [ConversionFailure],
}

impl<'a> RunManifest<'a> {
    pub fn from_run(run: &'a RunOutput, generated_at: DateTime<Utc>) -> Self {
        Self {
            tool: "respimg",
            generated_at,
            asset_dir: &run.asset_dir,
            artifacts: &run.ledger.artifacts,
            missing: &run.missing,
            failures: &run.ledger.failures,
        }
    }
}

/// Write the run manifest as pretty JSON.
pub fn write_run_manifest(path: &Path, run: &RunOutput) -> Result<PathBuf, AppError> {
    let file = File::create(path).map_err(|e| AppError::input("Failed to create run manifest", path, e))?;
    let manifest = RunManifest::from_run(run, Utc::now());
    serde_json::to_writer_pretty(file, &manifest)
        .map_err(|e| AppError::new(EXIT_INPUT, format!("Failed to write run manifest: {e}")))?;
    Ok(path.to_path_buf())
}
