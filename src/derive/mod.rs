//! Derivation stages.
//!
//! - `plan`: which artifacts a source yields (pure)
//! - `convert_full_size`: one alternate-format copy at natural size
//! - `generate_responsive`: the (width × format) matrix for banner sources
//!
//! Failures are caught per artifact, logged, and recorded in the `Ledger`;
//! nothing here returns an error to the caller.

use std::path::Path;

use tracing::{error, info, warn};

use crate::codec::{Codec, DecodedImage};
use crate::domain::{ConversionFailure, DerivedArtifact, SourceImage, Stage, VariantSpec};

pub mod plan;

pub use plan::{SourcePlan, TierPlan, materialized_breakpoints, plan_source};

/// Artifacts written and failures seen during a run.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    pub artifacts: Vec<DerivedArtifact>,
    pub failures: Vec<ConversionFailure>,
}

impl Ledger {
    pub fn record_failure(&mut self, source: &str, target: Option<String>, stage: Stage, message: impl Into<String>) {
        let failure = ConversionFailure {
            source: source.to_string(),
            target,
            stage,
            message: message.into(),
        };
        error!(
            source = %failure.source,
            output = failure.target.as_deref().unwrap_or("-"),
            stage = %failure.stage,
            "conversion failed: {}",
            failure.message
        );
        self.failures.push(failure);
    }
}

/// Encode `image` per `spec` and write it next to the source.
///
/// Returns `true` when the artifact landed on disk.
fn emit(
    codec: &dyn Codec,
    image: &DecodedImage,
    source: &SourceImage,
    spec: &VariantSpec,
    asset_dir: &Path,
    ledger: &mut Ledger,
) -> bool {
    let name = spec.file_name(&source.basename);
    let bytes = match codec.encode(image, &spec.profile) {
        Ok(bytes) => bytes,
        Err(e) => {
            ledger.record_failure(&source.basename, Some(name), Stage::Encode, e.to_string());
            return false;
        }
    };

    let output_path = asset_dir.join(&name);
    match crate::io::write_output(&output_path, &bytes) {
        Ok(bytes_written) => {
            ledger.artifacts.push(DerivedArtifact {
                output_path,
                source: source.basename.clone(),
                variant: *spec,
                bytes_written,
            });
            true
        }
        Err(e) => {
            ledger.record_failure(&source.basename, Some(name), Stage::Write, e.to_string());
            false
        }
    }
}

/// Full-size conversion into the plan's alternate format.
///
/// A plan without a full-size variant (its output would replace the source)
/// is recorded as a `plan` failure and the source file is left untouched.
pub fn convert_full_size(
    codec: &dyn Codec,
    decoded: &DecodedImage,
    source: &SourceImage,
    plan: &SourcePlan,
    asset_dir: &Path,
    ledger: &mut Ledger,
) {
    let Some(full) = &plan.full else {
        ledger.record_failure(
            &source.basename,
            Some(format!("{}.{}", source.basename, source.extension)),
            Stage::Plan,
            "full-size output would overwrite the source",
        );
        return;
    };
    if emit(codec, decoded, source, full, asset_dir, ledger) {
        info!(
            source = %source.basename,
            output = %full.file_name(&source.basename),
            "converted at full size"
        );
    }
}

/// Responsive variants for every tier in the plan.
///
/// Each tier is resized once from the original decode; the two siblings are
/// encoded and written independently.
pub fn generate_responsive(
    codec: &dyn Codec,
    decoded: &DecodedImage,
    source: &SourceImage,
    plan: &SourcePlan,
    asset_dir: &Path,
    ledger: &mut Ledger,
) {
    if !plan.banner {
        return;
    }
    info!(
        source = %source.basename,
        width = source.natural_width,
        height = source.natural_height,
        tiers = plan.tiers.len(),
        "natural size"
    );

    for tier in &plan.tiers {
        let width = tier.breakpoint.width;
        let resized = match codec.resize(decoded, width) {
            Ok(img) => img,
            Err(e) => {
                for v in &tier.variants {
                    ledger.record_failure(
                        &source.basename,
                        Some(v.file_name(&source.basename)),
                        Stage::Resize,
                        e.to_string(),
                    );
                }
                continue;
            }
        };

        let mut written = 0usize;
        for v in &tier.variants {
            if emit(codec, &resized, source, v, asset_dir, ledger) {
                written += 1;
            }
        }
        if written > 0 {
            info!(
                source = %source.basename,
                tier = tier.breakpoint.tier,
                width,
                written,
                "generated {width}w variants"
            );
        } else {
            warn!(source = %source.basename, tier = tier.breakpoint.tier, width, "no {width}w variants written");
        }
    }
}
