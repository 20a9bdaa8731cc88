//! Shared pipeline logic used by the `run`, `plan` and `verify` commands.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! catalog -> resolve -> decode once -> full-size conversion -> responsive variants
//!
//! The commands can then focus on presentation (printing vs manifests).

use std::path::PathBuf;

use tracing::info;

use crate::catalog::{self, CatalogProvider, Resolution};
use crate::codec::Codec;
use crate::derive::{Ledger, SourcePlan, convert_full_size, generate_responsive, plan_source};
use crate::domain::{MissingSource, PipelineConfig, SourceImage, Stage};
use crate::error::AppError;

/// All outputs of a single derivation pass.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub asset_dir: PathBuf,
    /// Provider description, for the summary.
    pub catalog: String,
    /// Sources that decoded, in catalog order.
    pub sources: Vec<SourceImage>,
    pub missing: Vec<MissingSource>,
    pub ledger: Ledger,
}

/// A source that could not be probed while planning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeFailure {
    pub name: String,
    pub message: String,
}

/// What a run would produce, without encoding anything.
#[derive(Debug, Clone)]
pub struct PlanOutput {
    pub asset_dir: PathBuf,
    pub catalog: String,
    pub plans: Vec<(SourceImage, SourcePlan)>,
    pub missing: Vec<MissingSource>,
    pub probe_failures: Vec<ProbeFailure>,
}

/// Resolve the catalog and run every present source through the derivation stages.
///
/// Only catalog/asset-directory problems are returned as errors; per-image
/// failures end up in `RunOutput::ledger`.
pub fn run_pipeline(
    provider: &dyn CatalogProvider,
    codec: &dyn Codec,
    config: &PipelineConfig,
) -> Result<RunOutput, AppError> {
    let resolution = catalog::resolve_from(provider, &config.asset_dir)?;
    Ok(run_resolved(resolution, provider.describe(), codec, config))
}

/// Derivation pass over an already resolved catalog.
pub fn run_resolved(resolution: Resolution, catalog: String, codec: &dyn Codec, config: &PipelineConfig) -> RunOutput {
    let mut ledger = Ledger::default();
    let mut sources = Vec::with_capacity(resolution.entries.len());

    for entry in &resolution.entries {
        // One decode per source, shared by every derivation below.
        let decoded = match codec.decode(&entry.path) {
            Ok(d) => d,
            Err(e) => {
                ledger.record_failure(&entry.basename, None, Stage::Decode, e.to_string());
                continue;
            }
        };
        let source = SourceImage::from_entry(entry, decoded.width(), decoded.height());
        let plan = plan_source(&source.basename, &source.extension, source.natural_width, config);

        convert_full_size(codec, &decoded, &source, &plan, &config.asset_dir, &mut ledger);
        generate_responsive(codec, &decoded, &source, &plan, &config.asset_dir, &mut ledger);

        sources.push(source);
    }

    info!(
        sources = sources.len(),
        missing = resolution.missing.len(),
        artifacts = ledger.artifacts.len(),
        failures = ledger.failures.len(),
        "pass complete"
    );

    RunOutput {
        asset_dir: config.asset_dir.clone(),
        catalog,
        sources,
        missing: resolution.missing,
        ledger,
    }
}

/// Resolve the catalog and plan each source from its header dimensions.
pub fn plan_catalog(
    provider: &dyn CatalogProvider,
    codec: &dyn Codec,
    config: &PipelineConfig,
) -> Result<PlanOutput, AppError> {
    let resolution = catalog::resolve_from(provider, &config.asset_dir)?;

    let mut plans = Vec::with_capacity(resolution.entries.len());
    let mut probe_failures = Vec::new();
    for entry in &resolution.entries {
        match codec.probe(&entry.path) {
            Ok((width, height)) => {
                let source = SourceImage::from_entry(entry, width, height);
                let plan = plan_source(&source.basename, &source.extension, width, config);
                plans.push((source, plan));
            }
            Err(e) => probe_failures.push(ProbeFailure {
                name: entry.name.clone(),
                message: e.to_string(),
            }),
        }
    }

    Ok(PlanOutput {
        asset_dir: config.asset_dir.clone(),
        catalog: provider.describe(),
        plans,
        missing: resolution.missing,
        probe_failures,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::fs;
    use std::path::Path;

    use crate::catalog::{DirectoryCatalog, StaticCatalog};
    use crate::codec::ImageCodec;
    use crate::domain::TargetFormat;
    use image::{Rgb, RgbImage};

    fn write_source(dir: &Path, name: &str, width: u32) {
        let img = RgbImage::from_fn(width, 12, |x, y| Rgb([(x % 251) as u8, (y * 20) as u8, 90]));
        img.save(dir.join(name)).unwrap();
    }

    fn listing(dir: &Path) -> BTreeSet<String> {
        fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect()
    }

    fn outputs(dir: &Path, sources: &[&str]) -> BTreeSet<String> {
        listing(dir)
            .into_iter()
            .filter(|n| !sources.contains(&n.as_str()))
            .collect()
    }

    #[test]
    fn banner_and_deal_scenario() {
        let dir = tempfile::tempdir().unwrap();
        write_source(dir.path(), "banner-01.png", 1920);
        write_source(dir.path(), "deal-01.jpg", 600);

        let catalog = StaticCatalog::new(["banner-01.png", "deal-01.jpg"]);
        let config = PipelineConfig::new(dir.path());
        let run = run_pipeline(&catalog, &ImageCodec, &config).unwrap();

        let expected: BTreeSet<String> = [
            "banner-01.webp",
            "banner-01-480w.webp",
            "banner-01-480w.jpg",
            "banner-01-768w.webp",
            "banner-01-768w.jpg",
            "banner-01-1024w.webp",
            "banner-01-1024w.jpg",
            "banner-01-1920w.webp",
            "banner-01-1920w.jpg",
            "deal-01.webp",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        assert_eq!(outputs(dir.path(), &["banner-01.png", "deal-01.jpg"]), expected);
        assert_eq!(run.ledger.artifacts.len(), expected.len());
        assert!(run.ledger.failures.is_empty());
        assert_eq!(run.sources[0].natural_width, 1920);
        assert_eq!(run.sources[1].natural_width, 600);
    }

    #[test]
    fn missing_entry_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write_source(dir.path(), "deal-01.jpg", 300);

        let catalog = StaticCatalog::new(["banner-99.png", "deal-01.jpg"]);
        let run = run_pipeline(&catalog, &ImageCodec, &PipelineConfig::new(dir.path())).unwrap();

        assert_eq!(run.missing.len(), 1);
        assert_eq!(run.missing[0].name, "banner-99.png");
        assert!(run.ledger.failures.is_empty());
        assert!(dir.path().join("deal-01.webp").is_file());
        assert!(!listing(dir.path()).iter().any(|n| n.starts_with("banner-99")));
    }

    #[test]
    fn broken_source_does_not_stop_later_entries() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("banner-bad.png"), b"not an image").unwrap();
        write_source(dir.path(), "banner-ok.png", 500);

        let catalog = StaticCatalog::new(["banner-bad.png", "banner-ok.png"]);
        let run = run_pipeline(&catalog, &ImageCodec, &PipelineConfig::new(dir.path())).unwrap();

        assert_eq!(run.ledger.failures.len(), 1);
        assert_eq!(run.ledger.failures[0].stage, Stage::Decode);
        assert_eq!(run.ledger.failures[0].source, "banner-bad");
        for name in ["banner-ok.webp", "banner-ok-480w.webp", "banner-ok-480w.jpg"] {
            assert!(dir.path().join(name).is_file(), "{name} missing");
        }
    }

    #[test]
    fn second_run_overwrites_with_identical_outputs() {
        let dir = tempfile::tempdir().unwrap();
        write_source(dir.path(), "banner-01.png", 800);
        let catalog = StaticCatalog::new(["banner-01.png"]);
        let config = PipelineConfig::new(dir.path());

        let first = run_pipeline(&catalog, &ImageCodec, &config).unwrap();
        let snapshot: Vec<(PathBuf, Vec<u8>)> = first
            .ledger
            .artifacts
            .iter()
            .map(|a| (a.output_path.clone(), fs::read(&a.output_path).unwrap()))
            .collect();
        let names_before = listing(dir.path());

        let second = run_pipeline(&catalog, &ImageCodec, &config).unwrap();

        assert_eq!(listing(dir.path()), names_before);
        assert_eq!(second.ledger.artifacts, first.ledger.artifacts);
        for (path, bytes) in snapshot {
            assert_eq!(fs::read(&path).unwrap(), bytes, "{} changed", path.display());
        }
    }

    #[test]
    fn plan_matches_what_run_writes() {
        let dir = tempfile::tempdir().unwrap();
        write_source(dir.path(), "banner-01.png", 1100);
        write_source(dir.path(), "deal-01.jpg", 600);
        let catalog = StaticCatalog::new(["banner-01.png", "deal-01.jpg", "gone.png"]);
        let config = PipelineConfig::new(dir.path());

        let planned = plan_catalog(&catalog, &ImageCodec, &config).unwrap();
        assert_eq!(planned.missing.len(), 1);
        let planned_names: BTreeSet<String> = planned.plans.iter().flat_map(|(_, p)| p.file_names()).collect();
        // Planning writes nothing.
        assert_eq!(outputs(dir.path(), &["banner-01.png", "deal-01.jpg"]), BTreeSet::new());

        let run = run_pipeline(&catalog, &ImageCodec, &config).unwrap();
        let written: BTreeSet<String> = run
            .ledger
            .artifacts
            .iter()
            .map(|a| a.output_path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(planned_names, written);
    }

    #[test]
    fn full_size_never_replaces_its_source() {
        let dir = tempfile::tempdir().unwrap();
        write_source(dir.path(), "deal-02.png", 300);
        let before = fs::read(dir.path().join("deal-02.png")).unwrap();

        let mut config = PipelineConfig::new(dir.path());
        config.full_format = TargetFormat::Png;
        let run = run_pipeline(&StaticCatalog::new(["deal-02.png"]), &ImageCodec, &config).unwrap();

        assert!(run.ledger.artifacts.is_empty());
        assert_eq!(run.ledger.failures.len(), 1);
        assert_eq!(run.ledger.failures[0].stage, Stage::Plan);
        assert_eq!(fs::read(dir.path().join("deal-02.png")).unwrap(), before);
        assert_eq!(listing(dir.path()), BTreeSet::from(["deal-02.png".to_string()]));
    }

    #[test]
    fn scan_rerun_with_png_full_format_is_stable() {
        let dir = tempfile::tempdir().unwrap();
        write_source(dir.path(), "deal-01.jpg", 300);
        write_source(dir.path(), "banner-01.jpg", 500);
        let mut config = PipelineConfig::new(dir.path());
        config.full_format = TargetFormat::Png;
        let catalog = DirectoryCatalog::new(dir.path(), TargetFormat::Png);

        let first = run_pipeline(&catalog, &ImageCodec, &config).unwrap();
        assert!(first.ledger.failures.is_empty());
        assert!(dir.path().join("deal-01.png").is_file());
        let names_after_first = listing(dir.path());

        assert_eq!(catalog.candidates().unwrap(), vec!["banner-01.jpg", "deal-01.jpg"]);
        let second = run_pipeline(&catalog, &ImageCodec, &config).unwrap();

        assert_eq!(listing(dir.path()), names_after_first);
        assert_eq!(second.sources.len(), 2);
        assert_eq!(second.ledger.artifacts, first.ledger.artifacts);
    }
}
