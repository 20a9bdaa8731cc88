//! Verification pass.
//!
//! Re-derives the expected output names from the same planner the derivation
//! pass uses, then checks the asset directory: every expected output must
//! exist and be non-empty. Optionally also checks that a stylesheet references
//! a format token (e.g. `.webp`) and that required auxiliary files are present.

use std::fs;
use std::path::PathBuf;

use tracing::{debug, warn};

use crate::app::pipeline::plan_catalog;
use crate::catalog::CatalogProvider;
use crate::codec::Codec;
use crate::domain::PipelineConfig;
use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct VerifyConfig {
    pub pipeline: PipelineConfig,
    pub stylesheet: Option<PathBuf>,
    /// Literal token the stylesheet must contain.
    pub token: String,
    pub required: Vec<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckKind {
    Source,
    Output,
    Stylesheet,
    Required,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    /// Present; carries the file size.
    Present(u64),
    /// Stylesheet contained the token this many times.
    Referenced(usize),
    Missing,
    Empty,
    /// Catalog entry absent; nothing to verify for it.
    Skipped,
    Failed(String),
}

impl CheckStatus {
    pub fn is_failure(&self) -> bool {
        matches!(self, CheckStatus::Missing | CheckStatus::Empty | CheckStatus::Failed(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Check {
    pub kind: CheckKind,
    pub target: String,
    pub status: CheckStatus,
}

#[derive(Debug, Clone, Default)]
pub struct VerifyReport {
    pub checks: Vec<Check>,
}

impl VerifyReport {
    pub fn failures(&self) -> impl Iterator<Item = &Check> {
        self.checks.iter().filter(|c| c.status.is_failure())
    }

    pub fn passed(&self) -> bool {
        self.failures().next().is_none()
    }

    fn push(&mut self, kind: CheckKind, target: impl Into<String>, status: CheckStatus) {
        let check = Check {
            kind,
            target: target.into(),
            status,
        };
        if check.status.is_failure() {
            warn!(check = %check.target, status = ?check.status, "verification check failed");
        } else {
            debug!(check = %check.target, status = ?check.status, "verification check ok");
        }
        self.checks.push(check);
    }
}

fn file_status(path: &std::path::Path) -> CheckStatus {
    match fs::metadata(path) {
        Ok(meta) if !meta.is_file() => CheckStatus::Failed("not a regular file".to_string()),
        Ok(meta) if meta.len() == 0 => CheckStatus::Empty,
        Ok(meta) => CheckStatus::Present(meta.len()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => CheckStatus::Missing,
        Err(e) => CheckStatus::Failed(e.to_string()),
    }
}

pub fn verify(provider: &dyn CatalogProvider, codec: &dyn Codec, config: &VerifyConfig) -> Result<VerifyReport, AppError> {
    let planned = plan_catalog(provider, codec, &config.pipeline)?;
    let mut report = VerifyReport::default();

    for missing in &planned.missing {
        report.push(CheckKind::Source, missing.name.clone(), CheckStatus::Skipped);
    }
    for failure in &planned.probe_failures {
        report.push(CheckKind::Source, failure.name.clone(), CheckStatus::Failed(failure.message.clone()));
    }
    for (_, plan) in &planned.plans {
        for name in plan.file_names() {
            let status = file_status(&config.pipeline.asset_dir.join(&name));
            report.push(CheckKind::Output, name, status);
        }
    }

    if let Some(sheet) = &config.stylesheet {
        let status = match fs::read_to_string(sheet) {
            Ok(text) => match text.matches(config.token.as_str()).count() {
                0 => CheckStatus::Failed(format!("no '{}' references", config.token)),
                n => CheckStatus::Referenced(n),
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => CheckStatus::Missing,
            Err(e) => CheckStatus::Failed(e.to_string()),
        };
        report.push(CheckKind::Stylesheet, sheet.display().to_string(), status);
    }

    for path in &config.required {
        report.push(CheckKind::Required, path.display().to_string(), file_status(path));
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    use crate::app::pipeline::run_pipeline;
    use crate::catalog::StaticCatalog;
    use crate::codec::ImageCodec;
    use image::RgbImage;

    fn setup(dir: &Path) -> StaticCatalog {
        RgbImage::new(800, 10).save(dir.join("banner-01.png")).unwrap();
        RgbImage::new(300, 10).save(dir.join("deal-01.png")).unwrap();
        StaticCatalog::new(["banner-01.png", "deal-01.png", "absent.png"])
    }

    fn vconfig(dir: &Path) -> VerifyConfig {
        VerifyConfig {
            pipeline: PipelineConfig::new(dir),
            stylesheet: None,
            token: ".webp".to_string(),
            required: Vec::new(),
        }
    }

    #[test]
    fn expected_names_match_emitted_names() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = setup(dir.path());
        let config = vconfig(dir.path());

        let run = run_pipeline(&catalog, &ImageCodec, &config.pipeline).unwrap();
        let report = verify(&catalog, &ImageCodec, &config).unwrap();

        let mut expected: Vec<String> = report
            .checks
            .iter()
            .filter(|c| c.kind == CheckKind::Output)
            .map(|c| c.target.clone())
            .collect();
        let mut emitted: Vec<String> = run
            .ledger
            .artifacts
            .iter()
            .map(|a| a.output_path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        expected.sort();
        emitted.sort();
        assert_eq!(expected, emitted);
        assert!(report.passed(), "{:?}", report.failures().collect::<Vec<_>>());
    }

    #[test]
    fn missing_and_empty_outputs_fail() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = setup(dir.path());
        let config = vconfig(dir.path());
        run_pipeline(&catalog, &ImageCodec, &config.pipeline).unwrap();

        fs::remove_file(dir.path().join("banner-01-768w.jpg")).unwrap();
        fs::write(dir.path().join("deal-01.webp"), b"").unwrap();

        let report = verify(&catalog, &ImageCodec, &config).unwrap();
        let failed: Vec<(&str, &CheckStatus)> = report.failures().map(|c| (c.target.as_str(), &c.status)).collect();
        assert_eq!(
            failed,
            vec![
                ("banner-01-768w.jpg", &CheckStatus::Missing),
                ("deal-01.webp", &CheckStatus::Empty),
            ]
        );
        assert!(
            report
                .checks
                .iter()
                .any(|c| c.target == "absent.png" && c.status == CheckStatus::Skipped)
        );
    }

    #[test]
    fn stylesheet_and_required_files() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = StaticCatalog::new(Vec::<String>::new());
        let css = dir.path().join("site.css");
        fs::write(&css, ".hero { background: url(banner-01.webp); }\n.x{background:url(a.webp)}").unwrap();
        let aux = dir.path().join("lazy-load.js");
        fs::write(&aux, "export {}").unwrap();

        let mut config = vconfig(dir.path());
        config.stylesheet = Some(css.clone());
        config.required = vec![aux, dir.path().join("missing.js")];

        let report = verify(&catalog, &ImageCodec, &config).unwrap();
        assert_eq!(report.checks[0].status, CheckStatus::Referenced(2));
        assert!(matches!(report.checks[1].status, CheckStatus::Present(9)));
        assert_eq!(report.checks[2].status, CheckStatus::Missing);
        assert!(!report.passed());

        fs::write(&css, "body { color: red }").unwrap();
        let report = verify(&catalog, &ImageCodec, &config).unwrap();
        assert!(matches!(report.checks[0].status, CheckStatus::Failed(_)));
    }
}
