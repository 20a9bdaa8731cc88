//! Catalog providers and resolution.
//!
//! A provider yields an ordered list of candidate source names; `resolve` turns
//! that list into present `CatalogEntry`s and soft-skipped `MissingSource`s.
//! Order is always the provider's order.

use std::fs;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::domain::naming::{is_variant_basename, split_name};
use crate::domain::{CatalogEntry, MissingSource, TargetFormat};
use crate::error::{AppError, EXIT_INPUT};

/// Catalog used when no other source is configured.
pub const DEFAULT_CATALOG: [&str; 5] = [
    "banner-01.png",
    "banner-02.jpg",
    "deal-01.jpg",
    "deal-02.png",
    "hero.png",
];

/// Source extensions the directory scan picks up.
const SOURCE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Anything that can produce an ordered list of candidate file names.
pub trait CatalogProvider {
    fn candidates(&self) -> Result<Vec<String>, AppError>;

    /// Short label for logs and reports.
    fn describe(&self) -> String;
}

/// An explicit, ordered allow-list.
#[derive(Debug, Clone)]
pub struct StaticCatalog {
    names: Vec<String>,
}

impl StaticCatalog {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn default_list() -> Self {
        Self::new(DEFAULT_CATALOG)
    }
}

impl CatalogProvider for StaticCatalog {
    fn candidates(&self) -> Result<Vec<String>, AppError> {
        Ok(self.names.clone())
    }

    fn describe(&self) -> String {
        format!("static list ({} names)", self.names.len())
    }
}

/// Every raster source at the top level of a directory, sorted by name.
///
/// Our own outputs are skipped: `.webp` files, `*-<W>w.*` variants, and a
/// `<stem>.<full ext>` file sitting next to another source with that stem
/// (the full-size conversion of that source).
#[derive(Debug, Clone)]
pub struct DirectoryCatalog {
    dir: PathBuf,
    full_format: TargetFormat,
}

impl DirectoryCatalog {
    pub fn new(dir: impl Into<PathBuf>, full_format: TargetFormat) -> Self {
        Self {
            dir: dir.into(),
            full_format,
        }
    }
}

impl CatalogProvider for DirectoryCatalog {
    fn candidates(&self) -> Result<Vec<String>, AppError> {
        let mut names = Vec::new();
        for entry in WalkDir::new(&self.dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| AppError::input("Failed to scan asset directory", &self.dir, e))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str() else {
                debug!(path = %entry.path().display(), "skipping non UTF-8 file name");
                continue;
            };
            let Some((basename, ext)) = split_name(name) else {
                continue;
            };
            let ext = ext.to_ascii_lowercase();
            if !SOURCE_EXTENSIONS.contains(&ext.as_str()) || is_variant_basename(&basename) {
                continue;
            }
            names.push((name.to_string(), basename, ext));
        }

        let mut per_stem: HashMap<&str, usize> = HashMap::new();
        for (_, basename, _) in &names {
            *per_stem.entry(basename.as_str()).or_default() += 1;
        }
        let full_ext = self.full_format.extension();
        let mut out: Vec<String> = names
            .iter()
            .filter(|(name, basename, ext)| {
                let derived = ext.as_str() == full_ext && per_stem.get(basename.as_str()).copied().unwrap_or(0) > 1;
                if derived {
                    debug!(name = %name, "skipping full-size output of a sibling source");
                }
                !derived
            })
            .map(|(name, _, _)| name.clone())
            .collect();
        out.sort();
        Ok(out)
    }

    fn describe(&self) -> String {
        format!("directory scan of {}", self.dir.display())
    }
}

/// A TOML manifest:
///
/// ```toml
/// images = ["banner-01.png", "deal-01.jpg"]
/// ```
#[derive(Debug, Clone)]
pub struct ManifestCatalog {
    path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct ManifestFile {
    images: Vec<String>,
}

impl ManifestCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CatalogProvider for ManifestCatalog {
    fn candidates(&self) -> Result<Vec<String>, AppError> {
        let text = fs::read_to_string(&self.path)
            .map_err(|e| AppError::input("Failed to read catalog manifest", &self.path, e))?;
        let manifest: ManifestFile = toml::from_str(&text)
            .map_err(|e| AppError::input("Invalid catalog manifest", &self.path, e))?;
        Ok(manifest.images)
    }

    fn describe(&self) -> String {
        format!("manifest {}", self.path.display())
    }
}

/// Resolved catalog: present entries plus soft-skipped names.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub entries: Vec<CatalogEntry>,
    pub missing: Vec<MissingSource>,
}

/// Check each candidate against `asset_dir`. Missing files are reported, never fatal.
pub fn resolve(candidates: &[String], asset_dir: &Path) -> Resolution {
    let mut out = Resolution::default();
    for name in candidates {
        let path = asset_dir.join(name);
        if !is_plain_file_name(name) {
            warn!(name = %name, "not a plain file name, skipping");
            out.missing.push(MissingSource { name: name.clone(), path });
            continue;
        }
        let parts = split_name(name);
        match parts {
            Some((basename, extension)) if path.is_file() => {
                info!(name = %name, "found source");
                out.entries.push(CatalogEntry {
                    name: name.clone(),
                    path,
                    basename,
                    extension,
                });
            }
            Some(_) => {
                warn!(name = %name, path = %path.display(), "source not found, skipping");
                out.missing.push(MissingSource { name: name.clone(), path });
            }
            None => {
                warn!(name = %name, "source name has no extension, skipping");
                out.missing.push(MissingSource { name: name.clone(), path });
            }
        }
    }
    out
}

/// A single normal path component: no separators, no `..`, not absolute.
fn is_plain_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// Pull candidates from `provider` and resolve them.
pub fn resolve_from(provider: &dyn CatalogProvider, asset_dir: &Path) -> Result<Resolution, AppError> {
    if !asset_dir.is_dir() {
        return Err(AppError::new(
            EXIT_INPUT,
            format!("Asset directory '{}' does not exist.", asset_dir.display()),
        ));
    }
    let candidates = provider.candidates()?;
    info!(catalog = %provider.describe(), candidates = candidates.len(), "resolving catalog");
    Ok(resolve(&candidates, asset_dir))
}
