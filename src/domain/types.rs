//! Shared domain types.
//!
//! These types are kept small and serializable so they can be:
//!
//! - passed between the catalog, planner and codec stages in-memory
//! - exported in the run manifest (JSON)
//! - printed by the report formatters

use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Output raster formats the codec can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TargetFormat {
    Webp,
    Jpeg,
    Png,
}

impl TargetFormat {
    /// File extension used in output names (no leading dot).
    pub fn extension(self) -> &'static str {
        match self {
            TargetFormat::Webp => "webp",
            TargetFormat::Jpeg => "jpg",
            TargetFormat::Png => "png",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            TargetFormat::Webp => "WebP",
            TargetFormat::Jpeg => "JPEG",
            TargetFormat::Png => "PNG",
        }
    }
}

/// One responsive width tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Breakpoint {
    pub tier: &'static str,
    pub width: u32,
}

/// Responsive breakpoints, ascending by width.
pub const BREAKPOINTS: [Breakpoint; 4] = [
    Breakpoint { tier: "small", width: 480 },
    Breakpoint { tier: "medium", width: 768 },
    Breakpoint { tier: "large", width: 1024 },
    Breakpoint { tier: "xlarge", width: 1920 },
];

/// Formats emitted for every materialized breakpoint: primary first, fallback second.
pub const RESPONSIVE_FORMATS: [TargetFormat; 2] = [TargetFormat::Webp, TargetFormat::Jpeg];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebpParams {
    /// 0..=100
    pub quality: u8,
    /// libwebp `method`, 0 (fast) ..= 6 (smallest).
    pub effort: u8,
    pub lossless: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JpegParams {
    pub quality: u8,
    pub progressive: bool,
    /// Request the optimizing encoder variant when the backend has one.
    pub optimized: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PngParams {
    pub quality: u8,
    /// zlib level, 0..=9.
    pub compression_level: u8,
    pub palette: bool,
}

/// Format-specific encoder settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "lowercase")]
pub enum EncodingProfile {
    Webp(WebpParams),
    Jpeg(JpegParams),
    Png(PngParams),
}

impl EncodingProfile {
    pub fn format(&self) -> TargetFormat {
        match self {
            EncodingProfile::Webp(_) => TargetFormat::Webp,
            EncodingProfile::Jpeg(_) => TargetFormat::Jpeg,
            EncodingProfile::Png(_) => TargetFormat::Png,
        }
    }
}

/// The process-wide profile table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodingProfiles {
    pub webp: WebpParams,
    pub jpeg: JpegParams,
    pub png: PngParams,
}

impl EncodingProfiles {
    pub const fn standard() -> Self {
        Self {
            webp: WebpParams {
                quality: 80,
                effort: 6,
                lossless: false,
            },
            jpeg: JpegParams {
                quality: 80,
                progressive: true,
                optimized: true,
            },
            png: PngParams {
                quality: 90,
                compression_level: 9,
                palette: true,
            },
        }
    }

    pub fn for_format(&self, format: TargetFormat) -> EncodingProfile {
        match format {
            TargetFormat::Webp => EncodingProfile::Webp(self.webp),
            TargetFormat::Jpeg => EncodingProfile::Jpeg(self.jpeg),
            TargetFormat::Png => EncodingProfile::Png(self.png),
        }
    }
}

impl Default for EncodingProfiles {
    fn default() -> Self {
        Self::standard()
    }
}

/// A catalog candidate that exists on disk (not yet decoded).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    /// Name as given by the catalog provider.
    pub name: String,
    pub path: PathBuf,
    pub basename: String,
    pub extension: String,
}

/// A decoded source with its natural dimensions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceImage {
    pub path: PathBuf,
    pub basename: String,
    pub extension: String,
    pub natural_width: u32,
    pub natural_height: u32,
}

impl SourceImage {
    pub fn from_entry(entry: &CatalogEntry, natural_width: u32, natural_height: u32) -> Self {
        Self {
            path: entry.path.clone(),
            basename: entry.basename.clone(),
            extension: entry.extension.clone(),
            natural_width,
            natural_height,
        }
    }
}

/// What to derive from a source: an optional width plus a format/profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VariantSpec {
    /// `None` = full size.
    pub target_width: Option<u32>,
    pub target_format: TargetFormat,
    pub profile: EncodingProfile,
}

impl VariantSpec {
    pub fn full_size(profile: EncodingProfile) -> Self {
        Self {
            target_width: None,
            target_format: profile.format(),
            profile,
        }
    }

    pub fn at_width(width: u32, profile: EncodingProfile) -> Self {
        Self {
            target_width: Some(width),
            target_format: profile.format(),
            profile,
        }
    }

    /// Output file name for this variant of `basename`.
    pub fn file_name(&self, basename: &str) -> String {
        crate::domain::naming::output_name(basename, self.target_width, self.target_format)
    }
}

/// A file written by the derivation pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DerivedArtifact {
    pub output_path: PathBuf,
    /// Basename of the source the artifact came from.
    pub source: String,
    pub variant: VariantSpec,
    pub bytes_written: u64,
}

/// A catalog candidate that was not found in the asset directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingSource {
    pub name: String,
    pub path: PathBuf,
}

/// Where a conversion failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// The plan itself was unusable (e.g. an output would replace its source).
    Plan,
    Decode,
    Resize,
    Encode,
    Write,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Plan => "plan",
            Stage::Decode => "decode",
            Stage::Resize => "resize",
            Stage::Encode => "encode",
            Stage::Write => "write",
        };
        f.write_str(s)
    }
}

/// An isolated failure for one artifact (or one source, when decoding fails).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionFailure {
    pub source: String,
    /// Output file name, absent when the source itself could not be decoded.
    pub target: Option<String>,
    pub stage: Stage,
    pub message: String,
}

/// A full run's configuration as understood by the pipeline.
///
/// Built from CLI flags, env and `.env` (see `app::pipeline_config_from_args`).
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub asset_dir: PathBuf,
    /// Substring of a basename that makes a source eligible for responsive variants.
    pub banner_tag: String,
    /// Format of the full-size conversion.
    pub full_format: TargetFormat,
    pub profiles: EncodingProfiles,
}

impl PipelineConfig {
    pub fn new(asset_dir: impl Into<PathBuf>) -> Self {
        Self {
            asset_dir: asset_dir.into(),
            banner_tag: "banner".to_string(),
            full_format: TargetFormat::Webp,
            profiles: EncodingProfiles::standard(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn breakpoints_are_ascending() {
        assert!(BREAKPOINTS.windows(2).all(|w| w[0].width < w[1].width));
    }

    #[test]
    fn profile_reports_its_format() {
        let profiles = EncodingProfiles::standard();
        for format in [TargetFormat::Webp, TargetFormat::Jpeg, TargetFormat::Png] {
            assert_eq!(profiles.for_format(format).format(), format);
        }
    }

    #[test]
    fn variant_file_names() {
        let profiles = EncodingProfiles::standard();
        let full = VariantSpec::full_size(profiles.for_format(TargetFormat::Webp));
        let w = VariantSpec::at_width(768, profiles.for_format(TargetFormat::Jpeg));
        assert_eq!(full.file_name("banner-01"), "banner-01.webp");
        assert_eq!(w.file_name("banner-01"), "banner-01-768w.jpg");
    }
}
