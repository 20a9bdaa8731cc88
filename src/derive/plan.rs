//! Variant planning: which artifacts a source should yield.
//!
//! Pure functions of (basename, source extension, natural width, config). The driver, the `plan`
//! command and the verification pass all derive their file lists from here.

use crate::domain::naming::{is_banner, replaces_source};
use crate::domain::{BREAKPOINTS, Breakpoint, PipelineConfig, RESPONSIVE_FORMATS, VariantSpec};

/// One materialized width tier with its sibling outputs (primary, fallback).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierPlan {
    pub breakpoint: Breakpoint,
    pub variants: [VariantSpec; 2],
}

/// Everything a run derives from one source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePlan {
    pub basename: String,
    /// `None` when the full-size output would overwrite the source file.
    pub full: Option<VariantSpec>,
    /// Basename carries the banner tag, whatever its width.
    pub banner: bool,
    /// Empty unless the source is banner-tagged and wide enough.
    pub tiers: Vec<TierPlan>,
}

impl SourcePlan {
    /// Output names in emission order.
    pub fn file_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.full.iter().map(|v| v.file_name(&self.basename)).collect();
        for tier in &self.tiers {
            for v in &tier.variants {
                names.push(v.file_name(&self.basename));
            }
        }
        names
    }
}

/// Breakpoints that fit inside `natural_width`.
///
/// Filters against the source's natural width only; a breakpoint equal to the
/// natural width is kept.
pub fn materialized_breakpoints(natural_width: u32) -> impl Iterator<Item = Breakpoint> {
    BREAKPOINTS.into_iter().filter(move |bp| bp.width <= natural_width)
}

pub fn plan_source(basename: &str, extension: &str, natural_width: u32, config: &PipelineConfig) -> SourcePlan {
    let full = (!replaces_source(extension, config.full_format))
        .then(|| VariantSpec::full_size(config.profiles.for_format(config.full_format)));

    let banner = is_banner(basename, &config.banner_tag);
    let tiers = if banner {
        materialized_breakpoints(natural_width)
            .map(|breakpoint| TierPlan {
                breakpoint,
                variants: RESPONSIVE_FORMATS
                    .map(|format| VariantSpec::at_width(breakpoint.width, config.profiles.for_format(format))),
            })
            .collect()
    } else {
        Vec::new()
    };

    SourcePlan {
        basename: basename.to_string(),
        full,
        banner,
        tiers,
    }
}
