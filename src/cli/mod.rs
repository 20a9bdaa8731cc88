//! Command-line parsing for the responsive image tool.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! pipeline code. Env-backed flags can also come from a `.env` file, which
//! `app::run` loads before parsing.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::TargetFormat;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "respimg", version, about = "Full-size and responsive image variants for a website asset directory")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Convert every catalog image and write responsive variants for banners.
    Run(RunArgs),
    /// Print what `run` would write, without encoding anything.
    Plan(CommonArgs),
    /// Check that every expected output exists (plus optional stylesheet/aux checks).
    Verify(VerifyArgs),
}

impl Command {
    pub fn common(&self) -> &CommonArgs {
        match self {
            Command::Run(args) => &args.common,
            Command::Plan(args) => args,
            Command::Verify(args) => &args.common,
        }
    }
}

/// Options shared by every subcommand.
#[derive(Debug, Args, Clone)]
pub struct CommonArgs {
    /// Directory holding the source images; outputs are written next to them.
    #[arg(long, env = "RESPIMG_ASSET_DIR", default_value = "public/images")]
    pub asset_dir: PathBuf,

    /// Basename substring that marks an image for responsive variants.
    #[arg(long, env = "RESPIMG_BANNER_TAG", default_value = "banner")]
    pub banner_tag: String,

    /// Source file name to process (repeatable, kept in order).
    #[arg(long = "image", value_name = "NAME", conflicts_with_all = ["scan", "catalog"])]
    pub images: Vec<String>,

    /// Process every PNG/JPEG at the top level of the asset directory.
    #[arg(long, conflicts_with = "catalog")]
    pub scan: bool,

    /// TOML manifest listing source names (`images = [...]`).
    #[arg(long, value_name = "TOML")]
    pub catalog: Option<PathBuf>,

    /// Format of the full-size conversion.
    #[arg(long, value_enum, default_value_t = TargetFormat::Webp)]
    pub full_format: TargetFormat,

    /// Debug-level logging (overridden by RUST_LOG).
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Args, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Write a JSON manifest of the run (artifacts, missing sources, failures).
    #[arg(long, value_name = "JSON")]
    pub manifest: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct VerifyArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Stylesheet that must reference the derived format.
    #[arg(long, value_name = "CSS")]
    pub stylesheet: Option<PathBuf>,

    /// Literal token to look for in the stylesheet.
    #[arg(long, default_value = ".webp")]
    pub token: String,

    /// Auxiliary file that must exist and be non-empty (repeatable).
    #[arg(long = "require", value_name = "PATH")]
    pub required: Vec<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_with_images_keeps_order() {
        let cli = Cli::try_parse_from([
            "respimg",
            "run",
            "--asset-dir",
            "assets",
            "--image",
            "deal-01.jpg",
            "--image",
            "banner-01.png",
            "--full-format",
            "png",
        ])
        .unwrap();
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.common.images, vec!["deal-01.jpg", "banner-01.png"]);
        assert_eq!(args.common.asset_dir, PathBuf::from("assets"));
        assert_eq!(args.common.full_format, TargetFormat::Png);
    }

    #[test]
    fn scan_and_images_conflict() {
        let res = Cli::try_parse_from(["respimg", "plan", "--scan", "--image", "a.png"]);
        assert!(res.is_err());
    }

    #[test]
    fn verify_collects_required_files() {
        let cli = Cli::try_parse_from([
            "respimg",
            "verify",
            "--stylesheet",
            "site.css",
            "--require",
            "lazy.js",
            "--require",
            "app.js",
        ])
        .unwrap();
        let Command::Verify(args) = cli.command else {
            panic!("expected verify");
        };
        assert_eq!(args.token, ".webp");
        assert_eq!(args.required.len(), 2);
        assert_eq!(args.stylesheet, Some(PathBuf::from("site.css")));
    }
}
