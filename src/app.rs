//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and parses CLI arguments
//! - sets up logging
//! - builds the catalog provider and pipeline config
//! - runs the requested command and prints its report

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::catalog::{CatalogProvider, DirectoryCatalog, ManifestCatalog, StaticCatalog};
use crate::cli::{Command, CommonArgs, RunArgs, VerifyArgs};
use crate::codec::ImageCodec;
use crate::domain::{EncodingProfiles, PipelineConfig};
use crate::error::{AppError, EXIT_VERIFY};
use crate::verify::VerifyConfig;

pub mod pipeline;

/// Entry point for the `respimg` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();

    // `respimg` and `respimg --scan` behave like `respimg run ...`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);
    init_logging(cli.command.common().verbose);

    match cli.command {
        Command::Run(args) => handle_run(args),
        Command::Plan(args) => handle_plan(args),
        Command::Verify(args) => handle_verify(args),
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // Reports go to stdout; keep logs on stderr.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn handle_run(args: RunArgs) -> Result<(), AppError> {
    let config = pipeline_config_from_args(&args.common);
    let provider = catalog_from_args(&args.common);
    let run = pipeline::run_pipeline(provider.as_ref(), &ImageCodec::new(), &config)?;

    println!("{}", crate::report::format_run_summary(&run));

    if let Some(path) = &args.manifest {
        crate::io::write_run_manifest(path, &run)?;
    }

    Ok(())
}

fn handle_plan(args: CommonArgs) -> Result<(), AppError> {
    let config = pipeline_config_from_args(&args);
    let provider = catalog_from_args(&args);
    let plan = pipeline::plan_catalog(provider.as_ref(), &ImageCodec::new(), &config)?;

    println!("{}", crate::report::format_plan(&plan));
    Ok(())
}

fn handle_verify(args: VerifyArgs) -> Result<(), AppError> {
    let provider = catalog_from_args(&args.common);
    let config = VerifyConfig {
        pipeline: pipeline_config_from_args(&args.common),
        stylesheet: args.stylesheet,
        token: args.token,
        required: args.required,
    };
    let report = crate::verify::verify(provider.as_ref(), &ImageCodec::new(), &config)?;

    println!("{}", crate::report::format_verify_report(&report));

    let failed = report.failures().count();
    if failed > 0 {
        return Err(AppError::new(
            EXIT_VERIFY,
            format!("{failed} verification check(s) failed."),
        ));
    }
    Ok(())
}

pub fn pipeline_config_from_args(args: &CommonArgs) -> PipelineConfig {
    PipelineConfig {
        asset_dir: args.asset_dir.clone(),
        banner_tag: args.banner_tag.clone(),
        full_format: args.full_format,
        profiles: EncodingProfiles::standard(),
    }
}

/// Pick the catalog provider: explicit names, then manifest, then scan, then the built-in list.
pub fn catalog_from_args(args: &CommonArgs) -> Box<dyn CatalogProvider> {
    if !args.images.is_empty() {
        Box::new(StaticCatalog::new(args.images.clone()))
    } else if let Some(path) = &args.catalog {
        Box::new(ManifestCatalog::new(path.clone()))
    } else if args.scan {
        Box::new(DirectoryCatalog::new(args.asset_dir.clone(), args.full_format))
    } else {
        Box::new(StaticCatalog::default_list())
    }
}

/// Rewrite argv so `respimg` defaults to `respimg run`.
///
/// Rules:
/// - `respimg`                       -> `respimg run`
/// - `respimg --scan ...`            -> `respimg run --scan ...`
/// - `respimg --help/--version/-h`   -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("run".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "run" | "plan" | "verify");
    if is_subcommand {
        return argv;
    }

    // A leading flag means "run flags".
    if arg1.starts_with('-') {
        argv.insert(1, "run".to_string());
        return argv;
    }

    argv
}
