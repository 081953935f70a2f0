pub mod batch;
pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod parser;
pub mod processor;
pub mod writer;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::batch::BatchReport;
use crate::cli::{Cli, Command};

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_target(false)
        .init();
}

fn names(list: Vec<String>) -> Option<Vec<String>> {
    (!list.is_empty()).then_some(list)
}

pub fn run() -> anyhow::Result<BatchReport> {
    let args = Cli::parse();
    init_logging(args.verbose);

    // 1. ── Settings ───────────────────────────────────────────────────
    let settings = config::Settings::load_or_create(&args.config)
        .with_context(|| format!("Loading settings from {}", args.config.display()))?;

    // 2. ── Convert ────────────────────────────────────────────────────
    let report = match args.command {
        Command::MapToJson { force, names: list } => batch::map_to_json(&settings, names(list), force)?,
        Command::JsonToMap { names: list } => batch::json_to_map(&settings, names(list))?,
    };

    // 3. ── Summary ────────────────────────────────────────────────────
    for file in report.files.iter().filter(|f| !f.warnings.is_empty()) {
        tracing::warn!("{}: {} warning(s)", file.name, file.warnings.len());
    }
    tracing::info!(
        files = report.files.len(),
        failed = report.failed(),
        warnings = report.warnings(),
        "done"
    );
    Ok(report)
}
