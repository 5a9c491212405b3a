//! Gantry - a build pipeline for front-end assets.

#![allow(dead_code)]

mod build;
mod chain;
mod cli;
mod config;
mod core;
mod incremental;
mod logger;
mod registry;
mod reload;
mod serve;
mod task;
mod transform;
mod utils;
mod watch;

use anyhow::Result;
use clap::{ColorChoice, Parser};

use cli::{Cli, Commands};
use config::GantryConfig;
use core::{AssetCategory, BuildMode};
use registry::PathRegistry;
use task::TaskSet;

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler()?;

    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    logger::set_verbose(cli.verbose);

    let config = GantryConfig::load(&cli)?;

    match &cli.command {
        Some(Commands::Build) => build_all(&config),
        Some(Commands::Task { category }) => run_single_task(&config, *category),
        Some(Commands::Serve { .. }) | None => serve::run_dev(&config),
    }
}

/// Run the full production build once and report totals.
///
/// Contained transform errors are logged per item and reflected in the
/// totals, not in the exit code. Only configuration and destination
/// I/O errors fail the process.
fn build_all(config: &GantryConfig) -> Result<()> {
    let registry = PathRegistry::new(config.root().to_path_buf());
    let tasks = TaskSet::new(BuildMode::PRODUCTION, registry)?;

    let rt = tokio::runtime::Builder::new_current_thread().build()?;
    let summary = rt.block_on(build::run_full_build(&tasks))?;

    if summary.total_failed() > 0 {
        crate::log!("build"; "done with {} error(s), {} file(s) written",
            summary.total_failed(), summary.total_written());
    } else {
        crate::log!("build"; "done, {} file(s) written", summary.total_written());
    }
    Ok(())
}

/// Run one category's task in production mode (`gantry task <category>`).
fn run_single_task(config: &GantryConfig, category: AssetCategory) -> Result<()> {
    let registry = PathRegistry::new(config.root().to_path_buf());
    let tasks = TaskSet::new(BuildMode::PRODUCTION, registry)?;

    let rt = tokio::runtime::Builder::new_current_thread().build()?;
    let outcome = rt.block_on(tasks.task(category).run())?;

    crate::log!(category.name(); "{}", outcome.summary());
    Ok(())
}
