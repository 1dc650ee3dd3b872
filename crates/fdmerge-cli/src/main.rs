mod commands;
mod logging;
mod progress;
mod summary;

use std::process::ExitCode;

use anyhow::Context;
use chrono::Local;
use clap::{CommandFactory, Parser};
use commands::{Cli, Commands, MergeSourcesArgs};
use dotenv::dotenv;
use fdmerge_core::config::{self, Settings};
use fdmerge_core::{MergeConfig, MergeEngine, ReportOptions, RunSummary};
use progress::CliReporter;
use tracing::{error, info};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %I:%M:%S%p";

fn main() -> ExitCode {
    dotenv().ok();

    let args = Cli::parse();
    let _guard = logging::init_logger(args.debug, args.human_readable);

    let settings = match config::load_settings() {
        Ok(settings) => settings,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            return ExitCode::from(summary::EXIT_CONFIG_FAILURE);
        }
    };

    let report = ReportOptions {
        display_collisions: args.display_collisions,
        display_renames: args.display_renames,
    };

    match args.command {
        Some(Commands::MergeSources(merge_args)) => {
            match run_merge(merge_args, &settings, report, args.dry_run) {
                Ok(result) => summary::exit_status(&result),
                Err(err) => {
                    error!("Error: {:#}", err);
                    ExitCode::from(summary::EXIT_CONFIG_FAILURE)
                }
            }
        }
        Some(Commands::PrintConfig) => {
            println!("Configuration: {:?}", settings);
            ExitCode::SUCCESS
        }
        None => {
            let _ = Cli::command().print_long_help();
            ExitCode::SUCCESS
        }
    }
}

fn build_config(
    args: MergeSourcesArgs,
    settings: &Settings,
    report: ReportOptions,
    dry_run: bool,
) -> MergeConfig {
    let mut config = MergeConfig::new(args.folders, args.target);
    config.compare_only = args.compare_only;
    config.exclude_extensions = args.exclude_extensions;
    config.ignore_patterns = args.ignore_patterns;
    config.algorithm = args.algorithm.unwrap_or(settings.algorithm);
    config.dry_run = dry_run;
    config.report = report;
    config.with_settings(settings)
}

fn run_merge(
    args: MergeSourcesArgs,
    settings: &Settings,
    report: ReportOptions,
    dry_run: bool,
) -> anyhow::Result<RunSummary> {
    info!(
        "Process beginning at {}",
        Local::now().format(TIMESTAMP_FORMAT)
    );

    let config = build_config(args, settings, report, dry_run);
    info!("Target: {}", config.target.display());
    if !config.exclude_extensions.is_empty() {
        info!("Excluding extensions: {:?}", config.exclude_extensions);
    }

    let engine = MergeEngine::new(config);
    let reporter = CliReporter::new();
    let result = engine
        .run(&reporter)
        .context("Merge aborted before processing")?;

    println!();
    info!(
        "Hash: {:.2}s, Copy: {:.2}s",
        result.hash_duration.as_secs_f64(),
        result.copy_duration.as_secs_f64(),
    );
    info!(
        "Completed file copy operations at {}",
        Local::now().format(TIMESTAMP_FORMAT)
    );
    summary::print_summary(&result.summary);

    Ok(result.summary)
}
