use clap::{Args, Parser, Subcommand};
use fdmerge_core::DigestAlgorithm;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "fdmerge", version)]
#[command(
    about = "Merge all specified directories into a single target folder and dedup based on file contents",
    long_about = None
)]
pub struct Cli {
    /// Produce debug output (one line per hashed and copied file)
    #[arg(long, global = true)]
    pub debug: bool,

    /// Indent log output to make it easier to read interactively
    #[arg(long, global = true)]
    pub human_readable: bool,

    /// Show content collisions at the end of the run
    #[arg(long, global = true)]
    pub display_collisions: bool,

    /// Show renamed files at the end of the run
    #[arg(long, global = true)]
    pub display_renames: bool,

    /// Do all processing but skip actually copying files
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Merge source folders into the target, keeping one copy of each content
    MergeSources(MergeSourcesArgs),
    /// Print configuration values loaded from Config.toml and the environment
    PrintConfig,
}

#[derive(Debug, Args)]
pub struct MergeSourcesArgs {
    /// Source folders to merge, highest priority first
    #[arg(long, num_args = 1.., required = true)]
    pub folders: Vec<PathBuf>,

    /// Target folder (created if missing)
    #[arg(long)]
    pub target: PathBuf,

    /// File extensions to exclude, case-insensitive, with or without the leading dot
    #[arg(long, num_args = 1..)]
    pub exclude_extensions: Vec<String>,

    /// Folders to hash for comparison but never copy from
    #[arg(long, num_args = 1..)]
    pub compare_only: Vec<PathBuf>,

    /// Glob patterns for paths to skip entirely
    #[arg(long = "ignore", num_args = 1..)]
    pub ignore_patterns: Vec<String>,

    /// Content digest: sha256 (default) or blake3
    #[arg(long)]
    pub algorithm: Option<DigestAlgorithm>,
}
