use colored::*;
use fdmerge_core::report::{FailureKind, RunSummary};
use std::collections::BTreeMap;
use std::process::ExitCode;
use tracing::{error, info, warn};

pub const EXIT_CONFIG_FAILURE: u8 = 1;
pub const EXIT_FILE_FAILURE: u8 = 2;
pub const EXIT_VERIFY_FAILURE: u8 = 3;

/// Verification failures outrank read/write failures; skipped duplicates are
/// success.
pub fn exit_code(summary: &RunSummary) -> u8 {
    if summary.has_verification_failures() {
        EXIT_VERIFY_FAILURE
    } else if summary.has_io_failures() {
        EXIT_FILE_FAILURE
    } else {
        0
    }
}

pub fn exit_status(summary: &RunSummary) -> ExitCode {
    ExitCode::from(exit_code(summary))
}

pub fn print_summary(summary: &RunSummary) {
    let options = summary.options();

    if options.display_collisions {
        info!("The following files had content collisions and were treated as identical:");
        let mut grouped: BTreeMap<String, (String, Vec<String>)> = BTreeMap::new();
        for event in &summary.collisions {
            grouped
                .entry(event.digest.to_string())
                .or_insert_with(|| (event.chosen.absolute_path.display().to_string(), Vec::new()))
                .1
                .push(event.rejected.absolute_path.display().to_string());
        }
        for (digest, (kept, skipped)) in &grouped {
            info!("  {} kept {}", &digest[..12], kept.green());
            for path in skipped {
                info!("      skipped {}", path.yellow());
            }
        }
    }

    if options.display_renames {
        info!("The following files were saved with new names to avoid overwriting different content already in the target:");
        for rename in &summary.renames {
            info!(
                "  {} -> {}",
                rename.original_destination.display(),
                rename.final_destination.display().to_string().cyan()
            );
        }
    }

    for failure in &summary.failures {
        match failure.kind {
            FailureKind::Verify => error!("{}", failure.to_string().red().bold()),
            FailureKind::Read | FailureKind::Write => warn!("{}", failure),
        }
    }

    info!(
        "{} files seen, {} excluded by extension, {} ignored",
        summary.candidates_seen,
        summary.extensions_excluded,
        summary.ignored,
    );
    info!(
        "{} unique files were found across all source folders ({} only in compare-only folders)",
        format!("{}", summary.unique_digests).cyan(),
        summary.compare_only_files,
    );
    info!(
        "{} duplicate files were skipped based on their content",
        format!("{}", summary.duplicates_skipped).yellow(),
    );
    info!(
        "{} files were {} to the target folder",
        format!("{}", summary.files_copied).green(),
        if summary.dry_run { "planned for copying" } else { "successfully copied" },
    );
    info!(
        "{} filenames were changed because different content already used the name",
        format!("{}", summary.rename_count()).cyan(),
    );

    if !summary.is_clean() {
        warn!(
            "{} read errors, {} write failures, {} verification failures",
            format!("{}", summary.read_errors).red(),
            format!("{}", summary.write_failures).red(),
            format!("{}", summary.verification_failures).red().bold(),
        );
    }

    if summary.dry_run {
        warn!("{}", "--dry-run was selected. NO FILES ACTUALLY COPIED!".yellow());
    }
}
