use crate::hasher::DigestAlgorithm;
use crate::planner::Placement;
use crate::progress::ProgressReporter;
use crate::report::{FailureKind, FileFailure};
use rayon::prelude::*;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, error, warn};

/// Moves bytes from a source file to a destination file.
pub trait FileCopier: Sync {
    fn copy(&self, source: &Path, destination: &Path) -> io::Result<u64>;
}

/// Plain filesystem copy.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsCopier;

impl FileCopier for FsCopier {
    fn copy(&self, source: &Path, destination: &Path) -> io::Result<u64> {
        fs::copy(source, destination)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyStatus {
    /// Copied and the destination digest matched.
    Verified,
    /// Dry run: nothing touched.
    WouldCopy,
    Failed(FileFailure),
}

#[derive(Debug, Clone)]
pub struct CopyOutcome {
    pub placement: Placement,
    pub status: CopyStatus,
}

/// Copies each placement and re-hashes the destination.
///
/// The verification hash is a second full read of the written file and is
/// always performed on real runs. A mismatched destination is left on disk
/// and reported as a verification failure.
pub struct CopyVerifyExecutor<'a> {
    algorithm: DigestAlgorithm,
    dry_run: bool,
    copier: &'a dyn FileCopier,
}

impl<'a> CopyVerifyExecutor<'a> {
    pub fn new(algorithm: DigestAlgorithm, dry_run: bool, copier: &'a dyn FileCopier) -> Self {
        Self {
            algorithm,
            dry_run,
            copier,
        }
    }

    pub fn execute(&self, placement: &Placement) -> CopyStatus {
        let source = &placement.file.candidate.absolute_path;
        let destination = &placement.destination;

        if self.dry_run {
            debug!("{} --> {} (dry run)", source.display(), destination.display());
            return CopyStatus::WouldCopy;
        }

        if let Some(parent) = destination.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                warn!("Error creating directory {}: {}", parent.display(), e);
                return CopyStatus::Failed(FileFailure::new(destination, FailureKind::Write, e));
            }
        }

        if let Err(e) = self.copier.copy(source, destination) {
            warn!(
                "Error copying {} to {}: {}",
                source.display(),
                destination.display(),
                e
            );
            return CopyStatus::Failed(FileFailure::new(destination, FailureKind::Write, e));
        }

        let expected = placement.file.digest;
        match self.algorithm.digest_file(destination) {
            Ok(actual) if actual == expected => {
                debug!("{} --> {}", source.display(), destination.display());
                CopyStatus::Verified
            }
            Ok(actual) => {
                error!(
                    "File copy error! {} does not match its source {} ({} != {})",
                    destination.display(),
                    source.display(),
                    actual,
                    expected
                );
                CopyStatus::Failed(FileFailure::new(
                    destination,
                    FailureKind::Verify,
                    format!("expected {}, found {}", expected, actual),
                ))
            }
            Err(e) => {
                error!("Error re-reading copy {}: {}", destination.display(), e);
                CopyStatus::Failed(FileFailure::new(
                    destination,
                    FailureKind::Verify,
                    format!("could not re-read copy: {}", e),
                ))
            }
        }
    }

    /// Run every placement; destinations are disjoint so copies proceed in
    /// parallel. Outcomes keep the order of `placements`.
    pub fn execute_all(
        &self,
        placements: Vec<Placement>,
        reporter: &dyn ProgressReporter,
    ) -> Vec<CopyOutcome> {
        let total = placements.len();
        let done = AtomicUsize::new(0);

        placements
            .into_par_iter()
            .map(|placement| {
                let status = self.execute(&placement);
                let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
                reporter.on_copy_progress(finished, total);
                CopyOutcome { placement, status }
            })
            .collect()
    }
}
