use crate::hasher::ContentDigest;
use crate::scanner::Candidate;
use std::fmt;
use std::path::PathBuf;

/// A later candidate whose content was already chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollisionEvent {
    pub digest: ContentDigest,
    pub chosen: Candidate,
    pub rejected: Candidate,
}

/// A destination that had to be altered to avoid overwriting different content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameEvent {
    pub original_destination: PathBuf,
    pub final_destination: PathBuf,
    pub candidate: Candidate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Read,
    Write,
    Verify,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FailureKind::Read => "read",
            FailureKind::Write => "write",
            FailureKind::Verify => "verification",
        };
        f.write_str(label)
    }
}

/// A per-file failure. Never fatal to the run; folded into the summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailure {
    pub path: PathBuf,
    pub kind: FailureKind,
    pub message: String,
}

impl FileFailure {
    pub fn new(path: impl Into<PathBuf>, kind: FailureKind, message: impl fmt::Display) -> Self {
        Self {
            path: path.into(),
            kind,
            message: message.to_string(),
        }
    }
}

impl fmt::Display for FileFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failure on {}: {}", self.kind, self.path.display(), self.message)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ReportOptions {
    pub display_collisions: bool,
    pub display_renames: bool,
}

/// Everything a run decided and did, in a shape that is identical for dry
/// and real runs.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub dry_run: bool,
    pub candidates_seen: usize,
    pub extensions_excluded: usize,
    pub ignored: usize,
    pub unique_digests: usize,
    pub compare_only_files: usize,
    pub duplicates_skipped: usize,
    pub files_copied: usize,
    pub read_errors: usize,
    pub write_failures: usize,
    pub verification_failures: usize,
    pub failures: Vec<FileFailure>,
    pub collisions: Vec<CollisionEvent>,
    pub renames: Vec<RenameEvent>,
    rename_count: usize,
    collision_count: usize,
    options: ReportOptions,
}

impl RunSummary {
    pub fn new(dry_run: bool, options: ReportOptions) -> Self {
        Self {
            dry_run,
            options,
            ..Default::default()
        }
    }

    pub fn record_failure(&mut self, failure: FileFailure) {
        match failure.kind {
            FailureKind::Read => self.read_errors += 1,
            FailureKind::Write => self.write_failures += 1,
            FailureKind::Verify => self.verification_failures += 1,
        }
        self.failures.push(failure);
    }

    pub fn record_collision(&mut self, event: CollisionEvent) {
        self.duplicates_skipped += 1;
        self.collision_count += 1;
        if self.options.display_collisions {
            self.collisions.push(event);
        }
    }

    pub fn record_rename(&mut self, event: RenameEvent) {
        self.rename_count += 1;
        if self.options.display_renames {
            self.renames.push(event);
        }
    }

    /// Number of collisions observed, whether or not the events were retained.
    pub fn collision_count(&self) -> usize {
        self.collision_count
    }

    pub fn rename_count(&self) -> usize {
        self.rename_count
    }

    pub fn options(&self) -> ReportOptions {
        self.options
    }

    pub fn has_verification_failures(&self) -> bool {
        self.verification_failures > 0
    }

    pub fn has_io_failures(&self) -> bool {
        self.read_errors > 0 || self.write_failures > 0
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}
