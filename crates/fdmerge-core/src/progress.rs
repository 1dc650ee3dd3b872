/// Trait for reporting merge progress.
///
/// The CLI implements it with indicatif; tests use [`SilentReporter`].
/// All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    fn on_root_start(&self, _index: usize, _total_roots: usize, _root: &str, _compare_only: bool) {}
    fn on_hash_progress(&self, _files_hashed: usize) {}
    fn on_root_complete(&self, _root: &str, _files_hashed: usize, _duration_secs: f64) {}
    fn on_copy_start(&self, _total_files: usize, _dry_run: bool) {}
    fn on_copy_progress(&self, _files_done: usize, _total_files: usize) {}
    fn on_copy_complete(&self, _files_copied: usize, _duration_secs: f64) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
