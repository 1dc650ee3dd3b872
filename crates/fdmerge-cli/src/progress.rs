use fdmerge_core::ProgressReporter;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;
use std::time::Duration;

const TICK_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// CLI progress reporter using indicatif progress bars.
///
/// - Hash phase: one spinner per root (file count unknown upfront)
/// - Copy phase: progress bar (total known from planning)
pub struct CliReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn set_bar(&self, pb: ProgressBar) {
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(old) = guard.take() {
                old.finish_and_clear();
            }
            *guard = Some(pb);
        }
    }

    fn finish_bar(&self) {
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(pb) = guard.take() {
                pb.finish_and_clear();
            }
        }
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        if let Ok(guard) = self.bar.lock() {
            if let Some(pb) = guard.as_ref() {
                f(pb);
            }
        }
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars(TICK_CHARS)
}

fn bar_style(verb: &str) -> ProgressStyle {
    let template = format!(
        "  {{spinner:.cyan}} {} [{{bar:30.cyan/dim}}] {{pos}}/{{len}} files ({{eta}} remaining)",
        verb
    );
    ProgressStyle::with_template(&template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("━╸─")
        .tick_chars(TICK_CHARS)
}

impl ProgressReporter for CliReporter {
    fn on_root_start(&self, index: usize, total_roots: usize, root: &str, compare_only: bool) {
        let pb = ProgressBar::new_spinner();
        pb.set_style(spinner_style());
        pb.set_message(format!(
            "Hashing {}folder {}/{} ({})...",
            if compare_only { "compare-only " } else { "" },
            index + 1,
            total_roots,
            root
        ));
        pb.enable_steady_tick(Duration::from_millis(80));
        self.set_bar(pb);
    }

    fn on_hash_progress(&self, files_hashed: usize) {
        self.with_bar(|pb| pb.set_message(format!("Hashing... {} files hashed", files_hashed)));
    }

    fn on_root_complete(&self, root: &str, files_hashed: usize, duration_secs: f64) {
        self.finish_bar();
        eprintln!(
            "  \x1b[32m✓\x1b[0m Hashed {} files in {:.2}s ({})",
            files_hashed, duration_secs, root
        );
    }

    fn on_copy_start(&self, total_files: usize, dry_run: bool) {
        let pb = ProgressBar::new(total_files as u64);
        pb.set_style(bar_style(if dry_run { "Planning" } else { "Copying" }));
        pb.enable_steady_tick(Duration::from_millis(80));
        self.set_bar(pb);
    }

    fn on_copy_progress(&self, files_done: usize, _total_files: usize) {
        self.with_bar(|pb| pb.set_position(files_done as u64));
    }

    fn on_copy_complete(&self, files_copied: usize, duration_secs: f64) {
        self.finish_bar();
        eprintln!(
            "  \x1b[32m✓\x1b[0m Copy complete: {} files in {:.2}s",
            files_copied, duration_secs
        );
    }
}
