use crate::config::{self, MergeConfig};
use crate::error::Error;
use crate::executor::{CopyStatus, CopyVerifyExecutor, FileCopier, FsCopier};
use crate::planner::{Placement, PlacementPlanner};
use crate::progress::ProgressReporter;
use crate::report::RunSummary;
use crate::resolver::{ContentRecord, ContentResolver, Outcome};
use crate::scanner::{
    Candidate, CandidateSource, ExtensionFilter, IgnoreFilter, RootRole, ScanItem, SourceRoot,
    WalkSource,
};
use std::fs;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Candidates hashed in parallel per batch. Admission within a batch is
/// still strictly in delivery order.
const HASH_BATCH_SIZE: usize = 500;

pub struct MergeEngine {
    config: MergeConfig,
    source: Box<dyn CandidateSource>,
    copier: Box<dyn FileCopier>,
}

#[derive(Debug)]
pub struct MergeResult {
    pub summary: RunSummary,
    /// One record per distinct digest, in no particular order.
    pub records: Vec<ContentRecord>,
    pub hash_duration: Duration,
    pub copy_duration: Duration,
}

impl MergeEngine {
    pub fn new(config: MergeConfig) -> Self {
        let source = WalkSource::new(IgnoreFilter::new(&config.ignore_patterns));
        Self {
            config,
            source: Box::new(source),
            copier: Box::new(FsCopier),
        }
    }

    /// Replace the filesystem walk, e.g. to pin the within-root order.
    pub fn with_source(mut self, source: impl CandidateSource + 'static) -> Self {
        self.source = Box::new(source);
        self
    }

    pub fn with_copier(mut self, copier: impl FileCopier + 'static) -> Self {
        self.copier = Box::new(copier);
        self
    }

    /// Run the merge pipeline:
    /// 1. For each root in order, enumerate, filter, hash, and admit
    ///    first-seen content; plan a destination for each admitted merge file
    /// 2. Copy and verify every planned file (or only record it on dry runs)
    ///
    /// Only configuration problems return `Err`; per-file failures end up in
    /// the summary.
    pub fn run(&self, reporter: &dyn ProgressReporter) -> Result<MergeResult, Error> {
        self.config.validate()?;

        if self.config.dry_run {
            info!("Dry run: no files will be written");
        } else {
            fs::create_dir_all(&self.config.target)?;
        }

        let roots = self.config.roots();
        for (outer, inner) in config::overlapping_roots(&roots) {
            warn!(
                "{} is inside {}; its files will be seen twice",
                inner.display(),
                outer.display()
            );
        }

        let mut summary = RunSummary::new(self.config.dry_run, self.config.report);
        let resolver = ContentResolver::new(self.config.algorithm);
        let planner = PlacementPlanner::new(&self.config.target);
        let filter = ExtensionFilter::new(&self.config.exclude_extensions);

        // Phase 1: Resolve and plan
        let hash_start = Instant::now();
        let mut placements: Vec<Placement> = Vec::new();
        for root in &roots {
            self.process_root(
                root,
                roots.len(),
                &filter,
                &resolver,
                &planner,
                &mut summary,
                &mut placements,
                reporter,
            )?;
        }
        let hash_duration = hash_start.elapsed();
        summary.unique_digests = resolver.index().len();
        info!(
            "{} unique files found across all source folders, {} duplicates skipped",
            summary.unique_digests,
            summary.collision_count()
        );

        // Phase 2: Copy and verify
        info!("File copy operations beginning ({} files)", placements.len());
        let copy_start = Instant::now();
        reporter.on_copy_start(placements.len(), self.config.dry_run);
        let executor =
            CopyVerifyExecutor::new(self.config.algorithm, self.config.dry_run, self.copier.as_ref());
        for outcome in executor.execute_all(placements, reporter) {
            match outcome.status {
                CopyStatus::Verified | CopyStatus::WouldCopy => summary.files_copied += 1,
                CopyStatus::Failed(failure) => summary.record_failure(failure),
            }
        }
        let copy_duration = copy_start.elapsed();
        reporter.on_copy_complete(summary.files_copied, copy_duration.as_secs_f64());
        debug!(
            "Copy phase completed in {:.2}s",
            copy_duration.as_secs_f64()
        );

        Ok(MergeResult {
            summary,
            records: resolver.index().records(),
            hash_duration,
            copy_duration,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn process_root(
        &self,
        root: &SourceRoot,
        total_roots: usize,
        filter: &ExtensionFilter,
        resolver: &ContentResolver,
        planner: &PlacementPlanner,
        summary: &mut RunSummary,
        placements: &mut Vec<Placement>,
        reporter: &dyn ProgressReporter,
    ) -> Result<(), Error> {
        let root_label = root.path.display().to_string();
        let compare_only = root.role == RootRole::CompareOnly;
        info!(
            "Processing {}folder {}/{} ({}) with {}",
            if compare_only { "COMPARE-ONLY " } else { "" },
            root.index + 1,
            total_roots,
            root_label,
            resolver.algorithm()
        );
        debug!("{} roots already processed", root.index);
        reporter.on_root_start(root.index, total_roots, &root_label, compare_only);

        let root_start = Instant::now();
        let mut hashed = 0usize;
        let mut batch: Vec<Candidate> = Vec::with_capacity(HASH_BATCH_SIZE);

        for item in self.source.scan(root) {
            match item {
                ScanItem::Candidate(candidate) => {
                    summary.candidates_seen += 1;
                    if filter.excludes(candidate.extension.as_deref()) {
                        summary.extensions_excluded += 1;
                        continue;
                    }
                    batch.push(candidate);
                    if batch.len() >= HASH_BATCH_SIZE {
                        hashed += batch.len();
                        let full = std::mem::take(&mut batch);
                        admit_batch(full, resolver, planner, summary, placements)?;
                        reporter.on_hash_progress(hashed);
                        info!("Completed hashing of {} files", hashed);
                    }
                }
                ScanItem::Ignored(path) => {
                    debug!("Ignoring {}", path.display());
                    summary.ignored += 1;
                }
                ScanItem::Failed(failure) => summary.record_failure(failure),
            }
        }

        if !batch.is_empty() {
            hashed += batch.len();
            admit_batch(batch, resolver, planner, summary, placements)?;
            reporter.on_hash_progress(hashed);
        }

        let elapsed = root_start.elapsed().as_secs_f64();
        reporter.on_root_complete(&root_label, hashed, elapsed);
        info!(
            "Hash calculations took {:.2}s (avg {:.3} sec/file) for folder {}",
            elapsed,
            elapsed / hashed.max(1) as f64,
            root_label
        );

        Ok(())
    }
}

fn admit_batch(
    batch: Vec<Candidate>,
    resolver: &ContentResolver,
    planner: &PlacementPlanner,
    summary: &mut RunSummary,
    placements: &mut Vec<Placement>,
) -> Result<(), Error> {
    for outcome in resolver.resolve_batch(batch) {
        match outcome {
            Outcome::Accepted(file) if file.candidate.is_copyable() => {
                let placement = planner.plan(file)?;
                resolver
                    .index()
                    .set_destination(&placement.file.digest, placement.destination.clone());
                if let Some(rename) = &placement.rename {
                    summary.record_rename(rename.clone());
                }
                placements.push(placement);
            }
            Outcome::Accepted(_) => summary.compare_only_files += 1,
            Outcome::Duplicate(event) => {
                debug!(
                    "{} duplicates {} ({})",
                    event.rejected.absolute_path.display(),
                    event.chosen.absolute_path.display(),
                    event.digest.short()
                );
                summary.record_collision(event);
            }
            Outcome::Unreadable(failure) => summary.record_failure(failure),
        }
    }
    Ok(())
}
