use super::candidate::{Candidate, SourceRoot};
use super::filter::IgnoreFilter;
use crate::report::{FailureKind, FileFailure};
use std::path::PathBuf;
use tracing::{debug, error};
use walkdir::WalkDir;

/// One item produced while enumerating a root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanItem {
    Candidate(Candidate),
    /// A regular file skipped by an ignore pattern.
    Ignored(PathBuf),
    /// A path that could not be enumerated.
    Failed(FileFailure),
}

/// Produces the files under a root as a lazy, single-pass sequence.
///
/// Order within a root is whatever the implementation yields and carries no
/// meaning. The engine treats the first-yielded file of a given content as the
/// representative, so a fixed order gives a fixed outcome.
pub trait CandidateSource: Sync {
    fn scan<'a>(&'a self, root: &'a SourceRoot) -> Box<dyn Iterator<Item = ScanItem> + 'a>;
}

/// Recursive filesystem walk. Symlinks are not followed and, together with
/// other non-regular files, never yielded.
#[derive(Debug, Clone, Default)]
pub struct WalkSource {
    ignore: IgnoreFilter,
}

impl WalkSource {
    pub fn new(ignore: IgnoreFilter) -> Self {
        Self { ignore }
    }
}

impl CandidateSource for WalkSource {
    fn scan<'a>(&'a self, root: &'a SourceRoot) -> Box<dyn Iterator<Item = ScanItem> + 'a> {
        let walker = WalkDir::new(&root.path)
            .follow_links(false)
            .into_iter()
            .filter_entry(move |entry| {
                let pruned = entry.depth() > 0
                    && entry.file_type().is_dir()
                    && self.ignore.matches(entry.path());
                if pruned {
                    debug!("Skipping ignored directory {}", entry.path().display());
                }
                !pruned
            });

        Box::new(walker.filter_map(move |entry_result| {
            let entry = match entry_result {
                Ok(entry) => entry,
                Err(err) => {
                    let path = err
                        .path()
                        .map(|p| p.to_path_buf())
                        .unwrap_or_else(|| root.path.clone());
                    error!("Error walking {}: {}", path.display(), err);
                    return Some(ScanItem::Failed(FileFailure::new(
                        path,
                        FailureKind::Read,
                        err,
                    )));
                }
            };

            if !entry.file_type().is_file() {
                return None;
            }

            let path = entry.into_path();
            if self.ignore.matches(&path) {
                return Some(ScanItem::Ignored(path));
            }

            let relative = match path.strip_prefix(&root.path) {
                Ok(relative) => relative.to_path_buf(),
                Err(e) => {
                    return Some(ScanItem::Failed(FileFailure::new(
                        path.clone(),
                        FailureKind::Read,
                        e,
                    )))
                }
            };
            Some(ScanItem::Candidate(Candidate::new(root, path, relative)))
        }))
    }
}

/// Yields pre-built candidates in exactly the given order. Used to pin the
/// within-root order when the outcome must be reproducible.
#[derive(Debug, Clone, Default)]
pub struct FixedOrderSource {
    roots: Vec<Vec<PathBuf>>,
}

impl FixedOrderSource {
    /// `relative_paths[i]` lists the files of root `i`, in delivery order.
    pub fn new(relative_paths: Vec<Vec<PathBuf>>) -> Self {
        Self {
            roots: relative_paths,
        }
    }
}

impl CandidateSource for FixedOrderSource {
    fn scan<'a>(&'a self, root: &'a SourceRoot) -> Box<dyn Iterator<Item = ScanItem> + 'a> {
        let files = self.roots.get(root.index).map(Vec::as_slice).unwrap_or(&[]);
        Box::new(files.iter().map(move |relative| {
            let absolute = root.path.join(relative);
            ScanItem::Candidate(Candidate::new(root, absolute, relative.clone()))
        }))
    }
}
