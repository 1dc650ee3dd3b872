use crate::hasher::{ContentDigest, DigestAlgorithm};
use crate::report::{CollisionEvent, FailureKind, FileFailure};
use crate::scanner::Candidate;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rayon::prelude::*;
use std::path::PathBuf;
use tracing::{debug, warn};

/// The run's record that a digest has been chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentRecord {
    pub digest: ContentDigest,
    pub chosen: Candidate,
    /// Set once the record has been placed. Compare-only records are never placed.
    pub destination: Option<PathBuf>,
    pub duplicate_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Accepted,
    Rejected(CollisionEvent),
}

/// digest → ContentRecord for a single run. Exactly one record per digest.
///
/// The check-then-insert in [`ContentIndex::resolve`] happens under the
/// shard lock, so concurrent callers can never both be first for a digest.
#[derive(Debug, Default)]
pub struct ContentIndex {
    records: DashMap<ContentDigest, ContentRecord>,
}

impl ContentIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve(&self, candidate: &Candidate, digest: ContentDigest) -> Resolution {
        match self.records.entry(digest) {
            Entry::Occupied(mut entry) => {
                let record = entry.get_mut();
                record.duplicate_count += 1;
                Resolution::Rejected(CollisionEvent {
                    digest,
                    chosen: record.chosen.clone(),
                    rejected: candidate.clone(),
                })
            }
            Entry::Vacant(entry) => {
                entry.insert(ContentRecord {
                    digest,
                    chosen: candidate.clone(),
                    destination: None,
                    duplicate_count: 0,
                });
                Resolution::Accepted
            }
        }
    }

    pub fn set_destination(&self, digest: &ContentDigest, destination: PathBuf) {
        if let Some(mut record) = self.records.get_mut(digest) {
            record.destination = Some(destination);
        }
    }

    pub fn get(&self, digest: &ContentDigest) -> Option<ContentRecord> {
        self.records.get(digest).map(|r| r.value().clone())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> Vec<ContentRecord> {
        self.records.iter().map(|r| r.value().clone()).collect()
    }
}

/// A candidate that won its digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedFile {
    pub candidate: Candidate,
    pub digest: ContentDigest,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Accepted(AcceptedFile),
    Duplicate(CollisionEvent),
    Unreadable(FileFailure),
}

/// Hashes candidates and decides first-seen-wins membership.
#[derive(Debug)]
pub struct ContentResolver {
    algorithm: DigestAlgorithm,
    index: ContentIndex,
}

impl ContentResolver {
    pub fn new(algorithm: DigestAlgorithm) -> Self {
        Self {
            algorithm,
            index: ContentIndex::new(),
        }
    }

    pub fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    pub fn index(&self) -> &ContentIndex {
        &self.index
    }

    /// Hash a batch in parallel, then admit the results strictly in batch
    /// order. Outcomes are returned in the same order as `candidates`.
    pub fn resolve_batch(&self, candidates: Vec<Candidate>) -> Vec<Outcome> {
        let hashed: Vec<_> = candidates
            .into_par_iter()
            .map(|candidate| {
                let digest = self.algorithm.digest_file(&candidate.absolute_path);
                (candidate, digest)
            })
            .collect();

        hashed
            .into_iter()
            .map(|(candidate, digest)| match digest {
                Ok(digest) => self.admit(candidate, digest),
                Err(e) => {
                    warn!(
                        "Error hashing '{}': {}",
                        candidate.absolute_path.display(),
                        e
                    );
                    Outcome::Unreadable(FileFailure::new(
                        candidate.absolute_path,
                        FailureKind::Read,
                        e,
                    ))
                }
            })
            .collect()
    }

    /// Admit one candidate whose digest is already known.
    pub fn admit(&self, candidate: Candidate, digest: ContentDigest) -> Outcome {
        debug!("{} {}", candidate.absolute_path.display(), digest);
        match self.index.resolve(&candidate, digest) {
            Resolution::Accepted => Outcome::Accepted(AcceptedFile { candidate, digest }),
            Resolution::Rejected(event) => Outcome::Duplicate(event),
        }
    }
}
