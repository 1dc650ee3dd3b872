use crate::error::Error;
use crate::hasher::ContentDigest;
use crate::report::RenameEvent;
use crate::resolver::AcceptedFile;
use std::collections::{HashMap, HashSet};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

const COPY_MARKER: &str = "__COPY";

/// Where an accepted file will be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub file: AcceptedFile,
    pub destination: PathBuf,
    pub rename: Option<RenameEvent>,
}

/// Destinations handed out so far, plus every directory they imply.
#[derive(Debug, Default)]
struct Claims {
    files: HashMap<PathBuf, ContentDigest>,
    dirs: HashSet<PathBuf>,
}

impl Claims {
    /// A file may not land on another file's path, on a claimed directory,
    /// or on anything already present on disk.
    fn file_taken(&self, path: &Path, digest: &ContentDigest) -> bool {
        if self.dirs.contains(path) {
            return true;
        }
        match self.files.get(path) {
            Some(owner) => owner != digest,
            // symlink_metadata so that a dangling link also counts as taken
            None => path.symlink_metadata().is_ok(),
        }
    }

    /// A directory may be shared, but not with a claimed file or an existing
    /// non-directory.
    fn dir_taken(&self, path: &Path) -> bool {
        if self.files.contains_key(path) {
            return true;
        }
        if self.dirs.contains(path) {
            return false;
        }
        match path.symlink_metadata() {
            Ok(meta) => !meta.is_dir(),
            Err(_) => false,
        }
    }

    fn claim(&mut self, target_root: &Path, destination: &Path, digest: ContentDigest) {
        self.files.insert(destination.to_path_buf(), digest);
        for ancestor in destination.ancestors().skip(1) {
            if ancestor == target_root || !ancestor.starts_with(target_root) {
                break;
            }
            if !self.dirs.insert(ancestor.to_path_buf()) {
                break;
            }
        }
    }
}

/// Maps accepted files to unique destinations under the target root.
///
/// The default destination keeps the file's path relative to its own source
/// root. Each path component is checked in turn: a directory component that
/// collides with a claimed or existing file, or a file name that collides with
/// anything claimed or present, is replaced by `<stem>__COPY<n>[.<ext>]` for
/// n = 1, 2, ... until free.
#[derive(Debug)]
pub struct PlacementPlanner {
    target_root: PathBuf,
    claims: Mutex<Claims>,
}

impl PlacementPlanner {
    pub fn new(target_root: impl Into<PathBuf>) -> Self {
        Self {
            target_root: target_root.into(),
            claims: Mutex::new(Claims::default()),
        }
    }

    /// Claim a destination for `file`. Claims are serialized; the path is
    /// recorded before this returns, ahead of any copy.
    pub fn plan(&self, file: AcceptedFile) -> Result<Placement, Error> {
        let mut claims = self
            .claims
            .lock()
            .map_err(|e| Error::Other(format!("Failed to lock claimed paths: {}", e)))?;

        let relative = &file.candidate.relative_path;
        let components: Vec<_> = relative.iter().collect();
        let (file_name, parents) = components.split_last().ok_or_else(|| {
            Error::Other(format!(
                "No file name in relative path for {}",
                file.candidate.absolute_path.display()
            ))
        })?;

        let mut destination = self.target_root.clone();
        for component in parents {
            destination = free_path(&destination.join(component), |p| claims.dir_taken(p));
        }
        destination = free_path(&destination.join(file_name), |p| {
            claims.file_taken(p, &file.digest)
        });

        claims.claim(&self.target_root, &destination, file.digest);

        let original = self.target_root.join(relative);
        let rename = if destination != original {
            debug!(
                "Renamed {} -> {} to avoid overwriting different content",
                original.display(),
                destination.display()
            );
            Some(RenameEvent {
                original_destination: original,
                final_destination: destination.clone(),
                candidate: file.candidate.clone(),
            })
        } else {
            None
        };

        Ok(Placement {
            file,
            destination,
            rename,
        })
    }

    #[cfg(test)]
    fn claimed_count(&self) -> usize {
        self.claims.lock().unwrap().files.len()
    }
}

fn free_path(natural: &Path, taken: impl Fn(&Path) -> bool) -> PathBuf {
    let mut candidate = natural.to_path_buf();
    let mut attempt = 0u32;
    while taken(&candidate) {
        attempt += 1;
        candidate = disambiguate(natural, attempt);
    }
    candidate
}

fn disambiguate(original: &Path, attempt: u32) -> PathBuf {
    let mut name: OsString = original
        .file_stem()
        .map(|s| s.to_os_string())
        .unwrap_or_default();
    name.push(format!("{}{}", COPY_MARKER, attempt));
    if let Some(ext) = original.extension() {
        name.push(".");
        name.push(ext);
    }

    original.with_file_name(name)
}
