use std::path::{Path, PathBuf};

/// What the engine does with files found under a root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootRole {
    /// Files are hashed and, when first seen, copied into the target.
    Merge,
    /// Files are hashed so their contents count as already present, but are
    /// never copied.
    CompareOnly,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRoot {
    pub index: usize,
    pub path: PathBuf,
    pub role: RootRole,
}

impl SourceRoot {
    pub fn new(index: usize, path: impl Into<PathBuf>, role: RootRole) -> Self {
        Self {
            index,
            path: path.into(),
            role,
        }
    }
}

/// A regular file discovered under a source root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub root_index: usize,
    pub role: RootRole,
    pub absolute_path: PathBuf,
    pub relative_path: PathBuf,
    pub extension: Option<String>,
}

impl Candidate {
    pub fn new(root: &SourceRoot, absolute_path: PathBuf, relative_path: PathBuf) -> Self {
        let extension = extension_of(&relative_path);
        Self {
            root_index: root.index,
            role: root.role,
            absolute_path,
            relative_path,
            extension,
        }
    }

    pub fn is_copyable(&self) -> bool {
        self.role == RootRole::Merge
    }
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| ext.to_string_lossy().into_owned())
}
