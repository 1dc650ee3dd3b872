use glob::Pattern;
use std::collections::HashSet;
use std::path::Path;
use tracing::error;

/// Case-insensitive extension exclusion. Configured values may carry a
/// leading `.`; it is ignored.
#[derive(Debug, Clone, Default)]
pub struct ExtensionFilter {
    excluded: HashSet<String>,
}

impl ExtensionFilter {
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let excluded = extensions
            .into_iter()
            .map(|ext| normalize(ext.as_ref()))
            .filter(|ext| !ext.is_empty())
            .collect();
        Self { excluded }
    }

    /// Files without an extension are never excluded.
    pub fn excludes(&self, extension: Option<&str>) -> bool {
        match extension {
            Some(ext) => self.excluded.contains(&normalize(ext)),
            None => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.excluded.is_empty()
    }
}

fn normalize(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_lowercase()
}

/// Glob patterns matched against full paths; matching files and directories
/// never become candidates.
#[derive(Debug, Clone, Default)]
pub struct IgnoreFilter {
    patterns: Vec<Pattern>,
}

impl IgnoreFilter {
    pub fn new(globs: &[String]) -> Self {
        let patterns = globs
            .iter()
            .filter_map(|glob| match Pattern::new(glob) {
                Ok(p) => Some(p),
                Err(e) => {
                    error!("Invalid glob pattern '{}': {}", glob, e);
                    None
                }
            })
            .collect();
        Self { patterns }
    }

    pub fn matches(&self, path: &Path) -> bool {
        self.patterns.iter().any(|pattern| pattern.matches_path(path))
    }
}
