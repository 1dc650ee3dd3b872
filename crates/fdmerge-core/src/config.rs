use crate::error::Error;
use crate::hasher::DigestAlgorithm;
use crate::report::ReportOptions;
use crate::scanner::{RootRole, SourceRoot};
use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_NAME: &str = "Config";

/// Defaults read from `Config.toml` (or `$FDMERGE_CONFIG`) and `FDMERGE_*`
/// environment variables. Command-line values are layered on top.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub exclude_extensions: Vec<String>,
    pub ignore_patterns: Vec<String>,
    pub algorithm: DigestAlgorithm,
}

pub fn load_settings() -> Result<Settings, ConfigError> {
    let config_name =
        env::var("FDMERGE_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_NAME.to_string());

    let builder = Config::builder()
        .add_source(ConfigFile::with_name(&config_name).required(false))
        .add_source(
            Environment::with_prefix("FDMERGE")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("exclude_extensions")
                .with_list_parse_key("ignore_patterns"),
        )
        .build()?;
    builder.try_deserialize::<Settings>()
}

/// A fully specified merge run.
#[derive(Debug, Clone)]
pub struct MergeConfig {
    /// Merge roots, highest priority first.
    pub sources: Vec<PathBuf>,
    /// Roots whose contents count as already present but are never copied.
    pub compare_only: Vec<PathBuf>,
    pub target: PathBuf,
    pub exclude_extensions: Vec<String>,
    pub ignore_patterns: Vec<String>,
    pub algorithm: DigestAlgorithm,
    pub dry_run: bool,
    pub report: ReportOptions,
}

impl MergeConfig {
    pub fn new(sources: Vec<PathBuf>, target: impl Into<PathBuf>) -> Self {
        Self {
            sources,
            compare_only: Vec::new(),
            target: target.into(),
            exclude_extensions: Vec::new(),
            ignore_patterns: Vec::new(),
            algorithm: DigestAlgorithm::default(),
            dry_run: false,
            report: ReportOptions::default(),
        }
    }

    /// Fold file/environment defaults in. List settings are appended to
    /// whatever was given on the command line.
    pub fn with_settings(mut self, settings: &Settings) -> Self {
        self.exclude_extensions
            .extend(settings.exclude_extensions.iter().cloned());
        self.ignore_patterns
            .extend(settings.ignore_patterns.iter().cloned());
        self
    }

    /// All roots in processing order: compare-only roots first, then merge
    /// roots in the order given.
    pub fn roots(&self) -> Vec<SourceRoot> {
        self.compare_only
            .iter()
            .map(|p| (p, RootRole::CompareOnly))
            .chain(self.sources.iter().map(|p| (p, RootRole::Merge)))
            .enumerate()
            .map(|(index, (path, role))| SourceRoot::new(index, path.clone(), role))
            .collect()
    }

    /// Startup checks. Any failure here aborts before a single file is read.
    pub fn validate(&self) -> Result<(), Error> {
        if self.sources.is_empty() {
            return Err(Error::Other("at least one source folder is required".to_string()));
        }

        for root in self.sources.iter().chain(&self.compare_only) {
            match fs::metadata(root) {
                Ok(meta) if meta.is_dir() => {}
                Ok(_) => return Err(Error::invalid_root(root, "not a directory")),
                Err(e) => return Err(Error::invalid_root(root, e.to_string())),
            }
        }

        if let Ok(meta) = fs::metadata(&self.target) {
            if !meta.is_dir() {
                return Err(Error::invalid_root(&self.target, "target exists and is not a directory"));
            }
        }

        let target = normalize(&self.target);
        for root in &self.sources {
            if target.starts_with(normalize(root)) {
                return Err(Error::invalid_root(
                    &self.target,
                    format!("target lies inside source folder {}", root.display()),
                ));
            }
        }

        Ok(())
    }
}

/// Pairs of roots where one contains the other. Files under the inner root
/// will be seen twice; the second sighting is a duplicate of the first.
pub fn overlapping_roots(roots: &[SourceRoot]) -> Vec<(PathBuf, PathBuf)> {
    let normalized: Vec<PathBuf> = roots.iter().map(|r| normalize(&r.path)).collect();
    let mut overlaps = Vec::new();

    for (i, outer) in normalized.iter().enumerate() {
        for (j, inner) in normalized.iter().enumerate() {
            if i != j && inner.starts_with(outer) && (inner != outer || i < j) {
                overlaps.push((roots[i].path.clone(), roots[j].path.clone()));
            }
        }
    }

    overlaps
}

/// Canonical form of `path`, resolving through the nearest existing ancestor
/// when the path itself does not exist yet.
fn normalize(path: &Path) -> PathBuf {
    if let Ok(canonical) = fs::canonicalize(path) {
        return canonical;
    }
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) if !parent.as_os_str().is_empty() => {
            normalize(parent).join(name)
        }
        _ => path.to_path_buf(),
    }
}
