pub mod config;
pub mod engine;
pub mod error;
pub mod executor;
pub mod hasher;
pub mod planner;
pub mod progress;
pub mod report;
pub mod resolver;
pub mod scanner;

pub use config::{MergeConfig, Settings};
pub use engine::{MergeEngine, MergeResult};
pub use error::Error;
pub use hasher::{ContentDigest, DigestAlgorithm};
pub use progress::{ProgressReporter, SilentReporter};
pub use report::{ReportOptions, RunSummary};
