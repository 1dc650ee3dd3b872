use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid root '{path}': {reason}")]
    InvalidRoot { path: String, reason: String },

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub fn invalid_root(path: impl AsRef<std::path::Path>, reason: impl Into<String>) -> Self {
        Error::InvalidRoot {
            path: path.as_ref().display().to_string(),
            reason: reason.into(),
        }
    }
}
