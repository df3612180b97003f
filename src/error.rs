use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PersephoneError {
    #[error("Failed to write configuration to {}: {source}", path.display())]
    ConfigWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration missing: {key}")]
    ConfigMissing { key: String },

    #[error("Borg command failed: {stderr}")]
    BorgFailed { stderr: String },

    #[error("Failed to read input for {key}: {source}")]
    Prompt {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cancelled by user")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, PersephoneError>;
