//! Error types for fatal CLI failures.
//!
//! Per-source problems during an audit are never raised through this type;
//! they are captured as strings on the source so reporting can continue.

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON - {0}")]
    Json(#[from] serde_json::Error),

    #[error("File not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Script file not found: {}", path.display())]
    ScriptNotFound { path: PathBuf },

    #[error("Not a directory: {}", path.display())]
    NotADirectory { path: PathBuf },

    #[error("Invalid glob pattern '{pattern}': {message}")]
    Pattern { pattern: String, message: String },

    #[error("Invalid schema {}: {message}", path.display())]
    Schema { path: PathBuf, message: String },

    #[error("{0}")]
    Usage(String),
}

impl Error {
    /// Process exit code: 2 for usage errors, 1 for everything else.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Usage(_) => 2,
            _ => 1,
        }
    }
}
