//! Server error type.

use hp_build::BuildError;

/// Development server error.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Listener could not be bound.
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    /// I/O error while serving.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// File watcher could not be set up.
    #[error("File watcher error: {0}")]
    Watch(#[from] notify::Error),
    /// Site build failed.
    #[error(transparent)]
    Build(#[from] BuildError),
    /// Build task panicked or was cancelled.
    #[error("Build task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
