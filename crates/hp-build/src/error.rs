//! Build error types.

use std::path::{Path, PathBuf};

/// Error raised while building the site.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// The configured layout does not look like a site source tree.
    #[error("Not a site root: {} (expected pages/ and templates/base.html)", .0.display())]
    NotProjectRoot(PathBuf),

    /// A path that must be a directory is something else.
    #[error("Expected {} to be a directory", .0.display())]
    NotADirectory(PathBuf),

    /// Filesystem operation failed.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        /// Path being read or written.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// Malformed front matter block.
    #[error("Invalid front matter in {}: {message}", path.display())]
    FrontMatter {
        /// Page source path.
        path: PathBuf,
        /// What was wrong.
        message: String,
    },

    /// Front matter parsed but the page metadata is invalid.
    #[error("Invalid page {}: {message}", path.display())]
    InvalidPage {
        /// Page source path.
        path: PathBuf,
        /// What was wrong.
        message: String,
    },

    /// A required template file is missing.
    #[error("Template not found: {}", .0.display())]
    MissingTemplate(PathBuf),

    /// Template compilation or rendering failed.
    #[error("Template error in {name}: {source}")]
    Template {
        /// Template name.
        name: String,
        /// Underlying error.
        source: minijinja::Error,
    },
}

impl BuildError {
    /// Wrap an I/O error with the path it occurred at.
    pub(crate) fn io(path: &Path) -> impl FnOnce(std::io::Error) -> Self + '_ {
        move |source| Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
