//! Application state.

use std::path::PathBuf;

/// State shared across all request handlers.
pub(crate) struct AppState {
    /// Built site served as static files.
    pub(crate) dist_dir: PathBuf,
    /// Rendered reload client, present when live reload is enabled.
    pub(crate) reload_script: Option<String>,
    /// Log every request.
    pub(crate) verbose: bool,
}
