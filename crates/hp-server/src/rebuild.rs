//! Serialised site rebuilds.

use std::sync::{Arc, Mutex, PoisonError};

use hp_build::{BuildError, BuildReport, SiteBuilder};

use crate::error::ServerError;

/// Runs site builds one at a time, off the async runtime.
#[derive(Clone)]
pub(crate) struct Rebuilder {
    builder: Arc<SiteBuilder>,
    lock: Arc<Mutex<()>>,
}

impl Rebuilder {
    pub(crate) fn new(builder: SiteBuilder) -> Self {
        Self {
            builder: Arc::new(builder),
            lock: Arc::new(Mutex::new(())),
        }
    }

    /// Build the site while holding the build lock.
    fn build_locked(&self) -> Result<BuildReport, BuildError> {
        // A panicked build leaves nothing behind that the next build relies on.
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.builder.build()
    }

    /// Run one build on the blocking pool.
    pub(crate) async fn run(&self) -> Result<BuildReport, ServerError> {
        let this = self.clone();
        let report = tokio::task::spawn_blocking(move || this.build_locked()).await??;
        Ok(report)
    }

    /// Run one build and log its outcome. Failures are not fatal.
    pub(crate) async fn run_logged(&self) {
        match self.run().await {
            Ok(report) => tracing::info!(
                pages = report.pages,
                sha256 = %report.sha256,
                "Site rebuilt"
            ),
            Err(e) => tracing::error!(error = %e, "Rebuild failed"),
        }
    }
}
