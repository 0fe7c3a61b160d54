//! Source watcher.
//!
//! Watches the site sources and rebuilds `dist/` after each debounced burst
//! of changes.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::debouncer::{EventDebouncer, FsEventKind};
use crate::rebuild::Rebuilder;

/// How often the debouncer is checked for a ready batch.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Watches source directories and triggers rebuilds.
pub(crate) struct SourceWatcher {
    watch_dirs: Vec<PathBuf>,
    /// Build output; events under it are our own writes.
    dist_dir: PathBuf,
    rebuilder: Rebuilder,
    debounce: Duration,
    watcher: Option<RecommendedWatcher>,
    tasks: Vec<JoinHandle<()>>,
}

impl SourceWatcher {
    /// Create a watcher over `watch_dirs`. Directories that do not exist are
    /// skipped when the watcher starts.
    pub(crate) fn new(
        watch_dirs: Vec<PathBuf>,
        dist_dir: PathBuf,
        rebuilder: Rebuilder,
        debounce: Duration,
    ) -> Self {
        Self {
            watch_dirs,
            dist_dir,
            rebuilder,
            debounce,
            watcher: None,
            tasks: Vec::new(),
        }
    }

    /// Start watching.
    ///
    /// Spawns one task that feeds filesystem events into the debouncer and one
    /// that rebuilds when a batch is ready. Both stop when the watcher is
    /// dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the file watcher cannot be created.
    pub(crate) fn start(&mut self) -> Result<(), notify::Error> {
        let (tx, mut rx) = mpsc::channel::<Event>(100);

        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            match res {
                // Callback runs on notify's thread.
                Ok(event) => {
                    let _ = tx.blocking_send(event);
                }
                Err(e) => tracing::warn!(error = %e, "File watcher error"),
            }
        })?;

        for dir in &self.watch_dirs {
            if dir.is_dir() {
                watcher.watch(dir, RecursiveMode::Recursive)?;
                tracing::info!(dir = %dir.display(), "Watching for changes");
            }
        }
        self.watcher = Some(watcher);

        let debouncer = Arc::new(EventDebouncer::new(self.debounce));
        let debouncer_for_record = Arc::clone(&debouncer);
        let dist_dir = self.dist_dir.clone();

        let record_task = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                record_event(&event, &dist_dir, &debouncer_for_record);
            }
        });

        // Batches are handled one at a time, so rebuilds never overlap.
        let rebuilder = self.rebuilder.clone();
        let rebuild_task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(POLL_INTERVAL);
            loop {
                interval.tick().await;

                let events = debouncer.drain_ready();
                if events.is_empty() {
                    continue;
                }
                for event in &events {
                    tracing::info!(path = %event.path.display(), kind = ?event.kind, "Detected change");
                }
                rebuilder.run_logged().await;
            }
        });

        self.tasks = vec![record_task, rebuild_task];
        Ok(())
    }
}

impl Drop for SourceWatcher {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

/// Record a raw filesystem event into the debouncer.
fn record_event(event: &Event, dist_dir: &Path, debouncer: &EventDebouncer) {
    let kind = match event.kind {
        EventKind::Create(_) => FsEventKind::Created,
        EventKind::Modify(_) => FsEventKind::Modified,
        EventKind::Remove(_) => FsEventKind::Removed,
        _ => return,
    };

    for path in &event.paths {
        if path.starts_with(dist_dir) {
            continue;
        }
        debouncer.record(path.clone(), kind);
        tracing::debug!(path = %path.display(), ?kind, "Recorded filesystem event");
    }
}
