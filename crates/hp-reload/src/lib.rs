//! Reload watcher for statically published sites.
//!
//! Polls a small version-marker resource (by default `/sha256.txt`) on a fixed
//! interval and triggers a reload exactly once when the marker changes.
//!
//! # Architecture
//!
//! ```text
//! ReloadWatcher::start() ──spawn──► periodic task (owns WatcherState)
//!                                       │
//!                                       ├─► MarkerSource::fetch()  (one await per tick)
//!                                       │
//!                                       └─► Reloader::reload()     (at most once)
//! ```
//!
//! The marker source and the reload action are injected, so the watcher can
//! run against a live server ([`HttpMarkerSource`]) or a scripted source in
//! tests.
//!
//! # Example
//!
//! ```ignore
//! use hp_reload::{HttpMarkerSource, ReloadWatcher};
//!
//! let source = HttpMarkerSource::new("http://127.0.0.1:8000", "/sha256.txt");
//! let handle = ReloadWatcher::new(source, || tracing::info!("reload!")).start();
//! handle.join().await?;
//! ```

mod source;
mod watcher;

pub use source::{FetchError, HttpMarkerSource, MarkerResponse, MarkerSource};
pub use watcher::{
    DEFAULT_INTERVAL, ReloadWatcher, Reloader, TickOutcome, WatcherHandle, WatcherState,
};
