//! Periodic marker polling.
//!
//! [`ReloadWatcher`] owns the comparison state and runs as a single tokio task:
//! one timer, one fetch per tick, one cancellable [`WatcherHandle`].

use std::time::Duration;

use tokio::task::{JoinError, JoinHandle};
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::source::{MarkerResponse, MarkerSource};

/// Default poll interval.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(1000);

/// Action taken when the marker changes.
///
/// For a browser this is "reload the current document"; native consumers
/// supply whatever refresh makes sense for them.
pub trait Reloader: Send + 'static {
    /// Perform the reload. Called at most once per watcher.
    fn reload(&self);
}

impl<F> Reloader for F
where
    F: Fn() + Send + 'static,
{
    fn reload(&self) {
        self();
    }
}

/// Comparison state for one watcher lifetime.
///
/// `last_seen_marker` starts unset and is assigned exactly once, by the first
/// successful fetch. It is never overwritten afterwards.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WatcherState {
    last_seen_marker: Option<String>,
}

impl WatcherState {
    /// Baseline marker, if one has been observed.
    #[must_use]
    pub fn last_seen_marker(&self) -> Option<&str> {
        self.last_seen_marker.as_deref()
    }

    /// Compare a freshly fetched marker against the baseline.
    fn observe(&mut self, marker: String) -> TickOutcome {
        match &self.last_seen_marker {
            None => {
                self.last_seen_marker = Some(marker);
                TickOutcome::Baseline
            }
            Some(seen) if *seen == marker => TickOutcome::Unchanged,
            Some(_) => TickOutcome::Changed,
        }
    }
}

/// Result of a single poll tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// First successful fetch; marker recorded as baseline.
    Baseline,
    /// Marker equals the baseline.
    Unchanged,
    /// Marker differs from the baseline; a reload is due.
    Changed,
    /// Server answered with a non-success status.
    Absent,
    /// The request could not complete.
    Failed,
}

/// Polls a [`MarkerSource`] and triggers a [`Reloader`] when the marker changes.
pub struct ReloadWatcher<S, R> {
    source: S,
    reloader: R,
    state: WatcherState,
    interval: Duration,
}

impl<S, R> ReloadWatcher<S, R>
where
    S: MarkerSource,
    R: Reloader,
{
    /// Create a watcher with the default 1000 ms interval.
    #[must_use]
    pub fn new(source: S, reloader: R) -> Self {
        Self {
            source,
            reloader,
            state: WatcherState::default(),
            interval: DEFAULT_INTERVAL,
        }
    }

    /// Set the poll interval. Must be non-zero.
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Current comparison state.
    #[must_use]
    pub fn state(&self) -> &WatcherState {
        &self.state
    }

    /// Run one poll cycle.
    ///
    /// Never fails: missing markers and transport errors are logged and
    /// reported as [`TickOutcome::Absent`] / [`TickOutcome::Failed`] without
    /// touching the state. The reload itself is left to the caller so that a
    /// periodic task can stop its timer first.
    pub async fn tick(&mut self) -> TickOutcome {
        match self.source.fetch().await {
            Ok(MarkerResponse::Found(marker)) => {
                let outcome = self.state.observe(marker);
                if outcome == TickOutcome::Baseline {
                    tracing::debug!(
                        marker = self.state.last_seen_marker().unwrap_or_default(),
                        "Recorded baseline marker"
                    );
                }
                outcome
            }
            Ok(MarkerResponse::Absent { status }) => {
                tracing::info!(status, "No marker resource found, skipping");
                TickOutcome::Absent
            }
            Err(err) => {
                tracing::warn!(error = %err, "Marker fetch failed, skipping");
                TickOutcome::Failed
            }
        }
    }

    /// Spawn the periodic task on the current tokio runtime.
    ///
    /// The first tick fires one interval after the call. Polling continues
    /// until a change is detected or the returned handle is cancelled.
    ///
    /// # Panics
    ///
    /// Panics if the interval is zero or no runtime is active.
    pub fn start(self) -> WatcherHandle {
        WatcherHandle {
            task: tokio::spawn(self.run()),
        }
    }

    async fn run(mut self) {
        let mut ticker = time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if self.tick().await == TickOutcome::Changed {
                break;
            }
        }

        // Timer goes first: no tick may run after a reload has been requested.
        drop(ticker);
        tracing::info!("Site content changed, reloading");
        self.reloader.reload();
    }
}

/// Handle to a running [`ReloadWatcher`] task.
///
/// Dropping the handle detaches the task; use [`cancel`](Self::cancel) to stop it.
#[derive(Debug)]
pub struct WatcherHandle {
    task: JoinHandle<()>,
}

impl WatcherHandle {
    /// Stop polling. No further ticks run after the current one yields.
    pub fn cancel(&self) {
        self.task.abort();
    }

    /// True once the watcher has reloaded or been cancelled.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the watcher to finish.
    ///
    /// Resolves `Ok(())` after the reload fired, or an error if the task was
    /// cancelled.
    pub async fn join(self) -> Result<(), JoinError> {
        self.task.await
    }
}
