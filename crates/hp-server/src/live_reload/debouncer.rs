//! Event debouncing for rebuilds.
//!
//! Editors emit several events per save and a `git checkout` touches many
//! files at once. Events are coalesced per path and released together once
//! no new event has arrived for the debounce duration, so one burst of
//! changes costs one rebuild.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Kind of filesystem event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum FsEventKind {
    Created,
    Modified,
    Removed,
}

/// A debounced filesystem event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct FsEvent {
    pub path: PathBuf,
    pub kind: FsEventKind,
}

#[derive(Default)]
struct Pending {
    events: HashMap<PathBuf, FsEventKind>,
    /// Quiet-period deadline, pushed back by every recorded event.
    deadline: Option<Instant>,
}

/// Thread-safe batch debouncer.
pub(crate) struct EventDebouncer {
    pending: Mutex<Pending>,
    debounce_duration: Duration,
}

impl EventDebouncer {
    /// Create a new debouncer with the specified quiet period.
    pub fn new(debounce_duration: Duration) -> Self {
        Self {
            pending: Mutex::new(Pending::default()),
            debounce_duration,
        }
    }

    /// Record an event and restart the quiet period.
    pub fn record(&self, path: PathBuf, kind: FsEventKind) {
        use std::collections::hash_map::Entry;

        let mut pending = self.pending.lock().expect("debouncer lock poisoned");
        pending.deadline = Some(Instant::now() + self.debounce_duration);

        match pending.events.entry(path) {
            Entry::Vacant(entry) => {
                entry.insert(kind);
            }
            Entry::Occupied(mut entry) => match Self::coalesce(*entry.get(), kind) {
                Some(coalesced) => {
                    entry.insert(coalesced);
                }
                // Created then removed: the file never existed for us.
                None => {
                    entry.remove();
                }
            },
        }
    }

    /// Coalesce two event kinds for the same path.
    ///
    /// Returns `None` if both events cancel out.
    #[allow(clippy::match_same_arms)]
    fn coalesce(existing: FsEventKind, new: FsEventKind) -> Option<FsEventKind> {
        use FsEventKind::{Created, Modified, Removed};

        match (existing, new) {
            (Created, Created | Modified) => Some(Created),
            (Created, Removed) => None,

            (Modified, Created) => Some(Created),
            (Modified, Modified) => Some(Modified),
            (Modified, Removed) => Some(Removed),

            // Replaced on disk (write temp + rename).
            (Removed, Created) => Some(Modified),
            (Removed, Modified | Removed) => Some(Removed),
        }
    }

    /// Take the whole batch once the quiet period has elapsed.
    ///
    /// Returns an empty vector while events are still arriving. Events come
    /// back sorted by path.
    pub fn drain_ready(&self) -> Vec<FsEvent> {
        let mut pending = self.pending.lock().expect("debouncer lock poisoned");
        match pending.deadline {
            Some(deadline) if deadline <= Instant::now() => {}
            _ => return Vec::new(),
        }

        pending.deadline = None;
        let mut events: Vec<FsEvent> = pending
            .events
            .drain()
            .map(|(path, kind)| FsEvent { path, kind })
            .collect();
        events.sort_by(|a, b| a.path.cmp(&b.path));
        events
    }
}
