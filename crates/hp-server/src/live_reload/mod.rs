//! Live reload for the development server.
//!
//! The server side rebuilds `dist/` whenever sources change, which updates the
//! version marker. The browser side is a small polling script served at
//! [`hp_build::RELOAD_SCRIPT_PATH`] that reloads the page once the marker
//! changes.

mod debouncer;
mod script;
mod watcher;

pub(crate) use script::reload_script;
pub(crate) use watcher::SourceWatcher;
