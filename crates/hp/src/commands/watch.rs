//! `hp watch` command implementation.
//!
//! Runs the native reload watcher against a served site. Useful for driving a
//! non-browser consumer (a screenshot job, a kiosk display) from the same
//! marker the browser client polls.

use std::io;
use std::path::PathBuf;
use std::process::{Command, ExitStatus};
use std::time::Duration;

use clap::Args;
use hp_config::{CliSettings, Config};
use hp_reload::{HttpMarkerSource, ReloadWatcher, Reloader};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the watch command.
#[derive(Args)]
pub(crate) struct WatchArgs {
    /// Path to configuration file (default: auto-discover homepage.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Base URL of the site (default: the configured server address).
    #[arg(short, long)]
    url: Option<String>,

    /// Marker resource path (overrides config).
    #[arg(long)]
    marker_path: Option<String>,

    /// Poll interval in milliseconds (overrides config).
    #[arg(short, long)]
    interval_ms: Option<u64>,

    /// Shell command to run once the site changes.
    #[arg(short, long)]
    exec: Option<String>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

impl WatchArgs {
    /// Execute the watch command.
    ///
    /// Returns after the first detected change, or on Ctrl-C.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or the watcher task fails.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            interval_ms: self.interval_ms,
            marker_path: self.marker_path,
            ..CliSettings::default()
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        let base_url = self.url.unwrap_or_else(|| config.server.base_url());
        let source = HttpMarkerSource::new(&base_url, &config.live_reload.marker_path);
        output.info(&format!(
            "Watching {} every {} ms",
            source.url(),
            config.live_reload.interval_ms
        ));

        let handle = ReloadWatcher::new(source, CommandReloader::new(self.exec))
            .with_interval(Duration::from_millis(config.live_reload.interval_ms))
            .start();

        tokio::select! {
            result = handle.join() => {
                result.map_err(|e| CliError::Watch(e.to_string()))?;
                output.success("Site changed");
            }
            _ = tokio::signal::ctrl_c() => {
                output.info("Stopped watching");
            }
        }

        Ok(())
    }
}

/// Reloader that runs an optional shell command.
struct CommandReloader {
    command: Option<String>,
}

impl CommandReloader {
    fn new(command: Option<String>) -> Self {
        Self { command }
    }

    /// Run the command through `sh -c` and wait for it.
    fn run(command: &str) -> io::Result<ExitStatus> {
        Command::new("sh").arg("-c").arg(command).status()
    }
}

impl Reloader for CommandReloader {
    fn reload(&self) {
        let Some(command) = &self.command else {
            return;
        };

        // The watcher stops after reloading, so blocking its task here is fine.
        match Self::run(command) {
            Ok(status) if status.success() => {
                tracing::info!(command = %command, "Reload command finished");
            }
            Ok(status) => {
                tracing::warn!(command = %command, %status, "Reload command failed");
            }
            Err(e) => {
                tracing::error!(command = %command, error = %e, "Failed to run reload command");
            }
        }
    }
}
