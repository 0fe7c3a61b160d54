//! `hp build` command implementation.

use std::path::PathBuf;

use clap::Args;
use hp_build::SiteBuilder;
use hp_config::{CliSettings, Config, Environment};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the build command.
#[derive(Args)]
pub(crate) struct BuildArgs {
    /// Path to configuration file (default: auto-discover homepage.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Build environment, `dev` or `prod` (overrides config).
    #[arg(short, long)]
    env: Option<Environment>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

impl BuildArgs {
    /// Execute the build command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or the build fails.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            env: self.env,
            ..CliSettings::default()
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        output.info(&format!(
            "Building {} site into {}",
            config.site_resolved.env,
            config.site_resolved.dist_dir.display()
        ));

        let report = SiteBuilder::new(config.site_resolved.clone())
            .with_live_reload(config.live_reload.enabled)
            .with_marker_path(&config.live_reload.marker_path)
            .build()?;

        output.success(&format!(
            "Built {} pages ({} blog posts, {} files copied)",
            report.pages, report.blog_posts, report.copied
        ));
        output.highlight(&format!("sha256: {}", report.sha256));

        Ok(())
    }
}
