//! Development server for hp.
//!
//! Builds the site, serves `dist/` over HTTP and rebuilds whenever the page,
//! asset or template sources change. Each rebuild rewrites the version marker
//! (`sha256.txt` by default), which is what the reload client polls.
//!
//! # Architecture
//!
//! ```text
//! Browser ──HTTP──► axum router
//!    │                 ├─► /__hp/reload.js   (reload client, dev only)
//!    │                 └─► ServeDir(dist/)   (no-cache on every response)
//!    │
//!    └─ polls /sha256.txt
//!
//! notify ──► debouncer ──► Rebuilder ──► SiteBuilder::build() ──► dist/
//! ```
//!
//! # Quick Start
//!
//! ```ignore
//! use hp_config::Config;
//! use hp_server::{run_server, server_config_from_config};
//!
//! let config = Config::load(None, None)?;
//! run_server(server_config_from_config(&config, false)).await?;
//! ```

mod app;
mod error;
mod live_reload;
mod middleware;
mod rebuild;
mod state;

use std::sync::Arc;
use std::time::Duration;

use hp_build::{BuildError, SiteBuilder};
use hp_config::{Config, Environment, SiteConfig};

pub use error::ServerError;
use live_reload::SourceWatcher;
use rebuild::Rebuilder;
use state::AppState;

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Site layout to build and serve.
    pub site: SiteConfig,
    /// Serve and inject the reload client.
    pub live_reload_enabled: bool,
    /// Marker path polled by the reload client.
    pub marker_path: String,
    /// Reload client poll interval in milliseconds.
    pub interval_ms: u64,
    /// Quiet period before a rebuild in milliseconds.
    pub debounce_ms: u64,
    /// Log every HTTP request.
    pub verbose: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let mut site = SiteConfig::with_base(std::path::Path::new("."));
        site.env = Environment::Dev;
        Self {
            host: "127.0.0.1".to_owned(),
            port: 8000,
            site,
            live_reload_enabled: true,
            marker_path: "/sha256.txt".to_owned(),
            interval_ms: 1000,
            debounce_ms: 100,
            verbose: false,
        }
    }
}

/// Run the server until Ctrl-C.
///
/// Performs an initial build first. A site that is not a project root is
/// fatal; any other build failure is logged and the server starts anyway so
/// the next save can fix it.
///
/// # Errors
///
/// Returns an error if the site layout is invalid, the file watcher cannot be
/// started or the listener cannot be bound.
pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let rebuilder = Rebuilder::new(site_builder(&config));

    match rebuilder.run().await {
        Ok(report) => tracing::info!(pages = report.pages, sha256 = %report.sha256, "Initial build complete"),
        Err(ServerError::Build(e @ BuildError::NotProjectRoot(_))) => return Err(e.into()),
        Err(e) => tracing::error!(error = %e, "Initial build failed"),
    }

    let site = &config.site;
    let mut watcher = SourceWatcher::new(
        vec![
            site.pages_dir.clone(),
            site.assets_dir.clone(),
            site.templates_dir.clone(),
        ],
        site.dist_dir.clone(),
        rebuilder,
        Duration::from_millis(config.debounce_ms),
    );
    watcher.start()?;

    let state = Arc::new(AppState {
        dist_dir: site.dist_dir.clone(),
        reload_script: config
            .live_reload_enabled
            .then(|| live_reload::reload_script(&config.marker_path, config.interval_ms)),
        verbose: config.verbose,
    });
    let app = app::create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: addr.clone(),
            source,
        })?;
    tracing::info!(address = %addr, "Starting server");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    drop(watcher);
    Ok(())
}

/// Builder that writes the marker where the reload client polls it.
fn site_builder(config: &ServerConfig) -> SiteBuilder {
    SiteBuilder::new(config.site.clone())
        .with_live_reload(config.live_reload_enabled)
        .with_marker_path(&config.marker_path)
}

/// Wait for shutdown signal (Ctrl-C).
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received, stopping server...");
}

/// Create server configuration from hp config.
///
/// The development server always builds with the `dev` environment.
#[must_use]
pub fn server_config_from_config(config: &Config, verbose: bool) -> ServerConfig {
    let mut site = config.site_resolved.clone();
    site.env = Environment::Dev;

    ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
        site,
        live_reload_enabled: config.live_reload.enabled,
        marker_path: config.live_reload.marker_path.clone(),
        interval_ms: config.live_reload.interval_ms,
        debounce_ms: config.live_reload.debounce_ms,
        verbose,
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use pretty_assertions::assert_eq;
    use tower::ServiceExt;

    use super::*;

    #[test]
    fn test_server_config_forces_dev() {
        let mut config = Config::default();
        config.site_resolved.env = Environment::Prod;
        config.server.port = 9000;
        config.live_reload.interval_ms = 250;

        let server = server_config_from_config(&config, true);

        assert_eq!(server.site.env, Environment::Dev);
        assert_eq!(server.port, 9000);
        assert_eq!(server.interval_ms, 250);
        assert_eq!(server.marker_path, "/sha256.txt");
        assert!(server.live_reload_enabled);
        assert!(server.verbose);
    }

    #[tokio::test]
    async fn test_custom_marker_path_is_served() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("templates")).unwrap();
        fs::create_dir_all(dir.path().join("pages")).unwrap();
        fs::write(
            dir.path().join("templates/base.html"),
            "<main>{{ content }}</main>{{ reload_script }}",
        )
        .unwrap();
        fs::write(
            dir.path().join("pages/index.md"),
            "---\npage_type: index\ntitle: Home\n---\nHello.",
        )
        .unwrap();
        let config = ServerConfig {
            site: SiteConfig::with_base(dir.path()),
            marker_path: "/build/hash.txt".to_owned(),
            ..ServerConfig::default()
        };

        let report = Rebuilder::new(site_builder(&config)).run().await.unwrap();

        let state = Arc::new(AppState {
            dist_dir: config.site.dist_dir.clone(),
            reload_script: Some(live_reload::reload_script(&config.marker_path, 1000)),
            verbose: false,
        });
        let response = app::create_router(state)
            .oneshot(
                Request::builder()
                    .uri("/build/hash.txt")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(String::from_utf8(body.to_vec()).unwrap(), report.sha256);
    }

    #[tokio::test]
    async fn test_run_server_rejects_non_project_root() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig {
            site: SiteConfig::with_base(dir.path()),
            port: 0,
            ..ServerConfig::default()
        };

        let err = run_server(config).await.unwrap_err();
        assert!(matches!(err, ServerError::Build(BuildError::NotProjectRoot(_))));
    }
}
