//! Configuration management for hp.
//!
//! Parses `homepage.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ```toml
//! [site]
//! pages_dir = "pages"
//! env = "prod"
//!
//! [server]
//! port = 8000
//!
//! [live_reload]
//! interval_ms = 1000
//! marker_path = "/sha256.txt"
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override server host.
    pub host: Option<String>,
    /// Override server port.
    pub port: Option<u16>,
    /// Override build environment.
    pub env: Option<Environment>,
    /// Override live reload enabled flag.
    pub live_reload_enabled: Option<bool>,
    /// Override marker poll interval.
    pub interval_ms: Option<u64>,
    /// Override marker resource path.
    pub marker_path: Option<String>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "homepage.toml";

/// Build environment exposed to templates as `env`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development (reload client injected).
    Dev,
    /// Published site.
    #[default]
    Prod,
}

impl Environment {
    /// Lowercase name as used in config files and templates.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dev => "dev",
            Self::Prod => "prod",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dev" => Ok(Self::Dev),
            "prod" => Ok(Self::Prod),
            other => Err(ConfigError::Validation(format!(
                "unknown environment '{other}' (expected 'dev' or 'prod')"
            ))),
        }
    }
}

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Site layout (paths are relative strings from TOML).
    site: SiteConfigRaw,
    /// Server configuration.
    pub server: ServerConfig,
    /// Live reload configuration.
    pub live_reload: LiveReloadConfig,

    /// Resolved site configuration (set after loading).
    #[serde(skip)]
    pub site_resolved: SiteConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Server configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 8000,
        }
    }
}

impl ServerConfig {
    /// Base URL of the development server.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

/// Raw site configuration as parsed from TOML (paths as strings).
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct SiteConfigRaw {
    pages_dir: Option<String>,
    assets_dir: Option<String>,
    templates_dir: Option<String>,
    dist_dir: Option<String>,
    env: Option<Environment>,
}

/// Resolved site layout with absolute paths.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SiteConfig {
    /// Markdown pages and page-local files.
    pub pages_dir: PathBuf,
    /// Static assets copied verbatim into the output.
    pub assets_dir: PathBuf,
    /// `base.html` and `blog_index.html` templates.
    pub templates_dir: PathBuf,
    /// Build output directory.
    pub dist_dir: PathBuf,
    /// Build environment.
    pub env: Environment,
}

impl SiteConfig {
    /// Site layout rooted at `base` using the conventional directory names.
    #[must_use]
    pub fn with_base(base: &Path) -> Self {
        Self {
            pages_dir: base.join("pages"),
            assets_dir: base.join("assets"),
            templates_dir: base.join("templates"),
            dist_dir: base.join("dist"),
            env: Environment::default(),
        }
    }
}

/// Live reload configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LiveReloadConfig {
    /// Whether live reload is enabled.
    pub enabled: bool,
    /// Marker poll interval in milliseconds.
    pub interval_ms: u64,
    /// Same-origin path of the version marker resource.
    pub marker_path: String,
    /// Quiet period before a rebuild is triggered.
    pub debounce_ms: u64,
}

impl Default for LiveReloadConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_ms: 1000,
            marker_path: "/sha256.txt".to_owned(),
            debounce_ms: 100,
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `homepage.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails,
    /// or the resulting configuration is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(host) = &settings.host {
            self.server.host.clone_from(host);
        }
        if let Some(port) = settings.port {
            self.server.port = port;
        }
        if let Some(env) = settings.env {
            self.site_resolved.env = env;
        }
        if let Some(enabled) = settings.live_reload_enabled {
            self.live_reload.enabled = enabled;
        }
        if let Some(interval_ms) = settings.interval_ms {
            self.live_reload.interval_ms = interval_ms;
        }
        if let Some(marker_path) = &settings.marker_path {
            self.live_reload.marker_path.clone_from(marker_path);
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            site: SiteConfigRaw::default(),
            server: ServerConfig::default(),
            live_reload: LiveReloadConfig::default(),
            site_resolved: SiteConfig::with_base(base),
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_live_reload()?;
        Ok(())
    }

    /// Validate server configuration.
    fn validate_server(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.server.host, "server.host")?;

        if self.server.port == 0 {
            return Err(ConfigError::Validation(
                "server.port cannot be 0".to_owned(),
            ));
        }

        Ok(())
    }

    /// Validate live reload configuration.
    fn validate_live_reload(&self) -> Result<(), ConfigError> {
        if self.live_reload.interval_ms == 0 {
            return Err(ConfigError::Validation(
                "live_reload.interval_ms must be greater than 0".to_owned(),
            ));
        }
        if !self.live_reload.marker_path.starts_with('/') {
            return Err(ConfigError::Validation(
                "live_reload.marker_path must start with '/'".to_owned(),
            ));
        }
        // The builder writes the marker at this path under the output dir.
        if self.live_reload.marker_path[1..]
            .split('/')
            .any(|segment| segment.is_empty() || segment == "." || segment == "..")
        {
            return Err(ConfigError::Validation(format!(
                "live_reload.marker_path must name a file inside the site, got '{}'",
                self.live_reload.marker_path
            )));
        }
        Ok(())
    }

    /// Resolve relative paths to absolute paths based on config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let resolve = |path: Option<&str>, default: &str| config_dir.join(path.unwrap_or(default));

        self.site_resolved = SiteConfig {
            pages_dir: resolve(self.site.pages_dir.as_deref(), "pages"),
            assets_dir: resolve(self.site.assets_dir.as_deref(), "assets"),
            templates_dir: resolve(self.site.templates_dir.as_deref(), "templates"),
            dist_dir: resolve(self.site.dist_dir.as_deref(), "dist"),
            env: self.site.env.unwrap_or_default(),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = Config::default_with_base(Path::new("/test"));
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.site_resolved.pages_dir, PathBuf::from("/test/pages"));
        assert_eq!(config.site_resolved.dist_dir, PathBuf::from("/test/dist"));
        assert_eq!(config.site_resolved.env, Environment::Prod);
        assert!(config.live_reload.enabled);
        assert_eq!(config.live_reload.interval_ms, 1000);
        assert_eq!(config.live_reload.marker_path, "/sha256.txt");
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.live_reload.debounce_ms, 100);
    }

    #[test]
    fn test_parse_live_reload_config() {
        let toml = r#"
[live_reload]
enabled = false
interval_ms = 250
marker_path = "/build/hash.txt"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert!(!config.live_reload.enabled);
        assert_eq!(config.live_reload.interval_ms, 250);
        assert_eq!(config.live_reload.marker_path, "/build/hash.txt");
    }

    #[test]
    fn test_parse_unknown_env_fails() {
        let toml = r#"
[site]
env = "staging"
"#;
        assert!(toml::from_str::<Config>(toml).is_err());
    }

    #[test]
    fn test_resolve_paths() {
        let toml = r#"
[site]
pages_dir = "content"
dist_dir = "public"
env = "dev"
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.resolve_paths(Path::new("/project"));

        assert_eq!(
            config.site_resolved,
            SiteConfig {
                pages_dir: PathBuf::from("/project/content"),
                assets_dir: PathBuf::from("/project/assets"),
                templates_dir: PathBuf::from("/project/templates"),
                dist_dir: PathBuf::from("/project/public"),
                env: Environment::Dev,
            }
        );
    }

    #[test]
    fn test_load_from_file_sets_config_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "[server]\nport = 9000\n").unwrap();

        let config = Config::load(Some(&path), None).unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.config_path, Some(path));
        assert_eq!(config.site_resolved.pages_dir, dir.path().join("pages"));
    }

    #[test]
    fn test_load_missing_explicit_path() {
        let err = Config::load(Some(Path::new("/nonexistent/homepage.toml")), None).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_load_invalid_file_fails_validation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "[live_reload]\nmarker_path = \"sha256.txt\"\n").unwrap();

        let err = Config::load(Some(&path), None).unwrap_err();
        assert!(err.to_string().contains("marker_path"));
    }

    #[test]
    fn test_apply_cli_settings_port() {
        let mut config = Config::default_with_base(Path::new("/test"));
        let overrides = CliSettings {
            port: Some(9000),
            ..Default::default()
        };

        config.apply_cli_settings(&overrides);

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1"); // Unchanged
    }

    #[test]
    fn test_apply_cli_settings_multiple() {
        let mut config = Config::default_with_base(Path::new("/test"));
        let overrides = CliSettings {
            host: Some("0.0.0.0".to_owned()),
            env: Some(Environment::Dev),
            live_reload_enabled: Some(false),
            interval_ms: Some(500),
            marker_path: Some("/hash.txt".to_owned()),
            ..Default::default()
        };

        config.apply_cli_settings(&overrides);

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.site_resolved.env, Environment::Dev);
        assert!(!config.live_reload.enabled);
        assert_eq!(config.live_reload.interval_ms, 500);
        assert_eq!(config.live_reload.marker_path, "/hash.txt");
    }

    #[test]
    fn test_apply_cli_settings_empty() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.apply_cli_settings(&CliSettings::default());

        assert_eq!(config.server.port, 8000);
        assert!(config.live_reload.enabled);
    }

    #[test]
    fn test_base_url() {
        let server = ServerConfig {
            host: "localhost".to_owned(),
            port: 4000,
        };
        assert_eq!(server.base_url(), "http://localhost:4000");
    }

    #[test]
    fn test_environment_from_str() {
        assert_eq!("dev".parse::<Environment>().unwrap(), Environment::Dev);
        assert_eq!("prod".parse::<Environment>().unwrap(), Environment::Prod);
        assert!("test".parse::<Environment>().is_err());
        assert_eq!(Environment::Dev.to_string(), "dev");
    }

    // Validation tests

    fn assert_validation_error(config: &Config, expected_substrings: &[&str]) {
        let result = config.validate();
        assert!(result.is_err(), "Expected validation to fail");
        let err = result.unwrap_err();
        assert!(
            matches!(err, ConfigError::Validation(_)),
            "Expected ConfigError::Validation, got {err:?}"
        );
        let msg = err.to_string();
        for s in expected_substrings {
            assert!(
                msg.contains(s),
                "Expected error to contain '{s}', got: {msg}"
            );
        }
    }

    #[test]
    fn test_validate_default_config_passes() {
        let config = Config::default_with_base(Path::new("/test"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_server_host_empty() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.server.host = String::new();
        assert_validation_error(&config, &["server.host", "empty"]);
    }

    #[test]
    fn test_validate_server_port_zero() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.server.port = 0;
        assert_validation_error(&config, &["server.port"]);
    }

    #[test]
    fn test_validate_interval_zero() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.live_reload.interval_ms = 0;
        assert_validation_error(&config, &["interval_ms", "greater than 0"]);
    }

    #[test]
    fn test_validate_marker_path_relative() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.live_reload.marker_path = "sha256.txt".to_owned();
        assert_validation_error(&config, &["marker_path", "/"]);
    }

    #[test]
    fn test_validate_marker_path_must_name_file() {
        for marker_path in ["/", "/build/", "/../hash.txt", "/build//hash.txt", "/./hash.txt"] {
            let mut config = Config::default_with_base(Path::new("/test"));
            config.live_reload.marker_path = marker_path.to_owned();
            assert_validation_error(&config, &["marker_path", "inside the site"]);
        }
    }

    #[test]
    fn test_validate_nested_marker_path_passes() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.live_reload.marker_path = "/build/hash.txt".to_owned();
        assert!(config.validate().is_ok());
    }
}
