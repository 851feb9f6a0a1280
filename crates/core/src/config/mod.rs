//! Agent configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (SHELLWARD_*)
//! 2. TOML config file (if SHELLWARD_CONFIG_FILE set)
//! 3. Built-in defaults
//!
//! The agent itself never reads the environment; the host loads an
//! [`AgentConfig`] once and injects it.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::{Error, Scope};

mod validation;

pub use validation::ConfigError;

/// When a freshly installed version takes control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ActivationPolicy {
    /// Stay waiting until a client sends `SKIP_WAITING`.
    #[default]
    OnRequest,
    /// Activate as soon as install completes.
    Immediate,
}

/// Agent configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (SHELLWARD_*)
/// 2. TOML config file (if SHELLWARD_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Name prefix shared by every cache namespace this agent owns.
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Deployer-chosen version tag.
    ///
    /// Set via SHELLWARD_VERSION environment variable.
    #[serde(default = "default_version")]
    pub version: String,

    /// Registration scope every cache key is resolved against.
    #[serde(default = "default_scope")]
    pub scope: String,

    /// App-shell manifest, scope-relative.
    #[serde(default = "default_shell_assets")]
    pub shell_assets: Vec<String>,

    /// Extensions (without the dot) treated as same-origin static assets.
    #[serde(default = "default_static_extensions")]
    pub static_extensions: Vec<String>,

    /// Third-party hosts serving font metadata and font binaries.
    #[serde(default = "default_font_hosts")]
    pub font_hosts: Vec<String>,

    #[serde(default)]
    pub activation: ActivationPolicy,

    /// Theme colour embedded in the offline document.
    #[serde(default = "default_theme_color")]
    pub theme_color: String,

    /// Background colour embedded in the offline document.
    #[serde(default = "default_background_color")]
    pub background_color: String,

    /// Path to the SQLite cache storage database.
    ///
    /// Set via SHELLWARD_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for network requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to read per network response.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Optional network timeout in milliseconds. Unset means no timeout.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

fn default_prefix() -> String {
    "app".into()
}

fn default_version() -> String {
    "1.0.0".into()
}

fn default_scope() -> String {
    "http://localhost:8080/".into()
}

fn default_shell_assets() -> Vec<String> {
    ["./", "index.html", "manifest.json", "icons/icon-192.png", "icons/icon-512.png"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_static_extensions() -> Vec<String> {
    [
        "css", "js", "mjs", "png", "jpg", "jpeg", "gif", "webp", "svg", "ico", "woff", "woff2", "ttf", "otf",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_font_hosts() -> Vec<String> {
    vec!["fonts.googleapis.com".into(), "fonts.gstatic.com".into()]
}

fn default_theme_color() -> String {
    "#667eea".into()
}

fn default_background_color() -> String {
    "#E8E5FF".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./shellward-cache.sqlite")
}

fn default_user_agent() -> String {
    "shellward/0.1".into()
}

fn default_max_bytes() -> usize {
    10_485_760 // 10MB
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            version: default_version(),
            scope: default_scope(),
            shell_assets: default_shell_assets(),
            static_extensions: default_static_extensions(),
            font_hosts: default_font_hosts(),
            activation: ActivationPolicy::default(),
            theme_color: default_theme_color(),
            background_color: default_background_color(),
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: None,
        }
    }
}

impl AgentConfig {
    /// Timeout as Duration for use with reqwest, if one is configured.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Parsed registration scope.
    pub fn scope(&self) -> Result<Scope, Error> {
        Scope::parse(&self.scope)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `SHELLWARD_`
    /// 2. TOML file from `SHELLWARD_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("SHELLWARD_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("SHELLWARD_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AgentConfig::default();
        assert_eq!(config.prefix, "app");
        assert_eq!(config.version, "1.0.0");
        assert_eq!(config.activation, ActivationPolicy::OnRequest);
        assert_eq!(config.shell_assets.len(), 5);
        assert!(config.static_extensions.iter().any(|e| e == "woff2"));
        assert_eq!(config.font_hosts, vec!["fonts.googleapis.com", "fonts.gstatic.com"]);
        assert_eq!(config.theme_color, "#667eea");
        assert!(config.timeout().is_none());
    }

    #[test]
    fn test_timeout_duration() {
        let config = AgentConfig { timeout_ms: Some(1500), ..Default::default() };
        assert_eq!(config.timeout(), Some(Duration::from_millis(1500)));
    }

    #[test]
    fn test_scope_parses() {
        let config = AgentConfig { scope: "https://example.com/repo/".into(), ..Default::default() };
        assert_eq!(config.scope().unwrap().base().path(), "/repo/");
    }

    #[test]
    fn test_load_layers_file_and_env() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "shellward.toml",
                r#"
                prefix = "max"
                version = "1.3.0"
                activation = "immediate"
                shell_assets = ["./", "index.html"]
                "#,
            )?;
            jail.set_env("SHELLWARD_CONFIG_FILE", "shellward.toml");
            jail.set_env("SHELLWARD_VERSION", "1.3.1");

            let config = AgentConfig::load().expect("config loads");
            assert_eq!(config.prefix, "max");
            assert_eq!(config.version, "1.3.1");
            assert_eq!(config.activation, ActivationPolicy::Immediate);
            assert_eq!(config.shell_assets, vec!["./", "index.html"]);
            Ok(())
        });
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("SHELLWARD_PREFIX", "my app");
            assert!(matches!(AgentConfig::load(), Err(ConfigError::Invalid { .. })));
            Ok(())
        });
    }
}
