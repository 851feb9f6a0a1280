//! Configuration validation rules.
//!
//! This module provides validation logic for `AgentConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AgentConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

fn is_hex_color(value: &str) -> bool {
    value
        .strip_prefix('#')
        .is_some_and(|hex| matches!(hex.len(), 3 | 6 | 8) && hex.chars().all(|c| c.is_ascii_hexdigit()))
}

impl AgentConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `prefix` or `version` is empty or contains whitespace
    /// - `scope` is not an absolute http(s) URL
    /// - a static extension is empty or carries a leading dot
    /// - a font host is empty
    /// - a colour is not a `#rgb`/`#rrggbb`/`#rrggbbaa` hex value
    /// - `max_bytes` is 0
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [("prefix", &self.prefix), ("version", &self.version)] {
            if value.is_empty() {
                return Err(invalid(field, "must not be empty"));
            }
            if value.chars().any(char::is_whitespace) {
                return Err(invalid(field, "must not contain whitespace"));
            }
        }

        self.scope().map_err(|e| invalid("scope", e.to_string()))?;

        if let Some(ext) = self
            .static_extensions
            .iter()
            .find(|ext| ext.is_empty() || ext.starts_with('.'))
        {
            return Err(invalid("static_extensions", format!("invalid extension {ext:?}")));
        }

        if self.font_hosts.iter().any(|host| host.trim().is_empty()) {
            return Err(invalid("font_hosts", "must not contain empty hosts"));
        }

        if !is_hex_color(&self.theme_color) {
            return Err(invalid("theme_color", "must be a hex colour"));
        }
        if !is_hex_color(&self.background_color) {
            return Err(invalid("background_color", "must be a hex colour"));
        }

        if self.max_bytes == 0 {
            return Err(invalid("max_bytes", "must be greater than 0"));
        }

        if self.shell_assets.is_empty() {
            tracing::warn!("shell_assets is empty; only the offline document will be available offline");
        }

        Ok(())
    }
}
