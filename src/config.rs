//! Application configuration.
//!
//! Configuration is loaded from a TOML file at:
//! 1. `$HDRBRIDGE_CONFIG` (environment variable)
//! 2. `~/.config/hdrbridge/config.toml` (Linux/macOS)
//!    `%APPDATA%\hdrbridge\config.toml` (Windows)
//! 3. Built-in defaults

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::builder::header::{IdDomains, CONVERSATION_ID_DOMAIN, INTERNAL_ID_DOMAIN};
use crate::error::{HeaderError, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General behavior settings.
    pub general: GeneralConfig,
    /// Message-ID synthesis.
    pub ids: IdsConfig,
}

/// General behavior settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub log_level: String,
}

/// Domains appended to provider IDs in `Message-Id` and `References`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdsConfig {
    pub internal_id_domain: String,
    pub conversation_id_domain: String,
}

// ── Default implementations ─────────────────────────────────────

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
        }
    }
}

impl Default for IdsConfig {
    fn default() -> Self {
        Self {
            internal_id_domain: INTERNAL_ID_DOMAIN.to_string(),
            conversation_id_domain: CONVERSATION_ID_DOMAIN.to_string(),
        }
    }
}

impl Config {
    /// The domains to hand to [`crate::builder::build_header`].
    pub fn id_domains(&self) -> IdDomains {
        IdDomains {
            internal: self.ids.internal_id_domain.clone(),
            conversation: self.ids.conversation_id_domain.clone(),
        }
    }
}

// ── Load ────────────────────────────────────────────────────────

/// Load configuration, searching standard locations.
///
/// Returns the default configuration if no file is found or on parse error.
pub fn load_config() -> Config {
    let Some(path) = config_file_path() else {
        return Config::default();
    };
    if !path.exists() {
        return Config::default();
    }
    match load_config_from(&path) {
        Ok(cfg) => {
            tracing::info!(path = %path.display(), "Loaded config");
            cfg
        }
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "Failed to load config, using defaults"
            );
            Config::default()
        }
    }
}

/// Read and parse one config file.
pub fn load_config_from(path: &Path) -> Result<Config> {
    let contents = std::fs::read_to_string(path).map_err(|e| HeaderError::io(path, e))?;
    toml::from_str::<Config>(&contents)
        .map_err(|e| HeaderError::InvalidInput(format!("{}: {e}", path.display())))
}

/// Determine the config file path (checking env var first, then standard dirs).
pub fn config_file_path() -> Option<PathBuf> {
    if let Ok(env_path) = std::env::var("HDRBRIDGE_CONFIG") {
        return Some(PathBuf::from(env_path));
    }
    dirs::config_dir().map(|d| d.join("hdrbridge").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = Config::default();
        assert_eq!(cfg.general.log_level, "warn");
        assert_eq!(cfg.id_domains(), IdDomains::default());
        assert_eq!(cfg.ids.internal_id_domain, "protonmail.internalid");
    }

    #[test]
    fn test_serialize_deserialize_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).expect("serialize");
        let parsed: Config = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let partial = r#"
[ids]
internal_id_domain = "ids.example"
"#;
        let cfg: Config = toml::from_str(partial).expect("parse partial");
        assert_eq!(cfg.id_domains().internal, "ids.example");
        assert_eq!(cfg.id_domains().conversation, "protonmail.conversationid");
        assert_eq!(cfg.general.log_level, "warn");
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[general]\nlog_level = \"debug\"\n").expect("write");
        let cfg = load_config_from(&path).expect("load");
        assert_eq!(cfg.general.log_level, "debug");

        std::fs::write(&path, "[general\n").expect("write");
        assert!(matches!(
            load_config_from(&path),
            Err(HeaderError::InvalidInput(_))
        ));
        assert!(matches!(
            load_config_from(&dir.path().join("missing.toml")),
            Err(HeaderError::Io { .. })
        ));
    }
}
