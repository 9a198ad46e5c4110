//! Client configuration.
//!
//! A small JSON file under the platform config directory, overridable by
//! environment variables (and by CLI flags in the terminal client).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::util::normalize_text_option;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:4000/api";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const API_URL_ENV: &str = "JOTTER_API_URL";
pub const DATA_DIR_ENV: &str = "JOTTER_DATA_DIR";

const CONFIG_FILE_NAME: &str = "client-config.json";
const DATABASE_FILE_NAME: &str = "jotter.db";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    #[serde(default)]
    pub api_base_url: Option<String>,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

impl ClientConfig {
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("jotter")
            .join(CONFIG_FILE_NAME)
    }

    /// Load config from disk; a missing file yields the defaults
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw).map_err(|error| {
            Error::Config(format!(
                "Failed to parse config at {}: {error}",
                path.display()
            ))
        })
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut normalized = self.clone();
        normalized.api_base_url = normalize_text_option(normalized.api_base_url);
        let content = serde_json::to_string_pretty(&normalized)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Apply `JOTTER_API_URL` / `JOTTER_DATA_DIR` from the process environment
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(
            std::env::var(API_URL_ENV).ok(),
            std::env::var(DATA_DIR_ENV).ok(),
        )
    }

    /// Apply explicit overrides; blank values are ignored
    #[must_use]
    pub fn with_overrides(
        mut self,
        api_base_url: Option<String>,
        data_dir: Option<String>,
    ) -> Self {
        if let Some(url) = normalize_text_option(api_base_url) {
            self.api_base_url = Some(url);
        }
        if let Some(dir) = normalize_text_option(data_dir) {
            self.data_dir = Some(PathBuf::from(dir));
        }
        self
    }

    /// The normalized API base URL, falling back to the local default
    pub fn api_base_url(&self) -> Result<String> {
        normalize_text_option(self.api_base_url.clone())
            .map_or_else(|| Ok(DEFAULT_API_BASE_URL.to_string()), |url| {
                normalize_api_base_url(&url)
            })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.request_timeout_secs
                .filter(|secs| *secs > 0)
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }

    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .or_else(dirs::data_dir)
                .unwrap_or_else(|| PathBuf::from("."))
                .join("jotter")
        })
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir().join(DATABASE_FILE_NAME)
    }
}

/// Trim, require an http(s) scheme, drop trailing slashes and ensure the
/// `/api` prefix the backend-for-frontend mounts its routes under
pub fn normalize_api_base_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(Error::Config("API base URL must not be empty".to_string()));
    }
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(Error::Config(
            "API base URL must include http:// or https://".to_string(),
        ));
    }

    if trimmed.ends_with("/api") {
        Ok(trimmed.to_string())
    } else {
        Ok(format!("{trimmed}/api"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn normalize_api_base_url_appends_api_suffix() {
        assert_eq!(
            normalize_api_base_url(" http://10.0.2.2:4000/ ").unwrap(),
            "http://10.0.2.2:4000/api"
        );
        assert_eq!(
            normalize_api_base_url("https://notes.example.com/api/").unwrap(),
            "https://notes.example.com/api"
        );
    }

    #[test]
    fn normalize_api_base_url_rejects_invalid_values() {
        assert!(normalize_api_base_url("   ").is_err());
        assert!(normalize_api_base_url("notes.example.com").is_err());
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = ClientConfig::default();
        assert_eq!(config.api_base_url().unwrap(), DEFAULT_API_BASE_URL);
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn overrides_ignore_blank_values() {
        let config = ClientConfig {
            api_base_url: Some("http://saved.example.com".to_string()),
            ..ClientConfig::default()
        }
        .with_overrides(Some("  ".to_string()), Some("/tmp/jotter-data".to_string()));

        assert_eq!(
            config.api_base_url().unwrap(),
            "http://saved.example.com/api"
        );
        assert_eq!(
            config.database_path(),
            PathBuf::from("/tmp/jotter-data").join("jotter.db")
        );
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jotter").join("client-config.json");
        let config = ClientConfig {
            api_base_url: Some(" https://notes.example.com ".to_string()),
            request_timeout_secs: Some(5),
            data_dir: None,
        };

        config.save_to_path(&path).unwrap();
        let loaded = ClientConfig::load_from_path(&path).unwrap();
        assert_eq!(
            loaded.api_base_url.as_deref(),
            Some("https://notes.example.com")
        );
        assert_eq!(loaded.request_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn load_rejects_unknown_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client-config.json");
        std::fs::write(&path, r#"{"api_base_url":"http://x","surprise":true}"#).unwrap();

        let error = ClientConfig::load_from_path(&path).unwrap_err();
        assert!(error.to_string().contains("unknown field"));
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = ClientConfig::load_from_path(&dir.path().join("absent.json")).unwrap();
        assert_eq!(loaded, ClientConfig::default());
    }
}
