//! Application configuration loaded from `config.json`.
//!
//! The dashboard URL and device id are deployment-specific and never
//! hard-coded; a missing config file is a hard error with guidance, since
//! there is no sensible default device to sync.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file missing
    #[error(
        "config file not found at {0}: copy config.example.json to config.json \
         and fill in your device id"
    )]
    NotFound(PathBuf),

    /// I/O failure while reading
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed JSON or missing fields
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Dashboard endpoint settings
    pub dashboard: DashboardConfig,
    /// Download/output settings
    pub download: DownloadConfig,
}

/// Where the dashboard lives and which device to load.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardConfig {
    /// Dashboard base URL, without query string
    pub base_url: String,
    /// Device id, appended as `?pid=<device_id>`
    pub device_id: String,
}

impl DashboardConfig {
    /// Full device-scoped dashboard URL.
    pub fn device_url(&self) -> String {
        format!("{}?pid={}", self.base_url, self.device_id)
    }
}

/// Output location and default date range.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadConfig {
    /// Root directory for per-date bucket directories
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Default start date when the CLI gives none
    pub default_start_date: Option<NaiveDate>,
    /// Default end date when the CLI gives none
    pub default_end_date: Option<NaiveDate>,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("data")
}

impl AppConfig {
    /// Load configuration from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let raw = r#"{
            "dashboard": {
                "baseUrl": "https://dash.example.com/devices",
                "deviceId": "abc123"
            },
            "download": {
                "outputDir": "routersense_data",
                "defaultStartDate": "2025-11-01",
                "defaultEndDate": "2025-11-07"
            }
        }"#;
        let config: AppConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(
            config.dashboard.device_url(),
            "https://dash.example.com/devices?pid=abc123"
        );
        assert_eq!(config.download.output_dir, PathBuf::from("routersense_data"));
        assert_eq!(
            config.download.default_start_date,
            NaiveDate::from_ymd_opt(2025, 11, 1)
        );
    }

    #[test]
    fn test_output_dir_defaults() {
        let raw = r#"{
            "dashboard": { "baseUrl": "https://d.example.com", "deviceId": "x" },
            "download": {}
        }"#;
        let config: AppConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(config.download.output_dir, PathBuf::from("data"));
        assert!(config.download.default_start_date.is_none());
    }

    #[test]
    fn test_missing_file_is_guided_error() {
        let err = AppConfig::load("/definitely/not/here/config.json").unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
        assert!(err.to_string().contains("config.example.json"));
    }
}
