//! Configuration management for the CFPS briefing tool
//!
//! Handles loading configuration from an optional TOML file and environment
//! variables, and validates the result.

use crate::BriefError;
use crate::output::ExportFormat;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Value of `api.cache_buster` that asks for a fresh token on every request
pub const AUTO_CACHE_BUSTER: &str = "auto";

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BriefConfig {
    /// CFPS API settings
    pub api: ApiConfig,
    /// NOTAM detail view settings
    pub notam: NotamConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Spreadsheet export settings
    pub export: ExportConfig,
}

/// CFPS alpha API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Alpha endpoint URL
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Value of the `_` query parameter, or "auto" for the current epoch milliseconds
    #[serde(default = "default_cache_buster")]
    pub cache_buster: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// NOTAM detail view settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotamConfig {
    /// NOTAMs containing any of these (case-insensitive) are left out of the detail view
    #[serde(default = "default_hide_keywords")]
    pub hide_keywords: Vec<String>,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Export settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Directory the export file is written to
    #[serde(default = "default_export_directory")]
    pub directory: String,
    /// xlsx or csv
    #[serde(default)]
    pub format: ExportFormat,
}

// Default value functions
fn default_base_url() -> String {
    "https://plan.navcanada.ca/weather/api/alpha/".to_string()
}

fn default_cache_buster() -> String {
    "1756244240291".to_string()
}

fn default_timeout() -> u32 {
    30
}

fn default_user_agent() -> String {
    format!("cfps-brief/{}", crate::VERSION)
}

fn default_hide_keywords() -> Vec<String> {
    [
        "crane",
        "RUSSIAN",
        "CONGO",
        "OBST RIG",
        "CANCELLED",
        "CANCELED",
        "SAFETY AREA NOT STD",
        "GRASS CUTTING",
        "OBST TOWER",
        "SFC MARKINGS NOT STD",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_export_directory() -> String {
    ".".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            cache_buster: default_cache_buster(),
            timeout_seconds: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for NotamConfig {
    fn default() -> Self {
        Self {
            hide_keywords: default_hide_keywords(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            directory: default_export_directory(),
            format: ExportFormat::default(),
        }
    }
}

impl Default for BriefConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            notam: NotamConfig::default(),
            logging: LoggingConfig::default(),
            export: ExportConfig::default(),
        }
    }
}

impl ApiConfig {
    /// Token for the `_` query parameter of one request
    #[must_use]
    pub fn cache_buster_token(&self) -> String {
        if self.cache_buster.eq_ignore_ascii_case(AUTO_CACHE_BUSTER) {
            chrono::Utc::now().timestamp_millis().to_string()
        } else {
            self.cache_buster.clone()
        }
    }
}

impl BriefConfig {
    /// Load configuration from specified path
    ///
    /// An explicitly given file must exist; the default location is optional.
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        match config_path {
            Some(path) => {
                builder = builder.add_source(
                    File::from(path)
                        .required(true)
                        .format(config::FileFormat::Toml),
                );
            }
            None => {
                if let Some(default_path) = Self::get_config_path().filter(|p| p.exists()) {
                    builder = builder.add_source(
                        File::from(default_path)
                            .required(false)
                            .format(config::FileFormat::Toml),
                    );
                }
            }
        }

        // CFPS_BRIEF_API__TIMEOUT_SECONDS=10, CFPS_BRIEF_NOTAM__HIDE_KEYWORDS=crane,obst
        builder = builder.add_source(
            Environment::with_prefix("CFPS_BRIEF")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("notam.hide_keywords")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: BriefConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("cfps-brief").join("config.toml"))
    }

    /// Apply default values to empty configuration fields
    pub fn apply_defaults(&mut self) {
        if self.api.base_url.is_empty() {
            self.api.base_url = default_base_url();
        }
        if self.api.cache_buster.is_empty() {
            self.api.cache_buster = default_cache_buster();
        }
        if self.api.timeout_seconds == 0 {
            self.api.timeout_seconds = default_timeout();
        }
        if self.api.user_agent.is_empty() {
            self.api.user_agent = default_user_agent();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
        if self.export.directory.is_empty() {
            self.export.directory = default_export_directory();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_api()?;
        self.validate_string_values()?;
        Ok(())
    }

    fn validate_api(&self) -> Result<()> {
        if self.api.timeout_seconds > 300 {
            return Err(BriefError::config("API timeout cannot exceed 300 seconds").into());
        }

        if !self.api.base_url.starts_with("http://") && !self.api.base_url.starts_with("https://")
        {
            return Err(
                BriefError::config("API base URL must be a valid HTTP or HTTPS URL").into(),
            );
        }

        let token = &self.api.cache_buster;
        if !token.eq_ignore_ascii_case(AUTO_CACHE_BUSTER)
            && !token.chars().all(|c| c.is_ascii_digit())
        {
            return Err(BriefError::config(format!(
                "Invalid cache buster '{token}'. Must be numeric or '{AUTO_CACHE_BUSTER}'"
            ))
            .into());
        }

        Ok(())
    }

    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(BriefError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(BriefError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = BriefConfig::default();
        assert_eq!(
            config.api.base_url,
            "https://plan.navcanada.ca/weather/api/alpha/"
        );
        assert_eq!(config.api.cache_buster, "1756244240291");
        assert_eq!(config.api.timeout_seconds, 30);
        assert_eq!(config.logging.level, "info");
        assert!(config.notam.hide_keywords.contains(&"GRASS CUTTING".to_string()));
        assert_eq!(config.export.format, ExportFormat::Xlsx);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_fixed_cache_buster_is_used_verbatim() {
        let config = BriefConfig::default();
        assert_eq!(config.api.cache_buster_token(), "1756244240291");
    }

    #[test]
    fn test_auto_cache_buster_is_current_millis() {
        let mut config = BriefConfig::default();
        config.api.cache_buster = "AUTO".to_string();
        let before = chrono::Utc::now().timestamp_millis();
        let token: i64 = config.api.cache_buster_token().parse().unwrap();
        assert!(token >= before);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_invalid_cache_buster() {
        let mut config = BriefConfig::default();
        config.api.cache_buster = "tomorrow".to_string();
        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("Invalid cache buster"));
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = BriefConfig::default();
        config.logging.level = "invalid".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_config_validation_timeout_range() {
        let mut config = BriefConfig::default();
        config.api.timeout_seconds = 500;
        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("timeout cannot exceed"));
    }

    #[test]
    fn test_config_validation_base_url() {
        let mut config = BriefConfig::default();
        config.api.base_url = "ftp://example.com".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_apply_defaults_fills_empty_values() {
        let mut config = BriefConfig::default();
        config.api.base_url.clear();
        config.api.timeout_seconds = 0;
        config.export.directory.clear();
        config.apply_defaults();
        assert_eq!(config.api.base_url, default_base_url());
        assert_eq!(config.api.timeout_seconds, 30);
        assert_eq!(config.export.directory, ".");
    }

    #[test]
    fn test_load_from_file_merges_with_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[api]\ntimeout_seconds = 5\ncache_buster = \"auto\"\n\n[notam]\nhide_keywords = [\"bird\"]\n\n[export]\nformat = \"csv\""
        )
        .unwrap();

        let config = BriefConfig::load_from_path(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.api.timeout_seconds, 5);
        assert_eq!(config.api.cache_buster, "auto");
        assert_eq!(config.api.base_url, default_base_url());
        assert_eq!(config.notam.hide_keywords, vec!["bird".to_string()]);
        assert_eq!(config.logging.format, "pretty");
        assert_eq!(config.export.format, ExportFormat::Csv);
        assert_eq!(config.export.directory, ".");
    }

    #[test]
    fn test_load_from_missing_explicit_path_fails() {
        let result = BriefConfig::load_from_path(Some(PathBuf::from("/nonexistent/cfps-brief.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_config_path_generation() {
        if let Some(path) = BriefConfig::get_config_path() {
            assert!(path.to_string_lossy().contains("cfps-brief"));
            assert!(path.to_string_lossy().ends_with("config.toml"));
        }
    }
}
