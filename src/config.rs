use crate::error::{PcsdlError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Column names and run defaults for reading a PCS export.
///
/// The defaults match the column headers PCS puts in its spreadsheet export.
/// They can be overridden by a config file or environment variables for
/// conferences that renamed the submission fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub id_column: String,
    pub video_column: String,
    pub caption_column: String,
    pub doi_column: String,
    pub concurrency: usize,
    pub fetch_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            id_column: "Paper ID".to_string(),
            video_column: "Pre-recorded Video Presentation (Required)".to_string(),
            caption_column: "Pre-recorded Video Presentation Captions (Required)".to_string(),
            doi_column: "DOI".to_string(),
            concurrency: 5,
            fetch_timeout_secs: 600,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        // Load from config file if it exists
        if let Some(config_path) = Self::config_file_path() {
            if config_path.exists() {
                let contents = std::fs::read_to_string(&config_path)?;
                if let Ok(file_config) = toml::from_str::<Config>(&contents) {
                    config = file_config;
                }
            }
        }

        // Override with environment variables
        if let Ok(column) = std::env::var("PCSDL_ID_COLUMN") {
            config.id_column = column;
        }
        if let Ok(column) = std::env::var("PCSDL_VIDEO_COLUMN") {
            config.video_column = column;
        }
        if let Ok(column) = std::env::var("PCSDL_CAPTION_COLUMN") {
            config.caption_column = column;
        }
        if let Ok(column) = std::env::var("PCSDL_DOI_COLUMN") {
            config.doi_column = column;
        }
        if let Ok(concurrency) = std::env::var("PCSDL_CONCURRENCY") {
            if let Ok(c) = concurrency.parse() {
                config.concurrency = c;
            }
        }
        if let Ok(timeout) = std::env::var("PCSDL_FETCH_TIMEOUT_SECS") {
            if let Ok(t) = timeout.parse() {
                config.fetch_timeout_secs = t;
            }
        }

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.id_column.is_empty() || self.video_column.is_empty() {
            return Err(PcsdlError::Config(
                "ID and video column names must not be empty".to_string(),
            ));
        }

        if self.concurrency == 0 {
            return Err(PcsdlError::Config(
                "Concurrency must be greater than 0".to_string(),
            ));
        }

        if self.fetch_timeout_secs == 0 {
            return Err(PcsdlError::Config(
                "Fetch timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    fn config_file_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("pcsdl").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.id_column, "Paper ID");
        assert_eq!(config.doi_column, "DOI");
        assert_eq!(config.concurrency, 5);
        assert_eq!(config.fetch_timeout_secs, 600);
    }

    #[test]
    fn test_validate_default() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_zero_concurrency() {
        let mut config = Config::default();
        config.concurrency = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_empty_columns() {
        let mut config = Config::default();
        config.id_column = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_roundtrip_through_toml() {
        let config = Config::default();
        let serialized = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed.video_column, config.video_column);
        assert_eq!(parsed.concurrency, config.concurrency);
    }
}
