use crate::error::{Error, Result};
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default search URL. `{q}` is replaced by the form-encoded query.
pub const DEFAULT_SEARCH_URL: &str =
    "https://www.google.com/search?safe=off&site=&tbm=isch&source=hp&q={q}&oq={q}&gs_l=img";

/// Log level for the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

/// Order in which the worklist is processed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    /// Makes a -> z
    Ascending,
    /// Makes z -> a
    Descending,
}

/// CSS selectors used to drive the results page.
///
/// These track the search engine's current markup and change without notice,
/// which is why they live in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Selectors {
    /// Thumbnail images in the results grid
    pub thumbnail: String,

    /// Full-size image revealed after clicking a thumbnail
    pub full_image: String,

    /// Indicator shown once the engine has no more results
    pub end_of_results: String,

    /// Button that loads another page of results
    pub load_more: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            thumbnail: "img.Q4LuWd".to_string(),
            full_image: "img.n3VNCb".to_string(),
            end_of_results: ".r0zKGf".to_string(),
            load_more: ".mye4qd".to_string(),
        }
    }
}

/// Configuration for a scraping run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// CSV of make/model/year combinations to search for
    pub reference_table: PathBuf,

    /// JSON file mapping saved images to their source URLs
    pub index_path: PathBuf,

    /// Search URL with `{q}` placeholders
    pub search_url_template: String,

    /// Page selectors
    pub selectors: Selectors,

    /// Pause after each scroll or click, in milliseconds
    pub interaction_delay_ms: u64,

    /// Pause when a pass revealed no new thumbnails, in seconds
    pub stall_delay_secs: u64,

    /// Wall-clock ceiling for one search session, in seconds
    pub session_timeout_secs: u64,

    /// Deadline for a single image download, in seconds
    pub fetch_timeout_secs: u64,

    /// JPEG quality for re-encoded images (1-100)
    pub jpeg_quality: u8,

    /// Whether to skip TLS certificate validation for image downloads
    pub accept_invalid_certs: bool,

    /// Run the browser without a visible window
    pub headless: bool,

    /// Hold a sleep inhibitor for the duration of the run
    pub keep_awake: bool,

    /// Draw a progress bar over the worklist
    pub show_progress: bool,

    /// Log level
    pub log_level: LogLevel,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            reference_table: PathBuf::from("./data/make_model_database_mod.csv"),
            index_path: PathBuf::from("./results/image_sources.json"),
            search_url_template: DEFAULT_SEARCH_URL.to_string(),
            selectors: Selectors::default(),
            interaction_delay_ms: 100,
            stall_delay_secs: 20,
            session_timeout_secs: 5 * 60,
            fetch_timeout_secs: 2,
            jpeg_quality: 85,
            accept_invalid_certs: true,
            headless: false,
            keep_awake: true,
            show_progress: true,
            log_level: LogLevel::Info,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)
            .map_err(|e| Error::Configuration(format!("Failed to open config file: {}", e)))?;

        let config: Config = serde_json::from_reader(file)
            .map_err(|e| Error::Configuration(format!("Failed to parse config file: {}", e)))?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)
            .map_err(|e| Error::Configuration(format!("Failed to create config file: {}", e)))?;

        serde_json::to_writer_pretty(file, self)
            .map_err(|e| Error::Configuration(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !self.search_url_template.contains("{q}") {
            return Err(Error::Configuration(
                "Search URL template must contain a {q} placeholder".to_string(),
            ));
        }

        if self.jpeg_quality == 0 || self.jpeg_quality > 100 {
            return Err(Error::Configuration(
                "JPEG quality must be between 1 and 100".to_string(),
            ));
        }

        if self.fetch_timeout_secs == 0 {
            return Err(Error::Configuration(
                "Fetch timeout must be at least one second".to_string(),
            ));
        }

        let selectors = [
            ("thumbnail", &self.selectors.thumbnail),
            ("full_image", &self.selectors.full_image),
            ("end_of_results", &self.selectors.end_of_results),
            ("load_more", &self.selectors.load_more),
        ];
        for (name, value) in selectors {
            if value.trim().is_empty() {
                return Err(Error::Configuration(format!(
                    "Selector '{}' must not be empty",
                    name
                )));
            }
        }

        Ok(())
    }

    pub fn interaction_delay(&self) -> Duration {
        Duration::from_millis(self.interaction_delay_ms)
    }

    pub fn stall_delay(&self) -> Duration {
        Duration::from_secs(self.stall_delay_secs)
    }

    pub fn session_timeout(&self) -> Duration {
        Duration::from_secs(self.session_timeout_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_template_without_placeholder() {
        let config = Config {
            search_url_template: "https://example.com/search".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_validate_rejects_bad_quality() {
        let config = Config {
            jpeg_quality: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            jpeg_quality: 101,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_selector() {
        let mut config = Config::default();
        config.selectors.load_more = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scraper.json");

        let mut config = Config::default();
        config.jpeg_quality = 70;
        config.headless = true;
        config.save_to_file(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.jpeg_quality, 70);
        assert!(loaded.headless);
        assert_eq!(loaded.selectors, Selectors::default());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("partial.json");
        std::fs::write(&path, r#"{ "stall_delay_secs": 3, "selectors": { "thumbnail": "img.t" } }"#)
            .unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.stall_delay_secs, 3);
        assert_eq!(loaded.selectors.thumbnail, "img.t");
        assert_eq!(loaded.selectors.load_more, ".mye4qd");
        assert_eq!(loaded.fetch_timeout_secs, 2);
    }
}
