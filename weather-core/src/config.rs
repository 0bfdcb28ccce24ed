use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

use crate::{
    geolocation::PositionOptions,
    model::Coordinates,
    provider::DEFAULT_SEARCH_LIMIT,
    search::SearchOptions,
};

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";

/// Autocomplete tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Quiet time after the last keystroke before a search is sent.
    pub debounce_ms: u64,
    pub limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 100,
            limit: DEFAULT_SEARCH_LIMIT,
        }
    }
}

/// Position lookup settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeolocationConfig {
    pub timeout_ms: u64,
    pub enable_high_accuracy: bool,
    pub maximum_age_ms: u64,

    /// Fixed "home" position. Without it this machine has no location source.
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl Default for GeolocationConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 5000,
            enable_high_accuracy: false,
            maximum_age_ms: 0,
            latitude: None,
            longitude: None,
        }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_url = "http://localhost:8000/api"
///
/// [search]
/// debounce_ms = 100
/// limit = 5
///
/// [geolocation]
/// timeout_ms = 5000
/// latitude = 48.8566
/// longitude = 2.3522
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the weather backend, without the endpoint path.
    pub api_url: String,
    pub search: SearchConfig,
    pub geolocation: GeolocationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            search: SearchConfig::default(),
            geolocation: GeolocationConfig::default(),
        }
    }
}

impl Config {
    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let cfg: Config = toml::from_str(contents)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.validate()?;
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("dev", "weather-task", "weather-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    /// Directory holding persisted client data (the favorite slot).
    pub fn data_dir() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.data_dir().to_path_buf())
    }

    pub fn validate(&self) -> Result<()> {
        let url = self.api_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(anyhow!(
                "Invalid api_url '{}': expected an http:// or https:// URL",
                self.api_url
            ));
        }

        if self.search.limit == 0 {
            return Err(anyhow!("search.limit must be at least 1"));
        }

        if self.geolocation.latitude.is_some() != self.geolocation.longitude.is_some() {
            return Err(anyhow!(
                "geolocation.latitude and geolocation.longitude must be set together"
            ));
        }

        if let Some(home) = self.home_position() {
            if !(-90.0..=90.0).contains(&home.latitude) || !(-180.0..=180.0).contains(&home.longitude) {
                return Err(anyhow!(
                    "Home position ({}, {}) is out of range",
                    home.latitude,
                    home.longitude
                ));
            }
        }

        Ok(())
    }

    pub fn search_options(&self) -> SearchOptions {
        SearchOptions {
            debounce: Duration::from_millis(self.search.debounce_ms),
            limit: self.search.limit,
        }
    }

    pub fn position_options(&self) -> PositionOptions {
        PositionOptions {
            enable_high_accuracy: self.geolocation.enable_high_accuracy,
            timeout: self.geolocation_timeout(),
            maximum_age: Duration::from_millis(self.geolocation.maximum_age_ms),
        }
    }

    pub fn geolocation_timeout(&self) -> Duration {
        Duration::from_millis(self.geolocation.timeout_ms)
    }

    pub fn home_position(&self) -> Option<Coordinates> {
        match (self.geolocation.latitude, self.geolocation.longitude) {
            (Some(lat), Some(lon)) => Some(Coordinates::new(lat, lon)),
            _ => None,
        }
    }

    pub fn set_home_position(&mut self, home: Option<Coordinates>) {
        self.geolocation.latitude = home.map(|c| c.latitude);
        self.geolocation.longitude = home.map(|c| c.longitude);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let cfg = Config::from_toml("").expect("empty config is valid");
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.api_url, DEFAULT_API_URL);
        assert_eq!(cfg.search_options().debounce, Duration::from_millis(100));
        assert_eq!(cfg.search_options().limit, 5);
        assert_eq!(cfg.geolocation_timeout(), Duration::from_secs(5));
        assert!(cfg.home_position().is_none());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = Config::from_toml(
            r#"
            api_url = "https://weather.example.com/api"

            [search]
            debounce_ms = 300
            "#,
        )
        .unwrap();

        assert_eq!(cfg.api_url, "https://weather.example.com/api");
        assert_eq!(cfg.search.debounce_ms, 300);
        assert_eq!(cfg.search.limit, 5);
        assert_eq!(cfg.geolocation, GeolocationConfig::default());
    }

    #[test]
    fn rejects_non_http_url() {
        let err = Config::from_toml(r#"api_url = "ftp://example.com""#).unwrap_err();
        assert!(err.to_string().contains("Invalid api_url"));
    }

    #[test]
    fn rejects_half_configured_home_position() {
        let err = Config::from_toml(
            r#"
            [geolocation]
            latitude = 48.85
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("must be set together"));
    }

    #[test]
    fn rejects_out_of_range_home_position() {
        let mut cfg = Config::default();
        cfg.set_home_position(Some(Coordinates::new(123.0, 0.0)));
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn home_position_roundtrip_through_toml() {
        let mut cfg = Config::default();
        cfg.set_home_position(Some(Coordinates::new(48.8566, 2.3522)));
        cfg.geolocation.enable_high_accuracy = true;

        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed = Config::from_toml(&toml).unwrap();

        assert_eq!(parsed.home_position(), Some(Coordinates::new(48.8566, 2.3522)));
        assert!(parsed.position_options().enable_high_accuracy);

        let mut cleared = parsed.clone();
        cleared.set_home_position(None);
        assert!(cleared.home_position().is_none());
    }
}
