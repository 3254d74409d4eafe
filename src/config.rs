//! Configuration management for the minimalweather service
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::WeatherError;
use crate::models::Coordinates;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure for the minimalweather service
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MinimalWeatherConfig {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Weather provider settings
    #[serde(default)]
    pub weather: WeatherConfig,
    /// IP geolocation settings
    #[serde(default)]
    pub geolocation: GeolocationConfig,
    /// City directory settings
    #[serde(default)]
    pub cities: CitiesConfig,
    /// Page template and static assets
    #[serde(default)]
    pub web: WebConfig,
    /// Bounded wait for collaborator lookups
    #[serde(default)]
    pub lookups: LookupConfig,
    /// Location used when a visitor cannot be located
    #[serde(default)]
    pub defaults: DefaultsConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    /// Upper bound for handling a single request, in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u32,
}

/// Weather API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Base URL for weather API
    #[serde(default = "default_weather_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_weather_timeout")]
    pub timeout_seconds: u32,
}

/// IP geolocation API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeolocationConfig {
    #[serde(default = "default_geolocation_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_geolocation_timeout")]
    pub timeout_seconds: u32,
}

/// City directory settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CitiesConfig {
    /// JSON file with the known cities
    #[serde(default = "default_cities_path")]
    pub path: String,
}

/// Page template and static asset locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_template_path")]
    pub template_path: String,
    /// Directory served under `/assets`
    #[serde(default = "default_assets_dir")]
    pub assets_dir: String,
}

/// Bounded wait applied to every collaborator lookup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupConfig {
    #[serde(default = "default_lookup_timeout")]
    pub timeout_seconds: u32,
}

/// Default location settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default = "default_latitude")]
    pub latitude: f64,
    #[serde(default = "default_longitude")]
    pub longitude: f64,
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

// Default value functions
fn default_server_host() -> String {
    "0.0.0.0".to_string()
}

fn default_server_port() -> u16 {
    8080
}

fn default_request_timeout() -> u32 {
    30
}

fn default_weather_base_url() -> String {
    "https://api.open-meteo.com/v1".to_string()
}

fn default_weather_timeout() -> u32 {
    10
}

fn default_geolocation_base_url() -> String {
    "http://ip-api.com".to_string()
}

fn default_geolocation_timeout() -> u32 {
    5
}

fn default_cities_path() -> String {
    "data/cities.json".to_string()
}

fn default_template_path() -> String {
    "website/index.html".to_string()
}

fn default_assets_dir() -> String {
    "website/assets".to_string()
}

fn default_lookup_timeout() -> u32 {
    15
}

fn default_latitude() -> f64 {
    51.5074
}

fn default_longitude() -> f64 {
    -0.1278
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: default_weather_base_url(),
            timeout_seconds: default_weather_timeout(),
        }
    }
}

impl Default for GeolocationConfig {
    fn default() -> Self {
        Self {
            base_url: default_geolocation_base_url(),
            timeout_seconds: default_geolocation_timeout(),
        }
    }
}

impl Default for CitiesConfig {
    fn default() -> Self {
        Self {
            path: default_cities_path(),
        }
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            template_path: default_template_path(),
            assets_dir: default_assets_dir(),
        }
    }
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_lookup_timeout(),
        }
    }
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            latitude: default_latitude(),
            longitude: default_longitude(),
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

impl LookupConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.into())
    }
}

impl DefaultsConfig {
    #[must_use]
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}

impl MinimalWeatherConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        // Load from file if path is provided or use default location
        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path()
                .filter(|path| path.exists())
                .unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // Add environment variable overrides, e.g. MINIMALWEATHER__SERVER__PORT
        builder = builder.add_source(
            Environment::with_prefix("MINIMALWEATHER")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: MinimalWeatherConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        // Apply defaults for missing values
        config.apply_defaults();

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("minimalweather").join("config.toml"))
    }

    /// Apply default values to empty configuration fields
    pub fn apply_defaults(&mut self) {
        if self.server.host.is_empty() {
            self.server.host = default_server_host();
        }
        if self.server.request_timeout_seconds == 0 {
            self.server.request_timeout_seconds = default_request_timeout();
        }
        if self.weather.base_url.is_empty() {
            self.weather.base_url = default_weather_base_url();
        }
        if self.weather.timeout_seconds == 0 {
            self.weather.timeout_seconds = default_weather_timeout();
        }
        if self.geolocation.base_url.is_empty() {
            self.geolocation.base_url = default_geolocation_base_url();
        }
        if self.geolocation.timeout_seconds == 0 {
            self.geolocation.timeout_seconds = default_geolocation_timeout();
        }
        if self.cities.path.is_empty() {
            self.cities.path = default_cities_path();
        }
        if self.web.template_path.is_empty() {
            self.web.template_path = default_template_path();
        }
        if self.web.assets_dir.is_empty() {
            self.web.assets_dir = default_assets_dir();
        }
        if self.lookups.timeout_seconds == 0 {
            self.lookups.timeout_seconds = default_lookup_timeout();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        let timeouts = [
            ("Request", self.server.request_timeout_seconds),
            ("Weather API", self.weather.timeout_seconds),
            ("Geolocation API", self.geolocation.timeout_seconds),
            ("Lookup", self.lookups.timeout_seconds),
        ];
        for (label, seconds) in timeouts {
            if seconds > 300 {
                return Err(
                    WeatherError::config(format!("{label} timeout cannot exceed 300 seconds"))
                        .into(),
                );
            }
        }

        if !self.defaults.coordinates().is_valid() {
            return Err(WeatherError::config(format!(
                "Default location {} is not a valid coordinate pair",
                self.defaults.coordinates().format_coordinates()
            ))
            .into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(WeatherError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(WeatherError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        for (label, url) in [
            ("Weather API", &self.weather.base_url),
            ("Geolocation API", &self.geolocation.base_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(WeatherError::config(format!(
                    "{label} base URL must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        Ok(())
    }
}
