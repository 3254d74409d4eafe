//! Weather provider backed by the Open-Meteo forecast API
//!
//! Open-Meteo requires no API key; current conditions are requested through the
//! `current=` parameter of the forecast endpoint.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use super::{WEATHER_PROVIDER, WeatherProvider};
use crate::config::WeatherConfig;
use crate::models::{Coordinates, Weather};
use crate::{Result, WeatherError};

const CURRENT_FIELDS: &str =
    "temperature_2m,relative_humidity_2m,weather_code,wind_speed_10m,wind_direction_10m";

/// Open-Meteo API client
pub struct OpenMeteoClient {
    client: Client,
    base_url: String,
}

impl OpenMeteoClient {
    /// Create a new client
    pub fn new(config: &WeatherConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.into()))
            .user_agent(concat!("minimalweather/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| WeatherError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn current_url(&self, coordinates: &Coordinates) -> String {
        format!(
            "{}/forecast?latitude={}&longitude={}&current={}",
            self.base_url, coordinates.latitude, coordinates.longitude, CURRENT_FIELDS
        )
    }
}

#[async_trait]
impl WeatherProvider for OpenMeteoClient {
    #[instrument(skip(self))]
    async fn current_weather(&self, coordinates: Coordinates) -> Result<Weather> {
        let url = self.current_url(&coordinates);
        debug!("OpenMeteo API request URL: {}", url);
        let start_time = Instant::now();

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| WeatherError::upstream(WEATHER_PROVIDER, format!("request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(WeatherError::upstream(
                WEATHER_PROVIDER,
                format!("OpenMeteo API error {status}: {error_text}"),
            ));
        }

        let forecast: ForecastResponse = response.json().await.map_err(|e| {
            WeatherError::upstream(
                WEATHER_PROVIDER,
                format!("Failed to parse OpenMeteo response: {e}"),
            )
        })?;

        let total_duration = start_time.elapsed();
        if total_duration.as_secs() > 5 {
            warn!(
                "Slow API response detected: {:.3}s",
                total_duration.as_secs_f64()
            );
        }

        forecast.into_weather(coordinates)
    }
}

/// Forecast response from `OpenMeteo`, limited to the current block
#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current: Option<CurrentData>,
}

/// Current weather data from `OpenMeteo`
#[derive(Debug, Deserialize)]
struct CurrentData {
    time: String,
    #[serde(rename = "temperature_2m")]
    temperature: f64,
    #[serde(rename = "relative_humidity_2m")]
    humidity: Option<u8>,
    weather_code: u8,
    #[serde(rename = "wind_speed_10m")]
    wind_speed: Option<f64>,
    #[serde(rename = "wind_direction_10m")]
    wind_direction: Option<u16>,
}

impl ForecastResponse {
    fn into_weather(self, coordinates: Coordinates) -> Result<Weather> {
        let current = self.current.ok_or_else(|| {
            WeatherError::upstream(
                WEATHER_PROVIDER,
                format!(
                    "No current weather data available for {}",
                    coordinates.format_coordinates()
                ),
            )
        })?;

        let observed_at = NaiveDateTime::parse_from_str(&current.time, "%Y-%m-%dT%H:%M")
            .map_or_else(|_| Utc::now(), |dt| dt.and_utc());

        Ok(Weather {
            coordinates,
            temperature: current.temperature,
            conditions: weather_code_to_description(current.weather_code).to_string(),
            weather_code: current.weather_code,
            humidity: current.humidity,
            wind_speed: current.wind_speed,
            wind_direction: current.wind_direction,
            observed_at,
        })
    }
}

/// Convert a WMO weather code to a human-readable description
#[must_use]
pub fn weather_code_to_description(code: u8) -> &'static str {
    match code {
        0 => "Clear sky",
        1 => "Mainly clear",
        2 => "Partly cloudy",
        3 => "Overcast",
        45 => "Fog",
        48 => "Depositing rime fog",
        51 => "Light drizzle",
        53 => "Moderate drizzle",
        55 => "Dense drizzle",
        56 => "Light freezing drizzle",
        57 => "Dense freezing drizzle",
        61 => "Slight rain",
        63 => "Moderate rain",
        65 => "Heavy rain",
        66 => "Light freezing rain",
        67 => "Heavy freezing rain",
        71 => "Slight snow fall",
        73 => "Moderate snow fall",
        75 => "Heavy snow fall",
        77 => "Snow grains",
        80 => "Slight rain showers",
        81 => "Moderate rain showers",
        82 => "Violent rain showers",
        85 => "Slight snow showers",
        86 => "Heavy snow showers",
        95 => "Thunderstorm",
        96 => "Thunderstorm with slight hail",
        99 => "Thunderstorm with heavy hail",
        _ => "Unknown",
    }
}
