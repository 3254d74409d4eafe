//! Weather model and the combined city/weather record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{City, Coordinates};

/// Current conditions at a point
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Weather {
    /// Point the provider was queried for
    pub coordinates: Coordinates,
    /// Temperature in Celsius
    pub temperature: f64,
    /// Human-readable description of weather conditions
    pub conditions: String,
    /// WMO weather interpretation code
    pub weather_code: u8,
    /// Relative humidity percentage (0-100)
    #[serde(default)]
    pub humidity: Option<u8>,
    /// Wind speed in km/h
    #[serde(default)]
    pub wind_speed: Option<f64>,
    /// Wind direction in degrees (0-360, where 0/360 is North)
    #[serde(default)]
    pub wind_direction: Option<u16>,
    /// When the provider observed these conditions
    pub observed_at: DateTime<Utc>,
}

impl Weather {
    /// Convert wind direction from degrees to cardinal direction
    #[must_use]
    pub fn wind_direction_to_cardinal(degrees: u16) -> &'static str {
        match degrees {
            0..=11 | 349..=360 => "N",
            12..=33 => "NNE",
            34..=56 => "NE",
            57..=78 => "ENE",
            79..=101 => "E",
            102..=123 => "ESE",
            124..=146 => "SE",
            147..=168 => "SSE",
            169..=191 => "S",
            192..=213 => "SSW",
            214..=236 => "SW",
            237..=258 => "WSW",
            259..=281 => "W",
            282..=303 => "WNW",
            304..=326 => "NW",
            327..=348 => "NNW",
            _ => "Unknown",
        }
    }

    /// Format wind information, empty when the provider reported none
    #[must_use]
    pub fn format_wind(&self) -> String {
        match (self.wind_speed, self.wind_direction) {
            (Some(speed), Some(direction)) => format!(
                "{:.0} km/h {}",
                speed,
                Self::wind_direction_to_cardinal(direction)
            ),
            (Some(speed), None) => format!("{speed:.0} km/h"),
            _ => String::new(),
        }
    }
}

/// City and weather of one request, as sent to clients
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CityWeather {
    pub city: City,
    pub weather: Weather,
}
