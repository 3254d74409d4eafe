//! Coordinates model and the location cache token format

use haversine::{Location as HaversineLocation, Units, distance};
use serde::{Deserialize, Serialize};

use crate::{Result, WeatherError};

/// Separator between latitude and longitude in the location cache token
const TOKEN_SEPARATOR: char = '|';

/// A point on Earth
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Coordinates {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
}

impl Coordinates {
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Whether both components are finite and within their geographic range
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Return these coordinates, or a `MalformedInput` error when out of range
    pub fn validated(self) -> Result<Self> {
        if self.is_valid() {
            Ok(self)
        } else {
            Err(WeatherError::malformed(format!(
                "coordinates out of range: {}",
                self.format_coordinates()
            )))
        }
    }

    /// Parse a latitude/longitude pair given as separate strings
    pub fn parse_pair(latitude: &str, longitude: &str) -> Result<Self> {
        let latitude = parse_component("latitude", latitude)?;
        let longitude = parse_component("longitude", longitude)?;
        Self::new(latitude, longitude).validated()
    }

    /// Encode as the `lat|lng` value stored in the location cookie
    #[must_use]
    pub fn to_cache_token(&self) -> String {
        format!(
            "{:.6}{TOKEN_SEPARATOR}{:.6}",
            self.latitude, self.longitude
        )
    }

    /// Decode a `lat|lng` location cookie value
    pub fn from_cache_token(token: &str) -> Result<Self> {
        let (latitude, longitude) = token.split_once(TOKEN_SEPARATOR).ok_or_else(|| {
            WeatherError::malformed(format!("location token '{token}' has no separator"))
        })?;
        Self::parse_pair(latitude, longitude)
    }

    /// Great-circle distance to another point in kilometers
    #[must_use]
    pub fn distance_km(&self, other: &Coordinates) -> f64 {
        distance(
            HaversineLocation {
                latitude: self.latitude,
                longitude: self.longitude,
            },
            HaversineLocation {
                latitude: other.latitude,
                longitude: other.longitude,
            },
            Units::Kilometers,
        )
    }

    /// Format as a human-readable coordinates string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

fn parse_component(label: &str, raw: &str) -> Result<f64> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| WeatherError::malformed(format!("{label} '{raw}' is not a number")))?;
    if !value.is_finite() {
        return Err(WeatherError::malformed(format!("{label} '{raw}' is not finite")));
    }
    Ok(value)
}
