//! City model for entries of the city directory

use serde::{Deserialize, Serialize};

use super::Coordinates;

/// A named place with its coordinates
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct City {
    /// City name
    pub name: String,
    /// Country code (ISO 3166-1 alpha-2)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    pub coordinates: Coordinates,
}

impl City {
    /// Create a new city
    #[must_use]
    pub fn new(name: impl Into<String>, coordinates: Coordinates) -> Self {
        Self {
            name: name.into(),
            country: None,
            coordinates,
        }
    }

    /// Create city with country
    #[must_use]
    pub fn with_country(
        name: impl Into<String>,
        country: impl Into<String>,
        coordinates: Coordinates,
    ) -> Self {
        Self {
            name: name.into(),
            country: Some(country.into()),
            coordinates,
        }
    }

    /// Name followed by the country code when one is known
    #[must_use]
    pub fn display_name(&self) -> String {
        match &self.country {
            Some(country) => format!("{}, {}", self.name, country),
            None => self.name.clone(),
        }
    }
}
