//! In-memory city directory
//!
//! Loads a JSON array of cities once at startup and answers name and
//! nearest-point queries from memory.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, instrument};

use super::{CITY_DIRECTORY, CityDirectory};
use crate::models::{City, Coordinates};
use crate::{Result, WeatherError};

/// One entry of the city data file
#[derive(Debug, Deserialize)]
struct CityRecord {
    name: String,
    #[serde(default)]
    country: Option<String>,
    latitude: f64,
    longitude: f64,
}

impl From<CityRecord> for City {
    fn from(record: CityRecord) -> Self {
        City {
            name: record.name,
            country: record.country,
            coordinates: Coordinates::new(record.latitude, record.longitude),
        }
    }
}

/// City directory held entirely in memory
pub struct StaticCityDirectory {
    cities: Vec<City>,
    by_name: HashMap<String, usize>,
}

fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

impl StaticCityDirectory {
    /// Build a directory from a list of cities; on duplicate names the first one wins
    #[must_use]
    pub fn new(cities: Vec<City>) -> Self {
        let mut by_name = HashMap::with_capacity(cities.len());
        for (index, city) in cities.iter().enumerate() {
            by_name.entry(name_key(&city.name)).or_insert(index);
        }
        Self { cities, by_name }
    }

    /// Load a directory from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let directory = Self::from_json(&raw).map_err(|e| {
            WeatherError::config(format!("City data file {}: {e}", path.display()))
        })?;
        info!(
            "Loaded {} cities from {}",
            directory.len(),
            path.display()
        );
        Ok(directory)
    }

    /// Parse a directory from the JSON file format
    pub fn from_json(raw: &str) -> Result<Self> {
        let records: Vec<CityRecord> = serde_json::from_str(raw)
            .map_err(|e| WeatherError::config(format!("invalid city data: {e}")))?;

        let cities: Vec<City> = records.into_iter().map(City::from).collect();
        if cities.is_empty() {
            return Err(WeatherError::config("city data contains no cities"));
        }
        if let Some(city) = cities.iter().find(|c| !c.coordinates.is_valid()) {
            return Err(WeatherError::config(format!(
                "city '{}' has invalid coordinates {}",
                city.name,
                city.coordinates.format_coordinates()
            )));
        }

        Ok(Self::new(cities))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }

    fn nearest(&self, center: &Coordinates) -> Option<(&City, f64)> {
        self.cities
            .iter()
            .map(|city| (city, center.distance_km(&city.coordinates)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }
}

#[async_trait]
impl CityDirectory for StaticCityDirectory {
    #[instrument(skip(self))]
    async fn find_by_name(&self, name: &str) -> Result<Option<City>> {
        let city = self
            .by_name
            .get(&name_key(name))
            .map(|&index| self.cities[index].clone());
        debug!("City lookup for '{}': {}", name, city.is_some());
        Ok(city)
    }

    #[instrument(skip(self))]
    async fn find_nearest(&self, coordinates: Coordinates) -> Result<City> {
        let (city, distance_km) = self
            .nearest(&coordinates)
            .ok_or_else(|| WeatherError::upstream(CITY_DIRECTORY, "directory is empty"))?;
        debug!("Nearest city is {} ({:.1}km away)", city.name, distance_km);
        Ok(city.clone())
    }
}
