//! Collaborator interfaces and the lookup adapters built on them
//!
//! The service depends on three external collaborators:
//! - a city directory, queried by name or by nearest coordinates
//! - a weather provider, queried by coordinates
//! - an IP geolocation service
//!
//! Each is consumed through a trait so the pipeline can run against fakes.
//! [`CityLookup`] and [`WeatherLookup`] wrap the first two and turn every call
//! into an already-running [`Lookup`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::Result;
use crate::lookup::Lookup;
use crate::models::{City, Coordinates, Weather};

pub mod city_directory;
pub mod ip_api;
pub mod open_meteo;

pub use city_directory::StaticCityDirectory;
pub use ip_api::IpApiClient;
pub use open_meteo::OpenMeteoClient;

pub const CITY_DIRECTORY: &str = "city directory";
pub const WEATHER_PROVIDER: &str = "weather provider";
pub const GEOLOCATION_SERVICE: &str = "geolocation service";

/// Directory of known cities
#[async_trait]
pub trait CityDirectory: Send + Sync {
    /// Find a city by its name, `None` when no city matches
    async fn find_by_name(&self, name: &str) -> Result<Option<City>>;

    /// Find the known city closest to `coordinates`
    async fn find_nearest(&self, coordinates: Coordinates) -> Result<City>;
}

/// Source of current weather conditions
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn current_weather(&self, coordinates: Coordinates) -> Result<Weather>;
}

/// Resolves a network address to an approximate position
#[async_trait]
pub trait GeoLocator: Send + Sync {
    async fn locate(&self, address: &str) -> Result<Coordinates>;
}

/// Issues city directory queries as independent lookups
#[derive(Clone)]
pub struct CityLookup {
    directory: Arc<dyn CityDirectory>,
    limit: Duration,
}

impl CityLookup {
    pub fn new(directory: Arc<dyn CityDirectory>, limit: Duration) -> Self {
        Self { directory, limit }
    }

    /// Look up a city by name; resolves to `NotFound` when no city matches
    pub fn find_by_name(&self, name: &str) -> Lookup<City> {
        let directory = Arc::clone(&self.directory);
        let name = name.to_string();
        Lookup::spawn(CITY_DIRECTORY, self.limit, async move {
            directory
                .find_by_name(&name)
                .await?
                .ok_or_else(|| crate::WeatherError::not_found(name))
        })
    }

    /// Look up the city nearest to `coordinates`
    pub fn find_by_coords(&self, coordinates: Coordinates) -> Lookup<City> {
        let directory = Arc::clone(&self.directory);
        Lookup::spawn(CITY_DIRECTORY, self.limit, async move {
            directory.find_nearest(coordinates).await
        })
    }
}

/// Issues weather provider queries as independent lookups
#[derive(Clone)]
pub struct WeatherLookup {
    provider: Arc<dyn WeatherProvider>,
    limit: Duration,
}

impl WeatherLookup {
    pub fn new(provider: Arc<dyn WeatherProvider>, limit: Duration) -> Self {
        Self { provider, limit }
    }

    pub fn get_weather(&self, coordinates: Coordinates) -> Lookup<Weather> {
        let provider = Arc::clone(&self.provider);
        Lookup::spawn(WEATHER_PROVIDER, self.limit, async move {
            provider.current_weather(coordinates).await
        })
    }
}
