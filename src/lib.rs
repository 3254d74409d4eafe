//! `minimalweather` - current weather near a city, a coordinate pair, or the visitor
//!
//! This library resolves where a request is about, looks up the nearest city
//! and the current weather concurrently, and renders the combined record as
//! JSON or as an HTML page.

pub mod clients;
pub mod config;
pub mod error;
pub mod location_resolver;
pub mod logging;
pub mod lookup;
pub mod models;
pub mod pipeline;
pub mod render;
pub mod web;

// Re-export core types for public API
pub use clients::{CityLookup, WeatherLookup};
pub use config::MinimalWeatherConfig;
pub use error::WeatherError;
pub use location_resolver::{LocationInput, LocationResolver, LocationSource, ResolvedLocation};
pub use lookup::Lookup;
pub use models::{City, CityWeather, Coordinates, Weather};
pub use pipeline::AggregationPipeline;
pub use render::ResponseRenderer;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, WeatherError>;
