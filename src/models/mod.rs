//! Data models for the minimalweather service
//!
//! This module contains the core value types organized by concern:
//! - Coordinates: Geographic points and the location cache token
//! - City: Entries of the city directory
//! - Weather: Current conditions and the combined city/weather record

pub mod city;
pub mod coordinates;
pub mod weather;

// Re-export all public types for convenient access
pub use city::City;
pub use coordinates::Coordinates;
pub use weather::{CityWeather, Weather};
