//! Aggregation of city and weather lookups into one record
//!
//! By-name requests are sequential: the weather lookup needs the coordinates
//! of the resolved city and is never issued when no city matches. Requests
//! with known coordinates issue both lookups before awaiting either and wait
//! for both to finish.

use tracing::{debug, info, instrument};

use crate::Result;
use crate::clients::{CityLookup, WeatherLookup};
use crate::location_resolver::ResolvedLocation;
use crate::models::{CityWeather, Coordinates};

/// Runs the lookups for one resolved location
#[derive(Clone)]
pub struct AggregationPipeline {
    cities: CityLookup,
    weather: WeatherLookup,
}

impl AggregationPipeline {
    pub fn new(cities: CityLookup, weather: WeatherLookup) -> Self {
        Self { cities, weather }
    }

    pub async fn run(&self, location: &ResolvedLocation) -> Result<CityWeather> {
        match location {
            ResolvedLocation::ByName(name) => self.by_name(name).await,
            ResolvedLocation::At { coordinates, .. } => self.by_coordinates(*coordinates).await,
        }
    }

    /// City first, then the weather at the city's coordinates
    #[instrument(skip(self))]
    pub async fn by_name(&self, name: &str) -> Result<CityWeather> {
        info!("By name: {}", name);

        let city = self.cities.find_by_name(name).await?;
        debug!(
            "Resolved '{}' to {} at {}",
            name,
            city.display_name(),
            city.coordinates.format_coordinates()
        );

        let weather = self.weather.get_weather(city.coordinates).await?;
        Ok(CityWeather { city, weather })
    }

    /// Nearest city and weather for the same coordinates, looked up concurrently
    #[instrument(skip(self))]
    pub async fn by_coordinates(&self, coordinates: Coordinates) -> Result<CityWeather> {
        info!("By coordinates: {}", coordinates.format_coordinates());

        let city = self.cities.find_by_coords(coordinates);
        let weather = self.weather.get_weather(coordinates);

        let (city, weather) = tokio::join!(city.into_future(), weather.into_future());
        Ok(CityWeather {
            city: city?,
            weather: weather?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::WeatherError;
    use crate::clients::{CityDirectory, StaticCityDirectory, WeatherProvider};
    use crate::location_resolver::LocationSource;
    use crate::models::{City, Weather};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct EchoWeather {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl WeatherProvider for EchoWeather {
        async fn current_weather(&self, coordinates: Coordinates) -> Result<Weather> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(WeatherError::upstream("weather provider", "HTTP 503"));
            }
            Ok(Weather {
                coordinates,
                temperature: coordinates.latitude / 4.0,
                conditions: "Overcast".to_string(),
                weather_code: 3,
                humidity: None,
                wind_speed: None,
                wind_direction: None,
                observed_at: Utc::now(),
            })
        }
    }

    fn build_pipeline(weather: Arc<EchoWeather>) -> AggregationPipeline {
        let directory: Arc<dyn CityDirectory> = Arc::new(StaticCityDirectory::new(vec![
            City::with_country("Oslo", "NO", Coordinates::new(59.9139, 10.7522)),
            City::with_country("Rome", "IT", Coordinates::new(41.9028, 12.4964)),
        ]));
        AggregationPipeline::new(
            CityLookup::new(directory, Duration::from_secs(1)),
            WeatherLookup::new(weather, Duration::from_secs(1)),
        )
    }

    #[tokio::test]
    async fn test_by_name_uses_city_coordinates() {
        let weather = Arc::new(EchoWeather::default());
        let record = build_pipeline(weather.clone()).by_name("oslo").await.unwrap();

        assert_eq!(record.city.name, "Oslo");
        assert_eq!(record.weather.coordinates, record.city.coordinates);
        assert_eq!(weather.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_by_name_not_found_skips_weather() {
        let weather = Arc::new(EchoWeather::default());
        let err = build_pipeline(weather.clone()).by_name("Atlantis").await.unwrap_err();

        assert!(matches!(err, WeatherError::NotFound { .. }));
        assert_eq!(weather.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_by_coordinates_queries_weather_at_requested_point() {
        let weather = Arc::new(EchoWeather::default());
        let point = Coordinates::new(43.0, 11.0);
        let record = build_pipeline(weather)
            .run(&ResolvedLocation::At {
                coordinates: point,
                source: LocationSource::Explicit,
            })
            .await
            .unwrap();

        assert_eq!(record.city.name, "Rome");
        assert_eq!(record.weather.coordinates, point);
    }

    #[tokio::test]
    async fn test_by_coordinates_surfaces_weather_failure() {
        let weather = Arc::new(EchoWeather {
            fail: true,
            ..Default::default()
        });
        let err = build_pipeline(weather)
            .by_coordinates(Coordinates::new(60.0, 10.0))
            .await
            .unwrap_err();
        assert!(matches!(err, WeatherError::Upstream { .. }));
    }

    #[tokio::test]
    async fn test_lookups_are_owned_per_run() {
        let pipeline = build_pipeline(Arc::new(EchoWeather::default()));
        let north = Coordinates::new(60.0, 10.0);
        let south = Coordinates::new(41.0, 12.0);

        let (a, b) = tokio::join!(
            pipeline.by_coordinates(north),
            pipeline.by_coordinates(south)
        );
        let (a, b) = (a.unwrap(), b.unwrap());
        assert_eq!((a.city.name.as_str(), a.weather.coordinates), ("Oslo", north));
        assert_eq!((b.city.name.as_str(), b.weather.coordinates), ("Rome", south));
    }
}
