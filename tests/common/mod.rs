//! Fake collaborators and app wiring shared by the integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::Response;
use chrono::Utc;
use tokio::sync::Barrier;

use minimalweather::clients::{CityDirectory, GeoLocator, WeatherProvider};
use minimalweather::web::{self, AppState};
use minimalweather::{
    AggregationPipeline, City, CityLookup, Coordinates, LocationResolver, ResponseRenderer,
    Weather, WeatherError, WeatherLookup,
};

pub const DEFAULT_LOCATION: Coordinates = Coordinates {
    latitude: 51.5074,
    longitude: -0.1278,
};

pub fn template_path() -> String {
    format!("{}/website/index.html", env!("CARGO_MANIFEST_DIR"))
}

pub fn assets_dir() -> String {
    format!("{}/website/assets", env!("CARGO_MANIFEST_DIR"))
}

/// City directory that knows a few names and names every point after itself
#[derive(Default)]
pub struct FakeDirectory {
    pub named: HashMap<String, City>,
    pub by_name_calls: AtomicUsize,
    pub by_coords_calls: AtomicUsize,
    /// Delay for by-coordinates answers, in milliseconds per degree of latitude
    pub delay_per_degree_ms: u64,
    pub barrier: Option<Arc<Barrier>>,
}

impl FakeDirectory {
    pub fn with_cities(cities: Vec<City>) -> Self {
        Self {
            named: cities
                .into_iter()
                .map(|city| (city.name.to_lowercase(), city))
                .collect(),
            ..Default::default()
        }
    }
}

pub fn city_at(coordinates: Coordinates) -> City {
    City::new(
        format!(
            "city@{:.4},{:.4}",
            coordinates.latitude, coordinates.longitude
        ),
        coordinates,
    )
}

#[async_trait]
impl CityDirectory for FakeDirectory {
    async fn find_by_name(&self, name: &str) -> minimalweather::Result<Option<City>> {
        self.by_name_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.named.get(&name.to_lowercase()).cloned())
    }

    async fn find_nearest(&self, coordinates: Coordinates) -> minimalweather::Result<City> {
        self.by_coords_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(barrier) = &self.barrier {
            barrier.wait().await;
        }
        if self.delay_per_degree_ms > 0 {
            let millis = coordinates.latitude.abs() as u64 * self.delay_per_degree_ms;
            tokio::time::sleep(Duration::from_millis(millis)).await;
        }
        Ok(city_at(coordinates))
    }
}

/// Weather provider echoing the requested point back
pub struct FakeWeather {
    pub temperature: Option<f64>,
    pub calls: AtomicUsize,
    pub seen: Mutex<Vec<Coordinates>>,
    pub barrier: Option<Arc<Barrier>>,
    pub hang: bool,
}

impl Default for FakeWeather {
    fn default() -> Self {
        Self {
            temperature: None,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
            barrier: None,
            hang: false,
        }
    }
}

impl FakeWeather {
    pub fn with_temperature(temperature: f64) -> Self {
        Self {
            temperature: Some(temperature),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WeatherProvider for FakeWeather {
    async fn current_weather(&self, coordinates: Coordinates) -> minimalweather::Result<Weather> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(coordinates);
        if let Some(barrier) = &self.barrier {
            barrier.wait().await;
        }
        if self.hang {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        Ok(Weather {
            coordinates,
            temperature: self.temperature.unwrap_or(coordinates.latitude),
            conditions: "Partly cloudy".to_string(),
            weather_code: 2,
            humidity: Some(50),
            wind_speed: Some(10.0),
            wind_direction: Some(180),
            observed_at: Utc::now(),
        })
    }
}

/// Geolocation that answers every address with the same point, or fails
pub struct FakeLocator {
    pub answer: Option<Coordinates>,
    pub calls: AtomicUsize,
    pub addresses: Mutex<Vec<String>>,
}

impl FakeLocator {
    pub fn answering(answer: Option<Coordinates>) -> Self {
        Self {
            answer,
            calls: AtomicUsize::new(0),
            addresses: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GeoLocator for FakeLocator {
    async fn locate(&self, address: &str) -> minimalweather::Result<Coordinates> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.addresses.lock().unwrap().push(address.to_string());
        self.answer.ok_or_else(|| {
            WeatherError::upstream("geolocation service", format!("cannot locate {address}"))
        })
    }
}

pub struct TestApp {
    pub router: Router,
    pub directory: Arc<FakeDirectory>,
    pub weather: Arc<FakeWeather>,
    pub locator: Arc<FakeLocator>,
}

pub fn app(directory: FakeDirectory, weather: FakeWeather, locator: FakeLocator) -> TestApp {
    app_with(directory, weather, locator, Duration::from_secs(2), template_path())
}

pub fn app_with(
    directory: FakeDirectory,
    weather: FakeWeather,
    locator: FakeLocator,
    limit: Duration,
    template: String,
) -> TestApp {
    let directory = Arc::new(directory);
    let weather = Arc::new(weather);
    let locator = Arc::new(locator);

    let state = AppState {
        resolver: Arc::new(LocationResolver::new(
            locator.clone(),
            DEFAULT_LOCATION,
            limit,
        )),
        pipeline: AggregationPipeline::new(
            CityLookup::new(directory.clone(), limit),
            WeatherLookup::new(weather.clone(), limit),
        ),
        renderer: Arc::new(ResponseRenderer::new(template)),
    };

    TestApp {
        router: web::router(state, assets_dir()),
        directory,
        weather,
        locator,
    }
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
