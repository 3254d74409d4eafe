//! IP geolocation backed by the ip-api.com JSON endpoint

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

use super::{GEOLOCATION_SERVICE, GeoLocator};
use crate::config::GeolocationConfig;
use crate::models::Coordinates;
use crate::{Result, WeatherError};

/// ip-api.com client
pub struct IpApiClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lon: Option<f64>,
}

impl IpApiClient {
    pub fn new(config: &GeolocationConfig) -> Result<Self> {
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

    fn lookup_url(&self, address: &str) -> String {
        format!(
            "{}/json/{}?fields=status,message,lat,lon",
            self.base_url,
            urlencoding::encode(address)
        )
    }
}

impl IpApiResponse {
    fn into_coordinates(self, address: &str) -> Result<Coordinates> {
        if self.status != "success" {
            let reason = self.message.unwrap_or_else(|| self.status.clone());
            return Err(WeatherError::upstream(
                GEOLOCATION_SERVICE,
                format!("cannot locate {address}: {reason}"),
            ));
        }

        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Coordinates::new(lat, lon).validated().map_err(|e| {
                WeatherError::upstream(GEOLOCATION_SERVICE, e.to_string())
            }),
            _ => Err(WeatherError::upstream(
                GEOLOCATION_SERVICE,
                format!("no position returned for {address}"),
            )),
        }
    }
}

#[async_trait]
impl GeoLocator for IpApiClient {
    #[instrument(skip(self))]
    async fn locate(&self, address: &str) -> Result<Coordinates> {
        let url = self.lookup_url(address);
        debug!("Geolocation request URL: {}", url);

        let response = self.client.get(&url).send().await.map_err(|e| {
            WeatherError::upstream(GEOLOCATION_SERVICE, format!("request failed: {e}"))
        })?;

        if !response.status().is_success() {
            return Err(WeatherError::upstream(
                GEOLOCATION_SERVICE,
                format!("ip-api error {}", response.status()),
            ));
        }

        let body: IpApiResponse = response.json().await.map_err(|e| {
            WeatherError::upstream(
                GEOLOCATION_SERVICE,
                format!("Failed to parse ip-api response: {e}"),
            )
        })?;

        body.into_coordinates(address)
    }
}
