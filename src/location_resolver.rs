//! Location Resolution Module
//!
//! This module decides which point drives the downstream lookups of a request.
//! Explicit city names and coordinates are used as given. For visitors of the
//! homepage the location cookie is tried first, then IP geolocation, then the
//! configured default location.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderMap;
use axum::http::header::COOKIE;
use tracing::{debug, info, instrument, warn};

use crate::Result;
use crate::clients::{GEOLOCATION_SERVICE, GeoLocator};
use crate::lookup::Lookup;
use crate::models::Coordinates;

/// Name of the cookie caching a visitor's coordinates
pub const LOCATION_COOKIE: &str = "mw-location";

/// Types of location input
#[derive(Debug, Clone, PartialEq)]
pub enum LocationInput {
    /// Explicit city name
    Name(String),
    /// Explicit coordinates
    Coordinates(Coordinates),
    /// Homepage visitor with an optional cached token and network address
    Visitor {
        cached: Option<String>,
        address: Option<String>,
    },
}

/// Where resolved coordinates came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationSource {
    Explicit,
    Cache,
    Geolocation,
    Default,
}

/// Outcome of location resolution
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedLocation {
    /// Coordinates are derived from the city lookup itself
    ByName(String),
    At {
        coordinates: Coordinates,
        source: LocationSource,
    },
}

impl ResolvedLocation {
    /// Coordinates the visitor's location cookie should be set to, if any
    #[must_use]
    pub fn cacheable_coordinates(&self) -> Option<Coordinates> {
        match self {
            ResolvedLocation::At {
                coordinates,
                source: LocationSource::Cache | LocationSource::Geolocation,
            } => Some(*coordinates),
            _ => None,
        }
    }
}

/// Service for resolving location inputs
pub struct LocationResolver {
    geolocator: Arc<dyn GeoLocator>,
    default_location: Coordinates,
    limit: Duration,
}

impl LocationResolver {
    pub fn new(
        geolocator: Arc<dyn GeoLocator>,
        default_location: Coordinates,
        limit: Duration,
    ) -> Self {
        Self {
            geolocator,
            default_location,
            limit,
        }
    }

    /// Resolve a location input into the location that drives the lookups
    pub async fn resolve_location(&self, input: LocationInput) -> Result<ResolvedLocation> {
        debug!("Resolving location input: {:?}", input);

        let location = match input {
            LocationInput::Name(name) => ResolvedLocation::ByName(name),
            LocationInput::Coordinates(coordinates) => ResolvedLocation::At {
                coordinates: coordinates.validated()?,
                source: LocationSource::Explicit,
            },
            LocationInput::Visitor { cached, address } => {
                self.resolve_visitor(cached.as_deref(), address.as_deref())
                    .await
            }
        };

        debug!("Resolved location: {:?}", location);
        Ok(location)
    }

    /// Cookie first, then geolocation, then the default location
    #[instrument(skip(self))]
    async fn resolve_visitor(
        &self,
        cached: Option<&str>,
        address: Option<&str>,
    ) -> ResolvedLocation {
        if let Some(token) = cached {
            match Coordinates::from_cache_token(token) {
                Ok(coordinates) => {
                    info!("Location from cookie cache");
                    return ResolvedLocation::At {
                        coordinates,
                        source: LocationSource::Cache,
                    };
                }
                Err(e) => warn!("Ignoring location cookie: {}", e),
            }
        }

        let Some(address) = address else {
            warn!("No client address known, using default location");
            return self.default_location();
        };

        info!("Location from geolocation of {}", address);
        match self.geolocate(address).await {
            Ok(coordinates) => ResolvedLocation::At {
                coordinates,
                source: LocationSource::Geolocation,
            },
            Err(e) => {
                warn!("Geolocation failed, using default location: {}", e);
                self.default_location()
            }
        }
    }

    fn geolocate(&self, address: &str) -> Lookup<Coordinates> {
        let geolocator = Arc::clone(&self.geolocator);
        let address = address.to_string();
        Lookup::spawn(GEOLOCATION_SERVICE, self.limit, async move {
            geolocator.locate(&address).await
        })
    }

    fn default_location(&self) -> ResolvedLocation {
        ResolvedLocation::At {
            coordinates: self.default_location,
            source: LocationSource::Default,
        }
    }
}

/// Value of the location cookie, if the request carries one
#[must_use]
pub fn location_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == LOCATION_COOKIE)
        .map(|(_, value)| value.trim_matches('"').to_string())
}

/// Network address of the client: `X-Real-Ip`, else the first `X-Forwarded-For`
/// entry, else the connection's remote address without its port
#[must_use]
pub fn client_address(headers: &HeaderMap, remote: Option<SocketAddr>) -> Option<String> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
    };

    if let Some(real_ip) = header("x-real-ip") {
        return Some(real_ip.to_string());
    }

    if let Some(first) = header("x-forwarded-for")
        .and_then(|list| list.split(',').next())
        .map(str::trim)
        .filter(|first| !first.is_empty())
    {
        return Some(first.to_string());
    }

    remote.map(|addr| addr.ip().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::WeatherError;
    use async_trait::async_trait;
    use axum::http::HeaderValue;
    use rstest::rstest;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedLocator {
        answer: Option<Coordinates>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl GeoLocator for FixedLocator {
        async fn locate(&self, address: &str) -> Result<Coordinates> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answer
                .ok_or_else(|| WeatherError::upstream(GEOLOCATION_SERVICE, address.to_string()))
        }
    }

    const DEFAULT: Coordinates = Coordinates {
        latitude: 51.5074,
        longitude: -0.1278,
    };

    fn build_resolver(answer: Option<Coordinates>) -> (LocationResolver, Arc<FixedLocator>) {
        let locator = Arc::new(FixedLocator {
            answer,
            calls: AtomicUsize::new(0),
        });
        let resolver = LocationResolver::new(locator.clone(), DEFAULT, Duration::from_secs(1));
        (resolver, locator)
    }

    fn visitor(cached: Option<&str>, address: Option<&str>) -> LocationInput {
        LocationInput::Visitor {
            cached: cached.map(str::to_string),
            address: address.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_valid_cookie_skips_geolocation() {
        let (resolver, locator) = build_resolver(Some(Coordinates::new(1.0, 2.0)));
        let resolved = resolver
            .resolve_location(visitor(Some("40.712800|-74.006000"), Some("8.8.8.8")))
            .await
            .unwrap();

        assert_eq!(
            resolved,
            ResolvedLocation::At {
                coordinates: Coordinates::new(40.7128, -74.006),
                source: LocationSource::Cache,
            }
        );
        assert_eq!(locator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_malformed_cookie_falls_back_to_geolocation() {
        let located = Coordinates::new(37.386, -122.0838);
        let (resolver, locator) = build_resolver(Some(located));
        let resolved = resolver
            .resolve_location(visitor(Some("garbage"), Some("8.8.8.8")))
            .await
            .unwrap();

        assert_eq!(resolved.cacheable_coordinates(), Some(located));
        assert_eq!(locator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_geolocation_uses_default() {
        let (resolver, locator) = build_resolver(None);
        let resolved = resolver
            .resolve_location(visitor(None, Some("10.0.0.1")))
            .await
            .unwrap();

        assert_eq!(
            resolved,
            ResolvedLocation::At {
                coordinates: DEFAULT,
                source: LocationSource::Default,
            }
        );
        assert_eq!(resolved.cacheable_coordinates(), None);
        assert_eq!(locator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_address_uses_default() {
        let (resolver, locator) = build_resolver(Some(Coordinates::new(1.0, 2.0)));
        let resolved = resolver.resolve_location(visitor(None, None)).await.unwrap();
        assert!(matches!(
            resolved,
            ResolvedLocation::At {
                source: LocationSource::Default,
                ..
            }
        ));
        assert_eq!(locator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_explicit_inputs_bypass_cache_and_geolocation() {
        let (resolver, locator) = build_resolver(Some(Coordinates::new(1.0, 2.0)));

        let by_name = resolver
            .resolve_location(LocationInput::Name("Oslo".to_string()))
            .await
            .unwrap();
        assert_eq!(by_name, ResolvedLocation::ByName("Oslo".to_string()));
        assert_eq!(by_name.cacheable_coordinates(), None);

        let coords = Coordinates::new(59.9139, 10.7522);
        let explicit = resolver
            .resolve_location(LocationInput::Coordinates(coords))
            .await
            .unwrap();
        assert_eq!(
            explicit,
            ResolvedLocation::At {
                coordinates: coords,
                source: LocationSource::Explicit,
            }
        );
        assert_eq!(explicit.cacheable_coordinates(), None);
        assert_eq!(locator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_explicit_out_of_range_coordinates_rejected() {
        let (resolver, _) = build_resolver(None);
        let err = resolver
            .resolve_location(LocationInput::Coordinates(Coordinates::new(91.0, 0.0)))
            .await
            .unwrap_err();
        assert!(matches!(err, WeatherError::MalformedInput { .. }));
    }

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[rstest]
    #[case(&[("x-real-ip", "1.1.1.1"), ("x-forwarded-for", "2.2.2.2")], Some("1.1.1.1"))]
    #[case(&[("x-forwarded-for", " 2.2.2.2 , 3.3.3.3")], Some("2.2.2.2"))]
    #[case(&[("x-real-ip", "  "), ("x-forwarded-for", "2.2.2.2")], Some("2.2.2.2"))]
    #[case(&[("x-forwarded-for", "")], Some("192.0.2.7"))]
    #[case(&[], Some("192.0.2.7"))]
    fn test_client_address_precedence(
        #[case] pairs: &[(&'static str, &'static str)],
        #[case] expected: Option<&str>,
    ) {
        let remote: SocketAddr = "192.0.2.7:51234".parse().unwrap();
        assert_eq!(
            client_address(&headers(pairs), Some(remote)).as_deref(),
            expected
        );
    }

    #[test]
    fn test_client_address_strips_ipv6_port() {
        let remote: SocketAddr = "[2001:db8::1]:8080".parse().unwrap();
        assert_eq!(
            client_address(&HeaderMap::new(), Some(remote)).as_deref(),
            Some("2001:db8::1")
        );
        assert_eq!(client_address(&HeaderMap::new(), None), None);
    }

    #[rstest]
    #[case(&[("cookie", "mw-location=40.712800|-74.006000")], Some("40.712800|-74.006000"))]
    #[case(&[("cookie", "theme=dark; mw-location=1.000000|2.000000; lang=en")], Some("1.000000|2.000000"))]
    #[case(&[("cookie", "theme=dark"), ("cookie", "mw-location=\"3|4\"")], Some("3|4"))]
    #[case(&[("cookie", "mw-locationx=1|2")], None)]
    #[case(&[], None)]
    fn test_location_token(
        #[case] pairs: &[(&'static str, &'static str)],
        #[case] expected: Option<&str>,
    ) {
        assert_eq!(location_token(&headers(pairs)).as_deref(), expected);
    }
}
