use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::extract::{ConnectInfo, FromRequestParts, Path as UrlPath, State};
use axum::http::HeaderMap;
use axum::http::request::Parts;
use axum::response::Response;
use axum::{Router, routing::get};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::location_resolver::{
    LocationInput, LocationResolver, client_address, location_token,
};
use crate::models::Coordinates;
use crate::pipeline::AggregationPipeline;
use crate::render::ResponseRenderer;

/// Shared state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<LocationResolver>,
    pub pipeline: AggregationPipeline,
    pub renderer: Arc<ResponseRenderer>,
}

/// Network address of the caller, taken from proxy headers or the connection
pub struct ClientAddress(pub Option<String>);

impl<S: Send + Sync> FromRequestParts<S> for ClientAddress {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let remote = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        Ok(ClientAddress(client_address(&parts.headers, remote)))
    }
}

pub fn router(state: AppState, assets_dir: impl AsRef<Path>) -> Router {
    Router::new()
        .route("/", get(homepage))
        .route("/weather/{city}", get(weather_by_city))
        .route("/weather/{lat}/{lng}", get(weather_by_coords))
        .nest_service("/assets", ServeDir::new(assets_dir.as_ref()))
        .with_state(state)
}

/// GET /weather/{city}
async fn weather_by_city(
    State(state): State<AppState>,
    UrlPath(city): UrlPath<String>,
) -> crate::Result<Response> {
    let location = state
        .resolver
        .resolve_location(LocationInput::Name(city))
        .await?;
    let record = state.pipeline.run(&location).await?;
    Ok(ResponseRenderer::json(record))
}

/// GET /weather/{lat}/{lng}
async fn weather_by_coords(
    State(state): State<AppState>,
    UrlPath((lat, lng)): UrlPath<(String, String)>,
) -> crate::Result<Response> {
    let coordinates = Coordinates::parse_pair(&lat, &lng)?;
    let location = state
        .resolver
        .resolve_location(LocationInput::Coordinates(coordinates))
        .await?;
    let record = state.pipeline.run(&location).await?;
    Ok(ResponseRenderer::json(record))
}

/// GET /
async fn homepage(
    State(state): State<AppState>,
    ClientAddress(address): ClientAddress,
    headers: HeaderMap,
) -> crate::Result<Response> {
    let input = LocationInput::Visitor {
        cached: location_token(&headers),
        address,
    };
    let location = state.resolver.resolve_location(input).await?;
    let record = state.pipeline.run(&location).await?;
    state
        .renderer
        .homepage(record, location.cacheable_coordinates())
        .await
}

pub async fn run(
    server: &ServerConfig,
    state: AppState,
    assets_dir: impl AsRef<Path>,
) -> anyhow::Result<()> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = router(state, assets_dir)
        .layer(TimeoutLayer::new(Duration::from_secs(
            server.request_timeout_seconds.into(),
        )))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr = format!("{}:{}", server.host, server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Web server running at http://{}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("Web server stopped unexpectedly")?;
    Ok(())
}
