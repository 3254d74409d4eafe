use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use argh::FromArgs;

use minimalweather::clients::{IpApiClient, OpenMeteoClient, StaticCityDirectory};
use minimalweather::web::{self, AppState};
use minimalweather::{
    AggregationPipeline, CityLookup, LocationResolver, MinimalWeatherConfig, ResponseRenderer,
    WeatherLookup, logging,
};

#[derive(FromArgs)]
/// Serve the current weather near a city, a coordinate pair, or the visitor.
struct Args {
    /// path to a TOML configuration file
    #[argh(option, short = 'c')]
    config: Option<PathBuf>,

    /// port to listen on, overriding the configuration
    #[argh(option, short = 'p')]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Args = argh::from_env();

    let mut config = MinimalWeatherConfig::load_from_path(args.config)?;
    if let Some(port) = args.port {
        config.server.port = port;
    }
    logging::init(&config.logging)?;

    let limit = config.lookups.timeout();
    let directory = StaticCityDirectory::load(&config.cities.path)
        .with_context(|| format!("Failed to load cities from {}", config.cities.path))?;
    let weather = OpenMeteoClient::new(&config.weather)?;
    let geolocator = IpApiClient::new(&config.geolocation)?;

    let state = AppState {
        resolver: Arc::new(LocationResolver::new(
            Arc::new(geolocator),
            config.defaults.coordinates(),
            limit,
        )),
        pipeline: AggregationPipeline::new(
            CityLookup::new(Arc::new(directory), limit),
            WeatherLookup::new(Arc::new(weather), limit),
        ),
        renderer: Arc::new(ResponseRenderer::new(&config.web.template_path)),
    };

    web::run(&config.server, state, &config.web.assets_dir).await
}
