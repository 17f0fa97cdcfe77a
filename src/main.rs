use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use skycast_core::{App, AppError, Config};
use skycast_weather::{
    ConfiguredPosition, Coordinate, ForecastClient, ForecastClientConfig, ForecastPipeline,
    ForecastResult, KeyValueStore, LocationResolver, PipelineSettings, Preferences,
};

fn build_pipeline(config: &Config, store: KeyValueStore) -> Result<ForecastPipeline> {
    let client = ForecastClient::new(ForecastClientConfig {
        api_key: config.weather.api_key.clone(),
        base_url: config.weather.base_url.clone(),
    })?;

    let fix = config
        .location
        .fixed_position()
        .map(|(lat, lon)| Coordinate::new(lat, lon));
    let position = ConfiguredPosition::new(config.location.permission_granted, fix);

    Ok(ForecastPipeline::new(
        store,
        LocationResolver::new(Arc::new(position)),
        Arc::new(client),
        PipelineSettings {
            forecast_days: config.weather.forecast_days,
            search_debounce: Duration::from_millis(config.weather.search_debounce_ms),
        },
    ))
}

fn print_forecast(forecast: &ForecastResult, prefs: &Preferences) {
    let place = match (forecast.location_name(), forecast.country()) {
        (Some(name), Some(country)) => format!("{}, {}", name, country),
        (Some(name), None) => name.to_string(),
        _ => "Unknown location".to_string(),
    };
    println!("{}", place);

    let reading = |r: Option<skycast_weather::Reading>| {
        r.map(|r| r.to_string()).unwrap_or_else(|| "-".to_string())
    };

    println!(
        "  {}  {}",
        reading(forecast.temperature(prefs.temperature_unit)),
        forecast.condition_text().unwrap_or("-")
    );
    println!(
        "  wind {}  pressure {}  humidity {}",
        reading(forecast.wind_speed(prefs.speed_unit)),
        reading(forecast.pressure(prefs.pressure_unit)),
        forecast
            .humidity()
            .map(|h| format!("{}%", h))
            .unwrap_or_else(|| "-".to_string())
    );

    for day in forecast.days() {
        println!(
            "  {:<10} {:>6}  {}",
            day.weekday().unwrap_or_default(),
            reading(day.avg_temperature(prefs.temperature_unit)),
            day.condition_text.as_deref().unwrap_or("-")
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    skycast_core::init()?;

    let mut app = match App::new() {
        Ok(app) => app,
        Err(e) => {
            eprintln!("{}", e.user_message());
            return Err(e.into());
        }
    };
    app.initialize()?;

    let config = app.shared_config();
    let store = KeyValueStore::open(config.storage.database_path()).map_err(AppError::service)?;
    let prefs = Preferences::load(&store).await.unwrap_or_else(|e| {
        tracing::warn!("Using default preferences: {}", e);
        Preferences::default()
    });

    let pipeline = build_pipeline(&config, store)?;

    tracing::info!("SkyCast started");

    match pipeline.cold_start().await {
        Ok(()) => {
            if let Some(forecast) = pipeline.state().forecast() {
                print_forecast(forecast, &prefs);
            }
        }
        // Already logged by the pipeline; the degraded state shows nothing
        Err(e) => {
            tracing::debug!("Cold start ended without a forecast: {}", e.user_message());
            eprintln!("{}", AppError::service(e).user_message());
        }
    }

    app.shutdown()?;

    Ok(())
}
