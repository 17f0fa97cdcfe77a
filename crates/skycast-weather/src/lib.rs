//! Weather service for SkyCast
//!
//! Resolves where to forecast for (preferred city or device location),
//! fetches forecasts and place candidates from weatherapi.com, and persists
//! the preferred city and display preferences locally.

pub mod client;
pub mod debounce;
pub mod error;
pub mod location;
pub mod pipeline;
pub mod preferences;
pub mod store;
pub mod types;

pub use client::{ForecastClient, ForecastClientConfig, ForecastSource};
pub use debounce::Debouncer;
pub use error::{FetchCause, WeatherError, WeatherResult};
pub use location::{ConfiguredPosition, LocationResolver, Permission, PositionService};
pub use pipeline::{ForecastPipeline, ForecastState, PipelineSettings};
pub use preferences::Preferences;
pub use store::{KeyValueBackend, KeyValueStore, SqliteKeyValueStore, CITY_KEY};
pub use types::*;
