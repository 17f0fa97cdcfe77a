//! Forecast pipeline: preferred city or device location in, forecast state out.
//!
//! State is published on a `watch` channel so a presentation layer can
//! subscribe to transitions without the pipeline knowing how it renders.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::instrument;

use crate::client::ForecastSource;
use crate::debounce::Debouncer;
use crate::error::WeatherResult;
use crate::location::LocationResolver;
use crate::store::{KeyValueStore, CITY_KEY};
use crate::types::{ForecastQuery, ForecastResult, LocationCandidate, DEFAULT_FORECAST_DAYS};

/// Default quiet period before a typed search is sent
pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(1500);

/// What the presentation layer should show
#[derive(Debug, Clone, PartialEq)]
pub enum ForecastState {
    /// A forecast fetch is in progress
    Loading,
    Ready(ForecastResult),
    /// Search results awaiting a selection
    Candidates(Vec<LocationCandidate>),
    /// Loading finished without a forecast; nothing is shown
    Failed,
}

impl ForecastState {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn forecast(&self) -> Option<&ForecastResult> {
        match self {
            Self::Ready(result) => Some(result),
            _ => None,
        }
    }

    pub fn candidates(&self) -> &[LocationCandidate] {
        match self {
            Self::Candidates(list) => list,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PipelineSettings {
    pub forecast_days: u32,
    pub search_debounce: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            forecast_days: DEFAULT_FORECAST_DAYS,
            search_debounce: DEFAULT_SEARCH_DEBOUNCE,
        }
    }
}

pub struct ForecastPipeline {
    store: KeyValueStore,
    resolver: LocationResolver,
    source: Arc<dyn ForecastSource>,
    settings: PipelineSettings,
    state: watch::Sender<ForecastState>,
    last_forecast: Mutex<Option<ForecastResult>>,
    /// Sequence number of the newest search, selection or blank input
    latest_search: AtomicU64,
    /// Sequence number of the newest cold start or selection
    latest_load: AtomicU64,
}

impl ForecastPipeline {
    pub fn new(
        store: KeyValueStore,
        resolver: LocationResolver,
        source: Arc<dyn ForecastSource>,
        settings: PipelineSettings,
    ) -> Self {
        let (state, _) = watch::channel(ForecastState::Loading);
        Self {
            store,
            resolver,
            source,
            settings,
            state,
            last_forecast: Mutex::new(None),
            latest_search: AtomicU64::new(0),
            latest_load: AtomicU64::new(0),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ForecastState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> ForecastState {
        self.state.borrow().clone()
    }

    /// The most recent successful forecast, kept while candidates are shown
    pub fn latest_forecast(&self) -> Option<ForecastResult> {
        self.last_forecast.lock().clone()
    }

    pub fn settings(&self) -> PipelineSettings {
        self.settings
    }

    fn transition(&self, next: ForecastState) {
        tracing::debug!("Pipeline state -> {}", state_name(&next));
        self.state.send_replace(next);
    }

    fn begin_load(&self) -> u64 {
        let seq = self.latest_load.fetch_add(1, Ordering::SeqCst) + 1;
        self.transition(ForecastState::Loading);
        seq
    }

    /// Load the first forecast: preferred city if one is stored, otherwise
    /// the device location. Failures are logged and leave `Failed`; nothing
    /// is retried. If a selection starts meanwhile, this load's outcome is
    /// dropped.
    ///
    /// # Errors
    /// Returns the failure that ended loading, after it has been logged.
    #[instrument(skip(self), level = "info")]
    pub async fn cold_start(&self) -> WeatherResult<()> {
        let seq = self.begin_load();
        let result = self.load_initial_forecast().await;
        self.finish_loading(seq, result)
    }

    async fn load_initial_forecast(&self) -> WeatherResult<ForecastResult> {
        let days = self.settings.forecast_days;
        let preferred = self.store.get(CITY_KEY).await?;

        let query = match preferred.filter(|city| !city.trim().is_empty()) {
            Some(city) => {
                tracing::info!("Fetching forecast for preferred city: {}", city);
                ForecastQuery::city(city, days)
            }
            None => {
                tracing::info!("No preferred city, resolving device location");
                let coordinate = self.resolver.resolve_current_location().await?;
                ForecastQuery::coordinates(coordinate, days)
            }
        };

        self.source.fetch_forecast(&query).await
    }

    /// Publish the outcome of load `seq` unless a newer load has started.
    fn finish_loading(&self, seq: u64, result: WeatherResult<ForecastResult>) -> WeatherResult<()> {
        let (next, outcome) = match result {
            Ok(forecast) => {
                tracing::info!(
                    "Forecast ready for {}",
                    forecast.location_name().unwrap_or("unknown location")
                );
                (ForecastState::Ready(forecast), Ok(()))
            }
            Err(e) => {
                tracing::error!("Error fetching weather data: {}", e);
                (ForecastState::Failed, Err(e))
            }
        };

        let published = self.state.send_if_modified(|state| {
            if self.latest_load.load(Ordering::SeqCst) != seq {
                return false;
            }
            if let ForecastState::Ready(forecast) = &next {
                *self.last_forecast.lock() = Some(forecast.clone());
            }
            tracing::debug!("Pipeline state -> {}", state_name(&next));
            *state = next;
            true
        });

        if !published {
            tracing::debug!("Discarding superseded forecast load #{}", seq);
        }
        outcome
    }

    /// Run a place search for settled input text.
    ///
    /// Whitespace-only text issues no request but still supersedes earlier
    /// searches. Results are published only if no newer search or selection
    /// started while this one was in flight.
    ///
    /// # Errors
    /// Returns the client failure; the current state is left unchanged.
    #[instrument(skip(self), level = "debug")]
    pub async fn search(&self, text: &str) -> WeatherResult<()> {
        let seq = self.latest_search.fetch_add(1, Ordering::SeqCst) + 1;

        if text.trim().is_empty() {
            tracing::debug!("Ignoring blank search input");
            return Ok(());
        }

        let candidates = match self.source.search_locations(text).await {
            Ok(list) => list,
            Err(e) => {
                tracing::error!("Location search for '{}' failed: {}", text, e);
                return Err(e);
            }
        };

        let published = self.state.send_if_modified(|state| {
            if self.latest_search.load(Ordering::SeqCst) != seq {
                return false;
            }
            *state = ForecastState::Candidates(candidates);
            true
        });

        if !published {
            tracing::debug!("Discarding stale results for '{}' (search #{})", text, seq);
        }
        Ok(())
    }

    /// Make `candidate` the preferred city and load its forecast.
    ///
    /// A failure to persist the city is logged and the fetch still runs.
    ///
    /// # Errors
    /// Returns the fetch failure; the state is then `Failed`.
    #[instrument(skip(self, candidate), fields(city = %candidate.name), level = "info")]
    pub async fn select(&self, candidate: &LocationCandidate) -> WeatherResult<()> {
        // Invalidate any search still in flight
        self.latest_search.fetch_add(1, Ordering::SeqCst);
        let seq = self.begin_load();

        match self.store.set(CITY_KEY, &candidate.name).await {
            Ok(()) => tracing::info!("Preferred city set to {}", candidate.name),
            Err(e) => tracing::warn!("Could not persist preferred city: {}", e),
        }

        let query = ForecastQuery::city(candidate.name.clone(), self.settings.forecast_days);
        let result = self.source.fetch_forecast(&query).await;
        self.finish_loading(seq, result)
    }

    /// Debounced search input bound to this pipeline.
    ///
    /// Push every keystroke's full text; a search runs once the text has been
    /// stable for the configured quiet period. Dropping the returned value
    /// cancels any pending search.
    pub fn search_input(self: &Arc<Self>) -> Debouncer<String> {
        let pipeline = Arc::clone(self);
        Debouncer::spawn(self.settings.search_debounce, move |text: String| {
            let pipeline = pipeline.clone();
            async move {
                // Failures are logged inside `search`
                let _ = pipeline.search(&text).await;
            }
        })
    }
}

fn state_name(state: &ForecastState) -> &'static str {
    match state {
        ForecastState::Loading => "loading",
        ForecastState::Ready(_) => "ready",
        ForecastState::Candidates(_) => "candidates",
        ForecastState::Failed => "failed",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_state_accessors() {
        let ready = ForecastState::Ready(ForecastResult::new(json!({"location": {"name": "Rome"}})));
        assert_eq!(ready.forecast().and_then(|f| f.location_name()), Some("Rome"));
        assert!(ready.candidates().is_empty());
        assert!(!ready.is_loading());

        let failed = ForecastState::Failed;
        assert!(failed.forecast().is_none());
        assert!(ForecastState::Loading.is_loading());
    }

    #[test]
    fn test_default_settings() {
        let settings = PipelineSettings::default();
        assert_eq!(settings.forecast_days, 7);
        assert_eq!(settings.search_debounce, Duration::from_millis(1500));
    }
}
