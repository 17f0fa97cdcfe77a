//! End-to-end pipeline runs against a mock weatherapi.com server.

use std::sync::Arc;

use skycast_weather::{
    ConfiguredPosition, Coordinate, ForecastClient, ForecastClientConfig, ForecastPipeline,
    ForecastState, KeyValueStore, LocationResolver, PipelineSettings, CITY_KEY,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn forecast_body(name: &str) -> serde_json::Value {
    serde_json::json!({
        "location": {"name": name, "country": "United Kingdom"},
        "current": {
            "temp_c": 12.0, "temp_f": 53.6,
            "condition": {"text": "Overcast"},
            "wind_kph": 9.0, "wind_mph": 5.6,
            "pressure_mb": 1009.0, "humidity": 81
        },
        "forecast": {"forecastday": [
            {"date": "2024-05-06", "day": {"avgtemp_c": 11.0, "condition": {"text": "Light rain"}},
             "astro": {"sunrise": "05:12 AM", "sunset": "08:31 PM"}}
        ]}
    })
}

fn pipeline_for(
    server: &MockServer,
    store: KeyValueStore,
    permission_granted: bool,
) -> Arc<ForecastPipeline> {
    let client = ForecastClient::new(ForecastClientConfig {
        api_key: "test_key".to_string(),
        base_url: server.uri(),
    })
    .unwrap();
    let position = ConfiguredPosition::new(permission_granted, Some(Coordinate::new(51.5, -0.12)));

    Arc::new(ForecastPipeline::new(
        store,
        LocationResolver::new(Arc::new(position)),
        Arc::new(client),
        PipelineSettings::default(),
    ))
}

#[tokio::test]
async fn test_empty_store_fetches_by_device_location() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/forecast.json"))
        .and(query_param("q", "51.5,-0.12"))
        .and(query_param("days", "7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body("City of London")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let pipeline = pipeline_for(&mock_server, KeyValueStore::in_memory().unwrap(), true);
    pipeline.cold_start().await.unwrap();

    let state = pipeline.state();
    let forecast = state.forecast().unwrap();
    assert_eq!(forecast.location_name(), Some("City of London"));
    assert_eq!(forecast.days().len(), 1);
}

#[tokio::test]
async fn test_permission_denied_makes_no_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body("Nowhere")))
        .expect(0)
        .mount(&mock_server)
        .await;

    let pipeline = pipeline_for(&mock_server, KeyValueStore::in_memory().unwrap(), false);
    assert!(pipeline.cold_start().await.is_err());
    assert_eq!(pipeline.state(), ForecastState::Failed);
}

#[tokio::test]
async fn test_search_select_and_restart_with_saved_city() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("skycast.db");

    Mock::given(method("GET"))
        .and(path("/v1/search.json"))
        .and(query_param("q", "Lon"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"id": 2801268, "name": "London", "region": "City of London, Greater London",
             "country": "United Kingdom", "lat": 51.52, "lon": -0.11}
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/forecast.json"))
        .and(query_param("q", "London"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body("London")))
        .expect(2)
        .mount(&mock_server)
        .await;

    {
        let pipeline = pipeline_for(&mock_server, KeyValueStore::open(&db_path).unwrap(), true);
        pipeline.search("Lon").await.unwrap();

        let state = pipeline.state();
        let chosen = state.candidates()[0].clone();
        pipeline.select(&chosen).await.unwrap();
        assert!(matches!(pipeline.state(), ForecastState::Ready(_)));
    }

    // A fresh pipeline over the same database starts from the saved city
    let store = KeyValueStore::open(&db_path).unwrap();
    assert_eq!(store.get(CITY_KEY).await.unwrap().as_deref(), Some("London"));

    let pipeline = pipeline_for(&mock_server, store, false);
    pipeline.cold_start().await.unwrap();
    assert_eq!(
        pipeline.state().forecast().and_then(|f| f.location_name()),
        Some("London")
    );
}

#[tokio::test]
async fn test_server_error_ends_failed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/forecast.json"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;

    let store = KeyValueStore::in_memory().unwrap();
    store.set(CITY_KEY, "London").await.unwrap();

    let pipeline = pipeline_for(&mock_server, store, true);
    assert!(pipeline.cold_start().await.is_err());
    assert_eq!(pipeline.state(), ForecastState::Failed);
}
