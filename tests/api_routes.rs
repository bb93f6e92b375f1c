//! Integration tests for the HTTP routes
//!
//! Requests go through the full router with `tower::ServiceExt::oneshot`;
//! upstream APIs are mocked.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use climapyg::api;
use climapyg::app::build_state;
use climapyg::cache::MemoryStore;
use climapyg::config::Settings;

struct Upstreams {
    weather: MockServer,
    rates: MockServer,
    coingecko: MockServer,
}

impl Upstreams {
    async fn start() -> Self {
        Self {
            weather: MockServer::start().await,
            rates: MockServer::start().await,
            coingecko: MockServer::start().await,
        }
    }

    fn router(&self) -> Router {
        let mut settings = Settings::default();
        settings.weather.base_url = format!("{}/weather", self.weather.uri());
        settings.weather.api_key = "weather-key".to_string();
        settings.exchange.base_url = self.rates.uri();
        settings.exchange.api_key = "rate-key".to_string();
        settings.coingecko.base_url = self.coingecko.uri();

        let state = build_state(&settings, Arc::new(MemoryStore::new())).unwrap();
        api::router(state, &settings.server.api_prefix)
    }
}

async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn mount_usd_rate(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/rate-key/latest/USD"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": "success",
            "conversion_rates": { "USD": 1.0, "PYG": 7450.0 }
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_health_check() {
    let upstreams = Upstreams::start().await;

    let (status, body) = send(upstreams.router(), get("/")).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].as_str().unwrap().contains("running"));
}

#[tokio::test]
async fn test_weather_route_returns_snapshot() {
    let upstreams = Upstreams::start().await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "weather": [{ "description": "lluvia ligera" }],
            "main": { "temp": 19.96, "humidity": 88 },
            "wind": { "speed": 4.17 }
        })))
        .expect(1)
        .mount(&upstreams.weather)
        .await;

    let router = upstreams.router();
    let (status, body) = send(router.clone(), get("/api/v1/weather/itapua")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["department"], "ITAPUA");
    assert_eq!(body["temp_celsius"], 20.0);
    assert_eq!(body["wind_speed_kmh"], 15.0);
    assert_eq!(body["humidity"], 88);
    assert_eq!(body["description"], "lluvia ligera");
    assert!(body["timestamp"].is_string());

    // Served from the store; the mock expects a single upstream call
    let (status, _) = send(router, get("/api/v1/weather/ITAPUA")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_weather_route_unknown_department_is_404() {
    let upstreams = Upstreams::start().await;

    let (status, body) = send(upstreams.router(), get("/api/v1/weather/Chaco")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    let detail = body["detail"].as_str().unwrap();
    assert!(detail.contains("Chaco"));
    assert!(detail.contains("ASUNCION, ALTO_PARANA, CENTRAL, ITAPUA"));
}

#[tokio::test]
async fn test_weather_route_upstream_failure_is_503() {
    let upstreams = Upstreams::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&upstreams.weather)
        .await;

    let (status, body) = send(upstreams.router(), get("/api/v1/weather/central")).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn test_currency_convert() {
    let upstreams = Upstreams::start().await;
    mount_usd_rate(&upstreams.rates).await;

    let request = post_json(
        "/api/v1/currency/convert",
        json!({ "from_currency": "usd", "amount": 20 }),
    );
    let (status, body) = send(upstreams.router(), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source_currency"], "USD");
    assert_eq!(body["target_currency"], "PYG");
    assert_eq!(body["converted_amount"], 149_000.0);
}

#[tokio::test]
async fn test_currency_convert_validation() {
    let upstreams = Upstreams::start().await;

    let bad_code = post_json(
        "/api/v1/currency/convert",
        json!({ "from_currency": "DOLLAR", "amount": 20 }),
    );
    let (status, _) = send(upstreams.router(), bad_code).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let bad_amount = post_json(
        "/api/v1/currency/convert",
        json!({ "from_currency": "USD", "amount": 0 }),
    );
    let (status, body) = send(upstreams.router(), bad_amount).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["detail"].as_str().unwrap().contains("amount"));
}

#[tokio::test]
async fn test_currency_convert_unknown_code_is_400() {
    let upstreams = Upstreams::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "result": "error",
            "error-type": "unsupported-code"
        })))
        .mount(&upstreams.rates)
        .await;

    let request = post_json(
        "/api/v1/currency/convert",
        json!({ "from_currency": "XYZ", "amount": 5 }),
    );
    let (status, body) = send(upstreams.router(), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("XYZ"));
}

#[tokio::test]
async fn test_bitcoin_convert() {
    let upstreams = Upstreams::start().await;
    mount_usd_rate(&upstreams.rates).await;
    Mock::given(method("GET"))
        .and(path("/simple/price"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "bitcoin": { "usd": 65000.0 }
        })))
        .mount(&upstreams.coingecko)
        .await;
    Mock::given(method("GET"))
        .and(path("/coins/markets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "high_24h": 66000.0,
            "low_24h": 64000.0,
            "price_change_percentage_24h": 2.5
        }])))
        .mount(&upstreams.coingecko)
        .await;

    let request = post_json("/api/v1/bitcoin/convert", json!({ "amount": 0.5 }));
    let (status, body) = send(upstreams.router(), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source_currency"], "BTC");
    assert_eq!(body["converted_amount"], 242_125_000.0);
    assert_eq!(body["usd_rate_pyg"], 7450.0);
}

#[tokio::test]
async fn test_bitcoin_convert_upstream_failure_is_503() {
    let upstreams = Upstreams::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&upstreams.coingecko)
        .await;
    mount_usd_rate(&upstreams.rates).await;

    let request = post_json("/api/v1/bitcoin/convert", json!({ "amount": 1 }));
    let (status, _) = send(upstreams.router(), request).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_bitcoin_history_days_bounds() {
    let upstreams = Upstreams::start().await;

    let (status, _) = send(upstreams.router(), get("/api/v1/bitcoin/history?days=0")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send(upstreams.router(), get("/api/v1/bitcoin/history?days=31")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_bitcoin_history_defaults_to_seven_days() {
    let upstreams = Upstreams::start().await;
    let day_ms = 86_400_000.0;
    let prices: Vec<Value> = (0..8)
        .map(|i| json!([1704067200000.0 + i as f64 * day_ms, 40000.0 + i as f64]))
        .collect();
    Mock::given(method("GET"))
        .and(path("/coins/bitcoin/market_chart"))
        .and(wiremock::matchers::query_param("days", "7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "prices": prices })))
        .expect(1)
        .mount(&upstreams.coingecko)
        .await;

    let (status, body) = send(upstreams.router(), get("/api/v1/bitcoin/history")).await;

    assert_eq!(status, StatusCode::OK);
    let points = body.as_array().unwrap();
    assert_eq!(points.len(), 7);
    assert_eq!(points[6]["date"], "2024-01-08");
    assert_eq!(points[6]["price_usd"], 40007.0);
}
