//! HTTP routes
//!
//! Thin axum layer over the weather service and the conversion clients:
//! validates request bodies, maps typed errors to status codes, and renders
//! errors as `{"detail": "..."}`.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use thiserror::Error;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::data::{
    BitcoinConversion, BitcoinConverter, BitcoinHistoryPoint, CurrencyConversion,
    ExchangeRateClient, WeatherSnapshot,
};
use crate::service::{WeatherLookupError, WeatherService};

/// Bounds for `GET /bitcoin/history?days=`
const HISTORY_DAYS: std::ops::RangeInclusive<u32> = 1..=30;
const DEFAULT_HISTORY_DAYS: u32 = 7;

/// Shared handles for all routes
#[derive(Clone)]
pub struct AppState {
    pub weather: WeatherService,
    pub currency: ExchangeRateClient,
    pub bitcoin: BitcoinConverter,
}

/// Errors rendered to API clients
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unavailable(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "detail": self.to_string() });
        (self.status(), Json(body)).into_response()
    }
}

impl From<WeatherLookupError> for ApiError {
    fn from(err: WeatherLookupError) -> Self {
        match err {
            WeatherLookupError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            WeatherLookupError::Unavailable(_) => ApiError::Unavailable(
                "Could not reach the weather service. Try again later.".to_string(),
            ),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CurrencyConversionRequest {
    /// ISO 4217 code, e.g. USD
    pub from_currency: String,
    pub amount: f64,
}

#[derive(Debug, Deserialize)]
pub struct BitcoinConversionRequest {
    pub amount: f64,
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub days: Option<u32>,
}

/// Builds the application router with versioned routes under `api_prefix`
pub fn router(state: AppState, api_prefix: &str) -> Router {
    let api = Router::new()
        .route("/weather/{department}", get(department_weather))
        .route("/currency/convert", post(convert_to_pyg))
        .route("/bitcoin/convert", post(convert_btc_to_pyg))
        .route("/bitcoin/history", get(bitcoin_history));

    Router::new()
        .route("/", get(health_check))
        .nest(api_prefix, api)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "message": "ClimaPYG weather and currency API is running.",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Current weather for a Paraguayan department, cached for the configured TTL
async fn department_weather(
    State(state): State<AppState>,
    Path(department): Path<String>,
) -> Result<Json<WeatherSnapshot>, ApiError> {
    let snapshot = state.weather.get_weather(&department).await?;
    Ok(Json(snapshot))
}

/// Converts an amount of any ISO 4217 currency to PYG
async fn convert_to_pyg(
    State(state): State<AppState>,
    Json(request): Json<CurrencyConversionRequest>,
) -> Result<Json<CurrencyConversion>, ApiError> {
    if request.from_currency.chars().count() != 3 {
        return Err(ApiError::Validation(
            "from_currency must be a 3-letter ISO 4217 code".to_string(),
        ));
    }
    validate_amount(request.amount)?;

    let conversion = state
        .currency
        .convert_currency(request.amount, &request.from_currency)
        .await
        .map_err(|e| {
            tracing::warn!(currency = %request.from_currency, error = %e, "Currency conversion failed");
            ApiError::BadRequest(format!(
                "Could not get the rate for currency '{}'. Make sure to use a valid ISO 4217 code (e.g. USD).",
                request.from_currency
            ))
        })?;

    Ok(Json(conversion))
}

/// Converts an amount of BTC to PYG via BTC/USD and USD/PYG
async fn convert_btc_to_pyg(
    State(state): State<AppState>,
    Json(request): Json<BitcoinConversionRequest>,
) -> Result<Json<BitcoinConversion>, ApiError> {
    validate_amount(request.amount)?;

    let conversion = state.bitcoin.convert(request.amount).await.map_err(|e| {
        tracing::warn!(error = %e, "Bitcoin conversion failed");
        ApiError::Unavailable(
            "Could not get BTC or USD exchange rates. The upstream APIs did not respond correctly."
                .to_string(),
        )
    })?;

    Ok(Json(conversion))
}

/// Daily BTC price history in USD
async fn bitcoin_history(
    State(state): State<AppState>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<Vec<BitcoinHistoryPoint>>, ApiError> {
    let days = params.days.unwrap_or(DEFAULT_HISTORY_DAYS);
    if !HISTORY_DAYS.contains(&days) {
        return Err(ApiError::Validation(format!(
            "days must be between {} and {}",
            HISTORY_DAYS.start(),
            HISTORY_DAYS.end()
        )));
    }

    let history = state.bitcoin.history(days).await.map_err(|e| {
        tracing::warn!(days, error = %e, "Bitcoin history lookup failed");
        ApiError::Unavailable("Could not get the Bitcoin price history.".to_string())
    })?;

    Ok(Json(history))
}

fn validate_amount(amount: f64) -> Result<(), ApiError> {
    if amount.is_finite() && amount > 0.0 {
        Ok(())
    } else {
        Err(ApiError::Validation(
            "amount must be greater than 0".to_string(),
        ))
    }
}
