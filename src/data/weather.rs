//! OpenWeatherMap API client
//!
//! This module provides the gateway to the upstream weather provider: it
//! fetches the current observation for a region's coordinates and parses it
//! into a [`WeatherSnapshot`].

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;

use super::{round_to, Region, WeatherSnapshot};

/// Base URL for the OpenWeatherMap current weather endpoint
pub const OPEN_WEATHER_BASE_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

/// Default timeout for a single upstream request
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// m/s to km/h
const MS_TO_KMH: f64 = 3.6;

/// Errors that can occur when fetching weather data
#[derive(Debug, Error)]
pub enum WeatherError {
    /// HTTP request failed or timed out
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Upstream answered with a non-success status
    #[error("Weather API returned status {0}")]
    Status(StatusCode),

    /// Failed to parse JSON response
    #[error("Failed to parse JSON response: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Missing expected field in response
    #[error("Missing expected field in response: {0}")]
    MissingField(String),

    /// A field was present but outside its physical range
    #[error("Value out of range for {field}: {value}")]
    OutOfRange { field: &'static str, value: f64 },
}

/// Source of point-in-time weather observations
#[async_trait]
pub trait WeatherGateway: Send + Sync {
    /// Fetches the current observation at the region's coordinates
    async fn fetch(&self, region: &Region) -> Result<WeatherSnapshot, WeatherError>;
}

/// Client for fetching weather data from the OpenWeatherMap API
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl OpenWeatherClient {
    /// Create a new client against the public OpenWeatherMap endpoint
    pub fn new(api_key: impl Into<String>) -> Result<Self, WeatherError> {
        Self::with_base_url(OPEN_WEATHER_BASE_URL, api_key, DEFAULT_TIMEOUT)
    }

    /// Create a new client with a custom endpoint and timeout
    pub fn with_base_url(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, WeatherError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self::with_client(client, base_url, api_key))
    }

    /// Create a new client reusing an existing HTTP client
    pub fn with_client(
        client: Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Parse an OpenWeatherMap response body into a snapshot for `region`
    fn parse_response(
        &self,
        region: &Region,
        response: OpenWeatherResponse,
    ) -> Result<WeatherSnapshot, WeatherError> {
        let main = response
            .main
            .ok_or_else(|| WeatherError::MissingField("main".to_string()))?;
        let wind = response
            .wind
            .ok_or_else(|| WeatherError::MissingField("wind".to_string()))?;
        let description = response
            .weather
            .into_iter()
            .next()
            .map(|condition| condition.description)
            .ok_or_else(|| WeatherError::MissingField("weather[0].description".to_string()))?;

        if !(0.0..=100.0).contains(&main.humidity) {
            return Err(WeatherError::OutOfRange {
                field: "main.humidity",
                value: main.humidity,
            });
        }
        if wind.speed.is_nan() || wind.speed < 0.0 {
            return Err(WeatherError::OutOfRange {
                field: "wind.speed",
                value: wind.speed,
            });
        }

        Ok(WeatherSnapshot {
            department: region.key.to_string(),
            temp_celsius: round_to(main.temp, 1),
            description,
            humidity: main.humidity.round() as u8,
            wind_speed_kmh: round_to(wind.speed * MS_TO_KMH, 1),
            timestamp: Utc::now(),
        })
    }
}

#[async_trait]
impl WeatherGateway for OpenWeatherClient {
    async fn fetch(&self, region: &Region) -> Result<WeatherSnapshot, WeatherError> {
        let lat = region.latitude.to_string();
        let lon = region.longitude.to_string();

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
                ("lang", "es"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(WeatherError::Status(status));
        }

        let text = response.text().await?;
        let api_response: OpenWeatherResponse = serde_json::from_str(&text)?;

        self.parse_response(region, api_response)
    }
}

/// OpenWeatherMap current weather response (only the fields we use)
#[derive(Debug, Deserialize)]
struct OpenWeatherResponse {
    main: Option<MainReadings>,
    #[serde(default)]
    weather: Vec<Condition>,
    wind: Option<WindReadings>,
}

#[derive(Debug, Deserialize)]
struct MainReadings {
    temp: f64,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct Condition {
    description: String,
}

#[derive(Debug, Deserialize)]
struct WindReadings {
    /// m/s when `units=metric`
    speed: f64,
}
