//! ExchangeRate-API client
//!
//! Looks up the PYG rate for a source currency and converts amounts with it.
//! Rates are fetched on every call; nothing is cached.

use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;

use super::{round_to, CurrencyConversion, TARGET_CURRENCY};

/// Base URL for ExchangeRate-API v6
pub const EXCHANGE_RATE_BASE_URL: &str = "https://v6.exchangerate-api.com/v6";

/// Errors that can occur when fetching exchange rates
#[derive(Debug, Error)]
pub enum RateError {
    /// HTTP request failed or timed out
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Upstream answered with a non-success status
    #[error("Rate API returned status {0}")]
    Status(StatusCode),

    /// Upstream answered but reported a failure or lacked the rate
    #[error("No {target} rate available for '{source_currency}'")]
    Unavailable {
        source_currency: String,
        target: &'static str,
    },

    /// Failed to parse API response
    #[error("Failed to parse API response: {0}")]
    ParseError(String),
}

/// Response from the `latest` endpoint
#[derive(Debug, Deserialize)]
struct LatestRatesResponse {
    result: String,
    #[serde(default)]
    conversion_rates: HashMap<String, f64>,
}

/// Client for fetching PYG exchange rates
#[derive(Debug, Clone)]
pub struct ExchangeRateClient {
    /// HTTP client for making requests
    http_client: Client,
    /// Base URL for the API (allows override for testing)
    base_url: String,
    api_key: String,
}

impl ExchangeRateClient {
    /// Creates a new client against the public ExchangeRate-API endpoint
    pub fn new(api_key: impl Into<String>) -> Result<Self, RateError> {
        Self::with_base_url(EXCHANGE_RATE_BASE_URL, api_key, Duration::from_secs(10))
    }

    /// Creates a new client with a custom base URL and timeout
    pub fn with_base_url(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, RateError> {
        Ok(Self {
            http_client: Client::builder().timeout(timeout).build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    /// Fetches how many PYG one unit of `from_currency` buys
    ///
    /// # Returns
    /// * `Ok(rate)` if the API reported success and listed a PYG rate
    /// * `Err(RateError)` on transport failure, error status, an
    ///   unsuccessful `result`, or a missing PYG entry
    pub async fn conversion_rate(&self, from_currency: &str) -> Result<f64, RateError> {
        let from = from_currency.to_uppercase();
        let url = format!("{}/{}/latest/{}", self.base_url, self.api_key, from);

        let response = self.http_client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RateError::Status(status));
        }

        let body = response.text().await?;
        let rates: LatestRatesResponse =
            serde_json::from_str(&body).map_err(|e| RateError::ParseError(e.to_string()))?;

        if rates.result != "success" {
            tracing::warn!(currency = %from, result = %rates.result, "Rate lookup was not successful");
            return Err(RateError::Unavailable {
                source_currency: from,
                target: TARGET_CURRENCY,
            });
        }

        rates
            .conversion_rates
            .get(TARGET_CURRENCY)
            .copied()
            .ok_or(RateError::Unavailable {
                source_currency: from,
                target: TARGET_CURRENCY,
            })
    }

    /// Converts `amount` of `from_currency` to PYG
    pub async fn convert_currency(
        &self,
        amount: f64,
        from_currency: &str,
    ) -> Result<CurrencyConversion, RateError> {
        let rate = self.conversion_rate(from_currency).await?;

        Ok(CurrencyConversion {
            source_currency: from_currency.to_uppercase(),
            target_currency: TARGET_CURRENCY.to_string(),
            amount,
            converted_amount: round_to(amount * rate, 2),
            rate,
            timestamp: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_response_parses_rates() {
        let body = r#"{"result": "success", "base_code": "USD", "conversion_rates": {"USD": 1, "PYG": 7450.0}}"#;
        let parsed: LatestRatesResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.result, "success");
        assert_eq!(parsed.conversion_rates.get("PYG"), Some(&7450.0));
    }

    #[test]
    fn test_error_response_parses_without_rates() {
        let body = r#"{"result": "error", "error-type": "unsupported-code"}"#;
        let parsed: LatestRatesResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.result, "error");
        assert!(parsed.conversion_rates.is_empty());
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client =
            ExchangeRateClient::with_base_url("http://rates.test/v6/", "k", Duration::from_secs(1))
                .unwrap();
        assert_eq!(client.base_url, "http://rates.test/v6");
    }
}
