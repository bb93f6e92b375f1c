//! CoinGecko client and BTC → PYG conversion
//!
//! Bitcoin prices come from CoinGecko in USD; the USD → PYG leg is looked up
//! through [`ExchangeRateClient`].

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

use super::currency::{ExchangeRateClient, RateError};
use super::{round_to, BitcoinConversion, BitcoinHistoryPoint, TARGET_CURRENCY};

/// Base URL for the CoinGecko v3 API
pub const COINGECKO_BASE_URL: &str = "https://api.coingecko.com/api/v3";

/// Header carrying the CoinGecko demo API key
const API_KEY_HEADER: &str = "x-cg-demo-api-key";

/// Errors that can occur while pricing Bitcoin
#[derive(Debug, Error)]
pub enum BitcoinError {
    /// HTTP request failed or timed out
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Upstream answered with a non-success status
    #[error("CoinGecko returned status {0}")]
    Status(StatusCode),

    /// Failed to parse API response
    #[error("Failed to parse CoinGecko response: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Missing expected field in response
    #[error("Missing expected field in response: {0}")]
    MissingField(&'static str),

    /// The USD → PYG leg failed
    #[error("USD rate lookup failed: {0}")]
    Rate(#[from] RateError),
}

/// 24-hour market figures for BTC in USD
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarketSummary {
    pub high_24h: f64,
    pub low_24h: f64,
    /// Percent
    pub change_24h: f64,
}

#[derive(Debug, Deserialize)]
struct SimplePriceResponse {
    bitcoin: Option<UsdPrice>,
}

#[derive(Debug, Deserialize)]
struct UsdPrice {
    usd: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct MarketEntry {
    high_24h: Option<f64>,
    low_24h: Option<f64>,
    price_change_percentage_24h: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct MarketChartResponse {
    /// `[unix_millis, price]` pairs, oldest first
    #[serde(default)]
    prices: Vec<(f64, f64)>,
}

/// Client for the CoinGecko public API
#[derive(Debug, Clone)]
pub struct CoinGeckoClient {
    http_client: Client,
    base_url: String,
    api_key: String,
}

impl CoinGeckoClient {
    /// Creates a new client against the public CoinGecko endpoint
    pub fn new(api_key: impl Into<String>) -> Result<Self, BitcoinError> {
        Self::with_base_url(COINGECKO_BASE_URL, api_key, Duration::from_secs(10))
    }

    /// Creates a new client with a custom base URL and timeout
    pub fn with_base_url(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, BitcoinError> {
        Ok(Self {
            http_client: Client::builder().timeout(timeout).build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    fn get(&self, path: &str) -> RequestBuilder {
        let request = self.http_client.get(format!("{}{}", self.base_url, path));
        if self.api_key.is_empty() {
            request
        } else {
            request.header(API_KEY_HEADER, &self.api_key)
        }
    }

    async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, BitcoinError> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(BitcoinError::Status(status));
        }
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Current BTC price in USD
    pub async fn btc_usd(&self) -> Result<f64, BitcoinError> {
        let request = self
            .get("/simple/price")
            .query(&[("ids", "bitcoin"), ("vs_currencies", "usd")]);
        let price: SimplePriceResponse = Self::send_json(request).await?;

        price
            .bitcoin
            .and_then(|bitcoin| bitcoin.usd)
            .ok_or(BitcoinError::MissingField("bitcoin.usd"))
    }

    /// 24-hour high, low and change for BTC in USD
    pub async fn market_24h(&self) -> Result<MarketSummary, BitcoinError> {
        let request = self.get("/coins/markets").query(&[
            ("vs_currency", "usd"),
            ("ids", "bitcoin"),
            ("per_page", "1"),
            ("page", "1"),
            ("sparkline", "false"),
        ]);
        let entries: Vec<MarketEntry> = Self::send_json(request).await?;
        let entry = entries
            .into_iter()
            .next()
            .ok_or(BitcoinError::MissingField("[0]"))?;

        Ok(MarketSummary {
            high_24h: entry.high_24h.ok_or(BitcoinError::MissingField("high_24h"))?,
            low_24h: entry.low_24h.ok_or(BitcoinError::MissingField("low_24h"))?,
            change_24h: entry
                .price_change_percentage_24h
                .ok_or(BitcoinError::MissingField("price_change_percentage_24h"))?,
        })
    }

    /// Daily BTC prices in USD for the last `days` days, oldest first
    pub async fn history(&self, days: u32) -> Result<Vec<BitcoinHistoryPoint>, BitcoinError> {
        let days_param = days.to_string();
        let request = self.get("/coins/bitcoin/market_chart").query(&[
            ("vs_currency", "usd"),
            ("days", days_param.as_str()),
            ("interval", "daily"),
        ]);
        let chart: MarketChartResponse = Self::send_json(request).await?;

        Ok(history_points(&chart.prices, days as usize))
    }
}

/// Turns raw chart pairs into at most `days` dated points, keeping the newest
fn history_points(prices: &[(f64, f64)], days: usize) -> Vec<BitcoinHistoryPoint> {
    let skip = prices.len().saturating_sub(days);
    prices
        .iter()
        .skip(skip)
        .filter_map(|&(millis, price)| {
            let time = DateTime::<Utc>::from_timestamp_millis(millis as i64)?;
            Some(BitcoinHistoryPoint {
                date: time.format("%Y-%m-%d").to_string(),
                price_usd: round_to(price, 2),
            })
        })
        .collect()
}

/// Composes CoinGecko and exchange-rate lookups into BTC → PYG conversions
#[derive(Debug, Clone)]
pub struct BitcoinConverter {
    coingecko: CoinGeckoClient,
    rates: ExchangeRateClient,
}

impl BitcoinConverter {
    pub fn new(coingecko: CoinGeckoClient, rates: ExchangeRateClient) -> Self {
        Self { coingecko, rates }
    }

    /// Converts `amount_btc` to PYG using current rates
    ///
    /// The BTC/USD price, USD/PYG rate and 24h market summary are fetched
    /// concurrently; the conversion fails if any of them fails.
    pub async fn convert(&self, amount_btc: f64) -> Result<BitcoinConversion, BitcoinError> {
        let (btc_usd, usd_pyg, market) = futures::try_join!(
            self.coingecko.btc_usd(),
            async {
                self.rates
                    .conversion_rate("USD")
                    .await
                    .map_err(BitcoinError::from)
            },
            self.coingecko.market_24h(),
        )?;

        Ok(compose_conversion(amount_btc, btc_usd, usd_pyg, market))
    }

    /// Daily BTC prices in USD for the last `days` days
    pub async fn history(&self, days: u32) -> Result<Vec<BitcoinHistoryPoint>, BitcoinError> {
        self.coingecko.history(days).await
    }
}

fn compose_conversion(
    amount_btc: f64,
    btc_usd: f64,
    usd_pyg: f64,
    market: MarketSummary,
) -> BitcoinConversion {
    BitcoinConversion {
        source_currency: "BTC".to_string(),
        target_currency: TARGET_CURRENCY.to_string(),
        amount: amount_btc,
        converted_amount: round_to(amount_btc * btc_usd * usd_pyg, 2),
        btc_rate_usd: round_to(btc_usd, 2),
        btc_rate_pyg: round_to(btc_usd * usd_pyg, 2),
        usd_rate_pyg: round_to(usd_pyg, 2),
        btc_high_24h: round_to(market.high_24h * usd_pyg, 2),
        btc_low_24h: round_to(market.low_24h * usd_pyg, 2),
        btc_change_24h: round_to(market.change_24h, 2),
        timestamp: Utc::now(),
    }
}
