//! Core data models for ClimaPYG
//!
//! This module contains the data types shared across the service: supported
//! regions, weather snapshots, and the conversion results for currency and
//! Bitcoin lookups. The upstream API clients live in the submodules.

pub mod bitcoin;
pub mod currency;
pub mod region;
pub mod weather;

pub use bitcoin::{BitcoinConverter, CoinGeckoClient};
pub use currency::{ExchangeRateClient, RateError};
pub use region::{all_regions, get_region_by_key, resolve, supported_keys, RegionError};
pub use weather::{OpenWeatherClient, WeatherError, WeatherGateway};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Currency every conversion targets
pub const TARGET_CURRENCY: &str = "PYG";

/// A supported Paraguayan department
///
/// Uses `&'static str` for string fields so the registry can be a static
/// array. Only implements `Serialize`; use `get_region_by_key` to look up a
/// region from a stored key.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Region {
    /// Uppercase registry key (e.g. "ASUNCION")
    pub key: &'static str,
    /// Human-readable name
    pub name: &'static str,
    /// Latitude coordinate
    pub latitude: f64,
    /// Longitude coordinate
    pub longitude: f64,
}

/// One weather observation for a region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    /// Registry key of the region this observation belongs to
    pub department: String,
    /// Temperature in Celsius
    pub temp_celsius: f64,
    /// Condition description as reported upstream (Spanish)
    pub description: String,
    /// Relative humidity percentage (0-100)
    pub humidity: u8,
    /// Wind speed in km/h
    pub wind_speed_kmh: f64,
    /// When the observation was captured
    pub timestamp: DateTime<Utc>,
}

/// Result of converting an amount of some currency to PYG
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyConversion {
    pub source_currency: String,
    pub target_currency: String,
    pub amount: f64,
    pub converted_amount: f64,
    /// Units of PYG per unit of the source currency
    pub rate: f64,
    pub timestamp: DateTime<Utc>,
}

/// Result of converting an amount of BTC to PYG
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BitcoinConversion {
    pub source_currency: String,
    pub target_currency: String,
    pub amount: f64,
    pub converted_amount: f64,
    pub btc_rate_usd: f64,
    pub btc_rate_pyg: f64,
    pub usd_rate_pyg: f64,
    /// 24h high, in PYG
    pub btc_high_24h: f64,
    /// 24h low, in PYG
    pub btc_low_24h: f64,
    /// 24h price change, in percent
    pub btc_change_24h: f64,
    pub timestamp: DateTime<Utc>,
}

/// Daily closing price of Bitcoin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BitcoinHistoryPoint {
    /// Day in `YYYY-MM-DD` format
    pub date: String,
    pub price_usd: f64,
}

/// Rounds to the given number of decimal places
pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
