//! Application wiring
//!
//! Builds the snapshot store, upstream clients, and weather service from
//! settings, then serves the router.

use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::api::{self, AppState};
use crate::cache::{FileStore, MemoryStore, SnapshotStore};
use crate::config::{Settings, StoreBackend, StoreConfig};
use crate::data::bitcoin::BitcoinError;
use crate::data::{
    BitcoinConverter, CoinGeckoClient, ExchangeRateClient, OpenWeatherClient, RateError,
    WeatherError,
};
use crate::service::WeatherService;

/// Errors that stop the server from starting
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Failed to build weather client: {0}")]
    Weather(#[from] WeatherError),

    #[error("Failed to build exchange rate client: {0}")]
    Rates(#[from] RateError),

    #[error("Failed to build CoinGecko client: {0}")]
    Bitcoin(#[from] BitcoinError),

    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Chooses the snapshot store for the configured backend
///
/// The file backend falls back to memory when no data directory is
/// configured and none can be determined for the platform.
pub fn build_store(config: &StoreConfig) -> Arc<dyn SnapshotStore> {
    match config.backend {
        StoreBackend::Memory => {
            tracing::info!("Using in-memory snapshot store");
            Arc::new(MemoryStore::new())
        }
        StoreBackend::File => {
            let store = match &config.data_dir {
                Some(dir) => Some(FileStore::new(dir)),
                None => FileStore::default_location(),
            };
            match store {
                Some(store) => {
                    tracing::info!(dir = %store.collection_dir().display(), "Using file snapshot store");
                    Arc::new(store)
                }
                None => {
                    tracing::warn!("No data directory available, using in-memory snapshot store");
                    Arc::new(MemoryStore::new())
                }
            }
        }
    }
}

/// Builds route state from settings and an already-chosen store
pub fn build_state(
    settings: &Settings,
    store: Arc<dyn SnapshotStore>,
) -> Result<AppState, StartupError> {
    if settings.weather.api_key.is_empty() {
        tracing::warn!("OPENWEATHERMAP_API_KEY is not set; weather refreshes will fail");
    }
    if settings.exchange.api_key.is_empty() {
        tracing::warn!("EXCHANGE_RATE_API_KEY is not set; conversions will fail");
    }

    let gateway = OpenWeatherClient::with_base_url(
        settings.weather.base_url.clone(),
        settings.weather.api_key.clone(),
        settings.weather.timeout(),
    )?;
    let currency = ExchangeRateClient::with_base_url(
        settings.exchange.base_url.clone(),
        settings.exchange.api_key.clone(),
        settings.exchange.timeout(),
    )?;
    let coingecko = CoinGeckoClient::with_base_url(
        settings.coingecko.base_url.clone(),
        settings.coingecko.api_key.clone(),
        settings.coingecko.timeout(),
    )?;

    Ok(AppState {
        weather: WeatherService::new(store, Arc::new(gateway), settings.weather.cache_ttl()),
        bitcoin: BitcoinConverter::new(coingecko, currency.clone()),
        currency,
    })
}

/// Binds the configured address and serves until the process is stopped
pub async fn run(settings: Settings) -> Result<(), StartupError> {
    let store = build_store(&settings.store);
    let state = build_state(&settings, store)?;
    let router = api::router(state, &settings.server.api_prefix);

    let address = settings.server.server_address();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind {
            address: address.clone(),
            source,
        })?;

    tracing::info!(
        "{} listening on http://{} (cache TTL {}s)",
        settings.project_name,
        address,
        settings.weather.cache_ttl_seconds
    );

    axum::serve(listener, router)
        .await
        .map_err(StartupError::Serve)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_file_backend_with_data_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = StoreConfig {
            backend: StoreBackend::File,
            data_dir: Some(temp_dir.path().to_path_buf()),
        };
        let store = build_store(&config);

        assert!(store.read("ASUNCION").await.unwrap().is_none());
    }

    #[test]
    fn test_build_state_from_defaults() {
        let settings = Settings::default();
        let state = build_state(&settings, Arc::new(MemoryStore::new())).unwrap();
        assert_eq!(state.weather.ttl(), settings.weather.cache_ttl());
    }
}
