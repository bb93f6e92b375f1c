//! Weather lookup with a time-bounded snapshot cache
//!
//! [`WeatherService`] resolves a department name, serves the stored snapshot
//! while it is younger than the TTL, and otherwise refreshes it from the
//! weather gateway and writes it through to the store.
//!
//! Store failures never fail a lookup: a failed read is treated as a miss and
//! a failed write only loses durability. Expired snapshots are never served,
//! even when the gateway is down.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::cache::SnapshotStore;
use crate::data::{region, Region, WeatherError, WeatherGateway, WeatherSnapshot};

/// Default time a snapshot stays fresh, in seconds
pub const DEFAULT_TTL_SECONDS: i64 = 3600;

/// Errors returned by [`WeatherService::get_weather`]
#[derive(Debug, Error)]
pub enum WeatherLookupError {
    /// The caller asked for an unsupported department
    #[error("Department '{name}' not found or not supported. Supported departments: {}", supported.join(", "))]
    NotFound {
        name: String,
        supported: Vec<&'static str>,
    },

    /// No fresh snapshot and the weather provider could not supply one
    #[error("Weather service unavailable: {0}")]
    Unavailable(#[source] WeatherError),
}

impl From<region::RegionError> for WeatherLookupError {
    fn from(err: region::RegionError) -> Self {
        match err {
            region::RegionError::NotFound { name, supported } => {
                WeatherLookupError::NotFound { name, supported }
            }
        }
    }
}

/// Whether an entry written at `last_updated` is still fresh at `now`
///
/// The fresh side is exclusive: an entry exactly `ttl` old is stale. An
/// expiry past the representable range never arrives, so the entry is fresh.
pub fn is_fresh(last_updated: DateTime<Utc>, now: DateTime<Utc>, ttl: Duration) -> bool {
    last_updated
        .checked_add_signed(ttl)
        .map_or(true, |expires_at| now < expires_at)
}

/// Cache-aside weather lookups over an injected store and gateway
#[derive(Clone)]
pub struct WeatherService {
    store: Arc<dyn SnapshotStore>,
    gateway: Arc<dyn WeatherGateway>,
    ttl: Duration,
}

impl WeatherService {
    pub fn new(
        store: Arc<dyn SnapshotStore>,
        gateway: Arc<dyn WeatherGateway>,
        ttl: Duration,
    ) -> Self {
        Self {
            store,
            gateway,
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Current weather for a department, from cache when fresh
    ///
    /// # Returns
    /// * `Ok(WeatherSnapshot)` from the store (hit) or the gateway (refresh)
    /// * `Err(WeatherLookupError::NotFound)` for unsupported names; neither
    ///   the store nor the gateway is touched
    /// * `Err(WeatherLookupError::Unavailable)` when a refresh was needed and
    ///   the gateway failed; the store is not written
    pub async fn get_weather(&self, name: &str) -> Result<WeatherSnapshot, WeatherLookupError> {
        let region = region::resolve(name)?;

        if let Some(snapshot) = self.cached(region).await {
            return Ok(snapshot);
        }

        self.refresh(region).await
    }

    /// Fresh stored snapshot for `region`, if any
    async fn cached(&self, region: &Region) -> Option<WeatherSnapshot> {
        let entry = match self.store.read(region.key).await {
            Ok(Some(entry)) => entry,
            Ok(None) => {
                tracing::debug!(department = region.key, "Weather cache miss");
                return None;
            }
            Err(e) => {
                tracing::warn!(department = region.key, error = %e, "Weather cache read failed, treating as miss");
                return None;
            }
        };

        if is_fresh(entry.last_updated, Utc::now(), self.ttl) {
            tracing::debug!(department = region.key, last_updated = %entry.last_updated, "Serving weather from cache");
            Some(entry.snapshot)
        } else {
            tracing::info!(department = region.key, last_updated = %entry.last_updated, "Cached weather expired");
            None
        }
    }

    /// Fetches a new snapshot and writes it through to the store
    async fn refresh(&self, region: &Region) -> Result<WeatherSnapshot, WeatherLookupError> {
        let snapshot = self.gateway.fetch(region).await.map_err(|e| {
            tracing::warn!(department = region.key, error = %e, "Weather provider request failed");
            WeatherLookupError::Unavailable(e)
        })?;

        match self.store.write(region.key, &snapshot).await {
            Ok(()) => tracing::info!(department = region.key, "Weather cache updated"),
            Err(e) => {
                tracing::warn!(department = region.key, error = %e, "Weather cache write failed")
            }
        }

        Ok(snapshot)
    }
}
