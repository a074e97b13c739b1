//! Timestamp-gated cache over a [`KeyValueStore`].
//!
//! Sits in front of the fixtures feed so repeated refreshes inside the
//! freshness window reuse the stored payload instead of hitting the
//! provider. Anything unreadable in the store is a miss, never an error.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::future::Future;
use tracing::{debug, warn};

use super::KeyValueStore;

/// A stored payload and the time it was captured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub payload: T,
    pub captured_at: DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    /// Whether the entry is still inside `window` at `now`. An entry
    /// captured after `now` (clock skew) is never fresh.
    pub fn is_fresh(&self, now: DateTime<Utc>, window: Duration) -> bool {
        self.captured_at <= now && now - self.captured_at < window
    }
}

pub struct LocalCache<S> {
    store: S,
}

impl<S: KeyValueStore> LocalCache<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Read the entry under `key`. Missing, unreadable and corrupt entries
    /// all come back as `None`.
    pub fn read<T: DeserializeOwned>(&self, key: &str) -> Option<CacheEntry<T>> {
        let raw = match self.store.load(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(key, error = %e, "Cache read failed, treating as miss");
                return None;
            }
        };

        match serde_json::from_str::<CacheEntry<T>>(&raw) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(key, error = %e, "Cache entry is corrupt, treating as miss");
                None
            }
        }
    }

    /// Store `payload` under `key` captured at `now`.
    pub fn write<T: Serialize>(&self, key: &str, payload: &T, now: DateTime<Utc>) -> Result<()> {
        let entry = CacheEntry { payload, captured_at: now };
        let json = serde_json::to_string(&entry)
            .with_context(|| format!("Failed to serialise cache entry {key}"))?;
        self.store.save(key, &json)
    }

    /// Return the cached payload if it is fresh, otherwise run `fetch`,
    /// store its result stamped with `now` and return it.
    ///
    /// A failing `fetch` leaves the stored entry untouched. A failing write
    /// is logged and the fetched payload is still returned.
    pub async fn get_or_fetch<T, F, Fut>(
        &self,
        key: &str,
        now: DateTime<Utc>,
        window: Duration,
        fetch: F,
    ) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.get_or_fetch_if(key, now, window, fetch, || true).await
    }

    /// Like [`get_or_fetch`](Self::get_or_fetch), but a fetched payload is
    /// only stored when `should_store` still holds once `fetch` resolves.
    pub async fn get_or_fetch_if<T, F, Fut, P>(
        &self,
        key: &str,
        now: DateTime<Utc>,
        window: Duration,
        fetch: F,
        should_store: P,
    ) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
        P: FnOnce() -> bool,
    {
        if let Some(entry) = self.read::<T>(key) {
            if entry.is_fresh(now, window) {
                debug!(key, captured_at = %entry.captured_at, "Cache hit");
                return Ok(entry.payload);
            }
            debug!(key, captured_at = %entry.captured_at, "Cache entry not fresh");
        }

        let payload = fetch().await?;

        if !should_store() {
            debug!(key, "Fetched payload superseded, not stored");
            return Ok(payload);
        }
        if let Err(e) = self.write(key, &payload, now) {
            warn!(key, error = %e, "Failed to store cache entry");
        }

        Ok(payload)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
