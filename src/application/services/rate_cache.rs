//! # Rate Cache
//!
//! Shares one FX rate table per (reference currency, retrieval bucket)
//! across concurrent pipeline runs.
//!
//! A bucket is `timestamp_secs / bucket_secs`. Concurrent callers asking for
//! the same key wait on a single fetch; a failed fetch removes the slot so
//! the next caller tries again.
//!
//! Only buckets adjacent to the most recently missed one are retained:
//! every miss drops slots more than one bucket away from it.

use crate::domain::entities::FxRateTable;
use crate::domain::value_objects::{CurrencyCode, Timestamp};
use dashmap::DashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::OnceCell;

type Slot = Arc<OnceCell<Arc<FxRateTable>>>;

/// Single-flight cache of FX rate tables.
#[derive(Debug)]
pub struct RateCache {
    bucket_secs: u64,
    entries: DashMap<(CurrencyCode, i64), Slot>,
}

impl RateCache {
    /// Creates a cache with buckets `bucket_secs` wide (at least one second).
    #[must_use]
    pub fn new(bucket_secs: u64) -> Self {
        Self {
            bucket_secs: bucket_secs.max(1),
            entries: DashMap::new(),
        }
    }

    /// Width of a retrieval bucket in seconds.
    #[inline]
    #[must_use]
    pub fn bucket_secs(&self) -> u64 {
        self.bucket_secs
    }

    /// Bucket a timestamp falls into.
    #[inline]
    #[must_use]
    pub fn bucket_of(&self, as_of: Timestamp) -> i64 {
        as_of.bucket(self.bucket_secs)
    }

    /// Returns the cached table for `(reference, bucket of as_of)`, running
    /// `fetch` if none is cached yet.
    ///
    /// # Errors
    ///
    /// Returns the error of `fetch`; it is not cached.
    pub async fn get_or_fetch<F, Fut, E>(
        &self,
        reference: CurrencyCode,
        as_of: Timestamp,
        fetch: F,
    ) -> Result<Arc<FxRateTable>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<FxRateTable, E>>,
    {
        let key = (reference, self.bucket_of(as_of));
        let slot = Arc::clone(self.entries.entry(key).or_default().value());
        if !slot.initialized() {
            self.retain_near(key.1);
        }
        let result = slot
            .get_or_try_init(|| async move {
                tracing::debug!(reference = %reference, bucket = key.1, "rate cache miss");
                fetch().await.map(Arc::new)
            })
            .await
            .map(Arc::clone);
        if result.is_err() {
            self.entries
                .remove_if(&key, |_, slot| !slot.initialized());
        }
        result
    }

    /// Returns the cached table without fetching.
    #[must_use]
    pub fn get(&self, reference: CurrencyCode, as_of: Timestamp) -> Option<Arc<FxRateTable>> {
        let bucket = self.bucket_of(as_of);
        self.entries
            .get(&(reference, bucket))
            .and_then(|slot| slot.get().cloned())
    }

    /// Drops every entry older than the bucket of `now`.
    ///
    /// Returns the number of entries removed.
    pub fn evict_before(&self, now: Timestamp) -> usize {
        let current = self.bucket_of(now);
        let before = self.entries.len();
        self.entries.retain(|(_, bucket), _| *bucket >= current);
        before.saturating_sub(self.entries.len())
    }

    /// Drops slots more than one bucket away from `bucket`.
    fn retain_near(&self, bucket: i64) {
        let before = self.entries.len();
        self.entries
            .retain(|(_, cached), _| cached.abs_diff(bucket) <= 1);
        let evicted = before.saturating_sub(self.entries.len());
        if evicted > 0 {
            tracing::debug!(bucket, evicted, "evicted stale rate buckets");
        }
    }

    /// Number of cache slots, including slots whose fetch is in flight.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the cache holds no slots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes all entries.
    pub fn clear(&self) {
        self.entries.clear();
    }
}
