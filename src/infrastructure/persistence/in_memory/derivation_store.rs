//! # In-Memory Derivation Store
//!
//! In-memory implementation of [`DerivationStore`] for testing.
//!
//! Metrics and converted financials sit behind a single lock so one
//! [`DerivationStore::upsert`] call is applied as a unit.

use crate::domain::entities::DerivedMetricsRecord;
use crate::domain::services::ConvertedRecord;
use crate::infrastructure::persistence::traits::{
    DerivationKey, DerivationStore, RepositoryResult,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Tables {
    metrics: HashMap<DerivationKey, DerivedMetricsRecord>,
    financials: HashMap<DerivationKey, ConvertedRecord>,
}

/// In-memory implementation of [`DerivationStore`].
#[derive(Debug, Clone)]
pub struct InMemoryDerivationStore {
    storage: Arc<RwLock<Tables>>,
}

impl InMemoryDerivationStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            storage: Arc::new(RwLock::new(Tables::default())),
        }
    }

    /// Number of stored converted financial records.
    ///
    /// Best-effort: reports 0 while a writer holds the lock. Use
    /// [`DerivationStore::count_metrics`] where an exact count matters.
    #[must_use]
    pub fn financials_len(&self) -> usize {
        self.storage
            .try_read()
            .map(|guard| guard.financials.len())
            .unwrap_or(0)
    }

    /// Number of stored derived metrics records.
    ///
    /// Best-effort, like [`Self::financials_len`].
    #[must_use]
    pub fn metrics_len(&self) -> usize {
        self.storage
            .try_read()
            .map(|guard| guard.metrics.len())
            .unwrap_or(0)
    }

    /// Returns true if nothing has been stored.
    ///
    /// Best-effort, like [`Self::financials_len`]: also true while a writer
    /// holds the lock.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.metrics_len() == 0 && self.financials_len() == 0
    }

    /// Clears all stored results.
    pub async fn clear(&self) {
        let mut storage = self.storage.write().await;
        storage.metrics.clear();
        storage.financials.clear();
    }
}

impl Default for InMemoryDerivationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DerivationStore for InMemoryDerivationStore {
    async fn upsert(
        &self,
        metrics: &DerivedMetricsRecord,
        converted: &[ConvertedRecord],
    ) -> RepositoryResult<()> {
        let mut storage = self.storage.write().await;
        storage
            .metrics
            .insert(DerivationKey::for_metrics(metrics), metrics.clone());
        for record in converted {
            storage
                .financials
                .insert(DerivationKey::for_financials(record), record.clone());
        }
        Ok(())
    }

    async fn get_metrics(
        &self,
        key: &DerivationKey,
    ) -> RepositoryResult<Option<DerivedMetricsRecord>> {
        let storage = self.storage.read().await;
        Ok(storage.metrics.get(key).cloned())
    }

    async fn get_financials(&self, key: &DerivationKey) -> RepositoryResult<Option<ConvertedRecord>> {
        let storage = self.storage.read().await;
        Ok(storage.financials.get(key).cloned())
    }

    async fn count_metrics(&self) -> RepositoryResult<u64> {
        let storage = self.storage.read().await;
        Ok(storage.metrics.len() as u64)
    }
}
