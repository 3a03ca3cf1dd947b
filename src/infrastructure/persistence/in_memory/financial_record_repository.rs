//! # In-Memory Financial Record Repository
//!
//! In-memory implementation of [`FinancialRecordRepository`] for testing
//! and offline runs.
//!
//! Records are keyed by `(company, year, quarter)` in a `BTreeMap`, so a
//! company's history is contiguous and range scans come back oldest first.

use crate::domain::entities::FinancialRecord;
use crate::domain::value_objects::{CompanyId, FiscalQuarter};
use crate::infrastructure::persistence::traits::{FinancialRecordRepository, RepositoryResult};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

type RecordKey = (CompanyId, i32, u8);

fn key(company_id: &CompanyId, period: FiscalQuarter) -> RecordKey {
    (company_id.clone(), period.year(), period.quarter())
}

/// In-memory implementation of [`FinancialRecordRepository`].
#[derive(Debug, Clone)]
pub struct InMemoryFinancialRecordRepository {
    storage: Arc<RwLock<BTreeMap<RecordKey, FinancialRecord>>>,
}

impl InMemoryFinancialRecordRepository {
    /// Creates a new empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self {
            storage: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }

    /// Creates a repository pre-loaded with `records`.
    ///
    /// Later records supersede earlier ones for the same company-quarter.
    #[must_use]
    pub fn with_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = FinancialRecord>,
    {
        let storage = records
            .into_iter()
            .map(|record| {
                let key = (
                    record.company_id().clone(),
                    record.reporting_year(),
                    record.reporting_quarter(),
                );
                (key, record)
            })
            .collect();
        Self {
            storage: Arc::new(RwLock::new(storage)),
        }
    }

    /// Returns the number of records in the repository.
    #[must_use]
    pub fn len(&self) -> usize {
        self.storage
            .try_read()
            .map(|guard| guard.len())
            .unwrap_or(0)
    }

    /// Returns true if the repository is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clears all records from the repository.
    pub async fn clear(&self) {
        let mut storage = self.storage.write().await;
        storage.clear();
    }
}

impl Default for InMemoryFinancialRecordRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FinancialRecordRepository for InMemoryFinancialRecordRepository {
    async fn save(&self, record: &FinancialRecord) -> RepositoryResult<()> {
        let mut storage = self.storage.write().await;
        storage.insert(
            (
                record.company_id().clone(),
                record.reporting_year(),
                record.reporting_quarter(),
            ),
            record.clone(),
        );
        Ok(())
    }

    async fn get(
        &self,
        company_id: &CompanyId,
        period: FiscalQuarter,
    ) -> RepositoryResult<Option<FinancialRecord>> {
        let storage = self.storage.read().await;
        Ok(storage.get(&key(company_id, period)).cloned())
    }

    async fn find_range(
        &self,
        company_id: &CompanyId,
        from: FiscalQuarter,
        to: FiscalQuarter,
    ) -> RepositoryResult<Vec<FinancialRecord>> {
        if from > to {
            return Ok(Vec::new());
        }
        let storage = self.storage.read().await;
        Ok(storage
            .range(key(company_id, from)..=key(company_id, to))
            .map(|(_, record)| record.clone())
            .collect())
    }
}
