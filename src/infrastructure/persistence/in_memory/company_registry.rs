//! # In-Memory Company Registry
//!
//! In-memory implementation of [`CompanyRegistry`] for testing.

use crate::domain::entities::CompanyProfile;
use crate::domain::value_objects::CompanyId;
use crate::infrastructure::persistence::traits::{CompanyRegistry, RepositoryResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory implementation of [`CompanyRegistry`].
#[derive(Debug, Clone)]
pub struct InMemoryCompanyRegistry {
    storage: Arc<RwLock<HashMap<CompanyId, CompanyProfile>>>,
}

impl InMemoryCompanyRegistry {
    /// Creates a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            storage: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Creates a registry pre-loaded with `profiles`.
    #[must_use]
    pub fn with_profiles<I>(profiles: I) -> Self
    where
        I: IntoIterator<Item = CompanyProfile>,
    {
        let storage = profiles
            .into_iter()
            .map(|profile| (profile.id().clone(), profile))
            .collect();
        Self {
            storage: Arc::new(RwLock::new(storage)),
        }
    }

    /// Returns the number of registered companies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.storage
            .try_read()
            .map(|guard| guard.len())
            .unwrap_or(0)
    }

    /// Returns true if no company is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryCompanyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CompanyRegistry for InMemoryCompanyRegistry {
    async fn save(&self, profile: &CompanyProfile) -> RepositoryResult<()> {
        let mut storage = self.storage.write().await;
        storage.insert(profile.id().clone(), profile.clone());
        Ok(())
    }

    async fn get(&self, company_id: &CompanyId) -> RepositoryResult<Option<CompanyProfile>> {
        let storage = self.storage.read().await;
        Ok(storage.get(company_id).cloned())
    }
}
