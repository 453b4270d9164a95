//! `CatalogProvider` contract and the in-memory catalog.

use async_trait::async_trait;

use crate::catalog::model::{Service, sample_services};
use crate::error::CatalogError;

/// Read-only source of offerable services.
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    /// All services, in display order.
    async fn list_services(&self) -> Result<Vec<Service>, CatalogError>;

    /// Look up a single service by id.
    async fn get_service(&self, id: &str) -> Result<Option<Service>, CatalogError> {
        Ok(self
            .list_services()
            .await?
            .into_iter()
            .find(|s| s.id == id))
    }
}

/// Catalog held entirely in memory.
#[derive(Debug, Clone)]
pub struct StaticCatalog {
    services: Vec<Service>,
}

impl StaticCatalog {
    /// Build from an explicit list. Duplicate ids are rejected.
    pub fn new(services: Vec<Service>) -> Result<Self, CatalogError> {
        for (i, service) in services.iter().enumerate() {
            if services[..i].iter().any(|s| s.id == service.id) {
                return Err(CatalogError::InvalidService {
                    id: service.id.clone(),
                    reason: "duplicate service id".into(),
                });
            }
        }
        Ok(Self { services })
    }

    /// The shop's default catalog.
    pub fn sample() -> Self {
        Self {
            services: sample_services(),
        }
    }
}

#[async_trait]
impl CatalogProvider for StaticCatalog {
    async fn list_services(&self) -> Result<Vec<Service>, CatalogError> {
        Ok(self.services.clone())
    }
}
