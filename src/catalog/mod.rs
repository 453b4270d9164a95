//! Service catalog: what can be booked, and where the list comes from.

pub mod model;
pub mod provider;

pub use model::{Service, ServiceCategory, ServiceDuration, sample_services};
pub use provider::{CatalogProvider, StaticCatalog};
