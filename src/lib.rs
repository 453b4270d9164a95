//! PawCare: pet-service booking core.

pub mod availability;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod error;
pub mod store;
pub mod terminal;
pub mod wizard;
