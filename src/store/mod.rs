//! Persistence layer: libSQL-backed storage for bookings and the catalog.

pub mod libsql_backend;
pub mod migrations;
pub mod traits;

pub use libsql_backend::LibSqlBackend;
pub use traits::{Booking, BookingCounts, BookingFilter, BookingStatus, BookingStore};
