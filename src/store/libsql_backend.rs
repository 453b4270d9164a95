//! libSQL backend for bookings and the service catalog.
//!
//! Supports local file and in-memory databases.

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use libsql::{Connection, Database as LibSqlDatabase, params};
use rust_decimal::Decimal;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::availability::TimeSlot;
use crate::catalog::{CatalogProvider, Service};
use crate::error::{CatalogError, DatabaseError};
use crate::store::migrations;
use crate::store::traits::{Booking, BookingFilter, BookingStatus, BookingStore};
use crate::wizard::session::{PetType, WeightCategory};

/// libSQL database backend.
///
/// Stores a single connection that is reused for all operations.
pub struct LibSqlBackend {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlBackend {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
        };
        migrations::run_migrations(backend.conn()).await?;
        info!(path = %path.display(), "Database opened");
        Ok(backend)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Pool(format!("Failed to create in-memory database: {e}"))
            })?;

        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
        };
        migrations::run_migrations(backend.conn()).await?;
        Ok(backend)
    }

    fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Insert or replace catalog entries, keeping the given order.
    pub async fn seed_services(&self, services: &[Service]) -> Result<usize, DatabaseError> {
        let conn = self.conn();
        for (position, service) in services.iter().enumerate() {
            let features = serde_json::to_string(&service.features)
                .map_err(|e| DatabaseError::Serialization(format!("service features: {e}")))?;
            conn.execute(
                "INSERT OR REPLACE INTO services (id, title, description, price, duration, features, popular, position) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    service.id.as_str(),
                    service.title.as_str(),
                    service.description.as_str(),
                    service.price.to_string(),
                    service.duration.as_str(),
                    features,
                    i64::from(service.popular),
                    position as i64,
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("seed_services: {e}")))?;
        }
        info!(count = services.len(), "Service catalog seeded");
        Ok(services.len())
    }

    /// Whether the catalog table has any rows.
    pub async fn has_services(&self) -> Result<bool, DatabaseError> {
        let mut rows = self
            .conn()
            .query("SELECT COUNT(*) FROM services", ())
            .await
            .map_err(|e| DatabaseError::Query(format!("has_services: {e}")))?;
        match rows.next().await {
            Ok(Some(row)) => Ok(row.get::<i64>(0).unwrap_or(0) > 0),
            Ok(None) => Ok(false),
            Err(e) => Err(DatabaseError::Query(format!("has_services: {e}"))),
        }
    }

    async fn load_services(&self) -> Result<Vec<Service>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {SERVICE_COLUMNS} FROM services ORDER BY position ASC, id ASC"),
                (),
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("list_services: {e}")))?;

        let mut services = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            match row_to_service(&row) {
                Ok(service) => services.push(service),
                Err(e) => warn!("Skipping service row: {e}"),
            }
        }
        Ok(services)
    }
}

// ── Helper functions ────────────────────────────────────────────────

/// Parse an RFC 3339 or SQLite datetime string into DateTime<Utc>.
fn parse_datetime(s: &str) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return ndt.and_utc();
    }
    DateTime::<Utc>::MIN_UTC
}

/// The serde string form of a unit enum variant (`"guinea_pig"`, `"10_to_25"`).
fn enum_to_str<T: Serialize>(value: &T) -> Result<String, DatabaseError> {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::String(s)) => Ok(s),
        Ok(other) => Err(DatabaseError::Serialization(format!(
            "expected string variant, got {other}"
        ))),
        Err(e) => Err(DatabaseError::Serialization(e.to_string())),
    }
}

fn str_to_enum<T: DeserializeOwned>(column: &str, s: &str) -> Result<T, DatabaseError> {
    serde_json::from_value(serde_json::Value::String(s.to_string()))
        .map_err(|e| DatabaseError::Serialization(format!("{column} {s:?}: {e}")))
}

fn parse_column<T: FromStr>(column: &str, s: &str) -> Result<T, DatabaseError>
where
    T::Err: std::fmt::Display,
{
    s.parse::<T>()
        .map_err(|e| DatabaseError::Serialization(format!("{column} {s:?}: {e}")))
}

/// Convert `Option<String>` to libsql Value.
fn opt_text_owned(s: Option<String>) -> libsql::Value {
    match s {
        Some(s) => libsql::Value::Text(s),
        None => libsql::Value::Null,
    }
}

fn row_err(e: libsql::Error) -> DatabaseError {
    DatabaseError::Query(format!("row read: {e}"))
}

/// Column order matches BOOKING_COLUMNS.
fn row_to_booking(row: &libsql::Row) -> Result<Booking, DatabaseError> {
    let price: String = row.get(3).map_err(row_err)?;
    let date: String = row.get(4).map_err(row_err)?;
    let time: String = row.get(5).map_err(row_err)?;
    let pet_type: String = row.get(7).map_err(row_err)?;
    let pet_age: Option<i64> = row.get(8).ok();
    let pet_weight: Option<String> = row.get(9).ok();
    let status: String = row.get(11).map_err(row_err)?;
    let created: String = row.get(12).map_err(row_err)?;

    Ok(Booking {
        id: row.get(0).map_err(row_err)?,
        service_id: row.get(1).map_err(row_err)?,
        service_title: row.get(2).map_err(row_err)?,
        price: parse_column::<Decimal>("price", &price)?,
        date: NaiveDate::parse_from_str(&date, "%Y-%m-%d")
            .map_err(|e| DatabaseError::Serialization(format!("date {date:?}: {e}")))?,
        time: parse_column::<TimeSlot>("time", &time)?,
        pet_name: row.get(6).map_err(row_err)?,
        pet_type: str_to_enum::<PetType>("pet_type", &pet_type)?,
        pet_age: pet_age.and_then(|a| u8::try_from(a).ok()),
        pet_weight: pet_weight
            .map(|w| str_to_enum::<WeightCategory>("pet_weight", &w))
            .transpose()?,
        notes: row.get(10).ok(),
        status: parse_column::<BookingStatus>("status", &status)?,
        created_at: parse_datetime(&created),
    })
}

/// Column order matches SERVICE_COLUMNS.
fn row_to_service(row: &libsql::Row) -> Result<Service, DatabaseError> {
    let id: String = row.get(0).map_err(row_err)?;
    let price: String = row.get(3).map_err(row_err)?;
    let features: String = row.get::<String>(5).unwrap_or_else(|_| "[]".into());
    let popular: i64 = row.get(6).unwrap_or(0);

    let features: Vec<String> = serde_json::from_str(&features)
        .map_err(|e| DatabaseError::Serialization(format!("features for {id}: {e}")))?;

    let service = Service::new(
        id,
        row.get::<String>(1).map_err(row_err)?,
        row.get::<String>(2).unwrap_or_default(),
        parse_column::<Decimal>("price", &price)?,
        row.get::<String>(4).map_err(row_err)?,
    )
    .map_err(|e| DatabaseError::Serialization(e.to_string()))?
    .with_features(features);

    Ok(if popular != 0 { service.popular() } else { service })
}

// ── Trait implementations ───────────────────────────────────────────

const BOOKING_COLUMNS: &str = "id, service_id, service_title, price, date, time, pet_name, pet_type, pet_age, pet_weight, notes, status, created_at";

const SERVICE_COLUMNS: &str = "id, title, description, price, duration, features, popular";

#[async_trait]
impl BookingStore for LibSqlBackend {
    async fn save(&self, booking: &Booking) -> Result<String, DatabaseError> {
        let pet_weight = booking.pet_weight.as_ref().map(enum_to_str).transpose()?;
        let pet_age = match booking.pet_age {
            Some(age) => libsql::Value::Integer(i64::from(age)),
            None => libsql::Value::Null,
        };

        self.conn()
            .execute(
                "INSERT INTO bookings (id, service_id, service_title, price, date, time, pet_name, pet_type, pet_age, pet_weight, notes, status, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                params![
                    booking.id.as_str(),
                    booking.service_id.as_str(),
                    booking.service_title.as_str(),
                    booking.price.to_string(),
                    booking.date.format("%Y-%m-%d").to_string(),
                    booking.time.to_string(),
                    booking.pet_name.as_str(),
                    enum_to_str(&booking.pet_type)?,
                    pet_age,
                    opt_text_owned(pet_weight),
                    opt_text_owned(booking.notes.clone()),
                    booking.status.to_string(),
                    booking.created_at.to_rfc3339(),
                ],
            )
            .await
            .map_err(|e| {
                let message = e.to_string();
                if message.contains("UNIQUE constraint") {
                    DatabaseError::Constraint(format!("booking {} already exists", booking.id))
                } else {
                    DatabaseError::Query(format!("save_booking: {message}"))
                }
            })?;

        debug!(booking_id = %booking.id, service = %booking.service_id, "Booking saved");
        Ok(booking.id.clone())
    }

    async fn get(&self, id: &str) -> Result<Option<Booking>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1"),
                params![id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_booking: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_booking(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("get_booking: {e}"))),
        }
    }

    async fn list(
        &self,
        filter: BookingFilter,
        today: NaiveDate,
    ) -> Result<Vec<Booking>, DatabaseError> {
        let today_str = today.format("%Y-%m-%d").to_string();
        let conn = self.conn();
        let mut rows = match filter {
            BookingFilter::Upcoming => {
                conn.query(
                    &format!(
                        "SELECT {BOOKING_COLUMNS} FROM bookings WHERE status = 'confirmed' AND date >= ?1"
                    ),
                    params![today_str],
                )
                .await
            }
            BookingFilter::Past => {
                conn.query(
                    &format!(
                        "SELECT {BOOKING_COLUMNS} FROM bookings WHERE status != 'confirmed' OR date < ?1"
                    ),
                    params![today_str],
                )
                .await
            }
            BookingFilter::All => {
                conn.query(
                    &format!("SELECT {BOOKING_COLUMNS} FROM bookings ORDER BY created_at DESC"),
                    (),
                )
                .await
            }
        }
        .map_err(|e| DatabaseError::Query(format!("list_bookings: {e}")))?;

        let mut bookings = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            match row_to_booking(&row) {
                Ok(booking) => bookings.push(booking),
                Err(e) => warn!("Skipping booking row: {e}"),
            }
        }

        // Slot labels don't sort as text, so order by (date, time) here.
        match filter {
            BookingFilter::Upcoming => bookings.sort_by_key(|b| (b.date, b.time)),
            BookingFilter::Past => {
                bookings.sort_by(|a, b| (b.date, b.time).cmp(&(a.date, a.time)))
            }
            BookingFilter::All => {}
        }

        debug!(filter = ?filter, count = bookings.len(), "Bookings listed");
        Ok(bookings)
    }

    async fn update_status(&self, id: &str, status: BookingStatus) -> Result<(), DatabaseError> {
        let affected = self
            .conn()
            .execute(
                "UPDATE bookings SET status = ?1 WHERE id = ?2",
                params![status.to_string(), id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("update_booking_status: {e}")))?;

        if affected == 0 {
            return Err(DatabaseError::NotFound {
                entity: "booking".into(),
                id: id.to_string(),
            });
        }

        debug!(booking_id = id, status = %status, "Booking status updated");
        Ok(())
    }
}

#[async_trait]
impl CatalogProvider for LibSqlBackend {
    async fn list_services(&self) -> Result<Vec<Service>, CatalogError> {
        self.load_services()
            .await
            .map_err(|e| CatalogError::Unavailable(e.to_string()))
    }

    async fn get_service(&self, id: &str) -> Result<Option<Service>, CatalogError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {SERVICE_COLUMNS} FROM services WHERE id = ?1"),
                params![id],
            )
            .await
            .map_err(|e| CatalogError::Unavailable(format!("get_service: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => row_to_service(&row)
                .map(Some)
                .map_err(|e| CatalogError::Unavailable(e.to_string())),
            Ok(None) => Ok(None),
            Err(e) => Err(CatalogError::Unavailable(format!("get_service: {e}"))),
        }
    }
}
