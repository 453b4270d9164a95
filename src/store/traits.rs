//! `BookingStore` trait and the persisted booking record.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::availability::TimeSlot;
use crate::error::{DatabaseError, WizardError};
use crate::wizard::session::{BookingSession, PetType, WeightCategory};

/// Lifecycle status of a persisted booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Confirmed,
    Completed,
    Cancelled,
}

impl BookingStatus {
    /// Confirmed bookings can be completed or cancelled; nothing else moves.
    pub fn can_transition_to(&self, target: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!((self, target), (Confirmed, Completed) | (Confirmed, Cancelled))
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Confirmed => "confirmed",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for BookingStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "confirmed" => Ok(Self::Confirmed),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("Unknown booking status: {s}")),
        }
    }
}

/// Which bookings to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingFilter {
    /// Confirmed and dated today or later, soonest first.
    Upcoming,
    /// Completed, cancelled, or confirmed but dated before today; latest first.
    Past,
    /// Everything, most recently created first.
    All,
}

impl BookingFilter {
    /// Whether `booking` belongs in this listing as of `today`.
    pub fn matches(&self, booking: &Booking, today: NaiveDate) -> bool {
        match self {
            Self::Upcoming => booking.status == BookingStatus::Confirmed && booking.date >= today,
            Self::Past => {
                booking.status.is_terminal()
                    || (booking.status == BookingStatus::Confirmed && booking.date < today)
            }
            Self::All => true,
        }
    }
}

impl std::str::FromStr for BookingFilter {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upcoming" => Ok(Self::Upcoming),
            "past" => Ok(Self::Past),
            "all" => Ok(Self::All),
            _ => Err(format!("Unknown booking filter: {s}")),
        }
    }
}

/// A confirmed booking as persisted. Only `status` changes after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    /// Short upper-case reference shown to the customer, e.g. `"3F9A0C1B"`.
    pub id: String,
    pub service_id: String,
    /// Title and price as they were when booked.
    pub service_title: String,
    pub price: Decimal,
    pub date: NaiveDate,
    pub time: TimeSlot,
    pub pet_name: String,
    pub pet_type: PetType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pet_age: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pet_weight: Option<WeightCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    /// Snapshot a complete session under the given id and timestamp.
    pub fn from_session(
        session: &BookingSession,
        id: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, WizardError> {
        let (Some(service), Some(date), Some(time), Some(pet_name), Some(pet_type)) = (
            session.service(),
            session.date(),
            session.time(),
            session.pet_name(),
            session.pet_type(),
        ) else {
            return Err(WizardError::IncompleteSession {
                missing: session.missing_fields().join(", "),
            });
        };

        Ok(Self {
            id: id.into(),
            service_id: service.id.clone(),
            service_title: service.title.clone(),
            price: service.price,
            date,
            time,
            pet_name: pet_name.to_string(),
            pet_type,
            pet_age: session.pet_age(),
            pet_weight: session.pet_weight(),
            notes: session.notes().map(str::to_string),
            status: BookingStatus::Confirmed,
            created_at,
        })
    }
}

/// Upcoming/past tallies for the management screen header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingCounts {
    pub upcoming: usize,
    pub past: usize,
    pub total: usize,
}

/// Persistence for finalized bookings.
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Persist a new booking. Returns its id.
    async fn save(&self, booking: &Booking) -> Result<String, DatabaseError>;

    /// Fetch one booking.
    async fn get(&self, id: &str) -> Result<Option<Booking>, DatabaseError>;

    /// List bookings for a filter, ordered as the filter documents.
    async fn list(
        &self,
        filter: BookingFilter,
        today: NaiveDate,
    ) -> Result<Vec<Booking>, DatabaseError>;

    /// Change a booking's status. Fails with `NotFound` for unknown ids.
    async fn update_status(&self, id: &str, status: BookingStatus) -> Result<(), DatabaseError>;

    /// Tally upcoming/past bookings as of `today`.
    async fn counts(&self, today: NaiveDate) -> Result<BookingCounts, DatabaseError> {
        let all = self.list(BookingFilter::All, today).await?;
        Ok(BookingCounts {
            upcoming: all
                .iter()
                .filter(|b| BookingFilter::Upcoming.matches(b, today))
                .count(),
            past: all
                .iter()
                .filter(|b| BookingFilter::Past.matches(b, today))
                .count(),
            total: all.len(),
        })
    }
}
