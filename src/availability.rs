//! Slot availability: time slots, the `AvailabilityOracle` contract, and the
//! demo calendar used by the app.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::config::BookingConfig;
use crate::error::AvailabilityError;

/// A bookable wall-clock slot, displayed as `"10:00 AM"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeSlot(NaiveTime);

impl TimeSlot {
    /// Build a slot from a 24-hour clock hour and minute.
    ///
    /// Out-of-range values clamp to midnight.
    pub fn from_hm(hour: u32, minute: u32) -> Self {
        Self(NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN))
    }

    pub fn time(&self) -> NaiveTime {
        self.0
    }

    /// The hourly slots offered on a regular business day, 9:00 AM to 5:00 PM.
    pub fn standard_day() -> Vec<TimeSlot> {
        (9..=17).map(|h| Self::from_hm(h, 0)).collect()
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%-I:%M %p"))
    }
}

impl FromStr for TimeSlot {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        NaiveTime::parse_from_str(s, "%I:%M %p")
            .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
            .map(Self)
            .map_err(|_| format!("Unrecognized time slot: {s}"))
    }
}

impl TryFrom<String> for TimeSlot {
    type Error = String;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<TimeSlot> for String {
    fn from(slot: TimeSlot) -> Self {
        slot.to_string()
    }
}

/// A slot paired with whether it can currently be booked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotAvailability {
    pub slot: TimeSlot,
    pub available: bool,
}

/// Answers whether a date/time slot can be booked.
#[async_trait]
pub trait AvailabilityOracle: Send + Sync {
    /// Whether `time` on `date` is open for booking.
    async fn is_slot_available(
        &self,
        date: NaiveDate,
        time: TimeSlot,
    ) -> Result<bool, AvailabilityError>;

    /// Whether the shop takes bookings on `date` at all.
    async fn is_date_open(&self, _date: NaiveDate) -> Result<bool, AvailabilityError> {
        Ok(true)
    }

    /// Every slot offered on `date`, with its availability.
    async fn slots_for(&self, date: NaiveDate) -> Result<Vec<SlotAvailability>, AvailabilityError> {
        let mut slots = Vec::new();
        for slot in TimeSlot::standard_day() {
            let available = self.is_slot_available(date, slot).await?;
            slots.push(SlotAvailability { slot, available });
        }
        Ok(slots)
    }
}

/// Stand-in calendar: closed on Sundays, a fixed set of slots blocked every
/// day, everything else within business hours open.
#[derive(Debug, Clone)]
pub struct DemoAvailability {
    blocked: Vec<TimeSlot>,
}

impl DemoAvailability {
    pub fn new(blocked: Vec<TimeSlot>) -> Self {
        Self { blocked }
    }

    pub fn from_config(config: &BookingConfig) -> Self {
        Self::new(config.blocked_slots.clone())
    }
}

impl Default for DemoAvailability {
    fn default() -> Self {
        Self::from_config(&BookingConfig::default())
    }
}

fn is_open_day(date: NaiveDate) -> bool {
    date.weekday() != Weekday::Sun
}

#[async_trait]
impl AvailabilityOracle for DemoAvailability {
    async fn is_date_open(&self, date: NaiveDate) -> Result<bool, AvailabilityError> {
        Ok(is_open_day(date))
    }

    async fn is_slot_available(
        &self,
        date: NaiveDate,
        time: TimeSlot,
    ) -> Result<bool, AvailabilityError> {
        if !is_open_day(date) {
            return Ok(false);
        }
        if !TimeSlot::standard_day().contains(&time) {
            return Ok(false);
        }
        Ok(!self.blocked.contains(&time))
    }
}
