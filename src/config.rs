//! Configuration types.

use std::path::PathBuf;
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::availability::TimeSlot;
use crate::error::ConfigError;

/// Default sales tax applied to the service price.
pub const DEFAULT_TAX_RATE: Decimal = dec!(0.085);

/// Booking core configuration.
#[derive(Debug, Clone)]
pub struct BookingConfig {
    /// Path of the libSQL database file.
    pub db_path: PathBuf,
    /// Tax rate applied to the service price (0.085 = 8.5%).
    pub tax_rate: Decimal,
    /// How many days ahead (from today) are offered for scheduling.
    pub booking_window_days: u32,
    /// Slots that are never bookable, on any day.
    pub blocked_slots: Vec<TimeSlot>,
    /// Upper bound (inclusive) for a pet's age in years.
    pub max_pet_age: u8,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("./data/pawcare.db"),
            tax_rate: DEFAULT_TAX_RATE,
            booking_window_days: 14,
            blocked_slots: vec![TimeSlot::from_hm(12, 0), TimeSlot::from_hm(15, 0)],
            max_pet_age: 30,
        }
    }
}

impl BookingConfig {
    /// Build a config from `PAWCARE_*` environment variables.
    ///
    /// Unset variables keep their defaults. Malformed values are logged and
    /// ignored so a typo never prevents the app from starting.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("PAWCARE_DB_PATH") {
            config.db_path = PathBuf::from(path);
        }

        if let Some(rate) = read_env("PAWCARE_TAX_RATE", parse_tax_rate) {
            config.tax_rate = rate;
        }

        if let Some(days) = read_env("PAWCARE_BOOKING_WINDOW_DAYS", |s| {
            s.parse::<u32>().map_err(|e| invalid("PAWCARE_BOOKING_WINDOW_DAYS", e))
        }) {
            config.booking_window_days = days;
        }

        if let Some(slots) = read_env("PAWCARE_BLOCKED_SLOTS", parse_slot_list) {
            config.blocked_slots = slots;
        }

        if let Some(age) = read_env("PAWCARE_MAX_PET_AGE", |s| {
            s.parse::<u8>().map_err(|e| invalid("PAWCARE_MAX_PET_AGE", e))
        }) {
            config.max_pet_age = age;
        }

        config
    }
}

fn read_env<T>(key: &str, parse: impl Fn(&str) -> Result<T, ConfigError>) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match parse(raw.trim()) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(key, error = %e, "Ignoring malformed configuration value");
            None
        }
    }
}

fn invalid(key: &str, err: impl std::fmt::Display) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: err.to_string(),
    }
}

/// Parse a tax rate. Must be within [0, 1).
pub fn parse_tax_rate(s: &str) -> Result<Decimal, ConfigError> {
    let rate = Decimal::from_str(s).map_err(|e| invalid("PAWCARE_TAX_RATE", e))?;
    if rate < Decimal::ZERO || rate >= Decimal::ONE {
        return Err(invalid("PAWCARE_TAX_RATE", "must be between 0 and 1"));
    }
    Ok(rate)
}

/// Parse a comma-separated slot list like `"12:00 PM, 3:00 PM"`.
/// An empty string means no blocked slots.
pub fn parse_slot_list(s: &str) -> Result<Vec<TimeSlot>, ConfigError> {
    s.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| TimeSlot::from_str(part).map_err(|e| invalid("PAWCARE_BLOCKED_SLOTS", e)))
        .collect()
}
