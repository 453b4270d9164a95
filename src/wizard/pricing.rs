//! Values derived from a session: price breakdown and estimated completion.

use chrono::Timelike;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::availability::TimeSlot;
use crate::wizard::session::BookingSession;

/// Price breakdown for the review and success screens.
///
/// Amounts are exact; use the `display_*` helpers for cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceSummary {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

impl PriceSummary {
    pub fn for_price(price: Decimal, tax_rate: Decimal) -> Self {
        let tax = price * tax_rate;
        Self {
            subtotal: price,
            tax,
            total: price + tax,
        }
    }

    /// Summary for the session's service, if one is chosen.
    pub fn for_session(session: &BookingSession, tax_rate: Decimal) -> Option<Self> {
        session.service().map(|s| Self::for_price(s.price, tax_rate))
    }

    pub fn display_subtotal(&self) -> String {
        format_money(self.subtotal)
    }

    pub fn display_tax(&self) -> String {
        format_money(self.tax)
    }

    pub fn display_total(&self) -> String {
        format_money(self.total)
    }
}

/// `$7.23` style rendering, rounding half away from zero to cents.
pub fn format_money(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("${rounded:.2}")
}

/// When the appointment is expected to end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "at")]
pub enum Completion {
    At(TimeSlot),
    /// No start time yet, or the service has no fixed end.
    Tbd,
}

impl std::fmt::Display for Completion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::At(slot) => write!(f, "{slot}"),
            Self::Tbd => write!(f, "TBD"),
        }
    }
}

/// Start time plus the longest the service can take.
pub fn estimated_completion(session: &BookingSession) -> Completion {
    let (Some(start), Some(service)) = (session.time(), session.service()) else {
        return Completion::Tbd;
    };
    match service.parsed_duration().upper_bound() {
        Some(length) => {
            let end = start.time() + length;
            Completion::At(TimeSlot::from_hm(end.hour(), end.minute()))
        }
        None => Completion::Tbd,
    }
}
