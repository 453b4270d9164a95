//! Service catalog data model.

use std::sync::LazyLock;

use chrono::Duration;
use regex::Regex;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

/// A bookable service offered by the shop. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    /// Unique identifier, e.g. `"grooming-premium"`.
    pub id: String,
    pub title: String,
    pub description: String,
    /// Price before tax.
    pub price: Decimal,
    /// Free-text duration as shown to customers ("2-3 hours", "Per day").
    pub duration: String,
    /// Ordered list of what the service includes.
    #[serde(default)]
    pub features: Vec<String>,
    /// Highlighted as "most popular" in listings.
    #[serde(default)]
    pub popular: bool,
}

impl Service {
    /// Create a service, rejecting blank identifiers and negative prices.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        price: Decimal,
        duration: impl Into<String>,
    ) -> Result<Self, CatalogError> {
        let id = id.into();
        let title = title.into();
        if id.trim().is_empty() {
            return Err(CatalogError::InvalidService {
                id,
                reason: "id must not be empty".into(),
            });
        }
        if title.trim().is_empty() {
            return Err(CatalogError::InvalidService {
                id,
                reason: "title must not be empty".into(),
            });
        }
        if price.is_sign_negative() {
            return Err(CatalogError::InvalidService {
                id,
                reason: format!("price must not be negative (got {price})"),
            });
        }
        Ok(Self {
            id,
            title,
            description: description.into(),
            price,
            duration: duration.into(),
            features: Vec::new(),
            popular: false,
        })
    }

    /// Builder: set the feature list.
    pub fn with_features<I, S>(mut self, features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.features = features.into_iter().map(Into::into).collect();
        self
    }

    /// Builder: mark as popular.
    pub fn popular(mut self) -> Self {
        self.popular = true;
        self
    }

    /// Structured reading of the free-text duration.
    pub fn parsed_duration(&self) -> ServiceDuration {
        ServiceDuration::parse(&self.duration)
    }

    pub fn category(&self) -> ServiceCategory {
        ServiceCategory::from_title(&self.title)
    }

    /// Short "what's included" line for the review screen.
    pub fn inclusions(&self) -> &'static str {
        let title = self.title.to_lowercase();
        if title.contains("basic grooming") {
            "Bath, brush, nail trim, ear cleaning"
        } else if title.contains("full grooming") {
            "Bath, brush, haircut, nail trim, ear cleaning, teeth brushing"
        } else if title.contains("sitting") {
            "Feeding, playtime, companionship, basic care"
        } else if title.contains("walking") {
            "30-60 min walk, exercise, fresh air"
        } else if title.contains("training") {
            "Basic commands, behavioral guidance, progress report"
        } else {
            "Professional pet care service"
        }
    }

    /// What the owner should do before drop-off.
    pub fn preparation_notes(&self) -> &'static str {
        match self.category() {
            ServiceCategory::Grooming => "Please ensure pet is up-to-date on vaccinations",
            ServiceCategory::Sitting => "Provide feeding schedule and emergency contacts",
            ServiceCategory::Walking => "Ensure pet is comfortable with leash",
            ServiceCategory::Training => "Bring favorite treats and any behavioral concerns",
            ServiceCategory::Boarding | ServiceCategory::Other => {
                "Follow pre-service instructions provided"
            }
        }
    }
}

/// Broad grouping derived from the service title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceCategory {
    Grooming,
    Sitting,
    Walking,
    Training,
    Boarding,
    Other,
}

impl ServiceCategory {
    pub fn from_title(title: &str) -> Self {
        let title = title.to_lowercase();
        if title.contains("grooming") {
            Self::Grooming
        } else if title.contains("sitting") {
            Self::Sitting
        } else if title.contains("walking") {
            Self::Walking
        } else if title.contains("training") {
            Self::Training
        } else if title.contains("boarding") {
            Self::Boarding
        } else {
            Self::Other
        }
    }
}

impl std::fmt::Display for ServiceCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Grooming => "Professional Grooming",
            Self::Sitting => "Pet Care Service",
            Self::Walking => "Exercise & Activity",
            Self::Training => "Behavioral Training",
            Self::Boarding => "Overnight Care",
            Self::Other => "Pet Service",
        };
        write!(f, "{s}")
    }
}

/// Matches "1 hour", "2-3 hours", "30-45 minutes", "90 min".
static DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(\d+)\s*(?:-|to)?\s*(\d+)?\s*(hours?|hrs?|minutes?|mins?)\b")
        .expect("duration regex is valid")
});

/// Structured view of a service's free-text duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceDuration {
    /// A bounded appointment, possibly given as a range.
    Range { shortest: Duration, longest: Duration },
    /// Billed per day with no fixed end (pet sitting).
    PerDay,
    /// Text we could not interpret.
    Unspecified,
}

impl ServiceDuration {
    pub fn parse(text: &str) -> Self {
        if text.trim().eq_ignore_ascii_case("per day") {
            return Self::PerDay;
        }
        let Some(caps) = DURATION_RE.captures(text) else {
            return Self::Unspecified;
        };
        let first: i64 = match caps[1].parse() {
            Ok(n) => n,
            Err(_) => return Self::Unspecified,
        };
        let second: i64 = caps
            .get(2)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(first);
        let unit = |n: i64| {
            if caps[3].to_lowercase().starts_with('h') {
                Duration::try_hours(n)
            } else {
                Duration::try_minutes(n)
            }
        };
        let (lo, hi) = if first <= second { (first, second) } else { (second, first) };
        match (unit(lo), unit(hi)) {
            (Some(shortest), Some(longest)) => Self::Range { shortest, longest },
            _ => Self::Unspecified,
        }
    }

    /// The longest the appointment can take, if bounded.
    pub fn upper_bound(&self) -> Option<Duration> {
        match self {
            Self::Range { longest, .. } => Some(*longest),
            Self::PerDay | Self::Unspecified => None,
        }
    }
}

/// The catalog the shop ships with.
pub fn sample_services() -> Vec<Service> {
    let entries: [(&str, &str, &str, Decimal, &str, &[&str], bool); 6] = [
        (
            "grooming-basic",
            "Basic Grooming",
            "Essential grooming services including bath, brush, nail trim, and ear cleaning",
            dec!(45.00),
            "1-2 hours",
            &["Bath & Dry", "Brush & Detangle", "Nail Trim", "Ear Cleaning"],
            false,
        ),
        (
            "grooming-premium",
            "Premium Grooming",
            "Complete grooming package with styling, teeth cleaning, and premium products",
            dec!(85.00),
            "2-3 hours",
            &[
                "Everything in Basic",
                "Professional Styling",
                "Teeth Cleaning",
                "Premium Products",
                "Nail Polish",
            ],
            true,
        ),
        (
            "veterinary-checkup",
            "Veterinary Checkup",
            "Comprehensive health examination by licensed veterinarians",
            dec!(75.00),
            "30-45 minutes",
            &[
                "Physical Examination",
                "Vaccination Check",
                "Health Report",
                "Treatment Recommendations",
            ],
            false,
        ),
        (
            "pet-sitting",
            "Pet Sitting",
            "Professional in-home pet care while you're away",
            dec!(35.00),
            "Per day",
            &["Daily Visits", "Feeding & Water", "Exercise & Play", "Photo Updates"],
            false,
        ),
        (
            "dog-walking",
            "Dog Walking",
            "Daily exercise and socialization for your furry friend",
            dec!(25.00),
            "30-60 minutes",
            &["Individual Walks", "Exercise & Play", "Socialization", "GPS Tracking"],
            false,
        ),
        (
            "pet-training",
            "Pet Training",
            "Professional behavioral training and obedience classes",
            dec!(60.00),
            "1 hour",
            &[
                "Behavioral Assessment",
                "Custom Training Plan",
                "Progress Tracking",
                "Owner Education",
            ],
            false,
        ),
    ];

    entries
        .into_iter()
        .filter_map(|(id, title, desc, price, duration, features, popular)| {
            let service = Service::new(id, title, desc, price, duration)
                .ok()?
                .with_features(features.iter().copied());
            Some(if popular { service.popular() } else { service })
        })
        .collect()
}
