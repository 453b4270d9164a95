//! Booking session: the record accumulated across wizard steps, and the
//! patches screens hand back to the wizard.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::availability::TimeSlot;
use crate::catalog::Service;
use crate::error::WizardError;

/// Kind of animal being booked in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PetType {
    Dog,
    Cat,
    Bird,
    Rabbit,
    Hamster,
    GuineaPig,
    Fish,
    Reptile,
    Ferret,
    Other,
}

impl PetType {
    pub const ALL: [PetType; 10] = [
        Self::Dog,
        Self::Cat,
        Self::Bird,
        Self::Rabbit,
        Self::Hamster,
        Self::GuineaPig,
        Self::Fish,
        Self::Reptile,
        Self::Ferret,
        Self::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Dog => "Dog",
            Self::Cat => "Cat",
            Self::Bird => "Bird",
            Self::Rabbit => "Rabbit",
            Self::Hamster => "Hamster",
            Self::GuineaPig => "Guinea Pig",
            Self::Fish => "Fish",
            Self::Reptile => "Reptile",
            Self::Ferret => "Ferret",
            Self::Other => "Other",
        }
    }
}

impl std::fmt::Display for PetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for PetType {
    type Err = String;
    /// Accepts the display label ("Guinea Pig") or the snake_case form,
    /// case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('_', " ");
        Self::ALL
            .into_iter()
            .find(|t| t.label().to_lowercase() == wanted)
            .ok_or_else(|| format!("Unknown pet type: {s}"))
    }
}

/// Weight band used for handling and pricing notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeightCategory {
    #[serde(rename = "under_10")]
    Under10,
    #[serde(rename = "10_to_25")]
    From10To25,
    #[serde(rename = "25_to_50")]
    From25To50,
    #[serde(rename = "50_to_75")]
    From50To75,
    #[serde(rename = "75_to_100")]
    From75To100,
    #[serde(rename = "over_100")]
    Over100,
}

impl WeightCategory {
    pub const ALL: [WeightCategory; 6] = [
        Self::Under10,
        Self::From10To25,
        Self::From25To50,
        Self::From50To75,
        Self::From75To100,
        Self::Over100,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Under10 => "Under 10 lbs",
            Self::From10To25 => "10-25 lbs",
            Self::From25To50 => "25-50 lbs",
            Self::From50To75 => "50-75 lbs",
            Self::From75To100 => "75-100 lbs",
            Self::Over100 => "Over 100 lbs",
        }
    }
}

impl std::fmt::Display for WeightCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for WeightCategory {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|w| w.label().to_lowercase() == wanted)
            .or_else(|| serde_json::from_value(serde_json::Value::String(wanted)).ok())
            .ok_or_else(|| format!("Unknown weight category: {s}"))
    }
}

/// Partial set of session fields produced by one screen.
///
/// `None` leaves a field alone. The optional pet details use a nested
/// `Option` so a screen can clear them: `Some(None)` unsets the field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionPatch {
    pub service: Option<Service>,
    pub date: Option<NaiveDate>,
    pub time: Option<TimeSlot>,
    pub pet_name: Option<String>,
    pub pet_type: Option<PetType>,
    pub pet_age: Option<Option<u8>>,
    pub pet_weight: Option<Option<WeightCategory>>,
    pub notes: Option<Option<String>>,
}

impl SessionPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn service(mut self, service: Service) -> Self {
        self.service = Some(service);
        self
    }

    pub fn date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn time(mut self, time: TimeSlot) -> Self {
        self.time = Some(time);
        self
    }

    pub fn pet_name(mut self, name: impl Into<String>) -> Self {
        self.pet_name = Some(name.into());
        self
    }

    pub fn pet_type(mut self, pet_type: PetType) -> Self {
        self.pet_type = Some(pet_type);
        self
    }

    pub fn pet_age(mut self, age: Option<u8>) -> Self {
        self.pet_age = Some(age);
        self
    }

    pub fn pet_weight(mut self, weight: Option<WeightCategory>) -> Self {
        self.pet_weight = Some(weight);
        self
    }

    pub fn notes(mut self, notes: Option<String>) -> Self {
        self.notes = Some(notes);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Names of the fields this patch writes.
    pub fn touched_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.service.is_some() {
            fields.push("service");
        }
        if self.date.is_some() {
            fields.push("date");
        }
        if self.time.is_some() {
            fields.push("time");
        }
        if self.pet_name.is_some() {
            fields.push("pet_name");
        }
        if self.pet_type.is_some() {
            fields.push("pet_type");
        }
        if self.pet_age.is_some() {
            fields.push("pet_age");
        }
        if self.pet_weight.is_some() {
            fields.push("pet_weight");
        }
        if self.notes.is_some() {
            fields.push("notes");
        }
        fields
    }
}

/// The booking being assembled by the wizard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookingSession {
    service: Option<Service>,
    date: Option<NaiveDate>,
    time: Option<TimeSlot>,
    pet_name: Option<String>,
    pet_type: Option<PetType>,
    pet_age: Option<u8>,
    pet_weight: Option<WeightCategory>,
    notes: Option<String>,
    booking_id: Option<String>,
    created_at: Option<DateTime<Utc>>,
}

impl BookingSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn service(&self) -> Option<&Service> {
        self.service.as_ref()
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    pub fn time(&self) -> Option<TimeSlot> {
        self.time
    }

    pub fn pet_name(&self) -> Option<&str> {
        self.pet_name.as_deref()
    }

    pub fn pet_type(&self) -> Option<PetType> {
        self.pet_type
    }

    pub fn pet_age(&self) -> Option<u8> {
        self.pet_age
    }

    pub fn pet_weight(&self) -> Option<WeightCategory> {
        self.pet_weight
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn booking_id(&self) -> Option<&str> {
        self.booking_id.as_deref()
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    /// Service, date, time, pet name and pet type are all set.
    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// Required fields that are still unset, in flow order.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.service.is_none() {
            missing.push("service");
        }
        if self.date.is_none() {
            missing.push("date");
        }
        if self.time.is_none() {
            missing.push("time");
        }
        if self.pet_name.is_none() {
            missing.push("pet_name");
        }
        if self.pet_type.is_none() {
            missing.push("pet_type");
        }
        missing
    }

    /// A booking id has been assigned; the session no longer changes.
    pub fn is_frozen(&self) -> bool {
        self.booking_id.is_some()
    }

    /// Merge `patch` field by field.
    ///
    /// Moving to a different date drops the chosen time unless the patch
    /// supplies a new one.
    pub fn apply(&mut self, patch: SessionPatch) -> Result<(), WizardError> {
        if let Some(id) = &self.booking_id {
            return Err(WizardError::SessionFrozen {
                booking_id: id.clone(),
            });
        }

        if let Some(service) = patch.service {
            self.service = Some(service);
        }
        if let Some(date) = patch.date {
            if self.date != Some(date) {
                self.time = None;
            }
            self.date = Some(date);
        }
        if let Some(time) = patch.time {
            self.time = Some(time);
        }
        if let Some(name) = patch.pet_name {
            self.pet_name = Some(name.trim().to_string());
        }
        if let Some(pet_type) = patch.pet_type {
            self.pet_type = Some(pet_type);
        }
        if let Some(age) = patch.pet_age {
            self.pet_age = age;
        }
        if let Some(weight) = patch.pet_weight {
            self.pet_weight = weight;
        }
        if let Some(notes) = patch.notes {
            self.notes = notes.filter(|n| !n.trim().is_empty());
        }
        Ok(())
    }

    /// A copy with `patch` applied, leaving `self` untouched.
    pub fn merged(&self, patch: SessionPatch) -> Result<Self, WizardError> {
        let mut candidate = self.clone();
        candidate.apply(patch)?;
        Ok(candidate)
    }

    /// Stamp the confirmation id and time. After this the session is frozen.
    pub(crate) fn freeze(&mut self, booking_id: String, created_at: DateTime<Utc>) {
        self.booking_id = Some(booking_id);
        self.created_at = Some(created_at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::sample_services;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn complete_session() -> BookingSession {
        let mut session = BookingSession::new();
        session
            .apply(
                SessionPatch::new()
                    .service(sample_services().remove(1))
                    .date(date("2025-03-10"))
                    .time(TimeSlot::from_hm(10, 0))
                    .pet_name("Rex")
                    .pet_type(PetType::Dog),
            )
            .unwrap();
        session
    }

    #[test]
    fn new_session_is_empty() {
        let session = BookingSession::new();
        assert!(!session.is_complete());
        assert!(!session.is_frozen());
        assert_eq!(session.missing_fields().len(), 5);
    }

    #[test]
    fn complete_when_all_required_fields_set() {
        assert!(complete_session().is_complete());
    }

    #[test]
    fn each_missing_required_field_makes_incomplete() {
        let base = complete_session();

        let mut s = base.clone();
        s.service = None;
        assert!(!s.is_complete());
        assert_eq!(s.missing_fields(), vec!["service"]);

        let mut s = base.clone();
        s.date = None;
        assert!(!s.is_complete());
        assert_eq!(s.missing_fields(), vec!["date"]);

        let mut s = base.clone();
        s.time = None;
        assert!(!s.is_complete());
        assert_eq!(s.missing_fields(), vec!["time"]);

        let mut s = base.clone();
        s.pet_name = None;
        assert!(!s.is_complete());
        assert_eq!(s.missing_fields(), vec!["pet_name"]);

        let mut s = base;
        s.pet_type = None;
        assert!(!s.is_complete());
        assert_eq!(s.missing_fields(), vec!["pet_type"]);
    }

    #[test]
    fn optional_fields_do_not_affect_completeness() {
        let mut session = complete_session();
        session
            .apply(SessionPatch::new().pet_age(None).pet_weight(None).notes(None))
            .unwrap();
        assert!(session.is_complete());
    }

    #[test]
    fn new_date_clears_time() {
        let mut session = complete_session();
        session.apply(SessionPatch::new().date(date("2025-03-11"))).unwrap();
        assert_eq!(session.date(), Some(date("2025-03-11")));
        assert_eq!(session.time(), None);
    }

    #[test]
    fn same_date_keeps_time() {
        let mut session = complete_session();
        session.apply(SessionPatch::new().date(date("2025-03-10"))).unwrap();
        assert_eq!(session.time(), Some(TimeSlot::from_hm(10, 0)));
    }

    #[test]
    fn new_date_with_new_time_keeps_new_time() {
        let mut session = complete_session();
        session
            .apply(
                SessionPatch::new()
                    .date(date("2025-03-12"))
                    .time(TimeSlot::from_hm(14, 0)),
            )
            .unwrap();
        assert_eq!(session.time(), Some(TimeSlot::from_hm(14, 0)));
    }

    #[test]
    fn optional_pet_fields_can_be_cleared() {
        let mut session = complete_session();
        session
            .apply(
                SessionPatch::new()
                    .pet_age(Some(4))
                    .notes(Some("Nervous around clippers".into())),
            )
            .unwrap();
        assert_eq!(session.pet_age(), Some(4));
        session.apply(SessionPatch::new().pet_age(None)).unwrap();
        assert_eq!(session.pet_age(), None);
        assert_eq!(session.notes(), Some("Nervous around clippers"));

        session.apply(SessionPatch::new().notes(Some("   ".into()))).unwrap();
        assert_eq!(session.notes(), None);
    }

    #[test]
    fn pet_name_is_trimmed() {
        let mut session = BookingSession::new();
        session.apply(SessionPatch::new().pet_name("  Rex  ")).unwrap();
        assert_eq!(session.pet_name(), Some("Rex"));
    }

    #[test]
    fn frozen_session_rejects_changes() {
        let mut session = complete_session();
        session.freeze("AB12CD34".into(), Utc::now());
        assert!(session.is_frozen());
        let err = session.apply(SessionPatch::new().pet_name("Max")).unwrap_err();
        assert!(matches!(err, WizardError::SessionFrozen { .. }));
        assert_eq!(session.pet_name(), Some("Rex"));
    }

    #[test]
    fn merged_leaves_original_untouched() {
        let session = complete_session();
        let candidate = session.merged(SessionPatch::new().pet_name("Max")).unwrap();
        assert_eq!(candidate.pet_name(), Some("Max"));
        assert_eq!(session.pet_name(), Some("Rex"));
    }

    #[test]
    fn touched_fields_lists_written_fields() {
        let patch = SessionPatch::new().pet_name("Rex").pet_age(None);
        assert_eq!(patch.touched_fields(), vec!["pet_name", "pet_age"]);
        assert!(SessionPatch::new().is_empty());
        assert!(!patch.is_empty());
    }

    #[test]
    fn pet_type_parsing() {
        assert_eq!("Dog".parse::<PetType>().unwrap(), PetType::Dog);
        assert_eq!("guinea pig".parse::<PetType>().unwrap(), PetType::GuineaPig);
        assert_eq!("guinea_pig".parse::<PetType>().unwrap(), PetType::GuineaPig);
        assert!("Dragon".parse::<PetType>().is_err());
        assert_eq!(PetType::GuineaPig.to_string(), "Guinea Pig");
    }

    #[test]
    fn weight_category_parsing() {
        assert_eq!(
            "10-25 lbs".parse::<WeightCategory>().unwrap(),
            WeightCategory::From10To25
        );
        assert_eq!(
            "over_100".parse::<WeightCategory>().unwrap(),
            WeightCategory::Over100
        );
        assert!("heavy".parse::<WeightCategory>().is_err());
    }

    #[test]
    fn session_serde_roundtrip() {
        let session = complete_session();
        let json = serde_json::to_string(&session).unwrap();
        assert!(json.contains("\"time\":\"10:00 AM\""));
        assert!(json.contains("\"pet_type\":\"dog\""));
        let parsed: BookingSession = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, session);
    }
}
