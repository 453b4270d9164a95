//! Per-step guards.
//!
//! Guards are pure functions over a candidate session. They return a
//! `ValidationErrors` listing every failing field so a screen can show all
//! messages at once.

use serde::{Deserialize, Serialize};

use crate::wizard::session::{BookingSession, PetType, SessionPatch, WeightCategory};
use crate::wizard::step::WizardStep;

/// Longest accepted pet name, after trimming.
pub const MAX_PET_NAME_LEN: usize = 50;
/// Longest accepted free-text notes.
pub const MAX_NOTES_LEN: usize = 500;

/// A single field-level validation message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Ordered collection of field errors. Empty means valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// First message recorded for `field`.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    pub fn has(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    /// `Ok(())` when empty, otherwise `Err(self)`.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

/// Session fields a step's screen is allowed to write.
pub fn editable_fields(step: WizardStep) -> &'static [&'static str] {
    match step {
        WizardStep::Discovery | WizardStep::Selection => &["service"],
        WizardStep::Scheduling => &["date", "time"],
        WizardStep::PetInfo => &["pet_name", "pet_type", "pet_age", "pet_weight", "notes"],
        WizardStep::Review | WizardStep::Success | WizardStep::Management => &[],
    }
}

/// Reject patches that write fields owned by another step.
pub fn check_patch_scope(step: WizardStep, patch: &SessionPatch) -> Result<(), ValidationErrors> {
    let allowed = editable_fields(step);
    let mut errors = ValidationErrors::new();
    for field in patch.touched_fields() {
        if !allowed.contains(&field) {
            errors.add(field, format!("Cannot be changed on the {} step", step.title()));
        }
    }
    errors.into_result()
}

/// Selection → Scheduling: a service is chosen.
pub fn selection_guard(session: &BookingSession) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    if session.service().is_none() {
        errors.add("service", "Please select a service to continue");
    }
    errors.into_result()
}

/// Scheduling → PetInfo: date and time chosen, and the slot is open.
///
/// `slot_available` is the oracle's answer for the candidate date/time, or
/// `None` when there was nothing to ask about.
pub fn scheduling_guard(
    session: &BookingSession,
    slot_available: Option<bool>,
) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    if session.date().is_none() {
        errors.add("date", "Please select a date");
    }
    match (session.date(), session.time()) {
        (_, None) => errors.add("time", "Please select a time"),
        (Some(date), Some(time)) if slot_available == Some(false) => errors.add(
            "time",
            format!("{time} is unavailable on {}", date.format("%A, %B %-d, %Y")),
        ),
        _ => {}
    }
    errors.into_result()
}

/// PetInfo → Review: name present, type chosen, age in range, notes bounded.
pub fn pet_info_guard(session: &BookingSession, max_age: u8) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    match session.pet_name().map(str::trim) {
        None | Some("") => errors.add("pet_name", "Pet name is required"),
        Some(name) if name.chars().count() > MAX_PET_NAME_LEN => errors.add(
            "pet_name",
            format!("Pet name must be at most {MAX_PET_NAME_LEN} characters"),
        ),
        Some(_) => {}
    }
    if session.pet_type().is_none() {
        errors.add("pet_type", "Pet type is required");
    }
    if let Some(age) = session.pet_age() {
        if age > max_age {
            errors.add("pet_age", format!("Age must be between 0 and {max_age}"));
        }
    }
    if let Some(notes) = session.notes() {
        if notes.chars().count() > MAX_NOTES_LEN {
            errors.add(
                "notes",
                format!("Notes must be at most {MAX_NOTES_LEN} characters"),
            );
        }
    }
    errors.into_result()
}

/// Review → Success: terms accepted.
pub fn review_guard(terms_accepted: bool) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    if !terms_accepted {
        errors.add("terms", "Please accept the terms and conditions");
    }
    errors.into_result()
}

/// Raw text input from the pet information screen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PetInfoForm {
    pub pet_name: String,
    pub pet_type: String,
    pub pet_age: String,
    pub pet_weight: String,
    pub notes: String,
}

impl PetInfoForm {
    /// Pre-fill from the session so going back shows earlier input.
    pub fn from_session(session: &BookingSession) -> Self {
        Self {
            pet_name: session.pet_name().unwrap_or_default().to_string(),
            pet_type: session.pet_type().map(|t| t.to_string()).unwrap_or_default(),
            pet_age: session.pet_age().map(|a| a.to_string()).unwrap_or_default(),
            pet_weight: session
                .pet_weight()
                .map(|w| w.to_string())
                .unwrap_or_default(),
            notes: session.notes().unwrap_or_default().to_string(),
        }
    }

    /// Parse the text fields into a patch, collecting every field error.
    pub fn into_patch(self, max_age: u8) -> Result<SessionPatch, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let name = self.pet_name.trim().to_string();
        if name.is_empty() {
            errors.add("pet_name", "Pet name is required");
        } else if name.chars().count() > MAX_PET_NAME_LEN {
            errors.add(
                "pet_name",
                format!("Pet name must be at most {MAX_PET_NAME_LEN} characters"),
            );
        }

        let pet_type = if self.pet_type.trim().is_empty() {
            errors.add("pet_type", "Pet type is required");
            None
        } else {
            match self.pet_type.parse::<PetType>() {
                Ok(t) => Some(t),
                Err(_) => {
                    errors.add("pet_type", "Please choose a pet type from the list");
                    None
                }
            }
        };

        let age_text = self.pet_age.trim();
        let pet_age = if age_text.is_empty() {
            None
        } else {
            match age_text.parse::<i64>() {
                Ok(age) if (0..=i64::from(max_age)).contains(&age) => u8::try_from(age).ok(),
                Ok(_) => {
                    errors.add("pet_age", format!("Age must be between 0 and {max_age}"));
                    None
                }
                Err(_) => {
                    errors.add("pet_age", "Age must be a number");
                    None
                }
            }
        };

        let weight_text = self.pet_weight.trim();
        let pet_weight = if weight_text.is_empty() {
            None
        } else {
            match weight_text.parse::<WeightCategory>() {
                Ok(w) => Some(w),
                Err(_) => {
                    errors.add("pet_weight", "Please choose a weight range from the list");
                    None
                }
            }
        };

        let notes = self.notes.trim().to_string();
        if notes.chars().count() > MAX_NOTES_LEN {
            errors.add(
                "notes",
                format!("Notes must be at most {MAX_NOTES_LEN} characters"),
            );
        }

        errors.into_result()?;

        let mut patch = SessionPatch::new()
            .pet_name(name)
            .pet_age(pet_age)
            .pet_weight(pet_weight)
            .notes(if notes.is_empty() { None } else { Some(notes) });
        if let Some(pet_type) = pet_type {
            patch = patch.pet_type(pet_type);
        }
        Ok(patch)
    }
}
