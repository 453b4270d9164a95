//! Error types for PawCare.

use crate::wizard::step::WizardStep;
use crate::wizard::validation::ValidationErrors;

/// Top-level error type for the booking core.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Wizard error: {0}")]
    Wizard(#[from] WizardError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Database-related errors.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Service catalog errors.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Service {id} not found")]
    NotFound { id: String },

    #[error("Invalid service {id}: {reason}")]
    InvalidService { id: String, reason: String },

    #[error("Catalog unavailable: {0}")]
    Unavailable(String),
}

/// Slot availability lookup errors.
#[derive(Debug, thiserror::Error)]
pub enum AvailabilityError {
    #[error("Availability lookup failed for {date}: {reason}")]
    LookupFailed { date: String, reason: String },
}

/// Booking wizard errors.
///
/// None of these are fatal: the wizard stays on its current step and the
/// session is left exactly as it was before the failed call.
#[derive(Debug, thiserror::Error)]
pub enum WizardError {
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("Cannot transition from {from} to {to}")]
    InvalidTransition { from: WizardStep, to: WizardStep },

    #[error("Edit-jump to {target} is not allowed from {from}")]
    EditJumpNotAllowed { from: WizardStep, target: WizardStep },

    #[error("Booking {booking_id} is already confirmed and cannot be changed")]
    SessionFrozen { booking_id: String },

    #[error("Booking is incomplete: missing {missing}")]
    IncompleteSession { missing: String },

    #[error("Terms and conditions must be accepted before confirming")]
    TermsNotAccepted,

    #[error("Cannot move booking {id} from {from} to {to}")]
    InvalidStatusTransition { id: String, from: String, to: String },

    #[error("Availability error: {0}")]
    Availability(#[from] AvailabilityError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Store error: {0}")]
    Store(#[from] DatabaseError),
}

impl WizardError {
    /// Field-level errors, if this is a validation failure.
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            Self::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

impl From<ValidationErrors> for WizardError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

/// Result type alias for the booking core.
pub type Result<T> = std::result::Result<T, Error>;
