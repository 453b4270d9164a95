//! Multi-step booking wizard: steps, session, guards, derived values and
//! the controller that ties them together.

pub mod controller;
pub mod pricing;
pub mod session;
pub mod step;
pub mod validation;
pub mod view;

pub use controller::BookingWizard;
pub use pricing::{Completion, PriceSummary};
pub use session::{BookingSession, PetType, SessionPatch, WeightCategory};
pub use step::{NavigationHistory, WizardStep};
pub use validation::{PetInfoForm, ValidationErrors};
pub use view::{Screen, View};
