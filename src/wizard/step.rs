//! Wizard steps and navigation history.

use serde::{Deserialize, Serialize};

/// The screens of the booking flow.
///
/// Linear order: Discovery → Selection → Scheduling → PetInfo → Review →
/// Success. Management sits outside that order and is reachable from
/// anywhere.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    #[default]
    Discovery,
    Selection,
    Scheduling,
    PetInfo,
    Review,
    Success,
    Management,
}

impl WizardStep {
    /// The linear steps, in order.
    pub const LINEAR: [WizardStep; 6] = [
        Self::Discovery,
        Self::Selection,
        Self::Scheduling,
        Self::PetInfo,
        Self::Review,
        Self::Success,
    ];

    /// Check if "continue" from `self` may land on `target`.
    ///
    /// Discovery may skip Selection when a service is picked straight from
    /// the listing. Success, Management and the Review → Success
    /// confirmation go through dedicated wizard operations instead.
    pub fn can_advance_to(&self, target: WizardStep) -> bool {
        use WizardStep::*;
        matches!(
            (self, target),
            (Discovery, Selection)
                | (Discovery, Scheduling)
                | (Selection, Scheduling)
                | (Scheduling, PetInfo)
                | (PetInfo, Review)
        )
    }

    /// Get the next step in the linear progression, if any.
    pub fn next(&self) -> Option<WizardStep> {
        use WizardStep::*;
        match self {
            Discovery => Some(Selection),
            Selection => Some(Scheduling),
            Scheduling => Some(PetInfo),
            PetInfo => Some(Review),
            Review => Some(Success),
            Success | Management => None,
        }
    }

    /// Position in the linear order; `None` for Management.
    pub fn ordinal(&self) -> Option<usize> {
        Self::LINEAR.iter().position(|s| s == self)
    }

    /// Steps that can be revisited from Review via an edit-jump.
    pub fn is_editable(&self) -> bool {
        matches!(self, Self::Selection | Self::Scheduling | Self::PetInfo)
    }

    /// Whether `self` comes before `current` in the linear flow (used for
    /// breadcrumb "done" markers).
    pub fn is_completed_relative_to(&self, current: WizardStep) -> bool {
        match (self.ordinal(), current.ordinal()) {
            (Some(step), Some(cur)) => step < cur,
            _ => false,
        }
    }

    /// Human-readable title for breadcrumbs and headers.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Discovery => "Discover Services",
            Self::Selection => "Choose Service",
            Self::Scheduling => "Date & Time",
            Self::PetInfo => "Pet Information",
            Self::Review => "Review & Confirm",
            Self::Success => "Booking Confirmed",
            Self::Management => "My Bookings",
        }
    }
}

impl std::fmt::Display for WizardStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Discovery => "discovery",
            Self::Selection => "selection",
            Self::Scheduling => "scheduling",
            Self::PetInfo => "pet_info",
            Self::Review => "review",
            Self::Success => "success",
            Self::Management => "management",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for WizardStep {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "discovery" => Ok(Self::Discovery),
            "selection" => Ok(Self::Selection),
            "scheduling" => Ok(Self::Scheduling),
            "pet_info" => Ok(Self::PetInfo),
            "review" => Ok(Self::Review),
            "success" => Ok(Self::Success),
            "management" => Ok(Self::Management),
            _ => Err(format!("Unknown step: {s}")),
        }
    }
}

/// Stack of previously visited steps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationHistory {
    stack: Vec<WizardStep>,
}

impl NavigationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, step: WizardStep) {
        self.stack.push(step);
    }

    pub fn pop(&mut self) -> Option<WizardStep> {
        self.stack.pop()
    }

    pub fn peek(&self) -> Option<WizardStep> {
        self.stack.last().copied()
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn clear(&mut self) {
        self.stack.clear();
    }

    /// Oldest first.
    pub fn steps(&self) -> &[WizardStep] {
        &self.stack
    }
}
