//! The booking wizard state machine.
//!
//! The wizard is the only writer of the session. Screens hand it a
//! `SessionPatch`; each transition validates the patch against a candidate
//! copy of the session and commits only when every guard and collaborator
//! call succeeds.

use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::availability::AvailabilityOracle;
use crate::catalog::{CatalogProvider, Service};
use crate::clock::{Clock, SystemClock};
use crate::config::BookingConfig;
use crate::error::{CatalogError, DatabaseError, WizardError};
use crate::store::traits::{Booking, BookingCounts, BookingFilter, BookingStatus, BookingStore};
use crate::wizard::session::{BookingSession, SessionPatch};
use crate::wizard::step::{NavigationHistory, WizardStep};
use crate::wizard::validation::{self, PetInfoForm, ValidationErrors};
use crate::wizard::view::{self, RenderContext, Screen};

/// Short customer-facing booking reference: 8 upper-case hex characters.
pub fn new_booking_id() -> String {
    let id = Uuid::new_v4().simple().to_string();
    id[..8].to_uppercase()
}

pub struct BookingWizard {
    current_step: WizardStep,
    session: BookingSession,
    history: NavigationHistory,
    /// Set by an edit-jump: the next successful continue lands here.
    edit_return: Option<WizardStep>,
    /// Step Management was opened from.
    management_origin: Option<WizardStep>,
    catalog: Arc<dyn CatalogProvider>,
    availability: Arc<dyn AvailabilityOracle>,
    store: Arc<dyn BookingStore>,
    clock: Arc<dyn Clock>,
    config: BookingConfig,
}

impl BookingWizard {
    pub fn new(
        catalog: Arc<dyn CatalogProvider>,
        availability: Arc<dyn AvailabilityOracle>,
        store: Arc<dyn BookingStore>,
        config: BookingConfig,
    ) -> Self {
        Self {
            current_step: WizardStep::default(),
            session: BookingSession::new(),
            history: NavigationHistory::new(),
            edit_return: None,
            management_origin: None,
            catalog,
            availability,
            store,
            clock: Arc::new(SystemClock),
            config,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    // ── Accessors ───────────────────────────────────────────────────

    pub fn current_step(&self) -> WizardStep {
        self.current_step
    }

    pub fn session(&self) -> &BookingSession {
        &self.session
    }

    pub fn history(&self) -> &NavigationHistory {
        &self.history
    }

    /// An edit-jump from Review is in progress.
    pub fn is_editing(&self) -> bool {
        self.edit_return.is_some()
    }

    pub fn management_origin(&self) -> Option<WizardStep> {
        self.management_origin
    }

    pub fn config(&self) -> &BookingConfig {
        &self.config
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Resolve a service id through the catalog.
    pub async fn find_service(&self, id: &str) -> Result<Service, WizardError> {
        self.catalog
            .get_service(id)
            .await?
            .ok_or_else(|| CatalogError::NotFound { id: id.to_string() }.into())
    }

    // ── Forward navigation ──────────────────────────────────────────

    /// Validate `patch` against the current step, merge it and move to
    /// `next`, or back to Review when an edit-jump is pending.
    ///
    /// On any error the step, session and history are unchanged.
    pub async fn advance(
        &mut self,
        next: WizardStep,
        patch: SessionPatch,
    ) -> Result<WizardStep, WizardError> {
        let from = self.current_step;
        let returning = self.edit_return.filter(|_| from.is_editable());
        let legal = from.can_advance_to(next) || (returning.is_some() && Some(next) == returning);
        if !legal {
            warn!(from = %from, to = %next, "Rejected transition");
            return Err(WizardError::InvalidTransition { from, to: next });
        }

        validation::check_patch_scope(from, &patch)?;
        let service_changed = patch.service.is_some();
        let candidate = self.session.merged(patch)?;

        if let Err(errors) = self.run_guard(from, next, &candidate, service_changed).await? {
            debug!(step = %from, errors = %errors, "Guard failed");
            return Err(WizardError::Validation(errors));
        }

        let destination = returning.unwrap_or(next);
        self.session = candidate;
        if returning.is_some() {
            self.edit_return = None;
        } else {
            self.history.push(from);
        }
        self.current_step = destination;

        info!(from = %from, to = %destination, edit_return = returning.is_some(), "Wizard advanced");
        Ok(destination)
    }

    /// `advance` to the next step in the linear order.
    pub async fn continue_step(&mut self, patch: SessionPatch) -> Result<WizardStep, WizardError> {
        let from = self.current_step;
        let next = from
            .next()
            .ok_or(WizardError::InvalidTransition { from, to: from })?;
        self.advance(next, patch).await
    }

    /// Parse the pet form and continue from PetInfo.
    pub async fn submit_pet_info(&mut self, form: PetInfoForm) -> Result<WizardStep, WizardError> {
        let patch = form.into_patch(self.config.max_pet_age)?;
        self.advance(WizardStep::Review, patch).await
    }

    /// Outer `Err` is a collaborator failure; inner `Err` is a guard failure.
    async fn run_guard(
        &self,
        from: WizardStep,
        next: WizardStep,
        candidate: &BookingSession,
        service_changed: bool,
    ) -> Result<Result<(), ValidationErrors>, WizardError> {
        match from {
            WizardStep::Discovery | WizardStep::Selection => {
                let mut errors = ValidationErrors::new();
                if next != WizardStep::Selection {
                    if let Err(e) = validation::selection_guard(candidate) {
                        errors = e;
                    }
                }
                if let Some(service) = candidate.service().filter(|_| service_changed) {
                    if self.catalog.get_service(&service.id).await?.is_none() {
                        errors.add("service", "This service is no longer offered");
                    }
                }
                Ok(errors.into_result())
            }
            WizardStep::Scheduling => {
                let slot_available = match (candidate.date(), candidate.time()) {
                    (Some(date), Some(time)) => {
                        Some(self.availability.is_slot_available(date, time).await?)
                    }
                    _ => None,
                };
                let mut errors = validation::scheduling_guard(candidate, slot_available)
                    .err()
                    .unwrap_or_default();
                if let Some(date) = candidate.date() {
                    if !self.in_booking_window(date) {
                        errors.add(
                            "date",
                            format!(
                                "Please choose a date within the next {} days",
                                self.config.booking_window_days
                            ),
                        );
                    }
                }
                Ok(errors.into_result())
            }
            WizardStep::PetInfo => Ok(validation::pet_info_guard(candidate, self.config.max_pet_age)),
            WizardStep::Review | WizardStep::Success | WizardStep::Management => {
                Err(WizardError::InvalidTransition { from, to: next })
            }
        }
    }

    /// Bookable dates run from tomorrow through `booking_window_days` ahead.
    fn in_booking_window(&self, date: NaiveDate) -> bool {
        let today = self.clock.today();
        let end = today + Duration::days(i64::from(self.config.booking_window_days));
        date > today && date <= end
    }

    /// Dates offered on the scheduling screen.
    pub async fn available_dates(&self) -> Result<Vec<NaiveDate>, WizardError> {
        let today = self.clock.today();
        let mut dates = Vec::new();
        for offset in 1..=self.config.booking_window_days {
            let date = today + Duration::days(i64::from(offset));
            if self.availability.is_date_open(date).await? {
                dates.push(date);
            }
        }
        Ok(dates)
    }

    // ── Backward and side navigation ────────────────────────────────

    /// Return to the previous step, keeping everything entered so far.
    ///
    /// `None` when there is nowhere to go back to. Success has no way back:
    /// the booking is final. During an edit-jump, back cancels the edit and
    /// returns to Review.
    pub fn back(&mut self) -> Option<WizardStep> {
        if self.current_step == WizardStep::Management {
            let origin = self.management_origin.take().unwrap_or_default();
            info!(to = %origin, "Left management");
            self.current_step = origin;
            return Some(origin);
        }
        if self.current_step == WizardStep::Success {
            return None;
        }

        if let Some(review) = self.edit_return.take() {
            debug!(step = %self.current_step, "Edit abandoned");
            self.current_step = review;
            return Some(review);
        }

        let previous = self.history.pop()?;
        info!(from = %self.current_step, to = %previous, "Wizard went back");
        self.current_step = previous;
        Some(previous)
    }

    /// Jump from Review to an earlier step to change it. The next
    /// successful continue returns to Review.
    pub fn edit_jump(&mut self, target: WizardStep) -> Result<(), WizardError> {
        let from = self.current_step;
        if from != WizardStep::Review || !target.is_editable() {
            warn!(from = %from, target = %target, "Rejected edit-jump");
            return Err(WizardError::EditJumpNotAllowed { from, target });
        }
        self.edit_return = Some(WizardStep::Review);
        self.current_step = target;
        info!(target = %target, "Editing from review");
        Ok(())
    }

    /// Open the bookings list. Reachable from every step.
    pub fn open_management(&mut self) {
        if self.current_step == WizardStep::Management {
            return;
        }
        self.management_origin = Some(self.current_step);
        self.current_step = WizardStep::Management;
        info!(from = ?self.management_origin, "Opened management");
    }

    /// Discard the session and start over at Discovery.
    pub fn start_new_booking(&mut self) -> Result<(), WizardError> {
        let from = self.current_step;
        if !matches!(from, WizardStep::Success | WizardStep::Management) {
            return Err(WizardError::InvalidTransition {
                from,
                to: WizardStep::Discovery,
            });
        }
        self.reset();
        info!(from = %from, "Started new booking");
        Ok(())
    }

    fn reset(&mut self) {
        self.session = BookingSession::new();
        self.history.clear();
        self.edit_return = None;
        self.management_origin = None;
        self.current_step = WizardStep::Discovery;
    }

    // ── Confirmation ────────────────────────────────────────────────

    /// Review → Success: persist the booking and freeze the session.
    pub async fn confirm(&mut self, terms_accepted: bool) -> Result<Booking, WizardError> {
        let from = self.current_step;
        if from != WizardStep::Review {
            return Err(WizardError::InvalidTransition {
                from,
                to: WizardStep::Success,
            });
        }
        validation::review_guard(terms_accepted).map_err(|_| WizardError::TermsNotAccepted)?;
        if let Some(id) = self.session.booking_id() {
            return Err(WizardError::SessionFrozen {
                booking_id: id.to_string(),
            });
        }

        let created_at = self.clock.now();
        let booking = Booking::from_session(&self.session, new_booking_id(), created_at)?;
        self.store.save(&booking).await?;

        self.session.freeze(booking.id.clone(), created_at);
        self.history.push(from);
        self.edit_return = None;
        self.current_step = WizardStep::Success;

        info!(
            booking_id = %booking.id,
            service = %booking.service_id,
            date = %booking.date,
            time = %booking.time,
            "Booking confirmed"
        );
        Ok(booking)
    }

    // ── Management ──────────────────────────────────────────────────

    pub async fn list_bookings(&self, filter: BookingFilter) -> Result<Vec<Booking>, WizardError> {
        Ok(self.store.list(filter, self.clock.today()).await?)
    }

    pub async fn booking_counts(&self) -> Result<BookingCounts, WizardError> {
        Ok(self.store.counts(self.clock.today()).await?)
    }

    pub async fn cancel_booking(&self, id: &str) -> Result<Booking, WizardError> {
        self.set_status(id, BookingStatus::Cancelled).await
    }

    pub async fn complete_booking(&self, id: &str) -> Result<Booking, WizardError> {
        self.set_status(id, BookingStatus::Completed).await
    }

    async fn set_status(&self, id: &str, target: BookingStatus) -> Result<Booking, WizardError> {
        let mut booking = self.find_booking(id).await?;
        if !booking.status.can_transition_to(target) {
            return Err(WizardError::InvalidStatusTransition {
                id: id.to_string(),
                from: booking.status.to_string(),
                to: target.to_string(),
            });
        }
        self.store.update_status(id, target).await?;
        info!(booking_id = id, from = %booking.status, to = %target, "Booking status changed");
        booking.status = target;
        Ok(booking)
    }

    async fn find_booking(&self, id: &str) -> Result<Booking, WizardError> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| {
                WizardError::Store(DatabaseError::NotFound {
                    entity: "booking".into(),
                    id: id.to_string(),
                })
            })
    }

    /// Start a new booking for the same service as `id`, landing on
    /// Scheduling with the service already chosen.
    pub async fn rebook(&mut self, id: &str) -> Result<(), WizardError> {
        let from = self.current_step;
        if from != WizardStep::Management {
            return Err(WizardError::InvalidTransition {
                from,
                to: WizardStep::Scheduling,
            });
        }

        let booking = self.find_booking(id).await?;
        let service = self.find_service(&booking.service_id).await?;

        let session = BookingSession::new().merged(SessionPatch::new().service(service))?;
        self.reset();
        self.session = session;
        self.history.push(WizardStep::Discovery);
        self.history.push(WizardStep::Selection);
        self.current_step = WizardStep::Scheduling;

        info!(booking_id = id, service = %booking.service_id, "Rebooking");
        Ok(())
    }

    // ── Rendering ───────────────────────────────────────────────────

    /// Build the current screen, fetching whatever the step displays.
    pub async fn render(&self) -> Result<Screen, WizardError> {
        let mut ctx = RenderContext {
            tax_rate: self.config.tax_rate,
            ..Default::default()
        };

        match self.current_step {
            WizardStep::Discovery | WizardStep::Selection => {
                ctx.services = self.catalog.list_services().await?;
            }
            WizardStep::Scheduling => {
                ctx.dates = self.available_dates().await?;
                if let Some(date) = self.session.date() {
                    ctx.slots = self.availability.slots_for(date).await?;
                }
            }
            WizardStep::Management => {
                let today = self.clock.today();
                ctx.upcoming = self.store.list(BookingFilter::Upcoming, today).await?;
                ctx.past = self.store.list(BookingFilter::Past, today).await?;
                ctx.counts = self.store.counts(today).await?;
            }
            WizardStep::PetInfo | WizardStep::Review | WizardStep::Success => {}
        }

        Ok(view::render(self.current_step, &self.session, &ctx))
    }
}

impl std::fmt::Debug for BookingWizard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BookingWizard")
            .field("current_step", &self.current_step)
            .field("session", &self.session)
            .field("history", &self.history)
            .field("edit_return", &self.edit_return)
            .field("management_origin", &self.management_origin)
            .finish_non_exhaustive()
    }
}
