//! End-to-end booking flows against an in-memory libSQL store.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use rust_decimal_macros::dec;

use pawcare::availability::{DemoAvailability, TimeSlot};
use pawcare::catalog::{CatalogProvider, StaticCatalog};
use pawcare::clock::FixedClock;
use pawcare::config::BookingConfig;
use pawcare::error::{DatabaseError, WizardError};
use pawcare::store::{Booking, BookingFilter, BookingStatus, BookingStore, LibSqlBackend};
use pawcare::wizard::pricing::{PriceSummary, estimated_completion};
use pawcare::wizard::view::View;
use pawcare::wizard::{BookingWizard, PetInfoForm, PetType, SessionPatch, WizardStep};

fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
}

/// "Today" for these flows: bookings open from the following Monday.
fn sunday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 9).unwrap()
}

fn ten_am() -> TimeSlot {
    TimeSlot::from_hm(10, 0)
}

async fn memory_store() -> Arc<LibSqlBackend> {
    Arc::new(LibSqlBackend::new_memory().await.unwrap())
}

fn wizard_with(store: Arc<dyn BookingStore>) -> BookingWizard {
    BookingWizard::new(
        Arc::new(StaticCatalog::sample()),
        Arc::new(DemoAvailability::default()),
        store,
        BookingConfig::default(),
    )
    .with_clock(Arc::new(FixedClock::on(sunday())))
}

fn pet_form(name: &str, pet_type: &str, age: &str) -> PetInfoForm {
    PetInfoForm {
        pet_name: name.into(),
        pet_type: pet_type.into(),
        pet_age: age.into(),
        ..Default::default()
    }
}

/// Discovery → Selection → Scheduling → PetInfo → Review.
async fn walk_to_review(wizard: &mut BookingWizard) {
    let premium = wizard.find_service("grooming-premium").await.unwrap();
    assert_eq!(
        wizard.continue_step(SessionPatch::new()).await.unwrap(),
        WizardStep::Selection
    );
    assert_eq!(
        wizard
            .continue_step(SessionPatch::new().service(premium))
            .await
            .unwrap(),
        WizardStep::Scheduling
    );
    assert_eq!(
        wizard
            .continue_step(SessionPatch::new().date(monday()).time(ten_am()))
            .await
            .unwrap(),
        WizardStep::PetInfo
    );
    assert_eq!(
        wizard.submit_pet_info(pet_form("Rex", "Dog", "")).await.unwrap(),
        WizardStep::Review
    );
}

// ── Happy path ──────────────────────────────────────────────────────

#[tokio::test]
async fn happy_path_books_and_lists_as_upcoming() {
    let store = memory_store().await;
    let mut wizard = wizard_with(store.clone());
    walk_to_review(&mut wizard).await;

    let summary = PriceSummary::for_session(wizard.session(), wizard.config().tax_rate).unwrap();
    assert_eq!(summary.subtotal, dec!(85.00));
    assert_eq!(summary.display_tax(), "$7.23");
    assert_eq!(summary.display_total(), "$92.23");
    assert_eq!(estimated_completion(wizard.session()).to_string(), "1:00 PM");

    let booking = wizard.confirm(true).await.unwrap();
    assert_eq!(wizard.current_step(), WizardStep::Success);
    assert_eq!(booking.id.len(), 8);
    assert_eq!(booking.id, booking.id.to_uppercase());
    assert_eq!(wizard.session().booking_id(), Some(booking.id.as_str()));
    assert!(wizard.session().created_at().is_some());

    let upcoming = wizard.list_bookings(BookingFilter::Upcoming).await.unwrap();
    assert_eq!(upcoming.len(), 1);
    assert_eq!(upcoming[0].id, booking.id);
    assert_eq!(upcoming[0].service_id, "grooming-premium");
    assert_eq!(upcoming[0].pet_name, "Rex");
    assert_eq!(upcoming[0].pet_type, PetType::Dog);
    assert_eq!(upcoming[0].status, BookingStatus::Confirmed);

    let stored = store.get(&booking.id).await.unwrap().unwrap();
    assert_eq!(stored, booking);

    let screen = wizard.render().await.unwrap();
    let View::Success { share_text, .. } = screen.view else {
        panic!("expected success view");
    };
    assert!(share_text.unwrap().contains(&booking.id));
}

#[tokio::test]
async fn confirm_requires_terms() {
    let mut wizard = wizard_with(memory_store().await);
    walk_to_review(&mut wizard).await;

    let err = wizard.confirm(false).await.unwrap_err();
    assert!(matches!(err, WizardError::TermsNotAccepted));
    assert_eq!(wizard.current_step(), WizardStep::Review);
    assert!(!wizard.session().is_frozen());
}

// ── Guards ──────────────────────────────────────────────────────────

#[tokio::test]
async fn blocked_slot_is_rejected() {
    let mut wizard = wizard_with(memory_store().await);
    let premium = wizard.find_service("grooming-premium").await.unwrap();
    wizard
        .advance(WizardStep::Scheduling, SessionPatch::new().service(premium))
        .await
        .unwrap();

    let err = wizard
        .continue_step(
            SessionPatch::new()
                .date(monday())
                .time(TimeSlot::from_hm(12, 0)),
        )
        .await
        .unwrap_err();

    let errors = err.validation_errors().expect("validation error");
    assert!(errors.get("time").unwrap().contains("unavailable"));
    assert_eq!(wizard.current_step(), WizardStep::Scheduling);
    assert_eq!(wizard.session().date(), None);
    assert_eq!(wizard.session().time(), None);
}

#[tokio::test]
async fn same_day_slot_is_rejected() {
    let store: Arc<dyn BookingStore> = memory_store().await;
    let afternoon = Utc.with_ymd_and_hms(2025, 3, 10, 16, 0, 0).unwrap();
    let mut wizard = BookingWizard::new(
        Arc::new(StaticCatalog::sample()),
        Arc::new(DemoAvailability::default()),
        store,
        BookingConfig::default(),
    )
    .with_clock(Arc::new(FixedClock::new(afternoon)));
    let premium = wizard.find_service("grooming-premium").await.unwrap();
    wizard
        .advance(WizardStep::Scheduling, SessionPatch::new().service(premium))
        .await
        .unwrap();

    let err = wizard
        .continue_step(SessionPatch::new().date(monday()).time(ten_am()))
        .await
        .unwrap_err();
    assert!(err.validation_errors().unwrap().has("date"));
    assert_eq!(wizard.current_step(), WizardStep::Scheduling);

    let tuesday = monday().succ_opt().unwrap();
    wizard
        .continue_step(SessionPatch::new().date(tuesday).time(ten_am()))
        .await
        .unwrap();
    assert_eq!(wizard.current_step(), WizardStep::PetInfo);
}

#[tokio::test]
async fn pet_age_out_of_range_is_rejected() {
    let mut wizard = wizard_with(memory_store().await);
    let premium = wizard.find_service("grooming-premium").await.unwrap();
    wizard
        .advance(WizardStep::Scheduling, SessionPatch::new().service(premium))
        .await
        .unwrap();
    wizard
        .continue_step(SessionPatch::new().date(monday()).time(ten_am()))
        .await
        .unwrap();

    let err = wizard
        .submit_pet_info(pet_form("Rex", "Dog", "45"))
        .await
        .unwrap_err();
    assert_eq!(
        err.validation_errors().unwrap().get("pet_age"),
        Some("Age must be between 0 and 30")
    );
    assert_eq!(wizard.current_step(), WizardStep::PetInfo);
    assert_eq!(wizard.session().pet_name(), None);

    // A patch that bypasses the form is still checked.
    let err = wizard
        .continue_step(
            SessionPatch::new()
                .pet_name("Rex")
                .pet_type(PetType::Dog)
                .pet_age(Some(45)),
        )
        .await
        .unwrap_err();
    assert!(err.validation_errors().unwrap().has("pet_age"));
    assert_eq!(wizard.current_step(), WizardStep::PetInfo);
}

#[tokio::test]
async fn every_guard_blocks_advance() {
    let mut wizard = wizard_with(memory_store().await);

    // Selection needs a service.
    wizard.continue_step(SessionPatch::new()).await.unwrap();
    let err = wizard.continue_step(SessionPatch::new()).await.unwrap_err();
    assert!(err.validation_errors().unwrap().has("service"));
    assert_eq!(wizard.current_step(), WizardStep::Selection);

    let premium = wizard.find_service("grooming-premium").await.unwrap();
    wizard
        .continue_step(SessionPatch::new().service(premium))
        .await
        .unwrap();

    // Scheduling needs both date and time.
    let err = wizard
        .continue_step(SessionPatch::new().date(monday()))
        .await
        .unwrap_err();
    assert!(err.validation_errors().unwrap().has("time"));
    assert_eq!(wizard.current_step(), WizardStep::Scheduling);

    wizard
        .continue_step(SessionPatch::new().date(monday()).time(ten_am()))
        .await
        .unwrap();

    // PetInfo needs name and type.
    let err = wizard
        .submit_pet_info(pet_form("   ", "", ""))
        .await
        .unwrap_err();
    let errors = err.validation_errors().unwrap();
    assert_eq!(errors.get("pet_name"), Some("Pet name is required"));
    assert_eq!(errors.get("pet_type"), Some("Pet type is required"));
    assert_eq!(wizard.current_step(), WizardStep::PetInfo);

    // Skipping steps is not a legal transition.
    let err = wizard
        .advance(WizardStep::Success, SessionPatch::new())
        .await
        .unwrap_err();
    assert!(matches!(err, WizardError::InvalidTransition { .. }));
}

#[tokio::test]
async fn changing_date_clears_time() {
    let mut wizard = wizard_with(memory_store().await);
    walk_to_review(&mut wizard).await;
    wizard.edit_jump(WizardStep::Scheduling).unwrap();

    // New date without a time: merged candidate has no time, guard fails.
    let tuesday = monday().succ_opt().unwrap();
    let err = wizard
        .continue_step(SessionPatch::new().date(tuesday))
        .await
        .unwrap_err();
    assert!(err.validation_errors().unwrap().has("time"));
    assert_eq!(wizard.session().date(), Some(monday()));
    assert_eq!(wizard.session().time(), Some(ten_am()));
}

// ── Navigation ──────────────────────────────────────────────────────

#[tokio::test]
async fn back_keeps_entered_fields() {
    let mut wizard = wizard_with(memory_store().await);
    walk_to_review(&mut wizard).await;
    let before = wizard.session().clone();

    assert_eq!(wizard.back(), Some(WizardStep::PetInfo));
    assert_eq!(wizard.back(), Some(WizardStep::Scheduling));
    assert_eq!(*wizard.session(), before);

    // Continue again without new input.
    wizard.continue_step(SessionPatch::new()).await.unwrap();
    assert_eq!(wizard.current_step(), WizardStep::PetInfo);
    wizard.continue_step(SessionPatch::new()).await.unwrap();
    assert_eq!(wizard.current_step(), WizardStep::Review);
    assert_eq!(*wizard.session(), before);
}

#[tokio::test]
async fn back_three_times_from_pet_info_reaches_discovery() {
    let mut wizard = wizard_with(memory_store().await);
    let premium = wizard.find_service("grooming-premium").await.unwrap();
    wizard.continue_step(SessionPatch::new()).await.unwrap();
    wizard
        .continue_step(SessionPatch::new().service(premium))
        .await
        .unwrap();
    wizard
        .continue_step(SessionPatch::new().date(monday()).time(ten_am()))
        .await
        .unwrap();
    assert_eq!(wizard.current_step(), WizardStep::PetInfo);
    let before = wizard.session().clone();

    assert_eq!(wizard.back(), Some(WizardStep::Scheduling));
    assert_eq!(wizard.back(), Some(WizardStep::Selection));
    assert_eq!(wizard.back(), Some(WizardStep::Discovery));
    assert_eq!(wizard.current_step(), WizardStep::Discovery);
    assert!(wizard.history().is_empty());
    assert_eq!(*wizard.session(), before);

    assert_eq!(wizard.back(), None);
    assert_eq!(wizard.current_step(), WizardStep::Discovery);
}

#[tokio::test]
async fn back_from_edit_jump_returns_to_review() {
    let mut wizard = wizard_with(memory_store().await);
    walk_to_review(&mut wizard).await;
    let history = wizard.history().clone();

    wizard.edit_jump(WizardStep::Selection).unwrap();
    assert_eq!(wizard.back(), Some(WizardStep::Review));
    assert_eq!(*wizard.history(), history);
    assert!(!wizard.is_editing());
}

#[tokio::test]
async fn edit_jump_returns_to_review() {
    let mut wizard = wizard_with(memory_store().await);
    walk_to_review(&mut wizard).await;
    let history = wizard.history().clone();

    wizard.edit_jump(WizardStep::Scheduling).unwrap();
    assert_eq!(wizard.current_step(), WizardStep::Scheduling);

    let step = wizard
        .continue_step(
            SessionPatch::new()
                .date(monday())
                .time(TimeSlot::from_hm(14, 0)),
        )
        .await
        .unwrap();
    assert_eq!(step, WizardStep::Review);
    assert_eq!(wizard.session().time(), Some(TimeSlot::from_hm(14, 0)));
    assert_eq!(*wizard.history(), history);
    assert!(!wizard.is_editing());
}

#[tokio::test]
async fn edit_jump_to_pet_info_returns_to_review() {
    let mut wizard = wizard_with(memory_store().await);
    walk_to_review(&mut wizard).await;

    wizard.edit_jump(WizardStep::PetInfo).unwrap();
    let step = wizard
        .submit_pet_info(pet_form("Max", "Cat", "3"))
        .await
        .unwrap();
    assert_eq!(step, WizardStep::Review);
    assert_eq!(wizard.session().pet_name(), Some("Max"));
    assert_eq!(wizard.session().pet_age(), Some(3));
}

#[tokio::test]
async fn management_is_a_side_trip() {
    let mut wizard = wizard_with(memory_store().await);
    walk_to_review(&mut wizard).await;
    wizard.back();
    let depth = wizard.history().len();

    wizard.open_management();
    let screen = wizard.render().await.unwrap();
    assert!(matches!(screen.view, View::Management { .. }));
    assert!(screen.breadcrumbs.is_empty());

    assert_eq!(wizard.back(), Some(WizardStep::PetInfo));
    assert_eq!(wizard.history().len(), depth);
}

// ── Management actions ──────────────────────────────────────────────

#[tokio::test]
async fn cancel_moves_booking_to_past() {
    let mut wizard = wizard_with(memory_store().await);
    walk_to_review(&mut wizard).await;
    let booking = wizard.confirm(true).await.unwrap();

    wizard.open_management();
    let cancelled = wizard.cancel_booking(&booking.id).await.unwrap();
    assert_eq!(cancelled.status, BookingStatus::Cancelled);

    let counts = wizard.booking_counts().await.unwrap();
    assert_eq!(counts.upcoming, 0);
    assert_eq!(counts.past, 1);

    // Terminal status cannot move again.
    let err = wizard.cancel_booking(&booking.id).await.unwrap_err();
    assert!(matches!(err, WizardError::InvalidStatusTransition { .. }));
    let err = wizard.complete_booking(&booking.id).await.unwrap_err();
    assert!(matches!(err, WizardError::InvalidStatusTransition { .. }));

    let err = wizard.cancel_booking("NOPE0000").await.unwrap_err();
    assert!(matches!(
        err,
        WizardError::Store(DatabaseError::NotFound { .. })
    ));
}

#[tokio::test]
async fn rebook_lands_on_scheduling_with_service() {
    let mut wizard = wizard_with(memory_store().await);
    walk_to_review(&mut wizard).await;
    let booking = wizard.confirm(true).await.unwrap();
    wizard.complete_booking(&booking.id).await.unwrap();

    // Only from management.
    assert!(wizard.rebook(&booking.id).await.is_err());

    wizard.open_management();
    wizard.rebook(&booking.id).await.unwrap();
    assert_eq!(wizard.current_step(), WizardStep::Scheduling);
    assert_eq!(
        wizard.session().service().map(|s| s.id.as_str()),
        Some("grooming-premium")
    );
    assert!(!wizard.session().is_frozen());
    assert_eq!(wizard.session().date(), None);
    assert_eq!(
        wizard.history().steps(),
        &[WizardStep::Discovery, WizardStep::Selection]
    );

    assert_eq!(wizard.back(), Some(WizardStep::Selection));
}

#[tokio::test]
async fn new_booking_after_success() {
    let mut wizard = wizard_with(memory_store().await);
    walk_to_review(&mut wizard).await;
    wizard.confirm(true).await.unwrap();

    wizard.start_new_booking().unwrap();
    assert_eq!(wizard.current_step(), WizardStep::Discovery);
    assert!(!wizard.session().is_frozen());
    assert!(wizard.history().is_empty());
}

// ── Collaborator failures ───────────────────────────────────────────

/// Store whose writes always fail.
struct BrokenStore;

#[async_trait]
impl BookingStore for BrokenStore {
    async fn save(&self, _booking: &Booking) -> Result<String, DatabaseError> {
        Err(DatabaseError::Query("disk full".into()))
    }

    async fn get(&self, _id: &str) -> Result<Option<Booking>, DatabaseError> {
        Ok(None)
    }

    async fn list(
        &self,
        _filter: BookingFilter,
        _today: NaiveDate,
    ) -> Result<Vec<Booking>, DatabaseError> {
        Ok(Vec::new())
    }

    async fn update_status(&self, id: &str, _status: BookingStatus) -> Result<(), DatabaseError> {
        Err(DatabaseError::NotFound {
            entity: "booking".into(),
            id: id.into(),
        })
    }
}

#[tokio::test]
async fn failed_save_leaves_session_untouched() {
    let mut wizard = wizard_with(Arc::new(BrokenStore));
    walk_to_review(&mut wizard).await;
    let before = wizard.session().clone();
    let history = wizard.history().clone();

    let err = wizard.confirm(true).await.unwrap_err();
    assert!(matches!(err, WizardError::Store(DatabaseError::Query(_))));
    assert_eq!(wizard.current_step(), WizardStep::Review);
    assert_eq!(*wizard.session(), before);
    assert_eq!(*wizard.history(), history);
    assert!(!wizard.session().is_frozen());
}

#[tokio::test]
async fn database_backed_catalog_drives_the_wizard() {
    let db = memory_store().await;
    db.seed_services(&pawcare::catalog::sample_services())
        .await
        .unwrap();
    assert_eq!(db.list_services().await.unwrap().len(), 6);

    let mut wizard = BookingWizard::new(
        db.clone(),
        Arc::new(DemoAvailability::default()),
        db.clone(),
        BookingConfig::default(),
    )
    .with_clock(Arc::new(FixedClock::on(sunday())));

    walk_to_review(&mut wizard).await;
    let booking = wizard.confirm(true).await.unwrap();
    assert_eq!(booking.service_title, "Premium Grooming");
    assert_eq!(booking.price, dec!(85.00));
}
