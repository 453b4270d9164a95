//! Screen models.
//!
//! `render` is a pure function of the step, the session and the
//! collaborator data the wizard has already fetched. Front-ends draw a
//! `Screen` however they like.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::availability::{SlotAvailability, TimeSlot};
use crate::catalog::Service;
use crate::store::traits::{Booking, BookingCounts, BookingStatus};
use crate::wizard::pricing::{Completion, PriceSummary, estimated_completion, format_money};
use crate::wizard::session::{BookingSession, PetType, WeightCategory};
use crate::wizard::step::WizardStep;
use crate::wizard::validation::PetInfoForm;

/// Collaborator data gathered before rendering.
#[derive(Debug, Clone, Default)]
pub struct RenderContext {
    pub services: Vec<Service>,
    pub dates: Vec<NaiveDate>,
    pub slots: Vec<SlotAvailability>,
    pub upcoming: Vec<Booking>,
    pub past: Vec<Booking>,
    pub counts: BookingCounts,
    pub tax_rate: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrumbState {
    Done,
    Current,
    Pending,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Breadcrumb {
    pub step: WizardStep,
    pub title: &'static str,
    pub state: CrumbState,
}

/// Progress markers for the linear steps. Empty on Management.
pub fn breadcrumbs(current: WizardStep) -> Vec<Breadcrumb> {
    if current == WizardStep::Management {
        return Vec::new();
    }
    WizardStep::LINEAR
        .iter()
        .map(|&step| Breadcrumb {
            step,
            title: step.title(),
            state: if step == current {
                CrumbState::Current
            } else if step.is_completed_relative_to(current) {
                CrumbState::Done
            } else {
                CrumbState::Pending
            },
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceCard {
    pub id: String,
    pub title: String,
    pub description: String,
    pub price: String,
    pub duration: String,
    pub category: String,
    pub features: Vec<String>,
    pub popular: bool,
    pub selected: bool,
}

impl ServiceCard {
    fn new(service: &Service, selected: Option<&Service>) -> Self {
        Self {
            id: service.id.clone(),
            title: service.title.clone(),
            description: service.description.clone(),
            price: format_money(service.price),
            duration: service.duration.clone(),
            category: service.category().to_string(),
            features: service.features.clone(),
            popular: service.popular,
            selected: selected.is_some_and(|s| s.id == service.id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateOption {
    pub date: NaiveDate,
    /// "Mon, Mar 10"
    pub label: String,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotOption {
    pub slot: TimeSlot,
    pub label: String,
    pub available: bool,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewSection {
    pub title: &'static str,
    /// Where the section's "Edit" link jumps to.
    pub edit_target: Option<WizardStep>,
    pub rows: Vec<(String, String)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingAction {
    Cancel,
    Rebook,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingCard {
    pub id: String,
    pub service_title: String,
    pub when: String,
    pub pet: String,
    pub price: String,
    pub status: BookingStatus,
    pub actions: Vec<BookingAction>,
}

impl BookingCard {
    fn new(booking: &Booking) -> Self {
        let actions = match booking.status {
            BookingStatus::Confirmed => vec![BookingAction::Cancel],
            BookingStatus::Completed | BookingStatus::Cancelled => vec![BookingAction::Rebook],
        };
        Self {
            id: booking.id.clone(),
            service_title: booking.service_title.clone(),
            when: format!("{} at {}", booking.date.format("%a, %b %-d, %Y"), booking.time),
            pet: format!("{} ({})", booking.pet_name, booking.pet_type),
            price: format_money(booking.price),
            status: booking.status,
            actions,
        }
    }
}

/// Body of a screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum View {
    Discovery {
        services: Vec<ServiceCard>,
    },
    Selection {
        services: Vec<ServiceCard>,
    },
    Scheduling {
        service_title: Option<String>,
        dates: Vec<DateOption>,
        slots: Vec<SlotOption>,
    },
    PetInfo {
        form: PetInfoForm,
        pet_types: Vec<&'static str>,
        weight_categories: Vec<&'static str>,
    },
    Review {
        sections: Vec<ReviewSection>,
        price: Option<PriceSummary>,
        completion: Completion,
    },
    Success {
        booking_id: Option<String>,
        sections: Vec<ReviewSection>,
        price: Option<PriceSummary>,
        preparation_notes: Option<&'static str>,
        share_text: Option<String>,
    },
    Management {
        counts: BookingCounts,
        upcoming: Vec<BookingCard>,
        past: Vec<BookingCard>,
    },
}

/// A rendered step: header, progress and body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Screen {
    pub step: WizardStep,
    pub title: &'static str,
    pub breadcrumbs: Vec<Breadcrumb>,
    pub view: View,
}

pub fn render(step: WizardStep, session: &BookingSession, ctx: &RenderContext) -> Screen {
    let view = match step {
        WizardStep::Discovery => View::Discovery {
            services: service_cards(&ctx.services, session),
        },
        WizardStep::Selection => View::Selection {
            services: service_cards(&ctx.services, session),
        },
        WizardStep::Scheduling => View::Scheduling {
            service_title: session.service().map(|s| s.title.clone()),
            dates: ctx
                .dates
                .iter()
                .map(|&date| DateOption {
                    date,
                    label: date.format("%a, %b %-d").to_string(),
                    selected: session.date() == Some(date),
                })
                .collect(),
            slots: ctx
                .slots
                .iter()
                .map(|s| SlotOption {
                    slot: s.slot,
                    label: s.slot.to_string(),
                    available: s.available,
                    selected: session.time() == Some(s.slot),
                })
                .collect(),
        },
        WizardStep::PetInfo => View::PetInfo {
            form: PetInfoForm::from_session(session),
            pet_types: PetType::ALL.iter().map(PetType::label).collect(),
            weight_categories: WeightCategory::ALL.iter().map(WeightCategory::label).collect(),
        },
        WizardStep::Review => View::Review {
            sections: summary_sections(session, true),
            price: PriceSummary::for_session(session, ctx.tax_rate),
            completion: estimated_completion(session),
        },
        WizardStep::Success => View::Success {
            booking_id: session.booking_id().map(str::to_string),
            sections: summary_sections(session, false),
            price: PriceSummary::for_session(session, ctx.tax_rate),
            preparation_notes: session.service().map(Service::preparation_notes),
            share_text: share_text(session),
        },
        WizardStep::Management => View::Management {
            counts: ctx.counts,
            upcoming: ctx.upcoming.iter().map(BookingCard::new).collect(),
            past: ctx.past.iter().map(BookingCard::new).collect(),
        },
    };

    Screen {
        step,
        title: step.title(),
        breadcrumbs: breadcrumbs(step),
        view,
    }
}

fn service_cards(services: &[Service], session: &BookingSession) -> Vec<ServiceCard> {
    services
        .iter()
        .map(|s| ServiceCard::new(s, session.service()))
        .collect()
}

/// Service, appointment and pet sections shown on Review and Success.
pub fn summary_sections(session: &BookingSession, editable: bool) -> Vec<ReviewSection> {
    let edit = |step| editable.then_some(step);
    let mut sections = Vec::new();

    if let Some(service) = session.service() {
        sections.push(ReviewSection {
            title: "Service",
            edit_target: edit(WizardStep::Selection),
            rows: vec![
                ("Service".into(), service.title.clone()),
                ("Category".into(), service.category().to_string()),
                ("Duration".into(), service.duration.clone()),
                ("Includes".into(), service.inclusions().to_string()),
            ],
        });
    }

    let mut appointment = Vec::new();
    if let Some(date) = session.date() {
        appointment.push(("Date".into(), date.format("%A, %B %-d, %Y").to_string()));
    }
    if let Some(time) = session.time() {
        appointment.push(("Time".into(), time.to_string()));
        appointment.push((
            "Estimated completion".into(),
            estimated_completion(session).to_string(),
        ));
    }
    if !appointment.is_empty() {
        sections.push(ReviewSection {
            title: "Appointment",
            edit_target: edit(WizardStep::Scheduling),
            rows: appointment,
        });
    }

    let mut pet = Vec::new();
    if let Some(name) = session.pet_name() {
        pet.push(("Name".into(), name.to_string()));
    }
    if let Some(pet_type) = session.pet_type() {
        pet.push(("Type".into(), pet_type.to_string()));
    }
    if let Some(age) = session.pet_age() {
        let unit = if age == 1 { "year" } else { "years" };
        pet.push(("Age".into(), format!("{age} {unit}")));
    }
    if let Some(weight) = session.pet_weight() {
        pet.push(("Weight".into(), weight.to_string()));
    }
    if let Some(notes) = session.notes() {
        pet.push(("Notes".into(), notes.to_string()));
    }
    if !pet.is_empty() {
        sections.push(ReviewSection {
            title: "Pet",
            edit_target: edit(WizardStep::PetInfo),
            rows: pet,
        });
    }

    sections
}

/// Text for the success screen's share button. `None` until confirmed.
pub fn share_text(session: &BookingSession) -> Option<String> {
    let id = session.booking_id()?;
    let service = session.service()?;
    let date = session.date()?;
    let time = session.time()?;
    let pet = session.pet_name()?;
    Some(format!(
        "I just booked {service} for {pet} on {date} at {time} with PawCare! (Ref: {id})",
        service = service.title,
        date = date.format("%B %-d, %Y"),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::sample_services;
    use crate::config::DEFAULT_TAX_RATE;
    use crate::wizard::session::SessionPatch;
    use chrono::Utc;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn ctx() -> RenderContext {
        RenderContext {
            services: sample_services(),
            tax_rate: DEFAULT_TAX_RATE,
            ..Default::default()
        }
    }

    fn complete_session() -> BookingSession {
        BookingSession::new()
            .merged(
                SessionPatch::new()
                    .service(sample_services().remove(1))
                    .date(date("2025-03-10"))
                    .time(TimeSlot::from_hm(10, 0))
                    .pet_name("Rex")
                    .pet_type(PetType::Dog)
                    .pet_age(Some(4)),
            )
            .unwrap()
    }

    #[test]
    fn breadcrumbs_mark_progress() {
        let crumbs = breadcrumbs(WizardStep::PetInfo);
        assert_eq!(crumbs.len(), 6);
        assert_eq!(crumbs[0].state, CrumbState::Done);
        assert_eq!(crumbs[2].state, CrumbState::Done);
        assert_eq!(crumbs[3].state, CrumbState::Current);
        assert_eq!(crumbs[4].state, CrumbState::Pending);
        assert!(breadcrumbs(WizardStep::Management).is_empty());
    }

    #[test]
    fn selection_marks_chosen_service() {
        let session = BookingSession::new()
            .merged(SessionPatch::new().service(sample_services().remove(1)))
            .unwrap();
        let screen = render(WizardStep::Selection, &session, &ctx());
        let View::Selection { services } = screen.view else {
            panic!("expected selection view");
        };
        let selected: Vec<_> = services.iter().filter(|c| c.selected).collect();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].id, "grooming-premium");
        assert_eq!(selected[0].price, "$85.00");
        assert!(selected[0].popular);
    }

    #[test]
    fn scheduling_shows_slot_state() {
        let mut context = ctx();
        context.dates = vec![date("2025-03-10"), date("2025-03-11")];
        context.slots = vec![
            SlotAvailability {
                slot: TimeSlot::from_hm(10, 0),
                available: true,
            },
            SlotAvailability {
                slot: TimeSlot::from_hm(12, 0),
                available: false,
            },
        ];
        let screen = render(WizardStep::Scheduling, &complete_session(), &context);
        let View::Scheduling { dates, slots, .. } = screen.view else {
            panic!("expected scheduling view");
        };
        assert_eq!(dates[0].label, "Mon, Mar 10");
        assert!(dates[0].selected);
        assert!(slots[0].selected);
        assert!(!slots[1].available);
        assert_eq!(slots[1].label, "12:00 PM");
    }

    #[test]
    fn review_has_edit_targets_and_price() {
        let screen = render(WizardStep::Review, &complete_session(), &ctx());
        let View::Review {
            sections,
            price,
            completion,
        } = screen.view
        else {
            panic!("expected review view");
        };
        let targets: Vec<_> = sections.iter().map(|s| s.edit_target).collect();
        assert_eq!(
            targets,
            vec![
                Some(WizardStep::Selection),
                Some(WizardStep::Scheduling),
                Some(WizardStep::PetInfo)
            ]
        );
        assert_eq!(price.unwrap().display_total(), "$92.23");
        assert_eq!(completion.to_string(), "1:00 PM");
        assert!(sections[2].rows.contains(&("Age".into(), "4 years".into())));
    }

    #[test]
    fn success_has_share_text_once_confirmed() {
        let mut session = complete_session();
        assert!(share_text(&session).is_none());
        session.freeze("AB12CD34".into(), Utc::now());

        let screen = render(WizardStep::Success, &session, &ctx());
        let View::Success {
            booking_id,
            sections,
            share_text,
            preparation_notes,
            ..
        } = screen.view
        else {
            panic!("expected success view");
        };
        assert_eq!(booking_id.as_deref(), Some("AB12CD34"));
        assert!(sections.iter().all(|s| s.edit_target.is_none()));
        assert!(share_text.unwrap().contains("Ref: AB12CD34"));
        assert_eq!(
            preparation_notes,
            Some("Please ensure pet is up-to-date on vaccinations")
        );
    }

    #[test]
    fn pet_info_lists_choices() {
        let screen = render(WizardStep::PetInfo, &complete_session(), &ctx());
        let View::PetInfo {
            form,
            pet_types,
            weight_categories,
        } = screen.view
        else {
            panic!("expected pet info view");
        };
        assert_eq!(form.pet_name, "Rex");
        assert_eq!(pet_types.len(), 10);
        assert!(pet_types.contains(&"Guinea Pig"));
        assert_eq!(weight_categories[0], "Under 10 lbs");
    }
}
