//! Line-oriented terminal front-end: command parsing and screen drawing.

use std::fmt::Write as _;

use chrono::NaiveDate;

use crate::availability::TimeSlot;
use crate::error::WizardError;
use crate::wizard::pricing::PriceSummary;
use crate::wizard::session::SessionPatch;
use crate::wizard::step::WizardStep;
use crate::wizard::validation::PetInfoForm;
use crate::wizard::view::{BookingAction, CrumbState, ReviewSection, Screen, View};
use crate::wizard::BookingWizard;

pub const HELP: &str = "\
Commands:
  browse                         show all services
  select <service-id>            choose a service
  schedule <YYYY-MM-DD> <time>   pick a date and time, e.g. schedule 2025-03-10 10:00 AM
  pet <name>|<type>|<age>|<weight>|<notes>
                                 enter pet details (age, weight, notes optional)
  edit <selection|scheduling|pet_info>
                                 change a section from the review screen
  confirm agree                  accept the terms and book
  back                           previous step
  bookings                       open My Bookings
  cancel <id> | complete <id> | rebook <id>
  new                            start a new booking
  help | quit";

/// A parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Browse,
    Select(String),
    Schedule(NaiveDate, TimeSlot),
    Pet(PetInfoForm),
    Edit(WizardStep),
    Confirm { terms_accepted: bool },
    Back,
    Bookings,
    Cancel(String),
    Complete(String),
    Rebook(String),
    New,
    Help,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let (word, rest) = line
            .split_once(char::is_whitespace)
            .map(|(w, r)| (w, r.trim()))
            .unwrap_or((line, ""));

        let arg = |name: &str| {
            if rest.is_empty() {
                Err(format!("Usage: {word} <{name}>"))
            } else {
                Ok(rest.to_string())
            }
        };

        match word.to_lowercase().as_str() {
            "browse" => Ok(Self::Browse),
            "select" => arg("service-id").map(Self::Select),
            "schedule" => {
                let (date, time) = rest
                    .split_once(char::is_whitespace)
                    .ok_or("Usage: schedule <YYYY-MM-DD> <time>")?;
                let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
                    .map_err(|_| format!("Not a date: {date}"))?;
                let time = time.trim().parse::<TimeSlot>()?;
                Ok(Self::Schedule(date, time))
            }
            "pet" => {
                let mut parts = rest.split('|').map(|p| p.trim().to_string());
                Ok(Self::Pet(PetInfoForm {
                    pet_name: parts.next().unwrap_or_default(),
                    pet_type: parts.next().unwrap_or_default(),
                    pet_age: parts.next().unwrap_or_default(),
                    pet_weight: parts.next().unwrap_or_default(),
                    notes: parts.next().unwrap_or_default(),
                }))
            }
            "edit" => rest.parse::<WizardStep>().map(Self::Edit),
            "confirm" => Ok(Self::Confirm {
                terms_accepted: rest.eq_ignore_ascii_case("agree"),
            }),
            "back" => Ok(Self::Back),
            "bookings" => Ok(Self::Bookings),
            "cancel" => arg("id").map(Self::Cancel),
            "complete" => arg("id").map(Self::Complete),
            "rebook" => arg("id").map(Self::Rebook),
            "new" => Ok(Self::New),
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" => Ok(Self::Quit),
            other => Err(format!("Unknown command: {other} (try 'help')")),
        }
    }
}

/// Apply one command to the wizard. Returns a status line for the user.
pub async fn execute(wizard: &mut BookingWizard, command: Command) -> Result<String, WizardError> {
    match command {
        Command::Browse => {
            if wizard.current_step() == WizardStep::Discovery {
                wizard.continue_step(SessionPatch::new()).await?;
            }
            Ok(String::new())
        }
        Command::Select(id) => {
            let service = wizard.find_service(&id).await?;
            wizard
                .advance(WizardStep::Scheduling, SessionPatch::new().service(service))
                .await?;
            Ok(String::new())
        }
        Command::Schedule(date, time) => {
            wizard
                .continue_step(SessionPatch::new().date(date).time(time))
                .await?;
            Ok(String::new())
        }
        Command::Pet(form) => {
            wizard.submit_pet_info(form).await?;
            Ok(String::new())
        }
        Command::Edit(step) => {
            wizard.edit_jump(step)?;
            Ok(String::new())
        }
        Command::Confirm { terms_accepted } => {
            let booking = wizard.confirm(terms_accepted).await?;
            Ok(format!("Booked! Your reference is {}", booking.id))
        }
        Command::Back => Ok(match wizard.back() {
            Some(_) => String::new(),
            None => "Nothing to go back to.".into(),
        }),
        Command::Bookings => {
            wizard.open_management();
            Ok(String::new())
        }
        Command::Cancel(id) => {
            let booking = wizard.cancel_booking(&id).await?;
            Ok(format!("Booking {} cancelled.", booking.id))
        }
        Command::Complete(id) => {
            let booking = wizard.complete_booking(&id).await?;
            Ok(format!("Booking {} marked completed.", booking.id))
        }
        Command::Rebook(id) => {
            wizard.rebook(&id).await?;
            Ok(String::new())
        }
        Command::New => {
            wizard.start_new_booking()?;
            Ok(String::new())
        }
        Command::Help => Ok(HELP.to_string()),
        Command::Quit => Ok(String::new()),
    }
}

/// Human-readable message for a failed command.
pub fn describe_error(err: &WizardError) -> String {
    match err.validation_errors() {
        Some(errors) => errors
            .iter()
            .map(|e| format!("  ! {}", e.message))
            .collect::<Vec<_>>()
            .join("\n"),
        None => format!("  ! {err}"),
    }
}

/// Render a screen as plain text.
pub fn draw(screen: &Screen) -> String {
    let mut out = String::new();

    if !screen.breadcrumbs.is_empty() {
        let trail: Vec<String> = screen
            .breadcrumbs
            .iter()
            .map(|c| match c.state {
                CrumbState::Done => format!("✓ {}", c.title),
                CrumbState::Current => format!("[{}]", c.title),
                CrumbState::Pending => c.title.to_string(),
            })
            .collect();
        let _ = writeln!(out, "{}", trail.join(" > "));
    }
    let _ = writeln!(out, "\n== {} ==", screen.title);

    match &screen.view {
        View::Discovery { services } | View::Selection { services } => {
            for card in services {
                let marker = if card.selected { "*" } else { " " };
                let popular = if card.popular { " (Most Popular)" } else { "" };
                let _ = writeln!(
                    out,
                    "{marker} {:<20} {:<22} {:>8}  {}{popular}",
                    card.id, card.title, card.price, card.duration
                );
                let _ = writeln!(out, "    {}", card.description);
            }
        }
        View::Scheduling {
            service_title,
            dates,
            slots,
        } => {
            if let Some(title) = service_title {
                let _ = writeln!(out, "Service: {title}");
            }
            let labels: Vec<String> = dates
                .iter()
                .map(|d| {
                    if d.selected {
                        format!("[{}]", d.date)
                    } else {
                        d.date.to_string()
                    }
                })
                .collect();
            let _ = writeln!(out, "Dates: {}", labels.join("  "));
            if !slots.is_empty() {
                let labels: Vec<String> = slots
                    .iter()
                    .map(|s| match (s.selected, s.available) {
                        (true, _) => format!("[{}]", s.label),
                        (false, true) => s.label.clone(),
                        (false, false) => format!("({} taken)", s.label),
                    })
                    .collect();
                let _ = writeln!(out, "Times: {}", labels.join("  "));
            }
        }
        View::PetInfo {
            form,
            pet_types,
            weight_categories,
        } => {
            let _ = writeln!(out, "Name: {}", form.pet_name);
            let _ = writeln!(out, "Type: {}  ({})", form.pet_type, pet_types.join(", "));
            let _ = writeln!(out, "Age: {}", form.pet_age);
            let _ = writeln!(
                out,
                "Weight: {}  ({})",
                form.pet_weight,
                weight_categories.join(", ")
            );
            let _ = writeln!(out, "Notes: {}", form.notes);
        }
        View::Review {
            sections,
            price,
            completion,
        } => {
            draw_sections(&mut out, sections);
            draw_price(&mut out, price.as_ref());
            let _ = writeln!(out, "Estimated completion: {completion}");
        }
        View::Success {
            booking_id,
            sections,
            price,
            preparation_notes,
            share_text,
        } => {
            if let Some(id) = booking_id {
                let _ = writeln!(out, "Booking ID: {id}");
            }
            draw_sections(&mut out, sections);
            draw_price(&mut out, price.as_ref());
            if let Some(notes) = preparation_notes {
                let _ = writeln!(out, "Before your visit: {notes}");
            }
            if let Some(text) = share_text {
                let _ = writeln!(out, "Share: {text}");
            }
        }
        View::Management {
            counts,
            upcoming,
            past,
        } => {
            let _ = writeln!(out, "{} upcoming, {} past", counts.upcoming, counts.past);
            for (heading, cards, empty) in [
                ("Upcoming", upcoming, "No upcoming bookings"),
                ("Past", past, "No past bookings"),
            ] {
                let _ = writeln!(out, "\n-- {heading} --");
                if cards.is_empty() {
                    let _ = writeln!(out, "{empty}");
                }
                for card in cards {
                    let actions: Vec<&str> = card
                        .actions
                        .iter()
                        .map(|a| match a {
                            BookingAction::Cancel => "cancel",
                            BookingAction::Rebook => "rebook",
                        })
                        .collect();
                    let _ = writeln!(
                        out,
                        "{} {:<10} {} | {} | {} | {} [{}]",
                        card.id,
                        card.status.to_string().to_uppercase(),
                        card.service_title,
                        card.when,
                        card.pet,
                        card.price,
                        actions.join(", ")
                    );
                }
            }
        }
    }

    out
}

fn draw_sections(out: &mut String, sections: &[ReviewSection]) {
    for section in sections {
        let edit = section
            .edit_target
            .map(|step| format!("  (edit {step})"))
            .unwrap_or_default();
        let _ = writeln!(out, "\n{}{edit}", section.title);
        for (label, value) in &section.rows {
            let _ = writeln!(out, "  {label}: {value}");
        }
    }
}

fn draw_price(out: &mut String, price: Option<&PriceSummary>) {
    if let Some(price) = price {
        let _ = writeln!(out, "\nSubtotal: {}", price.display_subtotal());
        let _ = writeln!(out, "Tax:      {}", price.display_tax());
        let _ = writeln!(out, "Total:    {}", price.display_total());
    }
}
