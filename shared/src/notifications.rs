//! Booking emails: template payloads, the staff notification with its
//! calendar invite, and the 48-hour reminder sweep.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::json;
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::HashMap;
use tracing::{error, info, warn};

use crate::calendar::CalendarEvent;
use crate::email::{Attachment, EmailSender, RawEmail, TemplatedEmail};
use crate::format::{format_booking_date, format_price, format_short_time};
use crate::models::{chosen_addons, AddonInput, AddonRow, BookingDetails, CancellationRequest, SlotRow};
use crate::{slots, AppState, Config, Error, Result};

/// How far ahead the reminder sweep looks.
pub const REMINDER_WINDOW_HOURS: i64 = 48;

/// Length of the appointment block put on the staff calendar.
pub const APPOINTMENT_HOURS: i64 = 2;

/// Confirmation sent when the salon accepts a booking.
pub fn confirmation_email(
    config: &Config,
    slot_id: i32,
    booking_date: DateTime<Utc>,
    details: &BookingDetails,
) -> TemplatedEmail {
    TemplatedEmail {
        to: details.email.clone(),
        template: config.templates.confirmation.clone(),
        data: json!({
            "id": slot_id,
            "name": details.name,
            "booking_date": format_booking_date(booking_date, config.timezone),
            "service": details.service,
            "price": format_price(details.price.as_str()),
            "addons": details.addons,
        }),
    }
}

/// Receipt sent once the booking is paid.
pub fn paid_email(
    config: &Config,
    booking_date: DateTime<Utc>,
    details: &BookingDetails,
) -> TemplatedEmail {
    TemplatedEmail {
        to: details.email.clone(),
        template: config.templates.paid.clone(),
        data: json!({
            "name": details.name,
            "booking_date": format_booking_date(booking_date, config.timezone),
            "service": details.service,
            "price": format_price(details.price.as_str()),
            "newAddOn": details.chosen_addons(),
        }),
    }
}

/// Notice sent when a booking is cancelled.
pub fn cancellation_email(
    config: &Config,
    slot_id: i32,
    booking_date: DateTime<Utc>,
    to: &str,
    request: &CancellationRequest,
) -> TemplatedEmail {
    TemplatedEmail {
        to: to.to_string(),
        template: config.templates.cancellation.clone(),
        data: json!({
            "id": slot_id,
            "name": request.name,
            "booking_date": format_booking_date(booking_date, config.timezone),
            "service": request.service,
            "email": to,
            "instagram": request.instagram_handle,
            "price": format_price(request.price.as_ref().map(|p| p.as_str()).unwrap_or_default()),
            "addons": request.addons,
        }),
    }
}

/// Reminder for an upcoming booking, or `None` when the slot has no
/// recipient or no date.
pub fn reminder_email(config: &Config, slot: &SlotRow, addons: &[AddonRow]) -> Option<TemplatedEmail> {
    let to = slot.email.as_deref().map(str::trim).filter(|e| !e.is_empty())?;
    let booking_date = slot.booking_date?;
    let addons: Vec<AddonInput> = addons.iter().map(AddonInput::from).collect();

    Some(TemplatedEmail {
        to: to.to_string(),
        template: config.templates.reminder.clone(),
        data: json!({
            "name": slot.name,
            "booking_date": format_booking_date(booking_date, config.timezone),
            "service": slot.service,
            "price": format_price(slot.price.as_deref().unwrap_or_default()),
            "newAddOn": chosen_addons(&addons),
        }),
    })
}

/// Booking summary for the staff inbox with an `invite.ics` attachment.
pub fn staff_notification(
    config: &Config,
    slot_id: i32,
    booking_date: DateTime<Utc>,
    details: &BookingDetails,
) -> Result<RawEmail> {
    let to = config
        .staff_email
        .clone()
        .ok_or_else(|| Error::Config("STAFF_EMAIL not set".to_string()))?;

    let description = booking_description(details);
    let event = CalendarEvent::new(
        format!(
            "{} {} - {}",
            format_short_time(booking_date, config.timezone),
            details.name,
            details.service
        ),
        description.clone(),
        booking_date,
        Duration::hours(APPOINTMENT_HOURS),
    );

    let when = format_booking_date(booking_date, config.timezone);

    Ok(RawEmail {
        to,
        subject: format!("New booking: {} - {}", details.name, when),
        text: format!("Booking #{}\nDate: {}\n{}\n", slot_id, when, description),
        attachment: Attachment {
            filename: "invite.ics".to_string(),
            content_type: "text/calendar; method=PUBLISH; charset=UTF-8".to_string(),
            content: event.to_ics().into_bytes(),
        },
    })
}

fn booking_description(details: &BookingDetails) -> String {
    let addons = details.chosen_addons();

    let names = addons
        .iter()
        .map(|a| a.addon.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    let mut price = format_price(details.price.as_str());
    for addon_price in addons.iter().filter_map(|a| a.price.as_ref()).filter(|p| !p.is_empty()) {
        price.push_str(&format!(" + {}", format_price(addon_price.as_str())));
    }

    format!(
        "{}: {}\nPrice: {}\nPhone Number: {}\nIG: {}\nEmail: {}",
        details.service, names, price, details.phone_number, details.instagram_handle, details.email
    )
}

/// Which booked slots the reminder sweep covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderScope {
    /// Scheduled job: only bookings that are paid.
    PaidOnly,
    /// Manual sweep from the staff dashboard: every booked slot.
    AllBooked,
}

/// Outcome of a reminder sweep.
#[derive(Debug, Default, Serialize)]
pub struct ReminderSummary {
    pub bookings_found: u32,
    pub reminders_sent: u32,
    pub skipped: u32,
    pub errors: u32,
}

/// Uncommitted database writes that must only land if an email goes out.
#[allow(async_fn_in_trait)]
pub trait PendingWrite {
    async fn commit(self) -> Result<()>;
}

impl PendingWrite for Transaction<'_, Postgres> {
    async fn commit(self) -> Result<()> {
        Transaction::commit(self).await.map_err(Error::Database)
    }
}

/// Send `email`, then commit `write`. A failed send returns before the
/// commit, so the write is dropped and rolled back.
pub async fn send_then_commit<W: PendingWrite, M: EmailSender>(
    write: W,
    mailer: &M,
    email: &TemplatedEmail,
) -> Result<String> {
    let message_id = mailer.send_templated(email).await?;
    write.commit().await?;
    Ok(message_id)
}

/// Where the reminder sweep records that a slot's reminder went out.
#[allow(async_fn_in_trait)]
pub trait ReminderStore {
    async fn mark_reminder_sent(&self, slot_id: i32) -> Result<()>;
}

impl ReminderStore for PgPool {
    async fn mark_reminder_sent(&self, slot_id: i32) -> Result<()> {
        slots::mark_reminder_sent(self, slot_id).await
    }
}

/// Send the reminder to every booking starting within the next 48 hours that
/// has not had one yet, flagging each slot once its email is accepted.
pub async fn send_due_reminders(
    state: &AppState,
    now: DateTime<Utc>,
    scope: ReminderScope,
) -> Result<ReminderSummary> {
    let until = now + Duration::hours(REMINDER_WINDOW_HOURS);
    let bookings = slots::find_due_reminders(
        &state.db_pool,
        now,
        until,
        scope == ReminderScope::PaidOnly,
    )
    .await?;

    let ids: Vec<i32> = bookings.iter().map(|b| b.id).collect();
    let addons = slots::addons_for(&state.db_pool, &ids).await?;

    info!(bookings_found = bookings.len(), ?scope, "Found bookings due a reminder");

    let summary =
        deliver_reminders(&state.config, &state.mailer, &state.db_pool, &bookings, &addons).await;

    info!(
        reminders_sent = summary.reminders_sent,
        skipped = summary.skipped,
        errors = summary.errors,
        "Reminder sweep complete"
    );

    Ok(summary)
}

/// Email each booking and flag it. Bookings without a recipient are skipped
/// and a failed send is counted; neither is flagged, so the next run retries.
pub async fn deliver_reminders<M: EmailSender, S: ReminderStore>(
    config: &Config,
    mailer: &M,
    store: &S,
    bookings: &[SlotRow],
    addons: &HashMap<i32, Vec<AddonRow>>,
) -> ReminderSummary {
    let mut summary = ReminderSummary {
        bookings_found: bookings.len() as u32,
        ..Default::default()
    };

    for booking in bookings {
        let slot_addons = addons.get(&booking.id).map(Vec::as_slice).unwrap_or_default();

        let Some(email) = reminder_email(config, booking, slot_addons) else {
            warn!(slot_id = booking.id, "Booking has no email address, skipping reminder");
            summary.skipped += 1;
            continue;
        };

        if let Err(e) = mailer.send_templated(&email).await {
            error!(slot_id = booking.id, error = %e, "Failed to send reminder");
            summary.errors += 1;
            continue;
        }

        match store.mark_reminder_sent(booking.id).await {
            Ok(()) => summary.reminders_sent += 1,
            Err(e) => {
                error!(slot_id = booking.id, error = %e, "Reminder sent but flag not stored");
                summary.errors += 1;
            }
        }
    }

    summary
}
