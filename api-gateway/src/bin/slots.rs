//! Slots API Lambda - appointment slots and the booking email actions.
//!
//! Endpoints:
//! - GET /slots - List slots (optional `from` date)
//! - GET /slots/v2/{month}/{year} - List slots in a month (zero-based month)
//! - POST /slots - Create one slot (`date`) or many (`multiDates`)
//! - GET /slots/{id} - Get a single slot
//! - PATCH /slots/{id} - Reschedule, mark paid, or book a slot
//! - DELETE /slots/{id} - Delete a slot and its add-ons
//! - POST /slots/{id}/bookingconfirm - Store details and email the confirmation
//! - POST /slots/{id}/bookingpaid - Store details and email the paid receipt
//! - POST /slots/{id}/bookingtoclient - Email staff the booking with a calendar invite
//! - POST /slots/{id}/bookingcancel - Email the cancellation notice
//! - POST /slots/bookingconfirm - Send reminders for bookings in the next 48 hours

use chrono::{DateTime, Utc};
use lambda_http::{run, service_fn, Body, Error, Request, RequestExt, Response};
use serde::{Deserialize, Serialize};
use shared::format::{month_range, parse_date};
use shared::http::{
    empty_response, error_response, json_response, normalize_path, parse_id, parse_json_body,
    segments_under,
};
use shared::notifications::{
    cancellation_email, confirmation_email, paid_email, send_then_commit, staff_notification,
};
use shared::slots::{get_slot, get_slot_response, with_addons, SLOT_COLUMNS};
use shared::{
    send_due_reminders, AddonInput, AppState, BookingDetails, BookingDetailsRequest,
    CancellationRequest, Price, ReminderScope, ReminderSummary, SlotRow,
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

type ApiResult = shared::Result<Response<Body>>;

/// Create slots request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateSlotsRequest {
    date: Option<String>,
    #[serde(default)]
    multi_dates: Vec<String>,
}

/// Create slots response
#[derive(Debug, Serialize)]
struct CreateSlotsResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    count: Option<u64>,
}

/// Update slot request. Absent fields are left untouched.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateSlotRequest {
    date: Option<String>,
    booked: Option<bool>,
    paid: Option<bool>,
    name: Option<String>,
    email: Option<String>,
    phone_number: Option<String>,
    service: Option<String>,
    instagram_handle: Option<String>,
    price: Option<Price>,
    #[serde(default)]
    addons: Vec<AddonInput>,
}

/// What a PATCH does, by precedence: a date reschedules, `paid: true` marks
/// paid, anything else books.
#[derive(Debug, PartialEq, Eq)]
enum SlotUpdate<'a> {
    Reschedule(&'a str),
    MarkPaid,
    Book,
}

impl UpdateSlotRequest {
    fn action(&self) -> SlotUpdate<'_> {
        if let Some(date) = self.date.as_deref().filter(|d| !d.is_empty()) {
            return SlotUpdate::Reschedule(date);
        }
        if self.paid == Some(true) {
            return SlotUpdate::MarkPaid;
        }
        SlotUpdate::Book
    }

    /// Booking marks the slot booked unless told otherwise.
    fn booked(&self) -> bool {
        self.booked.unwrap_or(true)
    }
}

/// Contact details left on a slot after booking
#[derive(Debug, sqlx::FromRow)]
struct SlotContact {
    name: Option<String>,
    email: Option<String>,
    phone_number: Option<String>,
    instagram_handle: Option<String>,
}

/// How a booked slot gets its client record.
#[derive(Debug, PartialEq, Eq)]
enum ClientLink<'a> {
    /// No email on the slot: nothing to link
    Skip,
    /// Email and name known: create the client or reuse the one with this email
    Upsert { name: &'a str, email: &'a str },
    /// Email only: link an existing client, never create one
    Lookup { email: &'a str },
}

impl SlotContact {
    fn client_link(&self) -> ClientLink<'_> {
        let email = self.email.as_deref().map(str::trim).filter(|e| !e.is_empty());
        let name = self.name.as_deref().filter(|n| !n.trim().is_empty());

        match (email, name) {
            (None, _) => ClientLink::Skip,
            (Some(email), Some(name)) => ClientLink::Upsert { name, email },
            (Some(email), None) => ClientLink::Lookup { email },
        }
    }
}

/// Manual reminder sweep response
#[derive(Debug, Serialize)]
struct ReminderSweepResponse {
    message: &'static str,
    #[serde(flatten)]
    summary: ReminderSummary,
}

#[derive(Debug, PartialEq, Eq)]
enum Route<'a> {
    List,
    ListMonth { month: &'a str, year: &'a str },
    Create,
    SendReminders,
    Get(&'a str),
    Update(&'a str),
    Delete(&'a str),
    Confirm(&'a str),
    Paid(&'a str),
    NotifyStaff(&'a str),
    Cancel(&'a str),
    NotFound,
}

fn route<'a>(method: &str, path: &'a str) -> Route<'a> {
    let Some(segments) = segments_under(path, "/slots") else {
        return Route::NotFound;
    };

    match (method, segments.as_slice()) {
        ("GET", []) => Route::List,
        ("POST", []) => Route::Create,
        ("GET", ["v2", month, year]) => Route::ListMonth { month: *month, year: *year },
        ("POST", ["bookingconfirm"]) => Route::SendReminders,
        ("GET", [id]) => Route::Get(*id),
        ("PATCH", [id]) => Route::Update(*id),
        ("DELETE", [id]) => Route::Delete(*id),
        ("POST", [id, "bookingconfirm"]) => Route::Confirm(*id),
        ("POST", [id, "bookingpaid"]) => Route::Paid(*id),
        ("POST", [id, "bookingtoclient"]) => Route::NotifyStaff(*id),
        ("POST", [id, "bookingcancel"]) => Route::Cancel(*id),
        _ => Route::NotFound,
    }
}

/// Parse the optional `from` query parameter.
fn parse_from(state: &AppState, from: Option<&str>) -> shared::Result<Option<DateTime<Utc>>> {
    match from.filter(|f| !f.is_empty()) {
        Some(raw) => parse_date(raw, state.config.timezone).map(Some).ok_or_else(|| {
            shared::Error::Validation("from query is invalid date format".to_string())
        }),
        None => Ok(None),
    }
}

/// Split add-ons into the name and price columns to insert.
fn addon_columns(addons: &[AddonInput]) -> (Vec<String>, Vec<String>) {
    addons
        .iter()
        .filter(|a| !a.addon.trim().is_empty())
        .map(|a| {
            let price = a
                .price
                .as_ref()
                .filter(|p| !p.is_empty())
                .map(|p| p.as_str().to_string())
                .unwrap_or_else(|| "0".to_string());
            (a.addon.trim().to_string(), price)
        })
        .unzip()
}

fn no_slot() -> shared::Error {
    shared::Error::NotFound("no slot found".to_string())
}

fn no_booking_date() -> shared::Error {
    shared::Error::Validation("slot has no booking date".to_string())
}

async fn slot_json(state: &AppState, slot: SlotRow) -> ApiResult {
    let response = with_addons(&state.db_pool, vec![slot])
        .await?
        .pop()
        .ok_or_else(no_slot)?;
    json_response(200, &response)
}

async fn list_slots(
    state: &AppState,
    from: Option<DateTime<Utc>>,
    until: Option<DateTime<Utc>>,
) -> ApiResult {
    let query = format!(
        r#"
        SELECT {}
        FROM slots
        WHERE ($1::timestamptz IS NULL OR booking_date >= $1)
        AND ($2::timestamptz IS NULL OR booking_date < $2)
        ORDER BY booking_date ASC NULLS LAST, id ASC
        "#,
        SLOT_COLUMNS
    );

    let slots: Vec<SlotRow> = sqlx::query_as(&query)
        .bind(from)
        .bind(until)
        .fetch_all(&state.db_pool)
        .await?;

    json_response(200, &with_addons(&state.db_pool, slots).await?)
}

async fn create_slots(state: &AppState, request: CreateSlotsRequest) -> ApiResult {
    let tz = state.config.timezone;
    let invalid_date = || shared::Error::Validation("invalid date".to_string());

    if let Some(date) = request.date.as_deref().filter(|d| !d.is_empty()) {
        let booking_date = parse_date(date, tz).ok_or_else(invalid_date)?;

        let id: i32 = sqlx::query_scalar("INSERT INTO slots (booking_date) VALUES ($1) RETURNING id")
            .bind(booking_date)
            .fetch_one(&state.db_pool)
            .await?;

        info!(slot_id = id, "Slot created");
        return json_response(
            200,
            &CreateSlotsResponse {
                success: true,
                id: Some(id),
                count: None,
            },
        );
    }

    if request.multi_dates.is_empty() {
        return Err(invalid_date());
    }

    let dates = request
        .multi_dates
        .iter()
        .map(|d| parse_date(d, tz))
        .collect::<Option<Vec<_>>>()
        .ok_or_else(invalid_date)?;

    let result = sqlx::query(
        "INSERT INTO slots (booking_date) SELECT * FROM UNNEST($1::timestamptz[])",
    )
    .bind(&dates)
    .execute(&state.db_pool)
    .await?;

    info!(count = result.rows_affected(), "Slots created");
    json_response(
        200,
        &CreateSlotsResponse {
            success: true,
            id: None,
            count: Some(result.rows_affected()),
        },
    )
}

async fn update_slot(state: &AppState, id: i32, request: UpdateSlotRequest) -> ApiResult {
    match request.action() {
        SlotUpdate::Reschedule(date) => {
            let booking_date = parse_date(date, state.config.timezone)
                .ok_or_else(|| shared::Error::Validation("invalid date".to_string()))?;

            let query = format!(
                "UPDATE slots SET booking_date = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
                SLOT_COLUMNS
            );
            let slot: SlotRow = sqlx::query_as(&query)
                .bind(id)
                .bind(booking_date)
                .fetch_optional(&state.db_pool)
                .await?
                .ok_or_else(no_slot)?;

            info!(slot_id = id, "Slot rescheduled");
            slot_json(state, slot).await
        }
        SlotUpdate::MarkPaid => {
            let query = format!(
                "UPDATE slots SET paid = TRUE, updated_at = NOW() WHERE id = $1 RETURNING {}",
                SLOT_COLUMNS
            );
            let slot: SlotRow = sqlx::query_as(&query)
                .bind(id)
                .fetch_optional(&state.db_pool)
                .await?
                .ok_or_else(no_slot)?;

            info!(slot_id = id, "Slot marked paid");
            slot_json(state, slot).await
        }
        SlotUpdate::Book => book_slot(state, id, request).await,
    }
}

/// Store the booking details, add-ons and client link in one transaction.
async fn book_slot(state: &AppState, id: i32, request: UpdateSlotRequest) -> ApiResult {
    let mut tx = state.db_pool.begin().await?;

    let contact: SlotContact = sqlx::query_as(
        r#"
        UPDATE slots
        SET booked = $2,
            paid = COALESCE($3, paid),
            name = COALESCE($4, name),
            email = COALESCE($5, email),
            phone_number = COALESCE($6, phone_number),
            service = COALESCE($7, service),
            instagram_handle = COALESCE($8, instagram_handle),
            price = COALESCE($9, price),
            updated_at = NOW()
        WHERE id = $1
        RETURNING name, email, phone_number, instagram_handle
        "#,
    )
    .bind(id)
    .bind(request.booked())
    .bind(request.paid)
    .bind(&request.name)
    .bind(&request.email)
    .bind(&request.phone_number)
    .bind(&request.service)
    .bind(&request.instagram_handle)
    .bind(request.price.as_ref().map(Price::as_str))
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(no_slot)?;

    let (addon_names, addon_prices) = addon_columns(&request.addons);
    if !addon_names.is_empty() {
        sqlx::query(
            r#"
            INSERT INTO slot_addons (slot_id, addon, price)
            SELECT $1, addon, price FROM UNNEST($2::text[], $3::text[]) AS a(addon, price)
            "#,
        )
        .bind(id)
        .bind(&addon_names)
        .bind(&addon_prices)
        .execute(&mut *tx)
        .await?;
    }

    let client_id: Option<i32> = match contact.client_link() {
        ClientLink::Skip => None,
        ClientLink::Upsert { name, email } => Some(
            sqlx::query_scalar(
                r#"
                INSERT INTO clients (name, email, phone_number, instagram_handle)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (email) DO UPDATE SET email = EXCLUDED.email
                RETURNING id
                "#,
            )
            .bind(name)
            .bind(email)
            .bind(&contact.phone_number)
            .bind(&contact.instagram_handle)
            .fetch_one(&mut *tx)
            .await?,
        ),
        ClientLink::Lookup { email } => {
            let existing: Option<i32> = sqlx::query_scalar("SELECT id FROM clients WHERE email = $1")
                .bind(email)
                .fetch_optional(&mut *tx)
                .await?;
            if existing.is_none() {
                warn!(slot_id = id, "No client record and no name to create one");
            }
            existing
        }
    };

    if let Some(client_id) = client_id {
        sqlx::query("UPDATE slots SET client_id = $2 WHERE id = $1")
            .bind(id)
            .bind(client_id)
            .execute(&mut *tx)
            .await?;
    }

    let slot = get_slot(&mut *tx, id).await?.ok_or_else(no_slot)?;
    tx.commit().await?;

    info!(slot_id = id, addons = addon_names.len(), "Slot booked");
    slot_json(state, slot).await
}

async fn delete_slot(state: &AppState, id: i32) -> ApiResult {
    let mut tx = state.db_pool.begin().await?;

    sqlx::query("DELETE FROM slot_addons WHERE slot_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    let result = sqlx::query("DELETE FROM slots WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    if result.rows_affected() == 0 {
        return Err(no_slot());
    }

    tx.commit().await?;
    info!(slot_id = id, "Slot deleted");
    empty_response()
}

async fn confirm_booking(state: &AppState, id: i32, details: BookingDetails) -> ApiResult {
    let slot = get_slot(&state.db_pool, id).await?.ok_or_else(no_slot)?;
    if slot.confirm_email {
        return Err(shared::Error::Validation("email already sent".to_string()));
    }
    let booking_date = slot.booking_date.ok_or_else(no_booking_date)?;

    let mut tx = state.db_pool.begin().await?;

    // Guarded on the flag so two concurrent confirmations send one email
    let query = format!(
        r#"
        UPDATE slots
        SET name = $2, email = $3, phone_number = $4, service = $5,
            instagram_handle = $6, price = $7, confirm_email = TRUE, updated_at = NOW()
        WHERE id = $1 AND NOT confirm_email
        RETURNING {}
        "#,
        SLOT_COLUMNS
    );
    let updated: SlotRow = sqlx::query_as(&query)
        .bind(id)
        .bind(&details.name)
        .bind(&details.email)
        .bind(&details.phone_number)
        .bind(&details.service)
        .bind(&details.instagram_handle)
        .bind(details.price.as_str())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| shared::Error::Validation("email already sent".to_string()))?;

    let email = confirmation_email(&state.config, id, booking_date, &details);
    send_then_commit(tx, &state.mailer, &email).await?;

    info!(slot_id = id, "Booking confirmation sent");
    slot_json(state, updated).await
}

async fn paid_booking(state: &AppState, id: i32, details: BookingDetails) -> ApiResult {
    let slot = get_slot(&state.db_pool, id).await?.ok_or_else(no_slot)?;
    if slot.paid_email {
        return Err(shared::Error::Validation("paid email already sent".to_string()));
    }
    let booking_date = slot.booking_date.ok_or_else(no_booking_date)?;

    let mut tx = state.db_pool.begin().await?;

    let query = format!(
        r#"
        UPDATE slots
        SET name = $2, email = $3, phone_number = $4, service = $5,
            instagram_handle = $6, paid_email = TRUE, updated_at = NOW()
        WHERE id = $1 AND NOT paid_email
        RETURNING {}
        "#,
        SLOT_COLUMNS
    );
    let updated: SlotRow = sqlx::query_as(&query)
        .bind(id)
        .bind(&details.name)
        .bind(&details.email)
        .bind(&details.phone_number)
        .bind(&details.service)
        .bind(&details.instagram_handle)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| shared::Error::Validation("paid email already sent".to_string()))?;

    let email = paid_email(&state.config, booking_date, &details);
    send_then_commit(tx, &state.mailer, &email).await?;

    info!(slot_id = id, "Paid receipt sent");
    slot_json(state, updated).await
}

async fn notify_staff(state: &AppState, id: i32, details: BookingDetails) -> ApiResult {
    let slot = get_slot(&state.db_pool, id).await?.ok_or_else(no_slot)?;
    let booking_date = slot.booking_date.ok_or_else(no_booking_date)?;

    let email = staff_notification(&state.config, id, booking_date, &details)?;
    state.mailer.send_raw(&email).await?;

    info!(slot_id = id, "Staff notified of booking");
    empty_response()
}

async fn cancel_booking(state: &AppState, id: i32, request: CancellationRequest) -> ApiResult {
    if request.is_open_slot() {
        return empty_response();
    }

    let slot = get_slot(&state.db_pool, id).await?.ok_or_else(no_slot)?;
    let to = request
        .email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .ok_or_else(|| shared::Error::Validation("invalid body".to_string()))?;
    let booking_date = slot.booking_date.ok_or_else(no_booking_date)?;

    let email = cancellation_email(&state.config, id, booking_date, to, &request);
    state.mailer.send_templated(&email).await?;

    info!(slot_id = id, "Cancellation notice sent");
    empty_response()
}

async fn send_reminders(state: &AppState) -> ApiResult {
    let summary = send_due_reminders(state, Utc::now(), ReminderScope::AllBooked).await?;
    json_response(
        200,
        &ReminderSweepResponse {
            message: "sent email confirmations",
            summary,
        },
    )
}

fn booking_details(event: &Request) -> shared::Result<BookingDetails> {
    let request: BookingDetailsRequest = parse_json_body(event.body())?;
    BookingDetails::try_from(request)
}

async fn dispatch(state: &AppState, event: &Request, route: Route<'_>) -> ApiResult {
    match route {
        Route::List => {
            let params = event.query_string_parameters();
            let from = parse_from(state, params.first("from"))?;
            list_slots(state, from, None).await
        }
        Route::ListMonth { month, year } => {
            let invalid = || shared::Error::Validation("invalid month or year".to_string());
            let month: i32 = month.parse().map_err(|_| invalid())?;
            let year: i32 = year.parse().map_err(|_| invalid())?;
            let (start, end) =
                month_range(month, year, state.config.timezone).ok_or_else(invalid)?;

            // An explicit `from` replaces the month window
            let params = event.query_string_parameters();
            match parse_from(state, params.first("from"))? {
                Some(from) => list_slots(state, Some(from), None).await,
                None => list_slots(state, Some(start), Some(end)).await,
            }
        }
        Route::Create => create_slots(state, parse_json_body(event.body())?).await,
        Route::SendReminders => send_reminders(state).await,
        Route::Get(raw_id) => {
            let id = parse_id(raw_id)?;
            let slot = get_slot_response(&state.db_pool, id)
                .await?
                .ok_or_else(no_slot)?;
            json_response(200, &slot)
        }
        Route::Update(raw_id) => {
            let id = parse_id(raw_id)?;
            update_slot(state, id, parse_json_body(event.body())?).await
        }
        Route::Delete(raw_id) => delete_slot(state, parse_id(raw_id)?).await,
        Route::Confirm(raw_id) => {
            let id = parse_id(raw_id)?;
            confirm_booking(state, id, booking_details(event)?).await
        }
        Route::Paid(raw_id) => {
            let id = parse_id(raw_id)?;
            paid_booking(state, id, booking_details(event)?).await
        }
        Route::NotifyStaff(raw_id) => {
            let id = parse_id(raw_id)?;
            notify_staff(state, id, booking_details(event)?).await
        }
        Route::Cancel(raw_id) => {
            let id = parse_id(raw_id)?;
            cancel_booking(state, id, parse_json_body(event.body())?).await
        }
        Route::NotFound => Err(shared::Error::NotFound("Not found".to_string())),
    }
}

async fn handler(state: Arc<AppState>, event: Request) -> Result<Response<Body>, Error> {
    let method = event.method().as_str();
    let path = normalize_path(event.uri().path());

    info!("Slots request: {} {}", method, path);

    match dispatch(&state, &event, route(method, path)).await {
        Ok(response) => Ok(response),
        Err(e) => error_response(&e),
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let state = Arc::new(AppState::new().await?);
    let state_clone = state.clone();

    run(service_fn(move |event| {
        let state = state_clone.clone();
        async move { handler(state, event).await }
    }))
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_collection() {
        assert_eq!(route("GET", "/slots"), Route::List);
        assert_eq!(route("POST", "/slots"), Route::Create);
        assert_eq!(route("POST", "/slots/bookingconfirm"), Route::SendReminders);
        assert_eq!(
            route("GET", "/slots/v2/7/2024"),
            Route::ListMonth { month: "7", year: "2024" }
        );
    }

    #[test]
    fn test_route_single_slot() {
        assert_eq!(route("GET", "/slots/12"), Route::Get("12"));
        assert_eq!(route("PATCH", "/slots/12"), Route::Update("12"));
        assert_eq!(route("DELETE", "/slots/12"), Route::Delete("12"));
        assert_eq!(route("POST", "/slots/12/bookingconfirm"), Route::Confirm("12"));
        assert_eq!(route("POST", "/slots/12/bookingpaid"), Route::Paid("12"));
        assert_eq!(route("POST", "/slots/12/bookingtoclient"), Route::NotifyStaff("12"));
        assert_eq!(route("POST", "/slots/12/bookingcancel"), Route::Cancel("12"));
    }

    #[test]
    fn test_route_unknown() {
        assert_eq!(route("PUT", "/slots/12"), Route::NotFound);
        assert_eq!(route("POST", "/slots/12/refund"), Route::NotFound);
        assert_eq!(route("GET", "/clients"), Route::NotFound);
        assert_eq!(route("GET", "/slots/v2/7"), Route::NotFound);
    }

    #[test]
    fn test_create_request_shapes() {
        let request: CreateSlotsRequest =
            serde_json::from_str(r#"{"date": "2024-06-01T10:00"}"#).unwrap();
        assert_eq!(request.date.as_deref(), Some("2024-06-01T10:00"));
        assert!(request.multi_dates.is_empty());

        let request: CreateSlotsRequest =
            serde_json::from_str(r#"{"multiDates": ["2024-06-01T10:00", "2024-06-01T13:00"]}"#)
                .unwrap();
        assert!(request.date.is_none());
        assert_eq!(request.multi_dates.len(), 2);
    }

    #[test]
    fn test_update_request_defaults() {
        let request: UpdateSlotRequest = serde_json::from_str(
            r#"{"name": "Ana", "email": "ana@example.com", "price": 65, "addons": [{"addon": "chrome"}]}"#,
        )
        .unwrap();
        assert!(request.booked.is_none());
        assert_eq!(request.price.as_ref().map(Price::as_str), Some("65"));
        assert_eq!(request.addons.len(), 1);
    }

    fn update(json: &str) -> UpdateSlotRequest {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_update_precedence() {
        assert_eq!(
            update(r#"{"date": "2024-06-01T10:00", "paid": true, "name": "Ana"}"#).action(),
            SlotUpdate::Reschedule("2024-06-01T10:00")
        );
        assert_eq!(
            update(r#"{"paid": true, "name": "Ana"}"#).action(),
            SlotUpdate::MarkPaid
        );
        assert_eq!(update(r#"{"paid": false, "name": "Ana"}"#).action(), SlotUpdate::Book);
        assert_eq!(update(r#"{"date": "", "name": "Ana"}"#).action(), SlotUpdate::Book);
        assert_eq!(update("{}").action(), SlotUpdate::Book);
    }

    #[test]
    fn test_booking_defaults_to_booked() {
        assert!(update(r#"{"name": "Ana"}"#).booked());
        assert!(update(r#"{"booked": true}"#).booked());
        assert!(!update(r#"{"booked": false}"#).booked());
    }

    fn contact(name: Option<&str>, email: Option<&str>) -> SlotContact {
        SlotContact {
            name: name.map(String::from),
            email: email.map(String::from),
            phone_number: None,
            instagram_handle: None,
        }
    }

    #[test]
    fn test_client_created_only_with_name_and_email() {
        assert_eq!(
            contact(Some("Ana"), Some(" ana@example.com ")).client_link(),
            ClientLink::Upsert { name: "Ana", email: "ana@example.com" }
        );
        assert_eq!(
            contact(None, Some("ana@example.com")).client_link(),
            ClientLink::Lookup { email: "ana@example.com" }
        );
        assert_eq!(
            contact(Some("  "), Some("ana@example.com")).client_link(),
            ClientLink::Lookup { email: "ana@example.com" }
        );
        assert_eq!(contact(Some("Ana"), None).client_link(), ClientLink::Skip);
        assert_eq!(contact(Some("Ana"), Some("")).client_link(), ClientLink::Skip);
    }

    #[test]
    fn test_addon_columns() {
        let addons = vec![
            AddonInput { addon: "chrome".into(), price: Some(Price::new("10")) },
            AddonInput { addon: "french".into(), price: None },
            AddonInput { addon: "  ".into(), price: Some(Price::new("5")) },
            AddonInput { addon: "gems".into(), price: Some(Price::new("")) },
        ];
        let (names, prices) = addon_columns(&addons);
        assert_eq!(names, vec!["chrome", "french", "gems"]);
        assert_eq!(prices, vec!["10", "0", "0"]);
    }

    #[test]
    fn test_reminder_sweep_response_shape() {
        let response = ReminderSweepResponse {
            message: "sent email confirmations",
            summary: ReminderSummary {
                bookings_found: 3,
                reminders_sent: 2,
                skipped: 1,
                errors: 0,
            },
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["message"], "sent email confirmations");
        assert_eq!(json["reminders_sent"], 2);
        assert_eq!(json["skipped"], 1);
    }
}
