//! Shared data models: database rows, API responses and booking payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{Error, Result};

/// Slot row from database
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SlotRow {
    pub id: i32,
    pub booking_date: Option<DateTime<Utc>>,
    pub booked: bool,
    pub paid: bool,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub service: Option<String>,
    pub instagram_handle: Option<String>,
    pub price: Option<String>,
    pub confirm_email: bool,
    pub paid_email: bool,
    pub update_email: bool,
    pub client_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Add-on row from database
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AddonRow {
    pub id: i32,
    pub slot_id: i32,
    pub addon: String,
    pub price: String,
}

/// Client row from database
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ClientRow {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub instagram_handle: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Add-on API response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddonResponse {
    pub id: i32,
    pub slot_id: i32,
    pub addon: String,
    pub price: String,
}

impl From<AddonRow> for AddonResponse {
    fn from(row: AddonRow) -> Self {
        Self {
            id: row.id,
            slot_id: row.slot_id,
            addon: row.addon,
            price: row.price,
        }
    }
}

/// Slot API response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotResponse {
    pub id: i32,
    pub booking_date: Option<String>,
    pub booked: bool,
    pub paid: bool,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub service: Option<String>,
    pub instagram_handle: Option<String>,
    pub price: Option<String>,
    pub confirm_email: bool,
    pub paid_email: bool,
    pub update_email: bool,
    pub client_id: Option<i32>,
    pub created_at: String,
    pub updated_at: String,
    pub addons: Vec<AddonResponse>,
}

impl SlotResponse {
    pub fn new(row: SlotRow, addons: Vec<AddonRow>) -> Self {
        Self {
            id: row.id,
            booking_date: row.booking_date.map(|dt| dt.to_rfc3339()),
            booked: row.booked,
            paid: row.paid,
            name: row.name,
            email: row.email,
            phone_number: row.phone_number,
            service: row.service,
            instagram_handle: row.instagram_handle,
            price: row.price,
            confirm_email: row.confirm_email,
            paid_email: row.paid_email,
            update_email: row.update_email,
            client_id: row.client_id,
            created_at: row.created_at.to_rfc3339(),
            updated_at: row.updated_at.to_rfc3339(),
            addons: addons.into_iter().map(AddonResponse::from).collect(),
        }
    }
}

/// Client API response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientResponse {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub instagram_handle: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slots: Option<Vec<SlotResponse>>,
}

impl From<ClientRow> for ClientResponse {
    fn from(row: ClientRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            phone_number: row.phone_number,
            instagram_handle: row.instagram_handle,
            created_at: row.created_at.to_rfc3339(),
            updated_at: row.updated_at.to_rfc3339(),
            slots: None,
        }
    }
}

/// A price as the front end sends it: `"45"`, `"45.50"` or `45`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "PriceInput", into = "String")]
pub struct Price(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum PriceInput {
    Text(String),
    Number(serde_json::Number),
}

impl From<PriceInput> for Price {
    fn from(input: PriceInput) -> Self {
        match input {
            PriceInput::Text(s) => Price(s.trim().to_string()),
            PriceInput::Number(n) => Price(n.to_string()),
        }
    }
}

impl From<Price> for String {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl Price {
    pub fn new(value: impl Into<String>) -> Self {
        Price(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// An add-on selected with a booking, e.g. `{"addon": "french tips", "price": "10"}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddonInput {
    pub addon: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
}

impl AddonInput {
    /// Placeholder the booking form sends when nothing was picked.
    pub fn is_none_choice(&self) -> bool {
        self.addon.trim().eq_ignore_ascii_case("none")
    }
}

impl From<&AddonRow> for AddonInput {
    fn from(row: &AddonRow) -> Self {
        Self {
            addon: row.addon.clone(),
            price: Some(Price::new(row.price.clone())),
        }
    }
}

/// Body of a cancellation notice. Only the recipient is required.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancellationRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub service: Option<String>,
    pub instagram_handle: Option<String>,
    pub price: Option<Price>,
    #[serde(default)]
    pub addons: Vec<AddonInput>,
    /// `"open"` when the slot was never booked; no notice is sent then.
    pub booked: Option<serde_json::Value>,
}

impl CancellationRequest {
    pub fn is_open_slot(&self) -> bool {
        matches!(&self.booked, Some(serde_json::Value::String(s)) if s == "open")
    }
}

/// Booking details posted with the confirm/paid/staff-notification actions.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BookingDetailsRequest {
    #[validate(required, length(min = 1))]
    pub name: Option<String>,
    #[validate(required, length(min = 1))]
    pub email: Option<String>,
    #[validate(required, length(min = 1))]
    pub phone_number: Option<String>,
    #[validate(required, length(min = 1))]
    pub service: Option<String>,
    #[validate(required, length(min = 1))]
    pub instagram_handle: Option<String>,
    #[validate(required)]
    pub price: Option<Price>,
    #[serde(default)]
    pub addons: Vec<AddonInput>,
}

/// Booking details with every required field present.
#[derive(Debug, Clone)]
pub struct BookingDetails {
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub service: String,
    pub instagram_handle: String,
    pub price: Price,
    pub addons: Vec<AddonInput>,
}

impl TryFrom<BookingDetailsRequest> for BookingDetails {
    type Error = Error;

    fn try_from(request: BookingDetailsRequest) -> Result<Self> {
        let invalid = || Error::Validation("invalid body".to_string());

        request.validate().map_err(|_| invalid())?;

        match request {
            BookingDetailsRequest {
                name: Some(name),
                email: Some(email),
                phone_number: Some(phone_number),
                service: Some(service),
                instagram_handle: Some(instagram_handle),
                price: Some(price),
                addons,
            } if !price.is_empty() => Ok(Self {
                name,
                email,
                phone_number,
                service,
                instagram_handle,
                price,
                addons,
            }),
            _ => Err(invalid()),
        }
    }
}

impl BookingDetails {
    /// Add-ons with the "none" placeholder removed.
    pub fn chosen_addons(&self) -> Vec<AddonInput> {
        chosen_addons(&self.addons)
    }
}

/// Drop the "none" placeholder entries from an add-on list.
pub fn chosen_addons(addons: &[AddonInput]) -> Vec<AddonInput> {
    addons.iter().filter(|a| !a.is_none_choice()).cloned().collect()
}
