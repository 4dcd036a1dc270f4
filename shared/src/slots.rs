//! Slot queries shared by the API handlers and the reminder job.

use chrono::{DateTime, Utc};
use sqlx::postgres::PgExecutor;
use sqlx::PgPool;
use std::collections::HashMap;

use crate::models::{AddonRow, SlotResponse, SlotRow};
use crate::Result;

/// Column list matching [`SlotRow`].
pub const SLOT_COLUMNS: &str = "id, booking_date, booked, paid, name, email, phone_number, \
     service, instagram_handle, price, confirm_email, paid_email, update_email, client_id, \
     created_at, updated_at";

/// Fetch a single slot.
pub async fn get_slot<'e, E: PgExecutor<'e>>(executor: E, id: i32) -> Result<Option<SlotRow>> {
    let query = format!("SELECT {} FROM slots WHERE id = $1", SLOT_COLUMNS);

    let slot = sqlx::query_as::<_, SlotRow>(&query)
        .bind(id)
        .fetch_optional(executor)
        .await?;

    Ok(slot)
}

/// Fetch the add-ons of the given slots, grouped by slot id.
pub async fn addons_for<'e, E: PgExecutor<'e>>(
    executor: E,
    slot_ids: &[i32],
) -> Result<HashMap<i32, Vec<AddonRow>>> {
    if slot_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows: Vec<AddonRow> = sqlx::query_as(
        r#"
        SELECT id, slot_id, addon, price
        FROM slot_addons
        WHERE slot_id = ANY($1)
        ORDER BY id ASC
        "#,
    )
    .bind(slot_ids)
    .fetch_all(executor)
    .await?;

    let mut grouped: HashMap<i32, Vec<AddonRow>> = HashMap::new();
    for row in rows {
        grouped.entry(row.slot_id).or_default().push(row);
    }
    Ok(grouped)
}

/// Attach add-ons to slot rows, keeping their order.
pub async fn with_addons(pool: &PgPool, slots: Vec<SlotRow>) -> Result<Vec<SlotResponse>> {
    let ids: Vec<i32> = slots.iter().map(|s| s.id).collect();
    let mut addons = addons_for(pool, &ids).await?;

    Ok(slots
        .into_iter()
        .map(|slot| {
            let slot_addons = addons.remove(&slot.id).unwrap_or_default();
            SlotResponse::new(slot, slot_addons)
        })
        .collect())
}

/// Fetch a single slot with its add-ons.
pub async fn get_slot_response(pool: &PgPool, id: i32) -> Result<Option<SlotResponse>> {
    match get_slot(pool, id).await? {
        Some(slot) => Ok(with_addons(pool, vec![slot]).await?.pop()),
        None => Ok(None),
    }
}

/// Booked slots in `[from, until)` that have not had their reminder yet.
pub async fn find_due_reminders(
    pool: &PgPool,
    from: DateTime<Utc>,
    until: DateTime<Utc>,
    require_paid: bool,
) -> Result<Vec<SlotRow>> {
    let query = format!(
        r#"
        SELECT {}
        FROM slots
        WHERE booking_date >= $1
        AND booking_date < $2
        AND booked
        AND NOT update_email
        AND (paid OR NOT $3)
        ORDER BY booking_date ASC
        "#,
        SLOT_COLUMNS
    );

    let slots = sqlx::query_as::<_, SlotRow>(&query)
        .bind(from)
        .bind(until)
        .bind(require_paid)
        .fetch_all(pool)
        .await?;

    Ok(slots)
}

/// Record that the reminder for a slot went out.
pub async fn mark_reminder_sent(pool: &PgPool, id: i32) -> Result<()> {
    sqlx::query("UPDATE slots SET update_email = TRUE, updated_at = NOW() WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}
