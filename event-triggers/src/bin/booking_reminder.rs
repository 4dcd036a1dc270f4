//! Booking Reminder Lambda - Emails clients ahead of their appointments.
//!
//! Runs every six hours via EventBridge (`cron(0 */6 * * ? *)`) and:
//! 1. Finds paid bookings starting within the next 48 hours
//! 2. Sends each client the reminder template
//! 3. Flags the slot so the reminder goes out only once

use chrono::Utc;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use serde::Deserialize;
use shared::{send_due_reminders, AppState, ReminderScope, ReminderSummary};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Deserialize)]
struct ScheduledEvent {
    #[serde(default, rename = "detail-type")]
    detail_type: String,
}

async fn handler(
    state: Arc<AppState>,
    event: LambdaEvent<ScheduledEvent>,
) -> Result<ReminderSummary, Error> {
    info!(detail_type = %event.payload.detail_type, "Starting booking reminder sweep");

    let summary = send_due_reminders(&state, Utc::now(), ReminderScope::PaidOnly).await?;

    info!(
        bookings_found = summary.bookings_found,
        reminders_sent = summary.reminders_sent,
        skipped = summary.skipped,
        errors = summary.errors,
        "Booking reminder sweep complete"
    );

    Ok(summary)
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
    fn test_scheduled_event_parses() {
        let event: ScheduledEvent = serde_json::from_str(
            r#"{"version":"0","detail-type":"Scheduled Event","source":"aws.events","detail":{}}"#,
        )
        .unwrap();
        assert_eq!(event.detail_type, "Scheduled Event");

        let event: ScheduledEvent = serde_json::from_str("{}").unwrap();
        assert!(event.detail_type.is_empty());
    }
}
