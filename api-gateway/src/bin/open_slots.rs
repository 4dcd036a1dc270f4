//! Open Slots Lambda - Handles /openslots, the public availability list.

use chrono::Utc;
use lambda_http::{run, service_fn, Body, Error, Request, Response};
use shared::http::{error_response, json_response, normalize_path};
use shared::slots::{with_addons, SLOT_COLUMNS};
use shared::{AppState, SlotRow};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, PartialEq, Eq)]
enum Route {
    List,
    NotFound,
}

fn route(method: &str, path: &str) -> Route {
    match (method, path) {
        ("GET", "/openslots") => Route::List,
        _ => Route::NotFound,
    }
}

/// Unbooked slots from now on, soonest first.
async fn list_open_slots(state: &AppState) -> shared::Result<Response<Body>> {
    let query = format!(
        r#"
        SELECT {}
        FROM slots
        WHERE booking_date >= $1
        AND NOT booked
        ORDER BY booking_date ASC
        "#,
        SLOT_COLUMNS
    );

    let slots: Vec<SlotRow> = sqlx::query_as(&query)
        .bind(Utc::now())
        .fetch_all(&state.db_pool)
        .await?;

    info!(open_slots = slots.len(), "Listed open slots");
    json_response(200, &with_addons(&state.db_pool, slots).await?)
}

async fn handler(state: Arc<AppState>, event: Request) -> Result<Response<Body>, Error> {
    let method = event.method().as_str();
    let path = normalize_path(event.uri().path());

    info!("Open slots request: {} {}", method, path);

    let result = match route(method, path) {
        Route::List => list_open_slots(&state).await,
        Route::NotFound => Err(shared::Error::NotFound("Not found".to_string())),
    };

    match result {
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
    fn test_routes() {
        assert_eq!(route("GET", "/openslots"), Route::List);
        assert_eq!(route("GET", normalize_path("/api/openslots/")), Route::List);
        assert_eq!(route("POST", "/openslots"), Route::NotFound);
        assert_eq!(route("GET", "/openslots/3"), Route::NotFound);
        assert_eq!(route("GET", "/slots"), Route::NotFound);
    }
}
