//! Clients API Lambda - CRUD operations for salon clients.
//!
//! Endpoints:
//! - GET /clients - List clients with their slots
//! - POST /clients - Create a client
//! - PATCH /clients/{id} - Update a client
//! - DELETE /clients/{id} - Delete a client (their slots are kept)

use lambda_http::{run, service_fn, Body, Error, Request, Response};
use serde::Deserialize;
use shared::http::{
    error_response, json_response, normalize_path, parse_id, parse_json_body, segments_under,
};
use shared::slots::{with_addons, SLOT_COLUMNS};
use shared::{AppState, ClientResponse, ClientRow, SlotRow};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use validator::Validate;

type ApiResult = shared::Result<Response<Body>>;

const CLIENT_COLUMNS: &str =
    "id, name, email, phone_number, instagram_handle, created_at, updated_at";

/// Create client request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct CreateClientRequest {
    #[validate(required, length(min = 1))]
    name: Option<String>,
    #[validate(required, email)]
    email: Option<String>,
    #[validate(required, length(min = 1))]
    phone_number: Option<String>,
    #[validate(required, length(min = 1))]
    instagram_handle: Option<String>,
}

/// Update client request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct UpdateClientRequest {
    #[validate(length(min = 1))]
    name: Option<String>,
    #[validate(email)]
    email: Option<String>,
    phone_number: Option<String>,
    instagram_handle: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
enum Route<'a> {
    List,
    Create,
    Update(&'a str),
    Delete(&'a str),
    NotFound,
}

fn route<'a>(method: &str, path: &'a str) -> Route<'a> {
    let Some(segments) = segments_under(path, "/clients") else {
        return Route::NotFound;
    };

    match (method, segments.as_slice()) {
        ("GET", []) => Route::List,
        ("POST", []) => Route::Create,
        ("PATCH", [id]) => Route::Update(*id),
        ("DELETE", [id]) => Route::Delete(*id),
        _ => Route::NotFound,
    }
}

fn invalid_detail() -> shared::Error {
    shared::Error::Validation("invalid detail".to_string())
}

fn email_taken() -> shared::Error {
    shared::Error::Validation("email already exists".to_string())
}

fn no_client() -> shared::Error {
    shared::Error::NotFound("no client found".to_string())
}

/// Map a unique-email violation to the caller-facing message.
fn map_unique_email(err: sqlx::Error) -> shared::Error {
    let err = shared::Error::from(err);
    if err.is_unique_violation() {
        email_taken()
    } else {
        err
    }
}

async fn list_clients(state: &AppState) -> ApiResult {
    let query = format!("SELECT {} FROM clients ORDER BY name ASC", CLIENT_COLUMNS);
    let clients: Vec<ClientRow> = sqlx::query_as(&query).fetch_all(&state.db_pool).await?;

    let ids: Vec<i32> = clients.iter().map(|c| c.id).collect();
    let query = format!(
        "SELECT {} FROM slots WHERE client_id = ANY($1) ORDER BY booking_date ASC",
        SLOT_COLUMNS
    );
    let slots: Vec<SlotRow> = sqlx::query_as(&query)
        .bind(&ids)
        .fetch_all(&state.db_pool)
        .await?;

    let mut slots_by_client = HashMap::new();
    for slot in with_addons(&state.db_pool, slots).await? {
        if let Some(client_id) = slot.client_id {
            slots_by_client
                .entry(client_id)
                .or_insert_with(Vec::new)
                .push(slot);
        }
    }

    let responses: Vec<ClientResponse> = clients
        .into_iter()
        .map(|row| {
            let slots = slots_by_client.remove(&row.id).unwrap_or_default();
            ClientResponse {
                slots: Some(slots),
                ..ClientResponse::from(row)
            }
        })
        .collect();

    json_response(200, &responses)
}

async fn create_client(state: &AppState, request: CreateClientRequest) -> ApiResult {
    request.validate().map_err(|_| invalid_detail())?;

    let (Some(name), Some(email), Some(phone_number), Some(instagram_handle)) = (
        request.name,
        request.email,
        request.phone_number,
        request.instagram_handle,
    ) else {
        return Err(invalid_detail());
    };

    let existing: Option<i32> = sqlx::query_scalar("SELECT id FROM clients WHERE email = $1")
        .bind(&email)
        .fetch_optional(&state.db_pool)
        .await?;
    if existing.is_some() {
        return Err(email_taken());
    }

    let query = format!(
        r#"
        INSERT INTO clients (name, email, phone_number, instagram_handle)
        VALUES ($1, $2, $3, $4)
        RETURNING {}
        "#,
        CLIENT_COLUMNS
    );
    let client: ClientRow = sqlx::query_as(&query)
        .bind(&name)
        .bind(&email)
        .bind(&phone_number)
        .bind(&instagram_handle)
        .fetch_one(&state.db_pool)
        .await
        .map_err(map_unique_email)?;

    info!(client_id = client.id, "Client created");
    json_response(200, &ClientResponse::from(client))
}

async fn update_client(state: &AppState, id: i32, request: UpdateClientRequest) -> ApiResult {
    request.validate().map_err(|_| invalid_detail())?;

    let query = format!(
        r#"
        UPDATE clients
        SET name = COALESCE($2, name),
            email = COALESCE($3, email),
            phone_number = COALESCE($4, phone_number),
            instagram_handle = COALESCE($5, instagram_handle),
            updated_at = NOW()
        WHERE id = $1
        RETURNING {}
        "#,
        CLIENT_COLUMNS
    );
    let client: ClientRow = sqlx::query_as(&query)
        .bind(id)
        .bind(&request.name)
        .bind(&request.email)
        .bind(&request.phone_number)
        .bind(&request.instagram_handle)
        .fetch_optional(&state.db_pool)
        .await
        .map_err(map_unique_email)?
        .ok_or_else(no_client)?;

    info!(client_id = id, "Client updated");
    json_response(200, &ClientResponse::from(client))
}

async fn delete_client(state: &AppState, id: i32) -> ApiResult {
    let query = format!("DELETE FROM clients WHERE id = $1 RETURNING {}", CLIENT_COLUMNS);
    let client: ClientRow = sqlx::query_as(&query)
        .bind(id)
        .fetch_optional(&state.db_pool)
        .await?
        .ok_or_else(no_client)?;

    info!(client_id = id, "Client deleted");
    json_response(200, &ClientResponse::from(client))
}

async fn dispatch(state: &AppState, event: &Request, route: Route<'_>) -> ApiResult {
    match route {
        Route::List => list_clients(state).await,
        Route::Create => create_client(state, parse_json_body(event.body())?).await,
        Route::Update(raw_id) => {
            let id = parse_id(raw_id)?;
            update_client(state, id, parse_json_body(event.body())?).await
        }
        Route::Delete(raw_id) => delete_client(state, parse_id(raw_id)?).await,
        Route::NotFound => Err(shared::Error::NotFound("Not found".to_string())),
    }
}

async fn handler(state: Arc<AppState>, event: Request) -> Result<Response<Body>, Error> {
    let method = event.method().as_str();
    let path = normalize_path(event.uri().path());

    info!("Clients request: {} {}", method, path);

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
    fn test_routes() {
        assert_eq!(route("GET", "/clients"), Route::List);
        assert_eq!(route("POST", "/clients"), Route::Create);
        assert_eq!(route("PATCH", "/clients/5"), Route::Update("5"));
        assert_eq!(route("DELETE", "/clients/5"), Route::Delete("5"));
        assert_eq!(route("GET", "/clients/5"), Route::NotFound);
        assert_eq!(route("GET", "/slots"), Route::NotFound);
    }

    #[test]
    fn test_create_request_validation() {
        let request: CreateClientRequest = serde_json::from_str(
            r#"{"name":"Ana","email":"ana@example.com","phoneNumber":"555-0100","instagramHandle":"@ana"}"#,
        )
        .unwrap();
        assert!(request.validate().is_ok());

        let request: CreateClientRequest = serde_json::from_str(
            r#"{"name":"Ana","email":"not-an-email","phoneNumber":"555-0100","instagramHandle":"@ana"}"#,
        )
        .unwrap();
        assert!(request.validate().is_err());

        let request: CreateClientRequest =
            serde_json::from_str(r#"{"name":"Ana","email":"ana@example.com","phoneNumber":"555-0100"}"#)
                .unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_update_request_validation() {
        let request: UpdateClientRequest =
            serde_json::from_str(r#"{"phoneNumber":"555-0199"}"#).unwrap();
        assert!(request.validate().is_ok());

        let request: UpdateClientRequest = serde_json::from_str(r#"{"name":""}"#).unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_non_unique_errors_pass_through() {
        let err = map_unique_email(sqlx::Error::RowNotFound);
        assert_eq!(err.status_code(), 500);
    }
}
