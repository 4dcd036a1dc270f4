//! AWS Secrets Manager integration.
//!
//! Warm Lambda containers reuse the fetched secret instead of calling
//! Secrets Manager on every cold-path connection.

use aws_sdk_secretsmanager::Client as SecretsClient;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::OnceLock;
use tokio::sync::RwLock;
use tracing::debug;

use crate::{Error, Result};

static SECRETS_CACHE: OnceLock<RwLock<HashMap<String, String>>> = OnceLock::new();

fn cache() -> &'static RwLock<HashMap<String, String>> {
    SECRETS_CACHE.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Database credentials as stored by RDS secret rotation.
#[derive(Debug, Deserialize)]
pub struct DatabaseCredentials {
    pub username: String,
    pub password: String,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub dbname: Option<String>,
}

/// Fetch a secret string, serving repeat lookups from the container cache.
pub async fn get_secret(client: &SecretsClient, secret_arn: &str) -> Result<String> {
    if let Some(value) = cache().read().await.get(secret_arn) {
        return Ok(value.clone());
    }

    debug!(secret_arn, "Fetching secret");
    let response = client
        .get_secret_value()
        .secret_id(secret_arn)
        .send()
        .await
        .map_err(|e| Error::Aws(format!("Failed to get secret: {}", e)))?;

    let value = response
        .secret_string()
        .ok_or_else(|| Error::Aws("Secret has no string value".to_string()))?
        .to_string();

    cache()
        .write()
        .await
        .insert(secret_arn.to_string(), value.clone());

    Ok(value)
}

/// Get database credentials from Secrets Manager.
pub async fn get_database_credentials(
    client: &SecretsClient,
    secret_arn: &str,
) -> Result<DatabaseCredentials> {
    let secret = get_secret(client, secret_arn).await?;
    parse_credentials(&secret)
}

fn parse_credentials(secret: &str) -> Result<DatabaseCredentials> {
    serde_json::from_str(secret)
        .map_err(|e| Error::Aws(format!("Failed to parse database credentials: {}", e)))
}
