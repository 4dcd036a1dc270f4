//! Database connection management.

use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use std::time::Duration;

use crate::{Config, DatabaseCredentials, Error, Result};

/// Build connection options, letting the secret override host and database.
pub fn connect_options(config: &Config, credentials: &DatabaseCredentials) -> PgConnectOptions {
    PgConnectOptions::new()
        .host(credentials.host.as_deref().unwrap_or(&config.db_host))
        .port(credentials.port.unwrap_or(5432))
        .username(&credentials.username)
        .password(&credentials.password)
        .database(credentials.dbname.as_deref().unwrap_or(&config.db_name))
}

/// Create a database connection pool.
pub async fn create_pool(config: &Config, credentials: &DatabaseCredentials) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(3))
        .connect_with(connect_options(config, credentials))
        .await
        .map_err(Error::Database)?;

    Ok(pool)
}
