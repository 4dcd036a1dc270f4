//! Per-container application state shared by every invocation.

use aws_config::{BehaviorVersion, Region};
use sqlx::PgPool;
use tracing::info;

use crate::{create_pool, get_database_credentials, Config, Mailer, Result};

/// Database pool, mailer and configuration, built once per cold start.
pub struct AppState {
    pub db_pool: PgPool,
    pub mailer: Mailer,
    pub config: Config,
}

impl AppState {
    /// Load configuration, fetch database credentials and connect.
    pub async fn new() -> Result<Self> {
        let config = Config::from_env()?;

        let aws_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.aws_region.clone()))
            .load()
            .await;
        let secrets_client = aws_sdk_secretsmanager::Client::new(&aws_config);
        let ses_client = aws_sdk_ses::Client::new(&aws_config);

        let credentials = get_database_credentials(&secrets_client, &config.db_secret_arn).await?;
        let db_pool = create_pool(&config, &credentials).await?;

        info!(db_host = %config.db_host, db_name = %config.db_name, "Application state ready");

        Ok(Self {
            db_pool,
            mailer: Mailer::new(ses_client, config.sender()),
            config,
        })
    }
}
