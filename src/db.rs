use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;
use tracing::info;

use crate::config::AppConfig;

/// Creates the shared PostgreSQL pool.
pub async fn connect(config: &AppConfig) -> anyhow::Result<PgPool> {
    info!(max_connections = config.db_max_connections, "connecting to PostgreSQL");
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(std::time::Duration::from_secs(30))
        .connect(&config.database_url)
        .await
        .context("connect to database")?;
    info!("PostgreSQL connection pool established");
    Ok(pool)
}

/// Failures surfaced by the user and application stores.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate key: {0}")]
    Duplicate(String),

    #[error("corrupt row: {0}")]
    Corrupt(String),

    #[error("order_index out of range")]
    OrderOverflow,

    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(error: sqlx::Error) -> Self {
        match error {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                StoreError::Duplicate(db_err.message().to_string())
            }
            // numeric_value_out_of_range, e.g. `order_index + 1` past INT4
            sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("22003") => {
                StoreError::OrderOverflow
            }
            other => StoreError::Database(other),
        }
    }
}
