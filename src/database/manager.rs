use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::auth::HashError;
use crate::config::DatabaseConfig;

/// Errors surfaced by the store layer
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unique constraint violated: {constraint}")]
    UniqueViolation { constraint: String },

    #[error("Constraint violated: {0}")]
    ConstraintViolation(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Hash(#[from] HashError),

    #[error(transparent)]
    Sqlx(sqlx::Error),
}

// SQLSTATE codes classified as plain constraint violations
const NOT_NULL_VIOLATION: &str = "23502";
const STRING_TOO_LONG: &str = "22001";

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        let classified = match &err {
            sqlx::Error::RowNotFound => {
                Some(DatabaseError::NotFound("Record not found".to_string()))
            }
            sqlx::Error::Database(db) => {
                if db.is_unique_violation() {
                    Some(DatabaseError::UniqueViolation {
                        constraint: db.constraint().unwrap_or("unknown").to_string(),
                    })
                } else if db.is_foreign_key_violation() || db.is_check_violation() {
                    Some(DatabaseError::ConstraintViolation(db.message().to_string()))
                } else {
                    match db.code().as_deref() {
                        Some(NOT_NULL_VIOLATION) | Some(STRING_TOO_LONG) => {
                            Some(DatabaseError::ConstraintViolation(db.message().to_string()))
                        }
                        _ => None,
                    }
                }
            }
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_) => Some(DatabaseError::Unavailable(err.to_string())),
            _ => None,
        };

        match classified {
            Some(classified) => classified,
            None => DatabaseError::Sqlx(err),
        }
    }
}

/// Builds the Postgres pool handed to the stores
pub struct DatabaseManager;

impl DatabaseManager {
    pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
        let url = config
            .url
            .as_deref()
            .ok_or(DatabaseError::ConfigMissing("DATABASE_URL"))?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(url)
            .await?;

        info!(max_connections = config.max_connections, "Created database pool");
        Ok(pool)
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(pool: &PgPool) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(pool).await?;
        Ok(())
    }
}
