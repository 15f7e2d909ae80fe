// Account and permit service errors
use serde_json::{json, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::auth::HashError;
use crate::database::manager::DatabaseError;

/// Typed outcome of every failed service operation
#[derive(Debug, Error)]
pub enum AccountError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("An account with this {field} already exists")]
    DuplicateAccount { field: &'static str },

    /// Covers unknown email and wrong password alike
    #[error("Invalid email or password")]
    AuthFailure,

    #[error("Constraint violated: {0}")]
    ConstraintViolation(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Invalid {field}: {message}")]
    Validation { field: &'static str, message: String },

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AccountError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        AccountError::Validation {
            field,
            message: message.into(),
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            AccountError::NotFound { .. } => "NOT_FOUND",
            AccountError::DuplicateAccount { .. } => "DUPLICATE_ACCOUNT",
            AccountError::AuthFailure => "AUTH_FAILURE",
            AccountError::ConstraintViolation(_) => "CONSTRAINT_VIOLATION",
            AccountError::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            AccountError::Validation { .. } => "VALIDATION_ERROR",
            AccountError::Hashing(_) | AccountError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Client-safe message. Store and hashing details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            AccountError::StoreUnavailable(_) => "Store temporarily unavailable".to_string(),
            AccountError::ConstraintViolation(_) => {
                "Request violates a data constraint".to_string()
            }
            AccountError::Hashing(_) | AccountError::Internal(_) => {
                "An error occurred while processing your request".to_string()
            }
            other => other.to_string(),
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        match self {
            AccountError::Validation { field, .. } => json!({
                "error": true,
                "message": self.public_message(),
                "code": self.error_code(),
                "field": field,
            }),
            _ => json!({
                "error": true,
                "message": self.public_message(),
                "code": self.error_code(),
            }),
        }
    }
}

impl From<DatabaseError> for AccountError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound(msg) => {
                AccountError::Internal(format!("unexpected missing row: {}", msg))
            }
            DatabaseError::UniqueViolation { constraint } => {
                AccountError::ConstraintViolation(format!("unique constraint {}", constraint))
            }
            DatabaseError::ConstraintViolation(msg) => AccountError::ConstraintViolation(msg),
            DatabaseError::Unavailable(msg) => {
                tracing::error!("Store unavailable: {}", msg);
                AccountError::StoreUnavailable(msg)
            }
            DatabaseError::ConfigMissing(key) => {
                tracing::error!("Store misconfigured: missing {}", key);
                AccountError::StoreUnavailable(format!("missing configuration {}", key))
            }
            DatabaseError::Hash(e) => e.into(),
            DatabaseError::Sqlx(e) => {
                tracing::error!("SQLx error: {}", e);
                AccountError::Internal(e.to_string())
            }
        }
    }
}

impl From<HashError> for AccountError {
    fn from(err: HashError) -> Self {
        tracing::error!("Password hashing error: {}", err);
        AccountError::Hashing(err.to_string())
    }
}

pub type AccountResult<T> = Result<T, AccountError>;
