use thiserror::Error;

/// Error taxonomy shared by every layer of the rental core.
///
/// `Validation`, `NotFound`, `Conflict`, `Forbidden` and `Unauthorized` are
/// expected outcomes returned to callers. `Storage` and `Crypto` are internal
/// faults: the message is logged but never echoed to interactive clients.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {entity} with {field}={value}")]
    NotFound {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("Validation: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Storage error: {0}")]
    Storage(String),

    /// Hashing or token signing failed.
    #[error("Crypto error: {0}")]
    Crypto(String),
}

impl DomainError {
    pub fn not_found(entity: &'static str, id: i32) -> Self {
        Self::NotFound {
            entity,
            field: "id",
            value: id.to_string(),
        }
    }

    /// Whether this error is likely transient (e.g. DB connection lost)
    /// and the operation may succeed if retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, DomainError::Storage(_))
    }

    /// Message that is safe to return to a client.
    pub fn public_message(&self) -> String {
        match self {
            DomainError::NotFound { entity, .. } => format!("{} not found", entity),
            DomainError::Validation(msg)
            | DomainError::Conflict(msg)
            | DomainError::Unauthorized(msg)
            | DomainError::Forbidden(msg) => msg.clone(),
            DomainError::Storage(_) | DomainError::Crypto(_) => {
                "Internal server error".to_string()
            }
        }
    }
}

impl From<sea_orm::DbErr> for DomainError {
    fn from(e: sea_orm::DbErr) -> Self {
        match e.sql_err() {
            Some(sea_orm::SqlErr::UniqueConstraintViolation(detail)) => {
                DomainError::Conflict(format!("Duplicate value: {}", detail))
            }
            _ => DomainError::Storage(e.to_string()),
        }
    }
}
