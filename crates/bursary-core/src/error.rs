use bursary_domain::{Action, Role};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("{entity} {id} is {state}; operation not allowed")]
    InvalidState {
        entity: &'static str,
        id: String,
        state: String,
    },
    #[error("Permission denied: role {role} may not {action}")]
    PermissionDenied { role: Role, action: Action },
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Serialization error: {0}")]
    Serde(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        CoreError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn invalid_state(entity: &'static str, id: impl ToString, state: impl ToString) -> Self {
        CoreError::InvalidState {
            entity,
            id: id.to_string(),
            state: state.to_string(),
        }
    }
}
