use bursary_config::ConfigError;
use bursary_core::CoreError;
use thiserror::Error;

/// Errors surfaced by the fee office facade.
#[derive(Debug, Error)]
pub enum BursaryError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("{entity} {id} is {state}; operation not allowed")]
    InvalidState {
        entity: &'static str,
        id: String,
        state: String,
    },
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<CoreError> for BursaryError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(msg) => BursaryError::Validation(msg),
            CoreError::InvalidState { entity, id, state } => {
                BursaryError::InvalidState { entity, id, state }
            }
            denied @ CoreError::PermissionDenied { .. } => {
                BursaryError::PermissionDenied(denied.to_string())
            }
            CoreError::NotFound { entity, id } => BursaryError::NotFound { entity, id },
            CoreError::Conflict(msg) => BursaryError::Conflict(msg),
            CoreError::Storage(msg) | CoreError::Serde(msg) => BursaryError::Storage(msg),
            CoreError::Io(err) => BursaryError::Storage(err.to_string()),
        }
    }
}

impl From<ConfigError> for BursaryError {
    fn from(err: ConfigError) -> Self {
        BursaryError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bursary_domain::{Action, Role};

    #[test]
    fn permission_denial_keeps_role_and_action_in_message() {
        let err: BursaryError = CoreError::PermissionDenied {
            role: Role::Staff,
            action: Action::ApprovePayment,
        }
        .into();
        let BursaryError::PermissionDenied(message) = err else {
            panic!("expected permission denial");
        };
        assert!(message.contains("staff"));
    }

    #[test]
    fn io_failures_become_storage_errors() {
        let err: BursaryError =
            CoreError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk full")).into();
        assert!(matches!(err, BursaryError::Storage(msg) if msg.contains("disk full")));
    }
}
