use thiserror::Error;
use uuid::Uuid;

use crate::domain::types::EntityKind;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{kind} `{id}` not found")]
    NotFound { kind: EntityKind, id: Uuid },
    #[error("invalid `{field}`: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },
}

impl DomainError {
    pub fn not_found(kind: EntityKind, id: Uuid) -> Self {
        Self::NotFound { kind, id }
    }

    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }
}
