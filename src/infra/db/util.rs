use sqlx::error::{DatabaseError, ErrorKind};

use crate::application::repos::RepoError;

// Postgres SQLSTATE codes without a dedicated `ErrorKind`.
const INVALID_TEXT_REPRESENTATION: &str = "22P02";
const QUERY_CANCELED: &str = "57014";

pub fn map_sqlx_error(err: sqlx::Error) -> RepoError {
    match err {
        sqlx::Error::RowNotFound => RepoError::NotFound,
        sqlx::Error::PoolTimedOut => RepoError::Timeout,
        sqlx::Error::Database(db) => map_database_error(db.as_ref()),
        other => RepoError::from_persistence(other),
    }
}

fn map_database_error(db: &dyn DatabaseError) -> RepoError {
    classify(
        db.kind(),
        db.code().as_deref(),
        db.constraint(),
        db.message(),
    )
}

fn classify(
    kind: ErrorKind,
    code: Option<&str>,
    constraint: Option<&str>,
    message: &str,
) -> RepoError {
    let constraint = constraint.unwrap_or("unknown").to_string();
    match kind {
        ErrorKind::UniqueViolation => RepoError::Duplicate { constraint },
        // The parent row vanished between the existence check and the write.
        ErrorKind::ForeignKeyViolation => RepoError::MissingParent { constraint },
        ErrorKind::NotNullViolation | ErrorKind::CheckViolation => RepoError::Integrity {
            message: message.to_string(),
        },
        _ => match code {
            Some(INVALID_TEXT_REPRESENTATION) => RepoError::InvalidInput {
                message: message.to_string(),
            },
            Some(QUERY_CANCELED) => RepoError::Timeout,
            _ => RepoError::from_persistence(message),
        },
    }
}
