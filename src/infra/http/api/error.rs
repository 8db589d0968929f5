use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::catalog::CatalogError;
use crate::application::error::ErrorReport;
use crate::application::repos::RepoError;
use crate::domain::error::DomainError;
use crate::domain::types::EntityKind;

const SOURCE: &str = "infra::http::api";

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub detail: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
    report: ErrorReport,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        let report = ErrorReport::from_message(SOURCE, status, detail.clone());
        Self {
            status,
            detail,
            report,
        }
    }

    pub fn not_found(kind: EntityKind) -> Self {
        Self::new(StatusCode::NOT_FOUND, kind.not_found_detail())
    }

    pub fn unprocessable(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, detail)
    }

    /// Hide `error` from the client but keep its chain for the response log.
    pub fn internal(status: StatusCode, detail: &'static str, error: &dyn std::error::Error) -> Self {
        Self {
            status,
            detail: detail.to_string(),
            report: ErrorReport::from_error(SOURCE, status, error),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            detail: self.detail,
        };
        let mut response = (self.status, Json(body)).into_response();
        self.report.attach(&mut response);
        response
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound { kind, .. } => ApiError::not_found(kind),
            DomainError::Validation { field, message } => {
                ApiError::unprocessable(format!("{field} {message}"))
            }
        }
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Domain(domain) => domain.into(),
            CatalogError::Repo(repo) => repo_to_api(repo),
        }
    }
}

pub(crate) fn repo_to_api(err: RepoError) -> ApiError {
    match &err {
        RepoError::Duplicate { .. }
        | RepoError::Integrity { .. }
        | RepoError::MissingParent { .. } => {
            ApiError::internal(StatusCode::CONFLICT, "conflicting record", &err)
        }
        RepoError::InvalidInput { .. } => {
            ApiError::internal(StatusCode::BAD_REQUEST, "invalid input", &err)
        }
        RepoError::Timeout => {
            ApiError::internal(StatusCode::SERVICE_UNAVAILABLE, "database timeout", &err)
        }
        RepoError::NotFound | RepoError::Persistence(_) => ApiError::internal(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal server error",
            &err,
        ),
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    #[test]
    fn not_found_uses_kind_detail() {
        let err = ApiError::from(CatalogError::Domain(DomainError::not_found(
            EntityKind::Submenu,
            Uuid::new_v4(),
        )));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.detail, "submenu not found");
    }

    #[test]
    fn validation_is_unprocessable() {
        let err = ApiError::from(DomainError::validation("title", "must not be empty"));
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.detail, "title must not be empty");
    }

    #[test]
    fn persistence_failures_are_opaque() {
        let err = ApiError::from(CatalogError::Repo(RepoError::from_persistence(
            "connection reset",
        )));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.detail, "internal server error");
        assert_eq!(
            err.report.messages,
            vec!["persistence error: connection reset".to_string()]
        );
    }
}
