use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use std::fmt;

use crate::images::NormalizeError;
use crate::slides::ReconcileError;
use crate::storage::StoreError;

#[derive(Debug)]
pub enum AppError {
    Db(sqlx::Error),
    Store(StoreError),
    Image(NormalizeError),
    Reconcile(ReconcileError),
    Hash(String),
    Session(String),
    Blocking(String),
    Validation(Vec<String>),
    BadRequest(String),
    Unauthorized,
    PermissionDenied(String),
    NotFound,
    Conflict(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Db(e) => write!(f, "Database error: {e}"),
            AppError::Store(e) => write!(f, "Storage error: {e}"),
            AppError::Image(e) => write!(f, "Image error: {e}"),
            AppError::Reconcile(e) => write!(f, "Save failed while {}: {e}", e.stage()),
            AppError::Hash(e) => write!(f, "Hash error: {e}"),
            AppError::Session(e) => write!(f, "Session error: {e}"),
            AppError::Blocking(e) => write!(f, "Worker error: {e}"),
            AppError::Validation(errors) => write!(f, "Validation failed: {}", errors.join("; ")),
            AppError::BadRequest(e) => write!(f, "Bad request: {e}"),
            AppError::Unauthorized => write!(f, "Authentication required"),
            AppError::PermissionDenied(what) => write!(f, "Permission denied: {what}"),
            AppError::NotFound => write!(f, "Not found"),
            AppError::Conflict(e) => write!(f, "Conflict: {e}"),
        }
    }
}

impl std::error::Error for AppError {}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_)
            | AppError::BadRequest(_)
            | AppError::Reconcile(ReconcileError::DuplicateSlide { .. } | ReconcileError::UnknownSlide { .. }) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Image(NormalizeError::InvalidInput(_)) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::Image(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Db(_)
            | AppError::Store(_)
            | AppError::Reconcile(_)
            | AppError::Hash(_)
            | AppError::Session(_)
            | AppError::Blocking(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let body = match self {
            AppError::Validation(errors) => json!({ "error": "Validation failed", "details": errors }),
            // Save failures are surfaced to the operator as is
            AppError::Reconcile(e) => {
                log::error!("{self}");
                json!({ "error": e.to_string(), "details": { "stage": e.stage().to_string() } })
            }
            AppError::Store(e) => {
                log::error!("{self}");
                json!({ "error": e.to_string() })
            }
            AppError::Db(_) | AppError::Hash(_) | AppError::Session(_) | AppError::Blocking(_) => {
                log::error!("{self}");
                json!({ "error": "Internal Server Error" })
            }
            _ => json!({ "error": self.to_string() }),
        };
        HttpResponse::build(status).json(body)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Db(e)
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        AppError::Store(e)
    }
}

impl From<NormalizeError> for AppError {
    fn from(e: NormalizeError) -> Self {
        AppError::Image(e)
    }
}

impl From<ReconcileError> for AppError {
    fn from(e: ReconcileError) -> Self {
        AppError::Reconcile(e)
    }
}

impl From<actix_web::error::BlockingError> for AppError {
    fn from(e: actix_web::error::BlockingError) -> Self {
        AppError::Blocking(e.to_string())
    }
}
