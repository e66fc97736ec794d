use std::sync::atomic::{AtomicBool, Ordering};

use axum::{
    extract::{rejection::JsonRejection, FromRequest},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use log::error;
use serde_json::json;

use crate::auth::AuthError;
use crate::logic::ValidationError;

static EXPOSE_DETAILS: AtomicBool = AtomicBool::new(false);

/// Include the cause chain of internal errors in response bodies.
/// Enabled when the service runs in the development environment.
pub fn expose_error_details(enabled: bool) {
    EXPOSE_DETAILS.store(enabled, Ordering::Relaxed);
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    PayloadTooLarge(String),
    #[error("Internal server error")]
    Internal(anyhow::Error),
}

impl ApiError {
    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        let db_error = err
            .chain()
            .find_map(|cause| cause.downcast_ref::<sqlx::Error>());

        let mapped = match db_error {
            Some(sqlx::Error::RowNotFound) => Some(ApiError::not_found("Record not found")),
            Some(sqlx::Error::Database(db)) => match db.code().as_deref() {
                Some("23505") => Some(ApiError::conflict("Record already exists")),
                Some("23503") => Some(ApiError::bad_request("Referenced record does not exist")),
                Some("23514") => Some(ApiError::bad_request("Value is not allowed for this field")),
                _ => None,
            },
            _ => None,
        };

        mapped.unwrap_or_else(|| ApiError::Internal(err))
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::Unauthorized(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge(rejection.body_text())
        } else {
            ApiError::BadRequest(rejection.body_text())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut body = json!({
            "status": "error",
            "message": self.to_string(),
        });

        if let ApiError::Internal(err) = &self {
            error!("Request failed: {:#}", err);
            if EXPOSE_DETAILS.load(Ordering::Relaxed) {
                body["details"] = json!(format!("{:#}", err));
            }
        }

        (status, Json(body)).into_response()
    }
}

/// JSON body extractor whose rejections use the API error format.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

pub type ApiResult<T> = Result<T, ApiError>;
