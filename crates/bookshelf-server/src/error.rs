//! Error types for the record stores and the HTTP boundary

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use bookshelf_types::FieldError;
use serde_json::json;
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Record store failures
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0} already exists")]
    AlreadyExists(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{context}: {source}")]
    Internal {
        context: String,
        #[source]
        source: BoxError,
    },

    #[error("store has not been initialized")]
    Uninitialized,
}

impl StoreError {
    pub fn internal(context: impl Into<String>, source: impl Into<BoxError>) -> Self {
        StoreError::Internal {
            context: context.into(),
            source: source.into(),
        }
    }
}

impl From<FieldError> for StoreError {
    fn from(e: FieldError) -> Self {
        StoreError::InvalidArgument(e.to_string())
    }
}

/// `map_err` adapter naming the operation that failed
pub fn internal<E: Into<BoxError>>(context: &'static str) -> impl FnOnce(E) -> StoreError {
    move |e| StoreError::internal(context, e)
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Error returned by HTTP handlers
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ApiError::Store(StoreError::NotFound(_)) => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::Store(StoreError::AlreadyExists(_)) => (StatusCode::CONFLICT, "already_exists"),
            ApiError::Store(StoreError::InvalidArgument(_)) => {
                (StatusCode::BAD_REQUEST, "invalid_argument")
            }
            ApiError::Store(StoreError::Internal { .. } | StoreError::Uninitialized) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }

        let body = Json(json!({
            "error": self.to_string(),
            "code": code
        }));
        (status, body).into_response()
    }
}
