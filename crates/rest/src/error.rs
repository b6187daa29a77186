//! Error types for the HTTP API and their status-code mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use basketapp_storage::StorageError;
use serde_json::json;
use thiserror::Error;
use tracing::error;
use uuid::Uuid;

/// Errors surfaced by request handlers.
#[derive(Error, Debug)]
pub enum RestError {
    /// No basket exists under the requested id.
    #[error("basket {id} not found")]
    NotFound {
        /// The id that missed.
        id: Uuid,
    },

    /// The request was malformed.
    #[error("bad request: {message}")]
    BadRequest {
        /// What was wrong with it.
        message: String,
    },

    /// The storage layer failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Convenience alias for handler results.
pub type RestResult<T> = Result<T, RestError>;

impl RestError {
    fn status_code(&self) -> StatusCode {
        match self {
            RestError::NotFound { .. } => StatusCode::NOT_FOUND,
            RestError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            RestError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RestError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        }
        let body = json!({
            "error": status.canonical_reason().unwrap_or("error"),
            "message": self.to_string(),
        });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let not_found = RestError::NotFound { id: Uuid::new_v4() };
        assert_eq!(not_found.status_code(), StatusCode::NOT_FOUND);

        let bad = RestError::BadRequest {
            message: "nope".into(),
        };
        assert_eq!(bad.status_code(), StatusCode::BAD_REQUEST);

        let storage = RestError::Storage(StorageError::NotOpened);
        assert_eq!(storage.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_not_found_message_names_the_id() {
        let id = Uuid::new_v4();
        let err = RestError::NotFound { id };
        assert!(err.to_string().contains(&id.to_string()));
    }
}
