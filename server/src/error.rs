use std::collections::BTreeMap;

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use recipeshare_core::{Denied, SpreadsheetError, StorageError, SubmissionError};
use thiserror::Error;

use crate::api::ErrorResponse;

/// Error type for handlers. Renders as an [`ErrorResponse`] body.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("{0}")]
    Forbidden(#[from] Denied),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    BadRequest(String),

    #[error("{message}")]
    Validation {
        message: String,
        fields: BTreeMap<String, String>,
    },

    #[error("Failed to read multipart data: {0}")]
    Multipart(#[from] MultipartError),

    /// Logged in full; the client only sees a generic message.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn field(field: &str, message: &str) -> Self {
        ApiError::Validation {
            message: format!("Invalid field `{}`", field),
            fields: BTreeMap::from([(field.to_string(), message.to_string())]),
        }
    }
}

impl From<diesel::result::Error> for ApiError {
    fn from(e: diesel::result::Error) -> Self {
        ApiError::Internal(format!("Database error: {}", e))
    }
}

impl From<diesel::r2d2::PoolError> for ApiError {
    fn from(e: diesel::r2d2::PoolError) -> Self {
        ApiError::Internal(format!("Database connection failed: {}", e))
    }
}

impl From<SubmissionError> for ApiError {
    fn from(e: SubmissionError) -> Self {
        match e {
            SubmissionError::Parse(_) => ApiError::BadRequest(e.to_string()),
            SubmissionError::Invalid(fields) => ApiError::Validation {
                message: "Invalid recipe".to_string(),
                fields,
            },
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::Archive(_)
            | StorageError::UnsupportedImage(_)
            | StorageError::EntryTooLarge { .. } => {
                ApiError::BadRequest(e.to_string())
            }
            StorageError::Io(_) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<SpreadsheetError> for ApiError {
    fn from(e: SpreadsheetError) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, fields) = match &self {
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, None),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, None),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, None),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, None),
            ApiError::Validation { fields, .. } => (StatusCode::BAD_REQUEST, Some(fields.clone())),
            ApiError::Multipart(e) => (e.status(), None),
            ApiError::Internal(detail) => {
                tracing::error!(error = %detail, "Request failed");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse {
                        error: "Internal server error".to_string(),
                        fields: None,
                    }),
                )
                    .into_response();
            }
        };

        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
                fields,
            }),
        )
            .into_response()
    }
}
