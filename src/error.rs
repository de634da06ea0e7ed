//! Error types for Bookshelf server

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::models::book::FieldError;

pub const DUPLICATE_ISBN_DETAIL: &str = "A book with this ISBN already exists in the database";

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid book ID format: {0}")]
    InvalidId(String),

    #[error("Validation error: {} field(s) rejected", .0.len())]
    Validation(Vec<FieldError>),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error: None,
            errors: None,
        }
    }

    fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidId(_)
            | AppError::Validation(_)
            | AppError::Conflict(_)
            | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            AppError::InvalidId(_) => ErrorResponse::new("Invalid book ID format"),
            AppError::Validation(errors) => ErrorResponse {
                message: "Validation error".to_string(),
                error: None,
                errors: Some(errors),
            },
            AppError::NotFound(msg) => ErrorResponse::new(msg),
            AppError::Conflict(msg) => {
                ErrorResponse::new("ISBN already exists").with_error(msg)
            }
            AppError::BadRequest(msg) => {
                ErrorResponse::new("Invalid request body").with_error(msg)
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                ErrorResponse::new("Internal server error")
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                ErrorResponse::new("Internal server error")
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
