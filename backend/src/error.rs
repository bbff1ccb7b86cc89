//! Error type shared by every handler and helper in the backend.
//!
//! Each variant carries a stable machine-readable code and an HTTP status.
//! `ApiError` implements `actix_web::ResponseError`, so handlers can turn any
//! failure into the JSON envelope
//! `{"success": false, "error": {code, message, details, request_id, timestamp}}`.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::{json, Value};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Request failed basic validation.
    #[error("{0}")]
    Validation(String),

    /// Request was well formed but semantically unusable.
    #[error("{0}")]
    Unprocessable(String),

    #[error("{0}")]
    NotFound(String),

    /// A mapping references a column the roster does not have.
    #[error("column '{column}' not found in CSV")]
    MissingColumn {
        column: String,
        available: Vec<String>,
    },

    #[error("upload exceeds the limit of {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("unsupported file type '{filename}', expected one of: {}", .allowed.join(", "))]
    UnsupportedFileType {
        filename: String,
        allowed: &'static [&'static str],
    },

    /// An uploaded file could not be decoded or parsed.
    #[error("{0}")]
    FileProcessing(String),

    #[error("render failed: {0}")]
    Render(String),

    /// A third-party HTTP service answered with an error.
    #[error("{service} request failed: {message}")]
    ExternalService {
        service: &'static str,
        status: Option<u16>,
        message: String,
    },

    #[error("{0} is not configured")]
    NotConfigured(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        ApiError::Config(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal(message.into())
    }

    /// Stable code sent to clients.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::Unprocessable(_) => "UNPROCESSABLE",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::MissingColumn { .. } => "MISSING_COLUMN",
            ApiError::PayloadTooLarge { .. } => "PAYLOAD_TOO_LARGE",
            ApiError::UnsupportedFileType { .. } => "UNSUPPORTED_FILE_TYPE",
            ApiError::FileProcessing(_) => "FILE_PROCESSING_ERROR",
            ApiError::Render(_) => "RENDER_ERROR",
            ApiError::ExternalService { .. } => "EXTERNAL_SERVICE_ERROR",
            ApiError::NotConfigured(_) => "NOT_CONFIGURED",
            ApiError::Database(_) => "DATABASE_ERROR",
            ApiError::Io(_) => "IO_ERROR",
            ApiError::Config(_) | ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn details(&self) -> Value {
        match self {
            ApiError::MissingColumn { column, available } => json!({
                "column": column,
                "available_columns": available,
            }),
            ApiError::PayloadTooLarge { limit } => json!({ "max_bytes": limit }),
            ApiError::UnsupportedFileType { allowed, .. } => json!({ "allowed": allowed }),
            ApiError::ExternalService {
                service,
                status,
                message,
            } => json!({
                "service": service,
                "upstream_status": status,
                "upstream_error": message,
            }),
            _ => Value::Null,
        }
    }

    /// Builds the JSON error envelope.
    pub fn to_body(&self) -> Value {
        json!({
            "success": false,
            "error": {
                "code": self.code(),
                "message": self.to_string(),
                "details": self.details(),
                "request_id": uuid::Uuid::new_v4().to_string(),
                "timestamp": chrono::Utc::now().to_rfc3339(),
            }
        })
    }
}

impl From<figment::Error> for ApiError {
    fn from(err: figment::Error) -> Self {
        ApiError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Internal(format!("JSON error: {}", err))
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::Internal(format!("background task failed: {}", err))
    }
}

impl From<actix_web::error::BlockingError> for ApiError {
    fn from(err: actix_web::error::BlockingError) -> Self {
        ApiError::Internal(format!("blocking task failed: {}", err))
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_)
            | ApiError::MissingColumn { .. }
            | ApiError::UnsupportedFileType { .. }
            | ApiError::FileProcessing(_) => StatusCode::BAD_REQUEST,
            ApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::ExternalService { .. } => StatusCode::BAD_GATEWAY,
            ApiError::NotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Render(_)
            | ApiError::Database(_)
            | ApiError::Io(_)
            | ApiError::Config(_)
            | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("{} ({}): {}", status, self.code(), self);
        } else {
            log::warn!("{} ({}): {}", status, self.code(), self);
        }
        HttpResponse::build(status).json(self.to_body())
    }
}
