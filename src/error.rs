//!
//! # Custom Error Handling
//!
//! This module defines `AppError`, the error type every handler and service
//! returns. It implements `actix_web::error::ResponseError`, so a handler can
//! bubble any failure up with `?` and the client receives a JSON body with
//! the matching status code.
//!
//! Internal and database failures are logged here and answered with a
//! generic message; their details never reach the client.
//!
//! The `*_error_handler` functions plug into actix's extractor configs so
//! malformed JSON bodies, query strings and paths produce the same JSON
//! error shape as everything else.

use actix_web::{
    error::{JsonPayloadError, PathError, QueryPayloadError, ResponseError},
    http::StatusCode,
    HttpRequest, HttpResponse,
};
use serde_json::json;
use std::fmt;
use validator::ValidationErrors;

use crate::db::StoreError;

const GENERIC_INTERNAL_MESSAGE: &str = "Internal server error";

/// Represents all possible errors that can occur within the application.
#[derive(Debug)]
pub enum AppError {
    /// Missing or invalid credentials (HTTP 401).
    Unauthorized(String),
    /// Valid credentials without the required privilege (HTTP 403).
    Forbidden(String),
    /// The request cannot be served as sent, e.g. a duplicate email (HTTP 400).
    BadRequest(String),
    /// The request body is not valid JSON for the endpoint (HTTP 400).
    InvalidPayload(String),
    /// Field-level validation failures (HTTP 400).
    ValidationError(ValidationErrors),
    /// The addressed resource does not exist (HTTP 404).
    NotFound(String),
    /// An unexpected server-side failure (HTTP 500).
    InternalServerError(String),
    /// A failure reported by the persistence gateway (HTTP 500).
    DatabaseError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppError::InvalidPayload(msg) => write!(f, "Invalid JSON payload: {}", msg),
            AppError::ValidationError(errors) => write!(f, "Validation Error: {}", errors),
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::InternalServerError(msg) => write!(f, "Internal Server Error: {}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database Error: {}", msg),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::BadRequest(_) | AppError::InvalidPayload(_) | AppError::ValidationError(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InternalServerError(_) | AppError::DatabaseError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::BadRequest(msg)
            | AppError::NotFound(msg) => json!({ "error": msg }),
            AppError::InvalidPayload(msg) => json!({
                "error": "Invalid JSON payload",
                "message": msg
            }),
            AppError::ValidationError(errors) => json!({
                "error": "Validation failed",
                "details": errors
            }),
            AppError::InternalServerError(_) | AppError::DatabaseError(_) => {
                log::error!("{}", self);
                json!({ "error": GENERIC_INTERNAL_MESSAGE })
            }
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

impl From<StoreError> for AppError {
    fn from(error: StoreError) -> AppError {
        match error {
            StoreError::DuplicateKey(msg) => AppError::BadRequest(format!("Duplicate resource: {}", msg)),
            other => AppError::DatabaseError(other.to_string()),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(error: ValidationErrors) -> AppError {
        AppError::ValidationError(error)
    }
}

/// JWT processing failures are authentication failures.
impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(error: jsonwebtoken::errors::Error) -> AppError {
        AppError::Unauthorized(format!("Invalid token: {}", error))
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(error: bcrypt::BcryptError) -> AppError {
        AppError::InternalServerError(error.to_string())
    }
}

impl From<bson::ser::Error> for AppError {
    fn from(error: bson::ser::Error) -> AppError {
        AppError::InternalServerError(error.to_string())
    }
}

impl From<bson::de::Error> for AppError {
    fn from(error: bson::de::Error) -> AppError {
        AppError::InternalServerError(error.to_string())
    }
}

/// Error handler for `web::JsonConfig`: bad syntax, wrong shape, unknown fields.
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::InvalidPayload(err.to_string()).into()
}

/// Error handler for `web::QueryConfig`.
pub fn query_error_handler(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::BadRequest(format!("Invalid query string: {}", err)).into()
}

/// Error handler for `web::PathConfig`.
pub fn path_error_handler(err: PathError, _req: &HttpRequest) -> actix_web::Error {
    AppError::BadRequest(format!("Invalid path: {}", err)).into()
}
