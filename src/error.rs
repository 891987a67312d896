//! Global error handling module for the anime links API
//!
//! This module provides a unified error type that handles all application errors
//! and converts them to appropriate HTTP responses with consistent JSON structure.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

use crate::models::ApiError;
use crate::parser::ExtractionError;
use crate::scraper::FetchError;

/// Application-wide error type that unifies all error sources
#[derive(Debug, Error)]
pub enum AppError {
    /// Upstream fetch failed on every candidate host
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Embedded data missing or unparsable
    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Validation errors (bad request)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Resource not found errors
    #[error("Not found: {0}")]
    NotFound(String),
}

impl AppError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        AppError::NotFound(msg.into())
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            AppError::Validation(_) => StatusCode::BAD_REQUEST,

            // 404 Not Found
            AppError::NotFound(_) => StatusCode::NOT_FOUND,

            // 500 Internal Server Error - the HTTP client could not be built
            AppError::Fetch(FetchError::Client(_)) => StatusCode::INTERNAL_SERVER_ERROR,

            // 502 Bad Gateway - the upstream site failed or served unusable markup
            AppError::Fetch(_) => StatusCode::BAD_GATEWAY,
            AppError::Extraction(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation(msg) => msg.clone(),
            AppError::NotFound(msg) => msg.clone(),

            AppError::Fetch(fetch_err) => match fetch_err {
                FetchError::AllHostsFailed { last, .. } => {
                    format!("Could not load the page from any mirror. Last error: {}", last)
                }
                FetchError::NoHosts => "No upstream hosts are configured".to_string(),
                FetchError::Client(msg) => format!("HTTP client error: {}", msg),
            },

            AppError::Extraction(extract_err) => match extract_err {
                ExtractionError::BlockMissing(name) => {
                    format!("The page does not contain the expected '{}' data", name)
                }
                ExtractionError::Unparsable { name, reason } => {
                    format!("The page's '{}' data could not be read: {}", name, reason)
                }
                ExtractionError::NoLinks(_) => "No video links were found on the page".to_string(),
            },
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        self.status_code()
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let error_response = ApiError::new(self.user_message());

        HttpResponse::build(status).json(error_response)
    }
}

/// Result type alias for operations that can fail with AppError
pub type AppResult<T> = Result<T, AppError>;
