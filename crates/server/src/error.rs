use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use embedwrangler_common::WranglerError;
use std::fmt;
use tracing::{error, warn};

use crate::types::ErrorResponse;

/// HTTP-facing error with a `{"detail": ...}` body
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, detail)
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, detail)
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.status, self.detail)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        self.status
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status).json(ErrorResponse {
            detail: self.detail.clone(),
        })
    }
}

impl From<WranglerError> for ApiError {
    fn from(err: WranglerError) -> Self {
        let status = StatusCode::from_u16(err.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            error!("Request failed: {}", err);
            return Self::new(status, "Internal server error");
        }

        let detail = match err {
            WranglerError::InvalidInput(msg) => msg,
            other => other.to_string(),
        };
        Self::new(status, detail)
    }
}

/// Map store errors, replacing vocabulary misses with an endpoint-specific 404
pub fn lookup_failed(detail: &'static str) -> impl Fn(WranglerError) -> ApiError {
    move |err| match err {
        WranglerError::VocabularyNotFound(token) => {
            warn!("Vocabulary miss: {:?}", token);
            ApiError::not_found(detail)
        }
        other => ApiError::from(other),
    }
}
