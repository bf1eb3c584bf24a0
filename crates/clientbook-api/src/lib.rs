use axum::http::{HeaderName, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

/// Content type of every plain-text body the server emits.
pub const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// Content type of JSON payloads.
pub const APPLICATION_JSON: &str = "application/json";

/// Response header reporting whether a collection page came from the cache.
pub const X_CACHE: &str = "x-cache";

// -------------------------
// Error Types
// -------------------------

/// Errors surfaced to HTTP clients.
///
/// Every variant renders as a short plain-text body with the matching status.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        ApiResponse::text(self.status_code(), self.to_string()).into_response()
    }
}

// -------------------------
// API Response Wrapper
// -------------------------

/// A fully rendered response body plus status and extra headers.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub content_type: HeaderValue,
    pub body: Vec<u8>,
    pub headers: Vec<(HeaderName, HeaderValue)>,
}

impl ApiResponse {
    /// Plain-text response with the given status.
    pub fn text(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            content_type: HeaderValue::from_static(TEXT_PLAIN),
            body: message.into().into_bytes(),
            headers: Vec::new(),
        }
    }

    /// `200 OK` with an already serialized JSON body.
    pub fn json_bytes(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: StatusCode::OK,
            content_type: HeaderValue::from_static(APPLICATION_JSON),
            body: body.into(),
            headers: Vec::new(),
        }
    }

    /// `200 OK` with `value` serialized as JSON.
    pub fn json<T: Serialize>(value: &T) -> Result<Self, ApiError> {
        serde_json::to_vec(value)
            .map(Self::json_bytes)
            .map_err(|e| ApiError::internal(format!("Serialization failure: {e}")))
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.push((name, value));
        self
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        let mut response = (
            self.status,
            [(header::CONTENT_TYPE, self.content_type)],
            self.body,
        )
            .into_response();
        let headers = response.headers_mut();
        for (n, v) in self.headers.into_iter() {
            headers.insert(n, v);
        }
        response
    }
}
