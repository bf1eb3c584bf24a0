use axum::{
    body::Body,
    extract::State,
    http::{HeaderName, HeaderValue, Request, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use clientbook_api::ApiError;
use uuid::Uuid;

use crate::auth::{AuthState, TOKEN_COOKIE};

// =============================================================================
// Authentication Middleware
// =============================================================================

/// Rejects write requests that carry no valid token.
///
/// The token is taken from `Authorization: Bearer <token>` or, failing that,
/// from the `token` cookie. Both "no token" and "invalid token" answer 401.
pub async fn require_auth(
    State(state): State<AuthState>,
    jar: CookieJar,
    req: Request<Body>,
    next: Next,
) -> Response {
    let Some(verifier) = state.verifier() else {
        return next.run(req).await;
    };

    let bearer = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string);
    let token = bearer.or_else(|| jar.get(TOKEN_COOKIE).map(|c| c.value().to_string()));

    let Some(token) = token else {
        tracing::debug!(path = %req.uri().path(), "No token");
        return ApiError::unauthorized("No token").into_response();
    };

    match verifier.verify(&token) {
        Ok(data) => {
            tracing::debug!(sub = ?data.claims.sub, "Token validated successfully");
            next.run(req).await
        }
        Err(e) => {
            tracing::debug!(error = %e, "Token validation failed");
            ApiError::unauthorized("Invalid token").into_response()
        }
    }
}

// =============================================================================
// Other Middleware
// =============================================================================

pub const REQUEST_ID_HEADER: &str = "x-request-id";

// Middleware that ensures each request has an X-Request-Id and mirrors it on the response
pub async fn request_id(mut req: Request<Body>, next: Next) -> Response {
    let header_name = HeaderName::from_static(REQUEST_ID_HEADER);

    // If the incoming request already has a request-id, preserve it; otherwise generate one
    let req_id_value = match req.headers().get(&header_name) {
        Some(v) => v.clone(),
        None => HeaderValue::from_str(&Uuid::new_v4().to_string())
            .unwrap_or_else(|_| HeaderValue::from_static("unknown")),
    };

    // Inner layers (the trace span included) read the id from the request headers
    req.headers_mut()
        .insert(header_name.clone(), req_id_value.clone());

    let mut res = next.run(req).await;

    res.headers_mut().insert(header_name, req_id_value);

    res
}

/// The request id set by [`request_id`], or `""` outside that layer.
pub fn request_id_of<B>(req: &Request<B>) -> &str {
    req.headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}
