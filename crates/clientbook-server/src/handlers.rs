use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderName, HeaderValue, StatusCode},
};
use clientbook_api::{ApiError, ApiResponse, X_CACHE};
use clientbook_storage::{CustomerPatch, NewCustomer, PageParams};
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;

use crate::server::AppState;

pub const HEALTHCHECK_MESSAGE: &str = "API is up and running.";
pub const CREATED_MESSAGE: &str = "Customer added successfully.";
pub const UPDATED_MESSAGE: &str = "Customer's information updated successfully.";
pub const DELETED_MESSAGE: &str = "Customer deleted successfully.";

/// Raw pagination values; unusable ones fall back to defaults.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub limit: Option<String>,
    pub offset: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct EmailQuery {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DeleteRequest {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub cache: ComponentHealth,
    pub storage: ComponentHealth,
}

#[derive(Debug, Serialize)]
pub struct ComponentHealth {
    pub backend: &'static str,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::bad_request(e.to_string()))
}

pub async fn healthcheck() -> ApiResponse {
    ApiResponse::text(StatusCode::OK, HEALTHCHECK_MESSAGE)
}

pub async fn healthz(State(state): State<AppState>) -> Result<ApiResponse, ApiError> {
    let storage = state.service.storage();
    let cache = state.service.cache();
    let (storage_result, cache_result) = tokio::join!(storage.ping(), cache.ping());

    let storage = ComponentHealth {
        backend: storage.backend_name(),
        ok: storage_result.is_ok(),
        error: storage_result.err().map(|e| e.to_string()),
    };
    let cache = ComponentHealth {
        backend: cache.backend_name(),
        ok: cache_result.is_ok(),
        error: cache_result.err().map(|e| e.to_string()),
    };
    let healthy = storage.ok && cache.ok;
    let body = HealthResponse {
        status: if healthy { "ok" } else { "degraded" },
        cache,
        storage,
    };
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    Ok(ApiResponse::json(&body)?.with_status(status))
}

pub async fn list_customers(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<ApiResponse, ApiError> {
    let page = PageParams::from_query(query.limit.as_deref(), query.offset.as_deref());
    let outcome = state.service.list(page).await?;
    Ok(ApiResponse::json_bytes(outcome.payload).with_header(
        HeaderName::from_static(X_CACHE),
        HeaderValue::from_static(outcome.source.header_value()),
    ))
}

pub async fn get_customer(
    State(state): State<AppState>,
    Query(query): Query<EmailQuery>,
) -> Result<ApiResponse, ApiError> {
    let payload = state.service.get(&query.email).await?;
    Ok(ApiResponse::json_bytes(payload))
}

pub async fn add_customer(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<ApiResponse, ApiError> {
    let new: NewCustomer = parse_body(&body)?;
    state.service.create(new).await?;
    Ok(ApiResponse::text(StatusCode::ACCEPTED, CREATED_MESSAGE))
}

pub async fn update_customer(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<ApiResponse, ApiError> {
    let patch: CustomerPatch = parse_body(&body)?;
    state.service.update(patch).await?;
    Ok(ApiResponse::text(StatusCode::OK, UPDATED_MESSAGE))
}

pub async fn delete_customer(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<ApiResponse, ApiError> {
    let request: DeleteRequest = parse_body(&body)?;
    state.service.delete(&request.email).await?;
    Ok(ApiResponse::text(StatusCode::OK, DELETED_MESSAGE))
}
