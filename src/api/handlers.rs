// src/api/handlers.rs

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Deserialize;
use tracing::{debug, info};

use crate::app::AppState;
use crate::api::response::{ApiError, VerdictBody};
use crate::core::error::{ScanError, ScanResult};
use crate::core::models::ScanState;
use crate::core::scanner::{check_status, submit_or_lookup};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScanRequest {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckRequest {
    #[serde(default)]
    pub analysis_id: Option<String>,
    /// Used only when no analysis ID is available.
    #[serde(default)]
    pub url: Option<String>,
}

fn parse_body<T>(payload: Result<Json<T>, JsonRejection>) -> ScanResult<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ScanError::invalid_input(format!("Invalid request body: {}", rejection.body_text())))
}

/// Bounds one request, upstream calls included.
async fn bounded<F>(limit: Duration, operation: F) -> ScanResult<ScanState>
where
    F: Future<Output = ScanResult<ScanState>>,
{
    tokio::time::timeout(limit, operation)
        .await
        .map_err(|_| ScanError::upstream(format!("Request timed out after {}s", limit.as_secs())))?
}

/// `POST /api/scan` - look a URL up, submitting it if it is unknown.
pub async fn scan_url(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ScanRequest>, JsonRejection>,
) -> Result<Json<VerdictBody>, ApiError> {
    let service = state.service()?;
    let request = parse_body(payload)?;
    let url = request.url.unwrap_or_default();
    debug!(url = %url, "Scan request received.");

    let scan = bounded(state.settings.request_timeout, submit_or_lookup(service, &url)).await?;
    Ok(Json(VerdictBody::from(scan)))
}

/// `POST /api/check` - poll an analysis handle.
///
/// Without a handle, a URL can be supplied instead and the request falls back
/// to the lookup-by-URL path.
pub async fn check_analysis(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CheckRequest>, JsonRejection>,
) -> Result<Json<VerdictBody>, ApiError> {
    let service = state.service()?;
    let request = parse_body(payload)?;
    let handle = request.analysis_id.unwrap_or_default();
    let limit = state.settings.request_timeout;

    let scan = match request.url.filter(|_| handle.trim().is_empty()) {
        Some(url) if !url.trim().is_empty() => {
            info!(url = %url, "No analysis ID supplied; falling back to URL lookup.");
            bounded(limit, submit_or_lookup(service, &url)).await?
        }
        _ => bounded(limit, check_status(service, &handle)).await?,
    };
    Ok(Json(VerdictBody::from(scan)))
}
