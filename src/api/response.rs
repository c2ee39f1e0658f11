// src/api/response.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use tracing::{error, warn};

use crate::core::error::ScanError;
use crate::core::models::{
    DetectionCounters, EngineVerdict, PendingScan, ScanState, ScanVerdict, PENDING_COLOR,
    PENDING_EMOJI,
};

/// Counters as rendered to the UI, with the derived total.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StatsBody {
    pub malicious: u64,
    pub suspicious: u64,
    pub harmless: u64,
    pub undetected: u64,
    pub total: u64,
}

impl From<&DetectionCounters> for StatsBody {
    fn from(counters: &DetectionCounters) -> Self {
        Self {
            malicious: counters.malicious,
            suspicious: counters.suspicious,
            harmless: counters.harmless,
            undetected: counters.undetected,
            total: counters.total(),
        }
    }
}

/// Success envelope shared by the scan and check endpoints.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerdictBody {
    pub success: bool,
    pub url: String,
    pub status: String,
    pub color: String,
    pub emoji: String,
    pub message: String,
    pub stats: StatsBody,
    pub engine_results: Vec<EngineVerdict>,
    pub categories: Vec<String>,
    pub threat_score: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis_id: Option<String>,
    pub timestamp: String,
}

fn rfc3339(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl From<ScanVerdict> for VerdictBody {
    fn from(verdict: ScanVerdict) -> Self {
        Self {
            success: true,
            status: verdict.severity_tier.to_string(),
            color: verdict.color.to_string(),
            emoji: verdict.emoji.to_string(),
            stats: StatsBody::from(&verdict.counters),
            timestamp: rfc3339(&verdict.timestamp),
            url: verdict.url,
            message: verdict.message,
            engine_results: verdict.engine_verdicts,
            categories: verdict.categories,
            threat_score: verdict.threat_score,
            analysis_id: None,
        }
    }
}

impl From<PendingScan> for VerdictBody {
    fn from(pending: PendingScan) -> Self {
        Self {
            success: true,
            status: pending.phase.status_label().to_string(),
            color: PENDING_COLOR.to_string(),
            emoji: PENDING_EMOJI.to_string(),
            message: pending.message().to_string(),
            stats: StatsBody::from(&pending.counters),
            engine_results: Vec::new(),
            categories: Vec::new(),
            threat_score: 0,
            timestamp: rfc3339(&pending.timestamp),
            analysis_id: Some(pending.analysis_handle).filter(|id| !id.is_empty()),
            url: pending.submitted_url,
        }
    }
}

impl From<ScanState> for VerdictBody {
    fn from(state: ScanState) -> Self {
        match state {
            ScanState::Complete(verdict) => verdict.into(),
            ScanState::Pending(pending) => pending.into(),
        }
    }
}

/// Failure envelope: `{success: false, message}`.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub message: String,
}

/// A `ScanError` on its way out of an HTTP handler.
#[derive(Debug)]
pub struct ApiError(pub ScanError);

impl From<ScanError> for ApiError {
    fn from(e: ScanError) -> Self {
        ApiError(e)
    }
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self.0 {
            ScanError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ScanError::UpstreamUnavailable { .. } | ScanError::Configuration(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// What the caller gets to read. Configuration details stay in the logs.
    pub fn public_message(&self) -> String {
        match &self.0 {
            ScanError::InvalidInput(reason) => reason.clone(),
            ScanError::UpstreamUnavailable { .. } => self.0.to_string(),
            ScanError::Configuration(_) => "Service configuration error".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match &self.0 {
            ScanError::InvalidInput(reason) => warn!(reason = %reason, "Rejected request."),
            other => error!(error = %other, upstream_status = ?other.status(), "Request failed."),
        }
        let body = ErrorBody { success: false, message: self.public_message() };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::PendingPhase;

    #[test]
    fn error_status_mapping() {
        assert_eq!(ApiError(ScanError::invalid_input("x")).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError(ScanError::upstream_status(502, "x")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError(ScanError::Configuration("VIRUSTOTAL_API_KEY is not set".into())).public_message(),
            "Service configuration error"
        );
    }

    #[test]
    fn pending_body_omits_empty_handle() {
        let body = VerdictBody::from(PendingScan::new(PendingPhase::Submitted, "", "https://a.example"));
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["status"], "Pending");
        assert_eq!(json["url"], "https://a.example");
        assert_eq!(json["stats"]["total"], 0);
        assert!(json.get("analysisId").is_none());
    }
}
