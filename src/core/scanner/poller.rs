// src/core/scanner/poller.rs

use tracing::{info, warn};

use crate::core::error::{ScanError, ScanResult};
use crate::core::models::{PendingPhase, PendingScan, ScanState};
use super::build_verdict;
use super::upstream::{AnalysisStatus, RawReport, ReputationService};

/// Analysis handles are opaque but only ever use letters, digits, `-`, `_`
/// and `=`.
fn is_valid_handle(handle: &str) -> bool {
    handle
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '='))
}

/// Checks an in-flight analysis once.
///
/// There is no retry loop: each call is a single, idempotent query, and the
/// caller decides when to poll again.
///
/// # Arguments
/// * `service` - The reputation service to query.
/// * `handle` - The analysis handle returned by a previous submission.
///
/// # Returns
/// `ScanState::Pending` while the analysis is queued or running, otherwise
/// `ScanState::Complete` built exactly like a lookup hit. An unrecognised
/// status is treated as finished with an empty report so polling always
/// terminates.
pub async fn check_status(service: &dyn ReputationService, handle: &str) -> ScanResult<ScanState> {
    let handle = handle.trim();
    if handle.is_empty() {
        return Err(ScanError::invalid_input("Analysis ID is required"));
    }
    if !is_valid_handle(handle) {
        return Err(ScanError::invalid_input("Analysis ID is malformed"));
    }

    let analysis = service.fetch_analysis(handle).await?;
    match analysis.status {
        AnalysisStatus::Queued | AnalysisStatus::InProgress => {
            info!(handle, status = ?analysis.status, "Analysis still running.");
            Ok(ScanState::Pending(PendingScan::new(PendingPhase::Analyzing, handle, "")))
        }
        AnalysisStatus::Completed => {
            info!(handle, "Analysis completed.");
            Ok(ScanState::Complete(build_verdict("", &analysis.report)))
        }
        AnalysisStatus::Unknown(status) => {
            warn!(handle, status = %status, "Unrecognised analysis status; treating as completed.");
            Ok(ScanState::Complete(build_verdict("", &RawReport::default())))
        }
    }
}
