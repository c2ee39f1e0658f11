// src/core/scanner/orchestrator.rs

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use tracing::{debug, info, warn};
use url::Url;

use crate::core::error::{ScanError, ScanResult};
use crate::core::models::{PendingPhase, PendingScan, ScanState};
use super::build_verdict;
use super::upstream::{LookupOutcome, ReputationService};

/// Derives the identifier the reputation service uses in place of a raw URL.
///
/// Unpadded URL-safe base64 of the URL string; the same URL always maps to the
/// same identifier.
pub fn url_identifier(url: &str) -> String {
    URL_SAFE_NO_PAD.encode(url.as_bytes())
}

/// True when the string starts with `scheme://`, the scheme being a letter
/// followed by letters, digits, `+`, `-` or `.`.
fn has_scheme(candidate: &str) -> bool {
    let Some((scheme, _)) = candidate.split_once("://") else {
        return false;
    };
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Trims the input, adds a scheme if missing and checks that it is a usable
/// web URL.
///
/// # Returns
/// The normalized URL string, or `ScanError::InvalidInput`.
pub fn normalize_url(raw: &str) -> ScanResult<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ScanError::invalid_input("URL is required"));
    }

    let candidate = if has_scheme(trimmed) {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let parsed = Url::parse(&candidate).map_err(|e| {
        debug!(url = trimmed, error = %e, "Rejected unparsable URL.");
        ScanError::invalid_input(format!("Invalid URL: {}", e))
    })?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ScanError::invalid_input(format!(
            "Unsupported URL scheme: {}",
            parsed.scheme()
        )));
    }
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(ScanError::invalid_input("URL must include a host"));
    }

    Ok(candidate)
}

/// Returns the verdict for a URL, submitting it for scanning if the reputation
/// service has never seen it.
///
/// The lookup always happens first; a submission is only made after the
/// service confirms it has no report for the URL.
///
/// # Arguments
/// * `service` - The reputation service to query.
/// * `url` - The URL as entered by the user.
///
/// # Returns
/// `ScanState::Complete` when a report already exists, `ScanState::Pending`
/// after a fresh submission. Fails with `InvalidInput` before any network call
/// if the URL is empty or malformed, and with `UpstreamUnavailable` for any
/// lookup status other than success or 404, or a failed submission.
pub async fn submit_or_lookup(service: &dyn ReputationService, url: &str) -> ScanResult<ScanState> {
    let url = normalize_url(url)?;
    let url_id = url_identifier(&url);
    info!(url = %url, url_id = %url_id, "Starting URL scan.");

    match service.lookup_url(&url_id).await? {
        LookupOutcome::Found(report) => {
            debug!(url = %url, "Existing report found.");
            Ok(ScanState::Complete(build_verdict(&url, &report)))
        }
        LookupOutcome::NotFound => {
            let handle = service.submit_url(&url).await?;
            if handle.is_none() {
                warn!(url = %url, "Submission returned no analysis handle; polling must fall back to URL lookup.");
            }
            info!(url = %url, handle = ?handle, "URL submitted, scan pending.");
            Ok(ScanState::Pending(PendingScan::new(
                PendingPhase::Submitted,
                handle.unwrap_or_default(),
                url,
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::core::models::{DetectionCounters, SeverityTier};
    use crate::core::scanner::testing::{Call, FakeService};
    use crate::core::scanner::upstream::RawReport;

    fn found(counters: DetectionCounters) -> LookupOutcome {
        let engines = json!({
            "EngineA": {"category": "malicious", "result": "phishing"},
            "EngineB": {"category": "harmless", "result": "clean"}
        });
        LookupOutcome::Found(RawReport {
            counters,
            engines: engines.as_object().cloned(),
            categories: vec!["phishing".into(), "phishing".into()],
        })
    }

    #[test]
    fn identifier_is_stable_and_unpadded() {
        let id = url_identifier("http://www.example.com/");
        assert_eq!(id, url_identifier("http://www.example.com/"));
        assert_eq!(id, "aHR0cDovL3d3dy5leGFtcGxlLmNvbS8");
        assert!(!id.contains('='));
        assert_ne!(id, url_identifier("http://www.example.com/other"));
    }

    #[test]
    fn url_normalization() {
        assert_eq!(normalize_url("  https://example.com/a?b=1 ").unwrap(), "https://example.com/a?b=1");
        assert_eq!(normalize_url("example.com").unwrap(), "https://example.com");
        assert!(matches!(normalize_url(""), Err(ScanError::InvalidInput(_))));
        assert!(matches!(normalize_url("   "), Err(ScanError::InvalidInput(_))));
        assert!(matches!(normalize_url("ftp://example.com"), Err(ScanError::InvalidInput(_))));
        assert!(matches!(normalize_url("https://exa mple.com"), Err(ScanError::InvalidInput(_))));
    }

    #[test]
    fn schemeless_url_with_nested_url_gets_https() {
        assert_eq!(
            normalize_url("example.com/login?next=https://bank.example").unwrap(),
            "https://example.com/login?next=https://bank.example"
        );
        assert_eq!(normalize_url("example.com:8080/a").unwrap(), "https://example.com:8080/a");
        assert_eq!(normalize_url("HTTP://Example.com").unwrap(), "HTTP://Example.com");
        assert!(!has_scheme("example.com/redirect?to=http://x"));
        assert!(has_scheme("svn+ssh://host"));
    }

    #[tokio::test]
    async fn empty_url_makes_no_network_call() {
        let service = FakeService::new();
        let err = submit_or_lookup(&service, "").await.unwrap_err();
        assert!(matches!(err, ScanError::InvalidInput(_)));
        assert!(service.calls().is_empty());
    }

    #[tokio::test]
    async fn existing_report_completes() {
        let mut service = FakeService::new();
        service.lookup = Ok(found(DetectionCounters::new(45, 2, 60, 3)));

        let state = submit_or_lookup(&service, "https://evil.example/login").await.unwrap();
        let ScanState::Complete(verdict) = state else {
            panic!("expected a completed verdict");
        };
        assert_eq!(verdict.severity_tier, SeverityTier::Critical);
        assert_eq!(verdict.color, "#8b0000");
        assert_eq!(verdict.counters.total(), 110);
        assert_eq!(verdict.url, "https://evil.example/login");
        assert_eq!(verdict.engine_verdicts.len(), 1);
        assert_eq!(verdict.categories, ["phishing"]);
        assert_eq!(
            service.calls(),
            [Call::Lookup(url_identifier("https://evil.example/login"))]
        );
    }

    #[tokio::test]
    async fn repeated_lookups_agree() {
        let mut service = FakeService::new();
        service.lookup = Ok(found(DetectionCounters::new(7, 0, 50, 10)));

        let mut tiers = Vec::new();
        for _ in 0..3 {
            match submit_or_lookup(&service, "https://example.com").await.unwrap() {
                ScanState::Complete(verdict) => tiers.push(verdict.severity_tier),
                ScanState::Pending(_) => panic!("expected a completed verdict"),
            }
        }
        assert!(tiers.iter().all(|tier| *tier == SeverityTier::Suspicious));
    }

    #[tokio::test]
    async fn unknown_url_is_submitted_and_pending() {
        let mut service = FakeService::new();
        service.submit = Ok(Some("u-abc-123".into()));

        let state = submit_or_lookup(&service, "https://new.example/path").await.unwrap();
        let ScanState::Pending(pending) = state else {
            panic!("expected a pending scan");
        };
        assert_eq!(pending.phase, PendingPhase::Submitted);
        assert_eq!(pending.analysis_handle, "u-abc-123");
        assert_eq!(pending.submitted_url, "https://new.example/path");
        assert_eq!(pending.counters, DetectionCounters::default());
        assert_eq!(
            service.calls(),
            [
                Call::Lookup(url_identifier("https://new.example/path")),
                Call::Submit("https://new.example/path".into()),
            ]
        );
    }

    #[tokio::test]
    async fn missing_handle_is_empty() {
        let service = FakeService::new();
        let state = submit_or_lookup(&service, "https://new.example").await.unwrap();
        match state {
            ScanState::Pending(pending) => assert!(pending.analysis_handle.is_empty()),
            ScanState::Complete(_) => panic!("expected a pending scan"),
        }
    }

    #[tokio::test]
    async fn failed_submission_is_upstream_error() {
        let mut service = FakeService::new();
        service.submit = Err(ScanError::upstream_status(400, "bad request"));

        let err = submit_or_lookup(&service, "https://new.example").await.unwrap_err();
        assert_eq!(err.status(), Some(400));
    }

    #[tokio::test]
    async fn lookup_failure_skips_submission() {
        let mut service = FakeService::new();
        service.lookup = Err(ScanError::upstream_status(500, "VirusTotal API error: 500"));

        let err = submit_or_lookup(&service, "https://example.com").await.unwrap_err();
        assert!(matches!(err, ScanError::UpstreamUnavailable { status: Some(500), .. }));
        assert_eq!(service.calls().len(), 1);
    }
}
