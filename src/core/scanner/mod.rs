// src/core/scanner/mod.rs

// Public interface of the `scanner` module: the upstream boundary, its
// VirusTotal implementation, and the two flows built on top of it.
pub mod orchestrator;
pub mod poller;
pub mod upstream;
pub mod virustotal;

use chrono::Utc;
use tracing::info;

use crate::core::classifier::classify;
use crate::core::models::ScanVerdict;
use crate::core::normalizer::normalize;
use crate::core::score::threat_score;
use self::upstream::RawReport;

pub use self::orchestrator::{submit_or_lookup, url_identifier};
pub use self::poller::check_status;
pub use self::upstream::ReputationService;

/// Turns a finished upstream report into a verdict.
///
/// This is the single completed path shared by the orchestrator and the
/// poller: normalize the engine data, classify the counters and estimate the
/// threat score.
///
/// # Arguments
/// * `url` - The scanned URL, or an empty string when it is not known.
/// * `report` - Counters, engine map and category tags from upstream.
pub fn build_verdict(url: &str, report: &RawReport) -> ScanVerdict {
    let normalized = normalize(report.engines.as_ref(), &report.categories);
    let classification = classify(&report.counters);
    let score = threat_score(&report.counters);

    info!(
        tier = %classification.tier,
        score,
        malicious = report.counters.malicious,
        suspicious = report.counters.suspicious,
        total = report.counters.total(),
        "Verdict computed."
    );

    ScanVerdict {
        url: url.to_string(),
        severity_tier: classification.tier,
        color: classification.color,
        emoji: classification.emoji,
        message: classification.message,
        counters: report.counters,
        engine_verdicts: normalized.engine_verdicts,
        categories: normalized.categories,
        threat_score: score,
        timestamp: Utc::now(),
    }
}
