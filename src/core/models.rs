// src/core/models.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use strum::{Display, EnumIter};

// --- Detection Counters ---

/// Aggregate engine counts for a single URL, as reported by the reputation service.
///
/// Any counter missing from the upstream payload, or not a non-negative
/// whole number, deserializes to `0`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionCounters {
    #[serde(default, deserialize_with = "lenient_count")]
    pub malicious: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub suspicious: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub harmless: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub undetected: u64,
}

/// Accepts `null`, floats and strings where a count is expected. Whole
/// non-negative floats keep their value; everything else counts as `0`.
fn lenient_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let count = match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0 && *f <= u64::MAX as f64)
                .map(|f| f as u64)
        }),
        _ => None,
    };
    Ok(count.unwrap_or(0))
}

impl DetectionCounters {
    pub fn new(malicious: u64, suspicious: u64, harmless: u64, undetected: u64) -> Self {
        Self { malicious, suspicious, harmless, undetected }
    }

    /// Sum of all four counters.
    pub fn total(&self) -> u64 {
        self.malicious
            .saturating_add(self.suspicious)
            .saturating_add(self.harmless)
            .saturating_add(self.undetected)
    }

    /// Number of engines that flagged the URL at all.
    pub fn flagged(&self) -> u64 {
        self.malicious.saturating_add(self.suspicious)
    }
}

// --- Engine Verdicts ---

/// The category an individual engine assigned to the URL.
///
/// Unknown or missing upstream categories (`timeout`, `type-unsupported`, ...)
/// all collapse into `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EngineCategory {
    Malicious,
    Suspicious,
    Harmless,
    Undetected,
    #[serde(other)]
    Other,
}

impl EngineCategory {
    pub fn is_threat(&self) -> bool {
        matches!(self, EngineCategory::Malicious | EngineCategory::Suspicious)
    }
}

/// One engine's categorized opinion on a URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineVerdict {
    #[serde(rename = "engine")]
    pub engine_name: String,
    #[serde(rename = "result")]
    pub result_label: String,
    pub category: EngineCategory,
}

// --- Severity ---

/// Discrete severity classification, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, EnumIter)]
pub enum SeverityTier {
    #[serde(rename = "SAFE")]
    #[strum(serialize = "SAFE")]
    Safe,
    #[serde(rename = "LOW RISK")]
    #[strum(serialize = "LOW RISK")]
    LowRisk,
    #[serde(rename = "SUSPICIOUS")]
    #[strum(serialize = "SUSPICIOUS")]
    Suspicious,
    #[serde(rename = "DANGEROUS")]
    #[strum(serialize = "DANGEROUS")]
    Dangerous,
    #[serde(rename = "CRITICAL")]
    #[strum(serialize = "CRITICAL")]
    Critical,
}

/// Display metadata and message produced by the classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub tier: SeverityTier,
    pub color: &'static str,
    pub emoji: &'static str,
    pub message: String,
}

// --- Scan Results ---

/// A finished verdict for one URL. Built once per request and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanVerdict {
    pub url: String,
    pub severity_tier: SeverityTier,
    pub color: &'static str,
    pub emoji: &'static str,
    pub message: String,
    pub counters: DetectionCounters,
    pub engine_verdicts: Vec<EngineVerdict>,
    pub categories: Vec<String>,
    pub threat_score: u8,
    pub timestamp: DateTime<Utc>,
}

/// Which side of the scan lifecycle produced a pending state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingPhase {
    /// The URL was unknown upstream and has just been submitted.
    Submitted,
    /// An analysis handle was polled and is still queued or running.
    Analyzing,
}

impl PendingPhase {
    pub fn status_label(&self) -> &'static str {
        match self {
            PendingPhase::Submitted => "Pending",
            PendingPhase::Analyzing => "PENDING",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            PendingPhase::Submitted => "Scan submitted. Please try again in a few moments.",
            PendingPhase::Analyzing => {
                "VirusTotal is still analyzing this URL. Please wait a bit longer."
            }
        }
    }
}

pub const PENDING_COLOR: &str = "#64748b";
pub const PENDING_EMOJI: &str = "⏳";

/// A scan that has no verdict yet. The caller decides whether to poll again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingScan {
    pub phase: PendingPhase,
    /// Upstream analysis handle; empty when the service did not return one.
    pub analysis_handle: String,
    /// The URL that was submitted; empty on the poll path.
    pub submitted_url: String,
    pub counters: DetectionCounters,
    pub timestamp: DateTime<Utc>,
}

impl PendingScan {
    pub fn new(phase: PendingPhase, analysis_handle: impl Into<String>, submitted_url: impl Into<String>) -> Self {
        Self {
            phase,
            analysis_handle: analysis_handle.into(),
            submitted_url: submitted_url.into(),
            counters: DetectionCounters::default(),
            timestamp: Utc::now(),
        }
    }

    pub fn message(&self) -> &'static str {
        self.phase.message()
    }
}

/// Outcome of either the orchestrator or the poller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanState {
    Complete(ScanVerdict),
    Pending(PendingScan),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_default_missing_fields_to_zero() {
        let counters: DetectionCounters = serde_json::from_str(r#"{"malicious": 3}"#).unwrap();
        assert_eq!(counters, DetectionCounters::new(3, 0, 0, 0));
        assert_eq!(counters.total(), 3);
    }

    #[test]
    fn odd_counter_values_count_as_zero() {
        let counters: DetectionCounters = serde_json::from_str(
            r#"{"malicious": null, "suspicious": 2.0, "harmless": "x", "undetected": 1.5}"#,
        )
        .unwrap();
        assert_eq!(counters, DetectionCounters::new(0, 2, 0, 0));

        let counters: DetectionCounters =
            serde_json::from_str(r#"{"malicious": -4, "suspicious": 7, "harmless": {}, "undetected": [1]}"#).unwrap();
        assert_eq!(counters, DetectionCounters::new(0, 7, 0, 0));
    }

    #[test]
    fn total_sums_all_four_counters() {
        let counters = DetectionCounters::new(45, 2, 60, 3);
        assert_eq!(counters.total(), 110);
        assert_eq!(counters.flagged(), 47);
    }

    #[test]
    fn unknown_engine_category_is_other() {
        let category: EngineCategory = serde_json::from_str(r#""type-unsupported""#).unwrap();
        assert_eq!(category, EngineCategory::Other);
        let category: EngineCategory = serde_json::from_str(r#""malicious""#).unwrap();
        assert!(category.is_threat());
    }

    #[test]
    fn tier_labels_match_wire_format() {
        assert_eq!(SeverityTier::LowRisk.to_string(), "LOW RISK");
        assert_eq!(serde_json::to_string(&SeverityTier::Critical).unwrap(), r#""CRITICAL""#);
        assert!(SeverityTier::Safe < SeverityTier::Critical);
    }
}
