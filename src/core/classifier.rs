//! Maps detection counters onto a severity tier.
//!
//! The tier presentation (color and emoji) lives in a static table so the
//! ladder below only has to decide *which* tier applies. Thresholds are checked
//! from the most severe tier down and the first match wins.

use crate::core::models::{Classification, DetectionCounters, SeverityTier};

/// Presentation details attached to a tier.
pub struct TierDetail {
    pub tier: SeverityTier,
    pub color: &'static str,
    pub emoji: &'static str,
}

static TIERS: &[TierDetail] = &[
    TierDetail { tier: SeverityTier::Critical, color: "#8b0000", emoji: "💀" },
    TierDetail { tier: SeverityTier::Dangerous, color: "#ef4444", emoji: "🚨" },
    TierDetail { tier: SeverityTier::Suspicious, color: "#f59e0b", emoji: "🟠" },
    TierDetail { tier: SeverityTier::LowRisk, color: "#fbbf24", emoji: "⚠️" },
    TierDetail { tier: SeverityTier::Safe, color: "#10b981", emoji: "✅" },
];

/// Looks up the presentation details for a tier.
pub fn tier_detail(tier: SeverityTier) -> &'static TierDetail {
    TIERS
        .iter()
        .find(|detail| detail.tier == tier)
        .unwrap_or(&TIERS[TIERS.len() - 1])
}

/// Picks the tier for a set of counters.
pub fn severity_for(counters: &DetectionCounters) -> SeverityTier {
    let DetectionCounters { malicious, suspicious, .. } = *counters;

    if malicious >= 40 {
        SeverityTier::Critical
    } else if malicious >= 20 {
        SeverityTier::Dangerous
    } else if malicious >= 5 || suspicious >= 10 {
        SeverityTier::Suspicious
    } else if malicious >= 1 || suspicious >= 1 {
        SeverityTier::LowRisk
    } else {
        SeverityTier::Safe
    }
}

fn message_for(tier: SeverityTier, counters: &DetectionCounters) -> String {
    match tier {
        SeverityTier::Critical => format!(
            "CRITICAL THREAT: {} security vendors flagged this as malicious! This URL is extremely dangerous - DO NOT VISIT!",
            counters.malicious
        ),
        SeverityTier::Dangerous => format!(
            "High Risk: {} security vendors flagged this as malicious! Do not visit this URL.",
            counters.malicious
        ),
        SeverityTier::Suspicious => format!(
            "Warning: {} malicious and {} suspicious detections. Proceed with extreme caution.",
            counters.malicious, counters.suspicious
        ),
        SeverityTier::LowRisk => format!(
            "Low Risk: {} minor detection(s) found. This could be a false positive, but stay cautious.",
            counters.flagged()
        ),
        SeverityTier::Safe => "No threats detected. This URL appears to be safe.".to_string(),
    }
}

/// Classifies a set of detection counters.
///
/// # Arguments
/// * `counters` - Aggregate engine counts for the URL.
///
/// # Returns
/// The tier together with its color, emoji and a message that interpolates the
/// relevant counts. Never fails; all-zero counters classify as `SAFE`.
pub fn classify(counters: &DetectionCounters) -> Classification {
    let tier = severity_for(counters);
    let detail = tier_detail(tier);
    Classification {
        tier,
        color: detail.color,
        emoji: detail.emoji,
        message: message_for(tier, counters),
    }
}
