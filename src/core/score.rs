// src/core/score.rs

use crate::core::models::DetectionCounters;

/// Estimates a continuous 0-100 risk score from the detection counters.
///
/// Malicious detections weigh twice as much as suspicious ones; the result is
/// the weighted threat as a percentage of the worst case (every engine
/// malicious), rounded half-up. A report with no engines scores `0`.
pub fn threat_score(counters: &DetectionCounters) -> u8 {
    let total = counters.total();
    if total == 0 {
        return 0;
    }

    let raw_threat = counters.malicious.saturating_mul(2).saturating_add(counters.suspicious);
    let max_possible = total.saturating_mul(2);

    // round(100 * raw / max) == floor((200 * raw + max) / (2 * max))
    let numerator = (raw_threat as u128) * 200 + max_possible as u128;
    let denominator = (max_possible as u128) * 2;
    (numerator / denominator).min(100) as u8
}
