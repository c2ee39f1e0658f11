// src/core/normalizer.rs

use crate::core::models::{EngineCategory, EngineVerdict};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

/// Hard cap on the number of engine verdicts returned to the caller.
pub const MAX_ENGINE_VERDICTS: usize = 10;
/// How many clean engines are sampled when nothing flagged the URL.
pub const MAX_CLEAN_SAMPLE: usize = 5;

/// The subset of an upstream per-engine entry that we care about.
///
/// Every field is optional upstream, so everything defaults here rather than
/// failing the whole report.
#[derive(Debug, Clone, Deserialize)]
struct RawEngineResult {
    #[serde(default)]
    engine_name: Option<String>,
    #[serde(default = "other_category")]
    category: EngineCategory,
    #[serde(default)]
    result: Option<String>,
}

fn other_category() -> EngineCategory {
    EngineCategory::Other
}

/// Per-engine detections and category tags, trimmed into a stable shape.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedResults {
    pub engine_verdicts: Vec<EngineVerdict>,
    pub categories: Vec<String>,
}

fn to_verdict(key: &str, raw: RawEngineResult, fallback_label: &str) -> EngineVerdict {
    let engine_name = raw
        .engine_name
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| key.to_string());
    let result_label = raw
        .result
        .filter(|label| !label.trim().is_empty())
        .unwrap_or_else(|| fallback_label.to_string());
    EngineVerdict { engine_name, result_label, category: raw.category }
}

fn decode_entries(engines: &Map<String, Value>) -> Vec<(&str, RawEngineResult)> {
    engines
        .iter()
        .filter_map(|(key, value)| match RawEngineResult::deserialize(value) {
            Ok(raw) => Some((key.as_str(), raw)),
            Err(e) => {
                debug!(engine = %key, error = %e, "Skipping malformed engine entry.");
                None
            }
        })
        .collect()
}

/// Extracts the engine verdicts worth showing from a raw engine map.
///
/// Every malicious or suspicious entry is kept in upstream order. Only when
/// there are none, up to five harmless entries are sampled instead. The final
/// list never exceeds ten entries.
pub fn extract_engine_verdicts(engines: Option<&Map<String, Value>>) -> Vec<EngineVerdict> {
    let Some(engines) = engines else {
        return Vec::new();
    };
    let entries = decode_entries(engines);

    let mut verdicts: Vec<EngineVerdict> = entries
        .iter()
        .filter(|(_, raw)| raw.category.is_threat())
        .map(|(key, raw)| {
            let label = raw.category.to_string();
            to_verdict(key, raw.clone(), &label)
        })
        .collect();

    if verdicts.is_empty() {
        verdicts = entries
            .into_iter()
            .filter(|(_, raw)| raw.category == EngineCategory::Harmless)
            .take(MAX_CLEAN_SAMPLE)
            .map(|(key, raw)| to_verdict(key, raw, "clean"))
            .collect();
    }

    verdicts.truncate(MAX_ENGINE_VERDICTS);
    verdicts
}

/// Deduplicates category tags, dropping blanks and keeping first-seen order.
pub fn extract_categories<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut categories: Vec<String> = Vec::new();
    for tag in raw {
        let tag = tag.as_ref().trim();
        if tag.is_empty() || categories.iter().any(|seen| seen == tag) {
            continue;
        }
        categories.push(tag.to_string());
    }
    categories
}

/// Runs both extractions over a raw report.
pub fn normalize(engines: Option<&Map<String, Value>>, raw_categories: &[String]) -> NormalizedResults {
    let normalized = NormalizedResults {
        engine_verdicts: extract_engine_verdicts(engines),
        categories: extract_categories(raw_categories),
    };
    debug!(
        engines = normalized.engine_verdicts.len(),
        categories = normalized.categories.len(),
        "Normalized upstream results."
    );
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn engines(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn missing_data_yields_empty_outputs() {
        assert_eq!(normalize(None, &[]), NormalizedResults::default());
    }

    #[test]
    fn threats_only_and_in_upstream_order() {
        let map = engines(json!({
            "Zeta": {"category": "harmless", "result": "clean"},
            "Beta": {"category": "malicious", "result": "phishing"},
            "Alpha": {"category": "suspicious"},
            "Gamma": {"category": "undetected", "result": "unrated"}
        }));
        let verdicts = extract_engine_verdicts(Some(&map));
        let names: Vec<&str> = verdicts.iter().map(|v| v.engine_name.as_str()).collect();
        assert_eq!(names, ["Beta", "Alpha"]);
        assert_eq!(verdicts[0].result_label, "phishing");
        assert_eq!(verdicts[1].result_label, "suspicious");
        assert!(verdicts.iter().all(|v| v.category != EngineCategory::Harmless));
    }

    #[test]
    fn clean_sample_when_nothing_flagged() {
        let mut map = Map::new();
        for i in 0..8 {
            map.insert(format!("Engine{i}"), json!({"category": "harmless"}));
        }
        map.insert("Other".into(), json!({"category": "undetected"}));
        let verdicts = extract_engine_verdicts(Some(&map));
        assert_eq!(verdicts.len(), MAX_CLEAN_SAMPLE);
        assert!(verdicts.iter().all(|v| v.result_label == "clean"));
        assert_eq!(verdicts[0].engine_name, "Engine0");
    }

    #[test]
    fn threats_are_capped_at_ten() {
        let mut map = Map::new();
        for i in 0..25 {
            map.insert(format!("Engine{i}"), json!({"category": "malicious", "result": "malware"}));
        }
        let verdicts = extract_engine_verdicts(Some(&map));
        assert_eq!(verdicts.len(), MAX_ENGINE_VERDICTS);
        assert_eq!(verdicts[9].engine_name, "Engine9");
    }

    #[test]
    fn tolerates_malformed_and_sparse_entries() {
        let map = engines(json!({
            "Broken": "not an object",
            "NoCategory": {"result": "whatever"},
            "Named": {"category": "malicious", "engine_name": "Named Engine v2", "result": ""}
        }));
        let verdicts = extract_engine_verdicts(Some(&map));
        assert_eq!(verdicts.len(), 1);
        assert_eq!(verdicts[0].engine_name, "Named Engine v2");
        assert_eq!(verdicts[0].result_label, "malicious");
    }

    #[test]
    fn categories_are_trimmed_and_deduplicated() {
        let raw = vec![
            " phishing ".to_string(),
            "".to_string(),
            "malware".to_string(),
            "phishing".to_string(),
            "   ".to_string(),
        ];
        assert_eq!(extract_categories(&raw), ["phishing", "malware"]);
    }
}
