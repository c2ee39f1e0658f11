// src/core/scanner/upstream.rs

use crate::core::error::ScanResult;
use crate::core::models::DetectionCounters;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};

// --- Upstream Payloads ---
// Only the fields the verdict pipeline reads are modelled. Everything is
// defaulted so schema drift upstream degrades to empty data, not an error.

/// The `data` envelope every upstream response is wrapped in.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
}

/// `GET /urls/{id}` response body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UrlObject {
    #[serde(default)]
    pub attributes: UrlAttributes,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UrlAttributes {
    #[serde(default)]
    pub last_analysis_stats: Option<DetectionCounters>,
    #[serde(default)]
    pub last_analysis_results: Option<Map<String, Value>>,
    /// Vendor name to category label, e.g. `{"Forcepoint ThreatSeeker": "phishing"}`.
    #[serde(default)]
    pub categories: Option<Map<String, Value>>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

/// `POST /urls` response body. The `id` is the analysis handle.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmissionObject {
    #[serde(default)]
    pub id: Option<String>,
}

/// `GET /analyses/{id}` response body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalysisObject {
    #[serde(default)]
    pub attributes: AnalysisAttributes,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalysisAttributes {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub stats: Option<DetectionCounters>,
    #[serde(default)]
    pub results: Option<Map<String, Value>>,
}

// --- Normalized Upstream Reports ---

/// A report ready to be fed to the verdict pipeline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawReport {
    pub counters: DetectionCounters,
    pub engines: Option<Map<String, Value>>,
    pub categories: Vec<String>,
}

impl From<UrlObject> for RawReport {
    fn from(object: UrlObject) -> Self {
        let attributes = object.attributes;
        let mut categories: Vec<String> = attributes
            .categories
            .unwrap_or_default()
            .into_iter()
            .filter_map(|(_, value)| value.as_str().map(str::to_string))
            .collect();
        categories.extend(attributes.tags.unwrap_or_default());

        Self {
            counters: attributes.last_analysis_stats.unwrap_or_default(),
            engines: attributes.last_analysis_results,
            categories,
        }
    }
}

/// Result of looking a URL up by its identifier.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome {
    Found(RawReport),
    NotFound,
}

/// Lifecycle of an upstream analysis job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisStatus {
    Queued,
    InProgress,
    Completed,
    /// Any status string we do not recognise.
    Unknown(String),
}

impl AnalysisStatus {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("queued") => AnalysisStatus::Queued,
            Some("in-progress") => AnalysisStatus::InProgress,
            Some("completed") => AnalysisStatus::Completed,
            Some(other) => AnalysisStatus::Unknown(other.to_string()),
            None => AnalysisStatus::Unknown(String::new()),
        }
    }
}

/// The state of one analysis job as reported upstream.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisReport {
    pub status: AnalysisStatus,
    pub report: RawReport,
}

impl From<AnalysisObject> for AnalysisReport {
    fn from(object: AnalysisObject) -> Self {
        let attributes = object.attributes;
        Self {
            status: AnalysisStatus::parse(attributes.status.as_deref()),
            report: RawReport {
                counters: attributes.stats.unwrap_or_default(),
                engines: attributes.results,
                categories: Vec::new(),
            },
        }
    }
}

// --- Service Boundary ---

/// The three operations the verdict pipeline needs from a reputation service.
///
/// Each call is a single request; implementations must not retry internally.
#[async_trait]
pub trait ReputationService: Send + Sync {
    /// Looks up existing results by URL identifier. A 404 is `NotFound`, not an error.
    async fn lookup_url(&self, url_id: &str) -> ScanResult<LookupOutcome>;

    /// Submits a URL for a fresh scan, returning the analysis handle if one was given.
    async fn submit_url(&self, url: &str) -> ScanResult<Option<String>>;

    /// Fetches the current state of an analysis job.
    async fn fetch_analysis(&self, handle: &str) -> ScanResult<AnalysisReport>;
}
