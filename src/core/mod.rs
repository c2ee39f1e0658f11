// src/core/mod.rs

// The verdict pipeline. Nothing in here knows about HTTP entry points; the
// `api` module calls into `scanner` and renders what comes back.

/// Data structures shared across the pipeline: counters, engine verdicts,
/// severity tiers and the `ScanState` returned to callers.
pub mod models;

/// The error taxonomy every pipeline operation reports.
pub mod error;

/// Threshold ladder from detection counters to severity tier.
pub mod classifier;

/// Extracts engine verdicts and category tags from raw upstream reports.
pub mod normalizer;

/// Continuous 0-100 threat score.
pub mod score;

/// Upstream boundary plus the lookup/submit orchestrator and analysis poller.
pub mod scanner;
