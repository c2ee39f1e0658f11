// src/config.rs

use std::time::Duration;

use tracing::warn;

use crate::core::scanner::virustotal::DEFAULT_BASE_URL;

pub const API_KEY_ENV: &str = "VIRUSTOTAL_API_KEY";
pub const BASE_URL_ENV: &str = "VIRUSTOTAL_BASE_URL";
pub const BIND_ADDR_ENV: &str = "BIND_ADDR";
pub const TIMEOUT_ENV: &str = "SCAN_TIMEOUT_SECS";

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// Runtime settings, read once from the environment at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Reputation service credential. `None` is not fatal: every scan request
    /// fails with a configuration error until it is provided.
    pub api_key: Option<String>,
    pub base_url: String,
    pub bind_addr: String,
    /// Upper bound on one scan or poll request, upstream calls included.
    pub request_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds settings from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        let api_key = value(API_KEY_ENV);
        if api_key.is_none() {
            warn!("{} is not set; scan requests will fail until it is configured.", API_KEY_ENV);
        }

        let request_timeout = match value(TIMEOUT_ENV) {
            None => defaults.request_timeout,
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    warn!(value = %raw, "Invalid {}; using {}s.", TIMEOUT_ENV, DEFAULT_TIMEOUT_SECS);
                    defaults.request_timeout
                }
            },
        };

        Self {
            api_key,
            base_url: value(BASE_URL_ENV).unwrap_or(defaults.base_url),
            bind_addr: value(BIND_ADDR_ENV).unwrap_or(defaults.bind_addr),
            request_timeout,
        }
    }
}
