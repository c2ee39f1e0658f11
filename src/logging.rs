// src/logging.rs

use std::fs::{File, OpenOptions};
use std::path::PathBuf;

use color_eyre::eyre::Result;
use directories::ProjectDirs;
use lazy_static::lazy_static;
use tracing_error::ErrorLayer;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const QUALIFIER: &str = "io";
const ORGANIZATION: &str = "UrlSentinel";

lazy_static! {
    /// Service-specific level variable, consulted when `RUST_LOG` is unset.
    pub static ref LEVEL_VAR: String = format!("{}_LOG", env!("CARGO_CRATE_NAME").to_uppercase());
    /// Overrides the directory the log file is written to.
    pub static ref DIR_VAR: String = format!("{}_LOG_DIR", env!("CARGO_CRATE_NAME").to_uppercase());
    static ref DEFAULT_DIRECTIVE: String = format!("{}=info,tower_http=info", env!("CARGO_CRATE_NAME"));
}

/// Where `service.log` goes: `$<CRATE>_LOG_DIR` if set, else the platform's
/// local data directory for this service, else `./logs`.
fn log_directory<F>(lookup: F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(dir) = lookup(DIR_VAR.as_str()).filter(|dir| !dir.trim().is_empty()) {
        return PathBuf::from(dir);
    }
    ProjectDirs::from(QUALIFIER, ORGANIZATION, env!("CARGO_PKG_NAME"))
        .map(|dirs| dirs.data_local_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"))
}

/// Filter directive: `RUST_LOG`, then the service-specific variable, then
/// info for this crate and the HTTP trace layer.
fn filter_directive<F>(lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup("RUST_LOG")
        .or_else(|| lookup(LEVEL_VAR.as_str()))
        .filter(|directive| !directive.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_DIRECTIVE.clone())
}

/// Opens the log file for appending so restarts keep earlier runs.
fn open_log_file(directory: PathBuf) -> Result<File> {
    std::fs::create_dir_all(&directory)?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(directory.join("service.log"))?;
    Ok(file)
}

/// Installs the global subscriber: plain-text lines to the log file, and
/// colored lines to stderr. Both share the same level filter.
pub fn initialize_logging() -> Result<()> {
    let env = |key: &str| std::env::var(key).ok();
    let directive = filter_directive(env);
    let log_file = open_log_file(log_directory(env))?;

    let to_file = fmt::layer()
        .with_writer(log_file)
        .with_ansi(false)
        .with_filter(EnvFilter::try_new(&directive)?);

    let to_stderr = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(EnvFilter::try_new(&directive)?);

    tracing_subscriber::registry()
        .with(to_file)
        .with(to_stderr)
        .with(ErrorLayer::default())
        .try_init()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
        let vars: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn directive_prefers_rust_log() {
        let env = lookup(&[("RUST_LOG", "debug"), (LEVEL_VAR.as_str(), "warn")]);
        assert_eq!(filter_directive(env), "debug");
        assert_eq!(filter_directive(lookup(&[(LEVEL_VAR.as_str(), "warn")])), "warn");
        assert_eq!(filter_directive(lookup(&[("RUST_LOG", "  ")])), *DEFAULT_DIRECTIVE);
        assert_eq!(
            filter_directive(lookup(&[])),
            "vanguard_url_sentinel=info,tower_http=info"
        );
    }

    #[test]
    fn log_directory_override() {
        assert_eq!(
            log_directory(lookup(&[(DIR_VAR.as_str(), "/var/log/sentinel")])),
            PathBuf::from("/var/log/sentinel")
        );
        let default = log_directory(lookup(&[]));
        assert!(default.ends_with("logs"));
        assert_ne!(default, PathBuf::from("/var/log/sentinel"));
    }

    #[test]
    fn variable_names_follow_the_crate() {
        assert_eq!(*LEVEL_VAR, "VANGUARD_URL_SENTINEL_LOG");
        assert_eq!(*DIR_VAR, "VANGUARD_URL_SENTINEL_LOG_DIR");
    }
}
