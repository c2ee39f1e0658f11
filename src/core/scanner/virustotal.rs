// src/core/scanner/virustotal.rs

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::core::error::{ScanError, ScanResult};
use crate::core::scanner::upstream::{
    AnalysisObject, AnalysisReport, Envelope, LookupOutcome, RawReport, ReputationService,
    SubmissionObject, UrlObject,
};

pub const DEFAULT_BASE_URL: &str = "https://www.virustotal.com/api/v3";
const USER_AGENT: &str = "VanguardRS-UrlSentinel/0.1";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// `ReputationService` backed by the VirusTotal v3 REST API.
pub struct VirusTotalClient {
    client: Client,
    base_url: Url,
    api_key: String,
}

impl VirusTotalClient {
    /// Builds a client for the given API root and credential.
    ///
    /// # Arguments
    /// * `base_url` - API root, e.g. `https://www.virustotal.com/api/v3`.
    /// * `api_key` - Value sent in the `x-apikey` header.
    ///
    /// # Returns
    /// The client, or `ScanError::Configuration` if the API root is not a usable
    /// base URL or the HTTP client cannot be built.
    pub fn new(base_url: &str, api_key: &str) -> ScanResult<Self> {
        let base_url = Url::parse(base_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| ScanError::Configuration(format!("Invalid API base URL: {}", base_url)))?;

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| {
                error!(error = %e, "Failed to build HTTP client for the reputation service.");
                ScanError::Configuration(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url,
            api_key: api_key.to_string(),
        })
    }

    /// Appends `segments` to the API root. Each segment is percent-encoded as
    /// a single path component, so caller-supplied ids cannot escape it.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> ScanResult<T> {
        let status = response.status().as_u16();
        response.json::<T>().await.map_err(|e| {
            error!(status, error = %e, "Reputation service returned an unreadable payload.");
            ScanError::upstream_status(status, format!("Malformed response payload: {}", e))
        })
    }
}

fn transport_error(action: &str, e: reqwest::Error) -> ScanError {
    error!(action, error = %e, "Request to reputation service failed.");
    ScanError::upstream(format!("{} request failed: {}", action, e))
}

fn status_error(action: &str, status: StatusCode) -> ScanError {
    warn!(action, status = %status, "Reputation service answered with an error status.");
    ScanError::upstream_status(status.as_u16(), format!("VirusTotal API error: {}", status.as_u16()))
}

#[async_trait]
impl ReputationService for VirusTotalClient {
    async fn lookup_url(&self, url_id: &str) -> ScanResult<LookupOutcome> {
        debug!(url_id, "Looking up existing URL report.");
        let response = self
            .client
            .get(self.endpoint(&["urls", url_id]))
            .header("x-apikey", &self.api_key)
            .send()
            .await
            .map_err(|e| transport_error("lookup", e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            info!(url_id, "URL not known to the reputation service.");
            return Ok(LookupOutcome::NotFound);
        }
        if !status.is_success() {
            return Err(status_error("lookup", status));
        }

        let envelope: Envelope<UrlObject> = Self::read_json(response).await?;
        Ok(LookupOutcome::Found(RawReport::from(envelope.data)))
    }

    async fn submit_url(&self, url: &str) -> ScanResult<Option<String>> {
        info!(url, "Submitting URL for a new scan.");
        let response = self
            .client
            .post(self.endpoint(&["urls"]))
            .header("x-apikey", &self.api_key)
            .form(&[("url", url)])
            .send()
            .await
            .map_err(|e| transport_error("submit", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error("submit", status));
        }

        // A successful submission with an unreadable body still counts; the
        // handle is simply unknown.
        let handle = match response.json::<Envelope<SubmissionObject>>().await {
            Ok(envelope) => envelope.data.id.filter(|id| !id.is_empty()),
            Err(e) => {
                warn!(error = %e, "Submission accepted but no analysis handle could be read.");
                None
            }
        };
        debug!(handle = ?handle, "Submission accepted.");
        Ok(handle)
    }

    async fn fetch_analysis(&self, handle: &str) -> ScanResult<AnalysisReport> {
        debug!(handle, "Fetching analysis status.");
        let response = self
            .client
            .get(self.endpoint(&["analyses", handle]))
            .header("x-apikey", &self.api_key)
            .send()
            .await
            .map_err(|e| transport_error("analysis", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error("analysis", status));
        }

        let envelope: Envelope<AnalysisObject> = Self::read_json(response).await?;
        Ok(AnalysisReport::from(envelope.data))
    }
}
