//! OSV API HTTP client.

use super::response::{OsvQuery, OsvQueryResponse};
use crate::config::ScanConfig;
use crate::error::{Result, SbomError, ScanErrorKind};
use crate::scan::retry::{is_retryable_status, with_retry, AttemptError};
use crate::scan::{QueryKey, Vulnerability};
use reqwest::blocking::Client;

/// HTTP client for the OSV `/v1/query` endpoint.
pub struct OsvClient {
    client: Client,
    config: ScanConfig,
}

/// Helper to convert reqwest errors to retryable network errors
fn network_error(err: &reqwest::Error) -> AttemptError {
    AttemptError::Retryable(ScanErrorKind::NetworkError(err.to_string()))
}

/// Helper to classify a non-success status
fn status_error(status: u16, body: &str) -> AttemptError {
    let message = format!("OSV API returned error status {status}: {body}");
    match status {
        429 => AttemptError::Retryable(ScanErrorKind::RateLimited(message)),
        s if is_retryable_status(s) => AttemptError::Retryable(ScanErrorKind::ApiError(message)),
        _ => AttemptError::Fatal(ScanErrorKind::ApiError(message)),
    }
}

impl OsvClient {
    /// Create a new OSV client.
    pub fn new(config: &ScanConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()
            .map_err(|e| {
                SbomError::scan(
                    "Failed to create HTTP client",
                    ScanErrorKind::NetworkError(e.to_string()),
                )
            })?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// All vulnerabilities OSV reports for one package version.
    ///
    /// Follows `next_page_token` until the last page. Each page request is
    /// retried independently.
    pub fn query(&self, key: &QueryKey) -> std::result::Result<Vec<Vulnerability>, ScanErrorKind> {
        let mut request = OsvQuery::from_key(key);
        let mut vulnerabilities = Vec::new();
        let what = format!("OSV query for {}/{}@{}", key.ecosystem, key.name, key.version);

        loop {
            let page = with_retry(&self.config, &what, || self.send_query(&request))?;
            vulnerabilities.extend(page.vulns.into_iter().map(Vulnerability::from));
            match page.next_page_token {
                Some(token) if !token.is_empty() => request.page_token = Some(token),
                _ => break,
            }
        }

        Ok(vulnerabilities)
    }

    /// Send a single query request.
    fn send_query(&self, request: &OsvQuery) -> std::result::Result<OsvQueryResponse, AttemptError> {
        let response = self
            .client
            .post(&self.config.api_url)
            .json(request)
            .send()
            .map_err(|e| network_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(status_error(status.as_u16(), &body));
        }

        response
            .json()
            .map_err(|e| AttemptError::Fatal(ScanErrorKind::InvalidResponse(e.to_string())))
    }
}
