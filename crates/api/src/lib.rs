//! GhostTyper backend client.
//!
//! A lightweight reqwest wrapper for the suggestion backend. It covers:
//!
//! - Constructing an HTTP client with sensible defaults
//! - Validating the configured base URL for safety
//! - The completion call in both wire shapes: single-shot JSON
//!   (`/generate`) and incrementally streamed plain text
//!   (`/api/suggestions`)
//! - Writing-sample upload, tone-profile fetch, and telemetry flush
//!
//! The suggestion-path methods return [`SuggestError`] so callers can fold
//! every failure into "no suggestion shown"; the profile and telemetry
//! methods surface `anyhow` errors since they back explicit user actions.

use std::env;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use futures_util::StreamExt;
use ghosttyper_types::SuggestError;
use ghosttyper_types::wire::{
    GenerateRequest, GenerateResponse, SampleRequest, SampleResponse, StreamSuggestionRequest, TelemetryReport, TelemetryTotals,
    ToneProfileResponse,
};
use reqwest::{Client, StatusCode, Url, header};
use tracing::debug;

/// Environment variable overriding the backend base URL.
pub const BACKEND_URL_ENV: &str = "GHOSTTYPER_BACKEND_URL";

/// Default backend base URL for local development.
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:3000";

/// Hostnames allowed to use plain HTTP.
const LOCALHOST_DOMAINS: &[&str] = &["localhost", "127.0.0.1"];

/// Thin wrapper around a configured `reqwest::Client` for backend access.
#[derive(Debug, Clone)]
pub struct BackendClient {
    pub base_url: String,
    pub http: Client,
    pub user_agent: String,
}

impl BackendClient {
    /// Construct a client against the given base URL.
    ///
    /// Localhost may use any scheme; every other host must use HTTPS.
    pub fn new(base_url: &str) -> Result<Self> {
        validate_base_url(base_url)?;

        let mut default_headers = header::HeaderMap::new();
        default_headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .default_headers(default_headers)
            .timeout(Duration::from_secs(30))
            .build()
            .context("build http client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
            user_agent: format!("ghosttyper/0.1; {}", env::consts::OS),
        })
    }

    /// Construct a client from `GHOSTTYPER_BACKEND_URL`, falling back to
    /// the local development default.
    pub fn from_env() -> Result<Self> {
        let base = env::var(BACKEND_URL_ENV).unwrap_or_else(|_| DEFAULT_BACKEND_URL.into());
        Self::new(&base)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Request a completion for the text preceding the caret.
    ///
    /// Single-shot JSON variant. An empty or whitespace-only suggestion is
    /// a failure: there is nothing worth rendering.
    pub async fn generate(&self, preceding_text: &str, profile_id: Option<&str>) -> Result<String, SuggestError> {
        let body = GenerateRequest {
            text: preceding_text.to_string(),
            profile_id: profile_id.map(str::to_string),
            tone_preference: None,
        };
        let url = self.url("/generate");
        debug!(%url, "requesting suggestion");

        let response = self
            .http
            .post(&url)
            .header(header::USER_AGENT, &self.user_agent)
            .json(&body)
            .send()
            .await
            .map_err(network_failure)?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<GenerateResponse>()
                .await
                .ok()
                .and_then(|r| r.message)
                .unwrap_or_else(|| status.to_string());
            return Err(SuggestError::ServiceError(message));
        }

        let parsed: GenerateResponse = response.json().await.map_err(network_failure)?;
        if !parsed.success {
            return Err(SuggestError::ServiceError(
                parsed.message.unwrap_or_else(|| "backend reported failure".into()),
            ));
        }
        non_empty_suggestion(parsed.suggestion.unwrap_or_default())
    }

    /// Request a completion via the API-key-per-request streaming route.
    ///
    /// The response arrives as chunked plain text; chunks are concatenated
    /// into the final suggestion.
    pub async fn generate_streamed(&self, context: &str, api_key: &str) -> Result<String, SuggestError> {
        let body = StreamSuggestionRequest {
            context: context.to_string(),
            api_key: api_key.to_string(),
        };
        let url = self.url("/api/suggestions");
        debug!(%url, "requesting streamed suggestion");

        let response = self
            .http
            .post(&url)
            .header(header::USER_AGENT, &self.user_agent)
            .json(&body)
            .send()
            .await
            .map_err(network_failure)?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ghosttyper_types::wire::ErrorBody>()
                .await
                .map(|b| b.error)
                .unwrap_or_else(|_| status.to_string());
            return Err(SuggestError::ServiceError(message));
        }

        let mut suggestion = String::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(network_failure)?;
            suggestion.push_str(&String::from_utf8_lossy(&chunk));
        }
        non_empty_suggestion(suggestion)
    }

    /// Upload a writing sample, creating a tone profile or updating an
    /// existing one.
    pub async fn upload_sample(&self, text: &str, profile_id: Option<&str>) -> Result<SampleResponse> {
        let body = SampleRequest {
            text: text.to_string(),
            profile_id: profile_id.map(str::to_string),
        };
        let response = self
            .http
            .post(self.url("/sample"))
            .header(header::USER_AGENT, &self.user_agent)
            .json(&body)
            .send()
            .await
            .context("send writing sample")?;

        let status = response.status();
        let parsed: SampleResponse = response.json().await.context("parse sample response")?;
        if !status.is_success() || !parsed.success {
            return Err(anyhow!(
                "sample upload failed ({}): {}",
                status,
                parsed.message.as_deref().unwrap_or("no message")
            ));
        }
        Ok(parsed)
    }

    /// Fetch a stored tone profile as an opaque JSON value.
    ///
    /// A 404 maps to [`SuggestError::ProfileNotFound`] so callers can
    /// proceed without personalization.
    pub async fn tone_profile(&self, profile_id: &str) -> Result<serde_json::Value, SuggestError> {
        let response = self
            .http
            .get(self.url(&format!("/user-tone/{profile_id}")))
            .header(header::USER_AGENT, &self.user_agent)
            .send()
            .await
            .map_err(network_failure)?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(SuggestError::ProfileNotFound),
            status if !status.is_success() => Err(SuggestError::ServiceError(status.to_string())),
            _ => {
                let parsed: ToneProfileResponse = response.json().await.map_err(network_failure)?;
                parsed
                    .tone_profile
                    .ok_or_else(|| SuggestError::ServiceError("response carried no profile".into()))
            }
        }
    }

    /// Flush shown/accepted counters; returns the cumulative daily totals.
    pub async fn flush_telemetry(&self, report: TelemetryReport) -> Result<TelemetryTotals> {
        let response = self
            .http
            .post(self.url("/api/telemetry"))
            .header(header::USER_AGENT, &self.user_agent)
            .json(&report)
            .send()
            .await
            .context("send telemetry")?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("telemetry flush rejected: {}", status));
        }
        response.json().await.context("parse telemetry totals")
    }
}

fn network_failure(error: reqwest::Error) -> SuggestError {
    SuggestError::NetworkFailure(error.to_string())
}

fn non_empty_suggestion(raw: String) -> Result<String, SuggestError> {
    if raw.trim().is_empty() {
        return Err(SuggestError::ServiceError("empty suggestion".into()));
    }
    Ok(raw)
}

/// Validate that a base URL is acceptable for use by the client.
///
/// Rules:
/// - `localhost` or `127.0.0.1`: any scheme is allowed
/// - otherwise: scheme must be HTTPS
fn validate_base_url(base: &str) -> Result<()> {
    let parsed = Url::parse(base).map_err(|e| anyhow!("invalid backend URL '{}': {}", base, e))?;

    let host_name = parsed
        .host_str()
        .ok_or_else(|| anyhow!("backend URL must include a host"))?;

    if LOCALHOST_DOMAINS
        .iter()
        .any(|&allowed| host_name.eq_ignore_ascii_case(allowed))
    {
        return Ok(());
    }

    if parsed.scheme() != "https" {
        return Err(anyhow!(
            "backend URL must use https for non-localhost hosts; got '{}://'",
            parsed.scheme()
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn localhost_allows_plain_http() {
        assert!(validate_base_url("http://localhost:3000").is_ok());
        assert!(validate_base_url("http://127.0.0.1:8080").is_ok());
    }

    #[test]
    fn remote_hosts_require_https() {
        assert!(validate_base_url("http://api.example.com").is_err());
        assert!(validate_base_url("https://api.example.com").is_ok());
    }

    #[test]
    fn rejects_unparseable_urls() {
        assert!(validate_base_url("not a url").is_err());
        assert!(validate_base_url("file:///tmp/x").is_err());
    }

    #[test]
    fn whitespace_only_suggestions_are_errors() {
        assert!(non_empty_suggestion("   \n".into()).is_err());
        assert_eq!(non_empty_suggestion(" say hello".into()).unwrap(), " say hello");
    }

    #[test]
    fn client_trims_trailing_slash() {
        let client = BackendClient::new("http://localhost:3000/").unwrap();
        assert_eq!(client.url("/generate"), "http://localhost:3000/generate");
    }
}
