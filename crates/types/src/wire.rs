//! Wire contract between the suggestion client and the backend.
//!
//! One canonical shape per operation, camelCase on the wire. The tone
//! profile itself stays an opaque JSON value on the client side; only the
//! server interprets its fields.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `POST /generate` request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_id: Option<String>,
    /// Overrides the stored profile's formality and voice unless `"auto"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tone_preference: Option<String>,
}

/// `POST /generate` response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// `POST /api/suggestions` request body (API-key-per-request, streamed
/// response).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamSuggestionRequest {
    pub context: String,
    pub api_key: String,
}

/// `POST /sample` request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleRequest {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_id: Option<String>,
}

/// `POST /sample` response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// `GET /user-tone/{id}` response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToneProfileResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tone_profile: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// `POST /api/telemetry` request body.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryReport {
    pub suggestions_shown: u64,
    pub suggestions_accepted: u64,
}

/// Cumulative counts for one day, returned by the telemetry routes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryTotals {
    pub suggestions_shown: u64,
    pub suggestions_accepted: u64,
}

/// `GET /api/telemetry/all` response body: per-day totals, newest first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TelemetryHistory {
    pub daily: IndexMap<String, TelemetryTotals>,
}

/// Error body used by the API-key-per-request routes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
