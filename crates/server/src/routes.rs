//! HTTP surface of the suggestion backend.
//!
//! Thin handlers over the tone analyzer, the generative backend, and the
//! telemetry store. Validation errors come back as 4xx with a message;
//! upstream failures map to a generic 500 so internals never leak to
//! clients.

use std::convert::Infallible;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use futures_util::stream;
use ghosttyper_types::wire::{
    ErrorBody, GenerateRequest, GenerateResponse, SampleRequest, SampleResponse, StreamSuggestionRequest, TelemetryReport,
    ToneProfileResponse,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, warn};

use crate::config::ServerConfig;
use crate::genai::{GeminiClient, GenerativeBackend, suggestion_prompt};
use crate::store::{MemoryTelemetryStore, MemoryToneStore, TelemetryStore, ToneStore, today_key};
use crate::tone::{MIN_SAMPLE_CHARS, ToneAnalyzer};

/// Message returned for any unexpected internal failure.
const INTERNAL_ERROR_MESSAGE: &str = "An error occurred on the server";

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<ToneAnalyzer>,
    /// Completion backend using the server-held API key, when configured.
    pub completions: Option<Arc<dyn GenerativeBackend>>,
    pub tones: Arc<dyn ToneStore>,
    pub telemetry: Arc<dyn TelemetryStore>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Wire up the default stores and clients for a configuration.
    pub fn from_config(config: ServerConfig) -> anyhow::Result<Self> {
        let tones: Arc<dyn ToneStore> = Arc::new(MemoryToneStore::default());
        let telemetry: Arc<dyn TelemetryStore> = Arc::new(MemoryTelemetryStore::default());

        let completions: Option<Arc<dyn GenerativeBackend>> = match &config.gemini_api_key {
            Some(key) => Some(Arc::new(GeminiClient::new(&config.model, key)?)),
            None => {
                warn!("no generative API key configured; /generate and /sample will fail");
                None
            }
        };

        let analyzer = match &completions {
            Some(backend) => Arc::new(ToneAnalyzer::new(
                Arc::clone(backend),
                Arc::clone(&tones),
                config.tone_analysis_prompt.clone(),
            )),
            None => Arc::new(ToneAnalyzer::new(
                Arc::new(UnconfiguredBackend),
                Arc::clone(&tones),
                config.tone_analysis_prompt.clone(),
            )),
        };

        Ok(Self {
            analyzer,
            completions,
            tones,
            telemetry,
            config: Arc::new(config),
        })
    }
}

/// Placeholder backend used when no API key is configured.
struct UnconfiguredBackend;

#[async_trait::async_trait]
impl GenerativeBackend for UnconfiguredBackend {
    async fn complete(&self, _prompt: &str) -> anyhow::Result<String> {
        Err(anyhow::anyhow!("generative API key not configured"))
    }
}

/// Build the backend router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/generate", post(generate))
        .route("/api/suggestions", post(api_suggestions))
        .route("/sample", post(sample))
        .route("/user-tone/{id}", get(get_user_tone).delete(delete_user_tone))
        .route("/api/telemetry", post(record_telemetry))
        .route("/api/telemetry/daily", get(daily_telemetry))
        .route("/api/telemetry/all", get(all_telemetry))
        .route("/health", get(health))
        .with_state(state)
}

fn generate_failure(status: StatusCode, message: &str) -> Response {
    (
        status,
        axum::Json(GenerateResponse {
            success: false,
            suggestion: None,
            message: Some(message.to_string()),
        }),
    )
        .into_response()
}

/// `POST /generate`: single-shot completion, optionally personalized.
async fn generate(State(state): State<AppState>, axum::Json(body): axum::Json<GenerateRequest>) -> Response {
    if body.text.trim().is_empty() {
        return generate_failure(StatusCode::BAD_REQUEST, "Text is required");
    }

    // A missing profile never fails the request; personalization is
    // best-effort.
    let mut profile = match &body.profile_id {
        Some(id) => {
            let found = state.analyzer.get_profile(id).await;
            if found.is_none() {
                warn!(profile_id = %id, "tone profile not found; continuing without it");
            }
            found
        }
        None => None,
    };

    if let (Some(preference), Some(profile)) = (&body.tone_preference, profile.as_mut())
        && preference != "auto"
    {
        profile.formality = preference.clone();
        profile.voice = preference.clone();
    }

    let Some(backend) = &state.completions else {
        return generate_failure(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE);
    };

    let prompt = suggestion_prompt(&state.config.suggestion_prompt, &body.text, profile.as_ref());
    match backend.complete(&prompt).await {
        Ok(suggestion) => (
            StatusCode::OK,
            axum::Json(GenerateResponse {
                success: true,
                suggestion: Some(suggestion),
                message: None,
            }),
        )
            .into_response(),
        Err(error) => {
            error!(%error, "suggestion generation failed");
            generate_failure(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE)
        }
    }
}

/// `POST /api/suggestions`: API-key-per-request variant with a chunked
/// plain-text response.
async fn api_suggestions(State(state): State<AppState>, axum::Json(body): axum::Json<StreamSuggestionRequest>) -> Response {
    if body.context.trim().is_empty() {
        return error_body(StatusCode::BAD_REQUEST, "Context is required");
    }
    if body.api_key.trim().is_empty() {
        return error_body(StatusCode::BAD_REQUEST, "API key is required");
    }

    let client = match GeminiClient::new(&state.config.model, &body.api_key) {
        Ok(client) => client,
        Err(error) => {
            error!(%error, "failed to build per-request client");
            return error_body(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE);
        }
    };

    let prompt = suggestion_prompt(&state.config.suggestion_prompt, &body.context, None);
    match client.complete(&prompt).await {
        Ok(suggestion) => stream_text(suggestion),
        Err(error) => {
            error!(%error, "streamed suggestion failed");
            error_body(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE)
        }
    }
}

/// Deliver a suggestion as chunked plain text, one word per chunk.
fn stream_text(suggestion: String) -> Response {
    let chunks: Vec<Result<String, Infallible>> = suggestion.split_inclusive(' ').map(|part| Ok(part.to_string())).collect();
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .header(header::CACHE_CONTROL, "no-cache")
        .body(Body::from_stream(stream::iter(chunks)))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

fn error_body(status: StatusCode, message: &str) -> Response {
    (
        status,
        axum::Json(ErrorBody {
            error: message.to_string(),
        }),
    )
        .into_response()
}

/// `POST /sample`: analyze a writing sample into a tone profile.
async fn sample(State(state): State<AppState>, axum::Json(body): axum::Json<SampleRequest>) -> Response {
    if body.text.trim().is_empty() {
        return sample_failure(StatusCode::BAD_REQUEST, "Text is required");
    }
    if body.text.chars().count() < MIN_SAMPLE_CHARS {
        return sample_failure(
            StatusCode::BAD_REQUEST,
            "Writing sample must be at least 100 characters long",
        );
    }

    if let Some(profile_id) = &body.profile_id {
        match state.analyzer.update_profile(profile_id, &body.text).await {
            Ok(doc) => {
                return sample_success(StatusCode::OK, doc.profile_id, "Tone profile updated successfully");
            }
            Err(error) => {
                // Fall back to creating a fresh profile.
                warn!(%error, profile_id = %profile_id, "profile update failed; creating a new profile");
            }
        }
    }

    match state.analyzer.analyze_sample(&body.text).await {
        Ok(doc) => sample_success(StatusCode::CREATED, doc.profile_id, "Writing sample analyzed successfully"),
        Err(error) => {
            error!(%error, "sample analysis failed");
            sample_failure(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE)
        }
    }
}

fn sample_success(status: StatusCode, profile_id: String, message: &str) -> Response {
    (
        status,
        axum::Json(SampleResponse {
            success: true,
            profile_id: Some(profile_id),
            message: Some(message.to_string()),
        }),
    )
        .into_response()
}

fn sample_failure(status: StatusCode, message: &str) -> Response {
    (
        status,
        axum::Json(SampleResponse {
            success: false,
            profile_id: None,
            message: Some(message.to_string()),
        }),
    )
        .into_response()
}

/// `GET /user-tone/{id}`
async fn get_user_tone(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.tones.get(&id).await {
        Some(doc) => (
            StatusCode::OK,
            axum::Json(ToneProfileResponse {
                success: true,
                tone_profile: Some(doc.public_view()),
                message: None,
            }),
        )
            .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            axum::Json(ToneProfileResponse {
                success: false,
                tone_profile: None,
                message: Some("Tone profile not found".into()),
            }),
        )
            .into_response(),
    }
}

/// `DELETE /user-tone/{id}`
async fn delete_user_tone(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    if state.tones.delete(&id).await {
        (
            StatusCode::OK,
            axum::Json(json!({ "success": true, "message": "Tone profile deleted successfully" })),
        )
            .into_response()
    } else {
        (
            StatusCode::NOT_FOUND,
            axum::Json(json!({ "success": false, "message": "Tone profile not found" })),
        )
            .into_response()
    }
}

/// `POST /api/telemetry`: add counters into today's totals.
async fn record_telemetry(State(state): State<AppState>, axum::Json(report): axum::Json<TelemetryReport>) -> Response {
    let totals = state.telemetry.record(report).await;
    (StatusCode::OK, axum::Json(totals)).into_response()
}

#[derive(Debug, Deserialize)]
struct DailyQuery {
    date: Option<String>,
}

/// `GET /api/telemetry/daily?date=YYYY-MM-DD`
async fn daily_telemetry(State(state): State<AppState>, Query(query): Query<DailyQuery>) -> Response {
    let date = query.date.unwrap_or_else(today_key);
    let totals = state.telemetry.daily(&date).await;
    (StatusCode::OK, axum::Json(totals)).into_response()
}

/// `GET /api/telemetry/all`
async fn all_telemetry(State(state): State<AppState>) -> Response {
    let history = state.telemetry.all().await;
    (StatusCode::OK, axum::Json(history)).into_response()
}

/// `GET /health`
async fn health() -> Response {
    (StatusCode::OK, axum::Json(json!({ "status": "ok" }))).into_response()
}
