//! Generative-language upstream.
//!
//! The routes only see the [`GenerativeBackend`] trait; the shipped
//! implementation calls the REST `generateContent` endpoint. Prompt
//! assembly lives here too so the tone analyzer and the suggestion routes
//! share one wording.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use tracing::debug;

use crate::store::ToneProfileDoc;

/// Base URL of the generative-language REST API.
const GENERATIVE_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// A text-in/text-out completion service.
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// REST client for the generative-language API.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(model: &str, api_key: &str) -> Result<Self> {
        Self::with_base_url(GENERATIVE_API_BASE, model, api_key)
    }

    /// Override the base URL (tests, proxies).
    pub fn with_base_url(base_url: &str, model: &str, api_key: &str) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("build generative http client")?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
        })
    }
}

#[async_trait]
impl GenerativeBackend for GeminiClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        debug!(model = %self.model, "calling generateContent");

        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });
        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .context("send generateContent request")?;

        let status = response.status();
        let payload: Value = response.json().await.context("parse generateContent response")?;
        if !status.is_success() {
            let message = payload
                .pointer("/error/message")
                .and_then(Value::as_str)
                .unwrap_or("upstream rejected the request");
            return Err(anyhow!("generative API error ({}): {}", status, message));
        }

        extract_candidate_text(&payload)
    }
}

/// Pull the first candidate's text out of a `generateContent` response.
///
/// A prompt-feedback block reason counts as a failure: there is no text to
/// suggest and the caller degrades to "no suggestion".
fn extract_candidate_text(payload: &Value) -> Result<String> {
    if let Some(reason) = payload.pointer("/promptFeedback/blockReason").and_then(Value::as_str) {
        return Err(anyhow!("prompt blocked by content safety: {}", reason));
    }
    let text = payload
        .pointer("/candidates/0/content/parts/0/text")
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("generateContent response carried no candidate text"))?;
    Ok(text.trim().to_string())
}

/// Assemble the completion prompt, weaving in the stored writing style.
pub fn suggestion_prompt(base: &str, text: &str, profile: Option<&ToneProfileDoc>) -> String {
    let mut prompt = base.to_string();

    if let Some(profile) = profile {
        prompt.push_str(&format!(
            "\n\nUser's writing style:\n- Formality: {}\n- Sentence structure: {}\n- Vocabulary: {}\n- Figurative language: {}\n- Voice: {}",
            profile.formality, profile.sentence_structure, profile.vocabulary, profile.figurative_language, profile.voice,
        ));
        if !profile.common_phrases.is_empty() {
            prompt.push_str(&format!("\n- Common phrases: {}", profile.common_phrases.join(", ")));
        }
        if !profile.sentence_starters.is_empty() {
            prompt.push_str(&format!("\n- Sentence starters: {}", profile.sentence_starters.join(", ")));
        }
    }

    prompt.push_str(&format!("\n\nUser's text: \"{}\"", text));
    prompt.push_str("\n\nSuggestion:");
    prompt
}

/// Assemble the tone-analysis prompt.
pub fn tone_analysis_prompt(base: &str, text: &str) -> String {
    format!("{}\n\nText to analyze: \"{}\"", base, text)
}
