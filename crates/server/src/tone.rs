//! Tone analysis over writing samples.
//!
//! Runs the analysis prompt against the generative backend, coaxes a JSON
//! object out of whatever the model returned, and stores the result as a
//! tone profile document.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{Result, anyhow};
use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Value, json};
use tracing::debug;

use crate::genai::{GenerativeBackend, tone_analysis_prompt};
use crate::store::{ToneProfileDoc, ToneStore};

/// Minimum sample length accepted for analysis, in characters.
pub const MIN_SAMPLE_CHARS: usize = 100;

static PROFILE_COUNTER: AtomicU64 = AtomicU64::new(0);

/// First `{...}` block in free-form model output.
static JSON_OBJECT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\{.*\}").expect("json object regex compiles"));

/// Analyzes writing samples and manages the stored profiles.
pub struct ToneAnalyzer {
    backend: Arc<dyn GenerativeBackend>,
    store: Arc<dyn ToneStore>,
    analysis_prompt: String,
}

impl ToneAnalyzer {
    pub fn new(backend: Arc<dyn GenerativeBackend>, store: Arc<dyn ToneStore>, analysis_prompt: String) -> Self {
        Self {
            backend,
            store,
            analysis_prompt,
        }
    }

    /// Analyze a sample and create a new profile.
    pub async fn analyze_sample(&self, text: &str) -> Result<ToneProfileDoc> {
        let analysis = self.run_analysis(text).await?;
        let now = Utc::now();
        let doc = ToneProfileDoc {
            profile_id: mint_profile_id(),
            formality: str_field(&analysis, "formality", "conversational"),
            sentence_structure: str_field(&analysis, "sentenceStructure", "moderate"),
            vocabulary: str_field(&analysis, "vocabulary", "moderate"),
            figurative_language: str_field(&analysis, "figurativeLanguage", "low"),
            voice: str_field(&analysis, "voice", "neutral"),
            common_phrases: vec_field(&analysis, "commonPhrases"),
            sentence_starters: vec_field(&analysis, "sentenceStarters"),
            raw_analysis: analysis,
            sample_text: text.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.store.put(doc.clone()).await;
        Ok(doc)
    }

    /// Re-analyze a sample into an existing profile.
    ///
    /// Fields the new analysis does not mention keep their stored values.
    pub async fn update_profile(&self, profile_id: &str, text: &str) -> Result<ToneProfileDoc> {
        let Some(mut doc) = self.store.get(profile_id).await else {
            return Err(anyhow!("tone profile not found"));
        };
        let analysis = self.run_analysis(text).await?;

        doc.formality = str_field(&analysis, "formality", &doc.formality);
        doc.sentence_structure = str_field(&analysis, "sentenceStructure", &doc.sentence_structure);
        doc.vocabulary = str_field(&analysis, "vocabulary", &doc.vocabulary);
        doc.figurative_language = str_field(&analysis, "figurativeLanguage", &doc.figurative_language);
        doc.voice = str_field(&analysis, "voice", &doc.voice);
        let phrases = vec_field(&analysis, "commonPhrases");
        if !phrases.is_empty() {
            doc.common_phrases = phrases;
        }
        let starters = vec_field(&analysis, "sentenceStarters");
        if !starters.is_empty() {
            doc.sentence_starters = starters;
        }
        doc.raw_analysis = analysis;
        doc.sample_text = text.to_string();
        doc.updated_at = Utc::now();

        self.store.put(doc.clone()).await;
        Ok(doc)
    }

    pub async fn get_profile(&self, profile_id: &str) -> Option<ToneProfileDoc> {
        self.store.get(profile_id).await
    }

    async fn run_analysis(&self, text: &str) -> Result<Value> {
        let prompt = tone_analysis_prompt(&self.analysis_prompt, text);
        let raw = self.backend.complete(&prompt).await?;
        Ok(parse_analysis(&raw))
    }
}

fn mint_profile_id() -> String {
    format!(
        "tone-{}-{}",
        Utc::now().timestamp_millis(),
        PROFILE_COUNTER.fetch_add(1, Ordering::Relaxed)
    )
}

/// Coerce model output into an analysis object.
///
/// Tries the whole response as JSON, then the first embedded `{...}`
/// block, and finally falls back to a neutral default analysis.
fn parse_analysis(raw: &str) -> Value {
    if let Ok(value) = serde_json::from_str::<Value>(raw)
        && value.is_object()
    {
        return value;
    }
    if let Some(m) = JSON_OBJECT_RE.find(raw)
        && let Ok(value) = serde_json::from_str::<Value>(m.as_str())
    {
        return value;
    }
    debug!("analysis output was not JSON; using defaults");
    json!({
        "formality": "conversational",
        "sentenceStructure": "moderate",
        "vocabulary": "moderate",
        "figurativeLanguage": "low",
        "voice": "neutral",
        "commonPhrases": [],
        "sentenceStarters": [],
    })
}

fn str_field(analysis: &Value, key: &str, default: &str) -> String {
    analysis
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default)
        .to_string()
}

fn vec_field(analysis: &Value, key: &str) -> Vec<String> {
    analysis
        .get(key)
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_str).map(str::to_string).collect())
        .unwrap_or_default()
}
