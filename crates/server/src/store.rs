//! Document storage behind traits.
//!
//! Persistence is an opaque document store to the rest of the service, so
//! the routes only ever see these traits. The in-memory implementations are
//! the ones shipped; anything durable can slot in behind the same seams.

use std::collections::BTreeMap;
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ghosttyper_types::wire::{TelemetryHistory, TelemetryReport, TelemetryTotals};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;

/// A stored tone profile document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToneProfileDoc {
    pub profile_id: String,
    pub formality: String,
    pub sentence_structure: String,
    pub vocabulary: String,
    pub figurative_language: String,
    pub voice: String,
    pub common_phrases: Vec<String>,
    pub sentence_starters: Vec<String>,
    /// The analyzer's raw output, kept for debugging; never returned.
    #[serde(skip_serializing)]
    pub raw_analysis: Value,
    /// The sample the profile was built from; never returned.
    #[serde(skip_serializing)]
    pub sample_text: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ToneProfileDoc {
    /// Projection returned by `GET /user-tone/{id}`.
    pub fn public_view(&self) -> Value {
        serde_json::json!({
            "profileId": self.profile_id,
            "formality": self.formality,
            "sentenceStructure": self.sentence_structure,
            "vocabulary": self.vocabulary,
            "figurativeLanguage": self.figurative_language,
            "voice": self.voice,
            "commonPhrases": self.common_phrases,
            "sentenceStarters": self.sentence_starters,
            "createdAt": self.created_at,
            "updatedAt": self.updated_at,
        })
    }
}

/// Tone-profile persistence.
#[async_trait]
pub trait ToneStore: Send + Sync {
    async fn get(&self, profile_id: &str) -> Option<ToneProfileDoc>;
    async fn put(&self, doc: ToneProfileDoc);
    /// Returns whether a document was removed.
    async fn delete(&self, profile_id: &str) -> bool;
}

/// Telemetry persistence, keyed by `YYYY-MM-DD` day.
#[async_trait]
pub trait TelemetryStore: Send + Sync {
    /// Add a report to today's totals and return the updated day.
    async fn record(&self, report: TelemetryReport) -> TelemetryTotals;
    /// Totals for one day; absent days are all zeroes.
    async fn daily(&self, date: &str) -> TelemetryTotals;
    /// Per-day totals, newest first.
    async fn all(&self) -> TelemetryHistory;
}

/// Today's key in the format the telemetry store uses.
pub fn today_key() -> String {
    Utc::now().format("%Y-%m-%d").to_string()
}

/// In-memory tone-profile store.
#[derive(Debug, Default)]
pub struct MemoryToneStore {
    docs: RwLock<HashMap<String, ToneProfileDoc>>,
}

#[async_trait]
impl ToneStore for MemoryToneStore {
    async fn get(&self, profile_id: &str) -> Option<ToneProfileDoc> {
        self.docs.read().await.get(profile_id).cloned()
    }

    async fn put(&self, doc: ToneProfileDoc) {
        self.docs.write().await.insert(doc.profile_id.clone(), doc);
    }

    async fn delete(&self, profile_id: &str) -> bool {
        self.docs.write().await.remove(profile_id).is_some()
    }
}

/// In-memory telemetry store.
#[derive(Debug, Default)]
pub struct MemoryTelemetryStore {
    days: RwLock<BTreeMap<String, TelemetryTotals>>,
}

#[async_trait]
impl TelemetryStore for MemoryTelemetryStore {
    async fn record(&self, report: TelemetryReport) -> TelemetryTotals {
        let mut days = self.days.write().await;
        let entry = days.entry(today_key()).or_default();
        entry.suggestions_shown += report.suggestions_shown;
        entry.suggestions_accepted += report.suggestions_accepted;
        *entry
    }

    async fn daily(&self, date: &str) -> TelemetryTotals {
        self.days.read().await.get(date).copied().unwrap_or_default()
    }

    async fn all(&self) -> TelemetryHistory {
        let days = self.days.read().await;
        let mut history = TelemetryHistory::default();
        for (date, totals) in days.iter().rev() {
            history.daily.insert(date.clone(), *totals);
        }
        history
    }
}
