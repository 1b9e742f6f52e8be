//! User preference persistence for GhostTyper.
//!
//! A tiny JSON-backed store holding the extension-local state: the master
//! enabled flag, the tone-profile id, the backend URL, the origin
//! block-list, the trigger delay, and the presentation mode. The file lives
//! in the standard configuration directory
//! (`~/.config/ghosttyper/preferences.json` on most platforms) and is safe
//! to read/write from multiple threads thanks to the internal `Mutex`.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use dirs_next::config_dir;
use ghosttyper_types::{PresentationMode, SessionSettings};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Environment variable allowing callers to override the preferences file path.
pub const PREFERENCES_PATH_ENV: &str = "GHOSTTYPER_PREFERENCES_PATH";

/// Default filename for the JSON payload.
pub const PREFERENCES_FILE_NAME: &str = "preferences.json";

/// Default backend base URL when none is configured.
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:3000";

/// Default quiet period before a suggestion request, in milliseconds.
pub const DEFAULT_TRIGGER_DELAY_MS: u64 = 400;

/// Error surfaced when reading or writing preferences fails.
#[derive(Debug, Error)]
pub enum PreferencesError {
    /// I/O failure (for example, permissions or missing directory).
    #[error("preferences I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization or deserialization failure.
    #[error("preferences serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Persisted preference values.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreferencesPayload {
    /// Master switch for the whole assistant.
    pub enabled: bool,
    /// Opaque tone-profile id forwarded with completion requests.
    pub profile_id: Option<String>,
    /// Base URL of the suggestion backend.
    pub backend_url: String,
    /// Origin patterns (with `*` wildcards) for which suggestions are off.
    pub blocked_origins: Vec<String>,
    /// Quiet period after the last edit before requesting a suggestion.
    pub trigger_delay_ms: u64,
    /// How suggestions are presented.
    pub presentation_mode: PresentationMode,
}

impl Default for PreferencesPayload {
    fn default() -> Self {
        Self {
            enabled: true,
            profile_id: None,
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            blocked_origins: Vec::new(),
            trigger_delay_ms: DEFAULT_TRIGGER_DELAY_MS,
            presentation_mode: PresentationMode::Inline,
        }
    }
}

impl PreferencesPayload {
    /// Project the payload into the engine's settings snapshot.
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            enabled: self.enabled,
            profile_id: self.profile_id.clone(),
            trigger_delay: Duration::from_millis(self.trigger_delay_ms),
            presentation: self.presentation_mode,
            blocked_origins: self.blocked_origins.clone(),
        }
    }
}

/// Thread-safe preferences store backed by a JSON file.
#[derive(Debug)]
pub struct UserPreferences {
    path: PathBuf,
    payload: Mutex<PreferencesPayload>,
    persist_to_disk: bool,
}

impl UserPreferences {
    /// Load the store from the default path (or the env override).
    pub fn new() -> Result<Self, PreferencesError> {
        let resolved_path = default_preferences_path();
        let payload = load_payload(&resolved_path)?;
        Ok(Self {
            path: resolved_path,
            payload: Mutex::new(payload),
            persist_to_disk: true,
        })
    }

    /// Build an in-memory store used as a fallback when the config
    /// directory cannot be accessed.
    pub fn ephemeral() -> Self {
        Self {
            path: PathBuf::new(),
            payload: Mutex::new(PreferencesPayload::default()),
            persist_to_disk: false,
        }
    }

    /// Path to the underlying JSON file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Snapshot of the current payload.
    pub fn payload(&self) -> PreferencesPayload {
        self.payload.lock().expect("preferences lock poisoned").clone()
    }

    /// Replace the whole payload and persist it.
    pub fn set_payload(&self, new_payload: PreferencesPayload) -> Result<(), PreferencesError> {
        let mut payload = self.payload.lock().expect("preferences lock poisoned");
        *payload = new_payload;
        if self.persist_to_disk {
            self.save_locked(&payload)?;
        }
        Ok(())
    }

    /// Mutate the payload in place and persist the result.
    pub fn update<F>(&self, f: F) -> Result<(), PreferencesError>
    where
        F: FnOnce(&mut PreferencesPayload),
    {
        let mut payload = self.payload.lock().expect("preferences lock poisoned");
        f(&mut payload);
        if self.persist_to_disk {
            self.save_locked(&payload)?;
        }
        Ok(())
    }

    fn save_locked(&self, payload: &PreferencesPayload) -> Result<(), PreferencesError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(payload)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}

fn default_preferences_path() -> PathBuf {
    if let Ok(path) = env::var(PREFERENCES_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return PathBuf::from(trimmed);
        }
    }

    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ghosttyper")
        .join(PREFERENCES_FILE_NAME)
}

fn load_payload(path: &Path) -> Result<PreferencesPayload, PreferencesError> {
    match fs::read_to_string(path) {
        Ok(data) => match serde_json::from_str(&data) {
            Ok(payload) => Ok(payload),
            Err(error) => {
                warn!(
                    path = %path.display(),
                    error = %error,
                    "Failed to parse preferences file; using defaults"
                );
                Ok(PreferencesPayload::default())
            }
        },
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(PreferencesPayload::default()),
        Err(error) => Err(PreferencesError::Io(error)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nope.json");
        temp_env::with_var(PREFERENCES_PATH_ENV, Some(path.to_str().unwrap()), || {
            let prefs = UserPreferences::new().unwrap();
            let payload = prefs.payload();
            assert!(payload.enabled);
            assert_eq!(payload.trigger_delay_ms, DEFAULT_TRIGGER_DELAY_MS);
            assert_eq!(payload.backend_url, DEFAULT_BACKEND_URL);
        });
    }

    #[test]
    fn update_persists_and_reloads() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        temp_env::with_var(PREFERENCES_PATH_ENV, Some(path.to_str().unwrap()), || {
            let prefs = UserPreferences::new().unwrap();
            prefs
                .update(|p| {
                    p.enabled = false;
                    p.profile_id = Some("tone-123".into());
                    p.blocked_origins.push("*.bank.com".into());
                })
                .unwrap();

            let reloaded = UserPreferences::new().unwrap();
            let payload = reloaded.payload();
            assert!(!payload.enabled);
            assert_eq!(payload.profile_id.as_deref(), Some("tone-123"));
            assert_eq!(payload.blocked_origins, vec!["*.bank.com".to_string()]);
        });
    }

    #[test]
    fn corrupt_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        fs::write(&path, "{not json").unwrap();
        temp_env::with_var(PREFERENCES_PATH_ENV, Some(path.to_str().unwrap()), || {
            let prefs = UserPreferences::new().unwrap();
            assert!(prefs.payload().enabled);
        });
    }

    #[test]
    fn session_settings_projection() {
        let payload = PreferencesPayload {
            trigger_delay_ms: 300,
            presentation_mode: PresentationMode::Panel,
            ..PreferencesPayload::default()
        };
        let settings = payload.session_settings();
        assert_eq!(settings.trigger_delay, Duration::from_millis(300));
        assert_eq!(settings.presentation, PresentationMode::Panel);
    }
}
