//! Backend configuration.
//!
//! Everything is env-driven with local-development defaults; the prompt
//! templates ride along here so the generative client stays free of
//! product wording.

use std::env;
use std::net::SocketAddr;

/// Environment variable holding the generative-language API key.
pub const GEMINI_API_KEY_ENV: &str = "GHOSTTYPER_GEMINI_API_KEY";

/// Environment variable overriding the generative model id.
pub const GEMINI_MODEL_ENV: &str = "GHOSTTYPER_GEMINI_MODEL";

/// Environment variable overriding the bind address.
pub const BIND_ADDRESS_ENV: &str = "GHOSTTYPER_BIND_ADDRESS";

/// Default generative model.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-lite";

/// Default bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:3000";

/// Prompt framing for completion requests.
pub const SUGGESTION_PROMPT: &str = "\
You are an AI writing assistant that helps users by suggesting text completions.
Based on the provided text and the user's writing style, generate a natural continuation.
The suggestion should:
- Match the user's tone and style
- Continue the thought or sentence naturally
- Be concise (1-15 words)
- Not repeat what's already been written

Only return the suggested text, with no additional explanation or formatting.";

/// Prompt framing for tone analysis.
pub const TONE_ANALYSIS_PROMPT: &str = "\
Analyze the following text and extract the writer's tone, style, and writing patterns.
Focus on aspects like:
- Formality level (casual, professional, academic)
- Sentence structure (simple, complex, varied)
- Vocabulary preferences (simple, advanced, technical)
- Use of idioms, metaphors, or other figurative language
- Punctuation patterns
- Common phrases or expressions
- Typical sentence starters
- Overall voice (authoritative, friendly, neutral)

Return the analysis as a JSON object with these characteristics.";

/// Runtime configuration for the backend.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_address: SocketAddr,
    /// Server-held API key; per-request keys on `/api/suggestions` bypass it.
    pub gemini_api_key: Option<String>,
    pub model: String,
    pub suggestion_prompt: String,
    pub tone_analysis_prompt: String,
}

impl ServerConfig {
    /// Build configuration from the environment.
    pub fn from_env() -> anyhow::Result<Self> {
        let bind = env::var(BIND_ADDRESS_ENV).unwrap_or_else(|_| DEFAULT_BIND_ADDRESS.into());
        let bind_address: SocketAddr = bind
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid bind address '{}': {}", bind, e))?;

        Ok(Self {
            bind_address,
            gemini_api_key: env::var(GEMINI_API_KEY_ENV).ok().filter(|k| !k.trim().is_empty()),
            model: env::var(GEMINI_MODEL_ENV).unwrap_or_else(|_| DEFAULT_MODEL.into()),
            suggestion_prompt: SUGGESTION_PROMPT.into(),
            tone_analysis_prompt: TONE_ANALYSIS_PROMPT.into(),
        })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.parse().expect("default bind address parses"),
            gemini_api_key: None,
            model: DEFAULT_MODEL.into(),
            suggestion_prompt: SUGGESTION_PROMPT.into(),
            tone_analysis_prompt: TONE_ANALYSIS_PROMPT.into(),
        }
    }
}
