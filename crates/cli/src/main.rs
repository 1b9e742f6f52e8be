//! GhostTyper command-line entry point.
//!
//! With no subcommand the compose TUI starts; `serve` runs the suggestion
//! backend; `sample` uploads a writing sample to build or refresh a tone
//! profile.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use ghosttyper_api::{BACKEND_URL_ENV, BackendClient};
use ghosttyper_server::ServerConfig;
use ghosttyper_util::{PreferencesPayload, UserPreferences};
use tracing::warn;

/// Environment variable overriding the telemetry flush interval, in seconds.
const TELEMETRY_INTERVAL_ENV: &str = "GHOSTTYPER_TELEMETRY_INTERVAL_SECS";

/// Default telemetry flush interval.
const DEFAULT_TELEMETRY_INTERVAL_SECS: u64 = 60;

/// Minimum writing-sample length the backend accepts, in characters.
const MIN_SAMPLE_CHARS: usize = 100;

#[derive(Parser)]
#[command(name = "ghosttyper", version, about = "Inline writing suggestions, in your terminal")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the suggestion backend.
    Serve,
    /// Upload a writing sample to create or update a tone profile.
    Sample {
        /// Path to a text file holding the sample.
        file: PathBuf,
        /// Update this profile instead of creating a new one.
        #[arg(long)]
        profile: Option<String>,
        /// Store the resulting profile id in preferences for future sessions.
        #[arg(long)]
        save: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        None => run_tui().await,
        Some(Command::Serve) => {
            let config = ServerConfig::from_env()?;
            ghosttyper_server::serve(config).await
        }
        Some(Command::Sample { file, profile, save }) => run_sample(file, profile, save).await,
    }
}

fn init_tracing() {
    let filter = env::var("RUST_LOG").unwrap_or_else(|_| "info".into());
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Load preferences, falling back to in-memory defaults when the config
/// directory is unusable.
fn load_preferences() -> UserPreferences {
    match UserPreferences::new() {
        Ok(preferences) => preferences,
        Err(error) => {
            warn!(%error, "preferences unavailable; using in-memory defaults");
            UserPreferences::ephemeral()
        }
    }
}

/// Build the backend client; the env override wins over preferences.
fn backend_client(payload: &PreferencesPayload) -> Result<BackendClient> {
    if env::var(BACKEND_URL_ENV).is_ok() {
        BackendClient::from_env()
    } else {
        BackendClient::new(&payload.backend_url)
    }
    .context("configure backend client")
}

fn telemetry_interval() -> Duration {
    let secs = env::var(TELEMETRY_INTERVAL_ENV)
        .ok()
        .and_then(|raw| raw.trim().parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .unwrap_or(DEFAULT_TELEMETRY_INTERVAL_SECS);
    Duration::from_secs(secs)
}

async fn run_tui() -> Result<()> {
    let preferences = load_preferences();
    let payload = preferences.payload();
    let client = backend_client(&payload)?;
    ghosttyper_tui::run(payload.session_settings(), client, telemetry_interval()).await
}

async fn run_sample(file: PathBuf, profile: Option<String>, save: bool) -> Result<()> {
    let text = tokio::fs::read_to_string(&file)
        .await
        .with_context(|| format!("read writing sample {}", file.display()))?;
    if text.chars().count() < MIN_SAMPLE_CHARS {
        bail!("writing sample must be at least {MIN_SAMPLE_CHARS} characters long");
    }

    let preferences = load_preferences();
    let payload = preferences.payload();
    let client = backend_client(&payload)?;

    // An explicit --profile wins; otherwise refresh the stored one.
    let profile_id = profile.or(payload.profile_id);
    let response = client.upload_sample(&text, profile_id.as_deref()).await?;
    let id = response.profile_id.context("backend returned no profile id")?;
    println!("tone profile: {id}");

    if save {
        preferences.update(|p| p.profile_id = Some(id.clone()))?;
        println!("saved to {}", preferences.path().display());
    }
    Ok(())
}
