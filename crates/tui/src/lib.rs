//! GhostTyper compose TUI.
//!
//! A small mail-style compose form whose fields receive inline ghost-text
//! suggestions. The view layer here is deliberately thin: every
//! suggestion-related decision is made by the [`ghosttyper_engine`] session,
//! and this crate translates terminal events into session events, executes
//! the effects that come back, and draws the result.

mod app;
mod cmd;
mod input;
mod overlay;
mod runtime;
mod ui;

use std::time::Duration;

use anyhow::Result;
use ghosttyper_api::BackendClient;
use ghosttyper_types::SessionSettings;

pub use app::App;

/// Run the compose TUI until the user quits.
///
/// `settings` is the session snapshot projected from user preferences;
/// `client` talks to the suggestion backend; `telemetry_interval` paces the
/// periodic counter flush.
pub async fn run(settings: SessionSettings, client: BackendClient, telemetry_interval: Duration) -> Result<()> {
    runtime::run_app(settings, client, telemetry_interval).await
}
