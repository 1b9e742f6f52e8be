//! Effect execution layer.
//!
//! Translates the session's [`Effect`]s into imperative commands and runs
//! them. Local effects (overlay changes, accepted splices) mutate the app
//! directly; network effects become spawned tasks whose results flow back
//! into the event loop as [`SessionEvent`]s. State updates stay pure in the
//! engine; this is the imperative shell around it.

use ghosttyper_api::BackendClient;
use ghosttyper_types::wire::TelemetryReport;
use ghosttyper_types::{Effect, FieldId, SessionEvent, SuggestionRequest, TelemetryCounters};
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use crate::app::App;

/// Side-effectful commands executed outside of state updates.
#[derive(Debug)]
pub enum Cmd {
    /// Fetch a completion for a field's preceding text.
    FetchSuggestion { field: FieldId, request: SuggestionRequest },
    /// Report shown/accepted counters to the backend.
    FlushTelemetry(TelemetryCounters),
}

/// Apply local effects to the app and translate the rest into commands.
pub fn from_effects(app: &mut App, effects: Vec<Effect>) -> Vec<Cmd> {
    let mut commands = Vec::new();
    for effect in effects {
        match effect {
            Effect::ShowOverlay(suggestion) => app.overlay = Some(suggestion),
            Effect::HideOverlay => app.overlay = None,
            Effect::ApplyEdit { field, text, caret } => {
                if let Some(field) = app.field_mut(field) {
                    field.input.adopt(text, caret);
                }
            }
            Effect::RequestSuggestion { field, request } => {
                commands.push(Cmd::FetchSuggestion { field, request });
            }
            Effect::FlushTelemetry(counters) => commands.push(Cmd::FlushTelemetry(counters)),
        }
    }
    commands
}

/// Spawn the network commands; results come back over `events`.
pub fn run_cmds(commands: Vec<Cmd>, client: &BackendClient, events: &UnboundedSender<SessionEvent>) {
    for command in commands {
        match command {
            Cmd::FetchSuggestion { field, request } => {
                let client = client.clone();
                let events = events.clone();
                tokio::spawn(async move {
                    let result = client
                        .generate(&request.preceding_text, request.profile_id.as_deref())
                        .await;
                    let _ = events.send(SessionEvent::SuggestionResolved {
                        field,
                        seq: request.seq,
                        result,
                    });
                });
            }
            Cmd::FlushTelemetry(counters) => {
                let client = client.clone();
                let events = events.clone();
                tokio::spawn(async move {
                    let report = TelemetryReport {
                        suggestions_shown: counters.shown,
                        suggestions_accepted: counters.accepted,
                    };
                    let ok = match client.flush_telemetry(report).await {
                        Ok(_) => true,
                        Err(error) => {
                            debug!(%error, "telemetry flush failed; counts retained");
                            false
                        }
                    };
                    let _ = events.send(SessionEvent::TelemetryFlushed { ok });
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ghosttyper_types::{SessionSettings, Suggestion};

    #[test]
    fn local_effects_mutate_the_app() {
        let mut app = App::new(SessionSettings::default(), None);
        let id = app.fields[0].id;

        let suggestion = Suggestion {
            text: " there".into(),
            field: id,
            anchor_caret: 0,
            anchor_text_len: 0,
        };
        let commands = from_effects(&mut app, vec![Effect::ShowOverlay(suggestion.clone())]);
        assert!(commands.is_empty());
        assert_eq!(app.overlay.as_ref().unwrap().text, " there");

        from_effects(
            &mut app,
            vec![
                Effect::HideOverlay,
                Effect::ApplyEdit {
                    field: id,
                    text: "hi there".into(),
                    caret: 8,
                },
            ],
        );
        assert!(app.overlay.is_none());
        assert_eq!(app.fields[0].input.text(), "hi there");
        assert_eq!(app.fields[0].input.cursor(), 8);
    }

    #[test]
    fn network_effects_become_commands() {
        let mut app = App::new(SessionSettings::default(), None);
        let id = app.fields[0].id;
        let commands = from_effects(
            &mut app,
            vec![
                Effect::RequestSuggestion {
                    field: id,
                    request: SuggestionRequest {
                        preceding_text: "abc".into(),
                        profile_id: None,
                        seq: 1,
                    },
                },
                Effect::FlushTelemetry(TelemetryCounters { shown: 1, accepted: 0 }),
            ],
        );
        assert_eq!(commands.len(), 2);
        assert!(matches!(commands[0], Cmd::FetchSuggestion { .. }));
        assert!(matches!(commands[1], Cmd::FlushTelemetry(_)));
    }
}
