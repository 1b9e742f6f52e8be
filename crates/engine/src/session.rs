//! The suggestion session: one dispatcher, one state machine.
//!
//! A [`SuggestionSession`] is created once per surface (page load analogue)
//! and owns everything the pipeline needs: the field registry, the debounce
//! timer, per-field request sequencing, the Idle/Shown acceptance state
//! machine, and the telemetry counters. All events route through
//! [`SuggestionSession::handle`]; state transitions happen there and
//! nowhere else, and side effects are only ever *described* in the returned
//! [`Outcome`].
//!
//! Invariants upheld here:
//! - at most one suggestion is visible across the whole surface;
//! - a suggestion is only rendered when its sequence number is the latest
//!   issued for its field and that field still holds focus;
//! - acceptance splices at the caret recorded at render time, clamped to
//!   the current text length.

use std::collections::HashMap;
use std::time::Instant;

use ghosttyper_types::{
    Caret, Effect, FieldId, Key, KeyInput, Outcome, SessionEvent, SessionSettings, SuggestError, Suggestion, SuggestionRequest,
    TelemetryCounters,
};
use ghosttyper_util::{has_min_context, origin_is_blocked, preceding_text};
use tracing::debug;

use crate::context::resolve_caret;
use crate::debounce::DebounceTimer;
use crate::locator::FieldRegistry;

/// Acceptance-controller state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// No suggestion shown.
    Idle,
    /// A suggestion is visible and bound to a field plus text snapshot.
    Shown(Suggestion),
}

/// The per-surface suggestion session.
#[derive(Debug)]
pub struct SuggestionSession {
    settings: SessionSettings,
    registry: FieldRegistry,
    focused: Option<FieldId>,
    debounce: DebounceTimer,
    state: SessionState,
    /// Next sequence number to issue.
    next_seq: u64,
    /// Latest issued sequence number per field; older responses are stale.
    latest_seq: HashMap<FieldId, u64>,
    counters: TelemetryCounters,
    /// Snapshot handed to an in-flight flush, subtracted on confirmation.
    pending_flush: Option<TelemetryCounters>,
    /// Whether this surface's origin is on the block-list.
    blocked: bool,
}

impl SuggestionSession {
    /// Create a session for a surface with the given origin (if any).
    pub fn new(settings: SessionSettings, origin: Option<&str>) -> Self {
        let blocked = origin.is_some_and(|o| origin_is_blocked(o, &settings.blocked_origins));
        let debounce = DebounceTimer::new(settings.trigger_delay);
        Self {
            settings,
            registry: FieldRegistry::new(),
            focused: None,
            debounce,
            state: SessionState::Idle,
            next_seq: 0,
            latest_seq: HashMap::new(),
            counters: TelemetryCounters::default(),
            pending_flush: None,
            blocked,
        }
    }

    // ===== Selectors =====

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_shown(&self) -> bool {
        matches!(self.state, SessionState::Shown(_))
    }

    /// The currently visible suggestion, if any.
    pub fn suggestion(&self) -> Option<&Suggestion> {
        match &self.state {
            SessionState::Shown(suggestion) => Some(suggestion),
            SessionState::Idle => None,
        }
    }

    pub fn counters(&self) -> TelemetryCounters {
        self.counters
    }

    pub fn focused(&self) -> Option<FieldId> {
        self.focused
    }

    pub fn registry(&self) -> &FieldRegistry {
        &self.registry
    }

    /// Whether this session will ever issue requests.
    pub fn is_active(&self) -> bool {
        self.settings.enabled && !self.blocked
    }

    /// Whether the quiet-period timer is armed and waiting for a tick.
    pub fn pending_trigger(&self) -> bool {
        self.debounce.is_pending()
    }

    // ===== Dispatcher =====

    /// Route one event through the state machine.
    pub fn handle(&mut self, event: SessionEvent, now: Instant) -> Outcome {
        match event {
            SessionEvent::SurfaceChanged(surface) => {
                self.registry.scan(&surface);
                Outcome::none()
            }
            SessionEvent::FieldDetached(field) => self.on_field_detached(field),
            SessionEvent::FocusGained(field) => self.on_focus_gained(field),
            SessionEvent::Blur => self.on_blur(),
            SessionEvent::Edit { field, text, caret } => self.on_edit(field, text, caret, now),
            SessionEvent::CaretMoved { field, caret } => self.on_caret_moved(field, caret),
            SessionEvent::Click => self.dismiss_and_cancel(),
            SessionEvent::KeyPress(key) => self.on_key(key, now),
            SessionEvent::Tick => self.on_tick(now),
            SessionEvent::SuggestionResolved { field, seq, result } => self.on_resolved(field, seq, result),
            SessionEvent::TelemetryTick => self.on_telemetry_tick(),
            SessionEvent::TelemetryFlushed { ok } => self.on_telemetry_flushed(ok),
        }
    }

    // ===== Event handlers =====

    fn on_field_detached(&mut self, field: FieldId) -> Outcome {
        self.registry.detach(field);
        if self.suggestion().is_some_and(|s| s.field == field) {
            return self.dismiss_and_cancel();
        }
        Outcome::none()
    }

    fn on_focus_gained(&mut self, field: FieldId) -> Outcome {
        self.focused = Some(field);
        // A suggestion bound to any other field is stale by definition.
        if self.suggestion().is_some_and(|s| s.field != field) {
            return self.dismiss_and_cancel();
        }
        Outcome::none()
    }

    fn on_blur(&mut self) -> Outcome {
        self.focused = None;
        self.dismiss_and_cancel()
    }

    fn on_edit(&mut self, field: FieldId, text: String, caret: Caret, now: Instant) -> Outcome {
        if !self.is_active() {
            return Outcome::none();
        }
        let Some(kind) = self.registry.get_attached(field).map(|f| f.kind) else {
            return Outcome::none();
        };
        let at = resolve_caret(kind, &text, caret);
        self.registry.record_edit(field, text, at);
        self.focused = Some(field);

        // A further qualifying edit dismisses before the timer restarts.
        let effects = self.dismiss_effects();
        self.debounce.trigger(now);
        Outcome::effects(effects)
    }

    fn on_caret_moved(&mut self, field: FieldId, caret: Caret) -> Outcome {
        if let Some(tracked) = self.registry.get_attached(field) {
            let at = resolve_caret(tracked.kind, &tracked.text, caret);
            self.registry.record_caret(field, at);
        }
        self.dismiss_and_cancel()
    }

    fn on_key(&mut self, key: KeyInput, now: Instant) -> Outcome {
        match &self.state {
            SessionState::Shown(_) if key.is_accept() => self.accept(now),
            SessionState::Shown(_) => match key.key {
                // Escape is swallowed; it exists only to dismiss.
                Key::Escape => {
                    let Outcome { effects, .. } = self.dismiss_and_cancel();
                    Outcome::consumed(effects)
                }
                // Caret movement and Enter dismiss but keep their default
                // behavior in the host.
                Key::ArrowUp | Key::ArrowDown | Key::ArrowLeft | Key::ArrowRight | Key::Enter => self.dismiss_and_cancel(),
                _ => Outcome::none(),
            },
            SessionState::Idle => match key.key {
                // Arrow keys cancel a pending trigger even with nothing shown.
                Key::ArrowUp | Key::ArrowDown | Key::ArrowLeft | Key::ArrowRight => {
                    self.debounce.cancel();
                    Outcome::none()
                }
                // The accept key passes through untouched while idle.
                _ => Outcome::none(),
            },
        }
    }

    fn on_tick(&mut self, now: Instant) -> Outcome {
        if !self.debounce.fire_if_due(now) {
            return Outcome::none();
        }
        let Some(field) = self.focused else {
            return Outcome::none();
        };
        let Some(tracked) = self.registry.get_attached(field) else {
            return Outcome::none();
        };

        let preceding = preceding_text(&tracked.text, tracked.caret);
        if !has_min_context(preceding) {
            debug!(%field, "insufficient context; skipping request");
            return Outcome::effects(self.dismiss_effects());
        }

        self.next_seq += 1;
        let seq = self.next_seq;
        self.latest_seq.insert(field, seq);
        Outcome::effects(vec![Effect::RequestSuggestion {
            field,
            request: SuggestionRequest {
                preceding_text: preceding.to_string(),
                profile_id: self.settings.profile_id.clone(),
                seq,
            },
        }])
    }

    fn on_resolved(&mut self, field: FieldId, seq: u64, result: Result<String, SuggestError>) -> Outcome {
        if self.latest_seq.get(&field) != Some(&seq) {
            debug!(%field, seq, "dropping stale response");
            return Outcome::none();
        }
        if self.focused != Some(field) {
            debug!(%field, "field no longer focused; dropping response");
            return Outcome::none();
        }
        let Some(tracked) = self.registry.get_attached(field) else {
            return Outcome::none();
        };

        let text = match result {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => return Outcome::none(),
            Err(error) => {
                debug!(%field, %error, "suggestion request failed");
                return Outcome::none();
            }
        };

        let suggestion = Suggestion {
            text,
            field,
            anchor_caret: tracked.caret,
            anchor_text_len: tracked.text.len(),
        };
        self.state = SessionState::Shown(suggestion.clone());
        self.counters.shown += 1;
        // Showing replaces any previous overlay content wholesale.
        Outcome::effects(vec![Effect::ShowOverlay(suggestion)])
    }

    fn on_telemetry_tick(&mut self) -> Outcome {
        if self.counters.is_empty() || self.pending_flush.is_some() {
            return Outcome::none();
        }
        let snapshot = self.counters;
        self.pending_flush = Some(snapshot);
        Outcome::effects(vec![Effect::FlushTelemetry(snapshot)])
    }

    fn on_telemetry_flushed(&mut self, ok: bool) -> Outcome {
        let Some(flushed) = self.pending_flush.take() else {
            return Outcome::none();
        };
        if ok {
            // Subtract the confirmed snapshot; anything recorded while the
            // flush was in flight survives for the next interval.
            self.counters.shown = self.counters.shown.saturating_sub(flushed.shown);
            self.counters.accepted = self.counters.accepted.saturating_sub(flushed.accepted);
        }
        Outcome::none()
    }

    // ===== Transitions =====

    /// Accept the visible suggestion: splice at the anchored caret, move
    /// the caret to the end of the inserted text, and re-arm the debounce
    /// as the synthetic edit notification.
    fn accept(&mut self, now: Instant) -> Outcome {
        let SessionState::Shown(suggestion) = std::mem::replace(&mut self.state, SessionState::Idle) else {
            return Outcome::none();
        };
        let Some(tracked) = self.registry.get_attached(suggestion.field) else {
            return Outcome::consumed(vec![Effect::HideOverlay]);
        };

        let current = tracked.text.clone();
        // The anchor may exceed the current length if another writer
        // changed the field between render and key press; clamp, and snap
        // back to a UTF-8 boundary.
        let mut at = suggestion.anchor_caret.min(current.len());
        while at > 0 && !current.is_char_boundary(at) {
            at -= 1;
        }

        let mut spliced = String::with_capacity(current.len() + suggestion.text.len());
        spliced.push_str(&current[..at]);
        spliced.push_str(&suggestion.text);
        spliced.push_str(&current[at..]);
        let caret = at + suggestion.text.len();

        self.registry.record_edit(suggestion.field, spliced.clone(), caret);
        self.counters.accepted += 1;
        // The synthetic edit notification: downstream observers get the
        // ApplyEdit, and the session itself treats the splice as a fresh
        // qualifying edit so a follow-up suggestion can be requested.
        self.debounce.trigger(now);

        Outcome::consumed(vec![
            Effect::HideOverlay,
            Effect::ApplyEdit {
                field: suggestion.field,
                text: spliced,
                caret,
            },
        ])
    }

    /// Hide the overlay (if shown) and cancel any pending trigger.
    fn dismiss_and_cancel(&mut self) -> Outcome {
        self.debounce.cancel();
        Outcome::effects(self.dismiss_effects())
    }

    fn dismiss_effects(&mut self) -> Vec<Effect> {
        if matches!(self.state, SessionState::Shown(_)) {
            self.state = SessionState::Idle;
            vec![Effect::HideOverlay]
        } else {
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ghosttyper_types::{FieldDescriptor, SessionEvent};
    use std::time::Duration;

    const DELAY: Duration = Duration::from_millis(400);

    fn field(n: u64) -> FieldId {
        FieldId(n)
    }

    fn session() -> (SuggestionSession, Instant) {
        let settings = SessionSettings {
            trigger_delay: DELAY,
            ..SessionSettings::default()
        };
        let mut s = SuggestionSession::new(settings, None);
        s.handle(
            SessionEvent::SurfaceChanged(vec![
                (field(1), FieldDescriptor::text_area()),
                (field(2), FieldDescriptor::input("text")),
            ]),
            Instant::now(),
        );
        (s, Instant::now())
    }

    fn edit(s: &mut SuggestionSession, id: FieldId, text: &str, now: Instant) -> Vec<Effect> {
        s.handle(
            SessionEvent::Edit {
                field: id,
                text: text.to_string(),
                caret: Caret::Offset(text.len()),
            },
            now,
        )
        .effects
    }

    fn tick(s: &mut SuggestionSession, now: Instant) -> Vec<Effect> {
        s.handle(SessionEvent::Tick, now).effects
    }

    fn request_of(effects: &[Effect]) -> Option<SuggestionRequest> {
        effects.iter().find_map(|e| match e {
            Effect::RequestSuggestion { request, .. } => Some(request.clone()),
            _ => None,
        })
    }

    fn resolve(s: &mut SuggestionSession, id: FieldId, seq: u64, text: &str, now: Instant) -> Vec<Effect> {
        s.handle(
            SessionEvent::SuggestionResolved {
                field: id,
                seq,
                result: Ok(text.to_string()),
            },
            now,
        )
        .effects
    }

    #[test]
    fn typing_then_quiet_period_issues_exactly_one_request() {
        let (mut s, t0) = session();
        s.handle(SessionEvent::FocusGained(field(1)), t0);
        edit(&mut s, field(1), "I am writing to", t0);

        assert!(tick(&mut s, t0 + Duration::from_millis(100)).is_empty());
        let effects = tick(&mut s, t0 + DELAY);
        let request = request_of(&effects).expect("one request issued");
        assert_eq!(request.preceding_text, "I am writing to");
        // The deadline is consumed; further ticks stay silent.
        assert!(tick(&mut s, t0 + Duration::from_secs(2)).is_empty());
    }

    #[test]
    fn rapid_edits_only_request_the_final_context() {
        let (mut s, t0) = session();
        s.handle(SessionEvent::FocusGained(field(1)), t0);
        edit(&mut s, field(1), "hel", t0);
        edit(&mut s, field(1), "hell", t0 + Duration::from_millis(150));
        edit(&mut s, field(1), "hello", t0 + Duration::from_millis(300));

        // The first two deadlines were superseded.
        assert!(tick(&mut s, t0 + DELAY).is_empty());
        let effects = tick(&mut s, t0 + Duration::from_millis(300) + DELAY);
        assert_eq!(request_of(&effects).unwrap().preceding_text, "hello");
    }

    #[test]
    fn context_below_minimum_never_reaches_the_network() {
        let (mut s, t0) = session();
        s.handle(SessionEvent::FocusGained(field(1)), t0);
        edit(&mut s, field(1), "Hi", t0);
        assert!(request_of(&tick(&mut s, t0 + DELAY)).is_none());
    }

    #[test]
    fn preceding_text_is_strictly_before_the_caret() {
        let (mut s, t0) = session();
        s.handle(SessionEvent::FocusGained(field(1)), t0);
        s.handle(
            SessionEvent::Edit {
                field: field(1),
                text: "hello world".into(),
                caret: Caret::Offset(5),
            },
            t0,
        );
        let effects = tick(&mut s, t0 + DELAY);
        assert_eq!(request_of(&effects).unwrap().preceding_text, "hello");
    }

    #[test]
    fn only_the_latest_sequence_number_renders() {
        let (mut s, t0) = session();
        s.handle(SessionEvent::FocusGained(field(1)), t0);

        edit(&mut s, field(1), "first", t0);
        let first = request_of(&tick(&mut s, t0 + DELAY)).unwrap();

        let t1 = t0 + DELAY + Duration::from_millis(50);
        edit(&mut s, field(1), "first second", t1);
        let second = request_of(&tick(&mut s, t1 + DELAY)).unwrap();
        assert!(second.seq > first.seq);

        // The newer request resolves first and renders.
        let effects = resolve(&mut s, field(1), second.seq, " third", t1 + DELAY);
        assert!(matches!(effects.as_slice(), [Effect::ShowOverlay(_)]));

        // The older one arrives late and is dropped; the overlay stays.
        let stale = resolve(&mut s, field(1), first.seq, " stale", t1 + DELAY);
        assert!(stale.is_empty());
        assert_eq!(s.suggestion().unwrap().text, " third");
        assert_eq!(s.counters().shown, 1);
    }

    #[test]
    fn response_after_focus_left_the_field_is_dropped() {
        let (mut s, t0) = session();
        s.handle(SessionEvent::FocusGained(field(1)), t0);
        edit(&mut s, field(1), "greetings", t0);
        let request = request_of(&tick(&mut s, t0 + DELAY)).unwrap();

        s.handle(SessionEvent::FocusGained(field(2)), t0 + DELAY);
        assert!(resolve(&mut s, field(1), request.seq, " friend", t0 + DELAY).is_empty());
        assert!(!s.is_shown());
    }

    #[test]
    fn failed_and_empty_results_show_nothing() {
        let (mut s, t0) = session();
        s.handle(SessionEvent::FocusGained(field(1)), t0);
        edit(&mut s, field(1), "greetings", t0);
        let request = request_of(&tick(&mut s, t0 + DELAY)).unwrap();

        let effects = s
            .handle(
                SessionEvent::SuggestionResolved {
                    field: field(1),
                    seq: request.seq,
                    result: Err(SuggestError::NetworkFailure("timed out".into())),
                },
                t0 + DELAY,
            )
            .effects;
        assert!(effects.is_empty());

        // Same request id again with a whitespace-only body.
        assert!(resolve(&mut s, field(1), request.seq, "   ", t0 + DELAY).is_empty());
        assert!(!s.is_shown());
        assert_eq!(s.counters().shown, 0);
    }

    #[test]
    fn accept_splices_and_moves_the_caret() {
        let (mut s, t0) = session();
        s.handle(SessionEvent::FocusGained(field(1)), t0);
        edit(&mut s, field(1), "I am writing to", t0);
        let request = request_of(&tick(&mut s, t0 + DELAY)).unwrap();
        resolve(&mut s, field(1), request.seq, " say hello", t0 + DELAY);

        let outcome = s.handle(SessionEvent::KeyPress(KeyInput::plain(Key::Tab)), t0 + DELAY);
        assert!(outcome.consumed);
        let applied = outcome.effects.iter().find_map(|e| match e {
            Effect::ApplyEdit { text, caret, .. } => Some((text.clone(), *caret)),
            _ => None,
        });
        let (text, caret) = applied.expect("accept applies an edit");
        assert_eq!(text, "I am writing to say hello");
        assert_eq!(caret, "I am writing to say hello".len());
        assert_eq!(s.counters().accepted, 1);
        assert_eq!(s.counters().shown, 1);
        assert!(!s.is_shown());
    }

    #[test]
    fn accept_with_caret_mid_text_preserves_the_tail() {
        let (mut s, t0) = session();
        s.handle(SessionEvent::FocusGained(field(1)), t0);
        s.handle(
            SessionEvent::Edit {
                field: field(1),
                text: "before after".into(),
                caret: Caret::Offset(6),
            },
            t0,
        );
        let request = request_of(&tick(&mut s, t0 + DELAY)).unwrap();
        resolve(&mut s, field(1), request.seq, "now ", t0 + DELAY);

        let outcome = s.handle(SessionEvent::KeyPress(KeyInput::plain(Key::Tab)), t0 + DELAY);
        let applied = outcome.effects.iter().find_map(|e| match e {
            Effect::ApplyEdit { text, caret, .. } => Some((text.clone(), *caret)),
            _ => None,
        });
        let (text, caret) = applied.unwrap();
        assert_eq!(text, "before now after");
        assert_eq!(caret, "before now ".len());
    }

    #[test]
    fn accept_clamps_a_stale_anchor() {
        let (mut s, t0) = session();
        s.handle(SessionEvent::FocusGained(field(1)), t0);
        edit(&mut s, field(1), "some long context", t0);
        let request = request_of(&tick(&mut s, t0 + DELAY)).unwrap();
        resolve(&mut s, field(1), request.seq, " tail", t0 + DELAY);

        // Another writer truncated the field between render and key press;
        // shrink the mirror without going through the dismissal path.
        s.registry.record_edit(field(1), "tiny".into(), 4);

        let outcome = s.handle(SessionEvent::KeyPress(KeyInput::plain(Key::Tab)), t0 + DELAY);
        let applied = outcome.effects.iter().find_map(|e| match e {
            Effect::ApplyEdit { text, .. } => Some(text.clone()),
            _ => None,
        });
        assert_eq!(applied.unwrap(), "tiny tail");
    }

    #[test]
    fn tab_with_modifiers_is_not_an_accept() {
        let (mut s, t0) = session();
        s.handle(SessionEvent::FocusGained(field(1)), t0);
        edit(&mut s, field(1), "greetings", t0);
        let request = request_of(&tick(&mut s, t0 + DELAY)).unwrap();
        resolve(&mut s, field(1), request.seq, " all", t0 + DELAY);

        let shifted = KeyInput {
            shift: true,
            ..KeyInput::plain(Key::Tab)
        };
        let outcome = s.handle(SessionEvent::KeyPress(shifted), t0 + DELAY);
        assert!(!outcome.consumed);
        assert!(s.is_shown());
    }

    #[test]
    fn tab_while_idle_passes_through() {
        let (mut s, t0) = session();
        let outcome = s.handle(SessionEvent::KeyPress(KeyInput::plain(Key::Tab)), t0);
        assert!(!outcome.consumed);
        assert!(outcome.effects.is_empty());
    }

    #[test]
    fn dismissal_variants_leave_content_unchanged() {
        for dismissal in [
            SessionEvent::KeyPress(KeyInput::plain(Key::Escape)),
            SessionEvent::KeyPress(KeyInput::plain(Key::ArrowLeft)),
            SessionEvent::KeyPress(KeyInput::plain(Key::Enter)),
            SessionEvent::Blur,
            SessionEvent::Click,
        ] {
            let (mut s, t0) = session();
            s.handle(SessionEvent::FocusGained(field(1)), t0);
            edit(&mut s, field(1), "greetings", t0);
            let request = request_of(&tick(&mut s, t0 + DELAY)).unwrap();
            resolve(&mut s, field(1), request.seq, " all", t0 + DELAY);

            let effects = s.handle(dismissal.clone(), t0 + DELAY).effects;
            assert!(
                effects.contains(&Effect::HideOverlay),
                "dismissal {dismissal:?} hides the overlay"
            );
            assert!(!effects.iter().any(|e| matches!(e, Effect::ApplyEdit { .. })));
            assert!(!s.is_shown());
            assert_eq!(s.registry().get_attached(field(1)).unwrap().text, "greetings");
            assert_eq!(s.counters().accepted, 0);
            assert_eq!(s.counters().shown, 1);
        }
    }

    #[test]
    fn a_new_edit_dismisses_the_visible_suggestion() {
        let (mut s, t0) = session();
        s.handle(SessionEvent::FocusGained(field(1)), t0);
        edit(&mut s, field(1), "greetings", t0);
        let request = request_of(&tick(&mut s, t0 + DELAY)).unwrap();
        resolve(&mut s, field(1), request.seq, " all", t0 + DELAY);

        let effects = edit(&mut s, field(1), "greetings!", t0 + DELAY);
        assert!(effects.contains(&Effect::HideOverlay));
        assert!(!s.is_shown());
    }

    #[test]
    fn detached_field_edits_are_no_ops() {
        let (mut s, t0) = session();
        s.handle(SessionEvent::FocusGained(field(1)), t0);
        s.handle(SessionEvent::FieldDetached(field(1)), t0);
        assert!(edit(&mut s, field(1), "typed into a ghost", t0).is_empty());
        assert!(tick(&mut s, t0 + DELAY).is_empty());
    }

    #[test]
    fn disabled_session_ignores_edits() {
        let settings = SessionSettings {
            enabled: false,
            ..SessionSettings::default()
        };
        let mut s = SuggestionSession::new(settings, None);
        let t0 = Instant::now();
        s.handle(
            SessionEvent::SurfaceChanged(vec![(field(1), FieldDescriptor::text_area())]),
            t0,
        );
        s.handle(SessionEvent::FocusGained(field(1)), t0);
        assert!(edit(&mut s, field(1), "plenty of context", t0).is_empty());
        assert!(tick(&mut s, t0 + DELAY).is_empty());
    }

    #[test]
    fn blocked_origin_disables_the_session() {
        let settings = SessionSettings {
            blocked_origins: vec!["*.bank.com".into()],
            ..SessionSettings::default()
        };
        let s = SuggestionSession::new(settings.clone(), Some("secure.bank.com"));
        assert!(!s.is_active());
        let s = SuggestionSession::new(settings, Some("blog.example.com"));
        assert!(s.is_active());
    }

    #[test]
    fn rich_text_without_selection_requests_nothing() {
        let settings = SessionSettings::default();
        let mut s = SuggestionSession::new(settings, None);
        let t0 = Instant::now();
        s.handle(
            SessionEvent::SurfaceChanged(vec![(field(7), FieldDescriptor::editable(true))]),
            t0,
        );
        s.handle(SessionEvent::FocusGained(field(7)), t0);
        s.handle(
            SessionEvent::Edit {
                field: field(7),
                text: "plenty of rich text".into(),
                caret: Caret::SelectionEnd(None),
            },
            t0,
        );
        assert!(request_of(&s.handle(SessionEvent::Tick, t0 + DELAY).effects).is_none());
    }

    #[test]
    fn telemetry_flush_resets_only_on_confirmation() {
        let (mut s, t0) = session();
        s.handle(SessionEvent::FocusGained(field(1)), t0);
        edit(&mut s, field(1), "greetings", t0);
        let request = request_of(&tick(&mut s, t0 + DELAY)).unwrap();
        resolve(&mut s, field(1), request.seq, " all", t0 + DELAY);
        s.handle(SessionEvent::KeyPress(KeyInput::plain(Key::Tab)), t0 + DELAY);

        let effects = s.handle(SessionEvent::TelemetryTick, t0).effects;
        assert_eq!(
            effects,
            vec![Effect::FlushTelemetry(TelemetryCounters { shown: 1, accepted: 1 })]
        );

        // Failure retains the counts for the next interval.
        s.handle(SessionEvent::TelemetryFlushed { ok: false }, t0);
        assert_eq!(s.counters(), TelemetryCounters { shown: 1, accepted: 1 });

        // Success clears exactly what was flushed.
        let effects = s.handle(SessionEvent::TelemetryTick, t0).effects;
        assert_eq!(effects.len(), 1);
        s.handle(SessionEvent::TelemetryFlushed { ok: true }, t0);
        assert!(s.counters().is_empty());

        // Nothing to send means no flush effect at all.
        assert!(s.handle(SessionEvent::TelemetryTick, t0).effects.is_empty());
    }

    #[test]
    fn counts_recorded_during_a_flush_survive_confirmation() {
        let (mut s, t0) = session();
        s.handle(SessionEvent::FocusGained(field(1)), t0);
        edit(&mut s, field(1), "greetings", t0);
        let request = request_of(&tick(&mut s, t0 + DELAY)).unwrap();
        resolve(&mut s, field(1), request.seq, " all", t0 + DELAY);

        s.handle(SessionEvent::TelemetryTick, t0);
        // Another suggestion is shown while the flush is in flight.
        let t1 = t0 + DELAY + Duration::from_millis(100);
        edit(&mut s, field(1), "greetings all,", t1);
        let request = request_of(&tick(&mut s, t1 + DELAY)).unwrap();
        resolve(&mut s, field(1), request.seq, " friends", t1 + DELAY);

        s.handle(SessionEvent::TelemetryFlushed { ok: true }, t1);
        assert_eq!(s.counters(), TelemetryCounters { shown: 1, accepted: 0 });
    }

    #[test]
    fn end_to_end_accept_scenario() {
        let (mut s, t0) = session();
        s.handle(SessionEvent::FocusGained(field(1)), t0);
        edit(&mut s, field(1), "I am writing to", t0);

        let request = request_of(&tick(&mut s, t0 + DELAY)).expect("request after the delay");
        assert_eq!(request.preceding_text, "I am writing to");

        let effects = resolve(&mut s, field(1), request.seq, " say hello", t0 + DELAY);
        let shown = effects.iter().find_map(|e| match e {
            Effect::ShowOverlay(suggestion) => Some(suggestion.clone()),
            _ => None,
        });
        assert_eq!(shown.unwrap().text, " say hello");

        let outcome = s.handle(SessionEvent::KeyPress(KeyInput::plain(Key::Tab)), t0 + DELAY);
        let (text, caret) = outcome
            .effects
            .iter()
            .find_map(|e| match e {
                Effect::ApplyEdit { text, caret, .. } => Some((text.clone(), *caret)),
                _ => None,
            })
            .unwrap();
        assert_eq!(text, "I am writing to say hello");
        assert_eq!(caret, text.len());
        assert_eq!(s.counters(), TelemetryCounters { shown: 1, accepted: 1 });
    }

    #[test]
    fn end_to_end_dismiss_scenario() {
        let (mut s, t0) = session();
        s.handle(SessionEvent::FocusGained(field(1)), t0);
        edit(&mut s, field(1), "I am writing to", t0);
        let request = request_of(&tick(&mut s, t0 + DELAY)).unwrap();
        resolve(&mut s, field(1), request.seq, " say hello", t0 + DELAY);

        let outcome = s.handle(SessionEvent::KeyPress(KeyInput::plain(Key::Escape)), t0 + DELAY);
        assert!(outcome.consumed);
        assert_eq!(outcome.effects, vec![Effect::HideOverlay]);
        assert_eq!(s.registry().get_attached(field(1)).unwrap().text, "I am writing to");
        assert_eq!(s.counters(), TelemetryCounters { shown: 1, accepted: 0 });
    }
}
