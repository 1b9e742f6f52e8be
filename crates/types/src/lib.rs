//! Shared type definitions for GhostTyper.
//!
//! Everything that crosses a crate boundary lives here: the editable-field
//! model consumed by the locator, the suggestion/session event vocabulary
//! exchanged between the engine and its host runtime, the telemetry
//! counters, and the typed failure taxonomy for the suggestion path.

use std::error::Error as StdError;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub mod wire;

/// Opaque identifier for one editable field tracked by the session.
///
/// Ids are minted by the host surface and stay stable for the lifetime of
/// the field, including after it is detached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FieldId(pub u64);

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "field#{}", self.0)
    }
}

/// Classified kind of an editable field.
///
/// All downstream logic switches on this variant; nothing outside the
/// classifier re-inspects raw descriptor shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    /// A one-line text input (text, search, email, url, tel, number).
    SingleLineInput,
    /// A multi-line text area.
    MultiLineInput,
    /// A rich-text surface whose caret is derived from a selection.
    RichText,
}

/// Structural role a host surface reports for one of its fields, prior to
/// classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldRole {
    /// A single-line input control with a declared input type.
    Input,
    /// A multi-line text area control.
    TextArea,
    /// A free-form editable region.
    Editable,
}

/// What the host surface exposes about a field for eligibility checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub role: FieldRole,
    /// Declared input type for [`FieldRole::Input`] fields ("text",
    /// "email", "password", ...). `None` is treated as "text".
    #[serde(default)]
    pub input_type: Option<String>,
    /// Whether an [`FieldRole::Editable`] region currently allows editing.
    #[serde(default)]
    pub editable: bool,
}

impl FieldDescriptor {
    pub fn input(input_type: &str) -> Self {
        Self {
            role: FieldRole::Input,
            input_type: Some(input_type.to_string()),
            editable: false,
        }
    }

    pub fn text_area() -> Self {
        Self {
            role: FieldRole::TextArea,
            input_type: None,
            editable: false,
        }
    }

    pub fn editable(editable: bool) -> Self {
        Self {
            role: FieldRole::Editable,
            input_type: None,
            editable,
        }
    }
}

/// Caret description reported alongside a field's text.
///
/// Plain inputs report a byte offset into the text. Rich-text surfaces
/// report the character count from the start of the field to the end of the
/// active selection, or nothing at all when no selection exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Caret {
    /// Byte offset of the insertion point (always on a UTF-8 boundary).
    Offset(usize),
    /// Character count to the selection end point, when one exists.
    SelectionEnd(Option<usize>),
}

/// How a suggestion is presented to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresentationMode {
    /// Ghost text rendered immediately after the caret.
    #[default]
    Inline,
    /// A small floating box anchored below the caret.
    Popup,
    /// A fixed panel at the bottom of the surface.
    Panel,
}

impl FromStr for PresentationMode {
    type Err = ParsePresentationModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inline" => Ok(Self::Inline),
            "popup" => Ok(Self::Popup),
            "panel" => Ok(Self::Panel),
            _ => Err(ParsePresentationModeError),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsePresentationModeError;

impl fmt::Display for ParsePresentationModeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("invalid presentation mode; expected 'inline', 'popup', or 'panel'")
    }
}

impl StdError for ParsePresentationModeError {}

/// One outgoing completion request, created per debounce firing.
///
/// Immutable once built; a newer request for the same field supersedes it
/// via the sequence number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionRequest {
    /// Text strictly before the caret at the time the debounce fired.
    pub preceding_text: String,
    /// Opaque tone-profile id passed through to the backend, never
    /// interpreted by the core.
    pub profile_id: Option<String>,
    /// Monotonically increasing per-field sequence number.
    pub seq: u64,
}

/// A completion bound to the field it was produced for.
///
/// The caret offset and text length are snapshotted at render time so that
/// acceptance splices at the recorded position even if the field content
/// changed underneath.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub text: String,
    pub field: FieldId,
    /// Byte offset the suggestion was rendered at.
    pub anchor_caret: usize,
    /// Field text length at render time.
    pub anchor_text_len: usize,
}

/// Process-wide shown/accepted tallies, reset only on a confirmed flush.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryCounters {
    pub shown: u64,
    pub accepted: u64,
}

impl TelemetryCounters {
    pub fn is_empty(&self) -> bool {
        self.shown == 0 && self.accepted == 0
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Failure taxonomy for the suggestion path.
///
/// Every variant degrades to "no suggestion shown"; none is surfaced to the
/// end user as a visible error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SuggestError {
    /// Fewer than the minimum non-whitespace characters precede the caret.
    #[error("not enough context before the caret")]
    InputTooShort,
    /// Timeout or connection failure while reaching the backend.
    #[error("network failure: {0}")]
    NetworkFailure(String),
    /// Non-success HTTP status or a service-reported block.
    #[error("service error: {0}")]
    ServiceError(String),
    /// The response belongs to a superseded request.
    #[error("stale response discarded")]
    StaleResponse,
    /// The referenced tone profile does not exist; proceed without it.
    #[error("tone profile not found")]
    ProfileNotFound,
}

/// Key identity the session dispatcher cares about.
///
/// Hosts map their native key events onto this vocabulary so the engine
/// stays free of terminal/browser input types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Tab,
    Escape,
    Enter,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Char(char),
    Other,
}

/// A key press with its modifier state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyInput {
    pub key: Key,
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

impl KeyInput {
    pub fn plain(key: Key) -> Self {
        Self {
            key,
            shift: false,
            ctrl: false,
            alt: false,
        }
    }

    /// Tab with no modifier keys held, the designated accept chord.
    pub fn is_accept(&self) -> bool {
        self.key == Key::Tab && !self.shift && !self.ctrl && !self.alt
    }
}

/// Events routed through the single session dispatcher.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// The host surface gained or changed its set of fields; re-scan.
    SurfaceChanged(Vec<(FieldId, FieldDescriptor)>),
    /// A tracked field was removed from the surface.
    FieldDetached(FieldId),
    /// A field received focus.
    FocusGained(FieldId),
    /// The focused field lost focus.
    Blur,
    /// A qualifying edit: the field's full text and caret after the edit.
    Edit {
        field: FieldId,
        text: String,
        caret: Caret,
    },
    /// The caret moved without a content change (click or programmatic).
    CaretMoved { field: FieldId, caret: Caret },
    /// A pointer click anywhere on the surface.
    Click,
    /// A key press while the session may hold a visible suggestion.
    KeyPress(KeyInput),
    /// Periodic wall-clock tick; drives the debounce deadline.
    Tick,
    /// A completion request resolved (successfully or not).
    SuggestionResolved {
        field: FieldId,
        seq: u64,
        result: Result<String, SuggestError>,
    },
    /// The telemetry flush interval elapsed.
    TelemetryTick,
    /// A telemetry flush attempt finished.
    TelemetryFlushed { ok: bool },
}

/// Side effects the session asks its host runtime to perform.
///
/// The session itself never does I/O; the runtime executes these and feeds
/// results back as [`SessionEvent`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Issue a completion request for the given field.
    RequestSuggestion {
        field: FieldId,
        request: SuggestionRequest,
    },
    /// Render the suggestion as ghost text.
    ShowOverlay(Suggestion),
    /// Hide the shared overlay.
    HideOverlay,
    /// Adopt the spliced text and caret into the host widget.
    ApplyEdit {
        field: FieldId,
        text: String,
        caret: usize,
    },
    /// Send the counters to the backend.
    FlushTelemetry(TelemetryCounters),
}

/// Result of dispatching one event: the effects to execute, and whether the
/// triggering input was consumed by the session (relevant for key events,
/// where an unconsumed accept key must keep its default behavior).
#[derive(Debug, Default)]
pub struct Outcome {
    pub effects: Vec<Effect>,
    pub consumed: bool,
}

impl Outcome {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn effects(effects: Vec<Effect>) -> Self {
        Self {
            effects,
            consumed: false,
        }
    }

    pub fn consumed(effects: Vec<Effect>) -> Self {
        Self {
            effects,
            consumed: true,
        }
    }
}

/// Session-level configuration snapshot handed to the engine at
/// construction time.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Master switch; a disabled session ignores every edit.
    pub enabled: bool,
    /// Opaque tone-profile id forwarded with each request.
    pub profile_id: Option<String>,
    /// Quiet period after the last qualifying edit.
    pub trigger_delay: Duration,
    pub presentation: PresentationMode,
    /// Origin patterns (with `*` wildcards) for which suggestions are off.
    pub blocked_origins: Vec<String>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            profile_id: None,
            trigger_delay: Duration::from_millis(400),
            presentation: PresentationMode::Inline,
            blocked_origins: Vec::new(),
        }
    }
}
