//! The GhostTyper suggestion session engine.
//!
//! A pure, single-threaded state machine: the host surface feeds it
//! [`SessionEvent`]s (edits, focus changes, key presses, resolved network
//! calls, clock ticks) through one dispatcher, and it answers with
//! [`Effect`]s for the host runtime to execute (issue a request, show or
//! hide the overlay, splice accepted text, flush telemetry). The engine
//! performs no I/O of its own, which keeps every behavior in this crate
//! testable with a scripted clock and canned responses.
//!
//! [`SessionEvent`]: ghosttyper_types::SessionEvent
//! [`Effect`]: ghosttyper_types::Effect

pub mod context;
pub mod debounce;
pub mod locator;
pub mod session;

pub use debounce::DebounceTimer;
pub use locator::{FieldRegistry, classify};
pub use session::{SessionState, SuggestionSession};
