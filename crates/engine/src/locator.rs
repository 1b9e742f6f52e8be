//! Field discovery and tracking.
//!
//! The classifier turns a raw [`FieldDescriptor`] into one of the
//! [`FieldKind`] variants or nothing at all; everything downstream switches
//! on the variant and never re-inspects descriptor shape. The registry
//! tracks eligible fields across repeated surface scans without ever
//! double-registering, and turns operations on detached fields into no-ops
//! rather than failures.

use std::collections::HashMap;

use ghosttyper_types::{FieldDescriptor, FieldId, FieldKind, FieldRole};
use tracing::debug;

/// Input types eligible for suggestions. Password inputs are excluded.
const ELIGIBLE_INPUT_TYPES: &[&str] = &["text", "search", "email", "url", "tel", "number"];

/// Classify a descriptor into a field kind, or `None` when ineligible.
pub fn classify(descriptor: &FieldDescriptor) -> Option<FieldKind> {
    match descriptor.role {
        FieldRole::Input => {
            let input_type = descriptor.input_type.as_deref().unwrap_or("text");
            ELIGIBLE_INPUT_TYPES
                .iter()
                .any(|t| input_type.eq_ignore_ascii_case(t))
                .then_some(FieldKind::SingleLineInput)
        }
        FieldRole::TextArea => Some(FieldKind::MultiLineInput),
        FieldRole::Editable => descriptor.editable.then_some(FieldKind::RichText),
    }
}

/// One tracked field: its kind plus the engine's mirror of text and caret.
#[derive(Debug, Clone)]
pub struct TrackedField {
    pub kind: FieldKind,
    pub text: String,
    /// Byte offset of the caret into `text`.
    pub caret: usize,
    /// Cleared when the field is removed from the surface; the entry stays
    /// so later operations on the id degrade to no-ops.
    pub attached: bool,
}

impl TrackedField {
    fn new(kind: FieldKind) -> Self {
        Self {
            kind,
            text: String::new(),
            caret: 0,
            attached: true,
        }
    }
}

/// The set of fields the session knows about.
#[derive(Debug, Default)]
pub struct FieldRegistry {
    fields: HashMap<FieldId, TrackedField>,
}

impl FieldRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan the surface's current fields, tracking newly eligible ones.
    ///
    /// Already-tracked ids are left untouched, so repeated scans (the
    /// mutation-observer analogue) never double-attach. Returns how many
    /// fields were newly tracked.
    pub fn scan(&mut self, surface: &[(FieldId, FieldDescriptor)]) -> usize {
        let mut added = 0;
        for (id, descriptor) in surface {
            if self.fields.contains_key(id) {
                continue;
            }
            if let Some(kind) = classify(descriptor) {
                self.fields.insert(*id, TrackedField::new(kind));
                added += 1;
            }
        }
        if added > 0 {
            debug!(added, total = self.fields.len(), "tracking new fields");
        }
        added
    }

    /// Mark a field as removed from the surface.
    pub fn detach(&mut self, id: FieldId) {
        if let Some(field) = self.fields.get_mut(&id) {
            field.attached = false;
        }
    }

    /// The field, if tracked and still attached.
    pub fn get_attached(&self, id: FieldId) -> Option<&TrackedField> {
        self.fields.get(&id).filter(|f| f.attached)
    }

    /// Record an edit into the mirror. Returns `false` (a no-op) for
    /// unknown or detached fields.
    pub fn record_edit(&mut self, id: FieldId, text: String, caret: usize) -> bool {
        match self.fields.get_mut(&id) {
            Some(field) if field.attached => {
                field.caret = caret.min(text.len());
                field.text = text;
                true
            }
            _ => false,
        }
    }

    /// Move the mirror caret without a content change. No-op for unknown
    /// or detached fields.
    pub fn record_caret(&mut self, id: FieldId, caret: usize) -> bool {
        match self.fields.get_mut(&id) {
            Some(field) if field.attached => {
                field.caret = caret.min(field.text.len());
                true
            }
            _ => false,
        }
    }

    pub fn is_tracked(&self, id: FieldId) -> bool {
        self.fields.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
