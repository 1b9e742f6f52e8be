//! Application state for the compose TUI.
//!
//! The app owns the compose form (the "surface" of editable fields), the
//! suggestion session, and the shared overlay slot. Terminal events are
//! translated here into [`SessionEvent`]s; everything suggestion-related is
//! decided by the session, and the app only applies the effects it gets
//! back.

use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ghosttyper_engine::{SuggestionSession, classify};
use ghosttyper_types::{
    Caret, Effect, FieldDescriptor, FieldId, FieldKind, Key, KeyInput, PresentationMode, SessionEvent, SessionSettings, Suggestion,
};
use ratatui::layout::Rect;

use crate::input::TextInputState;

/// One field of the compose form.
#[derive(Debug)]
pub struct ComposeField {
    pub id: FieldId,
    pub label: String,
    pub descriptor: FieldDescriptor,
    /// Classifier outcome; `None` renders but never suggests.
    pub kind: Option<FieldKind>,
    pub input: TextInputState,
    /// Rows of editable text inside the border.
    pub content_height: u16,
    /// Inner area from the last render, for mouse hit-testing and overlay
    /// placement.
    pub area: Rect,
}

impl ComposeField {
    fn new(id: u64, label: &str, descriptor: FieldDescriptor, content_height: u16) -> Self {
        let kind = classify(&descriptor);
        Self {
            id: FieldId(id),
            label: label.to_string(),
            descriptor,
            kind,
            input: TextInputState::new(),
            content_height,
            area: Rect::default(),
        }
    }

    pub fn is_multi_line(&self) -> bool {
        self.kind == Some(FieldKind::MultiLineInput)
    }
}

/// Top-level state for the compose view.
pub struct App {
    pub fields: Vec<ComposeField>,
    pub focus_idx: usize,
    pub session: SuggestionSession,
    /// The single shared overlay; set and cleared only via effects.
    pub overlay: Option<Suggestion>,
    pub presentation: PresentationMode,
    pub should_quit: bool,
}

impl App {
    /// Build the compose form and its session, and register the surface.
    pub fn new(settings: SessionSettings, origin: Option<&str>) -> Self {
        let presentation = settings.presentation;
        let fields = vec![
            ComposeField::new(1, "To", FieldDescriptor::input("email"), 1),
            ComposeField::new(2, "Subject", FieldDescriptor::input("text"), 1),
            ComposeField::new(3, "Body", FieldDescriptor::text_area(), 8),
        ];

        let mut session = SuggestionSession::new(settings, origin);
        let surface: Vec<(FieldId, FieldDescriptor)> = fields.iter().map(|f| (f.id, f.descriptor.clone())).collect();
        let now = Instant::now();
        session.handle(SessionEvent::SurfaceChanged(surface), now);
        session.handle(SessionEvent::FocusGained(fields[0].id), now);

        Self {
            fields,
            focus_idx: 0,
            session,
            overlay: None,
            presentation,
            should_quit: false,
        }
    }

    pub fn focused_field(&self) -> &ComposeField {
        &self.fields[self.focus_idx]
    }

    pub fn focused_field_mut(&mut self) -> &mut ComposeField {
        &mut self.fields[self.focus_idx]
    }

    pub fn field_mut(&mut self, id: FieldId) -> Option<&mut ComposeField> {
        self.fields.iter_mut().find(|f| f.id == id)
    }

    /// Route one session event and collect the resulting effects.
    pub fn dispatch(&mut self, event: SessionEvent, now: Instant) -> Vec<Effect> {
        self.session.handle(event, now).effects
    }

    /// Handle a terminal key press. Returns the effects to execute.
    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) -> Vec<Effect> {
        let mapped = map_key(&key);
        let outcome = self.session.handle(SessionEvent::KeyPress(mapped), now);
        let mut effects = outcome.effects;
        if outcome.consumed {
            return effects;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
            }
            KeyCode::Esc => {
                // The session did not consume it, so nothing was shown.
                self.should_quit = true;
            }
            KeyCode::Tab => effects.extend(self.focus_step(1, now)),
            KeyCode::BackTab => effects.extend(self.focus_step(-1, now)),
            KeyCode::Up => effects.extend(self.focus_step(-1, now)),
            KeyCode::Down => effects.extend(self.focus_step(1, now)),
            KeyCode::Left => {
                self.focused_field_mut().input.move_left();
                effects.extend(self.report_caret(now));
            }
            KeyCode::Right => {
                self.focused_field_mut().input.move_right();
                effects.extend(self.report_caret(now));
            }
            KeyCode::Home => {
                self.focused_field_mut().input.move_home();
                effects.extend(self.report_caret(now));
            }
            KeyCode::End => {
                self.focused_field_mut().input.move_end();
                effects.extend(self.report_caret(now));
            }
            KeyCode::Enter => {
                if self.focused_field().is_multi_line() {
                    self.focused_field_mut().input.insert_char('\n');
                    effects.extend(self.report_edit(now));
                } else {
                    effects.extend(self.focus_step(1, now));
                }
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.focused_field_mut().input.insert_char(c);
                effects.extend(self.report_edit(now));
            }
            KeyCode::Backspace => {
                self.focused_field_mut().input.backspace();
                effects.extend(self.report_edit(now));
            }
            KeyCode::Delete => {
                self.focused_field_mut().input.delete_forward();
                effects.extend(self.report_edit(now));
            }
            _ => {}
        }
        effects
    }

    /// Handle a mouse event: clicks dismiss, and clicking a field focuses it.
    pub fn handle_mouse(&mut self, mouse: MouseEvent, now: Instant) -> Vec<Effect> {
        if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
            return Vec::new();
        }
        let mut effects = self.dispatch(SessionEvent::Click, now);

        let hit = self
            .fields
            .iter()
            .position(|f| rect_contains(f.area, mouse.column, mouse.row));
        if let Some(idx) = hit
            && idx != self.focus_idx
        {
            effects.extend(self.focus_to(idx, now));
        }
        effects
    }

    fn focus_step(&mut self, delta: isize, now: Instant) -> Vec<Effect> {
        let len = self.fields.len() as isize;
        let next = (self.focus_idx as isize + delta).rem_euclid(len) as usize;
        self.focus_to(next, now)
    }

    fn focus_to(&mut self, idx: usize, now: Instant) -> Vec<Effect> {
        let mut effects = self.dispatch(SessionEvent::Blur, now);
        self.focus_idx = idx;
        let id = self.fields[idx].id;
        effects.extend(self.dispatch(SessionEvent::FocusGained(id), now));
        effects
    }

    fn report_edit(&mut self, now: Instant) -> Vec<Effect> {
        let field = &self.fields[self.focus_idx];
        let event = SessionEvent::Edit {
            field: field.id,
            text: field.input.text().to_string(),
            caret: Caret::Offset(field.input.cursor()),
        };
        self.dispatch(event, now)
    }

    fn report_caret(&mut self, now: Instant) -> Vec<Effect> {
        let field = &self.fields[self.focus_idx];
        let event = SessionEvent::CaretMoved {
            field: field.id,
            caret: Caret::Offset(field.input.cursor()),
        };
        self.dispatch(event, now)
    }
}

/// Map a crossterm key event onto the session's key vocabulary.
fn map_key(key: &KeyEvent) -> KeyInput {
    let code = match key.code {
        KeyCode::Tab => Key::Tab,
        // Shift+Tab arrives as its own code; it is still Tab with shift.
        KeyCode::BackTab => Key::Tab,
        KeyCode::Esc => Key::Escape,
        KeyCode::Enter => Key::Enter,
        KeyCode::Up => Key::ArrowUp,
        KeyCode::Down => Key::ArrowDown,
        KeyCode::Left => Key::ArrowLeft,
        KeyCode::Right => Key::ArrowRight,
        KeyCode::Char(c) => Key::Char(c),
        _ => Key::Other,
    };
    KeyInput {
        key: code,
        shift: key.modifiers.contains(KeyModifiers::SHIFT) || key.code == KeyCode::BackTab,
        ctrl: key.modifiers.contains(KeyModifiers::CONTROL),
        alt: key.modifiers.contains(KeyModifiers::ALT),
    }
}

fn rect_contains(rect: Rect, x: u16, y: u16) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}
