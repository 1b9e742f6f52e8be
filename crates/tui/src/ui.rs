//! Rendering for the compose view.
//!
//! The form fields render from the same wrap ranges the overlay measures
//! with, so ghost text always lands exactly after the caret. The shared
//! overlay renders last, in whichever presentation mode is configured.

use ghosttyper_types::PresentationMode;
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Clear, Paragraph};

use crate::app::{App, ComposeField};
use crate::overlay::{caret_position, layout_ghost, single_line_window, wrap_ranges};

const GHOST_STYLE: Style = Style::new().fg(Color::DarkGray).add_modifier(Modifier::ITALIC);
const FOCUSED_BORDER: Style = Style::new().fg(Color::Cyan);
const IDLE_BORDER: Style = Style::new().fg(Color::DarkGray);

/// Draw one frame.
pub fn draw(frame: &mut Frame, app: &mut App) {
    let panel_height = if app.presentation == PresentationMode::Panel && app.overlay.is_some() {
        5
    } else {
        0
    };

    let mut constraints: Vec<Constraint> = app.fields.iter().map(|f| Constraint::Length(f.content_height + 2)).collect();
    constraints.push(Constraint::Min(0));
    constraints.push(Constraint::Length(panel_height));
    constraints.push(Constraint::Length(1));
    let areas = Layout::vertical(constraints).split(frame.area());

    let focus_idx = app.focus_idx;
    for (i, field) in app.fields.iter_mut().enumerate() {
        render_field(frame, field, areas[i], i == focus_idx);
    }

    let panel_area = areas[areas.len() - 2];
    let status_area = areas[areas.len() - 1];
    render_status(frame, app, status_area);
    render_overlay(frame, app, panel_area);
}

fn render_field(frame: &mut Frame, field: &mut ComposeField, area: Rect, focused: bool) {
    let block = Block::bordered()
        .title(field.label.clone())
        .border_style(if focused { FOCUSED_BORDER } else { IDLE_BORDER });
    let inner = block.inner(area);
    field.area = inner;
    frame.render_widget(block, area);
    if inner.width == 0 || inner.height == 0 {
        return;
    }

    let text = field.input.text();
    if field.is_multi_line() {
        let ranges = wrap_ranges(text, inner.width);
        let (caret_row, caret_col) = caret_position(text, field.input.cursor(), inner.width);
        let top = caret_row.saturating_sub(inner.height - 1);

        let lines: Vec<Line> = ranges
            .iter()
            .skip(top as usize)
            .take(inner.height as usize)
            .map(|r| Line::from(&text[r.clone()]))
            .collect();
        frame.render_widget(Paragraph::new(lines), inner);

        if focused {
            frame.set_cursor_position((inner.x + caret_col, inner.y + caret_row - top));
        }
    } else {
        let (start, caret_col) = single_line_window(text, field.input.cursor(), inner.width);
        frame.render_widget(Paragraph::new(&text[start..]), inner);
        if focused {
            frame.set_cursor_position((inner.x + caret_col, inner.y));
        }
    }
}

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
    let counters = app.session.counters();
    let mode = match app.presentation {
        PresentationMode::Inline => "inline",
        PresentationMode::Popup => "popup",
        PresentationMode::Panel => "panel",
    };
    let state = if app.session.is_active() { mode } else { "off" };
    let line = Line::from(vec![
        Span::styled(format!(" ghosttyper · {state} "), Style::new().fg(Color::Cyan)),
        Span::styled(
            format!("· shown {} · accepted {} ", counters.shown, counters.accepted),
            Style::new().fg(Color::DarkGray),
        ),
        Span::styled(
            "· Tab accept / next field · Esc dismiss / quit · Ctrl+Q quit",
            Style::new().fg(Color::DarkGray),
        ),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

/// Render the shared overlay in the configured presentation mode.
///
/// A suggestion bound to anything but the focused field is stale and is
/// never drawn.
fn render_overlay(frame: &mut Frame, app: &App, panel_area: Rect) {
    let Some(suggestion) = &app.overlay else {
        return;
    };
    let field = &app.fields[app.focus_idx];
    if field.id != suggestion.field {
        return;
    }

    match app.presentation {
        PresentationMode::Inline => render_inline_ghost(frame, field, &suggestion.text),
        PresentationMode::Popup => render_popup(frame, field, &suggestion.text),
        PresentationMode::Panel => render_panel(frame, panel_area, &suggestion.text),
    }
}

fn render_inline_ghost(frame: &mut Frame, field: &ComposeField, suggestion: &str) {
    let inner = field.area;
    if inner.width == 0 || inner.height == 0 {
        return;
    }
    let text = field.input.text();

    let (ghost_row, ghost_col) = if field.is_multi_line() {
        let (caret_row, caret_col) = caret_position(text, field.input.cursor(), inner.width);
        let top = caret_row.saturating_sub(inner.height - 1);
        (caret_row - top, caret_col)
    } else {
        let (_, caret_col) = single_line_window(text, field.input.cursor(), inner.width);
        (0, caret_col)
    };

    let max_rows = if field.is_multi_line() { inner.height - ghost_row } else { 1 };
    let pieces = layout_ghost(suggestion, inner.width.saturating_sub(ghost_col), inner.width, max_rows);
    for (i, piece) in pieces.iter().enumerate() {
        let x = if i == 0 { inner.x + ghost_col } else { inner.x };
        let y = inner.y + ghost_row + i as u16;
        let width = inner.width.saturating_sub(x - inner.x);
        if width == 0 || y >= inner.y + inner.height {
            break;
        }
        let rect = Rect::new(x, y, width, 1);
        frame.render_widget(Paragraph::new(Span::styled(piece.clone(), GHOST_STYLE)), rect);
    }
}

fn render_popup(frame: &mut Frame, field: &ComposeField, suggestion: &str) {
    let inner = field.area;
    let screen = frame.area();
    let (caret_row, caret_col) = if field.is_multi_line() {
        let (row, col) = caret_position(field.input.text(), field.input.cursor(), inner.width);
        let top = row.saturating_sub(inner.height - 1);
        (row - top, col)
    } else {
        let (_, col) = single_line_window(field.input.text(), field.input.cursor(), inner.width);
        (0, col)
    };

    let width = (suggestion.trim().len() as u16 + 2).clamp(12, 42).min(screen.width);
    let wrapped = textwrap::wrap(suggestion.trim(), width.saturating_sub(2).max(1) as usize);
    let height = (wrapped.len() as u16 + 2).min(6);

    let anchor_x = (inner.x + caret_col).min(screen.width.saturating_sub(width));
    let anchor_y = inner.y + caret_row + 1;
    let y = if anchor_y + height <= screen.height {
        anchor_y
    } else {
        anchor_y.saturating_sub(height + 1)
    };
    let rect = Rect::new(anchor_x, y, width, height);

    let lines: Vec<Line> = wrapped.iter().map(|l| Line::from(Span::styled(l.to_string(), GHOST_STYLE))).collect();
    frame.render_widget(Clear, rect);
    frame.render_widget(
        Paragraph::new(lines).block(Block::bordered().border_style(IDLE_BORDER)),
        rect,
    );
}

fn render_panel(frame: &mut Frame, area: Rect, suggestion: &str) {
    if area.height == 0 {
        return;
    }
    let block = Block::bordered().title("GhostTyper Suggestion").border_style(IDLE_BORDER);
    let inner_width = area.width.saturating_sub(2).max(1) as usize;
    let mut lines: Vec<Line> = textwrap::wrap(suggestion.trim(), inner_width)
        .iter()
        .map(|l| Line::from(l.to_string()))
        .collect();
    lines.push(Line::from(Span::styled(
        "Press Tab to accept, Esc to dismiss",
        Style::new().fg(Color::DarkGray),
    )));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}
