//! Overlay measurement: where the caret sits, where ghost text goes.
//!
//! The overlay renders a suggestion immediately after the caret, which
//! means replicating exactly how each field lays its text out. Multi-line
//! fields are wrapped by [`wrap_ranges`] and the same ranges drive both the
//! field's own rendering and the caret measurement, so the "mirror" can
//! never drift from the real thing. Single-line fields scroll horizontally
//! instead of wrapping; [`single_line_window`] keeps the caret visible and
//! reports its column.

use std::ops::Range;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Wrap text into visual rows of at most `width` columns.
///
/// Returns byte ranges into `text`, one per row. Newlines are hard breaks
/// (the `\n` byte belongs to no row); soft breaks prefer the last space on
/// the row and fall back to a hard split inside overlong words. Every text
/// produces at least one (possibly empty) row.
pub fn wrap_ranges(text: &str, width: u16) -> Vec<Range<usize>> {
    let width = width.max(1) as usize;
    let mut rows: Vec<Range<usize>> = Vec::new();

    let mut line_start = 0;
    for line in text.split_inclusive('\n') {
        let content_end = line_start + line.len() - usize::from(line.ends_with('\n'));

        let mut row_start = line_start;
        let mut col = 0usize;
        let mut last_space: Option<usize> = None;

        for (offset, ch) in text[line_start..content_end].char_indices() {
            let at = line_start + offset;
            let ch_width = ch.width().unwrap_or(0);
            if col + ch_width > width && at > row_start {
                let break_at = match last_space {
                    Some(space) if space > row_start => space,
                    _ => at,
                };
                rows.push(row_start..break_at);
                row_start = break_at;
                col = text[row_start..at].width();
                last_space = None;
            }
            if ch == ' ' {
                last_space = Some(at + 1);
            }
            col += ch_width;
        }
        rows.push(row_start..content_end);
        line_start += line.len();
    }

    // A trailing newline opens one more (empty) row.
    if text.ends_with('\n') {
        rows.push(line_start..line_start);
    }
    if rows.is_empty() {
        rows.push(0..0);
    }
    rows
}

/// Caret position, in (row, column) grid coordinates, within text wrapped
/// at `width`.
///
/// A caret on a soft-wrap boundary displays at the start of the following
/// row; a caret at the end of a hard line stays on that line.
pub fn caret_position(text: &str, caret: usize, width: u16) -> (u16, u16) {
    let rows = wrap_ranges(text, width);
    let caret = caret.min(text.len());
    let row = rows.iter().rposition(|r| r.start <= caret).unwrap_or(0);
    let range = &rows[row];
    let col = text[range.start..caret.min(range.end)].width();
    (row as u16, col as u16)
}

/// Visible window of a single-line field, scrolled so the caret stays in
/// view.
///
/// Returns the byte offset rendering starts at and the caret's column
/// within the window.
pub fn single_line_window(text: &str, caret: usize, width: u16) -> (usize, u16) {
    let width = width.max(1) as usize;
    let caret = caret.min(text.len());
    let before_width = text[..caret].width();
    if before_width < width {
        return (0, before_width as u16);
    }

    // Scroll left of the caret until what remains fits, keeping one column
    // free for the caret cell itself.
    let mut start = caret;
    let mut visible = 0usize;
    for (offset, ch) in text[..caret].char_indices().rev() {
        let ch_width = ch.width().unwrap_or(0);
        if visible + ch_width > width - 1 {
            break;
        }
        visible += ch_width;
        start = offset;
    }
    (start, visible as u16)
}

/// Split ghost text across rows: the first piece fills what is left of the
/// caret's row, later pieces wrap at the field width. Anything past
/// `max_rows` is clipped.
pub fn layout_ghost(suggestion: &str, first_row_width: u16, row_width: u16, max_rows: u16) -> Vec<String> {
    let mut pieces = Vec::new();
    if max_rows == 0 {
        return pieces;
    }

    let mut current = String::new();
    let mut budget = first_row_width as usize;
    for ch in suggestion.chars() {
        let ch_width = ch.width().unwrap_or(0);
        if ch_width > budget {
            pieces.push(std::mem::take(&mut current));
            if pieces.len() as u16 >= max_rows {
                return pieces;
            }
            budget = row_width.max(1) as usize;
        }
        current.push(ch);
        budget -= ch_width.min(budget);
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows<'a>(text: &'a str, width: u16) -> Vec<&'a str> {
        wrap_ranges(text, width).into_iter().map(|r| &text[r]).collect()
    }

    #[test]
    fn short_text_is_one_row() {
        assert_eq!(rows("hello", 10), vec!["hello"]);
        assert_eq!(rows("", 10), vec![""]);
    }

    #[test]
    fn wraps_at_the_last_space() {
        assert_eq!(rows("hello brave world", 11), vec!["hello ", "brave world"]);
    }

    #[test]
    fn hard_breaks_overlong_words() {
        assert_eq!(rows("abcdefgh", 3), vec!["abc", "def", "gh"]);
    }

    #[test]
    fn newlines_are_hard_breaks() {
        assert_eq!(rows("one\ntwo three\n", 20), vec!["one", "two three", ""]);
    }

    #[test]
    fn caret_tracks_wrapped_rows() {
        let text = "hello brave world";
        // Inside the first row.
        assert_eq!(caret_position(text, 3, 11), (0, 3));
        // On the soft boundary: displays at the start of row 1.
        assert_eq!(caret_position(text, 6, 11), (1, 0));
        // End of text.
        assert_eq!(caret_position(text, text.len(), 11), (1, "brave world".len() as u16));
    }

    #[test]
    fn caret_after_a_hard_newline() {
        let text = "one\ntwo";
        assert_eq!(caret_position(text, 3, 20), (0, 3));
        assert_eq!(caret_position(text, 4, 20), (1, 0));
        assert_eq!(caret_position(text, 7, 20), (1, 3));
    }

    #[test]
    fn caret_counts_display_width_not_bytes() {
        let text = "héllo"; // é is 2 bytes, width 1
        assert_eq!(caret_position(text, 3, 20), (0, 2));
    }

    #[test]
    fn single_line_window_without_overflow() {
        assert_eq!(single_line_window("hello", 3, 20), (0, 3));
    }

    #[test]
    fn single_line_window_scrolls_to_the_caret() {
        let text = "abcdefghij";
        let (start, col) = single_line_window(text, 10, 5);
        assert!(start > 0);
        assert_eq!(&text[start..], "ghij");
        assert_eq!(col, 4);
    }

    #[test]
    fn ghost_splits_across_rows() {
        let pieces = layout_ghost(" say hello", 4, 6, 3);
        assert_eq!(pieces, vec![" say".to_string(), " hello".to_string()]);
    }

    #[test]
    fn ghost_clips_at_max_rows() {
        let pieces = layout_ghost("abcdefghij", 4, 4, 2);
        assert_eq!(pieces, vec!["abcd".to_string(), "efgh".to_string()]);
    }

    #[test]
    fn ghost_with_no_rows_renders_nothing() {
        assert!(layout_ghost("anything", 4, 4, 0).is_empty());
    }
}
