//! Cursor/context extraction.
//!
//! Resolves the caret a host surface reports into a byte offset the engine
//! can slice with. Plain inputs report the native offset directly.
//! Rich-text surfaces report the character count from the start of the
//! field to the active selection's end point; with no selection the caret
//! resolves to 0, which the minimum-context rule then rejects.

use ghosttyper_types::{Caret, FieldKind};

/// Resolve a reported caret to a byte offset into `text`.
///
/// Offsets are clamped into the text and snapped back to a UTF-8 boundary,
/// since the surface and the mirror can briefly disagree.
pub fn resolve_caret(kind: FieldKind, text: &str, caret: Caret) -> usize {
    let raw = match (kind, caret) {
        (FieldKind::RichText, Caret::SelectionEnd(end)) => match end {
            Some(chars) => byte_offset_of_char(text, chars),
            None => 0,
        },
        // A rich-text surface that reports byte offsets is taken at its word.
        (_, Caret::Offset(at)) => at,
        // A plain input with selection semantics degrades the same way.
        (_, Caret::SelectionEnd(end)) => end.map(|chars| byte_offset_of_char(text, chars)).unwrap_or(0),
    };
    snap_to_boundary(text, raw.min(text.len()))
}

fn byte_offset_of_char(text: &str, chars: usize) -> usize {
    text.char_indices().nth(chars).map(|(at, _)| at).unwrap_or(text.len())
}

fn snap_to_boundary(text: &str, mut at: usize) -> usize {
    while at > 0 && !text.is_char_boundary(at) {
        at -= 1;
    }
    at
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_offsets_pass_through_clamped() {
        assert_eq!(resolve_caret(FieldKind::SingleLineInput, "hello", Caret::Offset(3)), 3);
        assert_eq!(resolve_caret(FieldKind::MultiLineInput, "hello", Caret::Offset(99)), 5);
    }

    #[test]
    fn rich_text_counts_characters_to_selection_end() {
        // 'é' is two bytes; three characters in means four bytes in.
        let text = "héllo";
        assert_eq!(
            resolve_caret(FieldKind::RichText, text, Caret::SelectionEnd(Some(3))),
            4
        );
        assert_eq!(
            resolve_caret(FieldKind::RichText, text, Caret::SelectionEnd(Some(99))),
            text.len()
        );
    }

    #[test]
    fn rich_text_without_selection_resolves_to_zero() {
        assert_eq!(
            resolve_caret(FieldKind::RichText, "plenty of text", Caret::SelectionEnd(None)),
            0
        );
    }

    #[test]
    fn split_offsets_snap_back_to_a_boundary() {
        let text = "héllo"; // 'é' spans bytes 1..3
        assert_eq!(resolve_caret(FieldKind::SingleLineInput, text, Caret::Offset(2)), 1);
    }
}
