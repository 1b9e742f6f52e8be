//! Text-context helpers for the suggestion pipeline.
//!
//! The extractor hands the engine a full text plus caret offset; these
//! helpers derive the preceding-text substring and decide whether it holds
//! enough signal to be worth a completion request.

/// Minimum number of non-whitespace characters that must precede the caret
/// before a suggestion request is issued.
pub const MIN_CONTEXT_CHARS: usize = 3;

/// Return the substring strictly before the caret.
///
/// The caret is a byte offset; offsets past the end of the text clamp to
/// the full text rather than panic, since the host surface and the engine
/// mirror can briefly disagree after an external mutation.
pub fn preceding_text(text: &str, caret: usize) -> &str {
    if caret >= text.len() {
        return text;
    }
    // Walk back to a char boundary if the host reported a split offset.
    let mut at = caret;
    while at > 0 && !text.is_char_boundary(at) {
        at -= 1;
    }
    &text[..at]
}

/// Whether the preceding text meets the minimum-context rule.
pub fn has_min_context(preceding: &str) -> bool {
    preceding.chars().filter(|c| !c.is_whitespace()).count() >= MIN_CONTEXT_CHARS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preceding_text_slices_before_caret() {
        assert_eq!(preceding_text("hello world", 5), "hello");
        assert_eq!(preceding_text("hello", 0), "");
        assert_eq!(preceding_text("hello", 99), "hello");
    }

    #[test]
    fn preceding_text_respects_utf8_boundaries() {
        let text = "héllo"; // 'é' spans bytes 1..3
        assert_eq!(preceding_text(text, 2), "h");
        assert_eq!(preceding_text(text, 3), "hé");
    }

    #[test]
    fn min_context_counts_non_whitespace_only() {
        assert!(!has_min_context(""));
        assert!(!has_min_context("Hi"));
        assert!(!has_min_context("  a b  "));
        assert!(has_min_context("abc"));
        assert!(has_min_context("a b c"));
    }
}
