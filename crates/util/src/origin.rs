//! Origin block-list matching.
//!
//! Preferences carry a list of origin patterns such as `mail.example.com`
//! or `*.bank.com`; a compose surface whose origin matches any pattern gets
//! no suggestions. `*` matches any run of characters, everything else is
//! literal.

use regex::Regex;
use tracing::warn;

/// Whether `origin` matches any of the block-list `patterns`.
///
/// Matching is case-insensitive and anchored: `*.example.com` blocks
/// `mail.example.com` but not `example.com.evil.net`. Patterns that fail to
/// compile are skipped with a warning rather than blocking everything.
pub fn origin_is_blocked(origin: &str, patterns: &[String]) -> bool {
    patterns.iter().any(|pattern| match compile_pattern(pattern) {
        Some(re) => re.is_match(origin),
        None => {
            warn!(pattern, "skipping unparseable block-list pattern");
            false
        }
    })
}

fn compile_pattern(pattern: &str) -> Option<Regex> {
    let trimmed = pattern.trim();
    if trimmed.is_empty() {
        return None;
    }
    let mut source = String::with_capacity(trimmed.len() + 8);
    source.push_str("(?i)^");
    for c in trimmed.chars() {
        if c == '*' {
            source.push_str(".*");
        } else {
            source.push_str(&regex::escape(&c.to_string()));
        }
    }
    source.push('$');
    Regex::new(&source).ok()
}
