//! Boundary repair for greedy regex captures of link text.

use std::ops::Range;

use regex::Captures;

/// Characters stripped from the end of a capture as sentence punctuation.
const TRAILING_PUNCTUATION: &[char] = &['?', '!', '.', ',', ':', '*', '_', '~', '"', '\''];

/// A capture trimmed down to the actual link text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizedLink {
    /// The capture group text before trimming.
    pub original_text: String,
    /// Byte span of `text` within the line.
    pub span: Range<usize>,
    /// The surviving link text.
    pub text: String,
}

/// Trim a captured link candidate and remap its span within `line`.
///
/// Strips one layer of wrapping backticks, then trailing punctuation, then
/// unbalanced closing parentheses. Returns `None` if the group didn't
/// participate in the match or nothing survives trimming.
pub fn sanitize(line: &str, caps: &Captures<'_>, group: usize) -> Option<SanitizedLink> {
    let capture = caps.get(group)?;
    let original = capture.as_str();
    if original.is_empty() {
        return None;
    }

    let mut leading = 0_usize;
    let mut cleaned = original;

    if cleaned.len() > 2 && cleaned.starts_with('`') && cleaned.ends_with('`') {
        cleaned = &cleaned[1..cleaned.len() - 1];
        leading = 1;
    }

    // Stripping a paren can expose more punctuation, e.g. `file.md.)`.
    loop {
        let trimmed = trim_unbalanced_closing_parens(cleaned.trim_end_matches(TRAILING_PUNCTUATION));
        if trimmed.len() == cleaned.len() {
            break;
        }
        cleaned = trimmed;
    }

    if cleaned.is_empty() {
        return None;
    }

    let start = capture.start().saturating_add(leading).min(line.len());
    let end = start.saturating_add(cleaned.len()).min(line.len());

    return Some(SanitizedLink {
        original_text: original.to_string(),
        span: start..end,
        text: cleaned.to_string(),
    });
}

/// Drop trailing `)` while closers outnumber openers.
fn trim_unbalanced_closing_parens(value: &str) -> &str {
    let mut current = value;
    while current.ends_with(')') {
        let opening = current.matches('(').count();
        let closing = current.matches(')').count();
        if closing <= opening {
            break;
        }
        current = &current[..current.len() - 1];
    }
    return current;
}
