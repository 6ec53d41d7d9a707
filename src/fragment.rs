//! `gl:` scheme and line-fragment parsing.

use std::sync::LazyLock;

use regex::Regex;

use crate::types::{LineFragment, ParsedLink};

/// The scheme prefix every link carries.
pub const SCHEME: &str = "gl:";

/// `L<n>` or `L<n>-L<n>`, optional leading `#`, no leading zeros.
static FRAGMENT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(r"^#?L([1-9]\d*)(?:-L([1-9]\d*))?$").expect("valid regex");
});

/// Parse a line fragment such as `#L10` or `L3-L7`.
///
/// Returns `None` for anything that doesn't conform, including ranges whose
/// end precedes their start and line numbers that overflow `u32`.
pub fn parse_fragment(fragment: &str) -> Option<LineFragment> {
    let trimmed = fragment.trim();
    if trimmed.is_empty() {
        return None;
    }

    let caps = FRAGMENT_PATTERN.captures(trimmed)?;
    let start_line: u32 = caps.get(1)?.as_str().parse().ok()?;
    let end_line = match caps.get(2) {
        Some(end) => Some(end.as_str().parse::<u32>().ok()?),
        None => None,
    };

    if end_line.is_some_and(|end| end < start_line) {
        return None;
    }

    let raw = if trimmed.starts_with('#') {
        trimmed.to_string()
    } else {
        format!("#{trimmed}")
    };

    return Some(LineFragment {
        end_line,
        raw,
        start_line,
    });
}

/// Parse `gl:<path>[#<fragment>]` into a link.
///
/// The path ends at the first `#` not escaped with a backslash; escaped
/// hashes are kept in the path as plain `#`. A fragment that is present but
/// malformed makes the whole text "not a link".
pub fn parse_link(link_text: &str) -> Option<ParsedLink> {
    let trimmed = link_text.trim();
    let content = trimmed.strip_prefix(SCHEME)?;
    if content.is_empty() {
        return None;
    }

    let (raw_path, fragment_text) = match find_unescaped_hash(content) {
        Some(index) => (&content[..index], Some(&content[index + 1..])),
        None => (content, None),
    };

    let path = raw_path.replace("\\#", "#");
    if path.is_empty() {
        return None;
    }

    let fragment = match fragment_text {
        Some(text) => Some(parse_fragment(&format!("#{text}"))?),
        None => None,
    };

    return Some(ParsedLink {
        fragment,
        path,
        raw_text: trimmed.to_string(),
    });
}

/// Byte index of the first `#` that isn't preceded by a backslash.
fn find_unescaped_hash(content: &str) -> Option<usize> {
    let bytes = content.as_bytes();
    return bytes
        .iter()
        .enumerate()
        .find(|&(i, &b)| b == b'#' && (i == 0 || bytes[i - 1] != b'\\'))
        .map(|(i, _)| i);
}
