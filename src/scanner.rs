//! Extraction of `gl:` links from markdown text.
//!
//! Two passes over the lines: the first collects reference definitions so
//! usages can point forward, the second emits every occurrence in document
//! order. Fenced code blocks and inline code spans are excluded from both.

use std::collections::{HashMap, HashSet};
use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use crate::fragment::{SCHEME, parse_link};
use crate::sanitizer::{SanitizedLink, sanitize};
use crate::types::{ExtractedMatch, ParsedLink, Position, ReferenceRole, SourceRange, SyntaxKind};

/// `[text](gl:path)`, optionally with the target wrapped in `<...>`.
static INLINE_LINK: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(r"\[([^\]]+)\]\((<?)gl:([^)\s>]+)(>?)\)").expect("valid regex");
});

/// `<gl:path>`
static AUTOLINK: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(r"<gl:([^>\s]+)>").expect("valid regex");
});

/// `gl:path` in prose, preceded by line start, whitespace, or emphasis/paren.
/// Stops at `]` so a link inside link text never runs into the target.
static BARE_AUTOLINK: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(r"(?:^|[\s*_~(])(gl:[^\s<\]]+)").expect("valid regex");
});

/// `[label]: gl:path` or `[label]: <gl:path>` with an optional title.
static REFERENCE_DEFINITION: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(
        r#"^\[([^\]]+)\]:\s*(?:<(gl:[^>]+)>|(gl:\S+))\s*(?:("[^"]*")|('[^']*')|\([^)]*\))?\s*$"#,
    )
    .expect("valid regex");
});

/// `[text][label]` or `[label][]`
static REFERENCE_USAGE: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(r"\[([^\]]*)\]\s*\[([^\]]*)\]").expect("valid regex");
});

/// Opening code fence: up to three spaces, then three or more backticks or tildes.
static FENCE_OPEN: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(r"^ {0,3}(`{3,}|~{3,})").expect("valid regex");
});

/// Line-level state for fenced code blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FenceState {
    /// Inside a fence opened by `length` repetitions of `marker`.
    InFence { length: usize, marker: char },
    Normal,
}

impl FenceState {
    /// Advance over one line. Returns whether the line is excluded from
    /// scanning; fence delimiter lines themselves are excluded.
    fn advance(&mut self, line: &str) -> bool {
        match *self {
            FenceState::InFence { length, marker } => {
                let trimmed = line.trim_start();
                if !trimmed.is_empty() {
                    let run = trimmed.chars().take_while(|&c| c == marker).count();
                    if run >= length {
                        *self = FenceState::Normal;
                    }
                }
                return true;
            },
            FenceState::Normal => {
                let Some(caps) = FENCE_OPEN.captures(line) else {
                    return false;
                };
                let Some(run) = caps.get(1) else {
                    return false;
                };
                let marker = run.as_str().chars().next().unwrap_or('`');
                *self = FenceState::InFence {
                    length: run.as_str().len(),
                    marker,
                };
                return true;
            },
        }
    }
}

/// A first-seen reference definition recorded during pass one.
#[derive(Debug, Clone)]
struct ReferenceDefinition {
    label: String,
    link: ParsedLink,
    sanitized: SanitizedLink,
}

/// Per-line context handed to the pattern scanners in pass two.
struct LineScan<'a> {
    code_spans: Vec<Range<usize>>,
    line: &'a str,
    number: u32,
}

impl LineScan<'_> {
    fn in_code_span(&self, span: &Range<usize>) -> bool {
        return is_within_spans(span, &self.code_spans);
    }

    fn range(&self, span: &Range<usize>) -> SourceRange {
        return SourceRange {
            start: Position::new(self.number, char_column(self.line, span.start)),
            end: Position::new(self.number, char_column(self.line, span.end)),
        };
    }
}

/// Ordered, range-deduplicated collection of matches.
#[derive(Default)]
struct Emitter {
    matches: Vec<ExtractedMatch>,
    seen: HashSet<SourceRange>,
}

impl Emitter {
    fn push(&mut self, entry: ExtractedMatch) {
        if self.seen.insert(entry.range) {
            self.matches.push(entry);
        } else {
            log::debug!("duplicate range for {}, skipped", entry.source_text);
        }
    }

    /// Whether `range` intersects a match already emitted on the same line.
    fn overlaps_on_line(&self, range: &SourceRange) -> bool {
        return self
            .matches
            .iter()
            .rev()
            .take_while(|m| m.range.start.line == range.start.line)
            .any(|m| m.range.start < range.end && range.start < m.range.end);
    }
}

/// Find every `gl:` link in `text`, in document order.
///
/// Malformed candidates are dropped silently, so one bad link never hides
/// the ones after it. No two returned matches share a source range.
pub fn find_all_links(text: &str) -> Vec<ExtractedMatch> {
    let lines = split_lines(text);
    let (definitions, definitions_by_line) = collect_reference_definitions(&lines);

    let mut emitter = Emitter::default();
    let mut fence = FenceState::Normal;

    for (index, line) in lines.iter().enumerate() {
        if fence.advance(line) {
            continue;
        }

        let scan = LineScan {
            code_spans: inline_code_spans(line),
            line,
            number: line_number(index),
        };

        if let Some(entries) = definitions_by_line.get(&index) {
            emit_reference_definitions(&scan, entries, &mut emitter);
        }
        scan_inline_links(&scan, &mut emitter);
        scan_autolinks(&scan, &mut emitter);
        scan_bare_autolinks(&scan, &mut emitter);
        scan_reference_usages(&scan, &definitions, &mut emitter);
    }

    return emitter.matches;
}

/// The first match whose range contains `position`.
pub fn match_at(matches: &[ExtractedMatch], position: Position) -> Option<&ExtractedMatch> {
    return matches.iter().find(|m| m.range.contains(position));
}

/// Convert a byte offset in `text` to a line/character position. Offsets past
/// the end clamp to the end; offsets inside a character round down.
pub fn offset_to_position(text: &str, offset: usize) -> Position {
    let mut clamped = offset.min(text.len());
    while !text.is_char_boundary(clamped) {
        clamped -= 1;
    }
    let preceding = &text[..clamped];
    let line = preceding.matches('\n').count();
    let line_start = preceding.rfind(['\n', '\r']).map_or(0, |i| i + 1);
    return Position::new(line_number(line), char_column(preceding, clamped) - char_column(preceding, line_start));
}

/// Pass one: collect first-seen reference definitions outside fences.
fn collect_reference_definitions(
    lines: &[&str],
) -> (HashMap<String, ReferenceDefinition>, HashMap<usize, Vec<ReferenceDefinition>>) {
    let mut by_label: HashMap<String, ReferenceDefinition> = HashMap::new();
    let mut by_line: HashMap<usize, Vec<ReferenceDefinition>> = HashMap::new();
    let mut fence = FenceState::Normal;

    for (index, line) in lines.iter().enumerate() {
        if fence.advance(line) {
            continue;
        }

        let code_spans = inline_code_spans(line);
        for caps in REFERENCE_DEFINITION.captures_iter(line) {
            let group = if caps.get(2).is_some() { 2 } else { 3 };
            let Some(sanitized) = sanitize(line, &caps, group) else {
                continue;
            };
            let Some(link) = parse_link(&sanitized.text) else {
                continue;
            };
            if is_within_spans(&sanitized.span, &code_spans) {
                continue;
            }

            let label = normalize_label(caps.get(1).map_or("", |m| m.as_str()));
            if label.is_empty() || by_label.contains_key(&label) {
                continue;
            }

            let definition = ReferenceDefinition { label: label.clone(), link, sanitized };
            by_line.entry(index).or_default().push(definition.clone());
            by_label.insert(label, definition);
        }
    }

    return (by_label, by_line);
}

fn emit_reference_definitions(scan: &LineScan<'_>, entries: &[ReferenceDefinition], emitter: &mut Emitter) {
    for entry in entries {
        if scan.in_code_span(&entry.sanitized.span) {
            continue;
        }
        emitter.push(ExtractedMatch {
            kind: SyntaxKind::ReferenceDefinition,
            link: entry.link.clone(),
            range: scan.range(&entry.sanitized.span),
            reference_label: Some(entry.label.clone()),
            reference_role: Some(ReferenceRole::Definition),
            source_text: entry.sanitized.text.clone(),
        });
    }
}

fn scan_inline_links(scan: &LineScan<'_>, emitter: &mut Emitter) {
    scan_scheme_stripped(scan, &INLINE_LINK, 3, SyntaxKind::Inline, emitter);
}

fn scan_autolinks(scan: &LineScan<'_>, emitter: &mut Emitter) {
    scan_scheme_stripped(scan, &AUTOLINK, 1, SyntaxKind::Autolink, emitter);
}

/// Scan a pattern whose capture group holds the path after `gl:`. The
/// emitted range is widened back over the scheme.
fn scan_scheme_stripped(scan: &LineScan<'_>, pattern: &Regex, group: usize, kind: SyntaxKind, emitter: &mut Emitter) {
    for caps in pattern.captures_iter(scan.line) {
        let Some(sanitized) = sanitize(scan.line, &caps, group) else {
            continue;
        };
        let Some(link) = parse_link(&format!("{SCHEME}{}", sanitized.text)) else {
            log::debug!("dropped malformed link {SCHEME}{}", sanitized.text);
            continue;
        };

        let Some(capture) = caps.get(group) else {
            continue;
        };
        // A backtick-wrapped target keeps its backticks inside the range.
        let span = if sanitized.span.start > capture.start() {
            capture.start().saturating_sub(SCHEME.len())..capture.end()
        } else {
            sanitized.span.start.saturating_sub(SCHEME.len())..sanitized.span.end
        };
        if scan.in_code_span(&span) {
            continue;
        }
        let source_text = scan.line.get(span.clone()).unwrap_or(&link.raw_text).to_string();

        emitter.push(ExtractedMatch {
            kind,
            range: scan.range(&span),
            reference_label: None,
            reference_role: None,
            source_text,
            link,
        });
    }
}

fn scan_bare_autolinks(scan: &LineScan<'_>, emitter: &mut Emitter) {
    for caps in BARE_AUTOLINK.captures_iter(scan.line) {
        let Some(sanitized) = sanitize(scan.line, &caps, 1) else {
            continue;
        };
        let Some(link) = parse_link(&sanitized.text) else {
            log::debug!("dropped malformed link {}", sanitized.text);
            continue;
        };
        if scan.in_code_span(&sanitized.span) {
            continue;
        }
        let range = scan.range(&sanitized.span);
        if emitter.overlaps_on_line(&range) {
            log::debug!("bare candidate {} overlaps an earlier match", sanitized.text);
            continue;
        }

        emitter.push(ExtractedMatch {
            kind: SyntaxKind::BareAutolink,
            range,
            reference_label: None,
            reference_role: None,
            source_text: link.raw_text.clone(),
            link,
        });
    }
}

fn scan_reference_usages(
    scan: &LineScan<'_>,
    definitions: &HashMap<String, ReferenceDefinition>,
    emitter: &mut Emitter,
) {
    for caps in REFERENCE_USAGE.captures_iter(scan.line) {
        let explicit = caps.get(2).map_or("", |m| m.as_str().trim());
        let fallback = caps.get(1).map_or("", |m| m.as_str().trim());
        let label = if explicit.is_empty() { fallback } else { explicit };
        if label.is_empty() {
            continue;
        }

        let Some(definition) = definitions.get(&normalize_label(label)) else {
            continue;
        };
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let span = whole.range();
        if scan.in_code_span(&span) {
            continue;
        }

        emitter.push(ExtractedMatch {
            kind: SyntaxKind::ReferenceUsage,
            link: definition.link.clone(),
            range: scan.range(&span),
            reference_label: Some(definition.label.clone()),
            reference_role: Some(ReferenceRole::Usage),
            source_text: definition.link.raw_text.clone(),
        });
    }
}

/// Byte spans of inline code on one line, backticks included.
///
/// A run of k backticks opens a span that closes at the next run of exactly
/// k backticks. An unclosed opener ends span detection for the line.
fn inline_code_spans(line: &str) -> Vec<Range<usize>> {
    let bytes = line.as_bytes();
    let run_at = |start: usize| bytes[start..].iter().take_while(|&&b| b == b'`').count();

    let mut spans = Vec::new();
    let mut index = 0;
    while index < bytes.len() {
        if bytes[index] != b'`' {
            index += 1;
            continue;
        }

        let ticks = run_at(index);
        let mut search = index + ticks;
        let mut closing = None;
        while search < bytes.len() {
            if bytes[search] != b'`' {
                search += 1;
                continue;
            }
            let run = run_at(search);
            if run == ticks {
                closing = Some(search);
                break;
            }
            search += run;
        }

        let Some(close) = closing else {
            break;
        };
        spans.push(index..close + ticks);
        index = close + ticks;
    }

    return spans;
}

fn is_within_spans(target: &Range<usize>, spans: &[Range<usize>]) -> bool {
    return spans.iter().any(|span| target.start >= span.start && target.end <= span.end);
}

/// Trim, collapse internal whitespace, and case-fold a reference label.
fn normalize_label(label: &str) -> String {
    return label.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
}

/// Split on `\n`, dropping one trailing `\r` per line.
fn split_lines(text: &str) -> Vec<&str> {
    return text
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect();
}

/// Character column of a byte offset within `line`.
fn char_column(line: &str, byte_offset: usize) -> u32 {
    let count = line.get(..byte_offset).map_or(0, |prefix| prefix.chars().count());
    return u32::try_from(count).unwrap_or(u32::MAX);
}

fn line_number(index: usize) -> u32 {
    return u32::try_from(index).unwrap_or(u32::MAX);
}
