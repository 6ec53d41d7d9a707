/// Core domain types for gl: links, their source locations, and resolutions.
use std::path::{Path, PathBuf};

use serde::Serialize;

/// Parsed `#L<n>` or `#L<n>-L<n>` suffix. `end_line >= start_line` by construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineFragment {
    /// Last line of the range, absent for a single-line fragment.
    pub end_line: Option<u32>,
    /// Fragment text, always starting with `#`.
    pub raw: String,
    /// First referenced line, one-based.
    pub start_line: u32,
}

impl LineFragment {
    /// Fragment text without the leading `#`, as used in URI fragments.
    pub fn without_hash(&self) -> &str {
        return self.raw.strip_prefix('#').unwrap_or(&self.raw);
    }
}

/// A `gl:` link split into its path and optional line fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedLink {
    /// Optional line or line-range annotation.
    pub fragment: Option<LineFragment>,
    /// Target path with the fragment stripped. Never empty.
    pub path: String,
    /// The full trimmed link text including the `gl:` scheme.
    pub raw_text: String,
}

/// Zero-based line and character offset. Characters count Unicode scalar values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Position {
    /// Character offset within the line.
    pub character: u32,
    /// Zero-based line number.
    pub line: u32,
}

impl Position {
    pub fn new(line: u32, character: u32) -> Self {
        return Self { character, line };
    }
}

impl Ord for Position {
    /// Document order: line first, then character.
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        return (self.line, self.character).cmp(&(other.line, other.character));
    }
}

impl PartialOrd for Position {
    /// Delegate to `Ord` implementation.
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        return Some(self.cmp(other));
    }
}

/// Half-open source range: `start` inclusive, `end` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SourceRange {
    /// Position just past the last character.
    pub end: Position,
    /// Position of the first character.
    pub start: Position,
}

impl SourceRange {
    /// Whether `position` lies inside this half-open range.
    pub fn contains(&self, position: Position) -> bool {
        return position >= self.start && position < self.end;
    }
}

/// Which markdown construct produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SyntaxKind {
    /// `<gl:path>`
    Autolink,
    /// `gl:path` in running prose.
    BareAutolink,
    /// `[text](gl:path)`
    Inline,
    /// `[label]: gl:path`
    ReferenceDefinition,
    /// `[text][label]` or `[label][]`
    ReferenceUsage,
}

/// Role of a match taking part in reference-style linking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ReferenceRole {
    Definition,
    Usage,
}

/// One gl: link occurrence found in a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedMatch {
    /// Syntactic form of the occurrence.
    pub kind: SyntaxKind,
    /// The parsed link.
    pub link: ParsedLink,
    /// Location of the link in the document.
    pub range: SourceRange,
    /// Normalized label for reference definitions and usages.
    pub reference_label: Option<String>,
    /// Set for reference definitions and usages.
    pub reference_role: Option<ReferenceRole>,
    /// Link text as it is navigated to (for usages, the definition's link text).
    pub source_text: String,
}

/// Per-document inputs for path resolution. Never mutated by the resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionContext {
    /// Directory containing the document.
    pub document_directory: PathBuf,
    /// Absolute path of the document containing the links.
    pub document_path: PathBuf,
    /// Known repository root; skips the upward `.git` search when present.
    pub repository_root_hint: Option<PathBuf>,
    /// Root of the workspace the document was opened from, if any.
    pub workspace_root_hint: Option<PathBuf>,
}

impl ResolutionContext {
    /// Build a context for a document with no hints.
    pub fn for_document(document_path: impl Into<PathBuf>) -> Self {
        let document_path = document_path.into();
        let document_directory = document_path
            .parent()
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        return Self {
            document_directory,
            document_path,
            repository_root_hint: None,
            workspace_root_hint: None,
        };
    }

    #[must_use]
    pub fn with_repository_root(mut self, root: Option<PathBuf>) -> Self {
        self.repository_root_hint = root;
        return self;
    }

    #[must_use]
    pub fn with_workspace_root(mut self, root: Option<PathBuf>) -> Self {
        self.workspace_root_hint = root;
        return self;
    }
}

/// Output of a successful resolution. Produced fresh per call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedPath {
    /// Canonical absolute location of the target.
    pub absolute_path: PathBuf,
    /// Whether the target existed when resolved.
    pub exists: bool,
    /// Target path relative to the repository root, `/`-separated.
    pub relative_path: String,
    /// Repository root the target is contained in.
    pub repository_root: PathBuf,
}
