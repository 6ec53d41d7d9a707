//! Rendering of command errors and link findings for the terminal.

use std::fmt::Write as _;
use std::path::Path;

use serde::Serialize;

use crate::error::Error;
use crate::types::ExtractedMatch;
use crate::validator::{LinkIssue, Severity};

const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// One issue found in one document.
#[derive(Debug, Clone, Serialize)]
pub struct Finding {
    /// Document containing the link.
    pub document: std::path::PathBuf,
    pub issue: LinkIssue,
    #[serde(rename = "match")]
    pub link: ExtractedMatch,
}

/// Render an error as valid markdown with bold headings and print to stderr.
pub fn print_error(e: &Error) {
    let md = render_error(e);
    for line in md.lines() {
        if line.starts_with('#') {
            eprintln!("{BOLD}{line}{RESET}");
        } else {
            eprintln!("{line}");
        }
    }
}

/// Render an error as a structured markdown diagnostic: what happened and,
/// where there is one, how to fix it.
pub fn render_error(e: &Error) -> String {
    return match e {
        Error::DocumentNotFound { path } => format!("\
# Error: Document Not Found

`{}` does not exist.
", path.display()),

        Error::NotALink { text } => format!("\
# Error: Not A gl: Link

`{text}` is not a valid `gl:` link.

## Fix

Use `gl:<path>`, optionally followed by `#L<n>` or `#L<n>-L<n>`:

    gl:docs/readme.md#L10-L20
"),

        Error::Unresolvable { link, document } => format!("\
# Error: Unresolvable Link

`{link}` cannot be resolved from `{}`.

## Fix

Make sure the document is inside a git repository and the path stays
within it. Use `./` for document-relative paths.
", document.display()),

        Error::TomlDe(e) => format!("\
# Error: Invalid TOML

{e}

## Fix

Check `.gllink.toml`. Supported keys: `include`, `exclude`, `extensions`.
"),

        Error::WatchFailed { reason } => format!("\
# Error: Watch Failed

{reason}
"),

        Error::Io(e) => format!("\
# Error: I/O

{e}
"),
        Error::Json(e) => format!("\
# Error: JSON Output

{e}
"),
    };
}

/// `path:line:col  LEVEL  code  message`, with one-based line and column.
pub fn render_finding(finding: &Finding, root: &Path) -> String {
    let shown = finding.document.strip_prefix(root).unwrap_or(&finding.document);
    let start = finding.link.range.start;
    let level = match finding.issue.severity {
        Severity::Error => "ERROR",
        Severity::Warning => "WARN ",
    };
    return format!(
        "{}:{}:{}  {level}  {}  {}",
        shown.display(),
        start.line.saturating_add(1),
        start.character.saturating_add(1),
        finding.issue.code,
        finding.issue.message,
    );
}

/// Closing summary line for a check run.
pub fn render_summary(findings: &[Finding], link_count: usize, document_count: usize) -> String {
    let errors = findings.iter().filter(|f| f.issue.severity == Severity::Error).count();
    let warnings = findings.len() - errors;
    let mut out = String::new();
    if findings.is_empty() {
        let _ = write!(out, "All {link_count} gl: links valid in {document_count} documents");
    } else {
        let _ = write!(out, "{errors} errors, {warnings} warnings in {link_count} gl: links");
    }
    return out;
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::scanner::find_all_links;
    use crate::validator::DiagnosticCode;

    #[test]
    fn renders_finding_with_one_based_position() {
        let link = find_all_links("x gl:/a.md").remove(0);
        let finding = Finding {
            document: PathBuf::from("/repo/docs/guide.md"),
            issue: LinkIssue {
                code: DiagnosticCode::LeadingSlash,
                message: "Remove leading slash: use gl:a.md.".to_string(),
                resolved: None,
                severity: Severity::Error,
            },
            link,
        };
        assert_eq!(
            render_finding(&finding, Path::new("/repo")),
            "docs/guide.md:1:3  ERROR  gl-leading-slash  Remove leading slash: use gl:a.md."
        );
    }

    #[test]
    fn summary_counts() {
        assert_eq!(render_summary(&[], 4, 2), "All 4 gl: links valid in 2 documents");
    }

    #[test]
    fn error_render_has_heading() {
        let md = render_error(&Error::NotALink { text: "foo".to_string() });
        assert!(md.starts_with("# Error: Not A gl: Link"));
        assert!(md.contains("## Fix"));
    }
}
