//! Quick-fix suggestions for link issues. Nothing here touches documents;
//! the caller decides whether and how to apply a suggestion.

use std::path::PathBuf;

use serde::Serialize;

use crate::fragment::SCHEME;
use crate::validator::{DiagnosticCode, LinkIssue, normalize_link_path};

/// A suggested repair for one issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum QuickFix {
    /// Create the missing target file.
    CreateFile { path: PathBuf, title: String },
    /// Replace the link's source text with `new_text`.
    ReplaceText { new_text: String, title: String },
}

/// Suggest a fix for `issue` given the link's source text (`gl:...`).
///
/// Returns `None` for issues with no mechanical repair, or when the source
/// text doesn't have the shape the fix expects.
pub fn suggest_fix(issue: &LinkIssue, source_text: &str) -> Option<QuickFix> {
    let path_part = source_text.strip_prefix(SCHEME)?;

    return match issue.code {
        DiagnosticCode::LeadingSlash => Some(QuickFix::ReplaceText {
            new_text: format!("{SCHEME}{}", path_part.trim_start_matches('/')),
            title: "Remove leading slash".to_string(),
        }),
        DiagnosticCode::MissingDotPrefix => {
            let rest = path_part.strip_prefix("../")?;
            Some(QuickFix::ReplaceText {
                new_text: format!("{SCHEME}./../{rest}"),
                title: "Add ./ prefix".to_string(),
            })
        },
        DiagnosticCode::DotsInMiddle => {
            let normalized = normalize_dots(path_part);
            if normalized == path_part {
                return None;
            }
            Some(QuickFix::ReplaceText {
                new_text: format!("{SCHEME}{normalized}"),
                title: "Normalize path segments".to_string(),
            })
        },
        DiagnosticCode::MissingFile => {
            let resolved = issue.resolved.as_ref()?;
            Some(QuickFix::CreateFile {
                path: resolved.absolute_path.clone(),
                title: "Create file on disk".to_string(),
            })
        },
        DiagnosticCode::MissingGitRoot | DiagnosticCode::OutsideRepository => None,
    };
}

/// Collapse `..` segments, keeping a `./` prefix and any `#` fragment.
fn normalize_dots(path_part: &str) -> String {
    let (path, fragment) = match path_part.split_once('#') {
        Some((path, fragment)) => (path, Some(fragment)),
        None => (path_part, None),
    };

    let normalized = normalize_link_path(path);
    let keep_dot = path.starts_with("./") && !normalized.starts_with("./") && !normalized.starts_with("..");
    let mut out = if keep_dot { format!("./{normalized}") } else { normalized };
    if let Some(fragment) = fragment {
        out.push('#');
        out.push_str(fragment);
    }
    return out;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ResolvedPath;

    fn issue(code: DiagnosticCode) -> LinkIssue {
        return LinkIssue {
            code,
            message: String::new(),
            resolved: None,
            severity: code.severity(),
        };
    }

    fn replacement(fix: Option<QuickFix>) -> String {
        match fix {
            Some(QuickFix::ReplaceText { new_text, .. }) => new_text,
            other => panic!("expected replacement, got {other:?}"),
        }
    }

    #[test]
    fn removes_leading_slashes() {
        let fix = suggest_fix(&issue(DiagnosticCode::LeadingSlash), "gl://README.md#L2");
        assert_eq!(replacement(fix), "gl:README.md#L2");
    }

    #[test]
    fn adds_dot_prefix() {
        let fix = suggest_fix(&issue(DiagnosticCode::MissingDotPrefix), "gl:../docs/readme.md");
        assert_eq!(replacement(fix), "gl:./../docs/readme.md");
    }

    #[test]
    fn normalizes_middle_dots() {
        let fix = suggest_fix(&issue(DiagnosticCode::DotsInMiddle), "gl:docs/../README.md#L1");
        assert_eq!(replacement(fix), "gl:README.md#L1");

        let fix = suggest_fix(&issue(DiagnosticCode::DotsInMiddle), "gl:./a/../b.md");
        assert_eq!(replacement(fix), "gl:./b.md");
    }

    #[test]
    fn creates_missing_file() {
        let mut missing = issue(DiagnosticCode::MissingFile);
        missing.resolved = Some(ResolvedPath {
            absolute_path: PathBuf::from("/repo/docs/new.md"),
            exists: false,
            relative_path: "docs/new.md".to_string(),
            repository_root: PathBuf::from("/repo"),
        });
        let fix = suggest_fix(&missing, "gl:docs/new.md").unwrap();
        assert_eq!(
            fix,
            QuickFix::CreateFile {
                path: PathBuf::from("/repo/docs/new.md"),
                title: "Create file on disk".to_string(),
            }
        );
    }

    #[test]
    fn no_fix_for_outside_repository() {
        assert!(suggest_fix(&issue(DiagnosticCode::OutsideRepository), "gl:./../x.md").is_none());
    }
}
