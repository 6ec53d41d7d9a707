//! Policy checks that classify an extracted link into a diagnostic.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::git_root::GitRootLocator;
use crate::paths::{normalize_lexically, to_forward_slashes};
use crate::resolver;
use crate::types::{ExtractedMatch, ResolutionContext, ResolvedPath};

/// Stable identifiers consumed by diagnostics surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DiagnosticCode {
    /// Path contains `/../` after its first segment.
    DotsInMiddle,
    /// Path starts with one or more `/`.
    LeadingSlash,
    /// Target resolves inside the repository but isn't on disk.
    MissingFile,
    /// No `.git` found above the document.
    MissingGitRoot,
    /// `../` traversal without the required `./` prefix.
    MissingDotPrefix,
    /// Target lies outside the repository root.
    OutsideRepository,
}

impl DiagnosticCode {
    pub fn as_str(self) -> &'static str {
        return match self {
            DiagnosticCode::DotsInMiddle => "gl-dots-in-middle",
            DiagnosticCode::LeadingSlash => "gl-leading-slash",
            DiagnosticCode::MissingFile => "gl-missing-file",
            DiagnosticCode::MissingGitRoot => "gl-missing-git-root",
            DiagnosticCode::MissingDotPrefix => "gl-missing-dot-prefix",
            DiagnosticCode::OutsideRepository => "gl-outside-repo",
        };
    }

    /// The fixed severity of each code.
    pub fn severity(self) -> Severity {
        return match self {
            DiagnosticCode::MissingFile | DiagnosticCode::MissingGitRoot => Severity::Warning,
            DiagnosticCode::DotsInMiddle
            | DiagnosticCode::LeadingSlash
            | DiagnosticCode::MissingDotPrefix
            | DiagnosticCode::OutsideRepository => Severity::Error,
        };
    }
}

impl std::fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return f.write_str(self.as_str());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

/// A problem found with one link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkIssue {
    pub code: DiagnosticCode,
    /// Human-readable explanation, including a suggested spelling where one exists.
    pub message: String,
    /// Set for `MissingFile`, where resolution succeeded.
    pub resolved: Option<ResolvedPath>,
    pub severity: Severity,
}

impl LinkIssue {
    fn new(code: DiagnosticCode, message: String) -> Self {
        return Self {
            code,
            message,
            resolved: None,
            severity: code.severity(),
        };
    }
}

/// Classify a link, returning `None` when it is valid.
///
/// Checks run in priority order and the first failure wins: path syntax
/// first, then the repository root, then resolution and existence.
/// `repository_root` is the root the caller already knows about, if any.
pub fn analyze_link(
    link: &ExtractedMatch,
    context: &ResolutionContext,
    repository_root: Option<&Path>,
    locator: &GitRootLocator,
) -> Option<LinkIssue> {
    let path = link.link.path.as_str();

    let without_slashes = path.trim_start_matches('/');
    if without_slashes.len() != path.len() {
        let suggestion = if without_slashes.is_empty() {
            "gl:<path>".to_string()
        } else {
            format!("gl:{without_slashes}")
        };
        return Some(LinkIssue::new(
            DiagnosticCode::LeadingSlash,
            format!("Remove leading slash: use {suggestion}."),
        ));
    }

    if path.starts_with("../") {
        return Some(LinkIssue::new(
            DiagnosticCode::MissingDotPrefix,
            format!("Relative navigation requires ./ prefix. Use gl:./{path} instead."),
        ));
    }

    if has_dots_in_middle(path) {
        return Some(LinkIssue::new(
            DiagnosticCode::DotsInMiddle,
            format!(
                "Remove '..' segments from the middle of the path (e.g. gl:{path} -> gl:{}).",
                normalize_link_path(path)
            ),
        ));
    }

    let Some(root) = repository_root
        .map(Path::to_path_buf)
        .or_else(|| resolver::repository_root(context, locator))
    else {
        return Some(LinkIssue::new(
            DiagnosticCode::MissingGitRoot,
            "Unable to locate repository root for gl: links.".to_string(),
        ));
    };

    let context = with_root_hint(context, root);
    let Some(resolved) = resolver::resolve(path, &context, locator) else {
        let message = if path.starts_with("./../") {
            "Cross-repository gl: links are not supported."
        } else {
            "Target cannot be resolved within the current repository."
        };
        return Some(LinkIssue::new(DiagnosticCode::OutsideRepository, message.to_string()));
    };

    if !resolved.exists {
        let display = if resolved.relative_path.is_empty() {
            path.to_string()
        } else {
            resolved.relative_path.clone()
        };
        let mut issue = LinkIssue::new(
            DiagnosticCode::MissingFile,
            format!("gl: target file '{display}' does not exist."),
        );
        issue.resolved = Some(resolved);
        return Some(issue);
    }

    return None;
}

/// `/../` preceded by something other than a `.`, so `./../x` is allowed.
pub(crate) fn has_dots_in_middle(path: &str) -> bool {
    return path
        .match_indices("/../")
        .any(|(index, _)| index == 0 || !path[..index].ends_with('.'));
}

/// Lexically collapse `..` segments of a link path, keeping `/` separators.
pub(crate) fn normalize_link_path(path: &str) -> String {
    return to_forward_slashes(&normalize_lexically(Path::new(path)));
}

fn with_root_hint(context: &ResolutionContext, root: PathBuf) -> ResolutionContext {
    if context.repository_root_hint.is_some() {
        return context.clone();
    }
    return context.clone().with_repository_root(Some(root));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::find_all_links;

    struct Fixture {
        _dir: tempfile::TempDir,
        root: PathBuf,
        document: PathBuf,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let root = std::fs::canonicalize(dir.path()).unwrap().join("repo");
        std::fs::create_dir_all(root.join(".git")).unwrap();
        std::fs::create_dir_all(root.join("docs")).unwrap();
        let document = root.join("docs/readme.md");
        std::fs::write(&document, "content").unwrap();
        Fixture { _dir: dir, root, document }
    }

    fn evaluate(fx: &Fixture, document: &Path, sample: &str) -> Option<LinkIssue> {
        let matches = find_all_links(sample);
        assert!(!matches.is_empty(), "expected a gl: link in {sample}");
        let context = ResolutionContext::for_document(document)
            .with_repository_root(Some(fx.root.clone()))
            .with_workspace_root(Some(fx.root.clone()));
        return analyze_link(&matches[0], &context, Some(&fx.root), &GitRootLocator::new());
    }

    #[test]
    fn valid_link_with_fragment() {
        let fx = fixture();
        let matches = find_all_links("Intro gl:docs/readme.md#L10.");
        assert_eq!(matches.len(), 1);
        assert_eq!(evaluate(&fx, &fx.document, "Intro gl:docs/readme.md#L10."), None);
    }

    #[test]
    fn flags_leading_slash() {
        let fx = fixture();
        let issue = evaluate(&fx, &fx.document, "gl:/README.md").unwrap();
        assert_eq!(issue.code, DiagnosticCode::LeadingSlash);
        assert_eq!(issue.severity, Severity::Error);
        assert!(issue.message.contains("Remove leading slash: use gl:README.md"));
    }

    #[test]
    fn flags_missing_dot_prefix() {
        let fx = fixture();
        let issue = evaluate(&fx, &fx.document, "gl:../docs/readme.md").unwrap();
        assert_eq!(issue.code, DiagnosticCode::MissingDotPrefix);
        assert_eq!(issue.severity, Severity::Error);
    }

    #[test]
    fn flags_dots_in_middle() {
        let fx = fixture();
        let issue = evaluate(&fx, &fx.document, "gl:docs/../README.md").unwrap();
        assert_eq!(issue.code, DiagnosticCode::DotsInMiddle);
        assert!(issue.message.contains("gl:README.md"));
    }

    #[test]
    fn flags_cross_repository_traversal() {
        let fx = fixture();
        let document = fx.root.join("README.md");
        std::fs::write(&document, "root readme").unwrap();
        let issue = evaluate(&fx, &document, "gl:./../other-repo/README.md").unwrap();
        assert_eq!(issue.code, DiagnosticCode::OutsideRepository);
        assert!(issue.message.contains("Cross-repository"));
    }

    #[test]
    fn warns_when_file_is_missing() {
        let fx = fixture();
        let issue = evaluate(&fx, &fx.document, "gl:docs/missing.md").unwrap();
        assert_eq!(issue.code, DiagnosticCode::MissingFile);
        assert_eq!(issue.severity, Severity::Warning);
        assert!(issue.resolved.is_some_and(|r| !r.exists));
    }

    #[test]
    fn warns_when_git_root_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let locator = GitRootLocator::new();
        if locator.find(dir.path()).is_some() {
            return;
        }
        let matches = find_all_links("gl:docs/readme.md");
        let context = ResolutionContext::for_document(dir.path().join("readme.md"));
        let issue = analyze_link(&matches[0], &context, None, &locator).unwrap();
        assert_eq!(issue.code, DiagnosticCode::MissingGitRoot);
        assert_eq!(issue.severity, Severity::Warning);
    }

    #[test]
    fn syntax_checks_precede_root_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let matches = find_all_links("gl:/x.md");
        let context = ResolutionContext::for_document(dir.path().join("readme.md"));
        let issue = analyze_link(&matches[0], &context, None, &GitRootLocator::new()).unwrap();
        assert_eq!(issue.code, DiagnosticCode::LeadingSlash);
    }

    #[test]
    fn dot_prefixed_traversal_is_not_dots_in_middle() {
        assert!(!has_dots_in_middle("./../x"));
        assert!(!has_dots_in_middle("./../../x"));
        assert!(has_dots_in_middle("a/../b"));
        assert!(has_dots_in_middle("./a/../b"));
    }

    #[test]
    fn codes_have_stable_identifiers() {
        assert_eq!(DiagnosticCode::OutsideRepository.as_str(), "gl-outside-repo");
        assert_eq!(DiagnosticCode::MissingDotPrefix.to_string(), "gl-missing-dot-prefix");
    }
}
