//! Text summaries of a link's resolution, as shown in hover tooltips.

use std::path::Path;

use crate::git_root::GitRootLocator;
use crate::paths::{normalize_lexically, to_forward_slashes};
use crate::resolver;
use crate::types::{ExtractedMatch, ResolutionContext, ResolvedPath};

/// Lines describing where `link` points, starting with the link text itself.
///
/// Existing targets render as `path`, `path line N` or `path lines N–M`.
/// Anything else renders `Status:`, `Expected:` and `Found:` lines.
pub fn hover_lines(
    link: &ExtractedMatch,
    context: &ResolutionContext,
    repository_root: Option<&Path>,
    locator: &GitRootLocator,
) -> Vec<String> {
    let mut lines = vec![format!("`{}`", link.source_text)];
    let root = repository_root
        .map(Path::to_path_buf)
        .or_else(|| resolver::repository_root(context, locator));
    let hinted = context.clone().with_repository_root(root.clone());

    match resolver::resolve(&link.link.path, &hinted, locator) {
        Some(resolved) if resolved.exists => lines.push(describe_target(&resolved, link)),
        Some(resolved) => {
            lines.push("Status: Target missing.".to_string());
            lines.push(format!("Expected: `{}`", display_path(&resolved)));
            lines.push("Found: not on disk.".to_string());
        },
        None => describe_unresolved(link, context, root.as_deref(), &mut lines),
    }
    return lines;
}

fn describe_target(resolved: &ResolvedPath, link: &ExtractedMatch) -> String {
    let path = display_path(resolved);
    return match &link.link.fragment {
        None => path,
        Some(fragment) => match fragment.end_line {
            Some(end) if end != fragment.start_line => format!("{path} lines {}–{end}", fragment.start_line),
            _ => format!("{path} line {}", fragment.start_line),
        },
    };
}

fn describe_unresolved(
    link: &ExtractedMatch,
    context: &ResolutionContext,
    repository_root: Option<&Path>,
    lines: &mut Vec<String>,
) {
    let link_path = link.link.path.as_str();
    let Some(root) = repository_root else {
        lines.push("Status: Cannot resolve link.".to_string());
        lines.push(format!("Expected: `{link_path}`"));
        lines.push("Found: Repository root not detected.".to_string());
        return;
    };

    let base = if link_path.starts_with("./") { context.document_directory.as_path() } else { root };
    let candidate = normalize_lexically(&base.join(link_path.trim_start_matches('/')));
    let root = normalize_lexically(root);

    if resolver::is_within_repository(&candidate, &root) {
        let expected = candidate
            .strip_prefix(&root)
            .map_or_else(|_| link_path.to_string(), to_forward_slashes);
        lines.push("Status: Cannot resolve target.".to_string());
        lines.push(format!("Expected: `{expected}`"));
        return;
    }

    lines.push("Status: Link resolves outside the repository.".to_string());
    lines.push(format!("Expected: `{link_path}`"));
    lines.push(format!("Found: outside repository (`{}`)", outside_display(&candidate, &root)));
}

/// `../`-style display of a candidate that escapes `root`.
fn outside_display(candidate: &Path, root: &Path) -> String {
    let pseudo_document = root.join("_");
    return resolver::document_relative_path(&pseudo_document, candidate);
}

fn display_path(resolved: &ResolvedPath) -> String {
    if resolved.relative_path.is_empty() {
        return resolved
            .absolute_path
            .file_name()
            .map_or_else(String::new, |name| name.to_string_lossy().into_owned());
    }
    return resolved.relative_path.replace('\\', "/");
}
