//! Resolution of `gl:` paths to containment-checked filesystem locations.

use std::path::{Path, PathBuf};

use crate::git_root::GitRootLocator;
use crate::paths::{canonicalize_lossy, normalize_lexically, to_forward_slashes};
use crate::types::{ResolutionContext, ResolvedPath};

/// Prefix marking a path as relative to the document rather than the root.
const DOCUMENT_RELATIVE_PREFIX: &str = "./";

/// The repository root for a context: the hint if given, else a `.git` search
/// from the document.
pub fn repository_root(context: &ResolutionContext, locator: &GitRootLocator) -> Option<PathBuf> {
    return context
        .repository_root_hint
        .clone()
        .or_else(|| locator.find(&context.document_path));
}

/// Resolve a scheme-relative path against a document's repository.
///
/// `./`-prefixed paths resolve from the document's directory, all others from
/// the repository root. Returns `None` if no root can be found or the target
/// lies outside the root after symlinks and `..` segments are resolved. A
/// target that doesn't exist still resolves, with `exists` set to false.
pub fn resolve(link_path: &str, context: &ResolutionContext, locator: &GitRootLocator) -> Option<ResolvedPath> {
    let root = canonicalize_lossy(&repository_root(context, locator)?);
    let native = native_link_path(link_path);

    let base = if link_path.starts_with(DOCUMENT_RELATIVE_PREFIX) {
        canonicalize_lossy(&context.document_directory)
    } else {
        root.clone()
    };
    let candidate = normalize_lexically(&base.join(&native));

    // Checked lexically first, then again once symlinks are resolved.
    if !is_within_repository(&candidate, &root) {
        log::debug!("rejected {link_path}: escapes {}", root.display());
        return None;
    }

    let canonical = canonicalize_lossy(&candidate);
    let Some(relative) = relative_to(&canonical, &root) else {
        log::debug!("rejected {link_path}: {} is outside {}", canonical.display(), root.display());
        return None;
    };

    let relative_path = if relative.as_os_str().is_empty() {
        canonical
            .file_name()
            .map_or_else(String::new, |name| name.to_string_lossy().into_owned())
    } else {
        to_forward_slashes(&relative)
    };

    return Some(ResolvedPath {
        exists: canonical.exists(),
        absolute_path: canonical,
        relative_path,
        repository_root: root,
    });
}

/// Whether `path` lies inside `root` (or is `root` itself). Both are compared
/// after lexical normalization.
pub fn is_within_repository(path: &Path, root: &Path) -> bool {
    return relative_to(&normalize_lexically(path), &normalize_lexically(root)).is_some();
}

/// Forward-slash path from the directory of `from_file` to `to_file`.
/// Falls back to the basename of `to_file` when the two are the same file.
pub fn document_relative_path(from_file: &Path, to_file: &Path) -> String {
    let from_dir = normalize_lexically(from_file.parent().unwrap_or(Path::new("")));
    let to_file = normalize_lexically(to_file);

    let from_parts: Vec<_> = from_dir.components().collect();
    let to_parts: Vec<_> = to_file.components().collect();
    let shared = from_parts
        .iter()
        .zip(&to_parts)
        .take_while(|(a, b)| a == b)
        .count();

    let mut segments: Vec<String> = vec!["..".to_string(); from_parts.len() - shared];
    segments.extend(to_parts[shared..].iter().map(|c| c.as_os_str().to_string_lossy().into_owned()));

    if segments.is_empty() {
        return to_file
            .file_name()
            .map_or_else(String::new, |name| name.to_string_lossy().into_owned());
    }
    return segments.join("/");
}

/// `path` relative to `root`, or `None` if it would need a parent traversal.
fn relative_to(path: &Path, root: &Path) -> Option<PathBuf> {
    let relative = path.strip_prefix(root).ok()?;
    if relative.is_absolute() || relative.components().any(|c| matches!(c, std::path::Component::ParentDir)) {
        return None;
    }
    return Some(relative.to_path_buf());
}

/// Link paths always use `/`; convert to the platform separator.
fn native_link_path(link_path: &str) -> PathBuf {
    return link_path.split('/').filter(|part| !part.is_empty()).collect();
}
