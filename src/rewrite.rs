//! Rewriting rendered `gl:` hyperlinks into document-relative hrefs.

use std::path::Path;

use serde::Serialize;

use crate::fragment::parse_link;
use crate::git_root::GitRootLocator;
use crate::resolver;
use crate::types::{LineFragment, ResolutionContext, ResolvedPath};

/// A rendered hyperlink target replacing a `gl:` href.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RewrittenHref {
    /// Fragment without the leading `#`, e.g. `L10-L12`.
    pub fragment: Option<String>,
    /// Percent-encoded path relative to the rendering document.
    pub href: String,
}

impl RewrittenHref {
    /// `href#fragment`, or just `href`.
    pub fn to_href(&self) -> String {
        return match &self.fragment {
            Some(fragment) => format!("{}#{fragment}", self.href),
            None => self.href.clone(),
        };
    }
}

/// Rewrite `href` for a document rendered from `document_path`.
///
/// Only links that resolve to an existing file inside the repository are
/// rewritten; everything else is left to the renderer.
pub fn rewrite_href(href: &str, document_path: &Path, locator: &GitRootLocator) -> Option<RewrittenHref> {
    let link = parse_link(href)?;
    let root = locator.find(document_path)?;
    let context = ResolutionContext::for_document(document_path).with_repository_root(Some(root));

    let resolved = resolver::resolve(&link.path, &context, locator)?;
    if !resolved.exists {
        return None;
    }

    let document = crate::paths::canonicalize_lossy(document_path);
    let relative = resolver::document_relative_path(&document, &resolved.absolute_path);
    return Some(RewrittenHref {
        fragment: link.fragment.as_ref().map(|f| f.without_hash().to_string()),
        href: encode_uri_path(&relative),
    });
}

/// Navigation target for an editor: the absolute path plus `#L..` fragment.
pub fn link_target(resolved: &ResolvedPath, fragment: Option<&LineFragment>) -> String {
    let path = resolved.absolute_path.display().to_string();
    return match fragment {
        Some(fragment) => format!("{path}#{}", fragment.without_hash()),
        None => path,
    };
}

/// Percent-encode a relative path the way `encodeURI` does: reserved URI
/// characters and `/` stay as they are.
fn encode_uri_path(path: &str) -> String {
    const KEEP: &str = "-_.!~*'();/?:@&=+$,#";
    let mut out = String::with_capacity(path.len());
    for byte in path.bytes() {
        if byte.is_ascii_alphanumeric() || KEEP.as_bytes().contains(&byte) {
            out.push(char::from(byte));
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    return out;
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn repo() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let root = std::fs::canonicalize(dir.path()).unwrap().join("repo");
        std::fs::create_dir_all(root.join(".git")).unwrap();
        std::fs::create_dir_all(root.join("docs")).unwrap();
        std::fs::create_dir_all(root.join("src")).unwrap();
        std::fs::write(root.join("docs/guide.md"), "# Guide").unwrap();
        std::fs::write(root.join("src/my file.rs"), "fn main() {}").unwrap();
        (dir, root)
    }

    #[test]
    fn rewrites_to_document_relative_href() {
        let (_dir, root) = repo();
        let rewritten = rewrite_href("gl:src/my file.rs#L2-L4", &root.join("docs/guide.md"), &GitRootLocator::new()).unwrap();
        assert_eq!(rewritten.href, "../src/my%20file.rs");
        assert_eq!(rewritten.fragment.as_deref(), Some("L2-L4"));
        assert_eq!(rewritten.to_href(), "../src/my%20file.rs#L2-L4");
    }

    #[test]
    fn leaves_missing_targets_alone() {
        let (_dir, root) = repo();
        assert!(rewrite_href("gl:src/gone.rs", &root.join("docs/guide.md"), &GitRootLocator::new()).is_none());
    }

    #[test]
    fn leaves_non_links_alone() {
        let (_dir, root) = repo();
        assert!(rewrite_href("https://example.com", &root.join("docs/guide.md"), &GitRootLocator::new()).is_none());
    }

    #[test]
    fn encodes_non_ascii() {
        assert_eq!(encode_uri_path("docs/ä.md"), "docs/%C3%A4.md");
    }

    #[test]
    fn navigation_target_carries_fragment() {
        let resolved = ResolvedPath {
            absolute_path: PathBuf::from("/repo/a.md"),
            exists: true,
            relative_path: "a.md".to_string(),
            repository_root: PathBuf::from("/repo"),
        };
        let fragment = crate::fragment::parse_fragment("#L7").unwrap();
        assert_eq!(link_target(&resolved, Some(&fragment)), "/repo/a.md#L7");
    }
}
