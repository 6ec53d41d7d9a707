//! Lexical and filesystem path normalization shared by the locator and resolver.

use std::path::{Component, Path, PathBuf};

/// Collapse `.` and `..` components in a path without touching the filesystem.
/// Preserves leading `..` when there is nothing left to pop, and never pops
/// past a root.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut components: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        push_normalized_component(&mut components, component);
    }
    if components.is_empty() {
        return PathBuf::from(".");
    }
    return components.iter().collect();
}

/// Handle a single path component during normalization.
/// Pops the last component for `..` when possible, preserves it otherwise.
fn push_normalized_component<'a>(components: &mut Vec<Component<'a>>, component: Component<'a>) {
    match component {
        Component::CurDir => {},
        Component::ParentDir => match components.last() {
            Some(Component::Normal(_)) => {
                components.pop();
            },
            Some(Component::RootDir | Component::Prefix(_)) => {},
            _ => components.push(component),
        },
        other => components.push(other),
    }
}

/// Resolve symlinks as far as the filesystem allows.
///
/// The path is made absolute and normalized lexically, then the deepest
/// existing ancestor is canonicalized and the missing tail re-appended. A path
/// that exists entirely is fully canonical; one that doesn't exist at all is
/// returned in lexical form.
pub fn canonicalize_lossy(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
    };
    let normalized = normalize_lexically(&absolute);

    let mut tail: Vec<&std::ffi::OsStr> = Vec::new();
    let mut existing: &Path = &normalized;
    loop {
        if let Ok(canonical) = std::fs::canonicalize(existing) {
            return tail.iter().rev().fold(canonical, |acc, part| acc.join(part));
        }
        let (Some(parent), Some(name)) = (existing.parent(), existing.file_name()) else {
            return normalized.clone();
        };
        tail.push(name);
        existing = parent;
    }
}

/// Render a relative path with forward slashes regardless of platform.
pub fn to_forward_slashes(path: &Path) -> String {
    return path
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_parent_segments() {
        assert_eq!(normalize_lexically(Path::new("docs/../src/./lib.rs")), PathBuf::from("src/lib.rs"));
    }

    #[test]
    fn preserves_leading_parent_segments() {
        assert_eq!(normalize_lexically(Path::new("../../a/b/..")), PathBuf::from("../../a"));
    }

    #[test]
    fn does_not_escape_root() {
        assert_eq!(normalize_lexically(Path::new("/repo/../../etc")), PathBuf::from("/etc"));
    }

    #[test]
    fn canonicalizes_existing_prefix_of_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let real = std::fs::canonicalize(dir.path()).unwrap();
        let missing = dir.path().join("nested/../missing/file.md");
        assert_eq!(canonicalize_lossy(&missing), real.join("missing").join("file.md"));
    }

    #[cfg(unix)]
    #[test]
    fn resolves_symlinked_directories() {
        let dir = tempfile::tempdir().unwrap();
        let real = std::fs::canonicalize(dir.path()).unwrap();
        std::fs::create_dir(real.join("target")).unwrap();
        std::os::unix::fs::symlink(real.join("target"), real.join("link")).unwrap();
        assert_eq!(canonicalize_lossy(&real.join("link/new.md")), real.join("target").join("new.md"));
    }

    #[test]
    fn forward_slashes() {
        let path: PathBuf = ["docs", "dev", "design.md"].iter().collect();
        assert_eq!(to_forward_slashes(&path), "docs/dev/design.md");
    }
}
