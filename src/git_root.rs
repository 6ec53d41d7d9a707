//! Repository root discovery with a memoizing, clearable cache.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock, Mutex, PoisonError};

use crate::paths::canonicalize_lossy;

/// Storage for git-root lookups, keyed by canonical directory.
///
/// A stored `None` means "walked to the filesystem root without finding
/// `.git`" and is as final as a found root.
pub trait RootCache: Send + Sync {
    /// Forget every memoized lookup.
    fn clear(&self);
    /// The memoized outcome for `dir`, or `None` if `dir` was never visited.
    fn get(&self, dir: &Path) -> Option<Option<PathBuf>>;
    /// Memoize `root` as the outcome for `dir`.
    fn set(&self, dir: PathBuf, root: Option<PathBuf>);
}

/// In-memory [`RootCache`]. Entries never expire on their own.
#[derive(Debug, Default)]
pub struct MemoryRootCache {
    entries: Mutex<HashMap<PathBuf, Option<PathBuf>>>,
}

impl MemoryRootCache {
    /// Number of memoized directories.
    pub fn len(&self) -> usize {
        return self.entries.lock().unwrap_or_else(PoisonError::into_inner).len();
    }

    pub fn is_empty(&self) -> bool {
        return self.len() == 0;
    }
}

impl RootCache for MemoryRootCache {
    fn clear(&self) {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }

    fn get(&self, dir: &Path) -> Option<Option<PathBuf>> {
        return self.entries.lock().unwrap_or_else(PoisonError::into_inner).get(dir).cloned();
    }

    fn set(&self, dir: PathBuf, root: Option<PathBuf>) {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).insert(dir, root);
    }
}

/// Finds the nearest ancestor directory holding a `.git` entry.
#[derive(Clone)]
pub struct GitRootLocator {
    cache: Arc<dyn RootCache>,
    /// Serializes walks so concurrent lookups never repeat the same traversal.
    walk_lock: Arc<Mutex<()>>,
}

static SHARED: LazyLock<GitRootLocator> = LazyLock::new(GitRootLocator::new);

impl GitRootLocator {
    /// A locator with its own private in-memory cache.
    pub fn new() -> Self {
        return Self::with_cache(Arc::new(MemoryRootCache::default()));
    }

    /// A locator backed by an injected cache.
    pub fn with_cache(cache: Arc<dyn RootCache>) -> Self {
        return Self {
            cache,
            walk_lock: Arc::new(Mutex::new(())),
        };
    }

    /// The process-wide locator. Clones share its cache.
    pub fn shared() -> &'static Self {
        return &SHARED;
    }

    /// Peek at the memoized root for `dir` without walking.
    pub fn cached(&self, dir: &Path) -> Option<PathBuf> {
        return self.cache.get(&canonicalize_lossy(dir)).flatten();
    }

    /// Drop every memoized lookup.
    pub fn clear(&self) {
        log::debug!("git-root cache cleared");
        self.cache.clear();
    }

    /// Nearest ancestor of `start` (a file or directory) that directly
    /// contains a `.git` directory or file.
    ///
    /// Every directory visited on the way is memoized to the final outcome,
    /// including "not found".
    pub fn find(&self, start: &Path) -> Option<PathBuf> {
        let start_dir = if start.is_dir() {
            start.to_path_buf()
        } else {
            start.parent().map_or_else(|| start.to_path_buf(), Path::to_path_buf)
        };

        let _walk = self.walk_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut dir = canonicalize_lossy(&start_dir);
        let mut visited: Vec<PathBuf> = Vec::new();

        let outcome = loop {
            if let Some(cached) = self.cache.get(&dir) {
                log::debug!("git-root cache hit for {}", dir.display());
                break cached;
            }
            visited.push(dir.clone());

            if has_git_entry(&dir) {
                log::debug!("found .git in {}", dir.display());
                break Some(dir.clone());
            }

            let Some(parent) = dir.parent() else {
                log::debug!("no .git above {}", start.display());
                break None;
            };
            dir = canonicalize_lossy(parent);
        };

        for entry in visited {
            self.cache.set(entry, outcome.clone());
        }
        return outcome;
    }
}

impl Default for GitRootLocator {
    fn default() -> Self {
        return Self::new();
    }
}

impl std::fmt::Debug for GitRootLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return f.debug_struct("GitRootLocator").finish_non_exhaustive();
    }
}

/// `.git` may be a directory or, for linked worktrees, a file.
fn has_git_entry(dir: &Path) -> bool {
    return std::fs::metadata(dir.join(".git")).is_ok_and(|meta| meta.is_dir() || meta.is_file());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let root = std::fs::canonicalize(dir.path()).unwrap().join("repo");
        std::fs::create_dir_all(root.join(".git")).unwrap();
        std::fs::create_dir_all(root.join("docs/dev")).unwrap();
        std::fs::write(root.join("docs/guide.md"), "# Guide").unwrap();
        (dir, root)
    }

    #[test]
    fn finds_root_from_file() {
        let (_dir, root) = repo();
        let locator = GitRootLocator::new();
        assert_eq!(locator.find(&root.join("docs/guide.md")), Some(root.clone()));
    }

    #[test]
    fn finds_root_from_missing_file() {
        let (_dir, root) = repo();
        let locator = GitRootLocator::new();
        assert_eq!(locator.find(&root.join("docs/dev/unsaved.md")), Some(root.clone()));
    }

    #[test]
    fn accepts_git_file_for_worktrees() {
        let dir = tempfile::tempdir().unwrap();
        let root = std::fs::canonicalize(dir.path()).unwrap();
        std::fs::write(root.join(".git"), "gitdir: /elsewhere/.git/worktrees/x").unwrap();
        let locator = GitRootLocator::new();
        assert_eq!(locator.find(&root), Some(root.clone()));
    }

    #[test]
    fn memoizes_every_visited_directory() {
        let (_dir, root) = repo();
        let cache = Arc::new(MemoryRootCache::default());
        let locator = GitRootLocator::with_cache(cache.clone());

        locator.find(&root.join("docs/dev"));
        assert_eq!(cache.get(&root.join("docs/dev")), Some(Some(root.clone())));
        assert_eq!(cache.get(&root.join("docs")), Some(Some(root.clone())));
        assert_eq!(cache.get(&root), Some(Some(root.clone())));
        assert_eq!(locator.cached(&root.join("docs")), Some(root.clone()));
    }

    #[test]
    fn cached_outcome_is_reused_without_touching_disk() {
        let (_dir, root) = repo();
        let locator = GitRootLocator::new();
        assert_eq!(locator.find(&root.join("docs")), Some(root.clone()));

        std::fs::remove_dir_all(root.join(".git")).unwrap();
        assert_eq!(locator.find(&root.join("docs/guide.md")), Some(root.clone()));

        locator.clear();
        assert_ne!(locator.find(&root.join("docs/guide.md")), Some(root.clone()));
    }

    #[test]
    fn separate_locators_have_isolated_caches() {
        let (_dir, root) = repo();
        let first = GitRootLocator::new();
        let second = GitRootLocator::new();
        first.find(&root.join("docs"));
        assert!(second.cached(&root.join("docs")).is_none());
    }

    #[test]
    fn clones_share_cache() {
        let (_dir, root) = repo();
        let locator = GitRootLocator::new();
        let clone = locator.clone();
        locator.find(&root.join("docs"));
        assert_eq!(clone.cached(&root.join("docs")), Some(root.clone()));
    }

    #[test]
    fn shared_locator_is_a_single_instance() {
        let (_dir, root) = repo();
        assert_eq!(GitRootLocator::shared().find(&root.join("docs")), Some(root.clone()));
        assert!(std::ptr::eq(GitRootLocator::shared(), GitRootLocator::shared()));
    }

    #[test]
    fn concurrent_lookups_agree_and_memoize_once() {
        let (_dir, root) = repo();
        let cache = Arc::new(MemoryRootCache::default());
        let locator = GitRootLocator::with_cache(cache.clone());
        let starts = [root.join("docs/dev"), root.join("docs/guide.md"), root.clone()];

        let found: Vec<Option<PathBuf>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|i| {
                    let locator = &locator;
                    let start = &starts[i % starts.len()];
                    scope.spawn(move || locator.find(start))
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert!(found.iter().all(|r| r.as_deref() == Some(root.as_path())));
        assert_eq!(cache.len(), 3);
        assert_eq!(locator.cached(&root.join("docs/dev")), Some(root.clone()));
    }
}
