/// Crate-level error types for gllink operations.
use std::path::PathBuf;

/// Operational failures of the command layer. Link problems found in
/// documents are never errors; they are reported as `LinkIssue`s.
#[allow(clippy::error_impl_error, reason = "crate-level error type")]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A document named on the command line does not exist.
    #[error("document not found: {}", path.display())]
    DocumentNotFound {
        /// Path to the missing document.
        path: PathBuf,
    },

    /// Underlying I/O error from the filesystem.
    #[error("io: {0}")]
    Io(
        /// The wrapped I/O error.
        #[from]
        std::io::Error,
    ),

    /// JSON serialization of command output failed.
    #[error("json: {0}")]
    Json(
        /// The wrapped JSON error.
        #[from]
        serde_json::Error,
    ),

    /// Text given where a `gl:` link was expected doesn't parse as one.
    #[error("not a gl: link: `{text}`")]
    NotALink {
        /// The offending text.
        text: String,
    },

    /// TOML deserialization of `.gllink.toml` failed.
    #[error("toml deserialize: {0}")]
    TomlDe(
        /// The wrapped TOML deserialization error.
        #[from]
        toml::de::Error,
    ),

    /// A link could not be resolved inside the document's repository.
    #[error("cannot resolve `{link}` from {}", document.display())]
    Unresolvable {
        /// Document the link was resolved from.
        document: PathBuf,
        /// The link text.
        link: String,
    },

    /// The filesystem watcher could not be set up.
    #[error("watch failed: {reason}")]
    WatchFailed {
        /// Description of the failure.
        reason: String,
    },
}
