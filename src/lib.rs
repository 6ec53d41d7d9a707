//! Extraction, resolution and validation of `gl:` repository links in markdown.
//!
//! A `gl:` link names a file relative to the repository root
//! (`gl:docs/readme.md`) or to the linking document (`gl:./sibling.md`),
//! optionally with a line fragment (`#L10` or `#L10-L20`).
//!
//! [`scanner::find_all_links`] extracts links from text,
//! [`resolver::resolve`] maps a link path to a location that never escapes
//! the repository, and [`validator::analyze_link`] classifies problems.

pub mod commands;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod fixes;
pub mod fragment;
pub mod git_root;
pub mod hover;
pub mod paths;
pub mod resolver;
pub mod rewrite;
pub mod sanitizer;
pub mod scanner;
pub mod types;
pub mod validator;
pub mod watch;

pub use error::Error;
pub use fragment::{parse_fragment, parse_link};
pub use git_root::{GitRootLocator, MemoryRootCache, RootCache};
pub use resolver::resolve;
pub use scanner::find_all_links;
pub use types::{
    ExtractedMatch, LineFragment, ParsedLink, Position, ReferenceRole, ResolutionContext, ResolvedPath,
    SourceRange, SyntaxKind,
};
pub use validator::{DiagnosticCode, LinkIssue, Severity, analyze_link};
