//! CLI commands for gllink: check, links, resolve, rewrite.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use walkdir::WalkDir;

use crate::config::Config;
use crate::diagnostics::{self, Finding};
use crate::error::Error;
use crate::fragment::parse_link;
use crate::git_root::GitRootLocator;
use crate::resolver;
use crate::rewrite::rewrite_href;
use crate::scanner::find_all_links;
use crate::types::ResolutionContext;
use crate::validator::{Severity, analyze_link};

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Format {
    Json,
    Text,
}

/// Outcome of checking a set of documents.
#[derive(Debug, Default)]
pub struct CheckReport {
    pub document_count: usize,
    pub findings: Vec<Finding>,
    pub link_count: usize,
}

impl CheckReport {
    /// Exit code priority: errors (2) > warnings (1) > clean (0).
    pub fn exit_code(&self) -> ExitCode {
        return match self.findings.iter().map(|f| f.issue.severity).max() {
            Some(Severity::Error) => ExitCode::from(2),
            Some(Severity::Warning) => ExitCode::from(1),
            None => ExitCode::SUCCESS,
        };
    }
}

/// Validate every link in the documents under `paths` (default: `.`).
///
/// # Errors
///
/// Returns errors from config loading or JSON output. Unreadable documents
/// are skipped with a warning.
pub fn check(paths: &[PathBuf], format: Format) -> Result<ExitCode, Error> {
    let root = PathBuf::from(".");
    let config = Config::load(&root)?;
    let report = check_documents(&root, &config, paths, GitRootLocator::shared());

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&report.findings)?),
        Format::Text => {
            for finding in &report.findings {
                println!("{}", diagnostics::render_finding(finding, &root));
            }
            if !report.findings.is_empty() {
                println!();
            }
            println!(
                "{}",
                diagnostics::render_summary(&report.findings, report.link_count, report.document_count)
            );
        },
    }

    return Ok(report.exit_code());
}

/// Scan and validate documents without printing anything.
pub fn check_documents(root: &Path, config: &Config, paths: &[PathBuf], locator: &GitRootLocator) -> CheckReport {
    let mut report = CheckReport::default();

    for document in collect_documents(root, config, paths) {
        let text = match std::fs::read_to_string(&document) {
            Ok(text) => text,
            Err(e) => {
                log::warn!("skipping {}: {e}", document.display());
                continue;
            },
        };
        report.document_count += 1;
        if !text.contains("gl:") {
            continue;
        }

        let absolute = crate::paths::canonicalize_lossy(&document);
        let repository_root = locator.find(&absolute);
        let context = ResolutionContext::for_document(&absolute)
            .with_repository_root(repository_root.clone())
            .with_workspace_root(Some(crate::paths::canonicalize_lossy(root)));

        for link in find_all_links(&text) {
            report.link_count += 1;
            if let Some(issue) = analyze_link(&link, &context, repository_root.as_deref(), locator) {
                report.findings.push(Finding {
                    document: document.clone(),
                    issue,
                    link,
                });
            }
        }
    }

    return report;
}

/// Documents to scan: explicit files as given, directories walked and
/// filtered by the config's extensions and include/exclude prefixes.
fn collect_documents(root: &Path, config: &Config, paths: &[PathBuf]) -> Vec<PathBuf> {
    let default_roots = [root.to_path_buf()];
    let roots = if paths.is_empty() { &default_roots[..] } else { paths };

    let mut documents = Vec::new();
    for start in roots {
        if start.is_file() {
            documents.push(start.clone());
            continue;
        }
        for entry in WalkDir::new(start)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || e.file_name() != ".git")
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file() && config.is_document(e.path()))
        {
            let path = entry.path();
            let relative = path.strip_prefix(root).unwrap_or(path);
            let relative = relative.strip_prefix(".").unwrap_or(relative);
            if config.should_scan(&relative.to_string_lossy()) {
                documents.push(path.to_path_buf());
            }
        }
    }
    return documents;
}

/// List every link extracted from `file`.
///
/// # Errors
///
/// Returns `Error::DocumentNotFound` if the file can't be read, or JSON errors.
pub fn links(file: &Path, format: Format) -> Result<ExitCode, Error> {
    let text = read_document(file)?;
    let matches = find_all_links(&text);

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&matches)?),
        Format::Text => {
            for m in &matches {
                println!(
                    "{}:{}  {:?}  {}",
                    m.range.start.line.saturating_add(1),
                    m.range.start.character.saturating_add(1),
                    m.kind,
                    m.source_text
                );
            }
        },
    }
    return Ok(ExitCode::SUCCESS);
}

/// Resolve one link as seen from `document`.
///
/// # Errors
///
/// Returns `Error::NotALink` for unparseable input, `Error::Unresolvable`
/// when there is no root or the target escapes it.
pub fn resolve(document: &Path, link_text: &str, format: Format) -> Result<ExitCode, Error> {
    let link = parse_link(link_text).ok_or_else(|| Error::NotALink {
        text: link_text.to_string(),
    })?;
    let absolute = crate::paths::canonicalize_lossy(document);
    let context = ResolutionContext::for_document(&absolute);
    let resolved = resolver::resolve(&link.path, &context, GitRootLocator::shared()).ok_or_else(|| {
        Error::Unresolvable {
            document: document.to_path_buf(),
            link: link_text.to_string(),
        }
    })?;

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&resolved)?),
        Format::Text => {
            println!("{}", crate::rewrite::link_target(&resolved, link.fragment.as_ref()));
            if !resolved.exists {
                eprintln!("warning: {} does not exist", resolved.relative_path);
            }
        },
    }
    return Ok(if resolved.exists { ExitCode::SUCCESS } else { ExitCode::from(1) });
}

/// Print the document-relative href a renderer should use for `href`.
///
/// # Errors
///
/// Returns `Error::NotALink` if `href` isn't a `gl:` link, or
/// `Error::Unresolvable` if it doesn't resolve to an existing file.
pub fn rewrite(document: &Path, href: &str) -> Result<ExitCode, Error> {
    if parse_link(href).is_none() {
        return Err(Error::NotALink { text: href.to_string() });
    }
    let rewritten = rewrite_href(href, document, GitRootLocator::shared()).ok_or_else(|| Error::Unresolvable {
        document: document.to_path_buf(),
        link: href.to_string(),
    })?;
    println!("{}", rewritten.to_href());
    return Ok(ExitCode::SUCCESS);
}

fn read_document(file: &Path) -> Result<String, Error> {
    return match std::fs::read_to_string(file) {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(Error::DocumentNotFound {
            path: file.to_path_buf(),
        }),
        Err(e) => Err(Error::Io(e)),
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::DiagnosticCode;

    fn repo() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let root = std::fs::canonicalize(dir.path()).unwrap();
        std::fs::create_dir_all(root.join(".git")).unwrap();
        std::fs::create_dir_all(root.join("docs/archive")).unwrap();
        std::fs::write(root.join("docs/readme.md"), "# Readme").unwrap();
        (dir, root)
    }

    #[test]
    fn reports_issues_across_documents() {
        let (_dir, root) = repo();
        std::fs::write(root.join("docs/guide.md"), "gl:docs/readme.md and gl:/x.md\n").unwrap();
        std::fs::write(root.join("docs/archive/old.md"), "gl:docs/gone.md\n").unwrap();
        std::fs::write(root.join("notes.txt"), "gl:/ignored.md\n").unwrap();

        let report = check_documents(&root, &Config::default(), &[], &GitRootLocator::new());
        let codes: Vec<_> = report.findings.iter().map(|f| f.issue.code).collect();
        assert_eq!(codes, vec![DiagnosticCode::MissingFile, DiagnosticCode::LeadingSlash]);
        assert_eq!(report.link_count, 3);
        assert_eq!(report.exit_code(), ExitCode::from(2));
    }

    #[test]
    fn skips_git_directory() {
        let (_dir, root) = repo();
        std::fs::write(root.join(".git/notes.md"), "gl:/bad.md").unwrap();
        let report = check_documents(&root, &Config::default(), &[], &GitRootLocator::new());
        assert!(report.findings.is_empty());
    }

    #[test]
    fn explicit_file_paths() {
        let (_dir, root) = repo();
        let doc = root.join("docs/one.md");
        std::fs::write(&doc, "gl:./readme.md").unwrap();
        let report = check_documents(&root, &Config::default(), &[doc], &GitRootLocator::new());
        assert_eq!(report.document_count, 1);
        assert!(report.findings.is_empty());
        assert_eq!(report.exit_code(), ExitCode::SUCCESS);
    }
}
