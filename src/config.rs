use std::path::Path;

use crate::error::Error;

/// Name of the project configuration file.
pub const CONFIG_FILE: &str = ".gllink.toml";

/// Project configuration loaded from `.gllink.toml`.
/// Include/exclude patterns are path prefixes applied to scanned documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    exclude: Vec<String>,
    extensions: Vec<String>,
    include: Vec<String>,
}

/// Raw TOML structure for `.gllink.toml`.
#[derive(serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct GllinkTomlConfig {
    #[serde(default)]
    exclude: Vec<String>,
    #[serde(default)]
    extensions: Option<Vec<String>>,
    #[serde(default)]
    include: Vec<String>,
}

impl Config {
    /// Load config from `.gllink.toml` in the given root directory.
    /// Returns a default that scans every markdown file if the file doesn't
    /// exist. Returns an error if the file exists but is malformed; a config
    /// the user wrote is never silently ignored.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if reading fails (other than not-found),
    /// or `Error::TomlDe` if the TOML is malformed.
    pub fn load(root: &Path) -> Result<Self, Error> {
        let path = root.join(CONFIG_FILE);
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(Error::Io(e)),
        };

        let raw: GllinkTomlConfig = toml::from_str(&content)?;
        log::debug!("loaded {}", path.display());
        return Ok(Self {
            exclude: raw.exclude,
            extensions: raw.extensions.unwrap_or_else(default_extensions),
            include: raw.include,
        });
    }

    /// Whether a file's extension marks it as a document to scan.
    pub fn is_document(&self, path: &Path) -> bool {
        return path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)));
    }

    /// Check whether a document path should be scanned.
    ///
    /// A path is included if no include patterns are set (scan everything),
    /// or if the path starts with at least one include pattern.
    /// An included path is then excluded if it starts with any exclude pattern.
    pub fn should_scan(&self, relative_path: &str) -> bool {
        let included = self.include.is_empty()
            || self.include.iter().any(|p| relative_path.starts_with(p.as_str()));

        if !included {
            return false;
        }

        return !self.exclude.iter().any(|p| relative_path.starts_with(p.as_str()));
    }
}

impl Default for Config {
    /// Includes every markdown file and excludes nothing.
    fn default() -> Self {
        return Self {
            exclude: Vec::new(),
            extensions: default_extensions(),
            include: Vec::new(),
        };
    }
}

fn default_extensions() -> Vec<String> {
    return vec!["md".to_string(), "markdown".to_string()];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(Config::load(dir.path()).unwrap(), Config::default());
    }

    #[test]
    fn filters_by_prefix() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "include = [\"docs/\"]\nexclude = [\"docs/archive/\"]\n",
        )
        .unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert!(config.should_scan("docs/guide.md"));
        assert!(!config.should_scan("docs/archive/old.md"));
        assert!(!config.should_scan("README.md"));
    }

    #[test]
    fn custom_extensions() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "extensions = [\"txt\"]\n").unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert!(config.is_document(Path::new("notes.TXT")));
        assert!(!config.is_document(Path::new("README.md")));
    }

    #[test]
    fn malformed_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "include = 3").unwrap();
        assert!(matches!(Config::load(dir.path()), Err(Error::TomlDe(_))));
    }
}
