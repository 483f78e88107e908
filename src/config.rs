use std::path::Path;

use crate::error::Error;
use crate::types::{CloseTagPolicy, GroupLimit, ScanOptions};

/// Name of the optional project config file.
pub const CONFIG_FILE: &str = ".bundlegroups.toml";

/// Project configuration loaded from `.bundlegroups.toml`.
/// Include/exclude patterns are path prefixes applied to markup files.
#[derive(Debug, Default)]
pub struct Config {
    /// How close tags of enclosing elements are treated.
    pub close_tag_policy: CloseTagPolicy,
    /// Path prefixes never scanned.
    exclude: Vec<String>,
    /// Whether `<link rel="import">` is reported.
    pub html_imports: bool,
    /// Path prefixes to scan; empty means everything.
    include: Vec<String>,
    /// Group size cap.
    pub limit: GroupLimit,
}

/// Raw TOML structure for `.bundlegroups.toml`.
#[derive(serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct BundleGroupsTomlConfig {
    /// See [`Config::close_tag_policy`].
    #[serde(default)]
    close_tag_policy: CloseTagPolicy,
    /// See [`Config::exclude`].
    #[serde(default)]
    exclude: Vec<String>,
    /// See [`Config::html_imports`].
    #[serde(default = "default_html_imports")]
    html_imports: bool,
    /// See [`Config::include`].
    #[serde(default)]
    include: Vec<String>,
    /// See [`Config::limit`].
    #[serde(default)]
    limit: GroupLimit,
}

/// HTML imports are reported unless switched off.
const fn default_html_imports() -> bool {
    return true;
}

impl Config {
    /// Load config from `.bundlegroups.toml` in the given root directory.
    /// Returns a default that scans everything if the file doesn't exist.
    /// Returns an error if the file exists but is malformed, never silently
    /// falls back to defaults when the user wrote a config file.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if reading fails (other than not-found),
    /// or `Error::TomlDe` if the TOML is malformed or a limit is invalid.
    pub fn load(root: &Path) -> Result<Self, Error> {
        let path = root.join(CONFIG_FILE);
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::scan_everything_by_default()),
            Err(e) => return Err(Error::Io(e)),
        };

        return Self::parse(&content);
    }

    /// Parse config from TOML content.
    ///
    /// # Errors
    ///
    /// Returns `Error::TomlDe` if the TOML is malformed or a limit is invalid.
    pub fn parse(content: &str) -> Result<Self, Error> {
        let raw: BundleGroupsTomlConfig = toml::from_str(content)?;
        return Ok(Self {
            close_tag_policy: raw.close_tag_policy,
            exclude: raw.exclude,
            html_imports: raw.html_imports,
            include: raw.include,
            limit: raw.limit,
        });
    }

    /// Scan options from this config, with an optional command-line limit taking precedence.
    pub fn scan_options(&self, limit_override: Option<GroupLimit>) -> ScanOptions {
        return ScanOptions {
            close_tag_policy: self.close_tag_policy,
            html_imports: self.html_imports,
            limit: limit_override.unwrap_or(self.limit),
        };
    }

    /// Default config that includes everything and excludes nothing.
    fn scan_everything_by_default() -> Self {
        return Self {
            html_imports: true,
            ..Self::default()
        };
    }

    /// Check whether a markup file path should be scanned.
    ///
    /// A path is included if no include patterns are set (scan everything),
    /// or if the path starts with at least one include pattern.
    /// An included path is then excluded if it starts with any exclude pattern.
    pub fn should_scan(&self, relative_path: &str) -> bool {
        let included = self.include.is_empty()
            || self.include.iter().any(|p| return relative_path.starts_with(p.as_str()));

        if !included {
            return false;
        }

        return !self.exclude.iter().any(|p| return relative_path.starts_with(p.as_str()));
    }
}
