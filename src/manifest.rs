//! Group manifest persistence: parsing, serialization, and ordering enforcement.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::discover::ScannedFile;
use crate::error::Error;
use crate::hasher;
use crate::types::Fingerprint;

/// File name of the manifest at the project root.
pub const MANIFEST_FILE: &str = ".bundlegroups.lock";

/// A single recorded group in the manifest.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ManifestEntry {
    /// Fingerprint of the group's kinds and URLs.
    pub fingerprint: Fingerprint,
    /// Zero-based position of the group within its file.
    pub index: usize,
    /// The markup file containing the group.
    pub source: PathBuf,
    /// The group's URLs in document order.
    pub urls: Vec<String>,
}

impl Ord for ManifestEntry {
    /// Compare entries by (source, index) for deterministic ordering.
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        return (&self.source, self.index).cmp(&(&other.source, other.index));
    }
}

impl PartialOrd for ManifestEntry {
    /// Delegate to `Ord` implementation.
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        return Some(self.cmp(other));
    }
}

/// The manifest as a whole. Entries are sorted by (source, index).
/// Constructed only via `Manifest::new()`, `Manifest::from_scans()` or
/// `Manifest::parse()`, all of which enforce sorting and uniqueness.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Manifest {
    /// The ordered list of recorded groups.
    #[serde(default)]
    pub entries: Vec<ManifestEntry>,
}

impl Manifest {
    /// Build a manifest from scan results, one entry per group.
    pub fn from_scans(scans: &[ScannedFile]) -> Self {
        let entries = scans
            .iter()
            .flat_map(|scan| {
                return scan.groups.iter().enumerate().map(|(index, group)| {
                    return ManifestEntry {
                        fingerprint: hasher::fingerprint(group),
                        index,
                        source: scan.path.clone(),
                        urls: group.iter().map(|r| return r.url.clone()).collect(),
                    };
                });
            })
            .collect();
        return Self::new(entries);
    }

    /// Entry for a given source file and group index.
    pub fn get(&self, source: &Path, index: usize) -> Option<&ManifestEntry> {
        return self
            .entries
            .binary_search_by(|e| return (e.source.as_path(), e.index).cmp(&(source, index)))
            .ok()
            .and_then(|i| return self.entries.get(i));
    }

    /// Create a new manifest from unsorted entries. Sorts and deduplicates.
    pub fn new(mut entries: Vec<ManifestEntry>) -> Self {
        entries.sort();
        entries.dedup_by(|a, b| return a.source == b.source && a.index == b.index);
        return Self { entries };
    }

    /// Parse a manifest from TOML content.
    ///
    /// # Errors
    ///
    /// Returns `Error::TomlDe` if the content is not valid TOML,
    /// or `Error::ManifestCorrupt` if entries are not sorted.
    pub fn parse(content: &str) -> Result<Self, Error> {
        let manifest: Self = toml::from_str(content)?;
        enforce_manifest_entry_ordering(&manifest.entries)?;
        return Ok(manifest);
    }

    /// Read and parse a manifest from disk.
    ///
    /// # Errors
    ///
    /// Returns `Error::ManifestNotFound` if the file doesn't exist,
    /// `Error::Io` for other read failures,
    /// `Error::TomlDe` if the content is invalid TOML,
    /// or `Error::ManifestCorrupt` if entries are not sorted.
    pub fn read(path: &Path) -> Result<Self, Error> {
        let content = match std::fs::read_to_string(path) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::ManifestNotFound { path: path.to_path_buf() });
            },
            Err(e) => return Err(Error::Io(e)),
            Ok(c) => c,
        };
        return Self::parse(&content);
    }

    /// Serialize to TOML.
    ///
    /// # Errors
    ///
    /// Returns `Error::TomlSer` if serialization fails.
    pub fn serialize(&self) -> Result<String, Error> {
        return Ok(toml::to_string_pretty(self)?);
    }

    /// Write the manifest to disk.
    ///
    /// # Errors
    ///
    /// Returns `Error::TomlSer` if serialization fails,
    /// or `Error::Io` if the file cannot be written.
    pub fn write(&self, path: &Path) -> Result<(), Error> {
        let content = self.serialize()?;
        std::fs::write(path, content)?;
        return Ok(());
    }
}

/// Validate that manifest entries are strictly sorted.
///
/// # Errors
///
/// Returns `Error::ManifestCorrupt` if any adjacent pair is out of order.
fn enforce_manifest_entry_ordering(entries: &[ManifestEntry]) -> Result<(), Error> {
    for window in entries.windows(2) {
        let (Some(first), Some(second)) = (window.first(), window.get(1)) else {
            return Err(Error::ManifestCorrupt {
                reason: "window underflow".to_string(),
            });
        };
        if first >= second {
            return Err(Error::ManifestCorrupt {
                reason: format!(
                    "entries not sorted: {} #{} >= {} #{}",
                    first.source.display(),
                    first.index,
                    second.source.display(),
                    second.index,
                ),
            });
        }
    }
    return Ok(());
}
