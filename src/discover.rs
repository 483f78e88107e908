//! Markup file discovery and per-file scanning.
use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use crate::config::Config;
use crate::error::Error;
use crate::grammar;
use crate::scanner;
use crate::types::{Reference, ScanOptions};

/// Maximum markup file size (16 MiB).
const MAX_FILE_SIZE: u64 = 16 * 1024 * 1024;

/// Groups found in one markup file.
#[derive(Debug, Clone)]
pub struct ScannedFile {
    /// Groups in document order.
    pub groups: Vec<Vec<Reference>>,
    /// Path relative to the scan root.
    pub path: PathBuf,
}

/// Find every markup file under `root` that the config allows, as sorted
/// root-relative paths. Hidden directories and `target` are skipped.
pub fn discover(root: &Path, config: &Config) -> Vec<PathBuf> {
    let mut found: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| return e.depth() == 0 || !is_skipped_dir(e))
        .filter_map(Result::ok)
        .filter(|e| return e.file_type().is_file() && grammar::is_markup_path(e.path()))
        .map(|e| return e.path().strip_prefix(root).unwrap_or(e.path()).to_path_buf())
        .filter(|relative| return config.should_scan(&relative.to_string_lossy()))
        .collect();

    found.sort();
    return found;
}

/// Whether a directory entry should not be descended into.
fn is_skipped_dir(entry: &DirEntry) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    return name.starts_with('.') || name == "target" || name == "node_modules";
}

/// Discover and scan every markup file under `root`.
///
/// # Errors
///
/// Returns errors from reading or scanning any single file.
pub fn scan_all(root: &Path, config: &Config, options: &ScanOptions) -> Result<Vec<ScannedFile>, Error> {
    return discover(root, config)
        .into_iter()
        .map(|relative| return scan_file(root, &relative, options))
        .collect();
}

/// Read and scan one markup file, given relative to `root`.
///
/// # Errors
///
/// Returns `Error::UnsupportedLanguage` if the extension is not a markup one,
/// `Error::FileNotFound` if the file is missing,
/// `Error::FileTooLarge` if it exceeds the size limit,
/// `Error::InvalidArgument` if it is not UTF-8 text,
/// or `Error::Io` for other read failures.
pub fn scan_file(root: &Path, relative: &Path, options: &ScanOptions) -> Result<ScannedFile, Error> {
    grammar::language_for_path(relative)?;

    let full = root.join(relative);
    let metadata = match std::fs::metadata(&full) {
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::FileNotFound { path: relative.to_path_buf() });
        },
        Err(e) => return Err(Error::Io(e)),
        Ok(m) => m,
    };

    if metadata.len() > MAX_FILE_SIZE {
        return Err(Error::FileTooLarge {
            file: relative.to_path_buf(),
            max_bytes: MAX_FILE_SIZE,
            size_bytes: metadata.len(),
        });
    }

    let bytes = std::fs::read(&full)?;
    let groups = scanner::extract_reference_groups_from_bytes(&bytes, options).map_err(|e| {
        return match e {
            Error::InvalidArgument { reason } => Error::InvalidArgument {
                reason: format!("{}: {reason}", relative.display()),
            },
            Error::ParseFailed { reason, .. } => Error::ParseFailed {
                file: relative.to_path_buf(),
                reason,
            },
            other => other,
        };
    })?;

    return Ok(ScannedFile {
        groups,
        path: relative.to_path_buf(),
    });
}
