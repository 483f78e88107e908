//! Crate-level error types for bundlegroups diagnostics.
use std::path::PathBuf;

/// Every error names the file, value, or reason for failure so it can be
/// rendered as a useful diagnostic without a debugger.
///
/// Markup problems are never errors: malformed or unusual HTML is absorbed by
/// the scanner as policy.
#[allow(clippy::error_impl_error, reason = "crate-level error type")]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A source file named on the command line does not exist.
    #[error("file not found: {}", path.display())]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// Source file exceeds the size limit.
    #[error("file too large ({size_bytes} bytes, max {max_bytes}): {}", file.display())]
    FileTooLarge {
        /// File that exceeded the size limit.
        file: PathBuf,
        /// Maximum allowed file size in bytes.
        max_bytes: u64,
        /// Actual file size in bytes.
        size_bytes: u64,
    },

    /// Markup is not text, or a limit cannot be read as a count.
    #[error("invalid argument: {reason}")]
    InvalidArgument {
        /// What was wrong with the argument.
        reason: String,
    },

    /// Underlying I/O error from the filesystem.
    #[error("io: {0}")]
    Io(
        /// The wrapped I/O error.
        #[from]
        std::io::Error,
    ),

    /// JSON serialization of scan results failed.
    #[error("json: {0}")]
    Json(
        /// The wrapped JSON error.
        #[from]
        serde_json::Error,
    ),

    /// Manifest exists but cannot be trusted.
    #[error("manifest corrupt: {reason}")]
    ManifestCorrupt {
        /// Description of the corruption.
        reason: String,
    },

    /// Expected manifest does not exist on disk.
    #[error("manifest not found: {}", path.display())]
    ManifestNotFound {
        /// Path to the missing manifest.
        path: PathBuf,
    },

    /// Tree-sitter could not load the HTML grammar or produce a tree.
    #[error("parse failed: {}: {reason}", file.display())]
    ParseFailed {
        /// File being parsed, empty for in-memory markup.
        file: PathBuf,
        /// Description of the parse failure.
        reason: String,
    },

    /// TOML deserialization failed.
    #[error("toml deserialize: {0}")]
    TomlDe(
        /// The wrapped TOML deserialization error.
        #[from]
        toml::de::Error,
    ),

    /// TOML serialization failed.
    #[error("toml serialize: {0}")]
    TomlSer(
        /// The wrapped TOML serialization error.
        #[from]
        toml::ser::Error,
    ),

    /// No markup grammar is registered for this file extension.
    #[error("no grammar for extension: .{ext}")]
    UnsupportedLanguage {
        /// File extension without the leading dot.
        ext: String,
    },

    /// The filesystem watcher could not be started.
    #[error("watch failed: {reason}")]
    WatchFailed {
        /// Description of the watcher failure.
        reason: String,
    },
}
