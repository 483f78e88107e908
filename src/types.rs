//! Core domain types: asset references, group limits, and scan options.
use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// How the scanner treats a close tag that does not match the most recently opened tag.
///
/// Void elements whose close is reported against an enclosing element would otherwise
/// stretch the open reference over the ancestor's end tag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CloseTagPolicy {
    /// Leave the open reference alone; it is sealed by the next sealing event.
    Lenient,
    /// Seal the open reference before recording the foreign close tag's end.
    #[default]
    SealOnMismatch,
}

/// A content fingerprint, 64 lowercase hex chars.
/// Newtype prevents mixing with URLs or other strings.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Fingerprint(
    /// The hex-encoded SHA-256 digest string.
    pub String,
);

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return f.write_str(&self.0);
    }
}

/// Maximum number of references a mergeable group may hold.
///
/// Media and import references, and references whose URL carries a query or
/// fragment, always form one-element groups regardless of this limit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawLimit")]
pub enum GroupLimit {
    /// At most `n` references per group.
    Count(NonZeroUsize),
    /// Every group holds exactly one reference.
    SingletonOnly,
    /// No cap.
    #[default]
    Unbounded,
}

impl GroupLimit {
    /// Whether a group already holding `len` references may take one more.
    pub const fn admits(self, len: usize) -> bool {
        return match self {
            Self::Count(max) => len < max.get(),
            Self::SingletonOnly => len == 0,
            Self::Unbounded => true,
        };
    }

    /// Interpret an integer count. Zero means one reference per group.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidArgument` for negative counts.
    pub fn from_count(count: i64) -> Result<Self, Error> {
        if count == 0 {
            return Ok(Self::SingletonOnly);
        }
        let Some(max) = usize::try_from(count).ok().and_then(NonZeroUsize::new) else {
            return Err(Error::InvalidArgument {
                reason: format!("group limit must be a positive count, got {count}"),
            });
        };
        return Ok(Self::Count(max));
    }

    /// Interpret a boolean switch: `true` lifts the cap, `false` allows one reference per group.
    pub const fn from_flag(flag: bool) -> Self {
        if flag {
            return Self::Unbounded;
        }
        return Self::SingletonOnly;
    }
}

impl fmt::Display for GroupLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return match self {
            Self::Count(max) => write!(f, "{max}"),
            Self::SingletonOnly => f.write_str("1"),
            Self::Unbounded => f.write_str("unbounded"),
        };
    }
}

impl FromStr for GroupLimit {
    type Err = Error;

    /// Accepts a decimal count, `true`/`unbounded`, or `false`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        return match trimmed {
            "true" | "unbounded" => Ok(Self::Unbounded),
            "false" => Ok(Self::SingletonOnly),
            _ => {
                let count: i64 = trimmed.parse().map_err(|_err| {
                    return Error::InvalidArgument {
                        reason: format!("cannot read `{trimmed}` as a group limit"),
                    };
                })?;
                Self::from_count(count)
            },
        };
    }
}

/// Config-file shape of a limit before validation.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawLimit {
    /// `limit = 12`
    Count(i64),
    /// `limit = true` / `limit = false`
    Flag(bool),
    /// `limit = "unbounded"`
    Word(String),
}

impl TryFrom<RawLimit> for GroupLimit {
    type Error = Error;

    fn try_from(raw: RawLimit) -> Result<Self, Self::Error> {
        return match raw {
            RawLimit::Count(count) => Self::from_count(count),
            RawLimit::Flag(flag) => Ok(Self::from_flag(flag)),
            RawLimit::Word(word) => word.parse(),
        };
    }
}

/// The kind of asset an element refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefKind {
    /// `<img src>`
    Image,
    /// `<link rel="import" href>`
    Import,
    /// `<script src>`
    Script,
    /// `<source src>`
    Source,
    /// `<link rel="stylesheet" href>`
    Stylesheet,
    /// `<track src>`
    Track,
}

impl RefKind {
    /// Lowercase name used in output and fingerprints.
    pub const fn as_str(self) -> &'static str {
        return match self {
            Self::Image => "image",
            Self::Import => "import",
            Self::Script => "script",
            Self::Source => "source",
            Self::Stylesheet => "stylesheet",
            Self::Track => "track",
        };
    }
}

impl fmt::Display for RefKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return f.pad(self.as_str());
    }
}

/// One asset mention with its exact source span.
///
/// `text` is always `markup[start..end]` of the outermost document scanned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reference {
    /// Exclusive byte offset just past the element's end.
    pub end: usize,
    /// Asset kind.
    pub kind: RefKind,
    /// Byte offset of the element's opening `<`.
    pub start: usize,
    /// The element's source text.
    pub text: String,
    /// Attribute value naming the asset, exactly as written.
    pub url: String,
}

impl Reference {
    /// Move this reference's span forward by `offset` bytes.
    #[must_use]
    pub fn shifted(mut self, offset: usize) -> Self {
        self.start = self.start.saturating_add(offset);
        self.end = self.end.saturating_add(offset);
        return self;
    }
}

/// Knobs for one scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    /// Close-tag mismatch handling.
    pub close_tag_policy: CloseTagPolicy,
    /// Whether `<link rel="import">` produces references.
    pub html_imports: bool,
    /// Cap on references per mergeable group.
    pub limit: GroupLimit,
}

impl ScanOptions {
    /// Default options with a different group limit.
    #[must_use]
    pub fn with_limit(limit: GroupLimit) -> Self {
        return Self {
            limit,
            ..Self::default()
        };
    }
}

impl Default for ScanOptions {
    fn default() -> Self {
        return Self {
            close_tag_policy: CloseTagPolicy::default(),
            html_imports: true,
            limit: GroupLimit::Unbounded,
        };
    }
}
