//! Find runs of local asset references in HTML that a bundler can merge.
//!
//! [`extract_reference_groups`] scans a document and returns groups of
//! script, stylesheet, and media references. Consecutive references in one
//! group may be concatenated and replaced by a single tag without changing
//! what the document loads or in what order.
//!
//! ```no_run
//! use bundlegroups::{ScanOptions, extract_reference_groups};
//!
//! let html = r#"<script src="a.js"></script>
//! <script src="b.js"></script>"#;
//! let groups = extract_reference_groups(html, &ScanOptions::default())?;
//! assert_eq!(groups.len(), 1);
//! # Ok::<(), bundlegroups::Error>(())
//! ```
pub mod classify;
pub mod config;
pub mod discover;
pub mod error;
pub mod grammar;
pub mod hasher;
pub mod manifest;
pub mod scanner;
pub mod tokenizer;
pub mod types;

pub use crate::error::Error;
pub use crate::scanner::{extract_reference_groups, extract_reference_groups_from_bytes};
pub use crate::types::{CloseTagPolicy, GroupLimit, RefKind, Reference, ScanOptions};
