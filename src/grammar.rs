//! Tree-sitter grammar resolution for markup files.
use std::path::Path;

use tree_sitter::Language;

use crate::error::Error;

/// File extensions scanned as HTML.
pub const MARKUP_EXTENSIONS: &[&str] = &["htm", "html", "xhtml"];

/// The tree-sitter HTML language.
pub fn html() -> Language {
    return tree_sitter_html::LANGUAGE.into();
}

/// Whether the path has an extension the HTML grammar handles.
pub fn is_markup_path(path: &Path) -> bool {
    return language_for_path(path).is_ok();
}

/// Map a file extension to its tree-sitter language.
///
/// # Errors
///
/// Returns `Error::UnsupportedLanguage` for extensions other than the markup ones.
pub fn language_for_path(path: &Path) -> Result<Language, Error> {
    let ext = path.extension().and_then(|e| return e.to_str()).unwrap_or("");
    let lowered = ext.to_ascii_lowercase();

    if MARKUP_EXTENSIONS.contains(&lowered.as_str()) {
        return Ok(html());
    }
    return Err(Error::UnsupportedLanguage {
        ext: ext.to_string(),
    });
}
