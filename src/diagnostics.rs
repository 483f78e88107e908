use bundlegroups::config::CONFIG_FILE;
use bundlegroups::error::Error;
use bundlegroups::grammar::MARKUP_EXTENSIONS;
use bundlegroups::manifest::MANIFEST_FILE;

const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Render an error as valid markdown with bold headings and print to stderr.
pub fn print_error(e: &Error) {
    let md = render_error(e);
    for line in md.lines() {
        if line.starts_with('#') {
            eprintln!("{BOLD}{line}{RESET}");
        } else {
            eprintln!("{line}");
        }
    }
}

/// Render an error as a structured markdown diagnostic.
///
/// Each variant produces a block with what happened and, where there is one,
/// how to fix it.
pub fn render_error(e: &Error) -> String {
    match e {
        Error::FileTooLarge { file, size_bytes, max_bytes } => render_file_too_large(file, *size_bytes, *max_bytes),
        Error::InvalidArgument { reason } => render_invalid_argument(reason),
        Error::ManifestNotFound { .. } => render_manifest_not_found(),
        Error::UnsupportedLanguage { ext } => render_unsupported_language(ext),
        _ => render_generic(e),
    }
}

fn render_generic(e: &Error) -> String {
    match e {
        Error::FileNotFound { path } => format!("\
# Error: File Not Found

`{}` does not exist.
", path.display()),

        Error::ManifestCorrupt { reason } => format!("\
# Error: Manifest Corrupt

{reason}

## Fix

Regenerate the manifest:

    bundlegroups init
"),

        Error::ParseFailed { file, reason } => format!("\
# Error: Parse Failed

Could not parse `{}`: {reason}
", file.display()),

        Error::Io(e) => format!("\
# Error: I/O

{e}
"),
        Error::Json(e) => format!("\
# Error: JSON Output

{e}
"),
        Error::TomlDe(e) => format!("\
# Error: Invalid TOML

{e}

## Fix

Check `{CONFIG_FILE}` and `{MANIFEST_FILE}` for typos.
"),
        Error::TomlSer(e) => format!("\
# Error: TOML Serialization

{e}
"),
        Error::WatchFailed { reason } => format!("\
# Error: Watch Failed

{reason}
"),
        // Already handled in render_error, but need exhaustive match.
        _ => format!("\
# Error

{e}
"),
    }
}

fn render_file_too_large(file: &std::path::Path, size_bytes: u64, max_bytes: u64) -> String {
    format!("\
# Error: File Too Large

`{}` is {size_bytes} bytes (max {max_bytes}).

## Fix

Exclude it in `{CONFIG_FILE}`:

    exclude = [\"{}\"]
", file.display(), file.display())
}

fn render_invalid_argument(reason: &str) -> String {
    format!("\
# Error: Invalid Argument

{reason}

## Fix

A group limit is a positive count, `unbounded`, or `false` (one reference per group):

    bundlegroups scan --limit 8
")
}

fn render_manifest_not_found() -> String {
    format!("\
# Error: Manifest Not Found

`{MANIFEST_FILE}` does not exist.

## Fix

Run `bundlegroups init` to scan markup and record the current groups:

    bundlegroups init
")
}

fn render_unsupported_language(ext: &str) -> String {
    let mut supported = String::new();
    for known in MARKUP_EXTENSIONS {
        supported.push_str("- `.");
        supported.push_str(known);
        supported.push_str("`\n");
    }

    format!(
        "\
# Error: Unsupported File Type

`.{ext}` files are not scanned.

## Supported extensions

{supported}"
    )
}
