//! Element classification: which tags reference local assets, and whether
//! those references may be merged with their neighbours.
use crate::tokenizer::Attributes;
use crate::types::RefKind;

/// Script `type` values that still count as plain JavaScript.
const JAVASCRIPT_TYPE: &str = "application/javascript";

/// Characters treated as formatting between elements.
const WHITESPACE: &[char] = &[
    '\u{0009}', '\u{000A}', '\u{000B}', '\u{000C}', '\u{000D}', '\u{0020}', '\u{0085}',
    '\u{00A0}', '\u{1680}', '\u{180E}', '\u{2000}', '\u{2001}', '\u{2002}', '\u{2003}',
    '\u{2004}', '\u{2005}', '\u{2006}', '\u{2007}', '\u{2008}', '\u{2009}', '\u{200A}',
    '\u{2028}', '\u{2029}', '\u{202F}', '\u{205F}', '\u{3000}',
];

/// Kind and URL of a script or stylesheet element that may join a merged group.
pub fn groupable_reference<'a>(tag: &str, attributes: &Attributes<'a>) -> Option<(RefKind, &'a str)> {
    if !is_groupable_tag(tag, attributes) {
        return None;
    }
    if tag == "script" {
        return attributes.get("src").map(|src| return (RefKind::Script, src));
    }
    return attributes.get("href").map(|href| return (RefKind::Stylesheet, href));
}

/// A local `<script>` or a local `<link rel="stylesheet">`.
pub fn is_groupable_tag(tag: &str, attributes: &Attributes<'_>) -> bool {
    return match tag {
        "link" => is_local_stylesheet(attributes),
        "script" => is_local_script(attributes),
        _ => false,
    };
}

/// No `type`, or plain JavaScript, with a local `src`.
pub fn is_local_script(attributes: &Attributes<'_>) -> bool {
    let plain = attributes.get("type").is_none_or(|t| return t == JAVASCRIPT_TYPE);
    return plain && attributes.get("src").is_some_and(is_local_url);
}

/// `rel="stylesheet"` with a local `href`.
pub fn is_local_stylesheet(attributes: &Attributes<'_>) -> bool {
    return attributes.get("rel") == Some("stylesheet")
        && attributes.get("href").is_some_and(is_local_url);
}

/// Non-empty, and neither protocol-relative (`//`) nor scheme-qualified (`:`).
pub fn is_local_url(url: &str) -> bool {
    return !url.is_empty() && !url.contains("//") && !url.contains(':');
}

/// A query string or fragment makes the URL unsafe to concatenate.
pub fn is_singleton_url(url: &str) -> bool {
    return url.contains(['#', '?']);
}

/// Every character is formatting whitespace. The empty string qualifies.
pub fn is_whitespace(text: &str) -> bool {
    return text.chars().all(|c| return WHITESPACE.contains(&c));
}

/// Kind and URL of an element that is referenced but never merged:
/// local `img`/`source`/`track`, and (when enabled) `link rel="import"`.
pub fn media_reference<'a>(
    tag: &str,
    attributes: &Attributes<'a>,
    html_imports: bool,
) -> Option<(RefKind, &'a str)> {
    let kind = match tag {
        "img" => RefKind::Image,
        "link" => {
            if !html_imports || attributes.get("rel") != Some("import") {
                return None;
            }
            return attributes
                .get("href")
                .filter(|href| return !href.is_empty())
                .map(|href| return (RefKind::Import, href));
        },
        "source" => RefKind::Source,
        "track" => RefKind::Track,
        _ => return None,
    };

    return attributes
        .get("src")
        .filter(|src| return is_local_url(src))
        .map(|src| return (kind, src));
}
