//! The grouping scanner: one pass over tokenizer events that decides which
//! consecutive asset references may be merged into a single bundle.
//!
//! The scanner holds at most one open group and one open reference. A
//! reference's end is only known once its close tag has been seen, so it is
//! sealed lazily by whichever event follows.
use std::sync::LazyLock;

use regex::Regex;

use crate::classify;
use crate::error::Error;
use crate::tokenizer::{self, Attributes, COMMENT_OPEN, Event};
use crate::types::{CloseTagPolicy, RefKind, Reference, ScanOptions};

/// Body of the comment that closes a conditional block, and the suffix of a
/// conditional comment's body.
const CONDITIONAL_END: &str = "<![endif]";

/// Opening `[condition]>` of a conditional comment body.
///
/// # Panics
///
/// Panics on first use if the hardcoded pattern is invalid.
#[allow(clippy::expect_used, reason = "the pattern is a literal checked by the scanner tests")]
static CONDITIONAL_OPENER: LazyLock<Regex> =
    LazyLock::new(|| return Regex::new(r"^\[[^\]]+\]>").expect("valid regex"));

/// Scan `markup` and return its mergeable reference groups in document order.
///
/// # Errors
///
/// Returns `Error::ParseFailed` if the HTML grammar cannot be loaded.
pub fn extract_reference_groups(markup: &str, options: &ScanOptions) -> Result<Vec<Vec<Reference>>, Error> {
    let events = tokenizer::tokenize(markup)?;
    return group_events(markup, options, events);
}

/// Like [`extract_reference_groups`], for markup that has not been decoded yet.
///
/// # Errors
///
/// Returns `Error::InvalidArgument` if `markup` is not valid UTF-8, before any
/// scanning happens.
pub fn extract_reference_groups_from_bytes(
    markup: &[u8],
    options: &ScanOptions,
) -> Result<Vec<Vec<Reference>>, Error> {
    let text = std::str::from_utf8(markup).map_err(|e| {
        return Error::InvalidArgument {
            reason: format!("markup is not text: {e}"),
        };
    })?;
    return extract_reference_groups(text, options);
}

/// Drive a scanner over an already tokenized event stream for `markup`.
///
/// # Errors
///
/// Returns `Error::ParseFailed` if a conditional comment's contents cannot be tokenized.
pub fn group_events<'a, I>(markup: &str, options: &ScanOptions, events: I) -> Result<Vec<Vec<Reference>>, Error>
where
    I: IntoIterator<Item = Event<'a>>,
{
    let mut scanner = GroupScanner::new(markup, options);
    for event in events {
        scanner.visit(event)?;
    }
    return Ok(scanner.finish());
}

/// The group currently accepting references.
#[derive(Debug)]
struct OpenGroup {
    /// Shared kind for script/stylesheet groups, `None` for media and import groups.
    kind: Option<RefKind>,
    /// Sealed references, in document order.
    references: Vec<Reference>,
    /// No further references may join.
    singleton: bool,
}

/// A reference whose element has opened but whose end is not yet known.
#[derive(Debug)]
struct PendingReference {
    /// Asset kind.
    kind: RefKind,
    /// Offset of the element's `<`.
    start: usize,
    /// Asset URL as written.
    url: String,
}

/// Event-by-event grouping state for one document.
#[derive(Debug)]
pub struct GroupScanner<'m> {
    /// Group accepting references, if any.
    group: Option<OpenGroup>,
    /// Sealed groups.
    groups: Vec<Vec<Reference>>,
    /// Exclusive end of the most recently closed element.
    last_element_end: usize,
    /// The document being scanned; reference text is sliced from it.
    markup: &'m str,
    /// Name of the most recently opened tag, cleared by any close tag.
    open_tag_name: Option<String>,
    /// Scan options, shared with nested conditional-comment scans.
    options: ScanOptions,
    /// Reference waiting for its end offset.
    reference: Option<PendingReference>,
}

impl<'m> GroupScanner<'m> {
    /// A scanner with no open group or reference.
    pub const fn new(markup: &'m str, options: &ScanOptions) -> Self {
        return Self {
            group: None,
            groups: Vec::new(),
            last_element_end: 0,
            markup,
            open_tag_name: None,
            options: *options,
            reference: None,
        };
    }

    /// Seal whatever is still open and return the groups.
    pub fn finish(mut self) -> Vec<Vec<Reference>> {
        self.seal_reference();
        self.seal_group();
        return self.groups;
    }

    /// Advance the state machine by one event.
    ///
    /// # Errors
    ///
    /// Returns `Error::ParseFailed` if a conditional comment's contents cannot be tokenized.
    pub fn visit(&mut self, event: Event<'_>) -> Result<(), Error> {
        match event {
            Event::CloseTag { end, name } => self.close_tag(&name, end),
            Event::Comment { body, start } => return self.comment(body, start),
            Event::End => {
                self.seal_reference();
                self.seal_group();
            },
            Event::OpenTag { attributes, name, start } => self.open_tag(&name, &attributes, start),
            Event::Text { text, .. } => self.text(text),
        }
        return Ok(());
    }

    /// Record where the element ended. Under `SealOnMismatch`, a close tag for
    /// some other element first seals the open reference at the previous end.
    fn close_tag(&mut self, name: &str, end: usize) {
        if self.options.close_tag_policy == CloseTagPolicy::SealOnMismatch
            && self.reference.is_some()
            && self.open_tag_name.as_deref() != Some(name)
        {
            self.seal_reference();
        }
        self.open_tag_name = None;
        self.last_element_end = end;
    }

    /// Comments seal the open reference. Conditional comments also break the
    /// group and have their contents scanned as a document of their own; the
    /// closing `<![endif]` marker breaks the group. Plain comments do not.
    fn comment(&mut self, body: &str, start: usize) -> Result<(), Error> {
        self.seal_reference();

        let opener_len = CONDITIONAL_OPENER.find(body).map(|m| return m.end());

        if let Some(opener_len) = opener_len {
            self.seal_group();

            let after_opener = body.get(opener_len..).unwrap_or("");
            let contents = after_opener.strip_suffix(CONDITIONAL_END).unwrap_or(after_opener);
            let offset = start.saturating_add(COMMENT_OPEN.len()).saturating_add(opener_len);

            log::debug!(
                target: "bundlegroups.scanner",
                "scanning conditional comment contents at {offset} ({} bytes)",
                contents.len()
            );
            let nested = extract_reference_groups(contents, &self.options)?;
            for group in nested {
                let shifted = group.into_iter().map(|r| return r.shifted(offset)).collect();
                self.groups.push(shifted);
            }
        } else if body == CONDITIONAL_END {
            self.seal_group();
        }

        return Ok(());
    }

    /// Seal the previous reference, then classify the new element.
    fn open_tag(&mut self, name: &str, attributes: &Attributes<'_>, start: usize) {
        self.open_tag_name = Some(name.to_string());
        self.seal_reference();

        if let Some((kind, url)) = classify::groupable_reference(name, attributes) {
            let singleton = classify::is_singleton_url(url);
            let limit = self.options.limit;
            let must_break = self.group.as_ref().is_some_and(|group| {
                return group.kind != Some(kind) || group.singleton || !limit.admits(group.references.len());
            });

            // A singleton never shares a group, so it also breaks a compatible one.
            if must_break || singleton {
                self.seal_group();
            }
            if self.group.is_none() {
                self.group = Some(OpenGroup {
                    kind: Some(kind),
                    references: Vec::new(),
                    singleton,
                });
            }
            self.reference = Some(PendingReference {
                kind,
                start,
                url: url.to_string(),
            });
            return;
        }

        self.seal_group();

        if let Some((kind, url)) = classify::media_reference(name, attributes, self.options.html_imports) {
            self.group = Some(OpenGroup {
                kind: None,
                references: Vec::new(),
                singleton: true,
            });
            self.reference = Some(PendingReference {
                kind,
                start,
                url: url.to_string(),
            });
        }
    }

    /// Push the open group to the output, if it holds anything.
    fn seal_group(&mut self) {
        let Some(group) = self.group.take() else {
            return;
        };
        if group.references.is_empty() {
            return;
        }
        log::debug!(
            target: "bundlegroups.scanner",
            "sealed {} group of {} ({})",
            group.kind.map_or("media", RefKind::as_str),
            group.references.len(),
            group.references.iter().map(|r| return r.url.as_str()).collect::<Vec<_>>().join(", ")
        );
        self.groups.push(group.references);
    }

    /// Stamp the open reference with the last element end and append it to the open group.
    fn seal_reference(&mut self) {
        let Some(pending) = self.reference.take() else {
            return;
        };

        let end = self.last_element_end;
        let Some(text) = self.markup.get(pending.start..end).filter(|t| return !t.is_empty()) else {
            log::debug!(
                target: "bundlegroups.scanner",
                "dropping {} reference `{}` at {}: element never closed",
                pending.kind,
                pending.url,
                pending.start
            );
            return;
        };

        let reference = Reference {
            end,
            kind: pending.kind,
            start: pending.start,
            text: text.to_string(),
            url: pending.url,
        };
        match self.group.as_mut() {
            Some(group) => group.references.push(reference),
            None => self.groups.push(vec![reference]),
        }
    }

    /// Any non-whitespace text separates elements and ends the group.
    fn text(&mut self, text: &str) {
        if classify::is_whitespace(text) {
            return;
        }
        self.seal_reference();
        self.seal_group();
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;

    use super::*;
    use crate::types::GroupLimit;

    fn urls(groups: &[Vec<Reference>]) -> Vec<Vec<&str>> {
        groups
            .iter()
            .map(|g| g.iter().map(|r| r.url.as_str()).collect())
            .collect()
    }

    fn scan(html: &str) -> Vec<Vec<Reference>> {
        extract_reference_groups(html, &ScanOptions::default()).unwrap()
    }

    fn open<'a>(name: &str, pairs: &[(&'a str, &'a str)], start: usize) -> Event<'a> {
        Event::OpenTag {
            attributes: pairs.iter().copied().collect(),
            name: name.to_string(),
            start,
        }
    }

    fn close<'a>(name: &str, end: usize) -> Event<'a> {
        Event::CloseTag { end, name: name.to_string() }
    }

    #[test]
    fn consecutive_scripts_merge() {
        let html = r#"<script src="a.js"></script><script src="b.js"></script>"#;
        let groups = scan(html);
        assert_eq!(urls(&groups), [vec!["a.js", "b.js"]]);

        let first = &groups[0][0];
        assert_eq!((first.start, first.end), (0, 28));
        assert_eq!(first.text, r#"<script src="a.js"></script>"#);
        assert_eq!(groups[0][1].kind, RefKind::Script);
    }

    #[test]
    fn query_string_forces_a_singleton() {
        let html = r#"<script src="a.js?v=2"></script><script src="b.js"></script>"#;
        assert_eq!(urls(&scan(html)), [vec!["a.js?v=2"], vec!["b.js"]]);
    }

    #[test]
    fn fragment_breaks_a_running_group() {
        let html = r#"<script src="a.js"></script><script src="b.js#x"></script><script src="c.js"></script>"#;
        assert_eq!(urls(&scan(html)), [vec!["a.js"], vec!["b.js#x"], vec!["c.js"]]);
    }

    #[test]
    fn kind_change_breaks() {
        let html = r#"<link rel="stylesheet" href="a.css"><script src="a.js"></script>"#;
        let groups = scan(html);
        assert_eq!(urls(&groups), [vec!["a.css"], vec!["a.js"]]);
        assert_eq!(groups[0][0].text, r#"<link rel="stylesheet" href="a.css">"#);
        assert_eq!(groups[0][0].kind, RefKind::Stylesheet);
    }

    #[test]
    fn media_never_merges() {
        let html = r#"<img src="a.png"><img src="b.png">"#;
        let groups = scan(html);
        assert_eq!(urls(&groups), [vec!["a.png"], vec!["b.png"]]);
        assert_eq!(groups[1][0].start, 17);
        assert_eq!(groups[1][0].kind, RefKind::Image);
    }

    #[test]
    fn text_breaks_but_whitespace_does_not() {
        let broken = r#"<script src="a.js"></script>Hello<script src="b.js"></script>"#;
        assert_eq!(urls(&scan(broken)), [vec!["a.js"], vec!["b.js"]]);

        let joined = "<script src=\"a.js\"></script>\n<script src=\"b.js\"></script>";
        assert_eq!(urls(&scan(joined)), [vec!["a.js", "b.js"]]);
    }

    #[test]
    fn conditional_comment_contents_are_offset() {
        let html = r#"<!--[if lt IE 9]><script src="shim.js"></script><![endif]-->"#;
        let groups = scan(html);
        assert_eq!(urls(&groups), [vec!["shim.js"]]);

        let shim = &groups[0][0];
        assert_eq!(shim.start, 17);
        assert_eq!(&html[shim.start..shim.end], shim.text);
        assert_eq!(shim.text, r#"<script src="shim.js"></script>"#);
    }

    #[test]
    fn plain_comment_keeps_the_group_but_endif_breaks_it() {
        let plain = r#"<script src="a.js"></script><!-- note --><script src="b.js"></script>"#;
        assert_eq!(urls(&scan(plain)), [vec!["a.js", "b.js"]]);

        let endif = r#"<script src="a.js"></script><!--<![endif]--><script src="b.js"></script>"#;
        assert_eq!(urls(&scan(endif)), [vec!["a.js"], vec!["b.js"]]);
    }

    #[test]
    fn limit_caps_group_length() {
        let html = r#"<script src="a.js"></script><script src="b.js"></script><script src="c.js"></script>"#;
        let two = ScanOptions::with_limit(GroupLimit::Count(NonZeroUsize::new(2).unwrap()));
        let groups = extract_reference_groups(html, &two).unwrap();
        assert_eq!(urls(&groups), [vec!["a.js", "b.js"], vec!["c.js"]]);

        let one = ScanOptions::with_limit(GroupLimit::SingletonOnly);
        let groups = extract_reference_groups(html, &one).unwrap();
        assert_eq!(urls(&groups), [vec!["a.js"], vec!["b.js"], vec!["c.js"]]);
    }

    #[test]
    fn unrelated_element_breaks_the_group() {
        let html = r#"<script src="a.js"></script><meta charset="utf-8"><script src="b.js"></script>"#;
        assert_eq!(urls(&scan(html)), [vec!["a.js"], vec!["b.js"]]);
    }

    #[test]
    fn remote_and_typed_scripts_are_not_references() {
        let html = r#"<script src="https://cdn/x.js"></script><script type="text/x-tmpl" src="t.js"></script>"#;
        assert!(scan(html).is_empty());
    }

    #[test]
    fn invalid_utf8_is_an_invalid_argument() {
        let err = extract_reference_groups_from_bytes(&[0x3c, 0xff, 0xfe], &ScanOptions::default()).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));

        let ok = extract_reference_groups_from_bytes(br#"<img src="a.png">"#, &ScanOptions::default()).unwrap();
        assert_eq!(urls(&ok), [vec!["a.png"]]);
    }

    #[test]
    fn mismatched_close_seals_under_default_policy() {
        // <div><script src="a.js"></script></div><script src="b.js"></script>
        let markup = r#"<div><script src="a.js"></script></div><script src="b.js"></script>"#;
        let events = vec![
            open("div", &[], 0),
            open("script", &[("src", "a.js")], 5),
            close("script", 33),
            close("div", 39),
            open("script", &[("src", "b.js")], 39),
            close("script", 67),
            Event::End,
        ];

        let sealed = group_events(markup, &ScanOptions::default(), events.clone()).unwrap();
        assert_eq!(urls(&sealed), [vec!["a.js", "b.js"]]);
        assert_eq!(sealed[0][0].end, 33);

        let lenient = ScanOptions {
            close_tag_policy: CloseTagPolicy::Lenient,
            ..ScanOptions::default()
        };
        let stretched = group_events(markup, &lenient, events).unwrap();
        assert_eq!(stretched[0][0].end, 39);
        assert_eq!(stretched[0][0].text, r#"<script src="a.js"></script></div>"#);
    }

    #[test]
    fn unclosed_reference_is_dropped() {
        let markup = r#"<script src="a.js">"#;
        let events = vec![open("script", &[("src", "a.js")], 0), Event::End];
        let groups = group_events(markup, &ScanOptions::default(), events).unwrap();
        assert!(groups.is_empty());
    }

    #[test]
    fn imports_form_their_own_groups() {
        let html = r#"<link rel="import" href="a.html"><link rel="import" href="b.html">"#;
        let groups = scan(html);
        assert_eq!(urls(&groups), [vec!["a.html"], vec!["b.html"]]);
        assert_eq!(groups[0][0].kind, RefKind::Import);

        let off = ScanOptions {
            html_imports: false,
            ..ScanOptions::default()
        };
        assert!(extract_reference_groups(html, &off).unwrap().is_empty());
    }

    #[test]
    fn conditional_opener_matches_only_bracketed_conditions() {
        assert_eq!(CONDITIONAL_OPENER.find("[if lt IE 9]><script>").map(|m| m.end()), Some(13));
        assert!(CONDITIONAL_OPENER.find(" theme ").is_none());
        assert!(CONDITIONAL_OPENER.find("[]>").is_none());
    }
}
