//! Lowers a tree-sitter HTML syntax tree into the flat, ordered event stream
//! the grouping scanner consumes.
//!
//! Every element produces an `OpenTag` followed, after its content, by a
//! `CloseTag`. Void, self-closing, and implicitly closed elements get their
//! `CloseTag` at the element's end. Raw `script`/`style` bodies, doctypes, and
//! stray end tags produce nothing.
//!
//! Error-recovery nodes are descended into. A tag the grammar could not place,
//! such as `<script src="a.js" />`, is left there as a bare `tag_name` followed
//! by its `attribute` nodes; that run becomes an open/close pair spanning the
//! tag.
use std::path::PathBuf;

use tree_sitter::{Node, Parser};

use crate::error::Error;
use crate::grammar;

/// Literal that opens a markup comment.
pub const COMMENT_OPEN: &str = "<!--";

/// Literal that closes a markup comment.
const COMMENT_CLOSE: &str = "-->";

/// Attributes of one open tag. Names are lowercased; values are raw source text.
/// A repeated attribute keeps its first value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes<'a> {
    /// Name/value pairs in source order.
    pairs: Vec<(String, &'a str)>,
}

impl<'a> Attributes<'a> {
    /// Look up an attribute value by lowercase name.
    pub fn get(&self, name: &str) -> Option<&'a str> {
        return self
            .pairs
            .iter()
            .find(|(key, _)| return key == name)
            .map(|&(_, value)| return value);
    }

    /// Add an attribute unless one with the same name already exists.
    pub fn insert(&mut self, name: &str, value: &'a str) {
        let name = name.to_ascii_lowercase();
        if self.pairs.iter().any(|(key, _)| return *key == name) {
            return;
        }
        self.pairs.push((name, value));
    }
}

impl<'a, 'n> FromIterator<(&'n str, &'a str)> for Attributes<'a> {
    fn from_iter<I: IntoIterator<Item = (&'n str, &'a str)>>(iter: I) -> Self {
        let mut attributes = Self::default();
        for (name, value) in iter {
            attributes.insert(name, value);
        }
        return attributes;
    }
}

/// One tokenizer event. Offsets are byte positions in the tokenized text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event<'a> {
    /// An element ended; `end` is just past its last byte.
    CloseTag {
        /// Exclusive end offset of the close tag (or of the void element).
        end: usize,
        /// Lowercased tag name.
        name: String,
    },
    /// A comment; `body` excludes the `<!--` and `-->` delimiters.
    Comment {
        /// Comment text between the delimiters.
        body: &'a str,
        /// Offset of the comment's `<`.
        start: usize,
    },
    /// End of input. Always the last event.
    End,
    /// An element started.
    OpenTag {
        /// Attributes as written.
        attributes: Attributes<'a>,
        /// Lowercased tag name.
        name: String,
        /// Offset of the tag's `<`.
        start: usize,
    },
    /// A run of character data or an entity.
    Text {
        /// Raw text.
        text: &'a str,
    },
}

/// Parse `markup` and return its event stream, terminated by `Event::End`.
///
/// # Errors
///
/// Returns `Error::ParseFailed` if the grammar cannot be loaded or tree-sitter
/// returns no tree. Malformed markup is not an error.
pub fn tokenize(markup: &str) -> Result<Vec<Event<'_>>, Error> {
    let mut parser = Parser::new();
    parser.set_language(&grammar::html()).map_err(|e| {
        return Error::ParseFailed {
            file: PathBuf::new(),
            reason: e.to_string(),
        };
    })?;

    let tree = parser.parse(markup, None).ok_or_else(|| {
        return Error::ParseFailed {
            file: PathBuf::new(),
            reason: "tree-sitter returned None".to_string(),
        };
    })?;

    let mut events = Vec::new();
    lower_node(tree.root_node(), markup, &mut events);
    events.push(Event::End);

    if log::log_enabled!(target: "bundlegroups.tokenizer", log::Level::Trace) {
        for event in &events {
            log::trace!(target: "bundlegroups.tokenizer", "event: {event:?}");
        }
    }
    return Ok(events);
}

/// Collect the attributes of a `start_tag` or `self_closing_tag` node.
fn collect_attributes<'a>(tag: Node<'_>, markup: &'a str) -> Attributes<'a> {
    let mut attributes = Attributes::default();
    let mut cursor = tag.walk();

    for attribute in tag.children(&mut cursor).filter(|c| return c.kind() == "attribute") {
        insert_attribute(attribute, markup, &mut attributes);
    }

    return attributes;
}

/// Text of a comment node without its delimiters.
fn comment_body<'a>(node: Node<'_>, markup: &'a str) -> &'a str {
    let raw = node_text(node, markup);
    let body = raw.strip_prefix(COMMENT_OPEN).unwrap_or(raw);
    return body.strip_suffix(COMMENT_CLOSE).unwrap_or(body);
}

/// Emit an open/close pair for a tag node that stands alone.
fn emit_standalone_tag<'a>(tag: Node<'_>, markup: &'a str, events: &mut Vec<Event<'a>>) {
    let name = tag_name(tag, markup);
    events.push(Event::OpenTag {
        attributes: collect_attributes(tag, markup),
        name: name.clone(),
        start: tag.start_byte(),
    });
    events.push(Event::CloseTag {
        end: tag.end_byte(),
        name,
    });
}

/// Add one `attribute` node's name and value.
fn insert_attribute<'a>(attribute: Node<'_>, markup: &'a str, attributes: &mut Attributes<'a>) {
    let mut cursor = attribute.walk();
    let mut name = None;
    let mut value = "";
    for part in attribute.children(&mut cursor) {
        match part.kind() {
            "attribute_name" => name = Some(node_text(part, markup)),
            "attribute_value" => value = node_text(part, markup),
            "quoted_attribute_value" => value = quoted_value(part, markup),
            _ => {},
        }
    }
    if let Some(name) = name {
        attributes.insert(name, value);
    }
}

/// Emit events for an element node and everything inside it.
fn lower_element<'a>(element: Node<'_>, markup: &'a str, events: &mut Vec<Event<'a>>) {
    let mut open_name = None;
    let mut closed = false;
    let mut cursor = element.walk();

    for child in element.children(&mut cursor) {
        match child.kind() {
            "end_tag" if child.is_missing() || tag_name(child, markup).is_empty() => {},
            "end_tag" => {
                events.push(Event::CloseTag {
                    end: child.end_byte(),
                    name: tag_name(child, markup),
                });
                closed = true;
            },
            "raw_text" => {},
            "self_closing_tag" => {
                emit_standalone_tag(child, markup, events);
                closed = true;
            },
            "start_tag" => {
                let name = tag_name(child, markup);
                events.push(Event::OpenTag {
                    attributes: collect_attributes(child, markup),
                    name: name.clone(),
                    start: child.start_byte(),
                });
                open_name = Some(name);
            },
            _ => lower_node(child, markup, events),
        }
    }

    if !closed && let Some(name) = open_name {
        events.push(Event::CloseTag {
            end: element.end_byte(),
            name,
        });
    }
}

/// Emit events for an error-recovery node.
///
/// A bare `tag_name` preceded by `<` opens a tag that closes at the next `>`
/// (or at its last attribute when none follows); its `attribute` siblings up to
/// that point belong to it. A bare `tag_name` preceded by `</` is a close tag.
/// Other children are lowered as usual.
fn lower_error<'a>(node: Node<'_>, markup: &'a str, events: &mut Vec<Event<'a>>) {
    let mut cursor = node.walk();
    let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
    let mut consumed = node.start_byte();
    let mut index = 0_usize;

    while let Some(&child) = children.get(index) {
        index = index.saturating_add(1);
        if child.start_byte() < consumed {
            continue;
        }
        if child.kind() != "tag_name" {
            lower_node(child, markup, events);
            continue;
        }

        let mut attributes = Attributes::default();
        let mut tag_end = child.end_byte();
        while let Some(&next) = children.get(index)
            && next.kind() == "attribute"
        {
            insert_attribute(next, markup, &mut attributes);
            tag_end = next.end_byte();
            index = index.saturating_add(1);
        }
        let end = markup
            .get(tag_end..node.end_byte())
            .and_then(|rest| return rest.find('>'))
            .map_or(tag_end, |at| return tag_end.saturating_add(at).saturating_add(1));
        consumed = end;

        let before = markup.get(..child.start_byte()).unwrap_or("");
        let name = node_text(child, markup).to_ascii_lowercase();
        if before.ends_with("</") {
            events.push(Event::CloseTag { end, name });
        } else if before.ends_with('<') {
            events.push(Event::OpenTag {
                attributes,
                name: name.clone(),
                start: child.start_byte().saturating_sub(1),
            });
            events.push(Event::CloseTag { end, name });
        } else {
            log::debug!(target: "bundlegroups.tokenizer", "stray tag name {name:?} at {}", child.start_byte());
        }
    }
}

/// Emit events for any node, dispatching on its kind.
fn lower_node<'a>(node: Node<'_>, markup: &'a str, events: &mut Vec<Event<'a>>) {
    match node.kind() {
        "comment" => events.push(Event::Comment {
            body: comment_body(node, markup),
            start: node.start_byte(),
        }),
        "doctype" | "erroneous_end_tag" | "raw_text" => {},
        "element" | "script_element" | "style_element" => lower_element(node, markup, events),
        "end_tag" => events.push(Event::CloseTag {
            end: node.end_byte(),
            name: tag_name(node, markup),
        }),
        "entity" | "text" => events.push(Event::Text {
            text: node_text(node, markup),
        }),
        "ERROR" => lower_error(node, markup, events),
        "self_closing_tag" | "start_tag" => emit_standalone_tag(node, markup, events),
        _ => {
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                lower_node(child, markup, events);
            }
        },
    }
}

/// Source text covered by a node, or empty if the range is not on char boundaries.
fn node_text<'a>(node: Node<'_>, markup: &'a str) -> &'a str {
    return markup.get(node.byte_range()).unwrap_or("");
}

/// Inner value of a `quoted_attribute_value`; empty quotes have no value child.
fn quoted_value<'a>(quoted: Node<'_>, markup: &'a str) -> &'a str {
    let mut cursor = quoted.walk();
    return quoted
        .children(&mut cursor)
        .find(|c| return c.kind() == "attribute_value")
        .map_or("", |v| return node_text(v, markup));
}

/// Lowercased tag name of a tag node.
fn tag_name(tag: Node<'_>, markup: &str) -> String {
    let mut cursor = tag.walk();
    return tag
        .children(&mut cursor)
        .find(|c| return c.kind() == "tag_name")
        .map(|n| return node_text(n, markup).to_ascii_lowercase())
        .unwrap_or_default();
}
