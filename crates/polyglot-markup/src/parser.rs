//! Lenient HTML parser built on the quick-xml tokenizer.
//!
//! quick-xml is an XML tokenizer, so the parser adds the HTML rules the
//! templates rely on:
//!
//! - tag and attribute names are lowercased;
//! - void elements (`<br>`, `<meta>`, ...) never take children;
//! - `<script>` and `<style>` bodies are kept as raw text;
//! - an end tag closes the nearest open element with that name, and stray end
//!   tags are ignored;
//! - unclosed elements are closed at end of input;
//! - a bare `<` in text and unquoted attribute values are handled by
//!   `prepare` before tokenizing.

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::entities::{decode_reference, unescape};
use crate::error::MarkupError;
use crate::node::{Document, Element, Node};
use crate::prepare::prepare;

/// Elements that never have content.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements whose content is not markup.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Whether `name` is an HTML void element.
pub(crate) fn is_void(name: &str) -> bool {
    VOID_ELEMENTS.iter().any(|v| v.eq_ignore_ascii_case(name))
}

/// Whether `name` is an HTML raw text element.
pub(crate) fn is_raw_text(name: &str) -> bool {
    RAW_TEXT_ELEMENTS.iter().any(|v| v.eq_ignore_ascii_case(name))
}

/// Parse markup text into a [`Document`].
///
/// # Errors
///
/// Returns [`MarkupError::Syntax`] if the tokenizer cannot make sense of the
/// input (for example an unterminated tag).
pub fn parse(input: &str) -> Result<Document, MarkupError> {
    let prepared = prepare(input);
    let input = prepared.as_str();
    let mut builder = TreeBuilder::default();
    let mut offset = 0;

    // A raw text element is consumed by hand, then tokenizing restarts after
    // its end tag.
    'chunks: loop {
        let mut reader = Reader::from_str(&input[offset..]);
        configure(&mut reader);

        loop {
            let event = match reader.read_event() {
                Ok(event) => event,
                Err(source) => {
                    return Err(MarkupError::Syntax {
                        position: offset + position(&reader),
                        source,
                    });
                }
            };

            match event {
                Event::Start(e) => {
                    let element = start_element(&e);
                    if is_raw_text(&element.name) {
                        let content_start = offset + position(&reader);
                        let (text, resume) = raw_text(input, content_start, &element.name);
                        let children = if text.is_empty() {
                            Vec::new()
                        } else {
                            vec![Node::Text(text)]
                        };
                        builder.leaf(element.with_children(children));
                        offset = resume;
                        continue 'chunks;
                    }
                    if is_void(&element.name) {
                        builder.leaf(element);
                    } else {
                        builder.open(element);
                    }
                }
                Event::Empty(e) => builder.leaf(start_element(&e)),
                Event::End(e) => builder.close(&lowercase_name(e.name().as_ref())),
                Event::Text(e) => builder.text(&String::from_utf8_lossy(&e)),
                Event::GeneralRef(e) => {
                    let name = String::from_utf8_lossy(&e);
                    let text = decode_reference(&name).unwrap_or_else(|| format!("&{name};"));
                    builder.text(&text);
                }
                Event::CData(e) => builder.text(&String::from_utf8_lossy(&e)),
                Event::Comment(e) => builder.comment(String::from_utf8_lossy(&e).into_owned()),
                Event::DocType(e) => builder.doctype(String::from_utf8_lossy(&e).trim()),
                Event::Decl(_) | Event::PI(_) => {}
                Event::Eof => break 'chunks,
            }
        }
    }

    Ok(builder.finish())
}

fn configure(reader: &mut Reader<&[u8]>) {
    let config = reader.config_mut();
    config.trim_text(false);
    config.check_end_names = false;
    config.allow_unmatched_ends = true;
    config.allow_dangling_amp = true;
}

fn position(reader: &Reader<&[u8]>) -> usize {
    usize::try_from(reader.buffer_position()).unwrap_or(usize::MAX)
}

/// Read the body of a raw text element starting at `start`.
///
/// Returns the body and the offset just past the matching end tag (or the end
/// of input when the element is never closed).
fn raw_text(input: &str, start: usize, name: &str) -> (String, usize) {
    let rest = &input[start..];
    // ASCII lowercasing keeps byte offsets intact.
    let lower = rest.to_ascii_lowercase();
    let closing = format!("</{name}");

    match lower.find(&closing) {
        Some(end) => {
            let after = rest[end..].find('>').map_or(rest.len(), |gt| end + gt + 1);
            (rest[..end].to_owned(), start + after)
        }
        None => (rest.to_owned(), input.len()),
    }
}

fn start_element(e: &BytesStart) -> Element {
    let mut element = Element::new(lowercase_name(e.name().as_ref()));
    for attr in e.html_attributes().flatten() {
        let key = lowercase_name(attr.key.as_ref());
        let value = unescape(&String::from_utf8_lossy(&attr.value));
        element.set_attr(key, value);
    }
    element
}

fn lowercase_name(name: &[u8]) -> String {
    String::from_utf8_lossy(name).to_ascii_lowercase()
}

/// Accumulates parsed nodes into a tree.
#[derive(Default)]
struct TreeBuilder {
    doctype: Option<String>,
    root: Vec<Node>,
    open: Vec<Element>,
}

impl TreeBuilder {
    /// Children list of the innermost open element (or the document).
    fn children(&mut self) -> &mut Vec<Node> {
        match self.open.last_mut() {
            Some(element) => &mut element.children,
            None => &mut self.root,
        }
    }

    fn open(&mut self, element: Element) {
        self.open.push(element);
    }

    fn leaf(&mut self, element: Element) {
        self.children().push(Node::Element(element));
    }

    fn close(&mut self, name: &str) {
        if let Some(index) = self.open.iter().rposition(|e| e.name == name) {
            while self.open.len() > index {
                self.pop();
            }
        }
    }

    fn pop(&mut self) {
        if let Some(element) = self.open.pop() {
            self.children().push(Node::Element(element));
        }
    }

    fn text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let children = self.children();
        if let Some(Node::Text(last)) = children.last_mut() {
            last.push_str(text);
        } else {
            children.push(Node::Text(text.to_owned()));
        }
    }

    fn comment(&mut self, comment: String) {
        self.children().push(Node::Comment(comment));
    }

    fn doctype(&mut self, doctype: &str) {
        if self.doctype.is_none() {
            self.doctype = Some(doctype.to_owned());
        }
    }

    fn finish(mut self) -> Document {
        while !self.open.is_empty() {
            self.pop();
        }
        Document {
            doctype: self.doctype,
            nodes: self.root,
        }
    }
}
