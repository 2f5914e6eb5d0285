//! HTML serializer.

use std::fmt::Write;

use crate::node::{Document, Element, Node};
use crate::parser::{is_raw_text, is_void};

impl Document {
    /// Serialize the document to HTML text.
    #[must_use]
    pub fn to_html(&self) -> String {
        let mut out = String::with_capacity(4096);
        if let Some(doctype) = &self.doctype {
            let _ = write!(out, "<!DOCTYPE {doctype}>");
        }
        for node in &self.nodes {
            write_node(node, &mut out, false);
        }
        out
    }
}

/// Serialize a node sequence to HTML text.
#[must_use]
pub fn serialize_nodes(nodes: &[Node]) -> String {
    let mut out = String::with_capacity(1024);
    for node in nodes {
        write_node(node, &mut out, false);
    }
    out
}

fn write_node(node: &Node, out: &mut String, raw: bool) {
    match node {
        Node::Element(element) => write_element(element, out),
        Node::Text(text) if raw => out.push_str(text),
        Node::Text(text) => out.push_str(&escape_text(text)),
        Node::Comment(comment) => {
            let _ = write!(out, "<!--{comment}-->");
        }
    }
}

fn write_element(element: &Element, out: &mut String) {
    out.push('<');
    out.push_str(&element.name);
    for (key, value) in &element.attrs {
        let _ = write!(out, r#" {key}="{}""#, escape_attr(value));
    }

    if element.children.is_empty() && is_void(&element.name) {
        out.push_str("/>");
        return;
    }
    out.push('>');

    let raw = is_raw_text(&element.name);
    for child in &element.children {
        write_node(child, out, raw);
    }

    let _ = write!(out, "</{}>", element.name);
}

/// Escape text content.
fn escape_text(text: &str) -> String {
    escape(text, false)
}

/// Escape a double-quoted attribute value.
fn escape_attr(text: &str) -> String {
    escape(text, true)
}

fn escape(text: &str, escape_quotes: bool) -> String {
    let mut result = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' if escape_quotes => result.push_str("&quot;"),
            _ => result.push(ch),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::parser::parse;

    #[test]
    fn test_serialize_nested() {
        let div = Element::new("div").with_children(vec![
            Node::text("42"),
            Element::new("p").with_children(vec![Node::text("hi")]).into(),
        ]);

        assert_eq!(serialize_nodes(&[div.into()]), "<div>42<p>hi</p></div>");
    }

    #[test]
    fn test_serialize_empty_elements() {
        let nodes = vec![
            Element::new("br").into(),
            Element::new("p").into(),
            Element::new("img").with_attr("src", "a.png").into(),
        ];

        assert_eq!(serialize_nodes(&nodes), r#"<br/><p></p><img src="a.png"/>"#);
    }

    #[test]
    fn test_escape_special_chars() {
        let p = Element::new("p")
            .with_attr("title", r#"say "hi" & go"#)
            .with_children(vec![Node::text("a < b & c > d")]);

        assert_eq!(
            serialize_nodes(&[p.into()]),
            r#"<p title="say &quot;hi&quot; &amp; go">a &lt; b &amp; c &gt; d</p>"#
        );
    }

    #[test]
    fn test_raw_text_not_escaped() {
        let script = Element::new("script").with_children(vec![Node::text("a < b && c")]);

        assert_eq!(
            serialize_nodes(&[script.into()]),
            "<script>a < b && c</script>"
        );
    }

    #[test]
    fn test_serialize_document() {
        let doc = Document {
            doctype: Some("html".to_owned()),
            nodes: vec![
                Node::text("\n"),
                Element::new("html").with_attr("lang", "en").into(),
            ],
        };

        assert_eq!(doc.to_html(), "<!DOCTYPE html>\n<html lang=\"en\"></html>");
    }

    #[test]
    fn test_parse_serialize_preserves_markup() {
        let html = "<!DOCTYPE html>\n<head><meta charset=\"utf-8\"/><title>T</title></head>\
                    <body><!-- c --><p class=\"x\">a &amp; b<br/>c</p></body>";

        assert_eq!(parse(html).unwrap().to_html(), html);
    }
}
