//! Markup tree nodes.

use std::collections::HashMap;

/// Node in a parsed markup tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Element with a tag name, attributes and children.
    Element(Element),
    /// Decoded character data.
    Text(String),
    /// Comment body (without `<!--` / `-->`).
    Comment(String),
}

impl Node {
    /// Create a text node.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Borrow the element, if this node is one.
    #[must_use]
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Concatenated text of this node and its descendants. Comments are skipped.
    #[must_use]
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Self::Element(element) => {
                for child in &element.children {
                    child.collect_text(out);
                }
            }
            Self::Text(text) => out.push_str(text),
            Self::Comment(_) => {}
        }
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Self::Element(element)
    }
}

/// Element node.
///
/// Attribute order is preserved; names produced by the parser are lowercase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    /// Tag name.
    pub name: String,
    /// Attributes in source order.
    pub attrs: Vec<(String, String)>,
    /// Child nodes.
    pub children: Vec<Node>,
}

impl Element {
    /// Create an element with the given tag name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Add an attribute.
    #[must_use]
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(key, value);
        self
    }

    /// Set children.
    #[must_use]
    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    /// Whether this element has tag `name` (ASCII case-insensitive).
    #[must_use]
    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// Attribute value by name (ASCII case-insensitive).
    #[must_use]
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Set an attribute, replacing an existing value in place.
    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self
            .attrs
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(&key))
        {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((key, value)),
        }
    }

    /// Remove an attribute, returning its value.
    pub fn remove_attr(&mut self, key: &str) -> Option<String> {
        let index = self
            .attrs
            .iter()
            .position(|(k, _)| k.eq_ignore_ascii_case(key))?;
        Some(self.attrs.remove(index).1)
    }

    /// Attributes as a name → value map.
    #[must_use]
    pub fn attr_map(&self) -> HashMap<String, String> {
        self.attrs.iter().cloned().collect()
    }

    /// Copy of this element with attributes but without children.
    #[must_use]
    pub fn childless(&self) -> Self {
        Self {
            name: self.name.clone(),
            attrs: self.attrs.clone(),
            children: Vec::new(),
        }
    }
}

/// Parsed markup document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    /// Doctype declaration body (e.g. `html`), if present.
    pub doctype: Option<String>,
    /// Top-level nodes.
    pub nodes: Vec<Node>,
}

impl Document {
    /// Create a document without a doctype.
    #[must_use]
    pub fn new(nodes: Vec<Node>) -> Self {
        Self {
            doctype: None,
            nodes,
        }
    }
}

/// Outcome of visiting an element in [`rewrite_elements`].
#[derive(Debug)]
pub enum Rewrite {
    /// Keep the element and continue into its children.
    Descend(Element),
    /// Replace the element with these nodes. They are not visited.
    Replace(Vec<Node>),
}

/// Rebuild `nodes` depth-first, letting `visit` keep or replace every element.
///
/// Elements are visited in document order. Nodes produced by
/// [`Rewrite::Replace`] are spliced in place and not revisited.
pub fn rewrite_elements<E, F>(nodes: Vec<Node>, visit: &mut F) -> Result<Vec<Node>, E>
where
    F: FnMut(Element) -> Result<Rewrite, E>,
{
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node {
            Node::Element(element) => match visit(element)? {
                Rewrite::Descend(mut element) => {
                    let children = std::mem::take(&mut element.children);
                    element.children = rewrite_elements(children, visit)?;
                    out.push(Node::Element(element));
                }
                Rewrite::Replace(replacement) => out.extend(replacement),
            },
            other => out.push(other),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_attr_case_insensitive() {
        let mut element = Element::new("div").with_attr("LanguageSite", "en");

        assert_eq!(element.attr("languagesite"), Some("en"));
        element.set_attr("languagesite", "pl");
        assert_eq!(element.attrs.len(), 1);
        assert_eq!(element.remove_attr("LANGUAGESITE").as_deref(), Some("pl"));
        assert!(element.attrs.is_empty());
    }

    #[test]
    fn test_childless_keeps_attributes() {
        let element = Element::new("p")
            .with_attr("class", "intro")
            .with_children(vec![Node::text("hi")]);

        let copy = element.childless();

        assert_eq!(copy.attr("class"), Some("intro"));
        assert!(copy.children.is_empty());
        assert_eq!(element.children.len(), 1);
    }

    #[test]
    fn test_text_content_skips_comments() {
        let node = Node::from(Element::new("p").with_children(vec![
            Node::text("a"),
            Node::Comment("hidden".to_owned()),
            Element::new("b").with_children(vec![Node::text("c")]).into(),
        ]));

        assert_eq!(node.text_content(), "ac");
    }

    #[test]
    fn test_rewrite_replaces_without_revisiting() {
        let nodes = vec![
            Element::new("x").into(),
            Element::new("div")
                .with_children(vec![Element::new("x").into()])
                .into(),
        ];
        let mut visited = 0;

        let result = rewrite_elements(nodes, &mut |element: Element| {
            visited += 1;
            if element.is("x") {
                // The replacement contains another <x>, which must not loop.
                Ok::<_, Infallible>(Rewrite::Replace(vec![
                    Node::text("["),
                    Element::new("x").into(),
                    Node::text("]"),
                ]))
            } else {
                Ok(Rewrite::Descend(element))
            }
        })
        .unwrap();

        assert_eq!(visited, 3);
        assert_eq!(result.len(), 4);
        let div = result[3].as_element().unwrap();
        assert_eq!(div.children.len(), 3);
    }
}
