//! Per-language document splitting.
//!
//! Walks one expanded source tree and builds one output document per
//! configured language. An element carrying the scope attribute (by default
//! `languagesite`) and everything below it contributes only to that
//! language; unscoped content goes to every language.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use polyglot_markup::{Document, Element, Node};

/// Error raised while splitting a document by language.
#[derive(Debug, thiserror::Error)]
pub enum SplitError {
    /// The scope attribute names a language that is not configured.
    #[error("({}): '{language}' is not a supported language", document.display())]
    UnsupportedLanguage {
        /// Source document.
        document: PathBuf,
        /// Declared language.
        language: String,
    },

    /// A nested element declares a language other than the inherited one.
    #[error(
        "({}): <{element}>'s lang attribute '{declared}' does not match the inherited value of '{inherited}'",
        document.display()
    )]
    ScopeMismatch {
        /// Source document.
        document: PathBuf,
        /// Element carrying the conflicting attribute.
        element: String,
        /// Declared language.
        declared: String,
        /// Language inherited from an ancestor.
        inherited: String,
    },
}

/// Split `document` into one output document per language.
///
/// Each output is `<!DOCTYPE html>` followed by `<html lang="…">` holding
/// that language's share of the source nodes. Comments are dropped and the
/// scope attribute is stripped from every copied element.
pub fn split(
    document: &Document,
    source: &Path,
    languages: &[String],
    scope_attribute: &str,
) -> Result<BTreeMap<String, Document>, SplitError> {
    let mut splitter = Splitter {
        source,
        languages,
        scope_attribute,
        roots: languages
            .iter()
            .map(|lang| Element::new("html").with_attr("lang", lang.as_str()))
            .collect(),
        cursors: vec![Vec::new(); languages.len()],
    };

    splitter.walk(&document.nodes, None)?;

    Ok(languages
        .iter()
        .cloned()
        .zip(splitter.roots)
        .map(|(lang, html)| {
            let output = Document {
                doctype: Some("html".to_owned()),
                nodes: vec![Node::text("\n"), Node::Element(html)],
            };
            (lang, output)
        })
        .collect())
}

/// Walk state. Language `i` owns `roots[i]` and `cursors[i]`.
struct Splitter<'a> {
    source: &'a Path,
    languages: &'a [String],
    scope_attribute: &'a str,
    roots: Vec<Element>,
    /// Child index path from the root to the element accepting children.
    cursors: Vec<Vec<usize>>,
}

impl Splitter<'_> {
    /// Process `nodes` with the inherited scope (`None` = unscoped).
    fn walk(&mut self, nodes: &[Node], scope: Option<usize>) -> Result<(), SplitError> {
        for node in nodes {
            match node {
                Node::Element(element) => self.visit_element(element, scope)?,
                Node::Text(text) => {
                    for lang in self.affected(scope) {
                        self.cursor_mut(lang).children.push(Node::text(text.as_str()));
                    }
                }
                Node::Comment(_) => {}
            }
        }
        Ok(())
    }

    fn visit_element(&mut self, element: &Element, inherited: Option<usize>) -> Result<(), SplitError> {
        let scope = match element.attr(self.scope_attribute) {
            None => inherited,
            Some(declared) => Some(self.check_declared(element, declared, inherited)?),
        };

        let mut copy = element.childless();
        copy.remove_attr(self.scope_attribute);

        let affected = self.affected(scope);
        for &lang in &affected {
            let parent = self.cursor_mut(lang);
            parent.children.push(Node::Element(copy.clone()));
            let index = parent.children.len() - 1;
            self.cursors[lang].push(index);
        }

        self.walk(&element.children, scope)?;

        for &lang in &affected {
            self.cursors[lang].pop();
        }
        Ok(())
    }

    fn check_declared(
        &self,
        element: &Element,
        declared: &str,
        inherited: Option<usize>,
    ) -> Result<usize, SplitError> {
        let Some(index) = self.languages.iter().position(|lang| lang == declared) else {
            return Err(SplitError::UnsupportedLanguage {
                document: self.source.to_path_buf(),
                language: declared.to_owned(),
            });
        };

        match inherited {
            Some(parent) if parent != index => Err(SplitError::ScopeMismatch {
                document: self.source.to_path_buf(),
                element: element.name.clone(),
                declared: declared.to_owned(),
                inherited: self.languages[parent].clone(),
            }),
            _ => Ok(index),
        }
    }

    fn affected(&self, scope: Option<usize>) -> Vec<usize> {
        match scope {
            Some(lang) => vec![lang],
            None => (0..self.languages.len()).collect(),
        }
    }

    fn cursor_mut(&mut self, lang: usize) -> &mut Element {
        let path = &self.cursors[lang];
        path.iter().fold(&mut self.roots[lang], |element, &index| {
            match &mut element.children[index] {
                Node::Element(child) => child,
                _ => unreachable!("render cursor always points at an element"),
            }
        })
    }
}
