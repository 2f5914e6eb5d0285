//! Page rendering: expansion, language splitting and placeholder substitution.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use polyglot_markup::Document;
use polyglot_template::TemplateEngine;

use crate::error::SiteError;
use crate::paths::{PagePath, SiteNames, substitute_placeholders};
use crate::split::split;

/// Attribute restricting an element to one language.
pub const DEFAULT_SCOPE_ATTRIBUTE: &str = "languagesite";

/// Language settings shared by every page of a site.
#[derive(Clone, Debug)]
pub struct SiteSettings {
    /// Output languages, in configuration order.
    pub languages: Vec<String>,
    /// Localized path segment names.
    pub names: SiteNames,
    /// Language scope attribute.
    pub scope_attribute: String,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            languages: vec!["en".to_owned()],
            names: SiteNames::default(),
            scope_attribute: DEFAULT_SCOPE_ATTRIBUTE.to_owned(),
        }
    }
}

/// One page rendered for one language.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedPage {
    /// Output path relative to the output directory.
    pub path: PathBuf,
    /// Final HTML text.
    pub html: String,
}

/// Renders source documents into per-language pages.
#[derive(Clone, Debug)]
pub struct PageRenderer {
    source_dir: PathBuf,
    settings: SiteSettings,
}

impl PageRenderer {
    /// Create a renderer for pages under `source_dir`.
    pub fn new(source_dir: impl Into<PathBuf>, settings: SiteSettings) -> Self {
        Self {
            source_dir: source_dir.into(),
            settings,
        }
    }

    /// Site settings in use.
    pub fn settings(&self) -> &SiteSettings {
        &self.settings
    }

    /// Render a parsed source document.
    ///
    /// `relative` is the document's path below the source directory; it
    /// determines the output paths and the placeholder values.
    pub fn render(
        &self,
        engine: &mut TemplateEngine,
        document: Document,
        relative: &Path,
    ) -> Result<BTreeMap<String, RenderedPage>, SiteError> {
        let source = self.source_dir.join(relative);
        let expanded = engine.expand_document(document, &source)?;
        let outputs = split(
            &expanded,
            &source,
            &self.settings.languages,
            &self.settings.scope_attribute,
        )?;

        let paths = self
            .settings
            .languages
            .iter()
            .map(|lang| {
                let path = PagePath::localize(relative, lang, &self.settings.names)?;
                Ok((lang.clone(), path))
            })
            .collect::<Result<BTreeMap<String, PagePath>, SiteError>>()?;

        Ok(outputs
            .into_iter()
            .map(|(lang, output)| {
                let html = substitute_placeholders(&output.to_html(), &lang, &paths);
                let path = paths[&lang].relative_path();
                (lang, RenderedPage { path, html })
            })
            .collect())
    }

    /// Read, parse and render the source file at `relative`.
    pub fn render_file(
        &self,
        engine: &mut TemplateEngine,
        relative: &Path,
    ) -> Result<BTreeMap<String, RenderedPage>, SiteError> {
        let path = self.source_dir.join(relative);
        tracing::info!(path = %path.display(), "Parsing page");

        let text = fs::read_to_string(&path).map_err(|e| SiteError::io(&path, e))?;
        let document =
            polyglot_markup::parse(&text).map_err(|source| SiteError::Parse { path, source })?;
        self.render(engine, document, relative)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn settings(langs: &[&str]) -> SiteSettings {
        let mut names = SiteNames::new();
        names.insert("sub", "pl", "pod");
        SiteSettings {
            languages: langs.iter().map(|&l| l.to_owned()).collect(),
            names,
            ..SiteSettings::default()
        }
    }

    #[test]
    fn test_render_expands_splits_and_substitutes() {
        let templates = tempfile::tempdir().unwrap();
        fs::write(
            templates.path().join("link.html"),
            r#"<a href="/$PATH$/"><template-body-slot/></a>"#,
        )
        .unwrap();
        let mut engine = TemplateEngine::new(templates.path());
        let renderer = PageRenderer::new("site", settings(&["en", "pl"]));

        let document = polyglot_markup::parse(
            r#"<template-invocation location="link.html"><span languagesite="en">Up</span><span languagesite="pl">W górę</span></template-invocation>"#,
        )
        .unwrap();
        let pages = renderer
            .render(&mut engine, document, Path::new("sub/page.html"))
            .unwrap();

        assert_eq!(
            pages["en"],
            RenderedPage {
                path: PathBuf::from("en/sub/page.html"),
                html: "<!DOCTYPE html>\n<html lang=\"en\"><a href=\"/en/sub/\"><span>Up</span></a></html>"
                    .to_owned(),
            }
        );
        assert_eq!(
            pages["pl"],
            RenderedPage {
                path: PathBuf::from("pl/pod/page.html"),
                html: "<!DOCTYPE html>\n<html lang=\"pl\"><a href=\"/pl/pod/\"><span>W górę</span></a></html>"
                    .to_owned(),
            }
        );
    }

    #[test]
    fn test_render_errors_name_the_source_file() {
        let templates = tempfile::tempdir().unwrap();
        let mut engine = TemplateEngine::new(templates.path());
        let renderer = PageRenderer::new("site", settings(&["en", "pl"]));

        let document =
            polyglot_markup::parse(r#"<p languagesite="fr">Bonjour</p>"#).unwrap();
        let err = renderer
            .render(&mut engine, document, Path::new("hello.html"))
            .unwrap_err();

        assert!(matches!(err, SiteError::Split(_)));
        assert!(err.to_string().starts_with("(site/hello.html)"));
    }

    #[test]
    fn test_render_file_reads_from_source_dir() {
        let root = tempfile::tempdir().unwrap();
        let source_dir = root.path().join("site");
        fs::create_dir(&source_dir).unwrap();
        fs::write(source_dir.join("index.html"), "<h1>$LANG$</h1>").unwrap();
        let mut engine = TemplateEngine::new(root.path().join("templates"));
        let renderer = PageRenderer::new(&source_dir, settings(&["en"]));

        let pages = renderer
            .render_file(&mut engine, Path::new("index.html"))
            .unwrap();

        assert_eq!(pages["en"].html, "<!DOCTYPE html>\n<html lang=\"en\"><h1>en</h1></html>");
    }

    #[test]
    fn test_render_file_missing() {
        let root = tempfile::tempdir().unwrap();
        let mut engine = TemplateEngine::new(root.path());
        let renderer = PageRenderer::new(root.path(), SiteSettings::default());

        let err = renderer
            .render_file(&mut engine, Path::new("nope.html"))
            .unwrap_err();

        assert!(matches!(err, SiteError::Io { .. }));
    }
}
