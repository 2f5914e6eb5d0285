//! Template expansion with memoization and cycle detection.
//!
//! A template is expanded in two stages:
//!
//! - **Canonicalization** parses the file once and resolves every nested
//!   invocation. The result is cached per path and still contains the
//!   template's own body and variable slots.
//! - **Instantiation** deep-copies the cached tree and fills those slots for
//!   one invocation (variable slots inside the inserted body included), then
//!   resolves the invocations that arrived with the body.
//!
//! Because every instantiation works on its own copy, invocations never see
//! each other's bindings and the cached tree is never mutated.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use polyglot_markup::{Document, Element, Node, Rewrite, rewrite_elements};

use crate::directives::Directives;
use crate::error::{Diagnostic, TemplateError};
use crate::location::{locate, normalize};

/// Content and bindings of one live template invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invocation {
    /// Nodes inserted at every body slot. May be empty.
    pub body: Vec<Node>,
    /// Variable bindings keyed by lowercase name.
    vars: HashMap<String, String>,
}

impl Invocation {
    /// Create an invocation. Variable names are matched case-insensitively.
    pub fn new<K, V>(body: Vec<Node>, vars: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        Self {
            body,
            vars: vars
                .into_iter()
                .map(|(k, v)| (k.as_ref().to_ascii_lowercase(), v.into()))
                .collect(),
        }
    }

    /// Build an invocation from a directive element: children become the
    /// body and every attribute (including the location) a binding.
    fn from_directive(element: Element) -> Self {
        Self::new(element.children, element.attrs)
    }

    /// Value bound to `name`, if any.
    pub fn var(&self, name: &str) -> Option<&str> {
        self.vars
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

/// Expansion context for one generation run.
///
/// Owns the template cache, the stack of templates being canonicalized and
/// the advisory diagnostics collected so far. Create a fresh engine for each
/// independent run.
#[derive(Debug)]
pub struct TemplateEngine {
    root: PathBuf,
    written_root: PathBuf,
    directives: Directives,
    cache: HashMap<PathBuf, Vec<Node>>,
    stack: Vec<PathBuf>,
    diagnostics: Vec<Diagnostic>,
}

impl TemplateEngine {
    /// Create an engine for templates under `root`.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: normalize(root.as_ref()),
            written_root: root.as_ref().to_path_buf(),
            directives: Directives::default(),
            cache: HashMap::new(),
            stack: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Use a custom directive vocabulary.
    #[must_use]
    pub fn with_directives(mut self, directives: Directives) -> Self {
        self.directives = directives;
        self
    }

    /// Normalized template root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directive vocabulary in use.
    pub fn directives(&self) -> &Directives {
        &self.directives
    }

    /// Resolve a directive location to a canonical template path.
    ///
    /// Relative locations are rooted at the template root.
    pub fn locate(&self, location: &str) -> Result<PathBuf, TemplateError> {
        locate(&self.root, &self.written_root, location)
    }

    /// Resolve the template at `location`.
    ///
    /// With `invocation == None` this is a canonicalization request: the
    /// cached canonical tree is returned (parsing and caching it first if
    /// needed) with its slots untouched. With `Some`, even an empty
    /// invocation, the slots are filled for that invocation.
    pub fn resolve(
        &mut self,
        location: &str,
        invocation: Option<&Invocation>,
    ) -> Result<Vec<Node>, TemplateError> {
        let path = self.locate(location)?;
        self.resolve_path(&path, invocation)
    }

    /// Canonicalize the template at `location`.
    pub fn canonicalize(&mut self, location: &str) -> Result<Vec<Node>, TemplateError> {
        self.resolve(location, None)
    }

    /// Instantiate the template at `location` for one invocation.
    pub fn instantiate(
        &mut self,
        location: &str,
        invocation: &Invocation,
    ) -> Result<Vec<Node>, TemplateError> {
        self.resolve(location, Some(invocation))
    }

    /// Resolve every invocation directive in a source document.
    ///
    /// Slot markers left over afterwards belong to the source document
    /// itself, which has no enclosing invocation: body slots are dropped and
    /// variable slots are reported as unbound.
    pub fn expand_document(
        &mut self,
        document: Document,
        source: &Path,
    ) -> Result<Document, TemplateError> {
        let nodes = self.expand_directives(source, document.nodes)?;
        let nodes = self.fill_slots(source, nodes, &Invocation::default())?;
        Ok(Document {
            doctype: document.doctype,
            nodes,
        })
    }

    /// Whether the template at `location` has been canonicalized.
    pub fn is_cached(&self, location: &str) -> bool {
        self.locate(location)
            .is_ok_and(|path| self.cache.contains_key(&path))
    }

    /// Number of canonicalized templates.
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    /// Advisory diagnostics collected so far.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Drain the collected diagnostics.
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    fn resolve_path(
        &mut self,
        path: &Path,
        invocation: Option<&Invocation>,
    ) -> Result<Vec<Node>, TemplateError> {
        if !path.is_file() {
            return Err(TemplateError::NotFound(path.to_path_buf()));
        }

        let nodes = self.canonical_copy(path)?;
        match invocation {
            None => Ok(nodes),
            Some(invocation) => {
                let nodes = self.fill_slots(path, nodes, invocation)?;
                self.expand_directives(path, nodes)
            }
        }
    }

    /// Deep copy of the canonical tree for `path`, canonicalizing on a miss.
    fn canonical_copy(&mut self, path: &Path) -> Result<Vec<Node>, TemplateError> {
        if let Some(nodes) = self.cache.get(path) {
            tracing::debug!(path = %path.display(), "Template cache hit");
            return Ok(nodes.clone());
        }

        if self.stack.iter().any(|p| p == path) {
            let document = self.stack.last().cloned().unwrap_or_else(|| path.to_path_buf());
            return Err(TemplateError::Cycle {
                document,
                target: path.to_path_buf(),
            });
        }

        self.stack.push(path.to_path_buf());
        let result = self
            .parse_template(path)
            .and_then(|nodes| self.expand_directives(path, nodes));
        self.stack.pop();

        let nodes = result?;
        self.cache.insert(path.to_path_buf(), nodes.clone());
        Ok(nodes)
    }

    fn parse_template(&self, path: &Path) -> Result<Vec<Node>, TemplateError> {
        tracing::info!(path = %path.display(), "Parsing template");

        let text = fs::read_to_string(path).map_err(|source| TemplateError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let document = polyglot_markup::parse(&text).map_err(|source| TemplateError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(document.nodes)
    }

    /// Fill the body and variable slots of `document` for one invocation.
    ///
    /// Body slots are filled first. Body slots that arrive with the body are
    /// left in place; variable slots are filled everywhere afterwards,
    /// including inside the inserted body.
    fn fill_slots(
        &mut self,
        document: &Path,
        nodes: Vec<Node>,
        invocation: &Invocation,
    ) -> Result<Vec<Node>, TemplateError> {
        let body_slot = &self.directives.body_slot;
        let nodes = rewrite_elements(nodes, &mut |element: Element| -> Result<Rewrite, TemplateError> {
            if element.is(body_slot) {
                Ok(Rewrite::Replace(invocation.body.clone()))
            } else {
                Ok(Rewrite::Descend(element))
            }
        })?;

        let directives = &self.directives;
        let diagnostics = &mut self.diagnostics;

        rewrite_elements(nodes, &mut |element: Element| -> Result<Rewrite, TemplateError> {
            if !element.is(&directives.variable_slot) {
                return Ok(Rewrite::Descend(element));
            }

            let name = element.attr(&directives.name_attribute).ok_or_else(|| {
                TemplateError::MissingAttribute {
                    document: document.to_path_buf(),
                    element: element.name.clone(),
                    attribute: directives.name_attribute.clone(),
                }
            })?;

            match invocation.var(name) {
                Some("") => Ok(Rewrite::Replace(Vec::new())),
                Some(value) => Ok(Rewrite::Replace(vec![Node::text(value)])),
                None => {
                    tracing::warn!(
                        document = %document.display(),
                        variable = name,
                        "Template variable has no value"
                    );
                    diagnostics.push(Diagnostic::UnboundVariable {
                        document: document.to_path_buf(),
                        variable: name.to_owned(),
                    });
                    Ok(Rewrite::Replace(Vec::new()))
                }
            }
        })
    }

    /// Replace every invocation directive in `nodes` with its expansion.
    fn expand_directives(
        &mut self,
        document: &Path,
        nodes: Vec<Node>,
    ) -> Result<Vec<Node>, TemplateError> {
        let directives = self.directives.clone();

        rewrite_elements(nodes, &mut |element: Element| -> Result<Rewrite, TemplateError> {
            if !element.is(&directives.invocation) {
                return Ok(Rewrite::Descend(element));
            }

            let location = element
                .attr(&directives.location_attribute)
                .ok_or_else(|| TemplateError::MissingAttribute {
                    document: document.to_path_buf(),
                    element: element.name.clone(),
                    attribute: directives.location_attribute.clone(),
                })?;
            let target = self.locate(location)?;

            if self.stack.contains(&target) {
                return Err(TemplateError::Cycle {
                    document: document.to_path_buf(),
                    target,
                });
            }

            let invocation = Invocation::from_directive(element);
            self.resolve_path(&target, Some(&invocation))
                .map(Rewrite::Replace)
        })
    }
}

#[cfg(test)]
mod tests {
    use polyglot_markup::{parse, serialize_nodes};
    use pretty_assertions::assert_eq;

    use super::*;

    static_assertions::assert_impl_all!(TemplateEngine: Send);

    fn write(dir: &Path, name: &str, content: &str) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    fn render_source(engine: &mut TemplateEngine, source: &str) -> Result<String, TemplateError> {
        let document = parse(source).unwrap();
        let expanded = engine.expand_document(document, Path::new("site/page.html"))?;
        Ok(serialize_nodes(&expanded.nodes))
    }

    fn body(html: &str) -> Vec<Node> {
        parse(html).unwrap().nodes
    }

    const SLOT_TEMPLATE: &str =
        r#"<div><template-variable-slot name="x"/><template-body-slot/></div>"#;

    #[test]
    fn test_variable_and_body_substitution() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "box.html", SLOT_TEMPLATE);
        let mut engine = TemplateEngine::new(dir.path());

        let invocation = Invocation::new(body("<p>hi</p>"), [("x", "42")]);
        let nodes = engine.instantiate("box.html", &invocation).unwrap();

        assert_eq!(serialize_nodes(&nodes), "<div>42<p>hi</p></div>");
        assert!(engine.diagnostics().is_empty());
    }

    #[test]
    fn test_unbound_variable_is_advisory() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "box.html", SLOT_TEMPLATE);
        let mut engine = TemplateEngine::new(dir.path());

        let invocation = Invocation::new(body("<p>hi</p>"), Vec::<(&str, &str)>::new());
        let nodes = engine.instantiate("box.html", &invocation).unwrap();

        assert_eq!(serialize_nodes(&nodes), "<div><p>hi</p></div>");
        assert_eq!(
            engine.diagnostics(),
            &[Diagnostic::UnboundVariable {
                document: engine.locate("box.html").unwrap(),
                variable: "x".to_owned(),
            }]
        );
    }

    #[test]
    fn test_directive_in_source_document() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "box.html", SLOT_TEMPLATE);
        let mut engine = TemplateEngine::new(dir.path());

        let html = render_source(
            &mut engine,
            r#"<body><Template-Invocation location="box.html" X="42"><p>hi</p></Template-Invocation></body>"#,
        )
        .unwrap();

        assert_eq!(html, "<body><div>42<p>hi</p></div></body>");
    }

    #[test]
    fn test_canonical_form_keeps_own_slots() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "box.html", SLOT_TEMPLATE);
        let mut engine = TemplateEngine::new(dir.path());

        let nodes = engine.canonicalize("box.html").unwrap();

        assert_eq!(
            serialize_nodes(&nodes),
            r#"<div><template-variable-slot name="x"></template-variable-slot><template-body-slot></template-body-slot></div>"#
        );
        assert!(engine.diagnostics().is_empty());
    }

    #[test]
    fn test_canonicalize_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.html", r#"<p><template-invocation location="b.html"/></p>"#);
        write(dir.path(), "b.html", "<b>one</b>");
        let mut engine = TemplateEngine::new(dir.path());

        let first = engine.canonicalize("a.html").unwrap();
        // Changes on disk are not observed once a path is cached.
        write(dir.path(), "a.html", "<p>changed</p>");
        write(dir.path(), "b.html", "<b>two</b>");
        let second = engine.canonicalize("a.html").unwrap();

        assert_eq!(first, second);
        assert_eq!(serialize_nodes(&second), "<p><b>one</b></p>");
        assert_eq!(engine.cached_len(), 2);
        assert!(engine.is_cached("b.html"));
    }

    #[test]
    fn test_empty_body_is_a_live_invocation() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "box.html", SLOT_TEMPLATE);
        let mut engine = TemplateEngine::new(dir.path());

        let live = engine.resolve("box.html", Some(&Invocation::default())).unwrap();
        let canonical = engine.resolve("box.html", None).unwrap();

        assert_eq!(serialize_nodes(&live), "<div></div>");
        assert_eq!(engine.diagnostics().len(), 1);
        assert!(serialize_nodes(&canonical).contains("template-body-slot"));
    }

    #[test]
    fn test_invocations_are_isolated() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "tag.html",
            r#"<span><template-variable-slot name="v"/></span>"#,
        );
        let mut engine = TemplateEngine::new(dir.path());

        let html = render_source(
            &mut engine,
            r#"<template-invocation location="tag.html" v="1"/><template-invocation location="tag.html" v="2"/>"#,
        )
        .unwrap();

        assert_eq!(html, "<span>1</span><span>2</span>");
        let canonical = engine.canonicalize("tag.html").unwrap();
        assert!(serialize_nodes(&canonical).contains("template-variable-slot"));
    }

    #[test]
    fn test_every_body_slot_gets_a_copy() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "twice.html",
            "<a><template-body-slot/></a><b><template-body-slot/></b>",
        );
        let mut engine = TemplateEngine::new(dir.path());

        let nodes = engine
            .instantiate("twice.html", &Invocation::new(body("<i>x</i>"), Vec::<(&str, &str)>::new()))
            .unwrap();

        assert_eq!(serialize_nodes(&nodes), "<a><i>x</i></a><b><i>x</i></b>");
    }

    #[test]
    fn test_nested_layouts_forward_body() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "layout.html", "<main><template-body-slot/></main>");
        write(
            dir.path(),
            "page.html",
            r#"<template-invocation location="layout.html" heading="Page"><h1><template-variable-slot name="heading"/></h1><template-body-slot/></template-invocation>"#,
        );
        let mut engine = TemplateEngine::new(dir.path());

        let html = render_source(
            &mut engine,
            r#"<template-invocation location="page.html"><p>x</p></template-invocation>"#,
        )
        .unwrap();

        assert_eq!(html, "<main><h1>Page</h1><p>x</p></main>");
        assert!(engine.diagnostics().is_empty());
    }

    #[test]
    fn test_variable_slot_in_body_is_filled_by_invocation() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "box.html", "<div><template-body-slot/></div>");
        let mut engine = TemplateEngine::new(dir.path());

        let invocation = Invocation::new(body(r#"<template-variable-slot name="x"/>"#), [("x", "42")]);
        let nodes = engine.instantiate("box.html", &invocation).unwrap();

        assert_eq!(serialize_nodes(&nodes), "<div>42</div>");
        assert!(engine.diagnostics().is_empty());
    }

    #[test]
    fn test_variable_slot_in_body_is_not_forwarded() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "layout.html", "<main><template-body-slot/></main>");
        write(
            dir.path(),
            "page.html",
            r#"<template-invocation location="layout.html"><h1><template-variable-slot name="title"/></h1></template-invocation>"#,
        );
        let mut engine = TemplateEngine::new(dir.path());

        let html = render_source(
            &mut engine,
            r#"<template-invocation location="page.html" title="Hi"/>"#,
        )
        .unwrap();

        // The inner invocation has no `title`, so the slot is consumed there.
        assert_eq!(html, "<main><h1></h1></main>");
        assert_eq!(engine.diagnostics().len(), 1);
    }

    #[test]
    fn test_relative_location_is_rooted_at_template_root() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "nav.html", "<nav>root</nav>");
        write(dir.path(), "parts/nav.html", "<nav>parts</nav>");
        write(
            dir.path(),
            "parts/header.html",
            r#"<header><template-invocation location="nav.html"/></header>"#,
        );
        let mut engine = TemplateEngine::new(dir.path());

        let nodes = engine.canonicalize("parts/header.html").unwrap();

        assert_eq!(serialize_nodes(&nodes), "<header><nav>root</nav></header>");
        assert_eq!(engine.locate("nav.html").unwrap(), engine.root().join("nav.html"));
    }

    #[test]
    fn test_body_may_invoke_the_same_template() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "box.html", "<div><template-body-slot/></div>");
        let mut engine = TemplateEngine::new(dir.path());

        let html = render_source(
            &mut engine,
            r#"<template-invocation location="box.html"><template-invocation location="box.html">x</template-invocation></template-invocation>"#,
        )
        .unwrap();

        assert_eq!(html, "<div><div>x</div></div>");
    }

    #[test]
    fn test_template_in_subdirectory() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "parts/nav.html", "<nav>menu</nav>");
        write(
            dir.path(),
            "layout.html",
            r#"<header><template-invocation location="parts/nav.html"/></header>"#,
        );
        let mut engine = TemplateEngine::new(dir.path());

        let nodes = engine.canonicalize("layout.html").unwrap();

        assert_eq!(serialize_nodes(&nodes), "<header><nav>menu</nav></header>");
    }

    #[test]
    fn test_cycle_is_detected() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.html", r#"<template-invocation location="b.html"/>"#);
        write(dir.path(), "b.html", r#"<template-invocation location="a.html"/>"#);
        let mut engine = TemplateEngine::new(dir.path());

        let err = engine.canonicalize("a.html").unwrap_err();

        let TemplateError::Cycle { document, target } = &err else {
            panic!("expected cycle, got {err:?}");
        };
        assert_eq!(document, &engine.locate("b.html").unwrap());
        assert_eq!(target, &engine.locate("a.html").unwrap());
        assert!(err.to_string().contains("a.html"));
        // The failed expansion leaves nothing marked in progress or cached.
        assert!(engine.stack.is_empty());
        assert_eq!(engine.cached_len(), 0);
    }

    #[test]
    fn test_self_invocation_is_a_cycle() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "loop.html", r#"<p><template-invocation location="loop.html"/></p>"#);
        let mut engine = TemplateEngine::new(dir.path());

        let err = render_source(&mut engine, r#"<template-invocation location="loop.html"/>"#)
            .unwrap_err();

        assert!(matches!(err, TemplateError::Cycle { .. }));
        assert!(engine.stack.is_empty());
    }

    #[test]
    fn test_missing_location_attribute() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = TemplateEngine::new(dir.path());

        let err = render_source(&mut engine, "<template-invocation>x</template-invocation>")
            .unwrap_err();

        assert!(matches!(err, TemplateError::MissingAttribute { .. }));
        assert!(err.to_string().contains("'location'"));
    }

    #[test]
    fn test_missing_name_attribute() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "bad.html", "<p><template-variable-slot/></p>");
        let mut engine = TemplateEngine::new(dir.path());

        let err = engine.instantiate("bad.html", &Invocation::default()).unwrap_err();

        assert!(matches!(err, TemplateError::MissingAttribute { .. }));
        assert!(err.to_string().contains("'name'"));
    }

    #[test]
    fn test_missing_template_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = TemplateEngine::new(dir.path());

        let err = engine.canonicalize("nope.html").unwrap_err();

        assert!(matches!(err, TemplateError::NotFound(_)));
    }

    #[test]
    fn test_location_outside_root() {
        let dir = tempfile::tempdir().unwrap();
        let templates = dir.path().join("templates");
        fs::create_dir(&templates).unwrap();
        write(dir.path(), "secret.html", "<p>secret</p>");
        let mut engine = TemplateEngine::new(&templates);

        let err = render_source(&mut engine, r#"<template-invocation location="../secret.html"/>"#)
            .unwrap_err();

        assert!(matches!(err, TemplateError::OutsideRoot { .. }));
    }

    #[test]
    fn test_leftover_source_slots() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = TemplateEngine::new(dir.path());

        let html = render_source(
            &mut engine,
            r#"<p>a<template-variable-slot name="x"/><template-body-slot/>b</p>"#,
        )
        .unwrap();

        assert_eq!(html, "<p>ab</p>");
        assert_eq!(engine.take_diagnostics().len(), 1);
        assert!(engine.diagnostics().is_empty());
    }

    #[test]
    fn test_custom_directives() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "t.html",
            r#"<em><customtemplatevar name="who"/></em><customtemplatebody/>"#,
        );
        let mut engine = TemplateEngine::new(dir.path()).with_directives(Directives {
            invocation: "CustomTemplate".to_owned(),
            body_slot: "CustomTemplateBody".to_owned(),
            variable_slot: "CustomTemplateVar".to_owned(),
            ..Directives::default()
        });

        let html = render_source(
            &mut engine,
            r#"<CustomTemplate location="t.html" who="you">!</CustomTemplate>"#,
        )
        .unwrap();

        assert_eq!(html, "<em>you</em>!");
    }

    #[test]
    fn test_invocation_var_lookup_ignores_case() {
        let invocation = Invocation::new(Vec::new(), [("UserName", "ada")]);
        assert_eq!(invocation.var("username"), Some("ada"));
        assert_eq!(invocation.var("USERNAME"), Some("ada"));
        assert_eq!(invocation.var("other"), None);
    }
}
