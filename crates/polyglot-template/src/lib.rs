//! Template expansion for Polyglot.
//!
//! Templates are markup files under a template root. A document invokes one
//! with an invocation directive; the directive's children become the body
//! and its attributes become variables:
//!
//! ```html
//! <template-invocation location="layout.html" title="Home">
//!   <p>Welcome</p>
//! </template-invocation>
//! ```
//!
//! Inside the template, `<template-body-slot/>` is replaced by the body and
//! `<template-variable-slot name="title"/>` by the value of `title`.
//!
//! [`TemplateEngine`] parses each template once per run, caches its
//! canonical form and detects cyclic invocations.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use polyglot_template::TemplateEngine;
//!
//! let mut engine = TemplateEngine::new("templates");
//! let page = polyglot_markup::parse(r#"<template-invocation location="nav.html"/>"#)?;
//! let expanded = engine.expand_document(page, Path::new("site/index.html"))?;
//! println!("{}", expanded.to_html());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod directives;
mod engine;
mod error;
mod location;

pub use directives::Directives;
pub use engine::{Invocation, TemplateEngine};
pub use error::{Diagnostic, TemplateError};
