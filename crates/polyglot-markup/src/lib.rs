//! Markup tree for Polyglot.
//!
//! This crate provides:
//! - [`Node`], [`Element`] and [`Document`]: an owned, ordered markup tree
//!   where deep copy is [`Clone`]
//! - [`parse`]: a lenient HTML parser on top of quick-xml
//! - [`Document::to_html`] / [`serialize_nodes`]: HTML serialization
//! - [`rewrite_elements`]: depth-first element replacement
//!
//! # Example
//!
//! ```
//! use polyglot_markup::parse;
//!
//! let doc = parse("<div><P class=intro>Hi</P></div>")?;
//! assert_eq!(doc.to_html(), r#"<div><p class="intro">Hi</p></div>"#);
//! # Ok::<(), polyglot_markup::MarkupError>(())
//! ```

mod entities;
mod error;
mod node;
mod parser;
mod prepare;
mod serializer;

pub use error::MarkupError;
pub use node::{Document, Element, Node, Rewrite, rewrite_elements};
pub use parser::parse;
pub use serializer::serialize_nodes;
