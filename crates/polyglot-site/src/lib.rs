//! Multi-language page rendering and site building for Polyglot.
//!
//! This crate provides:
//! - [`split`]: derive one output document per language from a source tree
//! - [`PagePath`] / [`substitute_placeholders`]: localized output paths and
//!   the `$LANG$`, `$PATH$`, `$PARENTPATH$`, `$PATHEND$`, `$PATH[<lang>]$`
//!   placeholders
//! - [`PageRenderer`]: expand, split and substitute one source document
//! - [`SiteBuilder`]: discover, render and write a whole site
//!
//! # Quick Start
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use polyglot_site::{SiteBuilder, SiteLayout, SiteSettings};
//!
//! let layout = SiteLayout {
//!     source_dir: "site".into(),
//!     template_dir: "templates".into(),
//!     resource_dir: "resource".into(),
//!     output_dir: "generated_site".into(),
//! };
//! let settings = SiteSettings {
//!     languages: vec!["en".to_owned(), "pl".to_owned()],
//!     ..SiteSettings::default()
//! };
//!
//! let report = SiteBuilder::new(layout, settings).build()?;
//! println!("{} pages", report.pages);
//! # Ok(())
//! # }
//! ```

mod builder;
mod error;
mod paths;
mod renderer;
mod scanner;
mod split;

pub use builder::{BuildReport, RenderedSource, SiteBuilder, SiteLayout};
pub use error::SiteError;
pub use paths::{PagePath, SiteNames, substitute_placeholders};
pub use renderer::{DEFAULT_SCOPE_ATTRIBUTE, PageRenderer, RenderedPage, SiteSettings};
pub use split::{SplitError, split};
