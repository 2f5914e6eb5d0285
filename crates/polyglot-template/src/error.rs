//! Error and diagnostic types for template expansion.

use std::fmt;
use std::path::PathBuf;

use polyglot_markup::MarkupError;

/// Fatal template expansion error.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum TemplateError {
    /// The location normalizes to a path outside the template root.
    #[error("'{location}' reaches outside the '{}' folder", root.display())]
    OutsideRoot {
        /// Location as written in the directive.
        location: String,
        /// Template root.
        root: PathBuf,
    },

    /// No template file exists at the resolved path.
    #[error("there is no template at '{}'", .0.display())]
    NotFound(PathBuf),

    /// A directive lacks a required attribute.
    #[error("({}): <{element}> requires a '{attribute}' attribute", document.display())]
    MissingAttribute {
        /// Template or source document containing the directive.
        document: PathBuf,
        /// Directive element name.
        element: String,
        /// Missing attribute name.
        attribute: String,
    },

    /// A template invokes itself, directly or through other templates.
    #[error(
        "({}): cyclic template usage detected when trying to use the template at '{}'",
        document.display(),
        target.display()
    )]
    Cycle {
        /// Document containing the offending directive.
        document: PathBuf,
        /// Template already being expanded.
        target: PathBuf,
    },

    /// Template file could not be read.
    #[error("failed to read template '{}': {source}", path.display())]
    Read {
        /// Template path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Template file is not parseable markup.
    #[error("failed to parse template '{}': {source}", path.display())]
    Parse {
        /// Template path.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: MarkupError,
    },
}

/// Advisory finding reported during expansion. Expansion continues.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Diagnostic {
    /// A variable slot had no binding and was removed.
    UnboundVariable {
        /// Document containing the slot.
        document: PathBuf,
        /// Variable name declared by the slot.
        variable: String,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnboundVariable { document, variable } => write!(
                f,
                "({}): template variable '{variable}' has no value",
                document.display()
            ),
        }
    }
}
