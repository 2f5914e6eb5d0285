//! Site generation errors.

use std::path::PathBuf;

use polyglot_markup::MarkupError;
use polyglot_template::TemplateError;

use crate::split::SplitError;

/// Error returned when rendering a page or building the site fails.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SiteError {
    /// Template expansion failed.
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// Language splitting failed.
    #[error(transparent)]
    Split(#[from] SplitError),

    /// Source document is not parseable markup.
    #[error("failed to parse '{}': {source}", path.display())]
    Parse {
        /// Source document.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: MarkupError,
    },

    /// Filesystem operation failed.
    #[error("I/O error at '{}': {source}", path.display())]
    Io {
        /// Path being read or written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A rendered file lies outside the source directory.
    #[error("'{}' is not inside the source folder '{}'", path.display(), source_dir.display())]
    OutsideSource {
        /// Requested file.
        path: PathBuf,
        /// Configured source directory.
        source_dir: PathBuf,
    },

    /// A language code or localized name cannot be used as a path segment.
    #[error("'{segment}' (language '{lang}') is not a valid output folder or file name")]
    InvalidPathSegment {
        /// Offending segment.
        segment: String,
        /// Language being localized.
        lang: String,
    },

    /// The output directory would swallow one of the input directories.
    #[error(
        "output folder '{}' overlaps input folder '{}'",
        output_dir.display(),
        input_dir.display()
    )]
    OutputOverlap {
        /// Configured output directory.
        output_dir: PathBuf,
        /// Input directory it overlaps.
        input_dir: PathBuf,
    },
}

impl SiteError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
