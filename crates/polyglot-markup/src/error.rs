//! Error types for markup parsing.

/// Error while parsing markup text.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum MarkupError {
    /// The tokenizer rejected the input.
    #[error("markup syntax error at byte {position}")]
    Syntax {
        /// Byte offset in the input where the error was detected.
        position: usize,
        /// Underlying tokenizer error.
        #[source]
        source: quick_xml::Error,
    },
}
