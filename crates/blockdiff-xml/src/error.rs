//! Error types for the interchange tree.

/// Errors that can occur while reading interchange text.
#[derive(Debug, thiserror::Error)]
pub enum XmlError {
    /// The text is not well-formed.
    #[error("malformed xml: {0}")]
    Malformed(#[from] roxmltree::Error),

    /// The text parsed but contains no root element.
    #[error("document has no root element")]
    Empty,
}

/// Convenience alias for interchange results.
pub type XmlResult<T> = Result<T, XmlError>;
