//! XML codec errors.

/// Why XML encoding or decoding failed.
#[derive(Debug, thiserror::Error)]
pub enum XmlError {
    /// Writing to the output buffer failed.
    #[error("xml write error: {0}")]
    Io(#[from] std::io::Error),

    /// The input document is not parseable.
    #[error("xml parse error: {0}")]
    Parse(String),

    /// A required element is absent.
    #[error("missing element: {0}")]
    MissingElement(String),

    /// The document ended before the structure was complete.
    #[error("unexpected end of document while reading {0}")]
    UnexpectedEof(String),
}

impl From<quick_xml::Error> for XmlError {
    fn from(err: quick_xml::Error) -> Self {
        Self::Parse(err.to_string())
    }
}
