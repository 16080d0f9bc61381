//! Error types for document parsing and writing

/// Document errors
#[derive(Debug, thiserror::Error)]
pub enum XmlError {
    /// Underlying reader rejected the input
    #[error("malformed xml at byte {position}: {message}")]
    Malformed { position: u64, message: String },

    /// Element or attribute name is not valid UTF-8
    #[error("invalid utf-8 in {0}")]
    InvalidUtf8(&'static str),

    /// Closing tag does not match the open element
    #[error("unexpected closing tag </{found}> (open element: {expected})")]
    MismatchedTag { expected: String, found: String },

    /// Input ended with open elements
    #[error("unexpected end of document inside <{0}>")]
    UnexpectedEof(String),

    /// Input contained no root element
    #[error("document has no root element")]
    Empty,

    /// Serialization failed
    #[error("failed to write xml: {0}")]
    Write(String),
}

impl XmlError {
    pub(crate) fn malformed(position: u64, message: impl ToString) -> Self {
        Self::Malformed {
            position,
            message: message.to_string(),
        }
    }
}

/// Result type alias for document operations
pub type XmlResult<T> = Result<T, XmlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mismatched_tag_display() {
        let err = XmlError::MismatchedTag {
            expected: "art:artifact".to_string(),
            found: "name".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "unexpected closing tag </name> (open element: art:artifact)"
        );
    }
}
