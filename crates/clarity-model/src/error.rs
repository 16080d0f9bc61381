//! Error types for entity hydration

/// Errors raised while turning a fetched record into a typed entity
#[derive(Debug, thiserror::Error)]
pub enum EntityError {
    /// Required attribute absent
    #[error("{entity} record {uri} has no '{attribute}' attribute")]
    MissingAttribute {
        entity: &'static str,
        attribute: &'static str,
        uri: String,
    },

    /// Required child element absent
    #[error("{entity} record {uri} has no <{element}> element")]
    MissingElement {
        entity: &'static str,
        element: &'static str,
        uri: String,
    },

    /// Element present but its value does not parse
    #[error("{entity} record {uri} has invalid {field}: '{value}'")]
    InvalidValue {
        entity: &'static str,
        field: &'static str,
        value: String,
        uri: String,
    },

    /// Stream name other than `input` / `output`
    #[error("unknown stream '{0}' (expected 'input' or 'output')")]
    UnknownStream(String),
}

impl EntityError {
    /// Create missing element error
    pub fn missing_element(
        entity: &'static str,
        element: &'static str,
        uri: impl ToString,
    ) -> Self {
        Self::MissingElement {
            entity,
            element,
            uri: uri.to_string(),
        }
    }

    /// Create missing attribute error
    pub fn missing_attribute(
        entity: &'static str,
        attribute: &'static str,
        uri: impl ToString,
    ) -> Self {
        Self::MissingAttribute {
            entity,
            attribute,
            uri: uri.to_string(),
        }
    }
}

/// Result type alias for hydration
pub type EntityResult<T> = Result<T, EntityError>;
