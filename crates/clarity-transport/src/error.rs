//! Error types for transport and configuration

use clarity_xml::XmlError;
use std::path::PathBuf;

/// Errors surfaced by a [`Transport`](crate::Transport)
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Connection or protocol failure before a status was received
    #[error("{method} {uri} failed: {message}")]
    Request {
        /// HTTP method of the failed call
        method: &'static str,
        /// Target of the failed call
        uri: String,
        /// Underlying client error text
        message: String,
    },

    /// Remote answered with a non-success status
    #[error("{method} {uri} returned HTTP {status}: {body}")]
    Status {
        /// HTTP method of the failed call
        method: &'static str,
        /// Target of the failed call
        uri: String,
        /// Status code returned
        status: u16,
        /// Response body, usually an `exc:exception` document
        body: String,
    },

    /// Response body (or request body) is not usable XML
    #[error("document for {uri} is not valid xml: {source}")]
    Document {
        /// Uri the document came from or was sent to
        uri: String,
        /// Parser or writer failure
        #[source]
        source: XmlError,
    },

    /// Transport could not be built from its configuration
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl TransportError {
    /// Create status error
    pub fn status(
        method: &'static str,
        uri: impl Into<String>,
        status: u16,
        body: impl Into<String>,
    ) -> Self {
        Self::Status {
            method,
            uri: uri.into(),
            status,
            body: body.into(),
        }
    }

    /// HTTP status, when the remote answered
    #[inline]
    #[must_use]
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the remote reported the resource as missing
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.http_status() == Some(404)
    }
}

/// Configuration loading / validation errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("io error reading {path}: {source}")]
    Io {
        /// Config file path
        path: PathBuf,
        /// Read failure
        #[source]
        source: std::io::Error,
    },

    /// TOML did not deserialize
    #[error("invalid config toml: {0}")]
    Toml(#[from] toml::de::Error),

    /// Values are present but unusable
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Result type alias for transport operations
pub type TransportResult<T> = Result<T, TransportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_names_resource() {
        let err = TransportError::status(
            "POST",
            "http://lims/api/v2/artifacts/batch/update",
            400,
            "bad udf",
        );
        assert_eq!(
            err.to_string(),
            "POST http://lims/api/v2/artifacts/batch/update returned HTTP 400: bad udf"
        );
        assert_eq!(err.http_status(), Some(400));
        assert!(!err.is_not_found());
    }

    #[test]
    fn config_error_converts() {
        let err: TransportError = ConfigError::Invalid("batch_size must be positive".into()).into();
        assert!(matches!(err, TransportError::Config(_)));
    }

    #[test]
    fn request_error_has_no_status() {
        let err = TransportError::Request {
            method: "GET",
            uri: "http://lims/api/v2/steps/24-1".to_string(),
            message: "connection refused".to_string(),
        };
        assert_eq!(err.to_string(), "GET http://lims/api/v2/steps/24-1 failed: connection refused");
        assert_eq!(err.http_status(), None);
    }
}
