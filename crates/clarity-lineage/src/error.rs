//! Error types for the lineage engine
//!
//! Failures fall into two families a caller handles differently:
//! - [`CallError`]: the request itself is malformed
//! - [`ConsistencyError`]: the LIMS history cannot answer the request
//!
//! Transport, hydration and document errors pass through unchanged.

use clarity_model::{EntityError, Uri};
use clarity_transport::TransportError;
use clarity_xml::XmlError;

/// Main error type
#[derive(Debug, thiserror::Error)]
pub enum ClarityError {
    /// Malformed call
    #[error("invalid call: {0}")]
    Call(#[from] CallError),

    /// History inconsistent with the request
    #[error("inconsistent history: {0}")]
    Consistency(#[from] ConsistencyError),

    /// Transport failure, propagated unmodified
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Fetched record could not be hydrated
    #[error("invalid record: {0}")]
    Entity(#[from] EntityError),

    /// Malformed document
    #[error("invalid document: {0}")]
    Xml(#[from] XmlError),
}

impl ClarityError {
    /// Create misaligned artifact error
    #[inline]
    pub fn misaligned(artifact: impl Into<Uri>) -> Self {
        Self::Call(CallError::ArtifactMisaligned {
            artifact: artifact.into(),
        })
    }

    /// Create missing record error
    #[inline]
    pub fn missing_record(uri: impl Into<Uri>) -> Self {
        Self::Consistency(ConsistencyError::MissingRecord { uri: uri.into() })
    }

    /// Check if the caller supplied a bad request
    #[inline]
    #[must_use]
    pub fn is_caller_error(&self) -> bool {
        matches!(self, Self::Call(_))
    }

    /// Check if the LIMS history could not satisfy the request
    #[inline]
    #[must_use]
    pub fn is_consistency_error(&self) -> bool {
        matches!(self, Self::Consistency(_))
    }

    /// HTTP status of a remote rejection
    #[inline]
    #[must_use]
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::Transport(e) => e.http_status(),
            _ => None,
        }
    }
}

/// Malformed calls
#[derive(Debug, thiserror::Error)]
pub enum CallError {
    /// Originating artifact's sample has no ancestor at the target step
    #[error("artifact {artifact} is not aligned with any sample at the target step")]
    ArtifactMisaligned { artifact: Uri },

    /// Step uri does not contain an API root
    #[error("step uri '{0}' does not contain an api root ending in 'v2/'")]
    InvalidStepUri(String),

    /// Target step name is blank
    #[error("target step name is empty")]
    EmptyTargetStep,
}

/// History that cannot answer the request
#[derive(Debug, thiserror::Error)]
pub enum ConsistencyError {
    /// Walked to the start of the history without meeting the target
    #[error("target step not found in history; earliest step reached: '{earliest_step}'")]
    HistoryExhausted { earliest_step: String },

    /// Inputs of one step come from different processes
    #[error("step '{step}' has inputs from {} different processes: {}", parents.len(), join(parents))]
    DivergentHistory { step: String, parents: Vec<Uri> },

    /// Traversal bound reached
    #[error("gave up at step '{step}' after {max_depth} levels")]
    DepthExceeded { step: String, max_depth: usize },

    /// Referenced record missing from a batch response
    #[error("record {uri} was not returned by the LIMS")]
    MissingRecord { uri: Uri },
}

fn join(uris: &[Uri]) -> String {
    uris.iter().map(Uri::as_str).collect::<Vec<_>>().join(", ")
}

/// Result type alias
pub type Result<T> = std::result::Result<T, ClarityError>;
