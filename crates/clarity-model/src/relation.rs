//! Step relation vocabulary: streams, generation kinds, IO entries

use crate::error::EntityError;
use crate::uri::Uri;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Side of a step's input-output relation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stream {
    Input,
    Output,
}

impl Stream {
    /// Tag name of this side inside an `input-output-map`
    #[inline]
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Output => "output",
        }
    }
}

impl Display for Stream {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Stream {
    type Err = EntityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "input" => Ok(Self::Input),
            "output" => Ok(Self::Output),
            other => Err(EntityError::UnknownStream(other.to_string())),
        }
    }
}

/// Output-generation semantics of a relation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GenerationKind {
    /// One output per input
    PerInput,
    /// One output shared by every input of the step
    PerAllInputs,
}

impl GenerationKind {
    /// Classify an `output-generation-type` attribute
    ///
    /// Only the exact value `PerInput` is per-input; anything else is shared.
    #[inline]
    #[must_use]
    pub fn from_attr(value: &str) -> Self {
        if value == "PerInput" {
            Self::PerInput
        } else {
            Self::PerAllInputs
        }
    }

    /// Attribute value
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PerInput => "PerInput",
            Self::PerAllInputs => "PerAllInputs",
        }
    }

    /// Whether this is the shared kind
    #[inline]
    #[must_use]
    pub const fn is_shared(self) -> bool {
        matches!(self, Self::PerAllInputs)
    }
}

impl Display for GenerationKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One input → output relation of a step
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IoMapEntry {
    pub input: Uri,
    pub output: Uri,
    /// `Analyte`, `ResultFile`, ...
    pub output_type: String,
    pub generation: GenerationKind,
}

/// Lightweight reference to an artifact found at an ancestor step
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AncestorRef {
    pub uri: Uri,
    pub art_type: String,
    pub generation: GenerationKind,
}

impl AncestorRef {
    /// Create ancestor reference
    #[inline]
    #[must_use]
    pub fn new(uri: Uri, art_type: impl Into<String>, generation: GenerationKind) -> Self {
        Self {
            uri,
            art_type: art_type.into(),
            generation,
        }
    }
}
