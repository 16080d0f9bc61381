//! Canonical resource identity
//!
//! Clarity hands out artifact links with state suffixes
//! (`.../artifacts/2-1?state=42`). Every one of them names the same
//! artifact, so [`Uri`] strips the query on construction and all identity
//! comparisons in the workspace go through it.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// A normalized Clarity resource URI (query suffix removed)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Uri(String);

impl Uri {
    /// Normalize a raw link
    #[must_use]
    pub fn new(raw: impl AsRef<str>) -> Self {
        let raw = raw.as_ref().trim();
        let base = raw.split_once('?').map_or(raw, |(base, _)| base);
        Self(base.to_string())
    }

    /// The normalized text
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last path segment (`2-1` for `.../artifacts/2-1`)
    #[must_use]
    pub fn limsid(&self) -> &str {
        self.0
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default()
    }

    /// Resource collection directly below the API root
    ///
    /// `http://host/api/v2/artifacts/2-1` → `artifacts`. Returns `None` for
    /// links that do not contain a `v2/` segment.
    #[must_use]
    pub fn collection(&self) -> Option<&str> {
        let (_, rest) = self.0.split_once("/v2/")?;
        rest.split('/').next().filter(|s| !s.is_empty())
    }
}

impl Display for Uri {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Uri {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Uri {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for Uri {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

impl From<&String> for Uri {
    fn from(raw: &String) -> Self {
        Self::new(raw)
    }
}

impl From<Uri> for String {
    fn from(uri: Uri) -> Self {
        uri.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn strips_state_suffix() {
        let a = Uri::new("http://lims/api/v2/artifacts/2-1?state=42");
        let b = Uri::new("http://lims/api/v2/artifacts/2-1");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "http://lims/api/v2/artifacts/2-1");
    }

    #[test]
    fn limsid_and_collection() {
        let uri = Uri::new("http://lims/api/v2/processes/24-100/");
        assert_eq!(uri.limsid(), "24-100");
        assert_eq!(uri.collection(), Some("processes"));
        assert_eq!(Uri::new("relative/2-1").collection(), None);
    }

    #[test]
    fn serde_normalizes() {
        let uri: Uri = serde_json::from_str("\"a/2-1?state=9\"").unwrap();
        assert_eq!(uri, Uri::new("a/2-1"));
        assert_eq!(serde_json::to_string(&uri).unwrap(), "\"a/2-1\"");
    }

    proptest! {
        #[test]
        fn normalization_is_idempotent(base in "[a-z0-9/:.-]{1,30}", state in "[a-z0-9=&]{0,10}") {
            let raw = format!("{base}?{state}");
            let once = Uri::new(&raw);
            let twice = Uri::new(once.as_str());
            prop_assert_eq!(&once, &twice);
            prop_assert!(!once.as_str().contains('?'));
        }
    }
}
