//! Connection configuration
//!
//! ```toml
//! host = "https://lims.example.org/api/v2/"
//! username = "apiuser"
//! password = "secret"
//! batch_size = 500
//! timeout_secs = 60
//! ```

use crate::error::ConfigError;
use serde::Deserialize;
use std::fmt;
use std::path::Path;

/// Clarity API connection settings
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct ClarityConfig {
    /// API root, ending in `v2/`
    pub host: String,
    /// Basic-auth user
    pub username: String,
    /// Basic-auth password
    pub password: String,
    /// Maximum links per batch retrieve request
    pub batch_size: usize,
    /// HTTP client timeout
    pub timeout_secs: u64,
}

impl ClarityConfig {
    /// Create configuration for a host and credentials
    #[must_use]
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: normalize_host(&host.into()),
            username: username.into(),
            password: password.into(),
            ..Self::default()
        }
    }

    /// With batch size
    #[inline]
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// With client timeout
    #[inline]
    #[must_use]
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Parse from TOML text
    ///
    /// # Errors
    /// Returns [`ConfigError`] on malformed TOML or invalid values.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(text)?;
        config.host = normalize_host(&config.host);
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file
    ///
    /// # Errors
    /// Returns [`ConfigError`] if the file is unreadable or invalid.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Check the values are usable
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] naming the offending setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.host.ends_with("v2/") {
            return Err(ConfigError::Invalid(format!(
                "host '{}' is not a Clarity v2 API root",
                self.host
            )));
        }
        if self.batch_size == 0 {
            return Err(ConfigError::Invalid("batch_size must be positive".to_string()));
        }
        Ok(())
    }
}

impl Default for ClarityConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            username: String::new(),
            password: String::new(),
            batch_size: 500,
            timeout_secs: 60,
        }
    }
}

impl fmt::Debug for ClarityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClarityConfig")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("batch_size", &self.batch_size)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// API root of any Clarity link: everything up to and including `v2/`
///
/// `https://lims/api/v2/steps/24-1` → `https://lims/api/v2/`
#[must_use]
pub fn api_root(uri: &str) -> Option<String> {
    uri.find("v2/").map(|idx| uri[..idx + 3].to_string())
}

fn normalize_host(host: &str) -> String {
    let host = host.trim();
    if host.is_empty() || host.ends_with('/') {
        host.to_string()
    } else {
        format!("{host}/")
    }
}
