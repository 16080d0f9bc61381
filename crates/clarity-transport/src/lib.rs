//! Clarity transport
//!
//! The lineage engine never talks HTTP itself. It consumes a [`Transport`]:
//! batched reads, single reads with query parameters, and posts. This crate
//! defines that seam and ships [`HttpTransport`], a reqwest-backed client
//! for the Clarity v2 REST API.
//!
//! # Example
//!
//! ```rust,ignore
//! use clarity_transport::{ClarityConfig, HttpTransport, Transport};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClarityConfig::from_file("clarity.toml")?;
//! let transport = HttpTransport::new(config)?;
//! let doc = transport.get(&format!("{}processes/24-1001", transport.host()), &[]).await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod config;
pub mod error;
mod http;

pub use config::{api_root, ClarityConfig};
pub use error::{ConfigError, TransportError, TransportResult};
pub use http::HttpTransport;

use async_trait::async_trait;
use clarity_model::Uri;
use clarity_xml::XmlElement;
use std::sync::Arc;

/// Request/response access to the LIMS
///
/// Implementations own batching, pagination and authentication. They must
/// surface non-success statuses as [`TransportError::Status`] and must not
/// retry posts.
#[async_trait]
pub trait Transport: Send + Sync {
    /// API root, ending in `v2/`
    fn host(&self) -> &str;

    /// Fetch one resource (list resources are merged across pages)
    async fn get(&self, uri: &str, params: &[(&str, &str)]) -> TransportResult<XmlElement>;

    /// Fetch many resources; the returned document's children are the
    /// records that resolved. Unknown links are simply absent.
    async fn batch_get(&self, uris: &[Uri]) -> TransportResult<XmlElement>;

    /// Submit a document
    async fn post(&self, uri: &str, body: &XmlElement) -> TransportResult<XmlElement>;
}

#[async_trait]
impl<T> Transport for Arc<T>
where
    T: Transport + ?Sized,
{
    fn host(&self) -> &str {
        (**self).host()
    }

    async fn get(&self, uri: &str, params: &[(&str, &str)]) -> TransportResult<XmlElement> {
        (**self).get(uri, params).await
    }

    async fn batch_get(&self, uris: &[Uri]) -> TransportResult<XmlElement> {
        (**self).batch_get(uris).await
    }

    async fn post(&self, uri: &str, body: &XmlElement) -> TransportResult<XmlElement> {
        (**self).post(uri, body).await
    }
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
