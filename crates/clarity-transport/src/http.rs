//! reqwest-backed [`Transport`]

use crate::config::ClarityConfig;
use crate::error::{TransportError, TransportResult};
use crate::Transport;
use async_trait::async_trait;
use clarity_model::Uri;
use clarity_xml::{parse, to_document, XmlElement};
use indexmap::IndexMap;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder};
use std::time::Duration;

/// Collections that expose `{collection}/batch/retrieve`
const BATCH_COLLECTIONS: &[&str] = &["artifacts", "samples", "containers", "files"];

/// HTTP client for the Clarity v2 REST API
#[derive(Debug, Clone)]
pub struct HttpTransport {
    config: ClarityConfig,
    client: Client,
}

impl HttpTransport {
    /// Build a client from validated configuration
    ///
    /// # Errors
    /// Returns [`TransportError::Config`] for invalid settings, or
    /// [`TransportError::Request`] if the HTTP client cannot be built.
    pub fn new(config: ClarityConfig) -> TransportResult<Self> {
        config.validate()?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TransportError::Request {
                method: "INIT",
                uri: config.host.clone(),
                message: e.to_string(),
            })?;
        Ok(Self { config, client })
    }

    /// Configuration in use
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ClarityConfig {
        &self.config
    }

    fn absolute(&self, uri: &str) -> String {
        if uri.starts_with("http://") || uri.starts_with("https://") {
            uri.to_string()
        } else {
            format!("{}{}", self.config.host, uri.trim_start_matches('/'))
        }
    }

    async fn send(
        &self,
        request: RequestBuilder,
        method: &'static str,
        uri: &str,
    ) -> TransportResult<XmlElement> {
        let response = request
            .basic_auth(&self.config.username, Some(&self.config.password))
            .send()
            .await
            .map_err(|e| TransportError::Request {
                method,
                uri: uri.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| TransportError::Request {
            method,
            uri: uri.to_string(),
            message: e.to_string(),
        })?;

        if !status.is_success() {
            return Err(TransportError::status(method, uri, status.as_u16(), body));
        }
        parse(&body).map_err(|source| TransportError::Document {
            uri: uri.to_string(),
            source,
        })
    }

    async fn post_document(&self, uri: &str, body: &XmlElement) -> TransportResult<XmlElement> {
        let text = to_document(body).map_err(|source| TransportError::Document {
            uri: uri.to_string(),
            source,
        })?;
        let request = self
            .client
            .post(uri)
            .header(CONTENT_TYPE, "application/xml")
            .body(text);
        self.send(request, "POST", uri).await
    }

    async fn batch_retrieve(
        &self,
        collection: &str,
        links: &[&Uri],
        into: &mut XmlElement,
    ) -> TransportResult<()> {
        let endpoint = format!("{}{}/batch/retrieve", self.config.host, collection);
        for chunk in links.chunks(self.config.batch_size) {
            let body = chunk.iter().fold(
                XmlElement::new("ri:links").with_attr("xmlns:ri", "http://genologics.com/ri"),
                |doc, uri| {
                    doc.with_child(
                        XmlElement::new("link")
                            .with_attr("uri", uri.as_str())
                            .with_attr("rel", collection),
                    )
                },
            );
            tracing::debug!("batch retrieve of {} {} from {}", chunk.len(), collection, endpoint);
            let details = self.post_document(&endpoint, &body).await?;
            for record in details.children() {
                into.push_child(record.clone());
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn host(&self) -> &str {
        &self.config.host
    }

    async fn get(&self, uri: &str, params: &[(&str, &str)]) -> TransportResult<XmlElement> {
        let mut url = self.absolute(uri);
        let mut page = self
            .send(self.client.get(&url).query(params), "GET", &url)
            .await?;

        let mut next = next_page(&page);
        page.remove_children("next-page");
        page.remove_children("previous-page");

        while let Some(next_url) = next {
            url = next_url;
            tracing::debug!("following next-page {}", url);
            let more = self.send(self.client.get(&url), "GET", &url).await?;
            next = next_page(&more);
            for child in more.children().filter(|c| !c.is("next-page") && !c.is("previous-page")) {
                page.push_child(child.clone());
            }
        }
        Ok(page)
    }

    async fn batch_get(&self, uris: &[Uri]) -> TransportResult<XmlElement> {
        let mut by_collection: IndexMap<&str, Vec<&Uri>> = IndexMap::new();
        for uri in uris {
            by_collection
                .entry(uri.collection().unwrap_or_default())
                .or_default()
                .push(uri);
        }

        let mut combined = XmlElement::new("ri:details");
        for (collection, links) in by_collection {
            if BATCH_COLLECTIONS.contains(&collection) {
                self.batch_retrieve(collection, &links, &mut combined).await?;
                continue;
            }
            // No batch endpoint: one GET per link, unknown links skipped.
            for uri in links {
                match self.get(uri.as_str(), &[]).await {
                    Ok(record) => combined.push_child(record),
                    Err(e) if e.is_not_found() => {
                        tracing::debug!("{} not found, skipping", uri);
                    }
                    Err(e) => return Err(e),
                }
            }
        }
        Ok(combined)
    }

    async fn post(&self, uri: &str, body: &XmlElement) -> TransportResult<XmlElement> {
        let url = self.absolute(uri);
        self.post_document(&url, body).await
    }
}

fn next_page(page: &XmlElement) -> Option<String> {
    page.child("next-page")
        .and_then(|n| n.attr("uri"))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport() -> HttpTransport {
        let config = ClarityConfig::new("https://lims.example.org/api/v2/", "u", "p");
        HttpTransport::new(config).unwrap()
    }

    #[test]
    fn relative_links_resolve_against_host() {
        let t = transport();
        assert_eq!(t.absolute("processes/24-1"), "https://lims.example.org/api/v2/processes/24-1");
        assert_eq!(
            t.absolute("https://other/api/v2/samples/S-1"),
            "https://other/api/v2/samples/S-1"
        );
    }

    #[test]
    fn invalid_config_is_rejected() {
        let err = HttpTransport::new(ClarityConfig::new("https://lims/api", "u", "p")).unwrap_err();
        assert!(matches!(err, TransportError::Config(_)));
    }

    #[test]
    fn next_page_link() {
        const NEXT: &str = "https://lims/api/v2/artifacts?start-index=500";
        let page = XmlElement::new("art:artifacts")
            .with_child(XmlElement::new("artifact").with_attr("uri", "a/1"))
            .with_child(XmlElement::new("next-page").with_attr("uri", NEXT));
        assert_eq!(next_page(&page).as_deref(), Some(NEXT));
    }

    #[tokio::test]
    async fn empty_batch_makes_no_request() {
        let doc = transport().batch_get(&[]).await.unwrap();
        assert_eq!(doc.children().count(), 0);
    }
}
