use crate::fixtures::HOST;
use async_trait::async_trait;
use clarity_model::Uri;
use clarity_transport::{Transport, TransportError, TransportResult};
use clarity_xml::XmlElement;
use parking_lot::Mutex;
use std::collections::HashMap;

/// A body the fake received
#[derive(Debug, Clone)]
pub struct RecordedPost {
    pub uri: String,
    pub body: XmlElement,
}

/// In-memory LIMS
///
/// Serves inserted records by normalized uri and records every call so
/// tests can assert on round trips.
#[derive(Debug)]
pub struct FakeTransport {
    host: String,
    records: Mutex<HashMap<Uri, XmlElement>>,
    gets: Mutex<Vec<String>>,
    batches: Mutex<Vec<Vec<Uri>>>,
    posts: Mutex<Vec<RecordedPost>>,
    post_failure: Mutex<Option<(u16, String)>>,
}

impl Default for FakeTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeTransport {
    pub fn new() -> Self {
        Self {
            host: HOST.to_string(),
            records: Mutex::new(HashMap::new()),
            gets: Mutex::new(Vec::new()),
            batches: Mutex::new(Vec::new()),
            posts: Mutex::new(Vec::new()),
            post_failure: Mutex::new(None),
        }
    }

    /// Serve a record at its own `uri` attribute
    pub fn insert(&self, record: XmlElement) {
        let uri = Uri::new(record.attr("uri").unwrap_or_default());
        self.records.lock().insert(uri, record);
    }

    /// Serve a document at an explicit uri (e.g. `{step}/details`)
    pub fn insert_at(&self, uri: &str, document: XmlElement) {
        self.records.lock().insert(Uri::new(uri), document);
    }

    pub fn insert_all(&self, records: impl IntoIterator<Item = XmlElement>) {
        for record in records {
            self.insert(record);
        }
    }

    /// Make every following post fail with this status
    pub fn fail_posts_with(&self, status: u16, body: &str) {
        *self.post_failure.lock() = Some((status, body.to_string()));
    }

    pub fn gets(&self) -> Vec<String> {
        self.gets.lock().clone()
    }

    pub fn batches(&self) -> Vec<Vec<Uri>> {
        self.batches.lock().clone()
    }

    pub fn posts(&self) -> Vec<RecordedPost> {
        self.posts.lock().clone()
    }

    /// Total number of round trips of any kind
    pub fn round_trips(&self) -> usize {
        self.gets.lock().len() + self.batches.lock().len() + self.posts.lock().len()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    fn host(&self) -> &str {
        &self.host
    }

    async fn get(&self, uri: &str, _params: &[(&str, &str)]) -> TransportResult<XmlElement> {
        self.gets.lock().push(uri.to_string());
        self.records
            .lock()
            .get(&Uri::new(uri))
            .cloned()
            .ok_or_else(|| TransportError::status("GET", uri, 404, "not found"))
    }

    async fn batch_get(&self, uris: &[Uri]) -> TransportResult<XmlElement> {
        self.batches.lock().push(uris.to_vec());
        let records = self.records.lock();
        let combined = uris
            .iter()
            .filter_map(|uri| records.get(uri))
            .fold(XmlElement::new("ri:details"), |doc, record| {
                doc.with_child(record.clone())
            });
        Ok(combined)
    }

    async fn post(&self, uri: &str, body: &XmlElement) -> TransportResult<XmlElement> {
        self.posts.lock().push(RecordedPost {
            uri: uri.to_string(),
            body: body.clone(),
        });
        if let Some((status, message)) = self.post_failure.lock().clone() {
            return Err(TransportError::status("POST", uri, status, message));
        }
        Ok(body.clone())
    }
}
