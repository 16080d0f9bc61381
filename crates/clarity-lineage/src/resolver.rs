//! Batch resolution of identifiers into records
//!
//! Every multi-record read in the engine goes through [`BatchResolver`] so
//! that one logical fetch costs as few round trips as the transport allows.

use crate::error::Result;
use clarity_model::{EntityCatalog, Uri};
use clarity_transport::Transport;
use clarity_xml::XmlElement;
use std::collections::{BTreeMap, BTreeSet};

/// Raw records keyed by canonical identity
pub type RecordMap = BTreeMap<Uri, XmlElement>;

/// Normalizes, dedupes and batch-fetches identifiers
#[derive(Debug)]
pub struct BatchResolver<'a, T: Transport + ?Sized> {
    transport: &'a T,
}

impl<'a, T: Transport + ?Sized> BatchResolver<'a, T> {
    /// Create resolver over a transport
    #[inline]
    #[must_use]
    pub fn new(transport: &'a T) -> Self {
        Self { transport }
    }

    /// Fetch every distinct identifier in one logical batch
    ///
    /// Identifiers that do not resolve are simply absent from the map. An
    /// empty set performs no round trip.
    ///
    /// # Errors
    /// Transport errors propagate unmodified.
    pub async fn resolve<I, U>(&self, identifiers: I) -> Result<RecordMap>
    where
        I: IntoIterator<Item = U>,
        U: Into<Uri>,
    {
        let unique: BTreeSet<Uri> = identifiers.into_iter().map(Into::into).collect();
        if unique.is_empty() {
            return Ok(RecordMap::new());
        }
        let uris: Vec<Uri> = unique.into_iter().collect();
        tracing::debug!("batch resolving {} records", uris.len());

        let combined = self.transport.batch_get(&uris).await?;
        Ok(index_records(combined))
    }

    /// Resolve and hydrate artifacts into `catalog`
    ///
    /// # Errors
    /// Fails on transport errors or a record that does not hydrate.
    pub async fn resolve_artifacts<I, U>(
        &self,
        catalog: &mut EntityCatalog,
        uris: I,
    ) -> Result<usize>
    where
        I: IntoIterator<Item = U>,
        U: Into<Uri>,
    {
        let records = self.resolve(uris).await?;
        Ok(catalog.load_artifacts(records.values())?)
    }

    /// Resolve and hydrate samples into `catalog`
    ///
    /// # Errors
    /// Fails on transport errors or a record that does not hydrate.
    pub async fn resolve_samples<I, U>(&self, catalog: &mut EntityCatalog, uris: I) -> Result<usize>
    where
        I: IntoIterator<Item = U>,
        U: Into<Uri>,
    {
        let records = self.resolve(uris).await?;
        Ok(catalog.load_samples(records.values())?)
    }

    /// Fetch the containers referenced by hydrated artifacts and attach them
    ///
    /// Only containers actually referenced are requested.
    ///
    /// # Errors
    /// Fails on transport errors or a record that does not hydrate.
    pub async fn resolve_containers(&self, catalog: &mut EntityCatalog) -> Result<usize> {
        let records = self.resolve(catalog.referenced_containers()).await?;
        catalog.load_containers(records.values())?;
        Ok(catalog.attach_containers())
    }

    /// Fetch the projects referenced by hydrated samples and attach their names
    ///
    /// # Errors
    /// Fails on transport errors or a record that does not hydrate.
    pub async fn resolve_projects(&self, catalog: &mut EntityCatalog) -> Result<usize> {
        let records = self.resolve(catalog.referenced_projects()).await?;
        catalog.load_projects(records.values())?;
        Ok(catalog.attach_project_names())
    }
}

/// Index every record of a combined response carrying a `uri`
///
/// A bare record (not wrapped in a details root) is indexed itself.
fn index_records(combined: XmlElement) -> RecordMap {
    if let Some(uri) = combined.attr("uri").map(Uri::new) {
        return RecordMap::from([(uri, combined)]);
    }
    combined
        .children()
        .filter_map(|record| {
            let uri = record.attr("uri")?;
            Some((Uri::new(uri), record.clone()))
        })
        .collect()
}
