//! Entry points
//!
//! [`ClarityTools`] answers cross-entity questions about samples and
//! artifacts. [`StepTools`] is bound to one running step and is what
//! step-runner scripts use.

use crate::error::{CallError, Result};
use crate::io_map::{hydrate, ordered, ArtifactMap, ContainerInfo, IoMap};
use crate::lineage::{LineageResolver, LineageResult, DEFAULT_MAX_DEPTH};
use crate::resolver::BatchResolver;
use crate::template::{TemplateRenderer, XmlTemplates};
use crate::update::{FieldsByLimsid, UdfUpdateBuilder};
use clarity_model::{Artifact, EntityCatalog, Process, Sample, Stream, Uri};
use clarity_transport::{api_root, Transport};
use clarity_xml::XmlElement;
use indexmap::{IndexMap, IndexSet};
use std::collections::BTreeMap;
use std::fmt;

fn distinct<I, U>(uris: I) -> Vec<Uri>
where
    I: IntoIterator<Item = U>,
    U: Into<Uri>,
{
    uris.into_iter()
        .map(Into::into)
        .collect::<IndexSet<Uri>>()
        .into_iter()
        .collect()
}

/// Sample and artifact queries
#[derive(Debug, Clone)]
pub struct ClarityTools<T> {
    transport: T,
}

impl<T: Transport> ClarityTools<T> {
    /// Create tools over a transport
    #[inline]
    #[must_use]
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    #[inline]
    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Hydrate samples in request order, optionally with project names
    ///
    /// Unknown samples are left out. Control samples never get a project.
    ///
    /// # Errors
    /// Fails on transport errors or records that do not hydrate.
    pub async fn get_samples<I, U>(&self, uris: I, with_projects: bool) -> Result<Vec<Sample>>
    where
        I: IntoIterator<Item = U>,
        U: Into<Uri>,
    {
        let order = distinct(uris);
        let resolver = BatchResolver::new(&self.transport);
        let mut catalog = EntityCatalog::new();
        let loaded = resolver.resolve_samples(&mut catalog, order.iter().cloned()).await?;
        tracing::info!("loaded {} of {} samples", loaded, order.len());

        if with_projects {
            resolver.resolve_projects(&mut catalog).await?;
        }
        Ok(order.iter().filter_map(|u| catalog.sample(u).cloned()).collect())
    }

    /// Hydrate artifacts in request order
    ///
    /// # Errors
    /// Fails on transport errors or records that do not hydrate.
    pub async fn get_artifacts<I, U>(
        &self,
        uris: I,
        containers: ContainerInfo,
    ) -> Result<Vec<Artifact>>
    where
        I: IntoIterator<Item = U>,
        U: Into<Uri>,
    {
        let order = distinct(uris);
        let catalog = hydrate(&self.transport, order.clone(), Vec::new(), containers).await?;
        Ok(catalog.artifacts_in_order(&order))
    }

    /// Sample uri → its zeroth artifact
    ///
    /// # Errors
    /// Fails on transport errors or records that do not hydrate.
    pub async fn zeroth_artifacts<I, U>(&self, sample_uris: I) -> Result<IndexMap<Uri, Uri>>
    where
        I: IntoIterator<Item = U>,
        U: Into<Uri>,
    {
        let samples = self.get_samples(sample_uris, false).await?;
        Ok(samples.into_iter().map(|s| (s.uri, s.artifact)).collect())
    }
}

/// Tools bound to one step
pub struct StepTools<T> {
    transport: T,
    host: String,
    step_uri: Uri,
    details: XmlElement,
    io: IoMap,
    renderer: Box<dyn TemplateRenderer>,
    max_depth: usize,
}

impl<T> fmt::Debug for StepTools<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepTools")
            .field("host", &self.host)
            .field("step_uri", &self.step_uri)
            .field("relations", &self.io.relations().len())
            .field("max_depth", &self.max_depth)
            .finish_non_exhaustive()
    }
}

impl<T: Transport> StepTools<T> {
    /// Load `{step_uri}/details`
    ///
    /// The API root is the step uri truncated after `v2/`.
    ///
    /// # Errors
    /// - [`CallError::InvalidStepUri`] when the uri has no API root
    /// - transport or document errors from loading the step details
    pub async fn new(transport: T, step_uri: &str) -> Result<Self> {
        let step = Uri::new(step_uri);
        let host = api_root(step.as_str())
            .ok_or_else(|| CallError::InvalidStepUri(step_uri.to_string()))?;
        if step.limsid().is_empty() {
            return Err(CallError::InvalidStepUri(step_uri.to_string()).into());
        }

        let details = transport.get(&format!("{step}/details"), &[]).await?;
        let io = IoMap::from_step_document(&details)?;
        tracing::info!("loaded step {} with {} relations", step, io.relations().len());

        Ok(Self {
            transport,
            host,
            step_uri: step,
            details,
            io,
            renderer: Box::new(XmlTemplates),
            max_depth: DEFAULT_MAX_DEPTH,
        })
    }

    /// With payload renderer (builder)
    #[must_use]
    pub fn with_renderer(mut self, renderer: impl TemplateRenderer + 'static) -> Self {
        self.renderer = Box::new(renderer);
        self
    }

    /// With lineage depth bound (builder)
    #[inline]
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    #[inline]
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[inline]
    #[must_use]
    pub fn step_uri(&self) -> &Uri {
        &self.step_uri
    }

    /// Step details document as loaded
    #[inline]
    #[must_use]
    pub fn details(&self) -> &XmlElement {
        &self.details
    }

    #[inline]
    #[must_use]
    pub fn io_map(&self) -> &IoMap {
        &self.io
    }

    /// Distinct artifacts on one side (outputs: `PerInput` only)
    #[must_use]
    pub fn artifact_uris(&self, stream: Stream) -> Vec<Uri> {
        self.io.stream_uris(stream)
    }

    /// Hydrated artifacts on one side, in step order
    ///
    /// # Errors
    /// Fails on transport errors, records that do not hydrate, or an
    /// artifact the LIMS did not return.
    pub async fn artifacts(
        &self,
        stream: Stream,
        containers: ContainerInfo,
    ) -> Result<Vec<Artifact>> {
        let uris = self.artifact_uris(stream);
        if uris.is_empty() {
            return Ok(Vec::new());
        }
        let catalog = hydrate(&self.transport, uris.clone(), Vec::new(), containers).await?;
        ordered(&catalog, &uris)
    }

    /// Input uri → `PerInput` output uris
    #[must_use]
    pub fn artifact_uri_map(&self) -> IndexMap<Uri, Vec<Uri>> {
        self.io.uri_map()
    }

    /// Hydrated input → outputs map
    ///
    /// # Errors
    /// See [`IoMap::artifact_map`].
    pub async fn artifact_map(&self, containers: ContainerInfo) -> Result<ArtifactMap> {
        self.io.artifact_map(&self.transport, containers).await
    }

    /// Process record of this step
    ///
    /// # Errors
    /// Fails when the process cannot be fetched.
    pub async fn process_data(&self) -> Result<Process> {
        let uri = format!("{}processes/{}", self.host, self.step_uri.limsid());
        let document = self.transport.get(&uri, &[]).await?;
        Ok(Process::from_xml(Uri::new(uri), &document))
    }

    /// Write field values onto artifacts of one side in a single post
    ///
    /// Artifacts are matched by limsid; shared outputs are included. Nothing
    /// is posted when no artifact is touched. Returns the number of records
    /// updated.
    ///
    /// # Errors
    /// Fails on transport errors; a rejected post is not retried.
    pub async fn set_artifact_udfs(
        &self,
        stream: Stream,
        fields: &FieldsByLimsid,
    ) -> Result<usize> {
        let records = BatchResolver::new(&self.transport)
            .resolve(self.io.all_uris(stream))
            .await?;

        let mut builder = UdfUpdateBuilder::new();
        let touched = builder.apply_records(records.values(), fields);
        if builder.is_empty() {
            tracing::debug!("no {} artifacts matched the update", stream);
            return Ok(0);
        }

        let payload = builder.render(self.renderer.as_ref())?;
        let endpoint = format!("{}artifacts/batch/update", self.host);
        self.transport.post(&endpoint, &payload).await?;
        tracing::info!("updated fields on {} {} artifacts", touched, stream);
        Ok(touched)
    }

    /// Ancestors of the given artifacts at an earlier step
    ///
    /// # Errors
    /// See [`LineageResolver::resolve`].
    pub async fn artifacts_at_previous_step(
        &self,
        target_step: &str,
        stream: Stream,
        artifact_to_sample: &BTreeMap<Uri, Uri>,
    ) -> Result<LineageResult> {
        LineageResolver::new(&self.transport)
            .with_max_depth(self.max_depth)
            .resolve(target_step, stream, artifact_to_sample, &self.details)
            .await
    }
}
