//! Backward lineage resolution
//!
//! Starting from a step document, [`LineageResolver`] follows the shared
//! parent process of the step's inputs until it reaches a step with the
//! requested name, then maps each originating artifact to the artifacts its
//! sample had at that step.
//!
//! # Traversal
//!
//! Each level costs one batch fetch of the current inputs and one GET of the
//! parent process. Inputs that disagree on their parent fail the call rather
//! than picking a branch, and the walk is bounded by
//! [`LineageResolver::max_depth`].

use crate::error::{CallError, ClarityError, ConsistencyError, Result};
use crate::io_map::IoMap;
use crate::resolver::BatchResolver;
use clarity_model::{AncestorRef, Artifact, EntityCatalog, GenerationKind, IoMapEntry, Stream, Uri};
use clarity_transport::Transport;
use clarity_xml::XmlElement;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Default bound on parent-process hops
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Output type whose per-input records carry no sample back-link
const RESULT_FILE: &str = "ResultFile";

/// Ancestors found at the target step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineageResult {
    /// Originating artifact → its sample's artifacts at the target step
    pub ancestors: BTreeMap<Uri, Vec<AncestorRef>>,
    /// Step-wide outputs of the target step
    pub shared: Vec<AncestorRef>,
    /// Name of the matched step
    pub match_step: String,
    /// Uri of the matched step or process document
    pub match_uri: Option<Uri>,
    /// Parent-process hops taken to reach the match
    pub levels_walked: usize,
}

impl LineageResult {
    /// Ancestors of one originating artifact
    #[must_use]
    pub fn ancestors_of(&self, artifact: &Uri) -> Option<&[AncestorRef]> {
        self.ancestors.get(artifact).map(Vec::as_slice)
    }
}

/// Step name of a step-details or process document
///
/// Step details name their configuration; process documents name their type.
#[must_use]
pub fn step_name(document: &XmlElement) -> String {
    document
        .child("configuration")
        .or_else(|| document.child("type"))
        .map(XmlElement::trimmed_text)
        .unwrap_or_default()
}

/// Walks step history backward to a named step
#[derive(Debug)]
pub struct LineageResolver<'a, T: Transport + ?Sized> {
    transport: &'a T,
    max_depth: usize,
}

impl<'a, T: Transport + ?Sized> LineageResolver<'a, T> {
    /// Create resolver with the default depth bound
    #[inline]
    #[must_use]
    pub fn new(transport: &'a T) -> Self {
        Self {
            transport,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// With depth bound (builder)
    #[inline]
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Current depth bound
    #[inline]
    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Resolve ancestors of `artifact_to_sample` at `target_step`
    ///
    /// `stream` selects which side of the target step is reported. Every
    /// originating artifact appears in the result, or the call fails.
    ///
    /// # Errors
    /// - [`CallError::EmptyTargetStep`] for a blank step name
    /// - [`ConsistencyError`] when the history cannot reach the target
    /// - [`CallError::ArtifactMisaligned`] for an artifact whose sample has
    ///   nothing at the target step
    pub async fn resolve(
        &self,
        target_step: &str,
        stream: Stream,
        artifact_to_sample: &BTreeMap<Uri, Uri>,
        start: &XmlElement,
    ) -> Result<LineageResult> {
        let target = target_step.trim();
        if target.is_empty() {
            return Err(CallError::EmptyTargetStep.into());
        }

        let (document, levels_walked) = self.walk_to(target, start).await?;
        tracing::info!("matched step '{}' after {} levels", target, levels_walked);

        let io = IoMap::from_step_document(&document)?;
        let by_sample = self.index_by_sample(&io, stream).await?;

        let mut ancestors = BTreeMap::new();
        for (artifact, sample) in artifact_to_sample {
            let found = by_sample
                .get(sample)
                .ok_or_else(|| ClarityError::misaligned(artifact.clone()))?;
            ancestors.insert(artifact.clone(), found.clone());
        }

        Ok(LineageResult {
            ancestors,
            shared: io.shared(),
            match_step: target.to_string(),
            match_uri: document.attr("uri").map(Uri::new),
            levels_walked,
        })
    }

    async fn walk_to(&self, target: &str, start: &XmlElement) -> Result<(XmlElement, usize)> {
        let mut current = start.clone();
        let mut levels = 0;
        loop {
            let name = step_name(&current);
            if name == target {
                return Ok((current, levels));
            }
            if levels >= self.max_depth {
                tracing::warn!("lineage walk stopped at '{}' after {} levels", name, levels);
                return Err(ConsistencyError::DepthExceeded {
                    step: name,
                    max_depth: self.max_depth,
                }
                .into());
            }

            let parent = self.parent_process(&current, &name).await?;
            tracing::debug!("step '{}' came from {}", name, parent);
            current = self.transport.get(parent.as_str(), &[]).await?;
            levels += 1;
        }
    }

    /// The single process every input of `document` came from
    async fn parent_process(&self, document: &XmlElement, name: &str) -> Result<Uri> {
        let exhausted = || -> ClarityError {
            ConsistencyError::HistoryExhausted {
                earliest_step: name.to_string(),
            }
            .into()
        };

        let inputs = IoMap::from_step_document(document)?.stream_uris(Stream::Input);
        let records = BatchResolver::new(self.transport)
            .resolve(inputs.iter().cloned())
            .await?;

        let mut parents = BTreeSet::new();
        for uri in &inputs {
            let record = records.get(uri).ok_or_else(exhausted)?;
            match Artifact::from_xml(record)?.parent_process {
                Some(parent) => {
                    parents.insert(parent);
                }
                None => {
                    tracing::warn!("artifact {} at '{}' has no parent process", uri, name);
                    return Err(exhausted());
                }
            }
        }

        if parents.len() > 1 {
            tracing::warn!("step '{}' has {} parent processes", name, parents.len());
            return Err(ConsistencyError::DivergentHistory {
                step: name.to_string(),
                parents: parents.into_iter().collect(),
            }
            .into());
        }
        parents.into_iter().next().ok_or_else(exhausted)
    }

    /// Sample → artifacts on the `stream` side of the matched step
    async fn index_by_sample(
        &self,
        io: &IoMap,
        stream: Stream,
    ) -> Result<BTreeMap<Uri, Vec<AncestorRef>>> {
        let relevant: Vec<IoMapEntry> = io
            .entries()
            .into_iter()
            .filter(|e| !(e.generation == GenerationKind::PerInput && e.output_type == RESULT_FILE))
            .filter(|e| stream == Stream::Input || !e.generation.is_shared())
            .collect();
        let side = |entry: &IoMapEntry| match stream {
            Stream::Input => entry.input.clone(),
            Stream::Output => entry.output.clone(),
        };

        let records = BatchResolver::new(self.transport)
            .resolve(relevant.iter().map(side))
            .await?;
        let mut catalog = EntityCatalog::new();
        catalog.load_artifacts(records.values())?;

        let mut by_sample: BTreeMap<Uri, Vec<AncestorRef>> = BTreeMap::new();
        for entry in &relevant {
            let uri = side(entry);
            let artifact = catalog
                .artifact(&uri)
                .ok_or_else(|| ClarityError::missing_record(uri.clone()))?;
            let Some(sample) = artifact.sample.clone() else {
                tracing::debug!("{} has no sample back-link", artifact.uri);
                continue;
            };
            let reference = AncestorRef::new(
                artifact.uri.clone(),
                artifact.art_type.as_str(),
                entry.generation,
            );
            let list = by_sample.entry(sample).or_default();
            if !list.iter().any(|r| r.uri == reference.uri) {
                list.push(reference);
            }
        }
        Ok(by_sample)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_name_prefers_configuration() {
        let details = XmlElement::new("stp:details")
            .with_child(XmlElement::new("configuration").with_text(" Library Prep "));
        assert_eq!(step_name(&details), "Library Prep");

        let process =
            XmlElement::new("prc:process").with_child(XmlElement::new("type").with_text("Pooling"));
        assert_eq!(step_name(&process), "Pooling");

        assert_eq!(step_name(&XmlElement::new("prc:process")), "");
    }
}
