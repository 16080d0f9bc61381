//! Input → output relations of one step
//!
//! [`IoMap`] reads the `input-output-map` elements of a step-details or
//! process document. Outputs generated `PerInput` belong to exactly one
//! input; every other kind is shared across the step and is reported
//! separately, never attached to a single input.

use crate::error::{ClarityError, Result};
use crate::resolver::BatchResolver;
use clarity_model::{
    AncestorRef, Artifact, ArtifactKey, EntityCatalog, EntityError, GenerationKind, IoMapEntry,
    Stream, Uri,
};
use clarity_transport::Transport;
use clarity_xml::XmlElement;
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

/// Whether hydrated artifacts get their container's name and type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContainerInfo {
    /// Leave container name/type empty
    #[default]
    Omit,
    /// One extra batch fetch of the referenced containers
    Attach,
}

/// Output side of a relation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IoOutput {
    pub uri: Uri,
    pub output_type: String,
    pub generation: GenerationKind,
}

/// One `input-output-map` element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IoRelation {
    pub input: Uri,
    pub output: Option<IoOutput>,
}

/// An input artifact with the outputs generated for it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactGroup {
    pub input: Artifact,
    pub outputs: Vec<Artifact>,
}

/// Hydrated input → outputs map keyed by structural identity
pub type ArtifactMap = IndexMap<ArtifactKey, ArtifactGroup>;

/// Input → output relation for one step
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IoMap {
    relations: Vec<IoRelation>,
}

impl IoMap {
    /// Read every relation of a step-details or process document
    ///
    /// The output type is taken from `output-type`, falling back to `type`.
    ///
    /// # Errors
    /// Returns [`EntityError`] when an input or output has no `uri`.
    pub fn from_step_document(document: &XmlElement) -> Result<Self> {
        let owner = document.attr("uri").unwrap_or(document.name());
        let mut relations = Vec::new();

        for map in document.find_all("input-output-map") {
            let input = map
                .child("input")
                .and_then(|i| i.attr("uri"))
                .map(Uri::new)
                .ok_or_else(|| EntityError::missing_element("input-output-map", "input", owner))?;

            let output = match map.child("output") {
                Some(out) => {
                    let uri = out.attr("uri").map(Uri::new).ok_or_else(|| {
                        EntityError::missing_attribute("input-output-map", "uri", owner)
                    })?;
                    let output_type = out
                        .attr("output-type")
                        .or_else(|| out.attr("type"))
                        .unwrap_or_default()
                        .to_string();
                    let generation = out
                        .attr("output-generation-type")
                        .map_or(GenerationKind::PerAllInputs, GenerationKind::from_attr);
                    Some(IoOutput {
                        uri,
                        output_type,
                        generation,
                    })
                }
                None => None,
            };
            relations.push(IoRelation { input, output });
        }

        tracing::debug!("read {} relations from {}", relations.len(), owner);
        Ok(Self { relations })
    }

    /// Raw relations in document order
    #[inline]
    #[must_use]
    pub fn relations(&self) -> &[IoRelation] {
        &self.relations
    }

    /// One entry per relation that has an output
    #[must_use]
    pub fn entries(&self) -> Vec<IoMapEntry> {
        self.relations
            .iter()
            .filter_map(|r| {
                let out = r.output.as_ref()?;
                Some(IoMapEntry {
                    input: r.input.clone(),
                    output: out.uri.clone(),
                    output_type: out.output_type.clone(),
                    generation: out.generation,
                })
            })
            .collect()
    }

    /// Entries whose output belongs to exactly one input
    #[must_use]
    pub fn per_input(&self) -> Vec<IoMapEntry> {
        self.entries()
            .into_iter()
            .filter(|e| e.generation == GenerationKind::PerInput)
            .collect()
    }

    /// Step-wide outputs, deduplicated, in first-seen order
    #[must_use]
    pub fn shared(&self) -> Vec<AncestorRef> {
        let mut seen = IndexSet::new();
        self.relations
            .iter()
            .filter_map(|r| r.output.as_ref())
            .filter(|out| out.generation.is_shared() && seen.insert(out.uri.clone()))
            .map(|out| AncestorRef::new(out.uri.clone(), out.output_type.as_str(), out.generation))
            .collect()
    }

    /// Distinct artifacts on one side of the step
    ///
    /// Inputs are every input; outputs are `PerInput` outputs only.
    #[must_use]
    pub fn stream_uris(&self, stream: Stream) -> Vec<Uri> {
        let uris: IndexSet<Uri> = match stream {
            Stream::Input => self.relations.iter().map(|r| r.input.clone()).collect(),
            Stream::Output => self.per_input().into_iter().map(|e| e.output).collect(),
        };
        uris.into_iter().collect()
    }

    /// Distinct artifacts on one side, shared outputs included
    #[must_use]
    pub fn all_uris(&self, stream: Stream) -> Vec<Uri> {
        let uris: IndexSet<Uri> = match stream {
            Stream::Input => self.relations.iter().map(|r| r.input.clone()).collect(),
            Stream::Output => self
                .relations
                .iter()
                .filter_map(|r| r.output.as_ref().map(|o| o.uri.clone()))
                .collect(),
        };
        uris.into_iter().collect()
    }

    /// Input uri → its `PerInput` output uris
    #[must_use]
    pub fn uri_map(&self) -> IndexMap<Uri, Vec<Uri>> {
        let mut map: IndexMap<Uri, Vec<Uri>> = IndexMap::new();
        for entry in self.per_input() {
            map.entry(entry.input).or_default().push(entry.output);
        }
        map
    }

    /// Hydrate both sides and group outputs under their input
    ///
    /// Inputs and outputs are fetched concurrently. Only `PerInput`
    /// relations take part.
    ///
    /// # Errors
    /// Fails on transport errors, records that do not hydrate, or a relation
    /// whose artifact was not returned.
    pub async fn artifact_map<T>(
        &self,
        transport: &T,
        containers: ContainerInfo,
    ) -> Result<ArtifactMap>
    where
        T: Transport + ?Sized,
    {
        let per_input = self.per_input();
        let catalog = hydrate(
            transport,
            self.stream_uris(Stream::Input),
            self.stream_uris(Stream::Output),
            containers,
        )
        .await?;

        let mut map = ArtifactMap::new();
        for entry in per_input {
            let input = lookup(&catalog, &entry.input)?;
            let output = lookup(&catalog, &entry.output)?;
            map.entry(input.key())
                .or_insert_with(|| ArtifactGroup {
                    input: input.clone(),
                    outputs: Vec::new(),
                })
                .outputs
                .push(output.clone());
        }
        Ok(map)
    }
}

fn lookup<'c>(catalog: &'c EntityCatalog, uri: &Uri) -> Result<&'c Artifact> {
    catalog
        .artifact(uri)
        .ok_or_else(|| ClarityError::missing_record(uri.clone()))
}

/// Hydrate two artifact sets concurrently into one catalog
pub(crate) async fn hydrate<T>(
    transport: &T,
    first: Vec<Uri>,
    second: Vec<Uri>,
    containers: ContainerInfo,
) -> Result<EntityCatalog>
where
    T: Transport + ?Sized,
{
    let resolver = BatchResolver::new(transport);
    let (a, b) = futures::try_join!(resolver.resolve(first), resolver.resolve(second))?;

    let mut catalog = EntityCatalog::new();
    catalog.load_artifacts(a.values().chain(b.values()))?;
    if containers == ContainerInfo::Attach {
        let enriched = resolver.resolve_containers(&mut catalog).await?;
        tracing::debug!("attached container info to {} artifacts", enriched);
    }
    Ok(catalog)
}

/// Take hydrated artifacts in order, failing on any that are missing
pub(crate) fn ordered(catalog: &EntityCatalog, uris: &[Uri]) -> Result<Vec<Artifact>> {
    uris.iter().map(|u| lookup(catalog, u).cloned()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clarity_xml::parse;
    use pretty_assertions::assert_eq;

    const DETAILS: &str = r#"
<stp:details xmlns:stp="http://genologics.com/ri/step" uri="http://lims/api/v2/steps/24-1/details">
  <configuration uri="http://lims/api/v2/configuration/protocols/1/steps/2">Library Prep</configuration>
  <input-output-maps>
    <input-output-map>
      <input uri="http://lims/api/v2/artifacts/A1?state=1" limsid="A1"/>
      <output uri="http://lims/api/v2/artifacts/O1?state=2" limsid="O1" output-type="Analyte" output-generation-type="PerInput"/>
    </input-output-map>
    <input-output-map>
      <input uri="http://lims/api/v2/artifacts/A1?state=1" limsid="A1"/>
      <output uri="http://lims/api/v2/artifacts/R?state=2" limsid="R" output-type="ResultFile" output-generation-type="PerAllInputs"/>
    </input-output-map>
    <input-output-map>
      <input uri="http://lims/api/v2/artifacts/A2?state=1" limsid="A2"/>
      <output uri="http://lims/api/v2/artifacts/O2?state=2" limsid="O2" output-type="Analyte" output-generation-type="PerInput"/>
    </input-output-map>
    <input-output-map>
      <input uri="http://lims/api/v2/artifacts/A2?state=1" limsid="A2"/>
      <output uri="http://lims/api/v2/artifacts/R?state=2" limsid="R" output-type="ResultFile" output-generation-type="PerAllInputs"/>
    </input-output-map>
    <input-output-map>
      <input uri="http://lims/api/v2/artifacts/A3?state=1" limsid="A3"/>
    </input-output-map>
  </input-output-maps>
</stp:details>"#;

    fn uri(limsid: &str) -> Uri {
        Uri::new(format!("http://lims/api/v2/artifacts/{limsid}"))
    }

    #[test]
    fn splits_per_input_and_shared() {
        let map = IoMap::from_step_document(&parse(DETAILS).unwrap()).unwrap();
        assert_eq!(map.relations().len(), 5);
        assert_eq!(map.entries().len(), 4);
        assert_eq!(map.per_input().len(), 2);

        let shared = map.shared();
        assert_eq!(shared.len(), 1);
        assert_eq!(shared[0].uri, uri("R"));
        assert_eq!(shared[0].art_type, "ResultFile");
    }

    #[test]
    fn stream_listing() {
        let map = IoMap::from_step_document(&parse(DETAILS).unwrap()).unwrap();
        assert_eq!(map.stream_uris(Stream::Input), vec![uri("A1"), uri("A2"), uri("A3")]);
        assert_eq!(map.stream_uris(Stream::Output), vec![uri("O1"), uri("O2")]);
        assert_eq!(map.all_uris(Stream::Output), vec![uri("O1"), uri("R"), uri("O2")]);
    }

    #[test]
    fn uri_map_skips_shared_outputs() {
        let map = IoMap::from_step_document(&parse(DETAILS).unwrap()).unwrap();
        let uris = map.uri_map();
        assert_eq!(uris.len(), 2);
        assert_eq!(uris[&uri("A1")], vec![uri("O1")]);
        assert_eq!(uris[&uri("A2")], vec![uri("O2")]);
    }

    #[test]
    fn process_documents_use_type_attribute() {
        let doc = parse(
            r#"<prc:process uri="p/1"><type>Pooling</type>
                 <input-output-map><input uri="a/1"/><output uri="a/9" type="Analyte" output-generation-type="PerInput"/></input-output-map>
               </prc:process>"#,
        )
        .unwrap();
        let entries = IoMap::from_step_document(&doc).unwrap().entries();
        assert_eq!(entries[0].output_type, "Analyte");
    }

    #[test]
    fn output_without_uri_is_rejected() {
        let doc = parse(
            r#"<prc:process uri="p/1"><input-output-map><input uri="a/1"/><output/></input-output-map></prc:process>"#,
        )
        .unwrap();
        assert!(IoMap::from_step_document(&doc).is_err());
    }
}
