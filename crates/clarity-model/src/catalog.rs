//! Per-call entity catalog
//!
//! [`EntityCatalog`] holds everything hydrated during one entry-point call,
//! keyed by normalized identity. Callers create one, fill it from batch
//! responses and drop it when the call returns.

use crate::entity::{Artifact, Container, Project, Sample};
use crate::error::EntityResult;
use crate::uri::Uri;
use clarity_xml::XmlElement;
use std::collections::BTreeMap;

/// Identity-keyed store of hydrated entities
#[derive(Debug, Clone, Default)]
pub struct EntityCatalog {
    samples: BTreeMap<Uri, Sample>,
    artifacts: BTreeMap<Uri, Artifact>,
    containers: BTreeMap<Uri, Container>,
    projects: BTreeMap<Uri, Project>,
}

impl EntityCatalog {
    /// Create empty catalog
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Hydrate artifact records, returning how many were added
    ///
    /// # Errors
    /// Fails on the first record that does not hydrate.
    pub fn load_artifacts<'a>(
        &mut self,
        records: impl IntoIterator<Item = &'a XmlElement>,
    ) -> EntityResult<usize> {
        let mut added = 0;
        for record in records {
            let artifact = Artifact::from_xml(record)?;
            self.artifacts.insert(artifact.uri.clone(), artifact);
            added += 1;
        }
        Ok(added)
    }

    /// Hydrate sample records
    ///
    /// # Errors
    /// Fails on the first record that does not hydrate.
    pub fn load_samples<'a>(
        &mut self,
        records: impl IntoIterator<Item = &'a XmlElement>,
    ) -> EntityResult<usize> {
        let mut added = 0;
        for record in records {
            let sample = Sample::from_xml(record)?;
            self.samples.insert(sample.uri.clone(), sample);
            added += 1;
        }
        Ok(added)
    }

    /// Hydrate container records
    ///
    /// # Errors
    /// Fails on the first record that does not hydrate.
    pub fn load_containers<'a>(
        &mut self,
        records: impl IntoIterator<Item = &'a XmlElement>,
    ) -> EntityResult<usize> {
        let mut added = 0;
        for record in records {
            let container = Container::from_xml(record)?;
            self.containers.insert(container.uri.clone(), container);
            added += 1;
        }
        Ok(added)
    }

    /// Hydrate project records
    ///
    /// # Errors
    /// Fails on the first record that does not hydrate.
    pub fn load_projects<'a>(
        &mut self,
        records: impl IntoIterator<Item = &'a XmlElement>,
    ) -> EntityResult<usize> {
        let mut added = 0;
        for record in records {
            let project = Project::from_xml(record)?;
            self.projects.insert(project.uri.clone(), project);
            added += 1;
        }
        Ok(added)
    }

    #[must_use]
    pub fn artifact(&self, uri: &Uri) -> Option<&Artifact> {
        self.artifacts.get(uri)
    }

    #[must_use]
    pub fn sample(&self, uri: &Uri) -> Option<&Sample> {
        self.samples.get(uri)
    }

    #[must_use]
    pub fn container(&self, uri: &Uri) -> Option<&Container> {
        self.containers.get(uri)
    }

    #[must_use]
    pub fn project(&self, uri: &Uri) -> Option<&Project> {
        self.projects.get(uri)
    }

    /// All hydrated artifacts, ordered by identity
    pub fn artifacts(&self) -> impl Iterator<Item = &Artifact> {
        self.artifacts.values()
    }

    /// All hydrated samples, ordered by identity
    pub fn samples(&self) -> impl Iterator<Item = &Sample> {
        self.samples.values()
    }

    /// Distinct containers referenced by hydrated artifacts
    #[must_use]
    pub fn referenced_containers(&self) -> Vec<Uri> {
        let mut uris: Vec<Uri> = self
            .artifacts
            .values()
            .filter_map(|a| a.container.clone())
            .collect();
        uris.sort();
        uris.dedup();
        uris
    }

    /// Distinct projects referenced by hydrated samples
    #[must_use]
    pub fn referenced_projects(&self) -> Vec<Uri> {
        let mut uris: Vec<Uri> = self
            .samples
            .values()
            .filter_map(|s| s.project.clone())
            .collect();
        uris.sort();
        uris.dedup();
        uris
    }

    /// Copy container name/type onto every artifact whose container is known
    ///
    /// Returns the number of artifacts enriched.
    pub fn attach_containers(&mut self) -> usize {
        let containers = &self.containers;
        let mut enriched = 0;
        for artifact in self.artifacts.values_mut() {
            if let Some(container) = artifact.container.as_ref().and_then(|c| containers.get(c)) {
                artifact.attach_container(container);
                enriched += 1;
            }
        }
        enriched
    }

    /// Copy project names onto every sample whose project is known
    pub fn attach_project_names(&mut self) -> usize {
        let projects = &self.projects;
        let mut named = 0;
        for sample in self.samples.values_mut() {
            if let Some(project) = sample.project.as_ref().and_then(|p| projects.get(p)) {
                sample.project_name = Some(project.name.clone());
                named += 1;
            }
        }
        named
    }

    /// Take the artifacts out, in the given order, skipping unknown ones
    #[must_use]
    pub fn artifacts_in_order(&self, order: &[Uri]) -> Vec<Artifact> {
        order.iter().filter_map(|u| self.artifacts.get(u).cloned()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact_record(uri: &str, container: Option<&str>) -> XmlElement {
        let mut record = XmlElement::new("art:artifact")
            .with_attr("uri", uri)
            .with_child(XmlElement::new("name").with_text("a"))
            .with_child(XmlElement::new("type").with_text("Analyte"))
            .with_child(XmlElement::new("sample").with_attr("uri", "s/1"));
        if let Some(c) = container {
            record = record.with_child(
                XmlElement::new("location")
                    .with_child(XmlElement::new("container").with_attr("uri", c))
                    .with_child(XmlElement::new("value").with_text("A:1")),
            );
        }
        record
    }

    #[test]
    fn only_referenced_containers_are_listed() {
        let mut catalog = EntityCatalog::new();
        let records = [
            artifact_record("a/1", Some("c/1")),
            artifact_record("a/2", Some("c/1")),
            artifact_record("a/3", None),
        ];
        assert_eq!(catalog.load_artifacts(&records).unwrap(), 3);
        assert_eq!(catalog.referenced_containers(), vec![Uri::new("c/1")]);
    }

    #[test]
    fn attaches_container_info() {
        let mut catalog = EntityCatalog::new();
        catalog
            .load_artifacts(&[artifact_record("a/1", Some("c/1")), artifact_record("a/2", None)])
            .unwrap();
        let container = XmlElement::new("con:container")
            .with_attr("uri", "c/1")
            .with_child(XmlElement::new("name").with_text("Plate"))
            .with_child(XmlElement::new("type").with_attr("name", "96 well plate"));
        catalog.load_containers([&container]).unwrap();

        assert_eq!(catalog.attach_containers(), 1);
        let a1 = catalog.artifact(&Uri::new("a/1")).unwrap();
        assert_eq!(a1.container_type.as_deref(), Some("96 well plate"));
        assert!(catalog.artifact(&Uri::new("a/2")).unwrap().container_name.is_none());
    }

    #[test]
    fn ordered_take_skips_unknown() {
        let mut catalog = EntityCatalog::new();
        catalog
            .load_artifacts(&[artifact_record("a/2", None), artifact_record("a/1", None)])
            .unwrap();
        let ordered =
            catalog.artifacts_in_order(&[Uri::new("a/2"), Uri::new("a/9"), Uri::new("a/1")]);
        let uris: Vec<_> = ordered.iter().map(|a| a.uri.as_str()).collect();
        assert_eq!(uris, ["a/2", "a/1"]);
    }
}
