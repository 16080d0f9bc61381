//! Typed Clarity records
//!
//! Each entity is hydrated from one record of a batch response. Entities are
//! rebuilt on every call; nothing here is cached.

use crate::error::{EntityError, EntityResult};
use crate::udf::{read_udfs, UdfMap};
use crate::uri::Uri;
use chrono::NaiveDate;
use clarity_xml::XmlElement;
use serde::{Deserialize, Serialize};

fn record_uri(entity: &'static str, record: &XmlElement) -> EntityResult<Uri> {
    record
        .attr("uri")
        .map(Uri::new)
        .ok_or_else(|| EntityError::missing_attribute(entity, "uri", record.name()))
}

fn required_text(
    entity: &'static str,
    record: &XmlElement,
    element: &'static str,
    uri: &Uri,
) -> EntityResult<String> {
    record
        .child(element)
        .map(XmlElement::trimmed_text)
        .ok_or_else(|| EntityError::missing_element(entity, element, uri))
}

fn linked_uri(record: &XmlElement, element: &str) -> Option<Uri> {
    record.find(element).and_then(|e| e.attr("uri")).map(Uri::new)
}

/// A submitted sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub uri: Uri,
    pub name: String,
    pub date_received: Option<NaiveDate>,
    /// Owning project; `None` for control samples
    pub project: Option<Uri>,
    /// Filled in only when project information is requested
    pub project_name: Option<String>,
    /// The sample's zeroth artifact
    pub artifact: Uri,
    pub udf: UdfMap,
}

impl Sample {
    const ENTITY: &'static str = "sample";

    /// Hydrate from an `smp:sample` record
    ///
    /// # Errors
    /// Returns [`EntityError`] when a required element is missing or the
    /// received date is not `YYYY-MM-DD`.
    pub fn from_xml(record: &XmlElement) -> EntityResult<Self> {
        let uri = record_uri(Self::ENTITY, record)?;
        let name = required_text(Self::ENTITY, record, "name", &uri)?;

        let date_received = match record.child("date-received") {
            Some(el) => {
                let text = el.trimmed_text();
                let date = NaiveDate::parse_from_str(&text, "%Y-%m-%d").map_err(|_| {
                    EntityError::InvalidValue {
                        entity: Self::ENTITY,
                        field: "date-received",
                        value: text.clone(),
                        uri: uri.to_string(),
                    }
                })?;
                Some(date)
            }
            None => None,
        };

        let project = if record.child("control-type").is_some() {
            None
        } else {
            record.child("project").and_then(|p| p.attr("uri")).map(Uri::new)
        };

        let artifact = record
            .child("artifact")
            .and_then(|a| a.attr("uri"))
            .map(Uri::new)
            .ok_or_else(|| EntityError::missing_element(Self::ENTITY, "artifact", &uri))?;

        Ok(Self {
            udf: read_udfs(record),
            uri,
            name,
            date_received,
            project,
            project_name: None,
            artifact,
        })
    }

    /// Control samples carry no project
    #[inline]
    #[must_use]
    pub fn is_control(&self) -> bool {
        self.project.is_none()
    }
}

/// A tracked lab item (analyte, result file, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub uri: Uri,
    pub limsid: Option<String>,
    pub name: String,
    pub art_type: String,
    /// Owning sample; per-input result files may have none
    pub sample: Option<Uri>,
    pub container: Option<Uri>,
    pub container_name: Option<String>,
    pub container_type: Option<String>,
    /// Well placement, e.g. `A:1`
    pub location: Option<String>,
    /// Process that produced this artifact
    pub parent_process: Option<Uri>,
    pub reagent_label: Option<String>,
    pub udf: UdfMap,
}

impl Artifact {
    const ENTITY: &'static str = "artifact";

    /// Hydrate from an `art:artifact` record
    ///
    /// Pooled and shared artifacts list several samples; the first one is
    /// taken as the owning sample.
    ///
    /// # Errors
    /// Returns [`EntityError`] when the name or type is missing.
    pub fn from_xml(record: &XmlElement) -> EntityResult<Self> {
        let uri = record_uri(Self::ENTITY, record)?;
        let name = required_text(Self::ENTITY, record, "name", &uri)?;
        let art_type = required_text(Self::ENTITY, record, "type", &uri)?;
        let sample = record.child("sample").and_then(|s| s.attr("uri")).map(Uri::new);

        let location = record
            .find("location")
            .and_then(|l| l.child("value"))
            .map(XmlElement::trimmed_text)
            .filter(|v| !v.is_empty());

        Ok(Self {
            limsid: record.attr("limsid").map(str::to_string),
            container: linked_uri(record, "container"),
            parent_process: linked_uri(record, "parent-process"),
            reagent_label: record
                .find("reagent-label")
                .and_then(|r| r.attr("name"))
                .map(str::to_string),
            udf: read_udfs(record),
            uri,
            name,
            art_type,
            sample,
            container_name: None,
            container_type: None,
            location,
        })
    }

    /// Structural identity, without the field map
    #[must_use]
    pub fn key(&self) -> ArtifactKey {
        ArtifactKey {
            name: self.name.clone(),
            uri: self.uri.clone(),
            art_type: self.art_type.clone(),
            sample: self.sample.clone(),
            container: self.container.clone(),
            container_name: self.container_name.clone(),
            container_type: self.container_type.clone(),
            location: self.location.clone(),
            parent_process: self.parent_process.clone(),
            reagent_label: self.reagent_label.clone(),
        }
    }

    /// Copy container name and type onto this artifact
    pub fn attach_container(&mut self, container: &Container) {
        self.container_name = Some(container.name.clone());
        self.container_type = Some(container.container_type.clone());
    }
}

/// Hashable projection of an [`Artifact`]
///
/// Field order is fixed: name, uri, type, sample, container uri, container
/// name, container type, location, parent process, reagent label. The UDF
/// map is left out; it is unordered and mutable.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ArtifactKey {
    pub name: String,
    pub uri: Uri,
    pub art_type: String,
    pub sample: Option<Uri>,
    pub container: Option<Uri>,
    pub container_name: Option<String>,
    pub container_type: Option<String>,
    pub location: Option<String>,
    pub parent_process: Option<Uri>,
    pub reagent_label: Option<String>,
}

/// A plate, tube or other vessel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    pub uri: Uri,
    pub name: String,
    pub container_type: String,
}

impl Container {
    const ENTITY: &'static str = "container";

    /// Hydrate from a `con:container` record
    ///
    /// # Errors
    /// Returns [`EntityError`] when the name or type is missing.
    pub fn from_xml(record: &XmlElement) -> EntityResult<Self> {
        let uri = record_uri(Self::ENTITY, record)?;
        let name = required_text(Self::ENTITY, record, "name", &uri)?;
        let container_type = record
            .child("type")
            .and_then(|t| t.attr("name"))
            .map(str::to_string)
            .ok_or_else(|| EntityError::missing_element(Self::ENTITY, "type", &uri))?;
        Ok(Self {
            uri,
            name,
            container_type,
        })
    }
}

/// One execution of a protocol step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Process {
    pub uri: Uri,
    /// Configured step name
    pub process_type: Option<String>,
    /// `"first last"` of the technician who ran it
    pub technician: Option<String>,
    pub udf: UdfMap,
}

impl Process {
    /// Hydrate from a `prc:process` record
    ///
    /// The uri is passed in because step-runner callers derive it from the
    /// step's limsid rather than reading it off the record.
    #[must_use]
    pub fn from_xml(uri: Uri, record: &XmlElement) -> Self {
        let technician = record.child("technician").map(|tech| {
            let first = tech.child("first-name").map(XmlElement::trimmed_text).unwrap_or_default();
            let last = tech.child("last-name").map(XmlElement::trimmed_text).unwrap_or_default();
            format!("{first} {last}").trim().to_string()
        });

        Self {
            uri,
            process_type: record.child("type").map(XmlElement::trimmed_text),
            technician,
            udf: read_udfs(record),
        }
    }
}

/// A project, used to label samples
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub uri: Uri,
    pub name: String,
}

impl Project {
    /// Hydrate from a `prj:project` record
    ///
    /// # Errors
    /// Returns [`EntityError`] when the name is missing.
    pub fn from_xml(record: &XmlElement) -> EntityResult<Self> {
        let uri = record_uri("project", record)?;
        let name = required_text("project", record, "name", &uri)?;
        Ok(Self { uri, name })
    }
}
