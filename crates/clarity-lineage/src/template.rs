//! Update payload templates

use crate::error::Result;
use clarity_xml::XmlElement;

/// Named payload shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Template {
    /// `art:details` wrapping edited artifact records
    ArtifactBatchUpdate,
}

/// Variables a template is rendered with
#[derive(Debug, Clone, Default)]
pub struct TemplateVars {
    /// Records embedded in the payload, in order
    pub records: Vec<XmlElement>,
}

impl TemplateVars {
    /// Create variables from records
    #[inline]
    #[must_use]
    pub fn with_records(records: Vec<XmlElement>) -> Self {
        Self { records }
    }
}

/// Renders a template into a document
pub trait TemplateRenderer: Send + Sync {
    /// Render `template` with `vars`
    ///
    /// # Errors
    /// Implementation specific.
    fn render(&self, template: Template, vars: &TemplateVars) -> Result<XmlElement>;
}

/// Built-in renderer producing documents directly
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlTemplates;

impl TemplateRenderer for XmlTemplates {
    fn render(&self, template: Template, vars: &TemplateVars) -> Result<XmlElement> {
        match template {
            Template::ArtifactBatchUpdate => Ok(vars.records.iter().fold(
                XmlElement::new("art:details")
                    .with_attr("xmlns:art", "http://genologics.com/ri/artifact")
                    .with_attr("xmlns:udf", "http://genologics.com/ri/userdefined"),
                |doc, record| doc.with_child(record.clone()),
            )),
        }
    }
}
