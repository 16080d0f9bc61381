//! Batch UDF updates
//!
//! [`UdfUpdateBuilder`] edits artifact records in place: an existing field
//! keeps its declared type and only its text changes, a missing field is
//! created with a type inferred from the value and placed right after the
//! record's `sample` element. Only records that were touched end up in the
//! payload.

use crate::error::Result;
use crate::template::{Template, TemplateRenderer, TemplateVars};
use clarity_model::{UdfField, UdfUpdate};
use clarity_xml::XmlElement;
use std::collections::BTreeMap;

/// Field updates keyed by artifact limsid
pub type FieldsByLimsid = BTreeMap<String, Vec<UdfUpdate>>;

const ARTIFACT: &str = "art:artifact";

/// Collects edited artifact records for one batch update
#[derive(Debug, Clone, Default)]
pub struct UdfUpdateBuilder {
    touched: Vec<XmlElement>,
}

impl UdfUpdateBuilder {
    /// Create empty builder
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply updates to every artifact record of a batch document
    ///
    /// Returns the number of records touched.
    pub fn apply(&mut self, document: &XmlElement, fields: &FieldsByLimsid) -> usize {
        if document.is(ARTIFACT) {
            self.apply_records([document], fields)
        } else {
            self.apply_records(document.children().filter(|c| c.is(ARTIFACT)), fields)
        }
    }

    /// Apply updates to individual artifact records
    pub fn apply_records<'r>(
        &mut self,
        records: impl IntoIterator<Item = &'r XmlElement>,
        fields: &FieldsByLimsid,
    ) -> usize {
        let mut count = 0;
        for record in records {
            let Some(updates) = record.attr("limsid").and_then(|id| fields.get(id)) else {
                continue;
            };
            if updates.is_empty() {
                continue;
            }
            let mut edited = record.clone();
            for update in updates {
                set_field(&mut edited, update);
            }
            self.touched.push(edited);
            count += 1;
        }
        count
    }

    /// Records edited so far
    #[inline]
    #[must_use]
    pub fn touched(&self) -> &[XmlElement] {
        &self.touched
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.touched.is_empty()
    }

    /// Render the single batch-update payload
    ///
    /// # Errors
    /// Propagates renderer failures.
    pub fn render<R: TemplateRenderer + ?Sized>(&self, renderer: &R) -> Result<XmlElement> {
        renderer.render(
            Template::ArtifactBatchUpdate,
            &TemplateVars::with_records(self.touched.clone()),
        )
    }
}

/// Overwrite or create one field on a record
pub fn set_field(record: &mut XmlElement, update: &UdfUpdate) {
    let is_target =
        |el: &XmlElement| el.is("udf:field") && el.attr("name") == Some(update.name.as_str());
    match record.find_mut_by(&is_target) {
        Some(existing) => existing.set_text(update.value.to_text()),
        None => {
            let field = UdfField::infer(update.name.as_str(), &update.value);
            record.insert_after("sample", field.to_element());
        }
    }
}
