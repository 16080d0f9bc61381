//! User-defined field values
//!
//! Clarity configures every UDF with a declared type. Values read from the
//! server are decoded according to that type; values supplied by callers
//! carry their own shape, from which a declared type is inferred when a
//! field has to be created.

use clarity_xml::XmlElement;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

/// Field map of a sample, artifact or process
pub type UdfMap = BTreeMap<String, UdfValue>;

/// Tagged UDF value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UdfValue {
    /// `true` / `false`
    Boolean(bool),
    /// Whole number
    Integer(i64),
    /// Floating-point number
    Float(f64),
    /// Anything else
    Text(String),
}

/// Declared UDF type, as named by the LIMS schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UdfType {
    /// `Boolean`
    Boolean,
    /// `Numeric`
    Numeric,
    /// `String`
    String,
}

impl UdfType {
    /// Schema name
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Boolean => "Boolean",
            Self::Numeric => "Numeric",
            Self::String => "String",
        }
    }
}

impl Display for UdfType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl UdfValue {
    /// Infer the declared type from the value's shape
    #[inline]
    #[must_use]
    pub const fn declared_type(&self) -> UdfType {
        match self {
            Self::Boolean(_) => UdfType::Boolean,
            Self::Integer(_) | Self::Float(_) => UdfType::Numeric,
            Self::Text(_) => UdfType::String,
        }
    }

    /// Textual form written into a field element
    #[must_use]
    pub fn to_text(&self) -> String {
        match self {
            Self::Boolean(b) => b.to_string(),
            Self::Integer(i) => i.to_string(),
            Self::Float(x) => x.to_string(),
            Self::Text(s) => s.clone(),
        }
    }

    /// Decode field text using its declared schema type
    ///
    /// Text that does not parse as the declared type stays [`UdfValue::Text`].
    #[must_use]
    pub fn from_declared(declared: Option<&str>, text: &str) -> Self {
        let trimmed = text.trim();
        match declared {
            Some("Boolean") => match trimmed.to_ascii_lowercase().as_str() {
                "true" => Self::Boolean(true),
                "false" => Self::Boolean(false),
                _ => Self::Text(text.to_string()),
            },
            Some("Numeric") => trimmed
                .parse::<i64>()
                .map(Self::Integer)
                .or_else(|_| trimmed.parse::<f64>().map(Self::Float))
                .unwrap_or_else(|_| Self::Text(text.to_string())),
            _ => Self::Text(text.to_string()),
        }
    }
}

impl Display for UdfValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl From<bool> for UdfValue {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<i32> for UdfValue {
    fn from(v: i32) -> Self {
        Self::Integer(i64::from(v))
    }
}

impl From<i64> for UdfValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<u32> for UdfValue {
    fn from(v: u32) -> Self {
        Self::Integer(i64::from(v))
    }
}

impl From<f64> for UdfValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for UdfValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for UdfValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

/// A field to be written: a name paired with a value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UdfUpdate {
    /// Field name as configured in the LIMS
    pub name: String,
    /// New value
    pub value: UdfValue,
}

impl UdfUpdate {
    /// Create a field update
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<UdfValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A new `udf:field` element in structured form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UdfField {
    /// Field name
    pub name: String,
    /// Declared type written to the `type` attribute
    pub declared_type: UdfType,
    /// Serialized value
    pub text: String,
}

impl UdfField {
    /// Build the structured field for a value, inferring its type
    #[must_use]
    pub fn infer(name: impl Into<String>, value: &UdfValue) -> Self {
        Self {
            name: name.into(),
            declared_type: value.declared_type(),
            text: value.to_text(),
        }
    }

    /// Element form
    #[must_use]
    pub fn to_element(&self) -> XmlElement {
        XmlElement::new("udf:field")
            .with_attr("type", self.declared_type.as_str())
            .with_attr("name", self.name.as_str())
            .with_text(self.text.as_str())
    }
}

/// Read every `udf:field` below `record` into a field map
#[must_use]
pub fn read_udfs(record: &XmlElement) -> UdfMap {
    record
        .find_all("udf:field")
        .into_iter()
        .filter_map(|field| {
            let name = field.attr("name")?;
            Some((
                name.to_string(),
                UdfValue::from_declared(field.attr("type"), &field.text()),
            ))
        })
        .collect()
}
