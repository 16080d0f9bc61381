//! Writer: [`XmlElement`] → text

use crate::element::{XmlElement, XmlNode};
use crate::error::{XmlError, XmlResult};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

/// Serialize an element tree
///
/// Attribute values and text are escaped by the writer. When `declaration`
/// is set the output starts with a standalone UTF-8 XML declaration, as the
/// Clarity API expects on POST bodies.
///
/// # Errors
/// Returns [`XmlError::Write`] if the writer fails.
pub fn to_string(root: &XmlElement, declaration: bool) -> XmlResult<String> {
    let mut writer = Writer::new(Vec::new());
    if declaration {
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
            .map_err(|e| XmlError::Write(e.to_string()))?;
    }
    write_element(&mut writer, root)?;
    String::from_utf8(writer.into_inner()).map_err(|e| XmlError::Write(e.to_string()))
}

/// Serialize as a complete document (with declaration)
///
/// # Errors
/// Returns [`XmlError::Write`] if the writer fails.
pub fn to_document(root: &XmlElement) -> XmlResult<String> {
    to_string(root, true)
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &XmlElement) -> XmlResult<()> {
    let mut start = BytesStart::new(element.name());
    for (key, value) in element.attributes() {
        start.push_attribute((key, value));
    }

    if element.nodes().is_empty() {
        return writer
            .write_event(Event::Empty(start))
            .map_err(|e| XmlError::Write(e.to_string()));
    }

    writer
        .write_event(Event::Start(start))
        .map_err(|e| XmlError::Write(e.to_string()))?;
    for node in element.nodes() {
        match node {
            XmlNode::Element(child) => write_element(writer, child)?,
            XmlNode::Text(text) => writer
                .write_event(Event::Text(BytesText::new(text)))
                .map_err(|e| XmlError::Write(e.to_string()))?,
        }
    }
    writer
        .write_event(Event::End(BytesEnd::new(element.name())))
        .map_err(|e| XmlError::Write(e.to_string()))
}
