//! Reader: text → [`XmlElement`]

use crate::element::{XmlElement, XmlNode};
use crate::error::{XmlError, XmlResult};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// Parse a complete document into its root element
///
/// Declarations, comments and processing instructions are dropped.
/// Whitespace-only text between elements is discarded.
///
/// # Errors
/// Returns [`XmlError`] when the input is not well-formed.
pub fn parse(input: &str) -> XmlResult<XmlElement> {
    let mut reader = Reader::from_str(input);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        let position = reader.buffer_position() as u64;
        let event = reader
            .read_event()
            .map_err(|e| XmlError::malformed(position, e))?;

        match event {
            Event::Start(start) => stack.push(open_element(&start, position)?),
            Event::Empty(start) => {
                let element = open_element(&start, position)?;
                attach(&mut stack, &mut root, element);
            }
            Event::End(end) => {
                let found = std::str::from_utf8(end.name().as_ref())
                    .map_err(|_| XmlError::InvalidUtf8("closing tag"))?
                    .to_string();
                let element = stack.pop().ok_or_else(|| XmlError::MismatchedTag {
                    expected: String::new(),
                    found: found.clone(),
                })?;
                if element.name() != found {
                    return Err(XmlError::MismatchedTag {
                        expected: element.name().to_string(),
                        found,
                    });
                }
                attach(&mut stack, &mut root, element);
            }
            Event::Text(text) => {
                let text = text
                    .unescape()
                    .map_err(|e| XmlError::malformed(position, e))?;
                if let Some(parent) = stack.last_mut() {
                    parent.push_node(XmlNode::Text(text.into_owned()));
                }
            }
            Event::CData(data) => {
                let text = std::str::from_utf8(&data)
                    .map_err(|_| XmlError::InvalidUtf8("cdata"))?
                    .to_string();
                if let Some(parent) = stack.last_mut() {
                    parent.push_node(XmlNode::Text(text));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.pop() {
        return Err(XmlError::UnexpectedEof(open.name().to_string()));
    }
    root.ok_or(XmlError::Empty)
}

fn open_element(start: &BytesStart<'_>, position: u64) -> XmlResult<XmlElement> {
    let qname = start.name();
    let name = std::str::from_utf8(qname.as_ref())
        .map_err(|_| XmlError::InvalidUtf8("element name"))?;
    let mut element = XmlElement::new(name);

    for attr in start.attributes() {
        let attr = attr.map_err(|e| XmlError::malformed(position, e))?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .map_err(|_| XmlError::InvalidUtf8("attribute name"))?
            .to_string();
        let value = attr
            .unescape_value()
            .map_err(|e| XmlError::malformed(position, e))?;
        element.set_attr(key, value.into_owned());
    }
    Ok(element)
}

fn attach(stack: &mut [XmlElement], root: &mut Option<XmlElement>, element: XmlElement) {
    match stack.last_mut() {
        Some(parent) => parent.push_child(element),
        // First closed top-level element wins; trailing siblings are ignored.
        None => {
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}
