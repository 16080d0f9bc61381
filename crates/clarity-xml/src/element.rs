//! Owned element tree
//!
//! Provides [`XmlElement`], the structured document type every other crate
//! in the workspace reads and edits. Lookups accept either a qualified name
//! (`art:artifact`) or a bare local name (`artifact`).

use std::fmt::{self, Display, Formatter};

/// A node in the element tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    /// Nested element
    Element(XmlElement),
    /// Character data (already unescaped)
    Text(String),
}

/// An XML element with ordered attributes and children
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<XmlNode>,
}

impl XmlElement {
    /// Create an empty element
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// With attribute (builder)
    #[inline]
    #[must_use]
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(key, value);
        self
    }

    /// With text content (builder)
    #[inline]
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.set_text(text);
        self
    }

    /// With child element (builder)
    #[inline]
    #[must_use]
    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.push_child(child);
        self
    }

    /// Qualified name, including any prefix
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name without namespace prefix
    #[must_use]
    pub fn local_name(&self) -> &str {
        self.name
            .split_once(':')
            .map_or(self.name.as_str(), |(_, local)| local)
    }

    /// Namespace prefix, if any
    #[must_use]
    pub fn prefix(&self) -> Option<&str> {
        self.name.split_once(':').map(|(prefix, _)| prefix)
    }

    /// Check whether this element answers to `name`
    ///
    /// A qualified query must match exactly; a bare query matches the local
    /// name regardless of prefix.
    #[must_use]
    pub fn is(&self, name: &str) -> bool {
        if name.contains(':') {
            self.name == name
        } else {
            self.local_name() == name
        }
    }

    /// Attribute value
    #[must_use]
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// All attributes in document order
    #[inline]
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Set or replace an attribute
    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((key, value)),
        }
    }

    /// Concatenated text of this element and all descendants
    #[must_use]
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                XmlNode::Text(t) => out.push_str(t),
                XmlNode::Element(e) => e.collect_text(out),
            }
        }
    }

    /// Text with surrounding whitespace removed
    #[must_use]
    pub fn trimmed_text(&self) -> String {
        self.text().trim().to_string()
    }

    /// Replace all children with a single text node
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.children.clear();
        self.children.push(XmlNode::Text(text.into()));
    }

    /// Raw child nodes
    #[inline]
    #[must_use]
    pub fn nodes(&self) -> &[XmlNode] {
        &self.children
    }

    /// Direct child elements
    pub fn children(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|n| match n {
            XmlNode::Element(e) => Some(e),
            XmlNode::Text(_) => None,
        })
    }

    /// Direct child elements, mutably
    pub fn children_mut(&mut self) -> impl Iterator<Item = &mut XmlElement> {
        self.children.iter_mut().filter_map(|n| match n {
            XmlNode::Element(e) => Some(e),
            XmlNode::Text(_) => None,
        })
    }

    /// First direct child named `name`
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children().find(|c| c.is(name))
    }

    /// First descendant (depth-first, document order) named `name`
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&XmlElement> {
        for child in self.children() {
            if child.is(name) {
                return Some(child);
            }
            if let Some(found) = child.find(name) {
                return Some(found);
            }
        }
        None
    }

    /// Every descendant named `name`, in document order
    #[must_use]
    pub fn find_all(&self, name: &str) -> Vec<&XmlElement> {
        let mut out = Vec::new();
        self.collect_named(name, &mut out);
        out
    }

    fn collect_named<'a>(&'a self, name: &str, out: &mut Vec<&'a XmlElement>) {
        for child in self.children() {
            if child.is(name) {
                out.push(child);
            }
            child.collect_named(name, out);
        }
    }

    /// First descendant matching a predicate, mutably
    pub fn find_mut_by<F>(&mut self, pred: &F) -> Option<&mut XmlElement>
    where
        F: Fn(&XmlElement) -> bool,
    {
        for child in self.children_mut() {
            if pred(child) {
                return Some(child);
            }
            if let Some(found) = child.find_mut_by(pred) {
                return Some(found);
            }
        }
        None
    }

    /// Append a child element
    #[inline]
    pub fn push_child(&mut self, child: XmlElement) {
        self.children.push(XmlNode::Element(child));
    }

    /// Insert a child element directly after the first direct child named
    /// `anchor`, or append it when no such child exists
    pub fn insert_after(&mut self, anchor: &str, child: XmlElement) {
        let position = self
            .children
            .iter()
            .position(|n| matches!(n, XmlNode::Element(e) if e.is(anchor)));
        match position {
            Some(idx) => self.children.insert(idx + 1, XmlNode::Element(child)),
            None => self.push_child(child),
        }
    }

    /// Remove every direct child named `name`, returning how many were removed
    pub fn remove_children(&mut self, name: &str) -> usize {
        let before = self.children.len();
        self.children
            .retain(|n| !matches!(n, XmlNode::Element(e) if e.is(name)));
        before - self.children.len()
    }

    pub(crate) fn push_node(&mut self, node: XmlNode) {
        self.children.push(node);
    }
}

impl Display for XmlElement {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match crate::write::to_string(self, false) {
            Ok(s) => f.write_str(&s),
            Err(_) => Err(fmt::Error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> XmlElement {
        XmlElement::new("art:artifact")
            .with_attr("uri", "http://lims/api/v2/artifacts/2-1")
            .with_child(XmlElement::new("name").with_text("Sample 1"))
            .with_child(
                XmlElement::new("location")
                    .with_child(XmlElement::new("container").with_attr("uri", "c/27-1"))
                    .with_child(XmlElement::new("value").with_text("A:1")),
            )
            .with_child(XmlElement::new("sample").with_attr("uri", "s/1"))
    }

    #[test]
    fn prefix_and_local_name() {
        let el = XmlElement::new("udf:field");
        assert_eq!(el.local_name(), "field");
        assert_eq!(el.prefix(), Some("udf"));
        assert!(el.is("field"));
        assert!(el.is("udf:field"));
        assert!(!el.is("smp:field"));
    }

    #[test]
    fn find_is_depth_first() {
        let tree = sample_tree();
        let container = tree.find("container").unwrap();
        assert_eq!(container.attr("uri"), Some("c/27-1"));
        assert!(tree.child("container").is_none());
        assert_eq!(tree.find("value").unwrap().text(), "A:1");
    }

    #[test]
    fn insert_after_anchor() {
        let mut tree = sample_tree();
        tree.insert_after("name", XmlElement::new("type").with_text("Analyte"));
        let names: Vec<_> = tree.children().map(XmlElement::name).collect();
        assert_eq!(names, ["name", "type", "location", "sample"]);

        tree.insert_after("missing", XmlElement::new("tail"));
        assert_eq!(tree.children().last().unwrap().name(), "tail");
    }

    #[test]
    fn set_attr_replaces() {
        let mut el = XmlElement::new("x").with_attr("a", "1");
        el.set_attr("a", "2");
        assert_eq!(el.attr("a"), Some("2"));
        assert_eq!(el.attributes().count(), 1);
    }

    #[test]
    fn remove_children_counts() {
        let mut el = XmlElement::new("art:artifact")
            .with_child(XmlElement::new("reagent-label").with_attr("name", "A"))
            .with_child(XmlElement::new("reagent-label").with_attr("name", "B"))
            .with_child(XmlElement::new("name"));
        assert_eq!(el.remove_children("reagent-label"), 2);
        assert_eq!(el.children().count(), 1);
    }
}
