//! Clarity XML documents
//!
//! The Clarity REST API speaks a namespaced XML dialect (`art:artifact`,
//! `smp:sample`, `udf:field`, ...). This crate gives the rest of the
//! workspace one owned tree type to read, edit and re-serialize those
//! documents, without ever splicing strings.
//!
//! - [`XmlElement`]: element with ordered attributes and mixed children
//! - [`parse`]: text → tree
//! - [`to_string`] / [`to_document`]: tree → text
//!
//! # Example
//!
//! ```rust
//! use clarity_xml::{parse, XmlElement};
//!
//! let doc = parse(r#"<smp:sample uri="s/1"><name>S1</name></smp:sample>"#).unwrap();
//! assert_eq!(doc.child("name").map(XmlElement::text).as_deref(), Some("S1"));
//! ```

#![warn(unreachable_pub)]

mod element;
mod error;
mod parse;
mod write;

pub use element::{XmlElement, XmlNode};
pub use error::{XmlError, XmlResult};
pub use parse::parse;
pub use write::{to_document, to_string};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
