//! Clarity entity model
//!
//! Typed, per-call records for the Clarity LIMS REST API.
//!
//! # Core Concepts
//!
//! - [`Uri`]: normalized identity (query suffix stripped)
//! - [`Sample`], [`Artifact`], [`Container`], [`Process`], [`Project`]: typed records
//! - [`ArtifactKey`]: hashable structural projection of an artifact
//! - [`UdfValue`]: tagged field value with schema type inference
//! - [`EntityCatalog`]: identity-keyed store filled from batch responses
//! - [`GenerationKind`], [`IoMapEntry`], [`AncestorRef`]: step relation vocabulary

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod catalog;
mod entity;
mod error;
mod relation;
mod udf;
mod uri;

pub use catalog::EntityCatalog;
pub use entity::{Artifact, ArtifactKey, Container, Process, Project, Sample};
pub use error::{EntityError, EntityResult};
pub use relation::{AncestorRef, GenerationKind, IoMapEntry, Stream};
pub use udf::{read_udfs, UdfField, UdfMap, UdfType, UdfUpdate, UdfValue};
pub use uri::Uri;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
