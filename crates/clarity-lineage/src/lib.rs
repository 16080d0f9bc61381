//! Clarity lineage engine
//!
//! Structural queries over a Clarity LIMS:
//! - Builds the input → output relation of a step, separating per-input
//!   outputs from step-wide shared ones
//! - Walks step history backward to find the artifacts a sample had at an
//!   earlier, named step
//! - Writes field values onto many artifacts in one batch update
//!
//! All reads go through a [`Transport`](clarity_transport::Transport) and are
//! batched; nothing is cached between calls.
//!
//! # Example
//!
//! ```rust,ignore
//! use clarity_lineage::prelude::*;
//! use clarity_transport::{ClarityConfig, HttpTransport};
//! use std::collections::BTreeMap;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = HttpTransport::new(ClarityConfig::from_file("clarity.toml")?)?;
//! let step = StepTools::new(transport, "https://lims/api/v2/steps/24-1001").await?;
//!
//! let outputs = step.artifacts(Stream::Output, ContainerInfo::Omit).await?;
//! let origins: BTreeMap<Uri, Uri> = outputs
//!     .iter()
//!     .filter_map(|a| Some((a.uri.clone(), a.sample.clone()?)))
//!     .collect();
//! let lineage = step
//!     .artifacts_at_previous_step("Library Prep", Stream::Output, &origins)
//!     .await?;
//! println!("walked back {} steps", lineage.levels_walked);
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod error;
pub mod io_map;
pub mod lineage;
pub mod resolver;
pub mod template;
pub mod tools;
pub mod update;

pub use error::{CallError, ClarityError, ConsistencyError, Result};
pub use io_map::{ArtifactGroup, ArtifactMap, ContainerInfo, IoMap, IoOutput, IoRelation};
pub use lineage::{step_name, LineageResolver, LineageResult, DEFAULT_MAX_DEPTH};
pub use resolver::{BatchResolver, RecordMap};
pub use template::{Template, TemplateRenderer, TemplateVars, XmlTemplates};
pub use tools::{ClarityTools, StepTools};
pub use update::{set_field, FieldsByLimsid, UdfUpdateBuilder};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for step-runner scripts
    pub use crate::{
        ClarityError, ClarityTools, ContainerInfo, FieldsByLimsid, LineageResult, StepTools,
    };
    pub use clarity_model::{AncestorRef, Artifact, Sample, Stream, UdfUpdate, UdfValue, Uri};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
