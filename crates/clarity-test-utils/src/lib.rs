//! Testing utilities for the Clarity tools workspace
//!
//! Shared fake transport, XML fixtures and tracing setup.

#![allow(missing_docs)]

mod fake;
mod fixtures;

pub use fake::{FakeTransport, RecordedPost};
pub use fixtures::{
    artifact_uri, container_uri, container_xml, process_uri, project_uri, project_xml, sample_uri,
    sample_xml, step_uri, ArtifactXml, StepXml, HOST,
};

/// Install a fmt subscriber honouring `RUST_LOG`; safe to call from every test
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
