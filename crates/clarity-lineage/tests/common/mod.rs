#![allow(dead_code)]

use clarity_lineage::StepTools;
use clarity_model::Uri;
use clarity_test_utils::{
    artifact_uri, container_xml, init_tracing, sample_uri, step_uri, ArtifactXml, FakeTransport,
    StepXml,
};
use std::sync::Arc;

pub const SEQUENCING: &str = "24-100";

pub fn art(limsid: &str) -> Uri {
    Uri::new(artifact_uri(limsid))
}

pub fn smp(limsid: &str) -> Uri {
    Uri::new(sample_uri(limsid))
}

/// Step "Sequencing": A1 → O1, A2 → O2 per input, plus result file R shared
/// by both inputs
pub fn sequencing_lims() -> Arc<FakeTransport> {
    init_tracing();
    let fake = Arc::new(FakeTransport::new());
    fake.insert_all([
        ArtifactXml::analyte("A1", "s1").from_process("24-50").in_container("27-1", "A:1").build(),
        ArtifactXml::analyte("A2", "s2").from_process("24-50").in_container("27-1", "B:1").build(),
        ArtifactXml::analyte("O1", "s1")
            .from_process(SEQUENCING)
            .in_container("27-2", "A:1")
            .build(),
        ArtifactXml::analyte("O2", "s2")
            .from_process(SEQUENCING)
            .in_container("27-2", "B:1")
            .with_udf("Concentration", "String", "1")
            .build(),
        ArtifactXml::result_file("R", "s1")
            .with_sample("s2")
            .from_process(SEQUENCING)
            .build(),
        StepXml::details(SEQUENCING, "Sequencing")
            .per_input("A1", "O1", "Analyte")
            .shared("A1", "R", "ResultFile")
            .per_input("A2", "O2", "Analyte")
            .shared("A2", "R", "ResultFile")
            .build(),
        container_xml("27-1", "Plate In", "96 well plate"),
        container_xml("27-2", "Plate Out", "96 well plate"),
        container_xml("27-9", "Unused", "Tube"),
    ]);
    fake
}

pub async fn step_tools(fake: &Arc<FakeTransport>, limsid: &str) -> StepTools<Arc<FakeTransport>> {
    StepTools::new(Arc::clone(fake), &step_uri(limsid))
        .await
        .expect("step details should load")
}
