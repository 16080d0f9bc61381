mod common;

use clarity_lineage::{CallError, ClarityError, ConsistencyError, LineageResolver};
use clarity_model::{AncestorRef, GenerationKind, Stream, Uri};
use clarity_test_utils::{init_tracing, process_uri, ArtifactXml, FakeTransport, StepXml};
use common::{art, sequencing_lims, smp, step_tools, SEQUENCING};
use pretty_assertions::assert_eq;
use std::collections::BTreeMap;
use std::sync::Arc;

const LIBRARY_PREP: &str = "24-10";
const NORMALIZATION: &str = "24-20";
const SEQUENCING_RUN: &str = "24-30";
const POOLING: &str = "24-31";
const QUANT: &str = "24-60";

/// Library Prep (X1 → B1) → Normalization (B1 → N1) → Sequencing (N1 → Q1)
///
/// Library Prep also makes a per-input result file F1 and a shared file Q.
/// Pooling takes D1 from Library Prep and D2 from Normalization.
fn chain_lims() -> Arc<FakeTransport> {
    init_tracing();
    let fake = Arc::new(FakeTransport::new());
    fake.insert_all([
        ArtifactXml::analyte("X1", "s1").build(),
        ArtifactXml::analyte("B1", "s1").from_process(LIBRARY_PREP).build(),
        ArtifactXml::result_file("F1", "s1").from_process(LIBRARY_PREP).build(),
        ArtifactXml::result_file("Q", "s1").from_process(LIBRARY_PREP).build(),
        ArtifactXml::analyte("N1", "s1").from_process(NORMALIZATION).build(),
        ArtifactXml::analyte("Q1", "s1").from_process(SEQUENCING_RUN).build(),
        ArtifactXml::analyte("D1", "s1").from_process(LIBRARY_PREP).build(),
        ArtifactXml::analyte("D2", "s2").from_process(NORMALIZATION).build(),
        StepXml::process(LIBRARY_PREP, "Library Prep")
            .per_input("X1", "B1", "Analyte")
            .per_input("X1", "F1", "ResultFile")
            .shared("X1", "Q", "ResultFile")
            .build(),
        StepXml::process(NORMALIZATION, "Normalization")
            .per_input("B1", "N1", "Analyte")
            .build(),
        StepXml::details(SEQUENCING_RUN, "Sequencing")
            .per_input("N1", "Q1", "Analyte")
            .build(),
        StepXml::details(POOLING, "Pooling")
            .per_input("D1", "P1", "Analyte")
            .per_input("D2", "P2", "Analyte")
            .build(),
    ]);
    fake
}

fn origins(pairs: &[(&str, &str)]) -> BTreeMap<Uri, Uri> {
    pairs.iter().map(|(a, s)| (art(a), smp(s))).collect()
}

fn analyte(limsid: &str) -> AncestorRef {
    AncestorRef::new(art(limsid), "Analyte", GenerationKind::PerInput)
}

#[tokio::test]
async fn test_target_is_current_step() {
    let fake = sequencing_lims();
    let step = step_tools(&fake, SEQUENCING).await;
    let before = fake.round_trips();

    let result = step
        .artifacts_at_previous_step(
            "Sequencing",
            Stream::Input,
            &origins(&[("O1", "s1"), ("O2", "s2")]),
        )
        .await
        .unwrap();

    assert_eq!(result.levels_walked, 0);
    assert_eq!(result.match_step, "Sequencing");
    assert_eq!(result.ancestors_of(&art("O1")), Some(&[analyte("A1")][..]));
    assert_eq!(result.ancestors_of(&art("O2")), Some(&[analyte("A2")][..]));
    assert_eq!(
        result.shared,
        vec![AncestorRef::new(art("R"), "ResultFile", GenerationKind::PerAllInputs)]
    );
    // one batch for the matched step's inputs, no process fetch
    assert_eq!(fake.round_trips() - before, 1);
    assert!(fake.gets().iter().all(|g| !g.contains("processes")));
}

#[tokio::test]
async fn test_walks_back_through_each_level() {
    let fake = chain_lims();
    let step = step_tools(&fake, SEQUENCING_RUN).await;

    let result = step
        .artifacts_at_previous_step("Library Prep", Stream::Output, &origins(&[("Q1", "s1")]))
        .await
        .unwrap();

    assert_eq!(result.levels_walked, 2);
    assert_eq!(result.match_uri, Some(Uri::new(process_uri(LIBRARY_PREP))));
    // per-input result file F1 is skipped
    assert_eq!(result.ancestors[&art("Q1")], vec![analyte("B1")]);
    assert_eq!(
        result.shared,
        vec![AncestorRef::new(art("Q"), "ResultFile", GenerationKind::PerAllInputs)]
    );

    let fetched: Vec<_> = fake.gets().into_iter().filter(|g| g.contains("processes")).collect();
    assert_eq!(fetched, vec![process_uri(NORMALIZATION), process_uri(LIBRARY_PREP)]);
}

#[tokio::test]
async fn test_input_stream_at_ancestor_step() {
    let fake = chain_lims();
    let step = step_tools(&fake, SEQUENCING_RUN).await;
    let result = step
        .artifacts_at_previous_step("Library Prep", Stream::Input, &origins(&[("Q1", "s1")]))
        .await
        .unwrap();
    assert_eq!(result.ancestors[&art("Q1")], vec![analyte("X1")]);
}

#[tokio::test]
async fn test_resolution_is_idempotent() {
    let fake = chain_lims();
    let step = step_tools(&fake, SEQUENCING_RUN).await;
    let pairs = origins(&[("Q1", "s1")]);

    let first = step
        .artifacts_at_previous_step("Normalization", Stream::Output, &pairs)
        .await
        .unwrap();
    let second = step
        .artifacts_at_previous_step("Normalization", Stream::Output, &pairs)
        .await
        .unwrap();
    assert_eq!(first, second);
    assert_eq!(first.levels_walked, 1);
    assert_eq!(first.ancestors[&art("Q1")], vec![analyte("N1")]);
}

#[tokio::test]
async fn test_history_exhausted_names_earliest_step() {
    let fake = chain_lims();
    let step = step_tools(&fake, SEQUENCING_RUN).await;
    let err = step
        .artifacts_at_previous_step("Extraction", Stream::Output, &origins(&[("Q1", "s1")]))
        .await
        .unwrap_err();

    assert!(err.is_consistency_error());
    match err {
        ClarityError::Consistency(ConsistencyError::HistoryExhausted { earliest_step }) => {
            assert_eq!(earliest_step, "Library Prep");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_divergent_parents_fail_loudly() {
    let fake = chain_lims();
    let step = step_tools(&fake, POOLING).await;
    let err = step
        .artifacts_at_previous_step("Library Prep", Stream::Output, &origins(&[("P1", "s1")]))
        .await
        .unwrap_err();

    match err {
        ClarityError::Consistency(ConsistencyError::DivergentHistory { step, parents }) => {
            assert_eq!(step, "Pooling");
            assert_eq!(parents.len(), 2);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_depth_bound() {
    let fake = chain_lims();
    let step = step_tools(&fake, SEQUENCING_RUN).await.with_max_depth(1);
    let err = step
        .artifacts_at_previous_step("Library Prep", Stream::Output, &origins(&[("Q1", "s1")]))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ClarityError::Consistency(ConsistencyError::DepthExceeded { ref step, max_depth: 1 })
            if step == "Normalization"
    ));
}

#[tokio::test]
async fn test_misaligned_artifact_is_named() {
    let fake = sequencing_lims();
    let step = step_tools(&fake, SEQUENCING).await;
    let err = step
        .artifacts_at_previous_step(
            "Sequencing",
            Stream::Input,
            &origins(&[("O1", "s1"), ("Z9", "s9")]),
        )
        .await
        .unwrap_err();

    assert!(err.is_caller_error());
    assert!(matches!(
        &err,
        ClarityError::Call(CallError::ArtifactMisaligned { artifact }) if *artifact == art("Z9")
    ));
    assert!(err.to_string().contains("Z9"));
}

#[tokio::test]
async fn test_blank_target_is_rejected() {
    let fake = sequencing_lims();
    let step = step_tools(&fake, SEQUENCING).await;
    let err = step
        .artifacts_at_previous_step("  ", Stream::Input, &BTreeMap::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ClarityError::Call(CallError::EmptyTargetStep)));
}

#[tokio::test]
async fn test_resolver_runs_from_any_document() {
    let fake = chain_lims();
    let start = StepXml::process(NORMALIZATION, "Normalization")
        .per_input("B1", "N1", "Analyte")
        .build();
    let result = LineageResolver::new(fake.as_ref())
        .resolve("Library Prep", Stream::Output, &origins(&[("N1", "s1")]), &start)
        .await
        .unwrap();
    assert_eq!(result.levels_walked, 1);
    assert_eq!(result.ancestors[&art("N1")], vec![analyte("B1")]);
}

#[tokio::test]
async fn test_result_serializes_by_uri() {
    let fake = sequencing_lims();
    let step = step_tools(&fake, SEQUENCING).await;
    let result = step
        .artifacts_at_previous_step("Sequencing", Stream::Output, &origins(&[("O1", "s1")]))
        .await
        .unwrap();

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["levels_walked"], 0);
    assert_eq!(json["ancestors"][art("O1").as_str()][0]["uri"], art("O1").as_str());
    assert_eq!(json["shared"][0]["generation"], "PerAllInputs");
}

/// "Quant" measures A1 and A2 into one shared result file R
fn quant_lims() -> Arc<FakeTransport> {
    init_tracing();
    let fake = Arc::new(FakeTransport::new());
    fake.insert_all([
        ArtifactXml::analyte("A1", "s1").from_process("24-50").build(),
        ArtifactXml::analyte("A2", "s2").from_process("24-50").build(),
        ArtifactXml::result_file("R", "s1").with_sample("s2").from_process(QUANT).build(),
        StepXml::details(QUANT, "Quant")
            .shared("A1", "R", "ResultFile")
            .shared("A2", "R", "ResultFile")
            .build(),
    ]);
    fake
}

#[tokio::test]
async fn test_input_stream_at_shared_only_step() {
    let fake = quant_lims();
    let step = step_tools(&fake, QUANT).await;
    let result = step
        .artifacts_at_previous_step(
            "Quant",
            Stream::Input,
            &origins(&[("A1", "s1"), ("A2", "s2")]),
        )
        .await
        .unwrap();

    let input = |limsid| AncestorRef::new(art(limsid), "Analyte", GenerationKind::PerAllInputs);
    assert_eq!(result.ancestors_of(&art("A1")), Some(&[input("A1")][..]));
    assert_eq!(result.ancestors_of(&art("A2")), Some(&[input("A2")][..]));
    assert_eq!(
        result.shared,
        vec![AncestorRef::new(art("R"), "ResultFile", GenerationKind::PerAllInputs)]
    );
}

#[tokio::test]
async fn test_output_stream_keeps_shared_outputs_out_of_ancestors() {
    let fake = quant_lims();
    let step = step_tools(&fake, QUANT).await;
    let err = step
        .artifacts_at_previous_step("Quant", Stream::Output, &origins(&[("A1", "s1")]))
        .await
        .unwrap_err();
    assert!(matches!(err, ClarityError::Call(CallError::ArtifactMisaligned { .. })));
}

#[tokio::test]
async fn test_document_without_inputs_exhausts_history() {
    let fake = chain_lims();
    let start = StepXml::process("24-40", "Receiving").build();
    let err = LineageResolver::new(fake.as_ref())
        .resolve("Library Prep", Stream::Output, &origins(&[("X1", "s1")]), &start)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ClarityError::Consistency(ConsistencyError::HistoryExhausted { ref earliest_step })
            if earliest_step == "Receiving"
    ));
}

#[tokio::test]
async fn test_unreturned_input_exhausts_history() {
    let fake = chain_lims();
    let start = StepXml::process("24-41", "Orphaned")
        .per_input("GONE", "N9", "Analyte")
        .build();
    let err = LineageResolver::new(fake.as_ref())
        .resolve("Library Prep", Stream::Output, &origins(&[("N9", "s1")]), &start)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ClarityError::Consistency(ConsistencyError::HistoryExhausted { ref earliest_step })
            if earliest_step == "Orphaned"
    ));
    assert!(fake.gets().iter().all(|g| !g.contains("processes")));
}
