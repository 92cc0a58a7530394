mod helpers;

use helpers::{engine_with_config, rust_concept_map, test_config, test_engine, ScriptedGenerator, TestClock};
use synaptic::error::EngineError;

#[tokio::test]
async fn build_creates_nodes_and_report() {
    let dir = tempfile::tempdir().unwrap();
    let clock = TestClock::new();
    let engine = test_engine(&dir, ScriptedGenerator::full(), &clock);

    let outcome = engine.build("Rust").await.unwrap();

    assert_eq!(outcome.created, vec!["c000", "c001", "c002"]);
    assert!(outcome.reused.is_empty());
    assert!(outcome.report.exists());
    assert!(outcome.report.starts_with(dir.path().join("reports")));

    let nodes = engine.nodes().unwrap();
    assert_eq!(nodes.len(), 3);
    assert_eq!(nodes["c001"].name, "Borrowing");
    assert_eq!(nodes["c001"].prerequisites, vec!["c000"]);
    assert_eq!(nodes["c002"].prerequisites, vec!["c001"]);
    // difficulty 5 is capped at Apply
    assert_eq!(nodes["c002"].bloom_level, 3);
    assert_eq!(nodes["c000"].p_know, 0.1);
    assert!(nodes["c000"].is_new());
}

#[tokio::test]
async fn rebuild_keeps_learning_state() {
    let dir = tempfile::tempdir().unwrap();
    let clock = TestClock::new();
    let generator = ScriptedGenerator::full();
    let engine = test_engine(&dir, generator, &clock);
    engine.build("Rust").await.unwrap();
    engine.review("c000", synaptic::learning::Quality::new(5).unwrap()).unwrap();

    let mut extended = rust_concept_map();
    extended.concepts.push("Smart pointers".into());
    extended
        .prerequisites_map
        .insert("Smart pointers".into(), vec!["ownership".into()]);
    engine.generator().set_concept_map(extended);

    let outcome = engine.build("Rust").await.unwrap();
    assert_eq!(outcome.created, vec!["c003"]);
    assert_eq!(outcome.reused, vec!["c000", "c001", "c002"]);

    let nodes = engine.nodes().unwrap();
    assert_eq!(nodes["c000"].repetitions, 1);
    assert_eq!(nodes["c003"].prerequisites, vec!["c000"]);
}

#[tokio::test]
async fn generator_failure_persists_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let clock = TestClock::new();
    let engine = test_engine(&dir, ScriptedGenerator::failing(), &clock);

    let err = engine.build("Rust").await.unwrap_err();
    assert!(matches!(err, EngineError::DependencyFailure { operation: "build", .. }));
    assert!(err.is_retryable());
    assert!(!engine.store().exists());
}

#[tokio::test]
async fn empty_topic_is_rejected_before_generation() {
    let dir = tempfile::tempdir().unwrap();
    let clock = TestClock::new();
    let engine = test_engine(&dir, ScriptedGenerator::full(), &clock);

    let err = engine.build("   ").await.unwrap_err();
    assert!(matches!(err, EngineError::Validation { field: "topic", .. }));
    assert_eq!(engine.generator().calls(), 0);
}

#[tokio::test]
async fn cycles_are_broken_and_reported() {
    let dir = tempfile::tempdir().unwrap();
    let clock = TestClock::new();
    let generator = ScriptedGenerator::full();
    let mut map = rust_concept_map();
    map.prerequisites_map
        .insert("Ownership".into(), vec!["Lifetimes".into()]);
    generator.set_concept_map(map);
    let engine = test_engine(&dir, generator, &clock);

    let outcome = engine.build("Rust").await.unwrap();
    assert_eq!(outcome.broken_cycles.len(), 1);
    assert!(synaptic::learning::graph::find_cycle(&engine.nodes().unwrap()).is_none());
}

#[tokio::test]
async fn cycles_can_fail_the_build() {
    let dir = tempfile::tempdir().unwrap();
    let clock = TestClock::new();
    let mut config = test_config(&dir);
    config.graph.reject_cycles = true;

    let generator = ScriptedGenerator::full();
    let mut map = rust_concept_map();
    map.prerequisites_map
        .insert("Ownership".into(), vec!["Lifetimes".into()]);
    generator.set_concept_map(map);
    let engine = engine_with_config(&config, generator, &clock);

    let err = engine.build("Rust").await.unwrap_err();
    assert_eq!(err.kind(), "prerequisite_cycle");
    assert!(!engine.store().exists());
}
