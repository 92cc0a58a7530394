mod helpers;

use helpers::{test_engine, ScriptedGenerator, TestClock};
use synaptic::engine::Command;
use synaptic::error::EngineError;
use synaptic::learning::Quality;
use synaptic::store::analytics::{Activity, Insights};

#[tokio::test]
async fn study_updates_counters_and_logs() {
    let dir = tempfile::tempdir().unwrap();
    let clock = TestClock::new();
    let engine = test_engine(&dir, ScriptedGenerator::full(), &clock);
    engine.build("Rust").await.unwrap();

    let outcome = engine.study("c000").await.unwrap();
    assert_eq!(outcome.name, "Ownership");
    assert_eq!(outcome.study_count, 1);
    assert_eq!(outcome.total_study_minutes, 5);
    let guide = std::fs::read_to_string(&outcome.report).unwrap();
    assert!(guide.contains("Each value has a single owner."));

    engine.study("c000").await.unwrap();
    let node = &engine.nodes().unwrap()["c000"];
    assert_eq!(node.study_count, 2);
    // studying never touches the scheduler
    assert!(node.review_history.is_empty());

    let events = engine.analytics().load().unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].activity, Activity::Study);
    assert!((events[0].score - 1.0).abs() < 1e-9);
}

#[tokio::test]
async fn failed_study_generation_changes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let clock = TestClock::new();
    let mut generator = ScriptedGenerator::full();
    generator.study = None;
    let engine = test_engine(&dir, generator, &clock);
    engine.build("Rust").await.unwrap();

    let err = engine.study("c000").await.unwrap_err();
    assert!(matches!(err, EngineError::DependencyFailure { operation: "study", .. }));
    assert_eq!(engine.nodes().unwrap()["c000"].study_count, 0);
    assert!(engine.analytics().load().unwrap().is_empty());
}

#[tokio::test]
async fn study_unknown_concept_skips_the_generator() {
    let dir = tempfile::tempdir().unwrap();
    let clock = TestClock::new();
    let engine = test_engine(&dir, ScriptedGenerator::full(), &clock);
    engine.build("Rust").await.unwrap();
    let calls = engine.generator().calls();

    assert_eq!(engine.study("c404").await.unwrap_err().kind(), "not_found");
    assert_eq!(engine.generator().calls(), calls);
}

#[tokio::test]
async fn feynman_test_scores_without_mutation() {
    let dir = tempfile::tempdir().unwrap();
    let clock = TestClock::new();
    let engine = test_engine(&dir, ScriptedGenerator::full(), &clock);
    engine.build("Rust").await.unwrap();
    let before = engine.nodes().unwrap();

    let outcome = engine
        .test("c001", "You lend a value without giving it away.")
        .await
        .unwrap();
    assert_eq!(outcome.concept, "Borrowing");
    assert_eq!(outcome.average_score, 6.5);
    assert!(outcome.report.exists());
    assert_eq!(engine.nodes().unwrap(), before);

    let events = engine.analytics().load().unwrap();
    assert_eq!(events[0].activity, Activity::Feynman);
    assert_eq!(events[0].bloom_level, 2);
    assert_eq!(events[0].score, 6.5);
}

#[tokio::test]
async fn feynman_test_needs_an_explanation() {
    let dir = tempfile::tempdir().unwrap();
    let clock = TestClock::new();
    let engine = test_engine(&dir, ScriptedGenerator::full(), &clock);

    let err = engine.test("Traits", "  ").await.unwrap_err();
    assert!(matches!(err, EngineError::Validation { field: "explanation", .. }));
}

#[tokio::test]
async fn bloom_questions_follow_the_node_level() {
    let dir = tempfile::tempdir().unwrap();
    let clock = TestClock::new();
    let engine = test_engine(&dir, ScriptedGenerator::full(), &clock);
    engine.build("Rust").await.unwrap();

    let outcome = engine.bloom("c001").await.unwrap();
    assert_eq!(outcome.bloom_level, 2);
    assert_eq!(outcome.bloom_name, "Understand");
    assert_eq!(outcome.assessment.current_level, 2);
    assert!(outcome.report.ends_with("Bloom_c001_Borrowing_L2.md"));

    let events = engine.analytics().load().unwrap();
    assert_eq!(events[0].activity, Activity::Bloom);
    assert_eq!(events[0].score, 4.0);
}

#[tokio::test]
async fn insights_need_enough_sessions() {
    let dir = tempfile::tempdir().unwrap();
    let clock = TestClock::new();
    let engine = test_engine(&dir, ScriptedGenerator::full(), &clock);
    engine.build("Rust").await.unwrap();

    let outcome = engine.insights().unwrap();
    assert!(matches!(
        outcome.insights,
        Insights::NeedMoreSessions { recorded: 0, remaining: 3 }
    ));
    assert!(outcome.report.is_none());

    engine.review("c000", Quality::new(5).unwrap()).unwrap();
    engine.study("c001").await.unwrap();
    engine.execute(Command::Bloom { concept_id: "c002".into() }).await.unwrap();

    let outcome = engine.insights().unwrap();
    let Insights::Ready(summary) = &outcome.insights else {
        panic!("expected insights after three sessions");
    };
    assert_eq!(summary.total_sessions, 3);
    assert_eq!(summary.total_minutes, 15);
    assert_eq!(summary.activity_counts.len(), 3);
    assert!(outcome.report.as_ref().is_some_and(|p| p.exists()));
}

#[tokio::test]
async fn stats_and_inspect_reflect_reviews() {
    let dir = tempfile::tempdir().unwrap();
    let clock = TestClock::new();
    let engine = test_engine(&dir, ScriptedGenerator::full(), &clock);
    engine.build("Rust").await.unwrap();
    engine.review("c000", Quality::new(4).unwrap()).unwrap();

    let stats = engine.stats().unwrap();
    assert_eq!(stats.total_concepts, 3);
    assert_eq!(stats.reviewed, 1);
    assert_eq!(stats.due_now, 2);
    assert!(stats.store_size_bytes > 0);

    let detail = engine.inspect("c001").unwrap();
    assert_eq!(detail.retention, 1.0);
    assert!(!detail.prereqs_met);
    assert!(detail.due);

    engine.reset().unwrap();
    assert!(!engine.store().exists());
    assert!(engine.analytics().load().unwrap().is_empty());
}
