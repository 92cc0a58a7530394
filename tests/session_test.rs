mod helpers;

use helpers::{flat_concept_map, test_engine, ScriptedGenerator, TestClock};
use rand::rngs::StdRng;
use rand::SeedableRng;
use synaptic::engine::{Command, Outcome};
use synaptic::learning::Quality;

#[tokio::test]
async fn new_concepts_are_due_and_reviewed_ones_wait() {
    let dir = tempfile::tempdir().unwrap();
    let clock = TestClock::new();
    let engine = test_engine(&dir, ScriptedGenerator::full(), &clock);
    engine.build("Rust").await.unwrap();

    let due: Vec<String> = engine.due().unwrap().into_iter().map(|d| d.concept_id).collect();
    assert_eq!(due, vec!["c000", "c001", "c002"]);

    engine.review("c000", Quality::new(5).unwrap()).unwrap();
    let due = engine.due().unwrap();
    assert!(due.iter().all(|d| d.concept_id != "c000"));

    clock.advance_days(3);
    let due = engine.due().unwrap();
    assert_eq!(due[0].concept_id, "c000");
    assert_eq!(due[0].days_overdue, 2);
}

#[tokio::test]
async fn due_list_is_capped() {
    let dir = tempfile::tempdir().unwrap();
    let clock = TestClock::new();
    let generator = ScriptedGenerator::full();
    generator.set_concept_map(flat_concept_map(14));
    let engine = test_engine(&dir, generator, &clock);
    engine.build("Flat").await.unwrap();

    assert_eq!(engine.due().unwrap().len(), 10);
}

#[tokio::test]
async fn session_respects_length() {
    let dir = tempfile::tempdir().unwrap();
    let clock = TestClock::new();
    let generator = ScriptedGenerator::full();
    generator.set_concept_map(flat_concept_map(8));
    let engine = test_engine(&dir, generator, &clock);
    engine.build("Flat").await.unwrap();

    for length in 1..=10 {
        let items = engine.session(length).unwrap();
        assert!(items.len() <= length);
        let mut ids: Vec<&str> = items.iter().map(|i| i.concept_id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), items.len(), "session repeats a concept");
    }
}

#[tokio::test]
async fn seeded_sessions_are_reproducible() {
    let dir = tempfile::tempdir().unwrap();
    let clock = TestClock::new();
    let generator = ScriptedGenerator::full();
    generator.set_concept_map(flat_concept_map(6));
    let engine = test_engine(&dir, generator, &clock);
    engine.build("Flat").await.unwrap();

    let a = engine.session_with_rng(3, &mut StdRng::seed_from_u64(11)).unwrap();
    let b = engine.session_with_rng(3, &mut StdRng::seed_from_u64(11)).unwrap();
    assert_eq!(a, b);
}

#[tokio::test]
async fn zero_length_session_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let clock = TestClock::new();
    let engine = test_engine(&dir, ScriptedGenerator::full(), &clock);

    let err = engine.session(0).unwrap_err();
    assert_eq!(err.kind(), "validation");
}

#[tokio::test]
async fn session_on_empty_store_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let clock = TestClock::new();
    let engine = test_engine(&dir, ScriptedGenerator::full(), &clock);

    let outcome = engine.execute(Command::Session { length: None }).await.unwrap();
    assert!(matches!(outcome, Outcome::Session(ref items) if items.is_empty()));
    assert!(!engine.store().exists());
}

#[tokio::test]
async fn huge_session_length_is_served_from_the_graph() {
    let dir = tempfile::tempdir().unwrap();
    let clock = TestClock::new();
    let engine = test_engine(&dir, ScriptedGenerator::full(), &clock);
    engine.build("Rust").await.unwrap();

    let items = engine.session(usize::MAX / 2).unwrap();
    assert_eq!(items.len(), 3);

    let outcome = engine
        .execute(Command::Session { length: Some(usize::MAX) })
        .await
        .unwrap();
    assert!(matches!(outcome, Outcome::Session(ref items) if items.len() == 3));
}
