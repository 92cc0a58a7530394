#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, TimeZone, Utc};
use tempfile::TempDir;

use synaptic::config::SynapticConfig;
use synaptic::engine::Engine;
use synaptic::generator::{
    BloomAssessment, BloomQuestion, ConceptMap, ContentGenerator, FeynmanAssessment,
    GeneratorError, StudyMaterial,
};
use synaptic::learning::BloomLevel;

/// In-process generator that replays canned answers. A missing answer fails the call.
#[derive(Default)]
pub struct ScriptedGenerator {
    concept_map: Mutex<Option<ConceptMap>>,
    pub study: Option<StudyMaterial>,
    pub assessment: Option<FeynmanAssessment>,
    pub bloom: Option<BloomAssessment>,
    calls: AtomicUsize,
}

impl ScriptedGenerator {
    /// Answers every call with the fixtures below.
    pub fn full() -> Self {
        Self {
            concept_map: Mutex::new(Some(rust_concept_map())),
            study: Some(study_material()),
            assessment: Some(feynman_assessment()),
            bloom: Some(bloom_assessment()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Fails every call.
    pub fn failing() -> Self {
        Self::default()
    }

    pub fn set_concept_map(&self, map: ConceptMap) {
        *self.concept_map.lock().unwrap() = Some(map);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn answer<T: Clone>(&self, value: &Option<T>) -> Result<T, GeneratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        value.clone().ok_or(GeneratorError::EmptyResponse)
    }
}

impl ContentGenerator for ScriptedGenerator {
    async fn concept_map(&self, topic: &str) -> Result<ConceptMap, GeneratorError> {
        let map = self.concept_map.lock().unwrap().clone();
        let mut map = self.answer(&map)?;
        map.topic = topic.to_string();
        Ok(map)
    }

    async fn study_material(&self, _concept: &str) -> Result<StudyMaterial, GeneratorError> {
        self.answer(&self.study)
    }

    async fn assess_explanation(
        &self,
        _concept: &str,
        _explanation: &str,
    ) -> Result<FeynmanAssessment, GeneratorError> {
        self.answer(&self.assessment)
    }

    async fn bloom_questions(
        &self,
        concept: &str,
        level: BloomLevel,
    ) -> Result<BloomAssessment, GeneratorError> {
        let mut assessment = self.answer(&self.bloom)?;
        assessment.concept = concept.to_string();
        assessment.current_level = level.level();
        Ok(assessment)
    }
}

/// Manually advanced clock shared with an engine.
#[derive(Clone)]
pub struct TestClock(Arc<Mutex<DateTime<Utc>>>);

impl TestClock {
    pub fn new() -> Self {
        let start = Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap();
        Self(Arc::new(Mutex::new(start)))
    }

    pub fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }

    pub fn advance_days(&self, days: i64) {
        *self.0.lock().unwrap() += Duration::days(days);
    }
}

pub fn test_config(dir: &TempDir) -> SynapticConfig {
    SynapticConfig::default().with_data_dir(dir.path())
}

/// Engine on a fresh temp store, driven by `clock`.
pub fn test_engine(
    dir: &TempDir,
    generator: ScriptedGenerator,
    clock: &TestClock,
) -> Engine<ScriptedGenerator> {
    engine_with_config(&test_config(dir), generator, clock)
}

pub fn engine_with_config(
    config: &SynapticConfig,
    generator: ScriptedGenerator,
    clock: &TestClock,
) -> Engine<ScriptedGenerator> {
    let clock = clock.clone();
    Engine::new(config, generator).with_clock(move || clock.now())
}

/// Ownership (c000) <- Borrowing (c001) <- Lifetimes (c002).
pub fn rust_concept_map() -> ConceptMap {
    let concepts = ["Ownership", "Borrowing", "Lifetimes"];
    ConceptMap {
        topic: "Rust".into(),
        concepts: concepts.iter().map(|c| c.to_string()).collect(),
        descriptions: concepts
            .iter()
            .map(|c| (c.to_string(), format!("What {c} means")))
            .collect(),
        prerequisites_map: HashMap::from([
            ("Borrowing".to_string(), vec!["Ownership".to_string()]),
            ("Lifetimes".to_string(), vec!["Borrowing".to_string()]),
        ]),
        learning_order: concepts.iter().map(|c| c.to_string()).collect(),
        difficulty_levels: HashMap::from([
            ("Ownership".to_string(), 1),
            ("Borrowing".to_string(), 2),
            ("Lifetimes".to_string(), 5),
        ]),
    }
}

/// A flat map of `n` independent concepts named `Concept 0..n`.
pub fn flat_concept_map(n: usize) -> ConceptMap {
    let concepts: Vec<String> = (0..n).map(|i| format!("Concept {i}")).collect();
    ConceptMap {
        topic: "Flat".into(),
        learning_order: concepts.clone(),
        concepts,
        ..ConceptMap::default()
    }
}

pub fn study_material() -> StudyMaterial {
    StudyMaterial {
        verbal_explanation: "Each value has a single owner.".into(),
        key_points: vec!["One owner".into(), "Dropped at scope end".into()],
        visual_description: "Boxes with arrows".into(),
        mermaid_diagram: "graph LR; a-->b".into(),
        code_example: "let s = String::new();".into(),
        real_world_analogy: "A library book".into(),
        common_mistakes: vec!["Using a moved value".into()],
        practice_questions: vec!["What happens on move?".into()],
    }
}

pub fn feynman_assessment() -> FeynmanAssessment {
    FeynmanAssessment {
        accuracy_score: 8,
        clarity_score: 7,
        completeness_score: 6,
        depth_score: 5,
        gaps: vec!["Drop order".into()],
        feedback: "Mention what happens at scope end.".into(),
        ..FeynmanAssessment::default()
    }
}

pub fn bloom_assessment() -> BloomAssessment {
    BloomAssessment {
        questions: vec![BloomQuestion {
            question: "Define ownership.".into(),
            bloom_level: 1,
            cognitive_verb: "define".into(),
            expected_answer: "Each value has one owner.".into(),
            scoring_rubric: "Mentions single owner".into(),
            hints: vec!["Think about scope".into()],
        }],
        level_justification: "New concept".into(),
        ..BloomAssessment::default()
    }
}
