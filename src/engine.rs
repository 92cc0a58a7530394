//! Session and review orchestration.
//!
//! [`Engine`] is the facade every outer surface talks to. Each operation validates
//! its input, loads the node store, calls the content generator if it needs one,
//! mutates at most the nodes it addresses and persists the whole store before
//! returning. A failure at any step leaves the persisted store untouched.
//! Study events are appended to the analytics log afterwards; a failed append is
//! logged and does not fail the operation.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::SynapticConfig;
use crate::error::EngineError;
use crate::generator::{
    BloomAssessment, ContentGenerator, FeynmanAssessment, GeneratorError, StudyMaterial,
};
use crate::learning::graph::{self, DroppedPrerequisite, IngestOptions};
use crate::learning::promotion::{self, PromotionOutcome};
use crate::learning::stats::{self, GraphStats};
use crate::learning::types::{KnowledgeNode, Quality};
use crate::learning::{KnowledgeTracer, Scheduler, Sequencer};
use crate::report::{self, MarkdownRenderer, ReportRenderer};
use crate::store::analytics::{self, Activity, AnalyticsLog, Insights, StudyEvent};
use crate::store::{KnowledgeStore, NodeMap};

type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Bloom level recorded for Feynman explanations.
const FEYNMAN_BLOOM_LEVEL: u8 = 2;

/// The closed set of engine operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    Build { topic: String },
    Review { concept_id: String, quality: i64 },
    Due,
    Session { length: Option<usize> },
    Promote { concept_id: String },
    Study { concept_id: String },
    /// Feynman check of a free-text explanation.
    Test { concept: String, explanation: String },
    Bloom { concept_id: String },
    Insights,
    Stats,
    Inspect { concept_id: String },
}

impl Command {
    pub fn operation(&self) -> &'static str {
        match self {
            Self::Build { .. } => "build",
            Self::Review { .. } => "review",
            Self::Due => "due",
            Self::Session { .. } => "session",
            Self::Promote { .. } => "promote",
            Self::Study { .. } => "study",
            Self::Test { .. } => "test",
            Self::Bloom { .. } => "bloom",
            Self::Insights => "insights",
            Self::Stats => "stats",
            Self::Inspect { .. } => "inspect",
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "operation", content = "result", rename_all = "snake_case")]
pub enum Outcome {
    Build(BuildOutcome),
    Review(ReviewOutcome),
    Due(Vec<DueConcept>),
    Session(Vec<SessionItem>),
    Promote(PromotionOutcome),
    Study(StudyOutcome),
    Test(FeynmanOutcome),
    Bloom(BloomOutcome),
    Insights(InsightsOutcome),
    Stats(GraphStats),
    Inspect(NodeDetail),
}

#[derive(Debug, Clone, Serialize)]
pub struct ConceptSummary {
    pub concept_id: String,
    pub name: String,
    pub bloom_level: u8,
    pub prerequisites: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct BuildOutcome {
    pub topic: String,
    /// Every node the concept map named, new or reused, in map order.
    pub concepts: Vec<ConceptSummary>,
    pub created: Vec<String>,
    pub reused: Vec<String>,
    pub learning_order: Vec<String>,
    pub dropped_prerequisites: Vec<DroppedPrerequisite>,
    pub broken_cycles: Vec<Vec<String>>,
    pub report: PathBuf,
}

#[derive(Debug, Serialize)]
pub struct ReviewOutcome {
    pub concept_id: String,
    pub name: String,
    pub quality: u8,
    pub p_know: f64,
    pub confidence: f64,
    pub mastery: f64,
    pub ease_factor: f64,
    pub interval_days: f64,
    pub repetitions: u32,
    pub lapses: u32,
    pub next_review: Option<DateTime<Utc>>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DueConcept {
    pub concept_id: String,
    pub name: String,
    pub days_overdue: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionItem {
    pub concept_id: String,
    pub name: String,
    pub p_know: f64,
    pub bloom_level: u8,
}

#[derive(Debug, Serialize)]
pub struct StudyOutcome {
    pub concept_id: String,
    pub name: String,
    pub study_count: u32,
    pub total_study_minutes: u32,
    pub material: StudyMaterial,
    pub report: PathBuf,
}

#[derive(Debug, Serialize)]
pub struct FeynmanOutcome {
    pub concept: String,
    pub average_score: f64,
    pub assessment: FeynmanAssessment,
    pub report: PathBuf,
}

#[derive(Debug, Serialize)]
pub struct BloomOutcome {
    pub concept_id: String,
    pub name: String,
    pub bloom_level: u8,
    pub bloom_name: &'static str,
    pub assessment: BloomAssessment,
    pub report: PathBuf,
}

#[derive(Debug, Serialize)]
pub struct InsightsOutcome {
    pub insights: Insights,
    /// Written only once enough sessions are recorded.
    pub report: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
pub struct NodeDetail {
    pub node: KnowledgeNode,
    pub retention: f64,
    pub prereqs_met: bool,
    pub due: bool,
}

pub struct Engine<G> {
    store: KnowledgeStore,
    analytics: AnalyticsLog,
    generator: G,
    renderer: Box<dyn ReportRenderer>,
    tracer: KnowledgeTracer,
    scheduler: Scheduler,
    sequencer: Sequencer,
    ingest: IngestOptions,
    due_limit: usize,
    default_session_length: usize,
    promotion_threshold: f64,
    study_minutes: u32,
    min_sessions_for_insights: usize,
    clock: Clock,
}

impl<G: ContentGenerator> Engine<G> {
    pub fn new(config: &SynapticConfig, generator: G) -> Self {
        Self {
            store: KnowledgeStore::new(config.graph_path()),
            analytics: AnalyticsLog::new(config.analytics_path()),
            generator,
            renderer: Box::new(MarkdownRenderer::new(config.reports_path())),
            tracer: KnowledgeTracer::from_config(&config.tracer),
            scheduler: Scheduler::from_config(&config.scheduler),
            sequencer: Sequencer::from_config(&config.sequencer),
            ingest: IngestOptions {
                p_init: config.tracer.p_init,
                max_initial_bloom: config.graph.max_initial_bloom,
                default_ease: config.scheduler.default_ease,
                reject_cycles: config.graph.reject_cycles,
            },
            due_limit: config.scheduler.due_limit,
            default_session_length: config.sequencer.default_session_length,
            promotion_threshold: config.promotion.p_know_threshold,
            study_minutes: config.analytics.study_minutes,
            min_sessions_for_insights: config.analytics.min_sessions_for_insights,
            clock: Arc::new(Utc::now),
        }
    }

    pub fn with_renderer(mut self, renderer: Box<dyn ReportRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    /// Replace the wall clock, e.g. to replay reviews at fixed times.
    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn store(&self) -> &KnowledgeStore {
        &self.store
    }

    pub fn analytics(&self) -> &AnalyticsLog {
        &self.analytics
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    /// Dispatch one [`Command`].
    pub async fn execute(&self, command: Command) -> Result<Outcome, EngineError> {
        match command {
            Command::Build { topic } => self.build(&topic).await.map(Outcome::Build),
            Command::Review {
                concept_id,
                quality,
            } => {
                let quality = Quality::try_from(quality)?;
                self.review(&concept_id, quality).map(Outcome::Review)
            }
            Command::Due => self.due().map(Outcome::Due),
            Command::Session { length } => self
                .session(length.unwrap_or(self.default_session_length))
                .map(Outcome::Session),
            Command::Promote { concept_id } => self.promote(&concept_id).map(Outcome::Promote),
            Command::Study { concept_id } => self.study(&concept_id).await.map(Outcome::Study),
            Command::Test {
                concept,
                explanation,
            } => self.test(&concept, &explanation).await.map(Outcome::Test),
            Command::Bloom { concept_id } => self.bloom(&concept_id).await.map(Outcome::Bloom),
            Command::Insights => self.insights().map(Outcome::Insights),
            Command::Stats => self.stats().map(Outcome::Stats),
            Command::Inspect { concept_id } => self.inspect(&concept_id).map(Outcome::Inspect),
        }
    }

    /// Generate a concept map for `topic` and merge it into the store.
    pub async fn build(&self, topic: &str) -> Result<BuildOutcome, EngineError> {
        let topic = non_empty("topic", topic)?;
        info!(topic, "building knowledge graph");

        let mut nodes = self.store.load()?;
        let mut map = self
            .generator
            .concept_map(topic)
            .await
            .and_then(|m| m.validate().map(|()| m))
            .map_err(dependency("build"))?;
        if map.topic.trim().is_empty() {
            map.topic = topic.to_string();
        }

        let ingest = graph::ingest(&mut nodes, &map, &self.ingest)?;
        let report = self
            .renderer
            .render(&report::knowledge_graph_report(&map, &ingest))?;
        self.store.persist(&nodes)?;

        let concepts = ingest
            .reused
            .iter()
            .chain(&ingest.created)
            .filter_map(|id| nodes.get(id))
            .map(|n| ConceptSummary {
                concept_id: n.concept_id.clone(),
                name: n.name.clone(),
                bloom_level: n.bloom_level,
                prerequisites: n.prerequisites.clone(),
            })
            .collect::<Vec<_>>();

        info!(
            topic = %map.topic,
            created = ingest.created.len(),
            reused = ingest.reused.len(),
            broken_cycles = ingest.broken_cycles.len(),
            "knowledge graph built"
        );

        Ok(BuildOutcome {
            topic: map.topic,
            concepts,
            created: ingest.created,
            reused: ingest.reused,
            learning_order: map.learning_order,
            dropped_prerequisites: ingest.dropped_prerequisites,
            broken_cycles: ingest.broken_cycles,
            report,
        })
    }

    /// Record one recall attempt: knowledge-trace update, then reschedule.
    pub fn review(&self, concept_id: &str, quality: Quality) -> Result<ReviewOutcome, EngineError> {
        let now = self.now();
        let mut nodes = self.store.load()?;
        let node = nodes
            .get_mut(concept_id)
            .ok_or_else(|| EngineError::not_found(concept_id))?;

        let (p_know, confidence) = self.tracer.update(node.p_know, quality.is_correct());
        node.p_know = p_know;
        self.scheduler.schedule(node, quality, now);

        let outcome = ReviewOutcome {
            concept_id: node.concept_id.clone(),
            name: node.name.clone(),
            quality: quality.get(),
            p_know: node.p_know,
            confidence,
            mastery: node.mastery,
            ease_factor: node.ease_factor,
            interval_days: node.interval_days,
            repetitions: node.repetitions,
            lapses: node.lapses,
            next_review: node.next_review,
            message: format!(
                "Reviewed {}, new mastery: {:.0}%, next review: {}",
                node.name,
                node.p_know * 100.0,
                node.next_review
                    .map_or_else(|| "-".to_string(), |t| t.format("%Y-%m-%d").to_string())
            ),
        };
        let bloom_level = node.bloom_level;

        self.store.persist(&nodes)?;
        info!(
            concept_id,
            quality = quality.get(),
            p_know = outcome.p_know,
            interval_days = outcome.interval_days,
            "review recorded"
        );

        self.record(StudyEvent::new(
            &outcome.name,
            Activity::Review,
            f64::from(quality.get()) * 2.0,
            bloom_level,
            self.study_minutes,
            now,
        ));
        Ok(outcome)
    }

    /// Concepts due for review, most overdue first, capped at the configured limit.
    pub fn due(&self) -> Result<Vec<DueConcept>, EngineError> {
        let nodes = self.store.load()?;
        let due = self
            .scheduler
            .due_with_overdue(&nodes, self.now())
            .into_iter()
            .take(self.due_limit)
            .filter_map(|(id, days_overdue)| {
                nodes.get(&id).map(|n| DueConcept {
                    concept_id: id.clone(),
                    name: n.name.clone(),
                    days_overdue,
                })
            })
            .collect();
        Ok(due)
    }

    /// An interleaved study session of at most `length` concepts.
    pub fn session(&self, length: usize) -> Result<Vec<SessionItem>, EngineError> {
        self.session_with_rng(length, &mut rand::rng())
    }

    pub fn session_with_rng<R: Rng + ?Sized>(
        &self,
        length: usize,
        rng: &mut R,
    ) -> Result<Vec<SessionItem>, EngineError> {
        if length == 0 {
            return Err(EngineError::validation("length", "session length must be at least 1"));
        }
        let nodes = self.store.load()?;
        let sequence =
            self.sequencer
                .sequence_with_rng(&nodes, &self.scheduler, length, self.now(), rng);

        info!(requested = length, planned = sequence.len(), "session planned");
        Ok(session_items(&nodes, &sequence))
    }

    pub fn promote(&self, concept_id: &str) -> Result<PromotionOutcome, EngineError> {
        let mut nodes = self.store.load()?;
        let node = nodes
            .get_mut(concept_id)
            .ok_or_else(|| EngineError::not_found(concept_id))?;

        let outcome = promotion::promote(node, self.promotion_threshold);
        if outcome.promoted {
            self.store.persist(&nodes)?;
            info!(concept_id, bloom_level = outcome.bloom_level, "concept promoted");
        } else {
            info!(concept_id, "promotion not eligible");
        }
        Ok(outcome)
    }

    /// Generate and render a study guide for one concept.
    pub async fn study(&self, concept_id: &str) -> Result<StudyOutcome, EngineError> {
        let name = self.node_name(concept_id)?;
        info!(concept_id, name = %name, "generating study material");

        let material = self
            .generator
            .study_material(&name)
            .await
            .map_err(dependency("study"))?;
        let report = self
            .renderer
            .render(&report::study_guide_report(concept_id, &name, &material))?;

        let now = self.now();
        let mut nodes = self.store.load()?;
        let node = nodes
            .get_mut(concept_id)
            .ok_or_else(|| EngineError::not_found(concept_id))?;
        node.study_count += 1;
        node.total_study_minutes += self.study_minutes;
        let (study_count, total_study_minutes) = (node.study_count, node.total_study_minutes);
        let event = StudyEvent::new(
            &node.name,
            Activity::Study,
            node.p_know * 10.0,
            node.bloom_level,
            self.study_minutes,
            now,
        );
        self.store.persist(&nodes)?;
        self.record(event);

        Ok(StudyOutcome {
            concept_id: concept_id.to_string(),
            name,
            study_count,
            total_study_minutes,
            material,
            report,
        })
    }

    /// Feynman check: score a plain-language explanation.
    ///
    /// `concept` may be a concept id or free text. No node is mutated.
    pub async fn test(&self, concept: &str, explanation: &str) -> Result<FeynmanOutcome, EngineError> {
        let concept = non_empty("concept", concept)?;
        let explanation = non_empty("explanation", explanation)?;

        let nodes = self.store.load()?;
        let concept = nodes
            .get(concept)
            .map_or_else(|| concept.to_string(), |n| n.name.clone());
        info!(concept = %concept, len = explanation.len(), "assessing explanation");

        let assessment = self
            .generator
            .assess_explanation(&concept, explanation)
            .await
            .map_err(dependency("test"))?;
        let average_score = assessment.average();

        let now = self.now();
        let report = self
            .renderer
            .render(&report::feynman_report(&concept, explanation, &assessment, now))?;
        self.record(StudyEvent::new(
            &concept,
            Activity::Feynman,
            average_score,
            FEYNMAN_BLOOM_LEVEL,
            self.study_minutes,
            now,
        ));

        Ok(FeynmanOutcome {
            concept,
            average_score,
            assessment,
            report,
        })
    }

    /// Assessment questions at the concept's current Bloom level.
    pub async fn bloom(&self, concept_id: &str) -> Result<BloomOutcome, EngineError> {
        let nodes = self.store.load()?;
        let node = nodes
            .get(concept_id)
            .ok_or_else(|| EngineError::not_found(concept_id))?;
        let level = node.bloom();
        let name = node.name.clone();
        info!(concept_id, level = level.level(), "generating bloom questions");

        let assessment = self
            .generator
            .bloom_questions(&name, level)
            .await
            .and_then(|a| a.validate().map(|()| a))
            .map_err(dependency("bloom"))?;

        let now = self.now();
        let report = self
            .renderer
            .render(&report::bloom_report(concept_id, &name, level, &assessment))?;
        self.record(StudyEvent::new(
            &name,
            Activity::Bloom,
            f64::from(level.level()) * 2.0,
            level.level(),
            self.study_minutes,
            now,
        ));

        Ok(BloomOutcome {
            concept_id: concept_id.to_string(),
            name,
            bloom_level: level.level(),
            bloom_name: level.as_str(),
            assessment,
            report,
        })
    }

    pub fn insights(&self) -> Result<InsightsOutcome, EngineError> {
        let events = self.analytics.load()?;
        let insights = analytics::summarize(&events, self.min_sessions_for_insights);
        let report = match &insights {
            Insights::Ready(summary) => Some(
                self.renderer
                    .render(&report::insights_report(summary, self.now()))?,
            ),
            Insights::NeedMoreSessions { .. } => None,
        };
        info!(events = events.len(), ready = report.is_some(), "insights computed");
        Ok(InsightsOutcome { insights, report })
    }

    pub fn stats(&self) -> Result<GraphStats, EngineError> {
        let nodes = self.store.load()?;
        Ok(stats::graph_stats(
            &nodes,
            &self.scheduler,
            self.now(),
            Some(self.store.path()),
        ))
    }

    pub fn inspect(&self, concept_id: &str) -> Result<NodeDetail, EngineError> {
        let mut nodes = self.store.load()?;
        let now = self.now();
        let node = nodes
            .get(concept_id)
            .ok_or_else(|| EngineError::not_found(concept_id))?;
        let retention = self.scheduler.calculate_retention(node, now);
        let prereqs_met = self.sequencer.prereqs_met(node, &nodes);
        let due = node.repetitions == 0 || node.next_review.is_some_and(|t| now >= t);
        let node = nodes
            .remove(concept_id)
            .ok_or_else(|| EngineError::not_found(concept_id))?;
        Ok(NodeDetail {
            node,
            retention,
            prereqs_met,
            due,
        })
    }

    /// Every stored node, keyed by concept id.
    pub fn nodes(&self) -> Result<NodeMap, EngineError> {
        Ok(self.store.load()?)
    }

    /// Delete the knowledge graph and the analytics log.
    pub fn reset(&self) -> Result<(), EngineError> {
        self.store.clear()?;
        self.analytics.clear()?;
        warn!(path = %self.store.path().display(), "learning state reset");
        Ok(())
    }

    fn node_name(&self, concept_id: &str) -> Result<String, EngineError> {
        self.store
            .load()?
            .get(concept_id)
            .map(|n| n.name.clone())
            .ok_or_else(|| EngineError::not_found(concept_id))
    }

    fn record(&self, event: StudyEvent) {
        if let Err(e) = self.analytics.append(&event) {
            warn!(error = %e, activity = %event.activity, "failed to record study event");
        }
    }
}

fn session_items(nodes: &NodeMap, sequence: &[String]) -> Vec<SessionItem> {
    sequence
        .iter()
        .filter_map(|id| nodes.get(id))
        .map(|n| SessionItem {
            concept_id: n.concept_id.clone(),
            name: n.name.clone(),
            p_know: n.p_know,
            bloom_level: n.bloom_level,
        })
        .collect()
}

fn non_empty<'a>(field: &'static str, value: &'a str) -> Result<&'a str, EngineError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::validation(field, "must not be empty"));
    }
    Ok(trimmed)
}

fn dependency(operation: &'static str) -> impl Fn(GeneratorError) -> EngineError {
    move |source| {
        warn!(operation, error = %source, "content generator failed");
        EngineError::DependencyFailure { operation, source }
    }
}
