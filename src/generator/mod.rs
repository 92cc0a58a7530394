//! Content-generation collaborator.
//!
//! The engine never produces study content itself. It asks a [`ContentGenerator`]
//! for a concept map, study material, a Feynman assessment or Bloom questions and
//! receives structured values back. [`http::LlmContentGenerator`] is the shipped
//! implementation, created via [`create_generator`] from configuration.

pub mod http;

use std::collections::HashMap;
use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::GeneratorConfig;
use crate::learning::types::BloomLevel;

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("content generator not configured: {0}")]
    NotConfigured(String),
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("HTTP {status}: {body}")]
    HttpStatus {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("JSON decode failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("empty response")]
    EmptyResponse,
    #[error("malformed content: {0}")]
    Malformed(String),
}

/// Topic decomposition returned for `build`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConceptMap {
    #[serde(default)]
    pub topic: String,
    pub concepts: Vec<String>,
    #[serde(default)]
    pub descriptions: HashMap<String, String>,
    /// Concept name to prerequisite concept names.
    #[serde(default)]
    pub prerequisites_map: HashMap<String, Vec<String>>,
    #[serde(default)]
    pub learning_order: Vec<String>,
    /// 1-5 difficulty per concept name.
    #[serde(default)]
    pub difficulty_levels: HashMap<String, u8>,
}

impl ConceptMap {
    pub fn validate(&self) -> Result<(), GeneratorError> {
        if self.concepts.iter().all(|c| c.trim().is_empty()) {
            return Err(GeneratorError::Malformed("concept map has no concepts".into()));
        }
        Ok(())
    }
}

/// Dual-coded study guide for one concept.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudyMaterial {
    pub verbal_explanation: String,
    pub key_points: Vec<String>,
    pub visual_description: String,
    pub mermaid_diagram: String,
    pub code_example: String,
    pub real_world_analogy: String,
    pub common_mistakes: Vec<String>,
    pub practice_questions: Vec<String>,
}

impl StudyMaterial {
    pub fn validate(&self) -> Result<(), GeneratorError> {
        if self.verbal_explanation.trim().is_empty() {
            return Err(GeneratorError::Malformed("study material has no explanation".into()));
        }
        Ok(())
    }
}

/// Scores run 0-10. Out-of-range values are clamped when averaged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeynmanAssessment {
    pub accuracy_score: u8,
    pub clarity_score: u8,
    pub completeness_score: u8,
    pub depth_score: u8,
    #[serde(default)]
    pub gaps: Vec<String>,
    #[serde(default)]
    pub misconceptions: Vec<String>,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub feedback: String,
    #[serde(default)]
    pub suggested_topics: Vec<String>,
}

impl FeynmanAssessment {
    pub const MAX_SCORE: u8 = 10;

    /// Mean of the four dimension scores.
    pub fn average(&self) -> f64 {
        let scores = [
            self.accuracy_score,
            self.clarity_score,
            self.completeness_score,
            self.depth_score,
        ];
        let sum: u32 = scores
            .iter()
            .map(|s| u32::from((*s).min(Self::MAX_SCORE)))
            .sum();
        f64::from(sum) / scores.len() as f64
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BloomQuestion {
    pub question: String,
    pub bloom_level: u8,
    pub cognitive_verb: String,
    pub expected_answer: String,
    pub scoring_rubric: String,
    pub hints: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BloomAssessment {
    #[serde(default)]
    pub concept: String,
    #[serde(default)]
    pub current_level: u8,
    pub questions: Vec<BloomQuestion>,
    #[serde(default)]
    pub level_justification: String,
}

impl BloomAssessment {
    pub fn validate(&self) -> Result<(), GeneratorError> {
        if self.questions.is_empty() {
            return Err(GeneratorError::Malformed("assessment has no questions".into()));
        }
        Ok(())
    }
}

/// Produces structured study content for the engine.
///
/// Calls may suspend; they are the only suspension points in an engine operation.
/// Returned futures must be `Send` so the engine can run inside the MCP server.
pub trait ContentGenerator: Send + Sync {
    fn concept_map(
        &self,
        topic: &str,
    ) -> impl Future<Output = Result<ConceptMap, GeneratorError>> + Send;

    fn study_material(
        &self,
        concept: &str,
    ) -> impl Future<Output = Result<StudyMaterial, GeneratorError>> + Send;

    /// Score a learner's plain-language explanation of `concept`.
    fn assess_explanation(
        &self,
        concept: &str,
        explanation: &str,
    ) -> impl Future<Output = Result<FeynmanAssessment, GeneratorError>> + Send;

    fn bloom_questions(
        &self,
        concept: &str,
        level: BloomLevel,
    ) -> impl Future<Output = Result<BloomAssessment, GeneratorError>> + Send;
}

/// Create a content generator from config.
///
/// Currently only `"openai"` (any OpenAI-compatible chat-completions endpoint) is
/// supported. A missing API key is not an error here; calls fail with
/// [`GeneratorError::NotConfigured`] instead so offline commands keep working.
pub fn create_generator(
    config: &GeneratorConfig,
) -> Result<http::LlmContentGenerator, GeneratorError> {
    match config.provider.as_str() {
        "openai" => Ok(http::LlmContentGenerator::new(config)),
        other => Err(GeneratorError::NotConfigured(format!(
            "unknown generator provider: {other}. Supported: openai"
        ))),
    }
}
