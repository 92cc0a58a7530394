//! OpenAI-compatible chat-completions content generator.
//!
//! Every call sends one system prompt and one user message, asks for a JSON object
//! answer and decodes it into the matching content type. Transient HTTP failures are
//! retried with exponential backoff.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::{debug, warn};

use super::{
    BloomAssessment, ConceptMap, ContentGenerator, FeynmanAssessment, GeneratorError,
    StudyMaterial,
};
use crate::config::GeneratorConfig;
use crate::learning::types::BloomLevel;

const BASE_BACKOFF_MS: u64 = 200;

const CONCEPT_MAP_PROMPT: &str = "Role: Knowledge Architect. Break the topic into atomic, \
learnable concepts. Answer with a JSON object with keys: topic (string), concepts (list of \
concept names), descriptions (object: concept -> one-sentence description), \
prerequisites_map (object: concept -> list of prerequisite concept names taken from \
concepts), learning_order (list of concept names), difficulty_levels (object: concept -> \
integer 1-5).";

const STUDY_PROMPT: &str = "Create multi-modal study material. Answer with a JSON object \
with keys: verbal_explanation (string), key_points (3-5 strings), visual_description \
(what a diagram would show), mermaid_diagram (Mermaid source), code_example (working code \
with comments), real_world_analogy (string), common_mistakes (list of strings), \
practice_questions (2-3 strings).";

const FEYNMAN_PROMPT: &str = "Role: Expert Educator. Assess the student's explanation on \
accuracy, clarity, completeness and depth, each an integer 0-10. Answer with a JSON object \
with keys: accuracy_score, clarity_score, completeness_score, depth_score, gaps (list), \
misconceptions (list), strengths (list), feedback (string), suggested_topics (list).";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

impl ChatResponse {
    fn first_content(&self) -> Option<&str> {
        self.choices.first().map(|c| c.message.content.as_str())
    }
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Clone)]
pub struct LlmContentGenerator {
    api_key: Option<String>,
    model: String,
    api_endpoint: String,
    max_retries: usize,
    client: reqwest::Client,
}

impl LlmContentGenerator {
    pub fn new(config: &GeneratorConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
            model: config.model.clone(),
            api_endpoint: config.api_endpoint.trim().trim_end_matches('/').to_string(),
            max_retries: config.max_retries,
            client,
        }
    }

    pub fn is_available(&self) -> bool {
        self.api_key.is_some() && !self.model.trim().is_empty()
    }

    /// Send one system/user exchange and decode the answer as `T`.
    async fn complete_json<T: DeserializeOwned>(
        &self,
        system: &str,
        user: &str,
    ) -> Result<T, GeneratorError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            GeneratorError::NotConfigured("no API key (set SYNAPTIC_API_KEY)".into())
        })?;

        let url = format!("{}/chat/completions", self.api_endpoint);
        let payload = serde_json::json!({
            "model": self.model,
            "messages": [
                ChatMessage { role: "system".into(), content: system.into() },
                ChatMessage { role: "user".into(), content: user.into() },
            ],
            "response_format": { "type": "json_object" },
            "stream": false
        });

        let response = self.post_with_retry(&url, api_key, &payload).await?;
        let content = response
            .first_content()
            .filter(|c| !c.trim().is_empty())
            .ok_or(GeneratorError::EmptyResponse)?;

        debug!(model = %self.model, len = content.len(), "generator answered");
        Ok(serde_json::from_str(extract_json(content))?)
    }

    async fn post_with_retry(
        &self,
        url: &str,
        api_key: &str,
        payload: &serde_json::Value,
    ) -> Result<ChatResponse, GeneratorError> {
        let mut retry = 0;
        loop {
            let err = match self
                .client
                .post(url)
                .bearer_auth(api_key)
                .json(payload)
                .send()
                .await
            {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        let bytes = resp.bytes().await?;
                        return Ok(serde_json::from_slice(&bytes)?);
                    }
                    let body = resp.text().await.unwrap_or_default();
                    let err = GeneratorError::HttpStatus { status, body };
                    if !is_retryable(status) {
                        return Err(err);
                    }
                    err
                }
                Err(e) => GeneratorError::Request(e),
            };

            if retry >= self.max_retries {
                return Err(err);
            }
            let backoff = Duration::from_millis(BASE_BACKOFF_MS << retry.min(10));
            warn!(retry, error = %err, "generator request failed, retrying");
            sleep(backoff).await;
            retry += 1;
        }
    }
}

impl ContentGenerator for LlmContentGenerator {
    async fn concept_map(&self, topic: &str) -> Result<ConceptMap, GeneratorError> {
        let mut map: ConceptMap = self
            .complete_json(CONCEPT_MAP_PROMPT, &format!("Create a knowledge graph for: {topic}"))
            .await?;
        if map.topic.trim().is_empty() {
            map.topic = topic.to_string();
        }
        map.validate()?;
        Ok(map)
    }

    async fn study_material(&self, concept: &str) -> Result<StudyMaterial, GeneratorError> {
        let material: StudyMaterial = self
            .complete_json(STUDY_PROMPT, &format!("Create study material for: {concept}"))
            .await?;
        material.validate()?;
        Ok(material)
    }

    async fn assess_explanation(
        &self,
        concept: &str,
        explanation: &str,
    ) -> Result<FeynmanAssessment, GeneratorError> {
        let user = format!(
            "CONCEPT: {concept}\n\nSTUDENT EXPLANATION:\n{explanation}\n\nAssess this explanation."
        );
        self.complete_json(FEYNMAN_PROMPT, &user).await
    }

    async fn bloom_questions(
        &self,
        concept: &str,
        level: BloomLevel,
    ) -> Result<BloomAssessment, GeneratorError> {
        let system = bloom_prompt(level);
        let mut assessment: BloomAssessment = self
            .complete_json(
                &system,
                &format!("Create Bloom level {} questions for: {concept}", level.level()),
            )
            .await?;
        assessment.validate()?;
        if assessment.concept.trim().is_empty() {
            assessment.concept = concept.to_string();
        }
        assessment.current_level = level.level();
        Ok(assessment)
    }
}

fn bloom_prompt(level: BloomLevel) -> String {
    format!(
        "Generate Bloom level {} ({level}) questions using the verbs: {}. Create 3 deep \
         questions. Answer with a JSON object with keys: concept (string), current_level \
         (integer), questions (list of objects with question, bloom_level, cognitive_verb, \
         expected_answer, scoring_rubric, hints), level_justification (string).",
        level.level(),
        level.verbs().join(", "),
    )
}

/// Strip Markdown code fences and any prose around the outermost JSON object.
fn extract_json(content: &str) -> &str {
    let trimmed = content.trim();
    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => &trimmed[start..=end],
        _ => trimmed,
    }
}

fn is_retryable(status: reqwest::StatusCode) -> bool {
    status == reqwest::StatusCode::TOO_MANY_REQUESTS
        || status == reqwest::StatusCode::REQUEST_TIMEOUT
        || status.is_server_error()
}
