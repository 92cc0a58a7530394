//! MCP tool parameter definitions.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct BuildParams {
    #[schemars(description = "Topic to decompose into a knowledge graph, e.g. 'Rust ownership'")]
    pub topic: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ReviewParams {
    #[schemars(description = "Concept ID, e.g. 'c001'")]
    pub concept_id: String,

    #[schemars(
        description = "Recall quality 0-5: 0-2 failed (lapse), 3 hard, 4 good, 5 perfect"
    )]
    pub quality: i64,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SessionParams {
    #[schemars(description = "Maximum number of concepts in the session. Defaults to 5.")]
    pub length: Option<usize>,
}

/// Shared by every tool that addresses one concept.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ConceptParams {
    #[schemars(description = "Concept ID, e.g. 'c001'")]
    pub concept_id: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct FeynmanParams {
    #[schemars(description = "Concept name or ID being explained")]
    pub concept: String,

    #[schemars(description = "The learner's own plain-language explanation of the concept")]
    pub explanation: String,
}
