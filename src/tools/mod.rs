pub mod params;

use std::sync::Arc;

use params::{BuildParams, ConceptParams, FeynmanParams, ReviewParams, SessionParams};
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::{tool, tool_handler, tool_router, ServerHandler};

use synaptic::engine::{Command, Engine};
use synaptic::generator::http::LlmContentGenerator;

/// The Synaptic MCP tool handler. Every tool maps to one engine [`Command`].
#[derive(Clone)]
pub struct StudyTools {
    tool_router: ToolRouter<Self>,
    engine: Arc<Engine<LlmContentGenerator>>,
}

#[tool_router]
impl StudyTools {
    pub fn new(engine: Arc<Engine<LlmContentGenerator>>) -> Self {
        Self {
            tool_router: Self::tool_router(),
            engine,
        }
    }

    /// Run one command and serialize the outcome, or a structured error.
    async fn dispatch(&self, command: Command) -> Result<String, String> {
        let operation = command.operation();
        tracing::info!(operation, "tool called");

        match self.engine.execute(command).await {
            Ok(outcome) => {
                serde_json::to_string(&outcome).map_err(|e| format!("serialization failed: {e}"))
            }
            Err(err) => {
                tracing::warn!(operation, error = %err, "tool failed");
                Err(serde_json::to_string(&err.to_report(operation))
                    .unwrap_or_else(|_| err.to_string()))
            }
        }
    }

    #[tool(description = "Build (or extend) the knowledge graph for a topic. Existing concepts keep their learning state; new ones get the next free ID.")]
    async fn build_graph(
        &self,
        Parameters(params): Parameters<BuildParams>,
    ) -> Result<String, String> {
        self.dispatch(Command::Build { topic: params.topic }).await
    }

    #[tool(description = "Record a review of a concept with recall quality 0-5. Updates mastery and schedules the next review.")]
    async fn review_concept(
        &self,
        Parameters(params): Parameters<ReviewParams>,
    ) -> Result<String, String> {
        self.dispatch(Command::Review {
            concept_id: params.concept_id,
            quality: params.quality,
        })
        .await
    }

    #[tool(description = "List concepts due for review, most overdue first.")]
    async fn due_concepts(&self) -> Result<String, String> {
        self.dispatch(Command::Due).await
    }

    #[tool(description = "Plan an interleaved study session balancing urgency, difficulty and prerequisite readiness.")]
    async fn plan_session(
        &self,
        Parameters(params): Parameters<SessionParams>,
    ) -> Result<String, String> {
        self.dispatch(Command::Session {
            length: params.length,
        })
        .await
    }

    #[tool(description = "Promote a concept to the next Bloom level if mastery exceeds 70%.")]
    async fn promote_concept(
        &self,
        Parameters(params): Parameters<ConceptParams>,
    ) -> Result<String, String> {
        self.dispatch(Command::Promote {
            concept_id: params.concept_id,
        })
        .await
    }

    #[tool(description = "Generate a study guide (explanation, key points, diagram, code, analogy, mistakes, practice questions) for a concept.")]
    async fn study_concept(
        &self,
        Parameters(params): Parameters<ConceptParams>,
    ) -> Result<String, String> {
        self.dispatch(Command::Study {
            concept_id: params.concept_id,
        })
        .await
    }

    #[tool(description = "Feynman test: score a plain-language explanation on accuracy, clarity, completeness and depth, and list gaps and misconceptions.")]
    async fn feynman_test(
        &self,
        Parameters(params): Parameters<FeynmanParams>,
    ) -> Result<String, String> {
        self.dispatch(Command::Test {
            concept: params.concept,
            explanation: params.explanation,
        })
        .await
    }

    #[tool(description = "Generate assessment questions at the concept's current Bloom level.")]
    async fn bloom_assessment(
        &self,
        Parameters(params): Parameters<ConceptParams>,
    ) -> Result<String, String> {
        self.dispatch(Command::Bloom {
            concept_id: params.concept_id,
        })
        .await
    }

    #[tool(description = "Summarize study history: best study hour, average score, activity breakdown, Bloom progression and recommendations.")]
    async fn learning_insights(&self) -> Result<String, String> {
        self.dispatch(Command::Insights).await
    }

    #[tool(description = "Get knowledge graph statistics: concept counts, due count, mean mastery and retention, Bloom level histogram.")]
    async fn graph_stats(&self) -> Result<String, String> {
        self.dispatch(Command::Stats).await
    }

    #[tool(description = "Inspect a concept by ID: full learning state, review history and current retention.")]
    async fn inspect_concept(
        &self,
        Parameters(params): Parameters<ConceptParams>,
    ) -> Result<String, String> {
        self.dispatch(Command::Inspect {
            concept_id: params.concept_id,
        })
        .await
    }
}

#[tool_handler]
impl ServerHandler for StudyTools {
    fn get_info(&self) -> rmcp::model::ServerInfo {
        rmcp::model::ServerInfo {
            instructions: Some(
                "Synaptic is an adaptive study engine. Use build_graph to map a topic, \
                 plan_session or due_concepts to pick what to study, and review_concept \
                 to record how well each concept was recalled."
                    .into(),
            ),
            capabilities: rmcp::model::ServerCapabilities::builder()
                .enable_tools()
                .build(),
            ..Default::default()
        }
    }
}
