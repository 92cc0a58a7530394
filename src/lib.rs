//! Adaptive study engine: knowledge tracing, spaced repetition and interleaved sessions.
//!
//! Synaptic tracks a learner's mastery of atomic concepts over time, decides when each
//! concept should be reviewed, and sequences study sessions. It is usable as a library,
//! as a CLI, and as an [MCP](https://modelcontextprotocol.io/) server over stdio.
//!
//! | Component | Role |
//! |-----------|------|
//! | **Knowledge tracer** | Bayesian Knowledge Tracing update of `p_know` per answer |
//! | **Scheduler** | SM-2 variant with a mastery boost and exponential-decay retention |
//! | **Sequencer** | Ranks by urgency, difficulty match and readiness, then interleaves Bloom levels |
//! | **Promotion** | Raises a concept's Bloom level once `p_know` clears the threshold |
//!
//! # Architecture
//!
//! - **Storage**: one JSON document of [`learning::KnowledgeNode`]s, rewritten atomically
//!   per operation, plus an append-only JSON Lines analytics log
//! - **Content**: concept maps, study guides and assessments come from a
//!   [`generator::ContentGenerator`] (OpenAI-compatible HTTP by default)
//! - **Reports**: Markdown files written by a [`report::ReportRenderer`]
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from TOML files and environment variables
//! - [`engine`]: Operation facade and the closed [`engine::Command`] set
//! - [`error`]: Typed engine failures
//! - [`generator`]: Content-generation collaborator and its HTTP implementation
//! - [`learning`]: Tracer, scheduler, sequencer, promotion and graph ingest
//! - [`report`]: Report model and Markdown renderer
//! - [`store`]: Knowledge-graph store and analytics log

pub mod config;
pub mod engine;
pub mod error;
pub mod generator;
pub mod learning;
pub mod report;
pub mod store;
