//! MCP server initialization for the stdio transport.

use std::sync::Arc;

use anyhow::Result;
use rmcp::ServiceExt;

use crate::cli::open_engine;
use crate::tools::StudyTools;
use synaptic::config::SynapticConfig;

/// Start the MCP server over stdio transport.
pub async fn serve_stdio(config: SynapticConfig) -> Result<()> {
    tracing::info!("starting Synaptic MCP server on stdio");

    let engine = open_engine(&config)?;
    if !engine.generator().is_available() {
        tracing::warn!(
            "no generator API key configured; build, study, test and bloom will fail until SYNAPTIC_API_KEY is set"
        );
    }
    tracing::info!(store = %engine.store().path().display(), "knowledge graph ready");

    let tools = StudyTools::new(Arc::new(engine));
    let transport = rmcp::transport::stdio();

    let server = tools.serve(transport).await?;
    tracing::info!("MCP server running, waiting for client");

    server.waiting().await?;
    tracing::info!("MCP server shut down");

    Ok(())
}
