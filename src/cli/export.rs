use anyhow::Result;

use super::open_engine;
use synaptic::config::SynapticConfig;

/// Export the whole knowledge graph as JSON to stdout.
pub fn export(config: &SynapticConfig) -> Result<()> {
    let nodes = open_engine(config)?.nodes()?;

    let json = serde_json::to_string_pretty(&nodes)?;
    println!("{json}");

    eprintln!("Exported {} concepts.", nodes.len());
    Ok(())
}
