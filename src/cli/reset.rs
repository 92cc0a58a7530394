//! CLI `reset` command: delete the knowledge graph and study log after confirmation.

use anyhow::{bail, Result};
use std::io::Write;

use super::open_engine;
use synaptic::config::SynapticConfig;

/// Delete all learning state after user confirmation (skipped with `--yes`).
pub fn reset(config: &SynapticConfig, yes: bool) -> Result<()> {
    let engine = open_engine(config)?;

    if !yes {
        println!("WARNING: This will permanently delete ALL concepts, review history, and study analytics.");
        println!("Knowledge graph: {}", engine.store().path().display());
        println!("Analytics log:   {}", engine.analytics().path().display());
        print!("\nType YES to confirm: ");
        std::io::stdout().flush()?;

        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;

        if input.trim() != "YES" {
            bail!("reset cancelled");
        }
    }

    engine.reset()?;

    println!("All learning state deleted. Reset complete.");
    Ok(())
}
