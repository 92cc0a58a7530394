use anyhow::Result;

use super::{open_engine, Output};
use synaptic::config::SynapticConfig;

/// Try to raise a concept one Bloom level.
pub fn promote(config: &SynapticConfig, output: Output, concept_id: &str) -> Result<()> {
    let outcome = open_engine(config)?.promote(concept_id)?;
    output.emit(&outcome, |o| println!("{}", o.message))
}
