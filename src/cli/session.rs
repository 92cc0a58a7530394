use anyhow::Result;

use super::{open_engine, percent, Output};
use synaptic::config::SynapticConfig;

/// Plan an interleaved study session.
pub fn session(config: &SynapticConfig, output: Output, length: Option<usize>) -> Result<()> {
    let length = length.unwrap_or(config.sequencer.default_session_length);
    let items = open_engine(config)?.session(length)?;

    output.emit(&items, |items| {
        if items.is_empty() {
            println!("No concepts yet. Run `synaptic build <topic>` first.");
            return;
        }
        println!("Study session ({} concepts):", items.len());
        for (i, item) in items.iter().enumerate() {
            println!(
                "  {}. {}  {:<30} mastery {:>4}  L{}",
                i + 1,
                item.concept_id,
                item.name,
                percent(item.p_know),
                item.bloom_level
            );
        }
    })
}
