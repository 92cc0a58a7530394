use anyhow::Result;

use super::{open_engine, percent, Output};
use synaptic::config::SynapticConfig;
use synaptic::learning::BloomLevel;

/// Display knowledge-graph statistics in the terminal.
pub fn stats(config: &SynapticConfig, output: Output) -> Result<()> {
    let stats = open_engine(config)?.stats()?;

    output.emit(&stats, |s| {
        println!("Knowledge Graph Statistics");
        println!("{}", "=".repeat(40));
        println!("  Total concepts:      {}", s.total_concepts);
        println!("  Reviewed:            {}", s.reviewed);
        println!("  Never reviewed:      {}", s.never_reviewed);
        println!("  Due now:             {}", s.due_now);
        println!();
        println!("  Mean mastery:        {}", percent(s.mean_p_know));
        println!("  Mean retention:      {}", percent(s.mean_retention));
        println!("  Total reviews:       {}", s.total_reviews);
        println!("  Total lapses:        {}", s.total_lapses);
        println!();

        println!("By Bloom Level:");
        for level in BloomLevel::ALL {
            let count = s.by_bloom_level.get(&level.level()).copied().unwrap_or(0);
            println!("  {} {:<12} {}", level.level(), level.as_str(), count);
        }
        println!();
        println!("Store size:            {} bytes", s.store_size_bytes);
    })
}
