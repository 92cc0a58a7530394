//! CLI `build` command: generate a knowledge graph for a topic.

use anyhow::Result;

use super::{open_engine, spinner, Output};
use synaptic::config::SynapticConfig;

pub async fn build(config: &SynapticConfig, output: Output, topic: &str) -> Result<()> {
    let engine = open_engine(config)?;

    let pb = spinner(output, &format!("Mapping {topic}..."));
    let result = engine.build(topic).await;
    pb.finish_and_clear();
    let outcome = result?;

    output.emit(&outcome, |o| {
        println!("Knowledge Graph: {}", o.topic);
        println!("{}", "=".repeat(50));
        println!(
            "  {} concepts ({} new, {} already known)",
            o.concepts.len(),
            o.created.len(),
            o.reused.len()
        );
        println!();
        for c in &o.concepts {
            let prereqs = if c.prerequisites.is_empty() {
                String::new()
            } else {
                format!("  <- {}", c.prerequisites.join(", "))
            };
            println!("  {}  L{}  {}{prereqs}", c.concept_id, c.bloom_level, c.name);
        }
        if !o.dropped_prerequisites.is_empty() {
            println!();
            println!("Dropped prerequisites:");
            for d in &o.dropped_prerequisites {
                println!("  {} -> {} ({:?})", d.concept_id, d.prerequisite, d.reason);
            }
        }
        for cycle in &o.broken_cycles {
            println!("  WARNING: broke prerequisite cycle {}", cycle.join(" -> "));
        }
        println!();
        println!("Report: {}", o.report.display());
    })
}
