//! CLI `bloom` command: questions at a concept's current Bloom level.

use anyhow::Result;

use super::{open_engine, spinner, Output};
use synaptic::config::SynapticConfig;

pub async fn bloom(config: &SynapticConfig, output: Output, concept_id: &str) -> Result<()> {
    let engine = open_engine(config)?;

    let pb = spinner(output, "Writing questions...");
    let result = engine.bloom(concept_id).await;
    pb.finish_and_clear();
    let outcome = result?;

    output.emit(&outcome, |o| {
        println!("Bloom's Assessment: {}", o.name);
        println!("Level {}: {}", o.bloom_level, o.bloom_name);
        println!("{}", "=".repeat(50));
        for (i, q) in o.assessment.questions.iter().enumerate() {
            println!();
            println!("{}. [{}] {}", i + 1, q.cognitive_verb, q.question);
            if !q.hints.is_empty() {
                println!("   Hints: {}", q.hints.join("; "));
            }
        }
        println!();
        println!("Answers and rubrics: {}", o.report.display());
    })
}
