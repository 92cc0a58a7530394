//! CLI `study` command: generate a study guide for a concept.

use anyhow::Result;

use super::{open_engine, print_list, spinner, Output};
use synaptic::config::SynapticConfig;

pub async fn study(config: &SynapticConfig, output: Output, concept_id: &str) -> Result<()> {
    let engine = open_engine(config)?;

    let pb = spinner(output, "Preparing study material...");
    let result = engine.study(concept_id).await;
    pb.finish_and_clear();
    let outcome = result?;

    output.emit(&outcome, |o| {
        println!("{} ({})", o.name, o.concept_id);
        println!("{}", "=".repeat(50));
        println!("{}", o.material.verbal_explanation);
        print_list("Key points", &o.material.key_points);
        if !o.material.real_world_analogy.is_empty() {
            println!();
            println!("Analogy: {}", o.material.real_world_analogy);
        }
        print_list("Common mistakes", &o.material.common_mistakes);
        print_list("Practice questions", &o.material.practice_questions);
        println!();
        println!(
            "Studied {} time(s), {} minutes total.",
            o.study_count, o.total_study_minutes
        );
        println!("Report: {}", o.report.display());
    })
}
