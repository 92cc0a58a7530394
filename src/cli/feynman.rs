//! CLI `test` command: Feynman check of an explanation.

use std::io::Read;

use anyhow::{Context, Result};

use super::{open_engine, print_list, spinner, Output};
use synaptic::config::SynapticConfig;

/// Assess `explanation`, or stdin when it is not given.
pub async fn feynman(
    config: &SynapticConfig,
    output: Output,
    concept: &str,
    explanation: Option<&str>,
) -> Result<()> {
    let explanation = match explanation {
        Some(text) => text.to_string(),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read explanation from stdin")?;
            buf
        }
    };

    let engine = open_engine(config)?;
    let pb = spinner(output, "Assessing explanation...");
    let result = engine.test(concept, &explanation).await;
    pb.finish_and_clear();
    let outcome = result?;

    output.emit(&outcome, |o| {
        let a = &o.assessment;
        println!("Feynman Assessment: {}", o.concept);
        println!("{}", "=".repeat(50));
        println!("  Overall:       {:.1}/10", o.average_score);
        println!("  Accuracy:      {}/10", a.accuracy_score);
        println!("  Clarity:       {}/10", a.clarity_score);
        println!("  Completeness:  {}/10", a.completeness_score);
        println!("  Depth:         {}/10", a.depth_score);
        print_list("Strengths", &a.strengths);
        print_list("Gaps", &a.gaps);
        print_list("Misconceptions", &a.misconceptions);
        if !a.feedback.is_empty() {
            println!();
            println!("Feedback: {}", a.feedback);
        }
        println!();
        println!("Report: {}", o.report.display());
    })
}
