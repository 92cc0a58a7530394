//! CLI `inspect` command: display full details for a single concept.

use anyhow::Result;

use super::{open_engine, percent, Output};
use synaptic::config::SynapticConfig;

/// Inspect a single concept by ID and display full details.
pub fn inspect(config: &SynapticConfig, output: Output, concept_id: &str) -> Result<()> {
    let detail = open_engine(config)?.inspect(concept_id)?;

    output.emit(&detail, |d| {
        let n = &d.node;
        println!("Concept: {} ({})", n.name, n.concept_id);
        println!("{}", "=".repeat(50));
        if !n.description.is_empty() {
            println!("  {}", n.description);
            println!();
        }
        println!("  Bloom level:    {} ({})", n.bloom_level, n.bloom());
        println!("  Mastery:        {} (progress {:.2})", percent(n.p_know), n.mastery);
        println!("  Retention:      {}", percent(d.retention));
        println!("  Ease factor:    {:.2}", n.ease_factor);
        println!("  Interval:       {:.1} days", n.interval_days);
        println!("  Repetitions:    {}", n.repetitions);
        println!("  Lapses:         {}", n.lapses);
        if let Some(ref last) = n.last_review {
            println!("  Last review:    {last}");
        }
        if let Some(ref next) = n.next_review {
            println!("  Next review:    {next}");
        }
        println!("  Due:            {}", if d.due { "yes" } else { "no" });
        println!(
            "  Studied:        {} time(s), {} min",
            n.study_count, n.total_study_minutes
        );
        if !n.prerequisites.is_empty() {
            println!(
                "  Prerequisites:  {} ({})",
                n.prerequisites.join(", "),
                if d.prereqs_met { "met" } else { "not met" }
            );
        }

        if !n.review_history.is_empty() {
            println!();
            println!("Review History:");
            for entry in &n.review_history {
                println!(
                    "  {} q={} p_know={:.2} interval={:.1}d",
                    entry.timestamp.format("%Y-%m-%d %H:%M"),
                    entry.quality,
                    entry.p_know,
                    entry.interval_days
                );
            }
        }
    })
}
