use anyhow::Result;

use super::{open_engine, Output};
use synaptic::config::SynapticConfig;
use synaptic::store::analytics::Insights;

/// Summarize the study log.
pub fn insights(config: &SynapticConfig, output: Output) -> Result<()> {
    let outcome = open_engine(config)?.insights()?;

    output.emit(&outcome, |o| match &o.insights {
        Insights::NeedMoreSessions { recorded, remaining } => {
            println!("{recorded} session(s) recorded. Need {remaining} more for insights.");
        }
        Insights::Ready(summary) => {
            println!("Learning Insights");
            println!("{}", "=".repeat(40));
            println!("  Sessions:        {}", summary.total_sessions);
            println!("  Minutes:         {}", summary.total_minutes);
            println!("  Average score:   {:.1}/10", summary.average_score);
            println!("  Best hour:       {}:00", summary.best_hour);
            println!();
            println!("By Activity:");
            for (activity, count) in &summary.activity_counts {
                println!("  {:<12} {}", activity.as_str(), count);
            }
            println!();
            println!("Bloom progression: {}", summary.bloom_progression_names().join(" -> "));
            println!();
            println!("Recommendations:");
            for r in &summary.recommendations {
                println!("  - {r}");
            }
            if let Some(path) = &o.report {
                println!();
                println!("Report: {}", path.display());
            }
        }
    })
}
