//! CLI `review` command: record one recall attempt.

use anyhow::Result;

use super::{open_engine, percent, Output};
use synaptic::config::SynapticConfig;
use synaptic::learning::Quality;

pub fn review(config: &SynapticConfig, output: Output, concept_id: &str, quality: i64) -> Result<()> {
    let quality = Quality::try_from(quality)?;
    let outcome = open_engine(config)?.review(concept_id, quality)?;

    output.emit(&outcome, |o| {
        println!("{}", o.message);
        println!("  Concept:       {} ({})", o.name, o.concept_id);
        println!("  Quality:       {}/5", o.quality);
        println!("  Mastery:       {} (confidence {:.2})", percent(o.p_know), o.confidence);
        println!("  Interval:      {:.1} days", o.interval_days);
        println!("  Ease factor:   {:.2}", o.ease_factor);
        println!("  Repetitions:   {}", o.repetitions);
        println!("  Lapses:        {}", o.lapses);
    })
}
