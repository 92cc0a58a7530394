use anyhow::Result;

use super::{open_engine, Output};
use synaptic::config::SynapticConfig;

/// List concepts due for review.
pub fn due(config: &SynapticConfig, output: Output) -> Result<()> {
    let due = open_engine(config)?.due()?;

    output.emit(&due, |due| {
        if due.is_empty() {
            println!("Nothing due. Come back later.");
            return;
        }
        println!("Due for review ({}):", due.len());
        for d in due {
            let overdue = match d.days_overdue {
                0 => String::new(),
                n => format!("  ({n}d overdue)"),
            };
            println!("  {}  {}{overdue}", d.concept_id, d.name);
        }
    })
}
