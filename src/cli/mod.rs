//! Terminal front end. One module per subcommand; each prints to stdout as text or,
//! with `--json`, as the serialized engine outcome.

pub mod bloom;
pub mod build;
pub mod due;
pub mod export;
pub mod feynman;
pub mod insights;
pub mod inspect;
pub mod promote;
pub mod reset;
pub mod review;
pub mod session;
pub mod stats;
pub mod study;

use std::time::Duration;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use synaptic::config::SynapticConfig;
use synaptic::engine::Engine;
use synaptic::generator::{self, http::LlmContentGenerator};

/// Engine wired to the configured content generator.
pub fn open_engine(config: &SynapticConfig) -> Result<Engine<LlmContentGenerator>> {
    let generator = generator::create_generator(&config.generator)?;
    Ok(Engine::new(config, generator))
}

/// Output mode shared by every subcommand.
#[derive(Debug, Clone, Copy)]
pub struct Output {
    json: bool,
}

impl Output {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    pub fn is_json(&self) -> bool {
        self.json
    }

    /// Print `value` as pretty JSON, or hand it to `text` for the human view.
    pub fn emit<T: Serialize>(&self, value: &T, text: impl FnOnce(&T)) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            text(value);
        }
        Ok(())
    }
}

/// Spinner on stderr while waiting for the content generator. Hidden in JSON mode.
pub fn spinner(output: Output, message: &str) -> ProgressBar {
    if output.is_json() {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

pub(crate) fn percent(p: f64) -> String {
    format!("{:.0}%", p * 100.0)
}

pub(crate) fn print_list(title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    println!();
    println!("{title}:");
    for item in items {
        println!("  - {item}");
    }
}
