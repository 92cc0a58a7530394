mod cli;
mod server;
mod tools;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cli::Output;
use synaptic::config::SynapticConfig;
use synaptic::error::EngineError;

#[derive(Parser)]
#[command(name = "synaptic", version, about = "Adaptive study engine and MCP server")]
struct Cli {
    /// Print results as JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Config file (defaults to ~/.synaptic/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the MCP server (stdio transport)
    Serve,
    /// Generate a knowledge graph for a topic and merge it into the store
    Build { topic: String },
    /// Record a review with recall quality 0-5
    Review {
        concept_id: String,
        #[arg(allow_hyphen_values = true)]
        quality: i64,
    },
    /// List concepts due for review
    Due,
    /// Plan an interleaved study session
    Session {
        #[arg(short, long)]
        length: Option<usize>,
    },
    /// Promote a concept to the next Bloom level
    Promote { concept_id: String },
    /// Generate a study guide for a concept
    Study { concept_id: String },
    /// Feynman test: assess your explanation of a concept (reads stdin if omitted)
    Test {
        concept: String,
        explanation: Option<String>,
    },
    /// Generate questions at a concept's current Bloom level
    Bloom { concept_id: String },
    /// Summarize study history
    Insights,
    /// Show full details for one concept
    Inspect { concept_id: String },
    /// Export the knowledge graph as JSON to stdout
    Export,
    /// Show knowledge graph statistics
    Stats,
    /// Delete the knowledge graph and study log
    Reset {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

impl Command {
    /// Operation name reported in JSON errors.
    fn operation(&self) -> &'static str {
        match self {
            Self::Serve => "serve",
            Self::Build { .. } => "build",
            Self::Review { .. } => "review",
            Self::Due => "due",
            Self::Session { .. } => "session",
            Self::Promote { .. } => "promote",
            Self::Study { .. } => "study",
            Self::Test { .. } => "test",
            Self::Bloom { .. } => "bloom",
            Self::Insights => "insights",
            Self::Inspect { .. } => "inspect",
            Self::Export => "export",
            Self::Stats => "stats",
            Self::Reset { .. } => "reset",
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let output = Output::new(cli.json);
    let operation = cli.command.operation();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<EngineError>() {
                Some(engine_err) if output.is_json() => {
                    let report = engine_err.to_report(operation);
                    match serde_json::to_string_pretty(&report) {
                        Ok(json) => println!("{json}"),
                        Err(_) => eprintln!("error: {err:#}"),
                    }
                }
                _ => eprintln!("error: {err:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => SynapticConfig::load_from(path)?,
        None => SynapticConfig::load()?,
    };
    if let Some(dir) = &cli.data_dir {
        config = config.with_data_dir(dir);
    }

    // Initialize tracing with the configured log level.
    // Log to stderr so stdout stays clean for MCP JSON-RPC and --json output.
    let filter =
        EnvFilter::try_new(&config.server.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let output = Output::new(cli.json);

    match cli.command {
        Command::Serve => server::serve_stdio(config).await?,
        Command::Build { topic } => cli::build::build(&config, output, &topic).await?,
        Command::Review {
            concept_id,
            quality,
        } => cli::review::review(&config, output, &concept_id, quality)?,
        Command::Due => cli::due::due(&config, output)?,
        Command::Session { length } => cli::session::session(&config, output, length)?,
        Command::Promote { concept_id } => cli::promote::promote(&config, output, &concept_id)?,
        Command::Study { concept_id } => cli::study::study(&config, output, &concept_id).await?,
        Command::Test {
            concept,
            explanation,
        } => cli::feynman::feynman(&config, output, &concept, explanation.as_deref()).await?,
        Command::Bloom { concept_id } => cli::bloom::bloom(&config, output, &concept_id).await?,
        Command::Insights => cli::insights::insights(&config, output)?,
        Command::Inspect { concept_id } => cli::inspect::inspect(&config, output, &concept_id)?,
        Command::Export => cli::export::export(&config)?,
        Command::Stats => cli::stats::stats(&config, output)?,
        Command::Reset { yes } => cli::reset::reset(&config, yes)?,
    }

    Ok(())
}
