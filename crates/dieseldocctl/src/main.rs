//! DieselDoc Control - CLI for the diagnostic consensus engine.

use anyhow::Result;
use clap::{Parser, Subcommand};
use dieseldocctl::commands::{self, Capabilities};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dieseldocctl")]
#[command(about = "Diagnostic consensus engine for vehicle malfunction reports", long_about = None)]
#[command(version)]
struct Cli {
    /// Lexicon TOML file (built-in lexicon when omitted)
    #[arg(long, global = true)]
    lexicon: Option<PathBuf>,

    /// Capability service endpoint; offline mode when omitted
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Bearer token for the capability service
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Capability request timeout in seconds
    #[arg(long, global = true, default_value_t = 20)]
    timeout: u64,

    /// Reference clock for the readiness gate, "YYYY-MM-DD HH:MM" (now when omitted)
    #[arg(long, global = true)]
    as_of: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process reports from a JSON file and print each consensus
    Process {
        /// JSON file with one report or an array of reports
        input: PathBuf,

        /// Emit one JSON object per report instead of formatted text
        #[arg(long)]
        json: bool,
    },

    /// Extract vehicle facts from a title/body without running evidence channels
    Extract {
        /// Report title
        title: String,

        /// Report body
        #[arg(long)]
        body: Option<String>,
    },

    /// Generate Q&A training pairs as JSONL
    Qa {
        /// JSON file with one report or an array of reports
        input: PathBuf,
    },

    /// Summarize extraction coverage over a batch of reports
    Metrics {
        /// JSON file with one report or an array of reports
        input: PathBuf,

        /// Emit the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write the built-in lexicon to an editable TOML file
    LexiconInit {
        /// Destination path
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let caps = match &cli.endpoint {
        Some(endpoint) => Capabilities::http(endpoint, cli.api_key.clone(), cli.timeout)?,
        None => Capabilities::offline(),
    };

    match cli.command {
        Commands::Process { input, json } => commands::process(
            &input,
            cli.lexicon.as_deref(),
            &caps,
            cli.as_of.as_deref(),
            json,
        ),
        Commands::Extract { title, body } => {
            commands::extract(&title, body.as_deref(), cli.lexicon.as_deref())
        }
        Commands::Qa { input } => {
            commands::qa_pairs(&input, cli.lexicon.as_deref(), &caps, cli.as_of.as_deref())
        }
        Commands::Metrics { input, json } => commands::metrics(
            &input,
            cli.lexicon.as_deref(),
            &caps,
            cli.as_of.as_deref(),
            json,
        ),
        Commands::LexiconInit { path } => commands::lexicon_init(&path),
    }
}
