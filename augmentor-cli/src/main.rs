//! Augmentor CLI: import, clean and augment article corpora.
//!
//! Every augmentation subcommand reads the source collection, runs one
//! technique batch by batch and writes each batch to CSV and to the store.

mod commands;

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Augmentor: batch text augmentation for article corpora
#[derive(Parser, Debug)]
#[command(name = "augmentor", version, about, long_about = None)]
struct Cli {
    /// Workspace directory (holds augmentor.toml)
    #[arg(short, long, default_value = ".", global = true)]
    workspace: PathBuf,

    #[command(flatten)]
    overrides: Overrides,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only print errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Command-line values that win over every configuration layer.
#[derive(clap::Args, Debug, Clone, Default)]
pub(crate) struct Overrides {
    /// Document store file (overrides store.path)
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    /// Root directory for CSV output (overrides data.output_dir)
    #[arg(short, long, global = true)]
    pub output_dir: Option<PathBuf>,

    /// Seed for reproducible augmentation
    #[arg(long, global = true)]
    pub seed: Option<u64>,
}

#[derive(clap::Subcommand, Debug)]
pub(crate) enum Commands {
    /// Load a JSON, JSONL or CSV file into a collection
    Import {
        /// File to import
        file: PathBuf,
        /// Target collection (default: data.raw_collection)
        #[arg(short, long)]
        collection: Option<String>,
        /// File format (default: from the extension)
        #[arg(short, long, value_enum)]
        format: Option<FormatArg>,
    },
    /// Copy documents with a usable text field into the source collection
    Clean {
        /// Collection to read (default: data.raw_collection)
        #[arg(long)]
        from: Option<String>,
        /// Collection to write (default: data.source_collection)
        #[arg(long)]
        to: Option<String>,
    },
    /// Back-translate articles through an intermediate language
    BackTranslate(RunArgs),
    /// Replace words using a masked language model
    Contextual(RunArgs),
    /// Replace words with thesaurus synonyms
    Synonym(RunArgs),
    /// Insert, delete and swap random characters
    Random(RunArgs),
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Options shared by every augmentation subcommand.
#[derive(clap::Args, Debug, Clone, Default)]
pub(crate) struct RunArgs {
    /// Records per batch (default: the technique's configured batch size)
    #[arg(short, long)]
    pub batch_size: Option<usize>,

    /// Process every record in one batch
    #[arg(long, conflicts_with = "batch_size")]
    pub single: bool,

    /// Print the run report as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(clap::Subcommand, Debug)]
pub(crate) enum ConfigAction {
    /// Write a default augmentor.toml into the workspace
    Init,
    /// Show the effective configuration
    Show,
    /// Show where configuration is read from
    Path,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FormatArg {
    Json,
    Jsonl,
    Csv,
}

impl From<FormatArg> for augmentor_core::data::ImportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Json => Self::Json,
            FormatArg::Jsonl => Self::Jsonl,
            FormatArg::Csv => Self::Csv,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Set up tracing: human-readable stderr + JSON file logging
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::new(filter));

    let log_dir = directories::ProjectDirs::from("dev", "augmentor", "augmentor")
        .map(|d| d.data_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("."));
    let _ = std::fs::create_dir_all(&log_dir);
    let file_appender = tracing_appender::rolling::daily(&log_dir, "augmentor.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(non_blocking)
        .with_filter(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let workspace = cli
        .workspace
        .canonicalize()
        .unwrap_or_else(|_| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    commands::handle_command(cli.command, &workspace, &cli.overrides).await
}
