mod analyze;
mod db;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "eia-cli")]
#[command(about = "Environmental Impact Analyzer command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Load the sample product catalog into an empty database
    Seed {
        /// Catalog YAML file (defaults to `EIA_CATALOG_PATH`)
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
    /// Interpret an assessment text offline and print the result as JSON
    Interpret {
        /// Read the text from this file instead of stdin
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Ask the LLM for an assessment of a product description
    Analyze {
        /// Product description to assess
        #[arg(long)]
        text: String,
        /// Store the analysis in the database
        #[arg(long)]
        save: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    // Logs go to stderr so JSON on stdout stays machine-readable.
    let fallback_level = std::env::var("EIA_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(fallback_level))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Migrate => db::run_migrate().await,
        Commands::Seed { catalog } => db::run_seed(catalog).await,
        Commands::Interpret { file } => analyze::run_interpret(file.as_deref()),
        Commands::Analyze { text, save } => analyze::run_analyze(&text, save).await,
    }
}
