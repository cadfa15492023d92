mod search;

use clap::{Parser, Subcommand};
use meli_core::{ResultCap, SourceKind};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "meli-cli")]
#[command(about = "MercadoLibre search extraction command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run one search and print the ranked products.
    Search {
        /// Free-text search terms.
        query: String,
        /// Result cap: 10, 20, 100, or `all`. Other numbers snap to a tier.
        #[arg(long, default_value = "20")]
        limit: ResultCap,
        /// Source override; defaults to `MELI_DEFAULT_SOURCE`.
        #[arg(long)]
        source: Option<SourceKind>,
        /// Print the full outcome as JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = meli_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Search {
            query,
            limit,
            source,
            json,
        } => {
            let source = source.unwrap_or(config.default_source);
            search::run_search(&config, query, limit, source, json).await?;
        }
    }

    Ok(())
}
