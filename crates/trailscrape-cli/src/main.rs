mod commands;

use std::io::Write as _;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "trailscrape-cli")]
#[command(about = "Trailhead profile scraper command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Scrape the given profiles now and print the progress stream.
    Refresh {
        /// Comma-separated trailblazer ids, e.g. `jdoe,foobar`.
        #[arg(long)]
        ids: String,
    },
    /// Print the cached fragment for one id (nothing if never refreshed).
    Show { id: String },
    /// List cached ids with their extraction status.
    List,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = trailscrape_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    // stdout carries command output only.
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut out = std::io::stdout().lock();
    match cli.command {
        Some(Commands::Refresh { ids }) => commands::run_refresh(&config, &ids, &mut out).await?,
        Some(Commands::Show { id }) => commands::run_show(&config, &id, &mut out).await?,
        Some(Commands::List) => commands::run_list(&config, &mut out).await?,
        None => writeln!(out, "trailscrape-cli: pass --help for the available commands")?,
    }

    Ok(())
}
