use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use pathwise_common::{store_from_config, Config};
use pathwise_directory::{load_dataset, seed_colleges, AcquisitionPipeline};

#[derive(Parser)]
#[command(name = "directory", about = "College directory maintenance")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scrape the listing at SCRAPE_SOURCE_URL into the colleges collection
    Scrape {
        /// Override SCRAPE_MAX_PAGES
        #[arg(long)]
        max_pages: Option<u32>,
    },
    /// Load a JSON dataset into the colleges collection
    Seed {
        /// Defaults to COLLEGES_DATASET
        path: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("pathwise=info".parse()?))
        .init();

    let cli = Cli::parse();
    let mut config = Config::directory_from_env()?;
    config.log_redacted();

    let store = store_from_config(&config);

    match cli.command {
        Command::Scrape { max_pages } => {
            if let Some(max_pages) = max_pages {
                config.scrape.max_pages = max_pages;
            }
            let pipeline = AcquisitionPipeline::from_config(&config, store)?;
            let report = pipeline.run().await;

            println!("{}", serde_json::to_string_pretty(&report.summary)?);
            if !report.summary.is_clean() {
                bail!("scrape stopped with {} error(s)", report.summary.errors.len());
            }
        }
        Command::Seed { path } => {
            let path = path.unwrap_or_else(|| config.colleges_dataset.clone());
            let records = load_dataset(&path)?;
            info!(path = %path.display(), records = records.len(), "Loaded dataset");

            let summary =
                seed_colleges(store.as_ref(), &config.colleges_collection, &records).await;
            println!("{}", serde_json::to_string_pretty(&summary)?);
            if summary.failed > 0 {
                bail!("{} college(s) failed to seed", summary.failed);
            }
        }
    }

    Ok(())
}
