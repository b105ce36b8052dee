use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;

use datacat::config::CONFIG;
use datacat::datafold::{
    DatafoldClient, DatafoldConfig, DatafoldLineageExtractor, DatafoldMetadataExtractor,
};
use datacat::db::{Database, LineageRepo, TableRepo};
use datacat::filter::{FilterSet, SearchFilterInput};
use datacat::task;

#[derive(Parser)]
#[command(name = "datacat", about = "Data catalog harvesting and search filter tools")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract table metadata from Datafold and store it in MongoDB
    Metadata {
        /// Print the records as JSON lines instead of storing them
        #[arg(long)]
        dry_run: bool,
    },
    /// Extract table and column lineage from Datafold and store it in MongoDB
    Lineage {
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate a search filter (object) or a list of filters (array)
    Filter {
        json: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber (handles both tracing and log crate)
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(true)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Metadata { dry_run } => {
            let client = datafold_client()?;
            let extractor = DatafoldMetadataExtractor::init(&client).await?;
            let count = if dry_run {
                let mut records = Vec::new();
                let count = task::run(extractor, &mut records).await?;
                print_json_lines(&records)?;
                count
            } else {
                let db = Database::init_global().await?;
                task::run(extractor, &mut TableRepo::new(db)).await?
            };
            tracing::info!(count, "metadata extraction finished");
        }
        Command::Lineage { dry_run } => {
            let client = datafold_client()?;
            let extractor = DatafoldLineageExtractor::init(&client).await?;
            let count = if dry_run {
                let mut records = Vec::new();
                let count = task::run(extractor, &mut records).await?;
                print_json_lines(&records)?;
                count
            } else {
                let db = Database::init_global().await?;
                task::run(extractor, &mut LineageRepo::new(db)).await?
            };
            tracing::info!(count, "lineage extraction finished");
        }
        Command::Filter { json } => check_filter(&json)?,
    }
    Ok(())
}

fn datafold_client() -> anyhow::Result<DatafoldClient> {
    let config = DatafoldConfig::from_config(&CONFIG)?;
    DatafoldClient::new(config).context("failed to build datafold client")
}

fn print_json_lines<T: Serialize>(records: &[T]) -> anyhow::Result<()> {
    for record in records {
        println!("{}", serde_json::to_string(record)?);
    }
    Ok(())
}

fn check_filter(json: &str) -> anyhow::Result<()> {
    let filters = if json.trim_start().starts_with('[') {
        serde_json::from_str::<FilterSet>(json).context("invalid filter list")?
    } else {
        let mut set = FilterSet::new();
        set.apply(SearchFilterInput::from_json(json)?)?;
        set
    };

    let active: Vec<&str> = filters.active().map(|(category, _)| category).collect();
    tracing::info!(
        total = filters.len(),
        active = ?active,
        "filters are valid"
    );
    println!("{}", serde_json::to_string_pretty(&filters)?);
    Ok(())
}
