// src/main.rs

//! Command line entry point for the catalog synchronizer.

use std::path::Path;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use env_logger::Env;
use log::info;

use radiosync::error::Result;
use radiosync::models::Config;
use radiosync::pipeline;
use radiosync::schedule;
use radiosync::storage::{CatalogStore, SqliteCatalog};

#[derive(Parser, Debug)]
#[command(
    name = "radiosync",
    version,
    about = "Multi-source radio station catalog synchronizer"
)]
struct Cli {
    #[arg(short, long, default_value = "data/config.toml")]
    config: String,

    /// Override the configured database path
    #[arg(short, long)]
    database: Option<String>,

    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one collection and synchronization cycle
    Run {
        /// Resolve the schedule for this date instead of today (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Show which sources and categories a date would run
    Plan {
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Print catalog statistics
    Stats,
    /// Validate the configuration
    Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level)).init();

    let mut config = Config::load_or_default(&cli.config);
    if let Some(path) = cli.database {
        config.database.path = path;
    }

    match cli.command {
        Command::Run { date } => {
            let date = date.unwrap_or_else(today);
            let plan = schedule::resolve(date);
            let store = SqliteCatalog::open(Path::new(&config.database.path)).await?;
            let summary = pipeline::run_cycle(&config, plan, &store).await?;
            info!("catalog now holds {} stations", store.count().await?);
            info!("next: {}", schedule::next_plan(date));
            println!(
                "{}: {} unique candidates, +{} ~{} -{} ({} row failures)",
                summary.plan.date,
                summary.unique_candidates,
                summary.totals.inserted,
                summary.totals.updated,
                summary.totals.deleted,
                summary.totals.failed
            );
        }
        Command::Plan { date } => {
            let date = date.unwrap_or_else(today);
            println!("{}", schedule::resolve(date));
            let next = schedule::next_plan(date);
            println!("next tree day: {}", next);
        }
        Command::Stats => {
            let store = SqliteCatalog::open(Path::new(&config.database.path)).await?;
            let stats = store.stats().await?;
            println!("total stations: {}", stats.total);
            if let Some(last) = &stats.last_collection {
                println!("last collection: {last}");
            }
            for (source, count) in &stats.by_source {
                println!("  {source}: {count}");
            }
            for (country, count) in &stats.by_country {
                println!("  {country}: {count}");
            }
        }
        Command::Validate => {
            config.validate()?;
            println!(
                "configuration ok: {} curated stations, {} tree categories",
                config.stations.len(),
                config.tree.categories.len()
            );
        }
    }

    Ok(())
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}
