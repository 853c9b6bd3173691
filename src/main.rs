use std::{env, path::PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;

mod config;
mod db;
mod engine;
mod error;
mod fixtures;
mod metrics;
mod models;
mod report;
mod store;
mod window;

use crate::config::Config;
use crate::db::PgStore;
use crate::engine::AnalyticsEngine;
use crate::models::AnalyticsReport;
use crate::store::{EngagementStore, MemoryStore};

#[derive(Parser)]
#[command(name = "club-event-analytics")]
#[command(about = "Event engagement analytics for club events", long_about = None)]
struct Cli {
    /// Read from the bundled sample club instead of Postgres
    #[arg(long, global = true)]
    sample: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load a small sample club
    Seed,
    /// Print the analytics report for an event as JSON
    Show {
        #[arg(long)]
        event: Uuid,
    },
    /// Generate a markdown report for an event
    Report {
        #[arg(long)]
        event: Uuid,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Export analytics for every event of a club as CSV
    Export {
        #[arg(long)]
        club: Uuid,
        #[arg(long, default_value = "analytics.csv")]
        out: PathBuf,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("EVENT_ANALYTICS_LOG")
        .unwrap_or_else(|_| EnvFilter::new("club_event_analytics=info,warn"));
    let format = env::var("EVENT_ANALYTICS_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

/// Computes an event report, exiting with status 2 when nothing matches.
async fn event_report<S: EngagementStore>(
    engine: &AnalyticsEngine<S>,
    event_id: Uuid,
) -> anyhow::Result<AnalyticsReport> {
    match engine.compute_event_analytics(event_id).await {
        Ok(report) => Ok(report),
        Err(err) if err.is_not_found() => {
            eprintln!("{err}");
            std::process::exit(2);
        }
        Err(err) => Err(err.into()),
    }
}

async fn run_analytics<S: EngagementStore>(
    engine: AnalyticsEngine<S>,
    command: Commands,
) -> anyhow::Result<()> {
    match command {
        Commands::Show { event } => {
            let analytics = event_report(&engine, event).await?;
            println!("{}", serde_json::to_string_pretty(&analytics)?);
        }
        Commands::Report { event, out } => {
            let analytics = event_report(&engine, event).await?;
            std::fs::write(&out, report::build_report(&analytics))
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Export { club, out } => {
            let reports = engine.compute_club_analytics(club).await?;
            let file = std::fs::File::create(&out)
                .with_context(|| format!("failed to create {}", out.display()))?;
            report::write_csv(file, &reports)?;
            println!("Exported {} events to {}.", reports.len(), out.display());
        }
        Commands::InitDb | Commands::Seed => {
            anyhow::bail!("this command needs a database; drop --sample");
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    if cli.sample {
        let engine = AnalyticsEngine::new(MemoryStore::from(fixtures::launch_club()));
        return run_analytics(engine, cli.command).await;
    }

    let config = Config::from_env()?;
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await
        .context("failed to connect to Postgres")?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!(
                "Seed data inserted. Try: show --event {}",
                fixtures::SECOND_EVENT_ID
            );
        }
        command => run_analytics(AnalyticsEngine::new(PgStore::new(pool)), command).await?,
    }

    Ok(())
}
