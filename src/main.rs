use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing::info;

use reviewlens::config::Config;
use reviewlens::db;
use reviewlens::output::{self, terminal};
use reviewlens::pipeline::{ingest, stages};

/// reviewlens: multilingual analytics for bank agency reviews.
///
/// Scores sentiment, detects language, models topics per language and
/// audits how well the results agree with star ratings.
#[derive(Parser)]
#[command(name = "reviewlens", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database
    Init,

    /// Import collector output (JSON array or JSON lines) into staging
    Import {
        /// Path to the collector export
        file: PathBuf,
    },

    /// Score sentiment and detect language for every staged review
    Sentiment {
        /// Hide the progress bar
        #[arg(long)]
        quiet: bool,
    },

    /// Build per-language topic models and assign reviews to topics
    Topics,

    /// Audit coverage and rating coherence of the derived signals
    Validate {
        /// Also write the report as JSON to this path
        #[arg(long)]
        json: Option<PathBuf>,
    },

    /// Run sentiment, topics and validation in order
    Run {
        /// Hide the progress bar
        #[arg(long)]
        quiet: bool,
    },

    /// Show database status and last runs
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("reviewlens=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => {
            info!("Initializing reviewlens database...");
            let config = Config::load()?;
            let conn = db::initialize(&config.db_path)?;
            let table_count = db::schema::table_count(&conn)?;
            println!("Database initialized at: {}", config.db_path);
            println!("Tables created: {table_count}");
            println!("\nNext step: reviewlens import <reviews.json>");
        }

        Commands::Import { file } => {
            let config = Config::load()?;
            let conn = db::initialize(&config.db_path)?;
            let input = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;

            let records = ingest::parse_records(&input)?;
            let (reviews, summary) = ingest::stage_reviews(records)?;
            db::queries::replace_reviews(&conn, &reviews)?;
            terminal::display_import_summary(&summary);
        }

        Commands::Sentiment { quiet } => {
            let config = Config::load()?;
            let conn = db::open(&config.db_path)?;
            let signals = stages::run_sentiment(&conn, &config, !quiet).await?;
            terminal::display_sentiment_summary(&signals);
        }

        Commands::Topics => {
            let config = Config::load()?;
            let conn = db::open(&config.db_path)?;
            let results = stages::run_topics(&conn, &config).await?;
            let models: Vec<_> = results.into_iter().map(|r| r.model).collect();
            terminal::display_topic_models(&models);
        }

        Commands::Validate { json } => {
            let config = Config::load()?;
            let conn = db::open(&config.db_path)?;
            let report = stages::run_validation(&conn, &config)?;
            terminal::display_quality_report(&report);
            if let Some(path) = json {
                output::export_report_json(&report, &path)?;
                println!("\nReport written to {}", path.display());
            }
        }

        Commands::Run { quiet } => {
            let config = Config::load()?;
            let conn = db::open(&config.db_path)?;

            println!("{}", "[1/3] Sentiment and language".bold());
            let signals = stages::run_sentiment(&conn, &config, !quiet).await?;
            terminal::display_sentiment_summary(&signals);

            println!("\n{}", "[2/3] Topics".bold());
            let results = stages::run_topics(&conn, &config).await?;
            let models: Vec<_> = results.into_iter().map(|r| r.model).collect();
            terminal::display_topic_models(&models);

            println!("\n{}", "[3/3] Validation".bold());
            let report = stages::run_validation(&conn, &config)?;
            terminal::display_quality_report(&report);
        }

        Commands::Status => {
            let config = Config::load()?;
            reviewlens::status::show(&config.db_path)?;
        }
    }

    Ok(())
}
