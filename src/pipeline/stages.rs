// Pipeline stages over the SQLite store.
//
// Each stage reads its inputs from the database, computes, and replaces its
// result tables in one transaction. Stages are independent commands; `run`
// chains them in order.

use std::sync::Arc;

use anyhow::Result;
use rusqlite::Connection;
use tracing::{info, warn};

use crate::config::Config;
use crate::db::models::TopicModel;
use crate::db::queries;
use crate::sentiment::SentimentScorer;
use crate::topics::{LdaTopicModeler, TextNormalizer};
use crate::validation::{audit, QualityReport, RatingBands};

use super::analyze::{analyze_reviews, ReviewSignals};
use super::cohorts::{model_cohorts, partition_cohorts, CohortTopics};
use super::enrich::enrich;

pub const LAST_SENTIMENT_RUN: &str = "last_sentiment_run";
pub const LAST_TOPICS_RUN: &str = "last_topics_run";
pub const LAST_VALIDATION_RUN: &str = "last_validation_run";

fn now() -> String {
    chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Score sentiment and detect language for every staged review.
pub async fn run_sentiment(
    conn: &Connection,
    config: &Config,
    show_progress: bool,
) -> Result<ReviewSignals> {
    let reviews = queries::load_reviews(conn)?;
    if reviews.is_empty() {
        anyhow::bail!("No staged reviews. Run `reviewlens import <file>` first.");
    }
    info!(reviews = reviews.len(), concurrency = config.concurrency, "Starting sentiment analysis");

    let scorer = Arc::new(SentimentScorer::new(config.sentiment));
    let detector = Arc::new(config.detector()?);
    let signals = analyze_reviews(reviews, scorer, detector, config.concurrency, show_progress).await?;

    queries::replace_sentiment(
        conn,
        signals.sentiments.values(),
        signals.errors.values(),
        signals.languages.values(),
    )?;
    queries::set_run_state(conn, LAST_SENTIMENT_RUN, &now())?;

    Ok(signals)
}

/// Build one topic model per language cohort and assign reviews to topics.
pub async fn run_topics(conn: &Connection, config: &Config) -> Result<Vec<CohortTopics>> {
    let reviews = queries::load_reviews(conn)?;
    let languages = queries::load_language_tags(conn)?;
    if languages.is_empty() {
        anyhow::bail!("No language tags yet. Run `reviewlens sentiment` first.");
    }

    let normalizer = TextNormalizer::new(config.stop_words()?);
    let taxonomy = Arc::new(config.taxonomy()?);
    let cohorts = partition_cohorts(&reviews, &languages, &normalizer, config.min_topic_text_chars);
    info!(
        cohorts = cohorts.len(),
        languages = %cohorts.iter().map(|c| c.language.as_str()).collect::<Vec<_>>().join(","),
        "Partitioned reviews into language cohorts"
    );

    let modeler = Arc::new(LdaTopicModeler::new(config.topics.clone()));
    let results = model_cohorts(cohorts, modeler, taxonomy, config.concurrency).await;

    let models: Vec<TopicModel> = results.iter().map(|r| r.model.clone()).collect();
    queries::replace_topics(conn, &models, results.iter().flat_map(|r| &r.assignments))?;
    queries::set_run_state(conn, LAST_TOPICS_RUN, &now())?;

    Ok(results)
}

/// Merge all signals, audit them, and store the report.
pub fn run_validation(conn: &Connection, config: &Config) -> Result<QualityReport> {
    let reviews = queries::load_reviews(conn)?;
    let sentiments = queries::load_sentiments(conn)?;
    let languages = queries::load_language_tags(conn)?;
    let topics = queries::load_topic_assignments(conn)?;

    let enriched = enrich(reviews, &sentiments, &languages, &topics);
    let Some(report) = audit(&enriched, &config.quality, &RatingBands::default()) else {
        anyhow::bail!("No reviews to audit. Run `reviewlens import <file>` first.");
    };
    let report = report.with_sentiment_errors(queries::count_sentiment_errors(conn)?);

    for warning in &report.warnings {
        warn!(warning = %warning, "Quality check");
    }

    queries::save_quality_report(conn, &report)?;
    queries::set_run_state(conn, LAST_VALIDATION_RUN, &now())?;

    Ok(report)
}
