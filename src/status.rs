// System status display: DB stats, table row counts, last runs, sentiment errors, report age.

use anyhow::Result;
use std::path::Path;

use crate::db;
use crate::db::models::SentimentError;
use crate::db::queries;
use crate::output::truncate_chars;
use crate::pipeline::stages::{LAST_SENTIMENT_RUN, LAST_TOPICS_RUN, LAST_VALIDATION_RUN};

/// Display system status to the terminal.
pub fn show(db_path: &str) -> Result<()> {
    if !Path::new(db_path).exists() {
        println!("Database: not initialized");
        println!("\nRun `reviewlens init` to set up the database.");
        return Ok(());
    }

    let file_size = std::fs::metadata(db_path)
        .map(|m| format_bytes(m.len()))
        .unwrap_or_else(|_| "unknown".to_string());
    println!("Database: {} ({})", db_path, file_size);

    let conn = db::open(db_path)?;

    for (table, count) in queries::table_row_counts(&conn)? {
        println!("  {:<20} {:>8} rows", table, count);
    }

    for (label, key, hint) in [
        ("Sentiment", LAST_SENTIMENT_RUN, "reviewlens sentiment"),
        ("Topics", LAST_TOPICS_RUN, "reviewlens topics"),
        ("Validation", LAST_VALIDATION_RUN, "reviewlens validate"),
    ] {
        match queries::get_run_state(&conn, key)? {
            Some(at) => println!("Last {} run: {}", label.to_lowercase(), at),
            None => println!("Last {} run: never (run `{}`)", label.to_lowercase(), hint),
        }
    }

    let errors = queries::load_sentiment_errors(&conn)?;
    if !errors.is_empty() {
        println!("Sentiment errors: {}", errors.len());
        for line in error_samples(&errors, 3) {
            println!("  {}", line);
        }
    }

    if let Some(report) = queries::get_quality_report(&conn)? {
        println!(
            "Quality report: {} reviews, {} warning(s), generated {}",
            report.total_reviews,
            report.warnings.len(),
            report.generated_at.format("%Y-%m-%d %H:%M:%S")
        );
    }

    Ok(())
}

/// One line per error, at most `limit`, with a count of the rest.
fn error_samples(errors: &[SentimentError], limit: usize) -> Vec<String> {
    let mut lines: Vec<String> = errors
        .iter()
        .take(limit)
        .map(|e| format!("review {}: {}", e.review_id, truncate_chars(&e.message, 60)))
        .collect();
    if errors.len() > limit {
        lines.push(format!("... and {} more", errors.len() - limit));
    }
    lines
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
