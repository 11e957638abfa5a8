// Database schema: table creation.
//
// `schema_version` records the layout version the tables were created with.

use anyhow::{Context, Result};
use rusqlite::Connection;

/// Create all tables if they don't exist yet. Idempotent.
pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Cleaned, de-duplicated collector output
        CREATE TABLE IF NOT EXISTS stg_reviews (
            review_id TEXT PRIMARY KEY,
            bank TEXT NOT NULL,
            agency TEXT,
            author TEXT,
            rating REAL NOT NULL,              -- 1.0 to 5.0
            review_date TEXT,                  -- as scraped, often relative
            raw_text TEXT NOT NULL,
            text_length INTEGER NOT NULL,      -- characters
            imported_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS sentiment_analysis (
            review_id TEXT PRIMARY KEY,
            sentiment TEXT NOT NULL,           -- positive / neutral / negative
            compound_score REAL NOT NULL,      -- -1.0 to 1.0, drives the label
            secondary_score REAL NOT NULL,     -- -1.0 to 1.0
            confidence REAL NOT NULL,          -- |compound_score|
            analyzed_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS sentiment_errors (
            review_id TEXT PRIMARY KEY,
            message TEXT NOT NULL,
            failed_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS language_tags (
            review_id TEXT PRIMARY KEY,
            language TEXT NOT NULL             -- ISO-639-1 or 'unknown'
        );

        -- One row per topic of each language cohort's model
        CREATE TABLE IF NOT EXISTS topic_models (
            language TEXT NOT NULL,
            topic_id INTEGER NOT NULL,
            keywords TEXT NOT NULL,            -- JSON array, heaviest first
            weight_sum REAL NOT NULL,
            category TEXT NOT NULL,
            category_confidence REAL NOT NULL,
            document_count INTEGER NOT NULL,   -- repeated on each topic row of the model
            vocabulary_size INTEGER NOT NULL,
            built_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (language, topic_id)
        );

        CREATE TABLE IF NOT EXISTS topic_analysis (
            review_id TEXT PRIMARY KEY,
            language TEXT NOT NULL,
            topic_id INTEGER NOT NULL,
            category TEXT NOT NULL,
            confidence REAL NOT NULL,          -- max topic probability
            keywords TEXT NOT NULL,            -- JSON array, first 5 keywords of the topic
            analyzed_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Latest quality report, stored as JSON
        CREATE TABLE IF NOT EXISTS quality_report (
            id INTEGER PRIMARY KEY CHECK (id = 1),  -- singleton row
            report_json TEXT NOT NULL,
            warning_count INTEGER NOT NULL,
            generated_at TEXT NOT NULL
        );

        -- Last-run timestamps per stage
        CREATE TABLE IF NOT EXISTS run_state (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_reviews_bank
            ON stg_reviews(bank);

        CREATE INDEX IF NOT EXISTS idx_topic_category
            ON topic_analysis(category);
        ",
    )
    .context("Failed to create database tables")?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [1],
    )?;

    Ok(())
}

/// Count the tables in the database (for init confirmation).
pub fn table_count(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
        [],
        |row| row.get(0),
    )?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_tables_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        create_tables(&conn).unwrap();
    }

    #[test]
    fn test_table_count() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        // schema_version, stg_reviews, sentiment_analysis, sentiment_errors,
        // language_tags, topic_models, topic_analysis, quality_report, run_state
        assert_eq!(table_count(&conn).unwrap(), 9i64);
    }

    #[test]
    fn test_topic_models_store_corpus_statistics() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();

        conn.execute(
            "INSERT INTO topic_models
                (language, topic_id, keywords, weight_sum, category, category_confidence,
                 document_count, vocabulary_size)
             VALUES ('fr', 0, '[]', 1.0, 'fees', 0.5, 42, 100)",
            [],
        )
        .unwrap();

        let (docs, vocab): (i64, i64) = conn
            .query_row(
                "SELECT document_count, vocabulary_size FROM topic_models WHERE language = 'fr'",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!((docs, vocab), (42, 100));
    }

    #[test]
    fn test_quality_report_is_singleton() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        let result = conn.execute(
            "INSERT INTO quality_report (id, report_json, warning_count, generated_at)
             VALUES (2, '{}', 0, 'now')",
            [],
        );
        assert!(result.is_err());
    }
}
