// Database queries: every SQL statement lives here.
//
// Result sets are replaced in full: each replace_* function deletes and
// re-inserts inside one transaction, so a failed run leaves the previous
// results intact.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};

use super::models::{
    LanguageTag, Review, SentimentError, SentimentLabel, SentimentResult, Topic, TopicAssignment,
    TopicModel,
};
use crate::validation::QualityReport;

// --- Run state ---

/// Get a run state value by key (e.g., "last_sentiment_run").
pub fn get_run_state(conn: &Connection, key: &str) -> Result<Option<String>> {
    let mut stmt = conn.prepare("SELECT value FROM run_state WHERE key = ?1")?;
    let result = stmt.query_row(params![key], |row| row.get(0)).optional()?;
    Ok(result)
}

/// Set a run state value (upsert).
pub fn set_run_state(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO run_state (key, value, updated_at)
         VALUES (?1, ?2, datetime('now'))
         ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
        params![key, value],
    )?;
    Ok(())
}

// --- Staging reviews ---

/// Replace the staging table with `reviews` and clear every derived result
/// set, so later stages never mix results from an earlier import.
pub fn replace_reviews(conn: &Connection, reviews: &[Review]) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(
        "DELETE FROM stg_reviews;
         DELETE FROM sentiment_analysis;
         DELETE FROM sentiment_errors;
         DELETE FROM language_tags;
         DELETE FROM topic_analysis;
         DELETE FROM topic_models;
         DELETE FROM quality_report;
         DELETE FROM run_state;",
    )
    .context("Failed to clear previous import")?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO stg_reviews
                (review_id, bank, agency, author, rating, review_date, raw_text, text_length)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )?;
        for review in reviews {
            stmt.execute(params![
                review.review_id,
                review.bank,
                review.agency,
                review.author,
                review.rating,
                review.review_date,
                review.raw_text,
                review.text_length() as i64,
            ])
            .with_context(|| format!("Failed to stage review {}", review.review_id))?;
        }
    }
    tx.commit()?;
    Ok(reviews.len())
}

/// All staged reviews, in import order.
pub fn load_reviews(conn: &Connection) -> Result<Vec<Review>> {
    let mut stmt = conn.prepare(
        "SELECT review_id, bank, agency, author, rating, review_date, raw_text
         FROM stg_reviews
         ORDER BY rowid",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(Review {
            review_id: row.get(0)?,
            bank: row.get(1)?,
            agency: row.get(2)?,
            author: row.get(3)?,
            rating: row.get(4)?,
            review_date: row.get(5)?,
            raw_text: row.get(6)?,
        })
    })?;

    let mut reviews = Vec::new();
    for row in rows {
        reviews.push(row?);
    }
    Ok(reviews)
}

// --- Sentiment + language ---

/// Replace sentiment results, sentiment errors and language tags together.
pub fn replace_sentiment<'a>(
    conn: &Connection,
    results: impl IntoIterator<Item = &'a SentimentResult>,
    errors: impl IntoIterator<Item = &'a SentimentError>,
    tags: impl IntoIterator<Item = &'a LanguageTag>,
) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(
        "DELETE FROM sentiment_analysis;
         DELETE FROM sentiment_errors;
         DELETE FROM language_tags;",
    )?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO sentiment_analysis
                (review_id, sentiment, compound_score, secondary_score, confidence)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        for r in results {
            stmt.execute(params![
                r.review_id,
                r.sentiment.as_str(),
                r.compound_score,
                r.secondary_score,
                r.confidence,
            ])?;
        }

        let mut stmt =
            tx.prepare("INSERT INTO sentiment_errors (review_id, message) VALUES (?1, ?2)")?;
        for e in errors {
            stmt.execute(params![e.review_id, e.message])?;
        }

        let mut stmt =
            tx.prepare("INSERT INTO language_tags (review_id, language) VALUES (?1, ?2)")?;
        for t in tags {
            stmt.execute(params![t.review_id, t.language])?;
        }
    }
    tx.commit()?;
    Ok(())
}

pub fn load_sentiments(conn: &Connection) -> Result<BTreeMap<String, SentimentResult>> {
    let mut stmt = conn.prepare(
        "SELECT review_id, sentiment, compound_score, secondary_score, confidence
         FROM sentiment_analysis",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, f64>(2)?,
            row.get::<_, f64>(3)?,
            row.get::<_, f64>(4)?,
        ))
    })?;

    let mut results = BTreeMap::new();
    for row in rows {
        let (review_id, label, compound_score, secondary_score, confidence) = row?;
        let Some(sentiment) = SentimentLabel::parse(&label) else {
            anyhow::bail!("Unknown sentiment label '{label}' for review {review_id}");
        };
        results.insert(
            review_id.clone(),
            SentimentResult {
                review_id,
                sentiment,
                compound_score,
                secondary_score,
                confidence,
            },
        );
    }
    Ok(results)
}

pub fn load_sentiment_errors(conn: &Connection) -> Result<Vec<SentimentError>> {
    let mut stmt =
        conn.prepare("SELECT review_id, message FROM sentiment_errors ORDER BY review_id")?;
    let rows = stmt.query_map([], |row| {
        Ok(SentimentError {
            review_id: row.get(0)?,
            message: row.get(1)?,
        })
    })?;

    let mut errors = Vec::new();
    for row in rows {
        errors.push(row?);
    }
    Ok(errors)
}

pub fn load_language_tags(conn: &Connection) -> Result<BTreeMap<String, LanguageTag>> {
    let mut stmt = conn.prepare("SELECT review_id, language FROM language_tags")?;
    let rows = stmt.query_map([], |row| {
        Ok(LanguageTag {
            review_id: row.get(0)?,
            language: row.get(1)?,
        })
    })?;

    let mut tags = BTreeMap::new();
    for row in rows {
        let tag = row?;
        tags.insert(tag.review_id.clone(), tag);
    }
    Ok(tags)
}

// --- Topics ---

/// Replace all topic models and assignments in one transaction.
pub fn replace_topics<'a>(
    conn: &Connection,
    models: &[TopicModel],
    assignments: impl IntoIterator<Item = &'a TopicAssignment>,
) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(
        "DELETE FROM topic_models;
         DELETE FROM topic_analysis;",
    )?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO topic_models
                (language, topic_id, keywords, weight_sum, category, category_confidence,
                 document_count, vocabulary_size)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )?;
        for model in models {
            for topic in &model.topics {
                stmt.execute(params![
                    model.language,
                    topic.topic_id as i64,
                    serde_json::to_string(&topic.keywords)?,
                    topic.weight_sum,
                    topic.category,
                    topic.category_confidence,
                    model.document_count as i64,
                    model.vocabulary_size as i64,
                ])?;
            }
        }

        let mut stmt = tx.prepare(
            "INSERT INTO topic_analysis
                (review_id, language, topic_id, category, confidence, keywords)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        for a in assignments {
            stmt.execute(params![
                a.review_id,
                a.language,
                a.topic_id as i64,
                a.category,
                a.confidence,
                serde_json::to_string(&a.keywords)?,
            ])?;
        }
    }
    tx.commit()?;
    Ok(())
}

/// Stored topic models, sorted by language then topic id.
pub fn load_topic_models(conn: &Connection) -> Result<Vec<TopicModel>> {
    let mut stmt = conn.prepare(
        "SELECT language, topic_id, keywords, weight_sum, category, category_confidence,
                document_count, vocabulary_size
         FROM topic_models
         ORDER BY language, topic_id",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, i64>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, f64>(3)?,
            row.get::<_, String>(4)?,
            row.get::<_, f64>(5)?,
            row.get::<_, i64>(6)?,
            row.get::<_, i64>(7)?,
        ))
    })?;

    let mut models: Vec<TopicModel> = Vec::new();
    for row in rows {
        let (language, topic_id, keywords, weight_sum, category, category_confidence, docs, vocab) =
            row?;
        let topic = Topic {
            topic_id: topic_id as usize,
            keywords: serde_json::from_str(&keywords)
                .with_context(|| format!("Bad keywords for {language} topic {topic_id}"))?,
            weight_sum,
            category,
            category_confidence,
        };
        match models.last_mut() {
            Some(model) if model.language == language => model.topics.push(topic),
            _ => models.push(TopicModel {
                language,
                document_count: docs as usize,
                vocabulary_size: vocab as usize,
                topics: vec![topic],
            }),
        }
    }
    Ok(models)
}

pub fn load_topic_assignments(conn: &Connection) -> Result<BTreeMap<String, TopicAssignment>> {
    let mut stmt = conn.prepare(
        "SELECT review_id, language, topic_id, category, confidence, keywords
         FROM topic_analysis",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, i64>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, f64>(4)?,
            row.get::<_, String>(5)?,
        ))
    })?;

    let mut assignments = BTreeMap::new();
    for row in rows {
        let (review_id, language, topic_id, category, confidence, keywords) = row?;
        let keywords: Vec<String> = serde_json::from_str(&keywords)
            .with_context(|| format!("Bad keywords for review {review_id}"))?;
        assignments.insert(
            review_id.clone(),
            TopicAssignment {
                review_id,
                language,
                topic_id: topic_id as usize,
                category,
                confidence,
                keywords,
            },
        );
    }
    Ok(assignments)
}

// --- Quality report ---

/// Store the latest report (singleton, id = 1).
pub fn save_quality_report(conn: &Connection, report: &QualityReport) -> Result<()> {
    let json = serde_json::to_string(report)?;
    conn.execute(
        "INSERT INTO quality_report (id, report_json, warning_count, generated_at)
         VALUES (1, ?1, ?2, ?3)
         ON CONFLICT(id) DO UPDATE SET
            report_json = ?1,
            warning_count = ?2,
            generated_at = ?3",
        params![
            json,
            report.warnings.len() as i64,
            report.generated_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub fn get_quality_report(conn: &Connection) -> Result<Option<QualityReport>> {
    let mut stmt = conn.prepare("SELECT report_json FROM quality_report WHERE id = 1")?;
    let json: Option<String> = stmt.query_row([], |row| row.get(0)).optional()?;
    match json {
        Some(json) => Ok(Some(
            serde_json::from_str(&json).context("Stored quality report is not valid JSON")?,
        )),
        None => Ok(None),
    }
}

// --- Counts ---

/// Row counts of the staging and result tables, in a fixed order.
pub fn table_row_counts(conn: &Connection) -> Result<Vec<(&'static str, i64)>> {
    const TABLES: [&str; 6] = [
        "stg_reviews",
        "sentiment_analysis",
        "sentiment_errors",
        "language_tags",
        "topic_models",
        "topic_analysis",
    ];
    let mut counts = Vec::with_capacity(TABLES.len());
    for table in TABLES {
        let count: i64 =
            conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
        counts.push((table, count));
    }
    Ok(counts)
}

pub fn count_sentiment_errors(conn: &Connection) -> Result<usize> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM sentiment_errors", [], |row| row.get(0))?;
    Ok(count as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::create_tables;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        conn
    }

    #[test]
    fn test_run_state_upsert() {
        let conn = conn();
        assert_eq!(get_run_state(&conn, "last_run").unwrap(), None);
        set_run_state(&conn, "last_run", "a").unwrap();
        set_run_state(&conn, "last_run", "b").unwrap();
        assert_eq!(get_run_state(&conn, "last_run").unwrap().as_deref(), Some("b"));
    }

    #[test]
    fn test_reviews_replace_and_keep_order() {
        let conn = conn();
        let mut second = Review::new("10", "BMCE", 2.0, "Attente");
        second.author = Some("Sara".to_string());
        replace_reviews(&conn, &[Review::new("9", "CIH", 5.0, "Parfait"), second]).unwrap();

        let loaded = load_reviews(&conn).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].review_id, "9");
        assert_eq!(loaded[1].author.as_deref(), Some("Sara"));

        // Replacing drops previous rows
        replace_reviews(&conn, &[Review::new("1", "CIH", 3.0, "Moyen")]).unwrap();
        assert_eq!(load_reviews(&conn).unwrap().len(), 1);
    }

    #[test]
    fn test_reimport_clears_derived_results() {
        let conn = conn();
        replace_reviews(&conn, &[Review::new("1", "CIH", 5.0, "Parfait")]).unwrap();
        let result = SentimentResult {
            review_id: "1".to_string(),
            sentiment: SentimentLabel::Positive,
            compound_score: 0.6,
            secondary_score: 0.5,
            confidence: 0.6,
        };
        let error = SentimentError {
            review_id: "1".to_string(),
            message: "boom".to_string(),
        };
        let tag = LanguageTag { review_id: "1".to_string(), language: "fr".to_string() };
        replace_sentiment(&conn, [&result], [&error], [&tag]).unwrap();
        set_run_state(&conn, "last_sentiment_run", "2026-01-01T00:00:00Z").unwrap();

        replace_reviews(&conn, &[Review::new("1", "CIH", 1.0, "Nul")]).unwrap();
        assert_eq!(load_reviews(&conn).unwrap()[0].rating, 1.0);
        assert!(load_sentiments(&conn).unwrap().is_empty());
        assert!(load_sentiment_errors(&conn).unwrap().is_empty());
        assert!(load_language_tags(&conn).unwrap().is_empty());
        assert!(load_topic_models(&conn).unwrap().is_empty());
        assert!(get_quality_report(&conn).unwrap().is_none());
        assert_eq!(get_run_state(&conn, "last_sentiment_run").unwrap(), None);
    }

    #[test]
    fn test_sentiment_round_trip() {
        let conn = conn();
        let result = SentimentResult {
            review_id: "1".to_string(),
            sentiment: SentimentLabel::Negative,
            compound_score: -0.58,
            secondary_score: -0.7,
            confidence: 0.58,
        };
        let error = SentimentError {
            review_id: "2".to_string(),
            message: "boom".to_string(),
        };
        let tags = [
            LanguageTag { review_id: "1".to_string(), language: "fr".to_string() },
            LanguageTag { review_id: "2".to_string(), language: "unknown".to_string() },
        ];
        replace_sentiment(&conn, [&result], [&error], &tags).unwrap();

        assert_eq!(load_sentiments(&conn).unwrap()["1"], result);
        assert_eq!(load_sentiment_errors(&conn).unwrap(), vec![error]);
        assert_eq!(count_sentiment_errors(&conn).unwrap(), 1);
        assert_eq!(load_language_tags(&conn).unwrap().len(), 2);

        replace_sentiment(&conn, [], [], []).unwrap();
        assert!(load_sentiments(&conn).unwrap().is_empty());
        assert!(load_language_tags(&conn).unwrap().is_empty());
    }

    #[test]
    fn test_topics_round_trip() {
        let conn = conn();
        let model = TopicModel {
            language: "fr".to_string(),
            document_count: 12,
            vocabulary_size: 40,
            topics: vec![
                Topic {
                    topic_id: 0,
                    keywords: vec!["frais".to_string(), "cher".to_string()],
                    weight_sum: 3.5,
                    category: "fees".to_string(),
                    category_confidence: 1.0,
                },
                Topic {
                    topic_id: 1,
                    keywords: vec!["attente".to_string()],
                    weight_sum: 2.0,
                    category: "wait_time".to_string(),
                    category_confidence: 1.0,
                },
            ],
        };
        let assignment = TopicAssignment {
            review_id: "7".to_string(),
            language: "fr".to_string(),
            topic_id: 1,
            category: "wait_time".to_string(),
            confidence: 0.8,
            keywords: vec!["attente".to_string()],
        };
        replace_topics(&conn, std::slice::from_ref(&model), [&assignment]).unwrap();

        assert_eq!(load_topic_models(&conn).unwrap(), vec![model]);
        assert_eq!(load_topic_assignments(&conn).unwrap()["7"], assignment);

        replace_topics(&conn, &[], []).unwrap();
        assert!(load_topic_models(&conn).unwrap().is_empty());
        assert!(load_topic_assignments(&conn).unwrap().is_empty());
    }

    #[test]
    fn test_row_counts() {
        let conn = conn();
        replace_reviews(&conn, &[Review::new("1", "CIH", 3.0, "Moyen")]).unwrap();
        let counts = table_row_counts(&conn).unwrap();
        assert_eq!(counts[0], ("stg_reviews", 1));
        assert!(counts[1..].iter().all(|(_, n)| *n == 0));
    }
}
