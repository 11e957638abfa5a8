// Import of collector output into staging records.
//
// Accepts a JSON array or JSON lines of `{bank, agency, author, rating,
// date, text}` objects. Ratings may be numbers or strings such as "4,0
// étoiles"; the collector writes "Non spécifié" for missing values. Text is
// cleaned (URLs removed, whitespace collapsed), records without usable text
// or with a rating outside 1..=5 are rejected, and duplicates on
// (bank, author, text) are dropped.

use std::collections::HashSet;

use anyhow::{Context, Result};
use regex_lite::Regex;
use serde::Deserialize;
use tracing::debug;

use crate::db::models::Review;

/// Placeholder the collector writes for missing fields.
const MISSING: &str = "Non spécifié";

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawRating {
    Number(f64),
    Text(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawReview {
    #[serde(default)]
    pub review_id: Option<String>,
    pub bank: String,
    #[serde(default)]
    pub agency: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub rating: Option<RawRating>,
    #[serde(default, alias = "review_date")]
    pub date: Option<String>,
    #[serde(default, alias = "review_text")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportSummary {
    pub read: usize,
    pub imported: usize,
    pub duplicates: usize,
    pub rejected: usize,
}

/// Parse a JSON array or JSON lines document.
pub fn parse_records(input: &str) -> Result<Vec<RawReview>> {
    let trimmed = input.trim_start();
    if trimmed.starts_with('[') {
        return serde_json::from_str(trimmed).context("Invalid JSON array of reviews");
    }

    input
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str::<RawReview>(line).with_context(|| format!("Invalid review on line {}", i + 1))
        })
        .collect()
}

pub struct TextCleaner {
    url: Regex,
    whitespace: Regex,
}

impl TextCleaner {
    pub fn new() -> Result<Self> {
        Ok(Self {
            url: Regex::new(r"https?://\S+|www\.\S+")?,
            whitespace: Regex::new(r"\s+")?,
        })
    }

    pub fn clean(&self, text: &str) -> String {
        let without_urls = self.url.replace_all(text, " ");
        self.whitespace.replace_all(&without_urls, " ").trim().to_string()
    }
}

/// Extract a 1..=5 rating. "4,5" and "4 étoiles" are accepted.
pub fn parse_rating(raw: &RawRating) -> Option<f64> {
    let value = match raw {
        RawRating::Number(n) => *n,
        RawRating::Text(s) => {
            let start = s.find(|c: char| c.is_ascii_digit())?;
            let number: String = s[start..]
                .chars()
                .take_while(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
                .map(|c| if c == ',' { '.' } else { c })
                .collect();
            number.trim_end_matches('.').parse().ok()?
        }
    };
    (1.0..=5.0).contains(&value).then_some(value)
}

fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && v != MISSING)
}

/// Turn collector records into staging reviews.
///
/// Records without an id get sequential ids ("1", "2", ...) in input order.
pub fn stage_reviews(records: Vec<RawReview>) -> Result<(Vec<Review>, ImportSummary)> {
    let cleaner = TextCleaner::new()?;
    let mut summary = ImportSummary {
        read: records.len(),
        ..Default::default()
    };
    let mut seen: HashSet<(String, Option<String>, String)> = HashSet::new();
    let mut ids: HashSet<String> = HashSet::new();
    let mut reviews = Vec::new();

    for record in records {
        let text = present(record.text).map(|t| cleaner.clean(&t)).unwrap_or_default();
        let rating = record.rating.as_ref().and_then(parse_rating);
        let bank = record.bank.trim().to_string();

        let (Some(rating), false, false) = (rating, text.is_empty(), bank.is_empty()) else {
            summary.rejected += 1;
            continue;
        };

        let author = present(record.author);
        if !seen.insert((bank.clone(), author.clone(), text.clone())) {
            summary.duplicates += 1;
            continue;
        }

        let review_id = match present(record.review_id) {
            Some(id) => id,
            None => (reviews.len() + 1).to_string(),
        };
        if !ids.insert(review_id.clone()) {
            anyhow::bail!("Duplicate review id {review_id} in import");
        }

        reviews.push(Review {
            review_id,
            bank,
            agency: present(record.agency),
            author,
            rating,
            review_date: present(record.date),
            raw_text: text,
        });
    }

    summary.imported = reviews.len();
    debug!(
        read = summary.read,
        imported = summary.imported,
        duplicates = summary.duplicates,
        rejected = summary.rejected,
        "Staged reviews"
    );
    Ok((reviews, summary))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_array_and_lines() {
        let array = r#"[{"bank": "CIH", "rating": 4, "text": "Bien"}]"#;
        assert_eq!(parse_records(array).unwrap().len(), 1);

        let lines = "{\"bank\": \"CIH\", \"rating\": \"5\", \"text\": \"Top\"}\n\n{\"bank\": \"BMCE\", \"rating\": 1, \"text\": \"Nul\"}\n";
        assert_eq!(parse_records(lines).unwrap().len(), 2);

        let err = parse_records("{\"bank\": \"CIH\"}\nnot json").unwrap_err();
        assert!(format!("{err:#}").contains("line 2"));
    }

    #[test]
    fn test_parse_rating_forms() {
        assert_eq!(parse_rating(&RawRating::Number(4.0)), Some(4.0));
        assert_eq!(parse_rating(&RawRating::Text("4,5".to_string())), Some(4.5));
        assert_eq!(parse_rating(&RawRating::Text("Note : 3 étoiles".to_string())), Some(3.0));
        assert_eq!(parse_rating(&RawRating::Text(MISSING.to_string())), None);
        assert_eq!(parse_rating(&RawRating::Number(0.0)), None);
        assert_eq!(parse_rating(&RawRating::Number(6.0)), None);
    }

    #[test]
    fn test_cleaner_strips_urls_and_whitespace() {
        let cleaner = TextCleaner::new().unwrap();
        assert_eq!(
            cleaner.clean("  Voir   https://example.com/avis \n très  lent "),
            "Voir très lent"
        );
    }

    #[test]
    fn test_stage_reviews_dedupes_and_rejects() {
        let records = parse_records(
            r#"[
                {"bank": "CIH", "author": "Amine", "rating": "5", "text": "Très bon accueil"},
                {"bank": "CIH", "author": "Amine", "rating": 5, "text": "Très  bon accueil"},
                {"bank": "CIH", "author": "Sara", "rating": "Non spécifié", "text": "Sans note"},
                {"bank": "CIH", "author": "Omar", "rating": 2, "text": "Non spécifié"},
                {"bank": "BMCE", "rating": 1, "date": "il y a 2 mois", "text": "Attente interminable"}
            ]"#,
        )
        .unwrap();

        let (reviews, summary) = stage_reviews(records).unwrap();
        assert_eq!(
            summary,
            ImportSummary {
                read: 5,
                imported: 2,
                duplicates: 1,
                rejected: 2,
            }
        );
        assert_eq!(reviews[0].review_id, "1");
        assert_eq!(reviews[1].review_id, "2");
        assert_eq!(reviews[1].author, None);
        assert_eq!(reviews[1].review_date.as_deref(), Some("il y a 2 mois"));
    }
}
