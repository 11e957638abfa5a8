// Business-category mapping for topic keywords.
//
// Score of a category = number of (topic keyword, category keyword) pairs
// where the category keyword is a substring of the topic keyword. The first
// declared category with the strictly highest score wins, so declaration
// order is the tie-break. A best score of zero maps to "other".

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::db::models::Topic;

use super::modeler::TopicTerms;

pub const OTHER_CATEGORY: &str = "other";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryDefinition {
    pub name: String,
    pub keywords: Vec<String>,
}

impl CategoryDefinition {
    fn new(name: &str, keywords: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }

    /// Number of topic keywords containing at least one category keyword.
    pub fn score(&self, topic_keywords: &[String]) -> usize {
        topic_keywords
            .iter()
            .filter(|word| self.keywords.iter().any(|k| word.contains(k.as_str())))
            .count()
    }
}

/// Ordered list of categories. Order is significant for ties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Taxonomy {
    pub categories: Vec<CategoryDefinition>,
}

impl Default for Taxonomy {
    fn default() -> Self {
        Self {
            categories: vec![
                CategoryDefinition::new(
                    "customer_service",
                    &[
                        "service", "personnel", "accueil", "staff", "équipe", "conseiller",
                        "employé", "guichetier", "agent", "responsable", "خدمة", "موظف",
                    ],
                ),
                CategoryDefinition::new(
                    "wait_time",
                    &[
                        "attente", "rapide", "lent", "temps", "queue", "file", "heure",
                        "wait", "slow", "انتظار", "وقت",
                    ],
                ),
                CategoryDefinition::new(
                    "fees",
                    &[
                        "frais", "cher", "prix", "tarif", "coût", "commission", "fee",
                        "price", "expensive", "رسوم", "ثمن",
                    ],
                ),
                CategoryDefinition::new(
                    "digital_channels",
                    &[
                        "application", "app", "site", "internet", "digital", "technologie",
                        "ligne", "online", "mobile", "carte", "تطبيق",
                    ],
                ),
                CategoryDefinition::new(
                    "location_access",
                    &[
                        "parking", "accès", "location", "proche", "loin", "centre",
                        "adresse", "distance", "access", "موقف", "مكان",
                    ],
                ),
            ],
        }
    }
}

impl Taxonomy {
    /// Load a taxonomy from a JSON file (`{"categories": [{"name", "keywords"}]}`).
    /// Keywords are lowercased; names must be unique and non-empty.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read taxonomy file {}", path.display()))?;
        let mut taxonomy: Taxonomy = serde_json::from_str(&json)
            .with_context(|| format!("Invalid taxonomy file {}", path.display()))?;

        for category in &mut taxonomy.categories {
            category.keywords = category.keywords.iter().map(|k| k.to_lowercase()).collect();
        }
        taxonomy.validate()?;
        Ok(taxonomy)
    }

    pub fn validate(&self) -> Result<()> {
        if self.categories.is_empty() {
            anyhow::bail!("Taxonomy has no categories");
        }
        for (i, category) in self.categories.iter().enumerate() {
            if category.name.trim().is_empty() {
                anyhow::bail!("Taxonomy category {i} has an empty name");
            }
            if category.name == OTHER_CATEGORY {
                anyhow::bail!("'{OTHER_CATEGORY}' is reserved for unmatched topics");
            }
            if self.categories[..i].iter().any(|c| c.name == category.name) {
                anyhow::bail!("Duplicate taxonomy category '{}'", category.name);
            }
            if category.keywords.iter().any(|k| k.is_empty()) {
                anyhow::bail!("Taxonomy category '{}' has an empty keyword", category.name);
            }
        }
        Ok(())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|c| c.name.as_str())
    }

    /// Map topic keywords to (category, confidence).
    ///
    /// confidence = best score / number of topic keywords, 0 for "other".
    pub fn categorize(&self, topic_keywords: &[String]) -> (String, f64) {
        let mut best: Option<(&str, usize)> = None;
        for category in &self.categories {
            let score = category.score(topic_keywords);
            if best.map_or(true, |(_, b)| score > b) {
                best = Some((category.name.as_str(), score));
            }
        }

        match best {
            Some((name, score)) if score > 0 => {
                let confidence = score as f64 / topic_keywords.len() as f64;
                (name.to_string(), confidence)
            }
            _ => (OTHER_CATEGORY.to_string(), 0.0),
        }
    }

    /// Attach a category to each inferred topic.
    pub fn categorize_topics(&self, topics: &[TopicTerms]) -> Vec<Topic> {
        topics
            .iter()
            .map(|terms| {
                let (category, category_confidence) = self.categorize(&terms.keywords);
                Topic {
                    topic_id: terms.topic_id,
                    keywords: terms.keywords.clone(),
                    weight_sum: terms.weight_sum,
                    category,
                    category_confidence,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kw(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_fees_example() {
        let (category, confidence) = Taxonomy::default()
            .categorize(&kw(&["frais", "cher", "gratuit", "prix", "parking", "loin"]));
        assert_eq!(category, "fees");
        assert!((confidence - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_substring_matching() {
        // "attente" matches inside "attentes", "lent" inside "lenteur"
        let (category, confidence) = Taxonomy::default().categorize(&kw(&["attentes", "lenteur"]));
        assert_eq!(category, "wait_time");
        assert_eq!(confidence, 1.0);
    }

    #[test]
    fn test_first_declared_category_wins_ties() {
        // One hit each for customer_service and wait_time
        let (category, _) = Taxonomy::default().categorize(&kw(&["accueil", "attente"]));
        assert_eq!(category, "customer_service");
    }

    #[test]
    fn test_no_match_is_other() {
        assert_eq!(
            Taxonomy::default().categorize(&kw(&["xyz", "qqq"])),
            (OTHER_CATEGORY.to_string(), 0.0)
        );
        assert_eq!(
            Taxonomy::default().categorize(&[]),
            (OTHER_CATEGORY.to_string(), 0.0)
        );
    }

    #[test]
    fn test_validate_rejects_bad_taxonomies() {
        let empty = Taxonomy { categories: Vec::new() };
        assert!(empty.validate().is_err());

        let dup = Taxonomy {
            categories: vec![
                CategoryDefinition::new("fees", &["frais"]),
                CategoryDefinition::new("fees", &["prix"]),
            ],
        };
        assert!(dup.validate().is_err());

        let reserved = Taxonomy {
            categories: vec![CategoryDefinition::new("other", &["x"])],
        };
        assert!(reserved.validate().is_err());

        assert!(Taxonomy::default().validate().is_ok());
    }

    #[test]
    fn test_categorize_topics_keeps_terms() {
        let terms = vec![TopicTerms {
            topic_id: 3,
            keywords: kw(&["application", "mobile"]),
            weight_sum: 4.2,
        }];
        let topics = Taxonomy::default().categorize_topics(&terms);
        assert_eq!(topics[0].topic_id, 3);
        assert_eq!(topics[0].category, "digital_channels");
        // "application" matches both "application" and "app" but counts once
        assert_eq!(topics[0].category_confidence, 1.0);
    }

    #[test]
    fn test_keyword_counts_once_per_category() {
        // fees is declared before digital_channels, so the 1-1 tie goes to fees
        let (category, confidence) = Taxonomy::default().categorize(&kw(&["application", "frais"]));
        assert_eq!(category, "fees");
        assert_eq!(confidence, 0.5);

        let digital = &Taxonomy::default().categories[3];
        assert_eq!(digital.score(&kw(&["application"])), 1);
    }
}
