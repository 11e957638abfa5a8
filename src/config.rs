use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};

use crate::language::LanguageDetector;
use crate::sentiment::SentimentThresholds;
use crate::topics::lda::LdaConfig;
use crate::topics::stopwords::{StopWordOverrides, StopWords};
use crate::topics::{Taxonomy, TopicModelParams};
use crate::validation::QualityThresholds;

/// Central configuration loaded from environment variables.
///
/// The .env file is loaded automatically at startup via dotenvy. Every
/// value has a default; malformed values are an error rather than silently
/// ignored.
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: String,
    /// Reviews scored in parallel
    pub concurrency: usize,
    pub sentiment: SentimentThresholds,
    pub topics: TopicModelParams,
    /// Reviews with this many characters or fewer are left out of topic modeling
    pub min_topic_text_chars: usize,
    pub quality: QualityThresholds,
    pub taxonomy_path: Option<PathBuf>,
    pub stopwords_path: Option<PathBuf>,
    /// ISO-639-1 codes the detector may answer with; empty = all supported
    pub languages: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: "./reviewlens.db".to_string(),
            concurrency: 8,
            sentiment: SentimentThresholds::default(),
            topics: TopicModelParams::default(),
            min_topic_text_chars: 20,
            quality: QualityThresholds::default(),
            taxonomy_path: None,
            stopwords_path: None,
            languages: Vec::new(),
        }
    }
}

/// Parse an optional env var, falling back to `default` when unset.
fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("{name} has an invalid value: {raw:?}")),
        _ => Ok(default),
    }
}

fn path_var(name: &str) -> Option<PathBuf> {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
}

impl Config {
    pub fn load() -> Result<Self> {
        let defaults = Self::default();

        let n_topics = parse_var("REVIEWLENS_TOPIC_COUNT", defaults.topics.n_topics())?;
        let lda = LdaConfig::new(n_topics)
            .seed(parse_var("REVIEWLENS_LDA_SEED", defaults.topics.lda.seed)?)
            .max_iter(parse_var("REVIEWLENS_LDA_MAX_ITER", defaults.topics.lda.max_iter)?);

        let config = Self {
            db_path: env::var("REVIEWLENS_DB_PATH").unwrap_or(defaults.db_path),
            concurrency: parse_var("REVIEWLENS_CONCURRENCY", defaults.concurrency)?,
            sentiment: SentimentThresholds {
                positive: parse_var("REVIEWLENS_SENTIMENT_POSITIVE", defaults.sentiment.positive)?,
                negative: parse_var("REVIEWLENS_SENTIMENT_NEGATIVE", defaults.sentiment.negative)?,
            },
            topics: TopicModelParams {
                min_documents: parse_var(
                    "REVIEWLENS_MIN_COHORT_SIZE",
                    defaults.topics.min_documents,
                )?,
                lda,
                ..defaults.topics
            },
            min_topic_text_chars: parse_var(
                "REVIEWLENS_MIN_TOPIC_TEXT_CHARS",
                defaults.min_topic_text_chars,
            )?,
            quality: QualityThresholds {
                min_sentiment_coverage: parse_var(
                    "REVIEWLENS_MIN_SENTIMENT_COVERAGE",
                    defaults.quality.min_sentiment_coverage,
                )?,
                min_topic_coverage: parse_var(
                    "REVIEWLENS_MIN_TOPIC_COVERAGE",
                    defaults.quality.min_topic_coverage,
                )?,
                min_coherence: parse_var("REVIEWLENS_MIN_COHERENCE", defaults.quality.min_coherence)?,
                min_confidence: parse_var(
                    "REVIEWLENS_MIN_CONFIDENCE",
                    defaults.quality.min_confidence,
                )?,
            },
            taxonomy_path: path_var("REVIEWLENS_TAXONOMY_PATH"),
            stopwords_path: path_var("REVIEWLENS_STOPWORDS_PATH"),
            languages: env::var("REVIEWLENS_LANGUAGES")
                .map(|v| parse_language_list(&v))
                .unwrap_or_default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject combinations the pipeline can't run with.
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            anyhow::bail!("REVIEWLENS_CONCURRENCY must be at least 1");
        }
        if self.topics.n_topics() == 0 {
            anyhow::bail!("REVIEWLENS_TOPIC_COUNT must be at least 1");
        }
        if self.sentiment.negative >= self.sentiment.positive {
            anyhow::bail!(
                "REVIEWLENS_SENTIMENT_NEGATIVE ({}) must be below REVIEWLENS_SENTIMENT_POSITIVE ({})",
                self.sentiment.negative,
                self.sentiment.positive
            );
        }
        Ok(())
    }

    /// The configured taxonomy file, or the built-in taxonomy.
    pub fn taxonomy(&self) -> Result<Taxonomy> {
        match &self.taxonomy_path {
            Some(path) => Taxonomy::load(path),
            None => Ok(Taxonomy::default()),
        }
    }

    /// Built-in stop words, adjusted by the configured override file.
    pub fn stop_words(&self) -> Result<StopWords> {
        let overrides = match &self.stopwords_path {
            Some(path) => StopWordOverrides::load(path)?,
            None => StopWordOverrides::default(),
        };
        Ok(StopWords::from_overrides(&overrides))
    }

    pub fn detector(&self) -> Result<LanguageDetector> {
        if self.languages.is_empty() {
            Ok(LanguageDetector::new())
        } else {
            LanguageDetector::with_languages(&self.languages)
        }
    }
}

fn parse_language_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|code| code.trim().to_lowercase())
        .filter(|code| !code.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.topics.n_topics(), 5);
        assert_eq!(config.topics.lda.seed, 42);
        assert_eq!(config.topics.min_documents, 10);
        assert_eq!(config.min_topic_text_chars, 20);
    }

    #[test]
    fn test_validate_rejects_inverted_thresholds() {
        let config = Config {
            sentiment: SentimentThresholds {
                positive: -0.1,
                negative: 0.1,
            },
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_language_list_parsing() {
        assert_eq!(parse_language_list(" FR, ar ,,en"), vec!["fr", "ar", "en"]);
        assert!(parse_language_list("").is_empty());
    }

    #[test]
    fn test_builtin_taxonomy_and_stop_words() {
        let config = Config::default();
        assert_eq!(config.taxonomy().unwrap(), Taxonomy::default());
        assert!(config.stop_words().unwrap().contains("banque"));
        assert!(config.detector().is_ok());
    }
}
