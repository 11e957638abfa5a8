// Stop-word sets for topic modeling.
//
// The active set is the union of the generic English list from the
// `stop-words` crate and curated French and Arabic lists. The curated lists
// include bank-domain nouns (service, agence, staff, ...) that appear in
// nearly every review and would otherwise dominate every topic.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use stop_words::{get, LANGUAGE};

pub const FRENCH_STOPWORDS: &[&str] = &[
    "le", "la", "les", "de", "des", "du", "et", "à", "au", "aux", "un", "une",
    "il", "elle", "ils", "elles", "être", "est", "sont", "était", "été", "en",
    "avoir", "ont", "avait", "que", "qui", "quoi", "pour", "dans", "ce", "cet",
    "cette", "ces", "son", "sa", "ses", "sur", "avec", "ne", "se", "pas",
    "tout", "tous", "toute", "plus", "par", "grand", "bien", "autre", "mais",
    "très", "bon", "mon", "mes", "nous", "vous", "votre", "notre", "leur",
    "même", "comme", "fait", "aussi", "encore", "chez", "où", "donc", "car",
    "rien", "jamais", "toujours", "alors",
];

pub const ARABIC_STOPWORDS: &[&str] = &[
    "في", "من", "إلى", "على", "مع", "هذا", "هذه", "التي", "الذي", "كان", "كانت",
    "يكون", "تكون", "لا", "ما", "إن", "أن", "قد", "لقد", "كل", "بعض", "جميع",
    "عن", "هو", "هي", "ذلك", "لكن", "او", "أو", "ثم",
];

/// High-frequency nouns of the banking domain.
pub const DOMAIN_STOPWORDS: &[&str] = &[
    "service", "banque", "agence", "personnel", "client", "clients", "bank",
    "agency", "staff", "branch", "البنك", "الوكالة",
];

/// Optional replacements/extensions read from REVIEWLENS_STOPWORDS_PATH.
///
/// ```json
/// { "french": ["le", "la"], "arabic": ["في"], "extra": ["guichet"] }
/// ```
/// A present `french`/`arabic` list replaces the curated one; `extra` is
/// always added.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StopWordOverrides {
    pub french: Option<Vec<String>>,
    pub arabic: Option<Vec<String>>,
    #[serde(default)]
    pub extra: Vec<String>,
}

impl StopWordOverrides {
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read stop-word file {}", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Invalid stop-word file {}", path.display()))
    }
}

#[derive(Debug, Clone)]
pub struct StopWords {
    words: HashSet<String>,
}

impl Default for StopWords {
    fn default() -> Self {
        Self::from_overrides(&StopWordOverrides::default())
    }
}

impl StopWords {
    pub fn from_overrides(overrides: &StopWordOverrides) -> Self {
        let mut words: HashSet<String> = get(LANGUAGE::English).into_iter().collect();

        match &overrides.french {
            Some(list) => words.extend(list.iter().map(|w| w.to_lowercase())),
            None => words.extend(FRENCH_STOPWORDS.iter().map(|w| w.to_string())),
        }
        match &overrides.arabic {
            Some(list) => words.extend(list.iter().cloned()),
            None => words.extend(ARABIC_STOPWORDS.iter().map(|w| w.to_string())),
        }
        words.extend(DOMAIN_STOPWORDS.iter().map(|w| w.to_string()));
        words.extend(overrides.extra.iter().map(|w| w.to_lowercase()));

        Self { words }
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_includes_all_sources() {
        let sw = StopWords::default();
        assert!(sw.contains("the"));
        assert!(sw.contains("dans"));
        assert!(sw.contains("هذا"));
        assert!(sw.contains("agence"));
        assert!(sw.contains("staff"));
        assert!(!sw.contains("attente"));
    }

    #[test]
    fn test_overrides_replace_and_extend() {
        let overrides = StopWordOverrides {
            french: Some(vec!["Attente".to_string()]),
            arabic: None,
            extra: vec!["guichet".to_string()],
        };
        let sw = StopWords::from_overrides(&overrides);
        assert!(sw.contains("attente"));
        assert!(sw.contains("guichet"));
        // Curated French list was replaced
        assert!(!sw.contains("dans"));
        // Domain nouns are always present
        assert!(sw.contains("banque"));
    }
}
