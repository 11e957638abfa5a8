// Text normalization for topic modeling.
//
// Order matters: lowercase, turn punctuation into spaces (not deletion, so
// "lent,attente" stays two words), strip digits, collapse whitespace, split,
// drop short tokens, drop stop words.

use super::stopwords::StopWords;

/// Tokens of this many characters or fewer are dropped.
pub const MAX_DROPPED_TOKEN_CHARS: usize = 2;

#[derive(Debug, Clone, Default)]
pub struct TextNormalizer {
    stop_words: StopWords,
}

impl TextNormalizer {
    pub fn new(stop_words: StopWords) -> Self {
        Self { stop_words }
    }

    /// Clean and tokenize a text. May return an empty vector.
    pub fn normalize(&self, text: &str) -> Vec<String> {
        let lower = text.to_lowercase();

        let mut cleaned = String::with_capacity(lower.len());
        for c in lower.chars() {
            if is_arabic_mark(c) || c.is_numeric() {
                continue;
            }
            if c.is_alphanumeric() || c == '_' {
                cleaned.push(c);
            } else {
                cleaned.push(' ');
            }
        }

        cleaned
            .split_whitespace()
            .filter(|token| token.chars().count() > MAX_DROPPED_TOKEN_CHARS)
            .filter(|token| !self.stop_words.contains(token))
            .map(str::to_string)
            .collect()
    }

    /// Re-normalize already tokenized text (tokens joined by spaces).
    pub fn normalize_tokens(&self, tokens: &[String]) -> Vec<String> {
        self.normalize(&tokens.join(" "))
    }
}

/// Arabic harakat and tatweel. Dropped rather than spaced so a vocalized
/// word stays one token.
fn is_arabic_mark(c: char) -> bool {
    matches!(c, '\u{064B}'..='\u{065F}' | '\u{0670}' | '\u{0640}')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> TextNormalizer {
        TextNormalizer::default()
    }

    #[test]
    fn test_punctuation_becomes_whitespace() {
        assert_eq!(
            normalizer().normalize("Attente,lenteur!Frais"),
            vec!["attente", "lenteur", "frais"]
        );
    }

    #[test]
    fn test_digits_are_stripped() {
        assert_eq!(normalizer().normalize("attente 45 lenteur"), vec!["attente", "lenteur"]);
        // Digits inside a word are deleted, not spaced
        assert_eq!(normalizer().normalize("guichet2b"), vec!["guichetb"]);
    }

    #[test]
    fn test_short_tokens_and_stop_words_dropped() {
        let tokens = normalizer().normalize("Le service de la banque est très lent à Rabat");
        assert_eq!(tokens, vec!["lent", "rabat"]);
    }

    #[test]
    fn test_arabic_diacritics_do_not_split_words() {
        // "انتظار" with a fatha on the first letter
        let tokens = normalizer().normalize("اَنتظار طويل");
        assert_eq!(tokens, vec!["انتظار", "طويل"]);
    }

    #[test]
    fn test_empty_output_is_allowed() {
        assert!(normalizer().normalize("!!! 123 ... le la").is_empty());
        assert!(normalizer().normalize("").is_empty());
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let n = normalizer();
        let first = n.normalize("Frais de tenue de compte TRÈS chers, l'application plante souvent!!");
        let second = n.normalize_tokens(&first);
        assert_eq!(first, second);
    }
}
