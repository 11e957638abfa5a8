// Word splitting shared by both sentiment estimators.
//
// Unlike the topic normalizer this keeps case (capitalization is an emphasis
// signal) and keeps short words (negations like "ne", "no", "لا" matter here).

/// Split text into words, trimming punctuation from word edges.
///
/// French elisions are split off so "n'est" yields "n" and "est" and the
/// negation is visible to the scorer. Longer prefixes ("don't") stay whole.
pub fn words(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    for raw in text.split_whitespace() {
        let raw = raw.replace('’', "'");
        match raw.split_once('\'') {
            Some((prefix, rest)) if prefix.chars().count() <= 2 && !rest.is_empty() => {
                push_trimmed(&mut out, prefix);
                push_trimmed(&mut out, rest);
            }
            _ => push_trimmed(&mut out, &raw),
        }
    }
    out
}

fn push_trimmed(out: &mut Vec<String>, word: &str) {
    let trimmed = word.trim_matches(|c: char| !c.is_alphanumeric() && c != '\'');
    let trimmed = trimmed.trim_matches('\'');
    if !trimmed.is_empty() {
        out.push(trimmed.to_string());
    }
}

/// True when a word has letters and all of them are uppercase.
pub fn is_all_caps(word: &str) -> bool {
    let mut has_letter = false;
    for c in word.chars().filter(|c| c.is_alphabetic()) {
        has_letter = true;
        if !c.is_uppercase() {
            return false;
        }
    }
    has_letter
}
