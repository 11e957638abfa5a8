// Rule-based valence scorer, calibrated for short informal reviews.
//
// Each word found in the valence lexicon contributes its valence, adjusted by:
// - booster words up to three positions earlier (scaled down with distance)
// - a negation anywhere in the three preceding words (flips and dampens)
// - ALL-CAPS emphasis when the text mixes caps and non-caps words
// - contrastive conjunctions: words before "but"/"mais" count half,
//   words after count one and a half
// The summed valence gets an exclamation/question-mark bonus and is squashed
// into [-1, 1] with s / sqrt(s^2 + ALPHA).

use std::collections::HashMap;

use anyhow::Result;

use super::tokens::{is_all_caps, words};
use super::traits::PolarityEstimator;

const BOOSTER_INCREMENT: f64 = 0.293;
const BOOSTER_DECREMENT: f64 = -0.293;
const CAPS_INCREMENT: f64 = 0.733;
const NEGATION_SCALAR: f64 = -0.74;
const NORMALIZATION_ALPHA: f64 = 15.0;
const EXCLAMATION_BONUS: f64 = 0.292;
const MAX_EXCLAMATIONS: usize = 4;

/// Valences on a -4..4 scale.
const VALENCES: &[(&str, f64)] = &[
    // English
    ("good", 1.9), ("great", 3.1), ("excellent", 2.7), ("amazing", 2.8),
    ("awesome", 3.1), ("nice", 1.8), ("friendly", 2.2), ("helpful", 1.9),
    ("quick", 1.0), ("efficient", 1.8), ("professional", 1.5), ("polite", 1.4),
    ("happy", 2.7), ("love", 3.2), ("perfect", 2.7), ("best", 3.2),
    ("thanks", 1.9), ("thank", 1.5), ("satisfied", 1.8), ("recommend", 1.5),
    ("bad", -2.5), ("terrible", -2.1), ("horrible", -2.5), ("awful", -2.0),
    ("worst", -3.1), ("poor", -2.1), ("slow", -1.0), ("rude", -2.0),
    ("useless", -1.8), ("disappointed", -1.9), ("disappointing", -2.2),
    ("hate", -2.7), ("waste", -1.8), ("problem", -1.7), ("problems", -1.7),
    ("unprofessional", -2.0), ("angry", -2.3), ("scam", -2.3),
    ("expensive", -0.9), ("dirty", -1.9), ("annoying", -1.7), ("failed", -2.3),
    // French
    ("bon", 1.9), ("bonne", 1.9), ("bien", 1.6), ("super", 2.9), ("génial", 3.0),
    ("parfait", 2.7), ("parfaite", 2.7), ("top", 2.0), ("rapide", 1.2),
    ("efficace", 1.8), ("aimable", 2.1), ("accueillant", 2.0),
    ("accueillante", 2.0), ("sympathique", 2.0), ("sympa", 1.8),
    ("professionnel", 1.5), ("professionnelle", 1.5), ("satisfait", 1.8),
    ("satisfaite", 1.8), ("merci", 1.9), ("bravo", 2.4), ("agréable", 2.1),
    ("serviable", 2.0), ("compétent", 1.7), ("compétente", 1.7),
    ("recommande", 1.5), ("mauvais", -2.5), ("mauvaise", -2.5), ("nul", -2.3),
    ("nulle", -2.3), ("catastrophique", -3.0), ("catastrophe", -2.8),
    ("lent", -1.2), ("lente", -1.2), ("lenteur", -1.3), ("désagréable", -2.0),
    ("impoli", -2.0), ("impolie", -2.0), ("incompétent", -2.2),
    ("incompétente", -2.2), ("déçu", -1.9), ("déçue", -1.9),
    ("décevant", -2.2), ("pire", -3.1), ("honte", -2.3),
    ("inadmissible", -2.5), ("inacceptable", -2.5), ("problème", -1.7),
    ("problèmes", -1.7), ("arnaque", -2.6), ("cher", -0.8), ("chère", -0.8),
    ("méprisant", -2.3), ("irrespectueux", -2.3), ("scandale", -2.6),
    ("scandaleux", -2.8),
    // Arabic and Darija (Arabic and Latin script)
    ("جيد", 1.9), ("ممتاز", 2.7), ("رائع", 3.0), ("شكرا", 1.9), ("حسن", 1.6),
    ("سريع", 1.2), ("لطيف", 2.0), ("مزيان", 1.9), ("زوين", 1.9),
    ("سيء", -2.5), ("سيئة", -2.5), ("رديء", -2.3), ("سوء", -2.3),
    ("بطيء", -1.2), ("فاشل", -2.5), ("أسوأ", -3.1), ("مشكل", -1.7),
    ("مشكلة", -1.7), ("خايب", -2.3),
    ("mzyan", 1.9), ("zwin", 1.9), ("khayb", -2.3),
];

/// Words that intensify (positive) or dampen (negative) the next valence word.
const BOOSTERS: &[(&str, f64)] = &[
    ("very", BOOSTER_INCREMENT), ("really", BOOSTER_INCREMENT),
    ("extremely", BOOSTER_INCREMENT), ("so", BOOSTER_INCREMENT),
    ("totally", BOOSTER_INCREMENT), ("très", BOOSTER_INCREMENT),
    ("vraiment", BOOSTER_INCREMENT), ("trop", BOOSTER_INCREMENT),
    ("extrêmement", BOOSTER_INCREMENT), ("tellement", BOOSTER_INCREMENT),
    ("جدا", BOOSTER_INCREMENT), ("بزاف", BOOSTER_INCREMENT), ("bzaf", BOOSTER_INCREMENT),
    ("barely", BOOSTER_DECREMENT), ("slightly", BOOSTER_DECREMENT),
    ("somewhat", BOOSTER_DECREMENT), ("peu", BOOSTER_DECREMENT),
    ("moyennement", BOOSTER_DECREMENT),
];

const NEGATIONS: &[&str] = &[
    "not", "no", "never", "nothing", "none", "without", "don't", "doesn't",
    "didn't", "isn't", "wasn't", "aren't", "can't", "won't", "cannot",
    "ne", "n", "pas", "jamais", "rien", "aucun", "aucune", "sans",
    "لا", "ليس", "لم", "لن", "غير", "ماشي", "ما",
];

const CONTRASTIVE: &[&str] = &["but", "however", "mais", "cependant", "pourtant", "لكن"];

/// VADER-style lexicon scorer producing the compound score.
pub struct LexiconScorer {
    valences: HashMap<String, f64>,
    boosters: HashMap<String, f64>,
}

impl Default for LexiconScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl LexiconScorer {
    pub fn new() -> Self {
        Self {
            valences: VALENCES.iter().map(|(w, v)| (w.to_string(), *v)).collect(),
            boosters: BOOSTERS.iter().map(|(w, v)| (w.to_string(), *v)).collect(),
        }
    }

    /// Add or override a valence (on the -4..4 scale).
    pub fn with_valence(mut self, word: &str, valence: f64) -> Self {
        self.valences.insert(word.to_lowercase(), valence);
        self
    }

    /// Compound score in [-1, 1].
    pub fn compound(&self, text: &str) -> f64 {
        let tokens = words(text);
        if tokens.is_empty() {
            return 0.0;
        }
        let lower: Vec<String> = tokens.iter().map(|t| t.to_lowercase()).collect();

        let caps_count = tokens.iter().filter(|t| is_all_caps(t)).count();
        let caps_differ = caps_count > 0 && caps_count < tokens.len();

        let mut valences: Vec<f64> = (0..tokens.len())
            .map(|i| self.word_valence(&tokens, &lower, i, caps_differ))
            .collect();

        apply_contrastive(&lower, &mut valences);

        let sum: f64 = valences.iter().sum();
        if sum == 0.0 {
            return 0.0;
        }

        let emphasis = punctuation_emphasis(text);
        let total = if sum > 0.0 { sum + emphasis } else { sum - emphasis };

        normalize(total)
    }

    fn word_valence(&self, tokens: &[String], lower: &[String], i: usize, caps_differ: bool) -> f64 {
        let word = &lower[i];
        if self.boosters.contains_key(word) {
            return 0.0;
        }
        let Some(&base) = self.valences.get(word) else {
            return 0.0;
        };

        let mut valence = base;
        if caps_differ && is_all_caps(&tokens[i]) {
            valence += CAPS_INCREMENT * valence.signum();
        }

        // Boosters up to three words back, scaled down with distance
        for distance in 1..=3usize {
            if distance > i {
                break;
            }
            let prev = &lower[i - distance];
            if self.valences.contains_key(prev) {
                continue;
            }
            if let Some(&boost) = self.boosters.get(prev) {
                let mut scalar = if valence < 0.0 { -boost } else { boost };
                if caps_differ && is_all_caps(&tokens[i - distance]) {
                    scalar += CAPS_INCREMENT * scalar.signum();
                }
                scalar *= match distance {
                    1 => 1.0,
                    2 => 0.95,
                    _ => 0.9,
                };
                valence += scalar;
            }
        }

        // Negation is applied once per word: "ne ... pas" is one negation,
        // not two that cancel out.
        let window = i.saturating_sub(3)..i;
        if lower[window].iter().any(|w| NEGATIONS.contains(&w.as_str())) {
            valence *= NEGATION_SCALAR;
        }

        valence
    }
}

impl PolarityEstimator for LexiconScorer {
    fn name(&self) -> &str {
        "lexicon"
    }

    fn polarity(&self, text: &str) -> Result<f64> {
        Ok(self.compound(text))
    }
}

fn apply_contrastive(lower: &[String], valences: &mut [f64]) {
    let Some(pivot) = lower.iter().position(|w| CONTRASTIVE.contains(&w.as_str())) else {
        return;
    };
    for (i, v) in valences.iter_mut().enumerate() {
        if i < pivot {
            *v *= 0.5;
        } else if i > pivot {
            *v *= 1.5;
        }
    }
}

fn punctuation_emphasis(text: &str) -> f64 {
    let exclamations = text.matches('!').count().min(MAX_EXCLAMATIONS);
    let questions = text.matches('?').count();
    let question_bonus = match questions {
        0 | 1 => 0.0,
        2 | 3 => questions as f64 * 0.18,
        _ => 0.96,
    };
    exclamations as f64 * EXCLAMATION_BONUS + question_bonus
}

/// Squash an unbounded valence sum into [-1, 1].
pub fn normalize(score: f64) -> f64 {
    let norm = score / (score * score + NORMALIZATION_ALPHA).sqrt();
    norm.clamp(-1.0, 1.0)
}
