// Secondary polarity estimator: averaged adjective polarity.
//
// Independent of the lexicon scorer: its own word list on a [-1, 1] scale,
// and it averages matched words instead of summing and squashing. Intensifiers
// multiply the next polarity word; a negation in the two preceding words
// flips it and halves it.

use std::collections::HashMap;

use anyhow::Result;

use super::tokens::words;
use super::traits::PolarityEstimator;

const NEGATION_FACTOR: f64 = -0.5;

const POLARITIES: &[(&str, f64)] = &[
    ("good", 0.7), ("great", 0.8), ("excellent", 1.0), ("amazing", 0.6),
    ("nice", 0.6), ("friendly", 0.375), ("helpful", 0.5), ("fast", 0.2),
    ("quick", 0.33), ("happy", 0.8), ("perfect", 1.0), ("best", 1.0),
    ("bad", -0.7), ("terrible", -1.0), ("horrible", -1.0), ("awful", -1.0),
    ("worst", -1.0), ("poor", -0.4), ("slow", -0.3), ("rude", -0.3),
    ("useless", -0.5), ("disappointed", -0.75), ("long", -0.05),
    ("expensive", -0.5),
    ("bon", 0.7), ("bonne", 0.7), ("excellente", 1.0), ("parfait", 1.0),
    ("rapide", 0.33), ("efficace", 0.6), ("aimable", 0.5), ("accueillant", 0.5),
    ("accueillante", 0.5), ("agréable", 0.6), ("satisfait", 0.5),
    ("satisfaite", 0.5), ("génial", 0.8), ("super", 0.6), ("mauvais", -0.7),
    ("mauvaise", -0.7), ("nul", -0.8), ("nulle", -0.8), ("lent", -0.3),
    ("lente", -0.3), ("longue", -0.1), ("cher", -0.4),
    ("chère", -0.4), ("désagréable", -0.6), ("catastrophique", -1.0),
    ("décevant", -0.75), ("pire", -1.0), ("incompétent", -0.6),
    ("جيد", 0.7), ("ممتاز", 1.0), ("رائع", 0.8), ("سيء", -0.7), ("سيئة", -0.7),
    ("بطيء", -0.3), ("فاشل", -0.8),
];

const INTENSIFIERS: &[(&str, f64)] = &[
    ("very", 1.3), ("really", 1.3), ("extremely", 1.5), ("too", 1.2),
    ("très", 1.3), ("vraiment", 1.3), ("trop", 1.2), ("extrêmement", 1.5),
    ("assez", 0.8), ("peu", 0.5), ("جدا", 1.3),
];

const NEGATIONS: &[&str] = &[
    "not", "no", "never", "don't", "isn't", "wasn't", "ne", "n", "pas", "jamais",
    "لا", "ليس", "غير",
];

pub struct AveragedPolarity {
    polarities: HashMap<&'static str, f64>,
    intensifiers: HashMap<&'static str, f64>,
}

impl Default for AveragedPolarity {
    fn default() -> Self {
        Self::new()
    }
}

impl AveragedPolarity {
    pub fn new() -> Self {
        Self {
            polarities: POLARITIES.iter().copied().collect(),
            intensifiers: INTENSIFIERS.iter().copied().collect(),
        }
    }

    pub fn score(&self, text: &str) -> f64 {
        let lower: Vec<String> = words(text).iter().map(|w| w.to_lowercase()).collect();

        let mut matched = Vec::new();
        for (i, word) in lower.iter().enumerate() {
            let Some(&base) = self.polarities.get(word.as_str()) else {
                continue;
            };
            let mut p = base;
            if i > 0 {
                if let Some(&mult) = self.intensifiers.get(lower[i - 1].as_str()) {
                    p *= mult;
                }
            }
            let window = i.saturating_sub(2)..i;
            if lower[window].iter().any(|w| NEGATIONS.contains(&w.as_str())) {
                p *= NEGATION_FACTOR;
            }
            matched.push(p.clamp(-1.0, 1.0));
        }

        if matched.is_empty() {
            return 0.0;
        }
        let mean = matched.iter().sum::<f64>() / matched.len() as f64;
        mean.clamp(-1.0, 1.0)
    }
}

impl PolarityEstimator for AveragedPolarity {
    fn name(&self) -> &str {
        "averaged-polarity"
    }

    fn polarity(&self, text: &str) -> Result<f64> {
        Ok(self.score(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_polarity_words_is_zero() {
        assert_eq!(AveragedPolarity::new().score("ouverture à neuf heures"), 0.0);
        assert_eq!(AveragedPolarity::new().score(""), 0.0);
    }

    #[test]
    fn test_averages_matched_words() {
        // (0.7 + -0.3) / 2
        let score = AveragedPolarity::new().score("bon accueil mais lent");
        assert!((score - 0.2).abs() < 1e-9, "got {score}");
    }

    #[test]
    fn test_intensifier_and_clamp() {
        // excellent (1.0) * 1.3 is clamped back to 1.0
        assert_eq!(AveragedPolarity::new().score("très excellent"), 1.0);
        let score = AveragedPolarity::new().score("très mauvais");
        assert!((score - (-0.91)).abs() < 1e-9, "got {score}");
    }

    #[test]
    fn test_negation_flips_and_halves() {
        let score = AveragedPolarity::new().score("pas bon");
        assert!((score - (-0.35)).abs() < 1e-9, "got {score}");
    }
}
