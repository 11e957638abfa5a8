// Language detector.
//
// Primary path: whatlang's trigram model, mapped to ISO-639-1 codes.
// Fallback path (empty input, no detection, unreliable detection, or a
// language we have no two-letter code for): membership checks against three
// small marker lexicons, Arabic first, then French, then English.

use anyhow::Result;
use whatlang::{Detector, Lang};

use crate::db::models::{LanguageTag, Review, UNKNOWN_LANGUAGE};

/// whatlang languages we report, with their ISO-639-1 codes.
const ISO_639_1: &[(Lang, &str)] = &[
    (Lang::Fra, "fr"),
    (Lang::Ara, "ar"),
    (Lang::Eng, "en"),
    (Lang::Spa, "es"),
    (Lang::Deu, "de"),
    (Lang::Ita, "it"),
    (Lang::Por, "pt"),
    (Lang::Nld, "nl"),
    (Lang::Tur, "tr"),
    (Lang::Rus, "ru"),
];

const ARABIC_MARKERS: &[&str] = &[
    "والله", "الله", "جيد", "سيء", "ممتاز", "شكرا", "خدمة", "البنك", "الوكالة",
];
const FRENCH_MARKERS: &[&str] = &[
    "très", "bon", "mauvais", "service", "merci", "accueil", "agence", "nul", "rien",
];
const ENGLISH_MARKERS: &[&str] = &[
    "good", "bad", "service", "staff", "great", "very", "bank", "terrible",
];

pub struct LanguageDetector {
    detector: Detector,
}

impl Default for LanguageDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageDetector {
    /// Detector over every language whatlang knows.
    pub fn new() -> Self {
        Self {
            detector: Detector::new(),
        }
    }

    /// Restrict statistical detection to the given ISO-639-1 codes.
    ///
    /// Short reviews are easily confused with neighbouring languages; an
    /// allow-list of the languages actually present in the data set avoids
    /// most of that.
    pub fn with_languages(codes: &[String]) -> Result<Self> {
        let mut allowlist = Vec::with_capacity(codes.len());
        for code in codes {
            let code = code.trim().to_lowercase();
            match lang_from_iso(&code) {
                Some(lang) => allowlist.push(lang),
                None => anyhow::bail!(
                    "Unsupported language code '{code}' in REVIEWLENS_LANGUAGES \
                     (supported: {})",
                    ISO_639_1
                        .iter()
                        .map(|(_, c)| *c)
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            }
        }
        if allowlist.is_empty() {
            return Ok(Self::new());
        }
        Ok(Self {
            detector: Detector::with_allowlist(allowlist),
        })
    }

    /// Guess the language of a text. Never fails: anything unrecognized
    /// degrades to "unknown".
    pub fn detect(&self, text: &str) -> String {
        if text.trim().is_empty() {
            return UNKNOWN_LANGUAGE.to_string();
        }

        let primary = self
            .detector
            .detect(text)
            .filter(|info| info.is_reliable())
            .and_then(|info| iso_from_lang(info.lang()));

        match primary {
            Some(code) => code.to_string(),
            None => fallback_language(text).to_string(),
        }
    }

    pub fn tag(&self, review: &Review) -> LanguageTag {
        LanguageTag {
            review_id: review.review_id.clone(),
            language: self.detect(&review.raw_text),
        }
    }
}

/// Marker-lexicon heuristic used when the statistical path gives up.
pub fn fallback_language(text: &str) -> &'static str {
    let lower = text.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    let has_any = |markers: &[&str]| words.iter().any(|w| markers.contains(w));

    if has_any(ARABIC_MARKERS) {
        "ar"
    } else if has_any(FRENCH_MARKERS) {
        "fr"
    } else if has_any(ENGLISH_MARKERS) {
        "en"
    } else {
        UNKNOWN_LANGUAGE
    }
}

fn iso_from_lang(lang: Lang) -> Option<&'static str> {
    ISO_639_1
        .iter()
        .find(|(l, _)| *l == lang)
        .map(|(_, code)| *code)
}

fn lang_from_iso(code: &str) -> Option<Lang> {
    ISO_639_1
        .iter()
        .find(|(_, c)| *c == code)
        .map(|(lang, _)| *lang)
}
