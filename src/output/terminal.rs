// Colored terminal output for stage summaries and the quality report.
//
// main.rs delegates all display formatting here.

use std::collections::BTreeMap;

use colored::Colorize;

use crate::db::models::{SentimentLabel, TopicModel};
use crate::pipeline::analyze::ReviewSignals;
use crate::pipeline::ingest::ImportSummary;
use crate::validation::QualityReport;

use super::truncate_chars;

pub fn display_import_summary(summary: &ImportSummary) {
    println!(
        "Imported {} reviews ({} read, {} duplicates, {} rejected)",
        summary.imported.to_string().bold(),
        summary.read,
        summary.duplicates,
        summary.rejected
    );
}

/// Label counts and language mix after a sentiment run.
pub fn display_sentiment_summary(signals: &ReviewSignals) {
    println!(
        "\n{}",
        format!("=== Sentiment ({} reviews) ===", signals.len()).bold()
    );

    for label in SentimentLabel::ALL {
        let count = signals
            .sentiments
            .values()
            .filter(|s| s.sentiment == label)
            .count();
        println!("  {:<10} {:>6}", colorize_sentiment(label), count);
    }
    if !signals.errors.is_empty() {
        println!(
            "  {:<10} {:>6}",
            "errors".red(),
            signals.errors.len()
        );
    }

    let mut languages: BTreeMap<&str, usize> = BTreeMap::new();
    for tag in signals.languages.values() {
        *languages.entry(tag.language.as_str()).or_insert(0) += 1;
    }
    let mix: Vec<String> = languages
        .iter()
        .map(|(language, count)| format!("{language}: {count}"))
        .collect();
    println!("  Languages: {}", mix.join(", ").dimmed());
}

/// Topics per language cohort with their categories.
pub fn display_topic_models(models: &[TopicModel]) {
    if models.is_empty() {
        println!("No topic models built. Each language needs at least 10 reviews with usable text.");
        return;
    }

    for model in models {
        println!(
            "\n{}",
            format!(
                "=== Topics [{}] ({} reviews, {} terms) ===",
                model.language, model.document_count, model.vocabulary_size
            )
            .bold()
        );
        for topic in &model.topics {
            let keywords = truncate_chars(&topic.keywords.join(", "), 70);
            println!(
                "  {:>2}. {:<18} {:>5.2}  {}",
                topic.topic_id,
                colorize_category(&topic.category),
                topic.category_confidence,
                keywords.dimmed()
            );
        }
    }
}

pub fn display_quality_report(report: &QualityReport) {
    println!(
        "\n{}",
        format!("=== Quality Report ({} reviews) ===", report.total_reviews).bold()
    );

    println!("\n  {}", "Coverage".underline());
    println!("    Sentiment: {}", percent(report.coverage.sentiment));
    println!("    Topic:     {}", percent(report.coverage.topic));
    println!("    Language:  {}", percent(report.coverage.language));

    println!("\n  {}", "Sentiment".underline());
    for s in &report.sentiment {
        println!(
            "    {:<10} {:>6} ({:>5.1}%)  avg rating {}  avg confidence {}",
            colorize_sentiment(s.label),
            s.count,
            s.percentage,
            optional(s.avg_rating, 2),
            optional(s.avg_confidence, 3),
        );
    }
    println!(
        "    Mean confidence: {}   Scorer agreement: {}   Errors: {}",
        optional(report.mean_sentiment_confidence, 3),
        report
            .scorer_agreement
            .map_or_else(|| "no data".to_string(), percent),
        report.sentiment_errors
    );
    println!(
        "    Rating coherence: {} ({} of {})",
        percent(report.coherence_rate),
        report.coherent_reviews,
        report.total_reviews
    );

    if !report.languages.is_empty() {
        println!("\n  {}", "Languages".underline());
        for l in &report.languages {
            println!("    {:<8} {:>6} ({:>5.1}%)", l.language, l.count, l.percentage);
        }
    }

    if !report.categories.is_empty() {
        println!("\n  {}", "Topic categories".underline());
        for c in &report.categories {
            println!(
                "    {:<18} {:>6} ({:>5.1}%)  conf {:.2}  {}",
                colorize_category(&c.category),
                c.count,
                c.percentage,
                c.avg_confidence,
                c.sample_keywords.join(", ").dimmed()
            );
        }
    }

    if !report.banks.is_empty() {
        println!("\n  {}", "Banks".underline());
        println!(
            "    {:<24} {:>7} {:>7} {:>7} {:>7}",
            "Bank".dimmed(),
            "Reviews".dimmed(),
            "Rating".dimmed(),
            "Pos".dimmed(),
            "Neg".dimmed()
        );
        for b in &report.banks {
            println!(
                "    {:<24} {:>7} {:>7.2} {:>7} {:>7}",
                truncate_chars(&b.bank, 24),
                b.total_reviews,
                b.avg_rating,
                b.positive.to_string().green(),
                b.negative.to_string().red()
            );
        }
    }

    println!();
    if report.warnings.is_empty() {
        println!("  {} All quality checks passed", "ok".green().bold());
    } else {
        for warning in &report.warnings {
            println!("  {} {}", "!".yellow().bold(), warning);
        }
    }
}

fn percent(ratio: f64) -> String {
    format!("{:.1}%", ratio * 100.0)
}

fn optional(value: Option<f64>, precision: usize) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.precision$}"))
}

fn colorize_sentiment(label: SentimentLabel) -> colored::ColoredString {
    match label {
        SentimentLabel::Positive => label.as_str().green(),
        SentimentLabel::Neutral => label.as_str().normal(),
        SentimentLabel::Negative => label.as_str().red(),
    }
}

fn colorize_category(category: &str) -> colored::ColoredString {
    if category == crate::topics::OTHER_CATEGORY {
        category.dimmed()
    } else {
        category.cyan()
    }
}
