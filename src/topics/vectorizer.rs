// TF-IDF vectorization of normalized documents.
//
// Features are unigrams plus adjacent-token bigrams ("temps attente").
// Document-frequency pruning happens before the max_features cut, and the
// cut keeps the most frequent terms across the corpus. The final vocabulary
// is sorted lexicographically so column order, and therefore the LDA input,
// does not depend on hash iteration order.
//
// Weighting: idf = ln((1 + n) / (1 + df)) + 1, weight = count * idf, rows
// L2-normalized.

use std::collections::{BTreeMap, HashMap};

use anyhow::Result;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct VectorizerParams {
    /// Minimum number of documents a term must appear in
    pub min_df: usize,
    /// Maximum fraction of documents a term may appear in
    pub max_df: f64,
    pub max_features: usize,
    /// Longest n-gram to extract (1 = unigrams only)
    pub ngram_max: usize,
}

impl Default for VectorizerParams {
    fn default() -> Self {
        Self {
            min_df: 2,
            max_df: 0.8,
            max_features: 100,
            ngram_max: 2,
        }
    }
}

/// Sparse document-term matrix. Each row holds (term index, weight) pairs
/// sorted by term index.
#[derive(Debug, Clone)]
pub struct TermMatrix {
    pub vocabulary: Vec<String>,
    pub rows: Vec<Vec<(usize, f64)>>,
}

impl TermMatrix {
    pub fn n_documents(&self) -> usize {
        self.rows.len()
    }

    pub fn n_terms(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn term(&self, index: usize) -> Option<&str> {
        self.vocabulary.get(index).map(String::as_str)
    }
}

/// Build the TF-IDF matrix. Fails if pruning leaves no terms.
pub fn vectorize(documents: &[Vec<String>], params: &VectorizerParams) -> Result<TermMatrix> {
    let n_docs = documents.len();
    if n_docs == 0 {
        anyhow::bail!("Cannot vectorize an empty corpus");
    }

    let max_doc_count = (params.max_df * n_docs as f64).floor() as usize;
    if max_doc_count < params.min_df {
        anyhow::bail!(
            "max_df {} allows at most {} documents, fewer than min_df {}",
            params.max_df,
            max_doc_count,
            params.min_df
        );
    }

    let counted: Vec<HashMap<String, usize>> = documents
        .iter()
        .map(|tokens| term_counts(tokens, params.ngram_max))
        .collect();

    // Corpus-wide document frequency and total frequency per term
    let mut doc_freq: BTreeMap<&str, usize> = BTreeMap::new();
    let mut total_freq: HashMap<&str, usize> = HashMap::new();
    for counts in &counted {
        for (term, &count) in counts {
            *doc_freq.entry(term.as_str()).or_insert(0) += 1;
            *total_freq.entry(term.as_str()).or_insert(0) += count;
        }
    }

    let mut kept: Vec<&str> = doc_freq
        .iter()
        .filter(|&(_, &df)| df >= params.min_df && df <= max_doc_count)
        .map(|(&term, _)| term)
        .collect();

    if kept.len() > params.max_features {
        kept.sort_by(|a, b| total_freq[b].cmp(&total_freq[a]).then_with(|| a.cmp(b)));
        kept.truncate(params.max_features);
        kept.sort_unstable();
    }

    if kept.is_empty() {
        anyhow::bail!(
            "No terms left after pruning {} documents (min_df={}, max_df={})",
            n_docs,
            params.min_df,
            params.max_df
        );
    }

    let index: HashMap<&str, usize> = kept.iter().enumerate().map(|(i, &t)| (t, i)).collect();
    let idf: Vec<f64> = kept
        .iter()
        .map(|term| ((1.0 + n_docs as f64) / (1.0 + doc_freq[term] as f64)).ln() + 1.0)
        .collect();

    let rows = counted
        .iter()
        .map(|counts| {
            let mut row: Vec<(usize, f64)> = counts
                .iter()
                .filter_map(|(term, &count)| {
                    index
                        .get(term.as_str())
                        .map(|&i| (i, count as f64 * idf[i]))
                })
                .collect();
            row.sort_unstable_by_key(|&(i, _)| i);
            l2_normalize(&mut row);
            row
        })
        .collect();

    debug!(
        documents = n_docs,
        terms = kept.len(),
        candidates = doc_freq.len(),
        "Built TF-IDF matrix"
    );

    Ok(TermMatrix {
        vocabulary: kept.into_iter().map(str::to_string).collect(),
        rows,
    })
}

fn term_counts(tokens: &[String], ngram_max: usize) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for n in 1..=ngram_max.max(1) {
        for window in tokens.windows(n) {
            *counts.entry(window.join(" ")).or_insert(0) += 1;
        }
    }
    counts
}

fn l2_normalize(row: &mut [(usize, f64)]) {
    let norm = row.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
    if norm > 0.0 {
        for (_, w) in row.iter_mut() {
            *w /= norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs(texts: &[&str]) -> Vec<Vec<String>> {
        texts
            .iter()
            .map(|t| t.split_whitespace().map(str::to_string).collect())
            .collect()
    }

    #[test]
    fn test_df_pruning_and_bigrams() {
        let corpus = docs(&[
            "attente longue guichet",
            "attente longue frais",
            "frais cher",
            "application lente",
            "application lente attente",
        ]);
        let m = vectorize(&corpus, &VectorizerParams::default()).unwrap();

        // df("attente") = 3 <= 0.8*5 = 4, kept; singletons are dropped
        assert!(m.vocabulary.contains(&"attente".to_string()));
        assert!(m.vocabulary.contains(&"attente longue".to_string()));
        assert!(m.vocabulary.contains(&"application lente".to_string()));
        assert!(!m.vocabulary.contains(&"guichet".to_string()));
        assert!(!m.vocabulary.contains(&"cher".to_string()));
    }

    #[test]
    fn test_max_df_drops_ubiquitous_terms() {
        let corpus = docs(&["frais attente", "frais lent", "frais lent", "frais attente", "frais"]);
        let m = vectorize(&corpus, &VectorizerParams::default()).unwrap();
        // "frais" is in 5/5 documents
        assert!(!m.vocabulary.contains(&"frais".to_string()));
        assert!(m.vocabulary.contains(&"lent".to_string()));
    }

    #[test]
    fn test_vocabulary_is_sorted_and_rows_normalized() {
        let corpus = docs(&["zeta alpha", "zeta alpha beta", "beta gamma", "gamma alpha", "delta"]);
        let m = vectorize(&corpus, &VectorizerParams::default()).unwrap();

        let mut sorted = m.vocabulary.clone();
        sorted.sort();
        assert_eq!(m.vocabulary, sorted);

        for row in &m.rows {
            if row.is_empty() {
                continue;
            }
            let norm: f64 = row.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
            assert!((norm - 1.0).abs() < 1e-9);
        }
        // "delta" appears once, so the last document has no features
        assert!(m.rows[4].is_empty());
    }

    #[test]
    fn test_max_features_keeps_most_frequent() {
        let corpus = docs(&["aaa bbb", "aaa bbb", "aaa ccc", "ccc ddd", "ddd eee"]);
        let params = VectorizerParams {
            max_features: 2,
            ngram_max: 1,
            ..Default::default()
        };
        let m = vectorize(&corpus, &params).unwrap();
        // aaa=3, bbb=2, ccc=2, ddd=2: tie broken alphabetically
        assert_eq!(m.vocabulary, vec!["aaa", "bbb"]);
    }

    #[test]
    fn test_empty_vocabulary_fails() {
        let corpus = docs(&["un", "deux", "trois", "quatre"]);
        assert!(vectorize(&corpus, &VectorizerParams::default()).is_err());
    }

    #[test]
    fn test_all_empty_documents_fail() {
        let corpus: Vec<Vec<String>> = vec![Vec::new(); 12];
        assert!(vectorize(&corpus, &VectorizerParams::default()).is_err());
    }
}
