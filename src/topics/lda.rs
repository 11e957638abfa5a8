// Latent Dirichlet Allocation, batch variational Bayes.
//
// Each EM iteration runs the per-document variational update over the whole
// corpus (E-step), then replaces the topic-word parameters with the prior
// plus the accumulated sufficient statistics (M-step). Random state comes
// from one seeded StdRng, so a given corpus and seed always produce the same
// topics.

use anyhow::{anyhow, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Gamma};

use super::vectorizer::TermMatrix;

/// Shape and scale of the Gamma used to initialize variational parameters.
const INIT_GAMMA_SHAPE: f64 = 100.0;
const INIT_GAMMA_SCALE: f64 = 0.01;

#[derive(Debug, Clone, PartialEq)]
pub struct LdaConfig {
    pub n_topics: usize,
    /// Number of EM passes over the corpus
    pub max_iter: usize,
    pub seed: u64,
    /// Document-topic prior; defaults to 1 / n_topics
    pub doc_topic_prior: Option<f64>,
    /// Topic-word prior; defaults to 1 / n_topics
    pub topic_word_prior: Option<f64>,
    /// Inner-loop stop when the mean absolute change of a document's
    /// parameters falls below this
    pub mean_change_tol: f64,
    pub max_doc_update_iter: usize,
}

impl Default for LdaConfig {
    fn default() -> Self {
        Self {
            n_topics: 5,
            max_iter: 100,
            seed: 42,
            doc_topic_prior: None,
            topic_word_prior: None,
            mean_change_tol: 1e-3,
            max_doc_update_iter: 100,
        }
    }
}

impl LdaConfig {
    pub fn new(n_topics: usize) -> Self {
        Self {
            n_topics,
            ..Default::default()
        }
    }

    pub fn max_iter(mut self, n: usize) -> Self {
        self.max_iter = n;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    fn alpha(&self) -> f64 {
        self.doc_topic_prior.unwrap_or(1.0 / self.n_topics as f64)
    }

    fn eta(&self) -> f64 {
        self.topic_word_prior.unwrap_or(1.0 / self.n_topics as f64)
    }
}

/// A fitted model: topic-word parameters plus what transform needs.
#[derive(Debug, Clone)]
pub struct FittedLda {
    /// n_topics x n_terms unnormalized topic-word weights
    components: Vec<Vec<f64>>,
    /// exp(E[log beta]) for the current components
    exp_dirichlet: Vec<Vec<f64>>,
    config: LdaConfig,
}

/// Fit LDA on a TF-IDF matrix.
pub fn fit(matrix: &TermMatrix, config: &LdaConfig) -> Result<FittedLda> {
    if config.n_topics == 0 {
        anyhow::bail!("LDA needs at least one topic");
    }
    if matrix.n_documents() == 0 || matrix.n_terms() == 0 {
        anyhow::bail!(
            "LDA needs a non-empty matrix, got {} documents x {} terms",
            matrix.n_documents(),
            matrix.n_terms()
        );
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let init = Gamma::new(INIT_GAMMA_SHAPE, INIT_GAMMA_SCALE)
        .map_err(|e| anyhow!("Invalid initialization distribution: {e}"))?;

    let n_terms = matrix.n_terms();
    let mut components: Vec<Vec<f64>> = (0..config.n_topics)
        .map(|_| (0..n_terms).map(|_| init.sample(&mut rng)).collect())
        .collect();
    let mut exp_dirichlet = exp_dirichlet_expectation(&components);

    let eta = config.eta();
    for _ in 0..config.max_iter {
        let (_, sstats) = e_step(matrix, &exp_dirichlet, config, Some((&mut rng, &init)), true);
        for (k, row) in components.iter_mut().enumerate() {
            for (v, weight) in row.iter_mut().enumerate() {
                *weight = eta + sstats[k][v] * exp_dirichlet[k][v];
            }
        }
        if components.iter().flatten().any(|w| !w.is_finite()) {
            anyhow::bail!("LDA diverged: non-finite topic-word weights");
        }
        exp_dirichlet = exp_dirichlet_expectation(&components);
    }

    Ok(FittedLda {
        components,
        exp_dirichlet,
        config: config.clone(),
    })
}

impl FittedLda {
    pub fn n_topics(&self) -> usize {
        self.components.len()
    }

    pub fn components(&self) -> &[Vec<f64>] {
        &self.components
    }

    /// Per-document topic distributions. Each row sums to 1; a document with
    /// no features gets the uniform distribution.
    pub fn transform(&self, matrix: &TermMatrix) -> Result<Vec<Vec<f64>>> {
        if matrix.n_terms() != self.exp_dirichlet.first().map_or(0, Vec::len) {
            anyhow::bail!(
                "Matrix has {} terms but the model was fitted on {}",
                matrix.n_terms(),
                self.exp_dirichlet.first().map_or(0, Vec::len)
            );
        }

        let (gammas, _) = e_step(matrix, &self.exp_dirichlet, &self.config, None, false);
        let k = self.n_topics();
        let distributions = gammas
            .into_iter()
            .map(|gamma| {
                let total: f64 = gamma.iter().sum();
                if total > 0.0 && total.is_finite() {
                    gamma.iter().map(|g| g / total).collect()
                } else {
                    vec![1.0 / k as f64; k]
                }
            })
            .collect();
        Ok(distributions)
    }

    /// Term indices of a topic ranked by weight, heaviest first. Equal
    /// weights keep ascending index order.
    pub fn top_terms(&self, topic: usize, n: usize) -> Vec<(usize, f64)> {
        let Some(row) = self.components.get(topic) else {
            return Vec::new();
        };
        let mut ranked: Vec<(usize, f64)> = row.iter().copied().enumerate().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.truncate(n);
        ranked
    }
}

type GammaInit<'a> = (&'a mut StdRng, &'a Gamma<f64>);

/// Variational E-step over all documents. Returns the per-document
/// variational parameters and, if requested, the sufficient statistics.
fn e_step(
    matrix: &TermMatrix,
    exp_dirichlet: &[Vec<f64>],
    config: &LdaConfig,
    mut random_init: Option<GammaInit<'_>>,
    collect_stats: bool,
) -> (Vec<Vec<f64>>, Vec<Vec<f64>>) {
    let k = exp_dirichlet.len();
    let n_terms = exp_dirichlet.first().map_or(0, Vec::len);
    let alpha = config.alpha();

    let mut sstats = if collect_stats {
        vec![vec![0.0; n_terms]; k]
    } else {
        Vec::new()
    };
    let mut gammas = Vec::with_capacity(matrix.n_documents());

    for row in &matrix.rows {
        let mut gamma: Vec<f64> = match random_init.as_mut() {
            Some((rng, dist)) => (0..k).map(|_| dist.sample(&mut **rng)).collect(),
            None => vec![1.0; k],
        };
        let mut exp_theta = exp_dirichlet_expectation_1d(&gamma);

        for _ in 0..config.max_doc_update_iter {
            let last = gamma.clone();
            let norm_phi = normalizer(row, &exp_theta, exp_dirichlet);

            for (t, g) in gamma.iter_mut().enumerate() {
                let dot: f64 = row
                    .iter()
                    .zip(&norm_phi)
                    .map(|(&(v, count), phi)| count / phi * exp_dirichlet[t][v])
                    .sum();
                *g = alpha + exp_theta[t] * dot;
            }
            exp_theta = exp_dirichlet_expectation_1d(&gamma);

            if mean_change(&last, &gamma) < config.mean_change_tol {
                break;
            }
        }

        if collect_stats {
            let norm_phi = normalizer(row, &exp_theta, exp_dirichlet);
            for (t, stats) in sstats.iter_mut().enumerate() {
                for (&(v, count), phi) in row.iter().zip(&norm_phi) {
                    stats[v] += exp_theta[t] * count / phi;
                }
            }
        }
        gammas.push(gamma);
    }

    (gammas, sstats)
}

fn normalizer(row: &[(usize, f64)], exp_theta: &[f64], exp_dirichlet: &[Vec<f64>]) -> Vec<f64> {
    row.iter()
        .map(|&(v, _)| {
            exp_theta
                .iter()
                .zip(exp_dirichlet)
                .map(|(theta, beta)| theta * beta[v])
                .sum::<f64>()
                + f64::EPSILON
        })
        .collect()
}

fn mean_change(a: &[f64], b: &[f64]) -> f64 {
    if a.is_empty() {
        return 0.0;
    }
    a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum::<f64>() / a.len() as f64
}

/// exp(E[log x]) for x ~ Dirichlet(params), per row.
fn exp_dirichlet_expectation(rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
    rows.iter().map(|row| exp_dirichlet_expectation_1d(row)).collect()
}

fn exp_dirichlet_expectation_1d(params: &[f64]) -> Vec<f64> {
    let psi_total = digamma(params.iter().sum());
    params.iter().map(|&p| (digamma(p) - psi_total).exp()).collect()
}

/// Digamma for positive arguments: shift with the recurrence
/// psi(x) = psi(x + 1) - 1/x until x >= 6, then the asymptotic series.
pub fn digamma(mut x: f64) -> f64 {
    let mut result = 0.0;
    while x < 6.0 {
        result -= 1.0 / x;
        x += 1.0;
    }
    let inv = 1.0 / x;
    let inv2 = inv * inv;
    result + x.ln()
        - 0.5 * inv
        - inv2 * (1.0 / 12.0 - inv2 * (1.0 / 120.0 - inv2 * (1.0 / 252.0 - inv2 * (1.0 / 240.0 - inv2 / 132.0))))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Euler-Mascheroni constant; psi(1) = -gamma
    const EULER: f64 = 0.577_215_664_901_532_9;

    fn two_cluster_matrix() -> TermMatrix {
        // Terms 0-1 co-occur, terms 2-3 co-occur
        let mut rows = Vec::new();
        for _ in 0..6 {
            rows.push(vec![(0, 0.7), (1, 0.7)]);
            rows.push(vec![(2, 0.7), (3, 0.7)]);
        }
        rows.push(Vec::new());
        TermMatrix {
            vocabulary: ["attente", "lent", "frais", "cher"].map(String::from).to_vec(),
            rows,
        }
    }

    #[test]
    fn test_digamma_known_values() {
        assert!((digamma(1.0) + EULER).abs() < 1e-10);
        assert!((digamma(0.5) - (-EULER - 2.0 * 2f64.ln())).abs() < 1e-10);
        // psi(x + 1) = psi(x) + 1/x
        assert!((digamma(11.5) - digamma(10.5) - 1.0 / 10.5).abs() < 1e-12);
    }

    #[test]
    fn test_transform_rows_are_distributions() {
        let m = two_cluster_matrix();
        let lda = fit(&m, &LdaConfig::new(2).max_iter(20)).unwrap();
        let dist = lda.transform(&m).unwrap();

        assert_eq!(dist.len(), m.n_documents());
        for row in &dist {
            assert_eq!(row.len(), 2);
            assert!((row.iter().sum::<f64>() - 1.0).abs() < 1e-9);
            assert!(row.iter().all(|&p| (0.0..=1.0).contains(&p)));
        }
        // Empty document is uniform
        let last = dist.last().unwrap();
        assert!((last[0] - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_separates_co_occurring_terms() {
        let m = two_cluster_matrix();
        let lda = fit(&m, &LdaConfig::new(2).max_iter(50)).unwrap();
        let dist = lda.transform(&m).unwrap();

        let first = if dist[0][0] > dist[0][1] { 0 } else { 1 };
        let second = if dist[1][0] > dist[1][1] { 0 } else { 1 };
        assert_ne!(first, second, "the two clusters should land on different topics");
    }

    #[test]
    fn test_same_seed_same_model() {
        let m = two_cluster_matrix();
        let config = LdaConfig::new(3).max_iter(10);
        let a = fit(&m, &config).unwrap();
        let b = fit(&m, &config).unwrap();
        assert_eq!(a.components(), b.components());
    }

    #[test]
    fn test_priors_default_to_inverse_topic_count() {
        let config = LdaConfig::new(4);
        assert_eq!(config.alpha(), 0.25);
        assert_eq!(config.eta(), 0.25);

        let config = LdaConfig {
            doc_topic_prior: Some(0.1),
            ..LdaConfig::new(4)
        };
        assert_eq!(config.alpha(), 0.1);
        assert_eq!(config.eta(), 0.25);
    }

    #[test]
    fn test_top_terms_order() {
        let m = two_cluster_matrix();
        let lda = fit(&m, &LdaConfig::new(2).max_iter(10)).unwrap();
        let top = lda.top_terms(0, 10);
        assert_eq!(top.len(), 4);
        assert!(top.windows(2).all(|w| w[0].1 >= w[1].1));
        assert!(lda.top_terms(5, 10).is_empty());
    }

    #[test]
    fn test_rejects_zero_topics_and_mismatched_matrix() {
        let m = two_cluster_matrix();
        assert!(fit(&m, &LdaConfig::new(0)).is_err());

        let lda = fit(&m, &LdaConfig::new(2).max_iter(2)).unwrap();
        let narrow = TermMatrix {
            vocabulary: vec!["attente".to_string()],
            rows: vec![vec![(0, 1.0)]],
        };
        assert!(lda.transform(&narrow).is_err());
    }
}
