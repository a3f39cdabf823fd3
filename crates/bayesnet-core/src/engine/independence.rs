//! Information-theoretic independence testing between discrete variables.
//!
//! The oracle estimates (conditional) mutual information from joint
//! histograms of a [`Dataset`] and turns it into an independence decision with
//! a G-test: `chi2 = 2 N I`, compared against a chi-squared distribution with
//! `(|X| - 1)(|Y| - 1) Π |Z_i|` degrees of freedom.
//!
//! Histogram bins are the observed states of each column. Probability ratios
//! are smoothed with `epsilon` so that empty cells never divide by zero; cells
//! with zero joint mass contribute nothing.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::engine::dataset::{Dataset, EncodedColumn};
use crate::engine::errors::BayesNetError;
use crate::engine::numeric_kernels::{chi_squared_pdf, chi_squared_survival};

/// How a chi-squared statistic is converted into a p-value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PValueMethod {
    /// Upper-tail probability `P(X > chi2)`.
    #[default]
    Survival,
    /// `2 * pdf(chi2)`. Kept for reproducing results of older pipelines; this
    /// is not a probability and may exceed one.
    LegacyDensity,
}

/// Configuration for independence decisions.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IndependenceConfig {
    /// Significance level; variables are independent iff `p_value > alpha`.
    pub alpha: f64,
    /// Smoothing term added to both sides of every probability ratio.
    pub epsilon: f64,
    pub p_value: PValueMethod,
}

impl Default for IndependenceConfig {
    fn default() -> Self {
        Self {
            alpha: 0.05,
            epsilon: 1e-10,
            p_value: PValueMethod::Survival,
        }
    }
}

impl IndependenceConfig {
    pub(crate) fn validate(self) -> Result<Self, BayesNetError> {
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(BayesNetError::Validation(
                "independence: alpha must be in (0, 1)".into(),
            ));
        }
        if self.epsilon <= 0.0 || !self.epsilon.is_finite() {
            return Err(BayesNetError::Validation(
                "independence: epsilon must be finite and > 0".into(),
            ));
        }
        Ok(self)
    }
}

/// Outcome of one (conditional) independence test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndependenceTestResult {
    /// Mutual information, or conditional mutual information when a
    /// conditioning set was supplied (nats).
    pub statistic: f64,
    /// `2 * N * statistic`, floored at zero.
    pub chi_squared: f64,
    pub degrees_of_freedom: usize,
    pub p_value: f64,
    pub independent: bool,
}

/// Answers independence queries over the columns of a dataset.
///
/// Columns are re-encoded to dense codes once at construction, so repeated
/// queries (as issued by structure learning) only pay for histogramming.
#[derive(Debug, Clone)]
pub struct IndependenceOracle {
    names: Vec<Arc<str>>,
    columns: Vec<EncodedColumn>,
    index: FxHashMap<Arc<str>, usize>,
    rows: usize,
    config: IndependenceConfig,
}

impl IndependenceOracle {
    /// Creates an oracle with the default configuration.
    pub fn new(dataset: &Dataset) -> Self {
        Self::encode(dataset, IndependenceConfig::default())
    }

    /// Creates an oracle with an explicit configuration.
    pub fn with_config(dataset: &Dataset, config: IndependenceConfig) -> Result<Self, BayesNetError> {
        Ok(Self::encode(dataset, config.validate()?))
    }

    fn encode(dataset: &Dataset, config: IndependenceConfig) -> Self {
        let names = dataset.shared_names();
        let columns = names
            .iter()
            .map(|name| EncodedColumn::encode(dataset.column(name).unwrap_or(&[])))
            .collect();
        let index = names
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.clone(), idx))
            .collect();
        Self {
            names,
            columns,
            index,
            rows: dataset.len(),
            config,
        }
    }

    pub fn config(&self) -> IndependenceConfig {
        self.config
    }

    /// Number of observations the statistics are computed from.
    pub fn sample_size(&self) -> usize {
        self.rows
    }

    pub(crate) fn names(&self) -> &[Arc<str>] {
        &self.names
    }

    fn resolve(&self, name: &str) -> Result<usize, BayesNetError> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| BayesNetError::UnknownVariable(name.to_string()))
    }

    fn resolve_all(&self, names: &[&str]) -> Result<SmallVec<[usize; 4]>, BayesNetError> {
        names.iter().map(|n| self.resolve(n)).collect()
    }

    /// `I(X; Y)` in nats.
    pub fn mutual_information(&self, x: &str, y: &str) -> Result<f64, BayesNetError> {
        Ok(self.mi_indices(self.resolve(x)?, self.resolve(y)?))
    }

    /// `I(X; Y | Z)` in nats. Several conditioning variables are combined into
    /// one composite variable over their observed joint values.
    pub fn conditional_mutual_information(
        &self,
        x: &str,
        y: &str,
        conditioning: &[&str],
    ) -> Result<f64, BayesNetError> {
        let z = self.resolve_all(conditioning)?;
        Ok(self.cmi_indices(self.resolve(x)?, self.resolve(y)?, &z))
    }

    /// Tests whether the two `dependent` variables are independent given
    /// `conditioning` (unconditionally when it is empty).
    ///
    /// Fails with [`BayesNetError::Precondition`] unless exactly two dependent
    /// variables are supplied.
    pub fn independence_test(
        &self,
        dependent: &[&str],
        conditioning: &[&str],
    ) -> Result<IndependenceTestResult, BayesNetError> {
        let [x, y] = dependent else {
            return Err(BayesNetError::Precondition(format!(
                "independence test needs exactly two dependent variables, got {}",
                dependent.len()
            )));
        };
        let z = self.resolve_all(conditioning)?;
        Ok(self.test_indices(self.resolve(x)?, self.resolve(y)?, &z))
    }

    pub(crate) fn test_indices(&self, x: usize, y: usize, z: &[usize]) -> IndependenceTestResult {
        let statistic = if z.is_empty() {
            self.mi_indices(x, y)
        } else {
            self.cmi_indices(x, y, z)
        };
        let chi_squared = (2.0 * self.rows as f64 * statistic).max(0.0);

        let df = z
            .iter()
            .map(|&c| self.columns[c].cardinality())
            .fold(
                self.columns[x].cardinality().saturating_sub(1)
                    * self.columns[y].cardinality().saturating_sub(1),
                usize::saturating_mul,
            );

        // A constant variable carries no information: nothing to reject.
        let p_value = if df == 0 {
            1.0
        } else {
            match self.config.p_value {
                PValueMethod::Survival => chi_squared_survival(chi_squared, df),
                PValueMethod::LegacyDensity => 2.0 * chi_squared_pdf(chi_squared, df),
            }
        };

        IndependenceTestResult {
            statistic,
            chi_squared,
            degrees_of_freedom: df,
            p_value,
            independent: p_value > self.config.alpha,
        }
    }

    fn mi_indices(&self, x: usize, y: usize) -> f64 {
        if self.rows == 0 {
            return 0.0;
        }
        let (cx, cy) = (&self.columns[x], &self.columns[y]);
        let (kx, ky) = (cx.cardinality(), cy.cardinality());

        let mut joint = vec![0u64; kx * ky];
        let mut marginal_x = vec![0u64; kx];
        let mut marginal_y = vec![0u64; ky];
        for (&a, &b) in cx.codes.iter().zip(&cy.codes) {
            let (a, b) = (a as usize, b as usize);
            joint[a * ky + b] += 1;
            marginal_x[a] += 1;
            marginal_y[b] += 1;
        }

        let n = self.rows as f64;
        let eps = self.config.epsilon;
        let mut mi = 0.0;
        for a in 0..kx {
            let px = marginal_x[a] as f64 / n;
            for b in 0..ky {
                let count = joint[a * ky + b];
                if count == 0 {
                    continue;
                }
                let pxy = count as f64 / n;
                let py = marginal_y[b] as f64 / n;
                mi += pxy * ((pxy + eps) / (px * py + eps)).ln();
            }
        }
        mi
    }

    fn cmi_indices(&self, x: usize, y: usize, z: &[usize]) -> f64 {
        if self.rows == 0 {
            return 0.0;
        }
        let (cx, cy) = (&self.columns[x], &self.columns[y]);
        let (kx, ky) = (cx.cardinality(), cy.cardinality());
        let (z_codes, kz) = self.composite(z);

        let mut xyz = vec![0u64; kx * ky * kz];
        let mut xz = vec![0u64; kx * kz];
        let mut yz = vec![0u64; ky * kz];
        let mut zc = vec![0u64; kz];
        for row in 0..self.rows {
            let (a, b, c) = (
                cx.codes[row] as usize,
                cy.codes[row] as usize,
                z_codes[row] as usize,
            );
            xyz[(a * ky + b) * kz + c] += 1;
            xz[a * kz + c] += 1;
            yz[b * kz + c] += 1;
            zc[c] += 1;
        }

        let n = self.rows as f64;
        let eps = self.config.epsilon;
        let mut cmi = 0.0;
        for a in 0..kx {
            for b in 0..ky {
                for c in 0..kz {
                    let count = xyz[(a * ky + b) * kz + c];
                    if count == 0 {
                        continue;
                    }
                    let pxyz = count as f64 / n;
                    let pz = zc[c] as f64 / n;
                    let pxz = xz[a * kz + c] as f64 / n;
                    let pyz = yz[b * kz + c] as f64 / n;
                    cmi += pxyz * ((pz * pxyz + eps) / (pxz * pyz + eps)).ln();
                }
            }
        }
        cmi
    }

    /// Encodes the joint values of `z` as one dense categorical column.
    fn composite(&self, z: &[usize]) -> (Vec<u32>, usize) {
        if let [single] = z {
            let column = &self.columns[*single];
            return (column.codes.clone(), column.cardinality());
        }
        let mut lookup: FxHashMap<SmallVec<[u32; 4]>, u32> = FxHashMap::default();
        let codes = (0..self.rows)
            .map(|row| {
                let key: SmallVec<[u32; 4]> =
                    z.iter().map(|&c| self.columns[c].codes[row]).collect();
                let next = lookup.len() as u32;
                *lookup.entry(key).or_insert(next)
            })
            .collect();
        (codes, lookup.len().max(1))
    }
}

/// `I(X; Y)` over a dataset with default smoothing.
pub fn mutual_information(dataset: &Dataset, x: &str, y: &str) -> Result<f64, BayesNetError> {
    IndependenceOracle::new(dataset).mutual_information(x, y)
}

/// `I(X; Y | Z)` over a dataset with default smoothing.
pub fn conditional_mutual_information(
    dataset: &Dataset,
    x: &str,
    y: &str,
    conditioning: &[&str],
) -> Result<f64, BayesNetError> {
    IndependenceOracle::new(dataset).conditional_mutual_information(x, y, conditioning)
}

/// One-shot independence test at significance level `alpha`.
pub fn independence_test(
    dataset: &Dataset,
    dependent: &[&str],
    conditioning: &[&str],
    alpha: f64,
) -> Result<IndependenceTestResult, BayesNetError> {
    let config = IndependenceConfig {
        alpha,
        ..IndependenceConfig::default()
    };
    IndependenceOracle::with_config(dataset, config)?.independence_test(dependent, conditioning)
}
