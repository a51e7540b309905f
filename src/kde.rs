//! Gaussian kernel density estimation.
//!
//! For a data set `{x_1, ..., x_n}` and scale parameter `a`, the Gaussian
//! KDE of a query point `q` is
//!
//! ```text
//! F(q) = (1/n) * sum_i exp(-a * ||q - x_i||^2)
//! ```
//!
//! [`ExactGaussianKde`] computes `F` by direct iteration over the data.
//! [`CknsGaussianKde`] answers the same queries in sublinear time with a
//! relative-error guarantee, following the
//! Charikar-Kapralov-Nouri-Siminelakis construction.
//!
//! # Algorithm overview
//!
//! 1. **Guesses.** The estimator maintains a geometric ladder of guesses
//!    `mu ~ 2^log_nmu / n` for the value of `n * F(q)`, with
//!    `log_nmu = 2 * log_nmu_iter` for each level `log_nmu_iter`.
//! 2. **Shells.** For each guess, the contribution to `F(q)` is split into
//!    `J` distance shells: shell `j` collects points in the annulus between
//!    `r_{j-1}` and `r_j` where `r_j^2 = j * ln(2) / a`.
//! 3. **Sampling.** For each shell, the data set is subsampled at rate
//!    `2^-j * 2^-log_nmu` and either stored directly (at or below
//!    [`HASH_UNIT_CUTOFF`] points) or indexed by Euclidean LSH with
//!    parameters tuned to recall the shell radius.
//! 4. **Estimates.** A query sums the recalled kernel contributions,
//!    rescaled by the sampling probability, across shells. `k1` independent
//!    repetitions are reduced by their median to suppress variance.
//! 5. **Acceptance.** Guesses are scanned from the largest downward; the
//!    first whose median estimate reaches `2^log_nmu` is accepted. If no
//!    guess passes, the floor value `1/n` is returned.
//!
//! Construction fans out across the hash-unit lattice with rayon; every
//! hash unit derives its own RNG stream from the constructor seed and its
//! lattice coordinates, so two estimators built with the same seed are
//! identical regardless of thread scheduling.

use std::f64::consts::LN_2;

use log::{debug, info};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use smartcore::linalg::basic::arrays::Array;
use smartcore::linalg::basic::matrix::DenseMatrix;

use crate::data::{gaussian_kernel, matrix_to_points, squared_distance, DataPoint};
use crate::error::{Error, Result};
use crate::lsh::{E2Lsh, LshFunction};

/// `K_1 = C * log(n) / eps^2`: outer repetition constant.
const K1_CONSTANT: f64 = 0.2;
/// `K_2 = C * log2(n) * 2^phi_j`: hash table count constant.
const K2_CONSTANT: f64 = 1.0;
/// At or below this many sampled points a hash unit stores the points
/// directly and brute-forces queries instead of building LSH tables.
const HASH_UNIT_CUTOFF: usize = 1000;

/// `J`: the number of distance shells for a given guess level.
fn ckns_j(n: usize, log_nmu: i64) -> i64 {
    (n as f64).log2().ceil() as i64 - log_nmu
}

/// Sampling probability of shell `j` at guess level `log_nmu`.
fn sampling_probability(j: i64, log_nmu: i64) -> f64 {
    2f64.powi(-(j as i32)) * 2f64.powi(-(log_nmu as i32))
}

/// Squared radius of shell `j`: `r_j^2 = j * ln(2) / a`.
fn shell_radius_squared(j: i64, a: f64) -> f64 {
    j as f64 * LN_2 / a
}

/// E2LSH parameters `(K, L)` for shell `j` of `j_max` at data size `n`.
fn shell_lsh_parameters(j: i64, j_max: i64, n: usize, a: f64) -> (usize, usize) {
    let r_j = shell_radius_squared(j, a).sqrt();
    let p_j = LshFunction::collision_probability(r_j);
    let phi_j = ((j as f64 / j_max as f64) * (j_max - j + 1) as f64).ceil();
    let num_hashes = (-phi_j / p_j.log2()).floor().max(1.0) as usize;
    let num_tables = (K2_CONSTANT * (n as f64).log2() * 2f64.powf(phi_j)).ceil() as usize;
    (num_hashes, num_tables)
}

/// RNG seed for the hash unit at lattice cell `(log_nmu_iter, iter, j)`.
fn unit_seed(seed: u64, log_nmu_iter: i64, iter: usize, j: i64) -> u64 {
    let cell = ((log_nmu_iter as u64) << 42) ^ ((iter as u64) << 21) ^ (j as u64);
    seed ^ cell.wrapping_mul(0x9e37_79b9_7f4a_7c15)
}

enum HashUnitStore {
    /// Below the cutoff: the sampled points themselves.
    Points(Vec<DataPoint>),
    /// Above the cutoff: LSH tables over the sampled points.
    Buckets(E2Lsh),
}

/// One cell of the CKNS lattice: a subsampled copy of the data set,
/// answering kernel-sum queries restricted to one distance shell of one
/// guess level.
struct HashUnit {
    a: f64,
    log_nmu: i64,
    j: i64,
    store: HashUnitStore,
}

impl HashUnit {
    fn new(a: f64, data: &[DataPoint], log_nmu: i64, j: i64, rng: &mut ChaCha8Rng) -> Self {
        let n = data.len();
        let j_max = ckns_j(n, log_nmu);
        debug_assert!(j >= 1 && j <= j_max);

        let p_sampling = sampling_probability(j, log_nmu);
        let sampled: Vec<DataPoint> = data
            .iter()
            .filter(|_| rng.random::<f64>() < p_sampling)
            .cloned()
            .collect();

        let store = if sampled.len() <= HASH_UNIT_CUTOFF {
            HashUnitStore::Points(sampled)
        } else {
            let (num_hashes, num_tables) = shell_lsh_parameters(j, j_max, n, a);
            HashUnitStore::Buckets(E2Lsh::new(num_hashes, num_tables, sampled, rng))
        };

        Self { a, log_nmu, j, store }
    }

    /// Kernel-sum contribution of this unit's shell, rescaled by the
    /// sampling probability.
    fn query(&self, q: &[f64]) -> f64 {
        let p_sampling = sampling_probability(self.j, self.log_nmu);
        let radius_sq = shell_radius_squared(self.j, self.a);
        let inner_radius_sq =
            if self.j > 1 { shell_radius_squared(self.j - 1, self.a) } else { 0.0 };

        let mut total = 0.0;
        let mut accumulate = |x: &[f64]| {
            let d_sq = squared_distance(q, x);
            // Only points inside the annulus between r_{j-1} and r_j
            // belong to this shell.
            if d_sq <= radius_sq && d_sq > inner_radius_sq {
                total += gaussian_kernel(self.a, d_sq) / p_sampling;
            }
        };

        match &self.store {
            HashUnitStore::Points(points) => {
                for x in points {
                    accumulate(x);
                }
            }
            HashUnitStore::Buckets(lsh) => {
                for idx in lsh.get_near_neighbors(q) {
                    accumulate(lsh.point(idx));
                }
            }
        }
        total
    }
}

/// Sublinear-time `(eps, delta)`-approximate Gaussian KDE over a fixed
/// data set.
pub struct CknsGaussianKde {
    n: usize,
    dimension: usize,
    a: f64,
    max_log_nmu: i64,
    num_log_nmu_iterations: i64,
    k1: usize,
    /// Lattice indexed by `[log_nmu_iter][iter][j - 1]`.
    hash_units: Vec<Vec<Vec<HashUnit>>>,
}

impl CknsGaussianKde {
    /// Build the estimator over `data` (one point per row) with Gaussian
    /// scale `gaussian_param` and relative error target `eps`.
    ///
    /// The seed determines every sampling decision: estimators built from
    /// the same data and seed are identical.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if `eps` is outside `(0, 1]` or `data` is empty.
    pub fn new(
        data: &DenseMatrix<f64>,
        gaussian_param: f64,
        eps: f64,
        seed: u64,
    ) -> Result<Self> {
        if !(eps > 0.0 && eps <= 1.0) {
            return Err(Error::invalid_argument(format!(
                "relative error must lie in (0, 1], got {}",
                eps
            )));
        }
        let (n, dimension) = data.shape();
        if n == 0 {
            return Err(Error::invalid_argument("data set cannot be empty"));
        }

        let a = gaussian_param;
        let max_log_nmu = (n as f64).log2().ceil() as i64;
        let num_log_nmu_iterations = ((max_log_nmu as f64) / 2.0).ceil() as i64;
        let k1 = ((K1_CONSTANT * (n as f64).ln() / (eps * eps)).ceil() as usize).max(1);

        info!(
            "Building CKNS estimator: n={}, d={}, a={}, eps={}, k1={}, {} guess levels",
            n, dimension, a, eps, k1, num_log_nmu_iterations
        );

        let points = matrix_to_points(data);
        let hash_units: Vec<Vec<Vec<HashUnit>>> = (0..num_log_nmu_iterations)
            .map(|log_nmu_iter| {
                let log_nmu = 2 * log_nmu_iter;
                debug_assert!(log_nmu < max_log_nmu);
                let j_max = ckns_j(n, log_nmu);
                debug!(
                    "Guess level {}: log_nmu={}, {} shells x {} repetitions",
                    log_nmu_iter, log_nmu, j_max, k1
                );
                (0..k1)
                    .into_par_iter()
                    .map(|iter| {
                        (1..=j_max)
                            .map(|j| {
                                let mut rng = ChaCha8Rng::seed_from_u64(unit_seed(
                                    seed,
                                    log_nmu_iter,
                                    iter,
                                    j,
                                ));
                                HashUnit::new(a, &points, log_nmu, j, &mut rng)
                            })
                            .collect()
                    })
                    .collect()
            })
            .collect();

        info!("CKNS estimator ready");
        Ok(Self { n, dimension, a, max_log_nmu, num_log_nmu_iterations, k1, hash_units })
    }

    /// Estimate the KDE value of every query point (one per row).
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if the query dimension does not match the data.
    pub fn query(&self, queries: &DenseMatrix<f64>) -> Result<Vec<f64>> {
        let (m, d) = queries.shape();
        if d != self.dimension {
            return Err(Error::invalid_argument(format!(
                "query dimension {} must match data dimension {}",
                d, self.dimension
            )));
        }

        debug!("CKNS query: {} points", m);
        let query_points = matrix_to_points(queries);
        Ok(query_points.par_iter().map(|q| self.query_point(q)).collect())
    }

    /// Scan the guess levels from the largest downward and return the first
    /// accepted median estimate.
    fn query_point(&self, q: &[f64]) -> f64 {
        for log_nmu_iter in (0..self.num_log_nmu_iterations).rev() {
            let log_nmu = 2 * log_nmu_iter;

            let mut estimates: Vec<f64> = (0..self.k1)
                .map(|iter| {
                    self.hash_units[log_nmu_iter as usize][iter]
                        .iter()
                        .map(|unit| unit.query(q))
                        .sum()
                })
                .collect();
            let estimate = median(&mut estimates);

            // Accept the largest guess consistent with the observation:
            // estimate >= 2^log_nmu.
            if estimate.ln() >= log_nmu as f64 * LN_2 {
                return estimate / self.n as f64;
            }
        }
        1.0 / self.n as f64
    }

    pub fn data_size(&self) -> usize {
        self.n
    }

    pub fn gaussian_param(&self) -> f64 {
        self.a
    }

    /// The largest guess exponent, `ceil(log2(n))`.
    pub fn max_log_nmu(&self) -> i64 {
        self.max_log_nmu
    }

    /// Number of guess levels iterated at query time.
    pub fn num_guess_levels(&self) -> i64 {
        self.num_log_nmu_iterations
    }

    /// Number of independent repetitions reduced by the median.
    pub fn num_repetitions(&self) -> usize {
        self.k1
    }
}

/// Exact Gaussian KDE by direct iteration; the reference implementation
/// for testing and for small data sets.
pub struct ExactGaussianKde {
    points: Vec<DataPoint>,
    dimension: usize,
    a: f64,
}

impl ExactGaussianKde {
    /// # Errors
    ///
    /// `InvalidArgument` if `data` is empty.
    pub fn new(data: &DenseMatrix<f64>, gaussian_param: f64) -> Result<Self> {
        let (n, dimension) = data.shape();
        if n == 0 {
            return Err(Error::invalid_argument("data set cannot be empty"));
        }
        Ok(Self { points: matrix_to_points(data), dimension, a: gaussian_param })
    }

    /// Compute the exact KDE value of every query point (one per row).
    ///
    /// Large query batches are partitioned across worker threads; small
    /// batches are answered on the caller's thread.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if the query dimension does not match the data.
    pub fn query(&self, queries: &DenseMatrix<f64>) -> Result<Vec<f64>> {
        let (m, d) = queries.shape();
        if d != self.dimension {
            return Err(Error::invalid_argument(format!(
                "query dimension {} must match data dimension {}",
                d, self.dimension
            )));
        }

        let query_points = matrix_to_points(queries);
        let results = if m < rayon::current_num_threads() {
            query_points.iter().map(|q| self.density(q)).collect()
        } else {
            query_points.par_iter().map(|q| self.density(q)).collect()
        };
        Ok(results)
    }

    fn density(&self, q: &[f64]) -> f64 {
        let total: f64 = self
            .points
            .iter()
            .map(|x| gaussian_kernel(self.a, squared_distance(q, x)))
            .sum();
        total / self.points.len() as f64
    }
}

/// Median by partial selection; for an even count the upper of the two
/// middle elements is returned.
fn median(values: &mut [f64]) -> f64 {
    let mid = values.len() / 2;
    let (_, m, _) = values.select_nth_unstable_by(mid, |a, b| a.total_cmp(b));
    *m
}
