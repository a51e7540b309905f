//! Euclidean locality-sensitive hashing.
//!
//! [`LshFunction`] is one hash of the classical Euclidean LSH family: the
//! point is projected onto a random Gaussian direction, shifted by a random
//! offset and discretised into buckets of width 4. Points at distance `c`
//! collide with probability [`LshFunction::collision_probability`], which
//! decreases monotonically in `c`.
//!
//! [`E2Lsh`] composes `K` such hashes per table (collisions require
//! agreement on all `K`) across `L` independent tables (a near neighbour is
//! recalled when it collides in at least one table).

use std::collections::{HashMap, HashSet};

use log::{debug, trace};
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};

use crate::data::DataPoint;

/// Bucket width of the discretised projection.
const BUCKET_WIDTH: f64 = 4.0;

/// `2 * sqrt(2)`, the erf argument scale at bucket width 4.
const TWO_ROOT_TWO: f64 = 2.828_427_124_746_190_3;
/// `2 * sqrt(2 * pi)`.
const TWO_ROOT_TWO_PI: f64 = 5.013_256_549_262_001;

/// One Euclidean LSH function `h(x) = floor((g . x + b) / 4)` with `g`
/// standard Gaussian and `b` uniform in `[0, 4)`.
#[derive(Debug, Clone)]
pub struct LshFunction {
    projection: Vec<f64>,
    offset: f64,
}

impl LshFunction {
    /// Sample a fresh hash function for points of the given dimension.
    pub fn sample(dimension: usize, rng: &mut impl Rng) -> Self {
        let projection = (0..dimension).map(|_| StandardNormal.sample(rng)).collect();
        let offset = rng.random_range(0.0..BUCKET_WIDTH);
        Self { projection, offset }
    }

    /// Hash a point to its bucket index.
    pub fn apply(&self, point: &[f64]) -> i32 {
        debug_assert_eq!(point.len(), self.projection.len());
        let dot: f64 =
            self.projection.iter().zip(point.iter()).map(|(g, x)| g * x).sum();
        ((dot + self.offset) / BUCKET_WIDTH).floor() as i32
    }

    /// Probability that two points at Euclidean distance `distance` hash to
    /// the same bucket.
    pub fn collision_probability(distance: f64) -> f64 {
        if distance <= 0.0 {
            return 1.0;
        }
        let c = distance;
        libm::erf(TWO_ROOT_TWO / c)
            - (c / TWO_ROOT_TWO_PI) * (1.0 - (-8.0 / (c * c)).exp())
    }
}

/// A set of `L` hash tables, each bucketing the data set by the
/// concatenation of `K` LSH functions.
pub struct E2Lsh {
    hash_functions: Vec<Vec<LshFunction>>,
    tables: Vec<HashMap<Vec<i32>, Vec<usize>>>,
    points: Vec<DataPoint>,
}

impl E2Lsh {
    /// Build the hash tables over the given points with `num_hashes` (`K`)
    /// functions per table and `num_tables` (`L`) tables.
    pub fn new(
        num_hashes: usize,
        num_tables: usize,
        points: Vec<DataPoint>,
        rng: &mut impl Rng,
    ) -> Self {
        let dimension = points.first().map_or(0, |p| p.len());
        debug!(
            "Building E2LSH: K={}, L={}, {} points of dimension {}",
            num_hashes,
            num_tables,
            points.len(),
            dimension
        );

        let hash_functions: Vec<Vec<LshFunction>> = (0..num_tables)
            .map(|_| {
                (0..num_hashes).map(|_| LshFunction::sample(dimension, rng)).collect()
            })
            .collect();

        let mut tables: Vec<HashMap<Vec<i32>, Vec<usize>>> =
            vec![HashMap::new(); num_tables];
        for (functions, table) in hash_functions.iter().zip(tables.iter_mut()) {
            for (idx, point) in points.iter().enumerate() {
                let key: Vec<i32> = functions.iter().map(|h| h.apply(point)).collect();
                table.entry(key).or_default().push(idx);
            }
        }

        Self { hash_functions, tables, points }
    }

    /// Indices of the stored points colliding with `query` in at least one
    /// table, deduplicated.
    pub fn get_near_neighbors(&self, query: &[f64]) -> Vec<usize> {
        let mut recalled: HashSet<usize> = HashSet::new();
        for (functions, table) in self.hash_functions.iter().zip(self.tables.iter()) {
            let key: Vec<i32> = functions.iter().map(|h| h.apply(query)).collect();
            if let Some(bucket) = table.get(&key) {
                recalled.extend(bucket.iter().copied());
            }
        }
        trace!("E2LSH recall: {} candidates", recalled.len());
        recalled.into_iter().collect()
    }

    /// The stored point at `index`.
    pub fn point(&self, index: usize) -> &[f64] {
        &self.points[index]
    }

    /// Number of stored points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
