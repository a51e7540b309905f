//! Standard graph constructors and random graph models.
//!
//! The deterministic constructors build small structured graphs used
//! throughout testing and benchmarking. The random models (stochastic block
//! model and Erdos-Renyi) take an explicit seed, so every generated graph
//! is reproducible and generation is safe to run from concurrent callers.
//!
//! For large graphs the random models switch from exact per-pair Bernoulli
//! sampling, which costs O(n^2), to geometric skip-sampling with expected
//! cost O(n + nnz): instead of flipping a coin for every candidate edge,
//! the sampler draws the gap to the next present edge directly.

use log::{debug, info};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Geometric};
use sprs::TriMat;

use crate::error::{Error, Result};
use crate::graph::Graph;

/// Above this vertex count the random models default to skip-sampling.
const EXACT_SAMPLING_LIMIT: usize = 1000;

/// The cycle graph on `n` vertices.
pub fn cycle_graph(n: usize) -> Result<Graph> {
    check_order(n)?;
    let mut triplets: TriMat<f64> = TriMat::new((n, n));
    for i in 0..n {
        triplets.add_triplet(i, (i + 1) % n, 1.0);
        triplets.add_triplet(i, (i + n - 1) % n, 1.0);
    }
    Graph::new(triplets.to_csr())
}

/// The complete graph on `n` vertices.
pub fn complete_graph(n: usize) -> Result<Graph> {
    check_order(n)?;
    let mut triplets: TriMat<f64> = TriMat::new((n, n));
    for i in 0..n {
        for j in 0..n {
            if i != j {
                triplets.add_triplet(i, j, 1.0);
            }
        }
    }
    Graph::new(triplets.to_csr())
}

/// The barbell graph: two complete graphs on `n` vertices joined by a
/// single edge, `2n` vertices in total.
pub fn barbell_graph(n: usize) -> Result<Graph> {
    check_order(n)?;
    let mut triplets: TriMat<f64> = TriMat::new((2 * n, 2 * n));
    for i in 0..n {
        for j in 0..n {
            if i != j {
                triplets.add_triplet(i, j, 1.0);
                triplets.add_triplet(n + i, n + j, 1.0);
            }
        }
    }
    triplets.add_triplet(n - 1, n, 1.0);
    triplets.add_triplet(n, n - 1, 1.0);
    Graph::new(triplets.to_csr())
}

/// The star graph: vertex 0 connected to each of the other `n - 1`
/// vertices.
pub fn star_graph(n: usize) -> Result<Graph> {
    check_order(n)?;
    let mut triplets: TriMat<f64> = TriMat::new((n, n));
    for i in 1..n {
        triplets.add_triplet(0, i, 1.0);
        triplets.add_triplet(i, 0, 1.0);
    }
    Graph::new(triplets.to_csr())
}

/// The graph whose Laplacian is the second-difference operator: a path
/// graph with a unit self-loop on each endpoint.
///
/// Built from the Laplacian matrix directly, exercising the
/// Laplacian-to-adjacency reconstruction path of [`Graph::new`].
pub fn second_difference_graph(n: usize) -> Result<Graph> {
    check_order(n)?;
    let mut triplets: TriMat<f64> = TriMat::new((n, n));
    for i in 0..n {
        triplets.add_triplet(i, i, 2.0);
        if i + 1 < n {
            triplets.add_triplet(i, i + 1, -1.0);
        }
        if i > 0 {
            triplets.add_triplet(i, i - 1, -1.0);
        }
    }
    Graph::new(triplets.to_csr())
}

/// Generate a graph from the symmetric stochastic block model.
///
/// Vertices are split evenly between `clusters` clusters (the final
/// cluster absorbs any remainder). Each within-cluster edge is present
/// with probability `p`, each between-cluster edge with probability `q`.
///
/// Exact per-pair sampling is used for small graphs; above
/// [`EXACT_SAMPLING_LIMIT`] vertices the skip-sampling method is used,
/// with expected running time O(clusters^2 + nnz).
pub fn sbm(n: usize, clusters: usize, p: f64, q: f64, seed: u64) -> Result<Graph> {
    sbm_with_mode(n, clusters, p, q, n <= EXACT_SAMPLING_LIMIT, seed)
}

/// [`sbm`] with an explicit choice between exact and skip-sampling.
pub fn sbm_with_mode(
    n: usize,
    clusters: usize,
    p: f64,
    q: f64,
    exact: bool,
    seed: u64,
) -> Result<Graph> {
    check_order(n)?;
    if clusters == 0 || clusters > n {
        return Err(Error::invalid_argument(format!(
            "cluster count must lie in [1, {}], got {}",
            n, clusters
        )));
    }
    check_probability(p)?;
    check_probability(q)?;

    info!(
        "Sampling SBM: n={}, clusters={}, p={}, q={}, exact={}",
        n, clusters, p, q, exact
    );
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let cluster_size = n / clusters;
    let cluster_of = |v: usize| (v / cluster_size).min(clusters - 1);

    let mut triplets: TriMat<f64> = TriMat::new((n, n));
    let mut add_edge = |i: usize, j: usize| {
        triplets.add_triplet(i, j, 1.0);
        triplets.add_triplet(j, i, 1.0);
    };

    if exact {
        for i in 0..n {
            for j in (i + 1)..n {
                let prob = if cluster_of(i) == cluster_of(j) { p } else { q };
                if rng.random::<f64>() < prob {
                    add_edge(i, j);
                }
            }
        }
    } else {
        for i in 0..n {
            let ci = cluster_of(i);
            // Within-cluster candidates above the diagonal, then the
            // remaining columns; the edge probability is constant on each
            // stretch, so both can be skip-sampled.
            let cluster_end = if ci == clusters - 1 { n } else { (ci + 1) * cluster_size };
            for j in skip_sample_range(&mut rng, p, i + 1, cluster_end)? {
                add_edge(i, j);
            }
            for j in skip_sample_range(&mut rng, q, cluster_end.max(i + 1), n)? {
                add_edge(i, j);
            }
        }
    }

    let graph = Graph::new(triplets.to_csr())?;
    debug!("Sampled SBM graph with {} edges", graph.number_of_edges());
    Ok(graph)
}

/// Generate a graph from the Erdos-Renyi model: each of the `n (n-1) / 2`
/// candidate edges is present independently with probability `p`.
pub fn erdos_renyi(n: usize, p: f64, seed: u64) -> Result<Graph> {
    sbm_with_mode(n, 1, p, 0.0, n <= EXACT_SAMPLING_LIMIT, seed)
}

/// [`erdos_renyi`] with an explicit choice between exact and skip-sampling.
pub fn erdos_renyi_with_mode(n: usize, p: f64, exact: bool, seed: u64) -> Result<Graph> {
    sbm_with_mode(n, 1, p, 0.0, exact, seed)
}

/// Sample the columns of `[start, end)` that survive independent Bernoulli
/// trials with probability `p`, by drawing geometric gaps between
/// successive successes.
fn skip_sample_range(
    rng: &mut ChaCha8Rng,
    p: f64,
    start: usize,
    end: usize,
) -> Result<Vec<usize>> {
    if p <= 0.0 || start >= end {
        return Ok(Vec::new());
    }
    if p >= 1.0 {
        return Ok((start..end).collect());
    }
    let gaps = Geometric::new(p)
        .map_err(|_| Error::invalid_argument("edge probability must lie in [0, 1]"))?;

    let mut sampled = Vec::new();
    let mut j = start;
    loop {
        j += gaps.sample(rng) as usize;
        if j >= end {
            break;
        }
        sampled.push(j);
        j += 1;
    }
    Ok(sampled)
}

fn check_order(n: usize) -> Result<()> {
    if n < 2 {
        return Err(Error::invalid_argument(format!(
            "number of vertices must be at least 2, got {}",
            n
        )));
    }
    Ok(())
}

fn check_probability(p: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&p) {
        return Err(Error::invalid_argument(format!(
            "edge probability must lie in [0, 1], got {}",
            p
        )));
    }
    Ok(())
}
