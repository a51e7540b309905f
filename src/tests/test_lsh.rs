use approx::assert_abs_diff_eq;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

use crate::lsh::{E2Lsh, LshFunction};
use crate::tests::init;

#[test]
fn test_collision_probability_endpoints() {
    init();
    assert_eq!(LshFunction::collision_probability(0.0), 1.0);
    assert_eq!(LshFunction::collision_probability(-1.0), 1.0);
    assert!(LshFunction::collision_probability(100.0) < 0.05);
}

#[test]
fn test_collision_probability_known_value() {
    init();
    // At distance equal to the bucket width the closed form gives
    // 1 - 2 Phi(-1) - 2 / sqrt(2 pi) (1 - e^(-1/2)).
    assert_abs_diff_eq!(LshFunction::collision_probability(4.0), 0.3687, epsilon = 1e-3);
}

#[test]
fn test_collision_probability_monotone() {
    init();
    let mut previous = 1.0;
    for step in 1..50 {
        let current = LshFunction::collision_probability(step as f64 * 0.25);
        assert!(current <= previous, "not monotone at distance {}", step as f64 * 0.25);
        assert!(current > 0.0);
        previous = current;
    }
}

#[test]
fn test_hash_function_is_deterministic() {
    init();
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let function = LshFunction::sample(4, &mut rng);
    let point = [0.3, -1.2, 0.5, 2.0];
    assert_eq!(function.apply(&point), function.apply(&point));
}

#[test]
fn test_near_neighbor_recall() {
    init();
    let mut rng = ChaCha8Rng::seed_from_u64(99);
    let tight = Normal::new(0.0, 0.1).unwrap();

    // A tight cluster around the origin: at these distances the per-table
    // collision probability is near one, so with ten tables essentially
    // every point is recalled.
    let points: Vec<Vec<f64>> =
        (0..500).map(|_| (0..3).map(|_| tight.sample(&mut rng)).collect()).collect();
    let lsh = E2Lsh::new(4, 10, points, &mut rng);
    assert_eq!(lsh.len(), 500);

    let recalled = lsh.get_near_neighbors(&[0.0, 0.0, 0.0]);
    assert!(recalled.len() >= 450, "recalled only {} of 500", recalled.len());
    assert!(recalled.iter().all(|&idx| idx < 500));

    // Deduplicated: no index may appear twice.
    let mut sorted = recalled.clone();
    sorted.sort_unstable();
    sorted.dedup();
    assert_eq!(sorted.len(), recalled.len());
}
