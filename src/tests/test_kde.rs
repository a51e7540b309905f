use approx::assert_abs_diff_eq;
use smartcore::linalg::basic::arrays::Array;
use smartcore::linalg::basic::matrix::DenseMatrix;

use crate::error::Error;
use crate::kde::{CknsGaussianKde, ExactGaussianKde};
use crate::tests::init;
use crate::tests::test_data::make_gaussian;

#[test]
fn test_exact_kde_hand_computed() {
    init();
    let data = DenseMatrix::from_2d_vec(&vec![vec![0.0, 0.0], vec![1.0, 0.0]]).unwrap();
    let kde = ExactGaussianKde::new(&data, 1.0).unwrap();

    let queries = DenseMatrix::from_2d_vec(&vec![vec![0.0, 0.0], vec![0.5, 0.0]]).unwrap();
    let estimates = kde.query(&queries).unwrap();

    // F(0) = (1 + e^-1) / 2; F(0.5) = e^-0.25 by symmetry.
    assert_abs_diff_eq!(estimates[0], (1.0 + (-1.0f64).exp()) / 2.0, epsilon = 1e-12);
    assert_abs_diff_eq!(estimates[1], (-0.25f64).exp(), epsilon = 1e-12);
}

#[test]
fn test_exact_kde_large_batch_matches_serial() {
    init();
    // Large batches run on the worker pool; the chunking must not change
    // any value.
    let data = make_gaussian(200, 3, 7);
    let kde = ExactGaussianKde::new(&data, 0.5).unwrap();

    let queries = make_gaussian(64, 3, 8);
    let batched = kde.query(&queries).unwrap();

    for i in 0..64 {
        let single = DenseMatrix::from_2d_vec(&vec![(0..3)
            .map(|j| *queries.get((i, j)))
            .collect::<Vec<f64>>()])
        .unwrap();
        let expected = kde.query(&single).unwrap()[0];
        assert_abs_diff_eq!(batched[i], expected, epsilon = 1e-12);
    }
}

#[test]
fn test_ckns_tracks_exact_within_relative_error() {
    init();
    // 10^4 standard Gaussian points, a = 1, eps = 0.5: every estimate
    // should land within a factor 1.5 of the exact value.
    let data = make_gaussian(10_000, 2, 1234);
    let queries = make_gaussian(100, 2, 5678);

    let exact = ExactGaussianKde::new(&data, 1.0).unwrap();
    let ckns = CknsGaussianKde::new(&data, 1.0, 0.5, 99).unwrap();

    let exact_values = exact.query(&queries).unwrap();
    let ckns_values = ckns.query(&queries).unwrap();

    for (estimate, truth) in ckns_values.iter().zip(exact_values.iter()) {
        let ratio = estimate / truth;
        assert!(
            (0.5..=1.5).contains(&ratio),
            "estimate {} too far from exact {} (ratio {})",
            estimate,
            truth,
            ratio
        );
    }
}

#[test]
fn test_ckns_deterministic_per_seed() {
    init();
    let data = make_gaussian(2000, 2, 10);
    let queries = make_gaussian(20, 2, 11);

    let first = CknsGaussianKde::new(&data, 1.0, 0.8, 77).unwrap();
    let second = CknsGaussianKde::new(&data, 1.0, 0.8, 77).unwrap();

    // Identical seeds produce identical lattices, hence identical output.
    assert_eq!(first.query(&queries).unwrap(), second.query(&queries).unwrap());
}

#[test]
fn test_ckns_far_query_returns_floor() {
    init();
    let data = make_gaussian(500, 2, 21);
    let ckns = CknsGaussianKde::new(&data, 1.0, 0.5, 3).unwrap();

    let far = DenseMatrix::from_2d_vec(&vec![vec![1000.0, 1000.0]]).unwrap();
    let estimates = ckns.query(&far).unwrap();
    assert_eq!(estimates[0], 1.0 / 500.0);
}

#[test]
fn test_ckns_parameter_schedule_odd_and_even_levels() {
    init();
    // n = 300: ceil(log2 n) = 9, so five guess levels (0, 2, 4, 6, 8).
    let odd = CknsGaussianKde::new(&make_gaussian(300, 2, 31), 1.0, 0.9, 1).unwrap();
    assert_eq!(odd.max_log_nmu(), 9);
    assert_eq!(odd.num_guess_levels(), 5);

    // n = 256: ceil(log2 n) = 8 exactly, so four guess levels; the top
    // level stays strictly below the maximum exponent.
    let even = CknsGaussianKde::new(&make_gaussian(256, 2, 32), 1.0, 0.9, 2).unwrap();
    assert_eq!(even.max_log_nmu(), 8);
    assert_eq!(even.num_guess_levels(), 4);

    // Both schedules answer queries.
    let queries = make_gaussian(5, 2, 33);
    assert_eq!(odd.query(&queries).unwrap().len(), 5);
    assert_eq!(even.query(&queries).unwrap().len(), 5);
}

#[test]
fn test_ckns_argument_checking() {
    init();
    let data = make_gaussian(100, 2, 41);
    for eps in [0.0, -0.5, 1.5] {
        let result = CknsGaussianKde::new(&data, 1.0, eps, 0);
        assert!(matches!(result, Err(Error::InvalidArgument(_))), "eps = {} accepted", eps);
    }

    let empty: Vec<Vec<f64>> = Vec::new();
    let empty = DenseMatrix::from_2d_vec(&empty);
    if let Ok(empty) = empty {
        assert!(CknsGaussianKde::new(&empty, 1.0, 0.5, 0).is_err());
    }

    let kde = CknsGaussianKde::new(&data, 1.0, 0.5, 0).unwrap();
    let mismatched = make_gaussian(4, 3, 42);
    assert!(matches!(kde.query(&mismatched), Err(Error::InvalidArgument(_))));

    let exact = ExactGaussianKde::new(&data, 1.0).unwrap();
    assert!(matches!(exact.query(&mismatched), Err(Error::InvalidArgument(_))));
}

#[test]
fn test_ckns_repetition_count_scales_with_error() {
    init();
    let data = make_gaussian(1000, 2, 51);
    let loose = CknsGaussianKde::new(&data, 1.0, 1.0, 0).unwrap();
    let tight = CknsGaussianKde::new(&data, 1.0, 0.25, 0).unwrap();
    // k1 = ceil(0.2 ln(n) / eps^2): ceil(1.38) = 2 and ceil(22.1) = 23.
    assert_eq!(loose.num_repetitions(), 2);
    assert_eq!(tight.num_repetitions(), 23);
}
