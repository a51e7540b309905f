use approx::assert_abs_diff_eq;
use sprs::TriMat;

use crate::error::Error;
use crate::graph::Graph;
use crate::graph_factory::{complete_graph, cycle_graph, second_difference_graph, star_graph};
use crate::matrix;
use crate::tests::init;

/// Adjacency of a weighted 4-vertex graph with a self-loop on vertex 2.
fn weighted_graph() -> Graph {
    let mut triplets: TriMat<f64> = TriMat::new((4, 4));
    for &(i, j, w) in
        &[(0usize, 1usize, 2.5f64), (1, 2, 0.5), (2, 3, 1.25), (0, 3, 3.0)]
    {
        triplets.add_triplet(i, j, w);
        triplets.add_triplet(j, i, w);
    }
    triplets.add_triplet(2, 2, 0.75);
    Graph::new(triplets.to_csr()).unwrap()
}

#[test]
fn test_construction_from_csr_vectors() {
    init();
    // The disconnected graph with edges {0,1}=2 and {2,3}=1.
    let row_starts = vec![0, 1, 2, 3, 4];
    let col_indices = vec![1, 0, 3, 2];
    let values = vec![2.0, 2.0, 1.0, 1.0];

    let graph = Graph::from_csr_vectors(&row_starts, &col_indices, &values).unwrap();
    assert_eq!(graph.number_of_vertices(), 4);
    assert_eq!(graph.number_of_edges(), 2);
    assert!(!graph.has_self_loops());
    assert_eq!(graph.degree(0).unwrap(), 2.0);
    assert_eq!(graph.degree(2).unwrap(), 1.0);
}

#[test]
fn test_asymmetric_adjacency_rejected() {
    init();
    let row_starts = vec![0, 1, 1];
    let col_indices = vec![1];
    let values = vec![1.0];
    let result = Graph::from_csr_vectors(&row_starts, &col_indices, &values);
    assert!(matches!(result, Err(Error::Domain(_))));
}

#[test]
fn test_adjacency_is_symmetric() {
    init();
    for graph in [weighted_graph(), cycle_graph(9).unwrap(), star_graph(6).unwrap()] {
        assert!(matrix::is_symmetric(graph.adjacency()));
    }
}

#[test]
fn test_laplacian_to_adjacency_round_trip() {
    init();
    let graph = weighted_graph();
    let rebuilt = Graph::new(graph.laplacian().clone()).unwrap();

    assert_eq!(rebuilt.number_of_vertices(), graph.number_of_vertices());
    assert_eq!(rebuilt.adjacency().nnz(), graph.adjacency().nnz());
    for (&w, (i, j)) in graph.adjacency().iter() {
        let rebuilt_w = *rebuilt.adjacency().get(i, j).unwrap();
        assert_abs_diff_eq!(rebuilt_w, w, epsilon = 1e-9);
    }
    assert_eq!(rebuilt.has_self_loops(), graph.has_self_loops());
}

#[test]
fn test_floating_point_noise_pruned() {
    init();
    // A Laplacian with sub-epsilon residue where exact zeros belong.
    let mut triplets: TriMat<f64> = TriMat::new((3, 3));
    triplets.add_triplet(0, 0, 1.0);
    triplets.add_triplet(0, 1, -1.0);
    triplets.add_triplet(1, 0, -1.0);
    triplets.add_triplet(1, 1, 1.0 + 1e-13);
    triplets.add_triplet(1, 2, -1e-13);
    triplets.add_triplet(2, 1, -1e-13);
    triplets.add_triplet(2, 2, 1e-13);

    let graph = Graph::new(triplets.to_csr()).unwrap();
    assert_eq!(*graph.adjacency().get(0, 1).unwrap(), 1.0);
    assert!(graph.adjacency().get(1, 2).is_none());
    assert!(!graph.has_self_loops());
}

#[test]
fn test_derived_matrices_complete_graph() {
    init();
    let graph = complete_graph(3).unwrap();

    let degree = graph.degree_matrix();
    for i in 0..3 {
        assert_eq!(*degree.get(i, i).unwrap(), 2.0);
    }

    let laplacian = graph.laplacian();
    for i in 0..3 {
        assert_eq!(*laplacian.get(i, i).unwrap(), 2.0);
        for j in 0..3 {
            if i != j {
                assert_eq!(*laplacian.get(i, j).unwrap(), -1.0);
            }
        }
    }

    let signless = graph.signless_laplacian();
    assert_eq!(*signless.get(0, 0).unwrap(), 2.0);
    assert_eq!(*signless.get(0, 1).unwrap(), 1.0);

    let normalised = graph.normalised_laplacian();
    for i in 0..3 {
        assert_abs_diff_eq!(*normalised.get(i, i).unwrap(), 1.0, epsilon = 1e-12);
        for j in 0..3 {
            if i != j {
                assert_abs_diff_eq!(*normalised.get(i, j).unwrap(), -0.5, epsilon = 1e-12);
            }
        }
    }

    let signless_normalised = graph.normalised_signless_laplacian();
    assert_abs_diff_eq!(*signless_normalised.get(0, 1).unwrap(), 0.5, epsilon = 1e-12);

    let inverse_degree = graph.inverse_degree_matrix();
    assert_abs_diff_eq!(*inverse_degree.get(1, 1).unwrap(), 0.5, epsilon = 1e-12);

    // W = (1/2) I + (1/2) A D^-1: rows of a regular graph sum to one.
    let walk = graph.lazy_random_walk_matrix();
    assert_abs_diff_eq!(*walk.get(0, 0).unwrap(), 0.5, epsilon = 1e-12);
    assert_abs_diff_eq!(*walk.get(0, 1).unwrap(), 0.25, epsilon = 1e-12);
    for i in 0..3 {
        let row_sum: f64 = (0..3).map(|j| walk.get(i, j).copied().unwrap_or(0.0)).sum();
        assert_abs_diff_eq!(row_sum, 1.0, epsilon = 1e-12);
    }
}

#[test]
fn test_self_loop_accounting() {
    init();
    // Edge {0,1} of weight 1 plus a self-loop of weight 2 on vertex 1.
    let mut triplets: TriMat<f64> = TriMat::new((2, 2));
    triplets.add_triplet(0, 1, 1.0);
    triplets.add_triplet(1, 0, 1.0);
    triplets.add_triplet(1, 1, 2.0);
    let graph = Graph::new(triplets.to_csr()).unwrap();

    assert!(graph.has_self_loops());
    // The self-loop contributes twice to the weighted degree.
    assert_eq!(graph.degree(1).unwrap(), 5.0);
    assert_eq!(graph.degree(0).unwrap(), 1.0);
    assert_eq!(graph.degree_unweighted(1).unwrap(), 3);
    // Each self-loop counts as one edge.
    assert_eq!(graph.number_of_edges(), 2);

    // The self-loop is not reported as a neighbour.
    let neighbors = graph.neighbors(1).unwrap();
    assert_eq!(neighbors.len(), 1);
    assert_eq!(neighbors[0].v2, 0);
    assert_eq!(graph.neighbors_unweighted(1).unwrap(), vec![0]);

    assert_abs_diff_eq!(graph.total_volume(), 6.0, epsilon = 1e-12);
    assert_abs_diff_eq!(graph.average_degree(), 3.0, epsilon = 1e-12);
}

#[test]
fn test_second_difference_graph_built_from_laplacian() {
    init();
    let graph = second_difference_graph(4).unwrap();
    assert!(graph.has_self_loops());
    // Unit self-loops appear on the path endpoints only.
    assert_eq!(*graph.adjacency().get(0, 0).unwrap(), 1.0);
    assert_eq!(*graph.adjacency().get(3, 3).unwrap(), 1.0);
    assert!(graph.adjacency().get(1, 1).is_none());
    assert_eq!(*graph.adjacency().get(1, 2).unwrap(), 1.0);
}

#[test]
fn test_local_query_argument_checking() {
    init();
    let graph = cycle_graph(5).unwrap();
    assert!(matches!(graph.degree(5), Err(Error::InvalidArgument(_))));
    assert!(matches!(graph.degree_unweighted(17), Err(Error::InvalidArgument(_))));
    assert!(matches!(graph.neighbors(5), Err(Error::InvalidArgument(_))));
    assert!(matches!(graph.neighbors_unweighted(5), Err(Error::InvalidArgument(_))));
    assert!(matches!(graph.subgraph(&[0, 9]), Err(Error::InvalidArgument(_))));
    assert!(graph.vertex_exists(4));
    assert!(!graph.vertex_exists(5));
}

#[test]
fn test_subgraph() {
    init();
    let graph = cycle_graph(5).unwrap();
    // Vertices {0, 1, 2} induce the path 0 - 1 - 2; duplicates ignored.
    let sub = graph.subgraph(&[0, 1, 1, 2]).unwrap();
    assert_eq!(sub.number_of_vertices(), 3);
    assert_eq!(sub.number_of_edges(), 2);
    assert_eq!(sub.neighbors_unweighted(1).unwrap(), vec![0, 2]);
    assert_eq!(sub.degree(0).unwrap(), 1.0);
}

#[test]
fn test_subgraph_keeps_self_loops() {
    init();
    let graph = second_difference_graph(4).unwrap();
    let sub = graph.subgraph(&[0, 1]).unwrap();
    assert!(sub.has_self_loops());
    assert_eq!(*sub.adjacency().get(0, 0).unwrap(), 1.0);
}

#[test]
fn test_disjoint_union() {
    init();
    let left = complete_graph(3).unwrap();
    let right = cycle_graph(4).unwrap();
    let union = left.disjoint_union(&right).unwrap();

    assert_eq!(union.number_of_vertices(), 7);
    assert_eq!(union.number_of_edges(), 3 + 4);
    // The blocks stay disconnected and the right block is offset by 3.
    assert_eq!(union.neighbors_unweighted(0).unwrap(), vec![1, 2]);
    assert_eq!(union.neighbors_unweighted(3).unwrap(), vec![4, 6]);
}

#[test]
fn test_graph_equality() {
    init();
    assert_eq!(cycle_graph(5).unwrap(), cycle_graph(5).unwrap());
    assert_ne!(cycle_graph(5).unwrap(), star_graph(5).unwrap());

    let graph = weighted_graph();
    assert_eq!(graph.clone(), graph);
}

#[test]
fn test_batch_degrees() {
    init();
    let graph = star_graph(5).unwrap();
    assert_eq!(graph.degrees(&[0, 1, 4]).unwrap(), vec![4.0, 1.0, 1.0]);
    assert_eq!(graph.degrees_unweighted(&[0, 2]).unwrap(), vec![4, 1]);
    assert!(graph.degrees(&[0, 5]).is_err());
}

#[test]
fn test_csr_vector_validation() {
    init();
    assert!(matrix::from_csr_vectors(&[], &[], &[]).is_err());
    // Column index out of range.
    assert!(matrix::from_csr_vectors(&[0, 1, 2], &[1, 2], &[1.0, 1.0]).is_err());
    // Final row start disagrees with the non-zero count.
    assert!(matrix::from_csr_vectors(&[0, 1, 3], &[1, 0], &[1.0, 1.0]).is_err());
}
