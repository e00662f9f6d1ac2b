//! A module for the computation of betweenness from reconstructed shortest paths.

use itertools::Itertools;

use crate::paths::ShortestPaths;

/// Counts, for each vertex, the ordered `(source, target)` pairs whose shortest path passes
/// through it. The result is indexed like the matrices of `paths`.
///
/// Only the single path recoverable from the predecessor matrix is counted for each pair, ties
/// between equally short paths are not split and the counts are not normalised.
pub fn compute_betweenness<T>(paths: &ShortestPaths<T>) -> Vec<u32> {
    let num_nodes = paths.nodes().len();
    let mut betweenness_count: Vec<u32> = vec![0; num_nodes];

    for (source, target) in (0..num_nodes).cartesian_product(0..num_nodes) {
        if source == target {
            continue;
        }

        let Some(path) = paths.path_indices(source, target) else {
            continue;
        };

        // The endpoints aren't counted, only the vertices strictly between them.
        if path.len() > 2 {
            for &index in &path[1..path.len() - 1] {
                betweenness_count[index] += 1;
            }
        }
    }

    betweenness_count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line() {
        let mut graph = graph!(edges: [(1, 2, 1.0), (2, 3, 1.0), (3, 4, 1.0)], arcs: []);

        // Both directions are counted: 1-3, 1-4, 2-4 and their reverses go through 2 or 3.
        assert_eq!(compute_betweenness(graph.shortest_paths()), vec![0, 4, 4, 0]);
    }

    #[test]
    fn directed_path() {
        let mut graph = graph!(edges: [(1, 2, 5.0)], arcs: [(2, 3, 3.0)]);

        assert_eq!(compute_betweenness(graph.shortest_paths()), vec![0, 1, 0]);
    }

    #[test]
    fn ties_are_not_split() {
        // Two equally short routes from 1 to 4, only the one kept by the predecessor matrix
        // is counted.
        let mut graph = graph!(
            edges: [(1, 2, 1.0), (2, 4, 1.0), (1, 3, 1.0), (3, 4, 1.0)],
            arcs: []
        );
        let counts = compute_betweenness(graph.shortest_paths());

        // 1-4 and 4-1 go through 2, the first intermediate found, 2-3 and 3-2 through 1.
        assert_eq!(counts, vec![2, 2, 0, 0]);
    }

    #[test]
    fn disconnected() {
        let mut graph = graph!(edges: [(1, 2, 1.0), (3, 4, 1.0)], arcs: []);

        assert_eq!(compute_betweenness(graph.shortest_paths()), vec![0; 4]);
    }
}
