//! A module for computing all-pairs shortest paths.

use std::collections::BTreeMap;

use itertools::Itertools;
use nalgebra::DMatrix;
use tracing::debug;

use crate::graph::Graph;

/// The all-pairs shortest paths of a graph.
///
/// Both matrices are indexed by the sorted enumeration of the vertices returned by
/// [`ShortestPaths::nodes`]. Unreachable pairs have an infinite distance and no predecessor.
#[derive(Clone, Debug, PartialEq)]
pub struct ShortestPaths<T> {
    nodes: Vec<T>,
    index: BTreeMap<T, usize>,
    /// `distance[(i, j)]` is the cost of the cheapest path from `i` to `j`.
    distance: DMatrix<f64>,
    /// `predecessor[(i, j)]` is the vertex preceding `j` on the cheapest path from `i` to `j`.
    predecessor: DMatrix<Option<usize>>,
}

impl<T> ShortestPaths<T>
where
    T: Copy + Ord,
{
    /// Runs Floyd-Warshall over the graph, the matrices are laid out after `index`.
    pub(crate) fn compute(graph: &Graph<T>, index: BTreeMap<T, usize>) -> Self
    where
        T: std::hash::Hash + std::fmt::Debug,
    {
        let nodes: Vec<T> = index.keys().copied().collect();
        let n = nodes.len();
        debug!(nodes = n, "computing all-pairs shortest paths");

        let mut distance = DMatrix::from_element(n, n, f64::INFINITY);
        let mut predecessor = DMatrix::from_element(n, n, None);

        for i in 0..n {
            distance[(i, i)] = 0.0;
        }

        // Direct connections, an existing better entry is never overwritten.
        for (u, &i) in &index {
            for v in graph.neighbors(u) {
                let Some(&j) = index.get(&v) else {
                    continue;
                };
                if i == j {
                    continue;
                }

                let cost = graph.min_cost(*u, v);
                if cost < distance[(i, j)] {
                    distance[(i, j)] = cost;
                    predecessor[(i, j)] = Some(i);
                }
            }
        }

        for k in 0..n {
            for i in 0..n {
                let through_k = distance[(i, k)];
                if through_k.is_infinite() {
                    continue;
                }

                for j in 0..n {
                    let candidate = through_k + distance[(k, j)];
                    if candidate < distance[(i, j)] {
                        distance[(i, j)] = candidate;
                        predecessor[(i, j)] = predecessor[(k, j)];
                    }
                }
            }
        }

        Self {
            nodes,
            index,
            distance,
            predecessor,
        }
    }

    /// Returns the matrix index of a vertex.
    pub fn index_of(&self, node: &T) -> Option<usize> {
        self.index.get(node).copied()
    }

    /// Returns the cost of the cheapest path from `source` to `target`, infinity if there is none
    /// or either vertex is unknown.
    pub fn distance(&self, source: &T, target: &T) -> f64 {
        match (self.index_of(source), self.index_of(target)) {
            (Some(i), Some(j)) => self.distance[(i, j)],
            _ => f64::INFINITY,
        }
    }

    /// Returns the vertex preceding `target` on the cheapest path from `source`.
    pub fn predecessor(&self, source: &T, target: &T) -> Option<T> {
        let (i, j) = (self.index_of(source)?, self.index_of(target)?);

        self.predecessor[(i, j)].map(|p| self.nodes[p])
    }

    /// Reconstructs the cheapest path from `source` to `target`, both included.
    ///
    /// # Examples
    ///
    /// ```
    /// use carpstat::edge::Link;
    /// use carpstat::graph::Graph;
    ///
    /// let mut graph = Graph::new();
    /// graph.add_edge("a", "b", Link::new(1.0));
    /// graph.add_edge("b", "c", Link::new(1.0));
    /// graph.add_edge("a", "c", Link::new(5.0));
    ///
    /// let paths = graph.shortest_paths();
    ///
    /// assert_eq!(paths.path(&"a", &"c"), Some(vec!["a", "b", "c"]));
    /// assert_eq!(paths.path(&"a", &"a"), Some(vec!["a"]));
    /// assert_eq!(paths.path(&"a", &"d"), None);
    /// ```
    pub fn path(&self, source: &T, target: &T) -> Option<Vec<T>> {
        let (i, j) = (self.index_of(source)?, self.index_of(target)?);

        self.path_indices(i, j)
            .map(|path| path.into_iter().map(|p| self.nodes[p]).collect())
    }
}

impl<T> ShortestPaths<T> {
    /// Returns the vertices in the order used to index the matrices.
    pub fn nodes(&self) -> &[T] {
        &self.nodes
    }

    pub fn distance_matrix(&self) -> &DMatrix<f64> {
        &self.distance
    }

    pub fn predecessor_matrix(&self) -> &DMatrix<Option<usize>> {
        &self.predecessor
    }

    /// Returns the mean of the finite distances between distinct vertices, `0.0` if there are
    /// none.
    pub fn average_path_length(&self) -> f64 {
        let (total, count) = self
            .finite_distances()
            .fold((0.0, 0usize), |(total, count), d| (total + d, count + 1));

        if count == 0 {
            0.0
        } else {
            total / count as f64
        }
    }

    /// Returns the longest finite distance between distinct vertices, `0.0` if there is none.
    pub fn diameter(&self) -> f64 {
        self.finite_distances().fold(0.0, f64::max)
    }

    /// Walks the predecessor matrix back from `target`, returns the matrix indices of the path
    /// from `source` to `target`.
    pub(crate) fn path_indices(&self, source: usize, target: usize) -> Option<Vec<usize>> {
        let mut path = vec![target];
        let mut current = target;

        while current != source {
            current = self.predecessor[(source, current)]?;
            path.push(current);

            // A valid chain never revisits a vertex.
            if path.len() > self.nodes.len() {
                return None;
            }
        }

        path.reverse();
        Some(path)
    }

    fn finite_distances(&self) -> impl Iterator<Item = f64> + '_ {
        let n = self.nodes.len();

        (0..n)
            .cartesian_product(0..n)
            .filter(|(i, j)| i != j)
            .map(|(i, j)| self.distance[(i, j)])
            .filter(|d| d.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::edge::Link;

    #[test]
    fn empty_graph() {
        let mut graph: Graph<u32> = Graph::new();
        let paths = graph.shortest_paths();

        assert!(paths.nodes().is_empty());
        assert_eq!(paths.average_path_length(), 0.0);
        assert_eq!(paths.diameter(), 0.0);
    }

    #[test]
    fn path_through_intermediate() {
        let mut graph = graph!(edges: [(1, 2, 5.0)], arcs: [(2, 3, 3.0)]);
        let paths = graph.shortest_paths();

        assert_eq!(paths.nodes(), &[1, 2, 3]);
        assert_eq!(paths.distance(&1, &3), 8.0);
        assert_eq!(paths.path(&1, &3), Some(vec![1, 2, 3]));
        assert_eq!(paths.predecessor(&1, &3), Some(2));
        assert_eq!(paths.predecessor(&1, &2), Some(1));
    }

    #[test]
    fn arcs_are_one_way() {
        let mut graph = graph!(edges: [(1, 2, 5.0)], arcs: [(2, 3, 3.0)]);
        let paths = graph.shortest_paths();

        assert_eq!(paths.distance(&3, &1), f64::INFINITY);
        assert_eq!(paths.distance(&3, &2), f64::INFINITY);
        assert_eq!(paths.predecessor(&3, &1), None);
        assert_eq!(paths.path(&3, &1), None);
        assert_eq!(paths.distance(&2, &1), 5.0);
    }

    #[test]
    fn diagonal_is_zero_and_has_no_predecessor() {
        let mut graph = graph!(edges: [(1, 2, 1.0)], arcs: [(2, 2, 4.0)]);
        let paths = graph.shortest_paths();

        for node in [1, 2] {
            assert_eq!(paths.distance(&node, &node), 0.0);
            assert_eq!(paths.predecessor(&node, &node), None);
        }
    }

    #[test]
    fn cheapest_parallel_instance_is_used() {
        let mut graph = graph!(edges: [(1, 2, 9.0), (1, 2, 4.0)], arcs: [(2, 1, 2.0)]);
        let paths = graph.shortest_paths();

        assert_eq!(paths.distance(&1, &2), 4.0);
        assert_eq!(paths.distance(&2, &1), 2.0);
    }

    #[test]
    fn shortcut_beats_direct_connection() {
        let mut graph = graph!(edges: [(1, 3, 10.0), (1, 2, 2.0), (2, 3, 3.0)], arcs: []);
        let paths = graph.shortest_paths();

        assert_eq!(paths.distance(&1, &3), 5.0);
        assert_eq!(paths.path(&3, &1), Some(vec![3, 2, 1]));
    }

    #[test]
    fn unknown_nodes() {
        let mut graph = graph!(edges: [(1, 2, 1.0)], arcs: []);
        let paths = graph.shortest_paths();

        assert_eq!(paths.index_of(&7), None);
        assert_eq!(paths.distance(&1, &7), f64::INFINITY);
        assert_eq!(paths.predecessor(&7, &1), None);
        assert_eq!(paths.path(&1, &7), None);
    }

    #[test]
    fn aggregates() {
        let mut graph = graph!(edges: [(1, 2, 5.0)], arcs: [(2, 3, 3.0)]);
        let paths = graph.shortest_paths();

        assert_eq!(paths.diameter(), 8.0);
        assert_eq!(paths.average_path_length(), 21.0 / 4.0);
    }

    #[test]
    fn disconnected_aggregates() {
        let mut graph = Graph::new();
        graph.add_node(1);
        graph.add_node(2);
        let paths = graph.shortest_paths();

        assert_eq!(paths.diameter(), 0.0);
        assert_eq!(paths.average_path_length(), 0.0);
        assert_eq!(paths.distance_matrix()[(0, 1)], f64::INFINITY);
        assert_eq!(paths.predecessor_matrix()[(0, 1)], None);
    }

    fn arb_graph() -> impl Strategy<Value = Graph<u8>> {
        let link = (0u8..8, 0u8..8, 1u32..20, any::<bool>());

        prop::collection::vec(link, 0..24).prop_map(|links| {
            let mut graph = Graph::new();
            for node in 0..8 {
                graph.add_node(node);
            }
            for (u, v, cost, directed) in links {
                if directed {
                    graph.add_arc(u, v, Link::new(cost as f64));
                } else if u != v {
                    graph.add_edge(u, v, Link::new(cost as f64));
                }
            }
            graph
        })
    }

    proptest! {
        #[test]
        fn paths_are_consistent_with_distances(mut graph in arb_graph()) {
            let snapshot = graph.clone();
            let paths = graph.shortest_paths();

            for s in paths.nodes() {
                prop_assert_eq!(paths.distance(s, s), 0.0);

                for t in paths.nodes() {
                    let distance = paths.distance(s, t);

                    // Never worse than the direct connection.
                    if s != t {
                        prop_assert!(distance <= snapshot.min_cost(*s, *t));
                    }

                    match paths.path(s, t) {
                        Some(path) => {
                            prop_assert!(distance.is_finite());
                            prop_assert_eq!(path.first(), Some(s));
                            prop_assert_eq!(path.last(), Some(t));

                            let cost: f64 = path
                                .windows(2)
                                .map(|hop| snapshot.min_cost(hop[0], hop[1]))
                                .sum();
                            prop_assert_eq!(cost, distance);
                        }
                        None => prop_assert!(distance.is_infinite()),
                    }
                }
            }
        }

        #[test]
        fn distances_satisfy_triangle_inequality(mut graph in arb_graph()) {
            let paths = graph.shortest_paths();

            for i in paths.nodes() {
                for j in paths.nodes() {
                    for k in paths.nodes() {
                        let through = paths.distance(i, k) + paths.distance(k, j);
                        prop_assert!(paths.distance(i, j) <= through);
                    }
                }
            }
        }
    }
}
