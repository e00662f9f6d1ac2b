//! A module for the statistics computed over a graph.

use std::collections::BTreeMap;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// The structural statistics of a graph, as computed by
/// [`Graph::compute_statistics`](crate::graph::Graph::compute_statistics).
///
/// Serialises to a flat record, every field is always present.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "T: Serialize",
    deserialize = "T: Deserialize<'de> + Ord"
))]
pub struct Statistics<T> {
    pub num_nodes: usize,
    /// Undirected edge instances, parallel instances included.
    pub num_edges: usize,
    /// Arc instances, parallel instances included.
    pub num_arcs: usize,
    pub num_required_nodes: usize,
    pub num_required_edges: usize,
    pub num_required_arcs: usize,
    pub density: f64,
    pub connected_components: usize,
    pub min_degree: usize,
    pub max_degree: usize,
    /// Number of reconstructed shortest paths passing through each vertex.
    pub betweenness_centrality: BTreeMap<T, u32>,
    pub average_path_length: f64,
    pub diameter: f64,
    pub name: String,
    pub depot: Option<T>,
    /// `-1` when the instance leaves the fleet size open.
    pub vehicles: i64,
    pub capacity: u64,
    pub optimal_value: f64,
}

impl<T: Copy + Ord> Statistics<T> {
    /// Returns the `n` vertices with the highest betweenness, highest first. Ties are broken by
    /// vertex order.
    ///
    /// # Examples
    ///
    /// ```
    /// use carpstat::edge::Link;
    /// use carpstat::graph::Graph;
    ///
    /// let mut graph = Graph::new();
    /// graph.add_edge(1, 2, Link::new(1.0));
    /// graph.add_edge(2, 3, Link::new(1.0));
    ///
    /// let statistics = graph.compute_statistics();
    ///
    /// assert_eq!(statistics.top_betweenness(2), vec![(2, 2), (1, 0)]);
    /// ```
    pub fn top_betweenness(&self, n: usize) -> Vec<(T, u32)> {
        self.betweenness_centrality
            .iter()
            .map(|(node, count)| (*node, *count))
            .sorted_by(|(a, x), (b, y)| y.cmp(x).then(a.cmp(b)))
            .take(n)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::edge::Link;

    #[test]
    fn top_betweenness_orders_by_count() {
        let mut graph = graph!(
            edges: [(1, 2, 1.0), (2, 3, 1.0), (3, 4, 1.0), (4, 5, 1.0)],
            arcs: []
        );
        graph.add_arc(6, 1, Link::new(1.0));

        let statistics = graph.compute_statistics();

        // The arc from 6 adds paths through the whole line, 1 picks up four of them.
        assert_eq!(statistics.betweenness_centrality[&1], 4);
        assert_eq!(statistics.top_betweenness(3), vec![(3, 10), (2, 9), (4, 7)]);
    }

    #[test]
    fn top_betweenness_breaks_ties_by_node() {
        let mut graph = graph!(edges: [(3, 2, 1.0), (2, 1, 1.0)], arcs: []);
        let statistics = graph.compute_statistics();

        assert_eq!(statistics.top_betweenness(5), vec![(2, 2), (1, 0), (3, 0)]);
    }

    #[test]
    fn serialises_flat_keys() {
        let mut graph = graph!(edges: [(1, 2, 5.0)], arcs: [(2, 3, 3.0)]);
        let statistics = graph.compute_statistics();

        let value = serde_json::to_value(&statistics).unwrap();
        let object = value.as_object().unwrap();

        for key in [
            "num_nodes",
            "num_edges",
            "num_arcs",
            "num_required_nodes",
            "num_required_edges",
            "num_required_arcs",
            "density",
            "connected_components",
            "min_degree",
            "max_degree",
            "betweenness_centrality",
            "average_path_length",
            "diameter",
            "name",
            "depot",
            "vehicles",
            "capacity",
            "optimal_value",
        ] {
            assert!(object.contains_key(key), "missing {key}");
        }

        assert_eq!(value["betweenness_centrality"]["2"], 1);
        assert!(value["depot"].is_null());
    }
}
