//! Carpstat is a small toolkit for analysing capacitated arc-routing instances, mixed multigraphs
//! made of undirected edges and directed arcs with any number of parallel connections.
//!
//! # Basic usage
//!
//! The library is centered around the [`Graph`](graph::Graph) structure which can be built by
//! hand or loaded from an instance file with the [`loader`]. Once constructed, shortest paths and
//! a battery of structural statistics can be computed.
//!
//! ```rust
//! use carpstat::edge::Link;
//! use carpstat::graph::Graph;
//!
//! // Construct the graph instance.
//! let mut graph = Graph::new();
//!
//! // Insert an undirected edge, a required arc and a parallel instance of that arc.
//! graph.add_edge(1, 2, Link::new(5.0));
//! graph.add_arc(2, 3, Link::required(3.0, 1, 3));
//! graph.add_arc(2, 3, Link::new(4.0));
//!
//! // Vertex 3 can only be reached through vertex 2.
//! let paths = graph.shortest_paths();
//! assert_eq!(paths.distance(&1, &3), 8.0);
//! assert_eq!(paths.path(&1, &3), Some(vec![1, 2, 3]));
//!
//! // Compute all the statistics at once.
//! let statistics = graph.compute_statistics();
//! assert_eq!(statistics.num_arcs, 2);
//! assert_eq!(statistics.num_required_arcs, 1);
//! assert_eq!(statistics.betweenness_centrality[&2], 1);
//! ```

/// Builds a graph from lists of `(u, v, cost)` edges and arcs with optional links.
#[cfg(test)]
macro_rules! graph {
    (edges: [$(($u:expr, $v:expr, $cost:expr)),* $(,)?], arcs: [$(($a:expr, $b:expr, $c:expr)),* $(,)?]) => {{
        let mut graph = $crate::graph::Graph::new();

        $(
            graph.add_edge($u, $v, $crate::edge::Link::new($cost));
        )*
        $(
            graph.add_arc($a, $b, $crate::edge::Link::new($c));
        )*

        graph
    }};
}

mod betweenness;
pub mod edge;
pub mod error;
pub mod export;
pub mod graph;
pub mod loader;
pub mod paths;
pub mod stats;

pub use error::{Error, Result};
