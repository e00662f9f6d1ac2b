//! A module for working with mixed multigraphs.

use std::{
    collections::{BTreeMap, BTreeSet, HashMap, HashSet},
    fmt::Debug,
    hash::Hash,
};

use itertools::{Itertools, MinMaxResult};
use tracing::debug;

use crate::{
    betweenness::compute_betweenness,
    edge::{Arc, Edge, Link, Service},
    paths::ShortestPaths,
    stats::Statistics,
};

/// Instance-level information carried alongside the graph. It is not used by any of the
/// computations and is passed through to the statistics as is.
#[derive(Clone, Debug, PartialEq)]
pub struct Metadata<T> {
    pub name: String,
    /// The designated origin of the routes, always part of the vertex set once set.
    pub depot: Option<T>,
    /// Signed, some instance sets write `-1` when the fleet size is left open.
    pub vehicles: i64,
    pub capacity: u64,
    /// Reference objective value of the best known solution.
    pub optimal_value: f64,
}

impl<T> Default for Metadata<T> {
    fn default() -> Self {
        Self {
            name: String::new(),
            depot: None,
            vehicles: 0,
            capacity: 0,
            optimal_value: 0.0,
        }
    }
}

/// The neighbours of a single vertex, split by the kind of connection.
#[derive(Clone, Debug)]
struct Adjacency<T> {
    undirected: BTreeSet<T>,
    outgoing: BTreeSet<T>,
    incoming: BTreeSet<T>,
}

impl<T> Default for Adjacency<T> {
    fn default() -> Self {
        Self {
            undirected: BTreeSet::new(),
            outgoing: BTreeSet::new(),
            incoming: BTreeSet::new(),
        }
    }
}

/// A mixed multigraph, made up of undirected edges and directed arcs.
///
/// Any number of parallel [`Link`] instances can connect the same pair of vertices, each with
/// their own cost and service attributes.
#[derive(Clone, Debug)]
pub struct Graph<T> {
    /// The vertices in the graph, mapped to their service record when they are required.
    nodes: BTreeMap<T, Option<Service>>,
    /// The parallel instances of each undirected edge.
    edges: HashMap<Edge<T>, Vec<Link>>,
    /// The parallel instances of each directed arc.
    arcs: HashMap<Arc<T>, Vec<Link>>,
    /// Per-vertex neighbour sets, kept in sync with `edges` and `arcs` so that adjacency queries
    /// never have to scan every key.
    adjacency: HashMap<T, Adjacency<T>>,
    metadata: Metadata<T>,
    /// A mapping of vertices to their indices to be used when constructing the distance and
    /// predecessor matrices.
    ///
    /// The use of a `BTreeMap` keeps the enumeration sorted by `T`, which is what the matrices
    /// are indexed by.
    index: Option<BTreeMap<T, usize>>,
    /// Cache the all-pairs shortest paths when possible.
    shortest_paths: Option<ShortestPaths<T>>,
}

impl<T> Default for Graph<T>
where
    T: Copy + Eq + Hash + Ord + Debug,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Graph<T>
where
    T: Copy + Eq + Hash + Ord + Debug,
{
    /// Creates an empty graph.
    ///
    /// # Examples
    ///
    /// ```
    /// use carpstat::graph::Graph;
    ///
    /// let graph: Graph<u32> = Graph::new();
    /// assert_eq!(graph.node_count(), 0);
    /// ```
    pub fn new() -> Self {
        Self {
            nodes: BTreeMap::new(),
            edges: HashMap::new(),
            arcs: HashMap::new(),
            adjacency: HashMap::new(),
            metadata: Metadata::default(),
            index: None,
            shortest_paths: None,
        }
    }

    pub fn metadata(&self) -> &Metadata<T> {
        &self.metadata
    }

    /// Sets the instance metadata. The depot, if any, is inserted into the vertex set.
    pub fn set_metadata(&mut self, metadata: Metadata<T>) {
        if let Some(depot) = metadata.depot {
            self.add_node(depot);
        }

        self.metadata = metadata;
    }

    /// Inserts a vertex into the graph, returns `true` if it wasn't present.
    ///
    /// An existing vertex keeps its service record.
    pub fn add_node(&mut self, node: T) -> bool {
        if self.nodes.contains_key(&node) {
            return false;
        }

        self.nodes.insert(node, None);
        self.clear_cache();

        true
    }

    /// Inserts a required vertex, or marks an existing one as required.
    ///
    /// Calling this again for the same vertex overwrites the previously recorded demand and
    /// service cost.
    ///
    /// # Examples
    ///
    /// ```
    /// use carpstat::graph::Graph;
    ///
    /// let mut graph = Graph::new();
    /// graph.add_required_node(1, 3, 2);
    /// graph.add_required_node(1, 5, 4);
    ///
    /// assert_eq!(graph.service(&1).map(|s| s.demand), Some(5));
    /// assert_eq!(graph.required_node_count(), 1);
    /// ```
    pub fn add_required_node(&mut self, node: T, demand: u32, service_cost: u32) {
        self.add_node(node);
        self.nodes.insert(
            node,
            Some(Service {
                demand,
                service_cost,
            }),
        );
    }

    /// Appends a parallel instance to the undirected edge between `u` and `v`, inserting both
    /// vertices if needed.
    ///
    /// Instances are never merged, even if their attributes are identical.
    pub fn add_edge(&mut self, u: T, v: T, link: Link) {
        self.add_node(u);
        self.add_node(v);

        self.edges.entry(Edge::new(u, v)).or_default().push(link);
        self.adjacency.entry(u).or_default().undirected.insert(v);
        self.adjacency.entry(v).or_default().undirected.insert(u);

        self.clear_cache();
    }

    /// Appends a parallel instance to the arc from `u` to `v`, inserting both vertices if needed.
    pub fn add_arc(&mut self, u: T, v: T, link: Link) {
        self.add_node(u);
        self.add_node(v);

        self.arcs.entry(Arc::new(u, v)).or_default().push(link);
        self.adjacency.entry(u).or_default().outgoing.insert(v);
        self.adjacency.entry(v).or_default().incoming.insert(u);

        self.clear_cache();
    }

    /// Checks if the graph contains a vertex.
    pub fn contains_node(&self, node: &T) -> bool {
        self.nodes.contains_key(node)
    }

    /// Returns the vertices in sorted order.
    pub fn nodes(&self) -> impl Iterator<Item = &T> {
        self.nodes.keys()
    }

    /// Returns the service record of a required vertex.
    pub fn service(&self, node: &T) -> Option<&Service> {
        self.nodes.get(node).and_then(Option::as_ref)
    }

    pub fn is_required(&self, node: &T) -> bool {
        self.service(node).is_some()
    }

    /// Returns the parallel instances of the undirected edge between `u` and `v`.
    pub fn edge_links(&self, u: T, v: T) -> &[Link] {
        self.edges
            .get(&Edge::new(u, v))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Returns the parallel instances of the arc from `u` to `v`.
    pub fn arc_links(&self, u: T, v: T) -> &[Link] {
        self.arcs
            .get(&Arc::new(u, v))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Returns the vertex count of the graph.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the number of undirected edge instances, parallel instances included.
    pub fn edge_count(&self) -> usize {
        self.edges.values().map(Vec::len).sum()
    }

    /// Returns the number of arc instances, parallel instances included.
    pub fn arc_count(&self) -> usize {
        self.arcs.values().map(Vec::len).sum()
    }

    pub fn required_node_count(&self) -> usize {
        self.nodes.values().filter(|service| service.is_some()).count()
    }

    pub fn required_edge_count(&self) -> usize {
        self.edges
            .values()
            .flatten()
            .filter(|link| link.is_required())
            .count()
    }

    pub fn required_arc_count(&self) -> usize {
        self.arcs
            .values()
            .flatten()
            .filter(|link| link.is_required())
            .count()
    }

    /// Returns the vertices reachable in one step from `node`, through an undirected edge or an
    /// outgoing arc.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::collections::BTreeSet;
    ///
    /// use carpstat::edge::Link;
    /// use carpstat::graph::Graph;
    ///
    /// let mut graph = Graph::new();
    /// graph.add_edge(1, 2, Link::new(5.0));
    /// graph.add_arc(1, 3, Link::new(1.0));
    /// graph.add_arc(4, 1, Link::new(1.0));
    ///
    /// assert_eq!(graph.neighbors(&1), BTreeSet::from([2, 3]));
    /// ```
    pub fn neighbors(&self, node: &T) -> BTreeSet<T> {
        self.adjacent(node).copied().collect()
    }

    /// Returns the heads of the arcs leaving `node`.
    pub fn out_neighbors(&self, node: &T) -> BTreeSet<T> {
        self.adjacency
            .get(node)
            .map(|adjacency| adjacency.outgoing.clone())
            .unwrap_or_default()
    }

    /// Returns the tails of the arcs entering `node`.
    pub fn in_neighbors(&self, node: &T) -> BTreeSet<T> {
        self.adjacency
            .get(node)
            .map(|adjacency| adjacency.incoming.clone())
            .unwrap_or_default()
    }

    /// Returns the cheapest undirected edge instance between `u` and `v`, or infinity if there is
    /// none.
    pub fn min_edge_cost(&self, u: T, v: T) -> f64 {
        min_link_cost(self.edge_links(u, v))
    }

    /// Returns the cheapest arc instance from `u` to `v`, or infinity if there is none.
    pub fn min_arc_cost(&self, u: T, v: T) -> f64 {
        min_link_cost(self.arc_links(u, v))
    }

    /// Returns the cheapest way of going from `u` to `v` in one step.
    ///
    /// # Examples
    ///
    /// ```
    /// use carpstat::edge::Link;
    /// use carpstat::graph::Graph;
    ///
    /// let mut graph = Graph::new();
    /// graph.add_edge(1, 2, Link::new(5.0));
    /// graph.add_arc(1, 2, Link::new(3.0));
    ///
    /// assert_eq!(graph.min_cost(1, 2), 3.0);
    /// assert_eq!(graph.min_cost(2, 1), 5.0);
    /// assert_eq!(graph.min_cost(1, 3), f64::INFINITY);
    /// ```
    pub fn min_cost(&self, u: T, v: T) -> f64 {
        self.min_edge_cost(u, v).min(self.min_arc_cost(u, v))
    }

    /// Returns the number of link instances incident to `node`: undirected edges, outgoing arcs
    /// and incoming arcs.
    pub fn degree(&self, node: &T) -> usize {
        let undirected: usize = self
            .adjacency
            .get(node)
            .map(|adjacency| {
                adjacency
                    .undirected
                    .iter()
                    .map(|other| self.edge_links(*node, *other).len())
                    .sum()
            })
            .unwrap_or(0);

        undirected + self.out_degree(node) + self.in_degree(node)
    }

    /// Returns the number of arc instances leaving `node`.
    pub fn out_degree(&self, node: &T) -> usize {
        self.adjacency
            .get(node)
            .map(|adjacency| {
                adjacency
                    .outgoing
                    .iter()
                    .map(|head| self.arc_links(*node, *head).len())
                    .sum()
            })
            .unwrap_or(0)
    }

    /// Returns the number of arc instances entering `node`.
    pub fn in_degree(&self, node: &T) -> usize {
        self.adjacency
            .get(node)
            .map(|adjacency| {
                adjacency
                    .incoming
                    .iter()
                    .map(|tail| self.arc_links(*tail, *node).len())
                    .sum()
            })
            .unwrap_or(0)
    }

    /// Computes the density of the graph, the ratio of link instances with respect to the maximum
    /// number of arc and edge slots, `n(n - 1)` and `n(n - 1) / 2` respectively.
    ///
    /// Returns `0.0` for graphs with fewer than two vertices.
    ///
    /// # Examples
    ///
    /// ```
    /// use carpstat::edge::Link;
    /// use carpstat::graph::Graph;
    ///
    /// let mut graph = Graph::new();
    /// graph.add_edge("a", "b", Link::new(1.0));
    /// graph.add_arc("a", "b", Link::new(1.0));
    ///
    /// assert_eq!(graph.density(), 2.0 / 3.0);
    /// ```
    pub fn density(&self) -> f64 {
        let n = self.node_count();
        if n <= 1 {
            return 0.0;
        }

        let n = n as f64;
        let slots = n * (n - 1.0) + n * (n - 1.0) / 2.0;

        (self.edge_count() + self.arc_count()) as f64 / slots
    }

    /// Counts the connected components by depth-first search over [`Graph::neighbors`].
    ///
    /// Searches are started from each unvisited vertex in sorted order. Arcs are only followed
    /// forwards, so a vertex whose only connection is an outgoing arc into an already visited
    /// component starts a component of its own.
    pub fn connected_components(&self) -> usize {
        let mut visited: HashSet<T> = HashSet::with_capacity(self.node_count());
        let mut components = 0;

        for start in self.nodes.keys() {
            if !visited.insert(*start) {
                continue;
            }

            components += 1;
            let mut stack = vec![*start];

            while let Some(node) = stack.pop() {
                for neighbor in self.adjacent(&node) {
                    if visited.insert(*neighbor) {
                        stack.push(*neighbor);
                    }
                }
            }
        }

        components
    }

    /// Returns the all-pairs shortest paths of the graph, computing them if they aren't cached.
    pub fn shortest_paths(&mut self) -> &ShortestPaths<T> {
        let paths = match self.shortest_paths.take() {
            Some(paths) => paths,
            None => {
                let index = self.index().clone();
                ShortestPaths::compute(self, index)
            }
        };

        self.shortest_paths.insert(paths)
    }

    /// Returns a mapping of vertices to the number of reconstructed shortest paths passing
    /// through them. Every vertex is present, with `0` if no path goes through it.
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
    /// let betweenness = graph.betweenness_centrality();
    ///
    /// assert_eq!(betweenness[&2], 2);
    /// assert_eq!(betweenness[&1], 0);
    /// ```
    pub fn betweenness_centrality(&mut self) -> BTreeMap<T, u32> {
        let paths = self.shortest_paths();
        let counts = compute_betweenness(paths);

        paths.nodes().iter().copied().zip(counts).collect()
    }

    /// Computes every statistic of the graph in one pass over the shortest paths.
    ///
    /// # Examples
    ///
    /// ```
    /// use carpstat::edge::Link;
    /// use carpstat::graph::Graph;
    ///
    /// let mut graph = Graph::new();
    /// graph.add_edge(1, 2, Link::new(5.0));
    /// graph.add_arc(2, 3, Link::new(3.0));
    ///
    /// let statistics = graph.compute_statistics();
    ///
    /// assert_eq!(statistics.num_nodes, 3);
    /// assert_eq!(statistics.diameter, 8.0);
    /// assert_eq!(statistics.betweenness_centrality[&2], 1);
    /// ```
    pub fn compute_statistics(&mut self) -> Statistics<T> {
        let (min_degree, max_degree) = match self.nodes.keys().map(|n| self.degree(n)).minmax() {
            MinMaxResult::NoElements => (0, 0),
            MinMaxResult::OneElement(degree) => (degree, degree),
            MinMaxResult::MinMax(min, max) => (min, max),
        };
        let density = self.density();
        let connected_components = self.connected_components();

        let betweenness_centrality = self.betweenness_centrality();
        // Cached by the betweenness computation above.
        let paths = self.shortest_paths();
        let (average_path_length, diameter) = (paths.average_path_length(), paths.diameter());

        debug!(
            nodes = self.node_count(),
            components = connected_components,
            "computed graph statistics"
        );

        Statistics {
            num_nodes: self.node_count(),
            num_edges: self.edge_count(),
            num_arcs: self.arc_count(),
            num_required_nodes: self.required_node_count(),
            num_required_edges: self.required_edge_count(),
            num_required_arcs: self.required_arc_count(),
            density,
            connected_components,
            min_degree,
            max_degree,
            betweenness_centrality,
            average_path_length,
            diameter,
            name: self.metadata.name.clone(),
            depot: self.metadata.depot,
            vehicles: self.metadata.vehicles,
            capacity: self.metadata.capacity,
            optimal_value: self.metadata.optimal_value,
        }
    }

    //
    // Private
    //

    /// Clears the computed state.
    ///
    /// This should be called every time the graph is mutated since the cached state won't
    /// correspond to the new graph.
    fn clear_cache(&mut self) {
        self.index = None;
        self.shortest_paths = None;
    }

    /// Iterates over the undirected and outgoing neighbours of `node`, a vertex reachable both
    /// ways is yielded twice.
    fn adjacent<'a>(&'a self, node: &T) -> impl Iterator<Item = &'a T> + 'a {
        self.adjacency
            .get(node)
            .into_iter()
            .flat_map(|adjacency| adjacency.undirected.iter().chain(&adjacency.outgoing))
    }

    /// Returns the index of vertices, generating it if it isn't cached.
    fn index(&mut self) -> &BTreeMap<T, usize> {
        if self.index.is_none() {
            self.generate_index();
        }

        self.index.get_or_insert_with(BTreeMap::new)
    }

    /// Constructs and stores an index of vertices.
    ///
    /// The index will be sorted by `T`'s implementation of `Ord`.
    fn generate_index(&mut self) {
        let index: BTreeMap<T, usize> = self
            .nodes
            .keys()
            .enumerate()
            .map(|(i, &node)| (node, i))
            .collect();

        self.index = Some(index);
    }
}

//
// Helpers
//

fn min_link_cost(links: &[Link]) -> f64 {
    links.iter().map(Link::cost).fold(f64::INFINITY, f64::min)
}
