//! A module for working with edges, arcs and the link instances stored on them.

use serde::{Deserialize, Serialize};

/// A pair of vertices representing an undirected graph edge.
///
/// The vertices are kept in sorted order, so `(a, b)` and `(b, a)` are the same key and both
/// traversal directions share one storage slot. `source` is therefore always the smaller vertex.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Edge<T> {
    source: T,
    target: T,
}

impl<T: Ord> Edge<T> {
    /// Creates a new edge from two vertices.
    ///
    /// # Examples
    ///
    /// ```
    /// use carpstat::edge::Edge;
    ///
    /// let edge = Edge::new(2, 1);
    /// assert_eq!(edge, Edge::new(1, 2));
    /// assert_eq!(edge.source(), &1);
    /// ```
    pub fn new(a: T, b: T) -> Self {
        if a <= b {
            Self {
                source: a,
                target: b,
            }
        } else {
            Self {
                source: b,
                target: a,
            }
        }
    }
}

impl<T> Edge<T> {
    /// Returns the smaller vertex of the edge.
    pub fn source(&self) -> &T {
        &self.source
    }

    /// Returns the larger vertex of the edge.
    pub fn target(&self) -> &T {
        &self.target
    }
}

/// A directed arc, traversable from `source` to `target` only.
///
/// Unlike [`Edge`], `(a, b)` and `(b, a)` are distinct arcs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Arc<T> {
    source: T,
    target: T,
}

impl<T> Arc<T> {
    /// Creates a new arc from `source` to `target`.
    ///
    /// # Examples
    ///
    /// ```
    /// use carpstat::edge::Arc;
    ///
    /// let arc = Arc::new("a", "b");
    /// assert_ne!(arc, Arc::new("b", "a"));
    /// ```
    pub fn new(source: T, target: T) -> Self {
        Self { source, target }
    }

    /// Returns the tail of the arc.
    pub fn source(&self) -> &T {
        &self.source
    }

    /// Returns the head of the arc.
    pub fn target(&self) -> &T {
        &self.target
    }
}

/// The service an element must receive when it is required.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    /// Units of demand to be collected.
    pub demand: u32,
    /// Cost of servicing the element.
    pub service_cost: u32,
}

/// A single traversable instance of an edge or an arc.
///
/// Parallel instances between the same endpoints are kept separately, each with its own
/// attributes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Link {
    cost: f64,
    service: Option<Service>,
}

impl Link {
    /// Creates an optional (non-required) link with the given traversal cost.
    pub fn new(cost: f64) -> Self {
        Self {
            cost,
            service: None,
        }
    }

    /// Creates a required link.
    ///
    /// # Examples
    ///
    /// ```
    /// use carpstat::edge::Link;
    ///
    /// let link = Link::required(4.0, 2, 7);
    ///
    /// assert!(link.is_required());
    /// assert_eq!(link.demand(), 2);
    /// assert_eq!(link.service_cost(), 7);
    /// assert!(!Link::new(4.0).is_required());
    /// ```
    pub fn required(cost: f64, demand: u32, service_cost: u32) -> Self {
        Self {
            cost,
            service: Some(Service {
                demand,
                service_cost,
            }),
        }
    }

    /// Returns the traversal cost.
    pub fn cost(&self) -> f64 {
        self.cost
    }

    /// Returns the service record, present only for required links.
    pub fn service(&self) -> Option<&Service> {
        self.service.as_ref()
    }

    pub fn is_required(&self) -> bool {
        self.service.is_some()
    }

    /// Returns the demand, `0` for optional links.
    pub fn demand(&self) -> u32 {
        self.service.map_or(0, |s| s.demand)
    }

    /// Returns the service cost, `0` for optional links.
    pub fn service_cost(&self) -> u32 {
        self.service.map_or(0, |s| s.service_cost)
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::hash_map::DefaultHasher,
        hash::{Hash, Hasher},
    };

    use super::*;

    #[test]
    fn new_edge_is_sorted() {
        let edge = Edge::new("b", "a");

        assert_eq!(
            edge,
            Edge {
                source: "a",
                target: "b"
            }
        );
        assert_eq!(edge.source(), &"a");
        assert_eq!(edge.target(), &"b");
    }

    #[test]
    fn edge_hash_is_direction_independent() {
        let mut h1 = DefaultHasher::new();
        let mut h2 = DefaultHasher::new();

        Edge::new(1, 2).hash(&mut h1);
        Edge::new(2, 1).hash(&mut h2);

        assert_eq!(h1.finish(), h2.finish());
    }

    #[test]
    fn arc_keeps_direction() {
        let arc = Arc::new(2, 1);

        assert_eq!(arc.source(), &2);
        assert_eq!(arc.target(), &1);
        assert_ne!(arc, Arc::new(1, 2));
    }

    #[test]
    fn optional_link_has_no_service() {
        let link = Link::new(3.0);

        assert_eq!(link.cost(), 3.0);
        assert!(link.service().is_none());
        assert_eq!(link.demand(), 0);
        assert_eq!(link.service_cost(), 0);
    }

    #[test]
    fn required_link_carries_service() {
        let link = Link::required(3.0, 5, 9);

        assert_eq!(
            link.service(),
            Some(&Service {
                demand: 5,
                service_cost: 9
            })
        );
    }
}
