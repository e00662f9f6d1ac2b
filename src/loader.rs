//! A module for loading arc-routing instances from their text format.
//!
//! An instance starts with tab-separated header lines (`Name:`, `Optimal value:`, `#Vehicles:`,
//! `Capacity:` and `Depot Node:`) followed by five sections, each introduced by a marker line:
//!
//! ```text
//! ReN.   required nodes   N<id>    demand  service-cost
//! ReE.   required edges   <label>  from  to  cost  demand  service-cost
//! EDGE   optional edges   <label>  from  to  cost
//! ReA.   required arcs    <label>  from  to  cost  demand  service-cost
//! ARC    optional arcs    <label>  from  to  cost
//! ```
//!
//! Blank lines and lines starting with `#` are skipped inside sections.

use std::{ops::Range, path::Path, str::FromStr};

use itertools::Itertools;
use nom::Finish;
use tracing::{debug, info};

use crate::{
    edge::Link,
    graph::{Graph, Metadata},
    Error, Result,
};

/// The identifier type of the vertices of a loaded instance.
pub type NodeId = u32;

const NAME: &str = "Name:";
const OPTIMAL_VALUE: &str = "Optimal value:";
const VEHICLES: &str = "#Vehicles:";
const CAPACITY: &str = "Capacity:";
const DEPOT: &str = "Depot Node:";

/// The sections of an instance, in the order they must appear.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Section {
    RequiredNodes,
    RequiredEdges,
    Edges,
    RequiredArcs,
    Arcs,
}

impl Section {
    pub const ALL: [Section; 5] = [
        Section::RequiredNodes,
        Section::RequiredEdges,
        Section::Edges,
        Section::RequiredArcs,
        Section::Arcs,
    ];

    /// Returns the literal introducing the section.
    pub fn marker(self) -> &'static str {
        match self {
            Section::RequiredNodes => "ReN.",
            Section::RequiredEdges => "ReE.",
            Section::Edges => "EDGE",
            Section::RequiredArcs => "ReA.",
            Section::Arcs => "ARC",
        }
    }
}

/// The location of each section marker within the lines of an instance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sections {
    /// 0-based line of each marker, indexed by `Section as usize`.
    markers: [usize; 5],
    num_lines: usize,
}

impl Sections {
    /// Finds the five section markers, failing if any is missing or out of order.
    ///
    /// # Examples
    ///
    /// ```
    /// use carpstat::loader::{Section, Sections};
    ///
    /// let lines = ["ReN.", "N1\t1\t1", "ReE.", "EDGE", "ReA.", "ARC", "A1\t1\t2\t3"];
    /// let sections = Sections::locate(&lines).unwrap();
    ///
    /// assert_eq!(sections.rows(Section::RequiredNodes), 1..2);
    /// assert_eq!(sections.rows(Section::Edges), 4..4);
    /// assert_eq!(sections.rows(Section::Arcs), 6..7);
    ///
    /// assert!(Sections::locate(&lines[..5]).is_err());
    /// ```
    pub fn locate(lines: &[&str]) -> Result<Self> {
        let mut found: [Option<usize>; 5] = [None; 5];

        for (number, line) in lines.iter().enumerate() {
            if let Some(section) = Section::ALL
                .into_iter()
                .find(|section| line.starts_with(section.marker()))
            {
                found[section as usize] = Some(number);
            }
        }

        let mut markers = [0; 5];
        for section in Section::ALL {
            markers[section as usize] = found[section as usize].ok_or(Error::MissingSection {
                marker: section.marker(),
            })?;
        }

        for (previous, section) in Section::ALL.into_iter().tuple_windows() {
            if markers[section as usize] < markers[previous as usize] {
                return Err(Error::SectionOrder {
                    marker: section.marker(),
                    line: markers[section as usize] + 1,
                });
            }
        }

        Ok(Self {
            markers,
            num_lines: lines.len(),
        })
    }

    /// Returns the 0-based lines holding the rows of `section`, from the line after its marker
    /// up to the next marker. The last section runs to the end of the input.
    pub fn rows(&self, section: Section) -> Range<usize> {
        let start = self.markers[section as usize] + 1;
        let end = Section::ALL
            .get(section as usize + 1)
            .map_or(self.num_lines, |next| self.markers[*next as usize]);

        start..end
    }
}

/// Reads and parses the instance at `path`.
pub fn load_instance<P: AsRef<Path>>(path: P) -> Result<Graph<NodeId>> {
    let data = std::fs::read_to_string(path)?;

    parse_instance(&data)
}

/// Parses an instance from its text.
///
/// # Examples
///
/// ```
/// use carpstat::loader::parse_instance;
///
/// let text = "Name:\ttiny\nDepot Node:\t1\n\
///             ReN.\nN2\t1\t1\n\
///             ReE.\nE1\t1\t2\t5\t1\t1\n\
///             EDGE\n\
///             ReA.\n\
///             ARC\nNrA1\t2\t3\t4\n";
/// let graph = parse_instance(text).unwrap();
///
/// assert_eq!(graph.metadata().name, "tiny");
/// assert_eq!(graph.node_count(), 3);
/// assert_eq!(graph.required_edge_count(), 1);
/// assert_eq!(graph.min_arc_cost(2, 3), 4.0);
/// ```
pub fn parse_instance(input: &str) -> Result<Graph<NodeId>> {
    let lines: Vec<&str> = input.lines().collect();

    let metadata = parse_header(&lines)?;
    let sections = Sections::locate(&lines)?;
    debug!(?sections, "located instance sections");

    let mut graph = Graph::new();

    for section in Section::ALL {
        for number in sections.rows(section) {
            let row = lines[number].trim();
            if row.is_empty() || row.starts_with('#') {
                continue;
            }

            let malformed = |e| Error::Row {
                line: number + 1,
                section: section.marker(),
                message: nom::error::convert_error(row, e),
            };

            match section {
                Section::RequiredNodes => {
                    let (_, (node, demand, service_cost)) =
                        parsers::required_node(row).finish().map_err(malformed)?;
                    graph.add_required_node(node, demand, service_cost);
                }
                Section::RequiredEdges => {
                    let (_, (u, v, cost, demand, service_cost)) =
                        parsers::required_link(row).finish().map_err(malformed)?;
                    graph.add_edge(u, v, Link::required(cost.into(), demand, service_cost));
                }
                Section::Edges => {
                    let (_, (u, v, cost)) =
                        parsers::optional_link(row).finish().map_err(malformed)?;
                    graph.add_edge(u, v, Link::new(cost.into()));
                }
                Section::RequiredArcs => {
                    let (_, (u, v, cost, demand, service_cost)) =
                        parsers::required_link(row).finish().map_err(malformed)?;
                    graph.add_arc(u, v, Link::required(cost.into(), demand, service_cost));
                }
                Section::Arcs => {
                    let (_, (u, v, cost)) =
                        parsers::optional_link(row).finish().map_err(malformed)?;
                    graph.add_arc(u, v, Link::new(cost.into()));
                }
            }
        }
    }

    graph.set_metadata(metadata);

    info!(
        name = %graph.metadata().name,
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        arcs = graph.arc_count(),
        "loaded instance"
    );

    Ok(graph)
}

/// Reads the header lines preceding the first section. Missing keys keep their defaults.
fn parse_header(lines: &[&str]) -> Result<Metadata<NodeId>> {
    let mut metadata = Metadata::default();

    for line in lines.iter().map(|line| line.trim()) {
        if line.starts_with(Section::RequiredNodes.marker()) {
            break;
        }

        if let Some(value) = header_value(line, NAME) {
            metadata.name = value.to_owned();
        } else if let Some(value) = header_value(line, OPTIMAL_VALUE) {
            metadata.optimal_value = parse_header_value(OPTIMAL_VALUE, value)?;
            if !metadata.optimal_value.is_finite() {
                return Err(Error::Header {
                    key: OPTIMAL_VALUE,
                    value: value.to_owned(),
                });
            }
        } else if let Some(value) = header_value(line, VEHICLES) {
            metadata.vehicles = parse_header_value(VEHICLES, value)?;
        } else if let Some(value) = header_value(line, CAPACITY) {
            metadata.capacity = parse_header_value(CAPACITY, value)?;
        } else if let Some(value) = header_value(line, DEPOT) {
            metadata.depot = Some(parse_header_value(DEPOT, value)?);
        }
    }

    Ok(metadata)
}

/// Returns the first non-empty tab-separated field following `key`.
fn header_value<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(key)?;

    Some(
        rest.split('\t')
            .map(str::trim)
            .find(|field| !field.is_empty())
            .unwrap_or_default(),
    )
}

fn parse_header_value<V: FromStr>(key: &'static str, value: &str) -> Result<V> {
    value.parse().map_err(|_| Error::Header {
        key,
        value: value.to_owned(),
    })
}

mod parsers {
    use std::str::FromStr;

    use nom::{
        branch::alt,
        bytes::complete::take_till1,
        character::complete::{anychar, digit1, space1},
        combinator::{eof, map_res, peek},
        error::VerboseError,
        sequence::{preceded, terminated, tuple},
        IResult,
    };

    use super::NodeId;

    type Res<'a, O> = IResult<&'a str, O, VerboseError<&'a str>>;

    /// An unsigned integer, which must end at whitespace or at the end of the row.
    fn uint(input: &str) -> Res<'_, u32> {
        terminated(map_res(digit1, u32::from_str), peek(alt((space1, eof))))(input)
    }

    /// A separated field.
    fn field(input: &str) -> Res<'_, u32> {
        preceded(space1, uint)(input)
    }

    /// The leading label of a link row, e.g. `E12` or `NrA3`.
    fn label(input: &str) -> Res<'_, &str> {
        take_till1(char::is_whitespace)(input)
    }

    /// `N<id> demand service-cost`, the prefix letter of the id is dropped.
    pub fn required_node(input: &str) -> Res<'_, (NodeId, u32, u32)> {
        tuple((preceded(anychar, uint), field, field))(input)
    }

    /// `<label> from to cost demand service-cost`
    pub fn required_link(input: &str) -> Res<'_, (NodeId, NodeId, u32, u32, u32)> {
        preceded(label, tuple((field, field, field, field, field)))(input)
    }

    /// `<label> from to cost`
    pub fn optional_link(input: &str) -> Res<'_, (NodeId, NodeId, u32)> {
        preceded(label, tuple((field, field, field)))(input)
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn required_node_strips_prefix() {
            assert_eq!(required_node("N12\t3\t4"), Ok(("", (12, 3, 4))));
        }

        #[test]
        fn extra_fields_are_left_over() {
            assert_eq!(
                optional_link("NrE1\t1\t2\t3\t0\t0"),
                Ok(("\t0\t0", (1, 2, 3)))
            );
        }

        #[test]
        fn rejects_trailing_garbage_in_number() {
            assert!(required_node("N1x\t3\t4").is_err());
            assert!(optional_link("E1\t1\t2\t3.5").is_err());
        }

        #[test]
        fn rejects_missing_fields() {
            assert!(required_link("E1\t1\t2\t3").is_err());
            assert!(required_node("N1\t3").is_err());
        }

        #[test]
        fn rejects_negative_values() {
            assert!(optional_link("E1\t1\t2\t-3").is_err());
        }
    }
}
