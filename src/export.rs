//! A module for exporting computed results to JSON snapshots and rendering them as a report.

use std::{
    collections::BTreeMap,
    fmt,
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

use comfy_table::{presets, Cell, Color, ContentArrangement, Table};
use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize, Serializer};

use crate::{paths::ShortestPaths, stats::Statistics, Error, Result};

/// The marker written in place of an infinite distance.
pub const INFINITY_MARKER: &str = "inf";

/// Number of vertices listed in the betweenness section of a report.
const TOP_BETWEENNESS: usize = 10;
/// Number of vertices in each dimension of the distance sample of a report.
const DISTANCE_SAMPLE: usize = 5;

/// Writes the statistics as pretty-printed JSON.
///
/// Fails with [`Error::NonFinite`] if a float field is infinite or NaN, JSON has no encoding for
/// either.
pub fn write_statistics<T, W>(statistics: &Statistics<T>, writer: W) -> Result<()>
where
    T: Serialize,
    W: Write,
{
    let floats = [
        ("density", statistics.density),
        ("average_path_length", statistics.average_path_length),
        ("diameter", statistics.diameter),
        ("optimal_value", statistics.optimal_value),
    ];
    if let Some(&(field, value)) = floats.iter().find(|(_, value)| !value.is_finite()) {
        return Err(Error::NonFinite { field, value });
    }

    serde_json::to_writer_pretty(writer, statistics)?;

    Ok(())
}

/// Reads statistics previously written by [`write_statistics`].
pub fn read_statistics<T, R>(reader: R) -> Result<Statistics<T>>
where
    T: DeserializeOwned + Ord,
    R: Read,
{
    Ok(serde_json::from_reader(reader)?)
}

pub fn save_statistics<T: Serialize, P: AsRef<Path>>(
    statistics: &Statistics<T>,
    path: P,
) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_statistics(statistics, &mut writer)?;
    writer.flush()?;

    Ok(())
}

pub fn load_statistics<T, P>(path: P) -> Result<Statistics<T>>
where
    T: DeserializeOwned + Ord,
    P: AsRef<Path>,
{
    read_statistics(BufReader::new(File::open(path)?))
}

/// A single entry of the distance table.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Distance {
    Finite(f64),
    /// No path exists, written as [`INFINITY_MARKER`].
    Unbounded,
}

impl From<f64> for Distance {
    fn from(value: f64) -> Self {
        if value.is_infinite() {
            Distance::Unbounded
        } else {
            Distance::Finite(value)
        }
    }
}

impl fmt::Display for Distance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Distance::Finite(value) => write!(f, "{value}"),
            Distance::Unbounded => f.write_str(INFINITY_MARKER),
        }
    }
}

impl Serialize for Distance {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Distance::Finite(value) => serializer.serialize_f64(*value),
            Distance::Unbounded => serializer.serialize_str(INFINITY_MARKER),
        }
    }
}

impl<'de> Deserialize<'de> for Distance {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f64),
            Marker(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(value) => Ok(Distance::Finite(value)),
            Raw::Marker(marker) if marker == INFINITY_MARKER => Ok(Distance::Unbounded),
            Raw::Marker(marker) => Err(serde::de::Error::custom(format!(
                "unknown distance marker `{marker}`"
            ))),
        }
    }
}

/// The pairwise distances and predecessors of a graph, keyed by vertex.
///
/// `distances[u][v]` is the cost of the cheapest path from `u` to `v` and `predecessors[u][v]`
/// the vertex preceding `v` on that path, `None` on the diagonal and for unreachable pairs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "T: Serialize",
    deserialize = "T: Deserialize<'de> + Ord"
))]
pub struct PathTable<T> {
    pub distances: BTreeMap<T, BTreeMap<T, Distance>>,
    pub predecessors: BTreeMap<T, BTreeMap<T, Option<T>>>,
}

impl<T: Copy + Ord> PathTable<T> {
    /// Builds the table from computed shortest paths.
    ///
    /// # Examples
    ///
    /// ```
    /// use carpstat::edge::Link;
    /// use carpstat::export::{Distance, PathTable};
    /// use carpstat::graph::Graph;
    ///
    /// let mut graph = Graph::new();
    /// graph.add_arc(1, 2, Link::new(3.0));
    ///
    /// let table = PathTable::from_paths(graph.shortest_paths());
    ///
    /// assert_eq!(table.distances[&1][&2], Distance::Finite(3.0));
    /// assert_eq!(table.distances[&2][&1], Distance::Unbounded);
    /// assert_eq!(table.predecessors[&1][&2], Some(1));
    /// assert_eq!(table.predecessors[&1][&1], None);
    /// ```
    pub fn from_paths(paths: &ShortestPaths<T>) -> Self {
        let mut distances = BTreeMap::new();
        let mut predecessors = BTreeMap::new();

        for source in paths.nodes() {
            let mut row_distances = BTreeMap::new();
            let mut row_predecessors = BTreeMap::new();

            for target in paths.nodes() {
                row_distances.insert(*target, Distance::from(paths.distance(source, target)));
                row_predecessors.insert(*target, paths.predecessor(source, target));
            }

            distances.insert(*source, row_distances);
            predecessors.insert(*source, row_predecessors);
        }

        Self {
            distances,
            predecessors,
        }
    }
}

pub fn write_paths<T: Serialize, W: Write>(table: &PathTable<T>, writer: W) -> Result<()> {
    serde_json::to_writer_pretty(writer, table)?;

    Ok(())
}

pub fn read_paths<T, R>(reader: R) -> Result<PathTable<T>>
where
    T: DeserializeOwned + Ord,
    R: Read,
{
    Ok(serde_json::from_reader(reader)?)
}

pub fn save_paths<T: Serialize, P: AsRef<Path>>(table: &PathTable<T>, path: P) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_paths(table, &mut writer)?;
    writer.flush()?;

    Ok(())
}

pub fn load_paths<T, P>(path: P) -> Result<PathTable<T>>
where
    T: DeserializeOwned + Ord,
    P: AsRef<Path>,
{
    read_paths(BufReader::new(File::open(path)?))
}

/// A console summary of the statistics and, optionally, a sample of the distance table.
pub struct Report<'a, T> {
    statistics: &'a Statistics<T>,
    paths: Option<&'a PathTable<T>>,
}

impl<'a, T> Report<'a, T>
where
    T: Copy + Ord + fmt::Display,
{
    pub fn new(statistics: &'a Statistics<T>) -> Self {
        Self {
            statistics,
            paths: None,
        }
    }

    /// Includes a sample of the distance table in the report.
    pub fn with_paths(mut self, paths: &'a PathTable<T>) -> Self {
        self.paths = Some(paths);
        self
    }

    fn information(&self) -> Table {
        let s = self.statistics;
        let depot = s
            .depot
            .map_or_else(|| "N/A".to_owned(), |depot| depot.to_string());

        key_value_table(&[
            ("Name", s.name.clone()),
            ("Optimal value", s.optimal_value.to_string()),
            ("Vehicles", s.vehicles.to_string()),
            ("Capacity", s.capacity.to_string()),
            ("Depot", depot),
        ])
    }

    fn statistics(&self) -> Table {
        let s = self.statistics;

        key_value_table(&[
            ("Nodes", s.num_nodes.to_string()),
            ("Edges", s.num_edges.to_string()),
            ("Arcs", s.num_arcs.to_string()),
            ("Required nodes", s.num_required_nodes.to_string()),
            ("Required edges", s.num_required_edges.to_string()),
            ("Required arcs", s.num_required_arcs.to_string()),
            ("Density", format!("{:.4}", s.density)),
            ("Connected components", s.connected_components.to_string()),
            ("Minimum degree", s.min_degree.to_string()),
            ("Maximum degree", s.max_degree.to_string()),
            ("Average path length", format!("{:.4}", s.average_path_length)),
            ("Diameter", s.diameter.to_string()),
        ])
    }

    fn betweenness(&self) -> Table {
        let mut table = create_table();
        add_header(&mut table, &["Rank", "Node", "Betweenness"]);

        for (rank, (node, count)) in self
            .statistics
            .top_betweenness(TOP_BETWEENNESS)
            .into_iter()
            .enumerate()
        {
            table.add_row(vec![
                Cell::new(rank + 1),
                Cell::new(node),
                Cell::new(count),
            ]);
        }

        table
    }

    fn distance_sample(paths: &PathTable<T>) -> Table {
        let nodes: Vec<T> = paths
            .distances
            .keys()
            .copied()
            .take(DISTANCE_SAMPLE)
            .collect();

        let mut table = create_table();
        let header: Vec<String> = std::iter::once("From/To".to_owned())
            .chain(nodes.iter().map(ToString::to_string))
            .collect();
        table.set_header(
            header
                .iter()
                .map(|h| Cell::new(h).fg(Color::Cyan))
                .collect::<Vec<_>>(),
        );

        for source in &nodes {
            let mut row = vec![Cell::new(source).fg(Color::Green)];
            for target in &nodes {
                let distance = paths
                    .distances
                    .get(source)
                    .and_then(|row| row.get(target))
                    .copied()
                    .unwrap_or(Distance::Unbounded);
                row.push(Cell::new(distance));
            }
            table.add_row(row);
        }

        table
    }
}

impl<T> fmt::Display for Report<'_, T>
where
    T: Copy + Ord + fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_section(f, "BASIC GRAPH INFORMATION", &self.information())?;
        write_section(f, "GRAPH STATISTICS", &self.statistics())?;
        write_section(
            f,
            &format!("BETWEENNESS CENTRALITY (TOP {TOP_BETWEENNESS})"),
            &self.betweenness(),
        )?;

        if let Some(paths) = self.paths {
            write_section(f, "DISTANCE MATRIX SAMPLE", &Self::distance_sample(paths))?;
        }

        Ok(())
    }
}

//
// Helpers
//

fn write_section(f: &mut fmt::Formatter<'_>, title: &str, table: &Table) -> fmt::Result {
    let rule = "=".repeat(50);

    writeln!(f, "\n{rule}\n{title}\n{rule}\n")?;
    writeln!(f, "{table}")
}

/// Create a styled table with consistent formatting.
fn create_table() -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table
}

fn add_header(table: &mut Table, headers: &[&str]) {
    table.set_header(
        headers
            .iter()
            .map(|h| Cell::new(h).fg(Color::Cyan))
            .collect::<Vec<_>>(),
    );
}

fn key_value_table(items: &[(&str, String)]) -> Table {
    let mut table = create_table();
    add_header(&mut table, &["Property", "Value"]);

    for (key, value) in items {
        table.add_row(vec![Cell::new(key).fg(Color::Green), Cell::new(value)]);
    }

    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_instance;

    const SAMPLE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/testdata/sample.dat");

    #[test]
    fn statistics_round_trip() {
        let mut graph = load_instance(SAMPLE).unwrap();
        let statistics = graph.compute_statistics();

        let mut buffer = Vec::new();
        write_statistics(&statistics, &mut buffer).unwrap();
        let reloaded: Statistics<u32> = read_statistics(buffer.as_slice()).unwrap();

        assert_eq!(reloaded, statistics);
        assert_eq!(reloaded.density.to_bits(), statistics.density.to_bits());
        assert_eq!(
            reloaded.average_path_length.to_bits(),
            statistics.average_path_length.to_bits()
        );
    }

    #[test]
    fn statistics_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph_statistics.json");

        let mut graph = graph!(edges: [(1u32, 2, 5.0)], arcs: [(2, 3, 3.0)]);
        let statistics = graph.compute_statistics();

        save_statistics(&statistics, &path).unwrap();
        let reloaded: Statistics<u32> = load_statistics(&path).unwrap();

        assert_eq!(reloaded, statistics);
    }

    #[test]
    fn non_finite_statistics_are_rejected() {
        let mut graph = graph!(edges: [(1u32, 2, 5.0)], arcs: []);
        let mut statistics = graph.compute_statistics();
        statistics.optimal_value = f64::INFINITY;

        let mut buffer = Vec::new();
        let result = write_statistics(&statistics, &mut buffer);

        assert!(matches!(
            result,
            Err(Error::NonFinite {
                field: "optimal_value",
                ..
            })
        ));
        assert!(buffer.is_empty());

        statistics.optimal_value = 42.0;
        write_statistics(&statistics, &mut buffer).unwrap();
        let reloaded: Statistics<u32> = read_statistics(buffer.as_slice()).unwrap();
        assert_eq!(reloaded, statistics);
    }

    #[test]
    fn missing_snapshot_is_io_error() {
        let dir = tempfile::tempdir().unwrap();

        let result: Result<Statistics<u32>> = load_statistics(dir.path().join("missing.json"));

        assert!(matches!(result, Err(crate::Error::Io(_))));
    }

    #[test]
    fn path_table_markers() {
        let mut graph = graph!(edges: [(1u32, 2, 5.0)], arcs: [(2, 3, 3.0)]);
        let table = PathTable::from_paths(graph.shortest_paths());

        let value = serde_json::to_value(&table).unwrap();

        assert_eq!(value["distances"]["1"]["3"], 8.0);
        assert_eq!(value["distances"]["3"]["1"], INFINITY_MARKER);
        assert_eq!(value["predecessors"]["1"]["3"], 2);
        assert!(value["predecessors"]["3"]["1"].is_null());
        assert!(value["predecessors"]["1"]["1"].is_null());
    }

    #[test]
    fn path_table_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shortest_paths.json");

        let mut graph = load_instance(SAMPLE).unwrap();
        let table = PathTable::from_paths(graph.shortest_paths());

        save_paths(&table, &path).unwrap();
        let reloaded: PathTable<u32> = load_paths(&path).unwrap();

        assert_eq!(reloaded, table);
        assert_eq!(reloaded.distances[&3][&1], Distance::Unbounded);
    }

    #[test]
    fn unknown_distance_marker() {
        let json = r#"{"distances": {"1": {"1": "nan"}}, "predecessors": {}}"#;

        let result: Result<PathTable<u32>> = read_paths(json.as_bytes());

        assert!(matches!(result, Err(crate::Error::Json(_))));
    }

    #[test]
    fn report_sections() {
        let mut graph = load_instance(SAMPLE).unwrap();
        let statistics = graph.compute_statistics();
        let table = PathTable::from_paths(graph.shortest_paths());

        let report = Report::new(&statistics).to_string();
        assert!(report.contains("BASIC GRAPH INFORMATION"));
        assert!(report.contains("sample"));
        assert!(report.contains("0.2222"));
        assert!(!report.contains("DISTANCE MATRIX SAMPLE"));

        let report = Report::new(&statistics).with_paths(&table).to_string();
        assert!(report.contains("DISTANCE MATRIX SAMPLE"));
        assert!(report.contains(INFINITY_MARKER));
    }
}
