//! Static board topology.
//!
//! The board is described by configuration only: each cell lists the lines
//! passing through it. Everything else (the cells of a line, which cells are
//! one slide apart) is derived once when the topology is built and never
//! changes afterwards.
//!
//! Cells on a line keep the order in which the configuration lists them,
//! so the configuration must list the cells of every line in board order.
//! Cell names carry no meaning.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

/// Cells per line.
pub const CELLS_PER_LINE: usize = 3;

/// Standard 24-point configuration, `cell -> [line, ...]`.
const STANDARD_BOARD: &str = include_str!("board.json");

static STANDARD: OnceLock<Topology> = OnceLock::new();

/// Errors found while building a topology from configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TopologyError {
    #[error("can't parse topology configuration: {0}")]
    Parse(String),
    #[error("topology has no cells")]
    Empty,
    #[error("cell identifier is empty")]
    EmptyCell,
    #[error("cell {0} is listed more than once")]
    DuplicateCell(String),
    #[error("cell {cell} has an empty line identifier")]
    EmptyLine { cell: String },
    #[error("cell {cell} lists line {line} more than once")]
    DuplicateLine { cell: String, line: String },
    #[error("line {line} has {count} cells, expected {}", CELLS_PER_LINE)]
    LineSize { line: String, count: usize },
}

/// Immutable cell/line membership plus the derived adjacency table.
#[derive(Debug, Clone)]
pub struct Topology {
    cell_lines: BTreeMap<String, Vec<String>>,
    line_cells: BTreeMap<String, Vec<String>>,
    neighbours: BTreeMap<String, BTreeSet<String>>,
}

impl Topology {
    /// The process-wide standard board.
    pub fn standard() -> &'static Topology {
        STANDARD.get_or_init(|| {
            Self::from_json(STANDARD_BOARD).expect("embedded board topology is valid")
        })
    }

    /// Build a topology from a JSON object mapping cells to their lines.
    /// Key order is kept.
    pub fn from_json(config: &str) -> Result<Self, TopologyError> {
        let parse_error = |e: serde_json::Error| TopologyError::Parse(e.to_string());
        let object: serde_json::Map<String, serde_json::Value> =
            serde_json::from_str(config).map_err(parse_error)?;

        let cell_lines = object
            .into_iter()
            .map(|(cell, lines)| {
                let lines: Vec<String> = serde_json::from_value(lines).map_err(parse_error)?;
                Ok((cell, lines))
            })
            .collect::<Result<Vec<_>, TopologyError>>()?;

        Self::from_cell_lines(cell_lines)
    }

    /// Build a topology from ordered `(cell, lines)` pairs.
    pub fn from_cell_lines(
        entries: impl IntoIterator<Item = (String, Vec<String>)>,
    ) -> Result<Self, TopologyError> {
        let mut cell_lines: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut line_cells: BTreeMap<String, Vec<String>> = BTreeMap::new();

        for (cell, lines) in entries {
            if cell.is_empty() {
                return Err(TopologyError::EmptyCell);
            }
            if cell_lines.contains_key(&cell) {
                return Err(TopologyError::DuplicateCell(cell));
            }
            let mut seen = BTreeSet::new();
            for line in &lines {
                if line.is_empty() {
                    return Err(TopologyError::EmptyLine { cell: cell.clone() });
                }
                if !seen.insert(line.as_str()) {
                    return Err(TopologyError::DuplicateLine {
                        cell: cell.clone(),
                        line: line.clone(),
                    });
                }
                line_cells
                    .entry(line.clone())
                    .or_default()
                    .push(cell.clone());
            }
            cell_lines.insert(cell, lines);
        }

        if cell_lines.is_empty() {
            return Err(TopologyError::Empty);
        }

        for (line, cells) in &line_cells {
            if cells.len() != CELLS_PER_LINE {
                return Err(TopologyError::LineSize {
                    line: line.clone(),
                    count: cells.len(),
                });
            }
        }

        let mut topology = Self {
            cell_lines,
            line_cells,
            neighbours: BTreeMap::new(),
        };
        topology.neighbours = topology.derive_neighbours();
        Ok(topology)
    }

    /// Precompute the one-step slide table.
    ///
    /// Two cells are neighbours when their line sets differ in exactly two
    /// lines (they share one) and they sit next to each other on the shared
    /// line. The second test rules out the two ends of a line.
    fn derive_neighbours(&self) -> BTreeMap<String, BTreeSet<String>> {
        let mut neighbours: BTreeMap<String, BTreeSet<String>> = self
            .cell_lines
            .keys()
            .map(|cell| (cell.clone(), BTreeSet::new()))
            .collect();

        for (line, cells) in &self.line_cells {
            for pair in cells.windows(2) {
                let (a, b) = (&pair[0], &pair[1]);
                if self.differing_lines(a, b).len() != 2 {
                    continue;
                }
                tracing::trace!(line = %line, a = %a, b = %b, "adjacent cells");
                if let Some(set) = neighbours.get_mut(a) {
                    set.insert(b.clone());
                }
                if let Some(set) = neighbours.get_mut(b) {
                    set.insert(a.clone());
                }
            }
        }

        neighbours
    }

    /// Symmetric difference of the line sets of two cells.
    pub fn differing_lines(&self, a: &str, b: &str) -> BTreeSet<&str> {
        let lines_a: BTreeSet<&str> = self.lines_of(a).iter().map(String::as_str).collect();
        let lines_b: BTreeSet<&str> = self.lines_of(b).iter().map(String::as_str).collect();
        lines_a.symmetric_difference(&lines_b).copied().collect()
    }

    /// Lines passing through a cell; empty for an unknown cell.
    pub fn lines_of(&self, cell: &str) -> &[String] {
        self.cell_lines.get(cell).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Cells of a line in board order; empty for an unknown line.
    pub fn cells_of(&self, line: &str) -> &[String] {
        self.line_cells.get(line).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Check if a cell exists on this board.
    pub fn exists(&self, cell: &str) -> bool {
        self.cell_lines.contains_key(cell)
    }

    /// Check if a checker can slide from `a` to `b` in one step.
    pub fn is_adjacent(&self, a: &str, b: &str) -> bool {
        self.neighbours
            .get(a)
            .map(|set| set.contains(b))
            .unwrap_or(false)
    }

    /// Cells one slide away from `cell`.
    pub fn neighbours_of(&self, cell: &str) -> impl Iterator<Item = &str> {
        self.neighbours
            .get(cell)
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }

    pub fn cells(&self) -> impl Iterator<Item = &str> {
        self.cell_lines.keys().map(String::as_str)
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.line_cells.keys().map(String::as_str)
    }

    pub fn cell_count(&self) -> usize {
        self.cell_lines.len()
    }

    pub fn line_count(&self) -> usize {
        self.line_cells.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Nine Men's Morris adjacency, listed by hand.
    const EXPECTED_EDGES: [(&str, &str); 32] = [
        ("a1", "d1"), ("d1", "g1"), ("g1", "g4"), ("g4", "g7"),
        ("g7", "d7"), ("d7", "a7"), ("a7", "a4"), ("a4", "a1"),
        ("b2", "d2"), ("d2", "f2"), ("f2", "f4"), ("f4", "f6"),
        ("f6", "d6"), ("d6", "b6"), ("b6", "b4"), ("b4", "b2"),
        ("c3", "d3"), ("d3", "e3"), ("e3", "e4"), ("e4", "e5"),
        ("e5", "d5"), ("d5", "c5"), ("c5", "c4"), ("c4", "c3"),
        ("d1", "d2"), ("d2", "d3"), ("g4", "f4"), ("f4", "e4"),
        ("d7", "d6"), ("d6", "d5"), ("a4", "b4"), ("b4", "c4"),
    ];

    #[test]
    fn test_standard_shape() {
        let t = Topology::standard();
        assert_eq!(t.cell_count(), 24);
        assert_eq!(t.line_count(), 16);
        for line in t.lines() {
            assert_eq!(t.cells_of(line).len(), CELLS_PER_LINE);
        }
    }

    #[test]
    fn test_membership_symmetric() {
        let t = Topology::standard();
        for cell in t.cells() {
            for line in t.lines_of(cell) {
                assert!(t.cells_of(line).iter().any(|c| c == cell));
            }
        }
        for line in t.lines() {
            for cell in t.cells_of(line) {
                assert!(t.lines_of(cell).iter().any(|l| l == line));
            }
        }
    }

    #[test]
    fn test_line_order_follows_board() {
        let t = Topology::standard();
        assert_eq!(t.cells_of("line-1"), ["a1", "d1", "g1"]);
        assert_eq!(t.cells_of("line-12"), ["d1", "d2", "d3"]);
        assert_eq!(t.cells_of("line-13"), ["d5", "d6", "d7"]);
    }

    #[test]
    fn test_unknown_lookups() {
        let t = Topology::standard();
        assert!(t.lines_of("z9").is_empty());
        assert!(t.cells_of("line-99").is_empty());
        assert!(!t.exists("z9"));
        assert!(t.exists("d2"));
        assert!(!t.is_adjacent("z9", "a1"));
    }

    #[test]
    fn test_adjacency_matches_known_graph() {
        let t = Topology::standard();
        let mut expected: BTreeSet<(String, String)> = BTreeSet::new();
        for (a, b) in EXPECTED_EDGES {
            expected.insert((a.to_string(), b.to_string()));
            expected.insert((b.to_string(), a.to_string()));
        }

        let mut actual: BTreeSet<(String, String)> = BTreeSet::new();
        for a in t.cells() {
            for b in t.neighbours_of(a) {
                actual.insert((a.to_string(), b.to_string()));
            }
        }

        assert_eq!(actual, expected);
    }

    #[test]
    fn test_adjacency_symmetric() {
        let t = Topology::standard();
        for a in t.cells() {
            for b in t.cells() {
                assert_eq!(t.is_adjacent(a, b), t.is_adjacent(b, a), "{a} {b}");
            }
            assert!(!t.is_adjacent(a, a));
        }
    }

    #[test]
    fn test_line_ends_not_adjacent() {
        let t = Topology::standard();
        // Same line, not neighbours
        assert!(!t.is_adjacent("a1", "g1"));
        assert!(!t.is_adjacent("d1", "d3"));
        assert!(!t.is_adjacent("a4", "c4"));
        // Different rings, no shared line
        assert!(!t.is_adjacent("a1", "b2"));

        assert!(t.is_adjacent("a1", "d1"));
        assert!(t.is_adjacent("d2", "d3"));
        assert_eq!(t.differing_lines("a1", "d1").len(), 2);
    }

    #[test]
    fn test_degrees() {
        let t = Topology::standard();
        assert_eq!(t.neighbours_of("a1").count(), 2);
        assert_eq!(t.neighbours_of("d1").count(), 3);
        assert_eq!(t.neighbours_of("d2").count(), 4);
        assert_eq!(t.neighbours_of("e4").count(), 3);
    }

    #[test]
    fn test_invalid_configs() {
        assert!(matches!(
            Topology::from_json("not json"),
            Err(TopologyError::Parse(_))
        ));
        assert_eq!(Topology::from_json("{}").unwrap_err(), TopologyError::Empty);
        assert_eq!(
            Topology::from_json(r#"{"a": ["l1"], "b": ["l1"]}"#).unwrap_err(),
            TopologyError::LineSize {
                line: "l1".to_string(),
                count: 2
            }
        );
        assert!(matches!(
            Topology::from_json(r#"{"a": ["l1", "l1"]}"#),
            Err(TopologyError::DuplicateLine { .. })
        ));
    }

    #[test]
    fn test_line_order_follows_configuration() {
        // Lexical order would put p10 first on r1
        let t = Topology::from_json(
            r#"{
                "p2": ["r1", "k1"], "p10": ["r1", "k2"], "p3": ["r1", "k3"],
                "p4": ["r2", "k1"], "p11": ["r2", "k2"], "p5": ["r2", "k3"],
                "p6": ["r3", "k1"], "p12": ["r3", "k2"], "p7": ["r3", "k3"]
            }"#,
        )
        .unwrap();

        assert_eq!(t.cells_of("r1"), ["p2", "p10", "p3"]);
        assert_eq!(t.cells_of("k2"), ["p10", "p11", "p12"]);
        assert!(t.is_adjacent("p2", "p10"));
        assert!(t.is_adjacent("p10", "p3"));
        assert!(!t.is_adjacent("p2", "p3"));
        assert!(t.is_adjacent("p10", "p11"));
        assert_eq!(t.neighbours_of("p11").count(), 4);
    }

    #[test]
    fn test_duplicate_cell_rejected() {
        let entries = vec![
            ("x1".to_string(), vec!["row".to_string()]),
            ("x1".to_string(), vec!["row".to_string()]),
        ];
        assert_eq!(
            Topology::from_cell_lines(entries).unwrap_err(),
            TopologyError::DuplicateCell("x1".to_string())
        );
    }

    #[test]
    fn test_custom_single_line() {
        let t = Topology::from_json(r#"{"x1": ["row"], "x2": ["row"], "x3": ["row"]}"#).unwrap();
        assert_eq!(t.cells_of("row"), ["x1", "x2", "x3"]);
        // Single-line cells share every line, so no differing lines.
        assert!(!t.is_adjacent("x1", "x2"));
    }
}
