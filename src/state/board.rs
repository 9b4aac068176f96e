//! Board occupancy and recorded mills.
//!
//! The board is a plain state writer: it never checks whether a write is
//! legal. Legality belongs to the game session, which is the only owner of a
//! `Board` and the only caller of its mutators.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::topology::Topology;

/// Checker color. Each session has exactly one player per color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Blue,
    Red,
}

impl Color {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blue => "blue",
            Self::Red => "red",
        }
    }

    pub fn opponent(self) -> Self {
        match self {
            Self::Blue => Self::Red,
            Self::Red => Self::Blue,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mutable board state on top of a static topology.
#[derive(Debug, Clone)]
pub struct Board {
    topology: &'static Topology,

    /// Occupied cells and their colors
    busy_field: BTreeMap<String, Color>,

    /// Lines with a recorded mill. A record outlives the checkers that made
    /// it; only `reset` clears it.
    mills: BTreeMap<String, Color>,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// Create an empty standard board.
    pub fn new() -> Self {
        Self::with_topology(Topology::standard())
    }

    pub fn with_topology(topology: &'static Topology) -> Self {
        Self {
            topology,
            busy_field: BTreeMap::new(),
            mills: BTreeMap::new(),
        }
    }

    pub fn topology(&self) -> &'static Topology {
        self.topology
    }

    pub fn lines_of(&self, cell: &str) -> &'static [String] {
        self.topology.lines_of(cell)
    }

    pub fn cells_of(&self, line: &str) -> &'static [String] {
        self.topology.cells_of(line)
    }

    pub fn exists(&self, cell: &str) -> bool {
        self.topology.exists(cell)
    }

    pub fn is_adjacent(&self, from: &str, to: &str) -> bool {
        self.topology.is_adjacent(from, to)
    }

    /// Color of the checker on a cell, if any.
    pub fn occupant_of(&self, cell: &str) -> Option<Color> {
        self.busy_field.get(cell).copied()
    }

    pub fn is_empty_cell(&self, cell: &str) -> bool {
        !self.busy_field.contains_key(cell)
    }

    pub fn place(&mut self, cell: &str, color: Color) {
        self.busy_field.insert(cell.to_string(), color);
    }

    /// Move whatever is on `from` to `to`. Moving from an empty cell only
    /// clears `to`.
    pub fn move_checker(&mut self, from: &str, to: &str) {
        match self.busy_field.remove(from) {
            Some(color) => {
                self.busy_field.insert(to.to_string(), color);
            }
            None => {
                self.busy_field.remove(to);
            }
        }
    }

    pub fn remove(&mut self, cell: &str) {
        self.busy_field.remove(cell);
    }

    /// Color of the mill recorded on a line, if any.
    pub fn mill_on(&self, line: &str) -> Option<Color> {
        self.mills.get(line).copied()
    }

    pub fn record_mill(&mut self, line: &str, color: Color) {
        self.mills.insert(line.to_string(), color);
    }

    /// Check if all cells of a line hold `color`.
    pub fn line_filled_by(&self, line: &str, color: Color) -> bool {
        let cells = self.cells_of(line);
        !cells.is_empty() && cells.iter().all(|c| self.occupant_of(c) == Some(color))
    }

    pub fn count_occupied(&self, color: Color) -> usize {
        self.busy_field.values().filter(|c| **c == color).count()
    }

    pub fn occupied_cells_of(&self, color: Color) -> Vec<&str> {
        self.busy_field
            .iter()
            .filter(|(_, c)| **c == color)
            .map(|(cell, _)| cell.as_str())
            .collect()
    }

    pub fn count_mills(&self, color: Color) -> usize {
        self.mills.values().filter(|c| **c == color).count()
    }

    pub fn total_occupied(&self) -> usize {
        self.busy_field.len()
    }

    pub fn total_mills(&self) -> usize {
        self.mills.len()
    }

    /// Full occupancy snapshot.
    pub fn busy_field(&self) -> &BTreeMap<String, Color> {
        &self.busy_field
    }

    /// Full recorded-mill snapshot.
    pub fn mills(&self) -> &BTreeMap<String, Color> {
        &self.mills
    }

    /// Check if a checker on `cell` has an empty cell one slide away.
    pub fn can_slide_from(&self, cell: &str) -> bool {
        self.topology
            .neighbours_of(cell)
            .any(|n| self.is_empty_cell(n))
    }

    /// Check if no checker of `color` can slide anywhere.
    pub fn all_closed(&self, color: Color) -> bool {
        self.occupied_cells_of(color)
            .into_iter()
            .all(|cell| !self.can_slide_from(cell))
    }

    /// Clear occupancy and mill records.
    pub fn reset(&mut self) {
        self.busy_field.clear();
        self.mills.clear();
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "busyField": self.busy_field,
            "lines": self.mills
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_color_opponent() {
        assert_eq!(Color::Blue.opponent(), Color::Red);
        assert_eq!(Color::Red.opponent(), Color::Blue);
        assert_eq!(format!("{}", Color::Red), "red");
    }

    #[test]
    fn test_color_serde() {
        assert_eq!(serde_json::to_string(&Color::Blue).unwrap(), "\"blue\"");
        let c: Color = serde_json::from_str("\"red\"").unwrap();
        assert_eq!(c, Color::Red);
    }

    #[test]
    fn test_place_move_remove() {
        let mut board = Board::new();
        assert!(board.is_empty_cell("a1"));

        board.place("a1", Color::Blue);
        assert_eq!(board.occupant_of("a1"), Some(Color::Blue));

        board.move_checker("a1", "d1");
        assert_eq!(board.occupant_of("a1"), None);
        assert_eq!(board.occupant_of("d1"), Some(Color::Blue));

        board.remove("d1");
        assert_eq!(board.total_occupied(), 0);
    }

    #[test]
    fn test_counts() {
        let mut board = Board::new();
        board.place("a1", Color::Blue);
        board.place("d1", Color::Blue);
        board.place("g1", Color::Red);

        assert_eq!(board.count_occupied(Color::Blue), 2);
        assert_eq!(board.count_occupied(Color::Red), 1);
        assert_eq!(board.occupied_cells_of(Color::Blue), vec!["a1", "d1"]);
        assert_eq!(board.total_occupied(), 3);
    }

    #[test]
    fn test_mill_records_persist() {
        let mut board = Board::new();
        for cell in ["a1", "d1", "g1"] {
            board.place(cell, Color::Red);
        }
        assert!(board.line_filled_by("line-1", Color::Red));
        assert!(!board.line_filled_by("line-1", Color::Blue));
        assert!(!board.line_filled_by("line-99", Color::Red));

        board.record_mill("line-1", Color::Red);
        board.remove("d1");

        assert_eq!(board.mill_on("line-1"), Some(Color::Red));
        assert_eq!(board.count_mills(Color::Red), 1);
        assert_eq!(board.count_mills(Color::Blue), 0);

        board.reset();
        assert_eq!(board.total_mills(), 0);
        assert_eq!(board.total_occupied(), 0);
    }

    #[test]
    fn test_closed_checkers() {
        let mut board = Board::new();
        board.place("a1", Color::Blue);
        assert!(!board.all_closed(Color::Blue));

        board.place("d1", Color::Red);
        board.place("a4", Color::Red);
        assert!(!board.can_slide_from("a1"));
        assert!(board.all_closed(Color::Blue));

        // No checkers at all counts as closed
        let empty = Board::new();
        assert!(empty.all_closed(Color::Red));
    }

    #[test]
    fn test_snapshot_json() {
        let mut board = Board::new();
        board.place("d2", Color::Blue);
        board.record_mill("line-2", Color::Blue);
        assert_eq!(
            board.to_json(),
            serde_json::json!({
                "busyField": {"d2": "blue"},
                "lines": {"line-2": "blue"}
            })
        );
    }
}
