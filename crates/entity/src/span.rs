use serde::{Deserialize, Serialize};
use std::fmt;

/// Position inside a source file.
///
/// Both fields are zero-based: `row` is a line index, not a line number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Point {
    pub row: u32,
    pub column: u32,
}

impl Point {
    #[must_use]
    pub const fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }
}

/// Inclusive range between two points
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: Point,
    pub end: Point,
}

impl Span {
    #[must_use]
    pub const fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }

    /// Span covering whole rows `start_row..=end_row`
    #[must_use]
    pub const fn rows(start_row: u32, end_row: u32) -> Self {
        Self {
            start: Point::new(start_row, 0),
            end: Point::new(end_row, u32::MAX),
        }
    }

    /// Check if the span touches the given line index
    #[must_use]
    pub const fn contains_line(&self, line: u32) -> bool {
        self.start.row <= line && line <= self.end.row
    }

    #[must_use]
    pub fn contains_any_line(&self, lines: &[u32]) -> bool {
        lines.iter().any(|&line| self.contains_line(line))
    }

    /// Column-aware containment: `other` lies entirely inside `self`
    #[must_use]
    pub fn encloses(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Column-aware intersection
    #[must_use]
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// A span that starts where it ends carries no location information.
    /// Extractors emit it for declarations without a body.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    #[must_use]
    pub const fn line_count(&self) -> u32 {
        self.end.row.saturating_sub(self.start.row) + 1
    }

    pub fn lines(&self) -> impl Iterator<Item = u32> {
        self.start.row..=self.end.row
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{},{}:{}",
            self.start.row, self.start.column, self.end.row, self.end.column
        )
    }
}
