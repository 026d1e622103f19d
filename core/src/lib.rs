#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the maze-scout workspace.
//!
//! This crate defines the values exchanged between the line-protocol adapter,
//! the authoritative grid and the targeting system. Adapters turn raw input
//! into [`Observation`] values, the targeting system answers with
//! [`MoveCommand`] values, and every fallible grid query reports a
//! [`GridError`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// Character that marks the absence of a cell in a raw grid row.
pub const WALL: char = '#';

/// Floor value a cell carries once an agent has walked over it.
pub const CLEARED_FLOOR: char = ' ';

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    x: u32,
    y: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn x(&self) -> u32 {
        self.x
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn y(&self) -> u32 {
        self.y
    }
}

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Linear index of a cell, `x + y * width`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellId(u32);

impl CellId {
    /// Creates a new cell identifier with the provided linear index.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the linear index.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifier the referee assigns to a pac. Unique within one side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PacId(u32);

impl PacId {
    /// Creates a new pac identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Single pac sighting reported for the current turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Observation {
    /// Pac the sighting refers to.
    pub pac: PacId,
    /// Whether the pac belongs to the side being driven.
    pub mine: bool,
    /// Cell the pac occupies this turn.
    pub cell: CellCoord,
}

impl Observation {
    /// Creates a sighting of one of our own pacs.
    #[must_use]
    pub const fn mine(pac: PacId, cell: CellCoord) -> Self {
        Self {
            pac,
            mine: true,
            cell,
        }
    }

    /// Creates a sighting of an opposing pac.
    #[must_use]
    pub const fn theirs(pac: PacId, cell: CellCoord) -> Self {
        Self {
            pac,
            mine: false,
            cell,
        }
    }
}

/// Movement order emitted for one pac at the end of a turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MoveCommand {
    /// Pac the order is addressed to.
    pub pac: PacId,
    /// Cell the pac should travel toward.
    pub target: CellCoord,
}

impl MoveCommand {
    /// Separator placed between commands sharing one output line.
    pub const SEPARATOR: &'static str = " | ";

    /// Renders every command of a turn as a single protocol line.
    #[must_use]
    pub fn join(commands: &[MoveCommand]) -> String {
        commands
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(Self::SEPARATOR)
    }
}

impl fmt::Display for MoveCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MOVE {} {} {}",
            self.pac.get(),
            self.target.x(),
            self.target.y()
        )
    }
}

/// Failures reported by grid construction and grid queries.
///
/// Graph-shape anomalies such as isolated nodes or disconnected regions are
/// not errors; they surface as empty results instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, thiserror::Error, Serialize, Deserialize)]
pub enum GridError {
    /// A row did not match the width fixed by the first non-empty row.
    #[error("row {row} has {found} columns but the grid is {expected} wide")]
    RowWidthMismatch {
        /// Index of the offending row.
        row: u32,
        /// Width fixed by the first non-empty row.
        expected: u32,
        /// Length of the offending row.
        found: u32,
    },
    /// A row was loaded with an index other than the next expected one.
    #[error("expected row {expected} but received row {found}")]
    RowOutOfOrder {
        /// Index the grid expected next.
        expected: u32,
        /// Index supplied by the caller.
        found: u32,
    },
    /// The coordinate lies outside `[0, width) x [0, height)`.
    #[error("cell ({x}, {y}) lies outside the {width}x{height} grid")]
    OutOfBounds {
        /// Requested column.
        x: u32,
        /// Requested row.
        y: u32,
        /// Grid width.
        width: u32,
        /// Grid height.
        height: u32,
    },
    /// The coordinate is inside the grid but holds a wall.
    #[error("cell ({x}, {y}) is a wall")]
    NoCell {
        /// Requested column.
        x: u32,
        /// Requested row.
        y: u32,
    },
    /// A graph query ran before the grid was established.
    #[error("grid queried before establish() compressed it")]
    NotEstablished,
}
