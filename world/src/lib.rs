#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative maze state for maze-scout.
//!
//! A [`Grid`] is built row by row from raw text, then [`Grid::establish`]
//! classifies every cell and compresses corridor runs into weighted edges
//! between [`Node`]s. After that the graph is immutable; only floor values
//! change as agents walk over cells. Shortest-path queries live in the
//! [`path`] module, the compression walk in [`compression`].

use std::collections::BTreeMap;

use maze_scout_core::{CellCoord, CellId, GridError, CLEARED_FLOOR, WALL};
use tracing::debug;

pub mod compression;
pub mod path;

pub use compression::{Corridor, Edge, Node, Reach};
pub use path::{SearchOptions, StaleEntryPolicy};

/// Single traversable grid position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cell {
    id: CellId,
    coord: CellCoord,
    floor: char,
    one_way: bool,
    node: bool,
}

impl Cell {
    /// Linear identifier of the cell.
    #[must_use]
    pub const fn id(&self) -> CellId {
        self.id
    }

    /// Coordinates of the cell.
    #[must_use]
    pub const fn coord(&self) -> CellCoord {
        self.coord
    }

    /// Character the cell was loaded with, or [`CLEARED_FLOOR`] once visited.
    #[must_use]
    pub const fn floor(&self) -> char {
        self.floor
    }

    /// Whether the cell is a dead end with exactly one neighbour.
    #[must_use]
    pub const fn one_way(&self) -> bool {
        self.one_way
    }

    /// Whether the cell was promoted to a [`Node`].
    #[must_use]
    pub const fn is_node(&self) -> bool {
        self.node
    }
}

/// Toroidal maze built from raw rows. Wraps horizontally, never vertically.
#[derive(Clone, Debug, Default)]
pub struct Grid {
    width: Option<u32>,
    height: u32,
    cells: Vec<Option<Cell>>,
    nodes: BTreeMap<CellId, Node>,
    established: bool,
}

impl Grid {
    /// Creates an empty grid awaiting rows.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads every row in order and establishes the compressed graph.
    pub fn from_rows<I, S>(rows: I) -> Result<Self, GridError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut grid = Self::new();
        for row in rows {
            let index = grid.height;
            grid.load_row(row.as_ref(), index)?;
        }
        grid.establish();
        Ok(grid)
    }

    /// Appends one row of raw text.
    ///
    /// Every character other than [`WALL`] becomes a cell at
    /// `(column, row)`. The first non-empty row fixes the width. Loading a row
    /// discards any graph built by an earlier [`Grid::establish`].
    pub fn load_row(&mut self, text: &str, row: u32) -> Result<(), GridError> {
        if row != self.height {
            return Err(GridError::RowOutOfOrder {
                expected: self.height,
                found: row,
            });
        }

        let found = u32::try_from(text.chars().count()).unwrap_or(u32::MAX);
        let width = match self.width {
            Some(width) if width != found => {
                return Err(GridError::RowWidthMismatch {
                    row,
                    expected: width,
                    found,
                });
            }
            Some(width) => width,
            None if found == 0 => {
                self.height += 1;
                return Ok(());
            }
            None => {
                self.width = Some(found);
                // earlier empty rows still occupy a full stride
                self.cells.resize(slot_count(found, self.height), None);
                found
            }
        };

        self.nodes.clear();
        self.established = false;
        self.height += 1;
        self.cells.resize(slot_count(width, self.height), None);

        for (column, value) in (0..width).zip(text.chars()) {
            if value == WALL {
                continue;
            }
            let id = CellId::new(column + row * width);
            if let Some(slot) = self.cells.get_mut(slot_index(id)) {
                *slot = Some(Cell {
                    id,
                    coord: CellCoord::new(column, row),
                    floor: value,
                    one_way: false,
                    node: false,
                });
            }
        }

        Ok(())
    }

    /// Classifies cells and compresses corridors into node-to-node edges.
    ///
    /// Cells whose neighbour count is not exactly two become nodes; cells with
    /// a single neighbour are additionally flagged as one-way dead ends. Every
    /// node then walks outward along its corridors. A grid without cells
    /// establishes to an empty graph.
    pub fn establish(&mut self) {
        self.nodes.clear();

        let classified: Vec<(CellId, usize)> = self
            .iter_cells()
            .map(|cell| (cell.id, self.adjacent_ids(cell.id).count()))
            .collect();

        for (id, degree) in classified {
            let Some(Some(cell)) = self.cells.get_mut(slot_index(id)) else {
                continue;
            };
            cell.one_way = degree == 1;
            cell.node = degree != 2;
        }

        let node_ids: Vec<CellId> = self
            .iter_cells()
            .filter(|cell| cell.node)
            .map(|cell| cell.id)
            .collect();

        for id in node_ids {
            let node = compression::compress(self, id);
            let _ = self.nodes.insert(id, node);
        }

        self.established = true;

        let summary = query::summary(self);
        debug!(
            width = self.width(),
            height = self.height,
            cells = summary.cells,
            nodes = summary.nodes,
            dead_ends = summary.dead_ends,
            edges = summary.edges,
            "grid established"
        );
    }

    /// Width fixed by the first non-empty row, or zero before any was loaded.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width.unwrap_or(0)
    }

    /// Number of rows loaded so far.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Whether [`Grid::establish`] ran since the last row was loaded.
    #[must_use]
    pub fn is_established(&self) -> bool {
        self.established
    }

    /// Maps a coordinate to its linear identifier.
    pub fn to_id(&self, coord: CellCoord) -> Result<CellId, GridError> {
        self.check_bounds(coord)?;
        Ok(CellId::new(coord.x() + coord.y() * self.width()))
    }

    /// Maps a linear identifier back to its coordinate.
    pub fn to_coords(&self, id: CellId) -> Result<CellCoord, GridError> {
        let width = self.width();
        if width == 0 {
            return Err(self.out_of_bounds(CellCoord::new(id.get(), 0)));
        }
        let coord = CellCoord::new(id.get() % width, id.get() / width);
        self.check_bounds(coord)?;
        Ok(coord)
    }

    /// Cell stored at the coordinate, or `None` for a wall.
    pub fn cell(&self, coord: CellCoord) -> Result<Option<&Cell>, GridError> {
        let id = self.to_id(coord)?;
        Ok(self.cell_by_id(id))
    }

    /// Cell stored under the identifier, if any.
    #[must_use]
    pub fn cell_by_id(&self, id: CellId) -> Option<&Cell> {
        self.cells.get(slot_index(id)).and_then(Option::as_ref)
    }

    /// Iterates every cell in ascending identifier order.
    pub fn iter_cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter().flatten()
    }

    /// Existing neighbours of the coordinate in left, right, top, bottom order.
    ///
    /// Left and right wrap around the grid width; top and bottom stop at the
    /// first and last row. Walls, duplicates and the cell itself are skipped,
    /// so narrow grids never report a neighbour twice.
    pub fn adjacent(&self, coord: CellCoord) -> Result<Vec<&Cell>, GridError> {
        let id = self.to_id(coord)?;
        Ok(self
            .adjacent_ids(id)
            .filter_map(|neighbor| self.cell_by_id(neighbor))
            .collect())
    }

    /// Node stored under the identifier, if the cell was promoted.
    #[must_use]
    pub fn node(&self, id: CellId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Iterates nodes in ascending identifier order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Whether the identifier refers to a node.
    #[must_use]
    pub fn is_node(&self, id: CellId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Character currently lying on the cell.
    pub fn floor_value(&self, coord: CellCoord) -> Result<Option<char>, GridError> {
        Ok(self.cell(coord)?.map(Cell::floor))
    }

    /// Marks the cell as eaten. Walls are left untouched.
    pub fn clear_floor(&mut self, coord: CellCoord) -> Result<(), GridError> {
        let id = self.to_id(coord)?;
        if let Some(Some(cell)) = self.cells.get_mut(slot_index(id)) {
            cell.floor = CLEARED_FLOOR;
        }
        Ok(())
    }

    /// Every node whose compression walk passed through the coordinate.
    ///
    /// A node always reaches itself, so querying a node's own coordinate
    /// includes that node.
    pub fn connected_nodes(&self, coord: CellCoord) -> Result<BTreeMap<CellId, &Node>, GridError> {
        self.require_established()?;
        let location = self.to_id(coord)?;
        Ok(self
            .nodes
            .iter()
            .filter(|(_, node)| node.reaches(location))
            .map(|(id, node)| (*id, node))
            .collect())
    }

    pub(crate) fn adjacent_ids(&self, id: CellId) -> impl Iterator<Item = CellId> + '_ {
        let width = self.width();
        let mut candidates = [None; 4];
        let mut count = 0;

        if width > 0 {
            let x = id.get() % width;
            let y = id.get() / width;

            let left = if x > 0 { x - 1 } else { width - 1 };
            let right = if x + 1 < width { x + 1 } else { 0 };
            let top = y.checked_sub(1);
            let bottom = Some(y + 1).filter(|row| *row < self.height);

            let neighbors = [
                Some(CellCoord::new(left, y)),
                Some(CellCoord::new(right, y)),
                top.map(|row| CellCoord::new(x, row)),
                bottom.map(|row| CellCoord::new(x, row)),
            ];

            for coord in neighbors.into_iter().flatten() {
                let neighbor = CellId::new(coord.x() + coord.y() * width);
                if neighbor == id || candidates[..count].contains(&Some(neighbor)) {
                    continue;
                }
                candidates[count] = Some(neighbor);
                count += 1;
            }
        }

        candidates
            .into_iter()
            .take(count)
            .flatten()
            .filter(|neighbor| self.cell_by_id(*neighbor).is_some())
    }

    pub(crate) fn require_established(&self) -> Result<(), GridError> {
        if self.established {
            Ok(())
        } else {
            Err(GridError::NotEstablished)
        }
    }

    fn check_bounds(&self, coord: CellCoord) -> Result<(), GridError> {
        if coord.x() < self.width() && coord.y() < self.height {
            Ok(())
        } else {
            Err(self.out_of_bounds(coord))
        }
    }

    fn out_of_bounds(&self, coord: CellCoord) -> GridError {
        GridError::OutOfBounds {
            x: coord.x(),
            y: coord.y(),
            width: self.width(),
            height: self.height,
        }
    }
}

fn slot_count(width: u32, height: u32) -> usize {
    usize::try_from(u64::from(width) * u64::from(height)).unwrap_or(0)
}

fn slot_index(id: CellId) -> usize {
    usize::try_from(id.get()).unwrap_or(usize::MAX)
}

/// Query functions that summarise an established grid.
pub mod query {
    use super::Grid;

    /// Aggregate counts describing the compressed graph.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct GraphSummary {
        /// Number of traversable cells.
        pub cells: usize,
        /// Number of cells promoted to nodes.
        pub nodes: usize,
        /// Number of nodes with a single neighbour.
        pub dead_ends: usize,
        /// Number of directed node-to-node edges.
        pub edges: usize,
    }

    /// Counts cells, nodes, dead ends and edges of the grid.
    #[must_use]
    pub fn summary(grid: &Grid) -> GraphSummary {
        GraphSummary {
            cells: grid.iter_cells().count(),
            nodes: grid.nodes.len(),
            dead_ends: grid.nodes().filter(|node| node.one_way()).count(),
            edges: grid.nodes().map(|node| node.edges().len()).sum(),
        }
    }
}
