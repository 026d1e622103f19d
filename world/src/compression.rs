//! Corridor compression: turns runs of two-neighbour cells into weighted
//! edges between nodes.
//!
//! The walk is iterative. Each pending branch is an explicit frame owning the
//! trail of cells it has stepped through, so the visited set of one branch can
//! never leak into another; a frame's trail is cloned only when a cell fans
//! out into more than one unvisited neighbour.

use maze_scout_core::{CellCoord, CellId, GridError};
use tracing::trace;

use crate::Grid;

/// Weighted link from a node to another node reachable without crossing a
/// third node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Edge {
    to: CellId,
    weight: u32,
    corridor: usize,
}

impl Edge {
    /// Node at the far end of the corridor.
    #[must_use]
    pub const fn to(&self) -> CellId {
        self.to
    }

    /// Corridor length in cell steps.
    #[must_use]
    pub const fn weight(&self) -> u32 {
        self.weight
    }
}

/// Record of one branch walked outward from a node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Corridor {
    end: Option<CellId>,
    trail: Vec<CellId>,
}

impl Corridor {
    /// Terminal cell the branch stopped at, or `None` when it ran back into
    /// cells it had already crossed.
    #[must_use]
    pub const fn end(&self) -> Option<CellId> {
        self.end
    }

    /// Cells stepped through, excluding the origin and including the end.
    #[must_use]
    pub fn trail(&self) -> &[CellId] {
        &self.trail
    }

    /// Number of steps taken along the branch.
    #[must_use]
    pub fn steps(&self) -> u32 {
        u32::try_from(self.trail.len()).unwrap_or(u32::MAX)
    }
}

/// Junction or dead end anchoring the compressed graph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Node {
    id: CellId,
    coord: CellCoord,
    one_way: bool,
    edges: Vec<Edge>,
    corridors: Vec<Corridor>,
}

impl Node {
    /// Linear identifier shared with the underlying cell.
    #[must_use]
    pub const fn id(&self) -> CellId {
        self.id
    }

    /// Coordinates of the node.
    #[must_use]
    pub const fn coord(&self) -> CellCoord {
        self.coord
    }

    /// Whether the node is a dead end.
    #[must_use]
    pub const fn one_way(&self) -> bool {
        self.one_way
    }

    /// Outgoing edges in discovery order.
    #[must_use]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Every branch walked from this node, including ones that found no node.
    #[must_use]
    pub fn corridors(&self) -> &[Corridor] {
        &self.corridors
    }

    /// Weight of the edge toward `to`, if one was discovered.
    #[must_use]
    pub fn weight_to(&self, to: CellId) -> Option<u32> {
        self.edge_to(to).map(Edge::weight)
    }

    /// Cells walked along the kept edge toward `to`, origin excluded.
    #[must_use]
    pub fn trail_to(&self, to: CellId) -> Option<&[CellId]> {
        let edge = self.edge_to(to)?;
        self.corridors.get(edge.corridor).map(Corridor::trail)
    }

    /// Whether the node itself or one of its walks covers `cell`.
    #[must_use]
    pub fn reaches(&self, cell: CellId) -> bool {
        self.id == cell
            || self
                .corridors
                .iter()
                .any(|corridor| corridor.trail.contains(&cell))
    }

    fn edge_to(&self, to: CellId) -> Option<&Edge> {
        self.edges.iter().find(|edge| edge.to == to)
    }
}

/// Node reachable from an arbitrary cell, with its distance in steps.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Reach {
    /// Node at the end of the corridor.
    pub node: CellId,
    /// Steps from the queried cell to the node.
    pub steps: u32,
}

impl Grid {
    /// Nodes reachable from the coordinate without crossing another node.
    ///
    /// For a node this is its edge list. For a corridor cell the same walk
    /// used by compression runs from the cell itself. Results keep discovery
    /// order; a node reached twice keeps its shorter distance.
    pub fn reachable_nodes(&self, coord: CellCoord) -> Result<Vec<Reach>, GridError> {
        self.require_established()?;
        let id = self.to_id(coord)?;

        if let Some(node) = self.node(id) {
            return Ok(node
                .edges
                .iter()
                .map(|edge| Reach {
                    node: edge.to,
                    steps: edge.weight,
                })
                .collect());
        }

        if self.cell_by_id(id).is_none() {
            return Ok(Vec::new());
        }

        let mut reached: Vec<Reach> = Vec::new();
        for corridor in walk(self, id, |cell| self.is_node(cell)) {
            let Some(end) = corridor.end else {
                continue;
            };
            let steps = corridor.steps();
            match reached.iter_mut().find(|reach| reach.node == end) {
                Some(existing) if existing.steps <= steps => {}
                Some(existing) => existing.steps = steps,
                None => reached.push(Reach { node: end, steps }),
            }
        }
        Ok(reached)
    }
}

/// Builds the node anchored at `origin`, walking every corridor leaving it.
pub(crate) fn compress(grid: &Grid, origin: CellId) -> Node {
    let (coord, one_way) = grid
        .cell_by_id(origin)
        .map_or((CellCoord::new(0, 0), false), |cell| {
            (cell.coord(), cell.one_way())
        });

    let corridors = walk(grid, origin, |cell| {
        grid.cell_by_id(cell).is_some_and(|candidate| candidate.is_node())
    });

    let mut edges: Vec<Edge> = Vec::new();
    for (index, corridor) in corridors.iter().enumerate() {
        let Some(end) = corridor.end else {
            continue;
        };
        let weight = corridor.steps();
        let edge = Edge {
            to: end,
            weight,
            corridor: index,
        };
        match edges.iter_mut().find(|existing| existing.to == end) {
            Some(existing) if existing.weight <= weight => {}
            Some(existing) => *existing = edge,
            None => edges.push(edge),
        }
    }

    trace!(
        node = %origin,
        at = %coord,
        edges = edges.len(),
        corridors = corridors.len(),
        "compressed node"
    );

    Node {
        id: origin,
        coord,
        one_way,
        edges,
        corridors,
    }
}

#[derive(Debug)]
struct Frame {
    cell: CellId,
    trail: Vec<CellId>,
}

/// Walks outward from `origin`, stopping each branch at the first terminal
/// cell. The origin itself is never revisited, so loops cannot close onto it.
pub(crate) fn walk<F>(grid: &Grid, origin: CellId, is_terminal: F) -> Vec<Corridor>
where
    F: Fn(CellId) -> bool,
{
    let mut corridors = Vec::new();
    let mut frames: Vec<Frame> = grid
        .adjacent_ids(origin)
        .map(|cell| Frame {
            cell,
            trail: vec![cell],
        })
        .collect();
    // stack pops from the back; keep left, right, top, bottom discovery order
    frames.reverse();

    while let Some(Frame { cell, trail }) = frames.pop() {
        if is_terminal(cell) {
            corridors.push(Corridor {
                end: Some(cell),
                trail,
            });
            continue;
        }

        let next: Vec<CellId> = grid
            .adjacent_ids(cell)
            .filter(|neighbor| *neighbor != origin && !trail.contains(neighbor))
            .collect();

        let Some((&last, rest)) = next.split_last() else {
            corridors.push(Corridor { end: None, trail });
            continue;
        };

        let mut branches: Vec<Frame> = rest
            .iter()
            .map(|&neighbor| {
                let mut branch = trail.clone();
                branch.push(neighbor);
                Frame {
                    cell: neighbor,
                    trail: branch,
                }
            })
            .collect();
        let mut continued = trail;
        continued.push(last);
        branches.push(Frame {
            cell: last,
            trail: continued,
        });
        frames.extend(branches.into_iter().rev());
    }

    corridors
}

#[cfg(test)]
mod tests {
    use maze_scout_core::{CellCoord, CellId, GridError};

    use crate::Grid;

    fn grid(rows: &[&str]) -> Grid {
        Grid::from_rows(rows.iter().copied()).expect("rows load")
    }

    fn id(grid: &Grid, x: u32, y: u32) -> CellId {
        grid.to_id(CellCoord::new(x, y)).expect("in bounds")
    }

    #[test]
    fn straight_corridor_becomes_single_edge() {
        let grid = grid(&["#######", "#     #", "#######"]);
        let west = id(&grid, 1, 1);
        let east = id(&grid, 5, 1);

        let node = grid.node(west).expect("dead end is a node");
        assert_eq!(node.edges().len(), 1);
        assert_eq!(node.weight_to(east), Some(4));
        assert_eq!(grid.node(east).and_then(|n| n.weight_to(west)), Some(4));
        assert_eq!(
            node.trail_to(east).expect("trail kept"),
            &[
                id(&grid, 2, 1),
                id(&grid, 3, 1),
                id(&grid, 4, 1),
                east
            ]
        );
    }

    #[test]
    fn shorter_of_two_corridors_is_kept() {
        // (1,2) and (3,3) are joined by a 3-step corridor below and a
        // 9-step corridor around the top of the ring
        let grid = grid(&[
            "#######",
            "#     #",
            "  ### #",
            "#     #",
            "### ###",
            "#######",
        ]);
        let west = id(&grid, 1, 2);
        let south = id(&grid, 3, 3);

        let node = grid.node(west).expect("junction");
        assert_eq!(node.weight_to(south), Some(3));
        assert_eq!(
            node.trail_to(south).expect("trail kept"),
            &[id(&grid, 1, 3), id(&grid, 2, 3), south]
        );
        assert_eq!(
            node.edges().iter().map(|edge| edge.to()).collect::<Vec<_>>(),
            vec![id(&grid, 0, 2), south]
        );
        assert_eq!(node.corridors().len(), 3);
        assert_eq!(grid.node(south).and_then(|n| n.weight_to(west)), Some(3));
    }

    #[test]
    fn ring_without_junctions_has_no_nodes() {
        let grid = grid(&[
            "#######",
            "#     #",
            "# ### #",
            "# ### #",
            "#     #",
            "#######",
        ]);
        assert_eq!(grid.nodes().count(), 0);
    }

    #[test]
    fn isolated_node_has_no_edges() {
        let grid = grid(&["###", "# #", "###"]);
        let lonely = id(&grid, 1, 1);

        let node = grid.node(lonely).expect("zero neighbours promotes to node");
        assert!(!node.one_way());
        assert!(node.edges().is_empty());
        assert!(node.corridors().is_empty());
    }

    #[test]
    fn edges_exist_in_both_directions() {
        let grid = grid(&[
            "#########",
            "#   #   #",
            "# ##### #",
            "#       #",
            "#########",
        ]);

        for node in grid.nodes() {
            for edge in node.edges() {
                let back = grid
                    .node(edge.to())
                    .and_then(|other| other.weight_to(node.id()));
                assert_eq!(back, Some(edge.weight()), "edge {:?} has no twin", edge);
            }
        }
    }

    #[test]
    fn connected_nodes_lists_every_walk_through_cell() {
        let grid = grid(&["#######", "#     #", "#######"]);
        let west = id(&grid, 1, 1);
        let east = id(&grid, 5, 1);

        let middle = grid
            .connected_nodes(CellCoord::new(3, 1))
            .expect("established");
        assert_eq!(middle.keys().copied().collect::<Vec<_>>(), vec![west, east]);

        let endpoint = grid
            .connected_nodes(CellCoord::new(1, 1))
            .expect("established");
        assert!(endpoint.contains_key(&west));
        assert!(endpoint.contains_key(&east));
    }

    #[test]
    fn reachable_nodes_from_corridor_cell_report_offsets() {
        let grid = grid(&["#######", "#     #", "#######"]);
        let reach = grid
            .reachable_nodes(CellCoord::new(2, 1))
            .expect("established");

        let steps: Vec<(CellId, u32)> = reach.iter().map(|r| (r.node, r.steps)).collect();
        assert_eq!(steps, vec![(id(&grid, 1, 1), 1), (id(&grid, 5, 1), 3)]);
    }

    #[test]
    fn reachable_nodes_from_wall_is_empty() {
        let grid = grid(&["#######", "#     #", "#######"]);
        assert!(grid
            .reachable_nodes(CellCoord::new(0, 0))
            .expect("established")
            .is_empty());
        assert!(matches!(
            grid.reachable_nodes(CellCoord::new(9, 0)),
            Err(GridError::OutOfBounds { .. })
        ));
    }
}
