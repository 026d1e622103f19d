//! Shortest paths over the compressed graph.
//!
//! Searches run over node edges only. Endpoints that are plain corridor cells
//! are spliced in as pseudo-nodes for the duration of one query: the start
//! gains outgoing edges to the nodes its own corridor walk reaches, the end
//! gains incoming edges from the nodes that reach it. The established graph is
//! never modified.

use std::{
    cmp::Reverse,
    collections::{BTreeMap, BTreeSet, BinaryHeap},
};

use maze_scout_core::{CellCoord, CellId, GridError};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{compression::walk, Grid};

/// How the search treats a queue entry whose priority is worse than the best
/// distance already recorded for its cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaleEntryPolicy {
    /// Drop the entry and keep searching.
    #[default]
    Skip,
    /// Stop the whole search at the first stale entry, keeping whatever
    /// distances were settled so far.
    Abort,
}

/// Tunables for a single search.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchOptions {
    /// Treatment of stale queue entries.
    #[serde(default)]
    pub stale_entries: StaleEntryPolicy,
}

/// Tentative distances and predecessors produced by one search.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchTable {
    distances: BTreeMap<CellId, u32>,
    previous: BTreeMap<CellId, CellId>,
}

impl SearchTable {
    /// Best known distance to `id`, in steps.
    #[must_use]
    pub fn distance(&self, id: CellId) -> Option<u32> {
        self.distances.get(&id).copied()
    }

    /// Every settled or tentative distance keyed by cell.
    #[must_use]
    pub fn distances(&self) -> &BTreeMap<CellId, u32> {
        &self.distances
    }

    /// Graph-level hops from the search origin to `to`, both inclusive.
    fn hops(&self, to: CellId) -> Vec<CellId> {
        let mut hops = vec![to];
        let mut at = to;
        while let Some(&previous) = self.previous.get(&at) {
            hops.push(previous);
            at = previous;
        }
        hops.reverse();
        hops
    }
}

#[derive(Clone, Debug)]
struct SplicedEdge {
    to: CellId,
    weight: u32,
    trail: Vec<CellId>,
}

/// Node graph plus the temporary edges of one query's pseudo-nodes.
#[derive(Debug)]
struct SearchGraph<'g> {
    grid: &'g Grid,
    spliced: BTreeMap<CellId, Vec<SplicedEdge>>,
}

impl<'g> SearchGraph<'g> {
    fn new(grid: &'g Grid, start: CellId, end: CellId) -> Self {
        let mut graph = Self {
            grid,
            spliced: BTreeMap::new(),
        };

        if !grid.is_node(start) {
            let terminal = |cell: CellId| cell == end || grid.is_node(cell);
            for corridor in walk(grid, start, terminal) {
                if let Some(to) = corridor.end() {
                    graph.splice(start, to, corridor.trail().to_vec());
                }
            }
        }

        if end != start && !grid.is_node(end) {
            let terminal = |cell: CellId| cell == start || grid.is_node(cell);
            for corridor in walk(grid, end, terminal) {
                let Some(from) = corridor.end() else {
                    continue;
                };
                if from == start && !grid.is_node(start) {
                    // already spliced by the start walk
                    continue;
                }
                let mut trail: Vec<CellId> =
                    corridor.trail().iter().rev().skip(1).copied().collect();
                trail.push(end);
                graph.splice(from, end, trail);
            }
        }

        graph
    }

    fn splice(&mut self, from: CellId, to: CellId, trail: Vec<CellId>) {
        let weight = u32::try_from(trail.len()).unwrap_or(u32::MAX);
        let edges = self.spliced.entry(from).or_default();
        match edges.iter_mut().find(|edge| edge.to == to) {
            Some(existing) if existing.weight <= weight => {}
            Some(existing) => {
                existing.weight = weight;
                existing.trail = trail;
            }
            None => edges.push(SplicedEdge { to, weight, trail }),
        }
    }

    fn outgoing(&self, from: CellId) -> Vec<(CellId, u32)> {
        let mut edges: Vec<(CellId, u32)> = self
            .grid
            .node(from)
            .map(|node| {
                node.edges()
                    .iter()
                    .map(|edge| (edge.to(), edge.weight()))
                    .collect()
            })
            .unwrap_or_default();
        if let Some(spliced) = self.spliced.get(&from) {
            edges.extend(spliced.iter().map(|edge| (edge.to, edge.weight)));
        }
        edges
    }

    /// Cells stepped through along the edge `from -> to`, `from` excluded.
    fn trail(&self, from: CellId, to: CellId) -> Option<&[CellId]> {
        let spliced = self.spliced.get(&from).and_then(|edges| {
            edges
                .iter()
                .find(|edge| edge.to == to)
                .map(|edge| edge.trail.as_slice())
        });
        let kept = self
            .grid
            .node(from)
            .and_then(|node| node.weight_to(to).zip(node.trail_to(to)));

        match (spliced, kept) {
            (Some(spliced), Some((weight, kept))) => {
                if u32::try_from(spliced.len()).unwrap_or(u32::MAX) < weight {
                    Some(spliced)
                } else {
                    Some(kept)
                }
            }
            (Some(spliced), None) => Some(spliced),
            (None, Some((_, kept))) => Some(kept),
            (None, None) => None,
        }
    }

    fn search(&self, start: CellId, options: SearchOptions) -> SearchTable {
        let mut table = SearchTable::default();
        let mut visited: BTreeSet<CellId> = BTreeSet::new();
        let mut queue: BinaryHeap<Reverse<(u32, CellId)>> = BinaryHeap::new();

        let _ = table.distances.insert(start, 0);
        queue.push(Reverse((0, start)));

        while let Some(Reverse((priority, current))) = queue.pop() {
            let best = table.distance(current).unwrap_or(u32::MAX);
            if best < priority {
                match options.stale_entries {
                    StaleEntryPolicy::Skip => continue,
                    StaleEntryPolicy::Abort => {
                        trace!(cell = %current, priority, best, "stale entry aborted search");
                        break;
                    }
                }
            }
            if !visited.insert(current) {
                continue;
            }

            for (neighbor, weight) in self.outgoing(current) {
                if visited.contains(&neighbor) {
                    continue;
                }
                let candidate = best.saturating_add(weight);
                let improves = table
                    .distance(neighbor)
                    .map_or(true, |known| candidate < known);
                if improves {
                    let _ = table.distances.insert(neighbor, candidate);
                    let _ = table.previous.insert(neighbor, current);
                    queue.push(Reverse((candidate, neighbor)));
                }
            }
        }

        table
    }
}

impl Grid {
    /// Cells along a shortest route from `from` to `to`, both inclusive.
    ///
    /// Consecutive entries are always adjacent cells. The result is empty when
    /// either endpoint is a wall or the two cells are disconnected.
    pub fn shortest_path(&self, from: CellCoord, to: CellCoord) -> Result<Vec<CellId>, GridError> {
        self.shortest_path_with(from, to, SearchOptions::default())
    }

    /// [`Grid::shortest_path`] with explicit search options.
    pub fn shortest_path_with(
        &self,
        from: CellCoord,
        to: CellCoord,
        options: SearchOptions,
    ) -> Result<Vec<CellId>, GridError> {
        self.require_established()?;
        let start = self.to_id(from)?;
        let end = self.to_id(to)?;

        if self.cell_by_id(start).is_none() || self.cell_by_id(end).is_none() {
            return Ok(Vec::new());
        }
        if start == end {
            return Ok(vec![start]);
        }

        let graph = SearchGraph::new(self, start, end);
        let table = graph.search(start, options);
        if table.distance(end).is_none() {
            return Ok(Vec::new());
        }

        let hops = table.hops(end);
        let mut cells = vec![start];
        for pair in hops.windows(2) {
            let Some(trail) = graph.trail(pair[0], pair[1]) else {
                return Ok(Vec::new());
            };
            cells.extend_from_slice(trail);
        }
        Ok(cells)
    }

    /// Distance table of a search from `from` toward `to`.
    ///
    /// Covers every node the search reached plus the pseudo-nodes spliced in
    /// for non-node endpoints. Empty when either endpoint is a wall.
    pub fn search_table(
        &self,
        from: CellCoord,
        to: CellCoord,
        options: SearchOptions,
    ) -> Result<SearchTable, GridError> {
        self.require_established()?;
        let start = self.to_id(from)?;
        let end = self.to_id(to)?;
        if self.cell_by_id(start).is_none() || self.cell_by_id(end).is_none() {
            return Ok(SearchTable::default());
        }
        Ok(SearchGraph::new(self, start, end).search(start, options))
    }
}
