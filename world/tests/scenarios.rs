use std::collections::{BTreeMap, VecDeque};

use maze_scout_core::{CellCoord, CellId};
use maze_scout_world::{query, Grid, SearchOptions, StaleEntryPolicy};

const PLAYFIELD: [&str; 9] = [
    "###########",
    "#    #    #",
    "# ## # ## #",
    "#         #",
    "# ## # ## #",
    "     #     ",
    "# ## # ## #",
    "#         #",
    "###########",
];

fn grid(rows: &[&str]) -> Grid {
    Grid::from_rows(rows.iter().copied()).expect("rows load")
}

fn coord(grid: &Grid, id: CellId) -> CellCoord {
    grid.to_coords(id).expect("ids from the grid are in bounds")
}

/// Plain breadth-first distances over the raw cells.
fn bfs(grid: &Grid, from: CellCoord) -> BTreeMap<CellCoord, usize> {
    let mut distances = BTreeMap::new();
    let mut queue = VecDeque::new();
    let _ = distances.insert(from, 0);
    queue.push_back(from);

    while let Some(cell) = queue.pop_front() {
        let next = distances[&cell] + 1;
        for neighbor in grid.adjacent(cell).expect("in bounds") {
            if !distances.contains_key(&neighbor.coord()) {
                let _ = distances.insert(neighbor.coord(), next);
                queue.push_back(neighbor.coord());
            }
        }
    }

    distances
}

#[test]
fn paths_are_valid_and_as_short_as_breadth_first_search() {
    let grid = grid(&PLAYFIELD);
    let cells: Vec<CellCoord> = grid.iter_cells().map(|cell| cell.coord()).collect();

    for &from in &cells {
        let reference = bfs(&grid, from);
        for &to in &cells {
            let path = grid.shortest_path(from, to).expect("valid query");
            let expected = reference.get(&to).copied();

            let Some(expected) = expected else {
                assert!(path.is_empty(), "{from} -> {to} should be unreachable");
                continue;
            };

            assert_eq!(path.first().map(|id| coord(&grid, *id)), Some(from));
            assert_eq!(path.last().map(|id| coord(&grid, *id)), Some(to));
            assert_eq!(path.len() - 1, expected, "{from} -> {to} is not shortest");

            for pair in path.windows(2) {
                let here = coord(&grid, pair[0]);
                let there = coord(&grid, pair[1]);
                let adjacent = grid.adjacent(here).expect("in bounds");
                assert!(
                    adjacent.iter().any(|cell| cell.coord() == there),
                    "{here} and {there} are not adjacent on {from} -> {to}"
                );
            }
        }
    }
}

#[test]
fn abort_policy_never_beats_skip_policy() {
    let grid = grid(&PLAYFIELD);
    let cells: Vec<CellCoord> = grid.iter_cells().map(|cell| cell.coord()).collect();
    let abort = SearchOptions {
        stale_entries: StaleEntryPolicy::Abort,
    };

    for &from in cells.iter().step_by(3) {
        for &to in cells.iter().step_by(5) {
            let skipped = grid.shortest_path(from, to).expect("valid query");
            let aborted = grid.shortest_path_with(from, to, abort).expect("valid query");
            if !aborted.is_empty() {
                assert!(aborted.len() >= skipped.len());
            }
        }
    }
}

#[test]
fn compressed_edges_match_path_lengths() {
    let grid = grid(&PLAYFIELD);

    for node in grid.nodes() {
        for edge in node.edges() {
            let to = coord(&grid, edge.to());
            let path = grid.shortest_path(node.coord(), to).expect("valid query");
            assert!(
                path.len() - 1 <= edge.weight() as usize,
                "edge {} -> {} is shorter than its path",
                node.coord(),
                to
            );
        }
    }
}

#[test]
fn node_classification_follows_neighbour_count() {
    let grid = grid(&PLAYFIELD);

    for cell in grid.iter_cells() {
        let degree = grid.adjacent(cell.coord()).expect("in bounds").len();
        assert_eq!(cell.is_node(), degree != 2, "{}", cell.coord());
        assert_eq!(cell.one_way(), degree == 1, "{}", cell.coord());
        assert_eq!(grid.is_node(cell.id()), degree != 2);
    }
}

#[test]
fn open_room_wraps_around_corners() {
    let grid = grid(&["   ", "   ", "   "]);

    assert_eq!(query::summary(&grid).nodes, 9);
    let path = grid
        .shortest_path(CellCoord::new(0, 0), CellCoord::new(2, 2))
        .expect("valid query");
    // one step west through the wrap, two steps south
    assert_eq!(path.len(), 4);
}

#[test]
fn rooms_joined_by_corridor_share_one_edge() {
    let grid = grid(&[
        "###########",
        "#  #####  #",
        "#         #",
        "#  #####  #",
        "###########",
    ]);
    let west = grid.to_id(CellCoord::new(2, 2)).expect("in bounds");
    let east = grid.to_id(CellCoord::new(8, 2)).expect("in bounds");
    let middle = grid.to_id(CellCoord::new(5, 2)).expect("in bounds");

    let crossing: Vec<(CellId, CellId, u32)> = grid
        .nodes()
        .flat_map(|node| {
            node.edges().iter().filter_map(move |edge| {
                node.trail_to(edge.to())
                    .filter(|trail| trail.contains(&middle))
                    .map(|_| (node.id(), edge.to(), edge.weight()))
            })
        })
        .collect();
    assert_eq!(crossing, vec![(west, east, 6), (east, west, 6)]);

    let path = grid
        .shortest_path(CellCoord::new(1, 1), CellCoord::new(9, 3))
        .expect("valid query");
    for x in 3..=7 {
        let corridor = grid.to_id(CellCoord::new(x, 2)).expect("in bounds");
        assert!(path.contains(&corridor), "corridor cell {x} skipped");
    }
}

#[test]
fn walled_grid_has_no_graph() {
    let grid = grid(&["####", "####"]);

    assert!(grid.nodes().next().is_none());
    assert!(grid
        .shortest_path(CellCoord::new(0, 0), CellCoord::new(3, 1))
        .expect("in bounds")
        .is_empty());
}

// (3,3) is first queued through the 6-step loop over the top, then improved
// to 2 through the junction at (2,3). Its outdated entry pops before the
// junction at (8,3) is settled, so the far dead end at (8,6) is never queued.
const IMPROVED_JUNCTION: [&str; 8] = [
    "###########",
    "#   #######",
    "# # #### ##",
    "#        ##",
    "## ##### ##",
    "######## ##",
    "######## ##",
    "###########",
];

#[test]
fn abort_policy_stops_at_first_outdated_entry() {
    let grid = grid(&IMPROVED_JUNCTION);
    let from = CellCoord::new(1, 3);
    let to = CellCoord::new(8, 6);
    let skip = SearchOptions::default();
    let abort = SearchOptions {
        stale_entries: StaleEntryPolicy::Abort,
    };

    let skipped = grid.shortest_path_with(from, to, skip).expect("valid query");
    assert_eq!(skipped.len() - 1, bfs(&grid, from)[&to]);
    assert_eq!(skipped.len(), 11);
    assert_eq!(skipped.last().map(|id| coord(&grid, *id)), Some(to));

    let aborted = grid.shortest_path_with(from, to, abort).expect("valid query");
    assert!(aborted.is_empty());

    let target = grid.to_id(to).expect("in bounds");
    let junction = grid.to_id(CellCoord::new(8, 3)).expect("in bounds");
    let improved = grid.to_id(CellCoord::new(3, 3)).expect("in bounds");

    let full = grid.search_table(from, to, skip).expect("valid query");
    assert_eq!(full.distance(improved), Some(2));
    assert_eq!(full.distance(junction), Some(7));
    assert_eq!(full.distance(target), Some(10));

    let partial = grid.search_table(from, to, abort).expect("valid query");
    assert_eq!(partial.distance(improved), Some(2));
    assert_eq!(partial.distance(junction), Some(7));
    assert_eq!(partial.distance(target), None);
    assert!(partial.distances().len() < full.distances().len());
}
