#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Greedy junction targeting for a side of pacs.
//!
//! Each [`Agent`] coasts toward a junction until it arrives, then picks the
//! next one among the nodes reachable from where it stands. All agents of a
//! side share one [`RecencyLedger`], so the order in which agents are updated
//! within a turn decides which of them claims a junction first. [`Squad`]
//! fixes that order: observation order for updates, first-sighting order for
//! the emitted commands.

use std::collections::BTreeMap;

use maze_scout_core::{CellCoord, CellId, GridError, MoveCommand, Observation, PacId};
use maze_scout_world::Grid;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Recency assigned to a dead end once it has been chosen.
pub const DEAD_END_RECENCY: u32 = 999;

/// Tunables for target selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetingConfig {
    /// Recency written for a dead end when an agent targets it.
    #[serde(default = "default_dead_end_recency")]
    pub dead_end_recency: u32,
}

impl Default for TargetingConfig {
    fn default() -> Self {
        Self {
            dead_end_recency: DEAD_END_RECENCY,
        }
    }
}

fn default_dead_end_recency() -> u32 {
    DEAD_END_RECENCY
}

/// Shared record of how often each junction was chosen as a target.
///
/// A value of zero means the junction was never chosen.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecencyLedger {
    entries: BTreeMap<CellId, u32>,
}

impl RecencyLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Recency recorded for the cell, zero when never chosen.
    #[must_use]
    pub fn get(&self, cell: CellId) -> u32 {
        self.entries.get(&cell).copied().unwrap_or(0)
    }

    /// Records that `cell` was chosen and returns its new recency.
    ///
    /// Dead ends jump straight to the configured penalty; any other cell
    /// counts up by one from the value it was chosen with.
    pub fn record_choice(&mut self, cell: CellId, dead_end: bool, config: &TargetingConfig) -> u32 {
        let value = if dead_end {
            config.dead_end_recency
        } else {
            self.get(cell).saturating_add(1)
        };
        let _ = self.entries.insert(cell, value);
        value
    }

    /// Number of cells chosen at least once.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no cell was ever chosen.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates recorded recencies in ascending cell order.
    pub fn iter(&self) -> impl Iterator<Item = (CellId, u32)> + '_ {
        self.entries.iter().map(|(cell, value)| (*cell, *value))
    }
}

/// Pac driven by the greedy junction heuristic.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Agent {
    pac: PacId,
    cell: CellCoord,
    target: CellCoord,
}

impl Agent {
    /// Creates an agent at `cell` and selects its first target.
    pub fn spawn(
        grid: &Grid,
        ledger: &mut RecencyLedger,
        config: &TargetingConfig,
        pac: PacId,
        cell: CellCoord,
    ) -> Result<Self, GridError> {
        require_cell(grid, cell)?;
        let mut agent = Self {
            pac,
            cell,
            target: cell,
        };
        let _ = agent.update_target(grid, ledger, config)?;
        Ok(agent)
    }

    /// Identifier of the pac.
    #[must_use]
    pub const fn pac(&self) -> PacId {
        self.pac
    }

    /// Cell the pac was last observed on.
    #[must_use]
    pub const fn cell(&self) -> CellCoord {
        self.cell
    }

    /// Junction the pac is heading for.
    #[must_use]
    pub const fn target(&self) -> CellCoord {
        self.target
    }

    /// Whether the pac stands on its target.
    #[must_use]
    pub fn is_target_reached(&self) -> bool {
        self.cell == self.target
    }

    /// Picks the next junction among the nodes reachable from the current
    /// cell.
    ///
    /// Never-chosen junctions win over chosen ones, the longest corridor
    /// first. When every junction was chosen before, the one with the lowest
    /// recency wins. Ties keep the first junction in discovery order. With
    /// nothing reachable the target and the ledger are left untouched.
    pub fn update_target(
        &mut self,
        grid: &Grid,
        ledger: &mut RecencyLedger,
        config: &TargetingConfig,
    ) -> Result<CellCoord, GridError> {
        let mut best: Option<Candidate> = None;

        for reach in grid.reachable_nodes(self.cell)? {
            let current = Candidate {
                node: reach.node,
                recency: ledger.get(reach.node),
                distance: reach.steps,
            };
            match &mut best {
                Some(held) => {
                    if current.replaces(held) {
                        *held = current;
                    }
                }
                None => best = Some(current),
            }
        }

        let Some(chosen) = best else {
            debug!(pac = self.pac.get(), at = %self.cell, "no reachable junction");
            return Ok(self.target);
        };

        let dead_end = grid.node(chosen.node).is_some_and(|node| node.one_way());
        let recency = ledger.record_choice(chosen.node, dead_end, config);
        self.target = grid.to_coords(chosen.node)?;

        debug!(
            pac = self.pac.get(),
            at = %self.cell,
            target = %self.target,
            distance = chosen.distance,
            recency,
            "selected target"
        );
        Ok(self.target)
    }

    /// Applies the position observed this turn.
    ///
    /// Standing still counts as stuck and forces a new target. Otherwise the
    /// cell is marked eaten and a new target is chosen only on arrival.
    pub fn update_coords(
        &mut self,
        grid: &mut Grid,
        ledger: &mut RecencyLedger,
        config: &TargetingConfig,
        cell: CellCoord,
    ) -> Result<(), GridError> {
        require_cell(grid, cell)?;

        if cell == self.cell {
            debug!(pac = self.pac.get(), at = %cell, "stuck, retargeting");
            let _ = self.update_target(grid, ledger, config)?;
            return Ok(());
        }

        self.cell = cell;
        grid.clear_floor(cell)?;

        if self.is_target_reached() {
            let _ = self.update_target(grid, ledger, config)?;
        }
        Ok(())
    }

    /// Order for this turn.
    #[must_use]
    pub const fn command(&self) -> MoveCommand {
        MoveCommand {
            pac: self.pac,
            target: self.target,
        }
    }
}

/// Every agent of one side plus the ledger they share.
#[derive(Clone, Debug, Default)]
pub struct Squad {
    config: TargetingConfig,
    ledger: RecencyLedger,
    agents: Vec<Agent>,
}

impl Squad {
    /// Creates an empty squad.
    #[must_use]
    pub fn new(config: TargetingConfig) -> Self {
        Self {
            config,
            ledger: RecencyLedger::new(),
            agents: Vec::new(),
        }
    }

    /// Ledger shared by every agent of the squad.
    #[must_use]
    pub fn ledger(&self) -> &RecencyLedger {
        &self.ledger
    }

    /// Agents in first-sighting order.
    #[must_use]
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    /// Agent with the given pac id, if it was ever sighted.
    #[must_use]
    pub fn agent(&self, pac: PacId) -> Option<&Agent> {
        self.agents.iter().find(|agent| agent.pac == pac)
    }

    /// Applies one turn of sightings and returns the orders for every agent.
    ///
    /// Opposing pacs are ignored. Known pacs are updated and new ones spawned
    /// in the order the sightings arrive; orders follow first-sighting order
    /// and include agents that were not seen this turn. A sighting on a wall
    /// or outside the grid rejects the whole turn before any agent, floor or
    /// ledger entry changes.
    pub fn observe(
        &mut self,
        grid: &mut Grid,
        observations: &[Observation],
    ) -> Result<Vec<MoveCommand>, GridError> {
        let mine = || observations.iter().filter(|observation| observation.mine);
        for observation in mine() {
            require_cell(grid, observation.cell)?;
        }

        for observation in mine() {
            let existing = self
                .agents
                .iter_mut()
                .find(|agent| agent.pac == observation.pac);
            match existing {
                Some(agent) => {
                    agent.update_coords(grid, &mut self.ledger, &self.config, observation.cell)?;
                }
                None => {
                    let agent = Agent::spawn(
                        grid,
                        &mut self.ledger,
                        &self.config,
                        observation.pac,
                        observation.cell,
                    )?;
                    self.agents.push(agent);
                }
            }
        }

        Ok(self.agents.iter().map(Agent::command).collect())
    }
}

/// Explicit turn context: the maze plus the squad playing on it.
#[derive(Clone, Debug)]
pub struct Session {
    grid: Grid,
    squad: Squad,
}

impl Session {
    /// Starts a session on an established grid.
    pub fn new(grid: Grid, config: TargetingConfig) -> Result<Self, GridError> {
        if !grid.is_established() {
            return Err(GridError::NotEstablished);
        }
        Ok(Self {
            grid,
            squad: Squad::new(config),
        })
    }

    /// Maze the session plays on.
    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Squad driven by the session.
    #[must_use]
    pub fn squad(&self) -> &Squad {
        &self.squad
    }

    /// Processes one turn of sightings.
    pub fn play_turn(&mut self, observations: &[Observation]) -> Result<Vec<MoveCommand>, GridError> {
        self.squad.observe(&mut self.grid, observations)
    }
}

fn require_cell(grid: &Grid, cell: CellCoord) -> Result<(), GridError> {
    match grid.cell(cell)? {
        Some(_) => Ok(()),
        None => Err(GridError::NoCell {
            x: cell.x(),
            y: cell.y(),
        }),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Candidate {
    node: CellId,
    recency: u32,
    distance: u32,
}

impl Candidate {
    fn replaces(&self, held: &Self) -> bool {
        if self.recency > 0 {
            return self.recency < held.recency;
        }

        held.recency > 0 || self.distance > held.distance
    }
}
