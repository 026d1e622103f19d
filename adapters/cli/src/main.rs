#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays the maze line protocol on stdin/stdout.

mod config;
mod protocol;

use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use maze_scout_core::MoveCommand;
use maze_scout_system_targeting::{Agent, Session};
use maze_scout_world::{query, StaleEntryPolicy};
use tracing::{debug, info, Level};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{
    config::{ConfigFile, Settings},
    protocol::Protocol,
};

const DEFAULT_LOG_FILTER: &str = "info";

/// Reads a maze and per-turn sightings from stdin and prints one line of
/// move orders per turn.
#[derive(Debug, Parser)]
#[command(name = "maze-scout", version)]
struct Args {
    /// TOML file with `stale_entries` and `dead_end_recency`.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// How the route search treats outdated queue entries.
    #[arg(long, value_enum)]
    stale_entries: Option<StaleEntriesArg>,

    /// Log filter directive, takes precedence over `RUST_LOG`.
    #[arg(long, value_name = "FILTER")]
    log: Option<String>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum StaleEntriesArg {
    /// Skip outdated entries and keep searching.
    Skip,
    /// Stop the search at the first outdated entry.
    Abort,
}

impl From<StaleEntriesArg> for StaleEntryPolicy {
    fn from(value: StaleEntriesArg) -> Self {
        match value {
            StaleEntriesArg::Skip => Self::Skip,
            StaleEntriesArg::Abort => Self::Abort,
        }
    }
}

/// Entry point for the maze scout command-line interface.
fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log.as_deref())?;

    let file = match &args.config {
        Some(path) => ConfigFile::load(path)?,
        None => ConfigFile::default(),
    };
    let settings = Settings::resolve(file, args.stale_entries.map(StaleEntryPolicy::from));
    debug!(?settings, "resolved settings");

    let stdin = io::stdin();
    let stdout = io::stdout();
    run(stdin.lock(), stdout.lock(), &settings)
}

fn init_tracing(directive: Option<&str>) -> Result<()> {
    let filter = match directive {
        Some(directive) => EnvFilter::try_new(directive)
            .with_context(|| format!("invalid log filter `{directive}`"))?,
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .try_init()
        .context("failed to install tracing subscriber")
}

/// Plays the protocol until the input ends.
fn run<R: BufRead, W: Write>(input: R, mut output: W, settings: &Settings) -> Result<()> {
    let mut protocol = Protocol::new(input);
    let grid = protocol.read_grid()?;
    let summary = query::summary(&grid);
    info!(
        width = grid.width(),
        height = grid.height(),
        cells = summary.cells,
        nodes = summary.nodes,
        dead_ends = summary.dead_ends,
        edges = summary.edges,
        "maze loaded"
    );

    let mut session = Session::new(grid, settings.targeting)?;
    let mut turn_number = 0_u32;

    while let Some(turn) = protocol.read_turn()? {
        turn_number += 1;
        debug!(
            turn = turn_number,
            my_score = turn.my_score,
            opponent_score = turn.opponent_score,
            sightings = turn.observations.len(),
            pellets = turn.pellets,
            "turn received"
        );

        let commands = session
            .play_turn(&turn.observations)
            .with_context(|| format!("turn {turn_number} has an invalid sighting"))?;
        log_routes(&session, settings)?;

        writeln!(output, "{}", MoveCommand::join(&commands)).context("failed to write orders")?;
        output.flush().context("failed to flush orders")?;
    }

    info!(turns = turn_number, "input ended");
    Ok(())
}

fn log_routes(session: &Session, settings: &Settings) -> Result<()> {
    if !tracing::enabled!(Level::DEBUG) {
        return Ok(());
    }

    for (agent, steps) in route_lengths(session, settings)? {
        debug!(
            pac = agent.pac().get(),
            from = %agent.cell(),
            target = %agent.target(),
            steps,
            "route"
        );
    }
    Ok(())
}

/// Steps each agent still has to walk to its order.
fn route_lengths(session: &Session, settings: &Settings) -> Result<Vec<(Agent, usize)>> {
    session
        .squad()
        .agents()
        .iter()
        .map(|agent| {
            let route = session
                .grid()
                .shortest_path_with(agent.cell(), agent.target(), settings.search)?;
            Ok((*agent, route.len().saturating_sub(1)))
        })
        .collect()
}
