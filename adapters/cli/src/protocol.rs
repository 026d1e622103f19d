//! Line protocol spoken on stdin.
//!
//! The maze arrives once as a `width height` header followed by its rows.
//! Every turn then carries the scores, the visible pacs and the visible
//! pellets. Only the pac sightings drive the squad; everything else is
//! validated and dropped.

use std::io::{BufRead, Lines};

use anyhow::{bail, Context, Result};
use maze_scout_core::{CellCoord, Observation, PacId};
use maze_scout_world::Grid;

/// One turn worth of input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Turn {
    /// Score of our side.
    pub(crate) my_score: u32,
    /// Score of the opposing side.
    pub(crate) opponent_score: u32,
    /// Pac sightings in the order they were listed.
    pub(crate) observations: Vec<Observation>,
    /// Number of pellets listed for the turn.
    pub(crate) pellets: usize,
}

/// Reader over the protocol lines with line numbers for error context.
#[derive(Debug)]
pub(crate) struct Protocol<R> {
    lines: Lines<R>,
    line_number: usize,
}

impl<R: BufRead> Protocol<R> {
    pub(crate) fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_number: 0,
        }
    }

    /// Reads the header and every row, then establishes the graph.
    pub(crate) fn read_grid(&mut self) -> Result<Grid> {
        let header = self.require_line("grid header")?;
        let fields = split_fields(&header);
        let width: u32 = parse_field(&fields, 0, "width", self.line_number)?;
        let height: u32 = parse_field(&fields, 1, "height", self.line_number)?;

        let mut grid = Grid::new();
        for row in 0..height {
            let text = self.require_line("grid row")?;
            let found = text.chars().count();
            if found != width as usize {
                bail!(
                    "line {}: row {row} has {found} cells, header declared {width}",
                    self.line_number
                );
            }
            grid.load_row(&text, row)
                .with_context(|| format!("line {}: failed to load row {row}", self.line_number))?;
        }

        grid.establish();
        Ok(grid)
    }

    /// Reads the next turn, `None` when the input ends before it starts.
    pub(crate) fn read_turn(&mut self) -> Result<Option<Turn>> {
        let Some(scores) = self.next_line()? else {
            return Ok(None);
        };
        let fields = split_fields(&scores);
        let my_score = parse_field(&fields, 0, "my score", self.line_number)?;
        let opponent_score = parse_field(&fields, 1, "opponent score", self.line_number)?;

        let pac_count = self.read_count("visible pac count")?;
        let mut observations = Vec::with_capacity(pac_count);
        for _ in 0..pac_count {
            let line = self.require_line("pac sighting")?;
            observations.push(parse_sighting(&line, self.line_number)?);
        }

        let pellets = self.read_count("visible pellet count")?;
        for _ in 0..pellets {
            let line = self.require_line("pellet")?;
            let fields = split_fields(&line);
            let _: u32 = parse_field(&fields, 0, "pellet x", self.line_number)?;
            let _: u32 = parse_field(&fields, 1, "pellet y", self.line_number)?;
            let _: u32 = parse_field(&fields, 2, "pellet value", self.line_number)?;
        }

        Ok(Some(Turn {
            my_score,
            opponent_score,
            observations,
            pellets,
        }))
    }

    fn read_count(&mut self, what: &str) -> Result<usize> {
        let line = self.require_line(what)?;
        line.trim()
            .parse()
            .with_context(|| format!("line {}: invalid {what} `{line}`", self.line_number))
    }

    fn require_line(&mut self, what: &str) -> Result<String> {
        match self.next_line()? {
            Some(line) => Ok(line),
            None => bail!("input ended after line {} while reading {what}", self.line_number),
        }
    }

    fn next_line(&mut self) -> Result<Option<String>> {
        let Some(line) = self.lines.next() else {
            return Ok(None);
        };
        self.line_number += 1;
        let mut line =
            line.with_context(|| format!("failed to read line {}", self.line_number))?;
        if line.ends_with('\r') {
            let _ = line.pop();
        }
        Ok(Some(line))
    }
}

fn parse_sighting(line: &str, line_number: usize) -> Result<Observation> {
    let fields = split_fields(line);
    if fields.len() < 4 {
        bail!("line {line_number}: pac sighting needs at least 4 fields, found {}", fields.len());
    }

    let pac = PacId::new(parse_field(&fields, 0, "pac id", line_number)?);
    let mine = match fields[1] {
        "0" => false,
        "1" => true,
        other => bail!("line {line_number}: ownership flag must be 0 or 1, found `{other}`"),
    };
    let x = parse_field(&fields, 2, "pac x", line_number)?;
    let y = parse_field(&fields, 3, "pac y", line_number)?;

    Ok(Observation {
        pac,
        mine,
        cell: CellCoord::new(x, y),
    })
}

fn split_fields(line: &str) -> Vec<&str> {
    line.split_whitespace().collect()
}

fn parse_field<T>(fields: &[&str], index: usize, name: &str, line_number: usize) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let Some(raw) = fields.get(index) else {
        bail!("line {line_number}: missing {name}");
    };
    raw.parse()
        .with_context(|| format!("line {line_number}: invalid {name} `{raw}`"))
}
