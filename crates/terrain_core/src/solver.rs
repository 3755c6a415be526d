//! Greedy constraint solver for tile grids (Wave Function Collapse style).
//!
//! Each cell is either open, holding the list of tiles still compatible with
//! its solved orthogonal neighbours, or solved. The solver repeats:
//!
//! - **Select**: the open cell with the fewest candidates; ties go to the
//!   first cell in scan order (x outer, y inner)
//! - **Choose**: a candidate picked at random, weighted by the summed
//!   affinity of the solved neighbours towards it
//! - **Propagate**: recompute the candidates of the collapsed cell's open
//!   neighbours
//!
//! There is no backtracking. Solved cells never revert, so an open cell whose
//! candidate list becomes empty stays stuck forever. The run ends when every
//! cell is solved, when no open cell has a candidate left, or when the
//! iteration cap is hit. Unresolved cells are reported as
//! `GridCell::Fallback`; a failed run still returns a complete grid.

use bevy::log::{debug, info, trace, warn};
use std::fmt;

use crate::grid::{GridCell, SeedGrid, TileGrid};
use crate::rng::TerrainRng;
use crate::tile::{Direction, TileId};
use crate::tileset::TileSet;

/// Default number of collapses before a run is declared failed.
pub const DEFAULT_MAX_ITERATIONS: usize = 500;

/// Solver tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolverConfig {
    /// Maximum number of cell collapses per run
    pub max_iterations: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl SolverConfig {
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }
}

/// Errors detected before solving starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolveError {
    /// Width or height is zero
    EmptyGrid { width: usize, height: usize },
    /// The tile set has no tiles
    EmptyTileSet,
    /// Seed grid dimensions differ from the requested grid
    SeedDimensionMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },
    /// A seeded tile id is not in the tile set
    SeedTileOutOfRange {
        x: usize,
        y: usize,
        tile: TileId,
        tile_count: usize,
    },
}

impl fmt::Display for SolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveError::EmptyGrid { width, height } => {
                write!(f, "cannot solve an empty {}x{} grid", width, height)
            }
            SolveError::EmptyTileSet => write!(f, "tile set has no tiles"),
            SolveError::SeedDimensionMismatch { expected, actual } => write!(
                f,
                "seed grid is {}x{}, expected {}x{}",
                actual.0, actual.1, expected.0, expected.1
            ),
            SolveError::SeedTileOutOfRange {
                x,
                y,
                tile,
                tile_count,
            } => write!(
                f,
                "seed tile {} at ({}, {}) is out of range (tile set has {} tiles)",
                tile, x, y, tile_count
            ),
        }
    }
}

impl std::error::Error for SolveError {}

/// How a solve run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveOutcome {
    /// Every cell is solved
    Converged,
    /// Open cells remain but none has a compatible candidate
    Contradiction,
    /// The iteration cap was reached with open cells remaining
    IterationCap,
}

/// Summary of a solve run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolveReport {
    pub outcome: SolveOutcome,
    /// Number of cells collapsed by the solver
    pub iterations: usize,
    /// Number of cells taken from the seed grid
    pub seeded_cells: usize,
    /// Number of cells filled with the fallback pattern
    pub fallback_cells: usize,
    /// Collapses where the affinity pool was empty and the pick was uniform
    pub uniform_choices: usize,
}

/// Result of a solve: a fully populated grid plus the run report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    pub grid: TileGrid,
    pub report: SolveReport,
}

impl Solution {
    /// Whether every cell was resolved without falling back.
    pub fn converged(&self) -> bool {
        self.report.outcome == SolveOutcome::Converged
    }
}

/// Per-cell solver state.
#[derive(Debug, Clone, PartialEq, Eq)]
enum CellState {
    /// Unsolved; tiles compatible with the solved neighbours
    Open(Vec<TileId>),
    Solved(TileId),
}

/// Solver state for one run over a width x height grid.
pub struct ConstraintSolver<'a> {
    tileset: &'a TileSet,
    width: usize,
    height: usize,
    /// Flat array, index = x + y * width
    cells: Vec<CellState>,
    config: SolverConfig,
    open_cells: usize,
    seeded_cells: usize,
    iterations: usize,
    uniform_choices: usize,
    outcome: Option<SolveOutcome>,
}

impl<'a> ConstraintSolver<'a> {
    /// Validate the inputs, place the seeded tiles and run the initial
    /// propagation pass.
    pub fn new(
        width: usize,
        height: usize,
        tileset: &'a TileSet,
        seed: Option<&SeedGrid>,
        config: SolverConfig,
    ) -> Result<Self, SolveError> {
        if width == 0 || height == 0 {
            return Err(SolveError::EmptyGrid { width, height });
        }
        if tileset.is_empty() {
            return Err(SolveError::EmptyTileSet);
        }

        let mut cells = vec![CellState::Open(Vec::new()); width * height];
        let mut seeded_cells = 0;

        if let Some(seed) = seed {
            if seed.width() != width || seed.height() != height {
                return Err(SolveError::SeedDimensionMismatch {
                    expected: (width, height),
                    actual: (seed.width(), seed.height()),
                });
            }
            for (x, y, tile) in seed.iter_placed() {
                if tile >= tileset.len() {
                    return Err(SolveError::SeedTileOutOfRange {
                        x,
                        y,
                        tile,
                        tile_count: tileset.len(),
                    });
                }
                cells[x + y * width] = CellState::Solved(tile);
                seeded_cells += 1;
            }
        }

        let mut solver = Self {
            tileset,
            width,
            height,
            cells,
            config,
            open_cells: width * height - seeded_cells,
            seeded_cells,
            iterations: 0,
            uniform_choices: 0,
            outcome: None,
        };

        solver.warn_on_conflicting_seeds();
        solver.propagate_all();
        Ok(solver)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of collapses made so far.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Outcome once the run has finished, `None` while still running.
    pub fn outcome(&self) -> Option<SolveOutcome> {
        self.outcome
    }

    #[inline]
    fn index(&self, x: usize, y: usize) -> usize {
        x + y * self.width
    }

    /// Tile at (x, y) if the cell is solved.
    pub fn solved_tile(&self, x: usize, y: usize) -> Option<TileId> {
        match self.cells[self.index(x, y)] {
            CellState::Solved(tile) => Some(tile),
            CellState::Open(_) => None,
        }
    }

    /// Current candidates of an open cell, `None` if the cell is solved.
    pub fn candidates(&self, x: usize, y: usize) -> Option<&[TileId]> {
        match &self.cells[self.index(x, y)] {
            CellState::Open(candidates) => Some(candidates),
            CellState::Solved(_) => None,
        }
    }

    /// Coordinates of the neighbour in `direction`, if inside the grid.
    fn neighbor(&self, x: usize, y: usize, direction: Direction) -> Option<(usize, usize)> {
        let (dx, dy) = direction.offset();
        let nx = x as i64 + dx;
        let ny = y as i64 + dy;
        if nx < 0 || ny < 0 || nx >= self.width as i64 || ny >= self.height as i64 {
            return None;
        }
        Some((nx as usize, ny as usize))
    }

    /// Solved orthogonal neighbours of (x, y), with the direction they lie in.
    fn solved_neighbors(&self, x: usize, y: usize) -> Vec<(Direction, TileId)> {
        Direction::ALL
            .iter()
            .filter_map(|&direction| {
                let (nx, ny) = self.neighbor(x, y, direction)?;
                self.solved_tile(nx, ny).map(|tile| (direction, tile))
            })
            .collect()
    }

    /// Tiles compatible with every solved orthogonal neighbour of (x, y).
    ///
    /// Open neighbours impose no constraint.
    pub fn compute_candidates(&self, x: usize, y: usize) -> Vec<TileId> {
        let neighbors = self.solved_neighbors(x, y);
        (0..self.tileset.len())
            .filter(|&candidate| {
                neighbors.iter().all(|&(direction, tile)| {
                    self.tileset.is_compatible(candidate, direction, tile)
                })
            })
            .collect()
    }

    /// Recompute the candidates of every open cell.
    pub fn propagate_all(&mut self) {
        for y in 0..self.height {
            for x in 0..self.width {
                self.refresh(x, y);
            }
        }
    }

    /// Recompute the candidates of the open neighbours of (x, y).
    ///
    /// Candidates depend only on solved neighbours, so after collapsing
    /// (x, y) this gives the same state as a full pass.
    fn propagate_around(&mut self, x: usize, y: usize) {
        for direction in Direction::ALL {
            if let Some((nx, ny)) = self.neighbor(x, y, direction) {
                self.refresh(nx, ny);
            }
        }
    }

    fn refresh(&mut self, x: usize, y: usize) {
        let i = self.index(x, y);
        if matches!(self.cells[i], CellState::Open(_)) {
            self.cells[i] = CellState::Open(self.compute_candidates(x, y));
        }
    }

    /// Minimum-remaining-candidates selection.
    ///
    /// Returns the open cell with the fewest (but at least one) candidates,
    /// first in scan order (x outer, y inner) among equals. `None` if no open
    /// cell has a candidate.
    pub fn select_cell(&self) -> Option<(usize, usize)> {
        (0..self.width)
            .flat_map(|x| (0..self.height).map(move |y| (x, y)))
            .filter_map(|(x, y)| match &self.cells[self.index(x, y)] {
                CellState::Open(candidates) if !candidates.is_empty() => {
                    Some((candidates.len(), x, y))
                }
                _ => None,
            })
            // min_by_key keeps the first of several equal minima
            .min_by_key(|&(count, _, _)| count)
            .map(|(_, x, y)| (x, y))
    }

    /// Perform one collapse.
    ///
    /// Returns true if a cell was collapsed, false once the run has finished
    /// (see `outcome()`).
    pub fn step(&mut self, rng: &mut dyn TerrainRng) -> bool {
        if self.outcome.is_some() {
            return false;
        }
        if self.open_cells == 0 {
            self.outcome = Some(SolveOutcome::Converged);
            return false;
        }
        if self.iterations >= self.config.max_iterations {
            self.outcome = Some(SolveOutcome::IterationCap);
            return false;
        }

        let Some((x, y)) = self.select_cell() else {
            self.outcome = Some(SolveOutcome::Contradiction);
            return false;
        };

        let i = self.index(x, y);
        let candidates = match &self.cells[i] {
            CellState::Open(candidates) => candidates.clone(),
            CellState::Solved(_) => unreachable!("select_cell only returns open cells"),
        };
        let neighbors: Vec<TileId> = self
            .solved_neighbors(x, y)
            .into_iter()
            .map(|(_, tile)| tile)
            .collect();

        let choice = weighted_choice(self.tileset, &candidates, &neighbors, rng);
        if choice.uniform {
            self.uniform_choices += 1;
            debug!(
                "No affinity weight at ({}, {}); picking uniformly among {} candidates",
                x,
                y,
                candidates.len()
            );
        }

        trace!(
            "Collapse ({}, {}) -> tile {} ({} candidates)",
            x,
            y,
            choice.tile,
            candidates.len()
        );

        self.cells[i] = CellState::Solved(choice.tile);
        self.open_cells -= 1;
        self.iterations += 1;
        self.propagate_around(x, y);
        true
    }

    /// Run until convergence, contradiction or the iteration cap.
    pub fn run(mut self, rng: &mut dyn TerrainRng) -> Solution {
        while self.step(rng) {}
        self.into_solution()
    }

    /// Finish the run and build the output grid.
    ///
    /// Open cells become `GridCell::Fallback`. A run stopped before it
    /// finished on its own is reported as `IterationCap`.
    pub fn into_solution(self) -> Solution {
        let outcome = if self.open_cells == 0 {
            SolveOutcome::Converged
        } else {
            self.outcome.unwrap_or(SolveOutcome::IterationCap)
        };

        let cells: Vec<GridCell> = self
            .cells
            .iter()
            .map(|cell| match cell {
                CellState::Solved(tile) => GridCell::Solved(*tile),
                CellState::Open(_) => GridCell::Fallback,
            })
            .collect();

        let report = SolveReport {
            outcome,
            iterations: self.iterations,
            seeded_cells: self.seeded_cells,
            fallback_cells: self.open_cells,
            uniform_choices: self.uniform_choices,
        };

        match outcome {
            SolveOutcome::Converged => info!(
                "Solved {}x{} tile grid in {} collapses ({} seeded)",
                self.width, self.height, report.iterations, report.seeded_cells
            ),
            SolveOutcome::Contradiction | SolveOutcome::IterationCap => warn!(
                "Tile grid {}x{} did not converge ({:?} after {} collapses); {} cells use the fallback pattern",
                self.width, self.height, outcome, report.iterations, report.fallback_cells
            ),
        }

        let grid = TileGrid::from_cells(self.width, self.height, cells)
            .unwrap_or_else(|| unreachable!("solver cell array always matches its dimensions"));

        Solution { grid, report }
    }

    /// Seeded tiles are kept as placed even when they clash.
    fn warn_on_conflicting_seeds(&self) {
        for y in 0..self.height {
            for x in 0..self.width {
                let Some(tile) = self.solved_tile(x, y) else {
                    continue;
                };
                for direction in [Direction::Right, Direction::Up] {
                    let Some((nx, ny)) = self.neighbor(x, y, direction) else {
                        continue;
                    };
                    if let Some(other) = self.solved_tile(nx, ny) {
                        if !self.tileset.is_compatible(tile, direction, other) {
                            warn!(
                                "Seeded tiles {} at ({}, {}) and {} at ({}, {}) do not fit",
                                tile, x, y, other, nx, ny
                            );
                        }
                    }
                }
            }
        }
    }
}

/// Outcome of a weighted pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Choice {
    pub tile: TileId,
    /// True when every candidate scored zero and the pick was uniform
    pub uniform: bool,
}

/// Pick one of `candidates`, weighted by affinity.
///
/// Each candidate scores the sum of `affinity[neighbor][candidate]` over the
/// solved neighbours and is drawn with probability proportional to its
/// score. If every score is zero (including when there are no solved
/// neighbours) the pick is uniform over the candidates.
///
/// `candidates` must not be empty.
pub fn weighted_choice(
    tileset: &TileSet,
    candidates: &[TileId],
    neighbors: &[TileId],
    rng: &mut dyn TerrainRng,
) -> Choice {
    debug_assert!(!candidates.is_empty());

    let scores: Vec<u64> = candidates
        .iter()
        .map(|&candidate| {
            neighbors
                .iter()
                .map(|&neighbor| tileset.affinity(neighbor, candidate) as u64)
                .sum()
        })
        .collect();
    let total: u64 = scores.iter().sum();

    if total == 0 {
        let index = rng.next_usize_max(candidates.len());
        return Choice {
            tile: candidates[index],
            uniform: true,
        };
    }

    // Position in the pool where each candidate appears `score` times
    let mut r = rng.next_usize_max(total as usize) as u64;
    for (&candidate, &score) in candidates.iter().zip(&scores) {
        if r < score {
            return Choice {
                tile: candidate,
                uniform: false,
            };
        }
        r -= score;
    }

    unreachable!("pool position is always below the total weight")
}

/// Solve a width x height tile grid.
///
/// Never fails because of non-convergence: check `Solution::converged()` or
/// the report. Errors are only returned for invalid inputs.
pub fn solve(
    width: usize,
    height: usize,
    tileset: &TileSet,
    seed: Option<&SeedGrid>,
    rng: &mut dyn TerrainRng,
    config: &SolverConfig,
) -> Result<Solution, SolveError> {
    let solver = ConstraintSolver::new(width, height, tileset, seed, config.clone())?;
    Ok(solver.run(rng))
}
