//! Seed grids and solved tile grids.
//!
//! Both grids are flat arrays indexed `x + y * width`.
//!
//! - `SeedGrid`: optional pre-placed tiles handed to the solver
//! - `TileGrid`: the solver's output, one `GridCell` per cell

use crate::tile::TileId;

/// One cell of a solved grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GridCell {
    /// Cell collapsed to (or was seeded with) a tile
    Solved(TileId),
    /// Cell left unresolved; rendered with the tile set's fallback pattern
    Fallback,
}

impl GridCell {
    pub fn tile(self) -> Option<TileId> {
        match self {
            GridCell::Solved(tile) => Some(tile),
            GridCell::Fallback => None,
        }
    }

    pub fn is_fallback(self) -> bool {
        self == GridCell::Fallback
    }
}

/// Pre-placed tiles for a solve. Unset cells are left to the solver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedGrid {
    width: usize,
    height: usize,
    cells: Vec<Option<TileId>>,
}

impl SeedGrid {
    /// Create an empty seed grid.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![None; width * height],
        }
    }

    /// Keep the solved tiles of `grid` for which `keep(x, y, tile)` returns
    /// true. Fallback cells are never kept.
    pub fn from_tile_grid<F>(grid: &TileGrid, mut keep: F) -> Self
    where
        F: FnMut(usize, usize, TileId) -> bool,
    {
        let mut seed = Self::new(grid.width(), grid.height());
        for (x, y, cell) in grid.iter() {
            if let GridCell::Solved(tile) = cell {
                if keep(x, y, tile) {
                    seed.set(x, y, tile);
                }
            }
        }
        seed
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Place a tile at (x, y).
    ///
    /// Does nothing if coordinates are out of bounds.
    pub fn set(&mut self, x: usize, y: usize, tile: TileId) {
        if x < self.width && y < self.height {
            self.cells[x + y * self.width] = Some(tile);
        }
    }

    /// Remove the tile at (x, y).
    pub fn clear(&mut self, x: usize, y: usize) {
        if x < self.width && y < self.height {
            self.cells[x + y * self.width] = None;
        }
    }

    /// Tile placed at (x, y), if any.
    ///
    /// Returns `None` if coordinates are out of bounds.
    pub fn get(&self, x: usize, y: usize) -> Option<TileId> {
        if x < self.width && y < self.height {
            self.cells[x + y * self.width]
        } else {
            None
        }
    }

    /// Number of pre-placed tiles.
    pub fn placed_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    /// Iterate over pre-placed tiles as `(x, y, tile)`.
    pub fn iter_placed(&self) -> impl Iterator<Item = (usize, usize, TileId)> + '_ {
        self.cells.iter().enumerate().filter_map(move |(i, cell)| {
            cell.map(|tile| (i % self.width, i / self.width, tile))
        })
    }
}

/// A fully populated solver output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileGrid {
    width: usize,
    height: usize,
    cells: Vec<GridCell>,
}

impl TileGrid {
    /// Build from a flat cell array (`x + y * width`).
    ///
    /// Returns `None` if the array length does not match the dimensions.
    pub fn from_cells(width: usize, height: usize, cells: Vec<GridCell>) -> Option<Self> {
        if cells.len() != width * height {
            return None;
        }
        Some(Self {
            width,
            height,
            cells,
        })
    }

    /// A grid where every cell holds the same tile.
    pub fn filled(width: usize, height: usize, tile: TileId) -> Self {
        Self {
            width,
            height,
            cells: vec![GridCell::Solved(tile); width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Total number of cells.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Cell at (x, y). Returns `None` if out of bounds.
    pub fn get(&self, x: usize, y: usize) -> Option<GridCell> {
        if x < self.width && y < self.height {
            Some(self.cells[x + y * self.width])
        } else {
            None
        }
    }

    /// Tile at (x, y), or `None` for fallback and out-of-bounds cells.
    pub fn tile(&self, x: usize, y: usize) -> Option<TileId> {
        self.get(x, y).and_then(GridCell::tile)
    }

    /// Number of fallback cells.
    pub fn fallback_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_fallback()).count()
    }

    /// Iterate over all cells as `(x, y, cell)` in storage order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, GridCell)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, &cell)| (i % self.width, i / self.width, cell))
    }
}
