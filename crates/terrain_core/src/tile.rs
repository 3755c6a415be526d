//! Edge codes and 3x3 tile patterns.
//!
//! A tile is a 3x3 block of edge codes. The outer ring of the block decides
//! which tiles may sit next to it: two tiles fit along a shared side when the
//! three codes on the touching sides are pairwise equal.
//!
//! Patterns are indexed `[dx][dy]`: the first index is the column (x offset
//! inside the cell), the second the row (y offset).

/// Index of a tile inside a `TileSet`.
pub type TileId = usize;

/// Boundary type of a tile sub-cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum EdgeCode {
    Water = 0,
    Sand = 1,
    Land = 2,
    Road = 3,
    /// Sentinel used by fallback cells that the solver could not resolve
    Invalid = 4,
}

impl EdgeCode {
    /// All codes, in numeric order.
    pub const ALL: [EdgeCode; 5] = [
        EdgeCode::Water,
        EdgeCode::Sand,
        EdgeCode::Land,
        EdgeCode::Road,
        EdgeCode::Invalid,
    ];

    /// Numeric value as used by the terrain shader.
    pub fn value(self) -> u8 {
        self as u8
    }

    /// Look up a code from its numeric value.
    pub fn from_value(value: u8) -> Option<Self> {
        Self::ALL.get(value as usize).copied()
    }

    pub fn is_water(self) -> bool {
        self == EdgeCode::Water
    }
}

/// One of the four orthogonal neighbour directions on the tile grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// -X
    Left,
    /// +X
    Right,
    /// -Y
    Down,
    /// +Y
    Up,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Left,
        Direction::Right,
        Direction::Down,
        Direction::Up,
    ];

    /// Grid offset of the neighbour in this direction.
    pub fn offset(self) -> (i64, i64) {
        match self {
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
            Direction::Down => (0, -1),
            Direction::Up => (0, 1),
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
            Direction::Down => Direction::Up,
            Direction::Up => Direction::Down,
        }
    }

    /// Position in `Direction::ALL`, used to index per-direction tables.
    pub fn index(self) -> usize {
        self as usize
    }
}

/// A 3x3 terrain micro-pattern, indexed `[dx][dy]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TilePattern(pub [[EdgeCode; 3]; 3]);

impl TilePattern {
    /// Every sub-cell holds the same code.
    pub const fn uniform(code: EdgeCode) -> Self {
        Self([[code; 3]; 3])
    }

    /// Build from raw numeric codes, `[dx][dy]`.
    ///
    /// Returns `None` if any value is not a known edge code.
    pub fn from_values(values: [[u8; 3]; 3]) -> Option<Self> {
        let mut cells = [[EdgeCode::Water; 3]; 3];
        for (dx, column) in values.iter().enumerate() {
            for (dy, &value) in column.iter().enumerate() {
                cells[dx][dy] = EdgeCode::from_value(value)?;
            }
        }
        Some(Self(cells))
    }

    /// Code at sub-cell (dx, dy).
    pub fn get(&self, dx: usize, dy: usize) -> EdgeCode {
        self.0[dx][dy]
    }

    /// The three codes along one side, ordered by increasing x or y.
    pub fn side(&self, direction: Direction) -> [EdgeCode; 3] {
        match direction {
            Direction::Left => self.0[0],
            Direction::Right => self.0[2],
            Direction::Down => [self.0[0][0], self.0[1][0], self.0[2][0]],
            Direction::Up => [self.0[0][2], self.0[1][2], self.0[2][2]],
        }
    }

    /// Whether `neighbor`, placed in `direction` from this tile, fits along
    /// the shared side.
    pub fn fits(&self, direction: Direction, neighbor: &TilePattern) -> bool {
        self.side(direction) == neighbor.side(direction.opposite())
    }

    /// Whether any sub-cell holds the given code.
    pub fn contains(&self, code: EdgeCode) -> bool {
        self.0.iter().flatten().any(|&c| c == code)
    }
}
