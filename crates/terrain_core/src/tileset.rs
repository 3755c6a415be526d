//! Tile catalogs and adjacency affinity.
//!
//! A `TileSet` is static configuration: the ordered list of tile patterns
//! (index = `TileId`), an affinity matrix used to bias random selection, and
//! the fallback pattern written into cells the solver could not resolve.
//!
//! Structural compatibility between every pair of tiles is precomputed per
//! direction when the set is built, so the solver never compares patterns
//! directly.

use std::fmt;

use crate::tile::{Direction, EdgeCode, TileId, TilePattern};

/// Errors raised when building a tile set.
#[derive(Debug, Clone, PartialEq)]
pub enum TileSetError {
    /// No patterns were supplied
    Empty,
    /// Affinity matrix is not `len x len`
    AffinityShape {
        expected: usize,
        /// Index of the offending row, or `None` if the row count is wrong
        row: Option<usize>,
        actual: usize,
    },
}

impl fmt::Display for TileSetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TileSetError::Empty => write!(f, "tile set has no patterns"),
            TileSetError::AffinityShape {
                expected,
                row: None,
                actual,
            } => write!(
                f,
                "affinity matrix has {} rows, expected {}",
                actual, expected
            ),
            TileSetError::AffinityShape {
                expected,
                row: Some(row),
                actual,
            } => write!(
                f,
                "affinity row {} has {} entries, expected {}",
                row, actual, expected
            ),
        }
    }
}

impl std::error::Error for TileSetError {}

/// Ordered catalog of tile patterns plus an affinity table.
#[derive(Debug, Clone)]
pub struct TileSet {
    patterns: Vec<TilePattern>,
    /// `affinity[neighbor][candidate]`
    affinity: Vec<Vec<u32>>,
    fallback: TilePattern,
    /// `compatible[direction][tile][other]`: `other` may sit in `direction` from `tile`
    compatible: [Vec<Vec<bool>>; 4],
}

impl TileSet {
    /// Build a tile set from patterns and a square affinity matrix.
    ///
    /// `affinity[a][b]` is the weight added to candidate `b` for every solved
    /// neighbour holding tile `a`.
    pub fn new(patterns: Vec<TilePattern>, affinity: Vec<Vec<u32>>) -> Result<Self, TileSetError> {
        if patterns.is_empty() {
            return Err(TileSetError::Empty);
        }

        let n = patterns.len();
        if affinity.len() != n {
            return Err(TileSetError::AffinityShape {
                expected: n,
                row: None,
                actual: affinity.len(),
            });
        }
        if let Some((row, r)) = affinity.iter().enumerate().find(|(_, r)| r.len() != n) {
            return Err(TileSetError::AffinityShape {
                expected: n,
                row: Some(row),
                actual: r.len(),
            });
        }

        let compatible = Direction::ALL.map(|direction| {
            patterns
                .iter()
                .map(|tile| {
                    patterns
                        .iter()
                        .map(|other| tile.fits(direction, other))
                        .collect()
                })
                .collect()
        });

        Ok(Self {
            patterns,
            affinity,
            fallback: TilePattern::uniform(EdgeCode::Invalid),
            compatible,
        })
    }

    /// Build a tile set where every pair of tiles has the same affinity.
    pub fn with_uniform_affinity(
        patterns: Vec<TilePattern>,
        weight: u32,
    ) -> Result<Self, TileSetError> {
        let n = patterns.len();
        Self::new(patterns, vec![vec![weight; n]; n])
    }

    /// Replace the pattern written into unresolved cells.
    pub fn with_fallback(mut self, fallback: TilePattern) -> Self {
        self.fallback = fallback;
        self
    }

    /// Number of tiles.
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn patterns(&self) -> &[TilePattern] {
        &self.patterns
    }

    /// Pattern for a tile id. Panics if the id is out of range.
    pub fn pattern(&self, tile: TileId) -> &TilePattern {
        &self.patterns[tile]
    }

    /// Pattern used for cells the solver could not resolve.
    pub fn fallback(&self) -> &TilePattern {
        &self.fallback
    }

    /// Weight added to `candidate` for a solved neighbour holding `neighbor`.
    pub fn affinity(&self, neighbor: TileId, candidate: TileId) -> u32 {
        self.affinity[neighbor][candidate]
    }

    /// Whether `other` may be placed in `direction` from `tile`.
    pub fn is_compatible(&self, tile: TileId, direction: Direction, other: TileId) -> bool {
        self.compatible[direction.index()][tile][other]
    }

    /// Look up a tile id by pattern.
    pub fn find(&self, pattern: &TilePattern) -> Option<TileId> {
        self.patterns.iter().position(|p| p == pattern)
    }

    /// The coastal catalog: water, land, sand transitions and roads.
    ///
    /// Affinity favours land (100) over water (10) and road pieces (5), with
    /// transitions weighted 1, whatever the neighbour is.
    pub fn coastal() -> Self {
        let patterns: Vec<TilePattern> = COASTAL_TILES
            .iter()
            .filter_map(|values| TilePattern::from_values(*values))
            .collect();

        let row: Vec<u32> = COASTAL_AFFINITY[..patterns.len()].to_vec();
        let affinity = vec![row; patterns.len()];

        match Self::new(patterns, affinity) {
            Ok(tileset) => tileset,
            Err(e) => unreachable!("built-in coastal tile set is malformed: {}", e),
        }
    }
}

/// Tile ids of notable tiles in `TileSet::coastal()`.
pub mod coastal {
    use crate::tile::TileId;

    pub const WATER: TileId = 0;
    pub const LAND: TileId = 1;
    /// Convex corner with water along its left (-x) and top (+y) sides
    pub const CORNER: TileId = 7;
    pub const ROAD_CROSS: TileId = 14;
    pub const ROAD_X: TileId = 15;
    pub const ROAD_Y: TileId = 16;
}

/// Raw coastal patterns, `[dx][dy]`, codes 0 water, 1 sand, 2 land, 3 road.
const COASTAL_TILES: [[[u8; 3]; 3]; 25] = [
    // Full
    [[0, 0, 0], [0, 0, 0], [0, 0, 0]],
    [[2, 2, 2], [2, 2, 2], [2, 2, 2]],
    // Straight transitions
    [[0, 0, 0], [1, 1, 1], [2, 2, 2]],
    [[2, 2, 2], [1, 1, 1], [0, 0, 0]],
    [[0, 1, 2], [0, 1, 2], [0, 1, 2]],
    [[2, 1, 0], [2, 1, 0], [2, 1, 0]],
    // Convex corners
    [[0, 0, 0], [0, 1, 1], [0, 1, 2]],
    [[0, 0, 0], [1, 1, 0], [2, 1, 0]],
    [[0, 1, 2], [0, 1, 1], [0, 0, 0]],
    [[2, 1, 0], [1, 1, 0], [0, 0, 0]],
    // Concave corners
    [[2, 2, 2], [2, 1, 1], [2, 1, 0]],
    [[2, 2, 2], [1, 1, 2], [0, 1, 2]],
    [[2, 1, 0], [2, 1, 1], [2, 2, 2]],
    [[0, 1, 2], [1, 1, 2], [2, 2, 2]],
    // Roads
    [[2, 3, 2], [3, 3, 3], [2, 3, 2]],
    [[2, 3, 2], [2, 3, 2], [2, 3, 2]],
    [[2, 2, 2], [3, 3, 3], [2, 2, 2]],
    // Road ends
    [[2, 3, 2], [2, 3, 2], [2, 2, 2]],
    [[2, 2, 2], [2, 3, 2], [2, 3, 2]],
    [[2, 2, 2], [2, 3, 3], [2, 2, 2]],
    [[2, 2, 2], [3, 3, 2], [2, 2, 2]],
    // Road turns
    [[2, 3, 2], [3, 3, 2], [2, 2, 2]],
    [[2, 2, 2], [3, 3, 2], [2, 3, 2]],
    [[2, 3, 2], [2, 3, 3], [2, 2, 2]],
    [[2, 2, 2], [2, 3, 3], [2, 3, 2]],
];

/// Affinity towards each candidate id; every neighbour uses the same row.
const COASTAL_AFFINITY: [u32; 25] = [
    10, 100, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 5, 5, 5, 5, 5, 5, 5, 5, 5, 5, 1,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coastal_catalog() {
        let tileset = TileSet::coastal();
        assert_eq!(tileset.len(), 25);
        assert_eq!(
            *tileset.pattern(coastal::WATER),
            TilePattern::uniform(EdgeCode::Water)
        );
        assert_eq!(
            *tileset.pattern(coastal::LAND),
            TilePattern::uniform(EdgeCode::Land)
        );
        assert_eq!(tileset.affinity(coastal::WATER, coastal::LAND), 100);
        assert_eq!(tileset.affinity(coastal::LAND, coastal::WATER), 10);
        assert_eq!(tileset.affinity(3, coastal::ROAD_CROSS), 5);
        assert_eq!(*tileset.fallback(), TilePattern::uniform(EdgeCode::Invalid));
    }

    #[test]
    fn test_coastal_patterns_are_unique() {
        let tileset = TileSet::coastal();
        for (id, pattern) in tileset.patterns().iter().enumerate() {
            assert_eq!(tileset.find(pattern), Some(id), "duplicate pattern {}", id);
        }
    }

    #[test]
    fn test_compatibility_table_matches_patterns() {
        let tileset = TileSet::coastal();
        for a in 0..tileset.len() {
            for b in 0..tileset.len() {
                for direction in Direction::ALL {
                    assert_eq!(
                        tileset.is_compatible(a, direction, b),
                        tileset.pattern(a).fits(direction, tileset.pattern(b))
                    );
                    assert_eq!(
                        tileset.is_compatible(a, direction, b),
                        tileset.is_compatible(b, direction.opposite(), a)
                    );
                }
            }
        }
    }

    #[test]
    fn test_road_connectivity() {
        let tileset = TileSet::coastal();
        // A road running along x continues to the right, one running along y does not
        assert!(tileset.is_compatible(
            coastal::ROAD_X,
            Direction::Right,
            coastal::ROAD_CROSS
        ));
        assert!(!tileset.is_compatible(
            coastal::ROAD_Y,
            Direction::Right,
            coastal::ROAD_CROSS
        ));
        assert!(tileset.is_compatible(
            coastal::ROAD_Y,
            Direction::Up,
            coastal::ROAD_Y
        ));
    }

    #[test]
    fn test_water_never_touches_land_directly() {
        let tileset = TileSet::coastal();
        for direction in Direction::ALL {
            assert!(!tileset.is_compatible(coastal::WATER, direction, coastal::LAND));
        }
    }

    #[test]
    fn test_empty_tileset_rejected() {
        assert_eq!(
            TileSet::new(Vec::new(), Vec::new()).unwrap_err(),
            TileSetError::Empty
        );
    }

    #[test]
    fn test_affinity_shape_validated() {
        let patterns = vec![
            TilePattern::uniform(EdgeCode::Water),
            TilePattern::uniform(EdgeCode::Land),
        ];

        let err = TileSet::new(patterns.clone(), vec![vec![1, 1]]).unwrap_err();
        assert_eq!(
            err,
            TileSetError::AffinityShape {
                expected: 2,
                row: None,
                actual: 1
            }
        );

        let err = TileSet::new(patterns, vec![vec![1, 1], vec![1]]).unwrap_err();
        assert_eq!(
            err,
            TileSetError::AffinityShape {
                expected: 2,
                row: Some(1),
                actual: 1
            }
        );
        assert_eq!(err.to_string(), "affinity row 1 has 1 entries, expected 2");
    }

    #[test]
    fn test_custom_fallback() {
        let tileset = TileSet::with_uniform_affinity(vec![TilePattern::uniform(EdgeCode::Land)], 1)
            .unwrap()
            .with_fallback(TilePattern::uniform(EdgeCode::Water));
        assert_eq!(*tileset.fallback(), TilePattern::uniform(EdgeCode::Water));
    }
}
