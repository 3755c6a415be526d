//! Tiled terrain synthesis.
//!
//! This crate provides:
//! - A greedy, non-backtracking tile constraint solver (Wave Function Collapse style)
//! - The coastal tile catalog and its adjacency affinity
//! - Heightmap sampling from raw buffers and image files
//! - Conversion of a solved tile grid into a renderable Bevy mesh

pub mod grid;
pub mod height;
pub mod rng;
pub mod solver;
pub mod terrain;
pub mod terrain_mesh;
pub mod tile;
pub mod tileset;


pub use grid::{GridCell, SeedGrid, TileGrid};
pub use height::{HeightField, HeightSampler, HeightmapError};
pub use rng::{SequenceRandom, StdRandom, TerrainRng};
pub use solver::{
    solve, weighted_choice, ConstraintSolver, Solution, SolveError, SolveOutcome, SolveReport,
    SolverConfig, DEFAULT_MAX_ITERATIONS,
};
pub use terrain::{generate_terrain, regenerate, Terrain, TerrainConfig};
pub use terrain_mesh::{
    build_mesh, EdgeRaster, MeshBuilder, TerrainMesh, ATTRIBUTE_TILE_CODE, WATER_LEVEL,
};
pub use tile::{Direction, EdgeCode, TileId, TilePattern};
pub use tileset::{coastal, TileSet, TileSetError};
