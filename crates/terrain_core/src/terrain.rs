//! End-to-end terrain generation: solve a tile grid, then mesh it.

use bevy::log::info;

use crate::grid::{SeedGrid, TileGrid};
use crate::height::HeightField;
use crate::rng::StdRandom;
use crate::solver::{solve, Solution, SolveError, SolverConfig, DEFAULT_MAX_ITERATIONS};
use crate::terrain_mesh::{build_mesh, TerrainMesh};
use crate::tile::TileId;
use crate::tileset::TileSet;

/// Grid size, random seed and iteration cap for one generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerrainConfig {
    pub width: usize,
    pub height: usize,
    /// Seed of the `StdRandom` driving tile choices
    pub seed: u64,
    pub max_iterations: usize,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            width: 20,
            height: 20,
            seed: 0,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl TerrainConfig {
    /// Set the grid size. The iteration cap is raised to at least one
    /// collapse per cell so larger grids can still converge.
    pub fn with_size(mut self, width: usize, height: usize) -> Self {
        self.width = width;
        self.height = height;
        self.max_iterations = self.max_iterations.max(width * height);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn solver_config(&self) -> SolverConfig {
        SolverConfig::default().with_max_iterations(self.max_iterations)
    }

    /// A seed grid of this config's size with one tile placed at the centre.
    pub fn centred_seed(&self, tile: TileId) -> SeedGrid {
        let mut seed = SeedGrid::new(self.width, self.height);
        seed.set(self.width / 2, self.height / 2, tile);
        seed
    }
}

/// A generated terrain: the solved grid and its mesh.
#[derive(Debug, Clone)]
pub struct Terrain {
    pub config: TerrainConfig,
    pub solution: Solution,
    pub mesh: TerrainMesh,
}

impl Terrain {
    pub fn grid(&self) -> &TileGrid {
        &self.solution.grid
    }
}

/// Solve a grid for `config` and build its mesh over `heights`.
pub fn generate_terrain<H: HeightField>(
    config: &TerrainConfig,
    tileset: &TileSet,
    heights: &H,
    seed_grid: Option<&SeedGrid>,
) -> Result<Terrain, SolveError> {
    let mut rng = StdRandom::from_seed(config.seed);
    let solution = solve(
        config.width,
        config.height,
        tileset,
        seed_grid,
        &mut rng,
        &config.solver_config(),
    )?;

    let mesh = build_mesh(&solution.grid, tileset, heights);
    info!(
        "Generated {}x{} terrain: {} vertices, {} faces, {} fallback cells",
        config.width,
        config.height,
        mesh.vertex_count(),
        mesh.face_count(),
        solution.report.fallback_cells
    );

    Ok(Terrain {
        config: config.clone(),
        solution,
        mesh,
    })
}

/// Solve again with a new random seed, keeping the solved tiles of `terrain`
/// for which `keep(x, y, tile)` is true. `terrain` itself is left untouched.
pub fn regenerate<H, F>(
    terrain: &Terrain,
    tileset: &TileSet,
    heights: &H,
    seed: u64,
    keep: F,
) -> Result<Terrain, SolveError>
where
    H: HeightField,
    F: FnMut(usize, usize, TileId) -> bool,
{
    let seed_grid = SeedGrid::from_tile_grid(terrain.grid(), keep);
    let config = terrain.config.clone().with_seed(seed);
    generate_terrain(&config, tileset, heights, Some(&seed_grid))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::height::HeightSampler;
    use crate::solver::SolveOutcome;
    use crate::tileset::coastal;

    fn heights() -> HeightSampler {
        HeightSampler::flat(8, 8, 0.5).unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = TerrainConfig::default();
        assert_eq!((config.width, config.height), (20, 20));
        assert_eq!(config.seed, 0);
        assert_eq!(config.solver_config().max_iterations, 500);

        let seed = config.centred_seed(coastal::CORNER);
        assert_eq!(seed.get(10, 10), Some(coastal::CORNER));
        assert_eq!(seed.placed_count(), 1);
    }

    #[test]
    fn test_with_size_raises_iteration_cap() {
        let config = TerrainConfig::default().with_size(30, 30);
        assert_eq!(config.max_iterations, 900);

        // Small grids keep the default cap
        assert_eq!(TerrainConfig::default().with_size(4, 4).max_iterations, 500);

        // An explicit cap set afterwards still wins
        let capped = TerrainConfig::default()
            .with_size(30, 30)
            .with_max_iterations(10);
        assert_eq!(capped.max_iterations, 10);
    }

    #[test]
    fn test_large_grid_is_not_capped() {
        let tileset = TileSet::coastal();
        let config = TerrainConfig::default().with_size(30, 30).with_seed(5);
        let terrain = generate_terrain(&config, &tileset, &heights(), None).unwrap();
        let report = &terrain.solution.report;

        assert_ne!(
            report.outcome,
            SolveOutcome::IterationCap,
            "900-cell grid stopped at the cap: {:?}",
            report
        );
        assert!(report.iterations > 500);
        assert_eq!(report.iterations + report.fallback_cells, 900);
    }

    #[test]
    fn test_generate_builds_matching_mesh() {
        let tileset = TileSet::coastal();
        let config = TerrainConfig::default().with_size(6, 4).with_seed(3);
        let terrain = generate_terrain(&config, &tileset, &heights(), None).unwrap();

        assert_eq!(terrain.grid().width(), 6);
        assert_eq!(terrain.grid().height(), 4);
        assert_eq!(terrain.mesh.vertex_count(), 18 * 12);
        assert_eq!(terrain.mesh.tile_map, terrain.solution.grid);
    }

    #[test]
    fn test_generate_is_deterministic() {
        let tileset = TileSet::coastal();
        let config = TerrainConfig::default().with_size(8, 8).with_seed(42);
        let a = generate_terrain(&config, &tileset, &heights(), None).unwrap();
        let b = generate_terrain(&config, &tileset, &heights(), None).unwrap();

        assert_eq!(a.solution, b.solution);
        assert_eq!(a.mesh.faces, b.mesh.faces);
    }

    #[test]
    fn test_generate_rejects_empty_grid() {
        let tileset = TileSet::coastal();
        let config = TerrainConfig::default().with_size(0, 3);
        let err = generate_terrain(&config, &tileset, &heights(), None).unwrap_err();
        assert_eq!(
            err,
            SolveError::EmptyGrid {
                width: 0,
                height: 3
            }
        );
    }

    #[test]
    fn test_regenerate_keeps_selected_tiles() {
        let tileset = TileSet::coastal();
        let config = TerrainConfig::default().with_size(8, 6).with_seed(1);
        let first = generate_terrain(&config, &tileset, &heights(), None).unwrap();
        let before = first.solution.clone();

        // Keep the left half
        let second = regenerate(&first, &tileset, &heights(), 2, |x, _, _| x < 4).unwrap();

        for (x, y, cell) in first.grid().iter() {
            if x < 4 && !cell.is_fallback() {
                assert_eq!(
                    second.grid().get(x, y),
                    Some(cell),
                    "kept tile at ({}, {}) changed",
                    x,
                    y
                );
            }
        }
        assert_eq!(second.config.seed, 2);
        assert_eq!(first.solution, before, "previous terrain must not change");
    }

    #[test]
    fn test_regenerate_keep_all_is_stable() {
        let tileset = TileSet::coastal();
        let config = TerrainConfig::default().with_size(5, 5).with_seed(9);
        let first = generate_terrain(&config, &tileset, &heights(), None).unwrap();
        let second = regenerate(&first, &tileset, &heights(), 10, |_, _, _| true).unwrap();

        let kept = first.grid().cell_count() - first.grid().fallback_count();
        assert_eq!(second.solution.report.seeded_cells, kept);
        if first.solution.converged() {
            assert_eq!(second.grid(), first.grid());
            assert_eq!(second.solution.report.iterations, 0);
        }
    }
}
