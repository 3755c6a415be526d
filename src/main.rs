//! Terrain viewer.
//!
//! Usage: `tile_terrain [heightmap.png]`. Without an argument a fractal noise
//! heightmap is generated.
//!
//! - Space: new terrain with a fresh random seed
//! - L: new terrain keeping every full-land tile of the current one

mod heightmap;
mod orbit_camera;

use std::f32::consts::FRAC_PI_2;
use std::path::PathBuf;

use bevy::prelude::*;
use terrain_core::{
    coastal, generate_terrain, regenerate, HeightSampler, StdRandom, Terrain, TerrainConfig,
    TerrainRng, TileSet,
};

use heightmap::{fbm_heightmap, FbmParams};
use orbit_camera::{OrbitCamera, OrbitCameraPlugin};

/// World size of the unit-square terrain mesh.
const TERRAIN_SCALE: f32 = 10.0;

/// Optional heightmap image given on the command line.
#[derive(Resource)]
struct HeightmapSource(Option<PathBuf>);

#[derive(Resource)]
struct TerrainState {
    tileset: TileSet,
    heights: HeightSampler,
    terrain: Terrain,
    /// Draws the solver seed of each regeneration
    seeds: StdRandom,
}

#[derive(Component)]
struct TerrainSurface;

fn main() {
    let source = HeightmapSource(std::env::args().nth(1).map(PathBuf::from));

    App::new()
        .add_plugins(DefaultPlugins)
        .add_plugins(OrbitCameraPlugin)
        .insert_resource(ClearColor(Color::srgb(0.05, 0.05, 0.08)))
        .insert_resource(source)
        .add_systems(Startup, setup)
        .add_systems(Update, regenerate_on_key)
        .run();
}

fn setup(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    source: Res<HeightmapSource>,
) -> Result {
    let config = TerrainConfig::default();
    let tileset = TileSet::coastal();

    let heights = match &source.0 {
        Some(path) => {
            info!("Loading heightmap from {}", path.display());
            HeightSampler::open(path)?
        }
        // One height sample per mesh vertex
        None => fbm_heightmap(
            config.width * 3,
            config.height * 3,
            config.seed as u32,
            &FbmParams::default(),
        )?,
    };

    let seed_grid = config.centred_seed(coastal::CORNER);
    let terrain = generate_terrain(&config, &tileset, &heights, Some(&seed_grid))?;
    log_report(&terrain);

    // Vertex colors carry the tile shading
    let material = materials.add(StandardMaterial {
        base_color: Color::WHITE,
        perceptual_roughness: 0.9,
        ..default()
    });

    commands.spawn((
        Mesh3d(meshes.add(terrain.mesh.to_bevy_mesh())),
        MeshMaterial3d(material),
        terrain_transform(),
        TerrainSurface,
    ));

    let orbit = OrbitCamera::default();
    commands.spawn((Camera3d::default(), orbit.transform(), orbit));

    commands.spawn((
        DirectionalLight {
            illuminance: 8000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(4.0, 10.0, 6.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    commands.insert_resource(TerrainState {
        tileset,
        heights,
        terrain,
        seeds: StdRandom::from_entropy(),
    });

    Ok(())
}

/// The mesh is built z-up; lay it flat in Bevy's y-up world.
fn terrain_transform() -> Transform {
    Transform::from_rotation(Quat::from_rotation_x(-FRAC_PI_2)).with_scale(Vec3::splat(TERRAIN_SCALE))
}

fn regenerate_on_key(
    mut commands: Commands,
    keys: Res<ButtonInput<KeyCode>>,
    mut state: ResMut<TerrainState>,
    mut meshes: ResMut<Assets<Mesh>>,
    surfaces: Query<Entity, With<TerrainSurface>>,
) -> Result {
    let keep_land = keys.just_pressed(KeyCode::KeyL);
    if !keep_land && !keys.just_pressed(KeyCode::Space) {
        return Ok(());
    }

    let seed = state.seeds.next_u64();

    let next = if keep_land {
        regenerate(
            &state.terrain,
            &state.tileset,
            &state.heights,
            seed,
            |_, _, tile| tile == coastal::LAND,
        )?
    } else {
        let config = state.terrain.config.clone().with_seed(seed);
        let seed_grid = config.centred_seed(coastal::CORNER);
        generate_terrain(&config, &state.tileset, &state.heights, Some(&seed_grid))?
    };
    log_report(&next);

    for entity in &surfaces {
        commands
            .entity(entity)
            .insert(Mesh3d(meshes.add(next.mesh.to_bevy_mesh())));
    }
    state.terrain = next;

    Ok(())
}

fn log_report(terrain: &Terrain) {
    let report = &terrain.solution.report;
    info!(
        "Seed {}: {:?} after {} collapses ({} seeded, {} fallback, {} uniform picks)",
        terrain.config.seed,
        report.outcome,
        report.iterations,
        report.seeded_cells,
        report.fallback_cells,
        report.uniform_choices
    );
}
