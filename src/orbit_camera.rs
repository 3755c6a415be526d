//! Orbit camera for inspecting the terrain.
//!
//! - Left mouse drag: rotate around the terrain centre
//! - Scroll wheel: zoom in/out

use bevy::input::mouse::{AccumulatedMouseMotion, AccumulatedMouseScroll};
use bevy::prelude::*;

#[derive(Component)]
pub struct OrbitCamera {
    pub target: Vec3,
    pub distance: f32,
    /// Horizontal angle (radians)
    pub azimuth: f32,
    /// Vertical angle (radians), kept short of the poles
    pub elevation: f32,
    pub sensitivity: f32,
    pub zoom_sensitivity: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            distance: 14.0,
            azimuth: 0.0,
            elevation: 0.9,
            sensitivity: 0.005,
            zoom_sensitivity: 0.5,
        }
    }
}

impl OrbitCamera {
    pub fn new(distance: f32) -> Self {
        Self {
            distance,
            ..default()
        }
    }

    pub fn position(&self) -> Vec3 {
        let horizontal = self.distance * self.elevation.cos();
        self.target
            + Vec3::new(
                horizontal * self.azimuth.sin(),
                self.distance * self.elevation.sin(),
                horizontal * self.azimuth.cos(),
            )
    }

    pub fn transform(&self) -> Transform {
        Transform::from_translation(self.position()).looking_at(self.target, Vec3::Y)
    }
}

fn orbit_camera_system(
    mouse_button: Res<ButtonInput<MouseButton>>,
    mouse_motion: Res<AccumulatedMouseMotion>,
    mouse_scroll: Res<AccumulatedMouseScroll>,
    mut query: Query<(&mut OrbitCamera, &mut Transform)>,
) {
    for (mut orbit, mut transform) in query.iter_mut() {
        if mouse_button.pressed(MouseButton::Left) {
            let delta = mouse_motion.delta;
            orbit.azimuth -= delta.x * orbit.sensitivity;
            orbit.elevation = (orbit.elevation + delta.y * orbit.sensitivity).clamp(0.05, 1.5);
        }

        let scroll = mouse_scroll.delta.y;
        if scroll != 0.0 {
            orbit.distance = (orbit.distance - scroll * orbit.zoom_sensitivity).clamp(2.0, 60.0);
        }

        *transform = orbit.transform();
    }
}

pub struct OrbitCameraPlugin;

impl Plugin for OrbitCameraPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, orbit_camera_system);
    }
}
