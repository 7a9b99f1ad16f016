use bevy::prelude::*;

use crate::components::HeadlessMode;
use crate::runtime::ActiveRun;

#[derive(Resource, Clone)]
pub struct CameraConfig {
    pub follow_speed: f32,
    pub offset: Vec2,
    pub deadzone: Vec2,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            follow_speed: 0.12,
            offset: Vec2::ZERO,
            deadzone: Vec2::new(6.0, 8.0),
        }
    }
}

#[derive(Resource, Default)]
struct CameraRuntimeState {
    base: Vec2,
    initialized: bool,
}

#[derive(Component)]
pub struct MainCamera;

pub struct CameraPlugin;

impl Plugin for CameraPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(CameraConfig::default())
            .insert_resource(CameraRuntimeState::default())
            .add_systems(Startup, spawn_camera)
            .add_systems(Update, camera_follow);
    }
}

fn spawn_camera(mut commands: Commands, headless: Res<HeadlessMode>) {
    if headless.0 {
        return;
    }
    commands.spawn((MainCamera, Camera2d, Transform::from_xyz(0.0, 0.0, 100.0)));
}

/// Ease toward the run's clamped camera target. The run does the level
/// bounds clamping; this side only smooths and holds small jitters inside
/// the deadzone. Render space is y-up, so the vertical center maps to
/// pixel_height / 2 either way.
fn camera_follow(
    time: Res<Time>,
    config: Res<CameraConfig>,
    active: Option<Res<ActiveRun>>,
    mut runtime: ResMut<CameraRuntimeState>,
    mut camera_query: Query<&mut Transform, With<MainCamera>>,
) {
    let Ok(mut cam_transform) = camera_query.get_single_mut() else {
        return;
    };
    let Some(active) = active else {
        return;
    };
    let grid = &active.run.grid;
    let target = Vec2::new(active.run.camera_x, grid.pixel_height() / 2.0) + config.offset;

    if !runtime.initialized {
        runtime.initialized = true;
        runtime.base = target;
    } else {
        let alpha = (config.follow_speed * time.delta_secs() * 60.0).clamp(0.0, 1.0);
        let held = apply_deadzone(runtime.base, target, config.deadzone);
        runtime.base = runtime.base.lerp(held, alpha);
    }
    cam_transform.translation.x = runtime.base.x;
    cam_transform.translation.y = runtime.base.y;
}

fn apply_deadzone(current: Vec2, mut target: Vec2, deadzone: Vec2) -> Vec2 {
    if (target.x - current.x).abs() < deadzone.x {
        target.x = current.x;
    }
    if (target.y - current.y).abs() < deadzone.y {
        target.y = current.y;
    }
    target
}
