use bevy::prelude::*;

use crate::components::HeadlessMode;
use crate::events::{BusEvent, EventFeed};
use crate::run::RunEvent;
use crate::runtime::ActiveRun;
use crate::tiles::TILE_SIZE;

/// Cosmetic burst quads keyed off the event feed. The run never reads these
/// back; headless mode still spawns and ages them so tests can observe the
/// consumer without a render surface.
pub struct ParticlesPlugin;

#[derive(Resource, Default)]
struct ParticleEventCursor {
    last_frame: u64,
    processed_in_frame: usize,
}

/// Position lives here rather than on a Transform so headless runs still
/// track and cull particles.
#[derive(Component)]
struct ParticleInstance {
    position: Vec2,
    velocity: Vec2,
    age: f32,
    lifetime: f32,
    color_start: Vec4,
    color_end: Vec4,
    size_start: f32,
    size_end: f32,
    gravity_multiplier: f32,
}

struct BurstSpec {
    count: u32,
    color_start: [f32; 4],
    color_end: [f32; 4],
    size_start: f32,
    size_end: f32,
    lifetime: f32,
    speed_min: f32,
    speed_max: f32,
    gravity_multiplier: f32,
}

fn brick_burst() -> BurstSpec {
    BurstSpec {
        count: 10,
        color_start: [0.65, 0.32, 0.2, 1.0],
        color_end: [0.4, 0.22, 0.15, 0.0],
        size_start: 4.0,
        size_end: 2.0,
        lifetime: 0.55,
        speed_min: 50.0,
        speed_max: 140.0,
        gravity_multiplier: 0.6,
    }
}

fn stomp_burst() -> BurstSpec {
    BurstSpec {
        count: 8,
        color_start: [0.8, 0.8, 0.85, 0.9],
        color_end: [0.8, 0.8, 0.85, 0.0],
        size_start: 3.0,
        size_end: 6.0,
        lifetime: 0.35,
        speed_min: 20.0,
        speed_max: 60.0,
        gravity_multiplier: 0.05,
    }
}

fn coin_burst() -> BurstSpec {
    BurstSpec {
        count: 6,
        color_start: [0.95, 0.85, 0.25, 1.0],
        color_end: [1.0, 0.95, 0.6, 0.0],
        size_start: 3.0,
        size_end: 1.0,
        lifetime: 0.4,
        speed_min: 30.0,
        speed_max: 90.0,
        gravity_multiplier: 0.15,
    }
}

fn flame_burst() -> BurstSpec {
    BurstSpec {
        count: 12,
        color_start: [1.0, 0.55, 0.1, 1.0],
        color_end: [0.7, 0.1, 0.05, 0.0],
        size_start: 4.0,
        size_end: 1.5,
        lifetime: 0.45,
        speed_min: 30.0,
        speed_max: 110.0,
        gravity_multiplier: -0.1,
    }
}

impl Plugin for ParticlesPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ParticleEventCursor>().add_systems(
            Update,
            (spawn_bursts_from_events, update_particles)
                .chain()
                .run_if(resource_exists::<ActiveRun>),
        );
    }
}

fn spawn_bursts_from_events(
    mut commands: Commands,
    feed: Res<EventFeed>,
    active: Res<ActiveRun>,
    headless: Res<HeadlessMode>,
    mut cursor: ResMut<ParticleEventCursor>,
) {
    let level_h = active.run.grid.pixel_height();
    let mut count_in_frame = 0usize;
    for entry in feed.iter() {
        if entry.frame < cursor.last_frame {
            continue;
        }
        if entry.frame == cursor.last_frame {
            count_in_frame = count_in_frame.saturating_add(1);
            if count_in_frame <= cursor.processed_in_frame {
                continue;
            }
        } else {
            count_in_frame = 1;
        }

        let burst = match &entry.event {
            BusEvent::Run(RunEvent::BrickBreak { tx, ty }) => {
                Some((cell_pos(*tx, *ty, level_h), brick_burst()))
            }
            BusEvent::Run(RunEvent::CoinPop { tx, ty }) => {
                Some((cell_pos(*tx, *ty, level_h), coin_burst()))
            }
            BusEvent::Run(RunEvent::Stomp { x, y }) => {
                Some((point_pos(*x, *y, level_h), stomp_burst()))
            }
            BusEvent::Run(RunEvent::EnemyBurned { x, y }) => {
                Some((point_pos(*x, *y, level_h), flame_burst()))
            }
            _ => None,
        };
        if let Some((at, spec)) = burst {
            spawn_burst(&mut commands, at, &spec, headless.0);
        }

        cursor.last_frame = entry.frame;
        cursor.processed_in_frame = count_in_frame;
    }
}

/// Events place bursts at either a cell (tx, ty) or a point (x, y) in run
/// space; both convert to y-up render space here.
fn cell_pos(tx: i32, ty: i32, level_h: f32) -> Vec2 {
    Vec2::new(
        tx as f32 * TILE_SIZE + TILE_SIZE / 2.0,
        level_h - (ty as f32 * TILE_SIZE + TILE_SIZE / 2.0),
    )
}

fn point_pos(x: f32, y: f32, level_h: f32) -> Vec2 {
    Vec2::new(x, level_h - y)
}

fn spawn_burst(commands: &mut Commands, at: Vec2, spec: &BurstSpec, headless: bool) {
    let count = spec.count.clamp(1, 256);
    for _ in 0..count {
        let angle = rand::random::<f32>() * std::f32::consts::TAU;
        let speed = spec.speed_min + rand::random::<f32>() * (spec.speed_max - spec.speed_min);
        let velocity = Vec2::new(angle.cos(), angle.sin()) * speed.max(0.0);

        let mut entity = commands.spawn(ParticleInstance {
            position: at,
            velocity,
            age: 0.0,
            lifetime: spec.lifetime.max(0.01),
            color_start: Vec4::from_array(spec.color_start),
            color_end: Vec4::from_array(spec.color_end),
            size_start: spec.size_start.max(0.1),
            size_end: spec.size_end.max(0.1),
            gravity_multiplier: spec.gravity_multiplier,
        });

        if !headless {
            entity.insert((
                Sprite::from_color(
                    Color::srgba(
                        spec.color_start[0],
                        spec.color_start[1],
                        spec.color_start[2],
                        spec.color_start[3],
                    ),
                    Vec2::splat(spec.size_start.max(0.1)),
                ),
                Transform::from_xyz(at.x, at.y, 200.0),
            ));
        }
    }
}

fn update_particles(
    mut commands: Commands,
    time: Res<Time>,
    mut query: Query<(
        Entity,
        &mut ParticleInstance,
        Option<&mut Sprite>,
        Option<&mut Transform>,
    )>,
) {
    let dt = time.delta_secs();
    for (entity, mut particle, sprite, transform) in query.iter_mut() {
        particle.age += dt;
        if particle.age >= particle.lifetime.max(0.01) {
            commands.entity(entity).despawn();
            continue;
        }

        let gravity = -980.0 * particle.gravity_multiplier * dt;
        particle.velocity.y += gravity;
        let step = particle.velocity * dt;
        particle.position += step;

        if let Some(mut transform) = transform {
            transform.translation.x = particle.position.x;
            transform.translation.y = particle.position.y;
        }
        if let Some(mut sprite) = sprite {
            let t = (particle.age / particle.lifetime.max(0.01)).clamp(0.0, 1.0);
            let color = particle.color_start.lerp(particle.color_end, t);
            let size = particle.size_start + (particle.size_end - particle.size_start) * t;
            sprite.color = Color::srgba(color.x, color.y, color.z, color.w);
            sprite.custom_size = Some(Vec2::splat(size.max(0.1)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::GameConfig;
    use crate::level::LevelData;

    fn test_app() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.insert_resource(HeadlessMode(true));
        app.insert_resource(EventFeed::default());
        app.insert_resource(ActiveRun::new(
            LevelData::demo(),
            &GameConfig::default(),
        ));
        app.add_plugins(ParticlesPlugin);
        app
    }

    fn live_particles(app: &mut App) -> usize {
        app.world_mut()
            .query::<&ParticleInstance>()
            .iter(app.world())
            .count()
    }

    #[test]
    fn brick_break_spawns_one_burst_and_only_once() {
        let mut app = test_app();
        {
            let mut feed = app.world_mut().resource_mut::<EventFeed>();
            feed.advance_frame();
            feed.publish(BusEvent::Run(RunEvent::BrickBreak { tx: 4, ty: 3 }), None);
        }
        app.update();
        let after_first = live_particles(&mut app);
        assert_eq!(after_first, 10);

        // Same entry is still in the feed; the cursor must not replay it.
        app.update();
        assert_eq!(live_particles(&mut app), after_first);
    }

    #[test]
    fn events_without_a_burst_mapping_spawn_nothing() {
        let mut app = test_app();
        {
            let mut feed = app.world_mut().resource_mut::<EventFeed>();
            feed.advance_frame();
            feed.publish(BusEvent::Run(RunEvent::Jump { x: 10.0, y: 20.0 }), None);
        }
        app.update();
        assert_eq!(live_particles(&mut app), 0);
    }

    #[test]
    fn expired_particles_are_despawned() {
        let mut app = test_app();
        app.world_mut().spawn(ParticleInstance {
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            age: 1.0,
            lifetime: 0.5,
            color_start: Vec4::ONE,
            color_end: Vec4::ZERO,
            size_start: 4.0,
            size_end: 1.0,
            gravity_multiplier: 0.0,
        });
        app.update();
        assert_eq!(live_particles(&mut app), 0);
    }
}
