use std::collections::{HashMap, HashSet};

use bevy::prelude::*;

use crate::entity::{CollectibleKind, EffectKind, Entity as RunEntity, EntityKind, Form};
use crate::run::RunStatus;
use crate::runtime::ActiveRun;
use crate::tiles::{Tile, TILE_SIZE};

/// Draws the run directly from its state every frame: one colored quad per
/// non-empty tile and per live entity, plus the HUD text block. The
/// simulation never sees any of these Bevy entities.
pub struct RenderPlugin;

#[derive(Component)]
struct TileView;

#[derive(Component)]
struct EntityView;

#[derive(Component)]
struct HudText;

#[derive(Resource, Default)]
struct TileViewIndex {
    cells: HashMap<(i32, i32), (Entity, u8)>,
}

#[derive(Resource, Default)]
struct EntityViewIndex {
    views: HashMap<u64, Entity>,
}

impl Plugin for RenderPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<TileViewIndex>()
            .init_resource::<EntityViewIndex>()
            .add_systems(Startup, setup_hud)
            .add_systems(
                Update,
                (sync_tile_layer, sync_entity_views, update_hud)
                    .run_if(resource_exists::<ActiveRun>),
            );
    }
}

/// Run space is y-down with top-left anchored rects; render space is y-up
/// with centered sprites.
fn cell_center_bevy(tx: i32, ty: i32, level_height: f32) -> Vec2 {
    Vec2::new(
        tx as f32 * TILE_SIZE + TILE_SIZE / 2.0,
        level_height - (ty as f32 * TILE_SIZE + TILE_SIZE / 2.0),
    )
}

fn entity_center_bevy(entity: &RunEntity, level_height: f32) -> Vec2 {
    Vec2::new(entity.center_x(), level_height - entity.center_y())
}

fn tile_color(tile: Tile) -> Option<Color> {
    let color = match tile {
        Tile::Empty => return None,
        Tile::Ground => Color::srgb(0.35, 0.25, 0.18),
        Tile::Brick => Color::srgb(0.65, 0.32, 0.2),
        Tile::QuestionBlock => Color::srgb(0.9, 0.75, 0.2),
        Tile::CoinBlock => Color::srgb(0.8, 0.68, 0.3),
        Tile::HardBlock => Color::srgb(0.5, 0.5, 0.55),
        Tile::PipeLeft => Color::srgb(0.15, 0.6, 0.25),
        Tile::PipeRight => Color::srgb(0.12, 0.52, 0.22),
        Tile::Spike => Color::srgb(0.85, 0.2, 0.2),
        Tile::VineBase => Color::srgb(0.25, 0.55, 0.2),
        Tile::Goal => Color::srgb(0.2, 0.85, 0.4),
    };
    Some(color)
}

fn entity_color(entity: &RunEntity, tick: u64) -> Color {
    match &entity.kind {
        EntityKind::Player(state) => {
            let base = match state.character {
                crate::character::CharacterId::Ember => Color::srgb(0.95, 0.45, 0.15),
                crate::character::CharacterId::Specter => Color::srgb(0.6, 0.7, 0.95),
                crate::character::CharacterId::Thorn => Color::srgb(0.35, 0.75, 0.3),
                crate::character::CharacterId::Warden => Color::srgb(0.75, 0.7, 0.3),
            };
            if state.phasing {
                base.with_alpha(0.45)
            } else if state.shielded {
                Color::srgb(0.45, 0.75, 0.95)
            } else if state.invuln_ticks > 0 && (tick / 4) % 2 == 1 {
                // Mercy-window flicker.
                base.with_alpha(0.35)
            } else {
                base
            }
        }
        EntityKind::Enemy(_) => Color::srgb(0.55, 0.2, 0.25),
        EntityKind::Collectible(CollectibleKind::Coin) => Color::srgb(0.95, 0.85, 0.25),
        EntityKind::Collectible(CollectibleKind::SuperMushroom) => Color::srgb(0.9, 0.3, 0.25),
        EntityKind::Effect(EffectKind::Flame) => Color::srgb(1.0, 0.55, 0.1),
        EntityKind::Effect(EffectKind::Vine) => Color::srgb(0.3, 0.65, 0.25),
        EntityKind::Goal => Color::srgb(0.25, 0.9, 0.45),
    }
}

fn entity_z(kind: &EntityKind) -> f32 {
    match kind {
        EntityKind::Player(_) => 10.0,
        EntityKind::Enemy(_) => 8.0,
        EntityKind::Collectible(_) => 7.0,
        EntityKind::Effect(_) => 6.0,
        EntityKind::Goal => 4.0,
    }
}

/// Spawns quads for non-empty cells on first sight, then restyles or drops
/// cells the simulation rewrites (block strikes, brick breaks, restarts).
fn sync_tile_layer(
    mut commands: Commands,
    active: Res<ActiveRun>,
    mut index: ResMut<TileViewIndex>,
) {
    let grid = &active.run.grid;
    let level_h = grid.pixel_height();
    for ty in 0..grid.height as i32 {
        for tx in 0..grid.width as i32 {
            let id = grid.get_tile(tx, ty);
            match index.cells.get(&(tx, ty)).copied() {
                Some((_, cached)) if cached == id => {}
                Some((view, _)) => {
                    if let Some(color) = tile_color(Tile::from_u8(id)) {
                        commands
                            .entity(view)
                            .insert(Sprite::from_color(color, Vec2::splat(TILE_SIZE)));
                        index.cells.insert((tx, ty), (view, id));
                    } else {
                        commands.entity(view).despawn();
                        index.cells.remove(&(tx, ty));
                    }
                }
                None => {
                    let Some(color) = tile_color(Tile::from_u8(id)) else {
                        continue;
                    };
                    let center = cell_center_bevy(tx, ty, level_h);
                    let view = commands
                        .spawn((
                            TileView,
                            Sprite::from_color(color, Vec2::splat(TILE_SIZE)),
                            Transform::from_xyz(center.x, center.y, 0.0),
                        ))
                        .id();
                    index.cells.insert((tx, ty), (view, id));
                }
            }
        }
    }
}

fn sync_entity_views(
    mut commands: Commands,
    active: Res<ActiveRun>,
    mut index: ResMut<EntityViewIndex>,
    mut views: Query<(&mut Sprite, &mut Transform), With<EntityView>>,
) {
    let run = &active.run;
    let level_h = run.grid.pixel_height();

    for entity in &run.entities {
        let pos = entity_center_bevy(entity, level_h);
        let size = Vec2::new(entity.w, entity.h);
        let color = entity_color(entity, run.tick);
        match index.views.get(&entity.id.0).copied() {
            Some(view) => {
                if let Ok((mut sprite, mut transform)) = views.get_mut(view) {
                    transform.translation.x = pos.x;
                    transform.translation.y = pos.y;
                    sprite.custom_size = Some(size);
                    sprite.color = color;
                }
            }
            None => {
                let view = commands
                    .spawn((
                        EntityView,
                        Sprite::from_color(color, size),
                        Transform::from_xyz(pos.x, pos.y, entity_z(&entity.kind)),
                    ))
                    .id();
                index.views.insert(entity.id.0, view);
            }
        }
    }

    let live: HashSet<u64> = run.entities.iter().map(|e| e.id.0).collect();
    index.views.retain(|id, view| {
        let keep = live.contains(id);
        if !keep {
            commands.entity(*view).despawn();
        }
        keep
    });
}

fn setup_hud(mut commands: Commands) {
    commands.spawn((
        Text::new(""),
        TextFont {
            font_size: 14.0,
            ..default()
        },
        TextColor(Color::srgba(0.95, 1.0, 0.98, 0.95)),
        Node {
            position_type: PositionType::Absolute,
            left: Val::Px(8.0),
            top: Val::Px(8.0),
            ..default()
        },
        HudText,
    ));
}

fn update_hud(active: Res<ActiveRun>, mut query: Query<&mut Text, With<HudText>>) {
    let Ok(mut text) = query.get_single_mut() else {
        return;
    };
    text.0 = hud_line(&active);
}

fn hud_line(active: &ActiveRun) -> String {
    let run = &active.run;
    let mut out = format!("{}  coins {}", run.character.label(), run.coins);
    if let Some(state) = run.player().and_then(|p| p.player_state()) {
        let form = match state.form {
            Form::Big => "big",
            Form::Small => "small",
        };
        out.push_str(&format!("  [{form}]"));
        let ability = match state.ability.phase {
            crate::entity::AbilityPhase::Ready => "ability ready".to_string(),
            crate::entity::AbilityPhase::Active => {
                format!(
                    "ability active {:.1}s",
                    state.ability.active_ticks as f32 / 60.0
                )
            }
            crate::entity::AbilityPhase::Cooldown => {
                format!(
                    "ability cooldown {:.1}s",
                    state.ability.cooldown_ticks as f32 / 60.0
                )
            }
        };
        out.push('\n');
        out.push_str(&ability);
    }
    match run.status {
        RunStatus::Running => {}
        RunStatus::Won => out.push_str("\nCOURSE CLEAR - press R to go again"),
        RunStatus::Dead => out.push_str("\nDOWN AND OUT - press R to retry"),
    }
    out
}
