use crate::character::{CharacterId, CharacterProfile};
use crate::collision::first_solid_below;
use crate::entity::{alloc_id, AbilityPhase, Entity, PlayerState};
use crate::geometry::Rect;
use crate::tiles::{TileGrid, TILE_SIZE};
use crate::tuning::Tuning;

/// What an accepted activation did, for event reporting.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AbilityOutcome {
    Flame,
    PhaseStart,
    VinesGrown { count: u32 },
    ShieldStart,
}

/// Fire the player's ability if it is Ready, otherwise ignore the press.
/// Instant abilities (Ember, Thorn) drop straight into Cooldown; timed ones
/// (Specter, Warden) run Active for their duration first. Warden alone
/// starts its cooldown clock at activation, concurrent with the shield.
pub fn try_activate(
    player: &mut PlayerState,
    player_rect: &Rect,
    grid: &TileGrid,
    profile: &CharacterProfile,
    tuning: &Tuning,
    next_id: &mut u64,
    spawned: &mut Vec<Entity>,
) -> Option<AbilityOutcome> {
    if player.ability.phase != AbilityPhase::Ready {
        return None;
    }
    match player.character {
        CharacterId::Ember => {
            spawned.push(Entity::flame(
                alloc_id(next_id),
                player_rect,
                player.facing,
                tuning,
            ));
            player.ability.phase = AbilityPhase::Cooldown;
            player.ability.cooldown_ticks = profile.ability_cooldown;
            Some(AbilityOutcome::Flame)
        }
        CharacterId::Specter => {
            player.phasing = true;
            player.ability.phase = AbilityPhase::Active;
            player.ability.active_ticks = profile.ability_duration;
            Some(AbilityOutcome::PhaseStart)
        }
        CharacterId::Thorn => {
            let count = grow_vines(player_rect, grid, tuning, next_id, spawned);
            player.ability.phase = AbilityPhase::Cooldown;
            player.ability.cooldown_ticks = profile.ability_cooldown;
            Some(AbilityOutcome::VinesGrown { count })
        }
        CharacterId::Warden => {
            player.shielded = true;
            player.ability.phase = AbilityPhase::Active;
            player.ability.active_ticks = profile.ability_duration;
            player.ability.cooldown_ticks = profile.ability_cooldown;
            Some(AbilityOutcome::ShieldStart)
        }
    }
}

/// Advance the ability clock one tick.
pub fn tick_ability(player: &mut PlayerState, profile: &CharacterProfile) {
    match player.ability.phase {
        AbilityPhase::Ready => {}
        AbilityPhase::Active => {
            if player.character == CharacterId::Warden {
                player.ability.cooldown_ticks = player.ability.cooldown_ticks.saturating_sub(1);
            }
            player.ability.active_ticks = player.ability.active_ticks.saturating_sub(1);
            if player.ability.active_ticks == 0 {
                player.phasing = false;
                player.shielded = false;
                if player.character != CharacterId::Warden {
                    player.ability.cooldown_ticks = profile.ability_cooldown;
                }
                player.ability.phase = if player.ability.cooldown_ticks > 0 {
                    AbilityPhase::Cooldown
                } else {
                    AbilityPhase::Ready
                };
            }
        }
        AbilityPhase::Cooldown => {
            player.ability.cooldown_ticks = player.ability.cooldown_ticks.saturating_sub(1);
            if player.ability.cooldown_ticks == 0 {
                player.ability.phase = AbilityPhase::Ready;
            }
        }
    }
}

/// Stack vine segments upward from the first solid footing in the player's
/// column. Stops at the height cap, any solid cell, or the level top. Over
/// a pit there is no footing and nothing grows.
fn grow_vines(
    player_rect: &Rect,
    grid: &TileGrid,
    tuning: &Tuning,
    next_id: &mut u64,
    spawned: &mut Vec<Entity>,
) -> u32 {
    let tx = (player_rect.center_x() / TILE_SIZE).floor() as i32;
    let feet_ty = (player_rect.bottom() / TILE_SIZE).floor() as i32;
    let Some(footing_ty) = first_solid_below(grid, tx, feet_ty) else {
        return 0;
    };
    let mut count = 0u32;
    for step in 1..=tuning.max_vine_height as i32 {
        let ty = footing_ty - step;
        if ty < 0 || grid.is_solid(tx, ty) {
            break;
        }
        spawned.push(Entity::vine(alloc_id(next_id), tx, ty, tuning));
        count += 1;
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityKind;
    use crate::tiles::Tile;

    fn grid_with(width: usize, height: usize, cells: &[(i32, i32, Tile)]) -> TileGrid {
        let mut grid = TileGrid::new(width, height, vec![0u8; width * height]);
        for &(tx, ty, tile) in cells {
            grid.set(tx, ty, tile);
        }
        grid
    }

    fn player_on_ground(character: CharacterId) -> (PlayerState, Rect) {
        let tuning = Tuning::default();
        let entity = Entity::player(crate::entity::EntityId(0), character, (40.0, 64.0), &tuning);
        let rect = entity.rect();
        let EntityKind::Player(state) = entity.kind else {
            unreachable!()
        };
        (state, rect)
    }

    #[test]
    fn activation_during_cooldown_is_ignored() {
        let tuning = Tuning::default();
        let grid = grid_with(8, 8, &[]);
        let (mut player, rect) = player_on_ground(CharacterId::Ember);
        let profile = CharacterId::Ember.profile();
        let mut next_id = 10;
        let mut spawned = Vec::new();

        let first = try_activate(
            &mut player, &rect, &grid, &profile, &tuning, &mut next_id, &mut spawned,
        );
        assert_eq!(first, Some(AbilityOutcome::Flame));
        assert_eq!(spawned.len(), 1);

        let second = try_activate(
            &mut player, &rect, &grid, &profile, &tuning, &mut next_id, &mut spawned,
        );
        assert_eq!(second, None);
        assert_eq!(spawned.len(), 1);
        assert_eq!(player.ability.phase, AbilityPhase::Cooldown);
    }

    #[test]
    fn flame_launches_from_the_facing_side() {
        let tuning = Tuning::default();
        let grid = grid_with(8, 8, &[]);
        let (mut player, rect) = player_on_ground(CharacterId::Ember);
        player.facing = -1;
        let mut next_id = 0;
        let mut spawned = Vec::new();
        try_activate(
            &mut player,
            &rect,
            &grid,
            &CharacterId::Ember.profile(),
            &tuning,
            &mut next_id,
            &mut spawned,
        );
        assert!(spawned[0].rect().right() < rect.left());
        assert!(spawned[0].vel.is_some_and(|v| v.x < 0.0));
    }

    #[test]
    fn specter_serves_duration_then_full_cooldown() {
        let tuning = Tuning::default();
        let grid = grid_with(8, 8, &[]);
        let (mut player, rect) = player_on_ground(CharacterId::Specter);
        let profile = CharacterId::Specter.profile();
        let mut next_id = 0;
        let mut spawned = Vec::new();
        try_activate(
            &mut player, &rect, &grid, &profile, &tuning, &mut next_id, &mut spawned,
        );
        assert!(player.phasing);

        for _ in 0..profile.ability_duration {
            tick_ability(&mut player, &profile);
        }
        assert!(!player.phasing);
        assert_eq!(player.ability.phase, AbilityPhase::Cooldown);
        assert_eq!(player.ability.cooldown_ticks, profile.ability_cooldown);
    }

    #[test]
    fn warden_cooldown_runs_concurrent_with_shield() {
        let tuning = Tuning::default();
        let grid = grid_with(8, 8, &[]);
        let (mut player, rect) = player_on_ground(CharacterId::Warden);
        let profile = CharacterId::Warden.profile();
        let mut next_id = 0;
        let mut spawned = Vec::new();
        try_activate(
            &mut player, &rect, &grid, &profile, &tuning, &mut next_id, &mut spawned,
        );
        assert!(player.shielded);

        for _ in 0..profile.ability_duration {
            tick_ability(&mut player, &profile);
        }
        assert!(!player.shielded);
        assert_eq!(player.ability.phase, AbilityPhase::Cooldown);
        // The clock ran while the shield was up.
        assert_eq!(
            player.ability.cooldown_ticks,
            profile.ability_cooldown - profile.ability_duration
        );

        for _ in 0..player.ability.cooldown_ticks {
            tick_ability(&mut player, &profile);
        }
        assert_eq!(player.ability.phase, AbilityPhase::Ready);
    }

    #[test]
    fn vines_stack_up_from_the_footing() {
        let tuning = Tuning::default();
        // Floor across row 6; player stands on it.
        let cells: Vec<(i32, i32, Tile)> = (0..8).map(|x| (x, 6, Tile::Ground)).collect();
        let grid = grid_with(8, 8, &cells);
        let (mut player, _) = player_on_ground(CharacterId::Thorn);
        let rect = Rect::new(34.0, 82.0, 12.0, 14.0);
        let mut next_id = 0;
        let mut spawned = Vec::new();
        let outcome = try_activate(
            &mut player,
            &rect,
            &grid,
            &CharacterId::Thorn.profile(),
            &tuning,
            &mut next_id,
            &mut spawned,
        );
        assert_eq!(outcome, Some(AbilityOutcome::VinesGrown { count: 6 }));
        assert_eq!(spawned.len(), 6);
        // Topmost vine sits five cells above the first one grown.
        assert_eq!(spawned[0].y, 5.0 * TILE_SIZE);
        assert_eq!(spawned[5].y, 0.0);
    }

    #[test]
    fn vine_stack_stops_under_a_ceiling() {
        let tuning = Tuning::default();
        let mut cells: Vec<(i32, i32, Tile)> = (0..8).map(|x| (x, 6, Tile::Ground)).collect();
        cells.push((2, 3, Tile::HardBlock));
        let grid = grid_with(8, 8, &cells);
        let (mut player, _) = player_on_ground(CharacterId::Thorn);
        let rect = Rect::new(34.0, 82.0, 12.0, 14.0);
        let mut next_id = 0;
        let mut spawned = Vec::new();
        let outcome = try_activate(
            &mut player,
            &rect,
            &grid,
            &CharacterId::Thorn.profile(),
            &tuning,
            &mut next_id,
            &mut spawned,
        );
        assert_eq!(outcome, Some(AbilityOutcome::VinesGrown { count: 2 }));
    }

    #[test]
    fn thorn_over_a_pit_grows_nothing_but_still_cools_down() {
        let tuning = Tuning::default();
        let grid = grid_with(8, 8, &[]);
        let (mut player, rect) = player_on_ground(CharacterId::Thorn);
        let mut next_id = 0;
        let mut spawned = Vec::new();
        let outcome = try_activate(
            &mut player,
            &rect,
            &grid,
            &CharacterId::Thorn.profile(),
            &tuning,
            &mut next_id,
            &mut spawned,
        );
        assert_eq!(outcome, Some(AbilityOutcome::VinesGrown { count: 0 }));
        assert!(spawned.is_empty());
        assert_eq!(player.ability.phase, AbilityPhase::Cooldown);
    }
}
