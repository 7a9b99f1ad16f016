use serde::Serialize;

use crate::character::CharacterId;
use crate::geometry::Rect;
use crate::tiles::TILE_SIZE;
use crate::tuning::Tuning;

pub const WALKER_SIZE: f32 = 14.0;
pub const MUSHROOM_SIZE: f32 = 14.0;
pub const COIN_WIDTH: f32 = 8.0;
pub const COIN_HEIGHT: f32 = 12.0;
pub const FLAME_SIZE: f32 = 10.0;
pub const VINE_WIDTH: f32 = 12.0;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize)]
pub struct EntityId(pub u64);

#[derive(Clone, Copy, PartialEq, Debug, Default, Serialize)]
pub struct Velocity {
    pub x: f32,
    pub y: f32,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub enum Form {
    Small,
    Big,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub enum AbilityPhase {
    Ready,
    Active,
    Cooldown,
}

#[derive(Clone, Copy, Debug, Serialize)]
pub struct AbilityState {
    pub phase: AbilityPhase,
    pub cooldown_ticks: u32,
    pub active_ticks: u32,
}

impl Default for AbilityState {
    fn default() -> Self {
        Self {
            phase: AbilityPhase::Ready,
            cooldown_ticks: 0,
            active_ticks: 0,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct PlayerState {
    pub character: CharacterId,
    pub form: Form,
    /// -1 left, 1 right. Never 0; keeps ability aim well-defined while idle.
    pub facing: i8,
    pub on_ground: bool,
    pub climbing: bool,
    pub invuln_ticks: u32,
    pub phasing: bool,
    pub shielded: bool,
    /// Height the body is easing toward during a form change.
    pub target_height: f32,
    pub ability: AbilityState,
}

#[derive(Clone, Copy, Debug, Serialize)]
pub struct EnemyState {
    pub dir: i8,
    pub ledge_turn: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub enum CollectibleKind {
    Coin,
    SuperMushroom,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub enum EffectKind {
    Vine,
    Flame,
}

#[derive(Clone, Debug, Serialize)]
pub enum EntityKind {
    Player(PlayerState),
    Enemy(EnemyState),
    Collectible(CollectibleKind),
    Effect(EffectKind),
    /// Authored win trigger placed by the spawn list, in addition to Goal
    /// tiles painted into the grid.
    Goal,
}

/// One live object in a run. `vel: None` marks entities the movement pass
/// skips entirely (vines, placed coins, goal markers).
#[derive(Clone, Debug, Serialize)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    pub vel: Option<Velocity>,
    pub dead: bool,
    pub lifespan: Option<u32>,
}

/// Hand out the next run-unique id from a monotonic counter.
pub fn alloc_id(counter: &mut u64) -> EntityId {
    let id = EntityId(*counter);
    *counter += 1;
    id
}

impl Entity {
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.w, self.h)
    }

    pub fn player_state(&self) -> Option<&PlayerState> {
        match &self.kind {
            EntityKind::Player(state) => Some(state),
            _ => None,
        }
    }

    pub fn player_state_mut(&mut self) -> Option<&mut PlayerState> {
        match &mut self.kind {
            EntityKind::Player(state) => Some(state),
            _ => None,
        }
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    pub fn center_x(&self) -> f32 {
        self.x + self.w / 2.0
    }

    pub fn center_y(&self) -> f32 {
        self.y + self.h / 2.0
    }

    pub fn is_player(&self) -> bool {
        matches!(self.kind, EntityKind::Player(_))
    }

    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            EntityKind::Player(_) => "player",
            EntityKind::Enemy(_) => "walker",
            EntityKind::Collectible(CollectibleKind::Coin) => "coin",
            EntityKind::Collectible(CollectibleKind::SuperMushroom) => "mushroom",
            EntityKind::Effect(EffectKind::Vine) => "vine",
            EntityKind::Effect(EffectKind::Flame) => "flame",
            EntityKind::Goal => "goal",
        }
    }

    /// Player standing Small with feet at the given bottom-center point.
    pub fn player(id: EntityId, character: CharacterId, feet: (f32, f32), tuning: &Tuning) -> Self {
        let w = tuning.player_width;
        let h = tuning.small_height;
        Self {
            id,
            kind: EntityKind::Player(PlayerState {
                character,
                form: Form::Small,
                facing: 1,
                on_ground: false,
                climbing: false,
                invuln_ticks: 0,
                phasing: false,
                shielded: false,
                target_height: h,
                ability: AbilityState::default(),
            }),
            x: feet.0 - w / 2.0,
            y: feet.1 - h,
            w,
            h,
            vel: Some(Velocity::default()),
            dead: false,
            lifespan: None,
        }
    }

    /// Patrolling walker standing on the floor of its spawn cell, heading
    /// left.
    pub fn walker(id: EntityId, tx: i32, ty: i32, ledge_turn: bool, tuning: &Tuning) -> Self {
        Self {
            id,
            kind: EntityKind::Enemy(EnemyState {
                dir: -1,
                ledge_turn,
            }),
            x: tx as f32 * TILE_SIZE + (TILE_SIZE - WALKER_SIZE) / 2.0,
            y: (ty + 1) as f32 * TILE_SIZE - WALKER_SIZE,
            w: WALKER_SIZE,
            h: WALKER_SIZE,
            vel: Some(Velocity {
                x: -tuning.walker_speed,
                y: 0.0,
            }),
            dead: false,
            lifespan: None,
        }
    }

    /// Authored coin floating in its cell. Persists until collected.
    pub fn coin(id: EntityId, tx: i32, ty: i32) -> Self {
        Self {
            id,
            kind: EntityKind::Collectible(CollectibleKind::Coin),
            x: tx as f32 * TILE_SIZE + (TILE_SIZE - COIN_WIDTH) / 2.0,
            y: ty as f32 * TILE_SIZE + (TILE_SIZE - COIN_HEIGHT) / 2.0,
            w: COIN_WIDTH,
            h: COIN_HEIGHT,
            vel: None,
            dead: false,
            lifespan: None,
        }
    }

    /// Coin popped out of a struck block. Same shape as an authored coin
    /// but disappears if nobody picks it up.
    pub fn popped_coin(id: EntityId, tx: i32, ty: i32, tuning: &Tuning) -> Self {
        Self {
            lifespan: Some(tuning.coin_lifespan),
            ..Self::coin(id, tx, ty)
        }
    }

    /// Mushroom emerging from a struck block, sliding right until it hits
    /// a wall.
    pub fn mushroom(id: EntityId, tx: i32, ty: i32, tuning: &Tuning) -> Self {
        Self {
            id,
            kind: EntityKind::Collectible(CollectibleKind::SuperMushroom),
            x: tx as f32 * TILE_SIZE + (TILE_SIZE - MUSHROOM_SIZE) / 2.0,
            y: (ty + 1) as f32 * TILE_SIZE - MUSHROOM_SIZE,
            w: MUSHROOM_SIZE,
            h: MUSHROOM_SIZE,
            vel: Some(Velocity {
                x: tuning.mushroom_speed,
                y: 0.0,
            }),
            dead: false,
            lifespan: None,
        }
    }

    /// Short-lived flame wave launched from the player's leading edge.
    pub fn flame(id: EntityId, player: &Rect, facing: i8, tuning: &Tuning) -> Self {
        let x = if facing >= 0 {
            player.right() + 2.0
        } else {
            player.left() - 2.0 - FLAME_SIZE
        };
        Self {
            id,
            kind: EntityKind::Effect(EffectKind::Flame),
            x,
            y: player.center_y() - FLAME_SIZE / 2.0,
            w: FLAME_SIZE,
            h: FLAME_SIZE,
            vel: Some(Velocity {
                x: facing as f32 * tuning.flame_speed,
                y: 0.0,
            }),
            dead: false,
            lifespan: Some(tuning.flame_lifespan),
        }
    }

    /// Grown vine segment filling one cell, climbable until it withers.
    pub fn vine(id: EntityId, tx: i32, ty: i32, tuning: &Tuning) -> Self {
        Self {
            id,
            kind: EntityKind::Effect(EffectKind::Vine),
            x: tx as f32 * TILE_SIZE + (TILE_SIZE - VINE_WIDTH) / 2.0,
            y: ty as f32 * TILE_SIZE,
            w: VINE_WIDTH,
            h: TILE_SIZE,
            vel: None,
            dead: false,
            lifespan: Some(tuning.vine_lifespan),
        }
    }

    /// Authored goal marker covering one cell.
    pub fn goal_marker(id: EntityId, tx: i32, ty: i32) -> Self {
        Self {
            id,
            kind: EntityKind::Goal,
            x: tx as f32 * TILE_SIZE,
            y: ty as f32 * TILE_SIZE,
            w: TILE_SIZE,
            h: TILE_SIZE,
            vel: None,
            dead: false,
            lifespan: None,
        }
    }
}
