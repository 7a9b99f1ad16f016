use serde::Serialize;

use crate::abilities::{self, AbilityOutcome};
use crate::character::{CharacterId, CharacterProfile};
use crate::collision::{
    ledge_ahead, overlaps_solid, overlaps_tile, probe_grounded, resolve_axis, strike_block, Axis,
    StrikeOutcome,
};
use crate::entity::{
    alloc_id, CollectibleKind, EffectKind, Entity, EntityKind, Form, PlayerState, Velocity,
};
use crate::geometry::{overlaps, Rect};
use crate::input::InputFrame;
use crate::level::{LevelData, SpawnKind};
use crate::tiles::{Tile, TileGrid};
use crate::tuning::Tuning;

/// Horizontal span of the visible window in world units. The camera target
/// clamps against it so the view never shows past the level edges.
pub const VIEW_WIDTH: f32 = 480.0;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub enum RunStatus {
    Running,
    Won,
    Dead,
}

/// Everything a step can report outward. The Bevy driver publishes these
/// onto the event feed; the scripted runner records them raw.
#[derive(Clone, PartialEq, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunEvent {
    Jump { x: f32, y: f32 },
    Coin { x: f32, y: f32 },
    Powerup,
    PlayerGrew,
    BlockBump { tx: i32, ty: i32 },
    BrickBreak { tx: i32, ty: i32 },
    CoinPop { tx: i32, ty: i32 },
    MushroomSpawn { tx: i32, ty: i32 },
    Stomp { x: f32, y: f32 },
    EnemyBurned { x: f32, y: f32 },
    PlayerDamaged,
    AbilityUsed { character: CharacterId },
    VinesGrown { count: u32 },
    Won,
    Died,
}

enum Touch {
    Stomp,
    Enemy,
    Coin,
    Mushroom,
    Goal,
}

/// One live run: a deep copy of the level's grid plus the entity store,
/// advanced one fixed tick at a time by `step`. Terminal status latches;
/// stepping a finished run does nothing.
#[derive(Clone, Serialize)]
pub struct GameRun {
    pub status: RunStatus,
    pub grid: TileGrid,
    pub entities: Vec<Entity>,
    pub tick: u64,
    pub coins: u32,
    pub camera_x: f32,
    pub character: CharacterId,
    pub profile: CharacterProfile,
    pub tuning: Tuning,
    next_id: u64,
}

impl GameRun {
    pub fn new(level: &LevelData, character: CharacterId, tuning: Tuning) -> Self {
        let mut level = level.clone();
        // A raw level never reaches the stepper; callers that want the
        // sanitize notes run it themselves first and log them.
        level.sanitize();

        let mut next_id = 0u64;
        let mut entities = Vec::new();
        entities.push(Entity::player(
            alloc_id(&mut next_id),
            character,
            level.start_pixel(),
            &tuning,
        ));
        for spawn in &level.spawns {
            let id = alloc_id(&mut next_id);
            match spawn.kind {
                SpawnKind::Walker => entities.push(Entity::walker(
                    id,
                    spawn.tx,
                    spawn.ty,
                    spawn.ledge_turn,
                    &tuning,
                )),
                SpawnKind::Coin => entities.push(Entity::coin(id, spawn.tx, spawn.ty)),
                SpawnKind::Mushroom => {
                    entities.push(Entity::mushroom(id, spawn.tx, spawn.ty, &tuning))
                }
                SpawnKind::Goal => entities.push(Entity::goal_marker(id, spawn.tx, spawn.ty)),
                SpawnKind::Unknown => {}
            }
        }

        let mut run = Self {
            status: RunStatus::Running,
            grid: level.grid(),
            entities,
            tick: 0,
            coins: 0,
            camera_x: 0.0,
            character,
            profile: character.profile(),
            tuning,
            next_id,
        };
        run.update_camera();
        run
    }

    pub fn player(&self) -> Option<&Entity> {
        self.entities.iter().find(|e| e.is_player())
    }

    /// Advance one fixed tick. Order: clocks, ability edge, player physics
    /// and tile resolution (X fully before Y), other movers, interactions,
    /// sweep. Returns the tick's events; empty and side-effect free once
    /// the run is terminal.
    pub fn step(&mut self, input: &InputFrame) -> Vec<RunEvent> {
        let mut events = Vec::new();
        if self.status != RunStatus::Running {
            return events;
        }
        self.tick += 1;

        self.tick_lifespans();
        let prev_bottom = self.player_pass(input, &mut events);
        if self.status == RunStatus::Running {
            self.mob_pass();
            self.interaction_pass(prev_bottom, &mut events);
        }
        self.entities.retain(|e| !e.dead);
        self.update_camera();
        events
    }

    fn tick_lifespans(&mut self) {
        for entity in &mut self.entities {
            if let Some(left) = entity.lifespan.as_mut() {
                *left = left.saturating_sub(1);
                if *left == 0 {
                    entity.dead = true;
                }
            }
        }
    }

    /// Integrate and resolve the player. Returns the bottom edge before
    /// vertical displacement, which the stomp rule compares against enemy
    /// midpoints.
    fn player_pass(&mut self, input: &InputFrame, events: &mut Vec<RunEvent>) -> f32 {
        let Some(idx) = self.entities.iter().position(Entity::is_player) else {
            return 0.0;
        };

        // Vine overlap is read before the player is mutably borrowed.
        let pre_rect = self.entities[idx].rect();
        let vine_overlap = self.entities.iter().any(|e| {
            !e.dead
                && matches!(e.kind, EntityKind::Effect(EffectKind::Vine))
                && overlaps(&pre_rect, &e.rect())
        });

        let mut spawned: Vec<Entity> = Vec::new();
        let grid = &mut self.grid;
        let tuning = &self.tuning;
        let profile = &self.profile;

        let entity = &mut self.entities[idx];
        let EntityKind::Player(state) = &mut entity.kind else {
            return 0.0;
        };

        state.invuln_ticks = state.invuln_ticks.saturating_sub(1);
        abilities::tick_ability(state, profile);

        let mut rect = Rect::new(entity.x, entity.y, entity.w, entity.h);
        let mut vel = entity.vel.unwrap_or_default();

        if input.ability {
            if let Some(outcome) = abilities::try_activate(
                state,
                &rect,
                grid,
                profile,
                tuning,
                &mut self.next_id,
                &mut spawned,
            ) {
                events.push(RunEvent::AbilityUsed {
                    character: state.character,
                });
                if let AbilityOutcome::VinesGrown { count } = outcome {
                    events.push(RunEvent::VinesGrown { count });
                }
            }
        }

        // Climbing latches while the player holds a vertical input on a
        // climbable, and drops the moment the overlap ends.
        let on_climbable = vine_overlap || overlaps_tile(grid, &rect, Tile::VineBase);
        if on_climbable {
            if (input.up || input.down) && !state.climbing {
                state.climbing = true;
                vel.y = 0.0;
            }
        } else {
            state.climbing = false;
        }

        if input.left {
            vel.x -= tuning.accel;
            state.facing = -1;
        }
        if input.right {
            vel.x += tuning.accel;
            state.facing = 1;
        }
        vel.x *= tuning.friction;
        vel.x = vel.x.clamp(-profile.move_speed, profile.move_speed);
        if vel.x.abs() < tuning.stop_epsilon {
            vel.x = 0.0;
        }

        if state.climbing {
            let dir = (input.down as i8 - input.up as i8) as f32;
            vel.y = tuning.climb_speed * dir;
        } else {
            vel.y = (vel.y + tuning.gravity).min(tuning.max_fall_speed);
        }

        if input.jump && (state.on_ground || state.climbing) {
            vel.y = profile.jump_impulse;
            state.on_ground = false;
            state.climbing = false;
            events.push(RunEvent::Jump {
                x: rect.center_x(),
                y: rect.bottom(),
            });
        }

        // Form change eases the height toward its target with the feet
        // anchored. Growth pauses while the taller box would stick into
        // solid tiles.
        if (rect.h - state.target_height).abs() > 0.01 {
            let mut new_h = rect.h + (state.target_height - rect.h) * tuning.growth_rate;
            if (new_h - state.target_height).abs() < 0.5 {
                new_h = state.target_height;
            }
            let candidate = Rect::new(rect.x, rect.bottom() - new_h, rect.w, new_h);
            if state.phasing || new_h < rect.h || !overlaps_solid(grid, &candidate) {
                rect = candidate;
            }
        }

        rect.x += vel.x;
        if !state.phasing {
            resolve_axis(grid, &mut rect, &mut vel, Axis::X);
        }

        let prev_bottom = rect.bottom();
        rect.y += vel.y;
        if !state.phasing {
            let contact = resolve_axis(grid, &mut rect, &mut vel, Axis::Y);
            if let Some((tx, ty)) = contact.struck_overhead {
                match strike_block(grid, tx, ty, state.form == Form::Big) {
                    StrikeOutcome::MushroomOut { tx, ty } => {
                        spawned.push(Entity::mushroom(alloc_id(&mut self.next_id), tx, ty, tuning));
                        events.push(RunEvent::MushroomSpawn { tx, ty });
                    }
                    StrikeOutcome::CoinOut { tx, ty } => {
                        spawned.push(Entity::popped_coin(
                            alloc_id(&mut self.next_id),
                            tx,
                            ty,
                            tuning,
                        ));
                        events.push(RunEvent::CoinPop { tx, ty });
                    }
                    StrikeOutcome::Break => events.push(RunEvent::BrickBreak { tx, ty }),
                    StrikeOutcome::Thud => events.push(RunEvent::BlockBump { tx, ty }),
                }
            }
            state.on_ground = contact.landed || probe_grounded(grid, &rect) || state.climbing;
        } else {
            state.on_ground = false;
        }

        // Spike contact re-fires every tick it persists; invulnerability is
        // the only thing between the player and it.
        if overlaps_tile(grid, &rect, Tile::Spike) {
            Self::damage(state, &mut vel, tuning, &mut self.status, events);
        }

        // The void ignores every protection, shields and phasing included.
        if rect.top() > grid.pixel_height() + tuning.void_margin
            && self.status == RunStatus::Running
        {
            self.status = RunStatus::Dead;
            events.push(RunEvent::Died);
        }

        entity.x = rect.x;
        entity.y = rect.y;
        entity.w = rect.w;
        entity.h = rect.h;
        entity.vel = Some(vel);

        self.entities.extend(spawned);
        prev_bottom
    }

    /// Move walkers, sliding mushrooms and flames. Walkers reverse on wall
    /// contact and, with ledge_turn set, at missing floor; flames die on
    /// the first wall.
    fn mob_pass(&mut self) {
        let grid = &self.grid;
        let tuning = &self.tuning;
        let void_line = grid.pixel_height() + tuning.void_margin;

        for entity in &mut self.entities {
            if entity.dead || entity.is_player() {
                continue;
            }
            let Some(mut vel) = entity.vel else {
                continue;
            };
            let mut rect = entity.rect();

            match &mut entity.kind {
                EntityKind::Enemy(enemy) => {
                    vel.y = (vel.y + tuning.gravity).min(tuning.max_fall_speed);
                    rect.x += vel.x;
                    let cx = resolve_axis(grid, &mut rect, &mut vel, Axis::X);
                    if cx.hit {
                        enemy.dir = -enemy.dir;
                        vel.x = enemy.dir as f32 * tuning.walker_speed;
                    }
                    rect.y += vel.y;
                    let cy = resolve_axis(grid, &mut rect, &mut vel, Axis::Y);
                    if cy.landed && enemy.ledge_turn && ledge_ahead(grid, &rect, enemy.dir) {
                        enemy.dir = -enemy.dir;
                        vel.x = enemy.dir as f32 * tuning.walker_speed;
                    }
                    if rect.top() > void_line {
                        entity.dead = true;
                    }
                }
                EntityKind::Collectible(CollectibleKind::SuperMushroom) => {
                    vel.y = (vel.y + tuning.gravity).min(tuning.max_fall_speed);
                    let heading = vel.x;
                    rect.x += vel.x;
                    let cx = resolve_axis(grid, &mut rect, &mut vel, Axis::X);
                    if cx.hit {
                        vel.x = -heading;
                    }
                    rect.y += vel.y;
                    resolve_axis(grid, &mut rect, &mut vel, Axis::Y);
                    if rect.top() > void_line {
                        entity.dead = true;
                    }
                }
                EntityKind::Effect(EffectKind::Flame) => {
                    rect.x += vel.x;
                    let cx = resolve_axis(grid, &mut rect, &mut vel, Axis::X);
                    if cx.hit {
                        entity.dead = true;
                    }
                }
                _ => {}
            }

            entity.x = rect.x;
            entity.y = rect.y;
            entity.vel = Some(vel);
        }
    }

    /// Player-versus-entity rules, after everything has moved. Flames burn
    /// walkers first so a burned walker cannot also deal contact damage on
    /// its final tick.
    fn interaction_pass(&mut self, prev_bottom: f32, events: &mut Vec<RunEvent>) {
        let flames: Vec<Rect> = self
            .entities
            .iter()
            .filter(|e| !e.dead && matches!(e.kind, EntityKind::Effect(EffectKind::Flame)))
            .map(|e| e.rect())
            .collect();
        if !flames.is_empty() {
            for entity in &mut self.entities {
                if entity.dead || !matches!(entity.kind, EntityKind::Enemy(_)) {
                    continue;
                }
                let r = entity.rect();
                if flames.iter().any(|f| overlaps(f, &r)) {
                    entity.dead = true;
                    events.push(RunEvent::EnemyBurned {
                        x: r.center_x(),
                        y: r.center_y(),
                    });
                }
            }
        }

        let Some(p_idx) = self.entities.iter().position(Entity::is_player) else {
            return;
        };
        let player_rect = self.entities[p_idx].rect();
        let player_vy = self.entities[p_idx].vel.map_or(0.0, |v| v.y);

        if overlaps_tile(&self.grid, &player_rect, Tile::Goal) {
            self.finish_won(events);
            return;
        }

        // Decide on a snapshot, then apply in spawn order. Protection
        // checks happen at apply time, so the first contact this tick can
        // grant the invulnerability that voids the second.
        let mut touches: Vec<(usize, Touch)> = Vec::new();
        for (i, other) in self.entities.iter().enumerate() {
            if i == p_idx || other.dead || !overlaps(&player_rect, &other.rect()) {
                continue;
            }
            match &other.kind {
                EntityKind::Enemy(_) => {
                    if player_vy > 0.0 && prev_bottom <= other.center_y() {
                        touches.push((i, Touch::Stomp));
                    } else {
                        touches.push((i, Touch::Enemy));
                    }
                }
                EntityKind::Collectible(CollectibleKind::Coin) => touches.push((i, Touch::Coin)),
                EntityKind::Collectible(CollectibleKind::SuperMushroom) => {
                    touches.push((i, Touch::Mushroom))
                }
                EntityKind::Goal => touches.push((i, Touch::Goal)),
                _ => {}
            }
        }

        for (i, touch) in touches {
            if self.entities[i].dead {
                continue;
            }
            match touch {
                Touch::Coin => {
                    let r = self.entities[i].rect();
                    self.entities[i].dead = true;
                    self.coins += 1;
                    events.push(RunEvent::Coin {
                        x: r.center_x(),
                        y: r.center_y(),
                    });
                }
                Touch::Mushroom => {
                    self.entities[i].dead = true;
                    let tuning_big = self.tuning.big_height;
                    let grace = self.tuning.pickup_grace_ticks;
                    let entity = &mut self.entities[p_idx];
                    if let EntityKind::Player(state) = &mut entity.kind {
                        events.push(RunEvent::Powerup);
                        if state.form == Form::Small {
                            state.form = Form::Big;
                            state.target_height = tuning_big;
                            events.push(RunEvent::PlayerGrew);
                        }
                        state.invuln_ticks = state.invuln_ticks.max(grace);
                    }
                }
                Touch::Stomp => {
                    let foe = self.entities[i].rect();
                    self.entities[i].dead = true;
                    let entity = &mut self.entities[p_idx];
                    if let Some(vel) = entity.vel.as_mut() {
                        vel.y = self.tuning.stomp_bounce;
                    }
                    events.push(RunEvent::Stomp {
                        x: foe.center_x(),
                        y: foe.center_y(),
                    });
                }
                Touch::Enemy => {
                    let entity = &mut self.entities[p_idx];
                    let mut vel = entity.vel.unwrap_or_default();
                    if let EntityKind::Player(state) = &mut entity.kind {
                        Self::damage(state, &mut vel, &self.tuning, &mut self.status, events);
                    }
                    entity.vel = Some(vel);
                }
                Touch::Goal => self.finish_won(events),
            }
            if self.status != RunStatus::Running {
                break;
            }
        }
    }

    /// Big players shrink and get mercy frames; Small players lose the run.
    /// Shield, phase and running invulnerability all make this a no-op.
    fn damage(
        state: &mut PlayerState,
        vel: &mut Velocity,
        tuning: &Tuning,
        status: &mut RunStatus,
        events: &mut Vec<RunEvent>,
    ) {
        if state.invuln_ticks > 0 || state.shielded || state.phasing {
            return;
        }
        match state.form {
            Form::Big => {
                state.form = Form::Small;
                state.target_height = tuning.small_height;
                state.invuln_ticks = tuning.invuln_ticks;
                vel.y = tuning.damage_nudge;
                events.push(RunEvent::PlayerDamaged);
            }
            Form::Small => {
                if *status == RunStatus::Running {
                    *status = RunStatus::Dead;
                    events.push(RunEvent::Died);
                }
            }
        }
    }

    fn finish_won(&mut self, events: &mut Vec<RunEvent>) {
        if self.status == RunStatus::Running {
            self.status = RunStatus::Won;
            events.push(RunEvent::Won);
        }
    }

    fn update_camera(&mut self) {
        let Some(player) = self.player() else {
            return;
        };
        let half = VIEW_WIDTH / 2.0;
        let max_x = (self.grid.pixel_width() - half).max(half);
        self.camera_x = player.center_x().clamp(half, max_x);
    }
}
