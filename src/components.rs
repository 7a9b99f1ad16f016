use bevy::prelude::*;

use crate::character::CharacterId;
use crate::tuning::Tuning;

/// True when running without a window. Presentation systems check this and
/// skip spawning sprites, cameras and HUD nodes.
#[derive(Resource, Clone, Copy, Default)]
pub struct HeadlessMode(pub bool);

/// Run configuration assembled at startup from game.json, environment and
/// CLI flags. Read-only after the app boots.
#[derive(Resource, Clone)]
pub struct GameConfig {
    pub character: CharacterId,
    pub level_path: Option<String>,
    pub tuning: Tuning,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            character: CharacterId::Ember,
            level_path: None,
            tuning: Tuning::default(),
        }
    }
}
