use serde::{Deserialize, Serialize};

/// Shared physics and timing constants. Units are per tick at the 60 Hz
/// fixed step (velocities in px/tick, accelerations in px/tick^2), so the
/// integrator never multiplies by a delta. Partial overrides from the
/// startup config fall back to these defaults field by field.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub gravity: f32,
    pub max_fall_speed: f32,
    pub accel: f32,
    pub friction: f32,
    pub stop_epsilon: f32,
    pub climb_speed: f32,
    pub stomp_bounce: f32,
    pub damage_nudge: f32,
    pub invuln_ticks: u32,
    pub pickup_grace_ticks: u32,
    pub player_width: f32,
    pub small_height: f32,
    pub big_height: f32,
    /// Fraction of the remaining height gap closed per tick while a form
    /// change is in progress.
    pub growth_rate: f32,
    pub walker_speed: f32,
    pub mushroom_speed: f32,
    pub coin_lifespan: u32,
    pub flame_speed: f32,
    pub flame_lifespan: u32,
    pub vine_lifespan: u32,
    pub max_vine_height: u32,
    /// Extra fall distance below the level's bottom edge before a run is
    /// lost to the void.
    pub void_margin: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            gravity: 0.5,
            max_fall_speed: 8.0,
            accel: 0.7,
            friction: 0.82,
            stop_epsilon: 0.05,
            climb_speed: 2.0,
            stomp_bounce: -4.5,
            damage_nudge: -3.0,
            invuln_ticks: 90,
            pickup_grace_ticks: 30,
            player_width: 12.0,
            small_height: 14.0,
            big_height: 26.0,
            growth_rate: 0.25,
            walker_speed: 1.0,
            mushroom_speed: 1.5,
            coin_lifespan: 600,
            flame_speed: 3.0,
            flame_lifespan: 16,
            vine_lifespan: 480,
            max_vine_height: 6,
            void_margin: 48.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_override_keeps_other_defaults() {
        let tuning: Tuning = serde_json::from_str(r#"{"gravity": 0.75}"#).unwrap();
        assert_eq!(tuning.gravity, 0.75);
        assert_eq!(tuning.friction, Tuning::default().friction);
        assert_eq!(tuning.invuln_ticks, Tuning::default().invuln_ticks);
    }

    #[test]
    fn fall_speed_stays_under_one_tile_per_tick() {
        // The axis resolver scans every spanned cell, but keeping the cap
        // within a tile keeps snap distances small.
        assert!(Tuning::default().max_fall_speed <= crate::tiles::TILE_SIZE);
    }
}
