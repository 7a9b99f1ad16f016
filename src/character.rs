use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CharacterId {
    Ember,
    Specter,
    Thorn,
    Warden,
}

/// Movement and ability scalars that differ per character. Everything else
/// comes from the shared tuning table.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct CharacterProfile {
    pub jump_impulse: f32,
    pub move_speed: f32,
    pub ability_cooldown: u32,
    pub ability_duration: u32,
}

impl CharacterId {
    pub fn all() -> [CharacterId; 4] {
        [
            CharacterId::Ember,
            CharacterId::Specter,
            CharacterId::Thorn,
            CharacterId::Warden,
        ]
    }

    pub fn parse(s: &str) -> Option<CharacterId> {
        match s.to_ascii_lowercase().as_str() {
            "ember" => Some(CharacterId::Ember),
            "specter" => Some(CharacterId::Specter),
            "thorn" => Some(CharacterId::Thorn),
            "warden" => Some(CharacterId::Warden),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CharacterId::Ember => "Ember",
            CharacterId::Specter => "Specter",
            CharacterId::Thorn => "Thorn",
            CharacterId::Warden => "Warden",
        }
    }

    /// Duration of 0 means the ability resolves on its activation tick.
    pub fn profile(self) -> CharacterProfile {
        match self {
            CharacterId::Ember => CharacterProfile {
                jump_impulse: -6.5,
                move_speed: 3.0,
                ability_cooldown: 180,
                ability_duration: 0,
            },
            // Phasing disables terrain resolution entirely, floors included,
            // so the window is a short blink. Longer and every grounded
            // activation sinks the player out of the level.
            CharacterId::Specter => CharacterProfile {
                jump_impulse: -6.2,
                move_speed: 3.2,
                ability_cooldown: 420,
                ability_duration: 20,
            },
            CharacterId::Thorn => CharacterProfile {
                jump_impulse: -6.8,
                move_speed: 2.8,
                ability_cooldown: 300,
                ability_duration: 0,
            },
            CharacterId::Warden => CharacterProfile {
                jump_impulse: -6.3,
                move_speed: 2.9,
                ability_cooldown: 360,
                ability_duration: 180,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_any_case() {
        assert_eq!(CharacterId::parse("Warden"), Some(CharacterId::Warden));
        assert_eq!(CharacterId::parse("EMBER"), Some(CharacterId::Ember));
        assert_eq!(CharacterId::parse("knight"), None);
    }

    #[test]
    fn every_profile_jumps_upward() {
        for id in CharacterId::all() {
            assert!(id.profile().jump_impulse < 0.0);
            assert!(id.profile().move_speed > 0.0);
            assert!(id.profile().ability_cooldown > 0);
        }
    }
}
