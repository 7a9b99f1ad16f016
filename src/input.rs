use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// One tick's worth of control state, sampled once per fixed step. `jump`
/// and `ability` are edges (true only on the tick a press is consumed),
/// the rest are level signals.
#[derive(Clone, Copy, Default, Debug, Serialize, Deserialize)]
pub struct InputFrame {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    pub jump: bool,
    pub ability: bool,
}

/// Abstraction layer between raw devices and the simulation. The keyboard
/// system (windowed) and scripted drivers (headless) both write here.
///
/// Render frames and fixed ticks free-run against each other, so press
/// edges are latched into the pending flags and cleared only when a fixed
/// tick drains them. A tap between two ticks still lands; a press is never
/// seen twice.
#[derive(Resource, Default, Clone)]
pub struct VirtualInput {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    pending_jump: bool,
    pending_ability: bool,
}

impl VirtualInput {
    pub fn press_jump(&mut self) {
        self.pending_jump = true;
    }

    pub fn press_ability(&mut self) {
        self.pending_ability = true;
    }

    /// Consume the latched edges together with the current level state.
    pub fn take_frame(&mut self) -> InputFrame {
        let frame = InputFrame {
            left: self.left,
            right: self.right,
            up: self.up,
            down: self.down,
            jump: self.pending_jump,
            ability: self.pending_ability,
        };
        self.pending_jump = false;
        self.pending_ability = false;
        frame
    }
}

pub struct InputPlugin;

impl Plugin for InputPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(VirtualInput::default()).add_systems(
            PreUpdate,
            keyboard_to_virtual.run_if(resource_exists::<ButtonInput<KeyCode>>),
        );
    }
}

/// Translate keyboard state to the virtual layer. Held keys overwrite the
/// level flags every render frame; just-pressed keys latch edges.
fn keyboard_to_virtual(keyboard: Res<ButtonInput<KeyCode>>, mut vinput: ResMut<VirtualInput>) {
    vinput.left = keyboard.pressed(KeyCode::KeyA) || keyboard.pressed(KeyCode::ArrowLeft);
    vinput.right = keyboard.pressed(KeyCode::KeyD) || keyboard.pressed(KeyCode::ArrowRight);
    vinput.up = keyboard.pressed(KeyCode::KeyW) || keyboard.pressed(KeyCode::ArrowUp);
    vinput.down = keyboard.pressed(KeyCode::KeyS) || keyboard.pressed(KeyCode::ArrowDown);

    if keyboard.just_pressed(KeyCode::Space) {
        vinput.press_jump();
    }
    if keyboard.just_pressed(KeyCode::KeyE) || keyboard.just_pressed(KeyCode::ShiftLeft) {
        vinput.press_ability();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edges_latch_until_a_tick_drains_them() {
        let mut vinput = VirtualInput::default();
        vinput.press_jump();
        // Two render frames pass before the next fixed tick; the edge holds.
        let frame = vinput.take_frame();
        assert!(frame.jump);
        let next = vinput.take_frame();
        assert!(!next.jump);
    }

    #[test]
    fn level_state_passes_through_unconsumed() {
        let mut vinput = VirtualInput {
            right: true,
            ..Default::default()
        };
        assert!(vinput.take_frame().right);
        assert!(vinput.take_frame().right);
    }
}
