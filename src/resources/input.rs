//! Per-frame keyboard input resource.
//!
//! Captures the driving keys and exposes them to systems via the
//! [`InputState`] resource. Each action has a main binding (WASD + Space)
//! and an alternate one (arrow keys + Left Shift).
//!
//! The simulation never reads this resource directly: [`InputState::frame`]
//! resolves the keys into an [`InputFrame`] that is handed to the integrator
//! by value.
use bevy_ecs::prelude::*;
use raylib::prelude::*;

use crate::components::vehicle::InputFrame;

#[derive(Debug, Clone, Copy)]
/// Boolean key state with its keyboard bindings.
pub struct BoolState {
    /// Whether the key is currently active/pressed this frame.
    pub active: bool,
    /// Whether the key was just pressed this frame.
    pub just_pressed: bool,
    /// Whether the key was just released this frame.
    pub just_released: bool,

    /// The key bound to this action.
    pub key_binding: KeyboardKey,
    /// Optional second key for the same action.
    pub alt_binding: Option<KeyboardKey>,
}

impl BoolState {
    pub fn bound(key_binding: KeyboardKey, alt_binding: Option<KeyboardKey>) -> Self {
        Self {
            key_binding,
            alt_binding,
            ..Self::default()
        }
    }
}

impl Default for BoolState {
    fn default() -> Self {
        Self {
            active: false,
            just_pressed: false,
            just_released: false,
            key_binding: KeyboardKey::KEY_NULL,
            alt_binding: None,
        }
    }
}

/// Resource capturing the per-frame keyboard state relevant to driving.
#[derive(Resource, Debug, Clone)]
pub struct InputState {
    pub throttle: BoolState,
    pub reverse: BoolState,
    pub steer_left: BoolState,
    pub steer_right: BoolState,
    pub brake: BoolState,
    // Control keys
    pub action_back: BoolState,
    pub mode_debug: BoolState,
}

impl Default for InputState {
    fn default() -> Self {
        Self {
            throttle: BoolState::bound(KeyboardKey::KEY_W, Some(KeyboardKey::KEY_UP)),
            reverse: BoolState::bound(KeyboardKey::KEY_S, Some(KeyboardKey::KEY_DOWN)),
            steer_left: BoolState::bound(KeyboardKey::KEY_A, Some(KeyboardKey::KEY_LEFT)),
            steer_right: BoolState::bound(KeyboardKey::KEY_D, Some(KeyboardKey::KEY_RIGHT)),
            brake: BoolState::bound(KeyboardKey::KEY_SPACE, Some(KeyboardKey::KEY_LEFT_SHIFT)),
            action_back: BoolState::bound(KeyboardKey::KEY_ESCAPE, None),
            mode_debug: BoolState::bound(KeyboardKey::KEY_F11, None),
        }
    }
}

impl InputState {
    /// Resolve the held keys into this tick's driver intent.
    ///
    /// Throttle is `1` forward, `-1` reverse, and `-0.5` when both are held.
    /// Opposite steering keys cancel out.
    pub fn frame(&self) -> InputFrame {
        let throttle = match (self.throttle.active, self.reverse.active) {
            (true, false) => 1.0,
            (false, true) => -1.0,
            (true, true) => -0.5,
            (false, false) => 0.0,
        };
        let mut steering = 0.0;
        if self.steer_left.active {
            steering -= 1.0;
        }
        if self.steer_right.active {
            steering += 1.0;
        }
        InputFrame::new(throttle, steering, self.brake.active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boolstate_default() {
        let bs = BoolState::default();
        assert!(!bs.active);
        assert!(!bs.just_pressed);
        assert!(!bs.just_released);
        assert_eq!(bs.key_binding, KeyboardKey::KEY_NULL);
        assert_eq!(bs.alt_binding, None);
    }

    #[test]
    fn test_inputstate_default_key_bindings() {
        let input = InputState::default();
        assert_eq!(input.throttle.key_binding, KeyboardKey::KEY_W);
        assert_eq!(input.throttle.alt_binding, Some(KeyboardKey::KEY_UP));
        assert_eq!(input.reverse.key_binding, KeyboardKey::KEY_S);
        assert_eq!(input.steer_left.key_binding, KeyboardKey::KEY_A);
        assert_eq!(input.steer_right.key_binding, KeyboardKey::KEY_D);
        assert_eq!(input.brake.key_binding, KeyboardKey::KEY_SPACE);
        assert_eq!(input.mode_debug.key_binding, KeyboardKey::KEY_F11);
    }

    #[test]
    fn test_frame_neutral_by_default() {
        assert_eq!(InputState::default().frame(), InputFrame::default());
    }

    #[test]
    fn test_frame_throttle_levels() {
        let mut input = InputState::default();
        input.throttle.active = true;
        assert_eq!(input.frame().throttle, 1.0);
        input.reverse.active = true;
        assert_eq!(input.frame().throttle, -0.5);
        input.throttle.active = false;
        assert_eq!(input.frame().throttle, -1.0);
    }

    #[test]
    fn test_frame_steering_and_brake() {
        let mut input = InputState::default();
        input.steer_right.active = true;
        input.brake.active = true;
        let frame = input.frame();
        assert_eq!(frame.steering, 1.0);
        assert!(frame.brake);
        input.steer_left.active = true;
        assert_eq!(input.frame().steering, 0.0);
    }
}
