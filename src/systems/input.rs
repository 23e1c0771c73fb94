//! Input systems.
//!
//! - [`update_input_state`] reads hardware input from Raylib each frame and
//!   writes the results into [`crate::resources::input::InputState`].
//! - Pressing the debug key emits
//!   [`SwitchDebugEvent`](crate::events::switchdebug::SwitchDebugEvent).
use bevy_ecs::prelude::*;

use crate::events::switchdebug::SwitchDebugEvent;
use crate::resources::input::{BoolState, InputState};

fn refresh(state: &mut BoolState, rl: &raylib::RaylibHandle) {
    let keys = std::iter::once(state.key_binding).chain(state.alt_binding);
    let (mut down, mut pressed, mut released) = (false, false, false);
    for key in keys {
        down |= rl.is_key_down(key);
        pressed |= rl.is_key_pressed(key);
        released |= rl.is_key_released(key);
    }
    state.active = down;
    state.just_pressed = pressed;
    state.just_released = released && !down;
}

/// Poll Raylib for keyboard input and update the `InputState` resource.
pub fn update_input_state(
    mut input: ResMut<InputState>,
    rl: NonSend<raylib::RaylibHandle>,
    mut commands: Commands,
) {
    let input = &mut *input;
    for state in [
        &mut input.throttle,
        &mut input.reverse,
        &mut input.steer_left,
        &mut input.steer_right,
        &mut input.brake,
        &mut input.action_back,
        &mut input.mode_debug,
    ] {
        refresh(state, &rl);
    }

    if input.mode_debug.just_pressed {
        commands.trigger(SwitchDebugEvent {});
    }
}
