//! Vehicle systems.
//!
//! - [`vehicle_input_controller`] resolves the keyboard into an
//!   [`InputFrame`] on every player-controlled car.
//! - [`vehicle_dynamics`] advances each car one tick and stores the emitted
//!   [`DerivedState`] next to it for the reactor and the renderer.

use bevy_ecs::prelude::*;

use crate::components::inputcontrolled::PlayerControlled;
use crate::components::vehicle::{DerivedState, InputFrame, VehicleDynamics};
use crate::resources::input::InputState;
use crate::resources::worldtime::WorldTime;

/// Write this tick's driver intent on every player-controlled car.
pub fn vehicle_input_controller(
    mut query: Query<&mut InputFrame, With<PlayerControlled>>,
    input: Res<InputState>,
) {
    let frame = input.frame();
    for mut current in query.iter_mut() {
        *current = frame;
    }
}

/// Step every car once with its current [`InputFrame`].
pub fn vehicle_dynamics(
    mut query: Query<(&mut VehicleDynamics, &InputFrame, &mut DerivedState)>,
    time: Res<WorldTime>,
) {
    for (mut car, input, mut derived) in query.iter_mut() {
        *derived = car.step(*input, time.elapsed);
    }
}
