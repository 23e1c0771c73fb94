//! Input-controlled vehicle marker.
//!
//! Entities tagged with [`PlayerControlled`] receive a fresh
//! [`InputFrame`](crate::components::vehicle::InputFrame) from the keyboard
//! every tick (see [`crate::systems::vehicle::vehicle_input_controller`]),
//! and their [`DerivedState`](crate::components::vehicle::DerivedState) is what
//! the audio reactor listens to.

use bevy_ecs::prelude::Component;

/// Marks the car driven by the local player.
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct PlayerControlled;
