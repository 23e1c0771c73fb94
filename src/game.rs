//! Scene setup and the per-tick schedule.
//!
//! [`setup_world`] inserts the simulation resources and spawns the player's
//! car; [`simulation_schedule`] returns the ordered tick:
//!
//! 1. keyboard → [`InputFrame`]
//! 2. vehicle dynamics step → [`DerivedState`]
//! 3. audio reactor → `AudioCmd` messages
//! 4. audio message queues (forward to / poll from the audio thread)
//! 5. channel readiness tracking
//!
//! Input polling and rendering need the Raylib handle and are added by the
//! windowed front-end only, so the same schedule runs headless and in tests.
//! [`run_headless`] drives it with a scripted lap instead of the keyboard.

use bevy_ecs::prelude::*;
use glam::{Quat, Vec3};
use log::info;

use crate::components::inputcontrolled::PlayerControlled;
use crate::components::vehicle::{DerivedState, InputFrame, VehicleDynamics};
use crate::resources::audio::setup_audio_messages;
use crate::resources::audioreactor::{AudioReactor, AudioTuning, Channel};
use crate::resources::gameconfig::GameConfig;
use crate::resources::handling::HandlingConfig;
use crate::resources::input::InputState;
use crate::resources::worldtime::WorldTime;
use crate::systems::audio::{
    audio_reactor_system, forward_audio_cmds, poll_audio_messages, track_audio_readiness,
    update_bevy_audio_cmds, update_bevy_audio_messages,
};
use crate::systems::time::update_world_time;
use crate::systems::vehicle::{vehicle_dynamics, vehicle_input_controller};

/// Insert simulation resources and spawn the player's car at the origin.
///
/// The audio message queues must already exist (see
/// [`crate::resources::audio::setup_audio`] and
/// [`crate::resources::audio::setup_audio_messages`]).
pub fn setup_world(world: &mut World, handling: HandlingConfig, tuning: AudioTuning) -> Entity {
    world.insert_resource(WorldTime::default());
    world.insert_resource(InputState::default());
    world.insert_resource(AudioReactor::new(tuning));
    spawn_player_vehicle(world, handling, Vec3::ZERO, Quat::IDENTITY)
}

/// Spawn a player-controlled car at the given pose.
pub fn spawn_player_vehicle(
    world: &mut World,
    handling: HandlingConfig,
    position: Vec3,
    orientation: Quat,
) -> Entity {
    let mut car = VehicleDynamics::new(handling);
    car.initialize(position, orientation);
    let derived = DerivedState {
        position: car.state().position,
        orientation: car.state().orientation,
        ..DerivedState::default()
    };
    let entity = world
        .spawn((car, InputFrame::default(), derived, PlayerControlled))
        .id();
    info!("Spawned player vehicle {:?} at {}", entity, position);
    entity
}

/// Build the ordered per-tick schedule shared by every front-end.
pub fn simulation_schedule() -> Schedule {
    let mut update = Schedule::default();
    update.add_systems(
        (
            vehicle_input_controller,
            vehicle_dynamics,
            audio_reactor_system,
            // audio systems must be together
            update_bevy_audio_cmds,
            forward_audio_cmds,
            poll_audio_messages,
            update_bevy_audio_messages,
            track_audio_readiness,
        )
            .chain(),
    );
    update
}

/// Set the held keys for tick `tick` of a `ticks`-long scripted run.
///
/// Full throttle for the first two thirds with a right-hand turn in the
/// middle third, then coasting, with the brake held for the last sixth.
fn scripted_keys(input: &mut InputState, tick: u32, ticks: u32) {
    input.throttle.active = tick < ticks * 2 / 3;
    input.steer_right.active = tick >= ticks / 3 && tick < ticks * 2 / 3;
    input.brake.active = tick >= ticks * 5 / 6;
}

/// Run `ticks` fixed-rate ticks without a window or audio device.
///
/// Every channel is treated as loaded so the reactor's decisions can be
/// observed. Returns the final snapshot together with the reactor.
pub fn run_headless(config: &GameConfig, ticks: u32) -> (DerivedState, AudioReactor) {
    let mut world = World::new();
    setup_audio_messages(&mut world);
    let player = setup_world(&mut world, config.handling.clone(), config.audio);
    {
        let mut reactor = world.resource_mut::<AudioReactor>();
        for channel in Channel::ALL {
            reactor.mark_ready(channel);
        }
    }

    let dt = 1.0 / config.target_fps.max(1) as f32;
    let mut schedule = simulation_schedule();
    for tick in 0..ticks {
        scripted_keys(&mut world.resource_mut::<InputState>(), tick, ticks);
        update_world_time(&mut world, dt);
        schedule.run(&mut world);
        world.clear_trackers();
    }

    let derived = world
        .get::<DerivedState>(player)
        .copied()
        .unwrap_or_default();
    let reactor = world
        .remove_resource::<AudioReactor>()
        .unwrap_or_default();
    info!(
        "Headless run finished after {} ticks: speed={:.3} position={} skidding={}",
        ticks, derived.speed, derived.position, derived.is_skidding
    );
    (derived, reactor)
}
