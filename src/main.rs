//! Roadster main entry point.
//!
//! An arcade driving demo built on:
//! - **raylib** for windowing, 3D drawing, keyboard and audio
//! - **bevy_ecs** for the per-tick schedule
//! - **glam** for the vehicle integrator math
//!
//! Each frame the keyboard is resolved into an input frame, the car is
//! stepped once, and the audio reactor turns the new state into engine,
//! tire, skid, suspension and collision sounds on the audio thread.
//!
//! # Main Loop
//!
//! 1. Load `config.ini` (or `--config PATH`), apply `--preset` / `--handling`
//! 2. Initialize the raylib window, the ECS world and the audio thread
//! 3. Request channel assets; channels become ready as loads complete
//! 4. Per frame: input, dynamics, audio, render
//! 5. Stop live loops and join the audio thread on exit
//!
//! # Running
//!
//! ```sh
//! cargo run --release -- --preset drift
//! cargo run --release -- --headless 600
//! ```

// Do not create console on Windows
#![cfg_attr(target_os = "windows", windows_subsystem = "windows")]

mod components;
mod events;
mod game;
mod resources;
mod systems;

use crate::events::switchdebug::switch_debug_observer;
use crate::resources::audio::{setup_audio, setup_audio_messages, shutdown_audio};
use crate::resources::gameconfig::GameConfig;
use crate::resources::handling::{HandlingConfig, HandlingPreset};
use crate::resources::input::InputState;
use crate::systems::audio::load_channel_assets;
use crate::systems::input::update_input_state;
use crate::systems::render::render_system;
use crate::systems::time::update_world_time;
use crate::systems::vehicle::{vehicle_dynamics, vehicle_input_controller};
use bevy_ecs::prelude::*;
use clap::Parser;
use log::{error, info, warn};
use std::path::PathBuf;

/// Roadster: arcade driving with speed-reactive audio.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Configuration file (default: ./config.ini).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Handling preset, overriding the config file.
    #[arg(long, value_enum)]
    preset: Option<HandlingPreset>,

    /// JSON handling file, applied after the preset.
    #[arg(long, value_name = "PATH")]
    handling: Option<PathBuf>,

    /// Run this many ticks of a scripted drive without a window and exit.
    #[arg(long, value_name = "TICKS")]
    headless: Option<u32>,

    /// Do not open the audio device.
    #[arg(long)]
    mute: bool,
}

fn load_config(cli: &Cli) -> GameConfig {
    let mut config = match &cli.config {
        Some(path) => GameConfig::with_path(path),
        None => GameConfig::new(),
    };
    if let Err(e) = config.load_from_file() {
        warn!("{}; using defaults", e);
    }
    if let Some(preset) = cli.preset {
        config.set_preset(preset);
        info!("Using handling preset {:?}", preset);
    }
    if let Some(path) = &cli.handling {
        match HandlingConfig::from_json_file(path) {
            Ok(handling) => {
                info!("Loaded handling from {}", path.display());
                config.handling = handling;
            }
            Err(e) => error!("{}", e),
        }
    }
    config
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = load_config(&cli);

    // Early-exit: scripted run, no window or audio device
    if let Some(ticks) = cli.headless {
        game::run_headless(&config, ticks);
        return;
    }

    // --------------- Raylib window ---------------
    let (window_width, window_height) = config.window_size();
    let mut builder = raylib::init();
    builder
        .size(window_width as i32, window_height as i32)
        .title("Roadster");
    if config.vsync {
        builder.vsync();
    }
    let (mut rl, thread) = builder.build();
    rl.set_target_fps(config.target_fps);
    // Esc is the in-game back action
    rl.set_exit_key(None);

    // --------------- ECS world + resources ---------------
    let mut world = World::new();
    if cli.mute {
        info!("Audio muted");
        setup_audio_messages(&mut world);
    } else {
        setup_audio(&mut world);
    }
    game::setup_world(&mut world, config.handling.clone(), config.audio);
    if !cli.mute {
        load_channel_assets(&mut world, &config.audio_paths);
    }
    world.insert_resource(config);
    world.insert_non_send_resource(rl);
    world.insert_non_send_resource(thread);

    // --------------- Observers ---------------
    world.add_observer(switch_debug_observer);

    // --------------- Schedule ---------------
    let mut update = game::simulation_schedule();
    update.add_systems(update_input_state.before(vehicle_input_controller));
    update.add_systems(render_system.after(vehicle_dynamics));

    if let Err(e) = update.initialize(&mut world) {
        error!("Failed to initialize schedule: {}", e);
        shutdown_audio(&mut world);
        return;
    }

    // --------------- Main loop ---------------
    while !world
        .non_send_resource::<raylib::RaylibHandle>()
        .window_should_close()
        && !world.resource::<InputState>().action_back.just_pressed
    {
        let dt = world
            .non_send_resource::<raylib::RaylibHandle>()
            .get_frame_time();
        update_world_time(&mut world, dt);

        update.run(&mut world);

        world.clear_trackers(); // Clear changed components for next frame
    }
    shutdown_audio(&mut world);
}
