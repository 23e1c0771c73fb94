//! ECS resources made available to systems.
//!
//! Overview
//! - `audio` – bridge and channels for the background audio thread
//! - `audioreactor` – channel policies turning vehicle state into sound
//! - `debugmode` – presence toggles the telemetry overlay
//! - `gameconfig` – INI-backed window, handling and audio settings
//! - `handling` – tunable vehicle constants and named presets
//! - `input` – per-frame keyboard state of keys relevant to driving
//! - `worldtime` – simulation time and delta
pub mod audio;
pub mod audioreactor;
pub mod debugmode;
pub mod gameconfig;
pub mod handling;
pub mod input;
pub mod worldtime;
