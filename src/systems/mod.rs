//! Game systems.
//!
//! Submodules overview
//! - [`audio`] – audio reactor system and the bridge with the audio thread
//! - [`input`] – read hardware input and update [`crate::resources::input::InputState`]
//! - [`render`] – draw the car, HUD and debug overlay using Raylib
//! - [`time`] – update simulation time and delta
//! - [`vehicle`] – resolve driver intent and step the car dynamics

pub mod audio;
pub mod input;
pub mod render;
pub mod time;
pub mod vehicle;
