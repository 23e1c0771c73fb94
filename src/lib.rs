//! Roadster library.
//!
//! Exposes the vehicle dynamics, audio reactor, ECS resources and systems for
//! integration tests and alternative front-ends.

pub mod components;
pub mod events;
pub mod game;
pub mod resources;
pub mod systems;
