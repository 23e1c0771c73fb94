//! ECS components for entities.
//!
//! Submodules overview:
//! - [`inputcontrolled`] – marker for the car driven by the keyboard
//! - [`vehicle`] – per-tick driver intent, the kinematic integrator and the
//!   derived snapshot it emits

pub mod inputcontrolled;
pub mod vehicle;
