//! Debug toggle resource.
//!
//! The mere presence of this resource enables the telemetry overlay (slide
//! amount, yaw, channel states). Remove it to disable debug behavior.

use bevy_ecs::prelude::Resource;

/// Marker resource: when present, the renderer draws the telemetry overlay.
#[derive(Resource, Clone, Copy)]
pub struct DebugMode {}
