//! Raylib 3D view of the player's car.
//!
//! The car is drawn from its [`DerivedState`] only: a chain of boxes along
//! the heading for the body, four wheels whose spokes follow
//! `wheel_rotation_angle`, and a chase camera behind it. A HUD shows speed
//! and skid state; with [`DebugMode`] present a telemetry overlay lists the
//! integrator and audio channel state.

use bevy_ecs::prelude::*;
use glam::Vec3;
use raylib::prelude::*;

use crate::components::inputcontrolled::PlayerControlled;
use crate::components::vehicle::{DerivedState, VehicleDynamics, WORLD_FORWARD, WORLD_UP};
use crate::resources::audioreactor::{AudioReactor, Channel};
use crate::resources::debugmode::DebugMode;

const CAMERA_DISTANCE: f32 = 7.0;
const CAMERA_HEIGHT: f32 = 3.0;
const WHEEL_RADIUS: f32 = 0.3;
const HALF_TRACK: f32 = 0.6;
const HALF_WHEELBASE: f32 = 0.8;

fn v3(v: Vec3) -> Vector3 {
    Vector3::new(v.x, v.y, v.z)
}

/// Draw one frame. Runs after the dynamics step.
pub fn render_system(
    mut rl: NonSendMut<raylib::RaylibHandle>,
    th: NonSend<raylib::RaylibThread>,
    cars: Query<(&DerivedState, &VehicleDynamics), With<PlayerControlled>>,
    reactor: Res<AudioReactor>,
    debug: Option<Res<DebugMode>>,
) {
    let Ok((derived, car)) = cars.single() else {
        return;
    };
    let forward = derived.orientation * WORLD_FORWARD;
    let right = forward.cross(WORLD_UP);
    let ground = car.config().ground_height;

    let eye = derived.position - forward * CAMERA_DISTANCE + WORLD_UP * CAMERA_HEIGHT;
    let camera = Camera3D::perspective(
        v3(eye),
        v3(derived.position),
        v3(WORLD_UP),
        60.0,
    );

    let mut d = rl.begin_drawing(&th);
    d.clear_background(Color::SKYBLUE);
    {
        let mut d3 = d.begin_mode3D(camera);
        d3.draw_plane(
            Vector3::new(0.0, ground, 0.0),
            Vector2::new(400.0, 400.0),
            Color::DARKGREEN,
        );
        d3.draw_grid(200, 2.0);

        let body_color = if derived.has_collision {
            Color::ORANGE
        } else {
            Color::MAROON
        };
        for k in [-0.6f32, 0.0, 0.6] {
            let center = derived.position + forward * k;
            d3.draw_cube(v3(center), 0.9, 0.5, 0.9, body_color);
            d3.draw_cube_wires(v3(center), 0.9, 0.5, 0.9, Color::BLACK);
        }
        d3.draw_line_3D(
            v3(derived.position),
            v3(derived.position + forward * 1.6),
            Color::YELLOW,
        );

        let spoke_dir = forward * derived.wheel_rotation_angle.sin()
            + WORLD_UP * derived.wheel_rotation_angle.cos();
        for (side, axle) in [(-1.0f32, -1.0f32), (-1.0, 1.0), (1.0, -1.0), (1.0, 1.0)] {
            let mut center = derived.position
                + right * (side * HALF_TRACK)
                + forward * (axle * HALF_WHEELBASE);
            center.y = ground + WHEEL_RADIUS;
            d3.draw_sphere(v3(center), WHEEL_RADIUS, Color::DARKGRAY);
            d3.draw_line_3D(
                v3(center),
                v3(center + spoke_dir * WHEEL_RADIUS * 1.2),
                Color::WHITE,
            );
        }
    }

    d.draw_text(
        &format!("speed {:.3}", derived.speed),
        10,
        10,
        20,
        Color::BLACK,
    );
    if derived.is_skidding {
        d.draw_text("SKID", 10, 34, 20, Color::RED);
    }
    d.draw_fps(10, d.get_screen_height() - 24);

    if debug.is_some() {
        let state = car.state();
        let lines = [
            format!("slide {:.2}", derived.slide_amount),
            format!("yaw rate {:.4}", state.angular_velocity),
            format!("suspension {:.4}", state.suspension_offset),
            format!("wheel angle {:.1}", state.wheel_rotation_angle),
        ];
        let mut y = 70;
        for line in lines.iter() {
            d.draw_text(line, 10, y, 10, Color::BLACK);
            y += 14;
        }
        for channel in Channel::ALL {
            let ch = reactor.channel(channel);
            let text = format!(
                "{:<10} {:?} playing={} gain={:.2}",
                channel.id(),
                reactor.readiness(channel),
                ch.is_playing,
                ch.gain
            );
            d.draw_text(&text, 10, y, 10, Color::BLACK);
            y += 14;
        }
    }
}
