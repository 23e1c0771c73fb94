//! Arcade vehicle dynamics.
//!
//! [`VehicleDynamics`] owns the continuous [`VehicleState`] of one car and
//! advances it one tick at a time from an [`InputFrame`], emitting a
//! [`DerivedState`] snapshot that the audio reactor and the renderer consume.
//!
//! The model is kinematic, not force based: velocity is in distance per tick,
//! yaw rate in radians per tick, and each step applies throttle, rolling
//! resistance with grip-dependent slide bleed-off, speed-scaled steering, yaw
//! damping, a max speed clamp and a cosmetic suspension bob. Every constant
//! comes from [`HandlingConfig`].
//!
//! Collision detection is a stub that never reports contact. The refractory
//! window that debounces collisions is fully implemented and can be driven
//! through [`VehicleDynamics::step_with_contact`].

use bevy_ecs::prelude::Component;
use glam::{Quat, Vec3};
use log::debug;

use crate::resources::handling::HandlingConfig;

/// Heading of an unrotated car.
pub const WORLD_FORWARD: Vec3 = Vec3::Z;
pub const WORLD_UP: Vec3 = Vec3::Y;

/// Driver intent for one tick.
///
/// `throttle` is usually one of `-1`, `-0.5`, `0`, `1` and `steering` one of
/// `-1`, `0`, `1`, but any value is accepted and clamped to `[-1, 1]`.
#[derive(Component, Clone, Copy, Debug, Default, PartialEq)]
pub struct InputFrame {
    pub throttle: f32,
    pub steering: f32,
    pub brake: bool,
}

impl InputFrame {
    pub fn new(throttle: f32, steering: f32, brake: bool) -> Self {
        Self {
            throttle,
            steering,
            brake,
        }
    }

    /// Copy with throttle and steering clamped to `[-1, 1]`.
    ///
    /// NaN collapses to zero so a bad frame can never poison the state.
    pub fn clamped(self) -> Self {
        let clamp = |v: f32| if v.is_nan() { 0.0 } else { v.clamp(-1.0, 1.0) };
        Self {
            throttle: clamp(self.throttle),
            steering: clamp(self.steering),
            brake: self.brake,
        }
    }
}

/// Continuous state of a car. Only [`VehicleDynamics::step`] mutates it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VehicleState {
    pub position: Vec3,
    /// Unit quaternion; renormalized every step.
    pub orientation: Quat,
    /// World-space velocity in distance per tick.
    pub velocity: Vec3,
    /// Yaw rate in radians per tick.
    pub angular_velocity: f32,
    /// Accumulates without bound; consumers wrap it.
    pub wheel_rotation_angle: f32,
    pub suspension_offset: f32,
    /// Elapsed seconds of the last accepted collision.
    pub last_collision: Option<f32>,
}

impl Default for VehicleState {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            velocity: Vec3::ZERO,
            angular_velocity: 0.0,
            wheel_rotation_angle: 0.0,
            suspension_offset: 0.0,
            last_collision: None,
        }
    }
}

impl VehicleState {
    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }
}

/// Snapshot emitted once per tick.
#[derive(Component, Clone, Copy, Debug, Default, PartialEq)]
pub struct DerivedState {
    pub position: Vec3,
    pub orientation: Quat,
    pub speed: f32,
    pub is_skidding: bool,
    pub is_suspension_active: bool,
    pub has_collision: bool,
    pub wheel_rotation_angle: f32,
    /// `1 - |cos|` of the angle between heading and velocity this tick.
    pub slide_amount: f32,
}

/// The vehicle integrator, attached to the car entity as a component.
///
/// # Example
/// ```ignore
/// let mut car = VehicleDynamics::new(HandlingConfig::default());
/// car.initialize(Vec3::ZERO, Quat::IDENTITY);
/// let derived = car.step(InputFrame::new(1.0, 0.0, false), elapsed);
/// ```
#[derive(Component, Clone, Debug)]
pub struct VehicleDynamics {
    state: VehicleState,
    config: HandlingConfig,
}

impl Default for VehicleDynamics {
    fn default() -> Self {
        Self::new(HandlingConfig::default())
    }
}

impl VehicleDynamics {
    /// Create a car at rest at the origin.
    pub fn new(config: HandlingConfig) -> Self {
        Self {
            state: VehicleState::default(),
            config,
        }
    }

    /// Create a car from an explicit state, e.g. to replay a scenario.
    pub fn with_state(config: HandlingConfig, state: VehicleState) -> Self {
        Self { state, config }
    }

    /// Place the car at its starting pose with no motion.
    pub fn initialize(&mut self, position: Vec3, orientation: Quat) {
        self.state = VehicleState {
            position,
            orientation: orientation.normalize(),
            ..VehicleState::default()
        };
    }

    pub fn state(&self) -> &VehicleState {
        &self.state
    }

    pub fn config(&self) -> &HandlingConfig {
        &self.config
    }

    /// Replace the handling constants, keeping the current state.
    pub fn set_config(&mut self, config: HandlingConfig) {
        self.config = config;
    }

    /// Unit heading in world space.
    pub fn forward(&self) -> Vec3 {
        self.state.orientation * WORLD_FORWARD
    }

    /// Advance one tick. `elapsed` is the wall clock in seconds.
    pub fn step(&mut self, input: InputFrame, elapsed: f32) -> DerivedState {
        let contact = self.detect_contact();
        self.step_with_contact(input, elapsed, contact)
    }

    /// Advance one tick with an externally reported contact.
    pub fn step_with_contact(
        &mut self,
        input: InputFrame,
        elapsed: f32,
        contact: bool,
    ) -> DerivedState {
        let input = input.clamped();
        let cfg = &self.config;
        let st = &mut self.state;

        let forward = st.orientation * WORLD_FORWARD;

        let speed = st.velocity.length();
        let normalized_velocity = if speed > 0.0 {
            st.velocity / speed
        } else {
            Vec3::ZERO
        };

        if input.throttle != 0.0 {
            st.velocity += forward * input.throttle * cfg.acceleration;
        }

        let slide_amount = 1.0 - forward.dot(normalized_velocity).abs();

        let deceleration = if cfg.brake_trigger.is_braking(input.throttle, input.brake) {
            cfg.braking_deceleration
        } else {
            cfg.cruise_deceleration
        };
        st.velocity *= (deceleration - slide_amount * (1.0 - cfg.grip)).max(0.0);

        // Steering authority fades with speed.
        if input.steering != 0.0 && speed > cfg.steer_speed_epsilon {
            st.angular_velocity +=
                input.steering * cfg.turn_speed * (1.0 - 0.5 * speed / cfg.max_speed);
        }
        st.angular_velocity *= cfg.angular_damping;

        let yaw = Quat::from_axis_angle(WORLD_UP, -st.angular_velocity);
        st.orientation = (yaw * st.orientation).normalize();

        let speed = st.velocity.length();
        if speed > cfg.max_speed {
            st.velocity *= cfg.max_speed / speed;
        }
        let speed = st.velocity.length();

        st.position += st.velocity;

        st.suspension_offset =
            (elapsed * cfg.suspension_frequency).sin() * cfg.suspension_amplitude * speed;
        st.position.y = cfg.ground_height + st.suspension_offset.abs() + cfg.clearance;

        let has_collision = contact
            && match st.last_collision {
                Some(last) => elapsed - last > cfg.collision_refractory,
                None => true,
            };
        if has_collision {
            debug!("collision accepted at t={:.3}", elapsed);
            st.last_collision = Some(elapsed);
        }

        st.wheel_rotation_angle += speed * cfg.wheel_rotation_scale;

        DerivedState {
            position: st.position,
            orientation: st.orientation,
            speed,
            is_skidding: slide_amount > cfg.skid_slide_threshold
                && speed > cfg.skid_speed_threshold,
            is_suspension_active: st.suspension_offset.abs() > cfg.suspension_threshold,
            has_collision,
            wheel_rotation_angle: st.wheel_rotation_angle,
            slide_amount,
        }
    }

    // No collision geometry exists yet.
    fn detect_contact(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    fn neutral() -> InputFrame {
        InputFrame::default()
    }

    fn full_throttle() -> InputFrame {
        InputFrame::new(1.0, 0.0, false)
    }

    fn moving_car(velocity: Vec3) -> VehicleDynamics {
        VehicleDynamics::with_state(
            HandlingConfig::default(),
            VehicleState {
                velocity,
                ..VehicleState::default()
            },
        )
    }

    // ==================== INPUT FRAME TESTS ====================

    #[test]
    fn test_input_frame_clamps() {
        let frame = InputFrame::new(3.0, -7.5, true).clamped();
        assert_eq!(frame, InputFrame::new(1.0, -1.0, true));
    }

    #[test]
    fn test_input_frame_nan_becomes_zero() {
        let frame = InputFrame::new(f32::NAN, f32::NAN, false).clamped();
        assert_eq!(frame.throttle, 0.0);
        assert_eq!(frame.steering, 0.0);
    }

    // ==================== INITIALIZE TESTS ====================

    #[test]
    fn test_initialize_sets_pose_and_clears_motion() {
        let mut car = moving_car(Vec3::new(0.0, 0.0, 0.3));
        let pose = Quat::from_rotation_y(1.0);
        car.initialize(Vec3::new(5.0, 0.0, -2.0), pose);
        assert_eq!(car.state().position, Vec3::new(5.0, 0.0, -2.0));
        assert!(car.state().orientation.abs_diff_eq(pose, EPSILON));
        assert_eq!(car.state().velocity, Vec3::ZERO);
        assert_eq!(car.state().last_collision, None);
    }

    #[test]
    fn test_initialize_normalizes_orientation() {
        let mut car = VehicleDynamics::default();
        car.initialize(Vec3::ZERO, Quat::from_xyzw(0.0, 0.0, 0.0, 2.0));
        assert!(car.state().orientation.is_normalized());
    }

    // ==================== THROTTLE & SPEED TESTS ====================

    #[test]
    fn test_throttle_accelerates_along_heading() {
        let mut car = VehicleDynamics::default();
        let derived = car.step(full_throttle(), 0.0);
        assert!(derived.speed > 0.0);
        let dir = car.state().velocity.normalize();
        assert!(dir.abs_diff_eq(WORLD_FORWARD, EPSILON));
    }

    #[test]
    fn test_reverse_moves_backwards() {
        let mut car = VehicleDynamics::default();
        car.step(InputFrame::new(-1.0, 0.0, false), 0.0);
        assert!(car.state().velocity.z < 0.0);
    }

    #[test]
    fn test_speed_never_exceeds_max() {
        let mut car = VehicleDynamics::default();
        let max = car.config().max_speed;
        let mut last = 0.0;
        for tick in 0..500 {
            let derived = car.step(full_throttle(), tick as f32 / 60.0);
            assert!(derived.speed <= max + EPSILON);
            last = derived.speed;
        }
        assert!(approx_eq(last, max));
    }

    #[test]
    fn test_speed_clamp_rescales_direction_preserved() {
        let mut car = moving_car(Vec3::new(3.0, 0.0, 4.0));
        car.step(neutral(), 0.0);
        let v = car.state().velocity;
        assert!(approx_eq(v.length(), car.config().max_speed));
        assert!(approx_eq(v.x / v.z, 0.75));
    }

    #[test]
    fn test_zero_input_decays_speed_and_yaw() {
        let mut car = VehicleDynamics::with_state(
            HandlingConfig::default(),
            VehicleState {
                velocity: Vec3::new(0.1, 0.0, 0.3),
                angular_velocity: 0.05,
                ..VehicleState::default()
            },
        );
        let mut last_speed = car.state().speed();
        let mut last_yaw = car.state().angular_velocity.abs();
        for tick in 0..400 {
            let derived = car.step(neutral(), tick as f32 / 60.0);
            let yaw = car.state().angular_velocity.abs();
            assert!(derived.speed <= last_speed + EPSILON);
            assert!(yaw <= last_yaw);
            last_speed = derived.speed;
            last_yaw = yaw;
        }
        assert!(last_speed < 1e-3);
        assert!(last_yaw < 1e-6);
    }

    #[test]
    fn test_brake_only_coasts_on_neutral() {
        let mut config = HandlingConfig::default();
        config.brake_trigger = crate::resources::handling::BrakeTrigger::BrakeOnly;
        let start = VehicleState {
            velocity: Vec3::new(0.0, 0.0, 0.2),
            ..VehicleState::default()
        };
        let mut coasting = VehicleDynamics::with_state(config.clone(), start);
        let mut braking = VehicleDynamics::with_state(config.clone(), start);
        let a = coasting.step(neutral(), 0.0);
        let b = braking.step(InputFrame::new(0.0, 0.0, true), 0.0);
        assert!(approx_eq(a.speed, 0.2 * config.cruise_deceleration));
        assert!(approx_eq(b.speed, 0.2 * config.braking_deceleration));
    }

    // ==================== STEERING TESTS ====================

    #[test]
    fn test_steering_ignored_at_rest() {
        let mut car = VehicleDynamics::default();
        car.step(InputFrame::new(0.0, 1.0, false), 0.0);
        assert_eq!(car.state().angular_velocity, 0.0);
        assert!(car.state().orientation.abs_diff_eq(Quat::IDENTITY, EPSILON));
    }

    #[test]
    fn test_steering_authority_decreases_with_speed() {
        let max = HandlingConfig::default().max_speed;
        let mut previous = f32::INFINITY;
        for i in 1..=10 {
            let speed = max * i as f32 / 10.0;
            let mut car = moving_car(WORLD_FORWARD * speed);
            car.step(InputFrame::new(0.0, 1.0, false), 0.0);
            let increment = car.state().angular_velocity;
            assert!(increment > 0.0);
            assert!(increment < previous, "speed {} gave {}", speed, increment);
            previous = increment;
        }
    }

    #[test]
    fn test_steering_turns_heading() {
        let mut car = VehicleDynamics::default();
        for tick in 0..20 {
            car.step(InputFrame::new(1.0, 1.0, false), tick as f32 / 60.0);
        }
        let forward = car.forward();
        assert!(forward.x.abs() > 0.05);
        assert!(approx_eq(forward.y, 0.0));
        assert!(car.state().orientation.is_normalized());
    }

    // ==================== SKID TESTS ====================

    #[test]
    fn test_skid_when_velocity_orthogonal() {
        let mut car = moving_car(Vec3::X * 0.2);
        let derived = car.step(neutral(), 0.0);
        assert!(approx_eq(derived.slide_amount, 1.0));
        assert!(derived.is_skidding);
    }

    #[test]
    fn test_no_skid_below_speed_floor() {
        let mut car = moving_car(Vec3::X * 0.05);
        let derived = car.step(neutral(), 0.0);
        assert!(approx_eq(derived.slide_amount, 1.0));
        assert!(!derived.is_skidding);
    }

    #[test]
    fn test_no_skid_when_aligned() {
        let mut car = moving_car(WORLD_FORWARD * 0.4);
        let derived = car.step(full_throttle(), 0.0);
        assert!(approx_eq(derived.slide_amount, 0.0));
        assert!(!derived.is_skidding);
    }

    #[test]
    fn test_slide_bleeds_more_speed_with_low_grip() {
        let mut grippy = HandlingConfig::default();
        grippy.grip = 1.0;
        let mut slippery = HandlingConfig::default();
        slippery.grip = 0.5;
        let start = VehicleState {
            velocity: Vec3::X * 0.3,
            ..VehicleState::default()
        };
        let a = VehicleDynamics::with_state(grippy, start).step(neutral(), 0.0);
        let b = VehicleDynamics::with_state(slippery, start).step(neutral(), 0.0);
        assert!(b.speed < a.speed);
    }

    // ==================== SUSPENSION & WHEEL TESTS ====================

    #[test]
    fn test_suspension_rests_on_ground_when_still() {
        let mut car = VehicleDynamics::default();
        let derived = car.step(neutral(), 1.3);
        let cfg = car.config();
        assert!(approx_eq(derived.position.y, cfg.ground_height + cfg.clearance));
        assert!(!derived.is_suspension_active);
    }

    #[test]
    fn test_suspension_bob_scales_with_speed() {
        let mut car = moving_car(WORLD_FORWARD * 0.5);
        // sin(0.1 * 15) is close to its peak
        let derived = car.step(full_throttle(), 0.1);
        let cfg = car.config().clone();
        let expected = (0.1f32 * cfg.suspension_frequency).sin() * cfg.suspension_amplitude * 0.5;
        assert!(approx_eq(car.state().suspension_offset, expected));
        assert!(approx_eq(
            derived.position.y,
            cfg.ground_height + expected.abs() + cfg.clearance
        ));
        assert!(derived.is_suspension_active);
    }

    #[test]
    fn test_wheel_angle_accumulates() {
        let mut car = moving_car(WORLD_FORWARD * 0.4);
        let a = car.step(full_throttle(), 0.0);
        let b = car.step(full_throttle(), 0.0);
        let scale = car.config().wheel_rotation_scale;
        assert!(approx_eq(a.wheel_rotation_angle, a.speed * scale));
        assert!(approx_eq(
            b.wheel_rotation_angle,
            a.wheel_rotation_angle + b.speed * scale
        ));
    }

    #[test]
    fn test_position_integrates_velocity() {
        let mut car = moving_car(WORLD_FORWARD * 0.2);
        let before = car.state().position;
        car.step(neutral(), 0.0);
        let v = car.state().velocity;
        let after = car.state().position;
        assert!(approx_eq(after.z, before.z + v.z));
        assert!(approx_eq(after.x, before.x + v.x));
    }

    // ==================== COLLISION TESTS ====================

    #[test]
    fn test_stub_never_collides() {
        let mut car = VehicleDynamics::default();
        for tick in 0..100 {
            let derived = car.step(full_throttle(), tick as f32 * 0.1);
            assert!(!derived.has_collision);
        }
    }

    #[test]
    fn test_collisions_within_refractory_window_debounced() {
        let mut car = VehicleDynamics::default();
        let first = car.step_with_contact(neutral(), 10.0, true);
        let second = car.step_with_contact(neutral(), 10.1, true);
        assert!(first.has_collision);
        assert!(!second.has_collision);
        assert_eq!(car.state().last_collision, Some(10.0));
    }

    #[test]
    fn test_collisions_outside_refractory_window_accepted() {
        let mut car = VehicleDynamics::default();
        let first = car.step_with_contact(neutral(), 10.0, true);
        let second = car.step_with_contact(neutral(), 10.6, true);
        assert!(first.has_collision);
        assert!(second.has_collision);
        assert_eq!(car.state().last_collision, Some(10.6));
    }

    #[test]
    fn test_rejected_collision_does_not_extend_window() {
        let mut car = VehicleDynamics::default();
        assert!(car.step_with_contact(neutral(), 0.0, true).has_collision);
        assert!(!car.step_with_contact(neutral(), 0.4, true).has_collision);
        assert!(car.step_with_contact(neutral(), 0.55, true).has_collision);
    }

    // ==================== SCENARIO TESTS ====================

    #[test]
    fn test_fifty_ticks_of_throttle_reach_max_speed() {
        let mut car = VehicleDynamics::default();
        let mut derived = DerivedState::default();
        for tick in 0..50 {
            derived = car.step(full_throttle(), tick as f32 / 60.0);
        }
        let max = car.config().max_speed;
        assert!((derived.speed - max).abs() <= max * 0.01);
    }
}
