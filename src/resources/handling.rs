//! Handling tunables for the vehicle integrator.
//!
//! Every constant the dynamics step reads lives here as a named field so that
//! presets can change the handling feel without touching the integrator.
//! A [`HandlingConfig`] can come from a built-in [`HandlingPreset`], a JSON
//! file, or the `[handling]` section of the INI configuration (see
//! [`crate::resources::gameconfig`]).
//!
//! # JSON Format
//!
//! Missing fields fall back to the arcade preset:
//!
//! ```json
//! { "acceleration": 0.02, "grip": 0.7, "brake_trigger": "brake_only" }
//! ```

use configparser::ini::Ini;
use log::warn;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Which inputs select the braking deceleration constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrakeTrigger {
    /// Only an explicit brake input brakes; coasting uses the cruise constant.
    BrakeOnly,
    /// Brake input or zero throttle brakes.
    #[default]
    BrakeOrNeutral,
}

impl BrakeTrigger {
    /// Name used in INI and JSON files.
    pub fn name(self) -> &'static str {
        match self {
            BrakeTrigger::BrakeOnly => "brake_only",
            BrakeTrigger::BrakeOrNeutral => "brake_or_neutral",
        }
    }

    /// Whether this policy brakes for the given throttle/brake pair.
    pub fn is_braking(self, throttle: f32, brake: bool) -> bool {
        match self {
            BrakeTrigger::BrakeOnly => brake,
            BrakeTrigger::BrakeOrNeutral => brake || throttle == 0.0,
        }
    }
}

impl FromStr for BrakeTrigger {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "brake_only" => Ok(BrakeTrigger::BrakeOnly),
            "brake_or_neutral" => Ok(BrakeTrigger::BrakeOrNeutral),
            other => Err(format!("Unknown brake trigger '{}'", other)),
        }
    }
}

/// Named handling bundles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum HandlingPreset {
    /// Forgiving road car. Carries the reference constants.
    #[default]
    Arcade,
    /// Faster, grippier and less twitchy.
    Sport,
    /// Low grip, strong steering, coasts instead of braking.
    Drift,
}

/// Tunable constants of the vehicle dynamics step.
///
/// Units follow the integrator: distances per tick, radians per tick, and
/// seconds for anything driven by the wall clock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandlingConfig {
    /// Velocity added per tick at full throttle.
    pub acceleration: f32,
    /// Velocity scale per tick while not braking.
    pub cruise_deceleration: f32,
    /// Velocity scale per tick while braking.
    pub braking_deceleration: f32,
    /// Unitless [0, 1]; higher grip bleeds less speed while sliding.
    pub grip: f32,
    /// Yaw rate added per tick at full steering and zero speed.
    pub turn_speed: f32,
    pub max_speed: f32,
    /// Yaw rate scale applied every tick.
    pub angular_damping: f32,
    /// Below this speed steering has no effect.
    pub steer_speed_epsilon: f32,
    /// Angular frequency of the cosmetic suspension bob, in rad/s.
    pub suspension_frequency: f32,
    pub suspension_amplitude: f32,
    pub ground_height: f32,
    pub clearance: f32,
    /// Wheel angle accumulated per unit of distance.
    pub wheel_rotation_scale: f32,
    pub skid_slide_threshold: f32,
    pub skid_speed_threshold: f32,
    pub suspension_threshold: f32,
    /// Minimum seconds between two accepted collisions.
    pub collision_refractory: f32,
    pub brake_trigger: BrakeTrigger,
}

impl Default for HandlingConfig {
    fn default() -> Self {
        Self::preset(HandlingPreset::Arcade)
    }
}

impl HandlingConfig {
    /// Build the constants of a named preset.
    pub fn preset(preset: HandlingPreset) -> Self {
        let arcade = Self {
            acceleration: 0.015,
            cruise_deceleration: 0.995,
            braking_deceleration: 0.98,
            grip: 0.9,
            turn_speed: 0.004,
            max_speed: 0.5,
            angular_damping: 0.95,
            steer_speed_epsilon: 0.001,
            suspension_frequency: 15.0,
            suspension_amplitude: 0.1,
            ground_height: 0.0,
            clearance: 0.25,
            wheel_rotation_scale: 2.0,
            skid_slide_threshold: 0.5,
            skid_speed_threshold: 0.1,
            suspension_threshold: 0.01,
            collision_refractory: 0.5,
            brake_trigger: BrakeTrigger::BrakeOrNeutral,
        };
        match preset {
            HandlingPreset::Arcade => arcade,
            HandlingPreset::Sport => Self {
                acceleration: 0.02,
                cruise_deceleration: 0.997,
                braking_deceleration: 0.97,
                grip: 0.97,
                turn_speed: 0.003,
                max_speed: 0.8,
                ..arcade
            },
            HandlingPreset::Drift => Self {
                acceleration: 0.018,
                braking_deceleration: 0.985,
                grip: 0.6,
                turn_speed: 0.006,
                max_speed: 0.6,
                angular_damping: 0.97,
                brake_trigger: BrakeTrigger::BrakeOnly,
                ..arcade
            },
        }
    }

    /// Load a config from a JSON file. Missing fields use the arcade preset.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, String> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read handling file {:?}: {}", path, e))?;
        Self::from_json_str(&text)
    }

    /// Parse a config from JSON text. Out-of-range fields fall back to the
    /// arcade preset.
    pub fn from_json_str(text: &str) -> Result<Self, String> {
        let mut cfg: Self = serde_json::from_str(text)
            .map_err(|e| format!("Failed to parse handling JSON: {}", e))?;
        cfg.sanitize(&Self::default());
        Ok(cfg)
    }

    /// Replace every out-of-range field with the same field of `fallback`.
    ///
    /// Factors and grip must lie in `[0, 1]`, `max_speed` must be positive,
    /// and rates, thresholds and the refractory window must be non-negative.
    /// Non-finite values are always rejected.
    pub fn sanitize(&mut self, fallback: &HandlingConfig) {
        let fields: [(&str, &mut f32, f32, fn(f32) -> bool); 17] = [
            ("acceleration", &mut self.acceleration, fallback.acceleration, non_negative),
            ("cruise_deceleration", &mut self.cruise_deceleration, fallback.cruise_deceleration, unit),
            ("braking_deceleration", &mut self.braking_deceleration, fallback.braking_deceleration, unit),
            ("grip", &mut self.grip, fallback.grip, unit),
            ("turn_speed", &mut self.turn_speed, fallback.turn_speed, non_negative),
            ("max_speed", &mut self.max_speed, fallback.max_speed, positive),
            ("angular_damping", &mut self.angular_damping, fallback.angular_damping, unit),
            ("steer_speed_epsilon", &mut self.steer_speed_epsilon, fallback.steer_speed_epsilon, non_negative),
            ("suspension_frequency", &mut self.suspension_frequency, fallback.suspension_frequency, non_negative),
            ("suspension_amplitude", &mut self.suspension_amplitude, fallback.suspension_amplitude, non_negative),
            ("ground_height", &mut self.ground_height, fallback.ground_height, f32::is_finite),
            ("clearance", &mut self.clearance, fallback.clearance, non_negative),
            ("wheel_rotation_scale", &mut self.wheel_rotation_scale, fallback.wheel_rotation_scale, f32::is_finite),
            ("skid_slide_threshold", &mut self.skid_slide_threshold, fallback.skid_slide_threshold, unit),
            ("skid_speed_threshold", &mut self.skid_speed_threshold, fallback.skid_speed_threshold, non_negative),
            ("suspension_threshold", &mut self.suspension_threshold, fallback.suspension_threshold, non_negative),
            ("collision_refractory", &mut self.collision_refractory, fallback.collision_refractory, non_negative),
        ];
        for (key, slot, default, valid) in fields {
            if !valid(*slot) {
                warn!(
                    "Handling value {} = {} is out of range, using {}",
                    key, *slot, default
                );
                *slot = default;
            }
        }
    }

    /// Write every field into the `[handling]` section of `ini`.
    pub fn write_ini(&self, ini: &mut Ini) {
        let fields: [(&str, f32); 17] = [
            ("acceleration", self.acceleration),
            ("cruise_deceleration", self.cruise_deceleration),
            ("braking_deceleration", self.braking_deceleration),
            ("grip", self.grip),
            ("turn_speed", self.turn_speed),
            ("max_speed", self.max_speed),
            ("angular_damping", self.angular_damping),
            ("steer_speed_epsilon", self.steer_speed_epsilon),
            ("suspension_frequency", self.suspension_frequency),
            ("suspension_amplitude", self.suspension_amplitude),
            ("ground_height", self.ground_height),
            ("clearance", self.clearance),
            ("wheel_rotation_scale", self.wheel_rotation_scale),
            ("skid_slide_threshold", self.skid_slide_threshold),
            ("skid_speed_threshold", self.skid_speed_threshold),
            ("suspension_threshold", self.suspension_threshold),
            ("collision_refractory", self.collision_refractory),
        ];
        for (key, value) in fields {
            ini.set("handling", key, Some(value.to_string()));
        }
        ini.set(
            "handling",
            "brake_trigger",
            Some(self.brake_trigger.name().to_string()),
        );
    }

    /// Overlay values from the `[handling]` section of a parsed INI file.
    ///
    /// Keys that are missing or unparsable keep their current values.
    pub fn apply_ini(&mut self, ini: &Ini) {
        let before = self.clone();
        let fields: [(&str, &mut f32); 17] = [
            ("acceleration", &mut self.acceleration),
            ("cruise_deceleration", &mut self.cruise_deceleration),
            ("braking_deceleration", &mut self.braking_deceleration),
            ("grip", &mut self.grip),
            ("turn_speed", &mut self.turn_speed),
            ("max_speed", &mut self.max_speed),
            ("angular_damping", &mut self.angular_damping),
            ("steer_speed_epsilon", &mut self.steer_speed_epsilon),
            ("suspension_frequency", &mut self.suspension_frequency),
            ("suspension_amplitude", &mut self.suspension_amplitude),
            ("ground_height", &mut self.ground_height),
            ("clearance", &mut self.clearance),
            ("wheel_rotation_scale", &mut self.wheel_rotation_scale),
            ("skid_slide_threshold", &mut self.skid_slide_threshold),
            ("skid_speed_threshold", &mut self.skid_speed_threshold),
            ("suspension_threshold", &mut self.suspension_threshold),
            ("collision_refractory", &mut self.collision_refractory),
        ];
        for (key, slot) in fields {
            if let Some(value) = ini.getfloat("handling", key).ok().flatten() {
                *slot = value as f32;
            }
        }
        if let Some(raw) = ini.get("handling", "brake_trigger") {
            match raw.parse() {
                Ok(trigger) => self.brake_trigger = trigger,
                Err(e) => warn!("Ignoring [handling] brake_trigger: {}", e),
            }
        }
        self.sanitize(&before);
    }
}

fn unit(v: f32) -> bool {
    (0.0..=1.0).contains(&v)
}

fn non_negative(v: f32) -> bool {
    v.is_finite() && v >= 0.0
}

fn positive(v: f32) -> bool {
    v.is_finite() && v > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_arcade() {
        assert_eq!(
            HandlingConfig::default(),
            HandlingConfig::preset(HandlingPreset::Arcade)
        );
    }

    #[test]
    fn test_arcade_reference_constants() {
        let cfg = HandlingConfig::preset(HandlingPreset::Arcade);
        assert_eq!(cfg.acceleration, 0.015);
        assert_eq!(cfg.braking_deceleration, 0.98);
        assert_eq!(cfg.max_speed, 0.5);
    }

    #[test]
    fn test_drift_uses_brake_only() {
        let cfg = HandlingConfig::preset(HandlingPreset::Drift);
        assert_eq!(cfg.brake_trigger, BrakeTrigger::BrakeOnly);
        assert!(cfg.grip < HandlingConfig::default().grip);
    }

    #[test]
    fn test_brake_trigger_policies() {
        assert!(BrakeTrigger::BrakeOrNeutral.is_braking(0.0, false));
        assert!(BrakeTrigger::BrakeOrNeutral.is_braking(1.0, true));
        assert!(!BrakeTrigger::BrakeOrNeutral.is_braking(1.0, false));
        assert!(!BrakeTrigger::BrakeOnly.is_braking(0.0, false));
        assert!(BrakeTrigger::BrakeOnly.is_braking(0.0, true));
    }

    #[test]
    fn test_write_ini_then_apply() {
        let mut cfg = HandlingConfig::preset(HandlingPreset::Drift);
        cfg.grip = 0.42;
        let mut ini = Ini::new();
        cfg.write_ini(&mut ini);
        let mut loaded = HandlingConfig::default();
        loaded.apply_ini(&ini);
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn test_brake_trigger_from_str() {
        assert_eq!("brake_only".parse(), Ok(BrakeTrigger::BrakeOnly));
        assert_eq!(" Brake_Or_Neutral ".parse(), Ok(BrakeTrigger::BrakeOrNeutral));
        assert!("sometimes".parse::<BrakeTrigger>().is_err());
        for trigger in [BrakeTrigger::BrakeOnly, BrakeTrigger::BrakeOrNeutral] {
            assert_eq!(trigger.name().parse(), Ok(trigger));
        }
    }

    #[test]
    fn test_json_partial_uses_defaults() {
        let cfg =
            HandlingConfig::from_json_str(r#"{ "grip": 0.5, "brake_trigger": "brake_only" }"#)
                .unwrap();
        assert_eq!(cfg.grip, 0.5);
        assert_eq!(cfg.brake_trigger, BrakeTrigger::BrakeOnly);
        assert_eq!(cfg.max_speed, HandlingConfig::default().max_speed);
    }

    #[test]
    fn test_json_invalid_is_error() {
        assert!(HandlingConfig::from_json_str("{ grip: }").is_err());
    }

    #[test]
    fn test_json_file_missing_is_error() {
        assert!(HandlingConfig::from_json_file("/nonexistent/handling.json").is_err());
    }

    #[test]
    fn test_apply_ini_overrides() {
        let mut ini = Ini::new();
        ini.read(
            "[handling]\nmax_speed = 0.75\ngrip = 0.8\nbrake_trigger = brake_only\n".to_string(),
        )
        .unwrap();
        let mut cfg = HandlingConfig::default();
        cfg.apply_ini(&ini);
        assert_eq!(cfg.max_speed, 0.75);
        assert_eq!(cfg.grip, 0.8);
        assert_eq!(cfg.brake_trigger, BrakeTrigger::BrakeOnly);
        assert_eq!(cfg.acceleration, 0.015);
    }

    #[test]
    fn test_apply_ini_bad_values_ignored() {
        let mut ini = Ini::new();
        ini.read("[handling]\nmax_speed = fast\nbrake_trigger = maybe\n".to_string())
            .unwrap();
        let mut cfg = HandlingConfig::default();
        cfg.apply_ini(&ini);
        assert_eq!(cfg, HandlingConfig::default());
    }

    #[test]
    fn test_json_out_of_range_falls_back() {
        let cfg = HandlingConfig::from_json_str(
            r#"{ "grip": 2.0, "max_speed": -0.5, "angular_damping": 1.5, "collision_refractory": -1.0, "turn_speed": 0.01 }"#,
        )
        .unwrap();
        let arcade = HandlingConfig::default();
        assert_eq!(cfg.grip, arcade.grip);
        assert_eq!(cfg.max_speed, arcade.max_speed);
        assert_eq!(cfg.angular_damping, arcade.angular_damping);
        assert_eq!(cfg.collision_refractory, arcade.collision_refractory);
        assert_eq!(cfg.turn_speed, 0.01);
    }

    #[test]
    fn test_apply_ini_out_of_range_keeps_preset_value() {
        let mut ini = Ini::new();
        ini.read("[handling]
grip = 1.5
max_speed = 0
braking_deceleration = 0.9
".to_string())
            .unwrap();
        let sport = HandlingConfig::preset(HandlingPreset::Sport);
        let mut cfg = sport.clone();
        cfg.apply_ini(&ini);
        assert_eq!(cfg.grip, sport.grip);
        assert_eq!(cfg.max_speed, sport.max_speed);
        assert_eq!(cfg.braking_deceleration, 0.9);
    }

    #[test]
    fn test_sanitize_rejects_nan() {
        let mut cfg = HandlingConfig {
            cruise_deceleration: f32::NAN,
            ground_height: f32::INFINITY,
            ..HandlingConfig::default()
        };
        cfg.sanitize(&HandlingConfig::default());
        assert_eq!(cfg, HandlingConfig::default());
    }

    #[test]
    fn test_loaded_config_keeps_zero_input_decay() {
        use crate::components::vehicle::{InputFrame, VehicleDynamics, VehicleState};
        use glam::Vec3;

        let cfg = HandlingConfig::from_json_str(r#"{ "grip": 2.0 }"#).unwrap();
        let mut car = VehicleDynamics::with_state(
            cfg,
            VehicleState {
                velocity: Vec3::X * 0.2,
                ..VehicleState::default()
            },
        );
        let mut last = 0.2;
        for tick in 0..5 {
            let derived = car.step(InputFrame::default(), tick as f32 / 60.0);
            assert!(derived.speed <= last);
            last = derived.speed;
        }

        let cfg = HandlingConfig::from_json_str(r#"{ "max_speed": -0.5 }"#).unwrap();
        let mut car = VehicleDynamics::with_state(
            cfg,
            VehicleState {
                velocity: Vec3::Z * 0.2,
                ..VehicleState::default()
            },
        );
        car.step(InputFrame::default(), 0.0);
        assert!(car.state().velocity.z > 0.0);
    }
}
