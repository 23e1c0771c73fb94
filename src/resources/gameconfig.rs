//! Game configuration resource.
//!
//! Manages settings loaded from an INI configuration file. Provides defaults
//! for safe startup and methods to load/save configuration.
//!
//! # Configuration File Format
//!
//! ```ini
//! [window]
//! width = 1280
//! height = 720
//! vsync = true
//! target_fps = 60
//!
//! [handling]
//! preset = sport
//! grip = 0.85
//!
//! [audio]
//! tires_threshold = 0.12
//! engine_path = assets/audio/engine.ogg
//! collision_path = assets/audio/collision.wav
//! ```
//!
//! `[handling]` starts from `preset` (default `arcade`) and then applies any
//! [`HandlingConfig`] field given by name. `[audio]` takes the
//! [`AudioTuning`] fields plus one `<channel>_path` key per channel.

use bevy_ecs::prelude::*;
use clap::ValueEnum;
use configparser::ini::Ini;
use log::{info, warn};
use rustc_hash::FxHashMap;
use std::path::PathBuf;

use crate::resources::audioreactor::{AudioTuning, Channel};
use crate::resources::handling::{HandlingConfig, HandlingPreset};

/// Default safe values for startup
const DEFAULT_WINDOW_WIDTH: u32 = 1280;
const DEFAULT_WINDOW_HEIGHT: u32 = 720;
const DEFAULT_TARGET_FPS: u32 = 60;
const DEFAULT_VSYNC: bool = true;
const DEFAULT_CONFIG_PATH: &str = "./config.ini";
const DEFAULT_AUDIO_DIR: &str = "assets/audio";

/// Game configuration resource.
#[derive(Resource, Debug, Clone)]
pub struct GameConfig {
    /// Window width in pixels.
    pub window_width: u32,
    /// Window height in pixels.
    pub window_height: u32,
    /// Target frames per second. One simulation tick runs per frame.
    pub target_fps: u32,
    /// Enable vertical sync.
    pub vsync: bool,
    pub preset: HandlingPreset,
    pub handling: HandlingConfig,
    pub audio: AudioTuning,
    /// Asset path per channel. Channels without a path stay silent.
    pub audio_paths: FxHashMap<Channel, String>,
    /// Path to the configuration file.
    pub config_path: PathBuf,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn default_audio_paths() -> FxHashMap<Channel, String> {
    Channel::ALL
        .into_iter()
        .map(|channel| {
            let ext = if channel.is_looped() { "ogg" } else { "wav" };
            (
                channel,
                format!("{}/{}.{}", DEFAULT_AUDIO_DIR, channel.id(), ext),
            )
        })
        .collect()
}

impl GameConfig {
    /// Create a new configuration with safe default values.
    pub fn new() -> Self {
        Self {
            window_width: DEFAULT_WINDOW_WIDTH,
            window_height: DEFAULT_WINDOW_HEIGHT,
            target_fps: DEFAULT_TARGET_FPS,
            vsync: DEFAULT_VSYNC,
            preset: HandlingPreset::default(),
            handling: HandlingConfig::default(),
            audio: AudioTuning::default(),
            audio_paths: default_audio_paths(),
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    /// Create a new configuration with a custom config file path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            ..Self::new()
        }
    }

    /// Load configuration from the INI file.
    ///
    /// Missing values retain their current (default) values.
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(&mut self) -> Result<(), String> {
        let mut config = Ini::new();
        config
            .load(&self.config_path)
            .map_err(|e| format!("Failed to load config file: {}", e))?;
        self.apply_ini(&config);

        info!(
            "Loaded config: {}x{} window, fps={}, vsync={}, preset={:?}",
            self.window_width, self.window_height, self.target_fps, self.vsync, self.preset
        );

        Ok(())
    }

    /// Load configuration from INI text instead of a file.
    pub fn load_from_str(&mut self, text: &str) -> Result<(), String> {
        let mut config = Ini::new();
        config
            .read(text.to_string())
            .map_err(|e| format!("Failed to parse config: {}", e))?;
        self.apply_ini(&config);
        Ok(())
    }

    fn apply_ini(&mut self, config: &Ini) {
        // [window] section
        if let Some(width) = config.getuint("window", "width").ok().flatten() {
            self.window_width = width as u32;
        }
        if let Some(height) = config.getuint("window", "height").ok().flatten() {
            self.window_height = height as u32;
        }
        if let Some(fps) = config.getuint("window", "target_fps").ok().flatten() {
            self.target_fps = fps as u32;
        }
        if let Some(vsync) = config.getbool("window", "vsync").ok().flatten() {
            self.vsync = vsync;
        }

        // [handling] section
        if let Some(name) = config.get("handling", "preset") {
            match HandlingPreset::from_str(&name, true) {
                Ok(preset) => self.preset = preset,
                Err(e) => warn!("Ignoring [handling] preset: {}", e),
            }
        }
        self.handling = HandlingConfig::preset(self.preset);
        self.handling.apply_ini(config);

        // [audio] section
        self.audio.apply_ini(config);
        for channel in Channel::ALL {
            let key = format!("{}_path", channel.id());
            if let Some(path) = config.get("audio", &key) {
                if path.trim().is_empty() {
                    self.audio_paths.remove(&channel);
                } else {
                    self.audio_paths.insert(channel, path);
                }
            }
        }
    }

    /// Save every setting to the INI file.
    ///
    /// Creates the file if it doesn't exist. `[handling]` gets the preset
    /// name followed by every field, so per-field overrides survive a reload.
    pub fn save_to_file(&self) -> Result<(), String> {
        let mut config = Ini::new();

        config.set("window", "width", Some(self.window_width.to_string()));
        config.set("window", "height", Some(self.window_height.to_string()));
        config.set("window", "target_fps", Some(self.target_fps.to_string()));
        config.set("window", "vsync", Some(self.vsync.to_string()));

        if let Some(value) = self.preset.to_possible_value() {
            config.set("handling", "preset", Some(value.get_name().to_string()));
        }
        self.handling.write_ini(&mut config);
        self.audio.write_ini(&mut config);

        for channel in Channel::ALL {
            if let Some(path) = self.audio_paths.get(&channel) {
                config.set("audio", &format!("{}_path", channel.id()), Some(path.clone()));
            }
        }

        config
            .write(&self.config_path)
            .map_err(|e| format!("Failed to save config file: {}", e))?;

        info!("Saved config to {:?}", self.config_path);

        Ok(())
    }

    /// Switch to a named preset, discarding per-field handling overrides.
    pub fn set_preset(&mut self, preset: HandlingPreset) {
        self.preset = preset;
        self.handling = HandlingConfig::preset(preset);
    }

    /// Get the window size.
    pub fn window_size(&self) -> (u32, u32) {
        (self.window_width, self.window_height)
    }
}
