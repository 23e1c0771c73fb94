//! Reactive vehicle audio.
//!
//! The [`AudioReactor`] resource turns each tick's
//! [`DerivedState`](crate::components::vehicle::DerivedState) into playback
//! decisions for five channels:
//!
//! | channel      | kind     | plays while                                  |
//! |--------------|----------|----------------------------------------------|
//! | `engine`     | loop     | `speed > engine_threshold`                   |
//! | `tires`      | loop     | `speed > tires_threshold`                    |
//! | `skidding`   | loop     | `is_skidding && speed > skid_threshold`      |
//! | `suspension` | one-shot | `is_suspension_active && speed > suspension_threshold` |
//! | `collision`  | one-shot | `has_collision`                              |
//!
//! Looped channels are started once when their playing flag goes from false
//! to true and stopped once on the way back; their gain is pushed every tick
//! while they play. One-shots are retriggered on every qualifying tick, which
//! makes the suspension rattle continuously while the body bobs.
//!
//! The reactor never talks to a device. It calls an [`AudioOutput`], which in
//! the game is [`AudioCmdQueue`](crate::resources::audio::AudioCmdQueue)
//! forwarding commands to the audio thread. Channels whose asset has not
//! finished loading are skipped; a failed load leaves the channel silent for
//! the rest of the session.

use bevy_ecs::prelude::Resource;
use configparser::ini::Ini;
use log::{info, warn};

use crate::components::vehicle::DerivedState;

/// Independently controlled audio slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Engine,
    Tires,
    Skidding,
    Suspension,
    Collision,
}

impl Channel {
    pub const ALL: [Channel; 5] = [
        Channel::Engine,
        Channel::Tires,
        Channel::Skidding,
        Channel::Suspension,
        Channel::Collision,
    ];

    /// Asset id used in audio commands and config keys.
    pub fn id(self) -> &'static str {
        match self {
            Channel::Engine => "engine",
            Channel::Tires => "tires",
            Channel::Skidding => "skidding",
            Channel::Suspension => "suspension",
            Channel::Collision => "collision",
        }
    }

    pub fn from_id(id: &str) -> Option<Channel> {
        Channel::ALL.into_iter().find(|c| c.id() == id)
    }

    /// Looped channels stream continuously; the others are one-shots.
    pub fn is_looped(self) -> bool {
        matches!(self, Channel::Engine | Channel::Tires | Channel::Skidding)
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Opaque handle to a playing loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopHandle(Channel);

impl LoopHandle {
    pub fn new(channel: Channel) -> Self {
        Self(channel)
    }

    pub fn channel(self) -> Channel {
        self.0
    }
}

/// Playback capability the reactor drives.
///
/// Calls must not block; device latency is the implementor's concern.
pub trait AudioOutput {
    fn play_loop(&mut self, channel: Channel) -> LoopHandle;
    fn play_one_shot(&mut self, channel: Channel);
    fn stop(&mut self, handle: LoopHandle);
    fn set_gain(&mut self, handle: LoopHandle, value: f32);
}

/// Asset readiness of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelReadiness {
    #[default]
    Pending,
    Ready,
    /// Loading failed; the channel stays silent.
    Unavailable,
}

/// Public view of one channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioChannelState {
    pub is_playing: bool,
    pub gain: f32,
}

impl Default for AudioChannelState {
    fn default() -> Self {
        Self {
            is_playing: false,
            gain: 1.0,
        }
    }
}

/// Thresholds and gain curves of the channel policies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioTuning {
    pub engine_threshold: f32,
    /// Engine gain is `engine_gain_base + speed * engine_gain_scale`.
    pub engine_gain_base: f32,
    pub engine_gain_scale: f32,
    /// Must sit above `engine_threshold`.
    pub tires_threshold: f32,
    /// Tires gain is `min(speed * tires_gain_scale, 1)`.
    pub tires_gain_scale: f32,
    pub skid_threshold: f32,
    pub skid_gain: f32,
    pub suspension_threshold: f32,
}

impl Default for AudioTuning {
    fn default() -> Self {
        Self {
            engine_threshold: 0.01,
            engine_gain_base: 0.3,
            engine_gain_scale: 1.4,
            tires_threshold: 0.1,
            tires_gain_scale: 2.0,
            skid_threshold: 0.1,
            skid_gain: 0.8,
            suspension_threshold: 0.05,
        }
    }
}

impl AudioTuning {
    /// Write every field into the `[audio]` section of `ini`.
    pub fn write_ini(&self, ini: &mut Ini) {
        let fields: [(&str, f32); 8] = [
            ("engine_threshold", self.engine_threshold),
            ("engine_gain_base", self.engine_gain_base),
            ("engine_gain_scale", self.engine_gain_scale),
            ("tires_threshold", self.tires_threshold),
            ("tires_gain_scale", self.tires_gain_scale),
            ("skid_threshold", self.skid_threshold),
            ("skid_gain", self.skid_gain),
            ("suspension_threshold", self.suspension_threshold),
        ];
        for (key, value) in fields {
            ini.set("audio", key, Some(value.to_string()));
        }
    }

    /// Overlay values from the `[audio]` section of a parsed INI file.
    pub fn apply_ini(&mut self, ini: &Ini) {
        let fields: [(&str, &mut f32); 8] = [
            ("engine_threshold", &mut self.engine_threshold),
            ("engine_gain_base", &mut self.engine_gain_base),
            ("engine_gain_scale", &mut self.engine_gain_scale),
            ("tires_threshold", &mut self.tires_threshold),
            ("tires_gain_scale", &mut self.tires_gain_scale),
            ("skid_threshold", &mut self.skid_threshold),
            ("skid_gain", &mut self.skid_gain),
            ("suspension_threshold", &mut self.suspension_threshold),
        ];
        for (key, slot) in fields {
            if let Some(value) = ini.getfloat("audio", key).ok().flatten() {
                *slot = value as f32;
            }
        }
        if self.tires_threshold <= self.engine_threshold {
            warn!(
                "[audio] tires_threshold {} is not above engine_threshold {}",
                self.tires_threshold, self.engine_threshold
            );
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct ChannelSlot {
    state: AudioChannelState,
    readiness: ChannelReadiness,
    handle: Option<LoopHandle>,
}

/// Owner of all channel states and sole caller into the [`AudioOutput`].
#[derive(Resource, Debug, Clone)]
pub struct AudioReactor {
    tuning: AudioTuning,
    slots: [ChannelSlot; 5],
}

impl Default for AudioReactor {
    fn default() -> Self {
        Self::new(AudioTuning::default())
    }
}

impl AudioReactor {
    /// Create a reactor with every channel stopped and pending.
    pub fn new(tuning: AudioTuning) -> Self {
        Self {
            tuning,
            slots: [ChannelSlot::default(); 5],
        }
    }

    pub fn tuning(&self) -> &AudioTuning {
        &self.tuning
    }

    pub fn channel(&self, channel: Channel) -> AudioChannelState {
        self.slots[channel.index()].state
    }

    pub fn readiness(&self, channel: Channel) -> ChannelReadiness {
        self.slots[channel.index()].readiness
    }

    /// Mark a channel's asset as loaded.
    ///
    /// A channel already marked unavailable stays unavailable.
    pub fn mark_ready(&mut self, channel: Channel) {
        let slot = &mut self.slots[channel.index()];
        if slot.readiness == ChannelReadiness::Pending {
            slot.readiness = ChannelReadiness::Ready;
        }
    }

    /// Mark a channel's asset as failed.
    ///
    /// A loop that is still live keeps its handle and is stopped on the next
    /// [`update`](Self::update) or [`stop_all`](Self::stop_all).
    pub fn mark_unavailable(&mut self, channel: Channel) {
        self.slots[channel.index()].readiness = ChannelReadiness::Unavailable;
    }

    /// Apply the channel policies to this tick's state.
    pub fn update(&mut self, state: &DerivedState, out: &mut impl AudioOutput) {
        let t = self.tuning;
        let speed = state.speed;

        self.drive_loop(
            Channel::Engine,
            speed > t.engine_threshold,
            t.engine_gain_base + speed * t.engine_gain_scale,
            out,
        );
        self.drive_loop(
            Channel::Tires,
            speed > t.tires_threshold,
            (speed * t.tires_gain_scale).min(1.0),
            out,
        );
        self.drive_loop(
            Channel::Skidding,
            state.is_skidding && speed > t.skid_threshold,
            t.skid_gain,
            out,
        );
        self.fire_one_shot(
            Channel::Suspension,
            state.is_suspension_active && speed > t.suspension_threshold,
            out,
        );
        self.fire_one_shot(Channel::Collision, state.has_collision, out);
    }

    /// Stop every loop that is still playing.
    pub fn stop_all(&mut self, out: &mut impl AudioOutput) {
        for slot in self.slots.iter_mut() {
            if let Some(handle) = slot.handle.take() {
                out.stop(handle);
            }
            slot.state.is_playing = false;
        }
    }

    fn drive_loop(
        &mut self,
        channel: Channel,
        wanted: bool,
        gain: f32,
        out: &mut impl AudioOutput,
    ) {
        let slot = &mut self.slots[channel.index()];
        if slot.readiness != ChannelReadiness::Ready {
            if let Some(handle) = slot.handle.take() {
                out.stop(handle);
                slot.state.is_playing = false;
                info!("[audio] {} stop (unavailable)", channel.id());
            }
            return;
        }
        slot.state.gain = gain;
        match (wanted, slot.handle) {
            (true, None) => {
                let handle = out.play_loop(channel);
                out.set_gain(handle, gain);
                slot.handle = Some(handle);
                slot.state.is_playing = true;
                info!("[audio] {} start gain={:.2}", channel.id(), gain);
            }
            (true, Some(handle)) => out.set_gain(handle, gain),
            (false, Some(handle)) => {
                out.stop(handle);
                slot.handle = None;
                slot.state.is_playing = false;
                info!("[audio] {} stop", channel.id());
            }
            (false, None) => {}
        }
    }

    fn fire_one_shot(&mut self, channel: Channel, wanted: bool, out: &mut impl AudioOutput) {
        let slot = &mut self.slots[channel.index()];
        if slot.readiness != ChannelReadiness::Ready {
            slot.state.is_playing = false;
            return;
        }
        if wanted {
            out.play_one_shot(channel);
        }
        slot.state.is_playing = wanted;
    }
}
