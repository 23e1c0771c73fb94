//! Messages exchanged with the background audio thread.
//!
//! Looped channels are played as music streams, one-shots as sound FX. Ids
//! are channel ids (see [`Channel::id`](crate::resources::audioreactor::Channel::id)).

use bevy_ecs::message::Message;

/// Commands sent *to* the audio thread.
#[derive(Message, Debug, Clone, PartialEq)]
pub enum AudioCmd {
    LoadMusic { id: String, path: String },
    /// Starts the stream from the beginning; it loops until stopped.
    PlayMusic { id: String },
    StopMusic { id: String },
    /// Volume is clamped to `[0, 1]` by the audio thread.
    VolumeMusic { id: String, vol: f32 },
    LoadFx { id: String, path: String },
    /// Restarts the sound if it is already playing.
    PlayFx { id: String },
    Shutdown,
}

/// Load results sent *back* from the audio thread.
#[derive(Message, Debug, Clone, PartialEq)]
pub enum AudioMessage {
    MusicLoaded { id: String },
    MusicLoadFailed { id: String, error: String },
    FxLoaded { id: String },
    FxLoadFailed { id: String, error: String },
}
