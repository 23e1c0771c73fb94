//! Audio system implementation backed by a dedicated thread and Raylib.
//!
//! This module hosts the background audio thread and the systems that bridge
//! it with the ECS world:
//! - [`audio_thread`] runs on its own OS thread, owns the Raylib audio device,
//!   and processes [`AudioCmd`] messages, emitting [`AudioMessage`] responses.
//! - [`audio_reactor_system`] feeds the player's
//!   [`DerivedState`] to the
//!   [`AudioReactor`] and writes the resulting commands.
//! - [`forward_audio_cmds`] / [`poll_audio_messages`] move messages across the
//!   thread boundary; [`track_audio_readiness`] marks channels ready or
//!   unavailable as load results come back.
//!
//! The design keeps Raylib audio API calls isolated to a single thread, while
//! the main game thread communicates via lock-free channels. Without an
//! [`AudioBridge`] (headless runs) the forwarding systems are no-ops.

use crate::components::inputcontrolled::PlayerControlled;
use crate::components::vehicle::DerivedState;
use crate::events::audio::{AudioCmd, AudioMessage};
use crate::resources::audio::{AudioBridge, AudioCmdQueue};
use crate::resources::audioreactor::{AudioReactor, Channel};
use bevy_ecs::prelude::*;
use crossbeam_channel::{Receiver, Sender};
use log::{debug, error, info, trace, warn};
use raylib::core::audio::{Music, RaylibAudio, Sound};
use rustc_hash::{FxHashMap, FxHashSet};

/// Drain any pending events from the audio thread and enqueue them into the
/// ECS [`Messages<AudioMessage>`] mailbox.
pub fn poll_audio_messages(
    bridge: Option<Res<AudioBridge>>,
    mut writer: MessageWriter<AudioMessage>,
) {
    if let Some(bridge) = bridge {
        writer.write_batch(bridge.rx_msg.try_iter());
    }
}

/// Advance the ECS message queue for [`AudioMessage`].
///
/// Bevy ECS' [`Messages`] API requires calling `update()` once per frame to
/// make messages written this frame visible to readers in the same frame.
/// Run this after [`poll_audio_messages`] in your schedule.
pub fn update_bevy_audio_messages(mut events: ResMut<Messages<AudioMessage>>) {
    events.update();
}

/// Forward ECS AudioCmd messages to the audio thread via the AudioBridge sender.
pub fn forward_audio_cmds(bridge: Option<Res<AudioBridge>>, mut reader: MessageReader<AudioCmd>) {
    let Some(bridge) = bridge else {
        // keep the reader cursor moving so nothing piles up
        reader.clear();
        return;
    };
    for cmd in reader.read() {
        // ignore send error on shutdown
        let _ = bridge.tx_cmd.send(cmd.clone());
    }
}

/// Advance the ECS message queue for AudioCmd so same-frame readers can observe writes.
pub fn update_bevy_audio_cmds(mut msgs: ResMut<Messages<AudioCmd>>) {
    msgs.update();
}

/// Run the reactor on the player's latest snapshot.
///
/// Does nothing until the vehicle has produced a [`DerivedState`].
pub fn audio_reactor_system(
    mut reactor: ResMut<AudioReactor>,
    query: Query<&DerivedState, With<PlayerControlled>>,
    mut writer: MessageWriter<AudioCmd>,
) {
    let Ok(state) = query.single() else {
        return;
    };
    let mut queue = AudioCmdQueue::new();
    reactor.update(state, &mut queue);
    if !queue.is_empty() {
        writer.write_batch(queue.drain());
    }
}

/// Mark reactor channels ready or unavailable from load results.
pub fn track_audio_readiness(
    mut reader: MessageReader<AudioMessage>,
    mut reactor: ResMut<AudioReactor>,
) {
    for msg in reader.read() {
        match msg {
            AudioMessage::MusicLoaded { id } | AudioMessage::FxLoaded { id } => {
                if let Some(channel) = Channel::from_id(id) {
                    info!("[audio] channel '{}' ready", id);
                    reactor.mark_ready(channel);
                }
            }
            AudioMessage::MusicLoadFailed { id, error }
            | AudioMessage::FxLoadFailed { id, error } => {
                if let Some(channel) = Channel::from_id(id) {
                    warn!("[audio] channel '{}' unavailable: {}", id, error);
                    reactor.mark_unavailable(channel);
                }
            }
        }
    }
}

/// Request loading of every channel that has an asset path.
///
/// Loops load as music streams, one-shots as sounds. Channels without a
/// path are marked unavailable right away.
pub fn load_channel_assets(world: &mut World, paths: &FxHashMap<Channel, String>) {
    let mut missing = Vec::new();
    {
        let mut cmds = world.resource_mut::<Messages<AudioCmd>>();
        for channel in Channel::ALL {
            let Some(path) = paths.get(&channel) else {
                missing.push(channel);
                continue;
            };
            let id = channel.id().to_string();
            let path = path.clone();
            if channel.is_looped() {
                cmds.write(AudioCmd::LoadMusic { id, path });
            } else {
                cmds.write(AudioCmd::LoadFx { id, path });
            }
        }
    }
    if let Some(mut reactor) = world.get_resource_mut::<AudioReactor>() {
        for channel in missing {
            warn!("[audio] no asset configured for '{}'", channel.id());
            reactor.mark_unavailable(channel);
        }
    }
}

/// Entry point of the dedicated audio thread.
///
/// Responsibilities:
/// - Initialize the Raylib audio device once for the life of the thread.
/// - Own all `Music` and `Sound` handles, preventing use from other threads.
/// - React to [`AudioCmd`] inputs to load and control playback, answering
///   each load with an [`AudioMessage`].
/// - Periodically pump music streams and restart the ones that ended.
///
/// If the device cannot be opened every load is answered with a failure so
/// the reactor marks all channels unavailable and the game runs silent.
///
/// This function blocks until it receives [`AudioCmd::Shutdown`].
pub fn audio_thread(rx_cmd: Receiver<AudioCmd>, tx_evt: Sender<AudioMessage>) {
    let audio = match RaylibAudio::init_audio_device() {
        Ok(device) => device,
        Err(e) => {
            error!("[audio] failed to initialize audio device: {}", e);
            run_without_device(rx_cmd, tx_evt, e.to_string());
            return;
        }
    };

    info!(
        "[audio] thread starting (id={:?})",
        std::thread::current().id()
    );

    let mut musics: FxHashMap<String, Music> = FxHashMap::default();
    let mut playing: FxHashSet<String> = FxHashSet::default();
    let mut sounds: FxHashMap<String, Sound> = FxHashMap::default();

    'run: loop {
        // 1) Drain commands
        for cmd in rx_cmd.try_iter() {
            match cmd {
                AudioCmd::LoadMusic { id, path } => match audio.new_music(&path) {
                    Ok(music) => {
                        info!("[audio] loaded id='{}' path='{}'", id, path);
                        musics.insert(id.clone(), music);
                        let _ = tx_evt.send(AudioMessage::MusicLoaded { id });
                    }
                    Err(e) => {
                        warn!(
                            "[audio] load failed id='{}' path='{}' error='{}'",
                            id, path, e
                        );
                        let _ = tx_evt.send(AudioMessage::MusicLoadFailed {
                            id,
                            error: e.to_string(),
                        });
                    }
                },
                AudioCmd::PlayMusic { id } => {
                    if let Some(music) = musics.get(&id) {
                        debug!("[audio] play start id='{}'", id);
                        music.seek_stream(0.0);
                        music.play_stream();
                        playing.insert(id);
                    }
                }
                AudioCmd::StopMusic { id } => {
                    if let Some(music) = musics.get(&id) {
                        debug!("[audio] stop id='{}'", id);
                        music.stop_stream();
                        playing.remove(&id);
                    }
                }
                AudioCmd::VolumeMusic { id, vol } => {
                    if let Some(music) = musics.get(&id) {
                        let vol = vol.clamp(0.0, 1.0);
                        trace!("[audio] volume id='{}' vol={}", id, vol);
                        music.set_volume(vol);
                    }
                }
                AudioCmd::LoadFx { id, path } => match audio.new_sound(&path) {
                    Ok(sound) => {
                        info!("[audio] fx loaded id='{}' path='{}'", id, path);
                        sounds.insert(id.clone(), sound);
                        let _ = tx_evt.send(AudioMessage::FxLoaded { id });
                    }
                    Err(e) => {
                        warn!(
                            "[audio] fx load failed id='{}' path='{}' error='{}'",
                            id, path, e
                        );
                        let _ = tx_evt.send(AudioMessage::FxLoadFailed {
                            id,
                            error: e.to_string(),
                        });
                    }
                },
                AudioCmd::PlayFx { id } => {
                    if let Some(sound) = sounds.get(&id) {
                        trace!("[audio] fx play id='{}'", id);
                        // play() rewinds a sound that is still playing
                        sound.play();
                    } else {
                        debug!("[audio] fx play failed id='{}' reason='not loaded'", id);
                    }
                }
                AudioCmd::Shutdown => {
                    info!("[audio] shutdown requested");
                    playing.clear();
                    musics.clear();
                    sounds.clear();
                    break 'run;
                }
            }
        }
        // 2) Pump streaming and restart streams that reached their end.
        //    `update_stream()` must be called regularly while playing.
        for id in playing.iter() {
            if let Some(music) = musics.get(id) {
                if music.is_stream_playing() {
                    music.update_stream();
                } else if music.get_time_played() >= music.get_time_length() - 0.01 {
                    trace!("[audio] restarting looped id='{}'", id);
                    music.seek_stream(0.0);
                    music.play_stream();
                }
            }
        }
        std::thread::sleep(std::time::Duration::from_millis(10));
    } // 'run

    info!(
        "[audio] thread exiting (id={:?})",
        std::thread::current().id()
    );

    // On exit, musics and sounds drop before `audio`, satisfying lifetimes
}

fn run_without_device(rx_cmd: Receiver<AudioCmd>, tx_evt: Sender<AudioMessage>, error: String) {
    for cmd in rx_cmd.iter() {
        match cmd {
            AudioCmd::LoadMusic { id, .. } => {
                let _ = tx_evt.send(AudioMessage::MusicLoadFailed {
                    id,
                    error: error.clone(),
                });
            }
            AudioCmd::LoadFx { id, .. } => {
                let _ = tx_evt.send(AudioMessage::FxLoadFailed {
                    id,
                    error: error.clone(),
                });
            }
            AudioCmd::Shutdown => break,
            _ => {}
        }
    }
}
