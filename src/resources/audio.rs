//! ECS resources that bridge the main thread with the background audio thread.
//!
//! Use [`setup_audio`] once during initialization to spawn the audio thread
//! and insert the [`AudioBridge`] and message resources. Call
//! [`shutdown_audio`] during teardown to gracefully stop the thread and free
//! audio resources.
//!
//! [`AudioCmdQueue`] is the [`AudioOutput`] the reactor writes into; its
//! commands are flushed as [`AudioCmd`] messages every tick.

use crate::events::audio::{AudioCmd, AudioMessage};
use crate::resources::audioreactor::{AudioOutput, AudioReactor, Channel, LoopHandle};
use crate::systems::audio::audio_thread;
use bevy_ecs::prelude::*;
use crossbeam_channel::{Receiver, Sender, unbounded};
use log::info;

/// Shared bridge between the ECS world and the audio thread.
///
/// This resource is created by [`setup_audio`]. Systems can send commands via
/// [`AudioBridge::tx_cmd`] and poll for events via [`AudioBridge::rx_msg`].
#[derive(Resource)]
pub struct AudioBridge {
    /// Sender for [`AudioCmd`] messages (ECS -> audio thread).
    pub tx_cmd: Sender<AudioCmd>,
    /// Receiver for [`AudioMessage`] messages (audio thread -> ECS).
    pub rx_msg: Receiver<AudioMessage>,
    /// Join handle for the background audio thread.
    pub handle: std::thread::JoinHandle<()>,
}

/// Insert the message queues without spawning a device thread.
///
/// Headless runs and tests use this; commands accumulate in
/// `Messages<AudioCmd>` and are dropped by the queue update.
pub fn setup_audio_messages(world: &mut World) {
    world.init_resource::<Messages<AudioMessage>>();
    world.init_resource::<Messages<AudioCmd>>();
}

/// Spawn the audio thread and register bridge resources.
///
/// This function:
/// - Creates command/event channels.
/// - Spawns the background thread running [`audio_thread`].
/// - Inserts [`AudioBridge`] and initializes the message queues so that
///   systems can send commands and poll for events.
pub fn setup_audio(world: &mut World) {
    let (tx_cmd, rx_cmd) = unbounded::<AudioCmd>();
    let (tx_msg, rx_msg) = unbounded::<AudioMessage>();

    let handle = std::thread::spawn(move || audio_thread(rx_cmd, tx_msg));

    world.insert_resource(AudioBridge {
        tx_cmd,
        rx_msg,
        handle,
    });
    setup_audio_messages(world);
}

/// Gracefully request shutdown of the audio thread and join it.
///
/// If the bridge resource exists, stops every loop the [`AudioReactor`] still
/// holds, sends [`AudioCmd::Shutdown`], waits for the thread to exit, and
/// removes the resource from the world.
pub fn shutdown_audio(world: &mut World) {
    let mut queue = AudioCmdQueue::new();
    if let Some(mut reactor) = world.get_resource_mut::<AudioReactor>() {
        reactor.stop_all(&mut queue);
    }
    if let Some(bridge) = world.remove_resource::<AudioBridge>() {
        info!("[audio] shutting down");
        for cmd in queue.drain() {
            let _ = bridge.tx_cmd.send(cmd);
        }
        let _ = bridge.tx_cmd.send(AudioCmd::Shutdown);
        let _ = bridge.handle.join();
    }
}

/// [`AudioOutput`] that records reactor calls as [`AudioCmd`]s.
///
/// Loops map to music commands and one-shots to FX commands.
#[derive(Debug, Default)]
pub struct AudioCmdQueue {
    cmds: Vec<AudioCmd>,
}

impl AudioCmdQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.cmds.is_empty()
    }

    /// Take the queued commands, leaving the queue empty.
    pub fn drain(&mut self) -> std::vec::Drain<'_, AudioCmd> {
        self.cmds.drain(..)
    }
}

impl AudioOutput for AudioCmdQueue {
    fn play_loop(&mut self, channel: Channel) -> LoopHandle {
        self.cmds.push(AudioCmd::PlayMusic {
            id: channel.id().to_string(),
        });
        LoopHandle::new(channel)
    }

    fn play_one_shot(&mut self, channel: Channel) {
        self.cmds.push(AudioCmd::PlayFx {
            id: channel.id().to_string(),
        });
    }

    fn stop(&mut self, handle: LoopHandle) {
        self.cmds.push(AudioCmd::StopMusic {
            id: handle.channel().id().to_string(),
        });
    }

    fn set_gain(&mut self, handle: LoopHandle, value: f32) {
        self.cmds.push(AudioCmd::VolumeMusic {
            id: handle.channel().id().to_string(),
            vol: value,
        });
    }
}
