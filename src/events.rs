use std::sync::Arc;

use tokio::sync::mpsc;
use twilight_model::id::{
    Id,
    marker::{ChannelMarker, GuildMarker},
};

use crate::state::State;

pub type AudioEventSender = mpsc::UnboundedSender<AudioEvent>;
pub type AudioEventReceiver = mpsc::UnboundedReceiver<AudioEvent>;

/// Lifecycle events emitted by the audio backend and the voice layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioEvent {
    TrackStart {
        guild_id: Id<GuildMarker>,
        title: String,
        author: String,
    },
    TrackEnd {
        guild_id: Id<GuildMarker>,
        title: String,
    },
    QueueEnd {
        guild_id: Id<GuildMarker>,
    },
    PlayerDestroy {
        guild_id: Id<GuildMarker>,
    },
    PlayerMove {
        guild_id: Id<GuildMarker>,
        from: Id<ChannelMarker>,
        to: Id<ChannelMarker>,
    },
    NodeConnect {
        node: String,
    },
    NodeError {
        node: String,
        error: String,
    },
    NodeDisconnect {
        node: String,
    },
    NodeReconnect {
        node: String,
    },
}

pub fn channel() -> (AudioEventSender, AudioEventReceiver) {
    mpsc::unbounded_channel()
}

pub async fn run_event_loop(mut rx: AudioEventReceiver, state: Arc<State>) {
    while let Some(event) = rx.recv().await {
        handle_event(&state, event);
    }
    tracing::info!("Audio event channel closed, event loop exiting.");
}

pub fn handle_event(state: &State, event: AudioEvent) {
    match event {
        AudioEvent::TrackStart {
            guild_id,
            title,
            author,
        } => {
            tracing::info!(guild_id = %guild_id, "Now playing: {} by {}", title, author);
            if state.idle_timers.cancel(guild_id) {
                tracing::info!(guild_id = %guild_id, "Cleared idle disconnect timer, music is playing");
            }
        }
        AudioEvent::TrackEnd { guild_id, title } => {
            tracing::info!(guild_id = %guild_id, "Track ended: {}", title);
        }
        AudioEvent::QueueEnd { guild_id } => {
            let Some(audio) = state.audio() else {
                tracing::warn!(guild_id = %guild_id, "Queue ended before the audio subsystem was initialized");
                return;
            };
            tracing::info!(
                guild_id = %guild_id,
                "Queue ended, disconnecting in {} unless new music is queued",
                humantime::format_duration(state.idle_timers.timeout())
            );
            state.idle_timers.arm(guild_id, audio);
        }
        AudioEvent::PlayerDestroy { guild_id } => {
            tracing::info!(guild_id = %guild_id, "Player destroyed");
            state.idle_timers.cancel(guild_id);
        }
        AudioEvent::PlayerMove { guild_id, from, to } => {
            tracing::info!(guild_id = %guild_id, "Player moved from {} to {}", from, to);
        }
        AudioEvent::NodeConnect { node } => {
            tracing::info!(node = %node, "Audio node connected");
            state.monitor.reset();
        }
        AudioEvent::NodeReconnect { node } => {
            tracing::info!(node = %node, "Audio node reconnected");
            state.monitor.reset();
        }
        AudioEvent::NodeError { node, error } => {
            tracing::error!(node = %node, error = %error, "Audio node error");
            trigger_monitor(state);
        }
        AudioEvent::NodeDisconnect { node } => {
            tracing::warn!(node = %node, "Audio node disconnected");
            trigger_monitor(state);
        }
    }
}

fn trigger_monitor(state: &State) {
    match state.audio() {
        Some(audio) => state.monitor.trigger(audio),
        None => tracing::warn!("Audio subsystem not initialized; skipping reconnection"),
    }
}
