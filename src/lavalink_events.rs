use lavalink_rs::{
    client::LavalinkClient,
    hook,
    model::{GuildId, events},
};
use twilight_model::id::{Id, marker::GuildMarker};

use crate::events::{AudioEvent, AudioEventSender};

/// Attached to the Lavalink client so hooks can forward what they see.
pub struct HookData {
    pub node_name: String,
    pub events: AudioEventSender,
}

pub fn handlers() -> events::Events {
    events::Events {
        ready: Some(ready_event),
        track_start: Some(track_start_event),
        track_end: Some(track_end_event),
        websocket_closed: Some(websocket_closed_event),
        ..Default::default()
    }
}

fn emit(client: &LavalinkClient, event: impl FnOnce(&HookData) -> AudioEvent) {
    match client.data::<HookData>() {
        Ok(data) => {
            let _ = data.events.send(event(&data));
        }
        Err(e) => tracing::error!(error = ?e, "Lavalink client has no hook data attached"),
    }
}

fn guild(guild_id: GuildId) -> Option<Id<GuildMarker>> {
    Id::new_checked(guild_id.0)
}

/// Stops, replacements and cleanups never drain the queue on their own.
fn ends_naturally(reason: &events::TrackEndReason) -> bool {
    matches!(
        reason,
        events::TrackEndReason::Finished | events::TrackEndReason::LoadFailed
    )
}

/// The queue has ended once a natural end leaves nothing queued and nothing
/// already starting on the player.
fn queue_drained(reason: &events::TrackEndReason, queued: usize, has_current: bool) -> bool {
    ends_naturally(reason) && queued == 0 && !has_current
}

#[hook]
pub async fn ready_event(client: LavalinkClient, session_id: String, event: &events::Ready) {
    tracing::info!(session_id = %session_id, resumed = event.resumed, "Lavalink session ready");

    if !event.resumed {
        if let Err(e) = client.delete_all_player_contexts().await {
            tracing::warn!(error = ?e, "Failed to clear stale player contexts");
        }
    }

    let resumed = event.resumed;
    emit(&client, |data| {
        let node = data.node_name.clone();
        if resumed {
            AudioEvent::NodeReconnect { node }
        } else {
            AudioEvent::NodeConnect { node }
        }
    });
}

#[hook]
pub async fn track_start_event(
    client: LavalinkClient,
    _session_id: String,
    event: &events::TrackStart,
) {
    let Some(guild_id) = guild(event.guild_id) else {
        return;
    };
    let title = event.track.info.title.clone();
    let author = event.track.info.author.clone();
    emit(&client, |_| AudioEvent::TrackStart {
        guild_id,
        title,
        author,
    });
}

#[hook]
pub async fn track_end_event(
    client: LavalinkClient,
    _session_id: String,
    event: &events::TrackEnd,
) {
    let Some(guild_id) = guild(event.guild_id) else {
        return;
    };
    let title = event.track.info.title.clone();
    emit(&client, |_| AudioEvent::TrackEnd { guild_id, title });

    if !ends_naturally(&event.reason) {
        return;
    }

    let Some(player) = client.get_player_context(event.guild_id) else {
        return;
    };
    let queued = match player.get_queue().get_count().await {
        Ok(queued) => queued,
        Err(e) => {
            tracing::warn!(guild_id = %guild_id, error = ?e, "Failed to read queue length");
            return;
        }
    };
    let has_current = match player.get_player().await {
        Ok(state) => state.track.is_some(),
        Err(e) => {
            tracing::warn!(guild_id = %guild_id, error = ?e, "Failed to read player state");
            return;
        }
    };

    if queue_drained(&event.reason, queued, has_current) {
        emit(&client, |_| AudioEvent::QueueEnd { guild_id });
    }
}

#[hook]
pub async fn websocket_closed_event(
    _client: LavalinkClient,
    _session_id: String,
    event: &events::WebSocketClosed,
) {
    tracing::warn!(
        guild_id = event.guild_id.0,
        code = event.code,
        reason = %event.reason,
        by_remote = event.by_remote,
        "Voice websocket closed"
    );
}
