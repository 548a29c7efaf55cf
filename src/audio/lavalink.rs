use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::Ordering;

use anyhow::anyhow;
use async_trait::async_trait;
use lavalink_rs::client::LavalinkClient;
use lavalink_rs::model::player::ConnectionInfo;
use lavalink_rs::model::track::TrackData;
use lavalink_rs::player_context::PlayerContext;
use lavalink_rs::prelude::{SearchEngines, TrackInQueue, TrackLoadData};
use serde::{Deserialize, Serialize};
use songbird::ConnectionInfo as SongbirdConnectionInfo;
use songbird::Songbird;
use twilight_model::id::{
    Id,
    marker::{GuildMarker, UserMarker},
};

use super::{
    AudioBackend, ConnectionRequest, GuildPlayer, NodeInfo, NodeRegistry, PlayerSnapshot,
    Requester, Track,
};
use crate::config::LavalinkNodeConfig;
use crate::events::{AudioEvent, AudioEventSender};

#[derive(Debug, Serialize, Deserialize)]
struct RequesterData {
    requester_id: Id<UserMarker>,
    requester_name: String,
}

fn requester_to_json(requester: &Requester) -> Option<serde_json::Value> {
    serde_json::to_value(RequesterData {
        requester_id: requester.id,
        requester_name: requester.name.clone(),
    })
    .ok()
}

fn requester_from_json(value: &serde_json::Value) -> Option<Requester> {
    let data: RequesterData = serde_json::from_value(value.clone()).ok()?;
    Some(Requester {
        id: data.requester_id,
        name: data.requester_name,
    })
}

pub(crate) fn track_from_data(data: TrackData) -> Track {
    let requester = data.user_data.as_ref().and_then(requester_from_json);
    Track {
        title: data.info.title,
        author: data.info.author,
        uri: data.info.uri,
        length_ms: data.info.length,
        encoded: data.encoded,
        requester,
    }
}

fn convert_connection_info(connection_info: SongbirdConnectionInfo) -> ConnectionInfo {
    ConnectionInfo {
        endpoint: connection_info.endpoint,
        token: connection_info.token,
        session_id: connection_info.session_id,
    }
}

/// Bare words are searched on YouTube; links are loaded as-is.
fn query_term(query: &str) -> anyhow::Result<String> {
    if query.starts_with("http://") || query.starts_with("https://") {
        Ok(query.to_string())
    } else {
        SearchEngines::YouTube
            .to_query(query)
            .map_err(|e| anyhow!("Failed to build search query: {}", e))
    }
}

/// Runs `undo` before handing back a failed `result`.
async fn undo_on_error<T, F, Fut>(result: anyhow::Result<T>, undo: F) -> anyhow::Result<T>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = ()>,
{
    if result.is_err() {
        undo().await;
    }
    result
}

/// Audio backend that relays playback to Lavalink and uses songbird for the
/// voice gateway handshake.
pub struct LavalinkBackend {
    client: LavalinkClient,
    songbird: Arc<Songbird>,
    node_configs: Vec<LavalinkNodeConfig>,
    events: AudioEventSender,
}

impl LavalinkBackend {
    pub fn new(
        client: LavalinkClient,
        songbird: Arc<Songbird>,
        node_configs: Vec<LavalinkNodeConfig>,
        events: AudioEventSender,
    ) -> Self {
        Self {
            client,
            songbird,
            node_configs,
            events,
        }
    }

    fn wrap(&self, guild_id: Id<GuildMarker>, context: PlayerContext) -> Arc<dyn GuildPlayer> {
        Arc::new(LavalinkPlayer {
            client: self.client.clone(),
            guild_id,
            context,
        })
    }
}

#[async_trait]
impl NodeRegistry for LavalinkBackend {
    fn nodes(&self) -> Vec<NodeInfo> {
        self.client
            .nodes
            .iter()
            .zip(&self.node_configs)
            .enumerate()
            .map(|(id, (node, config))| NodeInfo {
                id,
                name: config.name.clone(),
                host: config.host.clone(),
                port: config.port,
                secure: config.secure,
                connected: node.is_running.load(Ordering::SeqCst),
            })
            .collect()
    }

    async fn reconnect(&self, node_id: usize) -> anyhow::Result<()> {
        let node = self
            .client
            .nodes
            .get(node_id)
            .ok_or_else(|| anyhow!("Unknown audio node {}", node_id))?;
        node.connect(self.client.clone())
            .await
            .map_err(|e| anyhow!("Failed to connect to audio node: {}", e))
    }
}

#[async_trait]
impl AudioBackend for LavalinkBackend {
    async fn resolve(
        &self,
        guild_id: Id<GuildMarker>,
        query: &str,
        requester: &Requester,
    ) -> anyhow::Result<Vec<Track>> {
        let term = query_term(query)?;
        let loaded = self
            .client
            .load_tracks(guild_id, &term)
            .await
            .map_err(|e| anyhow!("Failed to load tracks: {}", e))?;

        let tracks = match loaded.data {
            Some(TrackLoadData::Track(track)) => vec![track],
            Some(TrackLoadData::Search(results)) => results,
            Some(TrackLoadData::Playlist(playlist)) => playlist.tracks,
            Some(TrackLoadData::Error(e)) => {
                anyhow::bail!("Error loading tracks: {}", e.message)
            }
            None => Vec::new(),
        };

        Ok(tracks
            .into_iter()
            .map(|data| {
                let mut track = track_from_data(data);
                track.requester = Some(requester.clone());
                track
            })
            .collect())
    }

    fn player(&self, guild_id: Id<GuildMarker>) -> Option<Arc<dyn GuildPlayer>> {
        self.client
            .get_player_context(guild_id)
            .map(|context| self.wrap(guild_id, context))
    }

    async fn create_connection(
        &self,
        request: ConnectionRequest,
    ) -> anyhow::Result<Arc<dyn GuildPlayer>> {
        let (connection_info, call) = self
            .songbird
            .join_gateway(request.guild_id, request.voice_channel_id)
            .await
            .map_err(|e| anyhow!("Failed to join voice channel, {}", e))?;

        if request.deaf {
            let deafened = {
                let mut call = call.lock().await;
                call.deafen(true).await
            };
            if let Err(e) = deafened {
                tracing::warn!(guild_id = %request.guild_id, error = ?e, "Failed to self-deafen");
            }
        }

        let created = self
            .client
            .create_player_context(request.guild_id, convert_connection_info(connection_info))
            .await
            .map_err(|e| anyhow!("Failed to create player: {}", e));
        // Without a player nothing else would ever leave this call.
        let songbird = &self.songbird;
        let guild_id = request.guild_id;
        let context = undo_on_error(created, move || async move {
            match songbird.remove(guild_id).await {
                Ok(()) => {
                    tracing::info!(guild_id = %guild_id, "Left voice channel after player creation failed")
                }
                Err(e) => {
                    tracing::warn!(guild_id = %guild_id, error = ?e, "Failed to leave voice channel")
                }
            }
        })
        .await?;

        tracing::info!(
            guild_id = %request.guild_id,
            voice_channel = %request.voice_channel_id,
            text_channel = %request.text_channel_id,
            "Player created"
        );
        Ok(self.wrap(request.guild_id, context))
    }

    async fn destroy_player(&self, guild_id: Id<GuildMarker>) -> anyhow::Result<()> {
        if let Err(e) = self.songbird.remove(guild_id).await {
            tracing::debug!(guild_id = %guild_id, error = ?e, "No voice call to leave");
        }
        self.client
            .delete_player(guild_id)
            .await
            .map_err(|e| anyhow!("Failed to delete player: {}", e))?;

        let _ = self.events.send(AudioEvent::PlayerDestroy { guild_id });
        Ok(())
    }
}

struct LavalinkPlayer {
    client: LavalinkClient,
    guild_id: Id<GuildMarker>,
    context: PlayerContext,
}

#[async_trait]
impl GuildPlayer for LavalinkPlayer {
    async fn snapshot(&self) -> anyhow::Result<PlayerSnapshot> {
        let player = self
            .context
            .get_player()
            .await
            .map_err(|e| anyhow!("Failed to fetch player: {}", e))?;
        let queue = self
            .context
            .get_queue()
            .get_queue()
            .await
            .map_err(|e| anyhow!("Failed to fetch queue: {}", e))?;

        Ok(PlayerSnapshot {
            current: player.track.map(track_from_data),
            paused: player.paused,
            queue: queue
                .into_iter()
                .map(|queued| track_from_data(queued.track))
                .collect(),
        })
    }

    async fn enqueue(&self, track: Track) -> anyhow::Result<()> {
        let mut data = self
            .client
            .decode_track(self.guild_id, &track.encoded)
            .await
            .map_err(|e| anyhow!("Failed to decode track: {}", e))?;
        data.user_data = track.requester.as_ref().and_then(requester_to_json);

        self.context
            .get_queue()
            .append(VecDeque::from([TrackInQueue::from(data)]))
            .map_err(|e| anyhow!("Failed to queue track: {}", e))
    }

    async fn play(&self) -> anyhow::Result<()> {
        // Skipping an idle player starts the head of the queue.
        self.context
            .skip()
            .map_err(|e| anyhow!("Failed to start playback: {}", e))
    }

    async fn pause(&self, paused: bool) -> anyhow::Result<()> {
        self.context
            .set_pause(paused)
            .await
            .map_err(|e| anyhow!("Failed to set pause: {}", e))?;
        Ok(())
    }

    async fn skip(&self) -> anyhow::Result<()> {
        self.context
            .skip()
            .map_err(|e| anyhow!("Failed to skip: {}", e))
    }

    async fn stop(&self) -> anyhow::Result<()> {
        self.context
            .stop_now()
            .await
            .map_err(|e| anyhow!("Failed to stop: {}", e))?;
        Ok(())
    }
}
