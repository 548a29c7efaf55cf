//! Capability interfaces for the audio backend.
//!
//! The bot core only talks to these traits. `lavalink` provides the
//! production implementation; tests substitute in-memory doubles.

pub mod lavalink;

use std::sync::Arc;

use async_trait::async_trait;
use twilight_model::id::{
    Id,
    marker::{ChannelMarker, GuildMarker, UserMarker},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeInfo {
    pub id: usize,
    pub name: String,
    pub host: String,
    pub port: u16,
    pub secure: bool,
    pub connected: bool,
}

/// Who asked for a track. Attached to the track so queue listings and logs can
/// name them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requester {
    pub id: Id<UserMarker>,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub title: String,
    pub author: String,
    pub uri: Option<String>,
    pub length_ms: u64,
    /// Backend-specific handle needed to actually play the track.
    pub encoded: String,
    pub requester: Option<Requester>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerSnapshot {
    pub current: Option<Track>,
    pub paused: bool,
    pub queue: Vec<Track>,
}

impl PlayerSnapshot {
    /// A paused player still has a current track and counts as playing.
    pub fn is_playing(&self) -> bool {
        self.current.is_some()
    }

    pub fn is_idle(&self) -> bool {
        self.current.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct ConnectionRequest {
    pub guild_id: Id<GuildMarker>,
    pub voice_channel_id: Id<ChannelMarker>,
    pub text_channel_id: Id<ChannelMarker>,
    pub deaf: bool,
}

#[async_trait]
pub trait NodeRegistry: Send + Sync {
    fn nodes(&self) -> Vec<NodeInfo>;

    async fn reconnect(&self, node_id: usize) -> anyhow::Result<()>;

    fn any_connected(&self) -> bool {
        self.nodes().iter().any(|node| node.connected)
    }
}

#[async_trait]
pub trait AudioBackend: NodeRegistry {
    async fn resolve(
        &self,
        guild_id: Id<GuildMarker>,
        query: &str,
        requester: &Requester,
    ) -> anyhow::Result<Vec<Track>>;

    fn player(&self, guild_id: Id<GuildMarker>) -> Option<Arc<dyn GuildPlayer>>;

    /// Joins the voice channel and creates the guild player. Resolves only
    /// after the voice handshake has completed, so the returned player is
    /// ready to play.
    async fn create_connection(
        &self,
        request: ConnectionRequest,
    ) -> anyhow::Result<Arc<dyn GuildPlayer>>;

    /// Stops playback, drops the queue and leaves the voice channel.
    async fn destroy_player(&self, guild_id: Id<GuildMarker>) -> anyhow::Result<()>;
}

#[async_trait]
pub trait GuildPlayer: Send + Sync {
    async fn snapshot(&self) -> anyhow::Result<PlayerSnapshot>;

    async fn enqueue(&self, track: Track) -> anyhow::Result<()>;

    /// Starts the next queued track.
    async fn play(&self) -> anyhow::Result<()>;

    async fn pause(&self, paused: bool) -> anyhow::Result<()>;

    async fn skip(&self) -> anyhow::Result<()>;

    async fn stop(&self) -> anyhow::Result<()>;
}
