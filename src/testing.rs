//! In-memory doubles for the gateway and audio backend.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use twilight_model::guild::Permissions;
use twilight_model::id::{
    Id,
    marker::{ChannelMarker, GuildMarker, MessageMarker, UserMarker},
};

use crate::audio::{
    AudioBackend, ConnectionRequest, GuildPlayer, NodeInfo, NodeRegistry, PlayerSnapshot,
    Requester, Track,
};
use crate::command_handler::{CommandResponse, IncomingMessage};
use crate::config::Config;
use crate::events;
use crate::gateway::{ChatGateway, SentMessage, VoiceChannel};
use crate::health_monitor::{HealthMonitor, ReconnectPolicy};
use crate::idle::IdleTimers;
use crate::state::State;

pub fn track(title: &str) -> Track {
    Track {
        title: title.to_string(),
        author: "Test Artist".to_string(),
        uri: None,
        length_ms: 180_000,
        encoded: format!("encoded:{title}"),
        requester: None,
    }
}

#[derive(Debug, Clone)]
pub struct SentRecord {
    pub channel_id: Id<ChannelMarker>,
    pub reply_to: Option<Id<MessageMarker>>,
    pub message_id: Id<MessageMarker>,
    pub response: CommandResponse,
}

pub struct FakeGateway {
    voice: Mutex<HashMap<(Id<GuildMarker>, Id<UserMarker>), VoiceChannel>>,
    bot_permissions: Mutex<Option<Permissions>>,
    sent: Mutex<Vec<SentRecord>>,
    edits: Mutex<Vec<(Id<MessageMarker>, String)>>,
    next_message_id: AtomicU64,
    guilds: AtomicUsize,
    tag: Mutex<Option<String>>,
}

impl Default for FakeGateway {
    fn default() -> Self {
        Self {
            voice: Mutex::new(HashMap::new()),
            bot_permissions: Mutex::new(Some(
                Permissions::VIEW_CHANNEL | Permissions::CONNECT | Permissions::SPEAK,
            )),
            sent: Mutex::new(Vec::new()),
            edits: Mutex::new(Vec::new()),
            next_message_id: AtomicU64::new(1000),
            guilds: AtomicUsize::new(0),
            tag: Mutex::new(None),
        }
    }
}

impl FakeGateway {
    pub fn put_in_voice(
        &self,
        guild_id: Id<GuildMarker>,
        user_id: Id<UserMarker>,
        channel: VoiceChannel,
    ) {
        self.voice.lock().insert((guild_id, user_id), channel);
    }

    pub fn set_bot_permissions(&self, permissions: Option<Permissions>) {
        *self.bot_permissions.lock() = permissions;
    }

    pub fn set_guild_count(&self, count: usize) {
        self.guilds.store(count, Ordering::SeqCst);
    }

    pub fn set_tag(&self, tag: &str) {
        *self.tag.lock() = Some(tag.to_string());
    }

    pub fn sent(&self) -> Vec<SentRecord> {
        self.sent.lock().clone()
    }

    /// Text content of every message sent, ignoring later edits.
    pub fn replies(&self) -> Vec<String> {
        self.sent
            .lock()
            .iter()
            .map(|record| record.response.content.clone())
            .collect()
    }

    /// Content of the nth sent message after all edits were applied.
    pub fn final_text(&self, index: usize) -> String {
        let record = self.sent.lock()[index].clone();
        self.edits
            .lock()
            .iter()
            .rev()
            .find(|(id, _)| *id == record.message_id)
            .map(|(_, content)| content.clone())
            .unwrap_or(record.response.content)
    }
}

#[async_trait]
impl ChatGateway for FakeGateway {
    fn voice_channel_of(
        &self,
        guild_id: Id<GuildMarker>,
        user_id: Id<UserMarker>,
    ) -> Option<VoiceChannel> {
        self.voice.lock().get(&(guild_id, user_id)).cloned()
    }

    fn bot_permissions_in(
        &self,
        _guild_id: Id<GuildMarker>,
        _channel_id: Id<ChannelMarker>,
    ) -> Option<Permissions> {
        *self.bot_permissions.lock()
    }

    async fn send(
        &self,
        channel_id: Id<ChannelMarker>,
        reply_to: Option<Id<MessageMarker>>,
        response: &CommandResponse,
    ) -> anyhow::Result<SentMessage> {
        let message_id = Id::new(self.next_message_id.fetch_add(1, Ordering::SeqCst));
        self.sent.lock().push(SentRecord {
            channel_id,
            reply_to,
            message_id,
            response: response.clone(),
        });
        Ok(SentMessage {
            channel_id,
            message_id,
        })
    }

    async fn edit(&self, message: &SentMessage, content: &str) -> anyhow::Result<()> {
        self.edits
            .lock()
            .push((message.message_id, content.to_string()));
        Ok(())
    }

    fn bot_tag(&self) -> Option<String> {
        self.tag.lock().clone()
    }

    fn guild_count(&self) -> usize {
        self.guilds.load(Ordering::SeqCst)
    }
}

/// Hands control back to the scheduler when `yielding` is set, standing in
/// for the network round trip a real backend makes.
async fn round_trip(yielding: bool) {
    if yielding {
        tokio::task::yield_now().await;
    }
}

pub struct FakePlayer {
    snapshot: Mutex<PlayerSnapshot>,
    actions: Mutex<Vec<String>>,
    fail_play: bool,
    yielding: bool,
}

impl FakePlayer {
    fn new(snapshot: PlayerSnapshot, fail_play: bool, yielding: bool) -> Self {
        Self {
            snapshot: Mutex::new(snapshot),
            actions: Mutex::new(Vec::new()),
            fail_play,
            yielding,
        }
    }
}

#[async_trait]
impl GuildPlayer for FakePlayer {
    async fn snapshot(&self) -> anyhow::Result<PlayerSnapshot> {
        round_trip(self.yielding).await;
        Ok(self.snapshot.lock().clone())
    }

    async fn enqueue(&self, track: Track) -> anyhow::Result<()> {
        round_trip(self.yielding).await;
        self.actions.lock().push(format!("enqueue {}", track.title));
        self.snapshot.lock().queue.push(track);
        Ok(())
    }

    async fn play(&self) -> anyhow::Result<()> {
        round_trip(self.yielding).await;
        self.actions.lock().push("play".to_string());
        if self.fail_play {
            anyhow::bail!("player refused to start");
        }
        let mut snapshot = self.snapshot.lock();
        if !snapshot.queue.is_empty() {
            let next = snapshot.queue.remove(0);
            snapshot.current = Some(next);
            snapshot.paused = false;
        }
        Ok(())
    }

    async fn pause(&self, paused: bool) -> anyhow::Result<()> {
        self.actions.lock().push(format!("pause {paused}"));
        self.snapshot.lock().paused = paused;
        Ok(())
    }

    async fn skip(&self) -> anyhow::Result<()> {
        self.actions.lock().push("skip".to_string());
        let mut snapshot = self.snapshot.lock();
        snapshot.current = if snapshot.queue.is_empty() {
            None
        } else {
            Some(snapshot.queue.remove(0))
        };
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        self.actions.lock().push("stop".to_string());
        self.snapshot.lock().current = None;
        Ok(())
    }
}

pub struct FakeAudio {
    nodes: Mutex<Vec<NodeInfo>>,
    reconnect_succeeds: AtomicBool,
    reconnect_calls: AtomicUsize,
    search_results: Mutex<Vec<Track>>,
    results_by_query: Mutex<HashMap<String, Vec<Track>>>,
    resolve_error: Mutex<Option<String>>,
    resolves: Mutex<Vec<(String, Requester)>>,
    players: Mutex<HashMap<Id<GuildMarker>, Arc<FakePlayer>>>,
    connections: Mutex<Vec<ConnectionRequest>>,
    destroyed: Mutex<Vec<Id<GuildMarker>>>,
    fail_play: AtomicBool,
    fail_destroy: AtomicBool,
    yielding: AtomicBool,
}

impl FakeAudio {
    pub fn with_nodes(connected: &[bool]) -> Self {
        let nodes = connected
            .iter()
            .enumerate()
            .map(|(id, connected)| NodeInfo {
                id,
                name: format!("node-{id}"),
                host: "localhost".to_string(),
                port: 2333 + id as u16,
                secure: false,
                connected: *connected,
            })
            .collect();

        Self {
            nodes: Mutex::new(nodes),
            reconnect_succeeds: AtomicBool::new(true),
            reconnect_calls: AtomicUsize::new(0),
            search_results: Mutex::new(vec![track("Default Result")]),
            results_by_query: Mutex::new(HashMap::new()),
            resolve_error: Mutex::new(None),
            resolves: Mutex::new(Vec::new()),
            players: Mutex::new(HashMap::new()),
            connections: Mutex::new(Vec::new()),
            destroyed: Mutex::new(Vec::new()),
            fail_play: AtomicBool::new(false),
            fail_destroy: AtomicBool::new(false),
            yielding: AtomicBool::new(false),
        }
    }

    pub fn set_connected(&self, node_id: usize, connected: bool) {
        self.nodes.lock()[node_id].connected = connected;
    }

    pub fn set_reconnect_succeeds(&self, succeeds: bool) {
        self.reconnect_succeeds.store(succeeds, Ordering::SeqCst);
    }

    pub fn reconnect_calls(&self) -> usize {
        self.reconnect_calls.load(Ordering::SeqCst)
    }

    pub fn set_search_results(&self, tracks: Vec<Track>) {
        *self.search_results.lock() = tracks;
    }

    /// Overrides the default search results for one exact query.
    pub fn set_results_for(&self, query: &str, tracks: Vec<Track>) {
        self.results_by_query
            .lock()
            .insert(query.to_string(), tracks);
    }

    pub fn set_resolve_error(&self, error: Option<&str>) {
        *self.resolve_error.lock() = error.map(str::to_string);
    }

    pub fn resolve_calls(&self) -> usize {
        self.resolves.lock().len()
    }

    pub fn last_resolve(&self) -> Option<(String, Requester)> {
        self.resolves.lock().last().cloned()
    }

    pub fn set_fail_play(&self, fail: bool) {
        self.fail_play.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_destroy(&self, fail: bool) {
        self.fail_destroy.store(fail, Ordering::SeqCst);
    }

    /// Makes every backend and player call yield once before completing.
    /// Applies to players inserted afterwards.
    pub fn set_yielding(&self, yielding: bool) {
        self.yielding.store(yielding, Ordering::SeqCst);
    }

    fn yielding(&self) -> bool {
        self.yielding.load(Ordering::SeqCst)
    }

    pub fn insert_player(&self, guild_id: Id<GuildMarker>, snapshot: PlayerSnapshot) {
        let player = FakePlayer::new(
            snapshot,
            self.fail_play.load(Ordering::SeqCst),
            self.yielding(),
        );
        self.players.lock().insert(guild_id, Arc::new(player));
    }

    pub fn snapshot_of(&self, guild_id: Id<GuildMarker>) -> Option<PlayerSnapshot> {
        self.players
            .lock()
            .get(&guild_id)
            .map(|player| player.snapshot.lock().clone())
    }

    pub fn player_actions(&self, guild_id: Id<GuildMarker>) -> Vec<String> {
        self.players
            .lock()
            .get(&guild_id)
            .map(|player| player.actions.lock().clone())
            .unwrap_or_default()
    }

    pub fn connections(&self) -> usize {
        self.connections.lock().len()
    }

    pub fn last_connection(&self) -> Option<ConnectionRequest> {
        self.connections.lock().last().cloned()
    }

    pub fn destroyed(&self) -> Vec<Id<GuildMarker>> {
        self.destroyed.lock().clone()
    }
}

#[async_trait]
impl NodeRegistry for FakeAudio {
    fn nodes(&self) -> Vec<NodeInfo> {
        self.nodes.lock().clone()
    }

    async fn reconnect(&self, node_id: usize) -> anyhow::Result<()> {
        self.reconnect_calls.fetch_add(1, Ordering::SeqCst);
        if self.reconnect_succeeds.load(Ordering::SeqCst) {
            self.set_connected(node_id, true);
            Ok(())
        } else {
            anyhow::bail!("connection refused")
        }
    }
}

#[async_trait]
impl AudioBackend for FakeAudio {
    async fn resolve(
        &self,
        _guild_id: Id<GuildMarker>,
        query: &str,
        requester: &Requester,
    ) -> anyhow::Result<Vec<Track>> {
        self.resolves
            .lock()
            .push((query.to_string(), requester.clone()));
        round_trip(self.yielding()).await;
        if let Some(error) = self.resolve_error.lock().clone() {
            anyhow::bail!(error);
        }
        let tracks = match self.results_by_query.lock().get(query) {
            Some(tracks) => tracks.clone(),
            None => self.search_results.lock().clone(),
        };
        Ok(tracks
            .into_iter()
            .map(|mut track| {
                track.requester = Some(requester.clone());
                track
            })
            .collect())
    }

    fn player(&self, guild_id: Id<GuildMarker>) -> Option<Arc<dyn GuildPlayer>> {
        self.players
            .lock()
            .get(&guild_id)
            .map(|player| player.clone() as Arc<dyn GuildPlayer>)
    }

    async fn create_connection(
        &self,
        request: ConnectionRequest,
    ) -> anyhow::Result<Arc<dyn GuildPlayer>> {
        let guild_id = request.guild_id;
        self.connections.lock().push(request);
        round_trip(self.yielding()).await;
        self.insert_player(guild_id, PlayerSnapshot::default());
        self.player(guild_id)
            .ok_or_else(|| anyhow::anyhow!("player vanished"))
    }

    async fn destroy_player(&self, guild_id: Id<GuildMarker>) -> anyhow::Result<()> {
        if self.fail_destroy.load(Ordering::SeqCst) {
            anyhow::bail!("voice connection already gone");
        }
        self.players.lock().remove(&guild_id);
        self.destroyed.lock().push(guild_id);
        Ok(())
    }
}

/// A fully wired `State` backed by fakes. The calling user is `alice` (id 42)
/// in guild 1, text channel 10.
pub struct TestHarness {
    pub state: Arc<State>,
    pub gateway: Arc<FakeGateway>,
    pub audio: Arc<FakeAudio>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_audio(FakeAudio::with_nodes(&[true]))
    }

    pub fn with_audio(audio: FakeAudio) -> Self {
        let harness = Self::without_audio_backend(Arc::new(audio));
        harness
            .state
            .set_audio(harness.audio.clone())
            .expect("fresh state");
        harness
    }

    pub fn without_audio() -> Self {
        Self::without_audio_backend(Arc::new(FakeAudio::with_nodes(&[true])))
    }

    fn without_audio_backend(audio: Arc<FakeAudio>) -> Self {
        let config = Config::from_lookup(|key| match key {
            "DISCORD_TOKEN" => Some("test-token".to_string()),
            _ => None,
        })
        .expect("test config");
        // Nothing consumes audio events here; sends to a closed channel are ignored.
        let (tx, _) = events::channel();
        let gateway = Arc::new(FakeGateway::default());
        let monitor = HealthMonitor::new(ReconnectPolicy::default(), tx);
        let state = Arc::new(State::new(
            config,
            gateway.clone(),
            monitor,
            IdleTimers::default(),
        ));

        Self {
            state,
            gateway,
            audio,
        }
    }

    pub fn guild_id(&self) -> Id<GuildMarker> {
        Id::new(1)
    }

    pub fn text_channel_id(&self) -> Id<ChannelMarker> {
        Id::new(10)
    }

    pub fn user_id(&self) -> Id<UserMarker> {
        Id::new(42)
    }

    pub fn voice_channel(&self) -> VoiceChannel {
        VoiceChannel {
            id: Id::new(20),
            name: "Lounge".to_string(),
        }
    }

    pub fn join_voice(&self) {
        self.gateway
            .put_in_voice(self.guild_id(), self.user_id(), self.voice_channel());
    }

    pub fn message(&self, content: &str) -> IncomingMessage {
        IncomingMessage {
            id: Id::new(500),
            channel_id: self.text_channel_id(),
            guild_id: self.guild_id(),
            author_id: self.user_id(),
            author_name: "alice".to_string(),
            author_is_bot: false,
            content: content.to_string(),
        }
    }
}
