use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use once_cell::sync::OnceCell;
use tokio::sync::Mutex;
use twilight_model::id::{Id, marker::GuildMarker};

use crate::audio::AudioBackend;
use crate::config::Config;
use crate::gateway::ChatGateway;
use crate::health_monitor::HealthMonitor;
use crate::idle::IdleTimers;

pub struct State {
    pub config: Config,
    pub gateway: Arc<dyn ChatGateway>,
    pub monitor: Arc<HealthMonitor>,
    pub idle_timers: IdleTimers,
    pub started_at: Instant,
    audio: OnceCell<Arc<dyn AudioBackend>>,
    guild_locks: DashMap<Id<GuildMarker>, Arc<Mutex<()>>>,
}

impl State {
    pub fn new(
        config: Config,
        gateway: Arc<dyn ChatGateway>,
        monitor: Arc<HealthMonitor>,
        idle_timers: IdleTimers,
    ) -> Self {
        Self {
            config,
            gateway,
            monitor,
            idle_timers,
            started_at: Instant::now(),
            audio: OnceCell::new(),
            guild_locks: DashMap::new(),
        }
    }

    /// `None` until the audio subsystem has been initialized.
    pub fn audio(&self) -> Option<Arc<dyn AudioBackend>> {
        self.audio.get().cloned()
    }

    pub fn set_audio(&self, audio: Arc<dyn AudioBackend>) -> anyhow::Result<()> {
        self.audio
            .set(audio)
            .map_err(|_| anyhow::anyhow!("Audio subsystem already initialized"))
    }

    /// Serializes player mutations within one guild. Commands in different
    /// guilds never contend.
    pub fn guild_lock(&self, guild_id: Id<GuildMarker>) -> Arc<Mutex<()>> {
        self.guild_locks.entry(guild_id).or_default().clone()
    }
}
