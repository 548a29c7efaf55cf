use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use tokio::task::JoinHandle;
use twilight_model::id::{Id, marker::GuildMarker};

use crate::audio::AudioBackend;

pub const IDLE_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Per-guild idle-disconnect timers. At most one is live per guild.
#[derive(Clone)]
pub struct IdleTimers {
    inner: Arc<Inner>,
}

struct Inner {
    timeout: Duration,
    generation: AtomicU64,
    timers: DashMap<Id<GuildMarker>, (u64, JoinHandle<()>)>,
}

impl Default for IdleTimers {
    fn default() -> Self {
        Self::new(IDLE_TIMEOUT)
    }
}

impl IdleTimers {
    pub fn new(timeout: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                timeout,
                generation: AtomicU64::new(0),
                timers: DashMap::new(),
            }),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.inner.timeout
    }

    pub fn is_armed(&self, guild_id: Id<GuildMarker>) -> bool {
        self.inner.timers.contains_key(&guild_id)
    }

    /// Schedules the player for destruction once the timeout elapses,
    /// replacing any timer already pending for the guild. Guilds without a
    /// live player are left alone.
    pub fn arm(&self, guild_id: Id<GuildMarker>, audio: Arc<dyn AudioBackend>) {
        if audio.player(guild_id).is_none() {
            tracing::debug!(guild_id = %guild_id, "No live player, idle timer not armed");
            return;
        }

        let generation = self.inner.generation.fetch_add(1, Ordering::Relaxed) + 1;
        let timeout = self.inner.timeout;
        let inner = self.inner.clone();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            if inner
                .timers
                .remove_if(&guild_id, |_, (current, _)| *current == generation)
                .is_none()
            {
                return;
            }

            tracing::info!(guild_id = %guild_id, "Disconnecting due to inactivity");
            if let Err(e) = audio.destroy_player(guild_id).await {
                tracing::error!(guild_id = %guild_id, error = ?e, "Failed to destroy idle player");
            }
        });

        if let Some((_, (_, previous))) = self.inner.timers.remove(&guild_id) {
            previous.abort();
        }
        self.inner.timers.insert(guild_id, (generation, handle));
    }

    /// Returns whether a pending timer was cleared.
    pub fn cancel(&self, guild_id: Id<GuildMarker>) -> bool {
        match self.inner.timers.remove(&guild_id) {
            Some((_, (_, handle))) => {
                handle.abort();
                true
            }
            None => false,
        }
    }
}
