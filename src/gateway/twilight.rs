use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use twilight_cache_inmemory::DefaultInMemoryCache;
use twilight_http::Client as HttpClient;
use twilight_model::guild::Permissions;
use twilight_model::id::{
    Id,
    marker::{ChannelMarker, GuildMarker, MessageMarker, UserMarker},
};

use super::client::{ChatGateway, SentMessage, VoiceChannel};
use crate::command_handler::CommandResponse;

/// Discord access through the REST client and the in-memory gateway cache.
pub struct TwilightGateway {
    http: Arc<HttpClient>,
    cache: Arc<DefaultInMemoryCache>,
}

impl TwilightGateway {
    pub fn new(http: Arc<HttpClient>, cache: Arc<DefaultInMemoryCache>) -> Self {
        Self { http, cache }
    }
}

#[async_trait]
impl ChatGateway for TwilightGateway {
    fn voice_channel_of(
        &self,
        guild_id: Id<GuildMarker>,
        user_id: Id<UserMarker>,
    ) -> Option<VoiceChannel> {
        let channel_id = self.cache.voice_state(user_id, guild_id)?.channel_id();
        let name = self
            .cache
            .channel(channel_id)
            .and_then(|channel| channel.name.clone())
            .unwrap_or_else(|| channel_id.to_string());
        Some(VoiceChannel {
            id: channel_id,
            name,
        })
    }

    fn bot_permissions_in(
        &self,
        _guild_id: Id<GuildMarker>,
        channel_id: Id<ChannelMarker>,
    ) -> Option<Permissions> {
        let bot_id = self.cache.current_user()?.id;
        match self.cache.permissions().in_channel(bot_id, channel_id) {
            Ok(permissions) => Some(permissions),
            Err(e) => {
                tracing::debug!(channel_id = %channel_id, error = ?e, "Could not compute bot permissions");
                None
            }
        }
    }

    async fn send(
        &self,
        channel_id: Id<ChannelMarker>,
        reply_to: Option<Id<MessageMarker>>,
        response: &CommandResponse,
    ) -> anyhow::Result<SentMessage> {
        let mut create_message = self.http.create_message(channel_id);

        if let Some(message_id) = reply_to {
            create_message = create_message.reply(message_id);
        }
        if !response.content.is_empty() {
            create_message = create_message.content(&response.content);
        }
        if !response.embeds.is_empty() {
            create_message = create_message.embeds(&response.embeds);
        }

        let message = create_message
            .await
            .map_err(|e| anyhow!("Failed to send message: {}", e))?
            .model()
            .await
            .map_err(|e| anyhow!("Failed to deserialize sent message: {}", e))?;

        Ok(SentMessage {
            channel_id,
            message_id: message.id,
        })
    }

    async fn edit(&self, message: &SentMessage, content: &str) -> anyhow::Result<()> {
        self.http
            .update_message(message.channel_id, message.message_id)
            .content(Some(content))
            .await
            .map_err(|e| anyhow!("Failed to edit message: {}", e))?;
        Ok(())
    }

    fn bot_tag(&self) -> Option<String> {
        let user = self.cache.current_user()?;
        Some(if user.discriminator == 0 {
            user.name.clone()
        } else {
            format!("{}#{:04}", user.name, user.discriminator)
        })
    }

    fn guild_count(&self) -> usize {
        self.cache.stats().guilds()
    }
}
