use async_trait::async_trait;
use twilight_model::guild::Permissions;
use twilight_model::id::{
    Id,
    marker::{ChannelMarker, GuildMarker, MessageMarker, UserMarker},
};

use crate::command_handler::CommandResponse;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceChannel {
    pub id: Id<ChannelMarker>,
    pub name: String,
}

/// Handle to a message the bot has sent, used to edit it later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentMessage {
    pub channel_id: Id<ChannelMarker>,
    pub message_id: Id<MessageMarker>,
}

#[async_trait]
pub trait ChatGateway: Send + Sync {
    /// The voice channel the user currently occupies in the guild.
    fn voice_channel_of(
        &self,
        guild_id: Id<GuildMarker>,
        user_id: Id<UserMarker>,
    ) -> Option<VoiceChannel>;

    /// The bot's own permissions in a channel, `None` if the bot's guild
    /// membership is not known.
    fn bot_permissions_in(
        &self,
        guild_id: Id<GuildMarker>,
        channel_id: Id<ChannelMarker>,
    ) -> Option<Permissions>;

    async fn send(
        &self,
        channel_id: Id<ChannelMarker>,
        reply_to: Option<Id<MessageMarker>>,
        response: &CommandResponse,
    ) -> anyhow::Result<SentMessage>;

    async fn edit(&self, message: &SentMessage, content: &str) -> anyhow::Result<()>;

    fn bot_tag(&self) -> Option<String>;

    fn guild_count(&self) -> usize;
}
