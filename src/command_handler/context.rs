use std::sync::Arc;

use twilight_model::{
    channel::Message,
    id::{
        Id,
        marker::{ChannelMarker, GuildMarker, MessageMarker, UserMarker},
    },
};

use crate::audio::Requester;
use crate::command_handler::response::CommandResponse;
use crate::gateway::{ChatGateway, SentMessage};
use crate::prefix_parser::Arguments;

/// A guild text message as seen by the command layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub id: Id<MessageMarker>,
    pub channel_id: Id<ChannelMarker>,
    pub guild_id: Id<GuildMarker>,
    pub author_id: Id<UserMarker>,
    pub author_name: String,
    pub author_is_bot: bool,
    pub content: String,
}

impl IncomingMessage {
    /// `None` for messages sent outside a guild.
    pub fn from_message(message: &Message) -> Option<Self> {
        Some(Self {
            id: message.id,
            channel_id: message.channel_id,
            guild_id: message.guild_id?,
            author_id: message.author.id,
            author_name: message.author.name.clone(),
            author_is_bot: message.author.bot,
            content: message.content.clone(),
        })
    }

    pub fn requester(&self) -> Requester {
        Requester {
            id: self.author_id,
            name: self.author_name.clone(),
        }
    }
}

pub struct CommandContext<'a> {
    pub message: &'a IncomingMessage,
    pub arguments: Arguments<'a>,
    pub prefix: &'a str,
    pub gateway: Arc<dyn ChatGateway>,
}

impl<'a> CommandContext<'a> {
    pub fn guild_id(&self) -> Id<GuildMarker> {
        self.message.guild_id
    }

    pub fn channel_id(&self) -> Id<ChannelMarker> {
        self.message.channel_id
    }

    pub fn author_id(&self) -> Id<UserMarker> {
        self.message.author_id
    }

    /// Everything after the command name, internal spacing preserved.
    pub fn remainder(&self) -> &'a str {
        self.arguments.remainder()
    }

    pub async fn reply(
        &self,
        response: impl Into<CommandResponse> + Send,
    ) -> anyhow::Result<SentMessage> {
        let response = response.into();
        self.gateway
            .send(self.message.channel_id, Some(self.message.id), &response)
            .await
    }

    pub async fn edit(&self, message: &SentMessage, content: &str) -> anyhow::Result<()> {
        self.gateway.edit(message, content).await
    }

    pub async fn reply_error(
        &self,
        error: &anyhow::Error,
        create_error_fn: impl Fn(&anyhow::Error) -> CommandResponse + Send,
    ) -> anyhow::Result<()> {
        tracing::error!(error = ?error, "Command execution failed");
        let error_response = create_error_fn(error);
        self.reply(error_response).await?;
        Ok(())
    }
}
