use anyhow::Result;
use async_trait::async_trait;
use twilight_model::channel::message::Embed;
use twilight_model::util::Timestamp;
use twilight_util::builder::embed::{EmbedBuilder, EmbedFieldBuilder};

use crate::command_handler::{Command, CommandContext, CommandResponseBuilder, GlobalState};
use crate::commands::COMMANDS;

pub struct HelpCommand;

#[async_trait]
impl Command for HelpCommand {
    const NAME: &'static str = "help";
    const USAGE: &'static str = "help";
    const DESCRIPTION: &'static str = "Show this help message";

    async fn execute<'ctx>(_state: GlobalState, cmd_ctx: CommandContext<'ctx>) -> Result<()> {
        let embed = build_help_embed(cmd_ctx.prefix);
        cmd_ctx
            .reply(CommandResponseBuilder::new().embed(embed).build())
            .await?;
        Ok(())
    }
}

pub fn build_help_embed(prefix: &str) -> Embed {
    let mut embed_builder = EmbedBuilder::new()
        .title("🎵 Music Bot Commands")
        .description("Here are all the available commands:")
        .color(0x00ff00);

    for command_def in COMMANDS.iter() {
        embed_builder = embed_builder.field(EmbedFieldBuilder::new(
            format!("{}{}", prefix, command_def.usage),
            command_def.description,
        ));
    }

    match Timestamp::from_secs(chrono::Utc::now().timestamp()) {
        Ok(timestamp) => embed_builder = embed_builder.timestamp(timestamp),
        Err(e) => tracing::warn!(error = ?e, "Failed to build timestamp for help embed"),
    }

    embed_builder.build()
}
