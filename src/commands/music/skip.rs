use anyhow::Result;
use async_trait::async_trait;

use super::{NOT_PLAYING, guild_player};
use crate::command_handler::{Command, CommandContext, GlobalState};

pub const NOTHING_TO_SKIP_TO: &str = "❌ No songs in queue to skip to!";
pub const SKIPPED: &str = "⏭️ Skipped to next track!";

pub struct SkipCommand;

#[async_trait]
impl Command for SkipCommand {
    const NAME: &'static str = "skip";
    const USAGE: &'static str = "skip";
    const DESCRIPTION: &'static str = "Skip to next song";

    async fn execute<'ctx>(state: GlobalState, cmd_ctx: CommandContext<'ctx>) -> Result<()> {
        let Some((_, player)) = guild_player(&state, cmd_ctx.guild_id()) else {
            cmd_ctx.reply(NOT_PLAYING).await?;
            return Ok(());
        };

        let snapshot = player.snapshot().await?;
        if !snapshot.is_playing() {
            cmd_ctx.reply(NOT_PLAYING).await?;
            return Ok(());
        }
        if snapshot.queue.is_empty() {
            cmd_ctx.reply(NOTHING_TO_SKIP_TO).await?;
            return Ok(());
        }

        player.skip().await?;
        cmd_ctx.reply(SKIPPED).await?;
        Ok(())
    }
}
