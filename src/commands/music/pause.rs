use anyhow::Result;
use async_trait::async_trait;

use super::{NOT_PLAYING, guild_player};
use crate::command_handler::{Command, CommandContext, GlobalState};

pub const PAUSED: &str = "⏸️ Paused playback!";
pub const RESUMED: &str = "▶️ Resumed playback!";

pub struct PauseCommand;

#[async_trait]
impl Command for PauseCommand {
    const NAME: &'static str = "pause";
    const USAGE: &'static str = "pause";
    const DESCRIPTION: &'static str = "Pause/Resume playback";

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

        if snapshot.paused {
            player.pause(false).await?;
            cmd_ctx.reply(RESUMED).await?;
        } else {
            player.pause(true).await?;
            cmd_ctx.reply(PAUSED).await?;
        }
        Ok(())
    }
}
