use anyhow::Result;
use async_trait::async_trait;

use super::{NOT_PLAYING, guild_player};
use crate::command_handler::{Command, CommandContext, GlobalState};

pub const STOPPED: &str = "⏹️ Stopped playback and cleared queue!";

pub struct StopCommand;

#[async_trait]
impl Command for StopCommand {
    const NAME: &'static str = "stop";
    const USAGE: &'static str = "stop";
    const DESCRIPTION: &'static str = "Stop playback and clear queue";

    async fn execute<'ctx>(state: GlobalState, cmd_ctx: CommandContext<'ctx>) -> Result<()> {
        let guild_id = cmd_ctx.guild_id();
        let Some((audio, player)) = guild_player(&state, guild_id) else {
            cmd_ctx.reply(NOT_PLAYING).await?;
            return Ok(());
        };

        player.stop().await?;
        state.idle_timers.cancel(guild_id);
        audio.destroy_player(guild_id).await?;

        cmd_ctx.reply(STOPPED).await?;
        Ok(())
    }
}
