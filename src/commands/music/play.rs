use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use twilight_model::guild::Permissions;

use crate::audio::{AudioBackend, ConnectionRequest, Track};
use crate::command_handler::{Command, CommandContext, GlobalState};
use crate::gateway::VoiceChannel;

pub const NOT_IN_VOICE: &str = "❌ You need to be in a voice channel to use this command!";
pub const NOT_INITIALIZED: &str =
    "❌ The music system is still starting up. Please try again in a moment.";
pub const NO_NODES: &str = "❌ No music servers are configured.";
pub const NODES_UNAVAILABLE: &str =
    "❌ The music service is temporarily unavailable. Reconnecting, please try again shortly.";
pub const MISSING_PERMISSIONS: &str =
    "❌ I don't have permission to join or speak in that voice channel!";
pub const NO_RESULTS: &str = "❌ No results found for your search.";
pub const PLAY_FAILED: &str = "❌ Failed to play the requested song.";

pub fn missing_query_message(prefix: &str) -> String {
    format!(
        "❌ Please provide a song name or YouTube link!\nExample: `{prefix}play lovely` or `{prefix}play https://youtube.com/watch?v=...`"
    )
}

pub fn searching_message(query: &str) -> String {
    format!("🔍 Searching for: **{}**...", query)
}

pub fn now_playing_message(track: &Track, requester: &str, channel: &VoiceChannel) -> String {
    format!(
        "🎵 **Now Playing:** {}\n👤 **Requested by:** {}\n🔊 **Channel:** {}",
        track.title, requester, channel.name
    )
}

pub struct PlayCommand;

enum PlayOutcome {
    NoResults,
    Started(Track),
    Queued(Track),
}

#[async_trait]
impl Command for PlayCommand {
    const NAME: &'static str = "play";
    const USAGE: &'static str = "play [song/url]";
    const DESCRIPTION: &'static str = "Play a song or add to queue";

    async fn execute<'ctx>(state: GlobalState, cmd_ctx: CommandContext<'ctx>) -> Result<()> {
        let song_query = cmd_ctx.remainder();
        if song_query.is_empty() {
            cmd_ctx.reply(missing_query_message(cmd_ctx.prefix)).await?;
            return Ok(());
        }

        let guild_id = cmd_ctx.guild_id();
        let Some(voice_channel) = state
            .gateway
            .voice_channel_of(guild_id, cmd_ctx.author_id())
        else {
            cmd_ctx.reply(NOT_IN_VOICE).await?;
            return Ok(());
        };

        let Some(audio) = state.audio() else {
            cmd_ctx.reply(NOT_INITIALIZED).await?;
            return Ok(());
        };

        let nodes = audio.nodes();
        if nodes.is_empty() {
            cmd_ctx.reply(NO_NODES).await?;
            return Ok(());
        }
        if !nodes.iter().any(|node| node.connected) {
            tracing::warn!(guild_id = %guild_id, "Play requested with no connected audio nodes");
            state.monitor.trigger(audio.clone());
            cmd_ctx.reply(NODES_UNAVAILABLE).await?;
            return Ok(());
        }

        let can_join = state
            .gateway
            .bot_permissions_in(guild_id, voice_channel.id)
            .is_some_and(|p| p.contains(Permissions::CONNECT | Permissions::SPEAK));
        if !can_join {
            cmd_ctx.reply(MISSING_PERMISSIONS).await?;
            return Ok(());
        }

        let placeholder = cmd_ctx.reply(searching_message(song_query)).await?;

        let final_text = match play_track(&state, &audio, &cmd_ctx, &voice_channel, song_query).await
        {
            Ok(PlayOutcome::NoResults) => NO_RESULTS.to_string(),
            Ok(PlayOutcome::Started(track) | PlayOutcome::Queued(track)) => {
                now_playing_message(&track, &cmd_ctx.message.author_name, &voice_channel)
            }
            Err(e) => {
                tracing::error!(guild_id = %guild_id, error = ?e, "Error in play command");
                PLAY_FAILED.to_string()
            }
        };

        cmd_ctx.edit(&placeholder, &final_text).await?;
        Ok(())
    }
}

async fn play_track(
    state: &GlobalState,
    audio: &Arc<dyn AudioBackend>,
    cmd_ctx: &CommandContext<'_>,
    voice_channel: &VoiceChannel,
    query: &str,
) -> Result<PlayOutcome> {
    let guild_id = cmd_ctx.guild_id();

    tracing::info!(guild_id = %guild_id, query, "Searching");
    let tracks = audio
        .resolve(guild_id, query, &cmd_ctx.message.requester())
        .await?;
    // First result wins; no disambiguation.
    let Some(track) = tracks.into_iter().next() else {
        return Ok(PlayOutcome::NoResults);
    };
    tracing::info!(guild_id = %guild_id, "Found track: {} by {}", track.title, track.author);

    // Held until playback starts so concurrent requests queue in arrival order.
    let lock = state.guild_lock(guild_id);
    let _guard = lock.lock().await;

    let player = match audio.player(guild_id) {
        Some(player) => {
            tracing::debug!(guild_id = %guild_id, "Using existing connection");
            player
        }
        None => {
            tracing::info!(guild_id = %guild_id, channel = %voice_channel.id, "Creating new connection");
            audio
                .create_connection(ConnectionRequest {
                    guild_id,
                    voice_channel_id: voice_channel.id,
                    text_channel_id: cmd_ctx.channel_id(),
                    deaf: true,
                })
                .await?
        }
    };

    if state.idle_timers.cancel(guild_id) {
        tracing::info!(guild_id = %guild_id, "Cleared idle disconnect timer, new track added");
    }

    let before = player.snapshot().await?;
    player.enqueue(track.clone()).await?;

    if !before.is_playing() && !before.paused {
        player.play().await?;
        tracing::info!(guild_id = %guild_id, "Track playback started");
        Ok(PlayOutcome::Started(track))
    } else {
        tracing::info!(guild_id = %guild_id, "Track added to queue");
        Ok(PlayOutcome::Queued(track))
    }
}
