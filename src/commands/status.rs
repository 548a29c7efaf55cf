use std::fmt::Write;

use anyhow::Result;
use async_trait::async_trait;
use twilight_model::channel::message::Embed;
use twilight_util::builder::embed::{EmbedBuilder, EmbedFieldBuilder};

use crate::audio::{NodeInfo, PlayerSnapshot};
use crate::command_handler::{Command, CommandContext, CommandResponseBuilder, GlobalState};
use crate::health_monitor::MonitorSnapshot;

/// Read-only view of the music subsystem for one guild.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusReport {
    pub initialized: bool,
    pub nodes: Vec<NodeInfo>,
    pub player: Option<PlayerSnapshot>,
    pub monitor: MonitorSnapshot,
}

pub struct StatusCommand;

#[async_trait]
impl Command for StatusCommand {
    const NAME: &'static str = "status";
    const USAGE: &'static str = "status";
    const DESCRIPTION: &'static str = "Show music system status";

    async fn execute<'ctx>(state: GlobalState, cmd_ctx: CommandContext<'ctx>) -> Result<()> {
        let report = collect_status(&state, &cmd_ctx).await;
        let response = CommandResponseBuilder::new()
            .embed(build_status_embed(&report))
            .build();
        cmd_ctx.reply(response).await?;
        Ok(())
    }
}

async fn collect_status(state: &GlobalState, cmd_ctx: &CommandContext<'_>) -> StatusReport {
    let audio = state.audio();
    let nodes = audio.as_ref().map(|a| a.nodes()).unwrap_or_default();

    let player = match audio.as_ref().and_then(|a| a.player(cmd_ctx.guild_id())) {
        Some(player) => match player.snapshot().await {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                tracing::warn!(error = ?e, "Failed to read player state for status");
                None
            }
        },
        None => None,
    };

    StatusReport {
        initialized: audio.is_some(),
        nodes,
        player,
        monitor: state.monitor.snapshot(),
    }
}

pub fn build_status_embed(report: &StatusReport) -> Embed {
    let connected = report.nodes.iter().filter(|n| n.connected).count();

    let mut node_lines = format!("{}/{} connected", connected, report.nodes.len());
    for node in &report.nodes {
        let _ = write!(
            node_lines,
            "\n• {} ({}:{}): {}",
            node.name,
            node.host,
            node.port,
            if node.connected {
                "🟢 Connected"
            } else {
                "🔴 Disconnected"
            }
        );
    }

    let player_state = match &report.player {
        None => "No active player".to_string(),
        Some(snapshot) => {
            let state = match (snapshot.is_playing(), snapshot.paused) {
                (true, true) => "⏸️ Paused",
                (true, false) => "▶️ Playing",
                (false, _) => "⏹️ Idle",
            };
            match &snapshot.current {
                Some(track) => format!("{}\nCurrent track: {}", state, track.title),
                None => state.to_string(),
            }
        }
    };

    let reconnection = format!(
        "State: {}\nAttempts: {}\nBackoff interval: {}",
        report.monitor.phase,
        report.monitor.attempts,
        humantime::format_duration(report.monitor.interval)
    );

    EmbedBuilder::new()
        .title("📊 Music System Status")
        .color(if connected > 0 { 0x1DB954 } else { 0xdd7878 })
        .field(
            EmbedFieldBuilder::new(
                "Audio subsystem",
                if report.initialized {
                    "✅ Initialized"
                } else {
                    "❌ Not initialized"
                },
            )
            .inline(),
        )
        .field(EmbedFieldBuilder::new("Nodes", node_lines))
        .field(EmbedFieldBuilder::new("Player", player_state))
        .field(EmbedFieldBuilder::new("Reconnection", reconnection))
        .build()
}
