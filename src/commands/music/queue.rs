use std::fmt::Write;

use anyhow::Result;
use async_trait::async_trait;

use super::guild_player;
use crate::audio::PlayerSnapshot;
use crate::command_handler::{Command, CommandContext, GlobalState};

pub const NO_QUEUE: &str = "❌ No music queue found!";
const QUEUE_PREVIEW_LEN: usize = 10;

pub struct QueueCommand;

#[async_trait]
impl Command for QueueCommand {
    const NAME: &'static str = "queue";
    const USAGE: &'static str = "queue";
    const DESCRIPTION: &'static str = "Show current queue";

    async fn execute<'ctx>(state: GlobalState, cmd_ctx: CommandContext<'ctx>) -> Result<()> {
        let Some((_, player)) = guild_player(&state, cmd_ctx.guild_id()) else {
            cmd_ctx.reply(NO_QUEUE).await?;
            return Ok(());
        };

        let snapshot = player.snapshot().await?;
        if !snapshot.is_playing() && snapshot.queue.is_empty() {
            cmd_ctx.reply(NO_QUEUE).await?;
            return Ok(());
        }

        cmd_ctx.reply(render_queue(&snapshot)).await?;
        Ok(())
    }
}

pub fn render_queue(snapshot: &PlayerSnapshot) -> String {
    let mut text = String::new();

    if let Some(current) = &snapshot.current {
        let _ = writeln!(text, "🎵 **Now Playing:** {}", current.title);
    }

    let queued = snapshot.queue.len();
    if queued > 0 {
        let _ = writeln!(text, "\n📋 **Queue ({} songs):**", queued);
        for (index, track) in snapshot.queue.iter().take(QUEUE_PREVIEW_LEN).enumerate() {
            let _ = writeln!(text, "{}. {}", index + 1, track.title);
        }
        if queued > QUEUE_PREVIEW_LEN {
            let _ = write!(text, "... and {} more songs", queued - QUEUE_PREVIEW_LEN);
        }
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command_handler::prefix_handler;
    use crate::testing::{TestHarness, track};
    use pretty_assertions::assert_eq;

    fn titles(range: std::ops::RangeInclusive<char>) -> Vec<crate::audio::Track> {
        range.map(|c| track(&c.to_string())).collect()
    }

    #[test]
    fn test_render_truncates_after_ten() {
        let snapshot = PlayerSnapshot {
            current: Some(track("A")),
            paused: false,
            queue: titles('B'..='L'),
        };

        let expected = "🎵 **Now Playing:** A\n\
            \n📋 **Queue (11 songs):**\n\
            1. B\n2. C\n3. D\n4. E\n5. F\n6. G\n7. H\n8. I\n9. J\n10. K\n\
            ... and 1 more songs";
        assert_eq!(render_queue(&snapshot), expected);
    }

    #[test]
    fn test_render_current_only() {
        let snapshot = PlayerSnapshot {
            current: Some(track("Solo")),
            paused: true,
            queue: Vec::new(),
        };
        assert_eq!(render_queue(&snapshot), "🎵 **Now Playing:** Solo\n");
    }

    #[tokio::test]
    async fn test_queue_command_replies_with_listing() {
        let harness = TestHarness::new();
        harness.audio.insert_player(
            harness.guild_id(),
            PlayerSnapshot {
                current: Some(track("A")),
                paused: false,
                queue: titles('B'..='L'),
            },
        );

        let message = harness.message("!queue");
        prefix_handler(&message, harness.state.clone()).await.unwrap();

        let replies = harness.gateway.replies();
        assert_eq!(replies.len(), 1);
        assert!(replies[0].contains("🎵 **Now Playing:** A"));
        assert!(replies[0].contains("1. B\n"));
        assert!(replies[0].contains("10. K\n"));
        assert!(!replies[0].contains("11. L"));
        assert!(replies[0].ends_with("... and 1 more songs"));
    }

    #[tokio::test]
    async fn test_queue_without_music_is_rejected() {
        let harness = TestHarness::new();
        let message = harness.message("!queue");

        prefix_handler(&message, harness.state.clone()).await.unwrap();
        harness.audio.insert_player(harness.guild_id(), PlayerSnapshot::default());
        prefix_handler(&message, harness.state.clone()).await.unwrap();

        assert_eq!(
            harness.gateway.replies(),
            vec![NO_QUEUE.to_string(), NO_QUEUE.to_string()]
        );
    }
}
