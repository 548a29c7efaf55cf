use std::sync::Arc;

use twilight_cache_inmemory::DefaultInMemoryCache;
use twilight_gateway::Event;
use twilight_model::id::{
    Id,
    marker::{ChannelMarker, UserMarker},
};
use twilight_model::voice::VoiceState;

use crate::command_handler::{IncomingMessage, prefix_handler};
use crate::events::AudioEvent;
use crate::state::State;

pub async fn process(event: Event, state: Arc<State>) -> anyhow::Result<()> {
    match event {
        Event::Ready(ready) => {
            tracing::info!(
                guilds = ready.guilds.len(),
                "Logged in as {}#{:04}",
                ready.user.name,
                ready.user.discriminator
            );
        }
        Event::MessageCreate(message_payload) => {
            let message = message_payload.0;
            if message.author.bot {
                return Ok(());
            }
            let Some(incoming) = IncomingMessage::from_message(&message) else {
                return Ok(());
            };

            if let Err(e) = prefix_handler(&incoming, state.clone()).await {
                tracing::error!(error = ?e, "Error handling prefix command");
            }
        }
        _ => {}
    }
    Ok(())
}

/// Must run before the cache sees `event`, since the bot's previous channel
/// is read from the cache.
pub fn detect_player_move(
    event: &Event,
    cache: &DefaultInMemoryCache,
    bot_id: Id<UserMarker>,
) -> Option<AudioEvent> {
    let Event::VoiceStateUpdate(update) = event else {
        return None;
    };
    let update = &update.0;
    let previous = cache
        .voice_state(bot_id, update.guild_id?)
        .map(|state| state.channel_id());
    player_move(previous, update, bot_id)
}

fn player_move(
    previous: Option<Id<ChannelMarker>>,
    update: &VoiceState,
    bot_id: Id<UserMarker>,
) -> Option<AudioEvent> {
    if update.user_id != bot_id {
        return None;
    }
    let guild_id = update.guild_id?;
    let to = update.channel_id?;
    let from = previous?;

    (from != to).then_some(AudioEvent::PlayerMove { guild_id, from, to })
}
