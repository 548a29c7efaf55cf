use tokio::sync::oneshot;
use twilight_gateway::{CloseFrame, Event, EventTypeFlags, StreamExt};

use super::{Bot, detect_player_move};

#[tracing::instrument(skip(bot, shutdown_rx))]
pub async fn runner(mut bot: Bot, mut shutdown_rx: oneshot::Receiver<()>) -> anyhow::Result<()> {
    loop {
        tokio::select! {
            biased;

            _ = &mut shutdown_rx => {
                tracing::info!("Gateway runner received shutdown signal. Exiting event loop.");
                break;
            }

            item = bot.shard.next_event(EventTypeFlags::all()) => {
                let event = match item {
                    None => {
                        tracing::info!("Shard event stream ended. Runner will exit.");
                        break;
                    }
                    Some(Ok(event)) => event,
                    Some(Err(source)) => {
                        tracing::warn!(?source, "Error receiving event from shard");
                        continue;
                    }
                };

                if let Event::GatewayClose(frame) = &event {
                    match shutdown_rx.try_recv() {
                        Ok(_) | Err(oneshot::error::TryRecvError::Closed) => {
                            tracing::info!(?frame, "Gateway connection closed during planned shutdown.");
                        }
                        Err(oneshot::error::TryRecvError::Empty) => {
                            tracing::warn!(?frame, "Gateway connection closed unexpectedly by Discord. The runner will exit as this is non-resumable.");
                        }
                    }
                    break;
                }

                let state = bot.state.clone();
                let cache = bot.cache.clone();
                let songbird = bot.songbird.clone();
                let events = bot.events.clone();
                let bot_id = bot.user_id;

                tokio::spawn(async move {
                    songbird.process(&event).await;

                    if let Some(moved) = detect_player_move(&event, &cache, bot_id) {
                        let _ = events.send(moved);
                    }
                    cache.update(&event);

                    if let Err(e) = super::process(event, state).await {
                        tracing::error!(error = ?e, "Error processing event");
                    }
                });
            }
        }
    }

    tracing::info!("Gateway runner loop ended. Closing shard...");
    bot.shard.close(CloseFrame::NORMAL);

    Ok(())
}
