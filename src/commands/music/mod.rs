mod pause;
mod play;
mod queue;
mod skip;
mod stop;

pub use pause::PauseCommand;
pub use play::PlayCommand;
pub use queue::{QueueCommand, render_queue};
pub use skip::SkipCommand;
pub use stop::StopCommand;

use std::sync::Arc;

use twilight_model::id::{Id, marker::GuildMarker};

use crate::audio::{AudioBackend, GuildPlayer};
use crate::command_handler::GlobalState;

pub const NOT_PLAYING: &str = "❌ No music is currently playing!";

/// The guild's player, if the audio subsystem is up and one exists.
pub fn guild_player(
    state: &GlobalState,
    guild_id: Id<GuildMarker>,
) -> Option<(Arc<dyn AudioBackend>, Arc<dyn GuildPlayer>)> {
    let audio = state.audio()?;
    let player = audio.player(guild_id)?;
    Some((audio, player))
}
