pub mod help;
pub mod music;
pub mod status;

use crate::{command_def, command_handler::CommandDefinition};
use once_cell::sync::Lazy;

use help::HelpCommand;
use music::*;
use status::StatusCommand;

pub static COMMANDS: Lazy<Vec<CommandDefinition>> = Lazy::new(|| {
    vec![
        command_def!(PlayCommand),
        command_def!(StopCommand),
        command_def!(SkipCommand),
        command_def!(PauseCommand),
        command_def!(QueueCommand),
        command_def!(StatusCommand),
        command_def!(HelpCommand),
    ]
});
