mod client;
mod process;
mod runner;
pub mod setup;
pub mod twilight;

pub use client::{ChatGateway, SentMessage, VoiceChannel};
pub use process::{detect_player_move, process};
pub use runner::runner;
pub use setup::{Bot, initialize_and_run_bot};
