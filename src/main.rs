#![deny(clippy::all)]

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

pub mod audio;
pub mod command_handler;
pub mod commands;
pub mod config;
pub mod events;
pub mod gateway;
pub mod health_monitor;
pub mod idle;
pub mod lavalink_events;
pub mod prefix_parser;
pub mod state;
pub mod web;

#[cfg(test)]
mod testing;

#[tokio::main]
#[tracing::instrument]
async fn main() -> anyhow::Result<()> {
    print_banner();
    crate::gateway::initialize_and_run_bot().await
}

const BANNER: &str = r#"
                 _
  ___ __ _  __| | ___ _ __   ___ ___
 / __/ _` |/ _` |/ _ \ '_ \ / __/ _ \
| (_| (_| | (_| |  __/ | | | (_| __/
 \___\__,_|\__,_|\___|_| |_|\___\___|

Cadence - prefix-command music relay for Lavalink
"#;

fn print_banner() {
    let git_hash = env!("GIT_HASH");
    let build_time = env!("BUILD_TIME");
    let version = env!("APP_VERSION");

    println!("{}", BANNER);
    println!("  Version   : {}", version);
    println!("  Commit    : {}", git_hash);
    println!("  Built at  : {}", build_time);
    println!("--------------------------------------------------------------\n");
}
