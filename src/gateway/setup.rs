use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Context;
use dotenvy::dotenv;
use lavalink_rs::client::LavalinkClient;
use lavalink_rs::model::events as LavalinkEventsModel;
use lavalink_rs::node::NodeBuilder;
use lavalink_rs::prelude::NodeDistributionStrategy;
use songbird::Songbird;
use songbird::shards::TwilightMap;
use tokio::sync::oneshot;
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use twilight_cache_inmemory::DefaultInMemoryCache;
use twilight_gateway::{ConfigBuilder, Intents, Shard, ShardId};
use twilight_http::Client as HttpClient;
use twilight_model::gateway::payload::outgoing::update_presence::UpdatePresencePayload;
use twilight_model::gateway::presence::{ActivityType, MinimalActivity, Status};
use twilight_model::id::Id;
use twilight_model::id::marker::UserMarker;

use super::runner;
use super::twilight::TwilightGateway;
use crate::audio::NodeRegistry;
use crate::audio::lavalink::LavalinkBackend;
use crate::config::Config;
use crate::events::{self, AudioEventSender};
use crate::health_monitor::{HealthMonitor, ReconnectPolicy};
use crate::idle::IdleTimers;
use crate::lavalink_events::{self, HookData};
use crate::state::State;
use crate::web;

pub struct Bot {
    pub shard: Shard,
    pub state: Arc<State>,
    pub cache: Arc<DefaultInMemoryCache>,
    pub songbird: Arc<Songbird>,
    pub events: AudioEventSender,
    pub user_id: Id<UserMarker>,
}

fn init_tracing() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set global default tracing subscriber: {}", e))?;
    Ok(())
}

fn load_config() -> anyhow::Result<Config> {
    if let Err(e) = dotenv() {
        tracing::debug!("No .env file loaded: {}", e);
    }
    Config::from_env()
}

fn init_shard(config: &Config, presence: UpdatePresencePayload) -> Shard {
    let config = ConfigBuilder::new(
        config.token.clone(),
        Intents::GUILDS
            | Intents::GUILD_MESSAGES
            | Intents::GUILD_VOICE_STATES
            | Intents::MESSAGE_CONTENT
            | Intents::GUILD_MEMBERS,
    )
    .presence(presence)
    .build();
    Shard::with_config(ShardId::ONE, config)
}

fn presence() -> anyhow::Result<UpdatePresencePayload> {
    Ok(UpdatePresencePayload::new(
        [MinimalActivity {
            name: "music".to_string(),
            kind: ActivityType::Listening,
            url: None,
        }
        .into()],
        false,
        None,
        Status::Online,
    )?)
}

async fn init_lavalink_client(
    config: &Config,
    user_id: Id<UserMarker>,
    events: AudioEventSender,
) -> LavalinkClient {
    let node = NodeBuilder {
        hostname: config.lavalink.address(),
        is_ssl: config.lavalink.secure,
        events: LavalinkEventsModel::Events::default(),
        password: config.lavalink.password.clone(),
        user_id: user_id.into(),
        session_id: None,
    };

    let hook_data = HookData {
        node_name: config.lavalink.name.clone(),
        events,
    };

    LavalinkClient::new_with_data(
        lavalink_events::handlers(),
        vec![node],
        NodeDistributionStrategy::round_robin(),
        Arc::new(hook_data),
    )
    .await
}

fn init_songbird_client(
    shard_sender: twilight_gateway::MessageSender,
    shard_id_number: u32,
    user_id: Id<UserMarker>,
) -> Arc<Songbird> {
    let senders = TwilightMap::new(HashMap::from([(shard_id_number, shard_sender)]));
    Arc::new(Songbird::twilight(Arc::new(senders), user_id))
}

pub async fn initialize_and_run_bot() -> anyhow::Result<()> {
    init_tracing().context("Failed to initialize tracing")?;
    tracing::info!("Cadence starting up...");

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration, refusing to start");
            return Err(e);
        }
    };
    tracing::info!(node = ?config.lavalink, prefix = %config.configured_prefix, "Configuration loaded");

    let http = Arc::new(HttpClient::new(config.token.clone()));
    let cache = Arc::new(DefaultInMemoryCache::new());

    let (events_tx, events_rx) = events::channel();
    let monitor = HealthMonitor::new(ReconnectPolicy::default(), events_tx.clone());
    let gateway = Arc::new(TwilightGateway::new(http.clone(), cache.clone()));
    let state = Arc::new(State::new(
        config.clone(),
        gateway,
        monitor.clone(),
        IdleTimers::default(),
    ));

    let web_state = state.clone();
    let http_port = config.http_port;
    tokio::spawn(async move {
        if let Err(e) = web::serve(web_state, http_port).await {
            tracing::error!(error = ?e, "Health server stopped");
        }
    });

    tokio::spawn(events::run_event_loop(events_rx, state.clone()));

    let current_user_id = http
        .current_user()
        .await
        .context("Failed to get current user from Discord")?
        .model()
        .await
        .context("Failed to model current user data")?
        .id;

    let shard = init_shard(&config, presence()?);
    let songbird = init_songbird_client(shard.sender(), shard.id().number(), current_user_id);

    let lavalink = init_lavalink_client(&config, current_user_id, events_tx.clone()).await;
    let backend = Arc::new(LavalinkBackend::new(
        lavalink,
        songbird.clone(),
        vec![config.lavalink.clone()],
        events_tx.clone(),
    ));
    state
        .set_audio(backend.clone())
        .context("Failed to register audio backend")?;
    tracing::info!(
        connected = backend.nodes().iter().filter(|n| n.connected).count(),
        "Audio subsystem initialized"
    );

    monitor.spawn_periodic_check(backend.clone());
    monitor.trigger(backend);

    let bot = Bot {
        shard,
        state,
        cache,
        songbird,
        events: events_tx,
        user_id: current_user_id,
    };

    tracing::info!("Bot initialized. Connecting to gateway and running event loop...");

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let runner_handle = tokio::spawn(async move { runner(bot, shutdown_rx).await });

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = ?e, "Failed to listen for ctrl_c signal");
        let _ = shutdown_tx.send(());
    } else {
        tracing::info!("Ctrl+C received. Initiating graceful shutdown...");
        if shutdown_tx.send(()).is_err() {
            tracing::warn!(
                "Failed to send shutdown signal to gateway runner; it might have already exited."
            );
        }
    }

    tracing::info!("Waiting for gateway runner to complete...");
    match runner_handle.await {
        Ok(Ok(())) => tracing::info!("Gateway runner finished successfully."),
        Ok(Err(e)) => tracing::error!(error = ?e, "Gateway runner failed."),
        Err(e) => tracing::error!(error = ?e, "Gateway runner task panicked or was cancelled."),
    }

    tracing::info!("Shutdown complete.");
    Ok(())
}
