use std::sync::Arc;

use axum::{Json, Router, extract::State as AxumState, routing::get};
use serde::Serialize;
use tokio::net::TcpListener;

use crate::state::State;

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    bot: String,
    uptime: f64,
    guilds: usize,
}

async fn health_check(AxumState(state): AxumState<Arc<State>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "online",
        bot: state
            .gateway
            .bot_tag()
            .unwrap_or_else(|| "Starting...".to_string()),
        uptime: state.started_at.elapsed().as_secs_f64(),
        guilds: state.gateway.guild_count(),
    })
}

pub fn router(state: Arc<State>) -> Router {
    Router::new()
        .route("/", get(health_check))
        .with_state(state)
}

pub async fn serve(state: Arc<State>, port: u16) -> anyhow::Result<()> {
    let addr = format!("0.0.0.0:{}", port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Health server listening on http://{}", addr);
    axum::serve(listener, router(state)).await?;
    Ok(())
}
