//! Reconnection backoff for audio nodes.
//!
//! One monitor governs every node and guild. It only ever has a single timer
//! in flight: either the backoff timer that leads to a reconnect attempt, or
//! the follow-up recheck after an attempt.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;

use crate::audio::NodeRegistry;
use crate::events::{AudioEvent, AudioEventSender};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReconnectPolicy {
    pub initial_interval: Duration,
    pub max_interval: Duration,
    pub multiplier: f64,
    pub max_attempts: u32,
    pub recheck_delay: Duration,
    pub health_check_period: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_secs(5),
            max_interval: Duration::from_secs(60),
            multiplier: 1.5,
            max_attempts: 10,
            recheck_delay: Duration::from_secs(10),
            health_check_period: Duration::from_secs(30),
        }
    }
}

pub fn next_interval(current: Duration, policy: &ReconnectPolicy) -> Duration {
    current.mul_f64(policy.multiplier).min(policy.max_interval)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorPhase {
    Idle,
    BackingOff,
    Reconnecting,
}

impl std::fmt::Display for MonitorPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            MonitorPhase::Idle => "idle",
            MonitorPhase::BackingOff => "backing off",
            MonitorPhase::Reconnecting => "reconnecting",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorSnapshot {
    pub phase: MonitorPhase,
    pub attempts: u32,
    pub interval: Duration,
}

struct ReconnectState {
    phase: MonitorPhase,
    attempts: u32,
    interval: Duration,
    // Bumped whenever the pending timer is replaced or cancelled. A timer that
    // wakes with a stale epoch does nothing.
    epoch: u64,
    pending: Option<JoinHandle<()>>,
}

pub struct HealthMonitor {
    policy: ReconnectPolicy,
    state: Mutex<ReconnectState>,
    events: AudioEventSender,
    periodic_started: AtomicBool,
}

impl HealthMonitor {
    pub fn new(policy: ReconnectPolicy, events: AudioEventSender) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(ReconnectState {
                phase: MonitorPhase::Idle,
                attempts: 0,
                interval: policy.initial_interval,
                epoch: 0,
                pending: None,
            }),
            policy,
            events,
            periodic_started: AtomicBool::new(false),
        })
    }

    pub fn policy(&self) -> &ReconnectPolicy {
        &self.policy
    }

    pub fn snapshot(&self) -> MonitorSnapshot {
        let state = self.state.lock();
        MonitorSnapshot {
            phase: state.phase,
            attempts: state.attempts,
            interval: state.interval,
        }
    }

    /// Starts backing off if no node is connected. Does nothing while a
    /// reconnection cycle is already running.
    pub fn trigger<R>(self: &Arc<Self>, nodes: Arc<R>)
    where
        R: NodeRegistry + ?Sized + 'static,
    {
        let mut state = self.state.lock();
        if state.phase != MonitorPhase::Idle {
            tracing::debug!(phase = %state.phase, "Reconnection already in progress");
            return;
        }
        if nodes.any_connected() {
            return;
        }
        self.schedule_backoff(&mut state, nodes);
    }

    /// Called when a node is known to be connected again.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        if let Some(pending) = state.pending.take() {
            pending.abort();
        }
        if state.phase != MonitorPhase::Idle || state.attempts != 0 {
            tracing::info!(
                attempts = state.attempts,
                "Audio node available again, reconnection state reset"
            );
        }
        state.epoch += 1;
        state.phase = MonitorPhase::Idle;
        state.attempts = 0;
        state.interval = self.policy.initial_interval;
    }

    /// Spawns the fixed-cadence health check. Only the first call starts a
    /// task; later calls return `None`.
    pub fn spawn_periodic_check<R>(self: &Arc<Self>, nodes: Arc<R>) -> Option<JoinHandle<()>>
    where
        R: NodeRegistry + ?Sized + 'static,
    {
        if self.periodic_started.swap(true, Ordering::SeqCst) {
            return None;
        }

        let monitor = self.clone();
        let period = self.policy.health_check_period;
        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            let mut previously_up: HashSet<usize> = nodes
                .nodes()
                .iter()
                .filter(|node| node.connected)
                .map(|node| node.id)
                .collect();

            loop {
                ticker.tick().await;
                let current = nodes.nodes();

                for node in current.iter().filter(|n| !n.connected) {
                    if previously_up.contains(&node.id) {
                        let _ = monitor.events.send(AudioEvent::NodeDisconnect {
                            node: node.name.clone(),
                        });
                    }
                }
                previously_up = current
                    .iter()
                    .filter(|node| node.connected)
                    .map(|node| node.id)
                    .collect();

                if previously_up.is_empty() {
                    tracing::warn!("Health check: no audio nodes connected");
                    monitor.trigger(nodes.clone());
                } else {
                    tracing::debug!(
                        connected = previously_up.len(),
                        total = current.len(),
                        "Health check passed"
                    );
                }
            }
        }))
    }

    fn schedule_backoff<R>(self: &Arc<Self>, state: &mut ReconnectState, nodes: Arc<R>)
    where
        R: NodeRegistry + ?Sized + 'static,
    {
        if let Some(pending) = state.pending.take() {
            pending.abort();
        }
        state.phase = MonitorPhase::BackingOff;
        state.epoch += 1;

        let epoch = state.epoch;
        let delay = state.interval;
        tracing::info!(
            attempt = state.attempts + 1,
            "No audio nodes connected, reconnecting in {}",
            humantime::format_duration(delay)
        );

        let monitor = self.clone();
        state.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            monitor.attempt_reconnect(nodes, epoch).await;
        }));
    }

    async fn attempt_reconnect<R>(self: Arc<Self>, nodes: Arc<R>, epoch: u64)
    where
        R: NodeRegistry + ?Sized + 'static,
    {
        let attempt = {
            let mut state = self.state.lock();
            if state.epoch != epoch {
                return;
            }
            state.pending = None;
            state.phase = MonitorPhase::Reconnecting;
            state.attempts += 1;
            state.attempts
        };

        let down: Vec<_> = nodes.nodes().into_iter().filter(|n| !n.connected).collect();
        tracing::info!(attempt, nodes = down.len(), "Attempting to reconnect audio nodes");

        for node in down {
            match nodes.reconnect(node.id).await {
                Ok(()) => {
                    tracing::info!(node = %node.name, "Reconnect call succeeded");
                    let _ = self
                        .events
                        .send(AudioEvent::NodeReconnect { node: node.name });
                }
                Err(e) => {
                    tracing::warn!(node = %node.name, error = ?e, "Reconnect call failed");
                    let _ = self.events.send(AudioEvent::NodeError {
                        node: node.name,
                        error: e.to_string(),
                    });
                }
            }
        }

        let mut state = self.state.lock();
        if state.epoch != epoch {
            // Reset while the reconnect calls were in flight.
            return;
        }

        state.interval = next_interval(state.interval, &self.policy);
        if state.attempts >= self.policy.max_attempts {
            tracing::warn!(
                attempts = state.attempts,
                "Reached maximum reconnection attempts, continuing every {}",
                humantime::format_duration(self.policy.max_interval)
            );
            state.attempts = 0;
            state.interval = self.policy.max_interval;
        }

        state.epoch += 1;
        let recheck_epoch = state.epoch;
        let delay = self.policy.recheck_delay;
        let monitor = self.clone();
        state.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            monitor.recheck(nodes, recheck_epoch);
        }));
    }

    fn recheck<R>(self: &Arc<Self>, nodes: Arc<R>, epoch: u64)
    where
        R: NodeRegistry + ?Sized + 'static,
    {
        let mut state = self.state.lock();
        if state.epoch != epoch {
            return;
        }
        state.pending = None;

        if nodes.any_connected() {
            drop(state);
            self.reset();
        } else {
            self.schedule_backoff(&mut state, nodes);
        }
    }
}
