// Framework bootstrap for the arena server runtime.

use crate::domain::tuning::{RulesTuning, SimulationTuning};
use crate::frameworks::config;
use crate::interface_adapters::net::{leaderboard_handler, spawn_event_serializer, ws_handler};
use crate::interface_adapters::state::AppState;
use crate::use_cases::{RoomSettings, spawn_room};

use axum::{Router, routing::get};
use std::net::SocketAddr;
use std::{io::Result, sync::Arc};
use tokio::sync::broadcast;

fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/play/ws", get(ws_handler))
        .route("/leaderboard", get(leaderboard_handler))
        .with_state(state)
}

pub async fn run(listener: tokio::net::TcpListener) -> Result<()> {
    let address = listener.local_addr()?;
    // build state
    let state = build_state();
    let app = router(state);

    tracing::info!(%address, "listening");

    // Serve app and report errors rather than panicking
    axum::serve(listener, app).await.inspect_err(|e| {
        tracing::error!(error = %e, "server error");
    })
}

pub async fn run_with_config() -> Result<()> {
    init_runtime();

    let address = SocketAddr::from((config::http_host(), config::http_port()));

    // Bind TCP listener with error handling
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .inspect_err(|e| {
            tracing::error!(%address, error = %e, "failed to bind");
        })?;

    run(listener).await
}

fn build_state() -> Arc<AppState> {
    let tick_interval = config::tick_interval();

    // One room per process; the world task owns it for the server's lifetime.
    let room = spawn_room(&RoomSettings {
        command_channel_capacity: config::COMMAND_CHANNEL_CAPACITY,
        event_broadcast_capacity: config::EVENT_BROADCAST_CAPACITY,
        simulation: SimulationTuning::with_tick_interval(tick_interval),
        rules: RulesTuning::default(),
    });
    tracing::debug!(
        tick_interval_ms = tick_interval.as_millis() as u64,
        "room world started"
    );

    let (frames_tx, _) = broadcast::channel(config::FRAME_BROADCAST_CAPACITY);
    let state = AppState {
        command_tx: room.command_tx.clone(),
        frames_tx,
    };
    spawn_event_serializer(&state, room.events_tx.subscribe());

    Arc::new(state)
}
