use crate::interface_adapters::http::ErrorResponse;
use crate::interface_adapters::state::AppState;
use crate::use_cases::{GameCommand, LeaderboardEntry};

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::warn;

#[derive(Debug, serde::Serialize)]
pub struct LeaderboardEntryDto {
    pub player_id: u64,
    pub player_name: String,
    pub score: u32,
    pub is_connected: bool,
    pub is_alive: bool,
}

impl From<LeaderboardEntry> for LeaderboardEntryDto {
    fn from(entry: LeaderboardEntry) -> Self {
        Self {
            player_id: entry.player_id,
            player_name: entry.player_name,
            score: entry.score,
            is_connected: entry.is_connected,
            is_alive: entry.is_alive,
        }
    }
}

#[derive(Debug, serde::Serialize)]
struct LeaderboardResponse {
    // Best score first; ties broken by join order.
    players: Vec<LeaderboardEntryDto>,
}

fn world_unavailable() -> axum::response::Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(ErrorResponse {
            error: "game world unavailable".to_string(),
        }),
    )
        .into_response()
}

pub async fn leaderboard_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    // The world task owns the scores; ask it for a consistent copy.
    let (reply, reply_rx) = oneshot::channel();
    if state
        .command_tx
        .send(GameCommand::Leaderboard { reply })
        .await
        .is_err()
    {
        warn!("leaderboard requested while world task is down");
        return world_unavailable();
    }

    match reply_rx.await {
        Ok(entries) => (
            StatusCode::OK,
            Json(LeaderboardResponse {
                players: entries.into_iter().map(LeaderboardEntryDto::from).collect(),
            }),
        )
            .into_response(),
        Err(_) => world_unavailable(),
    }
}
