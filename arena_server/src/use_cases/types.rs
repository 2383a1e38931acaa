// Use-case level inputs/outputs for the game loop.

use crate::domain::{PlayerId, PlayerMove, PlayerSnapshot, Position};
use tokio::sync::oneshot;

/// Requests from connection tasks, drained by the world task once per tick.
#[derive(Debug)]
pub enum GameCommand {
    Join {
        player_name: String,
        reply: oneshot::Sender<JoinOutcome>,
    },
    Leave {
        player_id: PlayerId,
    },
    Move {
        player_id: PlayerId,
        player_move: PlayerMove,
        // Where the client believed its ship was when it sent the move.
        reported: Position,
    },
    Leaderboard {
        reply: oneshot::Sender<Vec<LeaderboardEntry>>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum JoinOutcome {
    Accepted {
        player_id: PlayerId,
        // Every player in the room, the new one included.
        players: Vec<PlayerSnapshot>,
        // Sequence number of the last event published before the snapshot was taken.
        last_seq: u64,
    },
    RoomFull,
}

/// Authoritative events fanned out to connected clients.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    PositionCorrected {
        player_id: PlayerId,
        position: Position,
    },
    PlayerMoved {
        player_id: PlayerId,
        player_move: PlayerMove,
    },
    PlayerConnected {
        player_id: PlayerId,
        player_name: String,
        position: Position,
    },
    PlayerDisconnected {
        player_id: PlayerId,
    },
    HealthUpdated {
        player_id: PlayerId,
        health: f64,
    },
    PlayerDied {
        player_id: PlayerId,
        killed_by: PlayerId,
    },
    BulletFired {
        player_id: PlayerId,
    },
    PlayerRespawned {
        player_id: PlayerId,
        position: Position,
    },
}

/// A published event plus its routing.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomEvent {
    /// Monotonic per room, starting at 1.
    pub seq: u64,
    /// Connection that must not receive the event.
    pub except: Option<PlayerId>,
    pub event: ServerEvent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub player_id: PlayerId,
    pub player_name: String,
    pub score: u32,
    pub is_connected: bool,
    pub is_alive: bool,
}
