// Use cases layer: application workflows for the game server.

pub mod game;
pub mod room;
pub mod rules;
pub mod types;

pub use game::{spawn_room, RoomHandle, RoomSettings};
pub use room::ArenaRoom;
pub use types::{GameCommand, JoinOutcome, LeaderboardEntry, RoomEvent, ServerEvent};
