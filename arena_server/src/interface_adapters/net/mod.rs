// Network adapter modules split by game sockets vs plain HTTP routes.

pub mod client;
pub mod leaderboard;

pub use client::{EncodedEvent, spawn_event_serializer, ws_handler};
pub use leaderboard::leaderboard_handler;
