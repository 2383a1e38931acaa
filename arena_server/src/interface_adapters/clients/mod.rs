// Outbound clients: the player-side arena session.

pub mod arena;

pub use arena::{ArenaClient, ClientError, MirrorWorld};
