// Component value types attached to entities in the store.

use std::time::Duration;

pub type PlayerId = u64;

/// Discrete start/stop intents sent by clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerMove {
    StartForward,
    StopForward,
    StartRotateClockwise,
    StopRotateClockwise,
    StartRotateCounterClockwise,
    StopRotateCounterClockwise,
    StartFire,
    StopFire,
}

/// "Currently holding" flags toggled by [`PlayerMove`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IntentFlags {
    pub moving_forward: bool,
    pub rotating_clockwise: bool,
    pub rotating_counter_clockwise: bool,
    pub firing: bool,
}

impl IntentFlags {
    pub fn apply(&mut self, player_move: PlayerMove) {
        match player_move {
            PlayerMove::StartForward => self.moving_forward = true,
            PlayerMove::StopForward => self.moving_forward = false,
            PlayerMove::StartRotateClockwise => self.rotating_clockwise = true,
            PlayerMove::StopRotateClockwise => self.rotating_clockwise = false,
            PlayerMove::StartRotateCounterClockwise => self.rotating_counter_clockwise = true,
            PlayerMove::StopRotateCounterClockwise => self.rotating_counter_clockwise = false,
            PlayerMove::StartFire => self.firing = true,
            PlayerMove::StopFire => self.firing = false,
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerData {
    pub id: PlayerId,
    pub name: String,
    pub health: f64,
    pub score: u32,
    pub is_alive: bool,
    pub is_connected: bool,
    pub intents: IntentFlags,
}

impl PlayerData {
    /// Intents only drive the ship (and the ship only takes hits) while both flags hold.
    pub fn is_active(&self) -> bool {
        self.is_alive && self.is_connected
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulletData {
    pub fired_by: PlayerId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExplosionData {
    /// How many copies a renderer scatters around the position.
    pub count: u8,
}

/// Deadline on the simulation clock after which the entity is swept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expirable {
    pub expires_at: Duration,
}

impl Expirable {
    pub fn after(now: Duration, lifetime: Duration) -> Self {
        Self {
            expires_at: now + lifetime,
        }
    }

    pub fn is_expired(&self, now: Duration) -> bool {
        self.expires_at <= now
    }
}
