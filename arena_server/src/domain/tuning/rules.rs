// Server-side match rules applied through the simulation observers.

use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct RulesTuning {
    /// Health removed by one bullet.
    pub damage_per_hit: f64,

    /// Delay between death and respawn.
    pub respawn_delay: Duration,

    /// Minimum spacing between accepted fire events of one player.
    pub fire_interval: Duration,

    /// Allowed drift between a client-reported and the authoritative position.
    pub position_tolerance: f64,

    /// Maximum number of connected players.
    pub room_capacity: usize,
}

impl Default for RulesTuning {
    fn default() -> Self {
        Self {
            damage_per_hit: 5.0,
            respawn_delay: Duration::from_secs(5),
            fire_interval: Duration::from_millis(300),
            position_tolerance: 3.0,
            room_capacity: 5,
        }
    }
}
