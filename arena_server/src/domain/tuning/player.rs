/// Gameplay tuning for player-controlled ships.

#[derive(Debug, Clone, Copy)]
pub struct PlayerTuning {
    /// Forward distance per tick while the forward intent is held.
    pub movement_speed: f64,

    /// Heading change per tick in radians while a rotate intent is held.
    pub rotation_speed: f64,

    /// Ship radius; the world bounds are shrunk by this margin on every side.
    pub radius: f64,

    /// Health a ship spawns and respawns with.
    pub max_health: f64,

    /// Score awarded to the shooter for a kill.
    pub kill_score: u32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            movement_speed: 5.0,
            rotation_speed: 5.0_f64.to_radians(),
            radius: 40.0,
            max_health: 100.0,
            kill_score: 10,
        }
    }
}
