// Gameplay tuning, kept apart from runtime/server configuration.

pub mod arena;
pub mod player;
pub mod projectile;
pub mod rules;

pub use arena::ArenaTuning;
pub use player::PlayerTuning;
pub use projectile::ProjectileTuning;
pub use rules::RulesTuning;

use std::time::Duration;

/// Everything the simulation engine needs to advance one tick.
#[derive(Debug, Clone, Copy)]
pub struct SimulationTuning {
    /// Fixed step added to the simulation clock on every update.
    pub tick_interval: Duration,
    pub arena: ArenaTuning,
    pub player: PlayerTuning,
    pub projectile: ProjectileTuning,
}

impl SimulationTuning {
    pub fn with_tick_interval(tick_interval: Duration) -> Self {
        Self {
            tick_interval,
            ..Self::default()
        }
    }
}

impl Default for SimulationTuning {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(16),
            arena: ArenaTuning::default(),
            player: PlayerTuning::default(),
            projectile: ProjectileTuning::default(),
        }
    }
}
