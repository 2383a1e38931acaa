// Gameplay tuning for projectiles and the explosions they leave behind.

use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct ProjectileTuning {
    /// Distance travelled per tick.
    pub speed: f64,

    /// Lifetime before an unspent bullet is swept.
    pub life_time: Duration,

    /// Bullet-vs-ship hit radius.
    pub hit_radius: f64,

    /// Distance ahead of the ship center where bullets spawn.
    pub nose_offset: f64,

    /// Perpendicular offset of each bullet of the pair.
    pub side_offset: f64,

    /// Lifetime of the explosion left by a hit.
    pub explosion_life_time: Duration,

    /// Explosion copy counts are drawn from `0..explosion_max_count`.
    pub explosion_max_count: u8,
}

impl Default for ProjectileTuning {
    fn default() -> Self {
        Self {
            speed: 10.0,
            life_time: Duration::from_secs(1),
            hit_radius: 20.0,
            nose_offset: 40.0,
            side_offset: 15.0,
            explosion_life_time: Duration::from_secs(2),
            explosion_max_count: 3,
        }
    }
}
