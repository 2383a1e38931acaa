// Match rules the server plugs into the simulation: fire rate, damage, kills, respawns.

use super::types::ServerEvent;
use crate::domain::tuning::RulesTuning;
use crate::domain::{BulletData, CollisionObserver, FireObserver, GameSimulation, PlayerId};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};

pub struct ArenaRules {
    tuning: RulesTuning,
    // Simulation time of the last accepted fire per player.
    last_fire: HashMap<PlayerId, Duration>,
    // (due, player) pairs on the simulation clock.
    pending_respawns: Vec<(Duration, PlayerId)>,
    outbox: Vec<ServerEvent>,
}

impl ArenaRules {
    pub fn new(tuning: RulesTuning) -> Self {
        Self {
            tuning,
            last_fire: HashMap::new(),
            pending_respawns: Vec::new(),
            outbox: Vec::new(),
        }
    }

    pub fn tuning(&self) -> &RulesTuning {
        &self.tuning
    }

    /// Events produced by the callbacks since the last drain, in order.
    pub fn take_events(&mut self) -> Vec<ServerEvent> {
        std::mem::take(&mut self.outbox)
    }

    /// Removes and returns respawns whose delay has elapsed.
    pub fn take_due_respawns(&mut self, now: Duration) -> Vec<PlayerId> {
        let mut due = Vec::new();
        self.pending_respawns.retain(|(at, player_id)| {
            if *at <= now {
                due.push(*player_id);
                false
            } else {
                true
            }
        });
        due
    }

    pub fn is_respawn_pending(&self, player_id: PlayerId) -> bool {
        self.pending_respawns.iter().any(|(_, id)| *id == player_id)
    }

    pub fn forget_player(&mut self, player_id: PlayerId) {
        self.last_fire.remove(&player_id);
    }
}

impl FireObserver for ArenaRules {
    fn on_bullet_fire(&mut self, sim: &mut GameSimulation, shooter: PlayerId) {
        let now = sim.now();
        let too_soon = self
            .last_fire
            .get(&shooter)
            .is_some_and(|last| now.saturating_sub(*last) < self.tuning.fire_interval);
        if too_soon {
            // Dropped, not queued.
            return;
        }

        self.last_fire.insert(shooter, now);
        sim.register_player_fire(shooter);
        self.outbox.push(ServerEvent::BulletFired { player_id: shooter });
    }
}

impl CollisionObserver for ArenaRules {
    fn on_bullet_collide(&mut self, sim: &mut GameSimulation, victim: PlayerId, bullet: BulletData) {
        let Some(player) = sim.player(victim) else {
            return;
        };
        // Later hits in the same tick land on a corpse.
        if !player.is_alive {
            return;
        }

        let health = (player.health - self.tuning.damage_per_hit).max(0.0);
        sim.update_player_health(victim, health);

        if health > 0.0 {
            debug!(victim_id = victim, shooter_id = bullet.fired_by, health, "player hit");
            self.outbox.push(ServerEvent::HealthUpdated {
                player_id: victim,
                health,
            });
            return;
        }

        sim.register_player_death(victim, bullet.fired_by);
        info!(victim_id = victim, killer_id = bullet.fired_by, "player died");
        self.outbox.push(ServerEvent::PlayerDied {
            player_id: victim,
            killed_by: bullet.fired_by,
        });
        if !self.is_respawn_pending(victim) {
            self.pending_respawns
                .push((sim.now() + self.tuning.respawn_delay, victim));
        }
    }
}
