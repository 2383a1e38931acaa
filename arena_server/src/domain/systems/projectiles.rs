use crate::domain::components::{BulletData, Expirable, PlayerData, PlayerId};
use crate::domain::position::Position;
use crate::domain::simulation::{GameSimulation, SimulationObserver};
use crate::domain::store::{ComponentSet, EntityStore};
use crate::domain::tuning::ProjectileTuning;
use std::f64::consts::{FRAC_PI_2, PI};
use std::time::Duration;

/// Spawns two bullets side by side in front of the ship.
///
/// Bullets store the heading opposite to the ship and advance with a negative
/// step, so they fly along the ship's facing direction.
pub fn spawn_bullet_pair(
    store: &mut EntityStore,
    ship: Position,
    fired_by: PlayerId,
    now: Duration,
    tuning: &ProjectileTuning,
) {
    let nose = ship.advanced(tuning.nose_offset);

    for side in [tuning.side_offset, -tuning.side_offset] {
        let mut position = nose;
        position.angle = ship.angle + FRAC_PI_2;
        position.forward(side);
        position.angle = ship.angle + PI;

        let entity = store.spawn();
        store.insert(entity, position);
        store.insert(entity, BulletData { fired_by });
        store.insert(entity, Expirable::after(now, tuning.life_time));
    }
}

/// Moves every bullet one step and resolves hits against alive, connected ships.
///
/// A bullet is consumed by the first ship it touches (in entity order), whether or
/// not the observer applies damage.
pub fn tick_projectiles(sim: &mut GameSimulation, observer: &mut dyn SimulationObserver) {
    let tuning = sim.tuning().projectile;
    let bullets = sim
        .store()
        .query(ComponentSet::BULLET.with(ComponentSet::POSITION));

    for bullet in bullets {
        let store = sim.store();
        let (Some(data), Some(position)) = (
            store.get::<BulletData>(bullet).copied(),
            store.get::<Position>(bullet).copied(),
        ) else {
            continue;
        };

        let next = position.advanced(-tuning.speed);
        let victim = find_victim(store, &next, tuning.hit_radius);

        match victim {
            Some(victim) => {
                observer.on_bullet_collide(sim, victim, data);
                sim.spawn_explosion(next);
                sim.store_mut().despawn(bullet);
            }
            None => {
                if let Some(position) = sim.store_mut().get_mut::<Position>(bullet) {
                    *position = next;
                }
            }
        }
    }
}

fn find_victim(store: &EntityStore, bullet: &Position, hit_radius: f64) -> Option<PlayerId> {
    store
        .query(ComponentSet::PLAYER.with(ComponentSet::POSITION))
        .into_iter()
        .find_map(|entity| {
            let player = store.get::<PlayerData>(entity)?;
            let ship = store.get::<Position>(entity)?;
            (player.is_active() && ship.intersects_with(bullet, hit_radius)).then_some(player.id)
        })
}
