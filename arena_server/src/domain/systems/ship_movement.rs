use crate::domain::components::{IntentFlags, PlayerData};
use crate::domain::position::Position;
use crate::domain::simulation::{GameSimulation, SimulationObserver};
use crate::domain::store::ComponentSet;
use crate::domain::tuning::{ArenaTuning, PlayerTuning};

/// Applies held intents to one ship. Forward motion is applied before rotation.
pub fn candidate_position(current: Position, intents: IntentFlags, tuning: &PlayerTuning) -> Position {
    let mut next = current;
    if intents.moving_forward {
        next.forward(tuning.movement_speed);
    }
    if intents.rotating_clockwise {
        next.rotate(tuning.rotation_speed);
    }
    if intents.rotating_counter_clockwise {
        next.rotate(-tuning.rotation_speed);
    }
    next
}

/// True when the ship center stays `margin` away from every edge.
pub fn is_inside_bounds(position: &Position, arena: &ArenaTuning, margin: f64) -> bool {
    (margin..=arena.width - margin).contains(&position.x)
        && (margin..=arena.height - margin).contains(&position.y)
}

/// Fire and movement for every alive, connected ship.
///
/// Out-of-bounds candidates are dropped whole (rotation included), which turns
/// the margin line into a hard wall.
pub fn tick_ships(sim: &mut GameSimulation, observer: &mut dyn SimulationObserver) {
    let tuning = *sim.tuning();
    let ships = sim
        .store()
        .query(ComponentSet::PLAYER.with(ComponentSet::POSITION));

    for ship in ships {
        let Some(player) = sim.store().get::<PlayerData>(ship) else {
            continue;
        };
        if !player.is_active() {
            continue;
        }
        if player.intents.firing {
            let id = player.id;
            observer.on_bullet_fire(sim, id);
        }

        // Re-read: the fire observer may have changed the ship.
        let store = sim.store();
        let (Some(player), Some(current)) = (
            store.get::<PlayerData>(ship),
            store.get::<Position>(ship).copied(),
        ) else {
            continue;
        };
        if !player.is_active() {
            continue;
        }

        let candidate = candidate_position(current, player.intents, &tuning.player);
        if candidate == current || !is_inside_bounds(&candidate, &tuning.arena, tuning.player.radius) {
            continue;
        }
        if let Some(position) = sim.store_mut().get_mut::<Position>(ship) {
            *position = candidate;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_exclude_the_margin() {
        let arena = ArenaTuning::default();
        assert!(is_inside_bounds(&Position::new(40.0, 40.0, 0.0), &arena, 40.0));
        assert!(is_inside_bounds(&Position::new(4056.0, 2000.0, 0.0), &arena, 40.0));
        assert!(!is_inside_bounds(&Position::new(39.9, 2000.0, 0.0), &arena, 40.0));
        assert!(!is_inside_bounds(&Position::new(2000.0, 4056.1, 0.0), &arena, 40.0));
    }

    #[test]
    fn opposite_rotations_cancel() {
        let tuning = PlayerTuning::default();
        let intents = IntentFlags {
            rotating_clockwise: true,
            rotating_counter_clockwise: true,
            ..IntentFlags::default()
        };
        let start = Position::new(100.0, 100.0, 0.5);
        let next = candidate_position(start, intents, &tuning);
        assert!((next.angle - start.angle).abs() < 1e-12);
    }

    #[test]
    fn clockwise_rotation_increases_heading() {
        let tuning = PlayerTuning::default();
        let intents = IntentFlags {
            rotating_clockwise: true,
            ..IntentFlags::default()
        };
        let next = candidate_position(Position::default(), intents, &tuning);
        assert!((next.angle - 5.0_f64.to_radians()).abs() < 1e-12);
    }
}
