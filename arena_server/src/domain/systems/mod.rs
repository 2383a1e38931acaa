// Per-tick systems run by `GameSimulation::update`, in this order.

pub mod expiry;
pub mod projectiles;
pub mod ship_movement;
