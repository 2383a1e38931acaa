// Domain layer: core simulation types and rules.

pub mod components;
pub mod position;
pub mod simulation;
pub mod store;
pub mod systems;
pub mod tuning;

pub use components::{BulletData, ExplosionData, Expirable, IntentFlags, PlayerData, PlayerId, PlayerMove};
pub use position::Position;
pub use simulation::{
    CollisionObserver, EntityKind, EntityView, FireObserver, GameSimulation, PlayerSnapshot,
    SimulationObserver,
};
pub use store::{ComponentSet, Entity, EntityStore};
