// Authoritative game simulation.
//
// `GameSimulation` owns the entity store and is the only thing that creates
// or destroys entities. The server and every client mirror run the same
// engine; they differ only in the observer they pass to `GameSimulation::update`.

use super::components::{
    BulletData, Expirable, ExplosionData, IntentFlags, PlayerData, PlayerId, PlayerMove,
};
use super::position::Position;
use super::store::{ComponentSet, Entity, EntityStore};
use super::systems::{expiry, projectiles, ship_movement};
use super::tuning::SimulationTuning;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::time::Duration;

/// Notified when a bullet hits an alive, connected ship.
pub trait CollisionObserver {
    fn on_bullet_collide(&mut self, sim: &mut GameSimulation, victim: PlayerId, bullet: BulletData);
}

/// Notified once per tick for every alive, connected ship holding the fire intent.
///
/// The engine never spawns bullets on its own; the observer decides whether to
/// call [`GameSimulation::register_player_fire`].
pub trait FireObserver {
    fn on_bullet_fire(&mut self, sim: &mut GameSimulation, shooter: PlayerId);
}

pub trait SimulationObserver: CollisionObserver + FireObserver {}

impl<T: CollisionObserver + FireObserver> SimulationObserver for T {}

/// Public per-player read model.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSnapshot {
    pub id: PlayerId,
    pub name: String,
    pub health: f64,
    pub score: u32,
    pub is_alive: bool,
    pub is_connected: bool,
    pub position: Position,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EntityKind {
    Player {
        id: PlayerId,
        health: f64,
        score: u32,
        is_alive: bool,
        is_connected: bool,
    },
    Bullet {
        fired_by: PlayerId,
    },
    Explosion {
        count: u8,
    },
}

/// What a renderer needs to draw one entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntityView {
    pub entity: Entity,
    pub kind: EntityKind,
    pub position: Position,
}

pub struct GameSimulation {
    store: EntityStore,
    tuning: SimulationTuning,
    now: Duration,
    rng: StdRng,
    players: HashMap<PlayerId, Entity>,
}

impl GameSimulation {
    pub fn new(tuning: SimulationTuning) -> Self {
        Self::with_rng(tuning, StdRng::from_entropy())
    }

    /// Deterministic simulation for replays and tests.
    pub fn with_seed(tuning: SimulationTuning, seed: u64) -> Self {
        Self::with_rng(tuning, StdRng::seed_from_u64(seed))
    }

    fn with_rng(tuning: SimulationTuning, rng: StdRng) -> Self {
        Self {
            store: EntityStore::new(),
            tuning,
            now: Duration::ZERO,
            rng,
            players: HashMap::new(),
        }
    }

    pub fn tuning(&self) -> &SimulationTuning {
        &self.tuning
    }

    /// Simulation clock: tick count times the tick interval.
    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    pub(crate) fn store_mut(&mut self) -> &mut EntityStore {
        &mut self.store
    }

    pub fn entity_count(&self) -> usize {
        self.store.len()
    }

    /// Advances the world by one tick.
    pub fn update(&mut self, observer: &mut dyn SimulationObserver) {
        self.now += self.tuning.tick_interval;

        // Expired entities must not take part in this tick's collision pass.
        expiry::sweep_expired(&mut self.store, self.now);
        projectiles::tick_projectiles(self, observer);
        ship_movement::tick_ships(self, observer);
    }

    pub fn create_player(
        &mut self,
        id: PlayerId,
        spawn: Position,
        name: impl Into<String>,
        is_connected: bool,
    ) -> Entity {
        assert!(!self.players.contains_key(&id), "player {id} already exists");

        let entity = self.store.spawn();
        self.store.insert(entity, spawn);
        self.store.insert(
            entity,
            PlayerData {
                id,
                name: name.into(),
                health: self.tuning.player.max_health,
                score: 0,
                is_alive: true,
                is_connected,
                intents: IntentFlags::default(),
            },
        );
        self.players.insert(id, entity);
        entity
    }

    pub fn find_player(&self, id: PlayerId) -> Option<Entity> {
        self.players.get(&id).copied()
    }

    pub fn player(&self, id: PlayerId) -> Option<&PlayerData> {
        self.find_player(id)
            .and_then(|entity| self.store.get::<PlayerData>(entity))
    }

    pub fn player_position(&self, id: PlayerId) -> Option<Position> {
        self.find_player(id)
            .and_then(|entity| self.store.get::<Position>(entity))
            .copied()
    }

    pub fn register_player_move(&mut self, id: PlayerId, player_move: PlayerMove) {
        self.player_data_mut(id).intents.apply(player_move);
    }

    /// Spawns the bullet pair from the ship's nose.
    pub fn register_player_fire(&mut self, id: PlayerId) {
        let ship = self.position_of(id);
        let now = self.now;
        projectiles::spawn_bullet_pair(&mut self.store, ship, id, now, &self.tuning.projectile);
    }

    pub fn update_player_health(&mut self, id: PlayerId, value: f64) {
        let max_health = self.tuning.player.max_health;
        self.player_data_mut(id).health = value.clamp(0.0, max_health);
    }

    pub fn register_player_disconnection(&mut self, id: PlayerId) {
        let player = self.player_data_mut(id);
        player.is_connected = false;
        player.intents.clear();
    }

    /// Kill bookkeeping: the killer scores, the victim's score is halved (rounding down).
    pub fn register_player_death(&mut self, victim: PlayerId, killer: PlayerId) {
        let kill_score = self.tuning.player.kill_score;
        let shooter = self.player_data_mut(killer);
        shooter.score = shooter.score.saturating_add(kill_score);

        let player = self.player_data_mut(victim);
        player.score /= 2;
        player.intents.clear();
        player.is_alive = false;
    }

    pub fn respawn_player(&mut self, id: PlayerId, position: Position) {
        let max_health = self.tuning.player.max_health;
        let player = self.player_data_mut(id);
        player.health = max_health;
        player.is_alive = true;
        *self.position_mut(id) = position;
    }

    /// Overrides a ship's position, used when the server corrects drift.
    pub fn set_player_position(&mut self, id: PlayerId, position: Position) {
        *self.position_mut(id) = position;
    }

    /// Every player in join order, connected or not.
    pub fn players(&self) -> Vec<PlayerSnapshot> {
        let mut players: Vec<PlayerSnapshot> = self
            .store
            .query(ComponentSet::PLAYER.with(ComponentSet::POSITION))
            .into_iter()
            .filter_map(|entity| {
                let data = self.store.get::<PlayerData>(entity)?;
                let position = self.store.get::<Position>(entity)?;
                Some(PlayerSnapshot {
                    id: data.id,
                    name: data.name.clone(),
                    health: data.health,
                    score: data.score,
                    is_alive: data.is_alive,
                    is_connected: data.is_connected,
                    position: *position,
                })
            })
            .collect();
        players.sort_by_key(|player| player.id);
        players
    }

    /// Render view of every positioned entity.
    pub fn entities(&self) -> Vec<EntityView> {
        self.store
            .query(ComponentSet::POSITION)
            .into_iter()
            .filter_map(|entity| {
                let position = *self.store.get::<Position>(entity)?;
                let kind = if let Some(player) = self.store.get::<PlayerData>(entity) {
                    EntityKind::Player {
                        id: player.id,
                        health: player.health,
                        score: player.score,
                        is_alive: player.is_alive,
                        is_connected: player.is_connected,
                    }
                } else if let Some(bullet) = self.store.get::<BulletData>(entity) {
                    EntityKind::Bullet {
                        fired_by: bullet.fired_by,
                    }
                } else if let Some(explosion) = self.store.get::<ExplosionData>(entity) {
                    EntityKind::Explosion {
                        count: explosion.count,
                    }
                } else {
                    return None;
                };
                Some(EntityView {
                    entity,
                    kind,
                    position,
                })
            })
            .collect()
    }

    pub(crate) fn spawn_explosion(&mut self, position: Position) -> Entity {
        let tuning = self.tuning.projectile;
        let count = self.rng.gen_range(0..tuning.explosion_max_count.max(1));

        let entity = self.store.spawn();
        self.store.insert(entity, position);
        self.store.insert(entity, ExplosionData { count });
        self.store
            .insert(entity, Expirable::after(self.now, tuning.explosion_life_time));
        entity
    }

    fn expect_player(&self, id: PlayerId) -> Entity {
        match self.players.get(&id) {
            Some(entity) => *entity,
            None => panic!("unknown player id {id}"),
        }
    }

    fn player_data_mut(&mut self, id: PlayerId) -> &mut PlayerData {
        let entity = self.expect_player(id);
        match self.store.get_mut::<PlayerData>(entity) {
            Some(player) => player,
            None => panic!("player {id} lost its player component"),
        }
    }

    fn position_of(&self, id: PlayerId) -> Position {
        let entity = self.expect_player(id);
        match self.store.get::<Position>(entity) {
            Some(position) => *position,
            None => panic!("player {id} lost its position component"),
        }
    }

    fn position_mut(&mut self, id: PlayerId) -> &mut Position {
        let entity = self.expect_player(id);
        match self.store.get_mut::<Position>(entity) {
            Some(position) => position,
            None => panic!("player {id} lost its position component"),
        }
    }
}
