// One arena room: the authoritative simulation plus the rules that drive it.
//
// `ArenaRoom` is owned by the world task and is never shared. Connection
// tasks talk to it only through `GameCommand`s, and everything it decides
// leaves as sequenced `RoomEvent`s on a broadcast channel.

use super::rules::ArenaRules;
use super::types::{GameCommand, JoinOutcome, LeaderboardEntry, RoomEvent, ServerEvent};
use crate::domain::tuning::{RulesTuning, SimulationTuning};
use crate::domain::{GameSimulation, PlayerId, PlayerMove, Position};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

pub struct ArenaRoom {
    sim: GameSimulation,
    rules: ArenaRules,
    events_tx: broadcast::Sender<RoomEvent>,
    // Sequence number of the last published event.
    last_seq: u64,
    next_player_id: PlayerId,
    rng: StdRng,
}

impl ArenaRoom {
    pub fn new(
        tuning: SimulationTuning,
        rules: RulesTuning,
        events_tx: broadcast::Sender<RoomEvent>,
    ) -> Self {
        Self::from_parts(
            GameSimulation::new(tuning),
            rules,
            events_tx,
            StdRng::from_entropy(),
        )
    }

    /// Room with deterministic spawns and explosions.
    pub fn with_seed(
        tuning: SimulationTuning,
        rules: RulesTuning,
        events_tx: broadcast::Sender<RoomEvent>,
        seed: u64,
    ) -> Self {
        Self::from_parts(
            GameSimulation::with_seed(tuning, seed),
            rules,
            events_tx,
            StdRng::seed_from_u64(seed.wrapping_add(1)),
        )
    }

    fn from_parts(
        sim: GameSimulation,
        rules: RulesTuning,
        events_tx: broadcast::Sender<RoomEvent>,
        rng: StdRng,
    ) -> Self {
        Self {
            sim,
            rules: ArenaRules::new(rules),
            events_tx,
            last_seq: 0,
            next_player_id: 0,
            rng,
        }
    }

    pub fn simulation(&self) -> &GameSimulation {
        &self.sim
    }

    pub fn connected_players(&self) -> usize {
        self.sim
            .players()
            .iter()
            .filter(|player| player.is_connected)
            .count()
    }

    pub fn handle(&mut self, command: GameCommand) {
        match command {
            GameCommand::Join { player_name, reply } => {
                let outcome = self.join(player_name);
                if let JoinOutcome::Accepted { player_id, .. } = &outcome {
                    let player_id = *player_id;
                    if reply.send(outcome).is_err() {
                        // The connection gave up waiting; don't leave a ghost holding a slot.
                        warn!(player_id, "join reply dropped, disconnecting player");
                        self.leave(player_id);
                    }
                } else {
                    let _ = reply.send(outcome);
                }
            }
            GameCommand::Leave { player_id } => self.leave(player_id),
            GameCommand::Move {
                player_id,
                player_move,
                reported,
            } => self.apply_move(player_id, player_move, reported),
            GameCommand::Leaderboard { reply } => {
                let _ = reply.send(self.leaderboard());
            }
        }
    }

    pub fn join(&mut self, player_name: String) -> JoinOutcome {
        let capacity = self.rules.tuning().room_capacity;
        if self.connected_players() >= capacity {
            info!(capacity, "room full, rejecting join");
            return JoinOutcome::RoomFull;
        }

        let player_id = self.next_player_id;
        self.next_player_id += 1;

        let spawn = self.random_spawn();
        self.sim
            .create_player(player_id, spawn, player_name.clone(), true);
        info!(player_id, player_name = %player_name, "player joined");

        self.publish(
            Some(player_id),
            ServerEvent::PlayerConnected {
                player_id,
                player_name,
                position: spawn,
            },
        );

        JoinOutcome::Accepted {
            player_id,
            players: self.sim.players(),
            last_seq: self.last_seq,
        }
    }

    pub fn leave(&mut self, player_id: PlayerId) {
        match self.sim.player(player_id) {
            Some(player) if player.is_connected => {}
            _ => return,
        }

        self.sim.register_player_disconnection(player_id);
        self.rules.forget_player(player_id);
        info!(player_id, "player left");
        self.publish(None, ServerEvent::PlayerDisconnected { player_id });
    }

    /// Reconciles the reported position, then applies the intent.
    pub fn apply_move(&mut self, player_id: PlayerId, player_move: PlayerMove, reported: Position) {
        let Some(authoritative) = self.sim.player_position(player_id) else {
            warn!(player_id, "move from unknown player");
            return;
        };

        let tolerance = self.rules.tuning().position_tolerance;
        if !reported.is_within_tolerance(&authoritative, tolerance) {
            debug!(
                player_id,
                reported_x = reported.x,
                reported_y = reported.y,
                "client drifted, sending correction"
            );
            self.publish(
                None,
                ServerEvent::PositionCorrected {
                    player_id,
                    position: authoritative,
                },
            );
        }

        self.sim.register_player_move(player_id, player_move);
        self.publish(
            None,
            ServerEvent::PlayerMoved {
                player_id,
                player_move,
            },
        );
    }

    /// One simulation step followed by any respawns that came due.
    pub fn tick(&mut self) {
        self.sim.update(&mut self.rules);
        for event in self.rules.take_events() {
            self.publish(None, event);
        }

        for player_id in self.rules.take_due_respawns(self.sim.now()) {
            let position = self.random_spawn();
            self.sim.respawn_player(player_id, position);
            info!(player_id, "player respawned");
            self.publish(
                None,
                ServerEvent::PlayerRespawned {
                    player_id,
                    position,
                },
            );
        }
    }

    /// Every player ever joined, best score first.
    pub fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        let mut entries: Vec<LeaderboardEntry> = self
            .sim
            .players()
            .into_iter()
            .map(|player| LeaderboardEntry {
                player_id: player.id,
                player_name: player.name,
                score: player.score,
                is_connected: player.is_connected,
                is_alive: player.is_alive,
            })
            .collect();
        entries.sort_by(|a, b| b.score.cmp(&a.score).then(a.player_id.cmp(&b.player_id)));
        entries
    }

    fn publish(&mut self, except: Option<PlayerId>, event: ServerEvent) {
        self.last_seq += 1;
        // No receivers just means nobody is connected yet.
        let _ = self.events_tx.send(RoomEvent {
            seq: self.last_seq,
            except,
            event,
        });
    }

    /// Uniform point in the centered spawn area, facing up.
    fn random_spawn(&mut self) -> Position {
        let arena = self.sim.tuning().arena;
        let margin_x = arena.width * (1.0 - arena.spawn_fraction) / 2.0;
        let margin_y = arena.height * (1.0 - arena.spawn_fraction) / 2.0;
        Position::new(
            self.rng.gen_range(margin_x..=arena.width - margin_x),
            self.rng.gen_range(margin_y..=arena.height - margin_y),
            0.0,
        )
    }

    #[cfg(test)]
    pub(crate) fn simulation_mut(&mut self) -> &mut GameSimulation {
        &mut self.sim
    }
}
