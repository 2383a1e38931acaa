// Client session: dials the arena server and keeps a local mirror of the world.
//
// The mirror runs the same `GameSimulation` as the server but never decides
// anything. Damage, deaths, respawns and bullet spawns only happen when the
// matching server event arrives; between events the mirror extrapolates by
// ticking the simulation locally.

use crate::domain::tuning::SimulationTuning;
use crate::domain::{
    BulletData, CollisionObserver, FireObserver, GameSimulation, PlayerId, PlayerMove, Position,
};
use crate::frameworks::config::HANDSHAKE_TIMEOUT;
use crate::interface_adapters::protocol::{
    self, ConnectionHandshake, ConnectionHandshakeResponse, Envelope, ProtocolError,
    RegisterPlayerMove, ServerMessage,
};

use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("connection to the arena server failed: {0}")]
    Transport(#[from] tungstenite::Error),

    #[error("the arena server did not answer in time")]
    Timeout,

    #[error("the room is full, try again later")]
    RoomFull,

    #[error("the arena server sent something unexpected: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("the connection to the arena server was closed")]
    Closed,
}

/// Observer for the mirror: the server already decided every consequence.
struct MirrorObserver;

impl CollisionObserver for MirrorObserver {
    fn on_bullet_collide(&mut self, _sim: &mut GameSimulation, _victim: PlayerId, _bullet: BulletData) {}
}

impl FireObserver for MirrorObserver {
    fn on_bullet_fire(&mut self, _sim: &mut GameSimulation, _shooter: PlayerId) {}
}

/// Local replica of the room, driven by server messages.
pub struct MirrorWorld {
    player_id: PlayerId,
    sim: GameSimulation,
}

impl MirrorWorld {
    pub fn from_handshake(
        player_id: PlayerId,
        response: &ConnectionHandshakeResponse,
        tuning: SimulationTuning,
    ) -> Self {
        let mut sim = GameSimulation::new(tuning);
        for player in &response.player_data {
            sim.create_player(
                player.player_id,
                player.position.into(),
                player.player_name.clone(),
                player.is_connected,
            );
        }
        Self { player_id, sim }
    }

    pub fn player_id(&self) -> PlayerId {
        self.player_id
    }

    pub fn simulation(&self) -> &GameSimulation {
        &self.sim
    }

    pub fn local_position(&self) -> Option<Position> {
        self.sim.player_position(self.player_id)
    }

    pub fn tick(&mut self) {
        self.sim.update(&mut MirrorObserver);
    }

    /// Applies one server message. Messages about players the mirror never heard of are dropped.
    pub fn apply(&mut self, message: &ServerMessage) {
        match message {
            ServerMessage::PlayerConnected(event) => {
                if self.knows(event.player_id) {
                    return;
                }
                self.sim.create_player(
                    event.player_id,
                    event.position.into(),
                    event.player_name.clone(),
                    true,
                );
            }
            ServerMessage::UpdatePosition(event) => {
                if self.knows(event.player_id) {
                    self.sim
                        .set_player_position(event.player_id, event.position.into());
                }
            }
            ServerMessage::PlayerMove(event) => {
                if self.knows(event.player_id) {
                    self.sim
                        .register_player_move(event.player_id, event.player_move.into());
                }
            }
            ServerMessage::PlayerDisconnected(event) => {
                if self.knows(event.player_id) {
                    self.sim.register_player_disconnection(event.player_id);
                }
            }
            ServerMessage::UpdateHealth(event) => {
                if self.knows(event.player_id) {
                    self.sim.update_player_health(event.player_id, event.health);
                }
            }
            ServerMessage::PlayerDied(event) => {
                if self.knows(event.player_id) && self.knows(event.killed_by) {
                    self.sim.update_player_health(event.player_id, 0.0);
                    self.sim
                        .register_player_death(event.player_id, event.killed_by);
                }
            }
            ServerMessage::PlayerFireBullet(event) => {
                if self.knows(event.player_id) {
                    self.sim.register_player_fire(event.player_id);
                }
            }
            ServerMessage::PlayerRespawned(event) => {
                if self.knows(event.player_id) {
                    self.sim
                        .respawn_player(event.player_id, event.position.into());
                }
            }
        }
    }

    fn knows(&self, player_id: PlayerId) -> bool {
        let known = self.sim.find_player(player_id).is_some();
        if !known {
            debug!(player_id, "message for unknown player ignored");
        }
        known
    }
}

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// A connected player.
pub struct ArenaClient {
    socket: Socket,
    world: MirrorWorld,
}

impl ArenaClient {
    /// Dials `url` (e.g. `ws://127.0.0.1:3001/play/ws`) and performs the handshake.
    pub async fn connect(url: &str, player_name: &str) -> Result<Self, ClientError> {
        let (mut socket, _) = timeout(HANDSHAKE_TIMEOUT, connect_async(url))
            .await
            .map_err(|_| ClientError::Timeout)??;

        let handshake = protocol::encode(&ConnectionHandshake {
            player_name: player_name.to_string(),
        })?;
        socket.send(Message::binary(handshake)).await?;

        let envelope = timeout(HANDSHAKE_TIMEOUT, next_envelope(&mut socket))
            .await
            .map_err(|_| ClientError::Timeout)??;
        let response: ConnectionHandshakeResponse = envelope.open()?;
        let player_id = match response.player_id {
            Some(player_id) if !response.is_room_full => player_id,
            _ => {
                let _ = socket.close(None).await;
                return Err(ClientError::RoomFull);
            }
        };

        info!(
            player_id,
            players = response.player_data.len(),
            "joined arena"
        );
        Ok(Self {
            socket,
            world: MirrorWorld::from_handshake(player_id, &response, SimulationTuning::default()),
        })
    }

    pub fn world(&self) -> &MirrorWorld {
        &self.world
    }

    pub fn player_id(&self) -> PlayerId {
        self.world.player_id()
    }

    /// Sends an intent along with where this client believes its ship is.
    pub async fn send_move(&mut self, player_move: PlayerMove) -> Result<(), ClientError> {
        let position = self.world.local_position().unwrap_or_default();
        let bytes = protocol::encode(&RegisterPlayerMove {
            player_move: player_move.into(),
            position: position.into(),
        })?;
        self.socket.send(Message::binary(bytes)).await?;
        Ok(())
    }

    /// Waits for the next server message, applies it to the mirror and returns it.
    pub async fn recv(&mut self) -> Result<ServerMessage, ClientError> {
        let envelope = next_envelope(&mut self.socket).await?;
        let message = ServerMessage::from_envelope(&envelope)?;
        self.world.apply(&message);
        Ok(message)
    }

    /// Advances the local mirror by one tick.
    pub fn tick(&mut self) {
        self.world.tick();
    }

    pub async fn close(mut self) -> Result<(), ClientError> {
        self.socket.close(None).await?;
        Ok(())
    }
}

async fn next_envelope(socket: &mut Socket) -> Result<Envelope, ClientError> {
    loop {
        let Some(message) = socket.next().await else {
            return Err(ClientError::Closed);
        };
        match message? {
            Message::Binary(bytes) => return Ok(Envelope::from_bytes(&bytes)?),
            Message::Close(frame) => {
                debug!(?frame, "server closed the connection");
                return Err(ClientError::Closed);
            }
            Message::Text(_) => {
                warn!("ignoring text frame from server");
            }
            Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interface_adapters::protocol::{
        EventPlayerConnected, EventPlayerDied, EventPlayerFireBullet, EventPlayerMove,
        EventPlayerRespawned, EventUpdateHealth, PlayerData, PositionDto, UpdatePosition,
    };

    fn at(x: f64, y: f64) -> PositionDto {
        PositionDto { x, y, angle: 0.0 }
    }

    fn mirror() -> MirrorWorld {
        let response = ConnectionHandshakeResponse {
            player_id: Some(1),
            player_data: vec![
                PlayerData {
                    player_id: 0,
                    player_name: "Ace".into(),
                    is_connected: true,
                    position: at(1000.0, 1000.0),
                },
                PlayerData {
                    player_id: 1,
                    player_name: "Bee".into(),
                    is_connected: true,
                    position: at(1015.0, 950.0),
                },
            ],
            is_room_full: false,
        };
        MirrorWorld::from_handshake(1, &response, SimulationTuning::default())
    }

    #[test]
    fn handshake_snapshot_seeds_the_mirror() {
        let world = mirror();
        assert_eq!(world.player_id(), 1);
        assert_eq!(world.simulation().players().len(), 2);
        assert_eq!(world.local_position(), Some(Position::new(1015.0, 950.0, 0.0)));
    }

    #[test]
    fn echoed_moves_drive_the_local_ship() {
        let mut world = mirror();
        world.apply(&ServerMessage::PlayerMove(EventPlayerMove {
            player_move: PlayerMove::StartForward.into(),
            player_id: 1,
        }));
        world.tick();

        let position = world.local_position().expect("local ship");
        assert!((position.y - 945.0).abs() < 1e-9);
    }

    #[test]
    fn corrections_overwrite_the_local_position() {
        let mut world = mirror();
        world.apply(&ServerMessage::UpdatePosition(UpdatePosition {
            player_id: 1,
            position: at(2000.0, 2000.0),
        }));
        assert_eq!(world.local_position(), Some(Position::new(2000.0, 2000.0, 0.0)));
    }

    #[test]
    fn messages_for_unknown_players_are_ignored() {
        let mut world = mirror();
        world.apply(&ServerMessage::UpdateHealth(EventUpdateHealth {
            player_id: 42,
            health: 10.0,
        }));
        world.apply(&ServerMessage::PlayerFireBullet(EventPlayerFireBullet { player_id: 42 }));
        assert_eq!(world.simulation().players().len(), 2);
    }

    #[test]
    fn mirror_bullets_explode_without_applying_damage() {
        let mut world = mirror();
        world.apply(&ServerMessage::PlayerFireBullet(EventPlayerFireBullet { player_id: 0 }));
        world.tick();

        assert_eq!(world.simulation().player(1).map(|p| p.health), Some(100.0));
        world.apply(&ServerMessage::UpdateHealth(EventUpdateHealth {
            player_id: 1,
            health: 95.0,
        }));
        assert_eq!(world.simulation().player(1).map(|p| p.health), Some(95.0));
    }

    #[test]
    fn death_and_respawn_follow_the_server() {
        let mut world = mirror();
        world.apply(&ServerMessage::PlayerDied(EventPlayerDied {
            player_id: 1,
            killed_by: 0,
        }));
        let victim = world.simulation().player(1).expect("victim");
        assert!(!victim.is_alive);
        assert_eq!(world.simulation().player(0).map(|p| p.score), Some(10));

        world.apply(&ServerMessage::PlayerRespawned(EventPlayerRespawned {
            player_id: 1,
            position: at(500.0, 600.0),
        }));
        let victim = world.simulation().player(1).expect("victim");
        assert!(victim.is_alive);
        assert_eq!(victim.health, 100.0);
    }

    #[test]
    fn late_joiners_appear_once() {
        let mut world = mirror();
        let connected = ServerMessage::PlayerConnected(EventPlayerConnected {
            player_id: 2,
            player_name: "Cid".into(),
            position: at(3000.0, 3000.0),
        });
        world.apply(&connected);
        world.apply(&connected);
        assert_eq!(world.simulation().players().len(), 3);
    }

    #[test]
    fn client_errors_read_like_messages() {
        assert_eq!(ClientError::RoomFull.to_string(), "the room is full, try again later");
    }
}
