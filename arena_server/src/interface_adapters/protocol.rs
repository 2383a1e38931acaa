// Wire protocol shared by the server and the client session.
//
// Every message travels inside an `Envelope` whose `kind` is the short type
// name of the payload. One envelope per WebSocket binary frame; the frame
// provides the length prefix. Both layers are bincode (standard config).

use crate::domain::{PlayerId, PlayerMove, PlayerSnapshot, Position};
use crate::use_cases::ServerEvent;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("encode error: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("decode error: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    #[error("unexpected message kind: expected {expected}, got {found}")]
    UnexpectedKind { expected: &'static str, found: String },
}

/// Typed payload that can be carried in an [`Envelope`].
pub trait ProtocolMessage: Serialize + DeserializeOwned {
    fn kind() -> &'static str {
        let full = std::any::type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub kind: String,
    pub payload: Vec<u8>,
}

impl Envelope {
    pub fn wrap<M: ProtocolMessage>(message: &M) -> Result<Self, ProtocolError> {
        Ok(Self {
            kind: M::kind().to_string(),
            payload: bincode::serde::encode_to_vec(message, bincode::config::standard())?,
        })
    }

    pub fn is<M: ProtocolMessage>(&self) -> bool {
        self.kind == M::kind()
    }

    /// Decodes the payload, failing if the envelope carries a different kind.
    pub fn open<M: ProtocolMessage>(&self) -> Result<M, ProtocolError> {
        if !self.is::<M>() {
            return Err(ProtocolError::UnexpectedKind {
                expected: M::kind(),
                found: self.kind.clone(),
            });
        }
        let (message, _) =
            bincode::serde::decode_from_slice(&self.payload, bincode::config::standard())?;
        Ok(message)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, ProtocolError> {
        Ok(bincode::serde::encode_to_vec(self, bincode::config::standard())?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ProtocolError> {
        let (envelope, _) = bincode::serde::decode_from_slice(bytes, bincode::config::standard())?;
        Ok(envelope)
    }
}

/// Wraps and serializes in one step.
pub fn encode<M: ProtocolMessage>(message: &M) -> Result<Vec<u8>, ProtocolError> {
    Envelope::wrap(message)?.to_bytes()
}

/// Decodes a frame expected to carry exactly `M`.
pub fn decode<M: ProtocolMessage>(bytes: &[u8]) -> Result<M, ProtocolError> {
    Envelope::from_bytes(bytes)?.open()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionDto {
    pub x: f64,
    pub y: f64,
    pub angle: f64,
}

impl From<Position> for PositionDto {
    fn from(position: Position) -> Self {
        Self {
            x: position.x,
            y: position.y,
            angle: position.angle,
        }
    }
}

impl From<PositionDto> for Position {
    fn from(dto: PositionDto) -> Self {
        Position::new(dto.x, dto.y, dto.angle)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerMoveDto {
    StartForward,
    StopForward,
    StartRotateClockwise,
    StopRotateClockwise,
    StartRotateCounterClockwise,
    StopRotateCounterClockwise,
    StartFire,
    StopFire,
}

impl From<PlayerMove> for PlayerMoveDto {
    fn from(player_move: PlayerMove) -> Self {
        match player_move {
            PlayerMove::StartForward => Self::StartForward,
            PlayerMove::StopForward => Self::StopForward,
            PlayerMove::StartRotateClockwise => Self::StartRotateClockwise,
            PlayerMove::StopRotateClockwise => Self::StopRotateClockwise,
            PlayerMove::StartRotateCounterClockwise => Self::StartRotateCounterClockwise,
            PlayerMove::StopRotateCounterClockwise => Self::StopRotateCounterClockwise,
            PlayerMove::StartFire => Self::StartFire,
            PlayerMove::StopFire => Self::StopFire,
        }
    }
}

impl From<PlayerMoveDto> for PlayerMove {
    fn from(dto: PlayerMoveDto) -> Self {
        match dto {
            PlayerMoveDto::StartForward => Self::StartForward,
            PlayerMoveDto::StopForward => Self::StopForward,
            PlayerMoveDto::StartRotateClockwise => Self::StartRotateClockwise,
            PlayerMoveDto::StopRotateClockwise => Self::StopRotateClockwise,
            PlayerMoveDto::StartRotateCounterClockwise => Self::StartRotateCounterClockwise,
            PlayerMoveDto::StopRotateCounterClockwise => Self::StopRotateCounterClockwise,
            PlayerMoveDto::StartFire => Self::StartFire,
            PlayerMoveDto::StopFire => Self::StopFire,
        }
    }
}

/// Public per-player data carried in the handshake response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerData {
    pub player_id: PlayerId,
    pub player_name: String,
    pub is_connected: bool,
    pub position: PositionDto,
}

impl From<&PlayerSnapshot> for PlayerData {
    fn from(player: &PlayerSnapshot) -> Self {
        Self {
            player_id: player.id,
            player_name: player.name.clone(),
            is_connected: player.is_connected,
            position: player.position.into(),
        }
    }
}

// Client -> server.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionHandshake {
    pub player_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterPlayerMove {
    pub player_move: PlayerMoveDto,
    /// Where the client believes its ship is.
    pub position: PositionDto,
}

// Server -> client.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionHandshakeResponse {
    /// Absent when the room turned the player away.
    pub player_id: Option<PlayerId>,
    pub player_data: Vec<PlayerData>,
    pub is_room_full: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdatePosition {
    pub player_id: PlayerId,
    pub position: PositionDto,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventPlayerMove {
    pub player_move: PlayerMoveDto,
    pub player_id: PlayerId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventPlayerConnected {
    pub player_id: PlayerId,
    pub player_name: String,
    pub position: PositionDto,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventPlayerDisconnected {
    pub player_id: PlayerId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventUpdateHealth {
    pub player_id: PlayerId,
    pub health: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventPlayerDied {
    pub player_id: PlayerId,
    pub killed_by: PlayerId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventPlayerFireBullet {
    pub player_id: PlayerId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventPlayerRespawned {
    pub player_id: PlayerId,
    pub position: PositionDto,
}

impl ProtocolMessage for ConnectionHandshake {}
impl ProtocolMessage for RegisterPlayerMove {}
impl ProtocolMessage for ConnectionHandshakeResponse {}
impl ProtocolMessage for UpdatePosition {}
impl ProtocolMessage for EventPlayerMove {}
impl ProtocolMessage for EventPlayerConnected {}
impl ProtocolMessage for EventPlayerDisconnected {}
impl ProtocolMessage for EventUpdateHealth {}
impl ProtocolMessage for EventPlayerDied {}
impl ProtocolMessage for EventPlayerFireBullet {}
impl ProtocolMessage for EventPlayerRespawned {}

/// Every message a client can receive after the handshake.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    UpdatePosition(UpdatePosition),
    PlayerMove(EventPlayerMove),
    PlayerConnected(EventPlayerConnected),
    PlayerDisconnected(EventPlayerDisconnected),
    UpdateHealth(EventUpdateHealth),
    PlayerDied(EventPlayerDied),
    PlayerFireBullet(EventPlayerFireBullet),
    PlayerRespawned(EventPlayerRespawned),
}

impl ServerMessage {
    pub fn from_envelope(envelope: &Envelope) -> Result<Self, ProtocolError> {
        let kind = envelope.kind.as_str();
        let message = if kind == UpdatePosition::kind() {
            Self::UpdatePosition(envelope.open()?)
        } else if kind == EventPlayerMove::kind() {
            Self::PlayerMove(envelope.open()?)
        } else if kind == EventPlayerConnected::kind() {
            Self::PlayerConnected(envelope.open()?)
        } else if kind == EventPlayerDisconnected::kind() {
            Self::PlayerDisconnected(envelope.open()?)
        } else if kind == EventUpdateHealth::kind() {
            Self::UpdateHealth(envelope.open()?)
        } else if kind == EventPlayerDied::kind() {
            Self::PlayerDied(envelope.open()?)
        } else if kind == EventPlayerFireBullet::kind() {
            Self::PlayerFireBullet(envelope.open()?)
        } else if kind == EventPlayerRespawned::kind() {
            Self::PlayerRespawned(envelope.open()?)
        } else {
            return Err(ProtocolError::UnexpectedKind {
                expected: "server event",
                found: envelope.kind.clone(),
            });
        };
        Ok(message)
    }
}

/// Encodes a room event into the frame every recipient receives.
pub fn encode_event(event: &ServerEvent) -> Result<Vec<u8>, ProtocolError> {
    match event {
        ServerEvent::PositionCorrected {
            player_id,
            position,
        } => encode(&UpdatePosition {
            player_id: *player_id,
            position: (*position).into(),
        }),
        ServerEvent::PlayerMoved {
            player_id,
            player_move,
        } => encode(&EventPlayerMove {
            player_move: (*player_move).into(),
            player_id: *player_id,
        }),
        ServerEvent::PlayerConnected {
            player_id,
            player_name,
            position,
        } => encode(&EventPlayerConnected {
            player_id: *player_id,
            player_name: player_name.clone(),
            position: (*position).into(),
        }),
        ServerEvent::PlayerDisconnected { player_id } => encode(&EventPlayerDisconnected {
            player_id: *player_id,
        }),
        ServerEvent::HealthUpdated { player_id, health } => encode(&EventUpdateHealth {
            player_id: *player_id,
            health: *health,
        }),
        ServerEvent::PlayerDied {
            player_id,
            killed_by,
        } => encode(&EventPlayerDied {
            player_id: *player_id,
            killed_by: *killed_by,
        }),
        ServerEvent::BulletFired { player_id } => encode(&EventPlayerFireBullet {
            player_id: *player_id,
        }),
        ServerEvent::PlayerRespawned {
            player_id,
            position,
        } => encode(&EventPlayerRespawned {
            player_id: *player_id,
            position: (*position).into(),
        }),
    }
}
