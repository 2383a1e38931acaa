use crate::domain::PlayerId;
use crate::frameworks::config::HANDSHAKE_TIMEOUT;
use crate::interface_adapters::protocol::{
    self, ConnectionHandshake, ConnectionHandshakeResponse, PlayerData, ProtocolError,
    RegisterPlayerMove,
};
use crate::interface_adapters::state::AppState;
use crate::interface_adapters::utils::rng::next_conn_id;
use crate::use_cases::{GameCommand, JoinOutcome, RoomEvent};

use axum::{
    Error,
    body::Bytes,
    extract::{
        State,
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade, close_code},
    },
    response::IntoResponse,
};
use futures::SinkExt;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::timeout;
use tracing::{Instrument, Span, debug, error, info, info_span, warn};

#[derive(Debug)]
enum NetError {
    // Categorizes connection lifecycle failures so callers can decide policy.
    #[allow(dead_code)]
    Ws(axum::Error),
    #[allow(dead_code)]
    Protocol(ProtocolError),
    CommandsClosed,
    FramesClosed,
    HandshakeRequired,
    HandshakeTimeout,
    ClosedBeforeHandshake,
    RoomFull,
}

impl From<axum::Error> for NetError {
    fn from(e: axum::Error) -> Self {
        NetError::Ws(e)
    }
}

impl From<ProtocolError> for NetError {
    fn from(e: ProtocolError) -> Self {
        NetError::Protocol(e)
    }
}

/// A room event encoded once and shared by every connection.
#[derive(Debug, Clone)]
pub struct EncodedEvent {
    pub seq: u64,
    pub except: Option<PlayerId>,
    pub bytes: Bytes,
}

pub async fn event_serializer(
    mut events_rx: broadcast::Receiver<RoomEvent>,
    frames_tx: broadcast::Sender<EncodedEvent>,
) {
    // Serialize each room event once and broadcast the shared bytes.
    loop {
        match events_rx.recv().await {
            Ok(event) => {
                let bytes = match protocol::encode_event(&event.event) {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        error!(error = %e, seq = event.seq, "failed to encode room event");
                        continue;
                    }
                };

                let _ = frames_tx.send(EncodedEvent {
                    seq: event.seq,
                    except: event.except,
                    bytes: Bytes::from(bytes),
                });
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(missed = n, "event serializer lagged; events dropped");
            }
            Err(broadcast::error::RecvError::Closed) => {
                warn!("room events channel closed; serializer exiting");
                break;
            }
        }
    }
}

pub fn spawn_event_serializer(state: &AppState, events_rx: broadcast::Receiver<RoomEvent>) {
    tokio::spawn(event_serializer(events_rx, state.frames_tx.clone()));
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    // Separate connection id for correlating logs before/after a player_id exists.
    let conn_id = next_conn_id();
    let span = info_span!("conn", conn_id, player_id = tracing::field::Empty);
    serve_connection(socket, state).instrument(span).await;
}

async fn serve_connection(mut socket: WebSocket, state: Arc<AppState>) {
    let mut ctx = match bootstrap_connection(&mut socket, &state).await {
        Ok(ctx) => ctx,
        Err(NetError::ClosedBeforeHandshake) => {
            info!("client disconnected before handshake");
            return;
        }
        Err(NetError::RoomFull) => {
            info!("room full; connection rejected");
            return;
        }
        Err(e) => {
            error!(error = ?e, "failed to bootstrap connection");
            let _ = send_close_with_reason(&mut socket, close_code::POLICY, "handshake failed").await;
            return;
        }
    };

    Span::current().record("player_id", ctx.player_id);
    info!(player_id = ctx.player_id, player_name = %ctx.player_name, "client connected");

    // Main Client Loop
    if let Err(e) = run_client_loop(&mut socket, &mut ctx).await {
        warn!(error = ?e, "client loop exited with error");
    }
}

struct ConnCtx {
    player_id: PlayerId,
    player_name: String,
    command_tx: mpsc::Sender<GameCommand>,
    frames_rx: broadcast::Receiver<EncodedEvent>,
    // Events up to this sequence number are already covered by the handshake snapshot.
    snapshot_seq: u64,

    msgs_in: u64,
    msgs_out: u64,
    bytes_in: u64,
    bytes_out: u64,

    invalid_messages: u32,

    last_frames_lag_log: Instant,
    last_invalid_input_log: Instant,

    close_frame: Option<CloseFrame>,
}

enum LoopControl {
    Continue,
    Disconnect,
}

const LOG_THROTTLE: Duration = Duration::from_secs(2);
const MAX_INVALID_MESSAGES: u32 = 10;
const MAX_PLAYER_NAME_LEN: usize = 32;
const DEFAULT_PLAYER_NAME: &str = "Pilot";

fn should_log(last: &mut Instant) -> bool {
    if last.elapsed() >= LOG_THROTTLE {
        *last = Instant::now();
        true
    } else {
        false
    }
}

fn sanitize_player_name(raw: &str) -> String {
    let name = raw.trim();
    if name.is_empty() || name.chars().count() > MAX_PLAYER_NAME_LEN {
        return DEFAULT_PLAYER_NAME.to_string();
    }
    name.to_string()
}

async fn send_close_with_reason(
    socket: &mut WebSocket,
    code: u16,
    reason: &'static str,
) -> Result<(), NetError> {
    socket
        .send(Message::Close(Some(CloseFrame {
            code,
            reason: reason.into(),
        })))
        .await
        .map_err(NetError::Ws)?;
    socket.close().await.map_err(NetError::Ws)
}

async fn send_bytes(socket: &mut WebSocket, bytes: Bytes) -> Result<usize, NetError> {
    let len = bytes.len();
    socket
        .send(Message::Binary(bytes))
        .await
        .map_err(NetError::Ws)?;
    Ok(len)
}

async fn bootstrap_connection(
    socket: &mut WebSocket,
    state: &AppState,
) -> Result<ConnCtx, NetError> {
    // Subscribe to frames *before* joining so no event after the snapshot is missed.
    let frames_rx = state.frames_tx.subscribe();

    let (handshake, bytes_in) = match timeout(HANDSHAKE_TIMEOUT, read_handshake(socket)).await {
        Ok(result) => result?,
        Err(_) => {
            let _ = send_close_with_reason(socket, close_code::POLICY, "handshake timeout").await;
            return Err(NetError::HandshakeTimeout);
        }
    };
    let player_name = sanitize_player_name(&handshake.player_name);

    let (reply, reply_rx) = oneshot::channel();
    state
        .command_tx
        .send(GameCommand::Join {
            player_name: player_name.clone(),
            reply,
        })
        .await
        .map_err(|_| NetError::CommandsClosed)?;
    let outcome = reply_rx.await.map_err(|_| NetError::CommandsClosed)?;

    let (player_id, players, snapshot_seq) = match outcome {
        JoinOutcome::Accepted {
            player_id,
            players,
            last_seq,
        } => (player_id, players, last_seq),
        JoinOutcome::RoomFull => {
            let response = ConnectionHandshakeResponse {
                player_id: None,
                player_data: Vec::new(),
                is_room_full: true,
            };
            if let Ok(bytes) = protocol::encode(&response) {
                let _ = send_bytes(socket, Bytes::from(bytes)).await;
            }
            let _ = send_close_with_reason(socket, close_code::AGAIN, "room full").await;
            return Err(NetError::RoomFull);
        }
    };

    let response = ConnectionHandshakeResponse {
        player_id: Some(player_id),
        player_data: players.iter().map(PlayerData::from).collect::<Vec<_>>(),
        is_room_full: false,
    };
    let sent = match protocol::encode(&response) {
        Ok(bytes) => send_bytes(socket, Bytes::from(bytes)).await,
        Err(e) => Err(NetError::Protocol(e)),
    };
    let bytes_out = match sent {
        Ok(len) => len as u64,
        Err(err) => {
            // The player exists in the room now; give the slot back.
            let _ = state.command_tx.send(GameCommand::Leave { player_id }).await;
            return Err(err);
        }
    };

    debug!(
        player_id,
        players = players.len(),
        snapshot_seq,
        "handshake complete"
    );

    let now = Instant::now() - LOG_THROTTLE;
    Ok(ConnCtx {
        player_id,
        player_name,
        command_tx: state.command_tx.clone(),
        frames_rx,
        snapshot_seq,

        msgs_in: 1,
        msgs_out: 1,
        bytes_in,
        bytes_out,

        invalid_messages: 0,

        last_frames_lag_log: now,
        last_invalid_input_log: now,

        close_frame: None,
    })
}

async fn read_handshake(socket: &mut WebSocket) -> Result<(ConnectionHandshake, u64), NetError> {
    loop {
        let Some(incoming) = socket.recv().await else {
            return Err(NetError::ClosedBeforeHandshake);
        };

        let message = incoming.map_err(NetError::Ws)?;
        match message {
            Message::Binary(bytes) => {
                let bytes_in = bytes.len() as u64;
                return match protocol::decode::<ConnectionHandshake>(&bytes) {
                    Ok(handshake) => Ok((handshake, bytes_in)),
                    Err(e) => {
                        let _ =
                            send_close_with_reason(socket, close_code::POLICY, "handshake required")
                                .await;
                        debug!(error = %e, "invalid handshake payload");
                        Err(NetError::HandshakeRequired)
                    }
                };
            }
            Message::Text(_) => {
                let _ = send_close_with_reason(
                    socket,
                    close_code::UNSUPPORTED,
                    "text messages not supported",
                )
                .await;
                return Err(NetError::HandshakeRequired);
            }
            Message::Ping(_) | Message::Pong(_) => {}
            Message::Close(_) => return Err(NetError::ClosedBeforeHandshake),
        }
    }
}

async fn run_client_loop(socket: &mut WebSocket, ctx: &mut ConnCtx) -> Result<(), NetError> {
    let mut fatal: Option<NetError> = None;

    loop {
        let disconnect: bool = tokio::select! {
            // Incoming Message from Client
            incoming = socket.recv() => {
                match handle_incoming_ws(incoming, ctx).await {
                    Ok(LoopControl::Continue) => false,
                    Ok(LoopControl::Disconnect) => true,
                    Err(e) => {
                        fatal = Some(e);
                        true
                    }
                }
            }

            // Outgoing Room Event
            frame = ctx.frames_rx.recv() => {
                match frame {
                    Ok(frame) => match forward_frame(frame, socket, ctx).await {
                        LoopControl::Continue => false,
                        LoopControl::Disconnect => true,
                    },
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        if should_log(&mut ctx.last_frames_lag_log) {
                            warn!(player_id = ctx.player_id, missed = n, "room events lagged; skipping ahead");
                        }
                        false
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        fatal = Some(NetError::FramesClosed);
                        true
                    }
                }
            }
        };

        if disconnect {
            if let Some(frame) = ctx.close_frame.take() {
                let _ = socket.send(Message::Close(Some(frame))).await;
            }
            if let Err(err) = socket.close().await.map_err(NetError::Ws) {
                debug!(error = ?err, "socket close error");
            }
            break;
        }
    }

    if let Err(e) = disconnect_cleanup(ctx).await {
        warn!(error = ?e, "error during disconnect cleanup");
        if fatal.is_none() {
            fatal = Some(e);
        }
    }

    if let Some(err) = fatal {
        Err(err)
    } else {
        Ok(())
    }
}

async fn handle_incoming_ws(
    incoming: Option<Result<Message, Error>>,
    ctx: &mut ConnCtx,
) -> Result<LoopControl, NetError> {
    let player_id = ctx.player_id;
    match incoming {
        Some(Ok(msg)) => match msg {
            Message::Binary(bytes) => {
                ctx.msgs_in += 1;
                ctx.bytes_in += bytes.len() as u64;

                match protocol::decode::<RegisterPlayerMove>(&bytes) {
                    Ok(register) => {
                        ctx.command_tx
                            .send(GameCommand::Move {
                                player_id,
                                player_move: register.player_move.into(),
                                reported: register.position.into(),
                            })
                            .await
                            .map_err(|_| NetError::CommandsClosed)?;
                        Ok(LoopControl::Continue)
                    }
                    Err(e) => {
                        ctx.invalid_messages += 1;
                        if should_log(&mut ctx.last_invalid_input_log) {
                            warn!(
                                player_id,
                                bytes = bytes.len(),
                                error = %e,
                                "failed to decode client message"
                            );
                        }

                        if ctx.invalid_messages > MAX_INVALID_MESSAGES {
                            ctx.close_frame = Some(CloseFrame {
                                code: close_code::POLICY,
                                reason: "too many invalid messages".into(),
                            });
                            return Ok(LoopControl::Disconnect);
                        }

                        Ok(LoopControl::Continue)
                    }
                }
            }
            Message::Text(_) => {
                ctx.close_frame = Some(CloseFrame {
                    code: close_code::UNSUPPORTED,
                    reason: "text messages not supported".into(),
                });
                Ok(LoopControl::Disconnect)
            }
            Message::Ping(_) | Message::Pong(_) => Ok(LoopControl::Continue),
            Message::Close(_) => Ok(LoopControl::Disconnect),
        },
        Some(Err(e)) => {
            warn!(player_id, error = %e, "websocket recv error");
            Ok(LoopControl::Disconnect)
        }
        None => {
            info!(player_id, "websocket closed");
            Ok(LoopControl::Disconnect)
        }
    }
}

async fn forward_frame(frame: EncodedEvent, socket: &mut WebSocket, ctx: &mut ConnCtx) -> LoopControl {
    // Already reflected in the handshake snapshot, or not meant for us.
    if frame.seq <= ctx.snapshot_seq || frame.except == Some(ctx.player_id) {
        return LoopControl::Continue;
    }

    match send_bytes(socket, frame.bytes).await {
        Ok(len) => {
            ctx.msgs_out += 1;
            ctx.bytes_out += len as u64;
            LoopControl::Continue
        }
        Err(err) => {
            // Log unexpected send failures; disconnect will follow immediately.
            warn!(error = ?err, "failed to send room event");
            LoopControl::Disconnect
        }
    }
}

async fn disconnect_cleanup(ctx: &ConnCtx) -> Result<(), NetError> {
    let player_id = ctx.player_id;
    ctx.command_tx
        .send(GameCommand::Leave { player_id })
        .await
        .map_err(|_| NetError::CommandsClosed)?;

    debug!(
        player_id,
        msgs_in = ctx.msgs_in,
        msgs_out = ctx.msgs_out,
        bytes_in = ctx.bytes_in,
        bytes_out = ctx.bytes_out,
        invalid_messages = ctx.invalid_messages,
        "connection stats"
    );
    info!(player_id, "client disconnected");
    Ok(())
}
