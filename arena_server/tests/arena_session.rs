mod support;

use arena_server::ArenaClient;
use arena_server::domain::PlayerMove;
use arena_server::interface_adapters::protocol::{
    self, ConnectionHandshake, ConnectionHandshakeResponse, Envelope, PositionDto,
    RegisterPlayerMove, ServerMessage,
};
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

const WAIT: Duration = Duration::from_secs(2);

#[tokio::test]
async fn drifted_move_is_corrected_before_it_is_echoed() {
    let (mut socket, _) = connect_async(support::ws_url()).await.expect("dial");
    let handshake = protocol::encode(&ConnectionHandshake {
        player_name: "  Drifter  ".into(),
    })
    .expect("encode handshake");
    socket.send(Message::binary(handshake)).await.expect("send handshake");

    let response: ConnectionHandshakeResponse = match socket.next().await {
        Some(Ok(Message::Binary(bytes))) => protocol::decode(&bytes).expect("handshake response"),
        other => panic!("expected handshake response, got {other:?}"),
    };
    assert!(!response.is_room_full);
    let my_id = response.player_id.expect("accepted players get an id");
    let me = response
        .player_data
        .iter()
        .find(|player| player.player_id == my_id)
        .expect("snapshot includes the joiner");
    assert_eq!(me.player_name, "Drifter");

    let drifted = PositionDto {
        x: me.position.x + 10.0,
        ..me.position
    };
    let register = protocol::encode(&RegisterPlayerMove {
        player_move: PlayerMove::StartRotateClockwise.into(),
        position: drifted,
    })
    .expect("encode move");
    socket.send(Message::binary(register)).await.expect("send move");

    // Other tests share the room; only look at messages about this player.
    let mut mine = Vec::new();
    while mine.len() < 2 {
        let frame = timeout(WAIT, socket.next())
            .await
            .expect("server answers in time")
            .expect("socket open")
            .expect("frame");
        let Message::Binary(bytes) = frame else {
            continue;
        };
        let envelope = Envelope::from_bytes(&bytes).expect("envelope");
        match ServerMessage::from_envelope(&envelope).expect("server message") {
            ServerMessage::UpdatePosition(update) if update.player_id == my_id => {
                assert_eq!(update.position, me.position);
                mine.push("correction");
            }
            ServerMessage::PlayerMove(echo) if echo.player_id == my_id => {
                mine.push("move");
            }
            _ => {}
        }
    }
    assert_eq!(mine, vec!["correction", "move"]);

    let _ = socket.close(None).await;
}

#[tokio::test]
async fn clients_learn_about_each_other() {
    let url = support::ws_url();
    let mut first = ArenaClient::connect(&url, "First").await.expect("first joins");
    let second = ArenaClient::connect(&url, "Second").await.expect("second joins");

    // The second client sees the first in its handshake snapshot.
    assert!(second.world().simulation().player(first.player_id()).is_some());

    // The first hears about the second through a broadcast.
    let second_id = second.player_id();
    timeout(WAIT, async {
        loop {
            if let ServerMessage::PlayerConnected(event) = first.recv().await.expect("event") {
                if event.player_id == second_id {
                    break;
                }
            }
        }
    })
    .await
    .expect("connect event arrives");
    let mirrored = first
        .world()
        .simulation()
        .player(second_id)
        .expect("mirror created the new player");
    assert_eq!(mirrored.name, "Second");

    // And about the disconnect.
    second.close().await.expect("close");
    timeout(WAIT, async {
        loop {
            if let ServerMessage::PlayerDisconnected(event) = first.recv().await.expect("event") {
                if event.player_id == second_id {
                    break;
                }
            }
        }
    })
    .await
    .expect("disconnect event arrives");
    let mirrored = first.world().simulation().player(second_id).expect("kept");
    assert!(!mirrored.is_connected);

    first.close().await.expect("close");
}

#[tokio::test]
async fn leaderboard_lists_players_by_score() {
    let url = support::ws_url();
    let client = ArenaClient::connect(&url, "Scorer").await.expect("join");

    let response = reqwest::Client::new()
        .get(format!("{}/leaderboard", support::http_url()))
        .send()
        .await
        .expect("request should succeed");
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    let body: serde_json::Value = response.json().await.expect("json body");
    let players = body["players"].as_array().expect("players array");
    assert!(
        players
            .iter()
            .any(|player| player["player_name"] == "Scorer" && player["score"] == 0)
    );

    client.close().await.expect("close");
}
