// Lives in its own binary: it needs the room to itself.
mod support;

use arena_server::interface_adapters::protocol::{
    self, ConnectionHandshake, ConnectionHandshakeResponse,
};
use arena_server::{ArenaClient, ClientError};
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;

#[tokio::test]
async fn sixth_player_is_told_the_room_is_full() {
    let url = support::ws_url();

    let mut clients = Vec::new();
    for i in 0..5 {
        let client = ArenaClient::connect(&url, &format!("Pilot{i}"))
            .await
            .expect("room has space");
        clients.push(client);
    }
    let ids: Vec<u64> = clients.iter().map(ArenaClient::player_id).collect();
    assert_eq!(ids, vec![0, 1, 2, 3, 4]);

    let rejected = ArenaClient::connect(&url, "Late").await;
    assert!(matches!(rejected, Err(ClientError::RoomFull)));

    // The rejection carries no player id and ends with a try-again close.
    let (mut socket, _) = connect_async(&url).await.expect("dial");
    let handshake = protocol::encode(&ConnectionHandshake {
        player_name: "Late".into(),
    })
    .expect("encode handshake");
    socket.send(Message::binary(handshake)).await.expect("send handshake");
    let response: ConnectionHandshakeResponse = match socket.next().await {
        Some(Ok(Message::Binary(bytes))) => protocol::decode(&bytes).expect("handshake response"),
        other => panic!("expected handshake response, got {other:?}"),
    };
    assert!(response.is_room_full);
    assert_eq!(response.player_id, None);
    assert!(response.player_data.is_empty());
    match socket.next().await {
        Some(Ok(Message::Close(Some(frame)))) => {
            assert_eq!(frame.code, CloseCode::Again);
            assert_eq!(frame.reason.as_str(), "room full");
        }
        other => panic!("expected a close frame, got {other:?}"),
    }

    // A slot frees up once someone leaves; ids keep counting up.
    let leaver = clients.remove(0);
    leaver.close().await.expect("close");

    let mut late = None;
    for _ in 0..50 {
        match ArenaClient::connect(&url, "Late").await {
            Ok(client) => {
                late = Some(client);
                break;
            }
            Err(ClientError::RoomFull) => tokio::time::sleep(Duration::from_millis(20)).await,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
    let late = late.expect("a slot should free up after a disconnect");
    assert_eq!(late.player_id(), 5);
}
