use super::room::ArenaRoom;
use super::types::{GameCommand, RoomEvent};
use crate::domain::tuning::{RulesTuning, SimulationTuning};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, Notify};
use tokio::time::MissedTickBehavior;
use tracing::info;

/// Shared configuration for spawning the room world.
#[derive(Debug, Clone)]
pub struct RoomSettings {
    /// Capacity for inbound commands from connection tasks.
    pub command_channel_capacity: usize,
    /// Capacity for broadcast room events.
    pub event_broadcast_capacity: usize,
    /// Gameplay tuning; its tick interval also drives the loop cadence.
    pub simulation: SimulationTuning,
    pub rules: RulesTuning,
}

/// Channels into and out of a running room.
#[derive(Clone)]
pub struct RoomHandle {
    /// Sender for commands into the world task.
    pub command_tx: mpsc::Sender<GameCommand>,
    /// Broadcast sender for authoritative room events.
    pub events_tx: broadcast::Sender<RoomEvent>,
    /// Stops the world task.
    pub shutdown: Arc<Notify>,
}

/// Starts the world task for a fresh room.
pub fn spawn_room(settings: &RoomSettings) -> RoomHandle {
    let (command_tx, command_rx) = mpsc::channel(settings.command_channel_capacity);
    let (events_tx, _) = broadcast::channel(settings.event_broadcast_capacity);
    let shutdown = Arc::new(Notify::new());

    let room = ArenaRoom::new(settings.simulation, settings.rules, events_tx.clone());
    tokio::spawn(world_task(
        command_rx,
        room,
        settings.simulation.tick_interval,
        shutdown.clone(),
    ));

    RoomHandle {
        command_tx,
        events_tx,
        shutdown,
    }
}

pub async fn world_task(
    mut command_rx: mpsc::Receiver<GameCommand>,
    mut room: ArenaRoom,
    tick_interval: Duration,
    shutdown: Arc<Notify>,
) {
    // Drive the fixed-step game loop at the configured tick rate.
    let mut interval = tokio::time::interval(tick_interval);
    // A stalled tick is not replayed in a burst; the simulation clock stays fixed-step anyway.
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut ticks: u64 = 0;

    info!(tick_ms = tick_interval.as_millis() as u64, "world task started");

    loop {
        tokio::select! {
            _ = shutdown.notified() => {
                break;
            }
            _ = interval.tick() => {}
        }

        // Commands apply between ticks, in arrival order.
        while let Ok(command) = command_rx.try_recv() {
            room.handle(command);
        }

        room.tick();
        ticks += 1;
    }

    info!(ticks, "world task stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PlayerMove;
    use crate::use_cases::types::{JoinOutcome, ServerEvent};
    use tokio::sync::oneshot;

    fn settings() -> RoomSettings {
        RoomSettings {
            command_channel_capacity: 64,
            event_broadcast_capacity: 256,
            simulation: SimulationTuning::with_tick_interval(Duration::from_millis(5)),
            rules: RulesTuning::default(),
        }
    }

    async fn join(handle: &RoomHandle, name: &str) -> JoinOutcome {
        let (reply, reply_rx) = oneshot::channel();
        handle
            .command_tx
            .send(GameCommand::Join {
                player_name: name.to_string(),
                reply,
            })
            .await
            .expect("world task is running");
        reply_rx.await.expect("world task replies")
    }

    #[tokio::test]
    async fn when_commands_are_queued_then_world_task_applies_them_in_order() {
        let handle = spawn_room(&settings());
        let mut events_rx = handle.events_tx.subscribe();

        let JoinOutcome::Accepted {
            player_id,
            players,
            last_seq,
        } = join(&handle, "Ace").await
        else {
            panic!("expected join to be accepted");
        };
        let spawn = players[0].position;

        handle
            .command_tx
            .send(GameCommand::Move {
                player_id,
                player_move: PlayerMove::StartRotateClockwise,
                reported: spawn,
            })
            .await
            .expect("world task is running");
        handle
            .command_tx
            .send(GameCommand::Leave { player_id })
            .await
            .expect("world task is running");

        let mut seen = Vec::new();
        while seen.len() < 3 {
            let event = events_rx.recv().await.expect("room event");
            seen.push(event);
        }
        handle.shutdown.notify_one();

        assert_eq!(last_seq, 1);
        assert!(seen.windows(2).all(|pair| pair[0].seq < pair[1].seq));
        assert!(matches!(seen[0].event, ServerEvent::PlayerConnected { .. }));
        assert!(matches!(seen[1].event, ServerEvent::PlayerMoved { .. }));
        assert_eq!(seen[2].event, ServerEvent::PlayerDisconnected { player_id });
    }

    #[tokio::test]
    async fn when_leaderboard_is_requested_then_world_task_replies() {
        let handle = spawn_room(&settings());
        join(&handle, "Ace").await;

        let (reply, reply_rx) = oneshot::channel();
        handle
            .command_tx
            .send(GameCommand::Leaderboard { reply })
            .await
            .expect("world task is running");
        let board = reply_rx.await.expect("leaderboard reply");
        handle.shutdown.notify_one();

        assert_eq!(board.len(), 1);
        assert_eq!(board[0].player_name, "Ace");
    }
}
