//! A Room owns one world and runs it on a single worker task.
//!
//! The tick loop and the broadcast loop are two periodic arms of one
//! `select!`, so they never overlap on the same world. Everything else
//! reaches the room through channels: raw inputs over the lock-free input
//! channel, control traffic (join, leave, ping, disconnect) over the
//! command channel drained by the worker.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::game::constants::timing::{
    BROADCAST_INTERVAL_MS, MAX_CATCH_UP_TICKS, TICK_INTERVAL_MS,
};
use crate::game::events::GameEvent;
use crate::game::game_loop::{GameLoop, GameLoopConfig};
use crate::game::input::{InputSender, InputSubmitError};
use crate::game::state::{Player, PlayerId};
use crate::game::worm::WormId;
use crate::net::broadcast::Broadcaster;
use crate::net::interest;
use crate::net::protocol::ServerEvent;

#[derive(Debug, Clone)]
pub struct RoomConfig {
    pub name: String,
    pub max_players: usize,
    pub game: GameLoopConfig,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            name: "main".to_string(),
            max_players: 200,
            game: GameLoopConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinAck {
    pub player_id: PlayerId,
    pub worm_id: WormId,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JoinError {
    #[error("player name must be 1-20 characters of letters, digits, space, _ or -")]
    InvalidName,
    #[error("room is full")]
    RoomFull,
    #[error("room is closed")]
    RoomClosed,
}

impl JoinError {
    /// Error code surfaced to the client
    pub fn code(&self) -> &'static str {
        match self {
            JoinError::InvalidName => "INVALID_NAME",
            JoinError::RoomFull | JoinError::RoomClosed => "JOIN_FAILED",
        }
    }
}

/// Transport-facing sink for one client's outbound events
pub type ClientSink = mpsc::UnboundedSender<ServerEvent>;

pub enum RoomCommand {
    Join {
        socket_id: String,
        player_name: String,
        skin_id: u8,
        sink: ClientSink,
        reply: oneshot::Sender<Result<JoinAck, JoinError>>,
    },
    Leave {
        player_id: PlayerId,
        reason: String,
    },
    /// Transport noticed the session die (ping timeout, socket close)
    Disconnect {
        player_id: PlayerId,
    },
    Ping {
        player_id: PlayerId,
        timestamp: i64,
    },
    Shutdown,
}

/// Cheap clonable handle to a running room worker
#[derive(Clone)]
pub struct RoomHandle {
    id: Uuid,
    name: String,
    control: mpsc::UnboundedSender<RoomCommand>,
    input: InputSender,
    player_count: Arc<AtomicUsize>,
}

impl RoomHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn player_count(&self) -> usize {
        self.player_count.load(Ordering::Relaxed)
    }

    pub async fn join(
        &self,
        socket_id: String,
        player_name: String,
        skin_id: u8,
        sink: ClientSink,
    ) -> Result<JoinAck, JoinError> {
        let (reply, response) = oneshot::channel();
        self.control
            .send(RoomCommand::Join {
                socket_id,
                player_name,
                skin_id,
                sink,
                reply,
            })
            .map_err(|_| JoinError::RoomClosed)?;
        response.await.map_err(|_| JoinError::RoomClosed)?
    }

    /// Enqueue a raw input payload; safe from any thread
    pub fn submit_input(
        &self,
        player_id: PlayerId,
        payload: serde_json::Value,
    ) -> Result<(), InputSubmitError> {
        self.input.try_send(player_id, payload)
    }

    pub fn leave(&self, player_id: PlayerId, reason: impl Into<String>) {
        let _ = self.control.send(RoomCommand::Leave {
            player_id,
            reason: reason.into(),
        });
    }

    pub fn disconnect(&self, player_id: PlayerId) {
        let _ = self.control.send(RoomCommand::Disconnect { player_id });
    }

    pub fn ping(&self, player_id: PlayerId, timestamp: i64) {
        let _ = self.control.send(RoomCommand::Ping {
            player_id,
            timestamp,
        });
    }

    pub fn shutdown(&self) {
        let _ = self.control.send(RoomCommand::Shutdown);
    }
}

pub struct Room {
    id: Uuid,
    config: RoomConfig,
    game: GameLoop,
    broadcaster: Broadcaster,
    clients: HashMap<PlayerId, ClientSink>,
    player_count: Arc<AtomicUsize>,
}

impl Room {
    /// Start a room worker and return its handle
    pub fn spawn(config: RoomConfig) -> RoomHandle {
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let room = Room::new(config);
        let handle = RoomHandle {
            id: room.id,
            name: room.config.name.clone(),
            control: control_tx,
            input: room.game.input_sender(),
            player_count: room.player_count.clone(),
        };
        tokio::spawn(room.run(control_rx));
        handle
    }

    fn new(config: RoomConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            game: GameLoop::new(config.game.clone(), unix_ms()),
            config,
            broadcaster: Broadcaster::new(),
            clients: HashMap::new(),
            player_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    async fn run(mut self, mut control: mpsc::UnboundedReceiver<RoomCommand>) {
        let start = tokio::time::Instant::now();
        let epoch_ms = unix_ms();
        let mut ticks_done: u64 = 0;

        let mut broadcast_timer =
            tokio::time::interval(Duration::from_millis(BROADCAST_INTERVAL_MS));
        broadcast_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        info!(room = %self.id, name = %self.config.name, "room worker started");

        loop {
            // Fixed schedule: tick n fires at start + n * interval, so load
            // does not drift the simulation clock
            let next_tick = start + Duration::from_millis(TICK_INTERVAL_MS * (ticks_done + 1));

            tokio::select! {
                _ = tokio::time::sleep_until(next_tick) => {
                    let mut ran = 0u32;
                    loop {
                        ticks_done += 1;
                        ran += 1;
                        self.run_tick(epoch_ms + ticks_done * TICK_INTERVAL_MS);

                        let due = start.elapsed().as_millis() as u64 / TICK_INTERVAL_MS;
                        if due <= ticks_done {
                            break;
                        }
                        if ran >= MAX_CATCH_UP_TICKS {
                            warn!(room = %self.id, dropped = due - ticks_done, "dropping tick backlog");
                            ticks_done = due;
                            break;
                        }
                    }
                }
                _ = broadcast_timer.tick() => {
                    self.broadcast();
                }
                command = control.recv() => match command {
                    Some(RoomCommand::Shutdown) | None => break,
                    Some(command) => self.handle_command(command),
                }
            }
        }

        info!(room = %self.id, "room worker stopped");
    }

    /// One tick with a panic fence: a crashing tick is logged and dropped,
    /// the loop keeps running
    fn run_tick(&mut self, now_ms: u64) {
        let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| self.game.tick(now_ms)));
        match outcome {
            Ok(events) => self.dispatch_events(&events),
            Err(_) => error!(room = %self.id, "tick panicked; state for this tick dropped"),
        }
    }

    fn handle_command(&mut self, command: RoomCommand) {
        match command {
            RoomCommand::Join {
                socket_id,
                player_name,
                skin_id,
                sink,
                reply,
            } => {
                let result = self.handle_join(socket_id, player_name, skin_id, sink.clone());
                match &result {
                    Ok(ack) => {
                        let _ = sink.send(ServerEvent::PlayerSpawned {
                            player_id: ack.player_id,
                            snake_id: ack.worm_id,
                        });
                    }
                    Err(error) => {
                        let _ = sink.send(ServerEvent::Error {
                            code: error.code().to_string(),
                            message: error.to_string(),
                        });
                    }
                }
                let _ = reply.send(result);
            }
            RoomCommand::Leave { player_id, reason } => {
                self.remove_client(player_id, &reason);
            }
            RoomCommand::Disconnect { player_id } => {
                self.remove_client(player_id, "disconnected");
            }
            RoomCommand::Ping {
                player_id,
                timestamp,
            } => {
                self.send_to(player_id, ServerEvent::Pong { timestamp });
            }
            RoomCommand::Shutdown => {}
        }
    }

    fn handle_join(
        &mut self,
        socket_id: String,
        player_name: String,
        skin_id: u8,
        sink: ClientSink,
    ) -> Result<JoinAck, JoinError> {
        if !valid_player_name(&player_name) {
            return Err(JoinError::InvalidName);
        }
        if self.clients.len() >= self.config.max_players {
            return Err(JoinError::RoomFull);
        }

        let player_id = Uuid::new_v4();
        self.game
            .add_player(Player::new(player_id, socket_id, player_name.clone()));
        let worm_id = self
            .game
            .spawn_worm_for(player_id, player_name.clone(), skin_id)
            .ok_or(JoinError::RoomClosed)?;

        self.clients.insert(player_id, sink);
        self.player_count.store(self.clients.len(), Ordering::Relaxed);

        info!(room = %self.id, player = %player_id, name = %player_name, "player joined");
        self.broadcast_event_except(
            player_id,
            ServerEvent::PlayerJoined {
                player_id,
                player_name,
                snake_id: worm_id,
            },
        );

        Ok(JoinAck { player_id, worm_id })
    }

    fn remove_client(&mut self, player_id: PlayerId, reason: &str) {
        if self.clients.remove(&player_id).is_none() {
            debug!(room = %self.id, player = %player_id, "remove for unknown client");
            return;
        }
        self.game.remove_player(player_id);
        self.broadcaster.remove_client(player_id);
        self.player_count.store(self.clients.len(), Ordering::Relaxed);

        info!(room = %self.id, player = %player_id, reason, "player left");
        self.broadcast_event(ServerEvent::PlayerLeft {
            player_id,
            reason: reason.to_string(),
        });
    }

    fn dispatch_events(&mut self, events: &[GameEvent]) {
        for event in events {
            match event {
                GameEvent::WormSpawned { player_id, worm_id } => {
                    self.send_to(
                        *player_id,
                        ServerEvent::PlayerSpawned {
                            player_id: *player_id,
                            snake_id: *worm_id,
                        },
                    );
                }
                GameEvent::WormKilled { victim_player, .. } => {
                    self.broadcast_event(ServerEvent::PlayerDied {
                        player_id: *victim_player,
                    });
                }
                GameEvent::WormOutOfBounds { player_id, .. } => {
                    self.broadcast_event(ServerEvent::PlayerDied {
                        player_id: *player_id,
                    });
                }
                GameEvent::FoodConsumed { .. } => {}
            }
        }
    }

    /// One broadcast pass: per-client interest window, then full-or-delta
    fn broadcast(&mut self) {
        let world = self.game.world();
        let index = self.game.index();
        let leaderboard = self.game.leaderboard();

        let snapshots: Vec<_> = self
            .clients
            .keys()
            .map(|&player_id| {
                (
                    player_id,
                    interest::snapshot_for_player(world, index, leaderboard, player_id),
                )
            })
            .collect();

        for (player_id, snapshot) in snapshots {
            if let Some(event) = self.broadcaster.prepare(player_id, snapshot) {
                self.send_to(player_id, event);
            }
        }
    }

    /// Emit-and-forget: one client's dead socket never affects the others
    fn send_to(&self, player_id: PlayerId, event: ServerEvent) {
        if let Some(sink) = self.clients.get(&player_id) {
            if sink.send(event).is_err() {
                warn!(room = %self.id, player = %player_id, "client sink closed, dropping event");
            }
        }
    }

    fn broadcast_event(&self, event: ServerEvent) {
        for (player_id, sink) in &self.clients {
            if sink.send(event.clone()).is_err() {
                warn!(room = %self.id, player = %player_id, "client sink closed, dropping event");
            }
        }
    }

    fn broadcast_event_except(&self, skip: PlayerId, event: ServerEvent) {
        for (player_id, sink) in &self.clients {
            if *player_id == skip {
                continue;
            }
            if sink.send(event.clone()).is_err() {
                warn!(room = %self.id, player = %player_id, "client sink closed, dropping event");
            }
        }
    }
}

/// Names are 1..=20 characters from `[A-Za-z0-9 _-]`
pub fn valid_player_name(name: &str) -> bool {
    let len = name.chars().count();
    (1..=20).contains(&len)
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == ' ' || c == '_' || c == '-')
}

fn unix_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
