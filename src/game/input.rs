//! Input command pipeline: cross-thread submission, validation, rate
//! limiting, and per-player FIFO queues drained at the top of each tick.
//!
//! Transport handlers never touch the world. They push raw JSON payloads
//! into a bounded lock-free channel; the room worker parses and validates
//! them on its own schedule. Rejections are silent toward the client and
//! logged at debug.

use std::collections::{BTreeMap, VecDeque};

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use tracing::debug;

use crate::game::constants::input::{
    INPUT_BUFFER_SIZE, MAX_INPUT_RATE, SUBMIT_CHANNEL_CAPACITY, TIMESTAMP_SKEW_MS,
};
use crate::game::state::PlayerId;
use crate::net::protocol::InputEvent;

/// A validated command ready to be applied to a worm
#[derive(Debug, Clone, PartialEq)]
pub enum InputCommand {
    DirectionChange { direction: f32 },
    Boost { is_boosting: bool },
}

/// A spawn request routed to the room instead of the tick queue
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnRequest {
    pub player_name: String,
    pub skin_id: u8,
}

/// Why a wire command was rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputRejection {
    #[error("payload is not a well-formed input event")]
    Malformed,
    #[error("unknown input type {0:?}")]
    UnknownType(String),
    #[error("direction is not finite")]
    NonFiniteDirection,
    #[error("timestamp outside accepted skew")]
    TimestampSkew,
    #[error("input rate limit exceeded")]
    RateLimited,
    #[error("player has no input queue")]
    UnknownPlayer,
}

/// Raw submission crossing from a transport context into the room worker
#[derive(Debug, Clone)]
pub struct InputMessage {
    pub player_id: PlayerId,
    pub payload: serde_json::Value,
}

/// Clonable handle given to transport handlers
#[derive(Clone)]
pub struct InputSender {
    sender: Sender<InputMessage>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InputSubmitError {
    #[error("input channel full")]
    Full,
    #[error("room worker gone")]
    Disconnected,
}

impl InputSender {
    /// Non-blocking; a full channel drops the submission (backpressure)
    pub fn try_send(
        &self,
        player_id: PlayerId,
        payload: serde_json::Value,
    ) -> Result<(), InputSubmitError> {
        self.sender
            .try_send(InputMessage { player_id, payload })
            .map_err(|e| match e {
                TrySendError::Full(_) => InputSubmitError::Full,
                TrySendError::Disconnected(_) => InputSubmitError::Disconnected,
            })
    }
}

/// Per-player sliding-second rate window and FIFO
#[derive(Debug, Default)]
struct PlayerQueue {
    fifo: VecDeque<InputCommand>,
    window_start_ms: u64,
    accepted_in_window: u32,
}

impl PlayerQueue {
    fn check_rate(&mut self, now_ms: u64) -> Result<(), InputRejection> {
        if now_ms.saturating_sub(self.window_start_ms) >= 1000 {
            self.window_start_ms = now_ms;
            self.accepted_in_window = 0;
        }
        if self.accepted_in_window >= MAX_INPUT_RATE {
            return Err(InputRejection::RateLimited);
        }
        self.accepted_in_window += 1;
        Ok(())
    }

    fn push(&mut self, command: InputCommand) {
        if self.fifo.len() >= INPUT_BUFFER_SIZE {
            self.fifo.pop_front();
        }
        self.fifo.push_back(command);
    }
}

pub struct InputQueue {
    sender: Sender<InputMessage>,
    receiver: Receiver<InputMessage>,
    /// Ordered so the drain walks players deterministically
    queues: BTreeMap<PlayerId, PlayerQueue>,
}

impl InputQueue {
    pub fn new() -> Self {
        let (sender, receiver) = bounded(SUBMIT_CHANNEL_CAPACITY);
        Self {
            sender,
            receiver,
            queues: BTreeMap::new(),
        }
    }

    pub fn sender(&self) -> InputSender {
        InputSender {
            sender: self.sender.clone(),
        }
    }

    pub fn register_player(&mut self, player_id: PlayerId) {
        self.queues.entry(player_id).or_default();
    }

    pub fn unregister_player(&mut self, player_id: PlayerId) {
        self.queues.remove(&player_id);
    }

    /// Pull everything off the submission channel, validate, and queue.
    /// Spawn requests bypass the tick queue and are returned to the caller.
    pub fn ingest(&mut self, now_ms: u64) -> Vec<(PlayerId, SpawnRequest)> {
        let mut spawns = Vec::new();
        let pending: Vec<InputMessage> = self.receiver.try_iter().collect();
        for message in pending {
            match self.accept(message.player_id, &message.payload, now_ms) {
                Ok(Some(spawn)) => spawns.push((message.player_id, spawn)),
                Ok(None) => {}
                Err(rejection) => {
                    debug!(player = %message.player_id, %rejection, "input rejected");
                }
            }
        }
        spawns
    }

    /// Validate one wire payload and queue it (or hand back a spawn request)
    pub fn accept(
        &mut self,
        player_id: PlayerId,
        payload: &serde_json::Value,
        now_ms: u64,
    ) -> Result<Option<SpawnRequest>, InputRejection> {
        let event = parse_input(payload)?;

        if !self.queues.contains_key(&player_id) {
            return Err(InputRejection::UnknownPlayer);
        }

        check_timestamp(event.timestamp(), now_ms)?;

        let queue = self
            .queues
            .get_mut(&player_id)
            .ok_or(InputRejection::UnknownPlayer)?;
        queue.check_rate(now_ms)?;

        match event {
            InputEvent::DirectionChange { direction, .. } => {
                if !direction.is_finite() {
                    return Err(InputRejection::NonFiniteDirection);
                }
                queue.push(InputCommand::DirectionChange { direction });
                Ok(None)
            }
            InputEvent::Boost { is_boosting, .. } => {
                queue.push(InputCommand::Boost { is_boosting });
                Ok(None)
            }
            InputEvent::Spawn {
                player_name,
                skin_id,
                ..
            } => Ok(Some(SpawnRequest {
                player_name,
                skin_id: skin_id.unwrap_or(0),
            })),
        }
    }

    /// Drain every per-player FIFO in insertion order. All queued commands
    /// are returned even when only the last direction change matters.
    pub fn drain(&mut self) -> Vec<(PlayerId, InputCommand)> {
        let mut out = Vec::new();
        for (player_id, queue) in self.queues.iter_mut() {
            while let Some(command) = queue.fifo.pop_front() {
                out.push((*player_id, command));
            }
        }
        out
    }

    pub fn pending_for(&self, player_id: PlayerId) -> usize {
        self.queues.get(&player_id).map_or(0, |q| q.fifo.len())
    }
}

impl Default for InputQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert an untyped wire payload into an event or a rejection reason
pub fn parse_input(payload: &serde_json::Value) -> Result<InputEvent, InputRejection> {
    let kind = payload
        .get("type")
        .and_then(|t| t.as_str())
        .ok_or(InputRejection::Malformed)?;
    match kind {
        "direction-change" | "boost" | "spawn" => {
            serde_json::from_value(payload.clone()).map_err(|_| InputRejection::Malformed)
        }
        other => Err(InputRejection::UnknownType(other.to_string())),
    }
}

fn check_timestamp(timestamp_ms: i64, now_ms: u64) -> Result<(), InputRejection> {
    let skew = (timestamp_ms - now_ms as i64).unsigned_abs();
    if skew > TIMESTAMP_SKEW_MS {
        return Err(InputRejection::TimestampSkew);
    }
    Ok(())
}
