//! Wire protocol: named JSON events exchanged with the transport layer.
//!
//! The transport owns framing and sessions; this module owns the payload
//! shapes. Field names follow the client's camelCase convention, event and
//! input type tags are kebab-case.

use serde::{Deserialize, Serialize};

use crate::game::food::{Food, FoodId};
use crate::game::state::{PlayerId, World};
use crate::game::systems::score::LeaderboardEntry;
use crate::game::worm::{Worm, WormId};
use crate::util::vec2::Vec2;

/// `input` event payloads, tagged by their wire `type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum InputEvent {
    #[serde(rename_all = "camelCase")]
    DirectionChange { direction: f32, timestamp: i64 },
    #[serde(rename_all = "camelCase")]
    Boost { is_boosting: bool, timestamp: i64 },
    #[serde(rename_all = "camelCase")]
    Spawn {
        player_name: String,
        #[serde(default)]
        skin_id: Option<u8>,
        timestamp: i64,
    },
}

impl InputEvent {
    pub fn timestamp(&self) -> i64 {
        match self {
            InputEvent::DirectionChange { timestamp, .. }
            | InputEvent::Boost { timestamp, .. }
            | InputEvent::Spawn { timestamp, .. } => *timestamp,
        }
    }
}

/// Client -> server events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    #[serde(rename_all = "camelCase")]
    JoinRoom {
        player_name: String,
        #[serde(default)]
        room_id: Option<String>,
        #[serde(default)]
        skin_id: Option<u8>,
    },
    Input(InputEvent),
    Ping {
        #[serde(default)]
        timestamp: i64,
    },
}

/// Server -> client events, sent per client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// Full snapshot for initial sync and periodic resync
    GameState(GameSnapshot),
    /// Diff against the client's previously acknowledged snapshot
    DeltaUpdate(DeltaUpdate),
    #[serde(rename_all = "camelCase")]
    PlayerSpawned { player_id: PlayerId, snake_id: WormId },
    #[serde(rename_all = "camelCase")]
    PlayerJoined {
        player_id: PlayerId,
        player_name: String,
        snake_id: WormId,
    },
    #[serde(rename_all = "camelCase")]
    PlayerLeft { player_id: PlayerId, reason: String },
    #[serde(rename_all = "camelCase")]
    PlayerDied { player_id: PlayerId },
    Error { code: String, message: String },
    Pong { timestamp: i64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WormSnapshot {
    pub id: WormId,
    pub player_id: PlayerId,
    pub head: Vec2,
    pub direction: f32,
    pub length: f32,
    pub color: String,
    pub skin_id: u8,
    pub is_boosting: bool,
    pub score: u64,
    pub name: String,
    /// Omitted from most deltas; the client reconstructs the trail locally
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<Vec2>>,
}

impl WormSnapshot {
    pub fn from_worm(worm: &Worm, score: u64, include_path: bool) -> Self {
        Self {
            id: worm.id,
            player_id: worm.player_id,
            head: worm.head,
            direction: worm.direction,
            length: worm.length,
            color: worm.color.clone(),
            skin_id: worm.skin_id,
            is_boosting: worm.is_boosting,
            score,
            name: worm.name.clone(),
            path: include_path.then(|| worm.path().iter().copied().collect()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodSnapshot {
    pub id: FoodId,
    pub position: Vec2,
    pub value: u32,
    pub radius: f32,
    pub color: String,
}

impl FoodSnapshot {
    pub fn from_food(food: &Food) -> Self {
        Self {
            id: food.id,
            position: food.position,
            value: food.value,
            radius: food.radius,
            color: food.color.clone(),
        }
    }
}

/// Full state visible to one client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    pub tick: u64,
    pub world_size: (f32, f32),
    pub worms: Vec<WormSnapshot>,
    pub food: Vec<FoodSnapshot>,
    pub leaderboard: Vec<LeaderboardEntry>,
}

impl GameSnapshot {
    /// Snapshot of the whole world, paths included (spectators and tests)
    pub fn full(world: &World, leaderboard: &[LeaderboardEntry]) -> Self {
        let worms = world
            .worms
            .values()
            .filter(|w| w.alive)
            .map(|w| {
                let score = world.players.get(&w.player_id).map_or(0, |p| p.score);
                WormSnapshot::from_worm(w, score, true)
            })
            .collect();
        let food = world.food.values().map(FoodSnapshot::from_food).collect();
        Self {
            tick: world.tick,
            world_size: world.world_size,
            worms,
            food,
            leaderboard: leaderboard.to_vec(),
        }
    }
}

/// Per-worm field diff; only changed fields are present
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WormDelta {
    pub id: WormId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head: Option<Vec2>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<u64>,
    /// Present only when the client cannot reconstruct the trail itself
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<Vec2>>,
}

impl WormDelta {
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
            && self.direction.is_none()
            && self.length.is_none()
            && self.score.is_none()
            && self.path.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodPositionDelta {
    pub id: FoodId,
    pub position: Vec2,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeltaUpdate {
    pub tick: u64,
    pub worms_added: Vec<WormSnapshot>,
    pub worms_updated: Vec<WormDelta>,
    pub worms_removed: Vec<WormId>,
    pub food_added: Vec<FoodSnapshot>,
    pub food_updated: Vec<FoodPositionDelta>,
    pub food_removed: Vec<FoodId>,
    /// Present only when the board changed since the last broadcast
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leaderboard: Option<Vec<LeaderboardEntry>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_input_event_wire_tags() {
        let event: InputEvent = serde_json::from_value(json!({
            "type": "direction-change",
            "direction": 1.25,
            "timestamp": 42,
        }))
        .unwrap();
        assert_eq!(
            event,
            InputEvent::DirectionChange {
                direction: 1.25,
                timestamp: 42
            }
        );

        let event: InputEvent = serde_json::from_value(json!({
            "type": "boost",
            "isBoosting": true,
            "timestamp": 43,
        }))
        .unwrap();
        assert_eq!(
            event,
            InputEvent::Boost {
                is_boosting: true,
                timestamp: 43
            }
        );

        let event: InputEvent = serde_json::from_value(json!({
            "type": "spawn",
            "playerName": "eve",
            "timestamp": 44,
        }))
        .unwrap();
        assert!(matches!(event, InputEvent::Spawn { skin_id: None, .. }));
    }

    #[test]
    fn test_client_join_event_shape() {
        let event: ClientEvent = serde_json::from_value(json!({
            "event": "join-room",
            "data": { "playerName": "eve", "skinId": 3 },
        }))
        .unwrap();
        match event {
            ClientEvent::JoinRoom {
                player_name,
                room_id,
                skin_id,
            } => {
                assert_eq!(player_name, "eve");
                assert_eq!(room_id, None);
                assert_eq!(skin_id, Some(3));
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_server_event_tags() {
        let event = ServerEvent::PlayerDied {
            player_id: uuid::Uuid::nil(),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event"], "player-died");
        assert!(value["data"]["playerId"].is_string());

        let event = ServerEvent::Pong { timestamp: 7 };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event"], "pong");
        assert_eq!(value["data"]["timestamp"], 7);
    }

    #[test]
    fn test_worm_delta_omits_absent_fields() {
        let delta = WormDelta {
            id: 1,
            head: Some(Vec2::new(1.0, 2.0)),
            direction: None,
            length: None,
            score: None,
            path: None,
        };
        let value = serde_json::to_value(&delta).unwrap();
        assert!(value.get("direction").is_none());
        assert!(value.get("path").is_none());
        assert!(value.get("head").is_some());
    }

    #[test]
    fn test_snapshot_round_trip() {
        let snapshot = GameSnapshot {
            tick: 5,
            world_size: (5000.0, 5000.0),
            worms: vec![],
            food: vec![FoodSnapshot {
                id: 9,
                position: Vec2::new(1.0, 2.0),
                value: 2,
                radius: 5.0,
                color: "#ffb400".to_string(),
            }],
            leaderboard: vec![],
        };
        let encoded = serde_json::to_string(&snapshot).unwrap();
        let decoded: GameSnapshot = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, snapshot);
    }
}
