//! Room lifecycle: a default room at startup, optional extra rooms, and the
//! player placement policy (everyone lands in the default room).

use std::collections::HashMap;

use tracing::info;
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::game::game_loop::GameLoopConfig;
use crate::room::room::{Room, RoomConfig, RoomHandle};

#[derive(Debug, Clone, thiserror::Error)]
pub enum ManagerError {
    #[error("too many rooms")]
    TooManyRooms,
    #[error("room not found")]
    RoomNotFound,
    #[error("the default room cannot be destroyed")]
    DefaultRoomProtected,
}

/// Room listing entry for diagnostics and the room browser
#[derive(Debug, Clone)]
pub struct RoomInfo {
    pub id: Uuid,
    pub name: String,
    pub players: usize,
}

pub struct RoomManager {
    rooms: HashMap<Uuid, RoomHandle>,
    default_room: Uuid,
    max_rooms: usize,
    room_template: RoomConfig,
}

impl RoomManager {
    /// Create the manager and its default room
    pub fn new(config: &ServerConfig) -> Self {
        let template = RoomConfig {
            name: "main".to_string(),
            max_players: config.max_players_per_room,
            game: GameLoopConfig {
                self_collision: config.self_collision,
                ..GameLoopConfig::default()
            },
        };

        let default_handle = Room::spawn(template.clone());
        let default_room = default_handle.id();
        info!(room = %default_room, "default room created");

        let mut rooms = HashMap::new();
        rooms.insert(default_room, default_handle);

        Self {
            rooms,
            default_room,
            max_rooms: config.max_rooms,
            room_template: template,
        }
    }

    pub fn room(&self, id: Uuid) -> Option<&RoomHandle> {
        self.rooms.get(&id)
    }

    pub fn default_room(&self) -> &RoomHandle {
        // The default room is never destroyed, so the entry always exists
        self.rooms
            .get(&self.default_room)
            .expect("default room handle present")
    }

    /// Placement policy: every player goes to the default room
    pub fn assign_player(&self, _player_id: Uuid) -> Uuid {
        self.default_room
    }

    pub fn create_room(&mut self, name: String) -> Result<Uuid, ManagerError> {
        if self.rooms.len() >= self.max_rooms {
            return Err(ManagerError::TooManyRooms);
        }
        let config = RoomConfig {
            name,
            ..self.room_template.clone()
        };
        let handle = Room::spawn(config);
        let id = handle.id();
        info!(room = %id, "room created");
        self.rooms.insert(id, handle);
        Ok(id)
    }

    pub fn destroy_room(&mut self, id: Uuid) -> Result<(), ManagerError> {
        if id == self.default_room {
            return Err(ManagerError::DefaultRoomProtected);
        }
        let handle = self.rooms.remove(&id).ok_or(ManagerError::RoomNotFound)?;
        handle.shutdown();
        info!(room = %id, "room destroyed");
        Ok(())
    }

    pub fn list_rooms(&self) -> Vec<RoomInfo> {
        self.rooms
            .values()
            .map(|handle| RoomInfo {
                id: handle.id(),
                name: handle.name().to_string(),
                players: handle.player_count(),
            })
            .collect()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Stop every room worker, the default one included
    pub fn shutdown_all(&mut self) {
        for handle in self.rooms.values() {
            handle.shutdown();
        }
        self.rooms.clear();
    }
}
