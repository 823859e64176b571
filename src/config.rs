/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Maximum number of concurrent game rooms
    pub max_rooms: usize,
    /// Maximum players per room
    pub max_players_per_room: usize,
    /// Head-vs-own-body collision (off in the reference behavior)
    pub self_collision: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_rooms: 16,
            max_players_per_room: 200,
            self_collision: false,
        }
    }
}

impl ServerConfig {
    /// Load config from environment or use defaults
    pub fn load_or_default() -> Self {
        let mut config = Self::default();

        if let Ok(max_rooms) = std::env::var("MAX_ROOMS") {
            if let Ok(parsed) = max_rooms.parse::<usize>() {
                if parsed > 0 && parsed <= 1000 {
                    config.max_rooms = parsed;
                } else {
                    tracing::warn!("MAX_ROOMS must be 1-1000, using default");
                }
            } else {
                tracing::warn!("Invalid MAX_ROOMS '{}', using default", max_rooms);
            }
        }

        if let Ok(max_players) = std::env::var("MAX_PLAYERS_PER_ROOM") {
            if let Ok(parsed) = max_players.parse::<usize>() {
                if parsed > 0 {
                    config.max_players_per_room = parsed;
                } else {
                    tracing::warn!("MAX_PLAYERS_PER_ROOM must be > 0, using default");
                }
            } else {
                tracing::warn!(
                    "Invalid MAX_PLAYERS_PER_ROOM '{}', using default",
                    max_players
                );
            }
        }

        if let Ok(flag) = std::env::var("SELF_COLLISION") {
            match flag.to_ascii_lowercase().as_str() {
                "1" | "true" | "on" => config.self_collision = true,
                "0" | "false" | "off" => config.self_collision = false,
                other => tracing::warn!("Invalid SELF_COLLISION '{}', using default", other),
            }
        }

        config
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), String> {
        if self.max_rooms == 0 {
            return Err("max_rooms must be at least 1".to_string());
        }
        if self.max_players_per_room == 0 {
            return Err("max_players_per_room must be at least 1".to_string());
        }
        Ok(())
    }
}
