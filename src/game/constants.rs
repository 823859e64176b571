/// Simulation timing
pub mod timing {
    /// Simulation tick rate in Hz
    pub const TICK_RATE: u32 = 60;
    /// Tick interval in milliseconds
    pub const TICK_INTERVAL_MS: u64 = 1000 / TICK_RATE as u64;
    /// Network broadcast rate in Hz
    pub const BROADCAST_RATE: u32 = 20;
    /// Broadcast interval in milliseconds
    pub const BROADCAST_INTERVAL_MS: u64 = 1000 / BROADCAST_RATE as u64;
    /// Wall-time budget before a tick is logged as slow
    pub const SLOW_TICK_MS: u64 = 40;
    /// Consecutive slow ticks before escalating to a critical log
    pub const MAX_CONSEC_SLOW: u32 = 10;
    /// A late scheduler runs at most this many back-to-back catch-up ticks
    /// before dropping the remaining backlog
    pub const MAX_CATCH_UP_TICKS: u32 = 3;
}

/// Arena geometry
pub mod arena {
    /// World rectangle width in units
    pub const WORLD_WIDTH: f32 = 5000.0;
    /// World rectangle height in units
    pub const WORLD_HEIGHT: f32 = 5000.0;
    /// Radius of the circular playfield, centered on the world midpoint.
    /// Heads beyond this die; no wrap-around.
    pub const MAP_RADIUS: f32 = WORLD_WIDTH / 2.0;
    /// Margin kept between spawned food and the playfield rim
    pub const FOOD_SPAWN_MARGIN: f32 = 50.0;
    /// Minimum distance from any living head when placing food or worms
    pub const SAFE_SPAWN_DISTANCE: f32 = 100.0;
    /// Attempts at a safe position before falling back to any disk position
    pub const MAX_SPAWN_ATTEMPTS: u32 = 10;
}

/// Worm shape and movement
pub mod worm {
    /// Initial length in segments
    pub const INIT_LEN: f32 = 10.0;
    /// Hard length cap
    pub const MAX_LEN: f32 = 500.0;
    /// Base speed in units/second
    pub const BASE_SPEED: f32 = 150.0;
    /// Speed multiplier while boosting
    pub const BOOST_MULT: f32 = 2.0;
    /// Boost auto-clears at or below this length
    pub const MIN_BOOST_LENGTH: f32 = 10.0;
    /// Boost burns one length unit per 300 ms of real time
    pub const BOOST_BURN_PER_SEC: f32 = 1.0 / 0.3;
    /// Body segment collision radius
    pub const SEG_RADIUS: f32 = 8.0;
    /// The head sample is slightly fatter than the body
    pub const HEAD_RADIUS_BONUS: f32 = 2.0;
    /// Distance between sampled body segments
    pub const SEG_SPACING: f32 = 15.0;
    /// Minimum head travel before a new path point is appended
    pub const PATH_RES: f32 = 2.0;
    /// Maximum travel per integration substep
    pub const STEP_MAX: f32 = 4.0;
    /// Turn clamp per tick, radians
    pub const MAX_TURN_PER_TICK: f32 = 0.15;
    /// Hard cap on stored path points
    pub const PATH_MAX_POINTS: usize = 2000;
    /// Invulnerability window after spawn, milliseconds
    pub const SPAWN_GRACE_MS: u64 = 3000;
    /// With self-collision enabled, skip this many neck segments
    pub const SELF_COLLISION_NECK_SKIP: usize = 5;
}

/// Food economy
pub mod food {
    /// Pellet count at steady state
    pub const FOOD_TARGET: usize = 1500;
    /// New pellets spawned per tick while below target
    pub const RESPAWN_PER_TICK: usize = 20;
    /// Pellet radius range
    pub const MIN_RADIUS: f32 = 3.0;
    pub const MAX_RADIUS: f32 = 8.0;
    /// Death pellets are fatter than ambient ones
    pub const LOOT_RADIUS_BONUS_MIN: f32 = 2.0;
    pub const LOOT_RADIUS_BONUS_MAX: f32 = 4.0;
    /// One loot pellet per this many length units of the dead worm
    pub const LOOT_LENGTH_DIVISOR: f32 = 20.0;
    /// Magnet pull radius around a worm head
    pub const MAGNET_RADIUS: f32 = 50.0;
    /// Magnet pull speed range, units/second
    pub const MAGNET_SPEED_MIN: f32 = 50.0;
    pub const MAGNET_SPEED_MAX: f32 = 600.0;
}

/// Scoring
pub mod scoring {
    /// Score granted per food value unit
    pub const POINTS_PER_FOOD: u64 = 2;
    /// Score granted to the killer on a worm-worm kill
    pub const POINTS_PER_KILL: u64 = 100;
    /// Leaderboard depth
    pub const LEADERBOARD_SIZE: usize = 10;
}

/// Input pipeline
pub mod input {
    /// Per-player FIFO capacity; oldest dropped when full
    pub const INPUT_BUFFER_SIZE: usize = 10;
    /// Accepted commands per player per second
    pub const MAX_INPUT_RATE: u32 = 60;
    /// Accepted client timestamp drift, milliseconds
    pub const TIMESTAMP_SKEW_MS: u64 = 5000;
    /// Cross-thread submission channel capacity
    pub const SUBMIT_CHANNEL_CAPACITY: usize = 1024;
}

/// Spatial index
pub mod spatial {
    /// Cell size of the uniform hash grid, world units
    pub const CELL_SIZE: f32 = 500.0;
}

/// Network / broadcast
pub mod net {
    /// Visibility radius around a living worm's head
    pub const VIEW_RADIUS: f32 = 1500.0;
    /// Extra buffer so entities do not pop at the window edge
    pub const VIEW_BUFFER: f32 = 200.0;
    /// Food items sent to a dead (spectating) player
    pub const SPECTATOR_FOOD_LIMIT: usize = 50;
    /// Every this many broadcasts a client gets a full snapshot
    pub const RESYNC_INTERVAL: u32 = 40;
    /// Head displacement per broadcast interval beyond which the full
    /// path is resent instead of letting the client extrapolate
    pub const TELEPORT_DIST: f32 = 100.0;
    /// Food position deltas below this displacement are suppressed
    pub const FOOD_POSITION_EPSILON: f32 = 0.1;
    /// Per-player snapshot cache bound (LRU eviction)
    pub const MAX_CACHED_SNAPSHOTS: usize = 200;
    /// Transport ping timeout, milliseconds (enforced by the transport;
    /// the core only reacts to the resulting disconnect notification)
    pub const PING_TIMEOUT_MS: u64 = 10_000;
}

/// Shared color palette for worms and pellets
pub const COLOR_PALETTE: &[&str] = &[
    "#ff5e5b", "#ffb400", "#f9f871", "#7bd389", "#38c6d9", "#5b8cff", "#9b5bff", "#ff6ec7",
    "#ff9a5b", "#50e3c2",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_interval() {
        assert_eq!(timing::TICK_INTERVAL_MS, 16);
        assert_eq!(timing::BROADCAST_INTERVAL_MS, 50);
    }

    #[test]
    fn test_map_radius_matches_world() {
        assert_eq!(arena::MAP_RADIUS, 2500.0);
    }

    #[test]
    fn test_palette_nonempty() {
        assert!(!COLOR_PALETTE.is_empty());
    }
}
