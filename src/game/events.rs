//! Events emitted by the tick systems, consumed by the room for client
//! notifications and by the score system for kill rewards.

use crate::game::food::FoodId;
use crate::game::state::PlayerId;
use crate::game::worm::WormId;
use crate::util::vec2::Vec2;

#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// A worm was created for a player (join or respawn)
    WormSpawned {
        player_id: PlayerId,
        worm_id: WormId,
    },
    /// Head-to-body collision; the victim dies, the killer earns the reward
    WormKilled {
        victim_worm: WormId,
        victim_player: PlayerId,
        killer_worm: WormId,
        killer_player: PlayerId,
        position: Vec2,
    },
    /// A pellet was eaten
    FoodConsumed {
        worm_id: WormId,
        player_id: PlayerId,
        food_id: FoodId,
        value: u32,
        position: Vec2,
    },
    /// The head crossed the playfield rim
    WormOutOfBounds {
        worm_id: WormId,
        player_id: PlayerId,
    },
}
