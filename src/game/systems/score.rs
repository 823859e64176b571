//! Kill rewards and the per-tick leaderboard.

use serde::{Deserialize, Serialize};

use crate::game::constants::scoring::{LEADERBOARD_SIZE, POINTS_PER_KILL};
use crate::game::events::GameEvent;
use crate::game::state::World;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub name: String,
    pub score: u64,
}

/// Pay the kill reward for every worm-worm collision event of this tick
pub fn award_kills(world: &mut World, events: &[GameEvent]) {
    for event in events {
        if let GameEvent::WormKilled { killer_player, .. } = event {
            if let Some(player) = world.players.get_mut(killer_player) {
                player.score += POINTS_PER_KILL;
            }
        }
    }
}

/// Top players by score, ties broken by ascending player id for stability
pub fn compute_leaderboard(world: &World) -> Vec<LeaderboardEntry> {
    let mut players: Vec<_> = world.players.values().collect();
    players.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
    players
        .into_iter()
        .take(LEADERBOARD_SIZE)
        .enumerate()
        .map(|(i, player)| LeaderboardEntry {
            rank: i as u32 + 1,
            name: player.name.clone(),
            score: player.score,
        })
        .collect()
}
