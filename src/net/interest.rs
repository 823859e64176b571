//! Interest management: the per-player visibility window.
//!
//! A living player sees entities around their worm's head; a dead player
//! spectates every living worm plus a bounded food sample. The filtered
//! snapshot is what the delta broadcaster diffs against.

use crate::game::constants::net::{SPECTATOR_FOOD_LIMIT, VIEW_BUFFER, VIEW_RADIUS};
use crate::game::spatial::SpatialIndex;
use crate::game::state::{PlayerId, World};
use crate::game::systems::score::LeaderboardEntry;
use crate::net::protocol::{FoodSnapshot, GameSnapshot, WormSnapshot};

/// Build the state slice visible to one player
pub fn snapshot_for_player(
    world: &World,
    index: &SpatialIndex,
    leaderboard: &[LeaderboardEntry],
    player_id: PlayerId,
) -> GameSnapshot {
    let own_worm = world
        .get_player(player_id)
        .and_then(|p| p.worm_id)
        .and_then(|id| world.worms.get(&id))
        .filter(|w| w.alive);

    let (worms, food) = match own_worm {
        Some(worm) => {
            let radius = VIEW_RADIUS + VIEW_BUFFER;
            let mut worm_ids = index.worms_in_radius(worm.head, radius);
            if !worm_ids.contains(&worm.id) {
                worm_ids.push(worm.id);
                worm_ids.sort_unstable();
            }

            let worms = worm_ids
                .iter()
                .filter_map(|id| world.worms.get(id))
                .filter(|w| w.alive)
                .map(|w| worm_snapshot(world, w))
                .collect();

            let food = index
                .food_in_radius(worm.head, radius)
                .iter()
                .filter_map(|id| world.food.get(id))
                .map(FoodSnapshot::from_food)
                .collect();
            (worms, food)
        }
        None => {
            // Spectator view: every living worm, a bounded food sample
            let worms = world
                .worms
                .values()
                .filter(|w| w.alive)
                .map(|w| worm_snapshot(world, w))
                .collect();
            let food = world
                .food
                .values()
                .take(SPECTATOR_FOOD_LIMIT)
                .map(FoodSnapshot::from_food)
                .collect();
            (worms, food)
        }
    };

    GameSnapshot {
        tick: world.tick,
        world_size: world.world_size,
        worms,
        food,
        leaderboard: leaderboard.to_vec(),
    }
}

fn worm_snapshot(world: &World, worm: &crate::game::worm::Worm) -> WormSnapshot {
    let score = world.players.get(&worm.player_id).map_or(0, |p| p.score);
    WormSnapshot::from_worm(worm, score, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::constants::worm::BASE_SPEED;
    use crate::game::food::Food;
    use crate::game::state::Player;
    use crate::game::worm::{Worm, WormId};
    use crate::util::vec2::Vec2;
    use uuid::Uuid;

    struct Fixture {
        world: World,
        index: SpatialIndex,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                world: World::new(0),
                index: SpatialIndex::default(),
            }
        }

        fn add_worm(&mut self, id: WormId, origin: Vec2) -> PlayerId {
            let player_id = Uuid::new_v4();
            self.world
                .add_player(Player::new(player_id, format!("s{id}"), format!("p{id}")));
            let worm = Worm::new(
                id,
                player_id,
                format!("p{id}"),
                origin,
                0.0,
                "#ff5e5b".to_string(),
                0,
                0,
                BASE_SPEED,
            );
            self.world.insert_worm(worm);
            player_id
        }

        fn add_food(&mut self, id: u64, position: Vec2) {
            self.index.add_food(id, position);
            self.world
                .food
                .insert(id, Food::new(id, position, 5.0, "#ffb400".to_string()));
        }

        fn rebuild(&mut self) {
            self.index.clear_worms();
            for (id, worm) in self.world.worms.iter_mut() {
                if worm.alive {
                    self.index.insert_worm_segments(*id, worm.segments());
                }
            }
        }
    }

    #[test]
    fn test_living_player_sees_window_only() {
        let mut fx = Fixture::new();
        let me = fx.add_worm(1, Vec2::new(2500.0, 2500.0));
        fx.add_worm(2, Vec2::new(2600.0, 2500.0)); // inside window
        fx.add_worm(3, Vec2::new(400.0, 400.0)); // outside the window's cell range
        fx.add_food(1, Vec2::new(2550.0, 2500.0));
        fx.add_food(2, Vec2::new(200.0, 200.0));
        fx.rebuild();

        let snapshot = snapshot_for_player(&fx.world, &fx.index, &[], me);

        let ids: Vec<WormId> = snapshot.worms.iter().map(|w| w.id).collect();
        assert!(ids.contains(&1));
        assert!(ids.contains(&2));
        assert!(!ids.contains(&3));
        assert_eq!(snapshot.food.len(), 1);
        assert_eq!(snapshot.food[0].id, 1);
    }

    #[test]
    fn test_snapshot_includes_score_and_path() {
        let mut fx = Fixture::new();
        let me = fx.add_worm(1, Vec2::new(2500.0, 2500.0));
        fx.world.players.get_mut(&me).unwrap().score = 42;
        fx.rebuild();

        let snapshot = snapshot_for_player(&fx.world, &fx.index, &[], me);
        let worm = &snapshot.worms[0];
        assert_eq!(worm.score, 42);
        assert!(worm.path.is_some());
        assert!(!worm.path.as_ref().unwrap().is_empty());
    }

    #[test]
    fn test_dead_player_spectates_all_worms() {
        let mut fx = Fixture::new();
        let me = fx.add_worm(1, Vec2::new(2500.0, 2500.0));
        fx.add_worm(2, Vec2::new(300.0, 300.0));
        fx.add_worm(3, Vec2::new(4500.0, 4500.0));
        fx.world.worms.get_mut(&1).unwrap().die();
        fx.rebuild();

        let snapshot = snapshot_for_player(&fx.world, &fx.index, &[], me);
        let ids: Vec<WormId> = snapshot.worms.iter().map(|w| w.id).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn test_spectator_food_bounded() {
        let mut fx = Fixture::new();
        let me = fx.add_worm(1, Vec2::new(2500.0, 2500.0));
        fx.world.worms.get_mut(&1).unwrap().die();
        for i in 0..(SPECTATOR_FOOD_LIMIT as u64 + 30) {
            fx.add_food(i + 1, Vec2::new(100.0 + i as f32, 100.0));
        }
        fx.rebuild();

        let snapshot = snapshot_for_player(&fx.world, &fx.index, &[], me);
        assert_eq!(snapshot.food.len(), SPECTATOR_FOOD_LIMIT);
    }

    #[test]
    fn test_unknown_player_gets_spectator_view() {
        let mut fx = Fixture::new();
        fx.add_worm(1, Vec2::new(2500.0, 2500.0));
        fx.rebuild();

        let snapshot = snapshot_for_player(&fx.world, &fx.index, &[], Uuid::new_v4());
        assert_eq!(snapshot.worms.len(), 1);
    }

    #[test]
    fn test_leaderboard_passed_through() {
        let mut fx = Fixture::new();
        let me = fx.add_worm(1, Vec2::new(2500.0, 2500.0));
        fx.rebuild();
        let board = vec![LeaderboardEntry {
            rank: 1,
            name: "p1".to_string(),
            score: 9,
        }];

        let snapshot = snapshot_for_player(&fx.world, &fx.index, &board, me);
        assert_eq!(snapshot.leaderboard, board);
    }
}
