//! Collision resolution: worm heads against rival bodies, then worm heads
//! against food (with a swept test so fast heads cannot tunnel past pellets).
//!
//! Runs after physics on the freshly rebuilt spatial index. Worms are
//! resolved in insertion order; food removals are deferred to the end of the
//! pass while the index entry is dropped immediately, so a pellet can never
//! be eaten twice in one tick.

use crate::game::constants::food::MAX_RADIUS;
use crate::game::constants::scoring::POINTS_PER_FOOD;
use crate::game::constants::worm::SELF_COLLISION_NECK_SKIP;
use crate::game::events::GameEvent;
use crate::game::spatial::SpatialIndex;
use crate::game::state::{PlayerId, World};
use crate::game::worm::WormId;
use crate::util::geom::{circles_intersect, point_segment_distance_sq};
use crate::util::vec2::Vec2;

pub fn resolve(world: &mut World, index: &mut SpatialIndex, self_collision: bool) -> Vec<GameEvent> {
    let mut events = Vec::new();
    resolve_worm_worm(world, index, self_collision, &mut events);
    resolve_worm_food(world, index, &mut events);
    events
}

fn resolve_worm_worm(
    world: &mut World,
    index: &SpatialIndex,
    self_collision: bool,
    events: &mut Vec<GameEvent>,
) {
    let now_ms = world.now_ms;
    let tick = world.tick;

    // Head data snapshot keeps iteration order stable while bodies mutate
    let heads: Vec<(WormId, Vec2, f32, bool)> = world
        .worms
        .values()
        .filter(|w| w.alive)
        .map(|w| (w.id, w.head, w.head_radius(), w.in_spawn_grace(now_ms)))
        .collect();

    for (worm_id, head, head_radius, in_grace) in heads {
        // Grace-period worms cannot be killed; skip the test entirely
        if in_grace {
            continue;
        }
        if !world.worms.get(&worm_id).is_some_and(|w| w.alive) {
            continue;
        }

        let mut nearby = index.nearby_worms(head);
        nearby.sort_unstable();

        let mut kill: Option<(WormId, PlayerId)> = None;
        'search: for other_id in nearby {
            if other_id == worm_id && !self_collision {
                continue;
            }
            let Some(other) = world.worms.get_mut(&other_id) else {
                continue;
            };
            if !other.alive {
                continue;
            }
            let killer_player = other.player_id;
            // Against own body, skip the head sample and the neck
            let skip = if other_id == worm_id {
                SELF_COLLISION_NECK_SKIP + 1
            } else {
                0
            };
            for segment in other.segments().iter().skip(skip) {
                if circles_intersect(head, head_radius, segment.center, segment.radius) {
                    kill = Some((other_id, killer_player));
                    break 'search;
                }
            }
        }

        if let Some((killer_worm, killer_player)) = kill {
            if let Some(worm) = world.worms.get_mut(&worm_id) {
                worm.die();
                worm.died_at_tick = Some(tick);
                events.push(GameEvent::WormKilled {
                    victim_worm: worm_id,
                    victim_player: worm.player_id,
                    killer_worm,
                    killer_player,
                    position: head,
                });
            }
        }
    }
}

fn resolve_worm_food(world: &mut World, index: &mut SpatialIndex, events: &mut Vec<GameEvent>) {
    let eaters: Vec<(WormId, PlayerId, Vec2, Vec2, f32)> = world
        .worms
        .values()
        .filter(|w| w.alive)
        .map(|w| (w.id, w.player_id, w.head, w.prev_tick_head, w.head_radius()))
        .collect();

    let mut consumed = Vec::new();
    for (worm_id, player_id, head, prev_head, head_radius) in eaters {
        let query_radius = head_radius + MAX_RADIUS * 2.0;
        for food_id in index.food_in_radius(head, query_radius) {
            let Some(food) = world.food.get_mut(&food_id) else {
                continue;
            };
            if food.consumed {
                continue;
            }

            let grab = head_radius + food.radius;
            let grab_sq = grab * grab;
            let direct = head.distance_sq_to(food.position) <= grab_sq;
            // Swept test covers the whole head traversal of this tick, so a
            // large dt cannot step over a pellet
            let hit = direct
                || point_segment_distance_sq(food.position, prev_head, head) <= grab_sq;
            if !hit {
                continue;
            }

            food.consumed = true;
            let value = food.value;
            let position = food.position;
            index.remove_food(food_id, position);
            consumed.push(food_id);

            if let Some(worm) = world.worms.get_mut(&worm_id) {
                worm.grow(value as f32);
            }
            if let Some(player) = world.players.get_mut(&player_id) {
                player.score += value as u64 * POINTS_PER_FOOD;
            }
            events.push(GameEvent::FoodConsumed {
                worm_id,
                player_id,
                food_id,
                value,
                position,
            });
        }
    }

    for food_id in consumed {
        world.food.remove(&food_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::constants::worm::{BASE_SPEED, SPAWN_GRACE_MS};
    use crate::game::food::Food;
    use crate::game::state::Player;
    use crate::game::worm::Worm;
    use uuid::Uuid;

    fn add_worm(world: &mut World, id: WormId, origin: Vec2, direction: f32) -> (WormId, PlayerId) {
        let player_id = Uuid::new_v4();
        world.add_player(Player::new(player_id, format!("sock-{id}"), format!("p{id}")));
        let worm = Worm::new(
            id,
            player_id,
            format!("p{id}"),
            origin,
            direction,
            "#ff5e5b".to_string(),
            0,
            0,
            BASE_SPEED,
        );
        world.insert_worm(worm);
        (id, player_id)
    }

    fn rebuild(world: &mut World, index: &mut SpatialIndex) {
        index.clear_worms();
        for (id, worm) in world.worms.iter_mut() {
            if worm.alive {
                index.insert_worm_segments(*id, worm.segments());
            }
        }
    }

    /// A long straight worm whose body passes through `through` (its head
    /// sits well east of the crossing point, body trailing back over it)
    fn add_body_worm(world: &mut World, id: WormId, through: Vec2) -> (WormId, PlayerId) {
        add_worm(world, id, through + Vec2::new(60.0, 0.0), 0.0)
    }

    #[test]
    fn test_head_into_body_kills() {
        let mut world = World::new(0);
        world.now_ms = SPAWN_GRACE_MS + 1;
        let mut index = SpatialIndex::default();

        let (a, a_player) = add_body_worm(&mut world, 1, Vec2::new(2550.0, 2500.0));
        let (b, b_player) = add_worm(&mut world, 2, Vec2::new(2550.0, 2495.0), 0.0);
        rebuild(&mut world, &mut index);

        let events = resolve(&mut world, &mut index, false);

        assert!(!world.worms[&b].alive);
        assert!(world.worms[&a].alive);
        assert_eq!(world.worms[&b].died_at_tick, Some(0));
        assert!(events.iter().any(|e| matches!(
            e,
            GameEvent::WormKilled { victim_worm, victim_player, killer_worm, killer_player, .. }
                if *victim_worm == b && *victim_player == b_player
                    && *killer_worm == a && *killer_player == a_player
        )));
    }

    #[test]
    fn test_grace_period_immunity() {
        let mut world = World::new(0);
        // Both worms spawned at t=0; now is inside the grace window
        world.now_ms = 1000;
        let mut index = SpatialIndex::default();

        add_body_worm(&mut world, 1, Vec2::new(2550.0, 2500.0));
        let (b, _) = add_worm(&mut world, 2, Vec2::new(2550.0, 2495.0), 0.0);
        rebuild(&mut world, &mut index);

        let events = resolve(&mut world, &mut index, false);

        assert!(world.worms[&b].alive);
        assert!(!events
            .iter()
            .any(|e| matches!(e, GameEvent::WormKilled { .. })));
    }

    #[test]
    fn test_dead_worm_cannot_kill() {
        let mut world = World::new(0);
        world.now_ms = SPAWN_GRACE_MS + 1;
        let mut index = SpatialIndex::default();

        let (a, _) = add_body_worm(&mut world, 1, Vec2::new(2550.0, 2500.0));
        let (b, _) = add_worm(&mut world, 2, Vec2::new(2550.0, 2495.0), 0.0);
        rebuild(&mut world, &mut index);
        // A died earlier in the tick; its body is no longer lethal
        world.worms.get_mut(&a).unwrap().die();

        resolve(&mut world, &mut index, false);
        assert!(world.worms[&b].alive);
    }

    #[test]
    fn test_self_collision_disabled_by_default() {
        let mut world = World::new(0);
        world.now_ms = SPAWN_GRACE_MS + 1;
        let mut index = SpatialIndex::default();

        // A hairpin worm whose head touches its own body
        let (a, _) = add_worm(&mut world, 1, Vec2::new(2500.0, 2500.0), 0.0);
        {
            let worm = world.worms.get_mut(&a).unwrap();
            worm.grow(60.0);
            worm.set_target_direction(std::f32::consts::PI);
            for _ in 0..240 {
                worm.step(1.0 / 60.0);
            }
        }
        rebuild(&mut world, &mut index);

        resolve(&mut world, &mut index, false);
        assert!(world.worms[&a].alive);
    }

    #[test]
    fn test_self_collision_flag_enables_neck_skipped_test() {
        let mut world = World::new(0);
        world.now_ms = SPAWN_GRACE_MS + 1;
        let mut index = SpatialIndex::default();

        // Drive the worm in a tight circle until its head rides on its own
        // trail, well beyond the skipped neck segments
        let (a, _) = add_worm(&mut world, 1, Vec2::new(2500.0, 2500.0), 0.0);
        {
            let worm = world.worms.get_mut(&a).unwrap();
            worm.grow(60.0);
            for _ in 0..100 {
                let ahead = worm.direction + 1.0;
                worm.set_target_direction(ahead);
                worm.step(1.0 / 60.0);
            }
        }
        rebuild(&mut world, &mut index);

        let events = resolve(&mut world, &mut index, true);
        assert!(!world.worms[&a].alive);
        assert!(events.iter().any(|e| matches!(
            e,
            GameEvent::WormKilled { victim_worm, killer_worm, .. }
                if *victim_worm == a && *killer_worm == a
        )));
    }

    #[test]
    fn test_direct_food_hit() {
        let mut world = World::new(0);
        world.now_ms = SPAWN_GRACE_MS + 1;
        let mut index = SpatialIndex::default();

        let (a, player) = add_worm(&mut world, 1, Vec2::new(2500.0, 2500.0), 0.0);
        let food = Food::new(7, Vec2::new(2510.0, 2500.0), 5.0, "#ffb400".to_string());
        index.add_food(7, food.position);
        world.food.insert(7, food);
        rebuild(&mut world, &mut index);

        let before_len = world.worms[&a].length;
        let events = resolve(&mut world, &mut index, false);

        assert!(world.food.is_empty());
        assert_eq!(world.worms[&a].length, before_len + 2.0);
        let player_score = world.players[&player].score;
        assert_eq!(player_score, 2 * POINTS_PER_FOOD);
        assert!(events
            .iter()
            .any(|e| matches!(e, GameEvent::FoodConsumed { food_id: 7, .. })));
    }

    #[test]
    fn test_swept_hit_catches_tunneling() {
        let mut world = World::new(0);
        world.now_ms = SPAWN_GRACE_MS + 1;
        let mut index = SpatialIndex::default();

        let (a, _) = add_worm(&mut world, 1, Vec2::new(2560.0, 2500.0), 0.0);
        {
            // Head jumped 60 units this tick; pellet sits mid-traversal
            let worm = world.worms.get_mut(&a).unwrap();
            worm.prev_tick_head = Vec2::new(2500.0, 2500.0);
        }
        let food = Food::new(9, Vec2::new(2530.0, 2502.0), 5.0, "#ffb400".to_string());
        index.add_food(9, food.position);
        world.food.insert(9, food);
        rebuild(&mut world, &mut index);

        let events = resolve(&mut world, &mut index, false);
        assert!(world.food.is_empty(), "pellet must be consumed by the swept test");
        assert!(events
            .iter()
            .any(|e| matches!(e, GameEvent::FoodConsumed { food_id: 9, .. })));
    }

    #[test]
    fn test_food_consumed_at_most_once() {
        let mut world = World::new(0);
        world.now_ms = SPAWN_GRACE_MS + 1;
        let mut index = SpatialIndex::default();

        // Two heads share one pellet; exactly one event may name it. The
        // worms are separated vertically so neither body kills the other.
        add_worm(&mut world, 1, Vec2::new(2505.0, 2500.0), 0.0);
        add_worm(&mut world, 2, Vec2::new(2495.0, 2530.0), 0.0);
        let food = Food::new(3, Vec2::new(2500.0, 2515.0), 8.0, "#ffb400".to_string());
        index.add_food(3, food.position);
        world.food.insert(3, food);
        rebuild(&mut world, &mut index);

        let events = resolve(&mut world, &mut index, false);
        let eat_count = events
            .iter()
            .filter(|e| matches!(e, GameEvent::FoodConsumed { food_id: 3, .. }))
            .count();
        assert_eq!(eat_count, 1);
        assert!(index.food_in_radius(Vec2::new(2500.0, 2500.0), 50.0).is_empty());
    }

    #[test]
    fn test_distant_food_untouched() {
        let mut world = World::new(0);
        world.now_ms = SPAWN_GRACE_MS + 1;
        let mut index = SpatialIndex::default();

        add_worm(&mut world, 1, Vec2::new(2500.0, 2500.0), 0.0);
        let food = Food::new(5, Vec2::new(2600.0, 2500.0), 5.0, "#ffb400".to_string());
        index.add_food(5, food.position);
        world.food.insert(5, food);
        rebuild(&mut world, &mut index);

        let events = resolve(&mut world, &mut index, false);
        assert!(events.is_empty());
        assert!(world.food.contains_key(&5));
    }
}
