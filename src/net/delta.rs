//! Delta compression between per-client snapshots.
//!
//! Only changed fields travel. Worm trails are the expensive part: a path is
//! resent only when the client has never received one or the head jumped
//! farther than a client-side reconstruction can follow; otherwise the
//! client extends the trail locally from head movement.

use std::collections::HashMap;

use crate::game::constants::net::{FOOD_POSITION_EPSILON, TELEPORT_DIST};
use crate::game::food::FoodId;
use crate::game::worm::WormId;
use crate::net::protocol::{
    DeltaUpdate, FoodPositionDelta, FoodSnapshot, GameSnapshot, WormDelta, WormSnapshot,
};

/// Diff two snapshots of the same player's view. Returns `None` when there
/// is nothing to send this interval.
pub fn diff(base: &GameSnapshot, current: &GameSnapshot) -> Option<DeltaUpdate> {
    let base_worms: HashMap<WormId, &WormSnapshot> =
        base.worms.iter().map(|w| (w.id, w)).collect();
    let current_worm_ids: Vec<WormId> = current.worms.iter().map(|w| w.id).collect();

    let mut worms_added = Vec::new();
    let mut worms_updated = Vec::new();
    for worm in &current.worms {
        match base_worms.get(&worm.id) {
            Some(base_worm) => {
                if let Some(delta) = diff_worm(base_worm, worm) {
                    worms_updated.push(delta);
                }
            }
            None => worms_added.push(worm.clone()),
        }
    }
    let worms_removed: Vec<WormId> = base
        .worms
        .iter()
        .map(|w| w.id)
        .filter(|id| !current_worm_ids.contains(id))
        .collect();

    let base_food: HashMap<FoodId, &FoodSnapshot> =
        base.food.iter().map(|f| (f.id, f)).collect();
    let current_food_ids: Vec<FoodId> = current.food.iter().map(|f| f.id).collect();

    let mut food_added = Vec::new();
    let mut food_updated = Vec::new();
    for food in &current.food {
        match base_food.get(&food.id) {
            Some(base_item) => {
                // The magnet is the only thing that moves pellets
                if base_item.position.distance_to(food.position) > FOOD_POSITION_EPSILON {
                    food_updated.push(FoodPositionDelta {
                        id: food.id,
                        position: food.position,
                    });
                }
            }
            None => food_added.push(food.clone()),
        }
    }
    let food_removed: Vec<FoodId> = base
        .food
        .iter()
        .map(|f| f.id)
        .filter(|id| !current_food_ids.contains(id))
        .collect();

    let leaderboard = (current.leaderboard != base.leaderboard)
        .then(|| current.leaderboard.clone());

    if worms_added.is_empty()
        && worms_updated.is_empty()
        && worms_removed.is_empty()
        && food_added.is_empty()
        && food_updated.is_empty()
        && food_removed.is_empty()
        && leaderboard.is_none()
    {
        return None;
    }

    Some(DeltaUpdate {
        tick: current.tick,
        worms_added,
        worms_updated,
        worms_removed,
        food_added,
        food_updated,
        food_removed,
        leaderboard,
    })
}

fn diff_worm(base: &WormSnapshot, current: &WormSnapshot) -> Option<WormDelta> {
    let mut delta = WormDelta {
        id: current.id,
        head: None,
        direction: None,
        length: None,
        score: None,
        path: None,
    };

    if current.head != base.head {
        delta.head = Some(current.head);
    }
    if current.direction != base.direction {
        delta.direction = Some(current.direction);
    }
    if current.length != base.length {
        delta.length = Some(current.length);
    }
    if current.score != base.score {
        delta.score = Some(current.score);
    }

    // Resend the trail only when the client cannot rebuild it
    let teleported = current.head.distance_to(base.head) > TELEPORT_DIST;
    if base.path.is_none() || teleported {
        delta.path = current.path.clone();
    }

    if delta.is_empty() {
        None
    } else {
        Some(delta)
    }
}

/// Apply a delta to a cached snapshot, producing the client's new view.
/// The server keeps its per-client cache in sync with exactly this function.
pub fn apply(base: &GameSnapshot, delta: &DeltaUpdate) -> GameSnapshot {
    let mut worms: Vec<WormSnapshot> = base
        .worms
        .iter()
        .filter(|w| !delta.worms_removed.contains(&w.id))
        .cloned()
        .collect();

    for update in &delta.worms_updated {
        if let Some(worm) = worms.iter_mut().find(|w| w.id == update.id) {
            if let Some(head) = update.head {
                worm.head = head;
            }
            if let Some(direction) = update.direction {
                worm.direction = direction;
            }
            if let Some(length) = update.length {
                worm.length = length;
            }
            if let Some(score) = update.score {
                worm.score = score;
            }
            if let Some(path) = &update.path {
                worm.path = Some(path.clone());
            }
        }
    }
    for added in &delta.worms_added {
        worms.retain(|w| w.id != added.id);
        worms.push(added.clone());
    }
    worms.sort_by_key(|w| w.id);

    let mut food: Vec<FoodSnapshot> = base
        .food
        .iter()
        .filter(|f| !delta.food_removed.contains(&f.id))
        .cloned()
        .collect();
    for update in &delta.food_updated {
        if let Some(item) = food.iter_mut().find(|f| f.id == update.id) {
            item.position = update.position;
        }
    }
    for added in &delta.food_added {
        food.retain(|f| f.id != added.id);
        food.push(added.clone());
    }
    food.sort_by_key(|f| f.id);

    GameSnapshot {
        tick: delta.tick,
        world_size: base.world_size,
        worms,
        food,
        leaderboard: delta
            .leaderboard
            .clone()
            .unwrap_or_else(|| base.leaderboard.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::systems::score::LeaderboardEntry;
    use crate::util::vec2::Vec2;
    use uuid::Uuid;

    fn worm(id: WormId, head: Vec2, with_path: bool) -> WormSnapshot {
        WormSnapshot {
            id,
            player_id: Uuid::nil(),
            head,
            direction: 0.0,
            length: 10.0,
            color: "#ff5e5b".to_string(),
            skin_id: 0,
            is_boosting: false,
            score: 0,
            name: format!("w{id}"),
            path: with_path.then(|| vec![head - Vec2::new(15.0, 0.0), head]),
        }
    }

    fn food(id: FoodId, position: Vec2) -> FoodSnapshot {
        FoodSnapshot {
            id,
            position,
            value: 2,
            radius: 5.0,
            color: "#ffb400".to_string(),
        }
    }

    fn snapshot(tick: u64, worms: Vec<WormSnapshot>, food: Vec<FoodSnapshot>) -> GameSnapshot {
        GameSnapshot {
            tick,
            world_size: (5000.0, 5000.0),
            worms,
            food,
            leaderboard: vec![],
        }
    }

    #[test]
    fn test_identical_snapshots_yield_none() {
        let snap = snapshot(1, vec![worm(1, Vec2::new(100.0, 100.0), true)], vec![]);
        assert!(diff(&snap, &snap).is_none());
    }

    #[test]
    fn test_normal_movement_omits_path() {
        // Scenario: one tick's travel at normal speed
        let base = snapshot(1, vec![worm(1, Vec2::new(100.0, 100.0), true)], vec![]);
        let current = snapshot(2, vec![worm(1, Vec2::new(102.5, 100.0), true)], vec![]);

        let delta = diff(&base, &current).unwrap();
        assert_eq!(delta.worms_updated.len(), 1);
        let update = &delta.worms_updated[0];
        assert!(update.head.is_some());
        assert!(update.path.is_none(), "path must not be resent for normal movement");
    }

    #[test]
    fn test_teleport_resends_path() {
        let base = snapshot(1, vec![worm(1, Vec2::new(100.0, 100.0), true)], vec![]);
        let current = snapshot(2, vec![worm(1, Vec2::new(600.0, 100.0), true)], vec![]);

        let delta = diff(&base, &current).unwrap();
        let update = &delta.worms_updated[0];
        assert!(update.path.is_some(), "a 500-unit jump must carry the path");
    }

    #[test]
    fn test_missing_base_path_resends_path() {
        let base = snapshot(1, vec![worm(1, Vec2::new(100.0, 100.0), false)], vec![]);
        let current = snapshot(2, vec![worm(1, Vec2::new(102.5, 100.0), true)], vec![]);

        let delta = diff(&base, &current).unwrap();
        assert!(delta.worms_updated[0].path.is_some());
    }

    #[test]
    fn test_unchanged_fields_absent() {
        let base = snapshot(1, vec![worm(1, Vec2::new(100.0, 100.0), true)], vec![]);
        let mut moved = worm(1, Vec2::new(102.5, 100.0), true);
        moved.score = 10;
        let current = snapshot(2, vec![moved], vec![]);

        let update = &diff(&base, &current).unwrap().worms_updated[0];
        assert!(update.head.is_some());
        assert!(update.score.is_some());
        assert!(update.direction.is_none());
        assert!(update.length.is_none());
    }

    #[test]
    fn test_worm_added_and_removed() {
        let base = snapshot(1, vec![worm(1, Vec2::new(100.0, 100.0), true)], vec![]);
        let current = snapshot(2, vec![worm(2, Vec2::new(200.0, 200.0), true)], vec![]);

        let delta = diff(&base, &current).unwrap();
        assert_eq!(delta.worms_added.len(), 1);
        assert_eq!(delta.worms_added[0].id, 2);
        assert!(delta.worms_added[0].path.is_some());
        assert_eq!(delta.worms_removed, vec![1]);
    }

    #[test]
    fn test_food_position_epsilon() {
        let base = snapshot(1, vec![], vec![food(1, Vec2::new(50.0, 50.0))]);

        // Sub-epsilon drift is suppressed
        let current = snapshot(2, vec![], vec![food(1, Vec2::new(50.05, 50.0))]);
        assert!(diff(&base, &current).is_none());

        // Magnet-scale movement is sent
        let current = snapshot(2, vec![], vec![food(1, Vec2::new(51.0, 50.0))]);
        let delta = diff(&base, &current).unwrap();
        assert_eq!(delta.food_updated.len(), 1);
    }

    #[test]
    fn test_food_added_removed() {
        let base = snapshot(1, vec![], vec![food(1, Vec2::new(50.0, 50.0))]);
        let current = snapshot(2, vec![], vec![food(2, Vec2::new(60.0, 60.0))]);

        let delta = diff(&base, &current).unwrap();
        assert_eq!(delta.food_added.len(), 1);
        assert_eq!(delta.food_removed, vec![1]);
    }

    #[test]
    fn test_leaderboard_only_when_changed() {
        let mut base = snapshot(1, vec![], vec![food(1, Vec2::new(50.0, 50.0))]);
        base.leaderboard = vec![LeaderboardEntry {
            rank: 1,
            name: "a".to_string(),
            score: 5,
        }];

        let mut current = base.clone();
        current.tick = 2;
        current.food[0].position = Vec2::new(60.0, 50.0);
        let delta = diff(&base, &current).unwrap();
        assert!(delta.leaderboard.is_none());

        current.leaderboard[0].score = 6;
        let delta = diff(&base, &current).unwrap();
        assert_eq!(delta.leaderboard.as_ref().unwrap()[0].score, 6);
    }

    #[test]
    fn test_apply_round_trips_tracked_fields() {
        // P7: applying the delta to the cached snapshot reproduces the
        // server's snapshot for every field the delta carries
        let base = snapshot(
            1,
            vec![worm(1, Vec2::new(100.0, 100.0), true), worm(2, Vec2::new(300.0, 300.0), true)],
            vec![food(1, Vec2::new(50.0, 50.0)), food(2, Vec2::new(80.0, 80.0))],
        );

        let mut current = snapshot(
            2,
            vec![worm(1, Vec2::new(104.0, 100.0), true), worm(3, Vec2::new(400.0, 400.0), true)],
            vec![food(2, Vec2::new(82.0, 80.0)), food(3, Vec2::new(90.0, 90.0))],
        );
        current.worms[0].score = 12;
        current.leaderboard = vec![LeaderboardEntry {
            rank: 1,
            name: "w1".to_string(),
            score: 12,
        }];

        let delta = diff(&base, &current).unwrap();
        let mut applied = apply(&base, &delta);

        // Worm 1's path was not resent by design; the client reconstructs
        // it. Align paths before the bit-equality check.
        for worm in applied.worms.iter_mut() {
            if let Some(current_worm) = current.worms.iter().find(|w| w.id == worm.id) {
                worm.path = current_worm.path.clone();
            }
        }
        assert_eq!(applied, current);
    }

    #[test]
    fn test_apply_after_teleport_is_bit_equal() {
        let base = snapshot(1, vec![worm(1, Vec2::new(100.0, 100.0), true)], vec![]);
        let mut moved = worm(1, Vec2::new(600.0, 100.0), true);
        moved.direction = 0.5;
        let current = snapshot(2, vec![moved], vec![]);

        let delta = diff(&base, &current).unwrap();
        let applied = apply(&base, &delta);
        // Teleport carried the path, so nothing needs reconstruction
        assert_eq!(applied, current);
    }
}
