//! Per-tick worm advancement and the circular world boundary.
//!
//! No collision resolution happens here; a head past the rim simply dies.

use crate::game::events::GameEvent;
use crate::game::state::World;

/// Step every living worm and kill the ones whose head left the playfield
pub fn update(world: &mut World, dt: f32) -> Vec<GameEvent> {
    let mut events = Vec::new();
    let center = world.center();
    let map_radius = world.map_radius();
    let radius_sq = map_radius * map_radius;
    let tick = world.tick;

    for worm in world.worms.values_mut() {
        if !worm.alive {
            continue;
        }
        worm.step(dt);

        // No wrap-around: crossing the rim is fatal
        if worm.head.distance_sq_to(center) > radius_sq {
            worm.die();
            worm.died_at_tick = Some(tick);
            events.push(GameEvent::WormOutOfBounds {
                worm_id: worm.id,
                player_id: worm.player_id,
            });
        }
    }

    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::constants::worm::BASE_SPEED;
    use crate::game::state::Player;
    use crate::game::worm::Worm;
    use crate::util::vec2::Vec2;
    use uuid::Uuid;

    fn world_with_worm(origin: Vec2, direction: f32) -> (World, u64) {
        let mut world = World::new(0);
        let player_id = Uuid::new_v4();
        world.add_player(Player::new(player_id, "s".to_string(), "p".to_string()));
        let worm = Worm::new(
            1,
            player_id,
            "p".to_string(),
            origin,
            direction,
            "#ff5e5b".to_string(),
            0,
            0,
            BASE_SPEED,
        );
        let id = world.insert_worm(worm);
        (world, id)
    }

    #[test]
    fn test_living_worms_advance() {
        let (mut world, id) = world_with_worm(Vec2::new(2500.0, 2500.0), 0.0);
        let before = world.worms[&id].head;
        let events = update(&mut world, 1.0 / 60.0);
        assert!(events.is_empty());
        assert!(world.worms[&id].head.x > before.x);
    }

    #[test]
    fn test_dead_worms_do_not_advance() {
        let (mut world, id) = world_with_worm(Vec2::new(2500.0, 2500.0), 0.0);
        world.worms.get_mut(&id).unwrap().die();
        let before = world.worms[&id].head;
        update(&mut world, 1.0 / 60.0);
        assert_eq!(world.worms[&id].head, before);
    }

    #[test]
    fn test_boundary_kills() {
        // Heading straight at the rim from just inside it
        let (mut world, id) = world_with_worm(Vec2::new(4999.0, 2500.0), 0.0);
        let events = update(&mut world, 1.0 / 60.0);

        let worm = &world.worms[&id];
        assert!(!worm.alive);
        assert_eq!(worm.died_at_tick, Some(0));
        assert!(matches!(events[0], GameEvent::WormOutOfBounds { worm_id, .. } if worm_id == id));
    }

    #[test]
    fn test_boundary_death_is_not_alive_next_tick() {
        let (mut world, id) = world_with_worm(Vec2::new(4999.0, 2500.0), 0.0);
        update(&mut world, 1.0 / 60.0);
        world.tick += 1;
        update(&mut world, 1.0 / 60.0);
        assert!(!world.worms[&id].alive);
    }

    #[test]
    fn test_inside_rim_survives() {
        let (mut world, id) = world_with_worm(Vec2::new(2500.0, 2500.0), 0.0);
        for _ in 0..60 {
            update(&mut world, 1.0 / 60.0);
        }
        assert!(world.worms[&id].alive);
    }
}
