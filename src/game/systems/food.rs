//! Food subsystem: converts dead worms into loot, pulls nearby pellets
//! toward worm heads, and respawns pellets up to the target density.
//!
//! Runs after collision. Worms that died on an earlier tick are converted
//! and removed here, one tick after death, so clients see the corpse before
//! the loot appears.

use rand::Rng;

use crate::game::constants::food::{
    LOOT_LENGTH_DIVISOR, MAGNET_RADIUS, MAGNET_SPEED_MAX, MAGNET_SPEED_MIN,
};
use crate::game::food::Food;
use crate::game::spatial::SpatialIndex;
use crate::game::state::World;
use crate::game::worm::WormId;
use crate::util::vec2::Vec2;

pub fn update<R: Rng>(
    world: &mut World,
    index: &mut SpatialIndex,
    rng: &mut R,
    dt: f32,
    food_target: usize,
    respawn_per_tick: usize,
) {
    convert_dead_worms(world, index, rng);
    apply_magnet(world, index, dt);
    respawn(world, index, rng, food_target, respawn_per_tick);
}

/// Spawn loot along each unprocessed dead worm's body and drop the worm
fn convert_dead_worms<R: Rng>(world: &mut World, index: &mut SpatialIndex, rng: &mut R) {
    let current_tick = world.tick;
    let ready: Vec<WormId> = world
        .worms
        .values()
        .filter(|w| !w.alive && w.died_at_tick.map_or(true, |t| t < current_tick))
        .map(|w| w.id)
        .collect();

    for worm_id in ready {
        let Some(mut worm) = world.remove_worm(worm_id) else {
            continue;
        };
        let segments = worm.segments().to_vec();
        let count = ((worm.length / LOOT_LENGTH_DIVISOR).floor() as usize).max(1);

        for i in 0..count {
            let anchor = segments[(i * segments.len()) / count].center;
            let jitter = Vec2::new(rng.gen_range(-5.0..=5.0), rng.gen_range(-5.0..=5.0));
            let position = anchor + jitter;
            let food_id = world.alloc_food_id();
            let food = Food::loot(food_id, position, rng);
            index.add_food(food_id, position);
            world.food.insert(food_id, food);
        }
    }
}

/// Pull pellets within the magnet radius toward each living head with a
/// quadratic ease-in; the magnet only moves food, it never consumes
fn apply_magnet(world: &mut World, index: &mut SpatialIndex, dt: f32) {
    let heads: Vec<Vec2> = world
        .worms
        .values()
        .filter(|w| w.alive)
        .map(|w| w.head)
        .collect();

    for head in heads {
        for food_id in index.food_in_radius(head, MAGNET_RADIUS) {
            let Some(food) = world.food.get_mut(&food_id) else {
                continue;
            };
            let offset = head - food.position;
            let dist = offset.length();
            if dist >= MAGNET_RADIUS || dist <= f32::EPSILON {
                continue;
            }

            let ease = 1.0 - dist / MAGNET_RADIUS;
            let speed = MAGNET_SPEED_MIN + (MAGNET_SPEED_MAX - MAGNET_SPEED_MIN) * ease * ease;
            let step = (speed * dt).min(dist);

            let old_position = food.position;
            food.position += offset.normalize() * step;
            let new_position = food.position;
            index.move_food(food_id, old_position, new_position);
        }
    }
}

/// Top the pellet population back up toward the target density
fn respawn<R: Rng>(
    world: &mut World,
    index: &mut SpatialIndex,
    rng: &mut R,
    food_target: usize,
    respawn_per_tick: usize,
) {
    let mut spawned = 0;
    while world.food.len() < food_target && spawned < respawn_per_tick {
        let position = world.random_food_position(rng);
        let food_id = world.alloc_food_id();
        let food = Food::ambient(food_id, position, rng);
        index.add_food(food_id, position);
        world.food.insert(food_id, food);
        spawned += 1;
    }
}
