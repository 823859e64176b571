//! Food pellets: ambient spawns plus loot converted from dead worms.

use rand::Rng;

use crate::game::constants::food::{
    LOOT_RADIUS_BONUS_MAX, LOOT_RADIUS_BONUS_MIN, MAX_RADIUS, MIN_RADIUS,
};
use crate::game::constants::COLOR_PALETTE;
use crate::util::vec2::Vec2;

/// Food identifier, allocated monotonically by the world
pub type FoodId = u64;

#[derive(Debug, Clone)]
pub struct Food {
    pub id: FoodId,
    pub position: Vec2,
    /// Points granted on consumption (also the growth delta)
    pub value: u32,
    /// Visual and collision radius
    pub radius: f32,
    pub color: String,
    /// Set the moment a worm eats it; removed at the end of the tick
    pub consumed: bool,
}

impl Food {
    pub fn new(id: FoodId, position: Vec2, radius: f32, color: String) -> Self {
        Self {
            id,
            position,
            value: value_for_radius(radius),
            radius,
            color,
            consumed: false,
        }
    }

    /// Ambient pellet with a palette color and a radius in the base range
    pub fn ambient<R: Rng>(id: FoodId, position: Vec2, rng: &mut R) -> Self {
        let radius = rng.gen_range(MIN_RADIUS..=MAX_RADIUS);
        Self::new(id, position, radius, random_color(rng))
    }

    /// Loot pellet dropped along a dead worm's body; fatter than ambient food
    pub fn loot<R: Rng>(id: FoodId, position: Vec2, rng: &mut R) -> Self {
        let radius =
            rng.gen_range(MIN_RADIUS + LOOT_RADIUS_BONUS_MIN..=MAX_RADIUS + LOOT_RADIUS_BONUS_MAX);
        Self::new(id, position, radius, random_color(rng))
    }
}

/// Pellet worth scales with its size
#[inline]
pub fn value_for_radius(radius: f32) -> u32 {
    ((radius * 0.5).floor() as u32).max(1)
}

pub fn random_color<R: Rng>(rng: &mut R) -> String {
    COLOR_PALETTE[rng.gen_range(0..COLOR_PALETTE.len())].to_string()
}
