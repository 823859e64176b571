//! Authoritative world state: worms, food, and players for one room.
//!
//! Entities cross-reference each other by id only (Player -> Worm and
//! Worm -> Player both go through the maps), so removal order never dangles.
//! Worm and food maps are ordered so per-tick iteration is deterministic.

use std::collections::{BTreeMap, HashMap};
use std::f32::consts::TAU;

use rand::Rng;
use uuid::Uuid;

use crate::game::constants::arena::{
    FOOD_SPAWN_MARGIN, MAP_RADIUS, MAX_SPAWN_ATTEMPTS, SAFE_SPAWN_DISTANCE, WORLD_HEIGHT,
    WORLD_WIDTH,
};
use crate::game::constants::worm::BASE_SPEED;
use crate::game::constants::COLOR_PALETTE;
use crate::game::food::{Food, FoodId};
use crate::game::worm::{Worm, WormId};
use crate::util::vec2::Vec2;

pub type PlayerId = Uuid;

/// A connected player; its worm is a separate lifetime
#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    /// Opaque transport session handle
    pub socket_id: String,
    pub name: String,
    pub score: u64,
    pub worm_id: Option<WormId>,
    pub last_input_ms: u64,
    pub connected: bool,
}

impl Player {
    pub fn new(id: PlayerId, socket_id: String, name: String) -> Self {
        Self {
            id,
            socket_id,
            name,
            score: 0,
            worm_id: None,
            last_input_ms: 0,
            connected: true,
        }
    }
}

pub struct World {
    pub worms: BTreeMap<WormId, Worm>,
    pub food: BTreeMap<FoodId, Food>,
    pub players: HashMap<PlayerId, Player>,
    pub world_size: (f32, f32),
    /// Monotonic tick counter, incremented at the end of each tick
    pub tick: u64,
    pub start_time_ms: u64,
    /// Simulation clock, advanced by the tick loop
    pub now_ms: u64,
    next_worm_id: WormId,
    next_food_id: FoodId,
}

impl World {
    pub fn new(start_time_ms: u64) -> Self {
        Self {
            worms: BTreeMap::new(),
            food: BTreeMap::new(),
            players: HashMap::new(),
            world_size: (WORLD_WIDTH, WORLD_HEIGHT),
            tick: 0,
            start_time_ms,
            now_ms: start_time_ms,
            next_worm_id: 1,
            next_food_id: 1,
        }
    }

    /// Center of the circular playfield
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.world_size.0 / 2.0, self.world_size.1 / 2.0)
    }

    pub fn map_radius(&self) -> f32 {
        self.world_size.0 / 2.0
    }

    pub fn alloc_food_id(&mut self) -> FoodId {
        let id = self.next_food_id;
        self.next_food_id += 1;
        id
    }

    pub fn add_player(&mut self, player: Player) {
        self.players.insert(player.id, player);
    }

    /// Remove a player and its worm, if any. Returns the removed worm id.
    pub fn remove_player(&mut self, player_id: PlayerId) -> Option<WormId> {
        let player = self.players.remove(&player_id)?;
        if let Some(worm_id) = player.worm_id {
            self.worms.remove(&worm_id);
            return Some(worm_id);
        }
        None
    }

    pub fn get_player(&self, player_id: PlayerId) -> Option<&Player> {
        self.players.get(&player_id)
    }

    pub fn get_player_mut(&mut self, player_id: PlayerId) -> Option<&mut Player> {
        self.players.get_mut(&player_id)
    }

    /// Spawn a worm for a player at a safe position, replacing any previous
    /// worm the player still had
    pub fn spawn_worm<R: Rng>(
        &mut self,
        player_id: PlayerId,
        name: String,
        skin_id: u8,
        rng: &mut R,
    ) -> Option<WormId> {
        if !self.players.contains_key(&player_id) {
            return None;
        }

        let origin = self.find_safe_spawn_position(rng);
        let direction = rng.gen_range(-std::f32::consts::PI..=std::f32::consts::PI);
        let color = COLOR_PALETTE[rng.gen_range(0..COLOR_PALETTE.len())].to_string();

        let id = self.next_worm_id;
        self.next_worm_id += 1;
        let worm = Worm::new(
            id,
            player_id,
            name,
            origin,
            direction,
            color,
            skin_id,
            self.now_ms,
            BASE_SPEED,
        );
        self.worms.insert(id, worm);

        if let Some(player) = self.players.get_mut(&player_id) {
            if let Some(old) = player.worm_id.replace(id) {
                self.worms.remove(&old);
            }
        }
        Some(id)
    }

    /// Insert a pre-built worm, linking the owning player. Used for respawn
    /// placement decided elsewhere and by scenario tests.
    pub fn insert_worm(&mut self, worm: Worm) -> WormId {
        let id = worm.id;
        self.next_worm_id = self.next_worm_id.max(id + 1);
        if let Some(player) = self.players.get_mut(&worm.player_id) {
            if let Some(old) = player.worm_id.replace(id) {
                if old != id {
                    self.worms.remove(&old);
                }
            }
        }
        self.worms.insert(id, worm);
        id
    }

    /// Remove a worm and clear the owning player's reference to it
    pub fn remove_worm(&mut self, worm_id: WormId) -> Option<Worm> {
        let worm = self.worms.remove(&worm_id)?;
        if let Some(player) = self.players.get_mut(&worm.player_id) {
            if player.worm_id == Some(worm_id) {
                player.worm_id = None;
            }
        }
        Some(worm)
    }

    pub fn living_worm_count(&self) -> usize {
        self.worms.values().filter(|w| w.alive).count()
    }

    /// Uniform position over the playfield disk, `margin` inside the rim
    pub fn random_disk_position<R: Rng>(&self, rng: &mut R, margin: f32) -> Vec2 {
        let radius = (self.map_radius() - margin).max(0.0);
        let r = radius * rng.gen::<f32>().sqrt();
        let theta = rng.gen_range(0.0..TAU);
        self.center() + Vec2::new(r * theta.cos(), r * theta.sin())
    }

    /// Disk position at least SAFE_SPAWN_DISTANCE from every living worm,
    /// checking heads and every 10th trail point. Falls back to any disk
    /// position after MAX_SPAWN_ATTEMPTS rejections.
    pub fn find_safe_spawn_position<R: Rng>(&self, rng: &mut R) -> Vec2 {
        for _ in 0..MAX_SPAWN_ATTEMPTS {
            let candidate = self.random_disk_position(rng, MAP_RADIUS * 0.1);
            if self.is_spawn_position_safe(candidate) {
                return candidate;
            }
        }
        self.random_disk_position(rng, MAP_RADIUS * 0.1)
    }

    fn is_spawn_position_safe(&self, candidate: Vec2) -> bool {
        let safe_sq = SAFE_SPAWN_DISTANCE * SAFE_SPAWN_DISTANCE;
        for worm in self.worms.values().filter(|w| w.alive) {
            if worm.head.distance_sq_to(candidate) < safe_sq {
                return false;
            }
            for point in worm.path().iter().step_by(10) {
                if point.distance_sq_to(candidate) < safe_sq {
                    return false;
                }
            }
        }
        true
    }

    /// Uniform food position, rejecting spots near living worm heads
    pub fn random_food_position<R: Rng>(&self, rng: &mut R) -> Vec2 {
        let safe_sq = SAFE_SPAWN_DISTANCE * SAFE_SPAWN_DISTANCE;
        for _ in 0..MAX_SPAWN_ATTEMPTS {
            let candidate = self.random_disk_position(rng, FOOD_SPAWN_MARGIN);
            let clear = self
                .worms
                .values()
                .filter(|w| w.alive)
                .all(|w| w.head.distance_sq_to(candidate) >= safe_sq);
            if clear {
                return candidate;
            }
        }
        self.random_disk_position(rng, FOOD_SPAWN_MARGIN)
    }
}
