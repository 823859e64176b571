//! Cell-hash spatial index over the arena.
//!
//! Two parallel grids share the cell geometry: the worm grid is rebuilt from
//! sampled segments every tick, while the food grid is long-lived and
//! maintained incrementally (add/remove/move). Heads then collide against
//! local density instead of every body in the world.

use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::game::constants::spatial::CELL_SIZE;
use crate::game::food::FoodId;
use crate::game::worm::{Segment, WormId};
use crate::util::vec2::Vec2;

/// Grid cell key - (x, y) cell coordinates
pub type CellKey = (i32, i32);

const WORM_GRID_INITIAL_CAPACITY: usize = 256;
const FOOD_GRID_INITIAL_CAPACITY: usize = 512;
const CELL_INITIAL_CAPACITY: usize = 8;

pub struct SpatialIndex {
    cell_size: f32,
    /// Inverse cell size for fast position-to-cell conversion
    inv_cell_size: f32,
    /// Rebuilt every tick from living worms' segments
    worm_cells: HashMap<CellKey, Vec<WormId>>,
    /// Maintained incrementally; food is long-lived
    food_cells: HashMap<CellKey, Vec<FoodId>>,
}

impl SpatialIndex {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size,
            inv_cell_size: 1.0 / cell_size,
            worm_cells: HashMap::with_capacity(WORM_GRID_INITIAL_CAPACITY),
            food_cells: HashMap::with_capacity(FOOD_GRID_INITIAL_CAPACITY),
        }
    }

    /// Floor division keeps negative coordinates in distinct cells
    #[inline]
    pub fn cell_for(&self, position: Vec2) -> CellKey {
        (
            (position.x * self.inv_cell_size).floor() as i32,
            (position.y * self.inv_cell_size).floor() as i32,
        )
    }

    /// Drop all worm entries ahead of a per-tick rebuild
    pub fn clear_worms(&mut self) {
        for cell in self.worm_cells.values_mut() {
            cell.clear();
        }
    }

    /// Insert one worm's sampled segments into every cell they touch
    pub fn insert_worm_segments(&mut self, id: WormId, segments: &[Segment]) {
        for segment in segments {
            let key = self.cell_for(segment.center);
            let cell = self
                .worm_cells
                .entry(key)
                .or_insert_with(|| Vec::with_capacity(CELL_INITIAL_CAPACITY));
            if !cell.contains(&id) {
                cell.push(id);
            }
        }
    }

    /// Clear the worm grid and reinsert every living worm's sampled segments
    pub fn rebuild_worms<'a>(&mut self, worms: impl Iterator<Item = (WormId, &'a [Segment])>) {
        self.clear_worms();
        for (id, segments) in worms {
            self.insert_worm_segments(id, segments);
        }
    }

    /// Worm IDs in the 3x3 block of cells around `center`
    pub fn nearby_worms(&self, center: Vec2) -> SmallVec<[WormId; 8]> {
        let (cx, cy) = self.cell_for(center);
        let mut out: SmallVec<[WormId; 8]> = SmallVec::new();
        for dx in -1..=1 {
            for dy in -1..=1 {
                if let Some(cell) = self.worm_cells.get(&(cx + dx, cy + dy)) {
                    for &id in cell {
                        if !out.contains(&id) {
                            out.push(id);
                        }
                    }
                }
            }
        }
        out
    }

    /// Deduplicated worm IDs over the bounding square of (center, radius)
    pub fn worms_in_radius(&self, center: Vec2, radius: f32) -> Vec<WormId> {
        let mut out = self.collect_in_radius(&self.worm_cells, center, radius);
        out.sort_unstable();
        out.dedup();
        out
    }

    pub fn add_food(&mut self, id: FoodId, position: Vec2) {
        let key = self.cell_for(position);
        self.food_cells
            .entry(key)
            .or_insert_with(|| Vec::with_capacity(CELL_INITIAL_CAPACITY))
            .push(id);
    }

    /// Returns true if the entry was present. Removal is immediate: the item
    /// is invisible to every later query in the same tick.
    pub fn remove_food(&mut self, id: FoodId, position: Vec2) -> bool {
        let key = self.cell_for(position);
        if let Some(cell) = self.food_cells.get_mut(&key) {
            if let Some(idx) = cell.iter().position(|&f| f == id) {
                cell.swap_remove(idx);
                return true;
            }
        }
        false
    }

    /// Re-bucket a pellet the magnet dragged across a cell boundary
    pub fn move_food(&mut self, id: FoodId, old_position: Vec2, new_position: Vec2) {
        let old_key = self.cell_for(old_position);
        let new_key = self.cell_for(new_position);
        if old_key == new_key {
            return;
        }
        self.remove_food(id, old_position);
        self.add_food(id, new_position);
    }

    pub fn food_in_radius(&self, center: Vec2, radius: f32) -> Vec<FoodId> {
        let mut out = self.collect_in_radius(&self.food_cells, center, radius);
        out.sort_unstable();
        out.dedup();
        out
    }

    fn collect_in_radius(
        &self,
        cells: &HashMap<CellKey, Vec<u64>>,
        center: Vec2,
        radius: f32,
    ) -> Vec<u64> {
        let min = self.cell_for(center - Vec2::new(radius, radius));
        let max = self.cell_for(center + Vec2::new(radius, radius));
        let mut out = Vec::new();
        for cx in min.0..=max.0 {
            for cy in min.1..=max.1 {
                if let Some(cell) = cells.get(&(cx, cy)) {
                    out.extend_from_slice(cell);
                }
            }
        }
        out
    }

    pub fn food_count(&self) -> usize {
        self.food_cells.values().map(|c| c.len()).sum()
    }
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new(CELL_SIZE)
    }
}
