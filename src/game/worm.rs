//! Worm entity: a path-based trail piloted by a player.
//!
//! The trail is the worm's position history in world space, stored tail-first
//! in a bounded deque. Collision never looks at the raw path; it uses
//! equidistant samples (`segments`) cached on the worm and invalidated by any
//! mutation of the path or length.

use std::collections::VecDeque;

use uuid::Uuid;

use crate::game::constants::worm::{
    BOOST_BURN_PER_SEC, BOOST_MULT, HEAD_RADIUS_BONUS, INIT_LEN, MAX_LEN, MAX_TURN_PER_TICK,
    MIN_BOOST_LENGTH, PATH_MAX_POINTS, PATH_RES, SEG_RADIUS, SEG_SPACING, SPAWN_GRACE_MS,
    STEP_MAX,
};
use crate::util::geom::wrap_angle;
use crate::util::vec2::Vec2;

/// Worm identifier, allocated monotonically by the world
pub type WormId = u64;

/// One sampled collision circle along the trail
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub center: Vec2,
    pub radius: f32,
}

#[derive(Debug, Clone)]
pub struct Worm {
    pub id: WormId,
    pub player_id: Uuid,
    pub name: String,
    pub skin_id: u8,
    pub color: String,
    /// Authoritative head position; equals the latest path append or is at
    /// most PATH_RES ahead of it
    pub head: Vec2,
    /// Current heading, kept in (-PI, PI]
    pub direction: f32,
    /// Latest requested heading; each tick turns toward it under the clamp
    pub target_direction: f32,
    /// Base speed in units/second (doubled while boosting)
    pub speed: f32,
    pub is_boosting: bool,
    pub spawn_time_ms: u64,
    /// Real-valued segment count, INIT_LEN..=MAX_LEN
    pub length: f32,
    pub alive: bool,
    /// Tick the worm died on; loot conversion happens on a later tick
    pub died_at_tick: Option<u64>,
    /// Head position at the start of the current tick's step; the swept
    /// food test covers the full head traversal through this segment
    pub prev_tick_head: Vec2,
    /// Trail in tail -> head order
    path: VecDeque<Vec2>,
    /// Sample cache; None means dirty
    segments: Option<Vec<Segment>>,
    /// Deterministic boost mass-burn accumulator
    boost_debt: f32,
}

impl Worm {
    pub fn new(
        id: WormId,
        player_id: Uuid,
        name: String,
        origin: Vec2,
        direction: f32,
        color: String,
        skin_id: u8,
        spawn_time_ms: u64,
        base_speed: f32,
    ) -> Self {
        let direction = wrap_angle(direction);
        let back = Vec2::from_angle(direction) * -SEG_SPACING;
        let count = INIT_LEN as usize;
        let mut path = VecDeque::with_capacity(PATH_MAX_POINTS);
        for i in 0..count {
            // Straight line behind the head, tail first
            path.push_back(origin + back * (count - 1 - i) as f32);
        }

        Self {
            id,
            player_id,
            name,
            skin_id,
            color,
            head: origin,
            direction,
            target_direction: direction,
            speed: base_speed,
            is_boosting: false,
            spawn_time_ms,
            length: INIT_LEN,
            alive: true,
            died_at_tick: None,
            prev_tick_head: origin,
            path,
            segments: None,
            boost_debt: 0.0,
        }
    }

    pub fn set_target_direction(&mut self, theta: f32) {
        if theta.is_finite() {
            self.target_direction = wrap_angle(theta);
        }
    }

    /// Boost is only available above MIN_BOOST_LENGTH; at or below it the
    /// flag is force-cleared
    pub fn set_boosting(&mut self, boosting: bool) {
        self.is_boosting = boosting && self.length > MIN_BOOST_LENGTH;
    }

    pub fn head_radius(&self) -> f32 {
        SEG_RADIUS + HEAD_RADIUS_BONUS
    }

    pub fn age_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.spawn_time_ms)
    }

    /// Spawn-grace worms cannot be killed by rivals
    pub fn in_spawn_grace(&self, now_ms: u64) -> bool {
        self.age_ms(now_ms) < SPAWN_GRACE_MS
    }

    pub fn path(&self) -> &VecDeque<Vec2> {
        &self.path
    }

    /// Advance the worm by one tick. `dt` is in seconds. Never fails; a zero
    /// dt is a no-op apart from cache invalidation.
    pub fn step(&mut self, dt: f32) {
        self.prev_tick_head = self.head;
        let mut effective_speed = self.speed;

        if self.is_boosting {
            effective_speed *= BOOST_MULT;
            self.boost_debt += BOOST_BURN_PER_SEC * dt;
            while self.boost_debt >= 1.0 {
                self.length = (self.length - 1.0).max(MIN_BOOST_LENGTH);
                self.boost_debt -= 1.0;
            }
            if self.length <= MIN_BOOST_LENGTH {
                self.is_boosting = false;
            }
        }

        // Total angular correction for this tick, clamped
        let delta = wrap_angle(self.target_direction - self.direction)
            .clamp(-MAX_TURN_PER_TICK, MAX_TURN_PER_TICK);

        // Substep so fast or large-dt travel still bends smoothly
        let travel = effective_speed * dt;
        let substeps = (travel / STEP_MAX).ceil().max(1.0) as u32;
        let sub_travel = travel / substeps as f32;
        let sub_delta = delta / substeps as f32;

        for _ in 0..substeps {
            self.direction = wrap_angle(self.direction + sub_delta);
            self.head += Vec2::from_angle(self.direction) * sub_travel;

            let last = self.path.back().copied().unwrap_or(self.head);
            if self.head.distance_to(last) > PATH_RES {
                self.path.push_back(self.head);
                if self.path.len() > PATH_MAX_POINTS {
                    self.path.pop_front();
                }
            }
        }

        self.trim_tail();
        self.segments = None;
    }

    /// Drop trail from the tail end until total arc length fits the length
    /// budget; the final retained segment is truncated so the fit is exact.
    fn trim_tail(&mut self) {
        let budget = self.length * SEG_SPACING;
        let mut total = self.path_arc_length();

        while self.path.len() >= 2 && total > budget {
            let tail = self.path[0];
            let next = self.path[1];
            let seg = tail.distance_to(next);
            if total - seg >= budget {
                self.path.pop_front();
                total -= seg;
            } else {
                // Slide the tail point along its segment to land exactly on
                // the budget
                let excess = total - budget;
                if seg > f32::EPSILON {
                    self.path[0] = tail.lerp(next, excess / seg);
                }
                break;
            }
        }
    }

    pub fn path_arc_length(&self) -> f32 {
        let mut total = 0.0;
        for i in 1..self.path.len() {
            total += self.path[i - 1].distance_to(self.path[i]);
        }
        total
    }

    /// Equidistant collision samples from head toward tail, recomputed if the
    /// cache is dirty. A single-point path yields just the head sample.
    pub fn segments(&mut self) -> &[Segment] {
        if self.segments.is_none() {
            self.segments = Some(self.sample_segments());
        }
        self.segments.as_deref().unwrap_or(&[])
    }

    fn sample_segments(&self) -> Vec<Segment> {
        let max_samples = (self.length as usize).max(1);
        let mut samples = Vec::with_capacity(max_samples.min(self.path.len() + 1));
        samples.push(Segment {
            center: self.head,
            radius: SEG_RADIUS + HEAD_RADIUS_BONUS,
        });

        let mut cursor = self.head;
        let mut need = SEG_SPACING;
        'walk: for &point in self.path.iter().rev() {
            let mut seg_len = cursor.distance_to(point);
            if seg_len <= f32::EPSILON {
                cursor = point;
                continue;
            }
            while seg_len >= need {
                let t = need / seg_len;
                cursor = cursor.lerp(point, t);
                samples.push(Segment {
                    center: cursor,
                    radius: SEG_RADIUS,
                });
                if samples.len() >= max_samples {
                    break 'walk;
                }
                seg_len -= need;
                need = SEG_SPACING;
            }
            need -= seg_len;
            cursor = point;
        }

        samples
    }

    pub fn grow(&mut self, delta: f32) {
        self.length = (self.length + delta).min(MAX_LEN);
        self.segments = None;
    }

    pub fn die(&mut self) {
        self.alive = false;
        self.is_boosting = false;
    }
}
