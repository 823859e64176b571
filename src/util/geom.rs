//! Scalar geometry helpers shared by the physics and collision systems.

use std::f32::consts::{PI, TAU};

use crate::util::vec2::Vec2;

/// Normalize an angle into (-PI, PI]
#[inline]
pub fn wrap_angle(theta: f32) -> f32 {
    let mut a = theta % TAU;
    if a > PI {
        a -= TAU;
    } else if a <= -PI {
        a += TAU;
    }
    a
}

/// Circle-circle overlap test
#[inline]
pub fn circles_intersect(a: Vec2, ra: f32, b: Vec2, rb: f32) -> bool {
    let r = ra + rb;
    a.distance_sq_to(b) <= r * r
}

/// Squared distance from point `p` to the segment `a..b`
pub fn point_segment_distance_sq(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_sq();
    if len_sq <= f32::EPSILON {
        return p.distance_sq_to(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    let closest = a + ab * t;
    p.distance_sq_to(closest)
}
