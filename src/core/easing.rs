//! Easing and Angle Helpers
//!
//! Shared interpolation curves for move/turn transitions.

use std::f32::consts::{PI, TAU};

/// Quadratic ease-in-out.
///
/// `t < 0.5 → 2t²`, otherwise `1 − 2(1 − t)²`. Input is clamped to [0, 1].
#[inline]
pub fn ease_in_out_quad(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        2.0 * t * t
    } else {
        let inv = 1.0 - t;
        1.0 - 2.0 * inv * inv
    }
}

/// Adjust `end` so that travelling from `start` to `end` never exceeds π.
///
/// Deltas larger than π in magnitude are shifted by ±2π.
#[inline]
pub fn shortest_arc_end(start: f32, end: f32) -> f32 {
    let delta = end - start;
    if delta.abs() > PI {
        if end > start {
            end - TAU
        } else {
            end + TAU
        }
    } else {
        end
    }
}

/// Interpolate between two angles along an eased curve.
#[inline]
pub fn lerp_angle(start: f32, end: f32, eased: f32) -> f32 {
    start + (end - start) * eased
}
