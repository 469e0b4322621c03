//! Movement helpers shared by every archetype.

use std::f32::consts::{PI, TAU};

use bevy::prelude::*;

use crate::constants::{MOVE_SMOOTHING, MOVE_STOP_DISTANCE};

/// Wrap an angle into (-PI, PI]
pub fn wrap_angle(angle: f32) -> f32 {
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI {
        wrapped + TAU
    } else {
        wrapped
    }
}

/// Signed shortest rotation from `from` to `to`
pub fn shortest_angle(from: f32, to: f32) -> f32 {
    wrap_angle(to - from)
}

/// Rotate `current` toward `target` by at most `max_step`, taking the short
/// way across the ±PI seam.
pub fn turn_towards(current: f32, target: f32, max_step: f32) -> f32 {
    let delta = shortest_angle(current, target);
    wrap_angle(current + delta.clamp(-max_step, max_step))
}

/// Yaw of a horizontal direction; 0 faces +Z
pub fn yaw_of(direction: Vec3) -> Option<f32> {
    let flat = Vec2::new(direction.x, direction.z);
    (flat.length_squared() > f32::EPSILON).then(|| flat.x.atan2(flat.y))
}

/// Blend factor for frame-rate independent exponential smoothing
pub fn smoothing_factor(dt: f32) -> f32 {
    1.0 - (-MOVE_SMOOTHING * dt).exp()
}

/// One smoothed step toward `target`.
///
/// `flatten` ignores the vertical component. Returns the new position and
/// velocity; holds (and bleeds off velocity) once within the stop distance
/// or when the direction degenerates.
pub fn step_towards(
    position: Vec3,
    velocity: Vec3,
    target: Vec3,
    speed: f32,
    dt: f32,
    flatten: bool,
) -> (Vec3, Vec3) {
    let mut delta = target - position;
    if flatten {
        delta.y = 0.0;
    }
    let distance = delta.length();
    let blend = smoothing_factor(dt);

    if distance < MOVE_STOP_DISTANCE {
        return (position, velocity.lerp(Vec3::ZERO, blend));
    }
    let Some(direction) = delta.try_normalize() else {
        return (position, velocity.lerp(Vec3::ZERO, blend));
    };

    let desired = direction * speed;
    let new_velocity = velocity.lerp(desired, blend);
    let mut step = new_velocity * dt;
    if flatten {
        step.y = 0.0;
    }
    // Never overshoot the target
    if step.length() > distance {
        step = step.normalize_or_zero() * distance;
    }
    (position + step, new_velocity)
}
