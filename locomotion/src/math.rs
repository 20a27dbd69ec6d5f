//! Yaw and angle helpers.
//!
//! Bevy convention: +X right, +Y up, -Z forward. Yaw is a rotation about +Y, so a positive
//! yaw turns the body to the left.

use bevy::prelude::*;
use std::f32::consts::{PI, TAU};

/// Forward direction on the XZ plane for a yaw angle.
#[inline]
pub fn forward_from_yaw(yaw: f32) -> Vec3 {
    Vec3::new(-yaw.sin(), 0.0, -yaw.cos())
}

/// Right direction on the XZ plane for a yaw angle.
#[inline]
pub fn right_from_yaw(yaw: f32) -> Vec3 {
    Vec3::new(yaw.cos(), 0.0, -yaw.sin())
}

/// Yaw that makes the body face `direction` (only its XZ part is used).
#[inline]
pub fn yaw_facing(direction: Vec3) -> f32 {
    (-direction.x).atan2(-direction.z)
}

/// Yaw component of a rotation.
#[inline]
pub fn yaw_of(rotation: Quat) -> f32 {
    rotation.to_euler(EulerRot::YXZ).0
}

/// Wrap an angle into (-PI, PI].
pub fn wrap_angle(angle: f32) -> f32 {
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI {
        wrapped + TAU
    } else {
        wrapped
    }
}

/// Critically damped spring toward `target`, taking the short way around the circle.
///
/// `velocity` carries the spring state between calls. Result is not wrapped.
pub fn smooth_damp_angle(
    current: f32,
    target: f32,
    velocity: &mut f32,
    smooth_time: f32,
    dt: f32,
) -> f32 {
    let target = current + wrap_angle(target - current);
    let smooth_time = smooth_time.max(1e-4);
    let omega = 2.0 / smooth_time;
    let x = omega * dt;
    let decay = 1.0 / (1.0 + x + 0.48 * x * x + 0.235 * x * x * x);

    let change = current - target;
    let temp = (*velocity + omega * change) * dt;
    *velocity = (*velocity - omega * temp) * decay;
    let mut output = target + (change + temp) * decay;

    // Don't overshoot.
    if (target - current > 0.0) == (output > target) {
        output = target;
        *velocity = if dt > 0.0 { (output - target) / dt } else { 0.0 };
    }
    output
}
