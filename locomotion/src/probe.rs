//! Geometric probes: grounding, step detection, stand-up clearance and the climb clamp.
//!
//! Climb clamp, per physics tick while climbing:
//! 1. Place left/right/top probes around the climb anchor using the anchor's own axes.
//! 2. Detect whether right/left are geometrically swapped after rotation (`is_flipped`).
//! 3. Ray forward from each probe; a miss means that side is not climbable.
//! 4. A falling edge on any flag halts the body (see `update_clamp_state`).
//! 5. Bound each axis of the requested move so it can only head toward climbable surface.

use bevy::prelude::*;

use crate::capabilities::{CollisionQuery, LayerMask, RayHit};
use crate::config::ProbeConfig;

/// Components smaller than this don't count as negative in the flip test.
const FLIP_EPSILON: f32 = 1e-4;

/// Climbability sampled around the climb anchor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClimbClampState {
    pub right_climbable: bool,
    pub left_climbable: bool,
    pub top_climbable: bool,
    pub is_flipped: bool,
}

impl Default for ClimbClampState {
    fn default() -> Self {
        Self {
            right_climbable: true,
            left_climbable: true,
            top_climbable: true,
            is_flipped: false,
        }
    }
}

/// Side effects requested by a clamp-state transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClampEffect {
    /// Zero linear and angular velocity this tick.
    HaltMotion,
}

/// Replace `old` with `new`, reporting the side effects of any flag that just dropped.
pub fn update_clamp_state(
    old: ClimbClampState,
    new: ClimbClampState,
) -> (ClimbClampState, Vec<ClampEffect>) {
    let fell = |before: bool, after: bool| before && !after;

    let mut effects = Vec::new();
    if fell(old.right_climbable, new.right_climbable)
        || fell(old.left_climbable, new.left_climbable)
        || fell(old.top_climbable, new.top_climbable)
    {
        effects.push(ClampEffect::HaltMotion);
    }
    (new, effects)
}

/// Per-axis [min, max] limits for a climb move.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClampBounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl ClampBounds {
    pub const FULL: Self = Self {
        min: Vec3::NEG_ONE,
        max: Vec3::ONE,
    };

    pub fn from_state(state: &ClimbClampState) -> Self {
        let mut bounds = Self::FULL;

        // The lateral rule covers both x and z since the wall may face either axis.
        if !state.right_climbable {
            if state.is_flipped {
                bounds.min.x = 0.0;
                bounds.min.z = 0.0;
            } else {
                bounds.max.x = 0.0;
                bounds.max.z = 0.0;
            }
        }
        if !state.left_climbable {
            if state.is_flipped {
                bounds.max.x = 0.0;
                bounds.max.z = 0.0;
            } else {
                bounds.min.x = 0.0;
                bounds.min.z = 0.0;
            }
        }
        // Climbing down past a ledge is fine, up is not.
        if !state.top_climbable {
            bounds.max.y = 0.0;
        }
        bounds
    }

    pub fn apply(&self, requested: Vec3) -> Vec3 {
        requested.clamp(self.min, self.max)
    }
}

/// Clamp a requested world-space climb move against the sampled climbability.
pub fn clamp_climb_move(requested: Vec3, state: &ClimbClampState) -> Vec3 {
    ClampBounds::from_state(state).apply(requested)
}

/// World-space probe origins around the climb anchor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProbePoints {
    pub right: Vec3,
    pub left: Vec3,
    pub top: Vec3,
}

impl ProbePoints {
    pub fn around(anchor: Vec3, rotation: Quat, horizontal_offset: f32, top_offset: f32) -> Self {
        let right = rotation * Vec3::X;
        let up = rotation * Vec3::Y;
        Self {
            right: anchor + right * horizontal_offset,
            left: anchor - right * horizontal_offset,
            top: anchor + up * top_offset,
        }
    }

    /// True when right and left have swapped sides on a world axis.
    pub fn is_flipped(&self) -> bool {
        let span = self.right - self.left;
        span.x < -FLIP_EPSILON || span.z < -FLIP_EPSILON
    }
}

/// World-space climb anchor for a body pose.
pub fn climb_anchor(position: Vec3, rotation: Quat, config: &ProbeConfig) -> Vec3 {
    position + rotation * config.climb_anchor_offset
}

/// Cast the three climb probes and build the clamp state.
pub fn sample_clamp_state(
    query: &dyn CollisionQuery,
    anchor: Vec3,
    rotation: Quat,
    config: &ProbeConfig,
) -> ClimbClampState {
    let points = ProbePoints::around(
        anchor,
        rotation,
        config.climb_horizontal_offset,
        config.climb_top_offset,
    );
    let forward = rotation * Vec3::NEG_Z;
    let hits = |origin: Vec3| {
        query
            .raycast(origin, forward, config.climb_check_distance, LayerMask::CLIMBABLE)
            .is_some()
    };

    ClimbClampState {
        right_climbable: hits(points.right),
        left_climbable: hits(points.left),
        top_climbable: hits(points.top),
        is_flipped: points.is_flipped(),
    }
}

/// Forward ray from the climb anchor looking for a climbable surface.
pub fn find_climb_surface(
    query: &dyn CollisionQuery,
    anchor: Vec3,
    forward: Vec3,
    config: &ProbeConfig,
) -> Option<RayHit> {
    query.raycast(anchor, forward, config.climb_check_distance, LayerMask::CLIMBABLE)
}

/// Ground checker sphere overlap.
pub fn is_grounded(
    query: &dyn CollisionQuery,
    position: Vec3,
    rotation: Quat,
    config: &ProbeConfig,
) -> bool {
    let checker = position + rotation * config.ground_checker_offset;
    query.overlap_sphere(checker, config.ground_checker_radius, LayerMask::WALKABLE)
}

/// Step assist fires when the lower probe meets a step and the upper probe is clear.
///
/// Requiring both probes to hit would push the body up walls instead of steps.
pub fn step_detected(
    query: &dyn CollisionQuery,
    position: Vec3,
    rotation: Quat,
    config: &ProbeConfig,
) -> bool {
    let forward = rotation * Vec3::NEG_Z;
    let lower_origin = position + rotation * config.ground_checker_offset;
    let upper_origin = lower_origin + rotation * config.upper_step_offset;

    let lower = query
        .raycast(lower_origin, forward, config.step_check_distance, LayerMask::STEP)
        .is_some();
    if !lower {
        return false;
    }
    query
        .raycast(upper_origin, forward, config.step_check_distance, LayerMask::STEP)
        .is_none()
}

/// Nothing solid directly above within the stand-up clearance.
pub fn has_stand_clearance(query: &dyn CollisionQuery, position: Vec3, config: &ProbeConfig) -> bool {
    query
        .raycast(position, Vec3::Y, config.stand_clearance_distance, LayerMask::SOLID)
        .is_none()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedWorld;
    use std::f32::consts::PI;

    fn state(right: bool, left: bool, top: bool, flipped: bool) -> ClimbClampState {
        ClimbClampState {
            right_climbable: right,
            left_climbable: left,
            top_climbable: top,
            is_flipped: flipped,
        }
    }

    #[test]
    fn test_right_edge_blocks_positive_lateral() {
        let clamped = clamp_climb_move(Vec3::new(1.0, 1.0, 0.0), &state(false, true, true, false));
        assert_eq!(clamped, Vec3::new(0.0, 1.0, 0.0));

        // Moving back toward the climbable side is untouched.
        let back = clamp_climb_move(Vec3::new(-1.0, 0.5, -0.5), &state(false, true, true, false));
        assert_eq!(back, Vec3::new(-1.0, 0.5, -0.5));
    }

    #[test]
    fn test_flip_swaps_polarity() {
        let right_gone = clamp_climb_move(Vec3::new(-1.0, 0.0, -1.0), &state(false, true, true, true));
        assert_eq!(right_gone, Vec3::ZERO);

        let left_gone = clamp_climb_move(Vec3::new(1.0, 0.0, 1.0), &state(true, false, true, true));
        assert_eq!(left_gone, Vec3::ZERO);

        let left_gone_unflipped =
            clamp_climb_move(Vec3::new(-1.0, 0.0, 0.7), &state(true, false, true, false));
        assert_eq!(left_gone_unflipped, Vec3::new(0.0, 0.0, 0.7));
    }

    #[test]
    fn test_missing_top_only_blocks_upward() {
        let s = state(true, true, false, false);
        assert_eq!(clamp_climb_move(Vec3::new(0.0, 1.0, 0.0), &s), Vec3::ZERO);
        assert_eq!(
            clamp_climb_move(Vec3::new(0.0, -1.0, 0.0), &s),
            Vec3::new(0.0, -1.0, 0.0)
        );
    }

    #[test]
    fn test_falling_edge_requests_halt() {
        let all = ClimbClampState::default();
        let (_, effects) = update_clamp_state(all, state(true, false, true, false));
        assert_eq!(effects, vec![ClampEffect::HaltMotion]);

        // Staying off is level, not an edge.
        let off = state(true, false, true, false);
        let (_, effects) = update_clamp_state(off, off);
        assert!(effects.is_empty());

        // Rising edge does nothing.
        let (next, effects) = update_clamp_state(off, all);
        assert!(effects.is_empty());
        assert_eq!(next, all);
    }

    #[test]
    fn test_flip_detection() {
        let facing_forward = ProbePoints::around(Vec3::ZERO, Quat::IDENTITY, 0.4, 0.9);
        assert!(!facing_forward.is_flipped());

        let turned_around = ProbePoints::around(Vec3::ZERO, Quat::from_rotation_y(PI), 0.4, 0.9);
        assert!(turned_around.is_flipped());

        // A quarter turn left puts "right" on -Z.
        let quarter = ProbePoints::around(Vec3::ZERO, Quat::from_rotation_y(PI / 2.0), 0.4, 0.9);
        assert!(quarter.is_flipped());
    }

    #[test]
    fn test_sample_clamp_state_against_wall_edge() {
        // Wall spans x < 0.2 in front of the body (facing -Z).
        let mut world = ScriptedWorld::default();
        world.add_wall(LayerMask::CLIMBABLE, |origin, _| origin.x < 0.2 && origin.y < 1.5);

        let config = ProbeConfig::default();
        let anchor = climb_anchor(Vec3::ZERO, Quat::IDENTITY, &config);
        let sampled = sample_clamp_state(&world, anchor, Quat::IDENTITY, &config);

        assert!(!sampled.right_climbable);
        assert!(sampled.left_climbable);
        assert!(sampled.top_climbable);
        assert!(!sampled.is_flipped);
    }

    #[test]
    fn test_step_requires_clear_upper_probe() {
        let config = ProbeConfig::default();
        let feet_y = config.ground_checker_offset.y;

        let mut step = ScriptedWorld::default();
        step.add_wall(LayerMask::STEP, move |origin, _| origin.y < feet_y + 0.2);
        assert!(step_detected(&step, Vec3::ZERO, Quat::IDENTITY, &config));

        let mut wall = ScriptedWorld::default();
        wall.add_wall(LayerMask::STEP, |_, _| true);
        assert!(!step_detected(&wall, Vec3::ZERO, Quat::IDENTITY, &config));

        let open = ScriptedWorld::default();
        assert!(!step_detected(&open, Vec3::ZERO, Quat::IDENTITY, &config));
    }

    #[test]
    fn test_clearance_and_grounding() {
        let config = ProbeConfig::default();
        let mut world = ScriptedWorld::default();
        assert!(has_stand_clearance(&world, Vec3::ZERO, &config));
        assert!(!is_grounded(&world, Vec3::ZERO, Quat::IDENTITY, &config));

        world.grounded = true;
        world.add_wall(LayerMask::OBSTACLE, |_, direction| direction.y > 0.5);
        assert!(!has_stand_clearance(&world, Vec3::ZERO, &config));
        assert!(is_grounded(&world, Vec3::ZERO, Quat::IDENTITY, &config));
    }
}
