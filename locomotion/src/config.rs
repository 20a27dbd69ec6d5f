//! Locomotion tuning values.
//!
//! Defaults live in the `pub const` blocks below. `LocomotionConfig` mirrors them as serde
//! fields so a RON file can override any subset (missing fields fall back to the defaults).
//!
//! Forces assume a body of mass 1.0 with light linear damping, so speeds read as
//! accelerations in m/s^2.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::capabilities::CapsuleShape;

// =============================================================================
// DEFAULT TUNING CONSTANTS
// =============================================================================

pub mod movement {
    pub const WALK_SPEED: f32 = 8.0;
    pub const SPRINT_SPEED: f32 = 12.0;
    pub const CROUCH_SPEED: f32 = 4.0;
    /// How fast `speed` travels between walk and sprint (units per second).
    pub const WALK_SPRINT_TRANSITION: f32 = 8.0;
    /// Seconds for the yaw spring to mostly settle on its target.
    pub const ROTATION_SMOOTH_TIME: f32 = 0.1;
    /// Inputs shorter than this don't rotate the body.
    pub const DEADZONE: f32 = 0.1;
    /// Upward impulse applied on jump.
    pub const JUMP_FORCE: f32 = 5.0;
}

pub mod probe {
    /// Ground checker sphere, relative to the body origin (capsule centre).
    pub const GROUND_CHECKER_OFFSET: [f32; 3] = [0.0, -0.9, 0.0];
    pub const GROUND_CHECKER_RADIUS: f32 = 0.2;

    /// Upper step ray origin, relative to the ground checker.
    pub const UPPER_STEP_OFFSET: [f32; 3] = [0.0, 0.4, 0.0];
    pub const STEP_CHECK_DISTANCE: f32 = 0.5;
    pub const STEP_FORCE: f32 = 25.0;

    /// Climb anchor, relative to the body origin.
    pub const CLIMB_ANCHOR_OFFSET: [f32; 3] = [0.0, 0.3, 0.0];
    pub const CLIMB_CHECK_DISTANCE: f32 = 1.0;
    /// Lateral distance of the left/right climb probes from the anchor.
    pub const CLIMB_HORIZONTAL_OFFSET: f32 = 0.4;
    /// Height of the top climb probe above the anchor.
    pub const CLIMB_TOP_OFFSET: f32 = 0.9;
    /// Placement after snapping to a wall: z along forward (negative = away from it), y up.
    pub const CLIMB_OFFSET: [f32; 3] = [0.0, 0.1, -0.4];
    pub const CLIMB_SPEED: f32 = 4.0;
    /// Backward nudge on leaving a climb so the probe doesn't immediately re-trigger.
    pub const CLIMB_EXIT_PUSHBACK: f32 = 1.0;

    /// Upward ray length (from the body origin) that must be clear to stand up.
    pub const STAND_CLEARANCE_DISTANCE: f32 = 1.0;
}

pub mod glide {
    /// Attitude rates in degrees per second at full input.
    pub const PITCH_RATE: f32 = 45.0;
    pub const YAW_RATE: f32 = 60.0;
    pub const ROLL_RATE: f32 = 45.0;
    /// Pitch bounds in degrees (positive = nose down).
    pub const MIN_PITCH: f32 = -20.0;
    pub const MAX_PITCH: f32 = 30.0;
    pub const MAX_ROLL: f32 = 30.0;
    pub const AIR_DRAG: f32 = 30.0;
    /// Up-force per degree of (pitch + air drag).
    pub const LIFT_SCALE: f32 = 0.2;
    /// Constant forward thrust while gliding.
    pub const GLIDE_SPEED: f32 = 6.0;
}

pub mod shape {
    pub const CAPSULE_RADIUS: f32 = 0.3;
    pub const STAND_HEIGHT: f32 = 1.8;
    pub const STAND_CENTER_Y: f32 = 0.0;
    pub const CROUCH_HEIGHT: f32 = 1.2;
    pub const CROUCH_CENTER_Y: f32 = -0.3;
    pub const CLIMB_HEIGHT: f32 = 1.4;
    pub const CLIMB_CENTER_Y: f32 = 0.2;
}

pub mod combat {
    /// Seconds without a punch before the combo counter drops back to zero.
    pub const COMBO_RESET_INTERVAL: f32 = 1.0;
    /// Hit capsule end points in body space (-Z is forward).
    pub const HIT_POINT_A: [f32; 3] = [0.0, 0.0, -0.6];
    pub const HIT_POINT_B: [f32; 3] = [0.0, 0.6, -0.6];
    pub const HIT_RADIUS: f32 = 0.5;
}

pub mod camera {
    /// Third-person field of view in degrees.
    pub const DEFAULT_FOV: f32 = 60.0;
    pub const CLIMB_FOV: f32 = 45.0;
    /// First-person look window either side of the reference yaw, in degrees.
    pub const LOOK_CLAMP_HALF_ANGLE: f32 = 45.0;
    pub const ACTIVE_PRIORITY: i32 = 10;
    pub const INACTIVE_PRIORITY: i32 = 0;
}

// =============================================================================
// CONFIG TYPES
// =============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    pub walk_speed: f32,
    pub sprint_speed: f32,
    pub crouch_speed: f32,
    pub walk_sprint_transition: f32,
    pub rotation_smooth_time: f32,
    pub deadzone: f32,
    pub jump_force: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            walk_speed: movement::WALK_SPEED,
            sprint_speed: movement::SPRINT_SPEED,
            crouch_speed: movement::CROUCH_SPEED,
            walk_sprint_transition: movement::WALK_SPRINT_TRANSITION,
            rotation_smooth_time: movement::ROTATION_SMOOTH_TIME,
            deadzone: movement::DEADZONE,
            jump_force: movement::JUMP_FORCE,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub ground_checker_offset: Vec3,
    pub ground_checker_radius: f32,
    pub upper_step_offset: Vec3,
    pub step_check_distance: f32,
    pub step_force: f32,
    pub climb_anchor_offset: Vec3,
    pub climb_check_distance: f32,
    pub climb_horizontal_offset: f32,
    pub climb_top_offset: f32,
    pub climb_offset: Vec3,
    pub climb_speed: f32,
    pub climb_exit_pushback: f32,
    pub stand_clearance_distance: f32,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            ground_checker_offset: Vec3::from_array(probe::GROUND_CHECKER_OFFSET),
            ground_checker_radius: probe::GROUND_CHECKER_RADIUS,
            upper_step_offset: Vec3::from_array(probe::UPPER_STEP_OFFSET),
            step_check_distance: probe::STEP_CHECK_DISTANCE,
            step_force: probe::STEP_FORCE,
            climb_anchor_offset: Vec3::from_array(probe::CLIMB_ANCHOR_OFFSET),
            climb_check_distance: probe::CLIMB_CHECK_DISTANCE,
            climb_horizontal_offset: probe::CLIMB_HORIZONTAL_OFFSET,
            climb_top_offset: probe::CLIMB_TOP_OFFSET,
            climb_offset: Vec3::from_array(probe::CLIMB_OFFSET),
            climb_speed: probe::CLIMB_SPEED,
            climb_exit_pushback: probe::CLIMB_EXIT_PUSHBACK,
            stand_clearance_distance: probe::STAND_CLEARANCE_DISTANCE,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlideConfig {
    pub pitch_rate: f32,
    pub yaw_rate: f32,
    pub roll_rate: f32,
    pub min_pitch: f32,
    pub max_pitch: f32,
    pub max_roll: f32,
    pub air_drag: f32,
    pub lift_scale: f32,
    pub glide_speed: f32,
}

impl Default for GlideConfig {
    fn default() -> Self {
        Self {
            pitch_rate: glide::PITCH_RATE,
            yaw_rate: glide::YAW_RATE,
            roll_rate: glide::ROLL_RATE,
            min_pitch: glide::MIN_PITCH,
            max_pitch: glide::MAX_PITCH,
            max_roll: glide::MAX_ROLL,
            air_drag: glide::AIR_DRAG,
            lift_scale: glide::LIFT_SCALE,
            glide_speed: glide::GLIDE_SPEED,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapeConfig {
    pub radius: f32,
    pub stand: CapsuleShape,
    pub crouch: CapsuleShape,
    pub climb: CapsuleShape,
}

impl Default for ShapeConfig {
    fn default() -> Self {
        Self {
            radius: shape::CAPSULE_RADIUS,
            stand: CapsuleShape::new(shape::STAND_HEIGHT, shape::STAND_CENTER_Y),
            crouch: CapsuleShape::new(shape::CROUCH_HEIGHT, shape::CROUCH_CENTER_Y),
            climb: CapsuleShape::new(shape::CLIMB_HEIGHT, shape::CLIMB_CENTER_Y),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    pub combo_reset_interval: f32,
    pub hit_point_a: Vec3,
    pub hit_point_b: Vec3,
    pub hit_radius: f32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            combo_reset_interval: combat::COMBO_RESET_INTERVAL,
            hit_point_a: Vec3::from_array(combat::HIT_POINT_A),
            hit_point_b: Vec3::from_array(combat::HIT_POINT_B),
            hit_radius: combat::HIT_RADIUS,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub default_fov: f32,
    pub climb_fov: f32,
    pub look_clamp_half_angle: f32,
    pub active_priority: i32,
    pub inactive_priority: i32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            default_fov: camera::DEFAULT_FOV,
            climb_fov: camera::CLIMB_FOV,
            look_clamp_half_angle: camera::LOOK_CLAMP_HALF_ANGLE,
            active_priority: camera::ACTIVE_PRIORITY,
            inactive_priority: camera::INACTIVE_PRIORITY,
        }
    }
}

/// Complete tuning set for one controlled character.
#[derive(Resource, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocomotionConfig {
    pub movement: MovementConfig,
    pub probe: ProbeConfig,
    pub glide: GlideConfig,
    pub shape: ShapeConfig,
    pub combat: CombatConfig,
    pub camera: CameraConfig,
}

impl LocomotionConfig {
    /// Parse and validate a config from RON text.
    pub fn from_ron_str(text: &str) -> Result<Self, String> {
        let config: LocomotionConfig =
            ron::from_str(text).map_err(|e| format!("ron parse failed: {e}"))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a RON file.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, String> {
        let path = path.as_ref();
        let text =
            std::fs::read_to_string(path).map_err(|e| format!("failed to read {path:?}: {e}"))?;
        Self::from_ron_str(&text).map_err(|e| format!("{path:?}: {e}"))
    }

    /// Reject values the controller can't run with.
    pub fn validate(&self) -> Result<(), String> {
        self.check_finite()?;

        let m = &self.movement;
        if m.walk_speed > m.sprint_speed {
            return Err(format!(
                "walk_speed ({}) must not exceed sprint_speed ({})",
                m.walk_speed, m.sprint_speed
            ));
        }
        if m.rotation_smooth_time <= 0.0 {
            return Err("rotation_smooth_time must be positive".to_string());
        }
        if m.deadzone < 0.0 || m.deadzone >= 1.0 {
            return Err(format!("deadzone must be in [0, 1), got {}", m.deadzone));
        }

        let p = &self.probe;
        for (name, value) in [
            ("ground_checker_radius", p.ground_checker_radius),
            ("step_check_distance", p.step_check_distance),
            ("climb_check_distance", p.climb_check_distance),
            ("climb_horizontal_offset", p.climb_horizontal_offset),
            ("climb_top_offset", p.climb_top_offset),
            ("stand_clearance_distance", p.stand_clearance_distance),
            ("capsule radius", self.shape.radius),
            ("hit_radius", self.combat.hit_radius),
        ] {
            if value <= 0.0 {
                return Err(format!("{name} must be positive, got {value}"));
            }
        }

        let g = &self.glide;
        if g.min_pitch >= g.max_pitch {
            return Err(format!(
                "glide min_pitch ({}) must be below max_pitch ({})",
                g.min_pitch, g.max_pitch
            ));
        }

        for (name, capsule) in [
            ("stand", self.shape.stand),
            ("crouch", self.shape.crouch),
            ("climb", self.shape.climb),
        ] {
            if capsule.height < self.shape.radius * 2.0 {
                return Err(format!(
                    "{name} capsule height {} is shorter than its diameter",
                    capsule.height
                ));
            }
        }

        if self.combat.combo_reset_interval <= 0.0 {
            return Err("combo_reset_interval must be positive".to_string());
        }

        // Used as symmetric clamp bounds.
        for (name, value) in [
            ("walk_sprint_transition", m.walk_sprint_transition),
            ("glide max_roll", g.max_roll),
            ("look_clamp_half_angle", self.camera.look_clamp_half_angle),
        ] {
            if value < 0.0 {
                return Err(format!("{name} must not be negative, got {value}"));
            }
        }
        Ok(())
    }

    fn check_finite(&self) -> Result<(), String> {
        let (m, p, g, s, c) = (
            &self.movement,
            &self.probe,
            &self.glide,
            &self.shape,
            &self.combat,
        );
        let scalars = [
            ("walk_speed", m.walk_speed),
            ("sprint_speed", m.sprint_speed),
            ("crouch_speed", m.crouch_speed),
            ("walk_sprint_transition", m.walk_sprint_transition),
            ("rotation_smooth_time", m.rotation_smooth_time),
            ("deadzone", m.deadzone),
            ("jump_force", m.jump_force),
            ("ground_checker_radius", p.ground_checker_radius),
            ("step_check_distance", p.step_check_distance),
            ("step_force", p.step_force),
            ("climb_check_distance", p.climb_check_distance),
            ("climb_horizontal_offset", p.climb_horizontal_offset),
            ("climb_top_offset", p.climb_top_offset),
            ("climb_speed", p.climb_speed),
            ("climb_exit_pushback", p.climb_exit_pushback),
            ("stand_clearance_distance", p.stand_clearance_distance),
            ("glide pitch_rate", g.pitch_rate),
            ("glide yaw_rate", g.yaw_rate),
            ("glide roll_rate", g.roll_rate),
            ("glide min_pitch", g.min_pitch),
            ("glide max_pitch", g.max_pitch),
            ("glide max_roll", g.max_roll),
            ("glide air_drag", g.air_drag),
            ("glide lift_scale", g.lift_scale),
            ("glide_speed", g.glide_speed),
            ("capsule radius", s.radius),
            ("stand height", s.stand.height),
            ("stand center_y", s.stand.center_y),
            ("crouch height", s.crouch.height),
            ("crouch center_y", s.crouch.center_y),
            ("climb height", s.climb.height),
            ("climb center_y", s.climb.center_y),
            ("combo_reset_interval", c.combo_reset_interval),
            ("hit_radius", c.hit_radius),
            ("default_fov", self.camera.default_fov),
            ("climb_fov", self.camera.climb_fov),
            ("look_clamp_half_angle", self.camera.look_clamp_half_angle),
        ];
        for (name, value) in scalars {
            if !value.is_finite() {
                return Err(format!("{name} must be finite, got {value}"));
            }
        }

        let vectors = [
            ("ground_checker_offset", p.ground_checker_offset),
            ("upper_step_offset", p.upper_step_offset),
            ("climb_anchor_offset", p.climb_anchor_offset),
            ("climb_offset", p.climb_offset),
            ("hit_point_a", c.hit_point_a),
            ("hit_point_b", c.hit_point_b),
        ];
        for (name, value) in vectors {
            if !value.is_finite() {
                return Err(format!("{name} must be finite, got {value}"));
            }
        }
        Ok(())
    }
}
