//! Capabilities the controller uses to reach the physics world.
//!
//! The controller never touches engine singletons. Everything it reads or writes goes
//! through these traits, bundled per call in a `ControllerContext`. The client implements
//! them on top of rapier; tests implement them with a scripted in-memory world.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::ops::BitOr;

/// Collision layers used by the probes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct LayerMask(pub u32);

impl LayerMask {
    pub const GROUND: Self = Self(1 << 0);
    pub const STEP: Self = Self(1 << 1);
    pub const CLIMBABLE: Self = Self(1 << 2);
    pub const HITTABLE: Self = Self(1 << 3);
    pub const OBSTACLE: Self = Self(1 << 4);
    /// The controlled character itself.
    pub const PLAYER: Self = Self(1 << 5);

    /// Anything the ground checker may stand on.
    pub const WALKABLE: Self = Self(Self::GROUND.0 | Self::STEP.0);
    /// Anything that blocks standing up out of a crouch.
    pub const SOLID: Self =
        Self(Self::GROUND.0 | Self::STEP.0 | Self::CLIMBABLE.0 | Self::OBSTACLE.0);

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }
}

impl BitOr for LayerMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// World-space bounds of the collider a ray hit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceBounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl SurfaceBounds {
    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// Degenerate bounds around a single point (used when the collider size is unknown).
    pub fn point(point: Vec3) -> Self {
        Self {
            min: point,
            max: point,
        }
    }

    pub fn closest_point(&self, point: Vec3) -> Vec3 {
        point.clamp(self.min, self.max)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayHit {
    pub entity: Entity,
    pub point: Vec3,
    pub normal: Vec3,
    pub distance: f32,
    pub bounds: SurfaceBounds,
}

/// Read-only geometric queries against the physics world.
pub trait CollisionQuery {
    fn overlap_sphere(&self, center: Vec3, radius: f32, mask: LayerMask) -> bool;

    /// Every collider on `mask` overlapping the capsule between `a` and `b`.
    fn overlap_capsule(&self, a: Vec3, b: Vec3, radius: f32, mask: LayerMask) -> Vec<Entity>;

    fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: LayerMask,
    ) -> Option<RayHit>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ForceMode {
    /// Applied over the current physics tick.
    Continuous,
    /// Instant change in momentum.
    Impulse,
}

/// The controlled rigid body.
pub trait RigidBody {
    fn add_force(&mut self, force: Vec3, mode: ForceMode);

    fn linear_velocity(&self) -> Vec3;
    fn set_linear_velocity(&mut self, velocity: Vec3);
    fn angular_velocity(&self) -> Vec3;
    fn set_angular_velocity(&mut self, velocity: Vec3);

    fn gravity_enabled(&self) -> bool;
    fn set_gravity_enabled(&mut self, enabled: bool);

    fn position(&self) -> Vec3;
    fn set_position(&mut self, position: Vec3);
    fn rotation(&self) -> Quat;
    fn set_rotation(&mut self, rotation: Quat);

    /// Zero linear and angular velocity.
    fn halt(&mut self) {
        self.set_linear_velocity(Vec3::ZERO);
        self.set_angular_velocity(Vec3::ZERO);
    }
}

/// Vertical capsule dimensions, relative to the body origin.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CapsuleShape {
    /// Total height including both caps.
    pub height: f32,
    /// Vertical offset of the capsule centre from the body origin.
    pub center_y: f32,
}

impl CapsuleShape {
    pub const fn new(height: f32, center_y: f32) -> Self {
        Self { height, center_y }
    }
}

pub trait CapsuleCollider {
    fn shape(&self) -> CapsuleShape;
    fn set_shape(&mut self, shape: CapsuleShape);
}

/// Named animation parameters. See `crate::anim` for the names the controller writes.
pub trait AnimationSink {
    fn set_float(&mut self, name: &'static str, value: f32);
    fn set_bool(&mut self, name: &'static str, value: bool);
    fn set_int(&mut self, name: &'static str, value: i32);
    fn set_trigger(&mut self, name: &'static str);
}

/// Discards every parameter.
impl AnimationSink for () {
    fn set_float(&mut self, _name: &'static str, _value: f32) {}
    fn set_bool(&mut self, _name: &'static str, _value: bool) {}
    fn set_int(&mut self, _name: &'static str, _value: i32) {}
    fn set_trigger(&mut self, _name: &'static str) {}
}

/// Structural world edits the controller may request.
pub trait WorldCommands {
    fn destroy(&mut self, entity: Entity);
}

/// Everything one controller call may touch, borrowed for the duration of that call.
pub struct ControllerContext<'a> {
    pub query: &'a dyn CollisionQuery,
    pub body: &'a mut dyn RigidBody,
    pub collider: &'a mut dyn CapsuleCollider,
    pub animator: &'a mut dyn AnimationSink,
    pub commands: &'a mut dyn WorldCommands,
    /// Yaw of the active camera, in radians.
    pub camera_yaw: f32,
    /// Monotonic time in seconds.
    pub now: f64,
}
