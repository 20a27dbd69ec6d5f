//! Scripted in-memory world implementing every capability, for unit tests.

use bevy::prelude::*;
use std::collections::HashMap;

use crate::capabilities::{
    AnimationSink, CapsuleCollider, CapsuleShape, CollisionQuery, ControllerContext, ForceMode,
    LayerMask, RayHit, RigidBody, SurfaceBounds, WorldCommands,
};
use crate::config::ShapeConfig;

type RayFilter = Box<dyn Fn(Vec3, Vec3) -> bool>;

struct RayRule {
    mask: LayerMask,
    entity: Entity,
    bounds: Option<SurfaceBounds>,
    filter: RayFilter,
}

/// Fresh entity ids for tests.
pub fn spawn_entities(count: usize) -> Vec<Entity> {
    let mut world = World::new();
    (0..count).map(|_| world.spawn_empty().id()).collect()
}

/// Ray hits are scripted by (mask, origin/direction predicate); the first match wins.
pub struct ScriptedWorld {
    pub grounded: bool,
    pub hittable: Vec<Entity>,
    rules: Vec<RayRule>,
    entities: Vec<Entity>,
}

impl Default for ScriptedWorld {
    fn default() -> Self {
        Self {
            grounded: false,
            hittable: Vec::new(),
            rules: Vec::new(),
            entities: spawn_entities(8),
        }
    }
}

impl ScriptedWorld {
    /// Any ray on `mask` for which `filter(origin, direction)` holds hits halfway along.
    pub fn add_wall(&mut self, mask: LayerMask, filter: impl Fn(Vec3, Vec3) -> bool + 'static) {
        self.push_rule(mask, None, Box::new(filter));
    }

    /// Like `add_wall`, with known collider bounds.
    pub fn add_surface(
        &mut self,
        mask: LayerMask,
        bounds: SurfaceBounds,
        filter: impl Fn(Vec3, Vec3) -> bool + 'static,
    ) {
        self.push_rule(mask, Some(bounds), Box::new(filter));
    }

    pub fn clear_walls(&mut self) {
        self.rules.clear();
    }

    fn push_rule(&mut self, mask: LayerMask, bounds: Option<SurfaceBounds>, filter: RayFilter) {
        let entity = self.entities[self.rules.len() % self.entities.len()];
        self.rules.push(RayRule {
            mask,
            entity,
            bounds,
            filter,
        });
    }
}

impl CollisionQuery for ScriptedWorld {
    fn overlap_sphere(&self, _center: Vec3, _radius: f32, mask: LayerMask) -> bool {
        self.grounded && mask.intersects(LayerMask::WALKABLE)
    }

    fn overlap_capsule(&self, _a: Vec3, _b: Vec3, _radius: f32, mask: LayerMask) -> Vec<Entity> {
        if mask.intersects(LayerMask::HITTABLE) {
            self.hittable.clone()
        } else {
            Vec::new()
        }
    }

    fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: LayerMask,
    ) -> Option<RayHit> {
        let rule = self
            .rules
            .iter()
            .find(|rule| rule.mask.intersects(mask) && (rule.filter)(origin, direction))?;
        let distance = max_distance * 0.5;
        let point = origin + direction * distance;
        Some(RayHit {
            entity: rule.entity,
            point,
            normal: -direction,
            distance,
            bounds: rule.bounds.unwrap_or(SurfaceBounds::point(point)),
        })
    }
}

pub struct TestBody {
    pub position: Vec3,
    pub rotation: Quat,
    pub linear_velocity: Vec3,
    pub angular_velocity: Vec3,
    pub gravity: bool,
    pub forces: Vec<(Vec3, ForceMode)>,
    pub gravity_writes: usize,
}

impl Default for TestBody {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            linear_velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            gravity: true,
            forces: Vec::new(),
            gravity_writes: 0,
        }
    }
}

impl TestBody {
    pub fn continuous_force(&self) -> Vec3 {
        self.forces
            .iter()
            .filter(|(_, mode)| *mode == ForceMode::Continuous)
            .map(|(force, _)| *force)
            .sum()
    }

    pub fn impulses(&self) -> Vec<Vec3> {
        self.forces
            .iter()
            .filter(|(_, mode)| *mode == ForceMode::Impulse)
            .map(|(force, _)| *force)
            .collect()
    }
}

impl RigidBody for TestBody {
    fn add_force(&mut self, force: Vec3, mode: ForceMode) {
        self.forces.push((force, mode));
    }

    fn linear_velocity(&self) -> Vec3 {
        self.linear_velocity
    }

    fn set_linear_velocity(&mut self, velocity: Vec3) {
        self.linear_velocity = velocity;
    }

    fn angular_velocity(&self) -> Vec3 {
        self.angular_velocity
    }

    fn set_angular_velocity(&mut self, velocity: Vec3) {
        self.angular_velocity = velocity;
    }

    fn gravity_enabled(&self) -> bool {
        self.gravity
    }

    fn set_gravity_enabled(&mut self, enabled: bool) {
        self.gravity = enabled;
        self.gravity_writes += 1;
    }

    fn position(&self) -> Vec3 {
        self.position
    }

    fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    fn rotation(&self) -> Quat {
        self.rotation
    }

    fn set_rotation(&mut self, rotation: Quat) {
        self.rotation = rotation;
    }
}

pub struct TestCapsule {
    pub shape: CapsuleShape,
    pub writes: usize,
}

impl Default for TestCapsule {
    fn default() -> Self {
        Self {
            shape: ShapeConfig::default().stand,
            writes: 0,
        }
    }
}

impl CapsuleCollider for TestCapsule {
    fn shape(&self) -> CapsuleShape {
        self.shape
    }

    fn set_shape(&mut self, shape: CapsuleShape) {
        self.shape = shape;
        self.writes += 1;
    }
}

#[derive(Default)]
pub struct RecordingAnimator {
    pub floats: HashMap<&'static str, f32>,
    pub bools: HashMap<&'static str, bool>,
    pub ints: HashMap<&'static str, i32>,
    pub triggers: Vec<&'static str>,
}

impl AnimationSink for RecordingAnimator {
    fn set_float(&mut self, name: &'static str, value: f32) {
        self.floats.insert(name, value);
    }

    fn set_bool(&mut self, name: &'static str, value: bool) {
        self.bools.insert(name, value);
    }

    fn set_int(&mut self, name: &'static str, value: i32) {
        self.ints.insert(name, value);
    }

    fn set_trigger(&mut self, name: &'static str) {
        self.triggers.push(name);
    }
}

#[derive(Default)]
pub struct RecordingCommands {
    pub destroyed: Vec<Entity>,
}

impl WorldCommands for RecordingCommands {
    fn destroy(&mut self, entity: Entity) {
        self.destroyed.push(entity);
    }
}

/// Owns one of everything and lends it out as a `ControllerContext`.
#[derive(Default)]
pub struct Harness {
    pub world: ScriptedWorld,
    pub body: TestBody,
    pub capsule: TestCapsule,
    pub animator: RecordingAnimator,
    pub commands: RecordingCommands,
    pub camera_yaw: f32,
    pub now: f64,
}

impl Harness {
    pub fn ctx(&mut self) -> ControllerContext<'_> {
        ControllerContext {
            query: &self.world,
            body: &mut self.body,
            collider: &mut self.capsule,
            animator: &mut self.animator,
            commands: &mut self.commands,
            camera_yaw: self.camera_yaw,
            now: self.now,
        }
    }
}
