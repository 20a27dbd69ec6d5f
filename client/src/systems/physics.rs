//! Rapier-backed capabilities for the locomotion controller.
//!
//! Each adapter borrows the player's physics components for one controller call.

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;
use locomotion::capabilities as cap;
use locomotion::{CapsuleShape, ForceMode, LayerMask, RayHit, SurfaceBounds};

// =============================================================================
// COMPONENTS
// =============================================================================

/// Half extents of a box collider, so ray hits can report the surface bounds.
#[derive(Component, Clone, Copy, Debug)]
pub struct SurfaceExtents(pub Vec3);

/// Current controller capsule of the player (the collider is rebuilt from it).
#[derive(Component, Clone, Copy, Debug)]
pub struct PlayerCapsule {
    pub shape: CapsuleShape,
    pub radius: f32,
}

// =============================================================================
// LAYERS
// =============================================================================

/// Collision groups for a collider living on `layer`.
pub fn layer_groups(layer: LayerMask) -> CollisionGroups {
    CollisionGroups::new(Group::from_bits_truncate(layer.bits()), Group::ALL)
}

fn query_filter(mask: LayerMask, exclude: Entity) -> QueryFilter<'static> {
    QueryFilter::new()
        .groups(CollisionGroups::new(
            Group::ALL,
            Group::from_bits_truncate(mask.bits()),
        ))
        .exclude_rigid_body(exclude)
}

/// Vertical capsule offset by `center_y` from the body origin.
pub fn capsule_collider(shape: CapsuleShape, radius: f32) -> Collider {
    let half_segment = (shape.height * 0.5 - radius).max(0.0);
    Collider::compound(vec![(
        Vec3::new(0.0, shape.center_y, 0.0),
        Quat::IDENTITY,
        Collider::capsule_y(half_segment, radius),
    )])
}

// =============================================================================
// ADAPTERS
// =============================================================================

/// Read-only queries against the rapier world, ignoring the player's own body.
pub struct RapierWorld<'a, 'c> {
    pub context: &'a RapierContext<'c>,
    pub surface_bounds: &'a dyn Fn(Entity) -> Option<SurfaceBounds>,
    pub player: Entity,
}

impl cap::CollisionQuery for RapierWorld<'_, '_> {
    fn overlap_sphere(&self, center: Vec3, radius: f32, mask: LayerMask) -> bool {
        let mut found = false;
        self.context.intersect_shape(
            center,
            Quat::IDENTITY,
            &*Collider::ball(radius).raw,
            query_filter(mask, self.player),
            |_| {
                found = true;
                false
            },
        );
        found
    }

    fn overlap_capsule(&self, a: Vec3, b: Vec3, radius: f32, mask: LayerMask) -> Vec<Entity> {
        let mut hits = Vec::new();
        self.context.intersect_shape(
            Vec3::ZERO,
            Quat::IDENTITY,
            &*Collider::capsule(a, b, radius).raw,
            query_filter(mask, self.player),
            |entity| {
                hits.push(entity);
                true
            },
        );
        hits
    }

    fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: LayerMask,
    ) -> Option<RayHit> {
        let (entity, hit) = self.context.cast_ray_and_get_normal(
            origin,
            direction,
            max_distance,
            true,
            query_filter(mask, self.player),
        )?;
        Some(RayHit {
            entity,
            point: hit.point,
            normal: hit.normal,
            distance: hit.time_of_impact,
            bounds: (self.surface_bounds)(entity).unwrap_or(SurfaceBounds::point(hit.point)),
        })
    }
}

pub struct RapierBody<'a> {
    pub transform: &'a mut Transform,
    pub velocity: &'a mut Velocity,
    pub force: &'a mut ExternalForce,
    pub impulse: &'a mut ExternalImpulse,
    pub gravity: &'a mut GravityScale,
}

impl cap::RigidBody for RapierBody<'_> {
    fn add_force(&mut self, force: Vec3, mode: ForceMode) {
        match mode {
            ForceMode::Continuous => self.force.force += force,
            ForceMode::Impulse => self.impulse.impulse += force,
        }
    }

    fn linear_velocity(&self) -> Vec3 {
        self.velocity.linvel
    }

    fn set_linear_velocity(&mut self, velocity: Vec3) {
        self.velocity.linvel = velocity;
    }

    fn angular_velocity(&self) -> Vec3 {
        self.velocity.angvel
    }

    fn set_angular_velocity(&mut self, velocity: Vec3) {
        self.velocity.angvel = velocity;
    }

    fn gravity_enabled(&self) -> bool {
        self.gravity.0 > 0.0
    }

    fn set_gravity_enabled(&mut self, enabled: bool) {
        self.gravity.0 = if enabled { 1.0 } else { 0.0 };
    }

    fn position(&self) -> Vec3 {
        self.transform.translation
    }

    fn set_position(&mut self, position: Vec3) {
        self.transform.translation = position;
    }

    fn rotation(&self) -> Quat {
        self.transform.rotation
    }

    fn set_rotation(&mut self, rotation: Quat) {
        self.transform.rotation = rotation;
    }
}

pub struct RapierCapsule<'a> {
    pub collider: &'a mut Collider,
    pub capsule: &'a mut PlayerCapsule,
}

impl cap::CapsuleCollider for RapierCapsule<'_> {
    fn shape(&self) -> CapsuleShape {
        self.capsule.shape
    }

    fn set_shape(&mut self, shape: CapsuleShape) {
        self.capsule.shape = shape;
        *self.collider = capsule_collider(shape, self.capsule.radius);
    }
}

/// Despawns destroyed entities through deferred commands.
pub struct DespawnCommands<'a, 'w, 's> {
    pub commands: &'a mut Commands<'w, 's>,
}

impl cap::WorldCommands for DespawnCommands<'_, '_, '_> {
    fn destroy(&mut self, entity: Entity) {
        self.commands.entity(entity).despawn();
    }
}
