//! World systems
//!
//! Lights and the test yard: ground, climbable walls with a ledge, a step, a low tunnel
//! for the crouch guard and a scatter of hittable dummies.

use bevy::light::{light_consts::lux, CascadeShadowConfigBuilder};
use bevy::prelude::*;
use bevy_rapier3d::prelude::*;
use locomotion::LayerMask;
use rand::Rng;

use super::physics::{layer_groups, SurfaceExtents};

/// Dummies are scattered inside this square around the origin.
const DUMMY_AREA_HALF: f32 = 12.0;
const DUMMY_COUNT: usize = 8;
/// Keep dummies off the walls and the spawn point.
const DUMMY_CLEAR_RADIUS: f32 = 4.0;

// =============================================================================
// COMPONENTS
// =============================================================================

/// Root entity for the yard.
#[derive(Component)]
pub struct YardRoot;

/// Something a punch can knock out of the world.
#[derive(Component)]
pub struct Dummy;

// =============================================================================
// SPAWNING
// =============================================================================

struct BoxSpec {
    center: Vec3,
    half_extents: Vec3,
    layer: LayerMask,
    color: Color,
}

fn spawn_box(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    root: Entity,
    spec: BoxSpec,
) {
    let size = spec.half_extents * 2.0;
    let entity = commands
        .spawn((
            Mesh3d(meshes.add(Cuboid::new(size.x, size.y, size.z))),
            MeshMaterial3d(materials.add(StandardMaterial {
                base_color: spec.color,
                perceptual_roughness: 0.9,
                ..default()
            })),
            Transform::from_translation(spec.center),
            RigidBody::Fixed,
            Collider::cuboid(spec.half_extents.x, spec.half_extents.y, spec.half_extents.z),
            layer_groups(spec.layer),
            SurfaceExtents(spec.half_extents),
        ))
        .id();
    commands.entity(root).add_child(entity);
}

pub fn spawn_world(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let root = commands
        .spawn((YardRoot, Transform::default(), Visibility::default()))
        .id();

    let sun = commands
        .spawn((
            DirectionalLight {
                illuminance: lux::AMBIENT_DAYLIGHT,
                shadows_enabled: true,
                ..default()
            },
            CascadeShadowConfigBuilder {
                num_cascades: 2,
                maximum_distance: 60.0,
                ..default()
            }
            .build(),
            Transform::from_rotation(Quat::from_euler(EulerRot::XYZ, -0.9, 0.4, 0.0)),
        ))
        .id();
    commands.entity(root).add_child(sun);

    commands.insert_resource(AmbientLight {
        color: Color::WHITE,
        brightness: 300.0,
        affects_lightmapped_meshes: true,
    });
    commands.insert_resource(ClearColor(Color::srgb(0.55, 0.7, 0.85)));

    let stone = Color::srgb(0.55, 0.55, 0.6);
    let ivy = Color::srgb(0.35, 0.55, 0.3);
    let boxes = [
        // Ground
        BoxSpec {
            center: Vec3::new(0.0, -0.5, 0.0),
            half_extents: Vec3::new(30.0, 0.5, 30.0),
            layer: LayerMask::GROUND,
            color: Color::srgb(0.45, 0.42, 0.38),
        },
        // Climbing wall ahead of spawn: 8 wide, topped out at 5 (the ledge).
        BoxSpec {
            center: Vec3::new(0.0, 2.5, -8.0),
            half_extents: Vec3::new(4.0, 2.5, 0.5),
            layer: LayerMask::CLIMBABLE,
            color: ivy,
        },
        // Plain wall above the ledge: not climbable.
        BoxSpec {
            center: Vec3::new(0.0, 7.0, -8.5),
            half_extents: Vec3::new(4.0, 2.0, 0.5),
            layer: LayerMask::OBSTACLE,
            color: stone,
        },
        // Narrow climbing pillar, for the side edges.
        BoxSpec {
            center: Vec3::new(10.0, 4.0, -4.0),
            half_extents: Vec3::new(0.75, 4.0, 0.75),
            layer: LayerMask::CLIMBABLE,
            color: ivy,
        },
        // Step
        BoxSpec {
            center: Vec3::new(4.0, 0.15, -2.0),
            half_extents: Vec3::new(1.5, 0.15, 1.0),
            layer: LayerMask::STEP,
            color: stone,
        },
        // Tunnel: two sides and a roof at 1.4.
        BoxSpec {
            center: Vec3::new(-8.0, 0.7, -2.0),
            half_extents: Vec3::new(0.25, 0.7, 3.0),
            layer: LayerMask::OBSTACLE,
            color: stone,
        },
        BoxSpec {
            center: Vec3::new(-10.0, 0.7, -2.0),
            half_extents: Vec3::new(0.25, 0.7, 3.0),
            layer: LayerMask::OBSTACLE,
            color: stone,
        },
        BoxSpec {
            center: Vec3::new(-9.0, 1.6, -2.0),
            half_extents: Vec3::new(1.25, 0.2, 3.0),
            layer: LayerMask::OBSTACLE,
            color: stone,
        },
        // Launch platform under the spawn point.
        BoxSpec {
            center: Vec3::new(0.0, 2.0, 6.0),
            half_extents: Vec3::new(1.5, 2.0, 1.5),
            layer: LayerMask::GROUND,
            color: stone,
        },
    ];
    for spec in boxes {
        spawn_box(&mut commands, &mut meshes, &mut materials, root, spec);
    }

    spawn_dummies(&mut commands, &mut meshes, &mut materials, root);
    info!("Yard spawned");
}

fn spawn_dummies(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    root: Entity,
) {
    let mesh = meshes.add(Capsule3d::new(0.3, 1.0));
    let material = materials.add(StandardMaterial {
        base_color: Color::srgb(0.85, 0.25, 0.2),
        ..default()
    });

    let mut rng = rand::thread_rng();
    let mut placed = 0;
    while placed < DUMMY_COUNT {
        let x = rng.gen_range(-DUMMY_AREA_HALF..DUMMY_AREA_HALF);
        let z = rng.gen_range(-DUMMY_AREA_HALF..DUMMY_AREA_HALF);
        let position = Vec3::new(x, 0.8, z);
        if (Vec2::new(x, z) - Vec2::new(0.0, 6.0)).length() < DUMMY_CLEAR_RADIUS
            || (z + 8.0).abs() < 2.0
        {
            continue;
        }

        let dummy = commands
            .spawn((
                Dummy,
                Mesh3d(mesh.clone()),
                MeshMaterial3d(material.clone()),
                Transform::from_translation(position),
                RigidBody::Fixed,
                Collider::capsule_y(0.5, 0.3),
                layer_groups(LayerMask::HITTABLE),
            ))
            .id();
        commands.entity(root).add_child(dummy);
        placed += 1;
    }
}
