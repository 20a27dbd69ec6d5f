//! Player systems
//!
//! Spawns the controlled body and runs the locomotion controller against rapier: once per
//! frame for input and cosmetics, once per fixed tick for forces.

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;
use locomotion::{
    ControllerContext, InputEvent, LayerMask, LocomotionConfig, LocomotionController,
    LocomotionEvent, PerspectiveChanged, StanceChanged, SurfaceBounds,
};

use super::animation::{AnimatorParams, PlayerVisual};
use super::physics::{
    capsule_collider, layer_groups, DespawnCommands, PlayerCapsule, RapierBody, RapierCapsule,
    RapierWorld, SurfaceExtents,
};
use crate::camera::CameraRig;

/// Where the player appears: on the launch platform, so walking off its edge is a glide.
const SPAWN_POSITION: Vec3 = Vec3::new(0.0, 6.0, 6.0);

/// Length of the punch animation; `attack_finished` fires when it ends.
const PUNCH_DURATION_SECS: f32 = 0.45;

// =============================================================================
// COMPONENTS
// =============================================================================

#[derive(Component)]
pub struct Player;

/// Running punch animation, if any.
#[derive(Component, Default)]
pub struct PunchTimer(pub Option<Timer>);

type PlayerParts = (
    Entity,
    &'static mut LocomotionController,
    &'static mut Transform,
    &'static mut Velocity,
    &'static mut ExternalForce,
    &'static mut ExternalImpulse,
    &'static mut GravityScale,
    &'static mut Collider,
    &'static mut PlayerCapsule,
    &'static mut AnimatorParams,
);

// =============================================================================
// SPAWNING
// =============================================================================

pub fn spawn_player(
    mut commands: Commands,
    config: Res<LocomotionConfig>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let shape = &config.shape;
    let capsule = PlayerCapsule {
        shape: shape.stand,
        radius: shape.radius,
    };

    let visual_mesh = meshes.add(Capsule3d::new(
        shape.radius,
        (shape.stand.height - 2.0 * shape.radius).max(0.0),
    ));
    let visual_material = materials.add(StandardMaterial {
        base_color: Color::srgb(0.2, 0.5, 0.9),
        perceptual_roughness: 0.7,
        ..default()
    });

    commands
        .spawn((
            Player,
            LocomotionController::new(config.clone()),
            AnimatorParams::default(),
            PunchTimer::default(),
            Transform::from_translation(SPAWN_POSITION),
            Visibility::default(),
            RigidBody::Dynamic,
            capsule_collider(capsule.shape, capsule.radius),
            capsule,
            layer_groups(LayerMask::PLAYER),
            LockedAxes::ROTATION_LOCKED,
        ))
        .insert((
            Velocity::default(),
            ExternalForce::default(),
            ExternalImpulse::default(),
            GravityScale(1.0),
            Damping {
                linear_damping: 1.5,
                angular_damping: 1.0,
            },
            ColliderMassProperties::Mass(1.0),
            Friction::coefficient(0.0),
            Ccd::enabled(),
        ))
        .with_children(|parent| {
            parent.spawn((
                PlayerVisual {
                    base_height: shape.stand.height,
                },
                Mesh3d(visual_mesh),
                MeshMaterial3d(visual_material),
                Transform::default(),
            ));
        });

    info!("Spawned player at {SPAWN_POSITION}");
}

// =============================================================================
// CONTROLLER
// =============================================================================

fn surface_bounds(
    surfaces: &Query<(&GlobalTransform, &SurfaceExtents)>,
    entity: Entity,
) -> Option<SurfaceBounds> {
    let (transform, extents) = surfaces.get(entity).ok()?;
    Some(SurfaceBounds::from_center_half_extents(
        transform.translation(),
        extents.0,
    ))
}

/// Per-frame controller work: perspective changes, routed input, `frame_update`, punch
/// timing and event fan-out.
#[allow(clippy::too_many_arguments)]
pub fn drive_player_frame(
    time: Res<Time>,
    rapier: ReadRapierContext,
    surfaces: Query<(&GlobalTransform, &SurfaceExtents)>,
    rig: Res<CameraRig>,
    mut commands: Commands,
    mut inputs: MessageReader<InputEvent>,
    mut perspective: MessageReader<PerspectiveChanged>,
    mut stance_changes: MessageWriter<StanceChanged>,
    mut players: Query<(PlayerParts, &mut PunchTimer), With<Player>>,
) {
    let Ok(context) = rapier.single() else {
        return;
    };
    let lookup = |entity: Entity| surface_bounds(&surfaces, entity);
    let perspective: Vec<PerspectiveChanged> = perspective.read().copied().collect();
    let inputs: Vec<InputEvent> = inputs.read().copied().collect();

    for (parts, mut punch) in &mut players {
        let (
            entity,
            mut controller,
            mut transform,
            mut velocity,
            mut force,
            mut impulse,
            mut gravity,
            mut collider,
            mut capsule,
            mut animator,
        ) = parts;

        for change in &perspective {
            controller.on_perspective_changed(change, &mut *animator);
        }

        let world = RapierWorld {
            context: &context,
            surface_bounds: &lookup,
            player: entity,
        };
        let mut body = RapierBody {
            transform: &mut transform,
            velocity: &mut velocity,
            force: &mut force,
            impulse: &mut impulse,
            gravity: &mut gravity,
        };
        let mut shape = RapierCapsule {
            collider: &mut collider,
            capsule: &mut capsule,
        };
        let mut despawn = DespawnCommands {
            commands: &mut commands,
        };
        let mut ctx = ControllerContext {
            query: &world,
            body: &mut body,
            collider: &mut shape,
            animator: &mut *animator,
            commands: &mut despawn,
            camera_yaw: rig.yaw,
            now: time.elapsed_secs_f64(),
        };

        for event in &inputs {
            controller.handle_input(event, &mut ctx);
        }

        if let Some(timer) = punch.0.as_mut() {
            if timer.tick(time.delta()).just_finished() {
                punch.0 = None;
                controller.attack_finished(&mut ctx);
            }
        }

        controller.frame_update(time.delta_secs(), &mut ctx);

        for event in controller.drain_events() {
            match event {
                LocomotionEvent::StanceChanged(change) => {
                    stance_changes.write(change);
                }
                LocomotionEvent::Punched { combo } => {
                    debug!("Punch {combo}");
                    punch.0 = Some(Timer::from_seconds(PUNCH_DURATION_SECS, TimerMode::Once));
                }
                LocomotionEvent::Landed => debug!("Landed"),
                LocomotionEvent::Jumped
                | LocomotionEvent::ComboReset
                | LocomotionEvent::TargetsHit { .. } => {}
            }
        }
    }
}

/// Fixed-tick controller work: forces, climb clamp, step assist.
pub fn drive_player_physics(
    rapier: ReadRapierContext,
    surfaces: Query<(&GlobalTransform, &SurfaceExtents)>,
    rig: Res<CameraRig>,
    time: Res<Time>,
    mut commands: Commands,
    mut players: Query<PlayerParts, With<Player>>,
) {
    let Ok(context) = rapier.single() else {
        return;
    };
    let lookup = |entity: Entity| surface_bounds(&surfaces, entity);

    for (
        entity,
        mut controller,
        mut transform,
        mut velocity,
        mut force,
        mut impulse,
        mut gravity,
        mut collider,
        mut capsule,
        mut animator,
    ) in &mut players
    {
        // Continuous forces only last one tick.
        force.force = Vec3::ZERO;
        force.torque = Vec3::ZERO;

        let world = RapierWorld {
            context: &context,
            surface_bounds: &lookup,
            player: entity,
        };
        let mut body = RapierBody {
            transform: &mut transform,
            velocity: &mut velocity,
            force: &mut force,
            impulse: &mut impulse,
            gravity: &mut gravity,
        };
        let mut shape = RapierCapsule {
            collider: &mut collider,
            capsule: &mut capsule,
        };
        let mut despawn = DespawnCommands {
            commands: &mut commands,
        };
        let mut ctx = ControllerContext {
            query: &world,
            body: &mut body,
            collider: &mut shape,
            animator: &mut *animator,
            commands: &mut despawn,
            camera_yaw: rig.yaw,
            now: time.elapsed_secs_f64(),
        };
        controller.fixed_update(&mut ctx);
    }
}
