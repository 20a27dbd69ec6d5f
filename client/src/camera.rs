//! First-person and third-person camera rig
//!
//! The perspective coordinator decides which view is live, the look window and the
//! third-person FOV target; this module only places the camera and eases toward them.

use bevy::prelude::*;
use locomotion::{
    CameraPerspectiveCoordinator, CameraState, LocomotionConfig, Stance, StanceChanged,
};

use crate::systems::Player;

/// Eye height above the body origin for first person.
const EYE_HEIGHT: f32 = 0.7;

/// Third person orbit settings
const THIRD_PERSON_DISTANCE: f32 = 5.0;
const THIRD_PERSON_BASE_HEIGHT: f32 = 0.6;
const THIRD_PERSON_DEFAULT_PITCH: f32 = 0.25;

const FOLLOW_RATE: f32 = 25.0;
const FOV_RATE: f32 = 6.0;

/// Mouse-driven look angles (radians). `yaw` is also the controller's camera yaw.
#[derive(Resource, Default)]
pub struct CameraRig {
    pub yaw: f32,
    pub pitch: f32,
}

pub fn spawn_camera(mut commands: Commands, config: Res<LocomotionConfig>) {
    commands.spawn((
        Camera3d::default(),
        Projection::from(PerspectiveProjection {
            fov: config.camera.default_fov.to_radians(),
            ..default()
        }),
        Transform::from_xyz(0.0, 8.0, 14.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));
}

/// Feed stance changes to the coordinator and pull the look back inside its window.
pub fn apply_stance_to_camera(
    mut changes: MessageReader<StanceChanged>,
    mut coordinator: ResMut<CameraPerspectiveCoordinator>,
    mut rig: ResMut<CameraRig>,
) {
    for change in changes.read() {
        coordinator.on_stance_changed(change);
        if matches!(change.to, Stance::Climb | Stance::Glide) {
            rig.yaw = change.yaw;
        }
        if coordinator.live_view() == CameraState::FirstPerson {
            rig.yaw = coordinator.constrain_look_yaw(rig.yaw);
        }
    }
}

/// Follow the player with whichever view the coordinator has made live.
pub fn update_camera(
    player_query: Query<&Transform, (With<Player>, Without<Camera3d>)>,
    mut camera_query: Query<(&mut Transform, &mut Projection), (With<Camera3d>, Without<Player>)>,
    coordinator: Res<CameraPerspectiveCoordinator>,
    config: Res<LocomotionConfig>,
    rig: Res<CameraRig>,
    time: Res<Time>,
) {
    let Ok(player_transform) = player_query.single() else {
        return;
    };
    let Ok((mut camera_transform, mut projection)) = camera_query.single_mut() else {
        return;
    };

    let (target_pos, target_rot, target_fov) = match coordinator.live_view() {
        CameraState::FirstPerson => {
            let pos = player_transform.translation + Vec3::Y * EYE_HEIGHT;
            let rot = Quat::from_euler(EulerRot::YXZ, rig.yaw, rig.pitch, 0.0);
            (pos, rot, config.camera.default_fov)
        }
        CameraState::ThirdPerson => {
            let orbit_pitch = (THIRD_PERSON_DEFAULT_PITCH - rig.pitch * 0.6).clamp(-0.2, 1.3);
            let pivot = player_transform.translation + Vec3::Y * THIRD_PERSON_BASE_HEIGHT;
            let pos = orbit_position(pivot, rig.yaw, orbit_pitch, THIRD_PERSON_DISTANCE);
            (pos, look_at_level(pos, pivot), coordinator.third_person_fov())
        }
    };

    let t = 1.0 - (-FOLLOW_RATE * time.delta_secs()).exp();
    camera_transform.translation = camera_transform.translation.lerp(target_pos, t);
    camera_transform.rotation = camera_transform.rotation.slerp(target_rot, t);

    if let Projection::Perspective(ref mut perspective) = *projection {
        let t = 1.0 - (-FOV_RATE * time.delta_secs()).exp();
        let target = target_fov.to_radians();
        perspective.fov += (target - perspective.fov) * t;
    }
}

/// Point on the orbit sphere behind `yaw`, raised by `pitch`.
fn orbit_position(pivot: Vec3, yaw: f32, pitch: f32, distance: f32) -> Vec3 {
    let behind = Vec3::new(yaw.sin(), 0.0, yaw.cos());
    pivot + behind * (distance * pitch.cos()) + Vec3::Y * (distance * pitch.sin())
}

/// Look at `target` with no roll.
fn look_at_level(eye: Vec3, target: Vec3) -> Quat {
    Transform::from_translation(eye)
        .looking_at(target, Vec3::Y)
        .rotation
}

#[cfg(test)]
mod tests {
    use super::*;
    use locomotion::math::forward_from_yaw;

    #[test]
    fn test_orbit_sits_behind_the_look_direction() {
        for yaw in [0.0_f32, 0.8, -2.0] {
            let eye = orbit_position(Vec3::ZERO, yaw, 0.0, 5.0);
            let look = look_at_level(eye, Vec3::ZERO) * Vec3::NEG_Z;
            assert!((look - forward_from_yaw(yaw)).length() < 1e-4);
        }
    }

    #[test]
    fn test_orbit_pitch_raises_camera() {
        let eye = orbit_position(Vec3::ZERO, 0.0, 0.5, 5.0);
        assert!(eye.y > 0.0);
        assert!((eye.length() - 5.0).abs() < 1e-4);
    }
}
