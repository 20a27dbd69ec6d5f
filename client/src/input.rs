//! Player input handling
//!
//! Raw device levels are sampled into `SampledInput`, then the locomotion router turns
//! them into `InputEvent` messages. The router's context is the whole `World`, so the
//! perspective toggle can flip the coordinator directly.

use bevy::input::mouse::MouseMotion;
use bevy::prelude::*;
use bevy::window::{CursorGrabMode, CursorOptions, PrimaryWindow};
use locomotion::math::wrap_angle;
use locomotion::{
    CameraPerspectiveCoordinator, CameraState, InputEvent, InputEventKind, InputEventRouter,
    RawInput,
};
use std::f32::consts::FRAC_PI_2;

use crate::camera::CameraRig;

pub const MOUSE_SENSITIVITY: f32 = 0.003;

/// This frame's raw levels.
#[derive(Resource, Default)]
pub struct SampledInput(pub RawInput);

#[derive(Resource)]
pub struct PlayerInputRouter(pub InputEventRouter<World>);

impl Default for PlayerInputRouter {
    fn default() -> Self {
        let mut router = InputEventRouter::new();
        for kind in InputEventKind::ALL {
            if kind == InputEventKind::TogglePerspective {
                router.subscribe(kind, |world: &mut World, _: &InputEvent| {
                    let changed = world
                        .resource_mut::<CameraPerspectiveCoordinator>()
                        .toggle();
                    world.write_message(changed);
                });
            } else {
                router.subscribe(kind, |world: &mut World, event: &InputEvent| {
                    world.write_message(*event);
                });
            }
        }
        Self(router)
    }
}

fn cursor_locked(cursor: &Query<&CursorOptions, With<PrimaryWindow>>) -> bool {
    cursor
        .single()
        .is_ok_and(|options| options.grab_mode == CursorGrabMode::Locked)
}

/// Read keyboard and mouse buttons into `SampledInput`.
pub fn sample_raw_input(
    keyboard: Res<ButtonInput<KeyCode>>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    cursor: Query<&CursorOptions, With<PrimaryWindow>>,
    mut sampled: ResMut<SampledInput>,
) {
    let axis = |positive: KeyCode, negative: KeyCode| {
        let mut value = 0.0;
        if keyboard.pressed(positive) {
            value += 1.0;
        }
        if keyboard.pressed(negative) {
            value -= 1.0;
        }
        value
    };

    sampled.0 = RawInput {
        move_axis: Vec2::new(axis(KeyCode::KeyD, KeyCode::KeyA), axis(KeyCode::KeyW, KeyCode::KeyS)),
        sprint: keyboard.pressed(KeyCode::ShiftLeft) || keyboard.pressed(KeyCode::ShiftRight),
        jump: keyboard.pressed(KeyCode::Space),
        climb: keyboard.pressed(KeyCode::KeyE),
        cancel: keyboard.pressed(KeyCode::KeyX),
        toggle_perspective: keyboard.pressed(KeyCode::KeyP),
        crouch: keyboard.pressed(KeyCode::KeyC),
        glide: keyboard.pressed(KeyCode::KeyG),
        // The click that grabs the cursor is not a punch.
        punch: cursor_locked(&cursor) && mouse_button.pressed(MouseButton::Left),
    };
}

/// Raise this frame's input events.
pub fn route_player_input(world: &mut World) {
    let raw = world.resource::<SampledInput>().0;
    world.resource_scope(|world, mut router: Mut<PlayerInputRouter>| {
        router.0.process_frame(world, &raw);
    });
}

/// Mouse look. First-person yaw stays inside the coordinator's look window.
pub fn handle_mouse_look(
    mut mouse_motion: MessageReader<MouseMotion>,
    coordinator: Res<CameraPerspectiveCoordinator>,
    mut rig: ResMut<CameraRig>,
) {
    let mut delta = Vec2::ZERO;
    for motion in mouse_motion.read() {
        delta += motion.delta;
    }
    if delta == Vec2::ZERO {
        return;
    }

    let yaw = rig.yaw - delta.x * MOUSE_SENSITIVITY;
    rig.yaw = match coordinator.live_view() {
        CameraState::FirstPerson => coordinator.constrain_look_yaw(yaw),
        CameraState::ThirdPerson => wrap_angle(yaw),
    };
    rig.pitch = (rig.pitch - delta.y * MOUSE_SENSITIVITY).clamp(-FRAC_PI_2 + 0.01, FRAC_PI_2 - 0.01);
}

pub fn grab_cursor(
    mut cursor: Query<&mut CursorOptions, With<PrimaryWindow>>,
    mouse_button: Res<ButtonInput<MouseButton>>,
) {
    if !mouse_button.just_pressed(MouseButton::Left) {
        return;
    }
    if let Ok(mut options) = cursor.single_mut() {
        options.grab_mode = CursorGrabMode::Locked;
        options.visible = false;
    }
}

pub fn release_cursor(
    mut cursor: Query<&mut CursorOptions, With<PrimaryWindow>>,
    keyboard: Res<ButtonInput<KeyCode>>,
) {
    if !keyboard.just_pressed(KeyCode::Escape) {
        return;
    }
    if let Ok(mut options) = cursor.single_mut() {
        options.grab_mode = CursorGrabMode::None;
        options.visible = true;
    }
}
