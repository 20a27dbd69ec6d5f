//! Debug overlay: stance, speed, combo, perspective and what is left to punch.

use bevy::prelude::*;
use locomotion::{anim, CameraPerspectiveCoordinator, CameraState, LocomotionController};

use super::animation::AnimatorParams;
use super::player::Player;
use super::world::Dummy;

#[derive(Component)]
pub struct HudText;

pub fn spawn_hud(mut commands: Commands) {
    commands.spawn((
        HudText,
        Text::new(""),
        TextFont {
            font_size: 16.0,
            ..default()
        },
        TextColor(Color::WHITE),
        Node {
            position_type: PositionType::Absolute,
            top: Val::Px(8.0),
            left: Val::Px(8.0),
            ..default()
        },
    ));
}

pub fn update_hud(
    players: Query<(&LocomotionController, &AnimatorParams), With<Player>>,
    dummies: Query<(), With<Dummy>>,
    coordinator: Res<CameraPerspectiveCoordinator>,
    mut hud: Query<&mut Text, With<HudText>>,
) {
    let Ok(mut text) = hud.single_mut() else {
        return;
    };
    let Ok((controller, params)) = players.single() else {
        return;
    };

    let view = match coordinator.live_view() {
        CameraState::FirstPerson => "first person",
        CameraState::ThirdPerson => "third person",
    };
    let look = match coordinator.look_constraint().bounds() {
        Some((min, max)) => format!("{:.0}..{:.0} deg", min.to_degrees(), max.to_degrees()),
        None => "free".to_string(),
    };
    let clamp = controller.clamp_state();
    text.0 = format!(
        "stance: {}  grounded: {}\nspeed: {:.1} (target {:.1})\ncombo: {}\nview: {} (priority {}, fov {:.0}, look {})\nclimb edges L/R/T: {}/{}/{}\ndummies left: {}\n\n\
         WASD move, Shift sprint, Space jump, E climb, X cancel, C crouch, G glide,\n\
         LMB punch, P perspective, Esc release cursor",
        controller.stance().display_name(),
        params.flag(anim::IS_GROUNDED),
        params.float(anim::SPEED),
        controller.speed(),
        params.int(anim::COMBO),
        view,
        coordinator.priority(coordinator.live_view()),
        coordinator.third_person_fov(),
        look,
        clamp.left_climbable,
        clamp.right_climbable,
        clamp.top_climbable,
        dummies.iter().count(),
    );
}
