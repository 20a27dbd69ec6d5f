//! Animation parameters and the placeholder pose that displays them.
//!
//! There is no skinned model; the player capsule mesh is scaled to the controller capsule
//! and tinted by stance so the state machine is visible.

use bevy::prelude::*;
use locomotion::{anim, AnimationSink};
use std::collections::HashMap;

use super::physics::PlayerCapsule;
use super::player::Player;

/// Named animation parameters written by the controller.
#[derive(Component, Default, Debug)]
pub struct AnimatorParams {
    floats: HashMap<&'static str, f32>,
    bools: HashMap<&'static str, bool>,
    ints: HashMap<&'static str, i32>,
}

impl AnimatorParams {
    pub fn float(&self, name: &str) -> f32 {
        self.floats.get(name).copied().unwrap_or(0.0)
    }

    pub fn flag(&self, name: &str) -> bool {
        self.bools.get(name).copied().unwrap_or(false)
    }

    pub fn int(&self, name: &str) -> i32 {
        self.ints.get(name).copied().unwrap_or(0)
    }
}

impl AnimationSink for AnimatorParams {
    fn set_float(&mut self, name: &'static str, value: f32) {
        self.floats.insert(name, value);
    }

    fn set_bool(&mut self, name: &'static str, value: bool) {
        if self.bools.insert(name, value) != Some(value) {
            debug!("anim {name} = {value}");
        }
    }

    fn set_int(&mut self, name: &'static str, value: i32) {
        self.ints.insert(name, value);
    }

    fn set_trigger(&mut self, name: &'static str) {
        debug!("anim trigger {name} (combo {})", self.int(anim::COMBO));
    }
}

/// Visual child of the player body.
#[derive(Component)]
pub struct PlayerVisual {
    /// Mesh height the visual was built with.
    pub base_height: f32,
}

const STAND_COLOR: Color = Color::srgb(0.2, 0.5, 0.9);
const CROUCH_COLOR: Color = Color::srgb(0.2, 0.7, 0.5);
const CLIMB_COLOR: Color = Color::srgb(0.9, 0.6, 0.1);
const GLIDE_COLOR: Color = Color::srgb(0.7, 0.3, 0.9);

/// Fit the visual capsule to the collider and colour it by stance.
pub fn update_player_pose(
    players: Query<(&AnimatorParams, &PlayerCapsule, &Children), With<Player>>,
    mut visuals: Query<(&PlayerVisual, &mut Transform, &MeshMaterial3d<StandardMaterial>)>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    for (params, capsule, children) in &players {
        let color = if params.flag(anim::IS_CLIMBING) {
            CLIMB_COLOR
        } else if params.flag(anim::IS_GLIDING) {
            GLIDE_COLOR
        } else if params.flag(anim::IS_CROUCH) {
            CROUCH_COLOR
        } else {
            STAND_COLOR
        };

        for child in children.iter() {
            let Ok((visual, mut transform, material)) = visuals.get_mut(child) else {
                continue;
            };
            transform.translation.y = capsule.shape.center_y;
            transform.scale.y = capsule.shape.height / visual.base_height;
            if let Some(material) = materials.get_mut(&material.0) {
                material.base_color = color;
            }
        }
    }
}
