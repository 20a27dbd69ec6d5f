//! Locomotion stance and the notification raised when it changes.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Mutually exclusive movement mode of the controlled character.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stance {
    #[default]
    Stand,
    Crouch,
    Climb,
    Glide,
}

impl Stance {
    /// Stances that restrict first-person look while active.
    pub fn clamps_look(self) -> bool {
        matches!(self, Stance::Climb | Stance::Glide)
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Stance::Stand => "stand",
            Stance::Crouch => "crouch",
            Stance::Climb => "climb",
            Stance::Glide => "glide",
        }
    }
}

/// Raised once per stance transition.
#[derive(Message, Clone, Copy, Debug, PartialEq)]
pub struct StanceChanged {
    pub from: Stance,
    pub to: Stance,
    /// Body yaw (radians) right after the transition.
    pub yaw: f32,
}
