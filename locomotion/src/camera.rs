//! First/third-person perspective state.
//!
//! The coordinator owns which view is live (by priority weight), the first-person look
//! constraint and the third-person FOV target. It does no interpolation itself; a camera
//! rig reads these values every frame.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::CameraConfig;
use crate::math::wrap_angle;
use crate::stance::{Stance, StanceChanged};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CameraState {
    FirstPerson,
    #[default]
    ThirdPerson,
}

impl CameraState {
    pub fn toggled(self) -> Self {
        match self {
            CameraState::FirstPerson => CameraState::ThirdPerson,
            CameraState::ThirdPerson => CameraState::FirstPerson,
        }
    }
}

/// Raised on every perspective toggle.
#[derive(Message, Clone, Copy, Debug, PartialEq, Eq)]
pub struct PerspectiveChanged {
    pub state: CameraState,
}

/// Horizontal look restriction for the first-person view (radians).
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LookConstraint {
    /// Free look, wrapping around (-PI, PI].
    Wrapped,
    /// Look held within `center ± half_width`, no wrap.
    Clamped { center: f32, half_width: f32 },
}

impl LookConstraint {
    pub fn apply(&self, yaw: f32) -> f32 {
        match *self {
            LookConstraint::Wrapped => wrap_angle(yaw),
            LookConstraint::Clamped { center, half_width } => {
                let offset = wrap_angle(yaw - center).clamp(-half_width, half_width);
                center + offset
            }
        }
    }

    pub fn bounds(&self) -> Option<(f32, f32)> {
        match *self {
            LookConstraint::Wrapped => None,
            LookConstraint::Clamped { center, half_width } => {
                Some((center - half_width, center + half_width))
            }
        }
    }
}

#[derive(Resource, Clone, Debug)]
pub struct CameraPerspectiveCoordinator {
    state: CameraState,
    first_person_priority: i32,
    third_person_priority: i32,
    look: LookConstraint,
    third_person_fov: f32,
    config: CameraConfig,
}

impl CameraPerspectiveCoordinator {
    /// Starts in third person with unrestricted look and the default FOV.
    pub fn new(config: CameraConfig) -> Self {
        let mut coordinator = Self {
            state: CameraState::ThirdPerson,
            first_person_priority: config.inactive_priority,
            third_person_priority: config.active_priority,
            look: LookConstraint::Wrapped,
            third_person_fov: config.default_fov,
            config,
        };
        coordinator.apply_state(CameraState::ThirdPerson);
        coordinator
    }

    pub fn state(&self) -> CameraState {
        self.state
    }

    pub fn priority(&self, state: CameraState) -> i32 {
        match state {
            CameraState::FirstPerson => self.first_person_priority,
            CameraState::ThirdPerson => self.third_person_priority,
        }
    }

    /// The view with the higher priority weight.
    pub fn live_view(&self) -> CameraState {
        if self.first_person_priority > self.third_person_priority {
            CameraState::FirstPerson
        } else {
            CameraState::ThirdPerson
        }
    }

    pub fn look_constraint(&self) -> LookConstraint {
        self.look
    }

    /// Third-person field of view target, in degrees.
    pub fn third_person_fov(&self) -> f32 {
        self.third_person_fov
    }

    pub fn toggle(&mut self) -> PerspectiveChanged {
        let next = self.state.toggled();
        self.apply_state(next);
        info!(
            "Camera perspective: {}",
            match next {
                CameraState::FirstPerson => "first person",
                CameraState::ThirdPerson => "third person",
            }
        );
        PerspectiveChanged { state: next }
    }

    fn apply_state(&mut self, state: CameraState) {
        self.state = state;
        let (active, inactive) = (self.config.active_priority, self.config.inactive_priority);
        match state {
            CameraState::FirstPerson => {
                self.first_person_priority = active;
                self.third_person_priority = inactive;
            }
            CameraState::ThirdPerson => {
                self.first_person_priority = inactive;
                self.third_person_priority = active;
            }
        }
    }

    /// Restrict first-person look to a window around `reference_yaw`, or restore free look.
    pub fn set_clamped_look(&mut self, enabled: bool, reference_yaw: f32) {
        self.look = if enabled {
            LookConstraint::Clamped {
                center: wrap_angle(reference_yaw),
                half_width: self.config.look_clamp_half_angle.to_radians(),
            }
        } else {
            LookConstraint::Wrapped
        };
    }

    pub fn set_third_person_field_of_view(&mut self, fov: f32) {
        if fov.is_finite() && fov > 0.0 {
            self.third_person_fov = fov;
        }
    }

    /// Apply the current look constraint to a requested first-person yaw.
    pub fn constrain_look_yaw(&self, yaw: f32) -> f32 {
        self.look.apply(yaw)
    }

    pub fn on_stance_changed(&mut self, change: &StanceChanged) {
        match change.to {
            Stance::Climb => {
                self.set_clamped_look(true, change.yaw);
                self.set_third_person_field_of_view(self.config.climb_fov);
            }
            Stance::Glide => self.set_clamped_look(true, change.yaw),
            Stance::Stand | Stance::Crouch if change.from.clamps_look() => {
                self.set_clamped_look(false, 0.0);
                self.set_third_person_field_of_view(self.config.default_fov);
            }
            Stance::Stand | Stance::Crouch => {}
        }
    }
}

impl Default for CameraPerspectiveCoordinator {
    fn default() -> Self {
        Self::new(CameraConfig::default())
    }
}
