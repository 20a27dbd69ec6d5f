//! Character locomotion core: stance state machine, climb clamp, combo timer, camera
//! perspective and input routing. Engine-agnostic apart from Bevy math and ECS derives;
//! the physics world is reached only through `capabilities`.

use bevy::prelude::*;

pub mod anim;
pub mod camera;
pub mod capabilities;
pub mod combo;
pub mod config;
pub mod controller;
pub mod input;
pub mod math;
pub mod probe;
pub mod stance;

#[cfg(test)]
mod test_support;

pub use camera::{CameraPerspectiveCoordinator, CameraState, LookConstraint, PerspectiveChanged};
pub use capabilities::{
    AnimationSink, CapsuleCollider, CapsuleShape, CollisionQuery, ControllerContext, ForceMode,
    LayerMask, RayHit, RigidBody, SurfaceBounds, WorldCommands,
};
pub use config::LocomotionConfig;
pub use controller::{GlideAttitude, LocomotionController, LocomotionEvent};
pub use input::{InputEvent, InputEventKind, InputEventRouter, RawInput, Subscription};
pub use stance::{Stance, StanceChanged};

/// Default config file, relative to the binary's working directory.
pub const CONFIG_PATH: &str = "assets/locomotion.ron";

// --- Locomotion Plugin ---

/// Registers the locomotion messages and the shared resources.
pub struct LocomotionPlugin;

impl Plugin for LocomotionPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<InputEvent>()
            .add_message::<StanceChanged>()
            .add_message::<PerspectiveChanged>();

        let config = app
            .world()
            .get_resource::<LocomotionConfig>()
            .cloned()
            .unwrap_or_default();
        app.insert_resource(CameraPerspectiveCoordinator::new(config.camera.clone()));
        app.insert_resource(config);
    }
}
