//! Locomotion sandbox - a single controlled character in a small test yard
//!
//! Walk, sprint, crouch, jump, climb the ivy walls, glide off the launch platform and
//! punch the dummies. Tuning is read from `assets/locomotion.ron` at startup.

mod camera;
mod input;
mod systems;

use bevy::prelude::*;
use bevy::window::WindowResolution;
use bevy_rapier3d::prelude::*;
use locomotion::{LocomotionConfig, LocomotionPlugin, CONFIG_PATH};
use std::path::PathBuf;

/// Find the tuning file: next to the crate during development, else relative to the
/// working directory.
fn config_path() -> PathBuf {
    let dev = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(CONFIG_PATH);
    if dev.exists() {
        dev
    } else {
        PathBuf::from(CONFIG_PATH)
    }
}

fn load_config() -> LocomotionConfig {
    let path = config_path();
    match LocomotionConfig::load_from_file(&path) {
        Ok(config) => {
            info!("Loaded locomotion config from {:?}", path);
            config
        }
        Err(e) => {
            warn!("Using default locomotion config: {}", e);
            LocomotionConfig::default()
        }
    }
}

fn main() {
    let mut app = App::new();

    app.add_plugins(DefaultPlugins.set(WindowPlugin {
        primary_window: Some(Window {
            title: "Locomotion Sandbox".to_string(),
            resolution: WindowResolution::new(1280, 720),
            ..default()
        }),
        ..default()
    }));

    // Loaded after DefaultPlugins so the log plugin is up.
    app.insert_resource(load_config());
    app.add_plugins(LocomotionPlugin);

    // Forces are written in FixedUpdate, so rapier steps there too.
    app.add_plugins(RapierPhysicsPlugin::<NoUserData>::default().in_fixed_schedule());

    app.init_resource::<input::SampledInput>();
    app.init_resource::<input::PlayerInputRouter>();
    app.init_resource::<camera::CameraRig>();

    app.add_systems(
        Startup,
        (
            systems::spawn_world,
            systems::spawn_player,
            camera::spawn_camera,
            systems::spawn_hud,
        ),
    );

    // ORDER MATTERS: input -> controller -> camera reacts to stance -> camera/visuals.
    app.add_systems(
        Update,
        (
            input::sample_raw_input,
            input::route_player_input,
            input::handle_mouse_look,
            systems::drive_player_frame,
            camera::apply_stance_to_camera,
            camera::update_camera,
            systems::update_player_pose,
            systems::update_hud,
        )
            .chain(),
    );
    app.add_systems(Update, (input::grab_cursor, input::release_cursor));

    app.add_systems(
        FixedUpdate,
        systems::drive_player_physics.before(PhysicsSet::SyncBackend),
    );

    info!("Starting locomotion sandbox");
    app.run();
}
