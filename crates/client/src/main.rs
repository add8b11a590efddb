//! Limbot Client - windowed player for articulated bots
//!
//! Boots a 2D scene with one bot, the runtime controller on top of it, and
//! an auto-framing camera. Pass a RON rig file as the first argument to play
//! a custom bot; without one the built-in three-limb rig is used.
//!
//! ## Plugins
//! - LimbotRuntimePlugin: input, controller state machine, choreographies
//! - FramingCameraPlugin: follow + zoom-to-fit orthographic camera

mod scene;

use bevy::prelude::*;
use bevy_framing_camera::FramingCameraPlugin;
use limbot_runtime::LimbotRuntimePlugin;
use std::path::PathBuf;
use tracing::info;

/// Command line arguments
#[derive(Resource, Default)]
struct ClientArgs {
    rig_path: Option<PathBuf>,
}

fn main() {
    // Parse command line args
    let args: Vec<String> = std::env::args().collect();
    let rig_path = args.get(1).map(PathBuf::from);

    App::new()
        // Core Bevy plugins
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Limbot".to_string(),
                resolution: bevy::window::WindowResolution::new(1280, 720),
                present_mode: bevy::window::PresentMode::Fifo, // VSync
                ..default()
            }),
            ..default()
        }))
        // Runtime (input, controller, choreographies)
        .add_plugins(LimbotRuntimePlugin)
        // Auto-framing camera
        .add_plugins(FramingCameraPlugin)
        // Render sync runs after the runtime has advanced every chain
        .add_systems(Update, scene::sync_limb_transforms)
        // Resources
        .insert_resource(ClientArgs { rig_path })
        // Scene setup
        .add_systems(Startup, setup_scene)
        .run();
}

fn setup_scene(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<ColorMaterial>>,
    args: Res<ClientArgs>,
) {
    info!("Setting up Limbot scene...");

    scene::spawn_camera(&mut commands);

    let spec = scene::load_rig(args.rig_path.as_deref());
    scene::spawn_bot(&mut commands, &mut meshes, &mut materials, spec);

    info!("Scene ready");
}
