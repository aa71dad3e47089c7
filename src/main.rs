use bevy::prelude::*;
use bevy::render::render_asset::RenderAssetUsages;
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat};
use bevy::window::WindowCloseRequested;

mod agent;
mod config;
mod frames;
mod simulation;
mod trail_field;

use config::SimConfig;
use frames::{frame_capture_system, FrameRecorder};
use simulation::Simulation;

#[derive(Resource)]
struct FieldDisplay {
    image: Handle<Image>,
}

fn main() {
    let config = SimConfig::from_json_file();
    let simulation = match Simulation::new(&config) {
        Ok(sim) => sim,
        Err(e) => {
            eprintln!("Invalid simulation config: {e}");
            std::process::exit(1);
        }
    };

    App::new()
        .add_plugins(DefaultPlugins.set(bevy::window::WindowPlugin {
            primary_window: Some(bevy::window::Window {
                title: "Slime Mold Trails".into(),
                resolution: (config.width as f32, config.height as f32).into(),
                present_mode: bevy::window::PresentMode::AutoVsync,
                ..default()
            }),
            exit_condition: bevy::window::ExitCondition::DontExit,
            ..default()
        }))
        .insert_resource(config)
        .insert_resource(simulation)
        .insert_resource(FrameRecorder::default())
        .add_systems(Startup, setup)
        .add_systems(
            Update,
            (
                simulation_step_system,
                update_field_texture,
                frame_capture_system,
                restart_system,
                exit_system,
                window_close_system,
            )
                .chain(),
        )
        .run();
}

fn setup(mut commands: Commands, mut images: ResMut<Assets<Image>>, config: Res<SimConfig>) {
    commands.spawn(Camera2dBundle::default());

    let image = Image::new_fill(
        Extent3d {
            width: config.width as u32,
            height: config.height as u32,
            depth_or_array_layers: 1,
        },
        TextureDimension::D2,
        &[255, 255, 255, 255],
        TextureFormat::Rgba8UnormSrgb,
        RenderAssetUsages::MAIN_WORLD | RenderAssetUsages::RENDER_WORLD,
    );
    let handle = images.add(image);

    commands.spawn(SpriteBundle {
        texture: handle.clone(),
        ..default()
    });
    commands.insert_resource(FieldDisplay { image: handle });

    println!(
        "🦠 {} agents on a {}x{} field ({} substeps/frame)  C: Capture  R: Restart  ESC: Exit",
        config.agent_count, config.width, config.height, config.substeps_per_frame
    );
}

/// One external frame tick drives one simulation step.
fn simulation_step_system(mut sim: ResMut<Simulation>, config: Res<SimConfig>) {
    sim.step(&config);
}

/// Copy the finished frame into the displayed texture, expanding the
/// core's RGB buffer to the texture's RGBA layout.
fn update_field_texture(
    sim: Res<Simulation>,
    display: Res<FieldDisplay>,
    mut images: ResMut<Assets<Image>>,
) {
    let Some(image) = images.get_mut(&display.image) else {
        return;
    };

    let buffer = sim.display_buffer();
    for (pixel, rgb) in image.data.chunks_exact_mut(4).zip(buffer.chunks_exact(3)) {
        pixel[..3].copy_from_slice(rgb);
        pixel[3] = 255;
    }
}

fn restart_system(
    input: Res<ButtonInput<KeyCode>>,
    config: Res<SimConfig>,
    mut sim: ResMut<Simulation>,
) {
    if input.just_pressed(KeyCode::KeyR) {
        match Simulation::new(&config) {
            Ok(fresh) => {
                *sim = fresh;
                println!("🔄 Simulation restarted");
            }
            // Config was validated at startup; a failure here means it
            // was mutated into an invalid state, so keep the old run.
            Err(e) => println!("Restart failed: {e}"),
        }
    }
}

fn exit_system(input: Res<ButtonInput<KeyCode>>, mut exit: EventWriter<AppExit>) {
    if input.just_pressed(KeyCode::Escape) {
        exit.send(AppExit::Success);
    }
}

fn window_close_system(
    mut close_events: EventReader<WindowCloseRequested>,
    mut exit: EventWriter<AppExit>,
) {
    for _event in close_events.read() {
        exit.send(AppExit::Success);
    }
}
