use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use bevy::prelude::*;
use chrono::Local;
use png::ColorType;

use crate::config::SimConfig;
use crate::simulation::Simulation;

/// Writes the display buffer out as numbered PNG frames, one capture
/// directory per recording session.
#[derive(Resource, Default)]
pub struct FrameRecorder {
    pub is_recording: bool,
    pub output_dir: Option<PathBuf>,
    pub frames_written: u32,
}

impl FrameRecorder {
    fn start(&mut self) {
        let dir = PathBuf::from(format!("frames/{}", Local::now().format("%Y%m%d_%H%M%S")));
        match fs::create_dir_all(&dir) {
            Ok(()) => {
                println!("📹 Recording frames to {}", dir.display());
                self.output_dir = Some(dir);
                self.frames_written = 0;
                self.is_recording = true;
            }
            Err(e) => println!("Failed to create frame directory: {e}"),
        }
    }

    fn stop(&mut self) {
        println!("📹 Stopped recording after {} frames", self.frames_written);
        self.is_recording = false;
        self.output_dir = None;
    }
}

/// C toggles recording. Capture errors disable recording but never
/// touch the simulation itself.
pub fn frame_capture_system(
    input: Res<ButtonInput<KeyCode>>,
    mut recorder: ResMut<FrameRecorder>,
    sim: Res<Simulation>,
    config: Res<SimConfig>,
) {
    if input.just_pressed(KeyCode::KeyC) {
        if recorder.is_recording {
            recorder.stop();
        } else {
            recorder.start();
        }
    }

    if !recorder.is_recording {
        return;
    }
    if sim.frame % config.capture_interval.max(1) as u64 != 0 {
        return;
    }

    let Some(dir) = recorder.output_dir.clone() else {
        return;
    };
    let path = dir.join(format!("frame_{:05}.png", recorder.frames_written));
    match save_frame(
        &path,
        &sim.display_buffer(),
        config.width as u32,
        config.height as u32,
    ) {
        Ok(()) => recorder.frames_written += 1,
        Err(e) => {
            println!("Failed to save {}: {e}", path.display());
            recorder.stop();
        }
    }
}

pub fn save_frame(
    path: &Path,
    rgb: &[u8],
    width: u32,
    height: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let file = File::create(path)?;
    let w = &mut BufWriter::new(file);

    let mut encoder = png::Encoder::new(w, width, height);
    encoder.set_color(ColorType::Rgb);
    encoder.set_depth(png::BitDepth::Eight);

    let mut writer = encoder.write_header()?;
    writer.write_image_data(rgb)?;
    Ok(())
}
