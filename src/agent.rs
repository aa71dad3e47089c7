use std::f32::consts::TAU;

use rand::Rng;

use crate::config::SimConfig;
use crate::trail_field::TrailField;

// Handicap subtracted from the forward sensor, on the 0-255 brightness
// scale. Not derived from the other motion parameters; keep as-is.
const STRAIGHT_BIAS: f32 = 1.0;

/// A single trail-laying agent: continuous position plus heading.
/// Heading is unbounded; only its cosine/sine are ever used.
#[derive(Clone)]
pub struct Agent {
    pub x: f32,
    pub y: f32,
    pub heading: f32,
}

impl Agent {
    pub fn spawn_random(rng: &mut impl Rng, width: f32, height: f32) -> Self {
        Self {
            x: rng.gen_range(0.0..width),
            y: rng.gen_range(0.0..height),
            heading: rng.gen_range(0.0..TAU),
        }
    }

    /// Brightness at the sensor point `sensor_distance` ahead, rotated
    /// `offset` radians off the current heading.
    fn sense(&self, field: &TrailField, config: &SimConfig, offset: f32) -> f32 {
        let angle = self.heading + offset;
        field.sample_brightness(
            self.x + config.sensor_distance * angle.cos(),
            self.y + config.sensor_distance * angle.sin(),
        )
    }

    /// Phase 1 of a substep: decide the turn. Reads the field, never
    /// writes it. Trails are darker than the white background, so the
    /// least-bright sensor points at the strongest trail.
    pub fn update_heading(&mut self, field: &TrailField, config: &SimConfig, jitter: f32) {
        let left = self.sense(field, config, -config.sensor_angle);
        let center = self.sense(field, config, 0.0);
        let right = self.sense(field, config, config.sensor_angle);

        // Slightly discourage going straight => (center - bias)
        let idx = min_index([left, center - STRAIGHT_BIAS, right]);

        // idx=0 => turn left, idx=1 => straight, idx=2 => turn right
        self.heading += config.turn_angle * (idx as f32 - 1.0);
        self.heading += jitter;
    }

    /// Phase 2 of a substep: one unit step along the heading, toroidal
    /// wrap, then stamp the trail at the new cell.
    pub fn update_position(&mut self, field: &mut TrailField, config: &SimConfig) {
        let (sin, cos) = self.heading.sin_cos();
        self.x = (self.x + cos).rem_euclid(field.width() as f32);
        self.y = (self.y + sin).rem_euclid(field.height() as f32);

        field.stamp(
            self.x as i32,
            self.y as i32,
            config.trail_radius,
            config.trail_color,
        );
    }
}

/// Index of the smallest value; ties go to the first (strictly-less
/// scan), so a left/right tie turns left.
fn min_index(values: [f32; 3]) -> usize {
    let mut min_idx = 0;
    for (i, &value) in values.iter().enumerate() {
        if value < values[min_idx] {
            min_idx = i;
        }
    }
    min_idx
}
