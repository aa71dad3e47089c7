use rayon::prelude::*;

/// The shared toroidal color grid agents sense and mark. Three f32
/// channels per cell, interleaved row-major, every channel in [0, 1].
pub struct TrailField {
    width: usize,
    height: usize,
    data: Vec<f32>,
}

impl TrailField {
    /// A fresh field is all-white: full brightness, no trails.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![1.0; width * height * 3],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    fn index(&self, x: i32, y: i32) -> usize {
        let x = x.rem_euclid(self.width as i32) as usize;
        let y = y.rem_euclid(self.height as i32) as usize;
        (y * self.width + x) * 3
    }

    pub fn cell(&self, x: i32, y: i32) -> [f32; 3] {
        let idx = self.index(x, y);
        [self.data[idx], self.data[idx + 1], self.data[idx + 2]]
    }

    /// Move every channel toward white by `fraction`. Convex
    /// interpolation, so values never leave [0, 1]. Called exactly once
    /// per frame, before any substep runs.
    pub fn fade(&mut self, fraction: f32) {
        self.data
            .par_iter_mut()
            .for_each(|v| *v += (1.0 - *v) * fraction);
    }

    /// Overwrite every cell within `radius` of the wrapped center with
    /// `color`. A hard overwrite, not a blend: repeated stamps are
    /// idempotent, which is what lets overlapping agents write in any
    /// order without changing the outcome.
    pub fn stamp(&mut self, cx: i32, cy: i32, radius: i32, color: [f32; 3]) {
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if dx * dx + dy * dy <= radius * radius {
                    let idx = self.index(cx + dx, cy + dy);
                    self.data[idx..idx + 3].copy_from_slice(&color);
                }
            }
        }
    }

    /// Brightness in [0, 255] at the truncated, wrapped coordinate.
    /// Nearest-cell lookup only; interpolating here changes the emergent
    /// patterns.
    pub fn sample_brightness(&self, x: f32, y: f32) -> f32 {
        let idx = self.index(x as i32, y as i32);
        let px = &self.data[idx..idx + 3];
        (px[0] + px[1] + px[2]) / 3.0 * 255.0
    }

    /// Row-major W×H×3 RGB8 buffer for the renderer.
    pub fn to_display_buffer(&self) -> Vec<u8> {
        self.data.iter().map(|v| (v * 255.0) as u8).collect()
    }
}
