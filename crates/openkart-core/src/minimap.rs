//! Top-down track outline for the HUD
//!
//! The outline is rebuilt from curvature alone: walk the loop in equal
//! steps, turn by the local curvature and plot where that leads. The result
//! is fitted into a small box with a margin.

use crate::track::Track;

/// Heading change per unit of curvature per unit depth. Exaggerated so
/// gentle bends are still visible at minimap scale.
pub const MINIMAP_TURN_GAIN: f32 = 40.0;
pub const MINIMAP_MARGIN: i32 = 5;
pub const MINIMAP_SAMPLES: usize = 200;
pub const MINIMAP_SIZE: (u32, u32) = (80, 60);

#[derive(Debug, Clone, PartialEq)]
pub struct Minimap {
    points: Vec<(i32, i32)>,
    step: f32,
    width: u32,
    height: u32,
}

impl Minimap {
    pub fn build(track: &Track, samples: usize, size: (u32, u32)) -> Self {
        let (width, height) = size;
        let total = track.total_length();
        if track.is_empty() || samples == 0 || total <= 0.0 {
            return Self {
                points: Vec::new(),
                step: 0.0,
                width,
                height,
            };
        }

        let step = total / samples as f32;
        let mut raw = Vec::with_capacity(samples);
        let (mut x, mut y, mut heading) = (0.0f32, 0.0f32, 0.0f32);
        for i in 0..samples {
            let z = i as f32 * step;
            heading += track.curvature_at(z) * step * MINIMAP_TURN_GAIN;
            x += heading.cos() * step;
            y += heading.sin() * step;
            raw.push((x, y));
        }

        let (min_x, max_x) = raw.iter().fold((f32::MAX, f32::MIN), |(lo, hi), p| (lo.min(p.0), hi.max(p.0)));
        let (min_y, max_y) = raw.iter().fold((f32::MAX, f32::MIN), |(lo, hi), p| (lo.min(p.1), hi.max(p.1)));
        let inner_w = (width as i32 - 2 * MINIMAP_MARGIN).max(0) as f32;
        let inner_h = (height as i32 - 2 * MINIMAP_MARGIN).max(0) as f32;
        let scale = (inner_w / (max_x - min_x + 1e-6)).min(inner_h / (max_y - min_y + 1e-6));

        let points = raw
            .iter()
            .map(|&(px, py)| {
                (
                    ((px - min_x) * scale) as i32 + MINIMAP_MARGIN,
                    ((py - min_y) * scale) as i32 + MINIMAP_MARGIN,
                )
            })
            .collect();

        tracing::debug!("Minimap built: {} points in {}x{}", samples, width, height);
        Self {
            points,
            step,
            width,
            height,
        }
    }

    pub fn points(&self) -> &[(i32, i32)] {
        &self.points
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Map position for a track depth. Depths wrap around the loop.
    pub fn point_at(&self, z: f32) -> Option<(i32, i32)> {
        if self.points.is_empty() || !z.is_finite() {
            return None;
        }
        let index = (z / self.step).floor() as i64;
        Some(self.points[index.rem_euclid(self.points.len() as i64) as usize])
    }
}
