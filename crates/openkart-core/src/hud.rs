//! Heads-up display drawn over the road view
//!
//! Renders:
//! - speed bar (top left), with the boost reserve in a second color
//! - lap pips below it, filled for completed laps
//! - minimap (top right) with a dot per racer

use crate::minimap::Minimap;
use crate::render::Framebuffer;
use crate::vehicle::Vehicle;
use crate::Racer;

const HUD_MARGIN: i32 = 5;
const SPEED_BAR_W: i32 = 60;
const SPEED_BAR_H: i32 = 6;
const PIP_SIZE: i32 = 5;
const PIP_GAP: i32 = 3;
const DOT_SIZE: i32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hud {
    pub color: u32,
    pub surge_color: u32,
    pub map_background: u32,
    pub map_line: u32,
}

impl Default for Hud {
    fn default() -> Self {
        Self {
            color: 0xFF00FF00,
            surge_color: 0xFFFFFF00,
            map_background: 0xFF000000,
            map_line: 0xFF646464,
        }
    }
}

impl Hud {
    /// `lap` is the number of completed laps.
    pub fn draw(
        &self,
        surface: &mut Framebuffer,
        vehicle: &Vehicle,
        lap: u32,
        laps_total: u32,
        minimap: &Minimap,
        others: &[&dyn Racer],
    ) {
        if surface.is_empty() {
            return;
        }
        self.draw_speed_bar(surface, vehicle);
        self.draw_lap_pips(surface, lap, laps_total);
        self.draw_minimap(surface, vehicle, minimap, others);
    }

    fn draw_speed_bar(&self, surface: &mut Framebuffer, vehicle: &Vehicle) {
        let (x, y) = (HUD_MARGIN, HUD_MARGIN);
        surface.rect_outline(x, y, SPEED_BAR_W, SPEED_BAR_H, self.color);

        let inner = SPEED_BAR_W - 2;
        let max_speed = vehicle.tuning.max_speed;
        let speed = (vehicle.speed_fraction() * inner as f32) as i32;
        surface.fill_rect(x + 1, y + 1, speed, SPEED_BAR_H - 2, self.color);
        if max_speed > 0.0 && vehicle.surge > 0.0 {
            let surge = ((vehicle.surge / max_speed) * inner as f32) as i32;
            let surge = surge.min(inner - speed);
            surface.fill_rect(x + 1 + speed, y + 1, surge, SPEED_BAR_H - 2, self.surge_color);
        }
    }

    fn draw_lap_pips(&self, surface: &mut Framebuffer, lap: u32, laps_total: u32) {
        let y = HUD_MARGIN + SPEED_BAR_H + PIP_GAP;
        for i in 0..laps_total {
            let x = HUD_MARGIN + i as i32 * (PIP_SIZE + PIP_GAP);
            if i < lap {
                surface.fill_rect(x, y, PIP_SIZE, PIP_SIZE, self.color);
            } else {
                surface.rect_outline(x, y, PIP_SIZE, PIP_SIZE, self.color);
            }
        }
    }

    fn draw_minimap(&self, surface: &mut Framebuffer, vehicle: &Vehicle, minimap: &Minimap, others: &[&dyn Racer]) {
        if minimap.is_empty() {
            return;
        }
        let w = minimap.width() as i32;
        let h = minimap.height() as i32;
        let ox = surface.width() as i32 - w - HUD_MARGIN;
        let oy = HUD_MARGIN;
        surface.fill_rect(ox, oy, w, h, self.map_background);

        for pair in minimap.points().windows(2) {
            let (a, b) = (pair[0], pair[1]);
            surface.draw_line(ox + a.0, oy + a.1, ox + b.0, oy + b.1, self.map_line);
        }

        let dots = others
            .iter()
            .map(|o| (o.depth(), o.color()))
            .chain(std::iter::once((vehicle.z, vehicle.color)));
        for (z, color) in dots {
            if let Some((px, py)) = minimap.point_at(z) {
                let half = DOT_SIZE / 2;
                surface.fill_rect(ox + px - half, oy + py - half, DOT_SIZE, DOT_SIZE, color);
            }
        }
    }
}
