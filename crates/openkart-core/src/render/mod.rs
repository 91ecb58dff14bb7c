//! Pseudo-3D road renderer
//!
//! The camera sits `CAMERA_HEIGHT` above the viewer's kart looking down the
//! track. Screen rows below the horizon map to depths by the inverse
//! camera-height relation, so every row is one slice of road. Curvature is
//! integrated row by row into a horizontal bend, which is what makes the
//! road sweep left and right.
//!
//! Drawing order:
//!   1. sky and road, bottom row up to the horizon
//!   2. scenery, pickups and other karts, farthest first
//!   3. the viewer's own kart at the bottom center

pub mod framebuffer;
pub mod sprite;

use std::collections::HashMap;
use std::sync::Arc;

pub use framebuffer::{scale_nearest, Framebuffer};
pub use sprite::{ScaleCache, Sprite, SpriteSet};

use crate::pickups::{Pickup, PickupKind};
use crate::track::Track;
use crate::vehicle::Vehicle;
use crate::Racer;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Camera height above the road, in lateral units
pub const CAMERA_HEIGHT: f32 = 2.0;
/// Anything closer than this is behind the camera
pub const NEAR_EPSILON: f32 = 1e-2;
/// Nothing farther than this is drawn
pub const DRAW_DISTANCE: f32 = 400.0;
/// Pixels per lateral unit at unit depth, as a fraction of half the width
pub const ROAD_SCALE: f32 = 0.6;
/// Exaggerates curvature on screen
pub const CURVE_GAIN: f32 = 4.0;
/// Depth covered by one light or dark road band
pub const STRIPE_LENGTH: f32 = 3.0;
/// Road half-width for a width multiplier of 1, matching the walls
pub const ROAD_HALF_WIDTH: f32 = 3.0;
/// Shoulder trim width in lateral units
pub const TRIM_WIDTH: f32 = 0.25;

// World-space billboard sizes (width, height) in lateral units
const DECORATION_SIZE: (f32, f32) = (1.0, 2.0);
const PICKUP_SIZE: (f32, f32) = (0.5, 0.5);
const KART_SIZE: (f32, f32) = (0.9, 0.9);
/// Smallest billboard edge in pixels
const MIN_BILLBOARD_PX: u32 = 2;
/// The viewer's own kart spans this fraction of the surface width
const PLAYER_KART_FRACTION: f32 = 0.1;

pub const SKY_COLOR: u32 = 0xFF323232;
pub const HAZE_COLOR: u32 = 0xFF5A5A64;
pub const ROAD_COLORS: [u32; 2] = [0xFF6E6E6E, 0xFF646464];
pub const TRIM_COLORS: [u32; 2] = [0xFFDCDCDC, 0xFFC8C8C8];
pub const GRASS_COLORS: [u32; 2] = [0xFF00AA00, 0xFF107810];

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Where a world point lands on screen
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    /// Forward distance from the viewer
    pub depth: f32,
    pub screen_x: f32,
    pub screen_y: f32,
    /// Pixels per lateral unit at this depth
    pub scale: f32,
}

/// What a billboard shows
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BillboardKind {
    Decoration { color: u32 },
    Pickup(PickupKind),
    Kart { color: u32 },
}

/// A projected sprite waiting to be painted
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Billboard {
    pub kind: BillboardKind,
    pub projection: Projection,
}

/// Surface-dependent values, re-derived every frame
#[derive(Debug, Clone, Copy)]
struct View {
    width: usize,
    height: usize,
    horizon: usize,
    half_width: f32,
    depth_span: f32,
}

impl View {
    fn of(surface: &Framebuffer) -> Option<Self> {
        let (width, height) = (surface.width(), surface.height());
        if width == 0 || height < 2 {
            return None;
        }
        let horizon = height / 2;
        Some(Self {
            width,
            height,
            horizon,
            half_width: width as f32 / 2.0,
            depth_span: (height - horizon) as f32,
        })
    }

    fn depth_of_row(&self, row: usize) -> f32 {
        let dy = row.saturating_sub(self.horizon).max(1) as f32;
        CAMERA_HEIGHT * self.depth_span / dy
    }

    fn scale_at(&self, depth: f32) -> f32 {
        ROAD_SCALE * self.half_width / depth.max(NEAR_EPSILON)
    }
}

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

pub struct Renderer {
    track: Arc<Track>,
    player: Option<ScaleCache>,
    opponent: Option<ScaleCache>,
    items: HashMap<PickupKind, ScaleCache>,
}

impl Renderer {
    /// A renderer that draws everything as solid rectangles
    pub fn new(track: Arc<Track>) -> Self {
        Self {
            track,
            player: None,
            opponent: None,
            items: HashMap::new(),
        }
    }

    pub fn with_sprites(mut self, sprites: SpriteSet) -> Self {
        let SpriteSet { player, opponent, boost, oil, shell } = sprites;
        self.player = player.map(ScaleCache::new);
        self.opponent = opponent.map(ScaleCache::new);
        self.items = [(PickupKind::Boost, boost), (PickupKind::Oil, oil), (PickupKind::Shell, shell)]
            .into_iter()
            .filter_map(|(kind, sprite)| sprite.map(|s| (kind, ScaleCache::new(s))))
            .collect();
        self
    }

    /// Number of sprite slots with an image
    pub fn sprite_slots(&self) -> usize {
        usize::from(self.player.is_some()) + usize::from(self.opponent.is_some()) + self.items.len()
    }

    pub fn track(&self) -> &Arc<Track> {
        &self.track
    }

    /// Number of cached scaled sprite variants across all slots
    pub fn cached_variants(&self) -> usize {
        self.player.iter().chain(self.opponent.iter()).chain(self.items.values()).map(ScaleCache::len).sum()
    }

    /// Project a world point as seen from `viewer` onto `surface`.
    ///
    /// Returns `None` for points behind the camera, beyond the draw
    /// distance, or below the bottom of the surface.
    pub fn project(&self, surface: &Framebuffer, viewer: &Vehicle, z: f32, x: f32) -> Option<Projection> {
        let view = View::of(surface)?;
        self.project_in(&view, viewer, z, x)
    }

    fn project_in(&self, view: &View, viewer: &Vehicle, z: f32, x: f32) -> Option<Projection> {
        let depth = self.track.relative_distance(viewer.z, z);
        if depth <= NEAR_EPSILON || depth > DRAW_DISTANCE {
            return None;
        }
        let screen_y = view.horizon as f32 + CAMERA_HEIGHT * view.depth_span / depth;
        if screen_y >= view.height as f32 {
            return None;
        }
        let curve = self.track.curvature_at(viewer.z);
        let bend = CURVE_GAIN * curve * depth * depth / 2.0;
        let scale = view.scale_at(depth);
        Some(Projection {
            depth,
            screen_x: view.half_width + (x + bend - viewer.x) * scale,
            screen_y,
            scale,
        })
    }

    /// Paint the sky and the road as seen from `viewer`.
    pub fn render_road(&self, surface: &mut Framebuffer, viewer: &Vehicle) {
        let Some(view) = View::of(surface) else {
            return;
        };
        surface.fill_rect(0, 0, view.width as i32, view.horizon as i32, SKY_COLOR);

        let width = view.width as i32;
        let mut prev_depth = 0.0f32;
        let mut heading = 0.0f32;
        let mut offset = 0.0f32;

        for row in (view.horizon..view.height).rev() {
            let y = row as i32;
            let depth = view.depth_of_row(row);
            if depth > DRAW_DISTANCE {
                surface.hline(0, width, y, HAZE_COLOR);
                continue;
            }
            let world_z = self.track.wrap(viewer.z + depth);
            let band = ((world_z / STRIPE_LENGTH) as i64).rem_euclid(2) as usize;

            let Some(hit) = self.track.segment_at(world_z) else {
                surface.hline(0, width, y, GRASS_COLORS[band]);
                continue;
            };

            // Trapezoid step: heading integrates curvature, offset integrates heading
            let step = depth - prev_depth;
            let next_heading = heading + hit.segment.curvature * step;
            offset += (heading + next_heading) * 0.5 * step;
            heading = next_heading;
            prev_depth = depth;

            let scale = view.scale_at(depth);
            let center = view.half_width + (CURVE_GAIN * offset - viewer.x) * scale;
            let half_road = ROAD_HALF_WIDTH * hit.segment.width * scale;
            let trim = (TRIM_WIDTH * scale).max(1.0);

            let left = (center - half_road).round().clamp(0.0, view.width as f32) as i32;
            let right = (center + half_road).round().clamp(0.0, view.width as f32) as i32;
            let trim_px = trim.round() as i32;

            surface.hline(0, width, y, GRASS_COLORS[band]);
            if left < right {
                surface.hline(left, right, y, TRIM_COLORS[band]);
                surface.hline(left + trim_px, right - trim_px, y, ROAD_COLORS[band]);
            }
        }
    }

    /// Gather scenery, pickups and `others`, projected and sorted farthest
    /// first.
    pub fn compose(
        &self,
        surface: &Framebuffer,
        viewer: &Vehicle,
        others: &[&dyn Racer],
        items: Option<&[Pickup]>,
    ) -> Vec<Billboard> {
        let Some(view) = View::of(surface) else {
            return Vec::new();
        };

        let decorations = self.track.decorations().iter().map(|d| (d.z, d.x, BillboardKind::Decoration { color: d.color }));
        let pickups = items
            .unwrap_or_default()
            .iter()
            .filter(|p| p.active)
            .map(|p| (p.z, p.x, BillboardKind::Pickup(p.kind)));
        let karts = others.iter().map(|o| (o.depth(), o.lateral(), BillboardKind::Kart { color: o.color() }));

        let mut billboards: Vec<Billboard> = decorations
            .chain(pickups)
            .chain(karts)
            .filter_map(|(z, x, kind)| {
                self.project_in(&view, viewer, z, x)
                    .map(|projection| Billboard { kind, projection })
            })
            .collect();
        billboards.sort_by(|a, b| b.projection.depth.total_cmp(&a.projection.depth));
        billboards
    }

    /// Draw one frame for `viewer` into `surface`.
    pub fn render(&mut self, surface: &mut Framebuffer, viewer: &Vehicle, others: &[&dyn Racer], items: Option<&[Pickup]>) {
        if View::of(surface).is_none() {
            return;
        }
        self.render_road(surface, viewer);

        for billboard in self.compose(surface, viewer, others, items) {
            self.draw_billboard(surface, &billboard);
        }
        self.draw_player_kart(surface, viewer);
    }

    fn draw_billboard(&mut self, surface: &mut Framebuffer, billboard: &Billboard) {
        let p = &billboard.projection;
        let (size, fallback, cache) = match billboard.kind {
            BillboardKind::Decoration { color } => (DECORATION_SIZE, color, None),
            BillboardKind::Pickup(kind) => (PICKUP_SIZE, kind.color(), self.items.get_mut(&kind)),
            BillboardKind::Kart { color } => (KART_SIZE, color, self.opponent.as_mut()),
        };
        let w = ((size.0 * p.scale) as u32).max(MIN_BILLBOARD_PX);
        let h = ((size.1 * p.scale) as u32).max(MIN_BILLBOARD_PX);
        // Anchored at the bottom center
        let x = p.screen_x as i32 - (w / 2) as i32;
        let y = p.screen_y as i32 - h as i32;
        match cache {
            Some(cache) => surface.blit(cache.get(w, h), x, y),
            None => surface.fill_rect(x, y, w as i32, h as i32, fallback),
        }
    }

    fn draw_player_kart(&mut self, surface: &mut Framebuffer, viewer: &Vehicle) {
        let w = ((surface.width() as f32 * PLAYER_KART_FRACTION) as u32).max(MIN_BILLBOARD_PX);
        let h = w;
        let x = (surface.width() as i32 - w as i32) / 2;
        let y = surface.height() as i32 - h as i32;
        match self.player.as_mut() {
            Some(cache) => surface.blit(cache.get(w, h), x, y),
            None => surface.fill_rect(x, y, w as i32, h as i32, viewer.color),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ghost::Ghost;
    use crate::track::{Segment, TrackBuilder};
    use openkart_common::VehicleTuning;

    fn track_with_curve(curvature: f32) -> Arc<Track> {
        Arc::new(TrackBuilder::new().segment(Segment::curve(1000.0, curvature)).build().unwrap())
    }

    fn viewer_on(track: &Arc<Track>) -> Vehicle {
        Vehicle::new(track.clone(), VehicleTuning::default())
    }

    #[test]
    fn zero_sized_surfaces_render_nothing() {
        let track = Arc::new(Track::demo(1).unwrap());
        let viewer = viewer_on(&track);
        let mut renderer = Renderer::new(track.clone());
        for (w, h) in [(0, 0), (0, 100), (100, 0), (5, 1)] {
            let mut fb = Framebuffer::new(w, h);
            let before = fb.clone();
            renderer.render(&mut fb, &viewer, &[], Some(track.pickups()));
            assert_eq!(fb, before, "{}x{} surface was touched", w, h);
            assert!(renderer.project(&fb, &viewer, 50.0, 0.0).is_none());
        }
    }

    #[test]
    fn paints_sky_road_and_grass() {
        let track = track_with_curve(0.0);
        let viewer = viewer_on(&track);
        let mut renderer = Renderer::new(track);
        let mut fb = Framebuffer::new(320, 240);
        renderer.render(&mut fb, &viewer, &[], None);

        assert_eq!(fb.get(160, 10), Some(SKY_COLOR));
        assert_eq!(fb.get(300, 100), Some(SKY_COLOR));
        let road = fb.get(100, 239).unwrap();
        assert!(ROAD_COLORS.contains(&road), "expected road, got {:08X}", road);
        let grass = fb.get(2, 239).unwrap();
        assert!(GRASS_COLORS.contains(&grass), "expected grass, got {:08X}", grass);
        let trim = fb.get(22, 239).unwrap();
        assert!(TRIM_COLORS.contains(&trim), "expected trim, got {:08X}", trim);
        // The viewer's own kart sits at the bottom center
        assert_eq!(fb.get(160, 239), Some(viewer.color));
    }

    #[test]
    fn distant_rows_fade_into_haze() {
        let track = track_with_curve(0.0);
        let viewer = viewer_on(&track);
        let renderer = Renderer::new(track);
        // Tall enough that rows just under the horizon lie past the draw distance
        let mut fb = Framebuffer::new(64, 600);
        renderer.render_road(&mut fb, &viewer);
        assert_eq!(fb.get(32, 301), Some(HAZE_COLOR));
        assert_ne!(fb.get(32, 599), Some(HAZE_COLOR));
    }

    #[test]
    fn culls_points_behind_and_under_the_camera() {
        let track = track_with_curve(0.0);
        let mut viewer = viewer_on(&track);
        viewer.z = 500.0;
        let renderer = Renderer::new(track);
        let fb = Framebuffer::new(320, 240);

        assert!(renderer.project(&fb, &viewer, 500.0, 0.0).is_none(), "at the camera");
        assert!(renderer.project(&fb, &viewer, 499.0, 0.0).is_none(), "behind");
        assert!(renderer.project(&fb, &viewer, 501.0, 0.0).is_none(), "below the screen");
        assert!(renderer.project(&fb, &viewer, 500.0 + DRAW_DISTANCE + 1.0, 0.0).is_none(), "too far");

        let p = renderer.project(&fb, &viewer, 550.0, 0.0).unwrap();
        assert_eq!(p.depth, 50.0);
        assert!(p.screen_y > 120.0 && p.screen_y < 240.0);
        assert!((p.screen_x - 160.0).abs() < 1e-3);
    }

    #[test]
    fn nearer_points_sit_lower_and_larger() {
        let track = track_with_curve(0.0);
        let viewer = viewer_on(&track);
        let renderer = Renderer::new(track);
        let fb = Framebuffer::new(320, 240);
        let near = renderer.project(&fb, &viewer, 10.0, 0.0).unwrap();
        let far = renderer.project(&fb, &viewer, 100.0, 0.0).unwrap();
        assert!(near.screen_y > far.screen_y);
        assert!(near.scale > far.scale);
    }

    #[test]
    fn lateral_offsets_keep_their_order() {
        let track = track_with_curve(0.0);
        let mut viewer = viewer_on(&track);
        viewer.x = 0.5;
        let renderer = Renderer::new(track);
        let fb = Framebuffer::new(320, 240);
        let left = renderer.project(&fb, &viewer, 30.0, -1.0).unwrap();
        let mid = renderer.project(&fb, &viewer, 30.0, 0.5).unwrap();
        let right = renderer.project(&fb, &viewer, 30.0, 1.0).unwrap();
        assert!(left.screen_x < mid.screen_x && mid.screen_x < right.screen_x);
        // Whatever sits right in front of the viewer is centered
        assert!((mid.screen_x - 160.0).abs() < 1e-3);
    }

    #[test]
    fn right_bends_shift_the_road_right() {
        let track = track_with_curve(0.002);
        let viewer = viewer_on(&track);
        let renderer = Renderer::new(track.clone());
        let mut fb = Framebuffer::new(320, 240);

        let p = renderer.project(&fb, &viewer, 100.0, 0.0).unwrap();
        assert!(p.screen_x > 160.0, "got {}", p.screen_x);

        renderer.render_road(&mut fb, &viewer);
        let row = 125;
        let road: Vec<usize> = (0..320)
            .filter(|&x| ROAD_COLORS.contains(&fb.get(x, row).unwrap()))
            .collect();
        assert!(!road.is_empty());
        let center = (road[0] + road[road.len() - 1]) as f32 / 2.0;
        assert!(center > 165.0, "road center at {}", center);

        // The bottom row barely bends
        let road: Vec<usize> = (0..320)
            .filter(|&x| ROAD_COLORS.contains(&fb.get(x, 239).unwrap()))
            .collect();
        let center = (road[0] + road[road.len() - 1]) as f32 / 2.0;
        assert!((center - 160.0).abs() < 3.0, "bottom center at {}", center);
    }

    #[test]
    fn compose_orders_farthest_first() {
        let track = track_with_curve(0.0);
        let viewer = viewer_on(&track);
        let renderer = Renderer::new(track.clone());
        let fb = Framebuffer::new(320, 240);

        let mut near = Ghost::new(track.clone(), 1.0);
        near.z = 15.0;
        let mut far = Ghost::new(track.clone(), 1.0);
        far.z = 90.0;
        let mut behind = Ghost::new(track.clone(), 1.0);
        behind.z = 995.0;
        let items = [
            Pickup::new(PickupKind::Boost, 40.0, 0.0),
            Pickup {
                active: false,
                ..Pickup::new(PickupKind::Oil, 60.0, 0.0)
            },
        ];

        let others: [&dyn Racer; 3] = [&near, &far, &behind];
        let billboards = renderer.compose(&fb, &viewer, &others, Some(&items));
        let depths: Vec<f32> = billboards.iter().map(|b| b.projection.depth).collect();
        assert_eq!(depths, vec![90.0, 40.0, 15.0]);
        assert_eq!(billboards[1].kind, BillboardKind::Pickup(PickupKind::Boost));
    }

    #[test]
    fn later_billboards_cover_earlier_ones() {
        let track = track_with_curve(0.0);
        let viewer = viewer_on(&track);
        let mut renderer = Renderer::new(track.clone());
        let mut fb = Framebuffer::new(320, 240);

        // Both karts cover the same pixels; the nearer one is painted last
        let mut far = Ghost::new(track.clone(), 1.0);
        far.z = 20.0;
        far.color = 0xFF00FFFF;
        let mut near = Ghost::new(track.clone(), 1.0);
        near.z = 19.0;
        near.color = 0xFFFF00FF;
        let others: [&dyn Racer; 2] = [&near, &far];
        renderer.render(&mut fb, &viewer, &others, None);

        let p = renderer.project(&fb, &viewer, 19.0, 0.0).unwrap();
        let pixel = fb.get(p.screen_x as usize, p.screen_y as usize - 1).unwrap();
        assert_eq!(pixel, 0xFFFF00FF);
    }

    #[test]
    fn sprites_are_cached_per_size() {
        let track = Arc::new(Track::demo(1).unwrap());
        let viewer = viewer_on(&track);
        let mut renderer = Renderer::new(track.clone()).with_sprites(SpriteSet::placeholders());
        let mut fb = Framebuffer::new(320, 240);

        renderer.render(&mut fb, &viewer, &[], Some(track.pickups()));
        let after_first = renderer.cached_variants();
        assert!(after_first > 0);
        renderer.render(&mut fb, &viewer, &[], Some(track.pickups()));
        assert_eq!(renderer.cached_variants(), after_first, "same frame, same sizes");
    }

    #[test]
    fn every_sprite_slot_is_taken() {
        let track = Arc::new(Track::demo(1).unwrap());
        assert_eq!(Renderer::new(track.clone()).sprite_slots(), 0);

        let renderer = Renderer::new(track.clone()).with_sprites(SpriteSet::placeholders());
        assert_eq!(renderer.sprite_slots(), 5);

        let partial = SpriteSet { oil: None, opponent: None, ..SpriteSet::placeholders() };
        assert_eq!(Renderer::new(track).with_sprites(partial).sprite_slots(), 3);
    }
}
