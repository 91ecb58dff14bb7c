//! Track layouts: the fixed demo circuit and seeded procedural loops
//!
//! Both layouts draw their random choices from a `StdRng` seeded by the
//! caller, so the same seed always yields the same track.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::pickups::{Pickup, PickupKind};
use crate::track::{Result, Segment, Track, TrackBuilder};

/// Scenery colors (ARGB)
pub const DECORATION_COLORS: [u32; 3] = [0xFF00C800, 0xFF00B400, 0xFF009600];
/// Scenery stands on the grass just outside the walls
pub const DECORATION_OFFSET: f32 = 4.0;

/// Ranges for procedural generation
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorParams {
    pub min_segments: usize,
    pub max_segments: usize,
    pub min_length: f32,
    pub max_length: f32,
    /// Largest |curvature| of a bend
    pub max_curvature: f32,
    /// Chance that a segment bends
    pub curve_chance: f64,
    /// Chance that a straight segment is a hill
    pub hill_chance: f64,
    pub max_elevation: f32,
    pub decorations: usize,
    pub boosts: usize,
    pub oil_slicks: usize,
    pub shells: usize,
    pub shell_speed: f32,
    pub checkpoints: usize,
    pub check_width: f32,
}

impl Default for GeneratorParams {
    fn default() -> Self {
        Self {
            min_segments: 6,
            max_segments: 12,
            min_length: 60.0,
            max_length: 140.0,
            max_curvature: 0.004,
            curve_chance: 0.6,
            hill_chance: 0.3,
            max_elevation: 12.0,
            decorations: 24,
            boosts: 3,
            oil_slicks: 2,
            shells: 1,
            shell_speed: 90.0,
            checkpoints: 3,
            check_width: 2.5,
        }
    }
}

impl Track {
    /// The five-segment demo circuit (500 units).
    ///
    /// `seed` only affects which side and shade each decoration gets.
    pub fn demo(seed: u64) -> Result<Track> {
        let mut rng = StdRng::seed_from_u64(seed);
        let segments = [
            Segment::straight(100.0),
            Segment::curve(100.0, 0.002),
            Segment::hill(80.0, 10.0),
            Segment::curve(120.0, -0.003),
            Segment::straight(100.0),
        ];
        let total: f32 = segments.iter().map(|s| s.length).sum();

        let mut builder = TrackBuilder::new()
            .segments(segments)
            .even_checkpoints(3)
            .check_width(2.5);
        builder = scatter_decorations(builder, &mut rng, 20, total);

        for i in 0..3 {
            builder = builder.pickup(Pickup::new(PickupKind::Boost, 30.0 + i as f32 * 80.0, 0.0));
        }
        for i in 0..2 {
            builder = builder.pickup(Pickup::new(PickupKind::Oil, 70.0 + i as f32 * 120.0, 1.5));
        }
        builder = builder.pickup(Pickup::moving(PickupKind::Shell, 150.0, -0.5, 90.0));

        let track = builder.build()?;
        tracing::info!("Demo track ready ({:.0} units)", track.total_length());
        Ok(track)
    }

    /// A seeded procedural loop.
    pub fn generate(seed: u64, params: &GeneratorParams) -> Result<Track> {
        let mut rng = StdRng::seed_from_u64(seed);

        let max_segments = params.max_segments.max(params.min_segments).max(1);
        let min_segments = params.min_segments.clamp(1, max_segments);
        let count = rng.gen_range(min_segments..=max_segments);
        let max_length = params.max_length.max(params.min_length);

        let mut segments = Vec::with_capacity(count);
        // The start/finish straight keeps the grid off a bend
        segments.push(Segment::straight(max_length));
        for _ in 1..count {
            let length = if max_length > params.min_length {
                rng.gen_range(params.min_length..=max_length)
            } else {
                params.min_length
            };
            let segment = if rng.gen_bool(params.curve_chance.clamp(0.0, 1.0)) {
                let sign = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
                let magnitude = rng.gen_range(0.3f32..=1.0) * params.max_curvature;
                Segment::curve(length, sign * magnitude)
            } else if rng.gen_bool(params.hill_chance.clamp(0.0, 1.0)) {
                Segment::hill(length, rng.gen_range(-1.0f32..=1.0) * params.max_elevation)
            } else {
                Segment::straight(length)
            };
            segments.push(segment);
        }
        let total: f32 = segments.iter().map(|s| s.length).sum();

        let mut builder = TrackBuilder::new()
            .segments(segments)
            .even_checkpoints(params.checkpoints)
            .check_width(params.check_width);
        builder = scatter_decorations(builder, &mut rng, params.decorations, total);

        let kinds = std::iter::repeat(PickupKind::Boost)
            .take(params.boosts)
            .chain(std::iter::repeat(PickupKind::Oil).take(params.oil_slicks))
            .chain(std::iter::repeat(PickupKind::Shell).take(params.shells));
        for kind in kinds {
            // Keep the first stretch clear so nothing sits on the grid
            let z = rng.gen_range(0.1f32..0.95) * total;
            let x = rng.gen_range(-2.0f32..=2.0);
            let pickup = match kind {
                PickupKind::Shell => Pickup::moving(kind, z, x, params.shell_speed),
                PickupKind::Boost | PickupKind::Oil => Pickup::new(kind, z, x),
            };
            builder = builder.pickup(pickup);
        }

        let track = builder.build()?;
        tracing::info!(
            "Generated track from seed {}: {} segments, {:.0} units",
            seed,
            track.segments().len(),
            track.total_length()
        );
        Ok(track)
    }
}

fn scatter_decorations(mut builder: TrackBuilder, rng: &mut StdRng, count: usize, total: f32) -> TrackBuilder {
    if count == 0 {
        return builder;
    }
    let spacing = total / count as f32;
    for i in 0..count {
        let side = if rng.gen_bool(0.5) { -1.0 } else { 1.0 };
        let color = DECORATION_COLORS[rng.gen_range(0..DECORATION_COLORS.len())];
        builder = builder.decoration(i as f32 * spacing, side * DECORATION_OFFSET, color);
    }
    builder
}
