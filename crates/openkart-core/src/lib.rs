//! OpenKart racing core
//!
//! This crate handles:
//! - Looping tracks with curvature, elevation and checkpoints
//! - Seeded track generation
//! - Fixed-timestep kart physics
//! - Rubber-banding ghost opponent
//! - Pickups, lap counting and race sessions
//! - Pseudo-3D road rendering into a software framebuffer

pub mod generate;
pub mod ghost;
pub mod hud;
pub mod laps;
pub mod minimap;
pub mod pickups;
pub mod race;
pub mod render;
pub mod track;
pub mod vehicle;

pub use generate::GeneratorParams;
pub use ghost::Ghost;
pub use hud::Hud;
pub use laps::{LapEvent, LapTracker};
pub use minimap::Minimap;
pub use pickups::{Pickup, PickupHit, PickupKind, Pickups};
pub use race::{PlayerInput, RaceEvent, RaceSession};
pub use render::{Framebuffer, Renderer, Sprite, SpriteSet};
pub use track::{Decoration, Segment, SegmentHit, Track, TrackBuilder, TrackError};
pub use vehicle::{Controls, Vehicle};

/// Anything that shows up on the road as a kart: players and the ghost
pub trait Racer {
    /// Depth along the track
    fn depth(&self) -> f32;
    /// Lateral offset from the centerline
    fn lateral(&self) -> f32;
    /// ARGB body color
    fn color(&self) -> u32;
}
