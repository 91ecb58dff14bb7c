//! Rubber-banding opponent
//!
//! The ghost has no physics of its own. Each frame it picks a speed from its
//! forward distance to a target depth (usually player 1) and slides along the
//! centerline. Distance is always measured forward around the loop, so a
//! ghost that is just ahead of its target sees almost a full lap to go and
//! never slows below its base speed.

use std::sync::Arc;

use crate::track::Track;
use crate::Racer;

/// Speed at zero distance, before difficulty scaling
pub const GHOST_BASE_SPEED: f32 = 100.0;
/// Extra speed per unit of distance to the target
pub const GHOST_CATCHUP_GAIN: f32 = 0.3;
pub const GHOST_SPAWN_Z: f32 = 20.0;
pub const GHOST_SPAWN_SPEED: f32 = 80.0;

#[derive(Debug, Clone)]
pub struct Ghost {
    track: Arc<Track>,
    pub z: f32,
    pub x: f32,
    pub speed: f32,
    difficulty: f32,
    pub color: u32,
}

impl Ghost {
    pub fn new(track: Arc<Track>, difficulty: f32) -> Self {
        let mut ghost = Self {
            track,
            z: 0.0,
            x: 0.0,
            speed: 0.0,
            difficulty: 1.0,
            color: 0xFFFF0000,
        };
        ghost.set_difficulty(difficulty);
        ghost.reset();
        ghost
    }

    pub fn reset(&mut self) {
        self.z = self.track.wrap(GHOST_SPAWN_Z);
        self.x = 0.0;
        self.speed = GHOST_SPAWN_SPEED;
    }

    pub fn difficulty(&self) -> f32 {
        self.difficulty
    }

    /// Non-positive or non-finite values are ignored.
    pub fn set_difficulty(&mut self, difficulty: f32) {
        if difficulty.is_finite() && difficulty > 0.0 {
            self.difficulty = difficulty;
            tracing::debug!("Ghost difficulty set to {:.1}", difficulty);
        }
    }

    /// Chase `target` for `elapsed` seconds.
    pub fn update(&mut self, elapsed: f32, target: f32) {
        if !elapsed.is_finite() || elapsed <= 0.0 {
            return;
        }
        let distance = self.track.relative_distance(self.z, target);
        self.speed = (GHOST_BASE_SPEED + distance * GHOST_CATCHUP_GAIN) * self.difficulty;
        self.z = self.track.wrap(self.z + self.speed * elapsed);
    }
}

impl Racer for Ghost {
    fn depth(&self) -> f32 {
        self.z
    }

    fn lateral(&self) -> f32 {
        self.x
    }

    fn color(&self) -> u32 {
        self.color
    }
}
