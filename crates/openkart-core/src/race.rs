//! One race on one track
//!
//! The session owns everything that changes during a race: the player
//! karts, the ghost (single player only), the runtime pickup set and one lap
//! tracker per player. Each frame runs players, then the ghost, then the
//! pickup collision pass.

use std::sync::Arc;

use openkart_common::{RaceSettings, VehicleTuning};

use crate::ghost::Ghost;
use crate::laps::{LapEvent, LapTracker};
use crate::pickups::{PickupHit, Pickups};
use crate::track::Track;
use crate::vehicle::{Controls, Vehicle};
use crate::Racer;

pub const MAX_PLAYERS: usize = 2;
/// Player body colors (ARGB)
pub const PLAYER_COLORS: [u32; MAX_PLAYERS] = [0xFF0000FF, 0xFFFFFF00];
/// Side-by-side grid offset in two player races
pub const GRID_OFFSET: f32 = 0.8;

/// Input for one player for one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayerInput {
    pub controls: Controls,
    /// Drift button held
    pub drift: bool,
}

/// Something noteworthy that happened during [`RaceSession::update`]
#[derive(Debug, Clone, PartialEq)]
pub enum RaceEvent {
    Lap { player: usize, lap: LapEvent },
    Finished { player: usize, lap_times: Vec<f32>, total: f32 },
    PickupHit(PickupHit),
}

pub struct RaceSession {
    track: Arc<Track>,
    players: Vec<Vehicle>,
    trackers: Vec<LapTracker>,
    finished: Vec<bool>,
    ghost: Option<Ghost>,
    pickups: Pickups,
    items_enabled: bool,
    laps_to_win: u32,
    elapsed: f32,
}

impl RaceSession {
    /// `players` is clamped to 1..=2.
    pub fn new(track: Arc<Track>, settings: &RaceSettings, tuning: &VehicleTuning, players: usize) -> Self {
        let count = players.clamp(1, MAX_PLAYERS);
        if count != players {
            tracing::warn!("Unsupported player count {}, using {}", players, count);
        }

        let vehicles = (0..count)
            .map(|i| Vehicle::new(track.clone(), tuning.clone()).with_color(PLAYER_COLORS[i]))
            .collect();
        let ghost = (count == 1).then(|| Ghost::new(track.clone(), settings.difficulty));

        let mut session = Self {
            track,
            players: vehicles,
            trackers: vec![LapTracker::new(); count],
            finished: vec![false; count],
            ghost,
            pickups: Pickups::empty(),
            items_enabled: settings.items,
            laps_to_win: settings.laps.max(1),
            elapsed: 0.0,
        };
        session.restart();
        session
    }

    /// Put everything back on the grid.
    pub fn restart(&mut self) {
        let count = self.players.len();
        for (i, player) in self.players.iter_mut().enumerate() {
            let spawn_x = if count > 1 {
                if i == 0 {
                    -GRID_OFFSET
                } else {
                    GRID_OFFSET
                }
            } else {
                0.0
            };
            player.reset(0.0, spawn_x);
        }
        for tracker in &mut self.trackers {
            tracker.reset();
        }
        self.finished.iter_mut().for_each(|f| *f = false);
        if let Some(ghost) = &mut self.ghost {
            ghost.reset();
        }
        self.pickups = if self.items_enabled {
            Pickups::from_track(&self.track)
        } else {
            Pickups::empty()
        };
        self.elapsed = 0.0;
        tracing::info!(
            "Race start: {} player(s), {} laps, items {}",
            count,
            self.laps_to_win,
            if self.items_enabled { "on" } else { "off" }
        );
    }

    /// Advance the race by `dt` seconds. Missing inputs count as no input.
    pub fn update(&mut self, dt: f32, inputs: &[PlayerInput]) -> Vec<RaceEvent> {
        let mut events = Vec::new();
        if !dt.is_finite() || dt <= 0.0 {
            return events;
        }
        self.elapsed += dt;

        for (i, player) in self.players.iter_mut().enumerate() {
            let input = inputs.get(i).copied().unwrap_or_default();
            let prev_z = player.z;
            player.update(dt, &input.controls, input.drift);

            let tracker = &mut self.trackers[i];
            let travelled = player.travelled();
            let Some(lap) = tracker.observe_travel(&self.track, prev_z, player.z, travelled, player.x, dt) else {
                continue;
            };
            events.push(RaceEvent::Lap { player: i, lap });
            if !self.finished[i] && tracker.laps() >= self.laps_to_win {
                self.finished[i] = true;
                let total = tracker.total_time();
                tracing::info!("Player {} finished in {:.2}s", i + 1, total);
                events.push(RaceEvent::Finished {
                    player: i,
                    lap_times: tracker.lap_times().to_vec(),
                    total,
                });
            }
        }

        if let (Some(ghost), Some(leader)) = (&mut self.ghost, self.players.first()) {
            ghost.update(dt, leader.z);
        }

        if self.items_enabled {
            let hits = self.pickups.collide(&self.track, &mut self.players, dt);
            events.extend(hits.into_iter().map(RaceEvent::PickupHit));
        }
        events
    }

    /// Change the ghost's difficulty. No effect without a ghost.
    pub fn set_difficulty(&mut self, difficulty: f32) {
        if let Some(ghost) = &mut self.ghost {
            ghost.set_difficulty(difficulty);
        }
    }

    pub fn difficulty(&self) -> Option<f32> {
        self.ghost.as_ref().map(Ghost::difficulty)
    }

    pub fn track(&self) -> &Arc<Track> {
        &self.track
    }

    pub fn players(&self) -> &[Vehicle] {
        &self.players
    }

    pub fn player(&self, index: usize) -> Option<&Vehicle> {
        self.players.get(index)
    }

    pub fn ghost(&self) -> Option<&Ghost> {
        self.ghost.as_ref()
    }

    pub fn pickups(&self) -> &Pickups {
        &self.pickups
    }

    pub fn items_enabled(&self) -> bool {
        self.items_enabled
    }

    pub fn lap_tracker(&self, player: usize) -> Option<&LapTracker> {
        self.trackers.get(player)
    }

    pub fn laps_to_win(&self) -> u32 {
        self.laps_to_win
    }

    pub fn is_finished(&self, player: usize) -> bool {
        self.finished.get(player).copied().unwrap_or(false)
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Everything `viewer` should see besides itself: the other players and
    /// the ghost.
    pub fn opponents(&self, viewer: usize) -> Vec<&dyn Racer> {
        let mut others: Vec<&dyn Racer> = self
            .players
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != viewer)
            .map(|(_, p)| p as &dyn Racer)
            .collect();
        if let Some(ghost) = &self.ghost {
            others.push(ghost);
        }
        others
    }
}
