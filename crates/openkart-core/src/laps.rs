//! Checkpoint-based lap counting
//!
//! Checkpoints must be crossed in order, within the track's lateral
//! tolerance. A lap is credited when the sequence wraps back to the start
//! line. The kart starts on checkpoint 0, so the first target is checkpoint 1.

use crate::track::Track;

/// A completed lap
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LapEvent {
    /// Laps completed so far, including this one
    pub lap: u32,
    /// Duration of this lap in seconds
    pub time: f32,
}

#[derive(Debug, Clone, Default)]
pub struct LapTracker {
    /// Index of the last checkpoint passed
    last_checkpoint: usize,
    laps: u32,
    lap_times: Vec<f32>,
    current: f32,
}

impl LapTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn laps(&self) -> u32 {
        self.laps
    }

    pub fn lap_times(&self) -> &[f32] {
        &self.lap_times
    }

    pub fn best_lap(&self) -> Option<f32> {
        self.lap_times.iter().copied().reduce(f32::min)
    }

    /// Sum of all completed laps
    pub fn total_time(&self) -> f32 {
        self.lap_times.iter().sum()
    }

    /// Time spent on the lap in progress
    pub fn current_lap_time(&self) -> f32 {
        self.current
    }

    /// Index of the checkpoint that must be crossed next
    pub fn next_checkpoint(&self, track: &Track) -> Option<usize> {
        let count = track.checkpoints().len();
        (count > 0).then(|| (self.last_checkpoint + 1) % count)
    }

    /// Record a move from `prev_z` to `new_z` at lateral offset `x`.
    ///
    /// The direction is inferred from the positions alone, so a move is taken
    /// as reversing when it would cover half the loop or more. Callers that
    /// know the distance actually driven should use [`LapTracker::observe_travel`].
    pub fn observe(&mut self, track: &Track, prev_z: f32, new_z: f32, x: f32, dt: f32) -> Option<LapEvent> {
        self.tick(dt);
        if !self.counts(track, x) || prev_z == new_z {
            return None;
        }
        // Reversing across a checkpoint looks like a sweep around most of the loop
        if track.relative_distance(prev_z, new_z) >= track.total_length() * 0.5 {
            return None;
        }
        let laps = self.sweep(track, prev_z, new_z);
        self.credit(laps)
    }

    /// Record a move of `travelled` (signed, unwrapped) distance that ended at
    /// `new_z`.
    ///
    /// Reversing never credits anything. A forward move may be any length:
    /// every full loop it covers is a lap, and the remainder is swept like a
    /// short move. When a single move completes several laps their time is
    /// split evenly and only the last is returned.
    pub fn observe_travel(
        &mut self,
        track: &Track,
        prev_z: f32,
        new_z: f32,
        travelled: f32,
        x: f32,
        dt: f32,
    ) -> Option<LapEvent> {
        self.tick(dt);
        if !self.counts(track, x) || !(travelled.is_finite() && travelled > 0.0) {
            return None;
        }
        let length = track.total_length();
        let full_loops = if length > 0.0 { (travelled / length).floor() as u32 } else { 0 };
        let laps = full_loops + self.sweep(track, prev_z, new_z);
        self.credit(laps)
    }

    fn tick(&mut self, dt: f32) {
        if dt.is_finite() && dt > 0.0 {
            self.current += dt;
        }
    }

    fn counts(&self, track: &Track, x: f32) -> bool {
        !track.checkpoints().is_empty() && x.abs() <= track.check_width()
    }

    /// Advance through the checkpoints crossed between `prev_z` and `new_z`,
    /// at most once around the list. Returns the number of start-line passes.
    fn sweep(&mut self, track: &Track, prev_z: f32, new_z: f32) -> u32 {
        let checkpoints = track.checkpoints();
        let mut laps = 0;
        for _ in 0..checkpoints.len() {
            let next = (self.last_checkpoint + 1) % checkpoints.len();
            if !track.passed(prev_z, new_z, checkpoints[next]) {
                break;
            }
            self.last_checkpoint = next;
            tracing::trace!("Checkpoint {} passed", next);
            if next == 0 {
                laps += 1;
            }
        }
        laps
    }

    fn credit(&mut self, laps: u32) -> Option<LapEvent> {
        if laps == 0 {
            return None;
        }
        let time = self.current / laps as f32;
        self.current = 0.0;
        for _ in 0..laps {
            self.laps += 1;
            self.lap_times.push(time);
            tracing::info!("Lap {} completed in {:.2}s", self.laps, time);
        }
        Some(LapEvent { lap: self.laps, time })
    }
}
