//! Looping track model
//!
//! A track is a closed loop of road segments laid end to end along the
//! depth axis. Every depth is interpreted modulo the total loop length.
//! Besides the road itself the track carries scenery markers, the initial
//! pickup layout and the checkpoint sequence used for lap counting.
//!
//! A `Track` is immutable once built; vehicles share it behind an `Arc`.

use thiserror::Error;

use crate::pickups::Pickup;

#[derive(Error, Debug, PartialEq)]
pub enum TrackError {
    #[error("Segment {index} has non-positive length {length}")]
    NonPositiveLength { index: usize, length: f32 },

    #[error("First checkpoint must be at depth 0, got {0}")]
    FirstCheckpointNotAtStart(f32),

    #[error("Checkpoint {index} at {depth} is not past the previous one")]
    CheckpointsNotIncreasing { index: usize, depth: f32 },

    #[error("Checkpoint {index} at {depth} lies beyond the loop length {total}")]
    CheckpointOutOfRange { index: usize, depth: f32, total: f32 },

    #[error("Checkpoints need at least one segment")]
    CheckpointsWithoutSegments,
}

pub type Result<T> = std::result::Result<T, TrackError>;

/// Default lateral tolerance for checkpoint crossings
pub const DEFAULT_CHECK_WIDTH: f32 = 3.0;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One stretch of road
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    /// Length along the depth axis (> 0)
    pub length: f32,
    /// Turn rate per unit depth. Positive bends right.
    pub curvature: f32,
    /// Height above the start line. Not used by the physics.
    pub elevation: f32,
    /// Road width multiplier
    pub width: f32,
}

impl Default for Segment {
    fn default() -> Self {
        Self {
            length: 10.0,
            curvature: 0.0,
            elevation: 0.0,
            width: 1.0,
        }
    }
}

impl Segment {
    pub fn straight(length: f32) -> Self {
        Self { length, ..Default::default() }
    }

    pub fn curve(length: f32, curvature: f32) -> Self {
        Self { length, curvature, ..Default::default() }
    }

    pub fn hill(length: f32, elevation: f32) -> Self {
        Self { length, elevation, ..Default::default() }
    }
}

/// Roadside scenery marker
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decoration {
    pub z: f32,
    pub x: f32,
    /// ARGB color
    pub color: u32,
}

/// Result of a depth lookup
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentHit<'a> {
    pub segment: &'a Segment,
    pub index: usize,
    /// Depth at which the segment starts
    pub start: f32,
    /// Progress through the segment in [0, 1)
    pub fraction: f32,
}

/// A closed loop of segments plus its scenery, pickups and checkpoints
#[derive(Debug, Clone, Default)]
pub struct Track {
    segments: Vec<Segment>,
    /// End depth of each segment, parallel to `segments`
    cumulative: Vec<f32>,
    total_length: f32,
    decorations: Vec<Decoration>,
    pickups: Vec<Pickup>,
    checkpoints: Vec<f32>,
    check_width: f32,
}

impl Track {
    /// A track without segments. Lookups degrade to "no segment".
    pub fn empty() -> Self {
        Self {
            check_width: DEFAULT_CHECK_WIDTH,
            ..Default::default()
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn total_length(&self) -> f32 {
        self.total_length
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn decorations(&self) -> &[Decoration] {
        &self.decorations
    }

    /// Initial pickup layout. Runtime state lives in [`crate::Pickups`].
    pub fn pickups(&self) -> &[Pickup] {
        &self.pickups
    }

    pub fn checkpoints(&self) -> &[f32] {
        &self.checkpoints
    }

    pub fn check_width(&self) -> f32 {
        self.check_width
    }

    /// Normalize a depth into [0, total_length).
    ///
    /// On an empty track there is nothing to wrap around, so the depth is
    /// returned as is (non-finite values become 0).
    pub fn wrap(&self, z: f32) -> f32 {
        wrap_depth(z, self.total_length)
    }

    /// Find the segment containing `z`.
    pub fn segment_at(&self, z: f32) -> Option<SegmentHit<'_>> {
        if self.segments.is_empty() {
            return None;
        }
        let z = self.wrap(z);
        let index = self
            .cumulative
            .partition_point(|&end| end <= z)
            .min(self.segments.len() - 1);
        let segment = &self.segments[index];
        let start = if index == 0 { 0.0 } else { self.cumulative[index - 1] };
        let fraction = ((z - start) / segment.length).clamp(0.0, 1.0 - f32::EPSILON);
        Some(SegmentHit {
            segment,
            index,
            start,
            fraction,
        })
    }

    pub fn curvature_at(&self, z: f32) -> f32 {
        self.segment_at(z).map_or(0.0, |hit| hit.segment.curvature)
    }

    /// Forward distance from `from` to `to` in the direction of travel.
    /// Always in [0, total_length).
    pub fn relative_distance(&self, from: f32, to: f32) -> f32 {
        if self.total_length <= 0.0 {
            return 0.0;
        }
        let mut diff = self.wrap(to) - self.wrap(from);
        if diff < 0.0 {
            diff += self.total_length;
        }
        diff
    }

    /// True if moving from `prev_z` to `new_z` swept over `cp_z`.
    ///
    /// The swept interval is half-open. When `prev_z > new_z` the interval
    /// wrapped past the end of the loop.
    pub fn passed(&self, prev_z: f32, new_z: f32, cp_z: f32) -> bool {
        if prev_z <= new_z {
            prev_z <= cp_z && cp_z < new_z
        } else {
            cp_z >= prev_z || cp_z < new_z
        }
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Assembles a [`Track`] and validates it on [`TrackBuilder::build`].
#[derive(Debug, Clone)]
pub struct TrackBuilder {
    segments: Vec<Segment>,
    decorations: Vec<Decoration>,
    pickups: Vec<Pickup>,
    checkpoints: Checkpoints,
    check_width: f32,
}

#[derive(Debug, Clone)]
enum Checkpoints {
    Explicit(Vec<f32>),
    Even(usize),
}

impl Default for TrackBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackBuilder {
    pub fn new() -> Self {
        Self {
            segments: Vec::new(),
            decorations: Vec::new(),
            pickups: Vec::new(),
            checkpoints: Checkpoints::Explicit(Vec::new()),
            check_width: DEFAULT_CHECK_WIDTH,
        }
    }

    pub fn segment(mut self, segment: Segment) -> Self {
        self.segments.push(segment);
        self
    }

    pub fn segments(mut self, segments: impl IntoIterator<Item = Segment>) -> Self {
        self.segments.extend(segments);
        self
    }

    pub fn decoration(mut self, z: f32, x: f32, color: u32) -> Self {
        self.decorations.push(Decoration { z, x, color });
        self
    }

    pub fn pickup(mut self, pickup: Pickup) -> Self {
        self.pickups.push(pickup);
        self
    }

    /// Explicit checkpoint depths. The first must be 0.
    pub fn checkpoints(mut self, depths: Vec<f32>) -> Self {
        self.checkpoints = Checkpoints::Explicit(depths);
        self
    }

    /// `count` checkpoints spread evenly around the finished loop.
    pub fn even_checkpoints(mut self, count: usize) -> Self {
        self.checkpoints = Checkpoints::Even(count);
        self
    }

    pub fn check_width(mut self, width: f32) -> Self {
        self.check_width = width;
        self
    }

    pub fn build(self) -> Result<Track> {
        let mut cumulative = Vec::with_capacity(self.segments.len());
        let mut total_length = 0.0f32;
        for (index, seg) in self.segments.iter().enumerate() {
            if !(seg.length.is_finite() && seg.length > 0.0) {
                return Err(TrackError::NonPositiveLength { index, length: seg.length });
            }
            total_length += seg.length;
            cumulative.push(total_length);
        }

        let checkpoints = match self.checkpoints {
            Checkpoints::Explicit(depths) => depths,
            Checkpoints::Even(0) => Vec::new(),
            Checkpoints::Even(count) => {
                let spacing = total_length / count as f32;
                (0..count).map(|i| i as f32 * spacing).collect()
            }
        };
        validate_checkpoints(&checkpoints, total_length)?;

        let mut decorations = self.decorations;
        for d in &mut decorations {
            d.z = wrap_depth(d.z, total_length);
        }
        let mut pickups = self.pickups;
        for p in &mut pickups {
            p.z = wrap_depth(p.z, total_length);
        }

        let track = Track {
            segments: self.segments,
            cumulative,
            total_length,
            decorations,
            pickups,
            checkpoints,
            check_width: self.check_width,
        };

        tracing::debug!(
            "Track built: {} segments, length {:.1}, {} checkpoints, {} pickups",
            track.segments.len(),
            track.total_length,
            track.checkpoints.len(),
            track.pickups.len()
        );
        Ok(track)
    }
}

fn wrap_depth(z: f32, total_length: f32) -> f32 {
    if !z.is_finite() {
        return 0.0;
    }
    if total_length <= 0.0 {
        return z;
    }
    let r = z.rem_euclid(total_length);
    // rem_euclid can round up to the modulus for tiny negative inputs
    if r >= total_length {
        0.0
    } else {
        r
    }
}

fn validate_checkpoints(checkpoints: &[f32], total_length: f32) -> Result<()> {
    let Some(&first) = checkpoints.first() else {
        return Ok(());
    };
    if total_length <= 0.0 {
        return Err(TrackError::CheckpointsWithoutSegments);
    }
    if first != 0.0 {
        return Err(TrackError::FirstCheckpointNotAtStart(first));
    }
    for (index, pair) in checkpoints.windows(2).enumerate() {
        if !(pair[1] > pair[0]) {
            return Err(TrackError::CheckpointsNotIncreasing { index: index + 1, depth: pair[1] });
        }
    }
    for (index, &depth) in checkpoints.iter().enumerate() {
        if depth >= total_length {
            return Err(TrackError::CheckpointOutOfRange { index, depth, total: total_length });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_part_loop() -> Track {
        TrackBuilder::new()
            .segment(Segment::straight(100.0))
            .segment(Segment::curve(100.0, 0.002))
            .segment(Segment::curve(100.0, -0.003))
            .even_checkpoints(3)
            .build()
            .unwrap()
    }

    #[test]
    fn cumulative_lookup() {
        let track = three_part_loop();
        assert_eq!(track.total_length(), 300.0);

        let hit = track.segment_at(0.0).unwrap();
        assert_eq!(hit.index, 0);
        assert_eq!(hit.start, 0.0);
        assert_eq!(hit.fraction, 0.0);

        // Segment boundaries belong to the next segment
        let hit = track.segment_at(100.0).unwrap();
        assert_eq!(hit.index, 1);
        assert_eq!(hit.start, 100.0);

        let hit = track.segment_at(150.0).unwrap();
        assert_eq!(hit.index, 1);
        assert!((hit.fraction - 0.5).abs() < 1e-6);

        let hit = track.segment_at(299.9).unwrap();
        assert_eq!(hit.index, 2);
        assert!(hit.fraction < 1.0);
    }

    #[test]
    fn lookup_wraps_depth() {
        let track = three_part_loop();
        assert_eq!(track.segment_at(-1.0).unwrap().index, 2);
        assert_eq!(track.segment_at(310.0).unwrap().index, 0);
        assert_eq!(track.curvature_at(450.0), 0.002);
        assert_eq!(track.curvature_at(250.0), -0.003);
    }

    #[test]
    fn empty_track_degrades() {
        let track = Track::empty();
        assert!(track.segment_at(12.0).is_none());
        assert_eq!(track.curvature_at(12.0), 0.0);
        assert_eq!(track.relative_distance(5.0, 1.0), 0.0);
        assert_eq!(track.wrap(12.5), 12.5);
        assert_eq!(track.wrap(f32::NAN), 0.0);
    }

    #[test]
    fn wrap_stays_in_range() {
        let track = three_part_loop();
        for z in [-1e-7f32, -300.0, -0.5, 0.0, 299.99, 300.0, 900.0, 1e6] {
            let w = track.wrap(z);
            assert!((0.0..300.0).contains(&w), "wrap({}) = {}", z, w);
        }
    }

    #[test]
    fn relative_distance_is_forward() {
        let track = three_part_loop();
        assert_eq!(track.relative_distance(10.0, 30.0), 20.0);
        assert_eq!(track.relative_distance(290.0, 10.0), 20.0);
        assert_eq!(track.relative_distance(30.0, 10.0), 280.0);
        assert_eq!(track.relative_distance(42.0, 42.0), 0.0);
    }

    #[test]
    fn checkpoint_crossing() {
        let track = three_part_loop();
        let l = track.total_length();
        let cps = track.checkpoints().to_vec();
        assert_eq!(cps, vec![0.0, 100.0, 200.0]);

        // Plain forward sweeps, half-open on the far end
        assert!(track.passed(50.0, 150.0, l / 3.0));
        assert!(track.passed(100.0, 150.0, 100.0));
        assert!(!track.passed(50.0, 100.0, 100.0));
        assert!(!track.passed(120.0, 150.0, 100.0));
        assert!(!track.passed(70.0, 70.0, 70.0));

        // Sweeps that wrap past the end of the loop
        assert!(track.passed(l - 1.0, 1.0, 0.0));
        assert!(track.passed(250.0, 10.0, 260.0));
        assert!(track.passed(250.0, 10.0, 5.0));
        assert!(!track.passed(l - 1.0, 1.0, 100.0));
        assert!(!track.passed(250.0, 10.0, 200.0));
        // Landing exactly on 0 does not count until the next sweep leaves it
        assert!(!track.passed(l - 1.0, 0.0, 0.0));
        assert!(track.passed(0.0, 1.0, 0.0));
    }

    #[test]
    fn rejects_bad_segments() {
        let err = TrackBuilder::new()
            .segment(Segment::straight(50.0))
            .segment(Segment::straight(0.0))
            .build()
            .unwrap_err();
        assert_eq!(err, TrackError::NonPositiveLength { index: 1, length: 0.0 });

        let err = TrackBuilder::new()
            .segment(Segment::straight(f32::NAN))
            .build()
            .unwrap_err();
        assert!(matches!(err, TrackError::NonPositiveLength { index: 0, .. }));
    }

    #[test]
    fn rejects_bad_checkpoints() {
        let base = TrackBuilder::new().segment(Segment::straight(100.0));

        let err = base.clone().checkpoints(vec![10.0, 50.0]).build().unwrap_err();
        assert_eq!(err, TrackError::FirstCheckpointNotAtStart(10.0));

        let err = base.clone().checkpoints(vec![0.0, 50.0, 50.0]).build().unwrap_err();
        assert_eq!(err, TrackError::CheckpointsNotIncreasing { index: 2, depth: 50.0 });

        let err = base.clone().checkpoints(vec![0.0, 120.0]).build().unwrap_err();
        assert!(matches!(err, TrackError::CheckpointOutOfRange { index: 1, .. }));

        let err = TrackBuilder::new().checkpoints(vec![0.0]).build().unwrap_err();
        assert_eq!(err, TrackError::CheckpointsWithoutSegments);
    }

    #[test]
    fn markers_are_wrapped_on_build() {
        let track = TrackBuilder::new()
            .segment(Segment::straight(100.0))
            .decoration(130.0, 4.0, 0xFF00FF00)
            .decoration(-10.0, -4.0, 0xFF00FF00)
            .build()
            .unwrap();
        let zs: Vec<f32> = track.decorations().iter().map(|d| d.z).collect();
        assert_eq!(zs, vec![30.0, 90.0]);
    }
}
