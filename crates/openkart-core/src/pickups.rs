//! Pickups and the per-frame collision pass
//!
//! The track only stores the initial layout. A race spawns a [`Pickups`]
//! set from it; the collision pass moves travelling pickups, detects
//! vehicles driving over them and applies their effect directly to the
//! vehicle. Consumed pickups are dropped from the set.

use crate::track::Track;
use crate::vehicle::Vehicle;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// A pickup is hit when it lies less than this far ahead of the vehicle
pub const HIT_DEPTH: f32 = 5.0;
/// ...and less than this far to the side
pub const HIT_LATERAL: f32 = 0.6;
/// Surge granted by a boost pad
pub const BOOST_AMOUNT: f32 = 80.0;
/// Seconds of reduced grip after driving through oil
pub const OIL_DURATION: f32 = 2.0;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// What a pickup does when driven over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PickupKind {
    /// Speed boost pad, stays on the track
    Boost,
    /// Oil slick hazard, stays on the track
    Oil,
    /// Travelling shell, consumed on hit
    Shell,
}

impl PickupKind {
    pub const ALL: [PickupKind; 3] = [PickupKind::Boost, PickupKind::Oil, PickupKind::Shell];

    pub fn name(&self) -> &'static str {
        match self {
            PickupKind::Boost => "boost",
            PickupKind::Oil => "oil",
            PickupKind::Shell => "shell",
        }
    }

    /// Fallback ARGB color when no sprite is loaded
    pub fn color(&self) -> u32 {
        match self {
            PickupKind::Boost => 0xFFFFFF00,
            PickupKind::Oil => 0xFF000000,
            PickupKind::Shell => 0xFFFF0000,
        }
    }
}

/// A pickup placed on the track
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pickup {
    pub kind: PickupKind,
    pub z: f32,
    pub x: f32,
    /// Forward speed along the track, 0 for stationary pickups
    pub speed: f32,
    pub active: bool,
}

impl Pickup {
    pub fn new(kind: PickupKind, z: f32, x: f32) -> Self {
        Self {
            kind,
            z,
            x,
            speed: 0.0,
            active: true,
        }
    }

    pub fn moving(kind: PickupKind, z: f32, x: f32, speed: f32) -> Self {
        Self { speed, ..Self::new(kind, z, x) }
    }
}

/// A vehicle ran over a pickup
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickupHit {
    /// Index into the vehicle slice passed to [`Pickups::collide`]
    pub vehicle: usize,
    pub kind: PickupKind,
    pub z: f32,
}

/// Runtime pickup state for one race
#[derive(Debug, Clone, Default)]
pub struct Pickups {
    items: Vec<Pickup>,
}

impl Pickups {
    pub fn from_track(track: &Track) -> Self {
        Self {
            items: track.pickups().to_vec(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[Pickup] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Move travelling pickups and resolve hits for every vehicle.
    pub fn collide(&mut self, track: &Track, vehicles: &mut [Vehicle], dt: f32) -> Vec<PickupHit> {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        for item in self.items.iter_mut().filter(|i| i.active && i.speed != 0.0) {
            item.z = track.wrap(item.z + item.speed * dt);
        }

        let mut hits = Vec::new();
        for (index, vehicle) in vehicles.iter_mut().enumerate() {
            for item in self.items.iter_mut().filter(|i| i.active) {
                let dz = track.relative_distance(vehicle.z, item.z);
                if dz >= HIT_DEPTH || (vehicle.x - item.x).abs() >= HIT_LATERAL {
                    continue;
                }
                match item.kind {
                    PickupKind::Boost => vehicle.apply_boost(BOOST_AMOUNT),
                    PickupKind::Oil => vehicle.apply_oil(OIL_DURATION),
                    PickupKind::Shell => {
                        vehicle.apply_shell_hit();
                        item.active = false;
                    }
                }
                tracing::debug!("Vehicle {} hit {} at {:.1}", index, item.kind.name(), item.z);
                hits.push(PickupHit {
                    vehicle: index,
                    kind: item.kind,
                    z: item.z,
                });
            }
        }

        self.items.retain(|i| i.active);
        hits
    }
}
