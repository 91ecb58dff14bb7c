//! Kart physics
//!
//! Fixed-timestep integrator for a kart on a looping track:
//!   - elapsed time is accumulated and consumed in `STEP_DT` sub-steps, so
//!     the trajectory does not depend on how the caller slices time
//!   - forward acceleration, braking with a short stop before reversing, drag
//!   - steering that weakens with speed
//!   - drifting with a release boost and cooldown
//!   - lateral friction and curvature pushback toward the outside of a bend
//!   - walls at the road edges

use std::sync::Arc;

use openkart_common::VehicleTuning;

use crate::track::Track;
use crate::Racer;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Fixed physics sub-step in seconds
pub const STEP_DT: f32 = 0.016;
/// Upper bound on sub-steps executed by one `update` call
pub const MAX_STEPS_PER_UPDATE: u32 = 240;
/// Slack when comparing pending time against one sub-step, so totals that are
/// whole multiples of `STEP_DT` run the same number of steps however sliced
const STEP_EPSILON: f64 = 1e-6;
/// Walls sit at ±LATERAL_LIMIT
pub const LATERAL_LIMIT: f32 = 3.0;
/// Reverse speed limit as a fraction of max speed
pub const REVERSE_FACTOR: f32 = 0.5;
/// Seconds a kart braked to a stop waits before reversing
pub const REVERSE_DELAY: f32 = 0.75;
/// Grip multiplier while the oil timer runs
pub const OIL_GRIP: f32 = 0.3;
/// Steering sensitivity at top speed
pub const MIN_STEER_SENSITIVITY: f32 = 0.2;
/// Extra steering authority while drifting
pub const DRIFT_STEER_FACTOR: f32 = 1.5;
/// Per-step lateral slide amplification while drifting
pub const DRIFT_SLIDE_FACTOR: f32 = 1.02;
/// Seconds before another drift boost can be earned
pub const DRIFT_COOLDOWN: f32 = 1.0;
/// Boosts never push the effective speed past this multiple of max speed
pub const BOOST_CAP_FACTOR: f32 = 1.2;

/// Driver input for one frame. Unset fields are `false`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Controls {
    pub accelerate: bool,
    pub brake: bool,
    pub left: bool,
    pub right: bool,
}

impl Controls {
    pub fn accelerate() -> Self {
        Self { accelerate: true, ..Default::default() }
    }

    pub fn brake() -> Self {
        Self { brake: true, ..Default::default() }
    }

    /// Net steering input: -1 left, +1 right, 0 for none or both
    pub fn steer(&self) -> f32 {
        let mut steer = 0.0;
        if self.left {
            steer -= 1.0;
        }
        if self.right {
            steer += 1.0;
        }
        steer
    }
}

// ---------------------------------------------------------------------------
// Vehicle
// ---------------------------------------------------------------------------

/// A kart driving on a shared track
#[derive(Debug, Clone)]
pub struct Vehicle {
    track: Arc<Track>,
    /// Depth along the track, in [0, total_length)
    pub z: f32,
    /// Lateral offset, in [-LATERAL_LIMIT, LATERAL_LIMIT]
    pub x: f32,
    /// Forward speed, in [-max_speed * REVERSE_FACTOR, max_speed]
    pub speed: f32,
    /// Lateral velocity
    pub vx: f32,
    /// Decaying boost reserve added on top of `speed`
    pub surge: f32,
    /// Seconds of reduced grip left
    pub oil_timer: f32,
    /// Seconds until a drift boost can be earned again
    pub drift_cooldown: f32,
    drift_timer: f32,
    reverse_hold: f32,
    accumulator: f64,
    travelled: f32,
    pub tuning: VehicleTuning,
    /// ARGB body color
    pub color: u32,
}

impl Vehicle {
    pub fn new(track: Arc<Track>, tuning: VehicleTuning) -> Self {
        Self {
            track,
            z: 0.0,
            x: 0.0,
            speed: 0.0,
            vx: 0.0,
            surge: 0.0,
            oil_timer: 0.0,
            drift_cooldown: 0.0,
            drift_timer: 0.0,
            reverse_hold: 0.0,
            accumulator: 0.0,
            travelled: 0.0,
            tuning,
            color: 0xFF0000FF,
        }
    }

    /// Builder-style color override
    pub fn with_color(mut self, color: u32) -> Self {
        self.color = color;
        self
    }

    /// Place the kart at a spawn offset with all transient state cleared.
    pub fn reset(&mut self, spawn_z: f32, spawn_x: f32) {
        self.z = self.track.wrap(spawn_z);
        self.x = spawn_x.clamp(-LATERAL_LIMIT, LATERAL_LIMIT);
        self.speed = 0.0;
        self.vx = 0.0;
        self.surge = 0.0;
        self.oil_timer = 0.0;
        self.drift_cooldown = 0.0;
        self.drift_timer = 0.0;
        self.reverse_hold = 0.0;
        self.accumulator = 0.0;
        self.travelled = 0.0;
    }

    pub fn track(&self) -> &Arc<Track> {
        &self.track
    }

    /// Speed including the boost reserve
    pub fn effective_speed(&self) -> f32 {
        self.speed + self.surge
    }

    /// |speed| as a fraction of max speed
    pub fn speed_fraction(&self) -> f32 {
        if self.tuning.max_speed > 0.0 {
            (self.speed.abs() / self.tuning.max_speed).min(1.0)
        } else {
            0.0
        }
    }

    /// True while a drift is building toward a boost
    pub fn is_drifting(&self) -> bool {
        self.drift_timer > 0.0
    }

    /// Signed distance covered by the last `update` call, negative when reversing
    pub fn travelled(&self) -> f32 {
        self.travelled
    }

    /// Simulated time not yet consumed by a sub-step
    pub fn pending_time(&self) -> f32 {
        self.accumulator.max(0.0) as f32
    }

    /// Add to the boost reserve, keeping speed + surge under the boost cap.
    pub fn apply_boost(&mut self, amount: f32) {
        let headroom = (self.tuning.max_speed * BOOST_CAP_FACTOR - self.speed).max(0.0);
        self.surge = (self.surge + amount.max(0.0)).min(headroom);
    }

    pub fn apply_oil(&mut self, duration: f32) {
        self.oil_timer = duration.max(0.0);
    }

    pub fn apply_shell_hit(&mut self) {
        self.speed *= 0.5;
        self.surge *= 0.5;
    }

    /// Advance the simulation by `elapsed` seconds.
    ///
    /// `drifting` is true while the drift button is held.
    pub fn update(&mut self, elapsed: f32, controls: &Controls, drifting: bool) {
        self.travelled = 0.0;
        if !elapsed.is_finite() || elapsed <= 0.0 {
            return;
        }
        self.accumulator += f64::from(elapsed);

        let step_dt = f64::from(STEP_DT);
        let mut steps = 0;
        while self.accumulator >= step_dt - STEP_EPSILON {
            if steps == MAX_STEPS_PER_UPDATE {
                tracing::warn!(
                    "Dropping {:.3}s of physics backlog after {} sub-steps",
                    self.accumulator,
                    steps
                );
                self.accumulator %= step_dt;
                break;
            }
            self.step(STEP_DT, controls, drifting);
            self.accumulator -= step_dt;
            steps += 1;
        }
    }

    fn step(&mut self, dt: f32, controls: &Controls, drifting: bool) {
        let max_speed = self.tuning.max_speed;

        // --- Grip & cooldowns ---
        let grip = if self.oil_timer > 0.0 {
            self.oil_timer = (self.oil_timer - dt).max(0.0);
            OIL_GRIP
        } else {
            1.0
        };
        if self.drift_cooldown > 0.0 {
            self.drift_cooldown = (self.drift_cooldown - dt).max(0.0);
        }

        // --- Acceleration / Braking ---
        if controls.accelerate {
            self.reverse_hold = 0.0;
            self.speed += self.tuning.accel * dt;
        } else if controls.brake {
            if self.speed > 0.0 {
                self.speed -= self.tuning.brake * dt;
                if self.speed <= 0.0 {
                    // Forward → reverse requires a stop first
                    self.speed = 0.0;
                    self.reverse_hold = REVERSE_DELAY;
                }
            } else if self.reverse_hold > 0.0 {
                self.reverse_hold = (self.reverse_hold - dt).max(0.0);
            } else {
                self.speed -= self.tuning.brake * dt;
            }
        } else {
            self.reverse_hold = 0.0;
            if self.speed > 0.0 {
                self.speed = (self.speed - self.tuning.drag * dt).max(0.0);
            } else if self.speed < 0.0 {
                self.speed = (self.speed + self.tuning.drag * dt).min(0.0);
            }
        }
        self.speed = self.speed.clamp(-max_speed * REVERSE_FACTOR, max_speed);
        let headroom = (max_speed * BOOST_CAP_FACTOR - self.speed).max(0.0);
        self.surge = self.surge.min(headroom);

        // --- Steering ---
        let mut steer = controls.steer();
        if steer != 0.0 {
            let sensitivity = (1.0 - self.speed.abs() / max_speed).max(MIN_STEER_SENSITIVITY);
            steer *= self.tuning.steer_power * sensitivity * grip;
            if drifting {
                steer *= DRIFT_STEER_FACTOR;
            }
            self.vx += steer * dt;
        }

        // --- Drift build-up and release boost ---
        if drifting && steer != 0.0 && self.drift_cooldown <= 0.0 {
            self.vx *= DRIFT_SLIDE_FACTOR;
            self.drift_timer += dt;
        } else {
            if self.drift_timer > 0.0 && self.drift_cooldown <= 0.0 {
                self.apply_boost(self.tuning.drift_boost);
                self.drift_cooldown = DRIFT_COOLDOWN;
                tracing::trace!("Drift released after {:.2}s, surge {:.1}", self.drift_timer, self.surge);
            }
            self.drift_timer = 0.0;
        }

        // --- Lateral friction & curvature pushback ---
        self.vx -= self.vx * self.tuning.side_friction * dt;
        let curve = self.track.curvature_at(self.z);
        self.vx -= curve * self.tuning.curve_push * (self.speed / max_speed) * dt;
        self.x += self.vx * dt;

        // --- Walls ---
        if self.x < -LATERAL_LIMIT {
            self.x = -LATERAL_LIMIT;
            self.vx = 0.0;
        } else if self.x > LATERAL_LIMIT {
            self.x = LATERAL_LIMIT;
            self.vx = 0.0;
        }

        // --- Advance along the track ---
        let travel = (self.speed + self.surge) * dt;
        self.travelled += travel;
        self.z = self.track.wrap(self.z + travel);
        if self.surge > 0.0 {
            self.surge = (self.surge - self.tuning.drag * dt).max(0.0);
        }
    }
}

impl Racer for Vehicle {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::{Segment, TrackBuilder};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn straight_track() -> Arc<Track> {
        Arc::new(TrackBuilder::new().segment(Segment::straight(500.0)).build().unwrap())
    }

    fn curved_track(curvature: f32) -> Arc<Track> {
        Arc::new(TrackBuilder::new().segment(Segment::curve(500.0, curvature)).build().unwrap())
    }

    fn demo_track() -> Arc<Track> {
        Arc::new(Track::demo(1).unwrap())
    }

    fn kart(track: &Arc<Track>) -> Vehicle {
        Vehicle::new(track.clone(), VehicleTuning::default())
    }

    #[test]
    fn time_slicing_does_not_change_trajectory() {
        let track = demo_track();
        let controls = Controls { accelerate: true, right: true, ..Default::default() };

        let mut coarse = kart(&track);
        for _ in 0..10 {
            coarse.update(0.1, &controls, false);
        }
        let mut fine = kart(&track);
        for _ in 0..50 {
            fine.update(0.02, &controls, false);
        }

        assert!((coarse.speed - fine.speed).abs() < 1e-5, "{} vs {}", coarse.speed, fine.speed);
        assert!((coarse.z - fine.z).abs() < 1e-4, "{} vs {}", coarse.z, fine.z);
        assert!((coarse.x - fine.x).abs() < 1e-5, "{} vs {}", coarse.x, fine.x);
    }

    #[test]
    fn irregular_slices_match_one_call() {
        let track = demo_track();
        let slices = [0.013f32, 0.021, 0.007, 0.033, 0.016, 0.05, 0.001, 0.029];
        let controls = Controls::accelerate();

        let mut sliced = kart(&track);
        let mut total = 0.0f32;
        for _ in 0..6 {
            for dt in &slices {
                sliced.update(*dt, &controls, false);
                total += dt;
            }
        }
        // 6 * 0.17 = 1.02 s, well clear of a step boundary
        let mut whole = kart(&track);
        whole.update(total, &controls, false);

        assert!((sliced.speed - whole.speed).abs() < 1e-5, "{} vs {}", sliced.speed, whole.speed);
        assert!((sliced.z - whole.z).abs() < 1e-4, "{} vs {}", sliced.z, whole.z);
    }

    fn drive(track: &Arc<Track>, calls: usize, elapsed: f32) -> Vehicle {
        let mut car = kart(track);
        for _ in 0..calls {
            car.update(elapsed, &Controls::accelerate(), false);
        }
        car
    }

    #[test]
    fn step_aligned_totals_run_the_same_steps() {
        let track = demo_track();
        for ((calls_a, dt_a), (calls_b, dt_b)) in [((100, 0.016), (1, 1.6)), ((625, 0.016), (5, 2.0))] {
            let a = drive(&track, calls_a, dt_a);
            let b = drive(&track, calls_b, dt_b);
            assert!((a.speed - b.speed).abs() < 1e-5, "{}x{}: {} vs {}", calls_b, dt_b, a.speed, b.speed);
            assert!((a.z - b.z).abs() < 1e-4, "{}x{}: z {} vs {}", calls_b, dt_b, a.z, b.z);
            assert!(a.pending_time() < 1e-5 && b.pending_time() < 1e-5);
        }
    }

    #[test]
    fn full_acceleration_approaches_max_speed() {
        let track = demo_track();
        let mut car = kart(&track);
        let max = car.tuning.max_speed;
        let mut last = car.speed;
        for _ in 0..300 {
            car.update(1.0 / 60.0, &Controls::accelerate(), false);
            assert!(car.speed <= max, "speed {} exceeded max {}", car.speed, max);
            assert!(car.speed >= last, "speed dropped from {} to {}", last, car.speed);
            last = car.speed;
        }
        assert!((car.speed - max).abs() < 1e-3, "expected ~{}, got {}", max, car.speed);
    }

    #[test]
    fn full_braking_from_max_speed_stops() {
        let track = straight_track();
        let mut car = kart(&track);
        car.speed = car.tuning.max_speed;
        for _ in 0..120 {
            car.update(1.0 / 60.0, &Controls::brake(), false);
        }
        assert!(car.speed.abs() < 0.1, "expected ~0 after 2s of braking, got {}", car.speed);
    }

    #[test]
    fn holding_brake_eventually_reverses() {
        let track = straight_track();
        let mut car = kart(&track);
        car.speed = 50.0;
        for _ in 0..300 {
            car.update(1.0 / 60.0, &Controls::brake(), false);
        }
        let reverse_max = car.tuning.max_speed * REVERSE_FACTOR;
        assert!((car.speed + reverse_max).abs() < 1e-3, "got {}", car.speed);
    }

    #[test]
    fn drag_slows_to_a_stop() {
        let track = straight_track();
        let mut car = kart(&track);
        car.speed = 30.0;
        car.update(1.0, &Controls::default(), false);
        assert_eq!(car.speed, 0.0);

        car.speed = -30.0;
        car.update(1.0, &Controls::default(), false);
        assert_eq!(car.speed, 0.0);
    }

    #[test]
    fn random_inputs_respect_bounds() {
        let track = demo_track();
        let mut car = kart(&track);
        let mut rng = StdRng::seed_from_u64(99);
        let max = car.tuning.max_speed;
        let length = track.total_length();

        for _ in 0..3000 {
            let controls = Controls {
                accelerate: rng.gen_bool(0.6),
                brake: rng.gen_bool(0.2),
                left: rng.gen_bool(0.3),
                right: rng.gen_bool(0.3),
            };
            if rng.gen_bool(0.01) {
                car.apply_oil(2.0);
            }
            if rng.gen_bool(0.01) {
                car.apply_boost(80.0);
            }
            let dt = rng.gen_range(0.0..0.05);
            car.update(dt, &controls, rng.gen_bool(0.4));

            assert!(car.speed <= max && car.speed >= -max * REVERSE_FACTOR, "speed {}", car.speed);
            assert!((-LATERAL_LIMIT..=LATERAL_LIMIT).contains(&car.x), "x {}", car.x);
            assert!(car.z >= 0.0 && car.z < length, "z {}", car.z);
            assert!(car.effective_speed() <= max * BOOST_CAP_FACTOR + 1e-3);
        }
    }

    #[test]
    fn steering_moves_sideways_until_the_wall() {
        let track = straight_track();
        let mut car = kart(&track);
        let right = Controls { right: true, ..Default::default() };
        car.update(0.5, &right, false);
        assert!(car.x > 0.0);

        for _ in 0..1500 {
            car.update(1.0 / 60.0, &right, false);
        }
        assert_eq!(car.x, LATERAL_LIMIT);
        assert_eq!(car.vx, 0.0);

        let mut car = kart(&track);
        car.update(0.5, &Controls { left: true, ..Default::default() }, false);
        assert!(car.x < 0.0);
    }

    #[test]
    fn oil_reduces_grip() {
        let track = straight_track();
        let right = Controls { right: true, ..Default::default() };
        let mut dry = kart(&track);
        let mut oily = kart(&track);
        oily.apply_oil(2.0);

        dry.update(0.5, &right, false);
        oily.update(0.5, &right, false);
        assert!(oily.x < dry.x, "oily {} vs dry {}", oily.x, dry.x);
        assert!(oily.oil_timer > 0.0 && oily.oil_timer < 2.0);

        oily.update(2.0, &right, false);
        assert_eq!(oily.oil_timer, 0.0);
    }

    #[test]
    fn drift_release_grants_one_boost() {
        let track = straight_track();
        let mut car = kart(&track);
        car.speed = 100.0;
        let held = Controls { accelerate: true, right: true, ..Default::default() };

        car.update(0.5, &held, true);
        assert!(car.is_drifting());
        assert_eq!(car.surge, 0.0);

        car.update(STEP_DT, &held, false);
        assert!(!car.is_drifting());
        assert!(car.surge > 30.0, "surge {}", car.surge);
        assert!(car.drift_cooldown > 0.9);
        assert!(car.effective_speed() > car.speed);

        // Drifting again during the cooldown builds nothing
        let surge = car.surge;
        car.update(0.2, &held, true);
        assert!(!car.is_drifting());
        car.update(STEP_DT, &held, false);
        assert!(car.surge < surge, "no second boost expected, surge {}", car.surge);
    }

    #[test]
    fn default_pushback_is_one_curvature_unit_per_step() {
        let tuning = VehicleTuning::default();
        assert!((tuning.curve_push * STEP_DT - 1.0).abs() < 1e-6, "curve_push {}", tuning.curve_push);
    }

    #[test]
    fn curves_push_toward_the_outside() {
        let right_bend = curved_track(0.01);
        let mut car = kart(&right_bend);
        car.speed = car.tuning.max_speed;
        car.update(1.0, &Controls::accelerate(), false);
        assert!(car.x < 0.0, "right bend should push left, x = {}", car.x);

        let left_bend = curved_track(-0.01);
        let mut car = kart(&left_bend);
        car.speed = car.tuning.max_speed;
        car.update(1.0, &Controls::accelerate(), false);
        assert!(car.x > 0.0, "left bend should push right, x = {}", car.x);
    }

    #[test]
    fn empty_track_drives_straight() {
        let track = Arc::new(Track::empty());
        let mut car = kart(&track);
        car.update(1.0, &Controls::accelerate(), false);
        assert!(car.z > 0.0);
        assert_eq!(car.x, 0.0);
    }

    #[test]
    fn position_wraps_around_the_loop() {
        let track = straight_track();
        let mut car = kart(&track);
        car.z = 495.0;
        car.speed = 200.0;
        car.update(0.1, &Controls::accelerate(), false);
        assert!(car.z < 30.0, "expected wrap, z = {}", car.z);
    }

    #[test]
    fn travelled_is_signed_and_unwrapped() {
        let track = straight_track();
        let mut car = kart(&track);
        car.z = 495.0;
        car.speed = 200.0;
        car.update(0.1, &Controls::default(), false);
        assert!(car.travelled() > 15.0, "travelled {}", car.travelled());
        assert!(car.z < 20.0);

        car.speed = -50.0;
        car.update(0.1, &Controls::default(), false);
        assert!(car.travelled() < 0.0, "travelled {}", car.travelled());

        car.update(f32::NAN, &Controls::default(), false);
        assert_eq!(car.travelled(), 0.0);
    }

    #[test]
    fn bad_elapsed_values_are_ignored() {
        let track = straight_track();
        let mut car = kart(&track);
        car.update(-1.0, &Controls::accelerate(), false);
        car.update(f32::NAN, &Controls::accelerate(), false);
        car.update(f32::INFINITY, &Controls::accelerate(), false);
        assert_eq!(car.speed, 0.0);
        assert_eq!(car.pending_time(), 0.0);
    }

    #[test]
    fn backlog_is_capped() {
        let track = straight_track();
        let mut car = kart(&track);
        car.update(100.0, &Controls::accelerate(), false);
        assert!(car.pending_time() < STEP_DT);
        assert_eq!(car.speed, car.tuning.max_speed);
    }

    #[test]
    fn reset_clears_transients() {
        let track = straight_track();
        let mut car = kart(&track);
        car.update(1.0, &Controls::accelerate(), false);
        car.apply_oil(2.0);
        car.apply_boost(50.0);
        car.reset(510.0, 9.0);
        assert_eq!(car.z, 10.0);
        assert_eq!(car.x, LATERAL_LIMIT);
        assert_eq!(car.speed, 0.0);
        assert_eq!(car.surge, 0.0);
        assert_eq!(car.oil_timer, 0.0);
    }
}
