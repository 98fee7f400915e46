//! Vehicle motion: discrete lanes, continuous position and speed

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::tuning::Tuning;
use crate::{approach, lane_to_x};

/// Skew per unit of lateral error
const SKEW_PER_UNIT: f32 = -0.1;
/// Maximum visual skew
const SKEW_LIMIT: f32 = 0.15;
/// Throttle factor gained while accelerating
const THROTTLE_UP_GAIN: f32 = 0.55;
/// Throttle factor lost while braking
const THROTTLE_DOWN_LOSS: f32 = 0.25;

/// Throttle intent for a tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Throttle {
    pub up: bool,
    pub down: bool,
}

impl Throttle {
    #[inline]
    pub fn factor(self) -> f32 {
        let up = if self.up { 1.0 } else { 0.0 };
        let down = if self.down { 1.0 } else { 0.0 };
        1.0 + THROTTLE_UP_GAIN * up - THROTTLE_DOWN_LOSS * down
    }
}

/// The player's car
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    /// Lateral position
    pub x: f32,
    /// Fixed longitudinal position (the world streams past)
    pub z: f32,
    pub y: f32,
    pub speed: f32,
    pub target_lane: u8,
    /// Visual tilt derived from lateral error
    pub skew: f32,
    /// Run time of the last accepted lane change
    pub last_lane_change: Option<f32>,
}

impl Vehicle {
    /// Vehicle parked in the middle lane at base speed
    pub fn new(tuning: &Tuning) -> Self {
        let lane = tuning.num_lanes / 2;
        Self {
            x: lane_to_x(lane, tuning.num_lanes, tuning.lane_offset),
            z: tuning.vehicle_z,
            y: tuning.ride_height,
            speed: tuning.base_speed,
            target_lane: lane,
            skew: 0.0,
            last_lane_change: None,
        }
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    #[inline]
    pub fn target_x(&self, tuning: &Tuning) -> f32 {
        lane_to_x(self.target_lane, tuning.num_lanes, tuning.lane_offset)
    }

    /// Request a lane change by `delta` lanes. Ignored inside the cooldown;
    /// the result is clamped to the road. Returns true if accepted.
    pub fn request_lane_change(&mut self, delta: i32, now: f32, tuning: &Tuning) -> bool {
        let cooling = self
            .last_lane_change
            .is_some_and(|last| now - last < tuning.lane_cooldown);
        if delta == 0 || cooling {
            return false;
        }
        self.set_lane(self.target_lane as i32 + delta, tuning);
        self.last_lane_change = Some(now);
        true
    }

    /// Set the target lane, clamping out-of-range requests
    pub fn set_lane(&mut self, lane: i32, tuning: &Tuning) {
        let last = tuning.num_lanes.saturating_sub(1) as i32;
        self.target_lane = lane.clamp(0, last) as u8;
    }

    /// Advance lateral position and speed by `dt`
    pub fn update(
        &mut self,
        dt: f32,
        throttle: Throttle,
        difficulty: f32,
        boost_active: bool,
        tuning: &Tuning,
    ) {
        let target_x = self.target_x(tuning);
        self.x = approach(self.x, target_x, tuning.turn_rate, dt);
        self.skew = tilt(self.x - target_x);

        let desired = desired_speed(throttle, difficulty, boost_active, tuning);
        let accel = if boost_active {
            tuning.accel * tuning.boost_accel_mult
        } else {
            tuning.accel
        };
        self.speed = approach(self.speed, desired, accel, dt);
    }
}

/// Visual tilt for a lateral error (pure, clamped)
#[inline]
pub fn tilt(lateral_error: f32) -> f32 {
    (lateral_error * SKEW_PER_UNIT).clamp(-SKEW_LIMIT, SKEW_LIMIT)
}

/// Speed the vehicle converges toward this tick
pub fn desired_speed(
    throttle: Throttle,
    difficulty: f32,
    boost_active: bool,
    tuning: &Tuning,
) -> f32 {
    let boost_mult = if boost_active { tuning.boost_speed_mult } else { 1.0 };
    let ceiling = (tuning.target_max_speed(difficulty) * boost_mult).max(tuning.base_speed);
    let base = tuning.base_speed * difficulty;
    (base * throttle.factor()).clamp(tuning.base_speed, ceiling)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_in_middle_lane() {
        let tuning = Tuning::default();
        let car = Vehicle::new(&tuning);
        assert_eq!(car.target_lane, 1);
        assert_eq!(car.x, 0.0);
        assert_eq!(car.speed, tuning.base_speed);
    }

    #[test]
    fn test_lane_change_cooldown() {
        let tuning = Tuning::default();
        let mut car = Vehicle::new(&tuning);

        assert!(car.request_lane_change(1, 1.0, &tuning));
        assert_eq!(car.target_lane, 2);
        // Inside cooldown: dropped
        assert!(!car.request_lane_change(-1, 1.05, &tuning));
        assert_eq!(car.target_lane, 2);
        // After cooldown
        assert!(car.request_lane_change(-1, 1.0 + tuning.lane_cooldown, &tuning));
        assert_eq!(car.target_lane, 1);
    }

    #[test]
    fn test_lane_clamped() {
        let tuning = Tuning::default();
        let mut car = Vehicle::new(&tuning);
        car.request_lane_change(5, 0.0, &tuning);
        assert_eq!(car.target_lane, 2);
        car.set_lane(-7, &tuning);
        assert_eq!(car.target_lane, 0);
    }

    #[test]
    fn test_lateral_convergence() {
        let tuning = Tuning::default();
        let mut car = Vehicle::new(&tuning);
        car.set_lane(2, &tuning);

        car.update(1.0 / 60.0, Throttle::default(), 1.0, false, &tuning);
        assert!(car.x > 0.0 && car.x < 2.0);
        // Moving right of center toward lane 2: error negative, skew positive
        assert!(car.skew > 0.0 && car.skew <= SKEW_LIMIT);

        for _ in 0..120 {
            car.update(1.0 / 60.0, Throttle::default(), 1.0, false, &tuning);
        }
        assert!((car.x - 2.0).abs() < 1e-3);
        assert!(car.skew.abs() < 1e-3);
    }

    #[test]
    fn test_convergence_matches_across_tick_rates() {
        let tuning = Tuning::default();
        let mut slow = Vehicle::new(&tuning);
        let mut fast = Vehicle::new(&tuning);
        slow.set_lane(0, &tuning);
        fast.set_lane(0, &tuning);
        let throttle = Throttle {
            up: true,
            down: false,
        };

        for _ in 0..30 {
            slow.update(1.0 / 30.0, throttle, 2.0, false, &tuning);
        }
        for _ in 0..120 {
            fast.update(1.0 / 120.0, throttle, 2.0, false, &tuning);
        }
        assert!((slow.x - fast.x).abs() < 1e-3);
        assert!((slow.speed - fast.speed).abs() < 1e-2);
    }

    #[test]
    fn test_desired_speed_bounds() {
        let tuning = Tuning::default();
        let brake = Throttle {
            up: false,
            down: true,
        };
        let gas = Throttle {
            up: true,
            down: false,
        };

        // Braking never drops below base speed
        assert_eq!(desired_speed(brake, 1.0, false, &tuning), tuning.base_speed);
        // At difficulty 1 the ceiling is base speed without boost
        assert_eq!(desired_speed(gas, 1.0, false, &tuning), tuning.base_speed);
        // Boost lifts the ceiling
        assert!(desired_speed(gas, 1.0, true, &tuning) > tuning.base_speed);
        // Late game is capped by max speed
        assert!(desired_speed(gas, 50.0, false, &tuning) <= tuning.max_speed);
    }

    #[test]
    fn test_vehicle_json_roundtrip() {
        let tuning = Tuning::default();
        let mut car = Vehicle::new(&tuning);
        let back: Vehicle = serde_json::from_str(&serde_json::to_string(&car).unwrap()).unwrap();
        assert_eq!(back, car);

        car.request_lane_change(-1, 2.0, &tuning);
        let back: Vehicle = serde_json::from_str(&serde_json::to_string(&car).unwrap()).unwrap();
        assert_eq!(back, car);
        assert_eq!(back.last_lane_change, Some(2.0));
    }

    #[test]
    fn test_tilt_clamped() {
        assert_eq!(tilt(10.0), -SKEW_LIMIT);
        assert_eq!(tilt(-10.0), SKEW_LIMIT);
        assert_eq!(tilt(0.0), 0.0);
    }
}
