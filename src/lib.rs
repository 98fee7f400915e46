//! Miami Racer - simulation core of an endless lane-based arcade racer
//!
//! Core modules:
//! - `sim`: Per-frame simulation (pools, resources, world streaming, collisions)
//! - `tuning`: Data-driven game balance
//! - `present`: Plain-data contract for renderer, camera and audio hosts

pub mod present;
pub mod sim;
pub mod tuning;

pub use sim::{FrameOutcome, RunState, Simulation, TickInput, tick};
pub use tuning::Tuning;

/// Frame-rate independent blend factor for exponential smoothing.
///
/// Applying `value += (target - value) * smoothing(rate, dt)` once with `dt`
/// gives the same result as applying it `n` times with `dt / n`.
#[inline]
pub fn smoothing(rate: f32, dt: f32) -> f32 {
    if rate <= 0.0 || dt <= 0.0 {
        return 0.0;
    }
    1.0 - (-rate * dt).exp()
}

/// Move `current` toward `target` with frame-rate independent smoothing
#[inline]
pub fn approach(current: f32, target: f32, rate: f32, dt: f32) -> f32 {
    current + (target - current) * smoothing(rate, dt)
}

/// Lateral offset of a lane's centerline, with the middle of the road at x = 0
#[inline]
pub fn lane_to_x(lane: u8, num_lanes: u8, lane_offset: f32) -> f32 {
    let center = (num_lanes.max(1) - 1) as f32 / 2.0;
    (lane as f32 - center) * lane_offset
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lane_to_x_three_lanes() {
        assert_eq!(lane_to_x(0, 3, 2.0), -2.0);
        assert_eq!(lane_to_x(1, 3, 2.0), 0.0);
        assert_eq!(lane_to_x(2, 3, 2.0), 2.0);
    }

    #[test]
    fn test_lane_to_x_even_lane_count_is_centered() {
        assert_eq!(lane_to_x(0, 4, 2.0), -3.0);
        assert_eq!(lane_to_x(3, 4, 2.0), 3.0);
    }

    #[test]
    fn test_smoothing_is_frame_rate_independent() {
        let coarse = approach(0.0, 10.0, 12.0, 0.1);

        let mut fine = 0.0;
        for _ in 0..10 {
            fine = approach(fine, 10.0, 12.0, 0.01);
        }

        assert!((coarse - fine).abs() < 1e-4, "{coarse} vs {fine}");
    }

    #[test]
    fn test_smoothing_bounds() {
        assert_eq!(smoothing(12.0, 0.0), 0.0);
        assert!(smoothing(12.0, 10.0) <= 1.0);
        assert!(smoothing(12.0, 1.0 / 60.0) > 0.0);
    }
}
