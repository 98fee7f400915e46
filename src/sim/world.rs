//! World streaming: segment ring, decorations and obstacles
//!
//! The vehicle stays put at `vehicle_z`; everything else slides toward -z by
//! the distance driven each tick. Segments that fall behind are moved to the
//! front of the ring and re-dressed, entities far behind are culled.

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::pool::{Handle, Pool};
use crate::lane_to_x;
use crate::tuning::Tuning;

/// Number of building facade variants
pub const FACADE_VARIANTS: u8 = 5;
/// Share of decorations that are buildings (the rest are palms)
const BUILDING_CHANCE: f32 = 0.6;
/// Lateral jitter of decorations around the side strip
const DECOR_JITTER: f32 = 0.8;
const PALM_HEIGHT: f32 = 2.0;

/// One road tile
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Center of the tile along the track
    pub z: f32,
}

/// Roadside scenery
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum DecorKind {
    Building {
        width: f32,
        height: f32,
        facade: u8,
    },
    #[default]
    Palm,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Decoration {
    pub pos: Vec3,
    pub kind: DecorKind,
}

/// Road hazard occupying one lane
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Obstacle {
    pub pos: Vec3,
    pub lane: u8,
}

/// Streaming track state
#[derive(Debug, Clone)]
pub struct World {
    pub segments: Vec<Segment>,
    pub decorations: Pool<Decoration>,
    pub obstacles: Pool<Obstacle>,
}

impl World {
    pub fn new(tuning: &Tuning) -> Self {
        let segments = (0..tuning.visible_tiles)
            .map(|i| Segment {
                z: i as f32 * tuning.tile_length,
            })
            .collect();
        Self {
            segments,
            decorations: Pool::with_capacity(tuning.decoration_capacity),
            obstacles: Pool::with_capacity(tuning.obstacle_capacity),
        }
    }

    /// Rebuild the start-of-run layout
    pub fn reset(&mut self, tuning: &Tuning, rng: &mut impl Rng) {
        self.decorations.release_all();
        self.obstacles.release_all();

        for i in 0..self.segments.len() {
            let z = i as f32 * tuning.tile_length;
            self.segments[i].z = z;
            self.spawn_decor_around(z, 1.0, tuning, rng);
            if i >= tuning.clear_runway_tiles && rng.random::<f32>() < tuning.obstacle_base {
                self.spawn_obstacle_at(z, tuning, rng);
            }
        }
        log::debug!(
            "layout reset: {} decorations, {} obstacles",
            self.decorations.active_len(),
            self.obstacles.active_len()
        );
    }

    /// Slide the whole world toward the vehicle by `distance`
    pub fn scroll(&mut self, distance: f32) {
        for segment in &mut self.segments {
            segment.z -= distance;
        }
        self.decorations.for_each_mut(|_, d| d.pos.z -= distance);
        self.obstacles.for_each_mut(|_, o| o.pos.z -= distance);
    }

    /// Move segments that fell behind to the front and dress them.
    /// Returns the number of segments recycled.
    pub fn recycle(&mut self, difficulty: f32, tuning: &Tuning, rng: &mut impl Rng) -> usize {
        let behind = tuning.vehicle_z - tuning.tile_length;
        let obstacle_chance = tuning.obstacle_chance(difficulty);
        let mut furthest = self.furthest_z();
        let mut recycled = 0;

        for i in 0..self.segments.len() {
            if self.segments[i].z < behind {
                let z = furthest + tuning.tile_length;
                self.segments[i].z = z;
                furthest = z;
                recycled += 1;

                self.spawn_decor_around(z, difficulty, tuning, rng);
                if rng.random::<f32>() < obstacle_chance {
                    self.spawn_obstacle_at(z, tuning, rng);
                }
            }
        }
        recycled
    }

    /// Release decorations and obstacles that are far behind the vehicle
    pub fn cull(&mut self, tuning: &Tuning) {
        let min_keep = tuning.vehicle_z - tuning.tile_length * tuning.cull_tiles_behind;
        self.decorations.retain(|_, d| d.pos.z >= min_keep);
        self.obstacles.retain(|_, o| o.pos.z >= min_keep);
    }

    pub fn furthest_z(&self) -> f32 {
        self.segments
            .iter()
            .map(|s| s.z)
            .fold(f32::NEG_INFINITY, f32::max)
    }

    /// Drop an obstacle into a random lane near `z`
    pub fn spawn_obstacle_at(
        &mut self,
        z: f32,
        tuning: &Tuning,
        rng: &mut impl Rng,
    ) -> Option<Handle> {
        let lane = rng.random_range(0..tuning.num_lanes);
        let spread = tuning.tile_length / 3.0;
        let pos = Vec3::new(
            lane_to_x(lane, tuning.num_lanes, tuning.lane_offset),
            tuning.ride_height,
            z + rng.random_range(-spread..spread),
        );
        self.obstacles.spawn(Obstacle { pos, lane })
    }

    /// Place an obstacle at an exact position
    pub fn place_obstacle(&mut self, pos: Vec3, lane: u8) -> Option<Handle> {
        self.obstacles.spawn(Obstacle { pos, lane })
    }

    fn spawn_decor_around(&mut self, z: f32, difficulty: f32, tuning: &Tuning, rng: &mut impl Rng) {
        let max_per_side = tuning.decor_max_per_side(difficulty);
        let half = tuning.tile_length / 2.0;

        for side in [-1.0_f32, 1.0] {
            let count = rng.random_range(tuning.decor_min_per_side..=max_per_side);
            for _ in 0..count {
                let x = side * tuning.side_strip + rng.random_range(-DECOR_JITTER..DECOR_JITTER);
                let dz = z + rng.random_range(-half..half);
                let decoration = if rng.random::<f32>() < BUILDING_CHANCE {
                    let width = rng.random_range(1.2..2.6);
                    let height = rng.random_range(2.5..6.0);
                    Decoration {
                        pos: Vec3::new(x, height / 2.0, dz),
                        kind: DecorKind::Building {
                            width,
                            height,
                            facade: rng.random_range(0..FACADE_VARIANTS),
                        },
                    }
                } else {
                    Decoration {
                        pos: Vec3::new(x, PALM_HEIGHT, dz),
                        kind: DecorKind::Palm,
                    }
                };
                if self.decorations.spawn(decoration).is_none() {
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn setup() -> (World, Tuning, Pcg32) {
        let tuning = Tuning::default();
        let mut rng = Pcg32::seed_from_u64(7);
        let mut world = World::new(&tuning);
        world.reset(&tuning, &mut rng);
        (world, tuning, rng)
    }

    fn assert_tiled(world: &World, tuning: &Tuning) {
        let mut zs: Vec<f32> = world.segments.iter().map(|s| s.z).collect();
        zs.sort_by(|a, b| a.partial_cmp(b).unwrap());
        for pair in zs.windows(2) {
            let gap = pair[1] - pair[0];
            assert!(
                (gap - tuning.tile_length).abs() < 5e-2,
                "segment gap {gap} != {}",
                tuning.tile_length
            );
        }
    }

    #[test]
    fn test_reset_layout() {
        let (world, tuning, _) = setup();
        assert_eq!(world.segments.len(), tuning.visible_tiles);
        assert_eq!(world.segments[0].z, 0.0);
        assert!(world.decorations.active_len() >= 2 * tuning.visible_tiles);
        // The runway in front of the car stays clear
        let runway_end = tuning.tile_length * (tuning.clear_runway_tiles as f32 - 0.5);
        let nearest = runway_end - tuning.tile_length / 3.0;
        assert!(world.obstacles.iter().all(|(_, o)| o.pos.z > nearest));
        assert_tiled(&world, &tuning);
    }

    #[test]
    fn test_scroll_moves_everything() {
        let (mut world, _, _) = setup();
        let before: Vec<f32> = world.decorations.iter().map(|(_, d)| d.pos.z).collect();
        world.scroll(5.0);
        assert_eq!(world.segments[0].z, -5.0);
        for ((_, d), z) in world.decorations.iter().zip(before) {
            assert!((d.pos.z - (z - 5.0)).abs() < 1e-5);
        }
    }

    #[test]
    fn test_recycle_keeps_tiling() {
        let (mut world, tuning, mut rng) = setup();
        let mut recycled = 0;
        for _ in 0..2000 {
            world.scroll(0.9);
            recycled += world.recycle(1.5, &tuning, &mut rng);
            world.cull(&tuning);
        }
        assert!(recycled > tuning.visible_tiles);
        assert_tiled(&world, &tuning);
        // No segment is left behind the recycle line
        let behind = tuning.vehicle_z - tuning.tile_length;
        assert!(world.segments.iter().all(|s| s.z >= behind));
    }

    #[test]
    fn test_cull_bounds_entities() {
        let (mut world, tuning, mut rng) = setup();
        for _ in 0..5000 {
            world.scroll(1.3);
            world.recycle(10.0, &tuning, &mut rng);
            world.cull(&tuning);

            let min_keep = tuning.vehicle_z - tuning.tile_length * tuning.cull_tiles_behind;
            assert!(world.obstacles.iter().all(|(_, o)| o.pos.z >= min_keep));
            assert!(world.decorations.iter().all(|(_, d)| d.pos.z >= min_keep));
            assert_eq!(
                world.obstacles.active_len() + world.obstacles.free_len(),
                world.obstacles.capacity()
            );
        }
    }

    #[test]
    fn test_obstacles_sit_in_lanes() {
        let (mut world, tuning, mut rng) = setup();
        for _ in 0..50 {
            world.spawn_obstacle_at(100.0, &tuning, &mut rng);
        }
        for (_, o) in world.obstacles.iter() {
            assert!(o.lane < tuning.num_lanes);
            assert_eq!(o.pos.x, lane_to_x(o.lane, tuning.num_lanes, tuning.lane_offset));
        }
    }

    #[test]
    fn test_obstacle_pool_exhaustion_drops_spawn() {
        let (mut world, tuning, mut rng) = setup();
        while world.obstacles.free_len() > 0 {
            world.spawn_obstacle_at(50.0, &tuning, &mut rng);
        }
        assert!(world.spawn_obstacle_at(50.0, &tuning, &mut rng).is_none());
        assert!(world.obstacles.dropped() > 0);
    }
}
