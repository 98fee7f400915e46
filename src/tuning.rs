//! Game balance and configuration
//!
//! Every gameplay constant lives here so a host can override any of them from
//! JSON. Missing fields fall back to the defaults below.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Data-driven game balance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Track ===
    /// Lateral distance between lane centerlines
    pub lane_offset: f32,
    /// Number of lanes
    pub num_lanes: u8,
    /// Length of one road segment
    pub tile_length: f32,
    /// Segments in the ring
    pub visible_tiles: usize,
    /// Lateral distance of the decoration strips from the road center
    pub side_strip: f32,
    /// Longitudinal position of the vehicle (world streams past it)
    pub vehicle_z: f32,
    /// Ride height of vehicle and obstacles
    pub ride_height: f32,

    // === Speed / handling ===
    pub base_speed: f32,
    pub max_speed: f32,
    /// Speed convergence rate (1/s)
    pub accel: f32,
    /// Lateral convergence rate (1/s)
    pub turn_rate: f32,
    /// Minimum time between lane changes (s)
    pub lane_cooldown: f32,

    // === Boost ===
    /// Charge lost per second while burning
    pub boost_decay_rate: f32,
    /// Ceiling multiplier while boost is active
    pub boost_speed_mult: f32,
    /// Accel multiplier while boost is active
    pub boost_accel_mult: f32,

    // === Difficulty / spawning ===
    pub obstacle_base: f32,
    pub obstacle_max: f32,
    /// Difficulty gained per second of run time
    pub difficulty_rate: f32,
    /// Speed ceiling gained per difficulty unit
    pub speed_ceiling_per_difficulty: f32,
    pub decor_min_per_side: u32,
    pub decor_base_max_per_side: u32,
    pub decor_cap_per_side: u32,
    /// Extra decorations per side per difficulty unit
    pub decor_growth: f32,
    /// Segments kept behind the vehicle before entities are culled
    pub cull_tiles_behind: f32,
    /// Leading segments that never receive obstacles on a fresh layout
    pub clear_runway_tiles: usize,

    // === Lifecycle ===
    /// Invincibility window after run start/restart (s)
    pub respawn_iframe: f32,
    /// Largest dt a single tick will simulate
    pub max_dt: f32,

    // === Projectiles ===
    pub projectile_speed: f32,
    /// Minimum time between shots (s)
    pub fire_cooldown: f32,
    /// Distance ahead of the vehicle at which projectiles expire
    pub projectile_range: f32,
    pub ordnance_max: u8,
    /// Regen interval at base speed (s)
    pub ordnance_base_regen: f32,
    /// Regen interval floor (s)
    pub ordnance_regen_min: f32,

    // === Effects ===
    pub explosion_time: f32,
    /// Scale growth per second of explosion life
    pub explosion_scale: f32,
    pub fire_life: f32,
    pub fire_growth: f32,

    // === Colliders (full sizes) ===
    pub vehicle_collider: Vec3,
    pub obstacle_collider: Vec3,
    pub projectile_collider: Vec3,

    // === Pool capacities ===
    pub obstacle_capacity: usize,
    pub projectile_capacity: usize,
    pub explosion_capacity: usize,
    pub fire_capacity: usize,
    pub decoration_capacity: usize,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            // Track
            lane_offset: 2.0,
            num_lanes: 3,
            tile_length: 12.0,
            visible_tiles: 14,
            side_strip: 6.2,
            vehicle_z: -3.0,
            ride_height: 0.6,

            // Speed/handling
            base_speed: 22.0,
            max_speed: 140.0,
            accel: 18.0,
            turn_rate: 12.0,
            lane_cooldown: 0.16,

            // Boost
            boost_decay_rate: 1.2,
            boost_speed_mult: 3.6,
            boost_accel_mult: 1.8,

            // Difficulty/spawn
            obstacle_base: 0.28,
            obstacle_max: 0.75,
            difficulty_rate: 0.03,
            speed_ceiling_per_difficulty: 22.0,
            decor_min_per_side: 1,
            decor_base_max_per_side: 2,
            decor_cap_per_side: 3,
            decor_growth: 0.5,
            cull_tiles_behind: 3.0,
            clear_runway_tiles: 3,

            // Lifecycle
            respawn_iframe: 1.25,
            max_dt: 0.1,

            // Projectiles
            projectile_speed: 60.0,
            fire_cooldown: 0.18,
            projectile_range: 120.0,
            ordnance_max: 5,
            ordnance_base_regen: 2.0,
            ordnance_regen_min: 0.30,

            // Effects
            explosion_time: 0.35,
            explosion_scale: 2.2,
            fire_life: 0.4,
            fire_growth: 0.6,

            // Colliders
            vehicle_collider: Vec3::new(1.2, 0.6, 1.8),
            obstacle_collider: Vec3::new(1.0, 1.0, 1.2),
            projectile_collider: Vec3::new(0.7, 1.8, 0.4),

            // Pools
            obstacle_capacity: 40,
            projectile_capacity: 20,
            explosion_capacity: 20,
            fire_capacity: 50,
            decoration_capacity: 96,
        }
    }
}

impl Tuning {
    /// Parse tuning from JSON (partial documents are fine) and sanitize it
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let tuning: Tuning = serde_json::from_str(json)?;
        Ok(tuning.sanitized())
    }

    /// Clamp values that would break simulation invariants
    pub fn sanitized(mut self) -> Self {
        if self.num_lanes == 0 {
            log::warn!("num_lanes must be at least 1, using 1");
            self.num_lanes = 1;
        }
        if self.visible_tiles < 2 {
            log::warn!("visible_tiles {} too small, using 2", self.visible_tiles);
            self.visible_tiles = 2;
        }
        if !(self.tile_length > 0.0) {
            log::warn!("tile_length must be positive, using default");
            self.tile_length = Self::default().tile_length;
        }
        if !(self.base_speed > 0.0) {
            log::warn!("base_speed must be positive, using default");
            self.base_speed = Self::default().base_speed;
        }
        if !(self.max_speed >= self.base_speed) {
            log::warn!(
                "max_speed {} below base_speed {}, raising it",
                self.max_speed,
                self.base_speed
            );
            self.max_speed = self.base_speed;
        }
        if !(self.boost_speed_mult >= 1.0) {
            log::warn!("boost_speed_mult below 1, using 1");
            self.boost_speed_mult = 1.0;
        }
        if self.ordnance_max == 0 {
            log::warn!("ordnance_max must be at least 1, using 1");
            self.ordnance_max = 1;
        }
        if !(self.ordnance_regen_min > 0.0) {
            log::warn!("ordnance_regen_min must be positive, using default");
            self.ordnance_regen_min = Self::default().ordnance_regen_min;
        }
        if !(self.max_dt > 0.0) {
            log::warn!("max_dt must be positive, using default");
            self.max_dt = Self::default().max_dt;
        }
        if !(self.explosion_time > 0.0) {
            self.explosion_time = Self::default().explosion_time;
        }
        if !(self.fire_life > 0.0) {
            self.fire_life = Self::default().fire_life;
        }
        if self.decor_cap_per_side < self.decor_min_per_side {
            log::warn!("decor_cap_per_side below decor_min_per_side, raising it");
            self.decor_cap_per_side = self.decor_min_per_side;
        }

        let rates = [
            &mut self.accel,
            &mut self.turn_rate,
            &mut self.lane_cooldown,
            &mut self.boost_decay_rate,
            &mut self.difficulty_rate,
            &mut self.fire_cooldown,
            &mut self.respawn_iframe,
            &mut self.projectile_speed,
        ];
        for rate in rates {
            if !(*rate >= 0.0) {
                log::warn!("negative or NaN rate {} clamped to 0", rate);
                *rate = 0.0;
            }
        }

        self.obstacle_base = self.obstacle_base.clamp(0.0, 1.0);
        self.obstacle_max = self.obstacle_max.clamp(0.0, 1.0);

        for capacity in [
            &mut self.obstacle_capacity,
            &mut self.projectile_capacity,
            &mut self.explosion_capacity,
            &mut self.fire_capacity,
            &mut self.decoration_capacity,
        ] {
            *capacity = (*capacity).min(u16::MAX as usize);
        }

        self
    }

    /// Difficulty after `run_time` seconds (1.0 at the start of a run)
    #[inline]
    pub fn difficulty(&self, run_time: f32) -> f32 {
        1.0 + self.difficulty_rate * run_time
    }

    /// Probability that a recycled segment receives an obstacle
    #[inline]
    pub fn obstacle_chance(&self, difficulty: f32) -> f32 {
        (self.obstacle_base * difficulty).min(self.obstacle_max)
    }

    /// Upper bound on decorations per road side
    pub fn decor_max_per_side(&self, difficulty: f32) -> u32 {
        let extra = ((difficulty - 1.0).max(0.0) * self.decor_growth).floor() as u32;
        (self.decor_base_max_per_side + extra)
            .min(self.decor_cap_per_side)
            .max(self.decor_min_per_side)
    }

    /// Difficulty-scaled speed target before boost
    #[inline]
    pub fn target_max_speed(&self, difficulty: f32) -> f32 {
        (self.base_speed + self.speed_ceiling_per_difficulty * (difficulty - 1.0))
            .min(self.max_speed)
    }

    /// Absolute speed ceiling the regen curve and engine pitch are normalized against
    #[inline]
    pub fn effective_ceiling(&self, boost_active: bool) -> f32 {
        if boost_active {
            self.max_speed * self.boost_speed_mult
        } else {
            self.max_speed
        }
    }
}
