//! Presentation contract
//!
//! Everything a renderer or audio backend needs, derived from a `Simulation`
//! without mutating it. The instance list is plain `Pod` data ready for a GPU
//! upload; camera and audio follow the simulation with frame-rate independent
//! smoothing.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::approach;
use crate::sim::{DecorKind, EffectKind, RunState, Simulation};

/// Camera and mix constants
pub mod consts {
    use glam::Vec3;

    pub const CAMERA_OFFSET: Vec3 = Vec3::new(0.0, 2.7, -7.8);
    /// Downward tilt (degrees)
    pub const CAMERA_PITCH: f32 = 11.0;
    pub const CAMERA_FOLLOW_RATE: f32 = 4.0;
    pub const CAMERA_SWAY_FREQ: f32 = 2.6;
    pub const CAMERA_SWAY_AMPLITUDE: f32 = 0.12;
    /// Yaw degrees per unit of lateral error
    pub const CAMERA_YAW_PER_UNIT: f32 = -3.0;
    pub const CAMERA_YAW_RATE: f32 = 3.0;
    pub const BASE_FOV: f32 = 85.0;
    pub const FOV_PER_SPEED: f32 = 0.6;
    pub const BOOST_FOV: f32 = 45.0;
    pub const FOV_RATE: f32 = 4.0;

    pub const ENGINE_BASE_PITCH: f32 = 0.85;
    pub const ENGINE_MAX_PITCH: f32 = 1.85;
    pub const ENGINE_PITCH_CURVE: f32 = 0.85;
    pub const ENGINE_BOOST_PITCH: f32 = 0.18;
    pub const ENGINE_PITCH_RATE: f32 = 7.0;
    pub const ENGINE_BASE_VOLUME: f32 = 0.35;
    pub const ENGINE_BOOST_VOLUME: f32 = 0.08;
    pub const ENGINE_VOLUME_RATE: f32 = 4.0;
    pub const ENGINE_FADE_RATE: f32 = 6.0;
    pub const MUSIC_VOLUME: f32 = 0.55;
    pub const MUSIC_DUCK_VOLUME: f32 = 0.30;
    pub const MUSIC_RATE: f32 = 3.0;

    /// Road tile width as a multiple of the lane span
    pub const ROAD_WIDTH_FACTOR: f32 = 2.2;
    pub const ROAD_THICKNESS: f32 = 0.1;
    pub const PALM_SCALE: Vec3 = Vec3::new(2.5, 4.0, 0.1);
}

use consts::*;

/// Mesh/material a renderer should use for an instance
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstanceKind {
    Vehicle = 0,
    Road = 1,
    Building = 2,
    Palm = 3,
    Obstacle = 4,
    Projectile = 5,
    Explosion = 6,
    FirePuff = 7,
}

/// One drawable, laid out for a per-instance vertex buffer
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Instance {
    pub position: [f32; 3],
    pub alpha: f32,
    pub scale: [f32; 3],
    /// Roll in radians (vehicle skew)
    pub roll: f32,
    /// `InstanceKind` as u32
    pub kind: u32,
    /// Texture variant (building facade)
    pub variant: u32,
}

impl Instance {
    fn new(kind: InstanceKind, position: Vec3, scale: Vec3, alpha: f32) -> Self {
        Self {
            position: position.to_array(),
            alpha,
            scale: scale.to_array(),
            roll: 0.0,
            kind: kind as u32,
            variant: 0,
        }
    }
}

/// Refill `out` with every drawable in the current frame
pub fn collect_instances(sim: &Simulation, out: &mut Vec<Instance>) {
    out.clear();
    let tuning = &sim.tuning;

    let road_width = tuning.num_lanes as f32 * tuning.lane_offset * ROAD_WIDTH_FACTOR;
    for segment in &sim.world.segments {
        out.push(Instance::new(
            InstanceKind::Road,
            Vec3::new(0.0, 0.0, segment.z),
            Vec3::new(road_width, ROAD_THICKNESS, tuning.tile_length),
            1.0,
        ));
    }

    for (_, decoration) in sim.world.decorations.iter() {
        let instance = match decoration.kind {
            DecorKind::Building {
                width,
                height,
                facade,
            } => Instance {
                variant: facade as u32,
                ..Instance::new(
                    InstanceKind::Building,
                    decoration.pos,
                    Vec3::new(width, height, width),
                    1.0,
                )
            },
            DecorKind::Palm => Instance::new(InstanceKind::Palm, decoration.pos, PALM_SCALE, 1.0),
        };
        out.push(instance);
    }

    for (_, obstacle) in sim.world.obstacles.iter() {
        out.push(Instance::new(
            InstanceKind::Obstacle,
            obstacle.pos,
            tuning.obstacle_collider,
            1.0,
        ));
    }

    for (_, projectile) in sim.projectiles.iter() {
        out.push(Instance::new(
            InstanceKind::Projectile,
            projectile.pos,
            tuning.projectile_collider,
            1.0,
        ));
    }

    for (_, effect) in sim.explosions.iter().chain(sim.fire.iter()) {
        let kind = match effect.kind {
            EffectKind::Explosion => InstanceKind::Explosion,
            EffectKind::FirePuff => InstanceKind::FirePuff,
        };
        out.push(Instance::new(
            kind,
            effect.pos,
            Vec3::splat(effect.scale()),
            effect.alpha(),
        ));
    }

    out.push(Instance {
        roll: sim.vehicle.skew,
        ..Instance::new(
            InstanceKind::Vehicle,
            sim.vehicle.position(),
            tuning.vehicle_collider,
            1.0,
        )
    });
}

/// Raw bytes of an instance list for buffer upload
pub fn instance_bytes(instances: &[Instance]) -> &[u8] {
    bytemuck::cast_slice(instances)
}

/// Chase camera behind the vehicle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraRig {
    pub position: Vec3,
    /// Degrees
    pub pitch: f32,
    /// Degrees
    pub yaw: f32,
    /// Vertical field of view (degrees)
    pub fov: f32,
    /// Sway clock (s)
    pub clock: f32,
}

impl CameraRig {
    pub fn new(sim: &Simulation) -> Self {
        Self {
            position: sim.vehicle.position() + CAMERA_OFFSET,
            pitch: CAMERA_PITCH,
            yaw: 0.0,
            fov: BASE_FOV,
            clock: 0.0,
        }
    }

    pub fn update(&mut self, sim: &Simulation, dt: f32) {
        let dt = dt.max(0.0);
        self.clock += dt;

        let mut desired = sim.vehicle.position() + CAMERA_OFFSET;
        desired.x += (self.clock * CAMERA_SWAY_FREQ).sin() * CAMERA_SWAY_AMPLITUDE;
        let t = crate::smoothing(CAMERA_FOLLOW_RATE, dt);
        self.position = self.position.lerp(desired, t);

        let error = sim.vehicle.x - sim.vehicle.target_x(&sim.tuning);
        self.yaw = approach(self.yaw, error * CAMERA_YAW_PER_UNIT, CAMERA_YAW_RATE, dt);

        let boost = if sim.boost.is_active() { BOOST_FOV } else { 0.0 };
        let target_fov =
            BASE_FOV + (sim.vehicle.speed - sim.tuning.base_speed) * FOV_PER_SPEED + boost;
        self.fov = approach(self.fov, target_fov, FOV_RATE, dt);
    }
}

/// Engine and music levels for an audio backend
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AudioMix {
    pub engine_pitch: f32,
    pub engine_volume: f32,
    pub music_volume: f32,
}

impl Default for AudioMix {
    fn default() -> Self {
        Self {
            engine_pitch: ENGINE_BASE_PITCH,
            engine_volume: 0.0,
            music_volume: MUSIC_VOLUME,
        }
    }
}

impl AudioMix {
    pub fn update(&mut self, sim: &Simulation, dt: f32) {
        if sim.phase != RunState::Running {
            self.engine_volume = approach(self.engine_volume, 0.0, ENGINE_FADE_RATE, dt);
            self.music_volume = approach(self.music_volume, MUSIC_DUCK_VOLUME, MUSIC_RATE, dt);
            return;
        }
        self.music_volume = approach(self.music_volume, MUSIC_VOLUME, MUSIC_RATE, dt);

        let boost = sim.boost.is_active();
        let pitch = engine_pitch(sim.vehicle.speed, boost, sim);
        self.engine_pitch = approach(self.engine_pitch, pitch, ENGINE_PITCH_RATE, dt);

        let volume = ENGINE_BASE_VOLUME + if boost { ENGINE_BOOST_VOLUME } else { 0.0 };
        self.engine_volume = approach(self.engine_volume, volume, ENGINE_VOLUME_RATE, dt);
    }
}

/// Target engine pitch for a speed, normalized against the current ceiling
pub fn engine_pitch(speed: f32, boost_active: bool, sim: &Simulation) -> f32 {
    let tuning = &sim.tuning;
    let ceiling = tuning.effective_ceiling(boost_active);
    let span = (ceiling - tuning.base_speed).max(1.0);
    let norm = ((speed - tuning.base_speed) / span).clamp(0.0, 1.0);
    let pitch = ENGINE_BASE_PITCH
        + (ENGINE_MAX_PITCH - ENGINE_BASE_PITCH) * norm.powf(ENGINE_PITCH_CURVE);
    if boost_active {
        pitch + ENGINE_BOOST_PITCH
    } else {
        pitch
    }
}
