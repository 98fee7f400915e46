//! Per-entity step functions for projectiles and visual effects

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::collision::Aabb;
use super::pool::Pool;
use super::world::Obstacle;
use crate::tuning::Tuning;

/// Launch point relative to the vehicle
pub const PROJECTILE_OFFSET: Vec3 = Vec3::new(0.0, 0.2, 1.0);
/// Exhaust point relative to the vehicle
const EXHAUST_OFFSET: Vec3 = Vec3::new(0.0, -0.1, -0.6);
/// Base drift of exhaust puffs (up and backward)
const EXHAUST_VELOCITY: Vec3 = Vec3::new(0.0, 2.0, -6.0);
/// Puffs per frame at a 60 Hz reference rate, before the speed term
const PUFFS_PER_FRAME_BASE: f32 = 2.0;
/// Speed that adds one extra puff per reference frame
const PUFF_SPEED_STEP: f32 = 35.0;
const REFERENCE_FPS: f32 = 60.0;

/// A fired round
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Projectile {
    pub pos: Vec3,
    pub speed: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EffectKind {
    #[default]
    Explosion,
    FirePuff,
}

/// Short-lived visual whose look is a pure function of its normalized age
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Effect {
    pub kind: EffectKind,
    pub pos: Vec3,
    pub vel: Vec3,
    pub elapsed: f32,
    pub max_life: f32,
    pub base_scale: f32,
    /// Scale gained over the full lifetime (scale = base * (1 + growth * progress))
    pub growth: f32,
}

impl Effect {
    pub fn explosion(pos: Vec3, tuning: &Tuning) -> Self {
        Self {
            kind: EffectKind::Explosion,
            pos,
            vel: Vec3::ZERO,
            elapsed: 0.0,
            max_life: tuning.explosion_time,
            base_scale: 1.0,
            growth: tuning.explosion_scale * tuning.explosion_time,
        }
    }

    pub fn fire_puff(pos: Vec3, vel: Vec3, scale: f32, tuning: &Tuning) -> Self {
        Self {
            kind: EffectKind::FirePuff,
            pos,
            vel,
            elapsed: 0.0,
            max_life: tuning.fire_life,
            base_scale: scale,
            growth: tuning.fire_growth,
        }
    }

    /// Normalized age in [0, 1]
    #[inline]
    pub fn progress(&self) -> f32 {
        if self.max_life <= 0.0 {
            return 1.0;
        }
        (self.elapsed / self.max_life).clamp(0.0, 1.0)
    }

    #[inline]
    pub fn alpha(&self) -> f32 {
        1.0 - self.progress()
    }

    #[inline]
    pub fn scale(&self) -> f32 {
        self.base_scale * (1.0 + self.growth * self.progress())
    }

    /// Age the effect; returns false once it has expired
    pub fn advance(&mut self, dt: f32) -> bool {
        self.pos += self.vel * dt;
        self.elapsed += dt;
        self.elapsed < self.max_life
    }
}

/// What the projectile pass did this tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectileReport {
    pub hits: u32,
    pub explosions: u32,
}

/// Advance projectiles, resolve hits, expire those out of range.
///
/// `world_distance` is how far the world scrolled this tick; it is added to
/// the swept hit volume because obstacles closed in by that much as well.
pub fn step_projectiles(
    projectiles: &mut Pool<Projectile>,
    obstacles: &mut Pool<Obstacle>,
    explosions: &mut Pool<Effect>,
    dt: f32,
    world_distance: f32,
    tuning: &Tuning,
) -> ProjectileReport {
    let mut report = ProjectileReport::default();
    let expire_z = tuning.vehicle_z + tuning.projectile_range;

    projectiles.retain(|_, projectile| {
        let travel = projectile.speed * dt;
        projectile.pos.z += travel;

        let hit_box = Aabb::new(projectile.pos, tuning.projectile_collider)
            .swept_back(travel + world_distance);
        // The swept box can span several obstacles; the nearest one is hit
        let target = obstacles
            .iter()
            .filter(|(_, o)| Aabb::new(o.pos, tuning.obstacle_collider).overlaps(&hit_box))
            .min_by(|(_, a), (_, b)| a.pos.z.total_cmp(&b.pos.z))
            .map(|(handle, o)| (handle, o.pos));

        if let Some((handle, at)) = target {
            if explosions.spawn(Effect::explosion(at, tuning)).is_some() {
                report.explosions += 1;
            }
            obstacles.release(handle);
            report.hits += 1;
            return false;
        }

        projectile.pos.z <= expire_z
    });

    report
}

/// Age every effect in a pool, releasing expired ones
pub fn step_effects(effects: &mut Pool<Effect>, dt: f32) {
    effects.retain(|_, effect| effect.advance(dt));
}

/// Emit exhaust puffs behind the vehicle while boosting.
///
/// Emission is time-based through `accumulator`, so the puff rate does not
/// depend on the tick rate. Returns the number of puffs spawned.
pub fn emit_fire(
    fire: &mut Pool<Effect>,
    accumulator: &mut f32,
    dt: f32,
    vehicle_pos: Vec3,
    speed: f32,
    tuning: &Tuning,
    rng: &mut impl Rng,
) -> u32 {
    let rate = (PUFFS_PER_FRAME_BASE + (speed / PUFF_SPEED_STEP).floor()) * REFERENCE_FPS;
    *accumulator += rate * dt;

    let mut spawned = 0;
    while *accumulator >= 1.0 {
        *accumulator -= 1.0;
        let spread = Vec3::new(
            rng.random_range(-0.2..0.2),
            rng.random_range(-0.05..0.15),
            rng.random_range(-0.2..0.0),
        );
        let scale = rng.random_range(0.45..0.75);
        let puff = Effect::fire_puff(
            vehicle_pos + EXHAUST_OFFSET,
            EXHAUST_VELOCITY + spread,
            scale,
            tuning,
        );
        if fire.spawn(puff).is_none() {
            // Pool is full; don't bank the backlog
            *accumulator = 0.0;
            break;
        }
        spawned += 1;
    }
    spawned
}
