//! Variable timestep simulation tick
//!
//! Core game loop: one call per rendered frame with the elapsed time.

use serde::{Deserialize, Serialize};

use super::collision::Aabb;
use super::effects::{self, Effect, PROJECTILE_OFFSET, Projectile};
use super::motion::Throttle;
use super::state::{RunState, Simulation};

/// Input intents for a single tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickInput {
    pub lane_left: bool,
    pub lane_right: bool,
    /// Accelerate (held)
    pub throttle_up: bool,
    /// Brake (held)
    pub throttle_down: bool,
    /// Boost key pressed this tick
    pub toggle_boost: bool,
    /// Fire key pressed this tick
    pub fire: bool,
}

impl TickInput {
    #[inline]
    fn lane_delta(&self) -> i32 {
        self.lane_right as i32 - self.lane_left as i32
    }

    #[inline]
    fn throttle(&self) -> Throttle {
        Throttle {
            up: self.throttle_up,
            down: self.throttle_down,
        }
    }
}

/// Things that happened this tick, for sound and HUD cues
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameEvents {
    /// A round was launched
    pub fired: bool,
    /// Explosions spawned (hits and crash)
    pub explosions: u32,
    /// A round was regenerated
    pub ordnance_granted: bool,
    /// The run crashed this tick
    pub crashed: bool,
}

/// What the presentation layer renders after a tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameOutcome {
    pub run_state: RunState,
    pub score: u64,
    pub speed: f32,
    pub ordnance: u8,
    pub ordnance_max: u8,
    pub boost_ready: bool,
    pub boost_active: bool,
    pub boost_charge: f32,
    pub events: FrameEvents,
}

impl FrameOutcome {
    fn capture(sim: &Simulation, events: FrameEvents) -> Self {
        Self {
            run_state: sim.phase,
            score: sim.score.max(0.0).floor() as u64,
            speed: sim.vehicle.speed,
            ordnance: sim.ordnance.count,
            ordnance_max: sim.ordnance.max,
            boost_ready: sim.boost.is_ready(),
            boost_active: sim.boost.is_active(),
            boost_charge: sim.boost.charge,
            events,
        }
    }
}

/// Advance the simulation by `dt` seconds
pub fn tick(sim: &mut Simulation, input: &TickInput, dt: f32) -> FrameOutcome {
    let dt = if dt.is_finite() { dt.clamp(0.0, sim.tuning.max_dt) } else { 0.0 };
    let mut events = FrameEvents::default();

    match sim.phase {
        RunState::Paused => {}
        RunState::Crashed => {
            // Gameplay is frozen; let the crash explosion and exhaust finish
            effects::step_effects(&mut sim.explosions, dt);
            effects::step_effects(&mut sim.fire, dt);
        }
        RunState::Running => run(sim, input, dt, &mut events),
    }

    FrameOutcome::capture(sim, events)
}

fn run(sim: &mut Simulation, input: &TickInput, dt: f32, events: &mut FrameEvents) {
    sim.run_time += dt;
    let now = sim.run_time;
    let difficulty = sim.difficulty();

    // Discrete intents
    sim.vehicle.request_lane_change(input.lane_delta(), now, &sim.tuning);
    if input.toggle_boost {
        sim.boost.toggle();
    }
    if input.fire {
        events.fired = try_fire(sim, now);
    }

    // Resources and motion
    sim.boost.update(dt, &sim.tuning);
    let boost_active = sim.boost.is_active();
    sim.vehicle.update(dt, input.throttle(), difficulty, boost_active, &sim.tuning);

    if boost_active {
        effects::emit_fire(
            &mut sim.fire,
            &mut sim.fire_accumulator,
            dt,
            sim.vehicle.position(),
            sim.vehicle.speed,
            &sim.tuning,
            &mut sim.rng,
        );
    } else {
        sim.fire_accumulator = 0.0;
    }

    events.ordnance_granted =
        sim.ordnance.update(dt, sim.vehicle.speed, boost_active, &sim.tuning);

    // World streaming
    let distance = sim.vehicle.speed * dt;
    sim.world.scroll(distance);
    sim.world.recycle(difficulty, &sim.tuning, &mut sim.rng);
    sim.world.cull(&sim.tuning);

    // Projectiles and effects
    let report = effects::step_projectiles(
        &mut sim.projectiles,
        &mut sim.world.obstacles,
        &mut sim.explosions,
        dt,
        distance,
        &sim.tuning,
    );
    sim.obstacles_destroyed += report.hits;
    events.explosions += report.explosions;
    effects::step_effects(&mut sim.explosions, dt);
    effects::step_effects(&mut sim.fire, dt);

    sim.score += distance as f64;

    // Collision runs last and may end the run
    if !sim.is_invincible() && check_crash(sim) {
        if sim
            .explosions
            .spawn(Effect::explosion(sim.vehicle.position(), &sim.tuning))
            .is_some()
        {
            events.explosions += 1;
        }
        sim.phase = RunState::Crashed;
        events.crashed = true;
        log::info!(
            "Crashed at t={:.2}s, score {}",
            sim.run_time,
            sim.score.floor() as u64
        );
    }
}

/// Launch a round if cooldown, ammo and the projectile pool allow it
fn try_fire(sim: &mut Simulation, now: f32) -> bool {
    if !sim.ordnance.can_fire(now, &sim.tuning) {
        return false;
    }
    let projectile = Projectile {
        pos: sim.vehicle.position() + PROJECTILE_OFFSET,
        speed: sim.tuning.projectile_speed,
    };
    if sim.projectiles.spawn(projectile).is_none() {
        return false;
    }
    sim.ordnance.consume(now);
    true
}

/// First active obstacle overlapping the vehicle
fn check_crash(sim: &Simulation) -> bool {
    let car = Aabb::new(sim.vehicle.position(), sim.tuning.vehicle_collider);
    sim.world
        .obstacles
        .find(|o| Aabb::new(o.pos, sim.tuning.obstacle_collider).overlaps(&car))
        .is_some()
}
