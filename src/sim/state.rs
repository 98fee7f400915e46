//! Simulation context and run lifecycle
//!
//! One `Simulation` value holds everything a run needs. The host owns it and
//! drives it through [`super::tick`], [`Simulation::set_paused`] and
//! [`Simulation::restart_run`].

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::economy::{Boost, Ordnance};
use super::effects::{Effect, Projectile};
use super::motion::Vehicle;
use super::pool::Pool;
use super::world::World;
use crate::tuning::Tuning;

/// Lifecycle of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RunState {
    /// Nothing advances
    #[default]
    Paused,
    /// Full tick
    Running,
    /// Gameplay frozen until restart; effects finish playing out
    Crashed,
}

/// Live counts and dropped spawns, for diagnostics overlays
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub obstacles: usize,
    pub decorations: usize,
    pub projectiles: usize,
    pub explosions: usize,
    pub fire_puffs: usize,
    pub obstacles_dropped: u32,
    pub decorations_dropped: u32,
    pub projectiles_dropped: u32,
    pub explosions_dropped: u32,
    pub fire_puffs_dropped: u32,
    pub obstacles_destroyed: u32,
}

/// Complete simulation state
#[derive(Debug, Clone)]
pub struct Simulation {
    pub tuning: Tuning,
    /// Seed the RNG was created from
    pub seed: u64,
    pub rng: Pcg32,
    pub phase: RunState,
    /// Distance-based score (reported rounded down)
    pub score: f64,
    /// Seconds spent Running in this run
    pub run_time: f32,
    /// Collisions are ignored while `run_time` is below this
    pub invincible_until: f32,
    pub vehicle: Vehicle,
    pub boost: Boost,
    pub ordnance: Ordnance,
    pub world: World,
    pub projectiles: Pool<Projectile>,
    pub explosions: Pool<Effect>,
    pub fire: Pool<Effect>,
    /// Fractional exhaust puffs owed to the next tick
    pub fire_accumulator: f32,
    pub obstacles_destroyed: u32,
}

impl Simulation {
    /// Create a paused simulation with a fresh layout
    pub fn new(tuning: Tuning, seed: u64) -> Self {
        let tuning = tuning.sanitized();
        let mut sim = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            phase: RunState::Paused,
            score: 0.0,
            run_time: 0.0,
            invincible_until: tuning.respawn_iframe,
            vehicle: Vehicle::new(&tuning),
            boost: Boost::default(),
            ordnance: Ordnance::new(&tuning),
            world: World::new(&tuning),
            projectiles: Pool::with_capacity(tuning.projectile_capacity),
            explosions: Pool::with_capacity(tuning.explosion_capacity),
            fire: Pool::with_capacity(tuning.fire_capacity),
            fire_accumulator: 0.0,
            obstacles_destroyed: 0,
            tuning,
        };
        sim.world.reset(&sim.tuning, &mut sim.rng);
        log::info!("Simulation created with seed {}", seed);
        sim
    }

    /// Reset every pool, resource and the layout, then start running.
    ///
    /// From Crashed this is the only way back to Running. Counters, resources
    /// and the vehicle come back identical on every call, but the obstacle and
    /// decoration layout is rolled from the continuing RNG stream, so two
    /// restarts in a row give different placements. Two simulations with the
    /// same seed and history still restart into the same layout.
    pub fn restart_run(&mut self) {
        self.projectiles.release_all();
        self.explosions.release_all();
        self.fire.release_all();
        self.world.reset(&self.tuning, &mut self.rng);

        self.vehicle = Vehicle::new(&self.tuning);
        self.boost = Boost::default();
        self.ordnance = Ordnance::new(&self.tuning);
        self.score = 0.0;
        self.run_time = 0.0;
        self.invincible_until = self.tuning.respawn_iframe;
        self.fire_accumulator = 0.0;
        self.obstacles_destroyed = 0;
        self.phase = RunState::Running;

        log::info!("Run restarted");
    }

    /// Pause or resume without touching run state. Repeated calls are no-ops;
    /// a crashed run can only leave Crashed through `restart_run`.
    pub fn set_paused(&mut self, paused: bool) {
        match (self.phase, paused) {
            (RunState::Running, true) => {
                self.phase = RunState::Paused;
                log::debug!("Paused at t={:.2}", self.run_time);
            }
            (RunState::Paused, false) => {
                self.phase = RunState::Running;
                log::debug!("Resumed at t={:.2}", self.run_time);
            }
            (RunState::Crashed, _) => {
                log::debug!("Ignoring pause request while crashed");
            }
            _ => {}
        }
    }

    /// Debug override: boost always on at full charge
    pub fn set_unlimited_boost(&mut self, unlimited: bool) {
        self.boost.set_unlimited(unlimited);
    }

    /// Whether collisions are currently ignored
    #[inline]
    pub fn is_invincible(&self) -> bool {
        self.run_time < self.invincible_until
    }

    #[inline]
    pub fn difficulty(&self) -> f32 {
        self.tuning.difficulty(self.run_time)
    }

    pub fn diagnostics(&self) -> Diagnostics {
        Diagnostics {
            obstacles: self.world.obstacles.active_len(),
            decorations: self.world.decorations.active_len(),
            projectiles: self.projectiles.active_len(),
            explosions: self.explosions.active_len(),
            fire_puffs: self.fire.active_len(),
            obstacles_dropped: self.world.obstacles.dropped(),
            decorations_dropped: self.world.decorations.dropped(),
            projectiles_dropped: self.projectiles.dropped(),
            explosions_dropped: self.explosions.dropped(),
            fire_puffs_dropped: self.fire.dropped(),
            obstacles_destroyed: self.obstacles_destroyed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_new_is_paused_and_fresh() {
        let sim = Simulation::new(Tuning::default(), 1);
        assert_eq!(sim.phase, RunState::Paused);
        assert_eq!(sim.score, 0.0);
        assert_eq!(sim.ordnance.count, sim.tuning.ordnance_max);
        assert_eq!(sim.boost.charge, 1.0);
        assert!(sim.world.decorations.active_len() > 0);
        assert!(sim.is_invincible());
    }

    #[test]
    fn test_pause_is_idempotent() {
        let mut sim = Simulation::new(Tuning::default(), 1);
        sim.set_paused(false);
        assert_eq!(sim.phase, RunState::Running);

        sim.set_paused(true);
        let once = (sim.phase, sim.run_time, sim.score, sim.vehicle);
        sim.set_paused(true);
        let twice = (sim.phase, sim.run_time, sim.score, sim.vehicle);
        assert_eq!(once, twice);
        assert_eq!(sim.phase, RunState::Paused);

        sim.set_paused(false);
        sim.set_paused(false);
        assert_eq!(sim.phase, RunState::Running);
    }

    #[test]
    fn test_crashed_ignores_pause() {
        let mut sim = Simulation::new(Tuning::default(), 1);
        sim.phase = RunState::Crashed;
        sim.set_paused(true);
        assert_eq!(sim.phase, RunState::Crashed);
        sim.set_paused(false);
        assert_eq!(sim.phase, RunState::Crashed);
    }

    #[test]
    fn test_restart_resets_everything() {
        let mut sim = Simulation::new(Tuning::default(), 3);
        sim.phase = RunState::Crashed;
        sim.score = 1234.0;
        sim.run_time = 42.0;
        sim.ordnance.count = 1;
        sim.ordnance.regen_timer = 0.7;
        sim.boost.burning = true;
        sim.boost.charge = 0.3;
        sim.vehicle.set_lane(0, &sim.tuning);
        for i in 0..5 {
            sim.world.place_obstacle(Vec3::new(0.0, 0.6, 20.0 + i as f32 * 3.0), 1);
        }
        sim.projectiles.spawn(Projectile::default());
        sim.explosions.spawn(Effect::default());
        sim.fire.spawn(Effect::default());

        sim.restart_run();

        assert_eq!(sim.phase, RunState::Running);
        assert_eq!(sim.score, 0.0);
        assert_eq!(sim.run_time, 0.0);
        assert_eq!(sim.ordnance.count, sim.tuning.ordnance_max);
        assert_eq!(sim.ordnance.regen_timer, 0.0);
        assert_eq!(sim.boost.charge, 1.0);
        assert!(!sim.boost.burning);
        assert_eq!(sim.vehicle.target_lane, 1);
        assert_eq!(sim.projectiles.active_len(), 0);
        assert_eq!(sim.explosions.active_len(), 0);
        assert_eq!(sim.fire.active_len(), 0);
        // Only the fresh layout's obstacles remain, none on the runway
        let runway = sim.tuning.tile_length * (sim.tuning.clear_runway_tiles as f32 - 1.0);
        assert!(sim.world.obstacles.iter().all(|(_, o)| o.pos.z > runway));
        assert!(sim.is_invincible());
    }

    #[test]
    fn test_restart_from_fresh_state_is_equivalent() {
        let mut sim = Simulation::new(Tuning::default(), 9);
        sim.restart_run();
        let first = (sim.phase, sim.score, sim.run_time, sim.ordnance, sim.boost, sim.vehicle);
        sim.restart_run();
        let second = (sim.phase, sim.score, sim.run_time, sim.ordnance, sim.boost, sim.vehicle);
        assert_eq!(first, second);
        assert_eq!(sim.projectiles.active_len(), 0);
    }

    #[test]
    fn test_restart_layout_follows_seed() {
        let layout = |sim: &Simulation| -> Vec<Vec3> {
            sim.world.obstacles.iter().map(|(_, o)| o.pos).collect()
        };
        let mut a = Simulation::new(Tuning::default(), 21);
        let mut b = Simulation::new(Tuning::default(), 21);
        a.restart_run();
        b.restart_run();
        assert_eq!(layout(&a), layout(&b));
        assert_eq!(a.world.segments, b.world.segments);

        // Segment ring itself is fixed; only the dressing is re-rolled
        let segments = a.world.segments.clone();
        a.restart_run();
        assert_eq!(a.world.segments, segments);
        a.restart_run();
        b.restart_run();
        b.restart_run();
        assert_eq!(layout(&a), layout(&b));
    }

    #[test]
    fn test_diagnostics_reports_live_counts() {
        let mut sim = Simulation::new(Tuning::default(), 5);
        sim.projectiles.spawn(Projectile::default());
        let diag = sim.diagnostics();
        assert_eq!(diag.projectiles, 1);
        assert_eq!(diag.obstacles, sim.world.obstacles.active_len());
        assert_eq!(diag.projectiles_dropped, 0);
    }
}
