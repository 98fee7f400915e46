//! Simulation module
//!
//! All gameplay logic lives here. Rules for this module:
//! - Variable timestep, frame-rate independent smoothing
//! - Seeded RNG only, so a seed and an input trace replay exactly
//! - Fixed-capacity pools; nothing allocates per frame
//! - No rendering or platform dependencies

pub mod collision;
pub mod economy;
pub mod effects;
pub mod motion;
pub mod pool;
pub mod state;
pub mod tick;
pub mod world;

pub use collision::Aabb;
pub use economy::{Boost, Ordnance, regen_time};
pub use effects::{Effect, EffectKind, Projectile};
pub use motion::{Throttle, Vehicle};
pub use pool::{Handle, Pool};
pub use state::{Diagnostics, RunState, Simulation};
pub use tick::{FrameEvents, FrameOutcome, TickInput, tick};
pub use world::{DecorKind, Decoration, Obstacle, Segment, World};
