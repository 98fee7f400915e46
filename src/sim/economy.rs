//! Boost and ordnance resources
//!
//! Boost is a toggled, continuously draining charge. Ordnance is a discrete
//! ammo count that regenerates faster the closer the vehicle runs to its
//! speed ceiling.

use serde::{Deserialize, Serialize};

use crate::tuning::Tuning;

/// Regen interval is shortened by up to this fraction at the speed ceiling
const REGEN_SPEEDUP: f32 = 0.7;

/// Boost charge and burn state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Boost {
    /// Remaining charge in [0, 1]
    pub charge: f32,
    pub burning: bool,
    /// Override: always burning at full charge
    pub unlimited: bool,
}

impl Default for Boost {
    fn default() -> Self {
        Self {
            charge: 1.0,
            burning: false,
            unlimited: false,
        }
    }
}

impl Boost {
    /// Handle the boost key.
    ///
    /// Turning boost on with an empty tank refills it first, so a depleted
    /// player always gets one more burst.
    pub fn toggle(&mut self) {
        if self.unlimited {
            self.unlimited = false;
            self.burning = false;
            return;
        }
        self.burning = !self.burning;
        if self.burning && self.charge <= 0.0 {
            self.charge = 1.0;
        }
    }

    pub fn update(&mut self, dt: f32, tuning: &Tuning) {
        if self.unlimited {
            self.burning = true;
            self.charge = 1.0;
        } else if self.burning {
            self.charge = (self.charge - tuning.boost_decay_rate * dt).clamp(0.0, 1.0);
            if self.charge <= 0.0 {
                self.burning = false;
            }
        } else {
            self.charge = 1.0;
        }
    }

    pub fn set_unlimited(&mut self, unlimited: bool) {
        self.unlimited = unlimited;
        if unlimited {
            self.burning = true;
            self.charge = 1.0;
        } else {
            self.burning = false;
        }
    }

    /// Speed multiplier currently applies
    #[inline]
    pub fn is_active(&self) -> bool {
        self.burning || self.unlimited
    }

    /// Shown as the "boost ready" indicator
    #[inline]
    pub fn is_ready(&self) -> bool {
        !self.burning && (self.charge >= 1.0 || self.unlimited)
    }
}

/// Ammo count with speed-dependent regeneration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ordnance {
    pub count: u8,
    pub max: u8,
    /// Time accumulated toward the next grant
    pub regen_timer: f32,
    /// Time required for the next grant at the current speed
    pub regen_target: f32,
    /// Run time of the last successful shot
    pub last_fire: Option<f32>,
}

impl Ordnance {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            count: tuning.ordnance_max,
            max: tuning.ordnance_max,
            regen_timer: 0.0,
            regen_target: tuning.ordnance_base_regen,
            last_fire: None,
        }
    }

    /// Whether a shot is allowed at `now` (cooldown elapsed and ammo left)
    #[inline]
    pub fn can_fire(&self, now: f32, tuning: &Tuning) -> bool {
        self.count > 0
            && self
                .last_fire
                .is_none_or(|last| now - last >= tuning.fire_cooldown)
    }

    /// Spend one round. Progress toward the next grant is lost.
    pub fn consume(&mut self, now: f32) {
        self.count = self.count.saturating_sub(1);
        self.regen_timer = 0.0;
        self.last_fire = Some(now);
    }

    /// Accumulate regen time; returns true when a round was granted this tick
    pub fn update(&mut self, dt: f32, speed: f32, boost_active: bool, tuning: &Tuning) -> bool {
        self.regen_target = regen_time(speed, boost_active, tuning);
        if self.count >= self.max {
            return false;
        }

        self.regen_timer += dt;
        if self.regen_timer >= self.regen_target {
            self.count = (self.count + 1).min(self.max);
            self.regen_timer = 0.0;
            self.regen_target = regen_time(speed, boost_active, tuning);
            return true;
        }
        false
    }
}

/// Seconds needed to regenerate one round at `speed`
pub fn regen_time(speed: f32, boost_active: bool, tuning: &Tuning) -> f32 {
    let ceiling = tuning.effective_ceiling(boost_active);
    if ceiling <= tuning.base_speed + 1e-6 {
        return tuning.ordnance_base_regen;
    }
    let span = (ceiling - tuning.base_speed).max(1.0);
    let norm = ((speed - tuning.base_speed) / span).clamp(0.0, 1.0);
    (tuning.ordnance_base_regen * (1.0 - REGEN_SPEEDUP * norm)).max(tuning.ordnance_regen_min)
}
