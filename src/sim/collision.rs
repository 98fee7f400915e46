//! Box overlap tests for vehicle, obstacles and projectiles

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub center: Vec3,
    pub half_extents: Vec3,
}

impl Aabb {
    /// Box centered at `center` with full dimensions `size`
    #[inline]
    pub fn new(center: Vec3, size: Vec3) -> Self {
        Self {
            center,
            half_extents: size.abs() * 0.5,
        }
    }

    #[inline]
    pub fn min(&self) -> Vec3 {
        self.center - self.half_extents
    }

    #[inline]
    pub fn max(&self) -> Vec3 {
        self.center + self.half_extents
    }

    /// Strict overlap on all three axes (touching faces do not count)
    #[inline]
    pub fn overlaps(&self, other: &Aabb) -> bool {
        let distance = (self.center - other.center).abs();
        distance.cmplt(self.half_extents + other.half_extents).all()
    }

    /// Extend the box backwards along -z by `distance`.
    ///
    /// Covers the volume swept by something that moved `distance` forward
    /// this tick, so thin targets cannot be skipped by a large step.
    pub fn swept_back(&self, distance: f32) -> Aabb {
        let distance = distance.max(0.0);
        let mut min = self.min();
        let max = self.max();
        min.z -= distance;
        Aabb {
            center: (min + max) * 0.5,
            half_extents: (max - min) * 0.5,
        }
    }
}
