//! Small components shared by agents, projectiles and effects.

use glam::Vec3;

use crate::CoreError;

/// Lifetime component for temporary entities (projectiles, effects).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lifetime {
    pub remaining: f32,
}

impl Lifetime {
    pub fn new(seconds: f32) -> Self {
        Self { remaining: seconds }
    }

    /// Counts down by `dt`; returns true once the lifetime has run out.
    pub fn update(&mut self, dt: f32) -> bool {
        self.remaining -= dt;
        self.remaining <= 0.0
    }

    pub fn is_expired(&self) -> bool {
        self.remaining <= 0.0
    }
}

/// Vertical cylinder used for sphere-vs-agent hit tests.
///
/// Hits are tested against the capsule centre: horizontally within the sum
/// of radii, vertically within the half height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitCapsule {
    pub radius: f32,
    pub half_height: f32,
}

impl HitCapsule {
    pub fn new(radius: f32, half_height: f32) -> Result<Self, CoreError> {
        if !(radius > 0.0 && half_height > 0.0) {
            return Err(CoreError::InvalidCapsule {
                radius,
                half_height,
            });
        }
        Ok(Self {
            radius,
            half_height,
        })
    }

    /// Builds a capsule for an agent of the given total height.
    pub fn for_agent(radius: f32, height: f32) -> Self {
        Self {
            radius,
            half_height: height * 0.5,
        }
    }

    pub fn contains_sphere(&self, center: Vec3, point: Vec3, sphere_radius: f32) -> bool {
        let dx = point.x - center.x;
        let dz = point.z - center.z;
        let reach = self.radius + sphere_radius;
        dx * dx + dz * dz <= reach * reach && (point.y - center.y).abs() <= self.half_height
    }
}
