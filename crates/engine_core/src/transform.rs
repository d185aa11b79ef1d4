//! Agent transforms: a position plus yaw/pitch framing.
//!
//! Agents never roll, so orientation is stored as two angles instead of a
//! quaternion. Yaw 0 faces -Z; positive yaw turns towards -X.

use std::f32::consts::{FRAC_PI_2, PI, TAU};

use glam::{Mat4, Quat, Vec3};

use crate::CoreError;

/// Allowed pitch range in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchLimits {
    pub min: f32,
    pub max: f32,
}

impl PitchLimits {
    /// Just short of straight up/down, for first-person look.
    pub const LOOK: Self = Self {
        min: -FRAC_PI_2 + 0.01,
        max: FRAC_PI_2 - 0.01,
    };

    pub fn new(min: f32, max: f32) -> Result<Self, CoreError> {
        if !(min.is_finite() && max.is_finite() && min <= max) {
            return Err(CoreError::InvalidPitchLimits { min, max });
        }
        Ok(Self { min, max })
    }

    pub fn clamp(&self, pitch: f32) -> f32 {
        pitch.clamp(self.min, self.max)
    }
}

impl Default for PitchLimits {
    fn default() -> Self {
        Self::LOOK
    }
}

/// Position and view angles of an agent.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Transform {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
}

impl Transform {
    /// Create a new transform at the given position, facing -Z.
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn from_position_yaw(position: Vec3, yaw: f32) -> Self {
        Self {
            position,
            yaw,
            pitch: 0.0,
        }
    }

    /// Yaw about +Y followed by pitch about the local X axis.
    pub fn rotation(&self) -> Quat {
        Quat::from_rotation_y(self.yaw) * Quat::from_rotation_x(self.pitch)
    }

    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation(), self.position)
    }

    /// View direction including pitch.
    pub fn forward(&self) -> Vec3 {
        self.rotation() * -Vec3::Z
    }

    /// Horizontal forward direction, ignoring pitch.
    pub fn flat_forward(&self) -> Vec3 {
        Vec3::new(-self.yaw.sin(), 0.0, -self.yaw.cos())
    }

    /// Horizontal right direction, ignoring pitch.
    pub fn flat_right(&self) -> Vec3 {
        Vec3::new(self.yaw.cos(), 0.0, -self.yaw.sin())
    }

    pub fn set_pitch(&mut self, pitch: f32, limits: PitchLimits) {
        self.pitch = limits.clamp(pitch);
    }

    /// Turn (yaw only) to face `target`. Leaves yaw untouched when the
    /// target is directly above or below.
    pub fn face_towards(&mut self, target: Vec3) {
        let dx = target.x - self.position.x;
        let dz = target.z - self.position.z;
        if dx * dx + dz * dz < 1e-8 {
            return;
        }
        self.yaw = yaw_towards(dx, dz);
    }
}

/// Yaw that makes `flat_forward` point along (dx, dz).
pub fn yaw_towards(dx: f32, dz: f32) -> f32 {
    (-dx).atan2(-dz)
}

/// Wraps an angle into [-PI, PI).
pub fn wrap_angle(angle: f32) -> f32 {
    (angle + PI).rem_euclid(TAU) - PI
}

/// Interpolates yaw along the shortest arc. Only the interpolation wraps;
/// the stored yaw is left unbounded.
pub fn lerp_yaw(from: f32, to: f32, t: f32) -> f32 {
    from + wrap_angle(to - from) * t
}
