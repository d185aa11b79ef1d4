//! Wall-seeking beam cast by type 1 enemies.
//!
//! The beam's range is fixed by one raycast at spawn. Its visible length
//! then grows linearly over the build duration, and the player is struck at
//! most once per beam.

use glam::Vec3;
use physics::CollisionQuery;

use crate::config::BeamTuning;

/// Used when start and target coincide.
pub const DEFAULT_BEAM_DIRECTION: Vec3 = Vec3::NEG_Z;
/// Floor for the nominal distance when computing the no-hit fallback length.
const MIN_NOMINAL_RANGE: f32 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub struct BeamAttack {
    start: Vec3,
    direction: Vec3,
    length: f32,
    age: f32,
    build_duration: f32,
    damaged_player: bool,
}

impl BeamAttack {
    pub fn spawn<Q: CollisionQuery + ?Sized>(start: Vec3, target: Vec3, tuning: &BeamTuning, query: &Q) -> Self {
        let offset = target - start;
        let direction = offset.try_normalize().unwrap_or(DEFAULT_BEAM_DIRECTION);
        let length = match query.cast_ray(start, direction, tuning.range_cap) {
            Some(hit) => hit.distance,
            None => offset.length().max(MIN_NOMINAL_RANGE) * tuning.fallback_multiplier,
        };
        Self {
            start,
            direction,
            length,
            age: 0.0,
            build_duration: tuning.build_duration,
            damaged_player: false,
        }
    }

    pub fn start(&self) -> Vec3 {
        self.start
    }

    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    /// Full length resolved at spawn.
    pub fn length(&self) -> f32 {
        self.length
    }

    pub fn end(&self) -> Vec3 {
        self.start + self.direction * self.length
    }

    pub fn progress(&self) -> f32 {
        if self.build_duration <= 0.0 {
            return 1.0;
        }
        (self.age / self.build_duration).clamp(0.0, 1.0)
    }

    pub fn visible_length(&self) -> f32 {
        self.length * self.progress()
    }

    pub fn has_damaged_player(&self) -> bool {
        self.damaged_player
    }

    pub fn is_finished(&self) -> bool {
        self.age >= self.build_duration
    }

    /// Grow the beam and test it against the player. Returns true on the one
    /// tick the player is struck.
    pub fn tick(&mut self, dt: f32, player_center: Vec3, player_radius: f32, padding: f32) -> bool {
        self.age += dt;
        if self.damaged_player {
            return false;
        }
        let along = (player_center - self.start)
            .dot(self.direction)
            .clamp(0.0, self.visible_length());
        let closest = self.start + self.direction * along;
        if closest.distance(player_center) <= player_radius + padding {
            self.damaged_player = true;
            return true;
        }
        false
    }
}
