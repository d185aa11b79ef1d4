//! Short-lived combat effects the renderer draws from simulation state.

use glam::Vec3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Explosion {
    pub position: Vec3,
    pub radius: f32,
    pub age: f32,
    pub duration: f32,
}

impl Explosion {
    /// 0 at spawn, 1 when the effect is done.
    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        (self.age / self.duration).clamp(0.0, 1.0)
    }
}

#[derive(Debug)]
pub struct EffectsManager {
    pub explosions: Vec<Explosion>,
    pub max_explosions: usize,
}

impl Default for EffectsManager {
    fn default() -> Self {
        Self::new()
    }
}

impl EffectsManager {
    pub fn new() -> Self {
        Self {
            explosions: Vec::new(),
            max_explosions: 32,
        }
    }

    pub fn spawn_explosion(&mut self, position: Vec3, radius: f32, duration: f32) {
        self.explosions.push(Explosion {
            position,
            radius,
            age: 0.0,
            duration,
        });
        while self.explosions.len() > self.max_explosions {
            self.explosions.remove(0);
        }
    }

    pub fn update(&mut self, dt: f32) {
        for explosion in &mut self.explosions {
            explosion.age += dt;
        }
        self.explosions.retain(|e| e.age < e.duration);
    }

    pub fn clear(&mut self) {
        self.explosions.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explosions_age_out() {
        let mut effects = EffectsManager::new();
        effects.spawn_explosion(Vec3::ZERO, 1.5, 0.5);
        effects.update(0.25);
        assert_eq!(effects.explosions.len(), 1);
        assert!((effects.explosions[0].progress() - 0.5).abs() < 1e-6);
        effects.update(0.3);
        assert!(effects.explosions.is_empty());
    }

    #[test]
    fn oldest_explosion_is_dropped_at_capacity() {
        let mut effects = EffectsManager::new();
        effects.max_explosions = 2;
        for i in 0..3 {
            effects.spawn_explosion(Vec3::new(i as f32, 0.0, 0.0), 1.0, 1.0);
        }
        assert_eq!(effects.explosions.len(), 2);
        assert_eq!(effects.explosions[0].position.x, 1.0);
    }
}
