//! Ballistic projectiles with swept world collision and bounded bounces.

use engine_core::Lifetime;
use glam::Vec3;
use physics::CollisionQuery;
use serde::{Deserialize, Serialize};

/// Sweep iterations per tick. Motion left after the last one is dropped.
pub const MAX_SWEEP_ITERATIONS: usize = 4;
/// Distance a bounced projectile is pushed off the surface.
pub const SURFACE_NUDGE: f32 = 0.01;
/// Sweep rays reach this many radii past the motion so oblique contacts,
/// where the sphere touches before its center line does, are still found.
const CONTACT_REACH_RADII: f32 = 4.0;

/// Per-instance projectile behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectileTunables {
    pub radius: f32,
    pub lifetime: f32,
    pub gravity_scale: f32,
    /// Exponential drag coefficient (per second).
    pub drag: f32,
    /// Fraction of speed kept after a bounce.
    pub restitution: f32,
    /// Zero means the first surface contact ends the projectile.
    pub max_bounces: u32,
    pub collide_with_world: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectileOwner {
    Player,
    Enemy,
}

/// Outcome of one [`Projectile::tick`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProjectileFate {
    Alive,
    /// Lifetime ran out.
    Expired,
    /// Struck a surface it could not bounce off.
    Stopped { point: Vec3 },
}

impl ProjectileFate {
    pub fn is_alive(&self) -> bool {
        matches!(self, ProjectileFate::Alive)
    }
}

#[derive(Debug, Clone)]
pub struct Projectile {
    pub position: Vec3,
    pub velocity: Vec3,
    pub owner: ProjectileOwner,
    pub tunables: ProjectileTunables,
    lifetime: Lifetime,
    bounce_count: u32,
    alive: bool,
}

impl Projectile {
    pub fn spawn(position: Vec3, velocity: Vec3, tunables: ProjectileTunables, owner: ProjectileOwner) -> Self {
        Self {
            position,
            velocity,
            owner,
            tunables,
            lifetime: Lifetime::new(tunables.lifetime),
            bounce_count: 0,
            alive: true,
        }
    }

    pub fn radius(&self) -> f32 {
        self.tunables.radius
    }

    pub fn bounce_count(&self) -> u32 {
        self.bounce_count
    }

    pub fn remaining_lifetime(&self) -> f32 {
        self.lifetime.remaining.max(0.0)
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Mark the projectile as consumed (e.g. it hit an agent).
    pub fn consume(&mut self) {
        self.alive = false;
    }

    /// Advance one tick. Gravity and drag are applied once up front, then
    /// the remaining motion is swept against the world.
    pub fn tick<Q: CollisionQuery + ?Sized>(&mut self, dt: f32, gravity: f32, query: &Q) -> ProjectileFate {
        if !self.alive {
            return ProjectileFate::Expired;
        }
        if self.lifetime.update(dt) {
            self.alive = false;
            return ProjectileFate::Expired;
        }

        let t = self.tunables;
        self.velocity.y -= gravity * t.gravity_scale * dt;
        if t.drag > 0.0 {
            self.velocity *= (-t.drag * dt).exp();
        }

        if !t.collide_with_world {
            self.position += self.velocity * dt;
            return ProjectileFate::Alive;
        }

        let mut remaining = dt;
        for _ in 0..MAX_SWEEP_ITERATIONS {
            let motion = self.velocity * remaining;
            let distance = motion.length();
            if distance <= 1e-6 {
                break;
            }
            let direction = motion / distance;

            let reach = distance + t.radius * CONTACT_REACH_RADII;
            let Some(hit) = query.cast_ray(self.position, direction, reach) else {
                self.position += motion;
                break;
            };

            let normal = if hit.normal.dot(direction) > 0.0 {
                -hit.normal
            } else {
                hit.normal
            };
            // Back off along the ray until the sphere just touches the plane.
            let cos = (-direction.dot(normal)).max(1e-3);
            let contact = hit.distance - t.radius / cos;
            if contact > distance {
                self.position += motion;
                break;
            }
            let travel = contact.clamp(0.0, distance);
            self.position += direction * travel;
            remaining *= 1.0 - travel / distance;
            let clearance = (self.position - hit.point).dot(normal);
            if clearance < t.radius {
                self.position += normal * (t.radius - clearance);
            }

            if t.max_bounces == 0 {
                self.alive = false;
                return ProjectileFate::Stopped { point: hit.point };
            }
            self.bounce_count += 1;
            if self.bounce_count > t.max_bounces {
                self.alive = false;
                return ProjectileFate::Stopped { point: hit.point };
            }

            self.velocity = reflect(self.velocity, normal) * t.restitution;
            self.position += normal * SURFACE_NUDGE;
            log::trace!(
                "Projectile bounce {} at {:?}, speed {:.2}",
                self.bounce_count,
                hit.point,
                self.velocity.length()
            );
        }

        ProjectileFate::Alive
    }
}

fn reflect(v: Vec3, normal: Vec3) -> Vec3 {
    v - 2.0 * v.dot(normal) * normal
}
