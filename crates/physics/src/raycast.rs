//! Raycast queries against static collision geometry.

use crate::{CollisionWorld, MeshId};
use engine_core::Vec3;
use rapier3d::prelude::*;

/// Result of a raycast query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastHit {
    /// The mesh that was hit.
    pub mesh: MeshId,
    /// Distance along the ray to the hit point.
    pub distance: f32,
    /// World position of the hit.
    pub point: Vec3,
    /// Surface normal at the hit point.
    pub normal: Vec3,
}

/// Nearest-hit ray queries. Everything that moves through the level goes
/// through this trait, so callers can swap in another geometry backend.
pub trait CollisionQuery {
    /// Cast a ray and return the nearest hit within `max_distance`.
    /// `direction` need not be normalized; the hit distance is in world units.
    fn cast_ray(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RaycastHit>;

    /// Whether any geometry is registered. Agents fall back to a flat floor
    /// when this is false.
    fn has_geometry(&self) -> bool;
}

impl CollisionQuery for CollisionWorld {
    fn cast_ray(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RaycastHit> {
        let direction = direction.try_normalize()?;
        if !(max_distance > 0.0) {
            return None;
        }
        let ray = Ray::new(
            point![origin.x, origin.y, origin.z],
            vector![direction.x, direction.y, direction.z],
        );

        let filter = QueryFilter::default();

        let (collider, intersection) = self.query_pipeline.cast_ray_and_get_normal(
            &self.rigid_body_set,
            &self.collider_set,
            &ray,
            max_distance,
            true,
            filter,
        )?;
        let point = ray.point_at(intersection.time_of_impact);
        Some(RaycastHit {
            mesh: self.mesh_of(collider)?,
            distance: intersection.time_of_impact,
            point: Vec3::new(point.x, point.y, point.z),
            normal: Vec3::new(
                intersection.normal.x,
                intersection.normal.y,
                intersection.normal.z,
            ),
        })
    }

    fn has_geometry(&self) -> bool {
        !self.is_empty()
    }
}
