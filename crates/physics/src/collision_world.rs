//! Static collision geometry backed by Rapier3D.
//!
//! The simulation never steps a Rapier pipeline; it only needs ray queries
//! against static meshes. Colliders are inserted without a parent body and
//! the query pipeline is refreshed whenever the set changes.

use std::collections::HashMap;

use anyhow::{bail, Result};
use engine_core::Vec3;
use rapier3d::na::{Isometry3, Vector3};
use rapier3d::prelude::*;

/// Identifies one mesh registered with a [`CollisionWorld`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshId(pub u32);

/// Set of static meshes that agents, projectiles and beams collide with.
pub struct CollisionWorld {
    pub(crate) rigid_body_set: RigidBodySet,
    pub(crate) collider_set: ColliderSet,
    island_manager: IslandManager,
    pub(crate) query_pipeline: QueryPipeline,
    meshes: HashMap<MeshId, ColliderHandle>,
    next_id: u32,
}

impl Default for CollisionWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl CollisionWorld {
    pub fn new() -> Self {
        Self {
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            island_manager: IslandManager::new(),
            query_pipeline: QueryPipeline::new(),
            meshes: HashMap::new(),
            next_id: 0,
        }
    }

    /// Register a triangle mesh given world-space vertices and index triples.
    pub fn add_triangle_mesh(&mut self, vertices: &[Vec3], triangles: &[[u32; 3]]) -> Result<MeshId> {
        if triangles.is_empty() {
            bail!("triangle mesh has no triangles");
        }
        if let Some(bad) = triangles
            .iter()
            .flatten()
            .find(|&&index| index as usize >= vertices.len())
        {
            bail!(
                "triangle index {} out of range for {} vertices",
                bad,
                vertices.len()
            );
        }
        if vertices.iter().any(|v| !v.is_finite()) {
            bail!("triangle mesh has non-finite vertices");
        }

        let points: Vec<Point<Real>> = vertices.iter().map(|v| point![v.x, v.y, v.z]).collect();
        let id = self.allocate_id();
        let collider = ColliderBuilder::trimesh(points, triangles.to_vec())
            .user_data(id.0 as u128)
            .build();
        self.insert(id, collider);
        log::debug!(
            "Added collision mesh {:?} ({} triangles)",
            id,
            triangles.len()
        );
        Ok(id)
    }

    /// Register a planar quad as two triangles. Corners are given in winding order.
    pub fn add_quad(&mut self, corners: [Vec3; 4]) -> Result<MeshId> {
        self.add_triangle_mesh(&corners, &[[0, 1, 2], [0, 2, 3]])
    }

    /// Add a static box. `rotation_y_rad` rotates it around the Y axis.
    pub fn add_static_cuboid(
        &mut self,
        translation: Vec3,
        rotation_y_rad: f32,
        half_extents: Vec3,
    ) -> MeshId {
        let tra = vector![translation.x, translation.y, translation.z];
        let axisangle = Vector3::y_axis().into_inner() * (rotation_y_rad as Real);
        let position = Isometry3::new(tra, axisangle);
        let id = self.allocate_id();
        let collider = ColliderBuilder::cuboid(
            half_extents.x as Real,
            half_extents.y as Real,
            half_extents.z as Real,
        )
        .position(position)
        .user_data(id.0 as u128)
        .build();
        self.insert(id, collider);
        id
    }

    /// Remove a mesh. Returns false if the id is unknown.
    pub fn remove_mesh(&mut self, id: MeshId) -> bool {
        let Some(handle) = self.meshes.remove(&id) else {
            return false;
        };
        self.collider_set.remove(
            handle,
            &mut self.island_manager,
            &mut self.rigid_body_set,
            true,
        );
        self.query_pipeline.update(&self.collider_set);
        log::debug!("Removed collision mesh {:?}", id);
        true
    }

    pub fn contains(&self, id: MeshId) -> bool {
        self.meshes.contains_key(&id)
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    /// Mesh id stored on a collider.
    pub(crate) fn mesh_of(&self, handle: ColliderHandle) -> Option<MeshId> {
        self.collider_set
            .get(handle)
            .map(|collider| MeshId(collider.user_data as u32))
    }

    fn allocate_id(&mut self) -> MeshId {
        let id = MeshId(self.next_id);
        self.next_id += 1;
        id
    }

    fn insert(&mut self, id: MeshId, collider: Collider) {
        let handle = self.collider_set.insert(collider);
        self.meshes.insert(id, handle);
        self.query_pipeline.update(&self.collider_set);
    }
}
