//! Collision queries and kinematic agent movement for maskfall.
//!
//! Level geometry lives in a Rapier3D [`CollisionWorld`]; everything else
//! talks to it through the [`CollisionQuery`] trait.

pub mod collision_world;
pub mod kinematic;
pub mod raycast;

pub use collision_world::*;
pub use kinematic::*;
pub use raycast::*;

// Re-export Rapier for downstream crates
pub use rapier3d;
