//! Core simulation types shared by every maskfall crate.
//!
//! This crate provides the foundational types used across all systems:
//! - Yaw/pitch agent transforms
//! - Frame clock with delta clamping
//! - Small shared components (lifetimes, hit capsules)

pub mod components;
pub mod error;
pub mod time;
pub mod transform;

pub use components::*;
pub use error::CoreError;
pub use time::*;
pub use transform::*;

// Re-export commonly used types
pub use glam::{Mat4, Quat, Vec2, Vec3};
