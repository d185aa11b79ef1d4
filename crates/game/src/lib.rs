//! Maskfall gameplay simulation.
//!
//! Everything here is headless: the host feeds an [`input::InputSnapshot`]
//! and a collision query into [`Simulation::tick`] each frame, then reads
//! the views and drains [`SimEvent`]s to drive rendering and audio.

pub mod beam;
pub mod config;
pub mod effects;
pub mod enemy;
pub mod events;
pub mod level;
pub mod player;
pub mod projectile;
pub mod sequencer;
pub mod simulation;

pub use config::{TuningConfig, TuningError};
pub use events::{EventQueue, HitSource, SimEvent};
pub use level::{LevelConfig, LevelError, LevelSet};
pub use sequencer::{Phase, SequencerEvent};
pub use simulation::Simulation;
