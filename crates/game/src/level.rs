//! Level descriptors: player spawn, enemy spawn list and mask pickup.
//!
//! Levels come from `levels.ron` when present, otherwise from the built-in
//! set. The active index only moves forward and wraps past the last level.

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("unknown enemy type tag {0}")]
    UnknownEnemyType(u8),
    #[error("level list is empty")]
    Empty,
    #[error("failed to read level file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse level data: {0}")]
    Parse(#[from] ron::error::SpannedError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyType {
    /// Keeps its distance and fires charged orbs.
    Ranged,
    /// Closes in and casts a wall-seeking beam.
    Beam,
}

impl EnemyType {
    pub fn tag(self) -> u8 {
        match self {
            EnemyType::Ranged => 0,
            EnemyType::Beam => 1,
        }
    }
}

impl TryFrom<u8> for EnemyType {
    type Error = LevelError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        match tag {
            0 => Ok(EnemyType::Ranged),
            1 => Ok(EnemyType::Beam),
            other => Err(LevelError::UnknownEnemyType(other)),
        }
    }
}

/// Combat state an enemy starts the level in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InitialState {
    #[default]
    Idle,
    Pursuing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemySpawn {
    pub enemy_type: EnemyType,
    /// Feet position.
    pub position: Vec3,
    #[serde(default)]
    pub initial_state: InitialState,
}

impl EnemySpawn {
    pub fn new(enemy_type: EnemyType, position: Vec3) -> Self {
        Self {
            enemy_type,
            position,
            initial_state: InitialState::Idle,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelConfig {
    pub name: String,
    /// Feet position of the player at level start.
    pub player_spawn: Vec3,
    #[serde(default)]
    pub player_yaw: f32,
    /// Hold everything in the intro until the player moves.
    #[serde(default = "default_true")]
    pub wait_for_movement: bool,
    pub pickup_position: Vec3,
    pub enemies: Vec<EnemySpawn>,
}

fn default_true() -> bool {
    true
}

/// Ordered levels plus the active index.
#[derive(Debug, Clone)]
pub struct LevelSet {
    levels: Vec<LevelConfig>,
    index: usize,
}

impl LevelSet {
    pub fn new(levels: Vec<LevelConfig>) -> Result<Self, LevelError> {
        if levels.is_empty() {
            return Err(LevelError::Empty);
        }
        Ok(Self { levels, index: 0 })
    }

    pub fn from_ron_str(data: &str) -> Result<Self, LevelError> {
        let levels: Vec<LevelConfig> = ron::from_str(data)?;
        Self::new(levels)
    }

    /// Load `path` if it exists, otherwise the built-in levels. A file that
    /// exists but does not parse is an error.
    pub fn load_or_builtin(path: &Path) -> Result<Self, LevelError> {
        if !path.exists() {
            log::info!("No level file at {:?}, using built-in levels", path);
            return Ok(Self::builtin());
        }
        let data = std::fs::read_to_string(path)?;
        let set = Self::from_ron_str(&data)?;
        log::info!("Loaded {} levels from {:?}", set.len(), path);
        Ok(set)
    }

    pub fn builtin() -> Self {
        Self {
            levels: builtin_levels(),
            index: 0,
        }
    }

    pub fn current(&self) -> &LevelConfig {
        &self.levels[self.index]
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Move to the next level, wrapping to the first after the last.
    pub fn advance(&mut self) -> &LevelConfig {
        self.index = (self.index + 1) % self.levels.len();
        &self.levels[self.index]
    }
}

fn builtin_levels() -> Vec<LevelConfig> {
    vec![
        LevelConfig {
            name: "atrium".to_string(),
            player_spawn: Vec3::new(0.0, 0.0, 0.0),
            player_yaw: 0.0,
            wait_for_movement: true,
            pickup_position: Vec3::new(0.0, 0.0, -24.0),
            enemies: vec![
                EnemySpawn::new(EnemyType::Ranged, Vec3::new(0.0, 0.0, -20.0)),
                EnemySpawn::new(EnemyType::Beam, Vec3::new(8.0, 0.0, -28.0)),
            ],
        },
        LevelConfig {
            name: "gallery".to_string(),
            player_spawn: Vec3::new(0.0, 0.0, 4.0),
            player_yaw: 0.0,
            wait_for_movement: true,
            pickup_position: Vec3::new(0.0, 0.0, -32.0),
            enemies: vec![
                EnemySpawn::new(EnemyType::Ranged, Vec3::new(-10.0, 0.0, -15.0)),
                EnemySpawn::new(EnemyType::Ranged, Vec3::new(10.0, 0.0, -15.0)),
                EnemySpawn {
                    enemy_type: EnemyType::Beam,
                    position: Vec3::new(0.0, 0.0, -30.0),
                    initial_state: InitialState::Pursuing,
                },
            ],
        },
    ]
}
