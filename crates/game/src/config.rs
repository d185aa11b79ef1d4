//! Gameplay tuning. Loaded from tuning.ron at startup.
//!
//! Every feel parameter lives here so designers can iterate without a
//! rebuild. Missing fields take their defaults.

use std::path::{Path, PathBuf};

use engine_core::{CoreError, HitCapsule, PitchLimits, DEFAULT_MAX_FRAME_DELTA};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::projectile::ProjectileTunables;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TuningError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("{low_name} ({low}) must be below {high_name} ({high})")]
    Unordered {
        low_name: &'static str,
        low: f32,
        high_name: &'static str,
        high: f32,
    },
}

/// Require `low < high`. NaN fails too.
fn ordered(low_name: &'static str, low: f32, high_name: &'static str, high: f32) -> Result<(), TuningError> {
    if low < high {
        Ok(())
    } else {
        Err(TuningError::Unordered {
            low_name,
            low,
            high_name,
            high,
        })
    }
}

/// Player movement table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    pub radius: f32,
    pub standing_height: f32,
    pub crouch_height: f32,
    /// Per-second decay rate of the height smoothing.
    pub height_smoothing: f32,
    pub walk_speed: f32,
    pub sprint_speed: f32,
    pub ground_accel: f32,
    pub friction: f32,
    pub air_speed: f32,
    pub air_accel: f32,
    pub slide_speed: f32,
    /// Steering accel while sliding.
    pub slide_accel: f32,
    pub slide_duration: f32,
    pub slide_min_speed: f32,
    pub slide_jump_boost: f32,
    pub jump_velocity: f32,
    pub gravity: f32,
    pub coyote_time: f32,
    pub jump_buffer: f32,
    pub throw_cooldown: f32,
    pub pitch_min: f32,
    pub pitch_max: f32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            radius: 0.4,
            standing_height: 1.6,
            crouch_height: 0.9,
            height_smoothing: 12.0,
            walk_speed: 6.0,
            sprint_speed: 9.5,
            ground_accel: 10.0,
            friction: 8.0,
            air_speed: 2.5,
            air_accel: 2.0,
            slide_speed: 14.0,
            slide_accel: 0.8,
            slide_duration: 0.9,
            slide_min_speed: 4.0,
            slide_jump_boost: 1.2,
            jump_velocity: 7.5,
            gravity: 20.0,
            coyote_time: 0.12,
            jump_buffer: 0.12,
            throw_cooldown: 0.35,
            pitch_min: PitchLimits::LOOK.min,
            pitch_max: PitchLimits::LOOK.max,
        }
    }
}

impl PlayerTuning {
    pub fn pitch_limits(&self) -> Result<PitchLimits, CoreError> {
        PitchLimits::new(self.pitch_min, self.pitch_max)
    }
}

/// Type 0: keeps a standoff distance and fires charged orbs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RangedTuning {
    pub move_speed: f32,
    pub radius: f32,
    pub height: f32,
    pub preferred_distance: f32,
    /// Half-width of the standoff window around `preferred_distance`.
    pub distance_tolerance: f32,
    pub charge_duration: f32,
    pub cooldown: f32,
}

impl Default for RangedTuning {
    fn default() -> Self {
        Self {
            move_speed: 3.5,
            radius: 0.5,
            height: 1.5,
            preferred_distance: 4.0,
            distance_tolerance: 1.0,
            charge_duration: 0.8,
            cooldown: 2.0,
        }
    }
}

/// Type 1: closes in and casts a beam.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeamEnemyTuning {
    pub move_speed: f32,
    pub radius: f32,
    pub height: f32,
    pub attack_range: f32,
    /// Stand-still time before the beam spawns.
    pub prep_delay: f32,
    /// Total attack time, prep included.
    pub attack_duration: f32,
    pub cooldown: f32,
}

impl Default for BeamEnemyTuning {
    fn default() -> Self {
        Self {
            move_speed: 4.5,
            radius: 0.6,
            height: 1.8,
            attack_range: 6.0,
            prep_delay: 0.5,
            attack_duration: 1.4,
            cooldown: 2.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyTuning {
    pub detection_radius: f32,
    /// Larger than `detection_radius` so pursuit does not flicker.
    pub exit_radius: f32,
    pub accel: f32,
    pub friction: f32,
    pub gravity: f32,
    pub death_duration: f32,
    pub ranged: RangedTuning,
    pub beam: BeamEnemyTuning,
}

impl Default for EnemyTuning {
    fn default() -> Self {
        Self {
            detection_radius: 15.0,
            exit_radius: 22.0,
            accel: 8.0,
            friction: 6.0,
            gravity: 20.0,
            death_duration: 1.2,
            ranged: RangedTuning::default(),
            beam: BeamEnemyTuning::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileTuning {
    pub gravity: f32,
    pub throw_speed: f32,
    /// Extra upward speed added to a throw.
    pub throw_lift: f32,
    pub thrown: ProjectileTunables,
    pub orb_speed: f32,
    pub orb: ProjectileTunables,
    pub explosion_radius: f32,
    pub explosion_duration: f32,
}

impl Default for ProjectileTuning {
    fn default() -> Self {
        Self {
            gravity: 20.0,
            throw_speed: 18.0,
            throw_lift: 2.0,
            thrown: ProjectileTunables {
                radius: 0.15,
                lifetime: 4.0,
                gravity_scale: 1.0,
                drag: 0.1,
                restitution: 0.6,
                max_bounces: 2,
                collide_with_world: true,
            },
            orb_speed: 12.0,
            orb: ProjectileTunables {
                radius: 0.25,
                lifetime: 5.0,
                gravity_scale: 0.0,
                drag: 0.0,
                restitution: 0.0,
                max_bounces: 0,
                collide_with_world: true,
            },
            explosion_radius: 1.5,
            explosion_duration: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeamTuning {
    pub build_duration: f32,
    /// Longest distance the spawn raycast looks for a wall.
    pub range_cap: f32,
    /// Length multiplier when the raycast finds nothing.
    pub fallback_multiplier: f32,
    pub hit_padding: f32,
    /// Height above the enemy centre the beam starts from.
    pub muzzle_height: f32,
}

impl Default for BeamTuning {
    fn default() -> Self {
        Self {
            build_duration: 0.6,
            range_cap: 50.0,
            fallback_multiplier: 8.0,
            hit_padding: 0.3,
            muzzle_height: 0.3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequencerTuning {
    /// Distance the player must move to leave the intro.
    pub intro_move_epsilon: f32,
    /// Fade alpha change per second.
    pub fade_rate: f32,
    pub restart_dwell: f32,
    /// Distance at which the player collects the mask.
    pub pickup_radius: f32,
}

impl Default for SequencerTuning {
    fn default() -> Self {
        Self {
            intro_move_epsilon: 0.1,
            fade_rate: 1.5,
            restart_dwell: 0.5,
            pickup_radius: 1.2,
        }
    }
}

/// All gameplay tuning. Loaded from `tuning.ron` in the current directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TuningConfig {
    /// Upper bound on a single tick's delta, in seconds.
    pub max_frame_dt: f32,
    pub player: PlayerTuning,
    pub enemy: EnemyTuning,
    pub projectile: ProjectileTuning,
    pub beam: BeamTuning,
    pub sequencer: SequencerTuning,
}

impl Default for TuningConfig {
    fn default() -> Self {
        Self {
            max_frame_dt: DEFAULT_MAX_FRAME_DELTA,
            player: PlayerTuning::default(),
            enemy: EnemyTuning::default(),
            projectile: ProjectileTuning::default(),
            beam: BeamTuning::default(),
            sequencer: SequencerTuning::default(),
        }
    }
}

impl TuningConfig {
    /// Load tuning from `tuning.ron`. If the file is missing or invalid, returns defaults.
    pub fn load() -> Self {
        Self::load_from(&tuning_path())
    }

    pub fn load_from(path: &Path) -> Self {
        let Ok(data) = std::fs::read_to_string(path) else {
            log::warn!("No tuning file at {:?}, using defaults", path);
            return Self::default();
        };
        match Self::from_ron_str(&data) {
            Ok(tuning) => {
                log::info!("Loaded tuning from {:?}", path);
                tuning
            }
            Err(e) => {
                log::warn!("Invalid tuning at {:?}: {}, using defaults", path, e);
                Self::default()
            }
        }
    }

    /// Parse and validate tuning from RON text.
    pub fn from_ron_str(data: &str) -> anyhow::Result<Self> {
        let tuning: Self = ron::from_str(data)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Reject values that would break the simulation's geometry or the
    /// ordering its thresholds rely on.
    pub fn validate(&self) -> Result<(), TuningError> {
        self.player.pitch_limits()?;
        HitCapsule::new(self.player.radius, self.player.crouch_height * 0.5)?;
        HitCapsule::new(self.player.radius, self.player.standing_height * 0.5)?;
        HitCapsule::new(self.enemy.ranged.radius, self.enemy.ranged.height * 0.5)?;
        HitCapsule::new(self.enemy.beam.radius, self.enemy.beam.height * 0.5)?;

        let p = &self.player;
        ordered("zero", 0.0, "walk_speed", p.walk_speed)?;
        ordered("slide_min_speed", p.slide_min_speed, "walk_speed", p.walk_speed)?;
        let e = &self.enemy;
        ordered("detection_radius", e.detection_radius, "exit_radius", e.exit_radius)?;
        Ok(())
    }
}

fn tuning_path() -> PathBuf {
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join("tuning.ron")
}
