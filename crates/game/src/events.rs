//! Outbound simulation events.
//!
//! Systems push events while the tick runs; the host drains them once per
//! frame to drive audio, animation cues and effects.

use glam::Vec3;
use hecs::Entity;

use crate::sequencer::SequencerEvent;

/// What struck the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitSource {
    Orb,
    Explosion,
    Beam,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    ProjectileThrown { position: Vec3, velocity: Vec3 },
    ChargeStarted { enemy: Entity },
    /// Direction points from `origin` to the player at the moment of firing.
    ShotFired { enemy: Entity, origin: Vec3, direction: Vec3 },
    BeamSpawned { enemy: Entity, start: Vec3, end: Vec3 },
    EnemyKilled { enemy: Entity, position: Vec3 },
    /// The renderer should stop drawing this enemy now.
    HideEnemy { enemy: Entity },
    Explosion { position: Vec3 },
    PlayerHit { source: HitSource },
    /// A level was (re)loaded; the host should reset its camera to `spawn_yaw`.
    LevelLoaded { index: usize, spawn_yaw: f32 },
    Sequencer(SequencerEvent),
}

#[derive(Debug, Default)]
pub struct EventQueue {
    events: Vec<SimEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: SimEvent) {
        self.events.push(event);
    }

    /// Take every queued event, oldest first.
    pub fn drain(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SimEvent> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
