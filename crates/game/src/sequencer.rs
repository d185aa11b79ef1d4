//! Level flow: intro hold, combat, victory, and the fade-to-black transition
//! that restarts or advances the level.

use glam::Vec3;

use crate::config::SequencerTuning;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for the player to move. AI is held.
    Intro,
    Playing,
    /// Every enemy is down; waiting for the mask pickup.
    EnemyDefeated,
    FadeOut,
    /// Screen is black; the level is reloaded here.
    Restarting,
    FadeIn,
}

/// Why the screen faded out, which decides the level transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadeReason {
    PlayerDeath,
    MaskPickup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerEvent {
    CombatStarted,
    EnemiesDefeated,
    RestartLevel,
    AdvanceLevel,
    IntroResumed,
}

#[derive(Debug, Clone)]
pub struct LevelSequencer {
    phase: Phase,
    phase_timer: f32,
    fade_alpha: f32,
    fade_reason: Option<FadeReason>,
    /// Player position recorded on the first intro tick.
    intro_anchor: Option<Vec3>,
    wait_for_movement: bool,
    /// Armed on entering `Restarting`, consumed by the level transition.
    transition_armed: bool,
    tuning: SequencerTuning,
}

impl LevelSequencer {
    pub fn new(tuning: SequencerTuning, wait_for_movement: bool) -> Self {
        Self {
            phase: Phase::Intro,
            phase_timer: 0.0,
            fade_alpha: 0.0,
            fade_reason: None,
            intro_anchor: None,
            wait_for_movement,
            transition_armed: false,
            tuning,
        }
    }

    /// Takes effect on the next intro.
    pub fn set_wait_for_movement(&mut self, wait: bool) {
        self.wait_for_movement = wait;
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn phase_timer(&self) -> f32 {
        self.phase_timer
    }

    /// 0 is fully visible, 1 is black.
    pub fn fade_alpha(&self) -> f32 {
        self.fade_alpha
    }

    pub fn fade_reason(&self) -> Option<FadeReason> {
        self.fade_reason
    }

    /// Whether enemy AI runs this frame.
    pub fn gameplay_unlocked(&self) -> bool {
        matches!(self.phase, Phase::Playing | Phase::EnemyDefeated | Phase::FadeOut)
    }

    fn set_phase(&mut self, phase: Phase) {
        log::info!("Level phase: {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
        self.phase_timer = 0.0;
    }

    /// Advance one frame. At most one event is produced per tick.
    pub fn tick(&mut self, dt: f32, player_position: Vec3, all_enemies_dead: bool) -> Option<SequencerEvent> {
        self.phase_timer += dt;
        match self.phase {
            Phase::Intro => {
                let anchor = *self.intro_anchor.get_or_insert(player_position);
                let moved = player_position.distance(anchor) > self.tuning.intro_move_epsilon;
                if !self.wait_for_movement || moved {
                    self.set_phase(Phase::Playing);
                    return Some(SequencerEvent::CombatStarted);
                }
                None
            }
            Phase::Playing => {
                if all_enemies_dead {
                    self.set_phase(Phase::EnemyDefeated);
                    return Some(SequencerEvent::EnemiesDefeated);
                }
                None
            }
            Phase::EnemyDefeated => None,
            Phase::FadeOut => {
                self.fade_alpha = (self.fade_alpha + self.tuning.fade_rate * dt).clamp(0.0, 1.0);
                if self.fade_alpha >= 1.0 {
                    self.set_phase(Phase::Restarting);
                    self.transition_armed = true;
                }
                None
            }
            Phase::Restarting => {
                let event = if self.transition_armed {
                    self.transition_armed = false;
                    Some(match self.fade_reason {
                        Some(FadeReason::MaskPickup) => SequencerEvent::AdvanceLevel,
                        Some(FadeReason::PlayerDeath) | None => SequencerEvent::RestartLevel,
                    })
                } else {
                    None
                };
                if self.phase_timer >= self.tuning.restart_dwell {
                    self.set_phase(Phase::FadeIn);
                }
                event
            }
            Phase::FadeIn => {
                self.fade_alpha = (self.fade_alpha - self.tuning.fade_rate * dt).clamp(0.0, 1.0);
                if self.fade_alpha <= 0.0 {
                    self.set_phase(Phase::Intro);
                    self.intro_anchor = None;
                    self.fade_reason = None;
                    return Some(SequencerEvent::IntroResumed);
                }
                None
            }
        }
    }

    /// Start the fade to the next level. Only valid once every enemy is down.
    pub fn trigger_mask_pickup(&mut self) -> bool {
        if self.phase != Phase::EnemyDefeated {
            return false;
        }
        self.begin_fade(FadeReason::MaskPickup);
        true
    }

    /// Start the fade to a restart. Ignored while a transition is running.
    pub fn trigger_player_death(&mut self) -> bool {
        if !matches!(self.phase, Phase::Intro | Phase::Playing | Phase::EnemyDefeated) {
            return false;
        }
        self.begin_fade(FadeReason::PlayerDeath);
        true
    }

    fn begin_fade(&mut self, reason: FadeReason) {
        self.fade_reason = Some(reason);
        self.set_phase(Phase::FadeOut);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn sequencer() -> LevelSequencer {
        LevelSequencer::new(SequencerTuning::default(), true)
    }

    fn run_until(seq: &mut LevelSequencer, phase: Phase, events: &mut Vec<SequencerEvent>) {
        let mut ticks = 0;
        while seq.phase() != phase {
            if let Some(event) = seq.tick(DT, Vec3::ZERO, true) {
                events.push(event);
            }
            ticks += 1;
            assert!(ticks < 10_000, "never reached {:?}", phase);
        }
    }

    #[test]
    fn intro_waits_for_player_movement() {
        let mut seq = sequencer();
        let spawn = Vec3::new(1.0, 1.6, 2.0);
        for _ in 0..5 {
            assert_eq!(seq.tick(DT, spawn, false), None);
            assert_eq!(seq.phase(), Phase::Intro);
            assert!(!seq.gameplay_unlocked());
        }
        let event = seq.tick(DT, spawn + Vec3::new(0.2, 0.0, 0.0), false);
        assert_eq!(event, Some(SequencerEvent::CombatStarted));
        assert_eq!(seq.phase(), Phase::Playing);
        assert!(seq.gameplay_unlocked());
    }

    #[test]
    fn intro_skipped_without_movement_gate() {
        let mut seq = LevelSequencer::new(SequencerTuning::default(), false);
        assert_eq!(seq.tick(DT, Vec3::ZERO, false), Some(SequencerEvent::CombatStarted));
        assert_eq!(seq.phase(), Phase::Playing);
    }

    #[test]
    fn fade_alpha_stays_in_unit_range() {
        let mut seq = sequencer();
        seq.tick(DT, Vec3::ZERO, false);
        assert!(seq.trigger_player_death());
        seq.tick(10.0, Vec3::ZERO, false);
        assert_eq!(seq.fade_alpha(), 1.0);
        assert_eq!(seq.phase(), Phase::Restarting);
        seq.tick(10.0, Vec3::ZERO, false);
        assert_eq!(seq.phase(), Phase::FadeIn);
        seq.tick(10.0, Vec3::ZERO, false);
        assert_eq!(seq.fade_alpha(), 0.0);
        assert_eq!(seq.phase(), Phase::Intro);
    }

    #[test]
    fn death_restarts_exactly_once() {
        let mut seq = sequencer();
        seq.tick(DT, Vec3::ZERO, false);
        seq.trigger_player_death();

        let mut events = Vec::new();
        run_until(&mut seq, Phase::Intro, &mut events);
        assert_eq!(
            events,
            vec![SequencerEvent::RestartLevel, SequencerEvent::IntroResumed]
        );
        assert_eq!(seq.fade_reason(), None);
        assert_eq!(seq.fade_alpha(), 0.0);
    }

    #[test]
    fn pickup_after_victory_advances() {
        let mut seq = sequencer();
        seq.tick(DT, Vec3::ZERO, false);
        seq.tick(DT, Vec3::X, false);
        assert!(!seq.trigger_mask_pickup());

        assert_eq!(seq.tick(DT, Vec3::X, true), Some(SequencerEvent::EnemiesDefeated));
        assert_eq!(seq.phase(), Phase::EnemyDefeated);
        assert!(seq.trigger_mask_pickup());
        assert_eq!(seq.fade_reason(), Some(FadeReason::MaskPickup));

        let mut events = Vec::new();
        run_until(&mut seq, Phase::Intro, &mut events);
        assert_eq!(
            events,
            vec![SequencerEvent::AdvanceLevel, SequencerEvent::IntroResumed]
        );
    }

    #[test]
    fn triggers_ignored_during_transition() {
        let mut seq = sequencer();
        seq.tick(DT, Vec3::ZERO, false);
        assert!(seq.trigger_player_death());
        assert!(!seq.trigger_player_death());
        assert!(!seq.trigger_mask_pickup());

        let mut events = Vec::new();
        run_until(&mut seq, Phase::Restarting, &mut events);
        assert!(!seq.trigger_player_death());
        run_until(&mut seq, Phase::FadeIn, &mut events);
        assert!(!seq.trigger_player_death());
        assert_eq!(seq.fade_reason(), Some(FadeReason::PlayerDeath));
    }

    #[test]
    fn intro_anchor_resets_after_fade_in() {
        let mut seq = sequencer();
        seq.tick(DT, Vec3::ZERO, false);
        seq.trigger_player_death();
        let mut events = Vec::new();
        run_until(&mut seq, Phase::Intro, &mut events);

        // New spawn point far from the old anchor does not count as movement.
        let respawn = Vec3::new(50.0, 1.6, 50.0);
        seq.tick(DT, respawn, false);
        seq.tick(DT, respawn, false);
        assert_eq!(seq.phase(), Phase::Intro);
    }
}
