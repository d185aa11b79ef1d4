//! Player movement: walking, sprinting, crouch-sliding and jumping on top
//! of the shared kinematic controller.

use engine_core::{HitCapsule, PitchLimits, Transform};
use glam::Vec3;
use input::InputSnapshot;
use physics::{move_agent, AgentBody, CollisionQuery, MoveParams};

use crate::config::PlayerTuning;

/// A jump only starts if the player is not already rising faster than this.
pub const JUMP_MAX_RISING_SPEED: f32 = 0.1;
/// Thrown projectiles spawn this far in front of the eye.
const THROW_SPAWN_OFFSET: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MotionState {
    Grounded,
    Sliding { remaining: f32 },
    Airborne,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThrowRequest {
    pub origin: Vec3,
    pub direction: Vec3,
}

/// Discrete results of one player update.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlayerFrame {
    pub jumped: bool,
    pub throw: Option<ThrowRequest>,
}

#[derive(Debug, Clone)]
pub struct PlayerMotion {
    pub transform: Transform,
    pub body: AgentBody,
    state: MotionState,
    /// Cleared when a slide ends; crouch must be released to slide again.
    slide_ready: bool,
    throw_cooldown: f32,
    radius: f32,
    pitch_limits: PitchLimits,
}

impl PlayerMotion {
    /// Place the player with feet at `feet`, facing `yaw`.
    pub fn new(feet: Vec3, yaw: f32, tuning: &PlayerTuning) -> Self {
        Self {
            transform: Transform::from_position_yaw(feet + Vec3::Y * tuning.standing_height, yaw),
            body: AgentBody::new(tuning.standing_height),
            state: MotionState::Grounded,
            slide_ready: true,
            throw_cooldown: 0.0,
            radius: tuning.radius,
            pitch_limits: tuning.pitch_limits().unwrap_or_default(),
        }
    }

    pub fn respawn(&mut self, feet: Vec3, yaw: f32, tuning: &PlayerTuning) {
        *self = Self::new(feet, yaw, tuning);
    }

    /// Eye position.
    pub fn position(&self) -> Vec3 {
        self.transform.position
    }

    pub fn center(&self) -> Vec3 {
        self.transform.position - Vec3::Y * (self.body.height * 0.5)
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn height(&self) -> f32 {
        self.body.height
    }

    pub fn hit_capsule(&self) -> HitCapsule {
        HitCapsule::for_agent(self.radius, self.body.height)
    }

    pub fn motion_state(&self) -> MotionState {
        self.state
    }

    pub fn is_grounded(&self) -> bool {
        self.body.grounded
    }

    pub fn is_sliding(&self) -> bool {
        matches!(self.state, MotionState::Sliding { .. })
    }

    pub fn horizontal_speed(&self) -> f32 {
        self.body.horizontal_speed()
    }

    pub fn update<Q: CollisionQuery + ?Sized>(
        &mut self,
        input: &InputSnapshot,
        tuning: &PlayerTuning,
        dt: f32,
        query: &Q,
    ) -> PlayerFrame {
        let mut frame = PlayerFrame::default();

        self.transform.yaw = input.yaw;
        self.transform.set_pitch(input.pitch, self.pitch_limits);
        self.throw_cooldown = (self.throw_cooldown - dt).max(0.0);
        if input.jump_requested {
            self.body.jump_buffer = tuning.jump_buffer;
        }
        if !input.crouch_held {
            self.slide_ready = true;
        }

        self.update_slide(input, tuning, dt);

        if self.try_jump(tuning) {
            frame.jumped = true;
        } else {
            self.body.jump_buffer = (self.body.jump_buffer - dt).max(0.0);
        }

        let (max_speed, accel, skidding) = match self.state {
            MotionState::Airborne => (tuning.air_speed, tuning.air_accel, false),
            MotionState::Sliding { .. } => (tuning.slide_speed, tuning.slide_accel, true),
            MotionState::Grounded => {
                let speed = if input.sprint_held {
                    tuning.sprint_speed
                } else {
                    tuning.walk_speed
                };
                (speed, tuning.ground_accel, false)
            }
        };

        // Smooth towards the target height, keeping the feet planted while grounded.
        let target_height = if self.is_sliding() {
            tuning.crouch_height
        } else {
            tuning.standing_height
        };
        let old_height = self.body.height;
        let new_height =
            old_height + (target_height - old_height) * (1.0 - (-tuning.height_smoothing * dt).exp());
        if self.body.grounded {
            self.transform.position.y += new_height - old_height;
        }
        self.body.height = new_height;

        let params = MoveParams {
            height: new_height,
            radius: self.radius,
            wish_direction: input.wish_direction(),
            max_speed,
            accel,
            friction: tuning.friction,
            gravity: tuning.gravity,
            skidding,
        };
        let result = move_agent(self.transform.position, self.body.velocity, &params, dt, query);
        self.transform.position = result.position;
        self.body.apply(&result, dt);

        self.state = match self.state {
            MotionState::Airborne if self.body.grounded => MotionState::Grounded,
            MotionState::Grounded | MotionState::Sliding { .. } if !self.body.grounded => {
                MotionState::Airborne
            }
            state => state,
        };

        if input.throw_requested && self.throw_cooldown <= 0.0 {
            self.throw_cooldown = tuning.throw_cooldown;
            let direction = self.transform.forward();
            frame.throw = Some(ThrowRequest {
                origin: self.transform.position + direction * THROW_SPAWN_OFFSET,
                direction,
            });
        }

        frame
    }

    fn update_slide(&mut self, input: &InputSnapshot, tuning: &PlayerTuning, dt: f32) {
        let speed = self.body.horizontal_speed();
        match self.state {
            MotionState::Grounded => {
                if self.slide_ready
                    && input.crouch_held
                    && input.sprint_held
                    && self.body.grounded
                    && speed > tuning.walk_speed
                {
                    let scale = tuning.slide_speed / speed;
                    self.body.velocity.x *= scale;
                    self.body.velocity.z *= scale;
                    self.slide_ready = false;
                    self.state = MotionState::Sliding {
                        remaining: tuning.slide_duration,
                    };
                    log::debug!("Slide started at {:.2} m/s", speed);
                }
            }
            MotionState::Sliding { remaining } => {
                let remaining = remaining - dt;
                if !input.crouch_held
                    || remaining <= 0.0
                    || speed < tuning.slide_min_speed
                    || !self.body.grounded
                {
                    self.state = if self.body.grounded {
                        MotionState::Grounded
                    } else {
                        MotionState::Airborne
                    };
                    log::debug!("Slide ended at {:.2} m/s", speed);
                } else {
                    self.state = MotionState::Sliding { remaining };
                }
            }
            MotionState::Airborne => {}
        }
    }

    /// Consume a buffered jump if the player may leave the ground.
    fn try_jump(&mut self, tuning: &PlayerTuning) -> bool {
        let can_leave_ground =
            self.body.grounded || self.body.time_since_grounded <= tuning.coyote_time;
        if self.body.jump_buffer <= 0.0
            || !can_leave_ground
            || self.body.velocity.y > JUMP_MAX_RISING_SPEED
        {
            return false;
        }

        let boost = if self.is_sliding() {
            tuning.slide_jump_boost
        } else {
            1.0
        };
        self.body.velocity.y = tuning.jump_velocity * boost;
        self.body.velocity.x *= boost;
        self.body.velocity.z *= boost;
        self.body.jump_buffer = 0.0;
        self.body.grounded = false;
        // No second jump from the same coyote window.
        self.body.time_since_grounded = f32::INFINITY;
        self.state = MotionState::Airborne;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use physics::CollisionWorld;

    const DT: f32 = 1.0 / 60.0;

    fn forward() -> InputSnapshot {
        InputSnapshot {
            move_forward: true,
            ..Default::default()
        }
    }

    fn slide_input() -> InputSnapshot {
        InputSnapshot {
            move_forward: true,
            sprint_held: true,
            crouch_held: true,
            ..Default::default()
        }
    }

    fn run(player: &mut PlayerMotion, input: &InputSnapshot, ticks: usize, world: &CollisionWorld) {
        let tuning = PlayerTuning::default();
        for _ in 0..ticks {
            player.update(input, &tuning, DT, world);
        }
    }

    #[test]
    fn stands_on_fallback_floor() {
        let world = CollisionWorld::new();
        let tuning = PlayerTuning::default();
        let mut player = PlayerMotion::new(Vec3::ZERO, 0.0, &tuning);
        run(&mut player, &InputSnapshot::default(), 30, &world);
        assert!(player.is_grounded());
        assert!((player.position().y - tuning.standing_height).abs() < 1e-5);
        assert_eq!(player.motion_state(), MotionState::Grounded);
    }

    #[test]
    fn walk_and_sprint_reach_their_speeds() {
        let world = CollisionWorld::new();
        let tuning = PlayerTuning::default();
        let mut player = PlayerMotion::new(Vec3::ZERO, 0.0, &tuning);
        run(&mut player, &forward(), 120, &world);
        assert!((player.horizontal_speed() - tuning.walk_speed).abs() < 1e-3);
        assert!(player.position().z < -5.0);

        let sprint = InputSnapshot {
            sprint_held: true,
            ..forward()
        };
        run(&mut player, &sprint, 120, &world);
        assert!((player.horizontal_speed() - tuning.sprint_speed).abs() < 1e-3);
    }

    #[test]
    fn jump_from_ground() {
        let world = CollisionWorld::new();
        let tuning = PlayerTuning::default();
        let mut player = PlayerMotion::new(Vec3::ZERO, 0.0, &tuning);
        let jump = InputSnapshot {
            jump_requested: true,
            ..Default::default()
        };
        let frame = player.update(&jump, &tuning, DT, &world);
        assert!(frame.jumped);
        assert!(!player.is_grounded());
        assert_eq!(player.motion_state(), MotionState::Airborne);
        assert!((player.body.velocity.y - (tuning.jump_velocity - tuning.gravity * DT)).abs() < 1e-4);
    }

    /// A jump request while already rising fast is ignored.
    #[test]
    fn jump_ignored_while_rising() {
        let world = CollisionWorld::new();
        let tuning = PlayerTuning::default();
        let mut player = PlayerMotion::new(Vec3::ZERO, 0.0, &tuning);
        player.body.velocity.y = 3.0;
        let jump = InputSnapshot {
            jump_requested: true,
            ..Default::default()
        };
        let frame = player.update(&jump, &tuning, DT, &world);
        assert!(!frame.jumped);
        assert!(player.body.velocity.y < 3.0);
    }

    #[test]
    fn coyote_time_allows_late_jump() {
        let world = CollisionWorld::new();
        let tuning = PlayerTuning::default();
        let jump = InputSnapshot {
            jump_requested: true,
            ..Default::default()
        };

        let mut player = PlayerMotion::new(Vec3::new(0.0, 10.0, 0.0), 0.0, &tuning);
        player.body.grounded = false;
        player.body.time_since_grounded = 0.05;
        assert!(player.update(&jump, &tuning, DT, &world).jumped);

        let mut late = PlayerMotion::new(Vec3::new(0.0, 10.0, 0.0), 0.0, &tuning);
        late.body.grounded = false;
        late.body.time_since_grounded = 0.3;
        assert!(!late.update(&jump, &tuning, DT, &world).jumped);
    }

    #[test]
    fn buffered_jump_fires_on_landing() {
        let world = CollisionWorld::new();
        let tuning = PlayerTuning::default();
        let mut player = PlayerMotion::new(Vec3::new(0.0, 0.2, 0.0), 0.0, &tuning);
        player.body.grounded = false;
        player.body.time_since_grounded = 1.0;
        player.body.velocity.y = -3.0;
        player.state = MotionState::Airborne;

        let press = InputSnapshot {
            jump_requested: true,
            ..Default::default()
        };
        assert!(!player.update(&press, &tuning, DT, &world).jumped);

        let mut jumped_on = None;
        for tick in 1..6 {
            if player.update(&InputSnapshot::default(), &tuning, DT, &world).jumped {
                jumped_on = Some(tick);
                break;
            }
        }
        assert!(jumped_on.is_some());
    }

    #[test]
    fn slide_rescales_speed_and_lowers_height() {
        let world = CollisionWorld::new();
        let tuning = PlayerTuning::default();
        let mut player = PlayerMotion::new(Vec3::ZERO, 0.0, &tuning);
        player.body.velocity = Vec3::new(0.0, 0.0, -tuning.sprint_speed);

        player.update(&slide_input(), &tuning, DT, &world);
        assert!(player.is_sliding());
        assert!((player.horizontal_speed() - tuning.slide_speed).abs() < 1e-3);
        assert!(player.body.velocity.z < 0.0);

        // Height eases down instead of snapping, feet stay on the floor.
        let h = player.height();
        assert!(h < tuning.standing_height && h > tuning.crouch_height);
        assert!(player.is_grounded());
        assert!((player.position().y - h).abs() < 1e-5);
    }

    #[test]
    fn slide_ends_after_duration_and_needs_crouch_release() {
        let world = CollisionWorld::new();
        let tuning = PlayerTuning::default();
        let mut player = PlayerMotion::new(Vec3::ZERO, 0.0, &tuning);
        player.body.velocity = Vec3::new(0.0, 0.0, -tuning.sprint_speed);

        player.update(&slide_input(), &tuning, DT, &world);
        assert!(player.is_sliding());
        let mut ticks = 1;
        while player.is_sliding() {
            player.update(&slide_input(), &tuning, DT, &world);
            ticks += 1;
            assert!(ticks < 100);
        }
        let expected = (tuning.slide_duration / DT).round() as i32;
        assert!((ticks - expected).abs() <= 2, "slid for {} ticks", ticks);

        // Still holding crouch: no immediate second slide.
        run(&mut player, &slide_input(), 10, &world);
        assert!(!player.is_sliding());

        let release = InputSnapshot {
            crouch_held: false,
            ..slide_input()
        };
        player.update(&release, &tuning, DT, &world);
        player.update(&slide_input(), &tuning, DT, &world);
        assert!(player.is_sliding());
    }

    /// Entry needs more than walk speed; once sliding the player keeps
    /// sliding down to the minimum slide speed.
    #[test]
    fn slide_threshold_hysteresis() {
        let world = CollisionWorld::new();
        let tuning = PlayerTuning::default();
        let hold = InputSnapshot {
            sprint_held: true,
            crouch_held: true,
            ..Default::default()
        };

        let mut player = PlayerMotion::new(Vec3::ZERO, 0.0, &tuning);
        for _ in 0..30 {
            player.body.velocity = Vec3::new(tuning.walk_speed, 0.0, 0.0);
            player.update(&hold, &tuning, DT, &world);
            assert!(!player.is_sliding());
        }

        player.body.velocity = Vec3::new(tuning.walk_speed + 1.0, 0.0, 0.0);
        player.update(&hold, &tuning, DT, &world);
        assert!(player.is_sliding());

        player.body.velocity = Vec3::new(tuning.slide_min_speed + 0.5, 0.0, 0.0);
        player.update(&hold, &tuning, DT, &world);
        assert!(player.is_sliding());

        player.body.velocity = Vec3::new(tuning.slide_min_speed - 0.1, 0.0, 0.0);
        player.update(&hold, &tuning, DT, &world);
        assert!(!player.is_sliding());
    }

    #[test]
    fn slide_jump_boosts_momentum() {
        let world = CollisionWorld::new();
        let tuning = PlayerTuning::default();
        let mut player = PlayerMotion::new(Vec3::ZERO, 0.0, &tuning);
        player.body.velocity = Vec3::new(0.0, 0.0, -tuning.sprint_speed);
        player.update(&slide_input(), &tuning, DT, &world);
        assert!(player.is_sliding());

        let jump = InputSnapshot {
            jump_requested: true,
            ..slide_input()
        };
        let frame = player.update(&jump, &tuning, DT, &world);
        assert!(frame.jumped);
        assert!(!player.is_sliding());
        let boosted = tuning.slide_speed * tuning.slide_jump_boost;
        assert!((player.horizontal_speed() - boosted).abs() < 1e-2);
        let vy = tuning.jump_velocity * tuning.slide_jump_boost - tuning.gravity * DT;
        assert!((player.body.velocity.y - vy).abs() < 1e-3);
    }

    #[test]
    fn throw_respects_cooldown() {
        let world = CollisionWorld::new();
        let tuning = PlayerTuning::default();
        let mut player = PlayerMotion::new(Vec3::ZERO, 0.0, &tuning);
        let throw = InputSnapshot {
            throw_requested: true,
            ..Default::default()
        };
        let first = player.update(&throw, &tuning, DT, &world).throw.unwrap();
        assert!(first.direction.distance(Vec3::NEG_Z) < 1e-5);
        assert!(player.update(&throw, &tuning, DT, &world).throw.is_none());

        run(&mut player, &InputSnapshot::default(), 30, &world);
        assert!(player.update(&throw, &tuning, DT, &world).throw.is_some());
    }
}
