//! Enemy state machine.
//!
//! Shared states drive detection and death; the per-type payload in
//! [`EnemyBrain`] carries attack cooldowns and owned beams. Movement goes
//! through the same kinematic controller as the player.

use engine_core::{HitCapsule, Transform};
use glam::Vec3;
use hecs::{Entity, World};
use physics::{move_agent, AgentBody, CollisionQuery, MoveParams};

use crate::beam::BeamAttack;
use crate::config::{BeamTuning, EnemyTuning};
use crate::events::{EventQueue, SimEvent};
use crate::level::{EnemySpawn, EnemyType, InitialState};

/// Aim used when the enemy and player positions coincide.
pub const DEFAULT_AIM_DIRECTION: Vec3 = Vec3::NEG_Z;
/// Beam enemies stop closing in at this horizontal distance.
const BEAM_STOP_DISTANCE: f32 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EnemyState {
    Idle,
    Pursuing,
    /// Type 0: standing still before firing an orb.
    Charging { elapsed: f32 },
    /// Type 1: preparing and casting a beam.
    Attacking { elapsed: f32, beam_fired: bool },
    Dying { elapsed: f32 },
    Dead,
}

impl EnemyState {
    pub fn label(&self) -> &'static str {
        match self {
            EnemyState::Idle => "idle",
            EnemyState::Pursuing => "pursuing",
            EnemyState::Charging { .. } => "charging",
            EnemyState::Attacking { .. } => "attacking",
            EnemyState::Dying { .. } => "dying",
            EnemyState::Dead => "dead",
        }
    }
}

/// Per-type combat payload.
#[derive(Debug, Clone)]
pub enum EnemyBrain {
    Ranged { cooldown: f32 },
    Beam { cooldown: f32, beams: Vec<BeamAttack> },
}

impl EnemyBrain {
    fn cooldown(&self) -> f32 {
        match self {
            EnemyBrain::Ranged { cooldown } | EnemyBrain::Beam { cooldown, .. } => *cooldown,
        }
    }

    fn set_cooldown(&mut self, value: f32) {
        match self {
            EnemyBrain::Ranged { cooldown } | EnemyBrain::Beam { cooldown, .. } => *cooldown = value,
        }
    }
}

/// How a killed enemy leaves the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeathKind {
    /// Plays the death animation, then is hidden.
    Animated,
    /// Hidden immediately.
    Vanished,
}

/// Orb shot requested by a type 0 enemy this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShotRequest {
    pub origin: Vec3,
    pub direction: Vec3,
}

/// Everything an enemy reads about the rest of the world during its update.
pub struct EnemyContext<'a, Q: ?Sized> {
    /// Player origin (eye).
    pub player_position: Vec3,
    pub player_center: Vec3,
    pub tuning: &'a EnemyTuning,
    pub beam: &'a BeamTuning,
    pub query: &'a Q,
    /// False while the level intro holds the AI.
    pub ai_enabled: bool,
}

#[derive(Debug, Clone)]
pub struct Enemy {
    pub state: EnemyState,
    pub capsule: HitCapsule,
    alive: bool,
    brain: EnemyBrain,
}

impl Enemy {
    pub fn new(enemy_type: EnemyType, initial: InitialState, tuning: &EnemyTuning) -> Self {
        let (capsule, brain) = match enemy_type {
            EnemyType::Ranged => (
                HitCapsule::for_agent(tuning.ranged.radius, tuning.ranged.height),
                EnemyBrain::Ranged { cooldown: 0.0 },
            ),
            EnemyType::Beam => (
                HitCapsule::for_agent(tuning.beam.radius, tuning.beam.height),
                EnemyBrain::Beam {
                    cooldown: 0.0,
                    beams: Vec::new(),
                },
            ),
        };
        let state = match initial {
            InitialState::Idle => EnemyState::Idle,
            InitialState::Pursuing => EnemyState::Pursuing,
        };
        Self {
            state,
            capsule,
            alive: true,
            brain,
        }
    }

    pub fn enemy_type(&self) -> EnemyType {
        match self.brain {
            EnemyBrain::Ranged { .. } => EnemyType::Ranged,
            EnemyBrain::Beam { .. } => EnemyType::Beam,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn height(&self) -> f32 {
        self.capsule.half_height * 2.0
    }

    pub fn center(&self, transform: &Transform) -> Vec3 {
        transform.position - Vec3::Y * self.capsule.half_height
    }

    pub fn beams(&self) -> &[BeamAttack] {
        match &self.brain {
            EnemyBrain::Beam { beams, .. } => beams.as_slice(),
            EnemyBrain::Ranged { .. } => &[],
        }
    }

    /// Sphere-vs-capsule test. Dead or dying enemies cannot be hit.
    pub fn is_hit_by(&self, transform: &Transform, point: Vec3, radius: f32) -> bool {
        self.alive && self.capsule.contains_sphere(self.center(transform), point, radius)
    }

    /// Start the death sequence. Returns `None` if the enemy was already
    /// killed, so a second hit in the same tick has no effect.
    pub fn kill(&mut self) -> Option<DeathKind> {
        if !self.alive {
            return None;
        }
        self.alive = false;
        match &mut self.brain {
            EnemyBrain::Ranged { .. } => {
                self.state = EnemyState::Dying { elapsed: 0.0 };
                Some(DeathKind::Animated)
            }
            EnemyBrain::Beam { beams, .. } => {
                beams.clear();
                self.state = EnemyState::Dead;
                Some(DeathKind::Vanished)
            }
        }
    }

    /// Age owned beams and test them against the player. Returns the number
    /// of beams that struck the player this tick.
    pub fn tick_beams(&mut self, dt: f32, player_center: Vec3, player_radius: f32, padding: f32) -> usize {
        let EnemyBrain::Beam { beams, .. } = &mut self.brain else {
            return 0;
        };
        let mut hits = 0;
        for beam in beams.iter_mut() {
            if beam.tick(dt, player_center, player_radius, padding) {
                hits += 1;
            }
        }
        beams.retain(|b| !b.is_finished());
        hits
    }

    fn move_speed(&self, tuning: &EnemyTuning) -> f32 {
        match self.brain {
            EnemyBrain::Ranged { .. } => tuning.ranged.move_speed,
            EnemyBrain::Beam { .. } => tuning.beam.move_speed,
        }
    }

    /// Run one tick of AI and movement. Returns an orb shot when a charge
    /// completes.
    pub fn update<Q: CollisionQuery + ?Sized>(
        &mut self,
        entity: Entity,
        transform: &mut Transform,
        body: &mut AgentBody,
        ctx: &EnemyContext<'_, Q>,
        dt: f32,
        events: &mut EventQueue,
    ) -> Option<ShotRequest> {
        match self.state {
            EnemyState::Dead => return None,
            EnemyState::Dying { elapsed } => {
                let elapsed = elapsed + dt;
                if elapsed >= ctx.tuning.death_duration {
                    self.state = EnemyState::Dead;
                    events.push(SimEvent::HideEnemy { enemy: entity });
                    log::debug!("Enemy {:?} finished dying", entity);
                    return None;
                }
                self.state = EnemyState::Dying { elapsed };
                self.step_motion(transform, body, Vec3::ZERO, 0.0, ctx, dt);
                return None;
            }
            _ => {}
        }
        if !ctx.ai_enabled {
            return None;
        }

        let cooldown = (self.brain.cooldown() - dt).max(0.0);
        self.brain.set_cooldown(cooldown);

        let to_player = ctx.player_position - transform.position;
        let flat = Vec3::new(to_player.x, 0.0, to_player.z);
        let distance = flat.length();
        let toward = flat.normalize_or_zero();

        let mut wish = Vec3::ZERO;
        let mut shot = None;
        let current = self.state;
        let next = match current {
            EnemyState::Idle => {
                if distance < ctx.tuning.detection_radius {
                    EnemyState::Pursuing
                } else {
                    EnemyState::Idle
                }
            }
            EnemyState::Pursuing => {
                if distance > ctx.tuning.exit_radius {
                    EnemyState::Idle
                } else {
                    self.pursue(entity, distance, toward, &mut wish, ctx, events)
                }
            }
            EnemyState::Charging { elapsed } => {
                let elapsed = elapsed + dt;
                if elapsed >= ctx.tuning.ranged.charge_duration {
                    let request = self.fire_orb(entity, transform, ctx, events);
                    shot = Some(request);
                    EnemyState::Pursuing
                } else {
                    EnemyState::Charging { elapsed }
                }
            }
            EnemyState::Attacking {
                elapsed,
                beam_fired,
            } => {
                let elapsed = elapsed + dt;
                let mut beam_fired = beam_fired;
                if !beam_fired && elapsed >= ctx.tuning.beam.prep_delay {
                    self.cast_beam(entity, transform, ctx, events);
                    beam_fired = true;
                }
                if elapsed >= ctx.tuning.beam.attack_duration {
                    self.brain.set_cooldown(ctx.tuning.beam.cooldown);
                    EnemyState::Pursuing
                } else {
                    EnemyState::Attacking {
                        elapsed,
                        beam_fired,
                    }
                }
            }
            other => other,
        };

        if next.label() != current.label() {
            log::debug!(
                "Enemy {:?} ({:?}): {} -> {}",
                entity,
                self.enemy_type(),
                current.label(),
                next.label()
            );
        }
        self.state = next;

        transform.face_towards(ctx.player_position);
        let speed = self.move_speed(ctx.tuning);
        self.step_motion(transform, body, wish, speed, ctx, dt);
        shot
    }

    /// Pursuit movement and attack entry. Returns the next state.
    fn pursue<Q: CollisionQuery + ?Sized>(
        &mut self,
        entity: Entity,
        distance: f32,
        toward: Vec3,
        wish: &mut Vec3,
        ctx: &EnemyContext<'_, Q>,
        events: &mut EventQueue,
    ) -> EnemyState {
        let ready = self.brain.cooldown() <= 0.0;
        match self.brain {
            EnemyBrain::Ranged { .. } => {
                let ranged = &ctx.tuning.ranged;
                if distance > ranged.preferred_distance + ranged.distance_tolerance {
                    *wish = toward;
                } else if distance < ranged.preferred_distance - ranged.distance_tolerance {
                    *wish = -toward;
                } else if ready {
                    events.push(SimEvent::ChargeStarted { enemy: entity });
                    return EnemyState::Charging { elapsed: 0.0 };
                }
                EnemyState::Pursuing
            }
            EnemyBrain::Beam { .. } => {
                if distance <= ctx.tuning.beam.attack_range && ready {
                    return EnemyState::Attacking {
                        elapsed: 0.0,
                        beam_fired: false,
                    };
                }
                if distance > BEAM_STOP_DISTANCE {
                    *wish = toward;
                }
                EnemyState::Pursuing
            }
        }
    }

    fn fire_orb<Q: CollisionQuery + ?Sized>(
        &mut self,
        entity: Entity,
        transform: &Transform,
        ctx: &EnemyContext<'_, Q>,
        events: &mut EventQueue,
    ) -> ShotRequest {
        let origin = self.center(transform);
        let direction = (ctx.player_position - origin)
            .try_normalize()
            .unwrap_or(DEFAULT_AIM_DIRECTION);
        self.brain.set_cooldown(ctx.tuning.ranged.cooldown);
        events.push(SimEvent::ShotFired {
            enemy: entity,
            origin,
            direction,
        });
        ShotRequest { origin, direction }
    }

    fn cast_beam<Q: CollisionQuery + ?Sized>(
        &mut self,
        entity: Entity,
        transform: &Transform,
        ctx: &EnemyContext<'_, Q>,
        events: &mut EventQueue,
    ) {
        let start = self.center(transform) + Vec3::Y * ctx.beam.muzzle_height;
        let beam = BeamAttack::spawn(start, ctx.player_center, ctx.beam, ctx.query);
        events.push(SimEvent::BeamSpawned {
            enemy: entity,
            start,
            end: beam.end(),
        });
        if let EnemyBrain::Beam { beams, .. } = &mut self.brain {
            beams.push(beam);
        }
    }

    fn step_motion<Q: CollisionQuery + ?Sized>(
        &self,
        transform: &mut Transform,
        body: &mut AgentBody,
        wish: Vec3,
        max_speed: f32,
        ctx: &EnemyContext<'_, Q>,
        dt: f32,
    ) {
        let params = MoveParams {
            height: body.height,
            radius: self.capsule.radius,
            wish_direction: wish,
            max_speed,
            accel: ctx.tuning.accel,
            friction: ctx.tuning.friction,
            gravity: ctx.tuning.gravity,
            skidding: false,
        };
        let result = move_agent(transform.position, body.velocity, &params, dt, ctx.query);
        transform.position = result.position;
        body.apply(&result, dt);
    }
}

/// Spawn an enemy entity from a level descriptor.
pub fn spawn_enemy(world: &mut World, spawn: &EnemySpawn, tuning: &EnemyTuning) -> Entity {
    let enemy = Enemy::new(spawn.enemy_type, spawn.initial_state, tuning);
    let height = enemy.height();
    let transform = Transform::from_position(spawn.position + Vec3::Y * height);
    world.spawn((transform, AgentBody::new(height), enemy))
}
