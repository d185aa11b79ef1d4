//! The per-frame game loop.
//!
//! One tick advances, in order: player motion, enemy AI (and the attacks it
//! starts), projectile sweeps with hit tests, beam and effect aging, and
//! finally the level sequencer. Enemies and projectiles live in a hecs
//! [`World`]; level geometry is only reached through [`CollisionQuery`].

use engine_core::{clamp_frame_delta, Transform};
use glam::Vec3;
use hecs::{Entity, World};
use input::InputSnapshot;
use physics::{AgentBody, CollisionQuery};

use crate::config::TuningConfig;
use crate::effects::{EffectsManager, Explosion};
use crate::enemy::{spawn_enemy, DeathKind, Enemy, EnemyContext, EnemyState};
use crate::events::{EventQueue, HitSource, SimEvent};
use crate::level::{EnemyType, LevelConfig, LevelSet};
use crate::player::PlayerMotion;
use crate::projectile::{Projectile, ProjectileFate, ProjectileOwner, ProjectileTunables};
use crate::sequencer::{LevelSequencer, Phase, SequencerEvent};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerView {
    pub transform: Transform,
    pub grounded: bool,
    pub sliding: bool,
    pub horizontal_speed: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemyView {
    pub entity: Entity,
    pub enemy_type: EnemyType,
    pub state: EnemyState,
    pub transform: Transform,
    pub alive: bool,
    /// Animation cue for the current state.
    pub cue: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectileView {
    pub position: Vec3,
    pub radius: f32,
    pub owner: ProjectileOwner,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeamView {
    pub start: Vec3,
    pub end: Vec3,
    pub visible_length: f32,
}

pub struct Simulation {
    tuning: TuningConfig,
    levels: LevelSet,
    world: World,
    player: PlayerMotion,
    sequencer: LevelSequencer,
    effects: EffectsManager,
    events: EventQueue,
    elapsed: f32,
}

impl Simulation {
    pub fn new(tuning: TuningConfig, levels: LevelSet) -> Self {
        let level = levels.current();
        let player = PlayerMotion::new(level.player_spawn, level.player_yaw, &tuning.player);
        let sequencer = LevelSequencer::new(tuning.sequencer.clone(), level.wait_for_movement);
        let mut sim = Self {
            tuning,
            levels,
            world: World::new(),
            player,
            sequencer,
            effects: EffectsManager::new(),
            events: EventQueue::new(),
            elapsed: 0.0,
        };
        sim.load_level();
        sim
    }

    /// Reset the world to the current level's descriptor.
    fn load_level(&mut self) {
        let level = self.levels.current();
        self.world.clear();
        for spawn in &level.enemies {
            spawn_enemy(&mut self.world, spawn, &self.tuning.enemy);
        }
        self.player
            .respawn(level.player_spawn, level.player_yaw, &self.tuning.player);
        self.effects.clear();
        self.sequencer.set_wait_for_movement(level.wait_for_movement);
        log::info!(
            "Loaded level {} '{}' with {} enemies",
            self.levels.index(),
            level.name,
            level.enemies.len()
        );
        self.events.push(SimEvent::LevelLoaded {
            index: self.levels.index(),
            spawn_yaw: level.player_yaw,
        });
    }

    /// Advance the simulation by one frame. Returns the clamped delta that
    /// was actually simulated.
    pub fn tick<Q: CollisionQuery + ?Sized>(&mut self, raw_dt: f32, input: &InputSnapshot, query: &Q) -> f32 {
        let dt = clamp_frame_delta(raw_dt, self.tuning.max_frame_dt);
        if dt <= 0.0 {
            return 0.0;
        }
        self.elapsed += dt;

        self.update_player(input, dt, query);
        self.update_enemies(dt, query);
        self.update_projectiles(dt, query);
        self.update_beams(dt);
        self.effects.update(dt);
        self.update_level(dt);
        dt
    }

    fn update_player<Q: CollisionQuery + ?Sized>(&mut self, input: &InputSnapshot, dt: f32, query: &Q) {
        let frame = self.player.update(input, &self.tuning.player, dt, query);
        if let Some(throw) = frame.throw {
            let p = &self.tuning.projectile;
            let velocity = throw.direction * p.throw_speed + Vec3::Y * p.throw_lift;
            let tunables = p.thrown;
            self.spawn_projectile(throw.origin, velocity, tunables, ProjectileOwner::Player);
            self.events.push(SimEvent::ProjectileThrown {
                position: throw.origin,
                velocity,
            });
        }
    }

    fn update_enemies<Q: CollisionQuery + ?Sized>(&mut self, dt: f32, query: &Q) {
        let ctx = EnemyContext {
            player_position: self.player.position(),
            player_center: self.player.center(),
            tuning: &self.tuning.enemy,
            beam: &self.tuning.beam,
            query,
            ai_enabled: self.sequencer.gameplay_unlocked(),
        };
        let mut shots = Vec::new();
        for (entity, (transform, body, enemy)) in self
            .world
            .query_mut::<(&mut Transform, &mut AgentBody, &mut Enemy)>()
        {
            if let Some(shot) = enemy.update(entity, transform, body, &ctx, dt, &mut self.events) {
                shots.push(shot);
            }
        }

        let orb = self.tuning.projectile.orb;
        let speed = self.tuning.projectile.orb_speed;
        for shot in shots {
            self.spawn_projectile(shot.origin, shot.direction * speed, orb, ProjectileOwner::Enemy);
        }
    }

    fn update_projectiles<Q: CollisionQuery + ?Sized>(&mut self, dt: f32, query: &Q) {
        let gravity = self.tuning.projectile.gravity;
        let mut thrown = Vec::new();
        let mut orbs = Vec::new();
        let mut detonations = Vec::new();
        for (entity, projectile) in self.world.query_mut::<&mut Projectile>() {
            let fate = projectile.tick(dt, gravity, query);
            match (projectile.owner, fate) {
                (ProjectileOwner::Player, ProjectileFate::Alive) => {
                    thrown.push((entity, projectile.position, projectile.radius()))
                }
                (ProjectileOwner::Enemy, ProjectileFate::Alive) => {
                    orbs.push((entity, projectile.position, projectile.radius()))
                }
                (ProjectileOwner::Enemy, ProjectileFate::Stopped { point }) => detonations.push(point),
                (ProjectileOwner::Enemy, ProjectileFate::Expired) => detonations.push(projectile.position),
                (ProjectileOwner::Player, _) => {}
            }
        }

        // Each thrown projectile kills at most one enemy.
        for (projectile_entity, point, radius) in thrown {
            let mut killed = None;
            for (entity, (transform, enemy)) in self.world.query_mut::<(&Transform, &mut Enemy)>() {
                if !enemy.is_hit_by(transform, point, radius) {
                    continue;
                }
                if let Some(kind) = enemy.kill() {
                    killed = Some((entity, transform.position, kind));
                }
                break;
            }
            let Some((enemy, position, kind)) = killed else {
                continue;
            };
            log::info!("Enemy {:?} killed at {:?} ({:?})", enemy, position, kind);
            self.consume_projectile(projectile_entity);
            self.events.push(SimEvent::EnemyKilled { enemy, position });
            if kind == DeathKind::Vanished {
                self.events.push(SimEvent::HideEnemy { enemy });
            }
        }

        let capsule = self.player.hit_capsule();
        let center = self.player.center();
        for (entity, position, radius) in orbs {
            if capsule.contains_sphere(center, position, radius) {
                self.consume_projectile(entity);
                self.detonate(position, false);
                self.hit_player(HitSource::Orb);
            }
        }
        for position in detonations {
            self.detonate(position, true);
        }

        let spent: Vec<Entity> = self
            .world
            .query_mut::<&Projectile>()
            .into_iter()
            .filter(|(_, p)| !p.is_alive())
            .map(|(e, _)| e)
            .collect();
        for entity in spent {
            self.world.despawn(entity).ok();
        }
    }

    fn update_beams(&mut self, dt: f32) {
        let center = self.player.center();
        let radius = self.player.radius();
        let padding = self.tuning.beam.hit_padding;
        let mut hits = 0;
        for (_, enemy) in self.world.query_mut::<&mut Enemy>() {
            hits += enemy.tick_beams(dt, center, radius, padding);
        }
        for _ in 0..hits {
            self.hit_player(HitSource::Beam);
        }
    }

    fn update_level(&mut self, dt: f32) {
        if self.sequencer.phase() == Phase::EnemyDefeated {
            let feet = self.player.position() - Vec3::Y * self.player.height();
            let pickup = self.levels.current().pickup_position;
            if feet.distance(pickup) <= self.tuning.sequencer.pickup_radius {
                log::info!("Mask picked up");
                self.sequencer.trigger_mask_pickup();
            }
        }

        let finished: Vec<Entity> = self
            .world
            .query_mut::<&Enemy>()
            .into_iter()
            .filter(|(_, e)| e.state == EnemyState::Dead)
            .map(|(e, _)| e)
            .collect();
        for entity in finished {
            self.world.despawn(entity).ok();
        }

        let all_dead = self
            .world
            .query_mut::<&Enemy>()
            .into_iter()
            .all(|(_, e)| !e.is_alive());
        let Some(event) = self.sequencer.tick(dt, self.player.position(), all_dead) else {
            return;
        };
        self.events.push(SimEvent::Sequencer(event));
        match event {
            SequencerEvent::RestartLevel => self.load_level(),
            SequencerEvent::AdvanceLevel => {
                self.levels.advance();
                self.load_level();
            }
            SequencerEvent::CombatStarted
            | SequencerEvent::EnemiesDefeated
            | SequencerEvent::IntroResumed => {}
        }
    }

    fn consume_projectile(&mut self, entity: Entity) {
        if let Ok(mut projectile) = self.world.get::<&mut Projectile>(entity) {
            projectile.consume();
        }
    }

    /// Spawn an explosion cue and effect. `damaging` explosions also test
    /// the player.
    fn detonate(&mut self, position: Vec3, damaging: bool) {
        let radius = self.tuning.projectile.explosion_radius;
        let duration = self.tuning.projectile.explosion_duration;
        self.effects.spawn_explosion(position, radius, duration);
        self.events.push(SimEvent::Explosion { position });
        if damaging
            && self
                .player
                .hit_capsule()
                .contains_sphere(self.player.center(), position, radius)
        {
            self.hit_player(HitSource::Explosion);
        }
    }

    fn hit_player(&mut self, source: HitSource) {
        log::info!("Player hit by {:?}", source);
        self.events.push(SimEvent::PlayerHit { source });
        self.sequencer.trigger_player_death();
    }

    pub fn spawn_projectile(
        &mut self,
        position: Vec3,
        velocity: Vec3,
        tunables: ProjectileTunables,
        owner: ProjectileOwner,
    ) -> Entity {
        self.world
            .spawn((Projectile::spawn(position, velocity, tunables, owner),))
    }

    /// Fire the mask pickup from the host. Returns false outside the
    /// enemy-defeated phase.
    pub fn trigger_mask_pickup(&mut self) -> bool {
        self.sequencer.trigger_mask_pickup()
    }

    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        self.events.drain()
    }

    pub fn tuning(&self) -> &TuningConfig {
        &self.tuning
    }

    pub fn player(&self) -> &PlayerMotion {
        &self.player
    }

    pub fn player_view(&self) -> PlayerView {
        PlayerView {
            transform: self.player.transform,
            grounded: self.player.is_grounded(),
            sliding: self.player.is_sliding(),
            horizontal_speed: self.player.horizontal_speed(),
            height: self.player.height(),
        }
    }

    pub fn enemies(&self) -> Vec<EnemyView> {
        self.world
            .query::<(&Transform, &Enemy)>()
            .iter()
            .map(|(entity, (transform, enemy))| EnemyView {
                entity,
                enemy_type: enemy.enemy_type(),
                state: enemy.state,
                transform: *transform,
                alive: enemy.is_alive(),
                cue: enemy.state.label(),
            })
            .collect()
    }

    pub fn projectiles(&self) -> Vec<ProjectileView> {
        self.world
            .query::<&Projectile>()
            .iter()
            .map(|(_, p)| ProjectileView {
                position: p.position,
                radius: p.radius(),
                owner: p.owner,
            })
            .collect()
    }

    pub fn beams(&self) -> Vec<BeamView> {
        let mut views = Vec::new();
        for (_, enemy) in self.world.query::<&Enemy>().iter() {
            views.extend(enemy.beams().iter().map(|beam| BeamView {
                start: beam.start(),
                end: beam.end(),
                visible_length: beam.visible_length(),
            }));
        }
        views
    }

    pub fn explosions(&self) -> &[Explosion] {
        &self.effects.explosions
    }

    pub fn phase(&self) -> Phase {
        self.sequencer.phase()
    }

    pub fn fade_alpha(&self) -> f32 {
        self.sequencer.fade_alpha()
    }

    pub fn level_index(&self) -> usize {
        self.levels.index()
    }

    pub fn current_level(&self) -> &LevelConfig {
        self.levels.current()
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }
}
