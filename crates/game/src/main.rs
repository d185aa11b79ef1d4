//! Headless driver: runs the simulation against a small walled arena with a
//! scripted player and logs what happens.

use std::path::Path;

use anyhow::{Context, Result};
use engine_core::FrameClock;
use game::{LevelSet, SimEvent, Simulation, TuningConfig};
use glam::{Vec2, Vec3};
use input::{Action, InputState};
use physics::{CollisionWorld, MeshId};

const TICK_RATE: f32 = 60.0;
const RUN_SECONDS: f32 = 40.0;
const ARENA_HALF_EXTENT: f32 = 40.0;
const WALL_HEIGHT: f32 = 4.0;
/// The door blocking the far end of the arena opens at this time.
const DOOR_OPEN_TIME: f32 = 12.0;

struct Arena {
    collision: CollisionWorld,
    door: MeshId,
}

fn build_arena() -> Result<Arena> {
    let mut collision = CollisionWorld::new();
    let e = ARENA_HALF_EXTENT;
    collision
        .add_quad([
            Vec3::new(-e, 0.0, -e),
            Vec3::new(-e, 0.0, e),
            Vec3::new(e, 0.0, e),
            Vec3::new(e, 0.0, -e),
        ])
        .context("failed to add arena floor")?;

    let h = WALL_HEIGHT * 0.5;
    let walls = [
        (Vec3::new(0.0, h, -e), Vec3::new(e, h, 0.5)),
        (Vec3::new(0.0, h, e), Vec3::new(e, h, 0.5)),
        (Vec3::new(-e, h, 0.0), Vec3::new(0.5, h, e)),
        (Vec3::new(e, h, 0.0), Vec3::new(0.5, h, e)),
    ];
    for (center, half_extents) in walls {
        collision.add_static_cuboid(center, 0.0, half_extents);
    }
    // Cover between the spawn and the first enemies.
    collision.add_static_cuboid(Vec3::new(4.0, 1.0, -10.0), 0.4, Vec3::new(1.0, 1.0, 1.0));
    let door = collision.add_static_cuboid(Vec3::new(0.0, h, -26.0), 0.0, Vec3::new(3.0, h, 0.25));

    log::info!("Arena built with {} collision meshes", collision.mesh_count());
    Ok(Arena { collision, door })
}

fn set(input: &mut InputState, action: Action, on: bool) {
    if on {
        input.press(action);
    } else {
        input.release(action);
    }
}

/// Scripted player: wait, sprint in, slide, jump, throw at intervals.
fn drive(input: &mut InputState, t: f32) {
    let advancing = (1.0..14.0).contains(&t) || (20.0..30.0).contains(&t);
    set(input, Action::MoveForward, advancing);
    set(input, Action::Sprint, advancing && t < 6.0);
    set(input, Action::Crouch, (3.0..3.6).contains(&t));
    set(input, Action::Jump, (4.5..4.55).contains(&t));
    set(input, Action::MoveLeft, (8.0..9.0).contains(&t));

    // Fire roughly twice a second once in range.
    let throwing = t >= 5.0 && (t * 2.0).fract() < 0.05;
    set(input, Action::Throw, throwing);

    // Slow sweep of the view while strafing.
    if (8.0..9.0).contains(&t) {
        input.process_look(Vec2::new(-2.0, 0.0));
    }
}

fn log_event(input: &mut InputState, event: &SimEvent) {
    match event {
        SimEvent::LevelLoaded { index, spawn_yaw } => {
            input.set_view(*spawn_yaw, 0.0);
            log::info!("Level {} ready", index);
        }
        SimEvent::PlayerHit { source } => log::warn!("Player hit by {:?}", source),
        SimEvent::Sequencer(event) => log::info!("Sequencer: {:?}", event),
        SimEvent::ProjectileThrown { .. } | SimEvent::Explosion { .. } => {
            log::debug!("{:?}", event)
        }
        other => log::info!("{:?}", other),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("maskfall-sim {}", env!("CARGO_PKG_VERSION"));

    let tuning = TuningConfig::load();
    let levels = LevelSet::load_or_builtin(Path::new("levels.ron"))
        .context("failed to load levels.ron")?;
    log::info!("{} levels available", levels.len());

    let Arena {
        mut collision,
        door,
    } = build_arena()?;

    let mut clock = FrameClock::with_max_delta(tuning.max_frame_dt);
    let mut sim = Simulation::new(tuning, levels);
    let mut input = InputState::new();

    let frame_dt = 1.0 / TICK_RATE;
    let frames = (RUN_SECONDS * TICK_RATE) as u32;
    let mut door_open = false;
    for frame in 0..frames {
        let t = frame as f32 * frame_dt;
        if !door_open && t >= DOOR_OPEN_TIME {
            door_open = true;
            if collision.remove_mesh(door) {
                log::info!("Door opened");
            }
        }

        input.begin_frame();
        drive(&mut input, t);
        let dt = clock.advance(frame_dt);
        sim.tick(dt, &input.snapshot(), &collision);

        for event in sim.drain_events() {
            log_event(&mut input, &event);
        }

        if frame % (TICK_RATE as u32 * 5) == 0 {
            let player = sim.player_view();
            log::info!(
                "t={:.1}s phase={:?} fade={:.2} pos={:?} speed={:.2} enemies={}",
                t,
                sim.phase(),
                sim.fade_alpha(),
                player.transform.position,
                player.horizontal_speed,
                sim.enemies().iter().filter(|e| e.alive).count()
            );
        }
    }

    log::info!(
        "Finished {} frames ({:.1}s simulated), level {} '{}', phase {:?}",
        clock.frame_count(),
        clock.elapsed_seconds(),
        sim.level_index(),
        sim.current_level().name,
        sim.phase()
    );
    Ok(())
}
